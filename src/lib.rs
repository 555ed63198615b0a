pub mod error;
pub mod program;
pub mod species;
pub mod world;
pub mod creature;
pub mod event;
pub mod interpreter;
pub mod simulation;
pub mod metrics;

pub use error::{Error, ProgramError, Result};
