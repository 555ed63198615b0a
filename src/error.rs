//! Error types for parsing species programs and running the simulation.
//!
//! Parse-time failures are grouped under [`ProgramError`] and surface to the
//! caller when a species is constructed. Everything else is an [`Error`]
//! variant; turn-level failures are logged by the scheduler and never stop a
//! run.

use std::path::PathBuf;

use crate::creature::CreatureId;
use crate::world::Position;

/// Reasons a species source text cannot become a program.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("cannot read species file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("species source is empty: the first line must name the species")]
    MissingName,

    #[error("species program contains no instructions")]
    Empty,

    #[error("line {line}: unknown opcode `{token}`")]
    UnknownOpcode { line: usize, token: String },

    #[error("line {line}: `{opcode}` expects {expected}, found {found} operand(s)")]
    Arity {
        line: usize,
        opcode: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("line {line}: label definition has no name")]
    EmptyLabel { line: usize },

    #[error("line {line}: label `{name}` is already defined at address {first}")]
    DuplicateLabel {
        line: usize,
        name: String,
        first: usize,
    },

    #[error("line {line}: jump to undefined label `{name}`")]
    UndefinedLabel { line: usize, name: String },
}

/// Errors surfaced by the simulation core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed species program: {0}")]
    MalformedProgram(#[from] ProgramError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("position {position} is outside the world")]
    OutOfBounds { position: Position },

    #[error("creature {creature} did not finish its turn within {budget} instructions")]
    InfiniteProgram { creature: CreatureId, budget: usize },
}

impl Error {
    /// True for failures confined to a single turn, which the scheduler
    /// absorbs as a no-op turn.
    pub fn is_turn_local(&self) -> bool {
        matches!(self, Self::InfiniteProgram { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
