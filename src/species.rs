use std::fmt;
use std::path::Path;

use crate::error::{ProgramError, Result};
use crate::program::{self, Instruction, Program};

/// Index of a species in the simulation's species table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesId(pub usize);

impl SpeciesId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Display colour of a species. The core never interprets it; it is handed
/// through to observers as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, coloured program shared by every creature of that species.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Species {
    name: String,
    color: Color,
    program: Program,
}

impl Species {
    /// Build a species from program source text. The first line of `source`
    /// is the species name.
    pub fn new(source: &str, color: Color) -> Result<Self> {
        let name = program::species_name(source)?.to_string();
        let program = program::parse(source)?;
        Ok(Self {
            name,
            color,
            program,
        })
    }

    /// Read and parse a species file.
    pub fn from_file(path: impl AsRef<Path>, color: Color) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ProgramError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let species = Self::new(&source, color)?;
        tracing::debug!(
            name = %species.name,
            path = %path.display(),
            instructions = species.program.len(),
            "loaded species"
        );
        Ok(species)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_size(&self) -> usize {
        self.program.len()
    }

    pub fn program_step(&self, address: usize) -> Option<&Instruction> {
        self.program.get(address)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.color)?;
        write!(f, "{}", self.program)
    }
}
