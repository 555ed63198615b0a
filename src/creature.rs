use std::fmt;

use crate::species::SpeciesId;
use crate::world::{Direction, Position};

/// Index of a creature in the world's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(pub usize);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime state of one creature.
///
/// The species is a handle into the simulation's species table, so an
/// infection only reassigns the handle. `pc` is the address of the next
/// instruction to fetch from that species' program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Creature {
    pub(crate) species: SpeciesId,
    pub(crate) position: Position,
    pub(crate) direction: Direction,
    pub(crate) pc: usize,
}

impl Creature {
    pub fn new(species: SpeciesId, position: Position, direction: Direction) -> Self {
        Self {
            species,
            position,
            direction,
            pc: 0,
        }
    }

    pub fn species(&self) -> SpeciesId {
        self.species
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// The cell directly in front of the creature.
    pub fn ahead(&self) -> Position {
        self.position.adjacent(self.direction)
    }
}
