use std::fmt;

use rand::Rng;

use crate::creature::{Creature, CreatureId};
use crate::error::{Error, Result};

/// A cell coordinate. `x` grows to the east, `y` grows to the south.
///
/// Coordinates are signed so that the cell ahead of a creature standing on
/// an edge can be represented and rejected by [`World::in_bounds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step along `direction`.
    pub fn adjacent(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal facings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Rotate 90° counter-clockwise.
    pub fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Rotate 90° clockwise.
    pub fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(name)
    }
}

/// The fixed-size occupancy grid and the arena of every creature in it.
///
/// Cells store indices into the creature arena, indexed by `y * width + x`.
/// Creatures are never removed, so a [`CreatureId`] stays valid for the
/// lifetime of the world.
pub struct World {
    width: usize,
    height: usize,
    cells: Vec<Option<CreatureId>>,
    creatures: Vec<Creature>,
}

impl World {
    /// Create an empty `width` × `height` world.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let count = Self::cell_count(width, height)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(count).map_err(|err| {
            Error::Configuration(format!("cannot allocate a {width}x{height} world: {err}"))
        })?;
        cells.resize(count, None);
        Ok(Self {
            width,
            height,
            cells,
            creatures: Vec::new(),
        })
    }

    /// Validate world dimensions without allocating, returning the cell count.
    pub fn cell_count(width: usize, height: usize) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::Configuration(format!(
                "world dimensions must be positive, got {width}x{height}"
            )));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(Error::Configuration(format!(
                "world dimensions {width}x{height} exceed the coordinate range"
            )));
        }
        let too_large =
            || Error::Configuration(format!("world of {width}x{height} cells is too large"));
        let count = width.checked_mul(height).ok_or_else(too_large)?;
        let bytes = count
            .checked_mul(std::mem::size_of::<Option<CreatureId>>())
            .ok_or_else(too_large)?;
        if bytes > isize::MAX as usize {
            return Err(too_large());
        }
        Ok(count)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// The creature at `pos`, or `None` for an empty cell.
    pub fn get(&self, pos: Position) -> Result<Option<CreatureId>> {
        let idx = self.index(pos).ok_or(Error::OutOfBounds { position: pos })?;
        Ok(self.cells[idx])
    }

    /// Overwrite the cell at `pos`. Passing `None` clears it.
    ///
    /// This only touches the grid; the creature's own recorded position is
    /// the caller's responsibility (see [`World::relocate`]).
    pub fn set(&mut self, pos: Position, occupant: Option<CreatureId>) -> Result<()> {
        let idx = self.index(pos).ok_or(Error::OutOfBounds { position: pos })?;
        self.cells[idx] = occupant;
        Ok(())
    }

    /// Like [`World::get`] but treats positions outside the grid as empty.
    pub fn occupant(&self, pos: Position) -> Option<CreatureId> {
        self.index(pos).and_then(|idx| self.cells[idx])
    }

    /// True when `pos` is inside the grid and nobody stands there.
    pub fn is_vacant(&self, pos: Position) -> bool {
        matches!(self.index(pos), Some(idx) if self.cells[idx].is_none())
    }

    /// A uniformly drawn cell, occupied or not.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        // Both casts are lossless: `new` rejects dimensions beyond i32.
        Position::new(
            rng.gen_range(0..self.width) as i32,
            rng.gen_range(0..self.height) as i32,
        )
    }

    /// Add a creature to the arena and place it on the grid.
    ///
    /// Placement does not check occupancy. A creature spawned onto a taken
    /// cell replaces the previous occupant in the grid; the displaced
    /// creature keeps running but is invisible to its neighbours until it
    /// hops onto a free cell.
    pub fn spawn(&mut self, creature: Creature) -> Result<CreatureId> {
        let id = CreatureId(self.creatures.len());
        self.set(creature.position(), Some(id))?;
        self.creatures.push(creature);
        Ok(id)
    }

    /// Move a creature to `to`, keeping grid and recorded position in sync.
    ///
    /// The old cell is cleared only if it still points at the mover.
    pub fn relocate(&mut self, id: CreatureId, to: Position) -> Result<Position> {
        let from = self.creature(id).position();
        self.set(to, Some(id))?;
        if self.occupant(from) == Some(id) {
            self.set(from, None)?;
        }
        self.creature_mut(id).position = to;
        Ok(from)
    }

    pub fn creature(&self, id: CreatureId) -> &Creature {
        &self.creatures[id.0]
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> &mut Creature {
        &mut self.creatures[id.0]
    }

    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    pub fn creature_ids(&self) -> impl Iterator<Item = CreatureId> + '_ {
        (0..self.creatures.len()).map(CreatureId)
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    fn index(&self, pos: Position) -> Option<usize> {
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}
