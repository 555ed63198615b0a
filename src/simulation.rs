use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::creature::{Creature, CreatureId};
use crate::error::{Error, Result};
use crate::event::{Observer, WorldEvent};
use crate::interpreter::{DEFAULT_BUDGET_FACTOR, Interpreter};
use crate::metrics;
use crate::species::{Species, SpeciesId};
use crate::world::{Direction, Position, World};

/// Configuration for a simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Grid width.
    pub width: usize,
    /// Grid height.
    pub height: usize,
    /// Creatures placed for each species by [`Simulation::populate`].
    pub creatures_per_species: usize,
    /// Per-turn instruction budget, as a multiple of program length.
    pub step_budget_factor: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            creatures_per_species: 10,
            step_budget_factor: DEFAULT_BUDGET_FACTOR,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.step_budget_factor == 0 {
            return Err(Error::Configuration(
                "step budget factor must be positive".to_string(),
            ));
        }
        World::cell_count(self.width, self.height).map(|_| ())
    }
}

/// What happened during one round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundSummary {
    /// Turns that ended on a terminating instruction.
    pub completed: usize,
    /// Turns abandoned because of an error; these count as no-ops.
    pub stalled: usize,
}

/// The scheduler: owns the world, the species table and the one random
/// generator every random choice in a run is drawn from.
pub struct Simulation {
    pub config: SimulationConfig,
    pub world: World,
    pub rng: SmallRng,
    species: Vec<Species>,
    interpreter: Interpreter,
    /// Reusable scratch: shuffled visiting order.
    order: Vec<CreatureId>,
    round: u64,
}

impl Simulation {
    /// Create an empty simulation. The same `seed` reproduces a run exactly.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let world = World::new(config.width, config.height)?;
        let interpreter = Interpreter::new(config.step_budget_factor);
        tracing::debug!(
            width = config.width,
            height = config.height,
            seed,
            "created simulation"
        );
        Ok(Self {
            config,
            world,
            rng: SmallRng::seed_from_u64(seed),
            species: Vec::new(),
            interpreter,
            order: Vec::new(),
            round: 0,
        })
    }

    /// Register a species and return its handle.
    pub fn add_species(&mut self, species: Species) -> SpeciesId {
        let id = SpeciesId(self.species.len());
        tracing::debug!(species = species.name(), index = id.index(), "registered species");
        self.species.push(species);
        id
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Place one creature at a chosen spot.
    pub fn spawn<O: Observer + ?Sized>(
        &mut self,
        species: SpeciesId,
        position: Position,
        direction: Direction,
        observer: &mut O,
    ) -> Result<CreatureId> {
        let color = self
            .species
            .get(species.index())
            .ok_or_else(|| {
                Error::Configuration(format!("species {} is not registered", species.index()))
            })?
            .color()
            .clone();
        let id = self
            .world
            .spawn(Creature::new(species, position, direction))?;
        observer.notify(&WorldEvent::Created {
            creature: id,
            position,
            direction,
            color,
        });
        Ok(id)
    }

    /// Place `config.creatures_per_species` creatures of `species` at random
    /// cells, facing random directions. Cells are drawn without regard to
    /// occupancy; see [`World::spawn`].
    pub fn populate<O: Observer + ?Sized>(
        &mut self,
        species: SpeciesId,
        observer: &mut O,
    ) -> Result<Vec<CreatureId>> {
        (0..self.config.creatures_per_species)
            .map(|_| {
                let position = self.world.random_position(&mut self.rng);
                let direction = Direction::random(&mut self.rng);
                self.spawn(species, position, direction, observer)
            })
            .collect()
    }

    /// Give every creature one turn, in a freshly shuffled order.
    ///
    /// A creature infected earlier in the round still takes its slot, running
    /// whatever species and program counter the infection left it with.
    /// Failed turns are logged and skipped; they never abort the round.
    pub fn run_round<O: Observer + ?Sized>(&mut self, observer: &mut O) -> RoundSummary {
        self.order.clear();
        self.order.extend(self.world.creature_ids());
        self.order.shuffle(&mut self.rng);

        let mut summary = RoundSummary::default();
        for &id in &self.order {
            match self.interpreter.execute_turn(
                &mut self.world,
                &self.species,
                id,
                &mut self.rng,
                observer,
            ) {
                Ok(_) => summary.completed += 1,
                Err(err) if err.is_turn_local() => {
                    tracing::warn!(round = self.round, creature = %id, %err, "turn skipped");
                    summary.stalled += 1;
                }
                Err(err) => {
                    tracing::error!(round = self.round, creature = %id, %err, "turn failed");
                    summary.stalled += 1;
                }
            }
        }
        self.round += 1;
        summary
    }

    /// Number of completed rounds.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Creature count per species, indexed by species handle.
    pub fn census(&self) -> Vec<usize> {
        metrics::census(&self.world, self.species.len())
    }
}
