use rand::Rng;

use crate::creature::CreatureId;
use crate::error::{Error, ProgramError, Result};
use crate::event::{Observer, WorldEvent};
use crate::program::{Instruction, Opcode, Program, Target};
use crate::species::Species;
use crate::world::{Direction, World};

/// Default multiplier applied to a program's length to get its per-turn
/// instruction budget.
pub const DEFAULT_BUDGET_FACTOR: usize = 8;

/// Summary of a completed turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Turn {
    /// The terminating opcode that ended the turn.
    pub action: Opcode,
    /// Instructions evaluated, including the terminating one.
    pub steps: usize,
}

/// Executes creature turns.
///
/// A turn fetches instructions starting at the creature's program counter
/// until a terminating opcode (HOP, LEFT, RIGHT, INFECT) has run. The
/// counter is advanced before each instruction is evaluated, so a taken jump
/// overwrites the provisional advance. Running past the last instruction
/// wraps back to address 0.
///
/// Every turn is bounded by `program length × budget factor` evaluations.
/// A turn that exhausts its budget fails with [`Error::InfiniteProgram`] and
/// leaves the creature exactly as it was before the turn.
#[derive(Clone, Copy, Debug)]
pub struct Interpreter {
    budget_factor: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_FACTOR)
    }
}

impl Interpreter {
    pub fn new(budget_factor: usize) -> Self {
        Self {
            budget_factor: budget_factor.max(1),
        }
    }

    /// Maximum instructions a creature running `program` may evaluate in one turn.
    pub fn budget(&self, program: &Program) -> usize {
        program.len().saturating_mul(self.budget_factor).max(1)
    }

    /// Run one turn for creature `id`.
    ///
    /// `species` is the table the creature's species handle indexes into.
    pub fn execute_turn<R, O>(
        &self,
        world: &mut World,
        species: &[Species],
        id: CreatureId,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<Turn>
    where
        R: Rng + ?Sized,
        O: Observer + ?Sized,
    {
        let before = *world.creature(id);
        let result = self.run(world, species, id, rng, observer);
        if result.is_err() {
            // Nothing terminating ran, so only pc and facing can have moved.
            let creature = world.creature_mut(id);
            creature.pc = before.pc;
            if creature.direction != before.direction {
                creature.direction = before.direction;
                observer.notify(&WorldEvent::Turned {
                    creature: id,
                    position: creature.position,
                    direction: creature.direction,
                });
            }
        }
        result
    }

    fn run<R, O>(
        &self,
        world: &mut World,
        species: &[Species],
        id: CreatureId,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<Turn>
    where
        R: Rng + ?Sized,
        O: Observer + ?Sized,
    {
        let kind = world.creature(id).species;
        let actor = species.get(kind.index()).ok_or_else(|| {
            Error::Configuration(format!("species {} is not registered", kind.index()))
        })?;
        let program = actor.program();
        let len = program.len();
        let budget = self.budget(program);

        for step in 1..=budget {
            let creature = world.creature_mut(id);
            if creature.pc >= len {
                creature.pc = 0;
            }
            let Some(instruction) = program.get(creature.pc) else {
                return Err(ProgramError::Empty.into());
            };
            tracing::trace!(creature = %id, pc = creature.pc, %instruction, "fetch");
            creature.pc += 1;
            let ahead = creature.ahead();

            match instruction {
                Instruction::Hop => {
                    if world.is_vacant(ahead) {
                        let from = world.relocate(id, ahead)?;
                        observer.notify(&WorldEvent::Moved {
                            creature: id,
                            from,
                            to: ahead,
                        });
                    }
                }
                Instruction::Left => rotate(world, id, Direction::left, observer),
                Instruction::Right => rotate(world, id, Direction::right, observer),
                Instruction::Infect(target) => {
                    if let Some(victim) = world.occupant(ahead) {
                        let infected = world.creature_mut(victim);
                        infected.species = kind;
                        infected.pc = target.as_ref().map_or(0, Target::address);
                        observer.notify(&WorldEvent::Changed {
                            creature: victim,
                            position: ahead,
                            color: actor.color().clone(),
                        });
                    }
                }
                Instruction::IfEmpty(target) => {
                    if world.is_vacant(ahead) {
                        jump(world, id, target);
                    }
                }
                Instruction::IfWall(target) => {
                    if !world.in_bounds(ahead) {
                        rotate(world, id, Direction::left, observer);
                        jump(world, id, target);
                    }
                }
                Instruction::IfSame(target) => {
                    // The cell ahead is never the creature's own cell, so
                    // this branch does not fire in practice.
                    if world.occupant(ahead) == Some(id) {
                        rotate(world, id, Direction::right, observer);
                        jump(world, id, target);
                    }
                }
                Instruction::IfEnemy(target) => {
                    let enemy = world
                        .occupant(ahead)
                        .is_some_and(|other| world.creature(other).species != kind);
                    if enemy {
                        jump(world, id, target);
                    }
                }
                Instruction::IfRandom(target) => {
                    if rng.gen_range(0..2) == 0 {
                        jump(world, id, target);
                    }
                }
                Instruction::Go(target) => jump(world, id, target),
                Instruction::Label(_) => {}
            }

            let action = instruction.opcode();
            if action.is_terminating() {
                tracing::debug!(creature = %id, %action, steps = step, "turn complete");
                return Ok(Turn {
                    action,
                    steps: step,
                });
            }
        }

        Err(Error::InfiniteProgram {
            creature: id,
            budget,
        })
    }
}

fn jump(world: &mut World, id: CreatureId, target: &Target) {
    world.creature_mut(id).pc = target.address();
}

fn rotate<O: Observer + ?Sized>(
    world: &mut World,
    id: CreatureId,
    turn: fn(Direction) -> Direction,
    observer: &mut O,
) {
    let creature = world.creature_mut(id);
    creature.direction = turn(creature.direction);
    observer.notify(&WorldEvent::Turned {
        creature: id,
        position: creature.position,
        direction: creature.direction,
    });
}
