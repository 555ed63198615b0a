use crate::creature::CreatureId;
use crate::species::Color;
use crate::world::{Direction, Position};

/// Observable state changes, emitted for whatever draws the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    Created {
        creature: CreatureId,
        position: Position,
        direction: Direction,
        color: Color,
    },
    Moved {
        creature: CreatureId,
        from: Position,
        to: Position,
    },
    Turned {
        creature: CreatureId,
        position: Position,
        direction: Direction,
    },
    /// A creature was infected and now belongs to the species painted `color`.
    Changed {
        creature: CreatureId,
        position: Position,
        color: Color,
    },
}

/// Receiver of [`WorldEvent`]s. The simulation core never draws; a display
/// layer implements this to mirror the grid.
pub trait Observer {
    fn notify(&mut self, event: &WorldEvent);
}

/// Discards every event.
impl Observer for () {
    fn notify(&mut self, _event: &WorldEvent) {}
}

/// Records events in order.
impl Observer for Vec<WorldEvent> {
    fn notify(&mut self, event: &WorldEvent) {
        self.push(event.clone());
    }
}

/// Logs each event at trace level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&mut self, event: &WorldEvent) {
        match event {
            WorldEvent::Created {
                creature,
                position,
                direction,
                color,
            } => tracing::trace!(%creature, %position, %direction, %color, "created"),
            WorldEvent::Moved { creature, from, to } => {
                tracing::trace!(%creature, %from, %to, "moved")
            }
            WorldEvent::Turned {
                creature,
                position,
                direction,
            } => tracing::trace!(%creature, %position, %direction, "turned"),
            WorldEvent::Changed {
                creature,
                position,
                color,
            } => tracing::trace!(%creature, %position, %color, "changed"),
        }
    }
}
