//! Data handed to hooks about the tick that just ran.

use combat_core::state::{Tick, WorldEvent};

use crate::runtime::NpcTurn;

/// Read-only view of one finished tick.
pub struct HookContext<'a> {
    pub now: Tick,

    /// Events produced by effect expiry and creature ticks, in order.
    pub events: &'a [WorldEvent],

    /// One entry per creature that took a tick.
    pub npcs: &'a [NpcTurn],
}

impl HookContext<'_> {
    /// Whether anything died or left the world this tick.
    pub fn lost_actors(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e,
                WorldEvent::Died { .. } | WorldEvent::Departed { .. }
            )
        })
    }
}
