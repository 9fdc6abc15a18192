//! Post-tick hook system for runtime orchestration.
//!
//! Hooks run once per tick, after every creature has acted. Each hook sees
//! what happened during the tick and may touch the world through a combat
//! context of its own.
//!
//! # Execution Order
//!
//! Hooks are sorted by priority (lower values run first). A failing hook is
//! handled according to its [`HookCriticality`].

mod context;
mod registry;
mod repop;
mod sweep;

pub use context::HookContext;
pub use registry::HookRegistry;
pub use repop::{RepopHook, fill_spawn};
pub use sweep::DeathSweepHook;

use combat_core::CombatContext;

use crate::error::HookError;

/// Defines the criticality level of a hook for error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCriticality {
    /// Hook failure fails the whole tick.
    ///
    /// Use for hooks that keep the world consistent (e.g., DeathSweepHook).
    Critical,

    /// Hook failure is logged as an error; the tick continues.
    Important,

    /// Hook failure is logged at debug level and otherwise ignored.
    Optional,
}

/// Work done after every creature has taken its tick.
pub trait PostTickHook: Send + Sync {
    /// Returns a human-readable name for this hook (used in logging).
    fn name(&self) -> &'static str;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    /// Cheap check made every tick before [`execute`](Self::execute).
    fn should_trigger(&self, world: &combat_core::World, ctx: &HookContext<'_>) -> bool;

    fn execute(&self, combat: &mut CombatContext<'_>, ctx: &HookContext<'_>) -> Result<(), HookError>;
}
