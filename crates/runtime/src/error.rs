//! Errors surfaced by the tick driver.
//!
//! Normal combat outcomes (misses, refusals, failed casts) are values in the
//! reports; these variants cover what the driver itself cannot recover from.

use combat_core::env::OracleError;
use combat_core::state::{ActorId, Tick};
use combat_core::{CombatError, TargetError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("clock went backwards: tick {requested} is before {current}")]
    ClockWentBackwards { current: Tick, requested: Tick },

    #[error("actor {0} is not in the world")]
    UnknownActor(ActorId),

    #[error("could not resolve target: {0}")]
    Target(#[from] TargetError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("critical hook {hook} failed")]
    CriticalHook {
        hook: &'static str,
        #[source]
        source: HookError,
    },

    #[error("failed to write event log")]
    EventLog(#[from] std::io::Error),

    #[error("failed to encode event")]
    Encode(#[from] serde_json::Error),
}

/// Failure inside a post-tick hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("{0}")]
    Invariant(String),
}
