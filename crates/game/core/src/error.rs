//! Common error infrastructure for combat-core.
//!
//! Expected combat results (a miss, a denied attack, a spell that fizzles) are
//! *values* returned through closed outcome enums. The types here cover the
//! remaining cases: lookups that found nothing, invariants that did not hold,
//! and missing collaborators.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each subsystem has its own error enum with specific variants
//! - **Rich Context**: Errors carry the actor and tick they were raised for
//! - **Severity Classification**: Errors are categorized for recovery strategies

use crate::state::{ActorId, RoomId, Tick};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: Temporary conditions that may succeed on retry
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors indicating corrupted world state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry later.
    ///
    /// Examples: actor busy, cooldown not elapsed
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown actor id, unknown spell id
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: a dead actor entering the damage pipeline, a dangling pet link
    Internal,

    /// Fatal error - world state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Actor on whose behalf the failing operation ran (if applicable).
    pub actor: Option<ActorId>,

    /// Other actor involved (victim, target, master).
    pub target: Option<ActorId>,

    /// World clock at the time of error.
    pub tick: Tick,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context at the given tick.
    #[must_use]
    pub const fn new(tick: Tick) -> Self {
        Self {
            actor: None,
            target: None,
            tick,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a target to this context (builder pattern).
    #[must_use]
    pub const fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Errors raised while resolving combat, spells, or NPC ticks.
///
/// None of these represent a normal game outcome; each one means the caller
/// handed the engine something it could not have produced itself.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("actor {id} not found")]
    ActorNotFound { id: ActorId, context: ErrorContext },

    #[error("actor {id} is dying and cannot take part in combat")]
    ActorDying { id: ActorId, context: ErrorContext },

    #[error("room {room} not found")]
    RoomNotFound { room: RoomId, context: ErrorContext },

    #[error("spell {spell} is not registered")]
    UnknownSpell { spell: String, context: ErrorContext },

    #[error("oracle unavailable: {0}")]
    Oracle(#[from] crate::env::OracleError),
}

impl CombatError {
    pub fn actor_not_found(id: ActorId, tick: Tick) -> Self {
        Self::ActorNotFound {
            id,
            context: ErrorContext::new(tick).with_actor(id),
        }
    }

    pub fn actor_dying(id: ActorId, tick: Tick) -> Self {
        Self::ActorDying {
            id,
            context: ErrorContext::new(tick)
                .with_actor(id)
                .with_message("hp <= 0 before death processing completed"),
        }
    }
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActorNotFound { .. } | Self::RoomNotFound { .. } => ErrorSeverity::Validation,
            Self::UnknownSpell { .. } => ErrorSeverity::Validation,
            Self::ActorDying { .. } => ErrorSeverity::Internal,
            Self::Oracle(_) => ErrorSeverity::Fatal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::ActorNotFound { context, .. }
            | Self::ActorDying { context, .. }
            | Self::RoomNotFound { context, .. }
            | Self::UnknownSpell { context, .. } => Some(context),
            Self::Oracle(_) => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorNotFound { .. } => "COMBAT_ACTOR_NOT_FOUND",
            Self::ActorDying { .. } => "COMBAT_ACTOR_DYING",
            Self::RoomNotFound { .. } => "COMBAT_ROOM_NOT_FOUND",
            Self::UnknownSpell { .. } => "COMBAT_UNKNOWN_SPELL",
            Self::Oracle(_) => "COMBAT_ORACLE_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dying_actor_is_an_internal_error() {
        let err = CombatError::actor_dying(ActorId(4), 90);
        assert!(err.severity().is_internal());
        assert_eq!(err.error_code(), "COMBAT_ACTOR_DYING");
        assert_eq!(err.context().and_then(|c| c.actor), Some(ActorId(4)));
    }

    #[test]
    fn missing_actor_is_validation() {
        let err = CombatError::actor_not_found(ActorId(9), 0);
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert!(!err.severity().is_recoverable());
    }
}
