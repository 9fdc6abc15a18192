//! Oracle access errors.
//!
//! Errors related to collaborator availability and registry lookups.

use crate::error::{ErrorSeverity, GameError};
use crate::state::TemplateId;

/// Errors that occur when reaching into the environment.
///
/// A missing collaborator is fatal: the engine cannot resolve an attack
/// without a random source or cast a spell without a catalog.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("combat configuration not available")]
    ConfigNotAvailable,

    #[error("RngOracle not available")]
    RngNotAvailable,

    #[error("spell book not available")]
    SpellsNotAvailable,

    #[error("special attack registry not available")]
    SpecialsNotAvailable,

    /// Actor template was not found by id.
    #[error("actor template {0} not found")]
    TemplateNotFound(TemplateId),

    /// A spell is cataloged but no handler implements it.
    #[error("no handler registered for spell '{0}'")]
    SpellHandlerMissing(String),
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            ConfigNotAvailable | RngNotAvailable | SpellsNotAvailable | SpecialsNotAvailable => {
                ErrorSeverity::Fatal
            }
            TemplateNotFound(_) | SpellHandlerMissing(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            ConfigNotAvailable => "ORACLE_CONFIG_NOT_AVAILABLE",
            RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
            SpellsNotAvailable => "ORACLE_SPELLS_NOT_AVAILABLE",
            SpecialsNotAvailable => "ORACLE_SPECIALS_NOT_AVAILABLE",
            TemplateNotFound(_) => "ORACLE_TEMPLATE_NOT_FOUND",
            SpellHandlerMissing(_) => "ORACLE_SPELL_HANDLER_MISSING",
        }
    }
}
