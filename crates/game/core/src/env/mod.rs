//! Read-only collaborators the engine consults while resolving actions.
//!
//! The [`Env`] aggregate bundles the tunable configuration, the random
//! source, the spell book and the special-attack registry so combat, magic
//! and NPC code can reach them without globals.
mod error;
mod rng;
mod templates;

pub use error::OracleError;
pub use rng::{FixedRng, PcgRng, RngOracle, Roller, compute_seed};
pub use templates::{ActorTemplate, ActorTemplateBuilder, TemplateOracle};

use crate::config::CombatConfig;
use crate::magic::SpellBook;
use crate::specials::SpecialRegistry;

/// Aggregates the collaborators required by the combat engine.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    config: Option<&'a CombatConfig>,
    rng: Option<&'a dyn RngOracle>,
    spells: Option<&'a SpellBook>,
    specials: Option<&'a SpecialRegistry>,
}

impl<'a> Env<'a> {
    pub fn new(
        config: Option<&'a CombatConfig>,
        rng: Option<&'a dyn RngOracle>,
        spells: Option<&'a SpellBook>,
        specials: Option<&'a SpecialRegistry>,
    ) -> Self {
        Self {
            config,
            rng,
            spells,
            specials,
        }
    }

    pub fn with_all(
        config: &'a CombatConfig,
        rng: &'a dyn RngOracle,
        spells: &'a SpellBook,
        specials: &'a SpecialRegistry,
    ) -> Self {
        Self::new(Some(config), Some(rng), Some(spells), Some(specials))
    }

    /// Config and rng only; enough for weapon combat and NPC ticks.
    pub fn combat_only(config: &'a CombatConfig, rng: &'a dyn RngOracle) -> Self {
        Self::new(Some(config), Some(rng), None, None)
    }

    pub fn empty() -> Self {
        Self::new(None, None, None, None)
    }

    /// Returns the configuration, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ConfigNotAvailable` if no config was provided.
    pub fn config(&self) -> Result<&'a CombatConfig, OracleError> {
        self.config.ok_or(OracleError::ConfigNotAvailable)
    }

    /// Returns the RngOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::RngNotAvailable` if no rng oracle was provided.
    pub fn rng(&self) -> Result<&'a dyn RngOracle, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }

    /// Returns the spell book, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SpellsNotAvailable` if no spell book was provided.
    pub fn spells(&self) -> Result<&'a SpellBook, OracleError> {
        self.spells.ok_or(OracleError::SpellsNotAvailable)
    }

    /// Returns the special-attack registry, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SpecialsNotAvailable` if no registry was provided.
    pub fn specials(&self) -> Result<&'a SpecialRegistry, OracleError> {
        self.specials.ok_or(OracleError::SpecialsNotAvailable)
    }
}

impl core::fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Env")
            .field("config", &self.config.is_some())
            .field("rng", &self.rng.is_some())
            .field("spells", &self.spells.is_some())
            .field("specials", &self.specials.is_some())
            .finish()
    }
}
