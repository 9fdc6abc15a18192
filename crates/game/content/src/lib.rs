//! Data-driven combat content and its loaders.
//!
//! This crate turns data files into the read-only catalogs the combat engine
//! consults:
//! - Creature templates with their special attacks (RON)
//! - The spell catalog (RON)
//! - Room layouts and spawn tables (RON)
//! - Engine tunables (TOML)
//!
//! Content is consumed through [`combat_core::TemplateOracle`] and the spell
//! book; it never appears in actor state except as copied template data.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::MonsterCatalog;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, Content, ContentFactory, MonsterLoader, RoomLoader, SpawnLoader, SpawnPoint,
    SpellLoader,
};
