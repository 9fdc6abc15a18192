//! Content loaders for reading combat data from files.
//!
//! Each loader turns one RON or TOML file into the type the engine consumes,
//! validating cross-references that the file format alone cannot express.

pub mod config;
pub mod factory;
pub mod monsters;
pub mod rooms;
pub mod spawns;
pub mod spells;

pub use config::ConfigLoader;
pub use factory::{Content, ContentFactory};
pub use monsters::{MonsterFile, MonsterLoader};
pub use rooms::{RoomFile, RoomLoader};
pub use spawns::{SpawnFile, SpawnLoader, SpawnPoint};
pub use spells::{SpellFile, SpellLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
