//! Spawn table loader.

use std::path::Path;

use combat_core::state::{RoomId, TemplateId};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Where a creature lives and how quickly it comes back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub template: TemplateId,
    pub room: RoomId,
    /// How many should stand in the room.
    #[serde(default = "one")]
    pub count: u32,
    /// Seconds between refills; zero spawns once and never again.
    #[serde(default)]
    pub every: u64,
}

const fn one() -> u32 {
    1
}

/// Spawn file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnFile {
    pub spawns: Vec<SpawnPoint>,
}

/// Loader for spawn tables from RON files.
pub struct SpawnLoader;

impl SpawnLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<SpawnPoint>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<SpawnPoint>> {
        let file: SpawnFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spawn RON: {}", e))?;
        if let Some(point) = file.spawns.iter().find(|p| p.count == 0) {
            anyhow::bail!("spawn of {:?} in {} has a count of zero", point.template, point.room);
        }
        Ok(file.spawns)
    }
}
