//! Room layout loader.

use std::collections::BTreeSet;
use std::path::Path;

use combat_core::state::Room;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Room file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomFile {
    pub rooms: Vec<Room>,
}

/// Loader for room layouts from RON files.
pub struct RoomLoader;

impl RoomLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<Room>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parses rooms and checks every exit leads somewhere in the file.
    pub fn parse(content: &str) -> LoadResult<Vec<Room>> {
        let file: RoomFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse room RON: {}", e))?;

        let mut ids = BTreeSet::new();
        for room in &file.rooms {
            if !ids.insert(room.id) {
                anyhow::bail!("duplicate room id {}", room.id);
            }
        }
        for room in &file.rooms {
            if let Some(exit) = room.exits.iter().find(|exit| !ids.contains(&exit.to)) {
                anyhow::bail!("exit '{}' in {} leads to unknown {}", exit.name, room.id, exit.to);
            }
        }

        Ok(file.rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::state::{RoomFlags, RoomId};

    #[test]
    fn parses_linked_rooms() {
        let text = r#"(rooms: [
            (id: RoomId(1), name: "Gate", exits: [(name: "north", to: RoomId(2), flags: "")]),
            (id: RoomId(2), name: "Shrine", flags: "PK_SAFE | NO_MAGIC",
             exits: [(name: "south", to: RoomId(1), flags: "")]),
        ])"#;
        let rooms = RoomLoader::parse(text).unwrap();
        assert_eq!(rooms.len(), 2);
        assert!(rooms[1].has(RoomFlags::PK_SAFE));
        assert_eq!(rooms[0].exits[0].to, RoomId(2));
    }

    #[test]
    fn dangling_exit_is_rejected() {
        let text = r#"(rooms: [(id: RoomId(1), name: "Gate", exits: [(name: "down", to: RoomId(7), flags: "")])])"#;
        let err = RoomLoader::parse(text).unwrap_err();
        assert!(err.to_string().contains("room:7"));
    }
}
