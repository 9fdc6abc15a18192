//! Content factory for building catalogs from data files.

use std::path::{Path, PathBuf};

use combat_core::{CombatConfig, TemplateOracle};
use combat_core::magic::SpellCatalog;
use combat_core::state::Room;

use crate::catalog::MonsterCatalog;
use crate::loaders::{
    ConfigLoader, LoadResult, MonsterLoader, RoomLoader, SpawnLoader, SpawnPoint, SpellLoader,
};

/// Everything a world needs from disk.
#[derive(Clone, Debug)]
pub struct Content {
    pub config: CombatConfig,
    pub monsters: MonsterCatalog,
    pub spells: SpellCatalog,
    pub rooms: Vec<Room>,
    pub spawns: Vec<SpawnPoint>,
}

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── monsters.ron
/// ├── spells.ron
/// ├── rooms.ron
/// └── spawns.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load combat configuration from `config.toml`; a missing file means defaults.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load creature templates from `monsters.ron`.
    pub fn load_monsters(&self) -> LoadResult<MonsterCatalog> {
        MonsterLoader::load(&self.data_dir.join("monsters.ron"))
    }

    /// Load the spell catalog from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<SpellCatalog> {
        SpellLoader::load(&self.data_dir.join("spells.ron"))
    }

    /// Load room layouts from `rooms.ron`.
    pub fn load_rooms(&self) -> LoadResult<Vec<Room>> {
        RoomLoader::load(&self.data_dir.join("rooms.ron"))
    }

    /// Load the spawn table from `spawns.ron`; a missing file means no spawns.
    pub fn load_spawns(&self) -> LoadResult<Vec<SpawnPoint>> {
        let path = self.data_dir.join("spawns.ron");
        if !path.exists() {
            return Ok(Vec::new());
        }
        SpawnLoader::load(&path)
    }

    /// Loads every file, then checks the references between them.
    pub fn load_all(&self) -> LoadResult<Content> {
        let content = Content {
            config: self.load_config()?,
            monsters: self.load_monsters()?,
            spells: self.load_spells()?,
            rooms: self.load_rooms()?,
            spawns: self.load_spawns()?,
        };

        for template in content.monsters.iter() {
            if let Some(spell) = template
                .known_spells
                .iter()
                .find(|name| content.spells.get(name).is_none())
            {
                anyhow::bail!("monster '{}' knows unknown spell '{}'", template.name, spell);
            }
        }

        for point in &content.spawns {
            if content.monsters.template(point.template).is_none() {
                anyhow::bail!("spawn in {} names unknown monster {:?}", point.room, point.template);
            }
            if !content.rooms.iter().any(|room| room.id == point.room) {
                anyhow::bail!("spawn of {:?} is in unknown {}", point.template, point.room);
            }
        }

        Ok(content)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    fn write_minimal(dir: &Path, monsters: &str) {
        fs::write(dir.join("monsters.ron"), monsters).unwrap();
        fs::write(
            dir.join("spells.ron"),
            r#"(spells: [(name: "burn", handler: "bolt")])"#,
        )
        .unwrap();
        fs::write(dir.join("rooms.ron"), r#"(rooms: [(id: RoomId(1), name: "Pit")])"#).unwrap();
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(
            dir.path(),
            r#"(monsters: [(id: TemplateId(1), name: "imp", known_spells: ["burn"])])"#,
        );
        let content = ContentFactory::new(dir.path()).load_all().unwrap();
        assert_eq!(content.config, CombatConfig::default());
        assert_eq!(content.monsters.len(), 1);
        assert_eq!(content.rooms.len(), 1);
        assert!(content.spawns.is_empty());
    }

    #[test]
    fn spawn_in_unknown_room_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(dir.path(), r#"(monsters: [(id: TemplateId(1), name: "imp")])"#);
        fs::write(
            dir.path().join("spawns.ron"),
            "(spawns: [(template: TemplateId(1), room: RoomId(8))])",
        )
        .unwrap();
        let err = ContentFactory::new(dir.path()).load_all().unwrap_err();
        assert!(err.to_string().contains("room:8"));
    }

    #[test]
    fn unknown_known_spell_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(
            dir.path(),
            r#"(monsters: [(id: TemplateId(1), name: "imp", known_spells: ["wish"])])"#,
        );
        let err = ContentFactory::new(dir.path()).load_all().unwrap_err();
        assert!(err.to_string().contains("wish"));
    }

    #[test]
    fn missing_monster_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentFactory::new(dir.path()).load_monsters().unwrap_err();
        assert!(err.to_string().contains("monsters.ron"));
    }
}
