//! Spell catalog loader.

use std::collections::BTreeSet;
use std::path::Path;

use combat_core::magic::{SpellCatalog, SpellDef};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Spell file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellFile {
    pub spells: Vec<SpellDef>,
}

/// Loader for the spell catalog from RON files.
pub struct SpellLoader;

impl SpellLoader {
    pub fn load(path: &Path) -> LoadResult<SpellCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SpellCatalog> {
        let file: SpellFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spell RON: {}", e))?;

        let mut names = BTreeSet::new();
        for spell in &file.spells {
            let key = spell.name.trim().to_ascii_lowercase();
            if key.is_empty() {
                anyhow::bail!("spell with handler '{}' has no name", spell.handler);
            }
            if !names.insert(key) {
                anyhow::bail!("duplicate spell '{}'", spell.name);
            }
            if spell.handler.trim().is_empty() {
                anyhow::bail!("spell '{}' names no handler", spell.name);
            }
            if spell.cost < 0 {
                anyhow::bail!("spell '{}' has negative cost {}", spell.name, spell.cost);
            }
        }

        Ok(file.spells.into_iter().collect())
    }
}
