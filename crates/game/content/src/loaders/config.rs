//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat tunables from TOML files.
///
/// Missing keys keep their defaults, so an empty file is a valid config.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.armor_reduction_cap < 0.0 || config.armor_reduction_cap > 1.0 {
            anyhow::bail!(
                "armor_reduction_cap must lie in 0..=1, got {}",
                config.armor_reduction_cap
            );
        }
        if config.newbie_level > config.veteran_level {
            anyhow::bail!(
                "newbie_level {} is above veteran_level {}",
                config.newbie_level,
                config.veteran_level
            );
        }
        if config.day_length == 0 {
            anyhow::bail!("day_length must be positive");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn overrides_only_what_is_named() {
        let config = ConfigLoader::parse("mobile_chance = 55\npkill_in_combat_disabled = true\n").unwrap();
        assert_eq!(config.mobile_chance, 55);
        assert!(config.pkill_in_combat_disabled);
        assert_eq!(config.default_weapon_delay, CombatConfig::DEFAULT_WEAPON_DELAY);
    }

    #[test]
    fn rejects_inverted_level_bands() {
        let err = ConfigLoader::parse("newbie_level = 12\nveteran_level = 4\n").unwrap_err();
        assert!(err.to_string().contains("veteran_level"));
    }
}
