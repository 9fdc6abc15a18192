//! Creature template loader.

use std::collections::BTreeSet;
use std::path::Path;

use combat_core::CombatConfig;
use combat_core::env::ActorTemplate;
use combat_core::state::TemplateId;
use serde::{Deserialize, Serialize};

use crate::catalog::MonsterCatalog;
use crate::loaders::{LoadResult, read_file};

/// Monster file structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterFile {
    pub monsters: Vec<ActorTemplate>,
}

/// Loader for creature templates from RON files.
pub struct MonsterLoader;

impl MonsterLoader {
    /// Load and validate a monster file.
    pub fn load(path: &Path) -> LoadResult<MonsterCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<MonsterCatalog> {
        let file: MonsterFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse monster RON: {}", e))?;

        let mut seen = BTreeSet::new();
        for template in &file.monsters {
            if template.id == TemplateId::NONE {
                anyhow::bail!("monster '{}' has no id", template.name);
            }
            if !seen.insert(template.id) {
                anyhow::bail!("duplicate monster id {:?} ('{}')", template.id, template.name);
            }
            if template.specials.len() > CombatConfig::MAX_SPECIALS {
                anyhow::bail!(
                    "monster '{}' has {} special attacks, at most {} allowed",
                    template.name,
                    template.specials.len(),
                    CombatConfig::MAX_SPECIALS
                );
            }
            if let Some(special) = template.specials.iter().find(|s| s.name.trim().is_empty()) {
                anyhow::bail!("monster '{}' has an unnamed {} special", template.name, special.kind);
            }
        }

        // Assist and enemy lists may only name templates in the same file.
        for template in &file.monsters {
            let profile = &template.profile;
            for id in profile.assist_list.iter().chain(&profile.enemy_mobs) {
                if !seen.contains(id) {
                    anyhow::bail!("monster '{}' refers to unknown monster {:?}", template.name, id);
                }
            }
        }

        Ok(file.monsters.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::TemplateOracle;
    use combat_core::specials::SpecialType;
    use combat_core::state::MonsterFlags;

    const GOBLINS: &str = r#"(
        monsters: [
            (
                id: TemplateId(1),
                name: "goblin",
                race: Goblin,
                level: 3,
                hp: 24,
                flags: "AGGRESSIVE | WILL_BE_ASSISTED",
                profile: (assist_list: [TemplateId(2)]),
            ),
            (
                id: TemplateId(2),
                name: "goblin shaman",
                class: Cleric,
                flags: "WILL_ASSIST",
                specials: [(name: "spit", kind: fire, damage: (count: 1, sides: 6, plus: 0))],
            ),
        ],
    )"#;

    #[test]
    fn parses_templates_with_defaults_filled_in() {
        let catalog = MonsterLoader::parse(GOBLINS).unwrap();
        assert_eq!(catalog.len(), 2);
        let goblin = catalog.template(TemplateId(1)).unwrap();
        assert!(goblin.flags.contains(MonsterFlags::AGGRESSIVE | MonsterFlags::WILL_BE_ASSISTED));
        assert_eq!(goblin.mp, 0);
        let shaman = catalog.by_name("goblin shaman").unwrap();
        assert_eq!(shaman.specials[0].kind, SpecialType::Fire);
        assert_eq!(shaman.specials[0].chance, 101);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let text = r#"(monsters: [(id: TemplateId(4), name: "a"), (id: TemplateId(4), name: "b")])"#;
        let err = MonsterLoader::parse(text).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_dangling_assist_list() {
        let text = r#"(monsters: [(id: TemplateId(1), name: "a", profile: (enemy_mobs: [TemplateId(9)]))])"#;
        let err = MonsterLoader::parse(text).unwrap_err();
        assert!(err.to_string().contains("unknown monster"));
    }

    #[test]
    fn caps_special_attacks() {
        let specials = vec![r#"(name: "claw")"#; CombatConfig::MAX_SPECIALS + 1].join(", ");
        let text = format!(r#"(monsters: [(id: TemplateId(1), name: "hydra", specials: [{specials}])])"#);
        assert!(MonsterLoader::parse(&text).is_err());
    }
}
