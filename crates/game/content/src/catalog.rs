//! In-memory creature catalog.

use std::collections::BTreeMap;

use combat_core::env::{ActorTemplate, TemplateOracle};
use combat_core::state::TemplateId;

/// Creature templates keyed by id, kept in id order.
#[derive(Clone, Debug, Default)]
pub struct MonsterCatalog {
    templates: BTreeMap<TemplateId, ActorTemplate>,
}

impl MonsterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template, handing back any template it replaced.
    pub fn insert(&mut self, template: ActorTemplate) -> Option<ActorTemplate> {
        self.templates.insert(template.id, template)
    }

    /// Case-insensitive lookup by creature name.
    pub fn by_name(&self, name: &str) -> Option<&ActorTemplate> {
        self.templates
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorTemplate> + '_ {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateOracle for MonsterCatalog {
    fn template(&self, id: TemplateId) -> Option<&ActorTemplate> {
        self.templates.get(&id)
    }

    fn ids(&self) -> Vec<TemplateId> {
        self.templates.keys().copied().collect()
    }
}

impl FromIterator<ActorTemplate> for MonsterCatalog {
    fn from_iter<I: IntoIterator<Item = ActorTemplate>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for template in iter {
            catalog.insert(template);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_serves_templates_in_id_order() {
        let catalog: MonsterCatalog = [
            ActorTemplate::builder("wolf").id(TemplateId(7)).build(),
            ActorTemplate::builder("Rat").id(TemplateId(2)).build(),
        ]
        .into_iter()
        .collect();
        assert_eq!(catalog.ids(), [TemplateId(2), TemplateId(7)]);
        assert_eq!(catalog.template(TemplateId(7)).map(|t| t.name.as_str()), Some("wolf"));
        assert_eq!(catalog.by_name("rat").map(|t| t.id), Some(TemplateId(2)));
        assert!(catalog.template(TemplateId(3)).is_none());
    }
}
