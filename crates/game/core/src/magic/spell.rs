//! Spell definitions and the catalog that names them.

use std::collections::BTreeMap;

use crate::state::{Dice, Realm};

/// Arcane schools. Mages and liches are gated on these.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum School {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Translocation,
    Transmutation,
}

/// Divine domains. Clerics, paladins, death knights and druids are gated on
/// these.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Domain {
    Healing,
    Destruction,
    Evil,
    Knowledge,
    Protection,
    Nature,
    Augmentation,
    Travel,
    Creation,
    Trickery,
}

/// Damage an offensive spell rolls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offense {
    pub damage: Dice,
    pub realm: Option<Realm>,
}

/// One castable spell.
///
/// `school` or `domain` of `None` means arcane or divine casters
/// respectively may not cast it at all.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpellDef {
    pub name: String,
    pub school: Option<School>,
    pub domain: Option<Domain>,
    /// 0 for cantrips; 3 and up carry a level requirement.
    pub tier: u8,
    /// Mana, or hit points for a lich. Zero is free.
    pub cost: i32,
    pub offense: Option<Offense>,
    /// Heal amount, ward strength, and similar.
    pub power: Dice,
    /// Seconds a granted effect lasts.
    pub duration: u64,
    /// Teleport, summon, recall and friends: blocked by dimensional anchors.
    pub movement: bool,
    /// Seconds before the next cast, replacing the class delay.
    pub delay: Option<u64>,
    /// Key of the handler in the spell book.
    pub handler: String,
}

impl Default for SpellDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            school: None,
            domain: None,
            tier: 0,
            cost: 0,
            offense: None,
            power: Dice::default(),
            duration: 0,
            movement: false,
            delay: None,
            handler: String::new(),
        }
    }
}

impl SpellDef {
    /// A spell handled by `handler`.
    pub fn new(name: &str, handler: &str) -> Self {
        Self {
            name: name.to_owned(),
            handler: handler.to_owned(),
            ..Self::default()
        }
    }

    /// A damage spell dispatched to the stock bolt handler.
    pub fn offensive(name: &str, damage: Dice, realm: Option<Realm>) -> Self {
        Self {
            offense: Some(Offense { damage, realm }),
            ..Self::new(name, "bolt")
        }
    }

    #[must_use]
    pub fn with_school(mut self, school: School) -> Self {
        self.school = Some(school);
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    #[must_use]
    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: i32) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: Dice, duration: u64) -> Self {
        self.power = power;
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, secs: u64) -> Self {
        self.delay = Some(secs);
        self
    }

    #[must_use]
    pub fn movement(mut self) -> Self {
        self.movement = true;
        self
    }

    pub fn is_offensive(&self) -> bool {
        self.offense.is_some()
    }

    /// Minimum caster level for the spell's tier.
    pub const fn required_level(&self) -> u32 {
        match self.tier {
            3 => 5,
            4 => 10,
            5 | 6 => 16,
            _ => 0,
        }
    }
}

/// Why a name did not pick out exactly one spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("that spell does not exist")]
    NotFound,
    #[error("spell name is not unique")]
    Ambiguous,
}

/// All spells, keyed by lowercase name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpellCatalog {
    spells: BTreeMap<String, SpellDef>,
}

impl SpellCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a spell.
    pub fn insert(&mut self, spell: SpellDef) {
        self.spells.insert(spell.name.to_ascii_lowercase(), spell);
    }

    #[must_use]
    pub fn with(mut self, spell: SpellDef) -> Self {
        self.insert(spell);
        self
    }

    /// Exact, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&SpellDef> {
        self.spells.get(&name.to_ascii_lowercase())
    }

    /// An exact name wins; otherwise the prefix must be unique.
    pub fn find(&self, text: &str) -> Result<&SpellDef, LookupError> {
        let text = text.trim().to_ascii_lowercase();
        if text.is_empty() {
            return Err(LookupError::NotFound);
        }
        if let Some(spell) = self.spells.get(&text) {
            return Ok(spell);
        }
        let mut hits = self
            .spells
            .range(text.clone()..)
            .take_while(|(name, _)| name.starts_with(&text))
            .map(|(_, spell)| spell);
        match (hits.next(), hits.next()) {
            (Some(spell), None) => Ok(spell),
            (Some(_), Some(_)) => Err(LookupError::Ambiguous),
            (None, _) => Err(LookupError::NotFound),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpellDef> + '_ {
        self.spells.values()
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}

impl FromIterator<SpellDef> for SpellCatalog {
    fn from_iter<I: IntoIterator<Item = SpellDef>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for spell in iter {
            catalog.insert(spell);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SpellCatalog {
        [
            SpellDef::new("fly", "ward"),
            SpellDef::new("fireball", "bolt"),
            SpellDef::new("firestorm", "bolt"),
            SpellDef::new("heal", "heal"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn exact_name_beats_prefix() {
        let c = catalog();
        assert_eq!(c.find("FLY").map(|s| s.name.as_str()), Ok("fly"));
        assert_eq!(c.find("he").map(|s| s.name.as_str()), Ok("heal"));
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let c = catalog();
        assert_eq!(c.find("fire"), Err(LookupError::Ambiguous));
        assert_eq!(c.find("fireb").map(|s| s.name.as_str()), Ok("fireball"));
        assert_eq!(c.find("zap"), Err(LookupError::NotFound));
        assert_eq!(c.find(""), Err(LookupError::NotFound));
    }

    #[test]
    fn tier_sets_level_requirement() {
        let spell = SpellDef::new("x", "bolt");
        assert_eq!(spell.clone().with_tier(3).required_level(), 5);
        assert_eq!(spell.clone().with_tier(4).required_level(), 10);
        assert_eq!(spell.clone().with_tier(6).required_level(), 16);
        assert_eq!(spell.with_tier(1).required_level(), 0);
    }
}
