//! Special attack definitions as loaded from monster templates.

use bitflags::bitflags;

use crate::state::{Dice, Realm, SaveCategory, Stat};

/// What a special attack does when it lands.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum SpecialType {
    // Elemental breath
    Earth,
    Wind,
    Fire,
    Water,
    Electric,
    Cold,
    /// Weapon-style strike that rolls an attack outcome first.
    Weapon,
    #[default]
    General,
    /// Status only: blind, poison, stun.
    NoDamage,
    /// Non-elemental breath such as poison gas.
    Breath,
    Steal,
    /// Costs experience instead of hit points.
    ExpDrain,
    Petrify,
    Confuse,
}

impl SpecialType {
    pub const fn realm(self) -> Option<Realm> {
        match self {
            Self::Earth => Some(Realm::Earth),
            Self::Wind => Some(Realm::Wind),
            Self::Fire => Some(Realm::Fire),
            Self::Water => Some(Realm::Water),
            Self::Electric => Some(Realm::Electric),
            Self::Cold => Some(Realm::Cold),
            _ => None,
        }
    }

    /// Types resolved by a registered handler rather than by rolling damage.
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Steal | Self::ExpDrain | Self::Petrify | Self::Confuse)
    }

    pub const fn deals_damage(self) -> bool {
        !matches!(
            self,
            Self::NoDamage | Self::Steal | Self::Petrify | Self::Confuse | Self::ExpDrain
        )
    }
}

/// Who a special attack lands on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetShape {
    /// The creature's current victim.
    #[default]
    Single,
    /// Every enemy of the attacker in the room.
    AllEnemies,
    /// Everyone in the room but the attacker.
    All,
    /// Players and pets.
    Players,
    /// Monsters that are not pets.
    Monsters,
}

impl TargetShape {
    pub const fn is_area(self) -> bool {
        !matches!(self, Self::Single)
    }
}

bitflags! {
    /// Conditions and riders on a special attack.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SpecialFlags: u64 {
        /// Attacker must be hidden; using the attack reveals them.
        const REQUIRE_HIDE          = 1 << 0;
        const NO_DODGE              = 1 << 1;
        const NO_PARRY              = 1 << 2;
        const NO_BLOCK              = 1 << 3;
        const UNDEAD_ONLY           = 1 << 4;
        const NO_UNDEAD             = 1 << 5;
        /// An undead attacker will not use it on an undead-warded target.
        const NO_UNDEAD_WARD        = 1 << 6;
        const NO_DRAIN_SHIELD       = 1 << 7;
        const UNDEAD_WARD_REDUCE    = 1 << 8;
        const INTELLIGENCE_REDUCE   = 1 << 9;
        const BERSERK_REDUCE        = 1 << 10;
        const DRAIN_SHIELD_REDUCE   = 1 << 11;
        /// A successful save negates the attack entirely.
        const SAVE_NO_DAMAGE        = 1 << 12;
        const HALF_HP_DAMAGE        = 1 << 13;
        const CAN_DISINTEGRATE      = 1 << 14;
        const RESIST_MAGIC_NO_DAMAGE = 1 << 15;
        const EARTH_SHIELD_REDUCE   = 1 << 16;
        const POISON                = 1 << 17;
        const DISEASE               = 1 << 18;
        const BLIND                 = 1 << 19;
        const ZAP_MANA              = 1 << 20;
        const RANDOMIZE_STUN        = 1 << 21;
        /// Attacker heals half the damage dealt.
        const DRAINS_DAMAGE         = 1 << 22;
        const DAY_ONLY              = 1 << 23;
        const NIGHT_ONLY            = 1 << 24;
        const CHECK_PHYSICAL_DAMAGE = 1 << 25;
        const CHECK_NEGATIVE_ENERGY = 1 << 26;
        /// Held back while the attacker is under a fifth of its hit points.
        const NO_ATTACK_ON_LOW_HP   = 1 << 27;
        /// Only between paladins and death knights.
        const HOLY_WAR              = 1 << 28;
        const NO_UNCONSCIOUS        = 1 << 29;
        const TARGET_NEEDS_MANA     = 1 << 30;
        const BREATHING_TARGETS     = 1 << 31;
    }
}

/// How the victim may resist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SaveType {
    #[default]
    None,
    Luck,
    Poison,
    Death,
    Breath,
    Mental,
    Spell,
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Piety,
    Level,
}

impl SaveType {
    /// Category saves roll against the victim's save table.
    pub const fn category(self) -> Option<SaveCategory> {
        match self {
            Self::Luck => Some(SaveCategory::Luck),
            Self::Poison => Some(SaveCategory::Poison),
            Self::Death => Some(SaveCategory::Death),
            Self::Breath => Some(SaveCategory::Breath),
            Self::Mental => Some(SaveCategory::Mental),
            Self::Spell => Some(SaveCategory::Spell),
            _ => None,
        }
    }

    /// Stat duels compare the attacker's stat with the victim's.
    pub const fn stat(self) -> Option<Stat> {
        match self {
            Self::Strength => Some(Stat::Strength),
            Self::Dexterity => Some(Stat::Dexterity),
            Self::Constitution => Some(Stat::Constitution),
            Self::Intelligence => Some(Stat::Intelligence),
            Self::Piety => Some(Stat::Piety),
            _ => None,
        }
    }
}

/// Extra help a category save gets from the level gap plus one stat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SaveBonus {
    #[default]
    None,
    LevelCon,
    LevelDex,
    LevelInt,
}

impl SaveBonus {
    pub const fn stat(self) -> Option<Stat> {
        match self {
            Self::None => None,
            Self::LevelCon => Some(Stat::Constitution),
            Self::LevelDex => Some(Stat::Dexterity),
            Self::LevelInt => Some(Stat::Intelligence),
        }
    }
}

/// Narration templates.
///
/// Tokens: `*ATTACKER*`, `*TARGET*` (or `*VICTIM*`), `*DAMAGE*`, `*CR*` for
/// a line break. Empty templates print nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpecialText {
    /// "*ATTACKER* *verb* *TARGET* for N damage".
    pub verb: String,
    pub target: String,
    pub room: String,
    pub target_fail: String,
    pub room_fail: String,
    pub target_save: String,
    pub room_save: String,
}

/// One special attack on a creature.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpecialAttack {
    pub name: String,
    pub kind: SpecialType,
    pub shape: TargetShape,
    pub flags: SpecialFlags,
    pub damage: Dice,
    /// Percent chance per try; above 100 always fires.
    pub chance: i32,
    /// Ticks between uses.
    pub delay: u64,
    /// Uses per lifetime; 0 is unlimited.
    pub limit: u32,
    /// Uses so far. Not persisted.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub used: u32,
    /// Stun length in seconds on a failed save.
    pub stun: i32,
    pub save: SaveType,
    pub save_bonus: SaveBonus,
    /// Cap on the save bonus; 0 means 100 and -1 means none allowed.
    pub max_bonus: i32,
    pub text: SpecialText,
}

impl Default for SpecialAttack {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: SpecialType::General,
            shape: TargetShape::Single,
            flags: SpecialFlags::empty(),
            damage: Dice::default(),
            chance: 101,
            delay: 0,
            limit: 0,
            used: 0,
            stun: 0,
            save: SaveType::None,
            save_bonus: SaveBonus::None,
            max_bonus: 0,
            text: SpecialText::default(),
        }
    }
}

impl SpecialAttack {
    pub fn new(name: &str, kind: SpecialType) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_damage(mut self, damage: Dice) -> Self {
        self.damage = damage;
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: TargetShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SpecialFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_chance(mut self, chance: i32) -> Self {
        self.chance = chance;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_stun(mut self, secs: i32) -> Self {
        self.stun = secs;
        self
    }

    #[must_use]
    pub fn with_save(mut self, save: SaveType, bonus: SaveBonus) -> Self {
        self.save = save;
        self.save_bonus = bonus;
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: SpecialText) -> Self {
        self.text = text;
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit > 0 && self.used >= self.limit
    }

    /// Clamped cap for the save bonus.
    pub fn save_cap(&self) -> i32 {
        match self.max_bonus {
            -1 => 0,
            0 => 100,
            cap => cap,
        }
    }
}

/// Fills a narration template.
pub fn render(template: &str, attacker: &str, target: &str, damage: Option<i32>) -> String {
    let mut out = template
        .replace("*ATTACKER*", attacker)
        .replace("*LOW-ATTACKER*", attacker)
        .replace("*TARGET*", target)
        .replace("*VICTIM*", target)
        .replace("*LOW-TARGET*", target)
        .replace("*LOW-VICTIM*", target)
        .replace("*CR*", "\n");
    if let Some(d) = damage {
        out = out.replace("*DAMAGE*", &d.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elemental_types_map_to_realms() {
        assert_eq!(SpecialType::Fire.realm(), Some(Realm::Fire));
        assert_eq!(SpecialType::Breath.realm(), None);
        assert!(SpecialType::Petrify.is_handled());
        assert!(!SpecialType::Confuse.deals_damage());
        assert_eq!("exp_drain".parse::<SpecialType>().ok(), Some(SpecialType::ExpDrain));
    }

    #[test]
    fn save_cap_reads_sentinels() {
        let mut s = SpecialAttack::new("bite", SpecialType::General);
        assert_eq!(s.save_cap(), 100);
        s.max_bonus = -1;
        assert_eq!(s.save_cap(), 0);
        s.max_bonus = 40;
        assert_eq!(s.save_cap(), 40);
    }

    #[test]
    fn templates_fill_names_and_damage() {
        let text = render("*ATTACKER* breathes on *TARGET* for *DAMAGE*!", "The wyrm", "Ann", Some(12));
        assert_eq!(text, "The wyrm breathes on Ann for 12!");
    }
}
