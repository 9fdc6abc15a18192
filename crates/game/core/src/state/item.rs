//! Objects: weapons, armor, loot, and what an actor has equipped.
//!
//! Items are plain values. An equipped weapon lives in its [`Equipment`]
//! slot, a carried one in the inventory, a dropped one in the room.

use crate::env::Roller;
use crate::state::{ItemFlags, TemplateId};

/// Damage family of a weapon, used for weapon-resistance effects.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WeaponCategory {
    Crushing,
    Piercing,
    Slashing,
    Chopping,
    Ranged,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Weapon,
    Armor,
    Money,
    Wand,
    Potion,
    #[default]
    Misc,
}

/// Where an item goes when worn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WearSlot {
    #[default]
    None,
    Wield,
    Held,
    Shield,
    Body,
    Feet,
}

/// `count`d`sides` + `plus`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
    pub plus: i32,
}

impl Dice {
    pub const fn new(count: u32, sides: u32, plus: i32) -> Self {
        Self { count, sides, plus }
    }

    pub fn roll(&self, roller: &mut Roller<'_>) -> i32 {
        roller.dice(self.count, self.sides) + self.plus
    }

    /// Expected value, used for balance checks and previews.
    pub fn average(&self) -> i32 {
        (self.count as i32 * (self.sides as i32 + 1)) / 2 + self.plus
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Item {
    pub name: String,
    pub template: TemplateId,
    pub kind: ItemKind,
    pub wear: WearSlot,
    pub category: Option<WeaponCategory>,
    pub damage: Dice,
    /// Magical plus; adds to hit skill and damage.
    pub adjustment: i32,
    /// Ticks between swings.
    pub delay: u64,
    /// Maximum swings per attack; 0 and 1 both mean a single swing.
    pub num_attacks: u32,
    /// Durability. A weapon at zero shots is broken.
    pub shots_cur: i32,
    pub shots_max: i32,
    /// Remaining procs of `cast_spell`.
    pub charges: i32,
    pub cast_spell: Option<String>,
    pub armor: i32,
    pub weight: i32,
    /// Coin amount for money, worth in gold otherwise.
    pub value: i64,
    pub flags: ItemFlags,
}

impl Item {
    pub fn weapon(name: &str, category: WeaponCategory, damage: Dice, delay: u64) -> Self {
        Self {
            name: name.to_owned(),
            kind: ItemKind::Weapon,
            wear: WearSlot::Wield,
            category: Some(category),
            damage,
            delay,
            num_attacks: 1,
            shots_cur: 50,
            shots_max: 50,
            ..Self::default()
        }
    }

    pub fn money(amount: i64) -> Self {
        Self {
            name: format!("{amount} gold coins"),
            kind: ItemKind::Money,
            value: amount,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_num_attacks(mut self, n: u32) -> Self {
        self.num_attacks = n;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_cast(mut self, spell: &str, charges: i32) -> Self {
        self.cast_spell = Some(spell.to_owned());
        self.charges = charges;
        self
    }

    #[must_use]
    pub fn with_shots(mut self, shots: i32) -> Self {
        self.shots_cur = shots;
        self.shots_max = shots.max(self.shots_max);
        self
    }

    #[inline]
    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon
    }

    #[inline]
    pub fn is_money(&self) -> bool {
        self.kind == ItemKind::Money
    }

    pub fn is_broken(&self) -> bool {
        self.is_weapon() && self.shots_cur <= 0
    }

    /// Swings per attack, never less than one.
    pub fn max_attacks(&self) -> u32 {
        self.num_attacks.max(1)
    }

    /// Lowercase word match used by name searches.
    pub fn matches(&self, fragment: &str) -> bool {
        let fragment = fragment.to_ascii_lowercase();
        self.name
            .to_ascii_lowercase()
            .split_whitespace()
            .any(|word| word.starts_with(&fragment))
    }
}

/// Equipped items. Slots hold values, not handles.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equipment {
    pub wield: Option<Item>,
    /// Off hand: a second weapon or a held trinket.
    pub held: Option<Item>,
    pub shield: Option<Item>,
    pub body: Option<Item>,
    pub feet: Option<Item>,
}

impl Equipment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The off-hand item if it is a second weapon.
    pub fn off_hand_weapon(&self) -> Option<&Item> {
        self.held
            .as_ref()
            .filter(|item| item.is_weapon() && item.wear == WearSlot::Wield)
    }

    pub fn take_wield(&mut self) -> Option<Item> {
        self.wield.take()
    }

    /// Moves the off-hand weapon into the main hand.
    pub fn promote_off_hand(&mut self) {
        if self.wield.is_none() && self.off_hand_weapon().is_some() {
            self.wield = self.held.take();
        }
    }

    pub fn total_armor(&self) -> i32 {
        [&self.wield, &self.held, &self.shield, &self.body, &self.feet]
            .into_iter()
            .flatten()
            .map(|item| item.armor)
            .sum()
    }

    pub fn carried_weight(&self) -> i32 {
        [&self.wield, &self.held, &self.shield, &self.body, &self.feet]
            .into_iter()
            .flatten()
            .map(|item| item.weight)
            .sum()
    }
}
