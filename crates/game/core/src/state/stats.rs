//! Numeric attributes and resource pools.
//!
//! Stats run on a 0..=400 scale; most formulas use the banded
//! [`bonus`] rather than the raw value.

use crate::config::CombatConfig;

/// The five primary attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Stat {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Piety,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub piety: i32,
}

impl Stats {
    pub const fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            dexterity: value,
            constitution: value,
            intelligence: value,
            piety: value,
        }
    }

    pub const fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Dexterity => self.dexterity,
            Stat::Constitution => self.constitution,
            Stat::Intelligence => self.intelligence,
            Stat::Piety => self.piety,
        }
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        let slot = match stat {
            Stat::Strength => &mut self.strength,
            Stat::Dexterity => &mut self.dexterity,
            Stat::Constitution => &mut self.constitution,
            Stat::Intelligence => &mut self.intelligence,
            Stat::Piety => &mut self.piety,
        };
        *slot = value.clamp(0, CombatConfig::MAX_STAT);
    }

    /// Banded bonus of one stat.
    pub fn bonus(&self, stat: Stat) -> i32 {
        bonus(self.get(stat))
    }
}

impl Default for Stats {
    /// Average adventurer: every stat in the zero-bonus band.
    fn default() -> Self {
        Self::uniform(100)
    }
}

/// Stat bonus, indexed by `stat / 10`.
const STAT_BONUS: [i32; 40] = [
    -4, -4, -4, // 0 - 2
    -3, -3, // 3 - 4
    -2, -2, // 5 - 6
    -1, // 7
    0, 0, 0, 0, 0, 0, // 8 - 13
    1, 1, 1, // 14 - 16
    2, 2, 2, 2, // 17 - 20
    3, 3, 3, 3, // 21 - 24
    4, 4, 4, // 25 - 27
    5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, // 28+
];

/// Maps a raw stat (0..=400) to its -4..=+5 bonus.
pub fn bonus(value: i32) -> i32 {
    let index = (value.clamp(0, CombatConfig::MAX_STAT) / 10) as usize;
    STAT_BONUS[index.min(STAT_BONUS.len() - 1)]
}

/// A current/max resource pair clamped to `[0, max]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool {
    cur: i32,
    max: i32,
}

impl Pool {
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { cur: max, max }
    }

    pub fn with_current(cur: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            cur: cur.clamp(0, max),
            max,
        }
    }

    #[inline]
    pub const fn cur(&self) -> i32 {
        self.cur
    }

    #[inline]
    pub const fn max(&self) -> i32 {
        self.max
    }

    #[inline]
    pub const fn is_full(&self) -> bool {
        self.cur >= self.max
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.cur <= 0
    }

    /// Adds up to `amount`, returning how much was actually gained.
    pub fn increase(&mut self, amount: i32) -> i32 {
        let before = self.cur;
        self.cur = (self.cur.saturating_add(amount.max(0))).min(self.max);
        self.cur - before
    }

    /// Removes up to `amount`, returning how much was actually lost.
    pub fn decrease(&mut self, amount: i32) -> i32 {
        let before = self.cur;
        self.cur = (self.cur.saturating_sub(amount.max(0))).max(0);
        before - self.cur
    }

    pub fn set_cur(&mut self, cur: i32) {
        self.cur = cur.clamp(0, self.max);
    }

    pub fn restore(&mut self) {
        self.cur = self.max;
    }
}
