use crate::state::Tick;

/// Engine constants and tunable parameters.
///
/// Time values are in ticks; one tick is a tenth of a second.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// When set, players already in combat cannot be attacked by other players.
    pub pkill_in_combat_disabled: bool,

    /// Attack delay used for unarmed swings and for creatures joining a fight.
    pub default_weapon_delay: u64,

    /// Percent chance that an idle creature becomes mobile instead of wandering off.
    pub mobile_chance: i32,

    /// Armor reduction: `armor / (armor + base + per_level * attacker_level)`.
    pub armor_reduction_base: f64,
    pub armor_reduction_per_level: f64,
    pub armor_reduction_cap: f64,

    /// Players at or below this level are shielded from high-level players.
    pub newbie_level: u32,
    /// Players at or above this level cannot attack newbies.
    pub veteran_level: u32,

    /// Aggro weight is `max(1, ceiling - piety)`.
    pub aggro_piety_ceiling: i32,

    /// Minimum ticks between scavenge attempts and the chance per attempt.
    pub scavenge_interval: u64,
    pub scavenge_chance: i32,
    /// Minimum ticks between loot sweeps by thieving creatures.
    pub loot_interval: u64,

    /// Idle ticks before a creature may go mobile or wander off.
    pub wander_interval: u64,
    pub mobile_interval: u64,
    /// Ticks without combat after which an aggressive creature may leave.
    pub aggressive_idle: u64,

    /// Length of one game day; the middle half of it is daytime.
    pub day_length: u64,
}

impl CombatConfig {
    // ===== compile-time constants =====
    pub const TICKS_PER_SECOND: u64 = 10;
    /// Maximum distinct effects on one actor.
    pub const MAX_EFFECTS: usize = 32;
    /// Maximum special attacks on one creature.
    pub const MAX_SPECIALS: usize = 8;
    /// Highest stat value the bonus table distinguishes.
    pub const MAX_STAT: i32 = 400;
    /// Players shorter than this cannot be named by an aggressive search.
    pub const MIN_AGGRESSIVE_MATCH: usize = 3;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_WEAPON_DELAY: u64 = 30;
    pub const DEFAULT_MOBILE_CHANCE: i32 = 30;
    pub const DEFAULT_ARMOR_BASE: f64 = 43.24;
    pub const DEFAULT_ARMOR_PER_LEVEL: f64 = 18.38;
    pub const DEFAULT_ARMOR_CAP: f64 = 0.75;
    pub const DEFAULT_NEWBIE_LEVEL: u32 = 5;
    pub const DEFAULT_VETERAN_LEVEL: u32 = 10;
    pub const DEFAULT_AGGRO_PIETY_CEILING: i32 = 300;
    pub const DEFAULT_SCAVENGE_INTERVAL: u64 = 20 * Self::TICKS_PER_SECOND;
    pub const DEFAULT_SCAVENGE_CHANCE: i32 = 15;
    pub const DEFAULT_LOOT_INTERVAL: u64 = 5 * Self::TICKS_PER_SECOND;
    pub const DEFAULT_WANDER_INTERVAL: u64 = 60 * Self::TICKS_PER_SECOND;
    pub const DEFAULT_MOBILE_INTERVAL: u64 = 20 * Self::TICKS_PER_SECOND;
    pub const DEFAULT_AGGRESSIVE_IDLE: u64 = 1200 * Self::TICKS_PER_SECOND;
    pub const DEFAULT_DAY_LENGTH: u64 = 3600 * Self::TICKS_PER_SECOND;

    pub fn new() -> Self {
        Self {
            pkill_in_combat_disabled: false,
            default_weapon_delay: Self::DEFAULT_WEAPON_DELAY,
            mobile_chance: Self::DEFAULT_MOBILE_CHANCE,
            armor_reduction_base: Self::DEFAULT_ARMOR_BASE,
            armor_reduction_per_level: Self::DEFAULT_ARMOR_PER_LEVEL,
            armor_reduction_cap: Self::DEFAULT_ARMOR_CAP,
            newbie_level: Self::DEFAULT_NEWBIE_LEVEL,
            veteran_level: Self::DEFAULT_VETERAN_LEVEL,
            aggro_piety_ceiling: Self::DEFAULT_AGGRO_PIETY_CEILING,
            scavenge_interval: Self::DEFAULT_SCAVENGE_INTERVAL,
            scavenge_chance: Self::DEFAULT_SCAVENGE_CHANCE,
            loot_interval: Self::DEFAULT_LOOT_INTERVAL,
            wander_interval: Self::DEFAULT_WANDER_INTERVAL,
            mobile_interval: Self::DEFAULT_MOBILE_INTERVAL,
            aggressive_idle: Self::DEFAULT_AGGRESSIVE_IDLE,
            day_length: Self::DEFAULT_DAY_LENGTH,
        }
    }

    pub fn with_pkill_in_combat_disabled(mut self, disabled: bool) -> Self {
        self.pkill_in_combat_disabled = disabled;
        self
    }

    #[must_use]
    pub fn with_mobile_chance(mut self, percent: i32) -> Self {
        self.mobile_chance = percent;
        self
    }

    /// Converts whole seconds to ticks.
    pub const fn seconds(secs: u64) -> u64 {
        secs * Self::TICKS_PER_SECOND
    }

    pub fn is_daytime(&self, now: Tick) -> bool {
        let day = self.day_length.max(4);
        let phase = now % day;
        phase >= day / 4 && phase < day * 3 / 4
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
