//! Per-actor cooldown timers.
//!
//! Every timed gate is stored as `(last, interval)` against one monotonic
//! clock. "May I act now" is a comparison, never a scheduled callback.

use std::collections::BTreeMap;

use crate::state::Tick;

/// Action identifiers that own a cooldown slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CooldownKind {
    Attack,
    Spell,
    /// One slot per special attack, indexed by position on the creature.
    Special(u8),
    Kick,
    Bash,
    Maul,
    Ambush,
    /// Hit point regeneration tick.
    RegenPrimary,
    /// Mana regeneration tick.
    RegenSecondary,
    /// Idle timer that drives wander-away and go-mobile decisions.
    Wander,
    /// Interval between steps of a mobile creature.
    Mobile,
    Scavenge,
    ThiefSweep,
    /// Stamped whenever a creature takes part in a fight.
    AggroAction,
}

/// A single `(last, interval)` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cooldown {
    pub last: Tick,
    pub interval: u64,
}

impl Cooldown {
    #[inline]
    pub const fn ready_at(&self) -> Tick {
        self.last.saturating_add(self.interval)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cooldowns {
    slots: BTreeMap<CooldownKind, Cooldown>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the kind was never used or its interval has elapsed.
    pub fn ready(&self, kind: CooldownKind, now: Tick) -> bool {
        self.slots.get(&kind).is_none_or(|cd| now >= cd.ready_at())
    }

    /// Ticks until `kind` is ready; zero when ready.
    pub fn remaining(&self, kind: CooldownKind, now: Tick) -> u64 {
        self.slots
            .get(&kind)
            .map_or(0, |cd| cd.ready_at().saturating_sub(now))
    }

    pub fn set(&mut self, kind: CooldownKind, now: Tick, interval: u64) {
        self.slots.insert(kind, Cooldown { last: now, interval });
    }

    /// Restamps `last` while keeping the stored interval.
    pub fn stamp(&mut self, kind: CooldownKind, now: Tick) {
        self.slots.entry(kind).or_default().last = now;
    }

    /// Stretches or shortens the pending interval of `kind`.
    pub fn set_interval(&mut self, kind: CooldownKind, interval: u64) {
        self.slots.entry(kind).or_default().interval = interval;
    }

    pub fn get(&self, kind: CooldownKind) -> Option<Cooldown> {
        self.slots.get(&kind).copied()
    }

    /// Time of last use; zero if never used.
    pub fn last(&self, kind: CooldownKind) -> Tick {
        self.slots.get(&kind).map_or(0, |cd| cd.last)
    }

    /// Ticks since the last stamp of `kind`.
    pub fn elapsed(&self, kind: CooldownKind, now: Tick) -> u64 {
        now.saturating_sub(self.last(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_kind_is_ready() {
        let cds = Cooldowns::new();
        assert!(cds.ready(CooldownKind::Kick, 0));
        assert_eq!(cds.remaining(CooldownKind::Kick, 0), 0);
    }

    #[test]
    fn set_blocks_until_interval_elapses() {
        let mut cds = Cooldowns::new();
        cds.set(CooldownKind::Spell, 100, 50);
        assert!(!cds.ready(CooldownKind::Spell, 149));
        assert_eq!(cds.remaining(CooldownKind::Spell, 120), 30);
        assert!(cds.ready(CooldownKind::Spell, 150));
    }

    #[test]
    fn special_slots_are_independent() {
        let mut cds = Cooldowns::new();
        cds.set(CooldownKind::Special(0), 10, 100);
        assert!(!cds.ready(CooldownKind::Special(0), 20));
        assert!(cds.ready(CooldownKind::Special(1), 20));
    }
}
