//! Status effect store.
//!
//! Effects are named modifiers with a strength, an optional expiry and an
//! optional owner. An actor holds at most one instance of each kind; a second
//! application is resolved by the kind's [`StackRule`].
//!
//! # Tick-based Duration
//!
//! Effects store `expires_at: Option<Tick>`. `None` is permanent. A timed
//! effect is active while `now < expires_at`.

use core::fmt;
use core::str::FromStr;

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::{ActorId, Tick, WeaponCategory};

/// Elemental damage category.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Realm {
    Earth,
    #[strum(to_string = "air", serialize = "wind")]
    Wind,
    Fire,
    Water,
    Electric,
    Cold,
}

/// How an actor relates to a damage category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Affinity {
    Resist,
    Immune,
    Vulnerable,
}

impl Affinity {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Resist => "resist",
            Self::Immune => "immune",
            Self::Vulnerable => "vuln",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "resist" => Some(Self::Resist),
            "immune" => Some(Self::Immune),
            "vuln" => Some(Self::Vulnerable),
            _ => None,
        }
    }
}

/// Every named effect the engine reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    // ========================================================================
    // Crowd Control
    // ========================================================================
    Stunned,
    Blindness,
    Silence,
    Confusion,
    Drunkenness,
    Petrification,
    Charm,
    Fear,
    Hold,

    // ========================================================================
    // Buffs
    // ========================================================================
    Haste,
    Frenzy,
    Blur,
    Berserk,
    /// Absorbs damage until its strength is spent.
    Armor,
    /// Halves physical damage for `strength` hits.
    Stoneskin,
    EarthShield,
    /// Burns physical attackers for `strength` damage.
    FireShield,
    /// `strength` is the percent chance to reflect a spell.
    ReflectMagic,
    ResistMagic,
    DrainShield,
    UndeadWard,
    /// `strength` is the percent chance to block movement magic.
    DimensionalAnchor,
    Invisibility,
    DetectInvisible,

    // ========================================================================
    // Debuffs
    // ========================================================================
    Slow,
    Poison,
    Disease,

    // ========================================================================
    // Conditions
    // ========================================================================
    Lycanthropy,
    Vampirism,

    // ========================================================================
    // Affinities
    // ========================================================================
    Realm(Realm, Affinity),
    Weapon(WeaponCategory, Affinity),
}

/// What happens when an effect is applied on top of an existing instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackRule {
    /// Keep the stronger strength and the later expiry.
    Refresh,
    /// Add strengths, keep the later expiry.
    Stack,
    /// Leave the existing instance untouched.
    Reject,
}

const SIMPLE_KINDS: &[(EffectKind, &str)] = &[
    (EffectKind::Stunned, "stunned"),
    (EffectKind::Blindness, "blindness"),
    (EffectKind::Silence, "silence"),
    (EffectKind::Confusion, "confusion"),
    (EffectKind::Drunkenness, "drunkenness"),
    (EffectKind::Petrification, "petrification"),
    (EffectKind::Charm, "charm"),
    (EffectKind::Fear, "fear"),
    (EffectKind::Hold, "hold-person"),
    (EffectKind::Haste, "haste"),
    (EffectKind::Frenzy, "frenzy"),
    (EffectKind::Blur, "blur"),
    (EffectKind::Berserk, "berserk"),
    (EffectKind::Armor, "armor"),
    (EffectKind::Stoneskin, "stoneskin"),
    (EffectKind::EarthShield, "earth-shield"),
    (EffectKind::FireShield, "fire-shield"),
    (EffectKind::ReflectMagic, "reflect-magic"),
    (EffectKind::ResistMagic, "resist-magic"),
    (EffectKind::DrainShield, "drain-shield"),
    (EffectKind::UndeadWard, "undead-ward"),
    (EffectKind::DimensionalAnchor, "dimensional-anchor"),
    (EffectKind::Invisibility, "invisibility"),
    (EffectKind::DetectInvisible, "detect-invisible"),
    (EffectKind::Slow, "slow"),
    (EffectKind::Poison, "poison"),
    (EffectKind::Disease, "disease"),
    (EffectKind::Lycanthropy, "lycanthropy"),
    (EffectKind::Vampirism, "vampirism"),
];

impl EffectKind {
    pub const fn stack_rule(self) -> StackRule {
        match self {
            Self::Poison | Self::Disease => StackRule::Stack,
            Self::Petrification | Self::Charm => StackRule::Reject,
            _ => StackRule::Refresh,
        }
    }

    /// Movement and control effects that make a creature unable to act.
    pub const fn incapacitates(self) -> bool {
        matches!(self, Self::Petrification | Self::Hold | Self::Stunned)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Realm(realm, affinity) => write!(f, "{}-{}", affinity.prefix(), realm),
            Self::Weapon(category, affinity) => write!(f, "{}-{}", affinity.prefix(), category),
            other => {
                let name = SIMPLE_KINDS
                    .iter()
                    .find(|(kind, _)| kind == other)
                    .map_or("unknown", |(_, name)| name);
                f.write_str(name)
            }
        }
    }
}

/// Error returned when an effect name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown effect '{0}'")]
pub struct UnknownEffect(pub String);

impl FromStr for EffectKind {
    type Err = UnknownEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if let Some((kind, _)) = SIMPLE_KINDS.iter().find(|(_, name)| *name == lower) {
            return Ok(*kind);
        }
        if let Some((prefix, rest)) = lower.split_once('-')
            && let Some(affinity) = Affinity::from_prefix(prefix)
        {
            if let Ok(realm) = rest.parse::<Realm>() {
                return Ok(Self::Realm(realm, affinity));
            }
            if let Ok(category) = rest.parse::<WeaponCategory>() {
                return Ok(Self::Weapon(category, affinity));
            }
        }
        Err(UnknownEffect(s.to_owned()))
    }
}

/// A single active effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effect {
    pub kind: EffectKind,
    pub strength: i32,
    /// Tick at which the effect lapses; `None` is permanent.
    pub expires_at: Option<Tick>,
    /// Actor that cast or caused the effect.
    pub owner: Option<ActorId>,
}

impl Effect {
    pub const fn permanent(kind: EffectKind, strength: i32) -> Self {
        Self {
            kind,
            strength,
            expires_at: None,
            owner: None,
        }
    }

    pub const fn timed(kind: EffectKind, strength: i32, expires_at: Tick) -> Self {
        Self {
            kind,
            strength,
            expires_at: Some(expires_at),
            owner: None,
        }
    }

    #[must_use]
    pub const fn owned_by(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[inline]
    pub fn is_active(&self, now: Tick) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }

    fn later_expiry(a: Option<Tick>, b: Option<Tick>) -> Option<Tick> {
        match (a, b) {
            (None, _) | (_, None) => None,
            (Some(x), Some(y)) => Some(x.max(y)),
        }
    }
}

/// Result of applying an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Added,
    Refreshed,
    Stacked,
    Rejected,
    /// No free slot for a new kind.
    Full,
}

impl Applied {
    pub const fn took_hold(self) -> bool {
        matches!(self, Self::Added | Self::Refreshed | Self::Stacked)
    }
}

/// Active effects on an actor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSet {
    effects: ArrayVec<Effect, { CombatConfig::MAX_EFFECTS }>,
}

impl EffectSet {
    pub fn empty() -> Self {
        Self {
            effects: ArrayVec::new(),
        }
    }

    /// Checks if an effect is active at the given tick.
    pub fn has(&self, kind: EffectKind, now: Tick) -> bool {
        self.get(kind, now).is_some()
    }

    pub fn get(&self, kind: EffectKind, now: Tick) -> Option<&Effect> {
        self.effects
            .iter()
            .find(|e| e.kind == kind && e.is_active(now))
    }

    pub fn get_mut(&mut self, kind: EffectKind, now: Tick) -> Option<&mut Effect> {
        self.effects
            .iter_mut()
            .find(|e| e.kind == kind && e.is_active(now))
    }

    pub fn strength(&self, kind: EffectKind, now: Tick) -> Option<i32> {
        self.get(kind, now).map(|e| e.strength)
    }

    /// Applies an effect, honoring the kind's stacking rule.
    ///
    /// An expired instance of the same kind is overwritten as if absent.
    pub fn apply(&mut self, effect: Effect, now: Tick) -> Applied {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            if !existing.is_active(now) {
                *existing = effect;
                return Applied::Added;
            }
            return match effect.kind.stack_rule() {
                StackRule::Reject => Applied::Rejected,
                StackRule::Refresh => {
                    existing.strength = existing.strength.max(effect.strength);
                    existing.expires_at =
                        Effect::later_expiry(existing.expires_at, effect.expires_at);
                    if effect.owner.is_some() {
                        existing.owner = effect.owner;
                    }
                    Applied::Refreshed
                }
                StackRule::Stack => {
                    existing.strength = existing.strength.saturating_add(effect.strength);
                    existing.expires_at =
                        Effect::later_expiry(existing.expires_at, effect.expires_at);
                    Applied::Stacked
                }
            };
        }

        if self.effects.try_push(effect).is_err() {
            return Applied::Full;
        }
        Applied::Added
    }

    /// Removes an effect immediately. Returns true if it was present.
    pub fn remove(&mut self, kind: EffectKind) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind != kind);
        before != self.effects.len()
    }

    /// Removes every effect cast by `owner`.
    pub fn remove_owned_by(&mut self, owner: ActorId) {
        self.effects.retain(|e| e.owner != Some(owner));
    }

    /// Drops lapsed effects and reports which kinds lapsed.
    pub fn remove_expired(&mut self, now: Tick) -> Vec<EffectKind> {
        let lapsed: Vec<EffectKind> = self
            .effects
            .iter()
            .filter(|e| !e.is_active(now))
            .map(|e| e.kind)
            .collect();
        self.effects.retain(|e| e.is_active(now));
        lapsed
    }

    pub fn active_at(&self, now: Tick) -> impl Iterator<Item = &Effect> + '_ {
        self.effects.iter().filter(move |e| e.is_active(now))
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reapplying_refreshes_instead_of_duplicating() {
        let mut set = EffectSet::empty();
        assert_eq!(
            set.apply(Effect::timed(EffectKind::Haste, 1, 50), 0),
            Applied::Added
        );
        assert_eq!(
            set.apply(Effect::timed(EffectKind::Haste, 3, 20), 10),
            Applied::Refreshed
        );
        assert_eq!(set.active_at(10).count(), 1);
        let haste = set.get(EffectKind::Haste, 10).copied();
        assert_eq!(haste.map(|e| e.strength), Some(3));
        assert_eq!(haste.and_then(|e| e.expires_at), Some(50));
    }

    #[test]
    fn poison_stacks_and_petrification_rejects() {
        let mut set = EffectSet::empty();
        set.apply(Effect::timed(EffectKind::Poison, 2, 100), 0);
        assert_eq!(
            set.apply(Effect::timed(EffectKind::Poison, 3, 80), 0),
            Applied::Stacked
        );
        assert_eq!(set.strength(EffectKind::Poison, 0), Some(5));

        set.apply(Effect::permanent(EffectKind::Petrification, 1), 0);
        assert_eq!(
            set.apply(Effect::permanent(EffectKind::Petrification, 9), 0),
            Applied::Rejected
        );
        assert_eq!(set.strength(EffectKind::Petrification, 0), Some(1));
    }

    #[test]
    fn expired_effects_are_inactive_and_collected() {
        let mut set = EffectSet::empty();
        set.apply(Effect::timed(EffectKind::Blur, 5, 30), 0);
        set.apply(Effect::permanent(EffectKind::UndeadWard, 1), 0);
        assert!(set.has(EffectKind::Blur, 29));
        assert!(!set.has(EffectKind::Blur, 30));
        assert_eq!(set.remove_expired(30), vec![EffectKind::Blur]);
        assert!(set.has(EffectKind::UndeadWard, 10_000));
    }

    #[test]
    fn names_round_trip_through_display() {
        for name in ["reflect-magic", "resist-fire", "vuln-slashing", "immune-cold"] {
            let kind: EffectKind = name.parse().expect("known effect");
            assert_eq!(kind.to_string(), name);
        }
        assert!("resist-nothing".parse::<EffectKind>().is_err());
    }
}
