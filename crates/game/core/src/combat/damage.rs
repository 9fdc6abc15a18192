//! Damage classification and the per-attack damage accumulator.

use crate::state::Realm;

// ============================================================================
// Damage Type
// ============================================================================

/// How a blow is delivered, which decides the pipeline stages it meets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageType {
    /// Weapons, fists, claws, bashes.
    Physical,
    /// Spells and magical specials.
    Magical,
    /// Life-draining touch; feeds drain.
    NegativeEnergy,
    /// Magic that also drains.
    MagicalNegative,
    /// Psychic assault; magical armor does not absorb it.
    Mental,
}

impl DamageType {
    pub const fn is_magical(self) -> bool {
        matches!(self, Self::Magical | Self::MagicalNegative)
    }

    pub const fn is_draining(self) -> bool {
        matches!(self, Self::NegativeEnergy | Self::MagicalNegative)
    }
}

// ============================================================================
// Damage Accumulator
// ============================================================================

/// Running totals for one blow.
///
/// Stack-local: built by the attacker, threaded through the modifier
/// pipeline, then realized against hit points. Never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Damage {
    /// Amount the defender will lose.
    pub damage: i32,
    /// Situational extra computed in a separate silent pass.
    pub bonus: i32,
    /// Portion transferred to the attacker.
    pub drain: i32,
    /// Amount reflect-magic bounced back at the caster.
    pub reflected: i32,
    /// Part of a physical reflection that was itself magic-reflected.
    pub double_reflected: i32,
    /// Damage a defensive shield returns to a physical attacker.
    pub physical_reflected: i32,
    /// Element of `physical_reflected`.
    pub physical_reflected_realm: Option<Realm>,
    /// Shield reflection carried by the bonus pass.
    pub physical_bonus_reflected: i32,
}

impl Damage {
    pub const fn new(damage: i32) -> Self {
        Self {
            damage,
            bonus: 0,
            drain: 0,
            reflected: 0,
            double_reflected: 0,
            physical_reflected: 0,
            physical_reflected_realm: None,
            physical_bonus_reflected: 0,
        }
    }

    /// Records a finished bonus pass.
    pub fn set_bonus(&mut self, bonus: &Damage) {
        self.bonus = bonus.damage;
        self.physical_bonus_reflected = bonus.physical_reflected;
    }

    /// Folds `1/fraction` of the bonus (and its shield reflection) in.
    /// Multi-swing weapons spread the bonus across their swings.
    pub fn include_bonus(&mut self, fraction: i32) {
        let fraction = fraction.max(1);
        self.damage += self.bonus / fraction;
        self.physical_reflected += self.physical_bonus_reflected / fraction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_is_split_across_swings() {
        let mut dmg = Damage::new(10);
        let mut bonus = Damage::new(9);
        bonus.physical_reflected = 6;
        dmg.set_bonus(&bonus);
        dmg.include_bonus(3);
        assert_eq!(dmg.damage, 13);
        assert_eq!(dmg.physical_reflected, 2);
    }
}
