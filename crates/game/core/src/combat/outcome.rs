//! Swing outcome classification.
//!
//! Each band's chance is in percent. The bands are stacked into cutoffs on
//! a 0..=10000 scale (percent × 100) in a fixed order, and a single roll
//! picks the band it lands in. Whatever remains above the last cutoff is a
//! plain hit.

use bitflags::bitflags;
use tracing::trace;

use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{
    Actor, ActorId, Class, CreatureType, Deity, EffectKind, Item, MonsterFlags, Skill, Tick,
    WeaponCategory,
};

/// Result of one swing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttackOutcome {
    Miss,
    Dodge,
    Parry,
    Glancing,
    Block,
    Critical,
    Fumble,
    Hit,
}

impl AttackOutcome {
    /// Outcomes that reach the damage pipeline.
    pub const fn connects(self) -> bool {
        matches!(self, Self::Hit | Self::Critical | Self::Block | Self::Glancing)
    }
}

bitflags! {
    /// Bands an attack type rules out, and the double-miss penalty.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct OutcomeFlags: u8 {
        const NO_DODGE    = 1 << 0;
        const NO_PARRY    = 1 << 1;
        const NO_GLANCING = 1 << 2;
        const NO_BLOCK    = 1 << 3;
        const NO_CRITICAL = 1 << 4;
        const NO_FUMBLE   = 1 << 5;
        const DOUBLE_MISS = 1 << 6;
    }
}

/// Per-band chances in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutcomeChances {
    pub miss: f64,
    pub dodge: f64,
    pub parry: f64,
    pub glancing: f64,
    pub block: f64,
    pub critical: f64,
    pub fumble: f64,
}

impl OutcomeChances {
    /// Maps a roll in `0..=10000` onto a band.
    pub fn classify(&self, roll: i32) -> AttackOutcome {
        let bands = [
            (self.miss, AttackOutcome::Miss),
            (self.dodge, AttackOutcome::Dodge),
            (self.parry, AttackOutcome::Parry),
            (self.glancing, AttackOutcome::Glancing),
            (self.block, AttackOutcome::Block),
            (self.critical, AttackOutcome::Critical),
            (self.fumble, AttackOutcome::Fumble),
        ];
        let mut cutoff = 0;
        for (chance, outcome) in bands {
            cutoff += (chance * 100.0) as i32;
            if roll < cutoff {
                return outcome;
            }
        }
        AttackOutcome::Hit
    }
}

// ============================================================================
// Skills
// ============================================================================

/// Offensive skill for a swing with `weapon` (or bare-handed).
pub fn weapon_skill(attacker: &Actor, weapon: Option<&Item>, now: Tick) -> i32 {
    if attacker.is_monster() {
        return attacker.profile.weapon_skill;
    }
    match weapon.and_then(|w| w.category) {
        Some(category) => attacker.skill(Skill::for_weapon(category)) + weapon.map_or(0, |w| w.adjustment),
        None if attacker.effects.has(EffectKind::Lycanthropy, now) => attacker.skill(Skill::Claw),
        None => attacker.skill(Skill::BareHand),
    }
}

pub fn defense_skill(victim: &Actor) -> i32 {
    if victim.is_monster() {
        victim.profile.defense_skill
    } else {
        victim.skill(Skill::Defense)
    }
}

/// Defense advantage scaled into percentage points.
pub fn adjust_chance(victim: &Actor, difference: i32) -> i32 {
    let adjustment = if difference > 0 {
        if victim.is_monster() && difference > 10 {
            0.4
        } else {
            0.1
        }
    } else {
        0.04
    };
    (f64::from(difference) * adjustment) as i32
}

// ============================================================================
// Bands
// ============================================================================

fn miss_chance(victim: &Actor, difference: i32) -> f64 {
    let base = if difference > 10 { 7.0 } else { 5.0 };
    let mut chance = base + f64::from(adjust_chance(victim, difference));
    if victim.is_player() {
        let roguish = matches!(victim.second_class, Some(Class::Thief | Class::Assassin));
        chance *= match victim.class {
            Class::Fighter | Class::Berserker => 0.7,
            Class::Monk | Class::Paladin | Class::DeathKnight | Class::Werewolf => 0.8,
            Class::Pureblood | Class::Bard => 0.9,
            Class::Cleric if victim.deity == Some(Deity::Ares) => 0.8,
            Class::Mage | Class::Lich if roguish => 0.8,
            _ => 1.0,
        };
    }
    chance.max(0.0)
}

fn can_dodge(victim: &Actor, attacker: &Actor, now: Tick) -> bool {
    if attacker.class == Class::DungeonMaster {
        return false;
    }
    if attacker.is_monster()
        && attacker.monster_flags.contains(MonsterFlags::UNKILLABLE)
        && !victim.is_caretaker()
    {
        return false;
    }
    if victim.is_player()
        && (victim.is_unconscious()
            || victim.effects.has(EffectKind::Stunned, now)
            || !victim.can_see(attacker, now)
            || victim.is_hidden())
    {
        return false;
    }
    true
}

fn dodge_chance(victim: &Actor, attacker: &Actor, difference: i32, now: Tick) -> f64 {
    if !can_dodge(victim, attacker, now) {
        return 0.0;
    }
    let dex = f64::from(victim.stats.dexterity);
    let piety = f64::from(victim.stats.piety);
    let roguish = matches!(victim.second_class, Some(Class::Thief | Class::Assassin));
    let base = if victim.is_player() {
        match victim.class {
            Class::Ranger | Class::Assassin => dex * 0.06,
            Class::Thief => dex * 0.075,
            Class::Rogue => dex * 0.08,
            Class::Fighter | Class::Berserker if roguish => dex * 0.07,
            Class::Fighter | Class::Berserker => 1.0 + dex * 0.045,
            Class::Bard
            | Class::Paladin
            | Class::DeathKnight
            | Class::Werewolf
            | Class::Pureblood
            | Class::Monk => 2.0 + dex * 0.05,
            Class::Cleric if victim.second_class == Some(Class::Assassin) => dex * 0.06,
            Class::Cleric if matches!(victim.deity, Some(Deity::Kamira | Deity::Arachnus)) => {
                piety * 0.05
            }
            Class::Cleric => 2.0 + dex * 0.05,
            Class::Mage | Class::Lich if roguish => dex * 0.07,
            Class::Mage | Class::Lich => 1.0 + dex * 0.06,
            _ => 0.0,
        }
    } else {
        5.0
    };
    (base + f64::from(adjust_chance(victim, difference))).max(0.0)
}

fn can_parry(victim: &Actor, attacker: &Actor) -> bool {
    if attacker.class == Class::DungeonMaster {
        return false;
    }
    if victim.is_monster() {
        return true;
    }
    if matches!(attacker.creature_type, CreatureType::Insect) {
        return false;
    }
    victim.equipment.wield.as_ref().is_some_and(|w| {
        !w.is_broken()
            && matches!(
                w.category,
                Some(WeaponCategory::Piercing | WeaponCategory::Slashing)
            )
    })
}

fn parry_chance(victim: &Actor, attacker: &Actor, difference: i32, now: Tick) -> f64 {
    if victim.is_player()
        && (!can_dodge(victim, attacker, now)
            || !can_parry(victim, attacker)
            || victim.skill(Skill::Parry) <= 0)
    {
        return 0.0;
    }
    let mut chance = f64::from(victim.stats.dexterity - 80) * 0.03
        + f64::from(adjust_chance(victim, difference));
    if matches!(
        attacker.creature_type,
        CreatureType::Dragon | CreatureType::Demon | CreatureType::Devil | CreatureType::Elemental
    ) {
        chance /= 2.0;
    }
    chance.max(0.0)
}

/// Players and pets glance off monsters of their level or higher.
fn glancing_chance(victim: &Actor, attacker: &Actor, difference: i32) -> f64 {
    if victim.is_player() || victim.is_pet() || (attacker.is_monster() && !attacker.is_pet()) {
        return 0.0;
    }
    if victim.level < attacker.level {
        return 0.0;
    }
    (10.0 + f64::from(difference) * 0.5).max(0.0)
}

fn block_chance(victim: &Actor, difference: i32) -> f64 {
    if victim.is_player()
        && (victim.skill(Skill::Block) <= 0 || victim.equipment.shield.is_none())
    {
        return 0.0;
    }
    let mut chance = 5.0 + f64::from(adjust_chance(victim, difference));
    if victim.is_monster() {
        chance = chance.min(5.0);
    }
    chance.max(0.0)
}

fn critical_chance(victim: &Actor, difference: i32) -> f64 {
    (5.0 - f64::from(adjust_chance(victim, difference))).max(0.0)
}

fn fumble_chance(attacker: &Actor, weapon: Option<&Item>) -> f64 {
    match (weapon, weapon.and_then(|w| w.category)) {
        (Some(_), Some(category)) if attacker.class != Class::DungeonMaster => {
            let skill = f64::from(attacker.skill(Skill::for_weapon(category)));
            (2.0 - skill / 151.0).max(0.0)
        }
        _ => 0.0,
    }
}

/// Band chances for `attacker` swinging `weapon` at `victim`.
///
/// `alt_skill` replaces the weapon skill for kick, bash and the like.
pub fn outcome_chances(
    attacker: &Actor,
    victim: &Actor,
    weapon: Option<&Item>,
    flags: OutcomeFlags,
    alt_skill: Option<i32>,
    now: Tick,
) -> OutcomeChances {
    let skill = alt_skill.unwrap_or_else(|| weapon_skill(attacker, weapon, now));
    let difference = defense_skill(victim) - skill;

    let mut miss = miss_chance(victim, difference);
    if let Some(blur) = victim.effects.strength(EffectKind::Blur, now) {
        miss += f64::from(blur);
    }
    if flags.contains(OutcomeFlags::DOUBLE_MISS) {
        miss *= 2.0;
    }

    let off = |flag: OutcomeFlags, value: f64| if flags.contains(flag) { 0.0 } else { value };
    OutcomeChances {
        miss,
        dodge: off(OutcomeFlags::NO_DODGE, dodge_chance(victim, attacker, difference, now)),
        parry: off(OutcomeFlags::NO_PARRY, parry_chance(victim, attacker, difference, now)),
        glancing: off(OutcomeFlags::NO_GLANCING, glancing_chance(victim, attacker, difference)),
        block: off(OutcomeFlags::NO_BLOCK, block_chance(victim, difference)),
        critical: off(OutcomeFlags::NO_CRITICAL, critical_chance(victim, difference)),
        fumble: off(OutcomeFlags::NO_FUMBLE, fumble_chance(attacker, weapon)),
    }
}

/// Rolls one swing.
///
/// # Errors
///
/// Fails if either actor is missing.
pub fn get_attack_result(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    weapon: Option<&Item>,
    flags: OutcomeFlags,
    alt_skill: Option<i32>,
) -> Result<AttackOutcome, CombatError> {
    let chances = outcome_chances(
        ctx.actor(attacker)?,
        ctx.actor(victim)?,
        weapon,
        flags,
        alt_skill,
        ctx.now,
    );
    let roll = ctx.rolls.range(0, 10_000);
    let outcome = chances.classify(roll);
    trace!(
        target: "combat::attack",
        attacker = %attacker,
        victim = %victim,
        roll,
        ?outcome,
        "swing classified"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorKind, Effect};

    #[test]
    fn cutoffs_stack_in_order() {
        let chances = OutcomeChances {
            miss: 5.0,
            dodge: 5.0,
            parry: 0.0,
            glancing: 10.0,
            block: 5.0,
            critical: 5.0,
            fumble: 2.0,
        };
        assert_eq!(chances.classify(0), AttackOutcome::Miss);
        assert_eq!(chances.classify(499), AttackOutcome::Miss);
        assert_eq!(chances.classify(500), AttackOutcome::Dodge);
        assert_eq!(chances.classify(1000), AttackOutcome::Glancing);
        assert_eq!(chances.classify(2000), AttackOutcome::Block);
        assert_eq!(chances.classify(2500), AttackOutcome::Critical);
        assert_eq!(chances.classify(3000), AttackOutcome::Fumble);
        assert_eq!(chances.classify(3200), AttackOutcome::Hit);
    }

    #[test]
    fn flags_remove_bands_and_blur_adds_miss() {
        let attacker = Actor::new(ActorId(1), "Ann", ActorKind::Player);
        let mut victim = Actor::new(ActorId(2), "rat", ActorKind::Monster);
        let plain = outcome_chances(&attacker, &victim, None, OutcomeFlags::empty(), None, 0);
        assert_eq!(plain.miss, 5.0);
        assert_eq!(plain.dodge, 5.0);

        victim.effects.apply(Effect::permanent(EffectKind::Blur, 4), 0);
        let flags = OutcomeFlags::NO_DODGE | OutcomeFlags::DOUBLE_MISS;
        let blurred = outcome_chances(&attacker, &victim, None, flags, None, 0);
        assert_eq!(blurred.miss, 18.0);
        assert_eq!(blurred.dodge, 0.0);
    }

    #[test]
    fn fighters_are_missed_less() {
        let attacker = Actor::new(ActorId(1), "orc", ActorKind::Monster);
        let mut victim = Actor::new(ActorId(2), "Ann", ActorKind::Player);
        victim.class = Class::Fighter;
        let chances = outcome_chances(&attacker, &victim, None, OutcomeFlags::empty(), None, 0);
        assert!((chances.miss - 3.5).abs() < 1e-9);
        // Players need the block skill and a shield.
        assert_eq!(chances.block, 0.0);
    }
}
