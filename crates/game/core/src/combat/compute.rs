//! Raw damage for a connecting swing, before it is realized.
//!
//! A swing produces two numbers: the weapon roll and a "bonus" derived from
//! attack power. The bonus runs through the pipeline in its own silent pass
//! so narrative side effects fire once.

use tracing::trace;

use crate::combat::{
    AttackOutcome, AttackType, Damage, DamageType, Modifiers, OffGuard, Strike, modify_damage,
};
use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{
    Actor, ActorId, Class, Deity, EffectKind, Item, ItemFlags, NEUTRAL_ALIGNMENT, Skill, Stat, Tick,
    WeaponCategory, bonus as stat_bonus,
};

/// Hard ceiling on attack power.
pub const MAX_ATTACK_POWER: i32 = 1500;

/// Class-weighted offensive rating.
pub fn attack_power(actor: &Actor) -> i32 {
    let s = &actor.stats;
    let level = actor.level_i32();
    let power = match actor.class {
        Class::Fighter | Class::DungeonMaster => match actor.second_class {
            Some(Class::Mage) => s.strength * 2 + level,
            Some(Class::Thief) => s.strength * 2 + level * 4,
            _ => s.strength * 2 + level * 8,
        },
        Class::Berserker => s.strength * 2 + level * 8,
        Class::Paladin | Class::DeathKnight => s.strength + s.piety + level * 4,
        Class::Bard | Class::Werewolf | Class::Pureblood => s.strength * 2 + level * 4,
        Class::Ranger | Class::Thief | Class::Assassin | Class::Rogue | Class::Monk => {
            s.strength + s.dexterity + level * 4
        }
        Class::Druid => s.strength + level * 2,
        Class::Cleric => {
            let dex = if actor.second_class == Some(Class::Assassin) {
                s.dexterity
            } else {
                0
            };
            let favor = match actor.deity {
                Some(Deity::Ceris) => level,
                Some(Deity::Ares) => level * 8,
                _ => level * 2,
            };
            s.strength + dex + favor
        }
        Class::Lich | Class::Mage => {
            if matches!(actor.second_class, Some(Class::Thief | Class::Assassin)) {
                s.strength + s.dexterity + level * 2
            } else {
                s.strength
            }
        }
        _ => s.strength,
    };
    power.clamp(0, MAX_ATTACK_POWER)
}

/// Bonus damage before multipliers.
pub fn base_damage(actor: &Actor) -> i32 {
    attack_power(actor) / 15
}

/// What a weapon strikes with, or the bare-hand fallback.
pub fn strike_of(attacker: &Actor, weapon: Option<&Item>, now: Tick) -> Strike {
    match weapon.and_then(|w| w.category) {
        Some(category) => Strike {
            category,
            silver: weapon.is_some_and(|w| w.flags.contains(ItemFlags::SILVER)),
        },
        None => Strike::bare_hand(attacker, now),
    }
}

/// Half damage on a partial block.
pub const fn compute_block(damage: i32) -> i32 {
    damage / 2
}

/// One connecting swing as the attack loop sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blow {
    pub attack: AttackType,
    pub outcome: AttackOutcome,
    /// First swing of a multi-swing weapon, or any single swing.
    pub compute_bonus: bool,
    pub multiplier: f64,
}

impl Blow {
    pub const fn new(attack: AttackType, outcome: AttackOutcome) -> Self {
        Self {
            attack,
            outcome,
            compute_bonus: true,
            multiplier: 1.0,
        }
    }

    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub const fn without_bonus(mut self) -> Self {
        self.compute_bonus = false;
        self
    }
}

/// Damage a swing produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Computed {
    pub damage: Damage,
    /// Hit points the attacker's evil aura wants to drain.
    pub drain: i32,
    /// The weapon broke on a critical.
    pub shattered: bool,
}

/// Computes and pipelines a connecting swing by `attacker` at `victim`.
///
/// # Errors
///
/// Fails if either actor is missing or the victim is already dying.
pub fn compute_damage(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    weapon: Option<&Item>,
    blow: Blow,
) -> Result<Computed, CombatError> {
    if ctx.actor(attacker)?.is_player() {
        player_damage(ctx, attacker, victim, weapon, blow)
    } else {
        monster_damage(ctx, attacker, victim, weapon, blow)
    }
}

fn player_damage(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    weapon: Option<&Item>,
    blow: Blow,
) -> Result<Computed, CombatError> {
    let now = ctx.now;
    let me = ctx.actor(attacker)?;
    let level = me.level_i32();
    let class = me.class;
    let strength = me.stats.strength;
    let base = base_damage(me);
    let kick_skill = me.skill(Skill::Kick);
    let single_class = me.second_class.is_none();
    let fists = me.profile.damage;
    let alignment = me.alignment;
    let berserk = me.effects.has(EffectKind::Berserk, now);
    let lycan = me.effects.has(EffectKind::Lycanthropy, now);
    let frenzy = me.effects.has(EffectKind::Frenzy, now);
    let rages = class == Class::Berserker
        || (class == Class::Cleric && me.deity == Some(Deity::Ares))
        || me.is_staff();
    let staff = me.is_staff();
    let strike = strike_of(me, weapon, now);
    let them = ctx.actor(victim)?;
    let victim_evil = them.is_evil();
    let victim_alignment = them.alignment;

    let rolls = &mut ctx.rolls;
    let mut multiplier = blow.multiplier;
    let mut drain = 0;

    let (mut damage, mut bonus) = match blow.attack {
        AttackType::Kick => {
            let mut d = rolls.range(2, 6) + stat_bonus(strength);
            if matches!(class, Class::Fighter | Class::Monk) && single_class {
                d += kick_skill / 4;
            }
            (d, base / 2)
        }
        AttackType::Maul => {
            let d = rolls.range(level / 2, level + 1) + strength / 10 + rolls.range(2, 4);
            (d, base / 2)
        }
        _ => match weapon {
            Some(_) => (0, base),
            None if class == Class::Monk => {
                let mut d =
                    rolls.range(1, 2) + level / 3 + rolls.range(1 + level / 4, (1 + level) / 2);
                if strength < 90 {
                    d = (d - (90 - strength) / 10).max(1);
                }
                (d, base)
            }
            None => (fists.roll(rolls), base * 3 / 4),
        },
    };
    if !blow.compute_bonus {
        bonus = 0;
    }
    if let Some(w) = weapon {
        damage += w.damage.roll(rolls) + w.adjustment;
    }
    damage = damage.max(1);

    match class {
        Class::Paladin if alignment < 0 => {
            multiplier /= 2.0;
            ctx.tell(attacker, "Your evilness reduces your damage.");
        }
        Class::DeathKnight if alignment > 0 => {
            multiplier /= 2.0;
            ctx.tell(attacker, "Your goodness reduces your damage.");
        }
        _ => {}
    }

    if blow.compute_bonus {
        let rolls = &mut ctx.rolls;
        if class == Class::Paladin && alignment >= NEUTRAL_ALIGNMENT && victim_alignment <= 0 {
            bonus += rolls.range(1, 1 + level / 3);
        }
        if class == Class::DeathKnight && alignment <= -NEUTRAL_ALIGNMENT && !victim_evil {
            drain = rolls.range(1, 1 + level / 3);
        }
        if rages && berserk && weapon.is_some_and(|w| w.category != Some(WeaponCategory::Ranged)) {
            bonus += damage / 2;
        }
        if lycan && frenzy {
            bonus += rolls.range(3, 5);
        }
    }

    if blow.attack != AttackType::Kick && lycan && weapon.is_some() {
        ctx.tell(attacker, "How can you attack well with your paws full?");
        multiplier /= 2.0;
    }

    if multiplier > 0.0 {
        damage = (f64::from(damage) * multiplier) as i32;
        bonus = (f64::from(bonus) * multiplier) as i32;
    }

    let mut shattered = false;
    match blow.outcome {
        AttackOutcome::Critical => {
            let what = match blow.attack {
                AttackType::Bash => "bash",
                AttackType::Kick => "kick",
                _ => "hit",
            };
            ctx.tell(attacker, format!("CRITICAL {what}!"));
            let me = ctx.name(attacker);
            ctx.broadcast_near(attacker, &[attacker], format!("{me} made a critical {what}."));
            let mult = ctx.rolls.range(3, 5);
            damage *= mult;
            drain *= mult;
            bonus *= mult;
            if blow.attack != AttackType::Kick
                && let Some(w) = weapon
                && !staff
                && ctx.rolls.range(1, 200) <= 7 - w.adjustment * 2
            {
                ctx.tell(attacker, format!("Your {} shatters.", w.name));
                shattered = true;
            }
        }
        AttackOutcome::Glancing => {
            ctx.tell(attacker, "You only managed to score a glancing blow!");
            if ctx.rolls.range(1, 2) == 1 {
                damage /= 2;
                drain /= 2;
                bonus /= 2;
            } else {
                damage = damage * 2 / 3;
                drain = drain * 2 / 3;
                bonus = bonus * 2 / 3;
            }
        }
        AttackOutcome::Block => {
            damage = compute_block(damage);
            bonus = compute_block(bonus);
        }
        _ => {}
    }

    let mut dmg = Damage::new(damage);
    let offguard = if blow.compute_bonus {
        OffGuard::Keep
    } else {
        OffGuard::Remove
    };
    let mods = Modifiers::default().with_strike(strike);
    modify_damage(ctx, victim, Some(attacker), DamageType::Physical, &mut dmg, mods.with_offguard(offguard))?;

    if blow.compute_bonus {
        // Scaled to weapon speed so fast weapons do not stack bonus per swing.
        let delay = weapon.map_or(CombatConfig::DEFAULT_WEAPON_DELAY, |w| w.delay);
        let scaled = f64::from(bonus) / CombatConfig::DEFAULT_WEAPON_DELAY as f64 * delay as f64;
        let mut extra = Damage::new(scaled as i32);
        modify_damage(
            ctx,
            victim,
            Some(attacker),
            DamageType::Physical,
            &mut extra,
            mods.with_offguard(OffGuard::Silent).bonus(),
        )?;
        dmg.set_bonus(&extra);
    }

    if !shattered {
        dmg.damage = dmg.damage.max(1);
    }
    trace!(target: "combat::attack", attacker = %attacker, victim = %victim, damage = dmg.damage, bonus = dmg.bonus, drain, "player damage computed");
    Ok(Computed {
        damage: dmg,
        drain,
        shattered,
    })
}

fn monster_damage(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    weapon: Option<&Item>,
    blow: Blow,
) -> Result<Computed, CombatError> {
    let now = ctx.now;
    let me = ctx.actor(attacker)?;
    let bonus = if blow.compute_bonus { base_damage(me) } else { 0 };
    let natural = me.profile.damage;
    let str_bonus = me.stats.bonus(Stat::Strength);
    let strike = strike_of(me, weapon, now);

    let mut damage = match weapon {
        Some(w) => w.damage.roll(&mut ctx.rolls) + w.adjustment,
        None => natural.roll(&mut ctx.rolls),
    } + str_bonus;
    let mut extra = Damage::new(bonus);

    match blow.outcome {
        AttackOutcome::Critical => {
            let name = ctx.name(attacker);
            ctx.broadcast_near(attacker, &[], format!("{name} made a critical hit."));
            damage *= ctx.rolls.range(2, 5);
        }
        AttackOutcome::Block => {
            damage = compute_block(damage);
            extra.damage = compute_block(extra.damage);
        }
        _ => {}
    }

    let mods = Modifiers::default().with_strike(strike);
    let mut dmg = Damage::new(damage);
    modify_damage(ctx, victim, Some(attacker), DamageType::Physical, &mut dmg, mods)?;
    if ctx.is_alive(victim) {
        modify_damage(
            ctx,
            victim,
            Some(attacker),
            DamageType::Physical,
            &mut extra,
            mods.with_offguard(OffGuard::Silent).bonus(),
        )?;
    }
    dmg.set_bonus(&extra);
    dmg.damage = dmg.damage.max(1);
    Ok(Computed {
        damage: dmg,
        drain: 0,
        shattered: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Env, PcgRng};
    use crate::state::{ActorKind, Dice, Pool, Room, RoomId, Stats, World};

    #[test]
    fn attack_power_by_class() {
        let mut a = Actor::new(ActorId(1), "Ann", ActorKind::Player);
        a.stats = Stats::uniform(100);
        a.level = 10;
        a.class = Class::Fighter;
        assert_eq!(attack_power(&a), 280);
        a.second_class = Some(Class::Mage);
        assert_eq!(attack_power(&a), 210);
        a.class = Class::Cleric;
        a.second_class = None;
        a.deity = Some(Deity::Ares);
        assert_eq!(attack_power(&a), 180);
        a.class = Class::Mage;
        assert_eq!(attack_power(&a), 100);
        a.stats = Stats::uniform(400);
        a.class = Class::Berserker;
        a.level = 200;
        assert_eq!(attack_power(&a), MAX_ATTACK_POWER);
        assert_eq!(base_damage(&a), 100);
    }

    #[test]
    fn monster_hit_is_at_least_one() {
        let mut world = World::new(3);
        world.add_room(Room::new(RoomId(0), "Den"));
        let rat = world.spawn(|id| {
            let mut m = Actor::new(id, "rat", ActorKind::Monster);
            m.profile.damage = Dice::new(1, 2, 0);
            m.stats = Stats::uniform(10);
            m
        });
        let ann = world.spawn(|id| {
            let mut p = Actor::new(id, "Ann", ActorKind::Player);
            p.hp = Pool::new(50);
            p.armor = 500;
            p
        });
        let config = CombatConfig::new();
        let rng = PcgRng;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &rng), 7).unwrap();
        let out = compute_damage(&mut ctx, rat, ann, None, Blow::new(AttackType::Normal, AttackOutcome::Hit)).unwrap();
        assert!(out.damage.damage >= 1);
        assert!(!out.shattered);
    }

    #[test]
    fn block_halves() {
        assert_eq!(compute_block(9), 4);
    }
}
