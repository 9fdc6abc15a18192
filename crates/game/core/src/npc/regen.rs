//! Creature recovery between fights.

use tracing::debug;

use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{ActorId, CooldownKind, EffectKind, MonsterFlags, Stat};

/// What one regeneration pass restored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    pub hp: i32,
    pub mp: i32,
    pub rehid: bool,
    pub calmed: bool,
}

impl Recovery {
    pub fn any(&self) -> bool {
        self.hp > 0 || self.mp > 0 || self.rehid || self.calmed
    }
}

/// Heals a creature on its own hit point and mana clocks.
///
/// Fast-tick creatures and regenerators recover quicker while nobody hostile
/// is around. Petrified or poisoned creatures do not recover at all. A
/// creature that was hidden slips back into the shadows once it has caught
/// its breath, and a calm creature at full health drops its rage.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn regenerate(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Recovery, CombatError> {
    let now = ctx.now;
    let enemy_near = ctx.world.enemy_near(monster);
    let me = ctx.actor(monster)?;
    if me.effects.has(EffectKind::Petrification, now) || me.effects.has(EffectKind::Poison, now) {
        return Ok(Recovery::default());
    }
    let flags = me.monster_flags;
    let fast = flags.contains(MonsterFlags::FAST_TICK) && !enemy_near;
    let regenerates = flags.contains(MonsterFlags::REGENERATES) && !enemy_near;
    let con = me.stats.bonus(Stat::Constitution);
    let pie = me.stats.bonus(Stat::Piety);

    let mut hp_wait = 60 - 5 * con;
    let power = if fast {
        hp_wait = (15 - 2 * con).max(1);
        1.0
    } else if regenerates {
        hp_wait /= 2;
        0.9
    } else {
        0.8
    };
    let mut mp_wait = 60 - 5 * pie;
    if fast {
        mp_wait = (5 - 2 * pie).max(1);
    } else if regenerates {
        mp_wait = mp_wait * 2 / 3;
    } else {
        mp_wait -= 5;
    }

    let mut out = Recovery::default();
    let me = ctx.actor_mut(monster)?;
    let hp_due = CombatConfig::seconds(hp_wait.max(1) as u64);
    if me.cooldowns.elapsed(CooldownKind::RegenPrimary, now) >= hp_due && !me.hp.is_full() {
        let amount = (f64::from(me.hp.max()) * 0.2).powf(power).round().max(1.0) as i32;
        out.hp = me.hp.increase(amount);
        me.cooldowns.stamp(CooldownKind::RegenPrimary, now);
    }
    let mp_due = CombatConfig::seconds(mp_wait.max(1) as u64);
    if me.cooldowns.elapsed(CooldownKind::RegenSecondary, now) >= mp_due && !me.mp.is_full() {
        let amount = (f64::from(me.mp.max()) * 0.2).powf(power).round().max(1.0) as i32;
        out.mp = me.mp.increase(amount);
        me.cooldowns.stamp(CooldownKind::RegenSecondary, now);
    }

    let steady = me.hp.cur() >= me.hp.max() / 4;
    if me.monster_flags.contains(MonsterFlags::WAS_HIDDEN) && !enemy_near && steady {
        me.monster_flags.remove(MonsterFlags::WAS_HIDDEN);
        me.monster_flags |= MonsterFlags::HIDDEN;
        out.rehid = true;
    }
    let calm = me.hp.is_full() && !enemy_near && me.effects.has(EffectKind::Berserk, now);
    if calm {
        me.effects.remove(EffectKind::Berserk);
        me.monster_flags |= MonsterFlags::WILL_BERSERK;
        out.calmed = true;
    }

    let name = ctx.name(monster);
    if out.rehid {
        ctx.broadcast_near(monster, &[monster], format!("{name} hides in shadows."));
    }
    if out.calmed {
        ctx.broadcast_near(monster, &[monster], format!("{name}'s rage diminishes!"));
    }
    if out.any() {
        debug!(target: "npc::controller", monster = %monster, hp = out.hp, mp = out.mp, "regenerated");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Env, FixedRng};
    use crate::state::{Actor, ActorKind, Effect, Pool, Room, RoomId, World};

    fn lair(hp: Pool, flags: MonsterFlags) -> (World, ActorId) {
        let mut world = World::new(3);
        world.add_room(Room::new(RoomId(0), "Lair"));
        let troll = world.spawn(|id| {
            let mut m = Actor::new(id, "troll", ActorKind::Monster);
            m.hp = hp;
            m.monster_flags = flags;
            m
        });
        (world, troll)
    }

    #[test]
    fn waits_out_the_constitution_clock() {
        let (mut world, troll) = lair(Pool::with_current(10, 100), MonsterFlags::empty());
        let config = CombatConfig::new();
        let early = CombatConfig::seconds(10);
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), early).unwrap();
        assert_eq!(regenerate(&mut ctx, troll).unwrap().hp, 0);

        let due = CombatConfig::seconds(60);
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), due).unwrap();
        // (100 * 0.2) ^ 0.8 rounds to 11.
        assert_eq!(regenerate(&mut ctx, troll).unwrap().hp, 11);
        assert_eq!(ctx.actor(troll).unwrap().hp.cur(), 21);
    }

    #[test]
    fn regenerators_heal_fast_and_full_power_when_alone() {
        let (mut world, troll) = lair(Pool::with_current(10, 100), MonsterFlags::FAST_TICK);
        let config = CombatConfig::new();
        let mut ctx =
            CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), CombatConfig::seconds(15)).unwrap();
        assert_eq!(regenerate(&mut ctx, troll).unwrap().hp, 20);
    }

    #[test]
    fn poison_stops_recovery() {
        let (mut world, troll) = lair(Pool::with_current(10, 100), MonsterFlags::FAST_TICK);
        world.actors.get_mut(troll).unwrap().effects.apply(Effect::permanent(EffectKind::Poison, 1), 0);
        let config = CombatConfig::new();
        let mut ctx =
            CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), CombatConfig::seconds(600)).unwrap();
        assert_eq!(regenerate(&mut ctx, troll).unwrap(), Recovery::default());
    }

    #[test]
    fn rested_creature_hides_again_and_calms_down() {
        let (mut world, troll) = lair(Pool::new(40), MonsterFlags::WAS_HIDDEN);
        world.actors.get_mut(troll).unwrap().effects.apply(Effect::permanent(EffectKind::Berserk, 1), 0);
        let config = CombatConfig::new();
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), 1).unwrap();
        let out = regenerate(&mut ctx, troll).unwrap();
        assert!(out.rehid && out.calmed);
        let me = ctx.actor(troll).unwrap();
        assert!(me.monster_flags.contains(MonsterFlags::HIDDEN | MonsterFlags::WILL_BERSERK));
        assert!(!me.effects.has(EffectKind::Berserk, 1));
    }
}
