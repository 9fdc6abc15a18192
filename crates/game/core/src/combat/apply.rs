//! Realizing damage against hit points, reflection, and death.

use tracing::{debug, info};

use crate::combat::Damage;
use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{
    Actor, ActorId, CooldownKind, Effect, EffectKind, Item, PlayerFlags, Tick, WorldEvent,
};

/// Knocks `actor` senseless for `secs` seconds: no swings, kicks or spells.
pub fn stun(actor: &mut Actor, secs: i32, now: Tick) {
    if secs <= 0 {
        return;
    }
    let secs = secs as u64;
    let span = CombatConfig::seconds(secs + 1);
    actor.cooldowns.set(CooldownKind::Attack, now, span);
    actor.cooldowns.set(CooldownKind::Kick, now, span);
    actor.cooldowns.set(CooldownKind::Spell, now, span);
    actor
        .effects
        .apply(Effect::timed(EffectKind::Stunned, 1, now + CombatConfig::seconds(secs)), now);
}

/// Takes `amount` hit points from `target`. Monsters note the attacker as a
/// threat in proportion to what was actually lost.
///
/// Returns the hit points removed. Death is not processed here.
pub fn do_damage(
    ctx: &mut CombatContext<'_>,
    target: ActorId,
    attacker: Option<ActorId>,
    amount: i32,
) -> Result<i32, CombatError> {
    let now = ctx.now;
    let victim = ctx.actor_mut(target)?;
    if victim.is_dying() || amount <= 0 {
        return Ok(0);
    }
    let lost = victim.hp.decrease(amount);
    if victim.is_monster()
        && let Some(attacker) = attacker.filter(|a| *a != target)
    {
        victim.add_enemy(attacker, now);
        victim.enemies.adjust_threat(attacker, i64::from(lost));
    }
    debug!(target: "combat::apply", victim = %target, attacker = ?attacker, lost, hp = victim.hp.cur(), "damage applied");
    Ok(lost)
}

/// Applies what `victim`'s shields sent back at `attacker` after a blow.
///
/// Returns true if the attacker is now dying.
pub fn do_reflection_damage(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    dmg: &Damage,
) -> Result<bool, CombatError> {
    let (amount, shield) = if dmg.reflected > 0 {
        (dmg.reflected, "shield of magic")
    } else {
        (dmg.physical_reflected, "shield of fire")
    };
    if amount <= 0 {
        return Ok(false);
    }

    let (me, them) = (ctx.name(attacker), ctx.name(victim));
    ctx.tell(victim, format!("Your {shield} reflects {amount} damage."));
    ctx.tell(
        attacker,
        format!("{them}'s {shield} flares up and hits you for {amount} damage."),
    );
    ctx.broadcast_near(
        attacker,
        &[attacker, victim],
        format!("{them}'s {shield} flares up and hits {me} for {amount} damage."),
    );

    // A fire shield bounced by the attacker's own reflect-magic.
    if dmg.double_reflected > 0 {
        let bounce = Damage {
            reflected: dmg.double_reflected,
            ..Damage::default()
        };
        do_reflection_damage(ctx, victim, attacker, &bounce)?;
    }

    do_damage(ctx, attacker, Some(victim), amount)?;
    Ok(ctx.actor(attacker)?.is_dying())
}

/// Processes death if `victim` has run out of hit points.
///
/// Returns true if the victim died.
pub fn check_die(
    ctx: &mut CombatContext<'_>,
    victim: ActorId,
    killer: Option<ActorId>,
) -> Result<bool, CombatError> {
    match ctx.world.actors.get(victim) {
        Some(v) if v.is_dying() => {}
        _ => return Ok(false),
    }
    die(ctx, victim, killer)?;
    Ok(true)
}

/// Both combatants may have fallen in one exchange (a killing blow into a
/// fire shield). The victim is resolved first.
///
/// Returns `(victim_died, attacker_died)`.
pub fn simultaneous_death(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
) -> Result<(bool, bool), CombatError> {
    let victim_died = check_die(ctx, victim, Some(attacker))?;
    let attacker_died = check_die(ctx, attacker, Some(victim))?;
    Ok((victim_died, attacker_died))
}

fn die(
    ctx: &mut CombatContext<'_>,
    victim: ActorId,
    killer: Option<ActorId>,
) -> Result<(), CombatError> {
    let name = ctx.name(victim);
    let is_player = ctx.actor(victim)?.is_player();
    info!(target: "combat::apply", victim = %victim, killer = ?killer, "death");

    let dueled = killer.is_some_and(|k| {
        let duel = |a: ActorId, b: ActorId| {
            ctx.world
                .actors
                .get(a)
                .is_some_and(|x| x.duel_with == Some(b))
        };
        duel(k, victim) && duel(victim, k)
    });

    if is_player {
        let respawn = ctx.world.respawn_room;
        for other in ctx.world.actors.iter_mut() {
            other.enemies.remove(victim);
        }
        if let Some(k) = killer.and_then(|k| ctx.world.actors.get_mut(k))
            && dueled
        {
            k.duel_with = None;
        }
        let player = ctx.actor_mut(victim)?;
        player.enemies.clear();
        if dueled {
            player.duel_with = None;
            player.player_flags |= PlayerFlags::DIED_IN_DUEL;
            player.hp.set_cur(1);
        } else {
            let half = (player.hp.max() / 2).max(1);
            player.hp.set_cur(half);
        }
        ctx.tell(victim, "You have died.");
        ctx.broadcast_near(victim, &[victim], format!("{name} has been slain!"));
        if !dueled {
            ctx.world.move_actor(victim, respawn);
        }
    } else {
        ctx.broadcast_near(victim, &[], format!("{name} dies."));
        let Some(mut corpse) = ctx.world.actors.remove(victim) else {
            return Ok(());
        };
        let mut dropped: Vec<Item> = std::mem::take(&mut corpse.inventory);
        let slots = &mut corpse.equipment;
        dropped.extend(
            [
                slots.wield.take(),
                slots.held.take(),
                slots.shield.take(),
                slots.body.take(),
                slots.feet.take(),
            ]
            .into_iter()
            .flatten(),
        );
        if corpse.coins > 0 {
            dropped.push(Item::money(corpse.coins));
        }
        if let Some(room) = ctx.world.room_mut(corpse.room) {
            room.objects.extend(dropped);
        }
        ctx.world.forget(victim);
    }

    ctx.world.outbox.push(WorldEvent::Died { victim, killer });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Env, PcgRng};
    use crate::state::{ActorKind, Pool, Room, RoomId, WeaponCategory, World, Dice};

    fn setup() -> (World, ActorId, ActorId) {
        let mut world = World::new(5);
        world.add_room(Room::new(RoomId(0), "Pit"));
        world.add_room(Room::new(RoomId(1), "Temple"));
        world.respawn_room = RoomId(1);
        let a = world.spawn(|id| {
            let mut a = Actor::new(id, "Ann", ActorKind::Player);
            a.hp = Pool::new(40);
            a
        });
        let m = world.spawn(|id| {
            let mut m = Actor::new(id, "orc", ActorKind::Monster);
            m.hp = Pool::new(12);
            m.coins = 30;
            m.equipment.wield = Some(Item::weapon("axe", WeaponCategory::Chopping, Dice::new(1, 8, 0), 30));
            m
        });
        (world, a, m)
    }

    #[test]
    fn monster_records_threat_and_dies_with_loot() {
        let (mut world, a, m) = setup();
        let config = CombatConfig::new();
        let rng = PcgRng;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &rng), 50).unwrap();

        assert_eq!(do_damage(&mut ctx, m, Some(a), 5).unwrap(), 5);
        let orc = ctx.world.actors.get(m).unwrap();
        assert_eq!(orc.enemies.threat_of(a), Some(5));
        assert_eq!(orc.cooldowns.last(CooldownKind::AggroAction), 50);

        assert_eq!(do_damage(&mut ctx, m, Some(a), 50).unwrap(), 7);
        assert!(check_die(&mut ctx, m, Some(a)).unwrap());
        assert!(ctx.world.actors.get(m).is_none());
        let loot = &ctx.world.room(RoomId(0)).unwrap().objects;
        assert!(loot.iter().any(|i| i.name == "axe"));
        assert!(loot.iter().any(|i| i.is_money() && i.value == 30));
    }

    #[test]
    fn duel_loser_keeps_one_hit_point() {
        let (mut world, a, _) = setup();
        let b = world.spawn(|id| Actor::new(id, "Bex", ActorKind::Player));
        world.actors.get_mut(a).unwrap().duel_with = Some(b);
        world.actors.get_mut(b).unwrap().duel_with = Some(a);
        world.actors.get_mut(a).unwrap().hp.set_cur(0);

        let config = CombatConfig::new();
        let rng = PcgRng;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &rng), 0).unwrap();
        assert!(check_die(&mut ctx, a, Some(b)).unwrap());
        let ann = ctx.world.actors.get(a).unwrap();
        assert_eq!(ann.hp.cur(), 1);
        assert!(ann.player_flags.contains(PlayerFlags::DIED_IN_DUEL));
        assert_eq!(ann.room, RoomId(0));
    }

    #[test]
    fn stun_blocks_attacks_and_spells() {
        let mut a = Actor::new(ActorId(1), "Ann", ActorKind::Player);
        stun(&mut a, 3, 100);
        assert!(!a.cooldowns.ready(CooldownKind::Attack, 139));
        assert!(a.cooldowns.ready(CooldownKind::Spell, 140));
        assert!(a.effects.has(EffectKind::Stunned, 120));
    }
}
