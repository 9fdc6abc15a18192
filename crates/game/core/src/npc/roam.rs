//! Wandering, chasing and fleeing.
//!
//! A creature either stays, steps into a neighbouring room, or leaves the
//! world altogether. None of these ever happens with an enemy standing next
//! to it, except fleeing, which exists for exactly that case.

use tracing::{debug, info};

use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::npc::aggro::aggro_candidates;
use crate::state::{ActorId, CooldownKind, ExitFlags, MonsterFlags, RoomFlags, RoomId, WorldEvent};

/// What a wander check did with the creature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Roam {
    #[default]
    Stayed,
    Moved(RoomId),
    /// Left the world; the actor is gone from the arena.
    Departed,
}

impl Roam {
    /// The creature is done for this tick.
    pub fn acted(self) -> bool {
        self != Self::Stayed
    }
}

/// Removes a creature from the world after a farewell line.
pub fn depart(ctx: &mut CombatContext<'_>, monster: ActorId, farewell: &str) {
    let name = ctx.name(monster);
    ctx.broadcast_near(monster, &[monster], format!("{name} {farewell}"));
    ctx.world.forget(monster);
    ctx.world.actors.remove(monster);
    ctx.world.outbox.push(WorldEvent::Departed { actor: monster });
    info!(target: "npc::controller", monster = %monster, "departed");
}

fn staff_in_room(ctx: &CombatContext<'_>, room: RoomId) -> bool {
    ctx.world
        .players_in(room)
        .into_iter()
        .any(|p| ctx.world.actors.get(p).is_some_and(|a| a.is_staff()))
}

/// One step through a random usable exit.
///
/// Refused for non-mobile, permanent and exit-guarding creatures, with an
/// enemy near, into a full room, or across a construction boundary.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn mobile_step(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Option<RoomId>, CombatError> {
    let me = ctx.actor(monster)?;
    let flags = me.monster_flags;
    if !flags.contains(MonsterFlags::MOBILE)
        || flags.intersects(MonsterFlags::PERMANENT | MonsterFlags::PASSIVE_EXIT_GUARD)
        || ctx.world.enemy_near(monster)
    {
        return Ok(None);
    }
    let here = me.room;
    let Some(room) = ctx.world.room(here) else {
        return Ok(None);
    };
    let exits: Vec<usize> = room
        .exits
        .iter()
        .enumerate()
        .filter(|(_, e)| e.can_wander_through())
        .map(|(i, _)| i)
        .collect();
    if exits.is_empty() {
        return Ok(None);
    }
    let pick = exits[(ctx.rolls.range(1, exits.len() as i32) - 1) as usize];
    let (exit_name, to, closed) = {
        let exit = &room.exits[pick];
        (exit.name.clone(), exit.to, exit.flags.contains(ExitFlags::CLOSED))
    };
    let construction = room.has(RoomFlags::CONSTRUCTION);

    let Some(dest) = ctx.world.room(to) else {
        return Ok(None);
    };
    if dest.max_mobs > 0 && ctx.world.wild_monster_count(to) >= dest.max_mobs as usize {
        return Ok(None);
    }
    if dest.has(RoomFlags::CONSTRUCTION) != construction {
        return Ok(None);
    }

    let name = ctx.name(monster);
    if closed {
        if let Some(exit) = ctx.world.room_mut(here).and_then(|r| r.exits.get_mut(pick)) {
            exit.flags.remove(ExitFlags::CLOSED);
        }
        ctx.broadcast_near(monster, &[monster], format!("{name} just opened the {exit_name}."));
    }

    let dex = ctx.actor(monster)?.stats.dexterity;
    let me = ctx.actor_mut(monster)?;
    if me.monster_flags.contains(MonsterFlags::WILL_SNEAK | MonsterFlags::HIDDEN) {
        me.monster_flags |= MonsterFlags::SNEAKING;
    }
    let sneaking = me.monster_flags.contains(MonsterFlags::SNEAKING);
    let chasing = me
        .monster_flags
        .contains(MonsterFlags::CHASING_SOMEONE)
        .then(|| me.enemies.top_target())
        .flatten();

    if sneaking && ctx.rolls.range(1, 100) <= (3 + dex) * 3 {
        debug!(target: "npc::controller", monster = %monster, exit = %exit_name, "snuck out");
    } else {
        let line = match chasing {
            Some(quarry) => format!("{name} wanders to the {exit_name}, looking for {}.", ctx.name(quarry)),
            None => format!("{name} just wanders to the {exit_name}."),
        };
        ctx.broadcast_near(monster, &[monster], line);
        ctx.actor_mut(monster)?.monster_flags.remove(MonsterFlags::SNEAKING);
    }

    let now = ctx.now;
    ctx.world.move_actor(monster, to);
    ctx.actor_mut(monster)?.cooldowns.stamp(CooldownKind::Wander, now);
    debug!(target: "npc::controller", monster = %monster, from = %here, to = %to, "wandered");
    Ok(Some(to))
}

/// Decides whether a creature goes mobile, keeps moving, gives up a chase,
/// or wanders off for good.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn check_wander(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Roam, CombatError> {
    let now = ctx.now;
    let config = ctx.config;
    let me = ctx.actor(monster)?;
    let flags = me.monster_flags;
    let fast = flags.contains(MonsterFlags::FAST_WANDER);
    let permanent = flags.contains(MonsterFlags::PERMANENT);
    let since_wander = me.cooldowns.elapsed(CooldownKind::Wander, now);
    let has_enemy = !me.enemies.is_empty();
    let enemy_near = ctx.world.enemy_near(monster);
    let room = me.room;
    let is_pet = me.is_pet();
    let following = flags.contains(MonsterFlags::DM_FOLLOW) || me.master.is_some();

    // ----- already mobile -----
    let may_roam = if fast { !enemy_near } else { !has_enemy };
    if flags.contains(MonsterFlags::MOBILE)
        && (!permanent || fast)
        && may_roam
        && !following
        && !flags.contains(MonsterFlags::NO_WANDER)
    {
        let due = (fast && since_wander > CombatConfig::seconds(1))
            || (since_wander > config.mobile_interval && ctx.rolls.range(1, 100) > 20);
        if !due {
            return Ok(Roam::Stayed);
        }
        let lingering =
            fast && !aggro_candidates(ctx.world, monster, config.aggro_piety_ceiling, now).is_empty();
        let stepped = if lingering { None } else { mobile_step(ctx, monster)? };
        return Ok(match stepped {
            Some(to) => Roam::Moved(to),
            None => {
                ctx.actor_mut(monster)?.monster_flags.remove(MonsterFlags::MOBILE);
                Roam::Stayed
            }
        });
    }

    // ----- hunting a shoplifter -----
    if flags.contains(MonsterFlags::ATTACKING_SHOPLIFTER)
        && !enemy_near
        && since_wander > CombatConfig::seconds(60)
        && ctx.rolls.range(1, 100) <= (if permanent { 30 } else { 40 })
    {
        let name = ctx.name(monster);
        if fast || ctx.rolls.range(1, 100) < config.mobile_chance {
            ctx.actor_mut(monster)?.monster_flags |= MonsterFlags::MOBILE;
        } else if !flags.contains(MonsterFlags::CHASING_SOMEONE) {
            if permanent {
                ctx.broadcast_near(monster, &[monster], format!("{name} lets down its guard."));
                let me = ctx.actor_mut(monster)?;
                me.monster_flags.remove(MonsterFlags::ATTACKING_SHOPLIFTER);
                me.enemies.clear();
            } else {
                ctx.broadcast_near(monster, &[monster], format!("{name} mutters obscenities under its breath."));
                let me = ctx.actor_mut(monster)?;
                me.monster_flags.remove(
                    MonsterFlags::AGGRESSIVE_GOOD
                        | MonsterFlags::AGGRESSIVE_EVIL
                        | MonsterFlags::WILL_BE_AGGRESSIVE
                        | MonsterFlags::WILL_ASSIST,
                );
                me.monster_flags |=
                    MonsterFlags::FAST_WANDER | MonsterFlags::CHASING_SOMEONE | MonsterFlags::OUTLAW_AGGRO;
            }
        }

        let me = ctx.actor(monster)?;
        let chasing = me.monster_flags.contains(MonsterFlags::CHASING_SOMEONE);
        let quarry = me.enemies.top_target();
        if chasing && ctx.rolls.range(1, 100) < 10 {
            let farewell = match quarry {
                Some(quarry) => format!("gives up its search for {} and wanders away.", ctx.name(quarry)),
                None => "gives up its search and wanders away.".to_owned(),
            };
            depart(ctx, monster, &farewell);
            return Ok(Roam::Departed);
        }
    }

    // ----- bored bully -----
    let idle = ctx.actor(monster)?.cooldowns.elapsed(CooldownKind::AggroAction, now);
    if flags.contains(MonsterFlags::AGGRESSIVE)
        && !permanent
        && !enemy_near
        && idle > config.aggressive_idle
        && ctx.rolls.range(1, 100) < 5
    {
        depart(ctx, monster, "wanders away in search of someone to bully.");
        return Ok(Roam::Departed);
    }

    // ----- idle wandering -----
    let settled = flags.contains(MonsterFlags::HAS_SCAVENGED) || (permanent && !fast) || is_pet;
    if settled || flags.contains(MonsterFlags::DM_FOLLOW) {
        return Ok(Roam::Stayed);
    }
    let traffic = ctx.world.room(room).map_or(0, |r| r.traffic);
    let time_to_wander =
        since_wander > config.wander_interval && !has_enemy && ctx.rolls.range(1, 100) <= traffic;
    if !(time_to_wander || (fast && !enemy_near)) {
        if since_wander > config.wander_interval {
            ctx.actor_mut(monster)?.cooldowns.stamp(CooldownKind::Wander, now);
        }
        return Ok(Roam::Stayed);
    }

    ctx.actor_mut(monster)?.cooldowns.stamp(CooldownKind::Wander, now);
    let watched = staff_in_room(ctx, room);
    if fast {
        ctx.actor_mut(monster)?.monster_flags |= MonsterFlags::MOBILE;
        let chance = if has_enemy { 1 } else { 5 };
        if !permanent && !watched && ctx.rolls.range(1, 100) <= chance {
            depart(ctx, monster, "just wanders away.");
            return Ok(Roam::Departed);
        }
    } else if ctx.rolls.range(1, 100) < config.mobile_chance {
        ctx.actor_mut(monster)?.monster_flags |= MonsterFlags::MOBILE;
    } else if !watched && !has_enemy && !permanent {
        depart(ctx, monster, "just wanders away.");
        return Ok(Roam::Departed);
    }
    Ok(Roam::Stayed)
}

/// A wounded coward bolts through a random exit it can flee through.
///
/// Only for creatures flagged to flee, below a fifth of their hit points,
/// not permanent, and with an enemy in the room. Whoever was fighting it
/// loses track of it.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn check_flee(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Option<RoomId>, CombatError> {
    let me = ctx.actor(monster)?;
    let wants = me.monster_flags.contains(MonsterFlags::WILL_FLEE)
        && !me.monster_flags.contains(MonsterFlags::PERMANENT)
        && me.hp.cur() < me.hp.max() / 5;
    if !wants || !ctx.world.enemy_near(monster) {
        return Ok(None);
    }
    let here = me.room;
    let Some(room) = ctx.world.room(here) else {
        return Ok(None);
    };
    let exits: Vec<(String, RoomId)> = room
        .exits
        .iter()
        .filter(|e| e.can_flee_through() && !e.flags.contains(ExitFlags::LOCKED))
        .map(|e| (e.name.clone(), e.to))
        .collect();
    if exits.is_empty() {
        return Ok(None);
    }
    let (exit, to) = exits[(ctx.rolls.range(1, exits.len() as i32) - 1) as usize].clone();

    let name = ctx.name(monster);
    ctx.broadcast_near(monster, &[monster], format!("{name} flees to the {exit}."));
    for other in ctx.world.actors.iter_mut() {
        if other.room == here {
            other.enemies.remove(monster);
        }
    }
    ctx.world.move_actor(monster, to);
    info!(target: "npc::controller", monster = %monster, from = %here, to = %to, "fled");
    Ok(Some(to))
}
