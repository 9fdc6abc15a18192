//! Creatures joining fights: assist lists, called-for help and sworn
//! enemies among other monsters.

use tracing::debug;

use crate::combat::current_target;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{ActorId, CooldownKind, MonsterFlags};

/// Joining a fight costs a full default weapon delay before the first swing.
fn join(ctx: &mut CombatContext<'_>, joiner: ActorId, target: ActorId) -> Result<(), CombatError> {
    let (now, delay) = (ctx.now, ctx.config.default_weapon_delay);
    let me = ctx.actor_mut(joiner)?;
    me.cooldowns.set(CooldownKind::Attack, now, delay);
    me.add_enemy(target, now);
    me.monster_flags |= MonsterFlags::ALWAYS_ACTIVE;
    Ok(())
}

/// Pulls this creature and its allies into fights.
///
/// A creature with an assist list joins any same-room fight a listed
/// creature is already in. A creature that is fighting a player and is
/// flagged to be assisted, or belongs to a faction, calls idle helpers in
/// the player's room. Returns how many creatures joined.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn check_assist(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<usize, CombatError> {
    let mut joined = 0;
    let me = ctx.actor(monster)?;
    let (room, assist_list) = (me.room, me.profile.assist_list.clone());

    if !assist_list.is_empty() {
        for ally in ctx.world.monsters_in(room) {
            if ally == monster {
                continue;
            }
            let listed = ctx.world.actors.get(ally).is_some_and(|a| {
                !a.enemies.is_empty()
                    && !a.profile.template.is_none()
                    && assist_list.contains(&a.profile.template)
            });
            if !listed {
                continue;
            }
            let Some(foe) = current_target(ctx, ally) else {
                continue;
            };
            let me = ctx.actor(monster)?;
            let here = ctx.world.actors.get(foe).is_some_and(|f| f.room == me.room);
            if here && !me.is_enemy(foe) {
                join(ctx, monster, foe)?;
                joined += 1;
                debug!(
                    target: "npc::controller",
                    monster = %monster,
                    ally = %ally,
                    foe = %foe,
                    "joined ally's fight"
                );
            }
        }
    }

    let me = ctx.actor(monster)?;
    let faction = me.profile.prime_faction.clone();
    let wants_help = me.monster_flags.contains(MonsterFlags::WILL_BE_ASSISTED);
    if !(wants_help || faction.is_some()) || me.enemies.is_empty() {
        return Ok(joined);
    }
    let Some(foe) = current_target(ctx, monster) else {
        return Ok(joined);
    };
    let Some(foe_room) = ctx
        .world
        .actors
        .get(foe)
        .filter(|f| f.is_player())
        .map(|f| f.room)
    else {
        return Ok(joined);
    };

    for helper in ctx.world.monsters_in(foe_room) {
        if helper == monster {
            continue;
        }
        let (Some(h), Some(f)) = (ctx.world.actors.get(helper), ctx.world.actors.get(foe)) else {
            continue;
        };
        if !h.enemies.is_empty() || !h.can_see(f, ctx.now) {
            continue;
        }
        let assists = (h.monster_flags.contains(MonsterFlags::WILL_ASSIST) && wants_help)
            || (h.monster_flags.contains(MonsterFlags::FACTION_ASSIST)
                && faction.is_some()
                && h.profile.prime_faction == faction);
        if !assists {
            continue;
        }
        let (who, whom) = (ctx.name(helper), ctx.name(monster));
        ctx.tell(foe, format!("{who} quickly assists {whom}!"));
        join(ctx, helper, foe)?;
        joined += 1;
    }
    Ok(joined)
}

/// One time in four, a creature with no enemy near attacks a creature
/// from its enemy list standing in the same room.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn check_enemy_mobs(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Option<ActorId>, CombatError> {
    let me = ctx.actor(monster)?;
    if me.profile.enemy_mobs.is_empty() || ctx.world.enemy_near(monster) {
        return Ok(None);
    }
    let (room, hated) = (me.room, me.profile.enemy_mobs.clone());
    if ctx.rolls.range(1, 100) > 25 {
        return Ok(None);
    }

    let victim = ctx.world.monsters_in(room).into_iter().find(|id| {
        *id != monster
            && ctx.world.actors.get(*id).is_some_and(|m| {
                !m.profile.template.is_none() && hated.contains(&m.profile.template)
            })
    });
    let Some(victim) = victim else {
        return Ok(None);
    };

    let (me_name, them) = (ctx.name(monster), ctx.name(victim));
    ctx.broadcast_near(monster, &[], format!("{me_name} yells, \"Die!\"\n{me_name} attacks {them}!"));
    join(ctx, monster, victim)?;
    debug!(target: "npc::controller", monster = %monster, victim = %victim, "attacked sworn enemy");
    Ok(Some(victim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{Env, FixedRng};
    use crate::state::{Actor, ActorKind, Room, RoomId, TemplateId, World};

    const LOW: FixedRng = FixedRng(0);
    const HIGH: FixedRng = FixedRng(99);

    fn monster(world: &mut World, name: &str, template: u32, room: RoomId) -> ActorId {
        world.spawn(|id| {
            let mut m = Actor::new(id, name, ActorKind::Monster);
            m.profile.template = TemplateId(template);
            m.room = room;
            m
        })
    }

    fn hall() -> World {
        let mut world = World::new(3);
        world.add_room(Room::new(RoomId(0), "Hall"));
        world.add_room(Room::new(RoomId(1), "Yard"));
        world
    }

    #[test]
    fn assist_list_joins_with_a_swing_penalty() {
        let mut world = hall();
        let captain = monster(&mut world, "captain", 10, RoomId(0));
        let guard = monster(&mut world, "guard", 11, RoomId(0));
        let ann = world.spawn(|id| Actor::new(id, "Ann", ActorKind::Player));
        world.actors.get_mut(captain).unwrap().add_enemy(ann, 0);
        world.actors.get_mut(guard).unwrap().profile.assist_list = vec![TemplateId(10)];

        let config = CombatConfig::new();
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &LOW), 100).unwrap();
        assert_eq!(check_assist(&mut ctx, guard).unwrap(), 1);
        let g = ctx.actor(guard).unwrap();
        assert!(g.is_enemy(ann));
        assert_eq!(g.cooldowns.remaining(CooldownKind::Attack, 100), config.default_weapon_delay);
        assert!(g.monster_flags.contains(MonsterFlags::ALWAYS_ACTIVE));

        // Already fighting: nothing more to join.
        assert_eq!(check_assist(&mut ctx, guard).unwrap(), 0);
    }

    #[test]
    fn called_help_comes_from_the_players_room() {
        let mut world = hall();
        let boss = monster(&mut world, "boss", 20, RoomId(0));
        let helper = monster(&mut world, "lackey", 21, RoomId(0));
        let faraway = monster(&mut world, "sentry", 22, RoomId(1));
        let ann = world.spawn(|id| Actor::new(id, "Ann", ActorKind::Player));
        {
            let b = world.actors.get_mut(boss).unwrap();
            b.monster_flags |= MonsterFlags::WILL_BE_ASSISTED;
            b.add_enemy(ann, 0);
        }
        for id in [helper, faraway] {
            world.actors.get_mut(id).unwrap().monster_flags |= MonsterFlags::WILL_ASSIST;
        }

        let config = CombatConfig::new();
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &LOW), 100).unwrap();
        assert_eq!(check_assist(&mut ctx, boss).unwrap(), 1);
        assert!(ctx.actor(helper).unwrap().is_enemy(ann));
        assert!(!ctx.actor(faraway).unwrap().is_enemy(ann));
        let heard = ctx
            .world
            .drain_events()
            .iter()
            .filter_map(|e| e.text().map(str::to_owned))
            .any(|t| t == "lackey quickly assists boss!");
        assert!(heard);
    }

    #[test]
    fn enemy_mobs_fight_one_time_in_four() {
        let mut world = hall();
        let cat = monster(&mut world, "cat", 30, RoomId(0));
        let mouse = monster(&mut world, "mouse", 31, RoomId(0));
        world.actors.get_mut(cat).unwrap().profile.enemy_mobs = vec![TemplateId(31)];
        let config = CombatConfig::new();

        let mut calm = CombatContext::new(&mut world, Env::combat_only(&config, &HIGH), 5).unwrap();
        assert_eq!(check_enemy_mobs(&mut calm, cat).unwrap(), None);

        let mut angry = CombatContext::new(&mut world, Env::combat_only(&config, &LOW), 5).unwrap();
        assert_eq!(check_enemy_mobs(&mut angry, cat).unwrap(), Some(mouse));
        assert!(angry.actor(cat).unwrap().is_enemy(mouse));

        // An enemy nearby keeps it busy.
        assert_eq!(check_enemy_mobs(&mut angry, cat).unwrap(), None);
    }
}
