//! Who a creature picks a fight with.

use tracing::debug;

use crate::context::CombatContext;
use crate::state::{Actor, ActorId, Class, CreatureType, Deity, EffectKind, MonsterFlags, PlayerFlags, Tick, World};

/// Faction regard at or below which a faction's creatures attack on sight.
pub const HOSTILE_REGARD: i32 = -250;

/// Whether `monster` would start a fight with `player` right now.
///
/// Hard exclusions come first, then the always-aggressive and faction
/// triggers, then the ways a creature spares kin, then the general
/// aggression flags and the race, class and deity lists.
pub fn will_aggro(monster: &Actor, player: &Actor, now: Tick) -> bool {
    if !player.is_player() || player.is_staff() || !monster.can_see(player, now) {
        return false;
    }
    if monster.is_enemy(player.id) {
        return false;
    }
    if player.is_unconscious() || player.effects.has(EffectKind::Petrification, now) {
        return false;
    }
    if monster.is_undead() && player.effects.has(EffectKind::UndeadWard, now) {
        return false;
    }

    let flags = monster.monster_flags;
    if flags.contains(MonsterFlags::UNKILLABLE) {
        return false;
    }
    if flags.contains(MonsterFlags::ALWAYS_AGGRESSIVE) {
        return true;
    }
    if let Some(faction) = &monster.profile.prime_faction
        && player
            .faction_regard
            .get(faction)
            .is_some_and(|regard| *regard <= HOSTILE_REGARD)
    {
        return true;
    }

    if spares(monster, player, now) {
        return false;
    }

    if flags.contains(MonsterFlags::AGGRESSIVE) {
        return true;
    }
    if flags.contains(MonsterFlags::AGGRESSIVE_GOOD) && player.is_good() {
        return true;
    }
    if flags.contains(MonsterFlags::AGGRESSIVE_EVIL) && player.is_evil() {
        return true;
    }
    if flags.contains(MonsterFlags::OUTLAW_AGGRO) && player.player_flags.contains(PlayerFlags::OUTLAW) {
        return true;
    }

    let profile = &monster.profile;
    profile.aggro_races.contains(&player.race)
        || profile
            .aggro_classes
            .iter()
            .any(|class| player.has_class(*class))
        || player
            .deity
            .is_some_and(|deity| profile.aggro_deities.contains(&deity))
}

/// Kinship that keeps an otherwise hostile creature calm.
fn spares(monster: &Actor, player: &Actor, now: Tick) -> bool {
    let aramon_cleric = player.class == Class::Cleric && player.deity == Some(Deity::Aramon);
    let shared = |kind| monster.effects.has(kind, now) && player.effects.has(kind, now);

    (monster.is_undead() && (player.is_undead() || aramon_cleric))
        || (monster.clan.is_some() && monster.clan == player.clan)
        || shared(EffectKind::Lycanthropy)
        || (monster.creature_type == CreatureType::Arachnid && aramon_cleric)
        || shared(EffectKind::Vampirism)
}

/// Visible, unhidden players in the monster's room it would attack, each
/// with its pick weight. Lower piety weighs more.
pub fn aggro_candidates(world: &World, monster: ActorId, ceiling: i32, now: Tick) -> Vec<(ActorId, i32)> {
    let Some(me) = world.actors.get(monster) else {
        return Vec::new();
    };
    world
        .players_in(me.room)
        .into_iter()
        .filter_map(|id| world.actors.get(id))
        .filter(|p| me.can_see(p, now) && !p.is_hidden() && will_aggro(me, p, now))
        .map(|p| (p.id, (ceiling - p.stats.piety).max(1)))
        .collect()
}

/// Picks the player the monster turns on, if any.
///
/// A lone candidate is chosen outright; otherwise one is drawn with
/// probability proportional to its weight.
pub fn who_to_aggro(ctx: &mut CombatContext<'_>, monster: ActorId) -> Option<ActorId> {
    let candidates = aggro_candidates(ctx.world, monster, ctx.config.aggro_piety_ceiling, ctx.now);
    let picked = match candidates.as_slice() {
        [] => None,
        [(only, _)] => Some(*only),
        many => {
            let total: i32 = many.iter().map(|(_, w)| w).sum();
            let pick = ctx.rolls.range(1, total);
            let mut running = 0;
            many.iter()
                .find(|(_, weight)| {
                    running += weight;
                    running >= pick
                })
                .map(|(id, _)| *id)
        }
    };
    if let Some(target) = picked {
        debug!(
            target: "npc::controller",
            monster = %monster,
            target = %target,
            candidates = candidates.len(),
            "aggro pick"
        );
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{Env, PcgRng};
    use crate::state::{ActorKind, Effect, Race, Room, RoomId};

    fn den(flags: MonsterFlags) -> (World, ActorId) {
        let mut world = World::new(9);
        world.add_room(Room::new(RoomId(0), "Den"));
        let wolf = world.spawn(|id| {
            let mut m = Actor::new(id, "wolf", ActorKind::Monster);
            m.monster_flags = flags;
            m
        });
        (world, wolf)
    }

    fn player(world: &mut World, name: &str, piety: i32) -> ActorId {
        world.spawn(|id| {
            let mut p = Actor::new(id, name, ActorKind::Player);
            p.stats.piety = piety;
            p
        })
    }

    #[test]
    fn lone_candidate_is_picked_outright() {
        let (mut world, wolf) = den(MonsterFlags::AGGRESSIVE);
        let ann = player(&mut world, "Ann", 100);
        let config = CombatConfig::new();
        let rng = PcgRng;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &rng), 50).unwrap();
        assert_eq!(who_to_aggro(&mut ctx, wolf), Some(ann));
    }

    #[test]
    fn weights_favor_low_piety() {
        let (mut world, wolf) = den(MonsterFlags::AGGRESSIVE);
        let saint = player(&mut world, "Saint", 400);
        let rogue = player(&mut world, "Rogue", 0);
        let got = aggro_candidates(&world, wolf, 300, 0);
        assert_eq!(got, vec![(saint, 1), (rogue, 300)]);
    }

    #[test]
    fn staff_hidden_and_existing_enemies_are_skipped() {
        let (mut world, wolf) = den(MonsterFlags::AGGRESSIVE);
        let dm = world.spawn(|id| {
            let mut p = Actor::new(id, "Dm", ActorKind::Player);
            p.class = Class::DungeonMaster;
            p
        });
        let sneak = world.spawn(|id| {
            let mut p = Actor::new(id, "Sneak", ActorKind::Player);
            p.player_flags |= PlayerFlags::HIDDEN;
            p
        });
        let foe = player(&mut world, "Foe", 100);
        world.actors.get_mut(wolf).unwrap().add_enemy(foe, 0);
        assert!(aggro_candidates(&world, wolf, 300, 0).is_empty());
        let me = world.actors.get(wolf).unwrap();
        assert!(!will_aggro(me, world.actors.get(dm).unwrap(), 0));
        assert!(will_aggro(me, world.actors.get(sneak).unwrap(), 0));
    }

    #[test]
    fn undead_spare_their_own_but_always_aggressive_does_not() {
        let (mut world, ghoul) = den(MonsterFlags::AGGRESSIVE | MonsterFlags::UNDEAD);
        let lich = world.spawn(|id| {
            let mut p = Actor::new(id, "Vex", ActorKind::Player);
            p.class = Class::Lich;
            p
        });
        let me = world.actors.get(ghoul).unwrap().clone();
        let vex = world.actors.get(lich).unwrap();
        assert!(!will_aggro(&me, vex, 0));

        let mut frenzied = me;
        frenzied.monster_flags |= MonsterFlags::ALWAYS_AGGRESSIVE;
        assert!(will_aggro(&frenzied, vex, 0));
    }

    #[test]
    fn race_lists_and_wards() {
        let (mut world, orc) = den(MonsterFlags::empty());
        world.actors.get_mut(orc).unwrap().profile.aggro_races = vec![Race::Elf];
        let elf = world.spawn(|id| {
            let mut p = Actor::new(id, "Lia", ActorKind::Player);
            p.race = Race::Elf;
            p
        });
        let dwarf = world.spawn(|id| {
            let mut p = Actor::new(id, "Bor", ActorKind::Player);
            p.race = Race::Dwarf;
            p
        });
        let me = world.actors.get(orc).unwrap();
        assert!(will_aggro(me, world.actors.get(elf).unwrap(), 0));
        assert!(!will_aggro(me, world.actors.get(dwarf).unwrap(), 0));

        let mut lia = world.actors.get(elf).unwrap().clone();
        lia.effects.apply(Effect::permanent(EffectKind::Petrification, 1), 0);
        assert!(!will_aggro(me, &lia, 0));
    }

    #[test]
    fn faction_enemies_are_attacked_on_sight() {
        let (mut world, guard) = den(MonsterFlags::empty());
        world.actors.get_mut(guard).unwrap().profile.prime_faction = Some("city".into());
        let thug = world.spawn(|id| {
            let mut p = Actor::new(id, "Thug", ActorKind::Player);
            p.faction_regard.insert("city".into(), -400);
            p
        });
        let me = world.actors.get(guard).unwrap();
        assert!(will_aggro(me, world.actors.get(thug).unwrap(), 0));
    }
}
