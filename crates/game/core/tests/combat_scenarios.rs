//! Whole-action scenarios through the public combat API.

use combat_core::combat::{AttackOutcome, AttackStatus, AttackType, attack_creature};
use combat_core::env::{Env, FixedRng, PcgRng};
use combat_core::state::{
    Actor, ActorId, ActorKind, CooldownKind, Dice, Item, MonsterFlags, Pool, Room, RoomId,
    WeaponCategory, World,
};
use combat_core::{CombatConfig, CombatContext};

fn duel(seed: u64, weapon: Item) -> (World, ActorId, ActorId) {
    let mut world = World::new(seed);
    world.add_room(Room::new(RoomId(0), "Pit"));
    let hero = world.spawn(|id| {
        let mut a = Actor::new(id, "Ann", ActorKind::Player);
        a.level = 20;
        a.hp = Pool::new(200);
        a.equipment.wield = Some(weapon);
        a
    });
    let ogre = world.spawn(|id| {
        let mut m = Actor::new(id, "ogre", ActorKind::Monster);
        m.level = 5;
        m.hp = Pool::new(100_000);
        m
    });
    (world, hero, ogre)
}

#[test]
fn multi_attack_weapon_swings_between_one_and_its_maximum() {
    let flail = Item::weapon("flail", WeaponCategory::Crushing, Dice::new(1, 6, 0), 30).with_num_attacks(4);
    let config = CombatConfig::new();
    for seed in 0..64 {
        let (mut world, hero, ogre) = duel(seed, flail.clone());
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &PcgRng), 10).unwrap();
        let report = attack_creature(&mut ctx, hero, ogre, AttackType::Normal).unwrap();
        assert_eq!(report.status, AttackStatus::Resolved);
        assert!((1..=4).contains(&report.swings.len()), "seed {seed}: {:?}", report.swings);
        assert!(
            report.swings.iter().skip(1).all(|o| *o != AttackOutcome::Fumble),
            "seed {seed}: late fumble in {:?}",
            report.swings
        );
    }
}

#[test]
fn failed_ambush_ends_the_action_and_doubles_the_delay() {
    let dagger = Item::weapon("dagger", WeaponCategory::Piercing, Dice::new(1, 4, 0), 30);
    let (mut world, hero, ogre) = duel(7, dagger);
    world.actors.get_mut(ogre).unwrap().monster_flags |= MonsterFlags::NO_BACKSTAB;
    let config = CombatConfig::new();
    let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), 10).unwrap();

    let report = attack_creature(&mut ctx, hero, ogre, AttackType::Ambush).unwrap();
    assert_eq!(report.swings, [AttackOutcome::Miss]);
    assert_eq!(report.damage, 0);
    let timer = ctx.actor(hero).unwrap().cooldowns.get(CooldownKind::Attack).unwrap();
    assert_eq!((timer.last, timer.interval), (10, 60));
}

#[test]
fn every_attack_leaves_the_defender_enemy_of_the_attacker() {
    let sword = Item::weapon("sword", WeaponCategory::Slashing, Dice::new(2, 6, 0), 30);
    let (mut world, hero, ogre) = duel(3, sword);
    let config = CombatConfig::new();
    let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &PcgRng), 10).unwrap();
    let report = attack_creature(&mut ctx, hero, ogre, AttackType::Normal).unwrap();
    let ogre = ctx.actor(ogre).unwrap();
    assert!(ogre.is_enemy(hero));
    assert_eq!(ogre.hp.max() - ogre.hp.cur(), report.damage);
    assert!(report.damage >= 0);
}
