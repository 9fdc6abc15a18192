//! Multi-tick creature behavior through `npc_tick`.

use combat_core::env::{Env, PcgRng};
use combat_core::npc::{Roam, npc_tick};
use combat_core::state::{
    Actor, ActorId, ActorKind, Exit, MonsterFlags, Pool, Room, RoomId, World,
};
use combat_core::{CombatConfig, CombatContext};

fn cave(seed: u64) -> (World, ActorId, ActorId) {
    let mut world = World::new(seed);
    world.add_room(Room::new(RoomId(0), "Cave").with_exit(Exit::new("out", RoomId(1))));
    world.add_room(Room::new(RoomId(1), "Ledge"));
    let bear = world.spawn(|id| {
        let mut m = Actor::new(id, "bear", ActorKind::Monster);
        m.monster_flags = MonsterFlags::AGGRESSIVE;
        m.hp = Pool::new(60);
        m
    });
    let ann = world.spawn(|id| {
        let mut p = Actor::new(id, "Ann", ActorKind::Player);
        p.stats.piety = 100;
        p.hp = Pool::new(10_000);
        p
    });
    (world, bear, ann)
}

#[test]
fn lone_eligible_player_is_always_chosen() {
    let config = CombatConfig::new();
    for seed in 0..32 {
        let (mut world, bear, ann) = cave(seed);
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &PcgRng), 5).unwrap();
        let report = npc_tick(&mut ctx, bear).unwrap();
        assert_eq!(report.engaged, Some(ann), "seed {seed}");
    }
}

#[test]
fn engaged_creature_keeps_fighting_and_never_wanders() {
    let (mut world, bear, ann) = cave(21);
    let config = CombatConfig::new();
    let mut swings = 0;
    for now in (5..3_000).step_by(5) {
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &PcgRng), now).unwrap();
        let report = npc_tick(&mut ctx, bear).unwrap();
        assert_eq!(report.roam, Roam::Stayed, "tick {now}");
        swings += usize::from(report.attack.is_some());
    }
    let bear = world.actors.get(bear).unwrap();
    assert_eq!(bear.room, RoomId(0));
    assert!(bear.is_enemy(ann));
    assert!(swings > 10);
}
