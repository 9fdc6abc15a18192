//! Tick driver scenarios: clock, expiry, creature ticks, player actions.

use std::path::PathBuf;

use combat_content::ContentFactory;
use combat_core::magic::CastError;
use combat_core::state::{
    Actor, ActorId, ActorKind, Effect, EffectKind, Exit, MonsterFlags, Pool, Room, RoomFlags,
    RoomId, World, WorldEvent,
};
use combat_core::{AttackStatus, FixedRng, PcgRng};
use combat_core::magic::CastResult;
use runtime::{ActionResult, PlayerAction, RuntimeError, Target, WorldRuntime};

fn den() -> (World, ActorId, ActorId) {
    let mut world = World::new(11);
    world.add_room(Room::new(RoomId(0), "Den").with_exit(Exit::new("out", RoomId(1))));
    world.add_room(Room::new(RoomId(1), "Path"));
    let wolf = world.spawn(|id| {
        let mut m = Actor::new(id, "wolf", ActorKind::Monster);
        m.monster_flags = MonsterFlags::AGGRESSIVE;
        m.hp = Pool::new(30);
        m
    });
    let ann = world.spawn(|id| {
        let mut p = Actor::new(id, "Ann", ActorKind::Player);
        p.hp = Pool::new(50);
        p
    });
    (world, wolf, ann)
}

fn texts(events: &[WorldEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.text().map(str::to_owned))
        .collect()
}

#[test]
fn clock_never_runs_backwards() {
    let (world, _, _) = den();
    let mut rt = WorldRuntime::builder(world).rng(FixedRng(0)).starting_at(50).build();
    let err = rt.tick(49).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::ClockWentBackwards {
            current: 50,
            requested: 49
        }
    ));
    assert!(rt.tick(50).is_ok());
}

#[test]
fn lapsed_effects_are_removed_and_announced() {
    let (mut world, _, ann) = den();
    if let Some(a) = world.actors.get_mut(ann) {
        a.effects.apply(Effect::timed(EffectKind::Armor, 5, 10), 0);
    }
    let mut rt = WorldRuntime::builder(world).rng(FixedRng(0)).build();
    let report = rt.tick(20).unwrap();
    assert!(report.expired.contains(&(ann, EffectKind::Armor)));
    assert!(texts(&report.events).iter().any(|t| t == "Your armor wears off."));
    assert!(!rt.world().actors.get(ann).unwrap().effects.has(EffectKind::Armor, 20));
}

#[test]
fn tick_runs_every_creature_and_returns_its_narration() {
    let (world, wolf, ann) = den();
    let mut rt = WorldRuntime::builder(world).rng(FixedRng(0)).build();
    let report = rt.tick(5).unwrap();
    assert_eq!(report.npcs.len(), 1);
    assert_eq!(report.npcs[0].actor, wolf);
    assert_eq!(report.npcs[0].report.engaged, Some(ann));
    assert!(report.faults.is_empty());
    assert!(texts(&report.events).iter().any(|t| t == "wolf attacks you."));
    // Drained: the next quiet tick starts empty.
    assert!(rt.world().outbox.is_empty());
}

#[test]
fn player_attack_resolves_and_marks_the_defender() {
    let (world, wolf, ann) = den();
    let mut rt = WorldRuntime::builder(world).rng(PcgRng).starting_at(100).build();
    let outcome = rt.act(PlayerAction::attack(ann, wolf)).unwrap();
    let ActionResult::Attack(report) = outcome.result else {
        panic!("expected an attack, got {:?}", outcome.result);
    };
    assert_eq!(report.status, AttackStatus::Resolved);
    assert!(!report.swings.is_empty());
    assert!(rt.world().actors.get(wolf).is_none_or(|w| w.is_enemy(ann)));
}

#[test]
fn named_target_that_is_not_here_reports_no_target() {
    let (world, _, ann) = den();
    let mut rt = WorldRuntime::builder(world).rng(FixedRng(0)).build();
    let outcome = rt
        .act(PlayerAction::attack(ann, Target::from("dragon")))
        .unwrap();
    assert_eq!(outcome.result, ActionResult::NoTarget);
    assert!(texts(&outcome.events).iter().any(|t| t == "you don't see that here"));
}

#[test]
fn safe_room_denies_player_killing() {
    let mut world = World::new(2);
    world.add_room(Room::new(RoomId(0), "Temple").with_flags(RoomFlags::PK_SAFE));
    let ann = world.spawn(|id| Actor::new(id, "Ann", ActorKind::Player));
    let bob = world.spawn(|id| Actor::new(id, "Bob", ActorKind::Player));
    let mut rt = WorldRuntime::builder(world).rng(FixedRng(0)).build();
    let outcome = rt.act(PlayerAction::attack(ann, bob)).unwrap();
    assert!(matches!(outcome.result, ActionResult::Denied(_)));
    assert!(rt.world().actors.get(bob).unwrap().enemies.is_empty());
}

#[test]
fn unknown_spell_is_refused_as_a_value() {
    let (world, _, ann) = den();
    let mut rt = WorldRuntime::builder(world).rng(FixedRng(0)).build();
    let outcome = rt.act(PlayerAction::cast(ann, "wish", "")).unwrap();
    assert_eq!(
        outcome.result,
        ActionResult::Cast(CastResult::Failure(CastError::UnknownSpell))
    );
}

#[test]
fn missing_actor_is_an_error() {
    let (world, wolf, _) = den();
    let mut rt = WorldRuntime::builder(world).build();
    let err = rt.act(PlayerAction::attack(ActorId(99), wolf)).unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownActor(ActorId(99))));
}

fn shipped() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../game/content/data"))
}

#[test]
fn shipped_world_populates_and_runs_clean() {
    let content = shipped().load_all().unwrap();
    let expected: u32 = content.spawns.iter().map(|p| p.count).sum();
    let mut rt = WorldRuntime::from_content(content, 42).unwrap();
    assert_eq!(rt.world().actors.len(), expected as usize);
    let order: Vec<_> = rt.hooks().hooks().map(|(name, _)| name).collect();
    assert_eq!(order, ["death_sweep", "repop"]);

    for now in 1..=300 {
        let report = rt.tick(now).unwrap();
        assert!(report.faults.is_empty(), "faults at {now}: {:?}", report.faults);
    }
}

#[test]
fn repop_refills_an_emptied_spawn_point() {
    let content = shipped().load_all().unwrap();
    let mut rt = WorldRuntime::from_content(content, 7).unwrap();
    let rats: Vec<ActorId> = rt
        .world()
        .actors
        .iter()
        .filter(|a| a.name == "sewer rat")
        .map(|a| a.id)
        .collect();
    assert_eq!(rats.len(), 2);
    for id in rats {
        rt.world_mut().actors.remove(id);
    }

    // Rats refill every 60 seconds.
    let report = rt.tick(600).unwrap();
    let rats = rt.world().actors.iter().filter(|a| a.name == "sewer rat").count();
    assert_eq!(rats, 2);
    assert!(texts(&report.events).iter().any(|t| t == "sewer rat appears."));
}
