//! The data directory shipped with the crate must always load.

use std::path::PathBuf;

use combat_content::ContentFactory;
use combat_core::magic::SpellBook;
use combat_core::specials::SpecialRegistry;
use combat_core::state::{ExitFlags, MonsterFlags, RoomFlags, RoomId, TemplateId};
use combat_core::{ActorId, CombatConfig, CombatContext, Env, PcgRng, TemplateOracle, World, npc_tick};

fn factory() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"))
}

#[test]
fn shipped_content_loads_and_cross_checks() {
    let content = factory().load_all().expect("shipped data loads");
    assert_eq!(content.config, CombatConfig::default());
    assert!(content.monsters.len() >= 5);
    assert!(content.rooms.iter().any(|r| r.id == RoomId(1)));

    let troll = content.monsters.template(TemplateId(4)).expect("troll");
    assert!(troll.flags.contains(MonsterFlags::REGENERATES));
    assert!(
        troll
            .specials
            .iter()
            .all(|s| s.chance > 0 && s.chance <= 101)
    );
}

#[test]
fn every_shipped_spell_has_a_stock_handler() {
    let spells = factory().load_spells().expect("spells load");
    let book = SpellBook::with_defaults(spells);
    let unbound: Vec<_> = book.unbound().map(|s| s.name.clone()).collect();
    assert!(unbound.is_empty(), "unbound spells: {unbound:?}");
}

#[test]
fn spawned_templates_carry_their_catalog_id() {
    let monsters = factory().load_monsters().expect("monsters load");
    for id in monsters.ids() {
        let template = monsters.template(id).expect("listed id resolves");
        let actor = template.to_actor(combat_core::ActorId(1), RoomId(1));
        assert_eq!(actor.profile.template, id);
        assert!(actor.hp.max() > 0);
    }
}

#[test]
fn shipped_flag_strings_parse() {
    let rooms = factory().load_rooms().expect("rooms load");
    let den = rooms.iter().find(|r| r.id == RoomId(5)).expect("troll den");
    assert!(den.flags.contains(RoomFlags::NO_MAGIC));
    assert!(den.exits.iter().all(|e| e.flags.contains(ExitFlags::NO_FLEE)));
    let warren = rooms.iter().find(|r| r.id == RoomId(3)).expect("warren");
    assert!(warren.exits.iter().any(|e| e.flags.contains(ExitFlags::SECRET)));

    let monsters = factory().load_monsters().expect("monsters load");
    let goblin = monsters.template(TemplateId(1)).expect("goblin");
    assert!(goblin.flags.contains(MonsterFlags::AGGRESSIVE));
}

#[test]
fn world_spawned_from_shipped_content_runs() {
    let content = factory().load_all().expect("shipped data loads");
    let mut world = World::new(11);
    for room in content.rooms.iter().cloned() {
        world.add_room(room);
    }
    for point in &content.spawns {
        let template = content.monsters.template(point.template).expect("spawn template");
        for _ in 0..point.count {
            world.spawn(|id| template.to_actor(id, point.room));
        }
    }
    let monsters: Vec<ActorId> = world.actors.iter().map(|a| a.id).collect();
    assert_eq!(monsters.len(), 8);

    let rng = PcgRng;
    let spells = SpellBook::with_defaults(content.spells.clone());
    let specials = SpecialRegistry::with_defaults();
    let env = Env::with_all(&content.config, &rng, &spells, &specials);
    for now in 1..=60 {
        for (stream, id) in (1u32..).zip(monsters.iter().copied()) {
            if !world.actors.contains(id) {
                continue;
            }
            let mut ctx = CombatContext::with_stream(&mut world, env, now, stream).expect("env complete");
            npc_tick(&mut ctx, id).expect("creature tick");
        }
        world.drain_events();
    }
}
