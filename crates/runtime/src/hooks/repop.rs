//! Refills spawn points on their timers.

use combat_content::{MonsterCatalog, SpawnPoint};
use combat_core::state::{ActorId, Tick};
use combat_core::{CombatConfig, CombatContext, TemplateOracle, World};
use tracing::info;

use super::{HookContext, PostTickHook};
use crate::error::HookError;

/// Tops a spawn point up to its count, respecting the room's monster cap.
///
/// A template's population is counted world-wide, so creatures that wander
/// off still count against their spawn point.
pub fn fill_spawn(
    world: &mut World,
    templates: &dyn TemplateOracle,
    point: &SpawnPoint,
) -> Result<Vec<ActorId>, HookError> {
    let template = templates.template(point.template).ok_or_else(|| {
        HookError::Invariant(format!("spawn names unknown template {:?}", point.template))
    })?;
    let cap = world
        .room(point.room)
        .map(|room| room.max_mobs as usize)
        .ok_or_else(|| HookError::Invariant(format!("spawn room {} does not exist", point.room)))?;

    let mut present = world
        .actors
        .iter()
        .filter(|a| a.is_monster() && a.profile.template == point.template)
        .count();
    let mut spawned = Vec::new();
    while present < point.count as usize
        && (cap == 0 || world.wild_monster_count(point.room) < cap)
    {
        spawned.push(world.spawn(|id| template.to_actor(id, point.room)));
        present += 1;
    }
    Ok(spawned)
}

/// Periodic repopulation from the spawn table.
pub struct RepopHook {
    templates: MonsterCatalog,
    points: Vec<SpawnPoint>,
}

impl RepopHook {
    pub fn new(templates: MonsterCatalog, points: Vec<SpawnPoint>) -> Self {
        Self { templates, points }
    }

    fn due(&self, now: Tick) -> impl Iterator<Item = &SpawnPoint> + '_ {
        self.points
            .iter()
            .filter(move |p| p.every > 0 && now > 0 && now % CombatConfig::seconds(p.every) == 0)
    }
}

impl PostTickHook for RepopHook {
    fn name(&self) -> &'static str {
        "repop"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn should_trigger(&self, _world: &World, ctx: &HookContext<'_>) -> bool {
        self.due(ctx.now).next().is_some()
    }

    fn execute(&self, combat: &mut CombatContext<'_>, ctx: &HookContext<'_>) -> Result<(), HookError> {
        for point in self.due(ctx.now) {
            let spawned = fill_spawn(combat.world, &self.templates, point)?;
            for id in &spawned {
                let name = combat.name(*id);
                combat.world.broadcast(point.room, &[*id], format!("{name} appears."));
            }
            if !spawned.is_empty() {
                info!(
                    target: "runtime::hooks",
                    template = ?point.template,
                    room = %point.room,
                    count = spawned.len(),
                    "repopulated"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::env::ActorTemplate;
    use combat_core::state::{Room, RoomId, TemplateId};

    fn catalog() -> MonsterCatalog {
        [ActorTemplate::builder("rat").id(TemplateId(3)).hp(5).build()]
            .into_iter()
            .collect()
    }

    fn point(count: u32, every: u64) -> SpawnPoint {
        SpawnPoint {
            template: TemplateId(3),
            room: RoomId(1),
            count,
            every,
        }
    }

    #[test]
    fn fills_up_to_count_and_no_further() {
        let mut world = World::new(1);
        world.add_room(Room::new(RoomId(1), "cellar"));
        let first = fill_spawn(&mut world, &catalog(), &point(3, 0)).unwrap();
        assert_eq!(first.len(), 3);
        let again = fill_spawn(&mut world, &catalog(), &point(3, 0)).unwrap();
        assert!(again.is_empty());
        assert!(
            world
                .actors
                .iter()
                .all(|a| a.profile.template == TemplateId(3) && a.room == RoomId(1))
        );
    }

    #[test]
    fn room_cap_limits_spawns() {
        let mut world = World::new(1);
        let mut room = Room::new(RoomId(1), "closet");
        room.max_mobs = 2;
        world.add_room(room);
        let spawned = fill_spawn(&mut world, &catalog(), &point(5, 0)).unwrap();
        assert_eq!(spawned.len(), 2);
    }

    #[test]
    fn fires_only_on_its_period() {
        let hook = RepopHook::new(catalog(), vec![point(1, 60)]);
        let world = World::new(1);
        let at = |now| HookContext {
            now,
            events: &[],
            npcs: &[],
        };
        assert!(!hook.should_trigger(&world, &at(0)));
        assert!(!hook.should_trigger(&world, &at(599)));
        assert!(hook.should_trigger(&world, &at(600)));
    }
}
