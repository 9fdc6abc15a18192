//! Resolves deaths that slipped past the combat pipeline.

use combat_core::combat::check_die;
use combat_core::state::ActorId;
use combat_core::{CombatContext, World};
use tracing::warn;

use super::{HookContext, HookCriticality, PostTickHook};
use crate::error::HookError;

/// Finishes off anything left at zero hit points and drops threat entries
/// that point at actors no longer in the world.
///
/// Runs first and is critical: every later hook assumes a clean arena.
pub struct DeathSweepHook;

fn stale_references(world: &World) -> Vec<ActorId> {
    let mut stale: Vec<ActorId> = world
        .actors
        .iter()
        .flat_map(|a| a.enemies.targets().chain(a.pets.iter().copied()))
        .filter(|id| !world.actors.contains(*id))
        .collect();
    stale.sort_unstable();
    stale.dedup();
    stale
}

impl PostTickHook for DeathSweepHook {
    fn name(&self) -> &'static str {
        "death_sweep"
    }

    fn priority(&self) -> i32 {
        -100
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Critical
    }

    fn should_trigger(&self, world: &World, ctx: &HookContext<'_>) -> bool {
        ctx.lost_actors() || world.actors.iter().any(|a| a.is_dying())
    }

    fn execute(&self, combat: &mut CombatContext<'_>, _ctx: &HookContext<'_>) -> Result<(), HookError> {
        let dying: Vec<ActorId> = combat
            .world
            .actors
            .iter()
            .filter(|a| a.is_dying())
            .map(|a| a.id)
            .collect();
        for id in dying {
            warn!(target: "runtime::hooks", actor = %id, "unresolved death found after tick");
            check_die(combat, id, None)?;
            if combat.world.actors.get(id).is_some_and(|a| a.is_dying()) {
                return Err(HookError::Invariant(format!("{id} is still at zero hit points")));
            }
        }

        for id in stale_references(combat.world) {
            warn!(target: "runtime::hooks", actor = %id, "dropping references to departed actor");
            combat.world.forget(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::state::{Actor, ActorKind, Pool, Room, RoomId};
    use combat_core::{CombatConfig, Env, FixedRng};

    #[test]
    fn leftover_corpse_is_resolved_and_forgotten() {
        let mut world = World::new(3);
        world.add_room(Room::new(RoomId(1), "yard"));
        let hero = world.spawn(|id| {
            let mut a = Actor::new(id, "hero", ActorKind::Player);
            a.room = RoomId(1);
            a
        });
        let rat = world.spawn(|id| {
            let mut a = Actor::new(id, "rat", ActorKind::Monster);
            a.room = RoomId(1);
            a.hp = Pool::with_current(0, 5);
            a
        });
        if let Some(h) = world.actors.get_mut(hero) {
            h.enemies.add_enemy(rat);
        }

        let config = CombatConfig::default();
        let rng = FixedRng(0);
        let ctx = HookContext {
            now: 5,
            events: &[],
            npcs: &[],
        };
        assert!(DeathSweepHook.should_trigger(&world, &ctx));
        let mut combat = CombatContext::new(&mut world, Env::combat_only(&config, &rng), 5).unwrap();
        DeathSweepHook.execute(&mut combat, &ctx).unwrap();

        assert!(!world.actors.contains(rat));
        assert!(world.actors.get(hero).is_some_and(|h| h.enemies.is_empty()));
    }

    #[test]
    fn quiet_tick_skips_the_sweep() {
        let world = World::new(3);
        let ctx = HookContext {
            now: 5,
            events: &[],
            npcs: &[],
        };
        assert!(!DeathSweepHook.should_trigger(&world, &ctx));
    }
}
