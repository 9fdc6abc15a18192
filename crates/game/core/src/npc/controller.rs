//! The per-tick decision loop of one autonomous creature.
//!
//! The brain is a small behavior tree rebuilt every tick over a blackboard
//! that borrows the action context. Each leaf wraps one of the NPC routines;
//! the first branch that claims the tick ends it.

use behavior_tree::builder::{action, always_succeed, condition, inverter, selector, sequence};
use behavior_tree::{Behavior, Node, Status};
use tracing::{debug, warn};

use crate::combat::{AttackReport, AttackStatus, current_target, monster_attack};
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::magic::{CastRequest, cast};
use crate::npc::aggro::who_to_aggro;
use crate::npc::assist::{check_assist, check_enemy_mobs};
use crate::npc::regen::{Recovery, regenerate};
use crate::npc::roam::{Roam, check_flee, check_wander};
use crate::npc::scavenge::{Haul, check_loot, check_scavenge};
use crate::specials::{SpecialOutcome, run_special_attacks};
use crate::state::{ActorId, CooldownKind, RoomId};

/// Percent chance per ready tick that a spellcasting creature opens with a
/// spell instead of its weapon.
pub const CAST_CHANCE: i32 = 25;

/// Everything one creature did during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NpcReport {
    /// New foe picked this tick, by aggression or monster hatred.
    pub engaged: Option<ActorId>,
    /// Allies pulled into the creature's fight.
    pub assisted: usize,
    pub recovery: Recovery,
    pub fled: Option<RoomId>,
    pub roam: Roam,
    pub scavenged: Option<String>,
    pub haul: Haul,
    pub cast: Option<String>,
    pub special: Option<String>,
    pub attack: Option<AttackReport>,
}

impl NpcReport {
    /// Whether the creature is still in the world after its tick.
    pub fn remains(&self) -> bool {
        self.roam != Roam::Departed && !self.attack.as_ref().is_some_and(|a| a.attacker_died)
    }
}

/// Blackboard the brain reads and writes during one tick.
pub struct Npc<'c, 'a> {
    ctx: &'c mut CombatContext<'a>,
    me: ActorId,
    report: NpcReport,
    fault: Option<CombatError>,
}

impl Npc<'_, '_> {
    /// Parks the first error; later steps see it and bail out.
    fn settle<T>(&mut self, result: Result<T, CombatError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.fault.get_or_insert(err);
                None
            }
        }
    }

    fn halted(&self) -> bool {
        self.fault.is_some() || !self.ctx.world.actors.contains(self.me)
    }
}

// ============================================================================
// Leaves
// ============================================================================

fn hunt_enemy_mobs(npc: &mut Npc<'_, '_>) -> Status {
    if npc.halted() {
        return Status::Success;
    }
    let found = check_enemy_mobs(npc.ctx, npc.me);
    match npc.settle(found).flatten() {
        Some(target) => {
            npc.report.engaged = Some(target);
            Status::Success
        }
        None => Status::from(npc.halted()),
    }
}

fn assist(npc: &mut Npc<'_, '_>) -> Status {
    let joined = check_assist(npc.ctx, npc.me);
    npc.report.assisted = npc.settle(joined).unwrap_or_default();
    Status::Success
}

fn recover(npc: &mut Npc<'_, '_>) -> Status {
    if npc.halted() {
        return Status::Failure;
    }
    let recovery = regenerate(npc.ctx, npc.me);
    npc.report.recovery = npc.settle(recovery).unwrap_or_default();
    Status::Success
}

fn attack_ready(npc: &Npc<'_, '_>) -> bool {
    !npc.halted()
        && npc
            .ctx
            .world
            .actors
            .get(npc.me)
            .is_some_and(|me| me.cooldowns.ready(CooldownKind::Attack, npc.ctx.now))
}

fn flee(npc: &mut Npc<'_, '_>) -> Status {
    let fled = check_flee(npc.ctx, npc.me);
    npc.report.fled = npc.settle(fled).flatten();
    Status::from(npc.report.fled.is_some() || npc.halted())
}

fn scavenge(npc: &mut Npc<'_, '_>) -> Status {
    let took = check_scavenge(npc.ctx, npc.me);
    npc.report.scavenged = npc.settle(took).flatten();
    Status::Success
}

fn loot(npc: &mut Npc<'_, '_>) -> Status {
    let haul = check_loot(npc.ctx, npc.me);
    npc.report.haul = npc.settle(haul).unwrap_or_default();
    Status::Success
}

fn wander(npc: &mut Npc<'_, '_>) -> Status {
    if npc.halted() {
        return Status::Success;
    }
    let roam = check_wander(npc.ctx, npc.me);
    npc.report.roam = npc.settle(roam).unwrap_or_default();
    Status::from(npc.report.roam.acted() || npc.halted())
}

fn has_enemy(npc: &Npc<'_, '_>) -> bool {
    !npc.halted() && npc.ctx.world.actors.get(npc.me).is_some_and(|me| !me.enemies.is_empty())
}

/// Offensive spells the creature knows and the spell book can carry out.
fn battle_spells(npc: &Npc<'_, '_>) -> Vec<String> {
    let (Ok(book), Some(me)) = (npc.ctx.env.spells(), npc.ctx.world.actors.get(npc.me)) else {
        return Vec::new();
    };
    if !me.cooldowns.ready(CooldownKind::Spell, npc.ctx.now) {
        return Vec::new();
    }
    me.known_spells
        .iter()
        .filter(|name| book.catalog().get(name).is_some_and(|s| s.is_offensive()))
        .cloned()
        .collect()
}

fn try_spell(npc: &mut Npc<'_, '_>) -> bool {
    let spells = battle_spells(npc);
    if spells.is_empty() || npc.ctx.rolls.range(1, 100) > CAST_CHANCE {
        return false;
    }
    let pick = &spells[(npc.ctx.rolls.range(1, spells.len() as i32) - 1) as usize];
    let result = cast(npc.ctx, &CastRequest::new(npc.me, pick));
    match npc.settle(result) {
        Some(outcome) if outcome.is_success() => {
            npc.report.cast = Some(pick.clone());
            true
        }
        _ => false,
    }
}

fn fight(npc: &mut Npc<'_, '_>) -> Status {
    let Some(target) = current_target(npc.ctx, npc.me) else {
        return Status::Failure;
    };
    if try_spell(npc) {
        return Status::Success;
    }
    if npc.halted() {
        return Status::Success;
    }
    let special = run_special_attacks(npc.ctx, npc.me, target);
    if let Some(SpecialOutcome::Fired(report)) = npc.settle(special) {
        npc.report.special = Some(report.name);
        return Status::Success;
    }
    if npc.halted() {
        return Status::Success;
    }
    let swing = monster_attack(npc.ctx, npc.me);
    let Some(report) = npc.settle(swing) else {
        return Status::Success;
    };
    let acted = report.status != AttackStatus::NoTarget;
    npc.report.attack = Some(report);
    Status::from(acted)
}

fn pick_aggro_target(npc: &mut Npc<'_, '_>) -> Status {
    if npc.halted() {
        return Status::Failure;
    }
    let Some(victim) = who_to_aggro(npc.ctx, npc.me) else {
        return Status::Failure;
    };
    let (now, delay) = (npc.ctx.now, npc.ctx.config.default_weapon_delay);
    let joined = npc.ctx.actor_mut(npc.me).map(|me| {
        me.cooldowns.set(CooldownKind::Attack, now, delay);
        me.add_enemy(victim, now);
    });
    if npc.settle(joined).is_none() {
        return Status::Failure;
    }
    let (me, them) = (npc.ctx.name(npc.me), npc.ctx.name(victim));
    npc.ctx.tell(victim, format!("{me} attacks you."));
    npc.ctx.broadcast_near(npc.me, &[npc.me, victim], format!("{me} attacks {them}."));
    npc.report.engaged = Some(victim);
    Status::Success
}

// ============================================================================
// Brain
// ============================================================================

/// Priority order of a creature's tick. A waiting weapon ends the tick after
/// assisting and recovering; a flight, a step or a fight ends it before the
/// creature looks for someone new to attack.
fn brain<'c, 'a: 'c>() -> Node<'c, Npc<'c, 'a>> {
    selector(vec![
        action(hunt_enemy_mobs),
        sequence(vec![
            always_succeed(action(assist)),
            always_succeed(action(recover)),
            inverter(condition(attack_ready)),
        ]),
        action(flee),
        sequence(vec![
            always_succeed(action(scavenge)),
            always_succeed(action(loot)),
            action(wander),
        ]),
        sequence(vec![condition(has_enemy), action(fight)]),
        action(pick_aggro_target),
    ])
}

/// Runs one creature's decision loop for the context's tick.
///
/// Players, dying creatures and unknown ids do nothing.
///
/// # Errors
///
/// Returns the first invariant violation any step hit; steps after it are
/// skipped.
pub fn npc_tick(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<NpcReport, CombatError> {
    match ctx.world.actors.get(monster) {
        Some(me) if me.is_monster() && !me.is_dying() => {}
        _ => return Ok(NpcReport::default()),
    }
    let mut npc = Npc {
        ctx,
        me: monster,
        report: NpcReport::default(),
        fault: None,
    };
    let status = brain().tick(&mut npc);
    if let Some(err) = npc.fault {
        warn!(target: "npc::controller", monster = %monster, error = %err, "tick aborted");
        return Err(err);
    }
    debug!(
        target: "npc::controller",
        monster = %monster,
        ?status,
        engaged = ?npc.report.engaged,
        roam = ?npc.report.roam,
        "tick"
    );
    Ok(npc.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{Env, FixedRng};
    use crate::state::{Actor, ActorKind, Exit, MonsterFlags, Pool, Room, World};

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

    #[test]
    fn aggressive_creature_marks_the_lone_player() {
        let (mut world, wolf, ann) = den();
        let config = CombatConfig::new();
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), 5).unwrap();
        let report = npc_tick(&mut ctx, wolf).unwrap();
        assert_eq!(report.engaged, Some(ann));
        let me = ctx.actor(wolf).unwrap();
        assert!(me.is_enemy(ann));
        assert!(!me.cooldowns.ready(CooldownKind::Attack, 5));
        drop(ctx);
        let heard: Vec<_> = world.drain_events().iter().filter_map(|e| e.text().map(str::to_owned)).collect();
        assert!(heard.iter().any(|t| t == "wolf attacks you."));
    }

    #[test]
    fn waiting_weapon_ends_the_tick_early() {
        let (mut world, wolf, ann) = den();
        let config = CombatConfig::new();
        let now = 5;
        {
            let me = world.actors.get_mut(wolf).unwrap();
            me.add_enemy(ann, 0);
            me.cooldowns.set(CooldownKind::Attack, now, 100);
        }
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), now).unwrap();
        let report = npc_tick(&mut ctx, wolf).unwrap();
        assert_eq!(report.attack, None);
        assert_eq!(report.engaged, None);
    }

    #[test]
    fn ready_creature_swings_at_its_foe() {
        let (mut world, wolf, ann) = den();
        world.actors.get_mut(wolf).unwrap().add_enemy(ann, 0);
        let config = CombatConfig::new();
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), 5).unwrap();
        let report = npc_tick(&mut ctx, wolf).unwrap();
        let attack = report.attack.as_ref().expect("a swing");
        assert_eq!(attack.status, AttackStatus::Resolved);
        assert_eq!(attack.swings.len(), 1);
        assert!(report.remains());
    }

    #[test]
    fn players_and_missing_ids_are_ignored() {
        let (mut world, _, ann) = den();
        let config = CombatConfig::new();
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), 5).unwrap();
        assert_eq!(npc_tick(&mut ctx, ann).unwrap(), NpcReport::default());
        assert_eq!(npc_tick(&mut ctx, ActorId(99)).unwrap(), NpcReport::default());
    }
}
