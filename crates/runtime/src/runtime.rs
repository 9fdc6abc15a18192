//! The tick driver.
//!
//! [`WorldRuntime`] owns a world and the read-only collaborators the combat
//! engine needs, and advances it one tick at a time: effects lapse, every
//! creature runs its controller, post-tick hooks fire, and the narration
//! queued along the way is handed back to the caller.

use std::sync::Arc;

use combat_content::Content;
use combat_core::combat::attack_creature;
use combat_core::magic::{CastRequest, SpellBook, cast};
use combat_core::specials::SpecialRegistry;
use combat_core::state::{ActorId, EffectKind, Tick, WorldEvent};
use combat_core::{
    CombatConfig, CombatContext, CombatError, Env, NpcReport, PcgRng, RngOracle, TargetQuery,
    World, can_attack, check_engagement, find_victim, npc_tick,
};
use tracing::{debug, error, info};

use crate::action::{ActionKind, ActionOutcome, ActionResult, PlayerAction, Target};
use crate::error::{Result, RuntimeError};
use crate::hooks::{HookContext, HookRegistry, PostTickHook, RepopHook, fill_spawn};

/// One creature's tick.
#[derive(Clone, Debug, PartialEq)]
pub struct NpcTurn {
    pub actor: ActorId,
    pub report: NpcReport,
}

/// Everything that happened during one call to [`WorldRuntime::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    pub now: Tick,
    /// Effects that lapsed at the start of the tick.
    pub expired: Vec<(ActorId, EffectKind)>,
    pub npcs: Vec<NpcTurn>,
    /// Creatures whose tick was cut short by an engine fault.
    pub faults: Vec<(ActorId, CombatError)>,
    /// Narration and world changes, in the order they happened.
    pub events: Vec<WorldEvent>,
}

/// Owns a world and drives it.
pub struct WorldRuntime {
    world: World,
    config: CombatConfig,
    rng: Box<dyn RngOracle>,
    spells: SpellBook,
    specials: SpecialRegistry,
    hooks: HookRegistry,
    now: Tick,
}

impl WorldRuntime {
    /// Create a new runtime builder
    pub fn builder(world: World) -> RuntimeBuilder {
        RuntimeBuilder::new(world)
    }

    /// Builds a world from loaded content: rooms, the initial population,
    /// and a repop hook for the spawn table.
    pub fn from_content(content: Content, seed: u64) -> Result<Self> {
        let mut world = World::new(seed);
        if let Some(first) = content.rooms.first() {
            world.respawn_room = first.id;
        }
        for room in content.rooms {
            world.add_room(room);
        }
        for point in &content.spawns {
            fill_spawn(&mut world, &content.monsters, point).map_err(|source| {
                RuntimeError::CriticalHook {
                    hook: "initial_spawn",
                    source,
                }
            })?;
        }
        info!(
            target: "runtime",
            rooms = world.rooms.len(),
            actors = world.actors.len(),
            "world populated"
        );

        let repop = RepopHook::new(content.monsters, content.spawns);
        Ok(Self::builder(world)
            .config(content.config)
            .spells(SpellBook::with_defaults(content.spells))
            .hook(Arc::new(repop))
            .build())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advances the clock to `now` and runs one tick.
    ///
    /// # Errors
    ///
    /// Fails if `now` is in the past, if the environment is incomplete, or if
    /// a critical hook fails. A fault inside one creature's tick is logged,
    /// recorded in [`TickReport::faults`], and does not stop the others.
    pub fn tick(&mut self, now: Tick) -> Result<TickReport> {
        if now < self.now {
            return Err(RuntimeError::ClockWentBackwards {
                current: self.now,
                requested: now,
            });
        }
        self.now = now;
        let env = Env::with_all(&self.config, &*self.rng, &self.spells, &self.specials);
        let mut report = TickReport {
            now,
            ..TickReport::default()
        };

        // ----- effect expiry -----
        for actor in self.world.actors.iter_mut() {
            for kind in actor.effects.remove_expired(now) {
                report.expired.push((actor.id, kind));
            }
        }
        for (id, kind) in &report.expired {
            debug!(target: "runtime", actor = %id, effect = %kind, "effect expired");
            self.world.tell(*id, format!("Your {kind} wears off."));
        }

        // ----- creature ticks -----
        let monsters: Vec<ActorId> = self
            .world
            .actors
            .iter()
            .filter(|a| a.is_monster())
            .map(|a| a.id)
            .collect();
        for (stream, id) in (1u32..).zip(monsters) {
            // Earlier creatures may have killed or chased this one off.
            if !self.world.actors.contains(id) {
                continue;
            }
            let mut ctx = CombatContext::with_stream(&mut self.world, env, now, stream)?;
            match npc_tick(&mut ctx, id) {
                Ok(npc) => report.npcs.push(NpcTurn {
                    actor: id,
                    report: npc,
                }),
                Err(e) => {
                    error!(target: "runtime", actor = %id, error = %e, "creature tick failed");
                    report.faults.push((id, e));
                }
            }
        }

        // ----- hooks -----
        report.events = self.world.drain_events();
        let ctx = HookContext {
            now,
            events: &report.events,
            npcs: &report.npcs,
        };
        self.hooks.execute_hooks(&mut self.world, env, now, &ctx)?;
        report.events.extend(self.world.drain_events());

        debug!(
            target: "runtime",
            now,
            npcs = report.npcs.len(),
            events = report.events.len(),
            "tick complete"
        );
        Ok(report)
    }

    /// Resolves one player action at the current tick.
    ///
    /// # Errors
    ///
    /// Fails when the actor does not exist or the engine reports a fault.
    pub fn act(&mut self, action: PlayerAction) -> Result<ActionOutcome> {
        let now = self.now;
        if !self.world.actors.contains(action.actor) {
            return Err(RuntimeError::UnknownActor(action.actor));
        }
        let env = Env::with_all(&self.config, &*self.rng, &self.spells, &self.specials);
        let mut ctx = CombatContext::with_stream(&mut self.world, env, now, 0)?;

        let result = match &action.kind {
            ActionKind::Attack { target, style } => {
                let victim = match target {
                    Target::Id(id) => Some(*id),
                    Target::Named(text) => resolve_victim(&mut ctx, action.actor, text),
                    Target::Current => resolve_victim(&mut ctx, action.actor, ""),
                };
                match victim {
                    None => ActionResult::NoTarget,
                    Some(victim) if can_attack(&mut ctx, action.actor, victim, false) => {
                        ActionResult::Attack(attack_creature(&mut ctx, action.actor, victim, *style)?)
                    }
                    Some(victim) => match check_engagement(ctx.world, ctx.config, action.actor, victim, now) {
                        Err(denied) => ActionResult::Denied(denied.reason),
                        Ok(()) => ActionResult::NoTarget,
                    },
                }
            }
            ActionKind::Cast { spell, target } => {
                let request = CastRequest::new(action.actor, spell).on(target);
                ActionResult::Cast(cast(&mut ctx, &request)?)
            }
        };

        debug!(target: "runtime", actor = %action.actor, result = ?result, "action resolved");
        Ok(ActionOutcome {
            result,
            events: self.world.drain_events(),
        })
    }
}

/// Looks a hostile reference up from `actor`'s room, telling them when it
/// names nobody.
fn resolve_victim(ctx: &mut CombatContext<'_>, actor: ActorId, text: &str) -> Option<ActorId> {
    match find_victim(ctx.world, actor, &TargetQuery::hostile(text), ctx.now) {
        Ok(victim) => Some(victim),
        Err(e) => {
            ctx.tell(actor, e.to_string());
            None
        }
    }
}

/// Builder for [`WorldRuntime`].
pub struct RuntimeBuilder {
    world: World,
    config: CombatConfig,
    rng: Box<dyn RngOracle>,
    spells: Option<SpellBook>,
    specials: Option<SpecialRegistry>,
    hooks: HookRegistry,
    start: Tick,
}

impl RuntimeBuilder {
    fn new(world: World) -> Self {
        Self {
            world,
            config: CombatConfig::default(),
            rng: Box::new(PcgRng),
            spells: None,
            specials: None,
            hooks: HookRegistry::default_hooks(),
            start: 0,
        }
    }

    /// Override combat configuration
    pub fn config(mut self, config: CombatConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the random source (tests use scripted oracles).
    pub fn rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn spells(mut self, spells: SpellBook) -> Self {
        self.spells = Some(spells);
        self
    }

    pub fn specials(mut self, specials: SpecialRegistry) -> Self {
        self.specials = Some(specials);
        self
    }

    /// Replace the hook set entirely.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Add one hook to the current set.
    pub fn hook(mut self, hook: Arc<dyn PostTickHook>) -> Self {
        self.hooks.register(hook);
        self
    }

    /// Tick the clock starts at.
    pub fn starting_at(mut self, now: Tick) -> Self {
        self.start = now;
        self
    }

    pub fn build(self) -> WorldRuntime {
        WorldRuntime {
            world: self.world,
            config: self.config,
            rng: self.rng,
            spells: self
                .spells
                .unwrap_or_else(|| SpellBook::with_defaults(Default::default())),
            specials: self.specials.unwrap_or_else(SpecialRegistry::with_defaults),
            hooks: self.hooks,
            now: self.start,
        }
    }
}
