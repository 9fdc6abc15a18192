//! Per-action execution context.
//!
//! A [`CombatContext`] is built once per action (or per NPC tick) and passed
//! by `&mut` through every resolver. It is the only path to mutable world
//! state and to the random stream, so a resolution is reproducible from the
//! world seed, the tick and the stream number alone.

use crate::config::CombatConfig;
use crate::env::{Env, OracleError, Roller};
use crate::error::CombatError;
use crate::state::{Actor, ActorId, Tick, World};

pub struct CombatContext<'a> {
    pub world: &'a mut World,
    pub env: Env<'a>,
    pub config: &'a CombatConfig,
    pub rolls: Roller<'a>,
    pub now: Tick,
}

impl<'a> CombatContext<'a> {
    /// Context for the first action resolved at `now`.
    ///
    /// # Errors
    ///
    /// Fails when the environment has no config or no random source.
    pub fn new(world: &'a mut World, env: Env<'a>, now: Tick) -> Result<Self, OracleError> {
        Self::with_stream(world, env, now, 0)
    }

    /// Context keyed to an explicit stream, so several actions resolved in
    /// the same tick draw independent rolls.
    ///
    /// # Errors
    ///
    /// Fails when the environment has no config or no random source.
    pub fn with_stream(
        world: &'a mut World,
        env: Env<'a>,
        now: Tick,
        stream: u32,
    ) -> Result<Self, OracleError> {
        let config = env.config()?;
        let rolls = Roller::new(env.rng()?, world.seed, now, stream);
        Ok(Self {
            world,
            env,
            config,
            rolls,
            now,
        })
    }

    pub fn actor(&self, id: ActorId) -> Result<&Actor, CombatError> {
        self.world.actor(id, self.now)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor, CombatError> {
        self.world.actor_mut(id, self.now)
    }

    /// Live and not yet dying.
    pub fn is_alive(&self, id: ActorId) -> bool {
        self.world.actors.get(id).is_some_and(|a| !a.is_dying())
    }

    pub fn tell(&mut self, to: ActorId, text: impl Into<String>) {
        self.world.tell(to, text);
    }

    /// Message to everyone in `about`'s room except the listed actors.
    pub fn broadcast_near(&mut self, about: ActorId, except: &[ActorId], text: impl Into<String>) {
        if let Some(room) = self.world.actors.get(about).map(|a| a.room) {
            self.world.broadcast(room, except, text);
        }
    }

    pub fn name(&self, id: ActorId) -> String {
        self.world.name_of(id)
    }
}
