//! Handlers for special attacks whose effect is more than damage.
//!
//! The engine rolls gates and saves, then hands typed attacks (petrify,
//! steal, experience drain, confusion) to the handler registered for their
//! [`SpecialType`].

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::specials::{SpecialAttack, SpecialType};
use crate::state::{ActorId, Affinity, Effect, EffectKind, ItemFlags, Realm, Stat};

/// One landed special against one victim.
#[derive(Clone, Copy, Debug)]
pub struct SpecialHit<'s> {
    pub attacker: ActorId,
    pub victim: ActorId,
    pub special: &'s SpecialAttack,
    /// The victim made its save.
    pub saved: bool,
}

/// What a handler did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handled {
    /// The victim shrugged it off; the attack counts as not fired.
    Resisted,
    Applied,
    /// Experience to take from the victim in place of hit points.
    ExperienceLoss(i64),
}

pub trait SpecialHandler: Send + Sync {
    fn apply(&self, ctx: &mut CombatContext<'_>, hit: &SpecialHit<'_>) -> Result<Handled, CombatError>;
}

/// Handlers keyed by special type, built once at startup.
pub struct SpecialRegistry {
    handlers: BTreeMap<SpecialType, Box<dyn SpecialHandler>>,
}

impl SpecialRegistry {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registry with the stock petrify, steal, drain and confuse handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SpecialType::Petrify, Petrify);
        registry.register(SpecialType::Steal, Steal);
        registry.register(SpecialType::ExpDrain, ExpDrain);
        registry.register(SpecialType::Confuse, Confuse);
        registry
    }

    pub fn register(&mut self, kind: SpecialType, handler: impl SpecialHandler + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn get(&self, kind: SpecialType) -> Option<&dyn SpecialHandler> {
        self.handlers.get(&kind).map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for SpecialRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for SpecialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecialRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Stock handlers
// ============================================================================

/// Turns a player to stone. Earth or magic resistance gives an even chance
/// to shrug it off.
pub struct Petrify;

impl SpecialHandler for Petrify {
    fn apply(&self, ctx: &mut CombatContext<'_>, hit: &SpecialHit<'_>) -> Result<Handled, CombatError> {
        let now = ctx.now;
        let victim = ctx.actor(hit.victim)?;
        if !victim.is_player() {
            return Ok(Handled::Applied);
        }
        let resistant = victim.effects.has(EffectKind::Realm(Realm::Earth, Affinity::Resist), now)
            || victim.effects.has(EffectKind::ResistMagic, now);
        let staff = victim.is_staff();
        if resistant && ctx.rolls.range(1, 100) <= 50 {
            return Ok(Handled::Resisted);
        }
        if hit.saved || staff {
            return Ok(Handled::Applied);
        }

        let effect = Effect::permanent(EffectKind::Petrification, 1).owned_by(hit.attacker);
        ctx.actor_mut(hit.victim)?.effects.apply(effect, now);
        let room = ctx.actor(hit.victim)?.room;
        for actor in ctx.world.actors.iter_mut() {
            if actor.room == room && actor.is_monster() {
                actor.enemies.remove(hit.victim);
            }
        }
        let (me, them) = (ctx.name(hit.attacker), ctx.name(hit.victim));
        ctx.tell(hit.victim, format!("{me} turned you to stone!"));
        ctx.broadcast_near(hit.victim, &[hit.victim], format!("{me} turned {them} to stone!"));
        debug!(target: "combat::special", victim = %hit.victim, "petrified");
        Ok(Handled::Applied)
    }
}

/// Lifts one item from a player's pack.
pub struct Steal;

impl SpecialHandler for Steal {
    fn apply(&self, ctx: &mut CombatContext<'_>, hit: &SpecialHit<'_>) -> Result<Handled, CombatError> {
        if hit.saved {
            return Ok(Handled::Applied);
        }
        let now = ctx.now;
        let thief = ctx.actor(hit.attacker)?;
        let victim = ctx.actor(hit.victim)?;
        if !victim.is_player()
            || victim.is_staff()
            || !thief.can_see(victim, now)
            || victim.effects.has(EffectKind::Petrification, now)
        {
            return Ok(Handled::Applied);
        }
        let candidates: Vec<usize> = victim
            .inventory
            .iter()
            .enumerate()
            .filter(|(_, i)| !i.flags.contains(ItemFlags::PERM_INV))
            .map(|(n, _)| n)
            .collect();
        if candidates.is_empty() {
            return Ok(Handled::Applied);
        }

        let mut chance = 4 * thief.level_i32() + thief.stats.bonus(Stat::Dexterity) * 3;
        if victim.level > thief.level {
            chance -= 15 * (victim.level_i32() - thief.level_i32());
        }
        chance = chance.min(65);

        let pick = candidates[(ctx.rolls.range(1, candidates.len() as i32) - 1) as usize];
        let (me, them) = (ctx.name(hit.attacker), ctx.name(hit.victim));
        if ctx.rolls.range(1, 100) <= chance {
            let item = ctx.actor_mut(hit.victim)?.inventory.remove(pick);
            debug!(target: "combat::special", thief = %hit.attacker, victim = %hit.victim, item = %item.name, "stole");
            ctx.actor_mut(hit.attacker)?.inventory.push(item);
        } else {
            let name = ctx.actor(hit.victim)?.inventory[pick].name.clone();
            ctx.tell(hit.victim, format!("{me} tried to steal your {name}."));
            ctx.broadcast_near(hit.victim, &[hit.victim], format!("{me} tried to steal from {them}."));
        }
        Ok(Handled::Applied)
    }
}

/// Takes experience instead of hit points; a save halves it.
pub struct ExpDrain;

impl SpecialHandler for ExpDrain {
    fn apply(&self, ctx: &mut CombatContext<'_>, hit: &SpecialHit<'_>) -> Result<Handled, CombatError> {
        let rolled = i64::from(hit.special.damage.roll(&mut ctx.rolls).max(0));
        let mut amount = rolled.min(ctx.actor(hit.victim)?.experience.max(0));
        if hit.saved {
            amount /= 2;
        }
        Ok(Handled::ExperienceLoss(amount))
    }
}

/// Muddles the victim's mind; magic resistance usually stops it.
pub struct Confuse;

impl Confuse {
    const DURATION_SECS: u64 = 30;
}

impl SpecialHandler for Confuse {
    fn apply(&self, ctx: &mut CombatContext<'_>, hit: &SpecialHit<'_>) -> Result<Handled, CombatError> {
        let now = ctx.now;
        if ctx.actor(hit.victim)?.effects.has(EffectKind::ResistMagic, now)
            && ctx.rolls.range(1, 100) <= 75
        {
            return Ok(Handled::Resisted);
        }
        if !hit.saved {
            let until = now + CombatConfig::seconds(Self::DURATION_SECS);
            let effect = Effect::timed(EffectKind::Confusion, 1, until).owned_by(hit.attacker);
            ctx.actor_mut(hit.victim)?.effects.apply(effect, now);
            ctx.tell(hit.victim, "Your head spins.");
        }
        Ok(Handled::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_handled_types() {
        use strum::IntoEnumIterator;

        let registry = SpecialRegistry::with_defaults();
        for kind in SpecialType::iter() {
            assert_eq!(registry.get(kind).is_some(), kind.is_handled(), "{kind}");
        }
        assert_eq!(registry.len(), 4);
        assert!(SpecialRegistry::new().is_empty());
    }

    #[test]
    fn petrify_spares_staff_and_stones_players() {
        use crate::env::{Env, FixedRng};
        use crate::state::{Actor, ActorKind, Class, Room, RoomId, World};

        let mut world = World::new(3);
        world.add_room(Room::new(RoomId(0), "Cave"));
        let basilisk = world.spawn(|id| Actor::new(id, "basilisk", ActorKind::Monster));
        let dm = world.spawn(|id| {
            let mut a = Actor::new(id, "Root", ActorKind::Player);
            a.class = Class::DungeonMaster;
            a
        });
        let ann = world.spawn(|id| Actor::new(id, "Ann", ActorKind::Player));
        let config = CombatConfig::new();
        let rng = FixedRng(99);
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &rng), 0).unwrap();
        let gaze = SpecialAttack::new("gaze", SpecialType::Petrify);

        for victim in [dm, ann] {
            let hit = SpecialHit { attacker: basilisk, victim, special: &gaze, saved: false };
            assert_eq!(Petrify.apply(&mut ctx, &hit).unwrap(), Handled::Applied);
        }
        assert!(!ctx.world.actors.get(dm).unwrap().effects.has(EffectKind::Petrification, 0));
        assert!(ctx.world.actors.get(ann).unwrap().effects.has(EffectKind::Petrification, 0));
    }
}
