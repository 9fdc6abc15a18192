//! The spell book: catalog plus the handlers that carry spells out.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::combat::{Damage, DamageType, Modifiers, check_die, do_damage, do_reflection_damage, modify_damage};
use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::magic::{SpellCatalog, SpellDef};
use crate::state::{ActorId, Effect, EffectKind, RoomId};

/// One validated, paid-for-on-success cast.
#[derive(Clone, Copy, Debug)]
pub struct SpellCast<'s> {
    pub caster: ActorId,
    pub target: ActorId,
    pub spell: &'s SpellDef,
}

/// Carries out a spell once the resolver has validated it.
///
/// Returning `Ok(false)` means the spell did nothing; the caster keeps the
/// cost and no recast delay is set.
pub trait SpellHandler: Send + Sync {
    fn cast(&self, ctx: &mut CombatContext<'_>, cast: &SpellCast<'_>) -> Result<bool, CombatError>;
}

pub struct SpellBook {
    catalog: SpellCatalog,
    handlers: BTreeMap<String, Box<dyn SpellHandler>>,
}

impl SpellBook {
    pub fn new(catalog: SpellCatalog) -> Self {
        Self {
            catalog,
            handlers: BTreeMap::new(),
        }
    }

    /// Book with the stock bolt, heal, ward and teleport handlers.
    pub fn with_defaults(catalog: SpellCatalog) -> Self {
        let mut book = Self::new(catalog);
        book.register("bolt", Bolt);
        book.register("heal", Heal);
        book.register("armor", Ward(EffectKind::Armor));
        book.register("stoneskin", Ward(EffectKind::Stoneskin));
        book.register("earth-shield", Ward(EffectKind::EarthShield));
        book.register("resist-magic", Ward(EffectKind::ResistMagic));
        book.register("dimensional-anchor", Ward(EffectKind::DimensionalAnchor));
        book.register("teleport", Teleport);
        book
    }

    pub fn register(&mut self, key: &str, handler: impl SpellHandler + 'static) {
        self.handlers.insert(key.to_owned(), Box::new(handler));
    }

    pub fn handler(&self, key: &str) -> Option<&dyn SpellHandler> {
        self.handlers.get(key).map(AsRef::as_ref)
    }

    pub fn catalog(&self) -> &SpellCatalog {
        &self.catalog
    }

    /// Spells whose handler key has nothing registered.
    pub fn unbound(&self) -> impl Iterator<Item = &SpellDef> + '_ {
        self.catalog
            .iter()
            .filter(|spell| !self.handlers.contains_key(&spell.handler))
    }
}

impl fmt::Debug for SpellBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellBook")
            .field("spells", &self.catalog.len())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Stock handlers
// ============================================================================

/// Offensive realm bolt: rolls the spell's damage, at least one point, as
/// magical damage through the pipeline.
pub struct Bolt;

impl SpellHandler for Bolt {
    fn cast(&self, ctx: &mut CombatContext<'_>, cast: &SpellCast<'_>) -> Result<bool, CombatError> {
        let Some(offense) = cast.spell.offense else {
            return Ok(false);
        };
        let (me, them) = (ctx.name(cast.caster), ctx.name(cast.target));
        let target = ctx.actor(cast.target)?;
        if target.is_monster()
            && cast.spell.tier > 0
            && target.profile.spell_immunity_tier >= cast.spell.tier
        {
            ctx.tell(cast.caster, format!("Your {} has no effect on {them}.", cast.spell.name));
            return Ok(false);
        }

        let mut dmg = Damage::new(offense.damage.roll(&mut ctx.rolls).max(1));
        let mods = offense
            .realm
            .map_or_else(Modifiers::default, |realm| Modifiers::default().with_realm(realm));
        modify_damage(ctx, cast.target, Some(cast.caster), DamageType::Magical, &mut dmg, mods)?;

        let spell = &cast.spell.name;
        ctx.tell(
            cast.caster,
            format!("You cast a {spell} spell on {them} for {} damage.", dmg.damage),
        );
        ctx.tell(
            cast.target,
            format!("{me} casts a {spell} spell on you for {} damage.", dmg.damage),
        );
        ctx.broadcast_near(
            cast.caster,
            &[cast.caster, cast.target],
            format!("{me} casts a {spell} spell on {them}."),
        );

        if let Some(target) = ctx.world.actors.get_mut(cast.target)
            && target.is_monster()
        {
            target.add_enemy(cast.caster, ctx.now);
        }
        do_damage(ctx, cast.target, Some(cast.caster), dmg.damage)?;
        if dmg.drain > 0 {
            ctx.actor_mut(cast.caster)?.hp.increase(dmg.drain);
        }
        let caster_died = do_reflection_damage(ctx, cast.caster, cast.target, &dmg)?;
        if !check_die(ctx, cast.target, Some(cast.caster))? && caster_died {
            check_die(ctx, cast.caster, Some(cast.target))?;
        }
        Ok(true)
    }
}

/// Restores the spell's power in hit points.
pub struct Heal;

impl SpellHandler for Heal {
    fn cast(&self, ctx: &mut CombatContext<'_>, cast: &SpellCast<'_>) -> Result<bool, CombatError> {
        let amount = cast.spell.power.roll(&mut ctx.rolls).max(1);
        let healed = ctx.actor_mut(cast.target)?.hp.increase(amount);
        let (me, them) = (ctx.name(cast.caster), ctx.name(cast.target));
        if cast.caster == cast.target {
            ctx.tell(cast.caster, "You feel much better.");
        } else {
            ctx.tell(cast.caster, format!("You heal {them}."));
            ctx.tell(cast.target, format!("{me} heals you."));
        }
        debug!(target: "magic::cast", caster = %cast.caster, target = %cast.target, healed, "heal");
        Ok(true)
    }
}

/// Grants a timed protective effect; strength from the spell's power.
pub struct Ward(pub EffectKind);

impl SpellHandler for Ward {
    fn cast(&self, ctx: &mut CombatContext<'_>, cast: &SpellCast<'_>) -> Result<bool, CombatError> {
        let now = ctx.now;
        let strength = cast.spell.power.roll(&mut ctx.rolls).max(1);
        let until = now + CombatConfig::seconds(cast.spell.duration.max(1));
        let effect = Effect::timed(self.0, strength, until).owned_by(cast.caster);
        let applied = ctx.actor_mut(cast.target)?.effects.apply(effect, now);
        if !applied.took_hold() {
            ctx.tell(cast.caster, "The spell fails to take hold.");
            return Ok(false);
        }
        let them = ctx.name(cast.target);
        ctx.tell(cast.target, format!("You are surrounded by {}.", cast.spell.name));
        ctx.broadcast_near(cast.target, &[cast.target], format!("{them} is surrounded by {}.", cast.spell.name));
        Ok(true)
    }
}

/// Sends the target to a random other room. Whoever was fighting it loses
/// track of it.
pub struct Teleport;

impl SpellHandler for Teleport {
    fn cast(&self, ctx: &mut CombatContext<'_>, cast: &SpellCast<'_>) -> Result<bool, CombatError> {
        let here = ctx.actor(cast.target)?.room;
        let choices: Vec<RoomId> = ctx.world.rooms.keys().copied().filter(|r| *r != here).collect();
        if choices.is_empty() {
            return Ok(false);
        }
        let pick = choices[(ctx.rolls.range(1, choices.len() as i32) - 1) as usize];
        let them = ctx.name(cast.target);
        ctx.broadcast_near(cast.target, &[cast.target], format!("{them} vanishes!"));
        for actor in ctx.world.actors.iter_mut() {
            if actor.room == here {
                actor.enemies.remove(cast.target);
            }
        }
        ctx.world.move_actor(cast.target, pick);
        ctx.tell(cast.target, "The world spins around you.");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_lists_spells_without_handlers() {
        let catalog: SpellCatalog = [SpellDef::new("heal", "heal"), SpellDef::new("wish", "wish")]
            .into_iter()
            .collect();
        let book = SpellBook::with_defaults(catalog);
        let unbound: Vec<_> = book.unbound().map(|s| s.name.as_str()).collect();
        assert_eq!(unbound, ["wish"]);
        assert!(book.handler("bolt").is_some());
    }
}
