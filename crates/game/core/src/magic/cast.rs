//! Validating and resolving a spell cast.
//!
//! Checks run in a fixed order and the first one that fails decides the
//! result. Only a cast whose handler reports an effect is charged in full
//! and starts the recast delay; a fumbled incantation costs half.

use tracing::{debug, info};

use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::engagement::can_attack;
use crate::error::{CombatError, ErrorContext, ErrorSeverity, GameError};
use crate::magic::{LookupError, SpellCast};
use crate::state::{
    Actor, ActorId, Class, CooldownKind, EffectKind, MonsterFlags, PlayerFlags, RoomFlags, Stat,
};
use crate::targeting::{TargetError, TargetQuery, find_victim};

/// How a caster's spells are gated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastingType {
    /// Gated on the spell's domain.
    Divine,
    /// Gated on the spell's school.
    Arcane,
    /// Needs both.
    Other,
}

impl CastingType {
    pub const fn of(class: Class) -> Self {
        if class.is_divine() {
            Self::Divine
        } else if matches!(class, Class::Mage | Class::Lich) {
            Self::Arcane
        } else {
            Self::Other
        }
    }
}

/// Why a cast did not go off. Told to the caster verbatim.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    #[error("Cast? BAH! Magic is for the weak! Hack and slash instead!")]
    Berserker,
    #[error("Your mind is too clouded for that right now.")]
    Clouded,
    #[error("You can't see to direct the incantation!")]
    Blind,
    #[error("You can't speak the incantation!")]
    Silenced,
    #[error("That spell does not exist.")]
    UnknownSpell,
    #[error("Spell name is not unique.")]
    AmbiguousSpell,
    #[error("You don't know that spell.")]
    NotKnown,
    #[error("Divine spellcasters may not cast that spell.")]
    DomainForbidden,
    #[error("Arcane spellcasters may not cast that spell.")]
    SchoolForbidden,
    #[error("Your class may not cast that spell.")]
    ClassForbidden,
    #[error("Nothing happens.")]
    NoMagicRoom,
    #[error("Please wait {} more seconds.", remaining.div_ceil(CombatConfig::TICKS_PER_SECOND))]
    NotReady { remaining: u64 },
    #[error("You must be at least level {need} to cast that spell.")]
    LevelTooLow { need: u32 },
    #[error("Your spell fails.")]
    AntiMagic,
    #[error("You need {need} magic points to cast that spell.")]
    NotEnoughMana { need: i32 },
    #[error("You need more than {need} hit points to cast that spell.")]
    NotEnoughHp { need: i32 },
    #[error("Your spell fails.")]
    Fizzled,
    #[error("{0}")]
    Target(TargetError),
    #[error("You may not cast that on them.")]
    Denied,
    #[error("The dimensional anchor holds fast.")]
    Anchored,
    #[error("Your spell has no effect.")]
    NoEffect,
}

impl GameError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Clouded
            | Self::Blind
            | Self::Silenced
            | Self::NotReady { .. }
            | Self::NotEnoughMana { .. }
            | Self::NotEnoughHp { .. }
            | Self::Fizzled
            | Self::AntiMagic
            | Self::Anchored
            | Self::NoEffect => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Berserker => "CAST_BERSERKER",
            Self::Clouded => "CAST_CLOUDED",
            Self::Blind => "CAST_BLIND",
            Self::Silenced => "CAST_SILENCED",
            Self::UnknownSpell => "CAST_UNKNOWN_SPELL",
            Self::AmbiguousSpell => "CAST_AMBIGUOUS_SPELL",
            Self::NotKnown => "CAST_NOT_KNOWN",
            Self::DomainForbidden => "CAST_DOMAIN_FORBIDDEN",
            Self::SchoolForbidden => "CAST_SCHOOL_FORBIDDEN",
            Self::ClassForbidden => "CAST_CLASS_FORBIDDEN",
            Self::NoMagicRoom => "CAST_NO_MAGIC_ROOM",
            Self::NotReady { .. } => "CAST_NOT_READY",
            Self::LevelTooLow { .. } => "CAST_LEVEL_TOO_LOW",
            Self::AntiMagic => "CAST_ANTI_MAGIC",
            Self::NotEnoughMana { .. } => "CAST_NOT_ENOUGH_MANA",
            Self::NotEnoughHp { .. } => "CAST_NOT_ENOUGH_HP",
            Self::Fizzled => "CAST_FIZZLED",
            Self::Target(_) => "CAST_BAD_TARGET",
            Self::Denied => "CAST_DENIED",
            Self::Anchored => "CAST_ANCHORED",
            Self::NoEffect => "CAST_NO_EFFECT",
        }
    }
}

/// Result of [`cast`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CastResult {
    Success,
    /// Refused outright; nothing was spent.
    Failure(CastError),
    /// Not right now; try again later. Nothing was spent.
    CurrentFailure(CastError),
    /// The incantation went wrong. May have cost something.
    SpellFailure(CastError),
}

impl CastResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn error(&self) -> Option<&CastError> {
        match self {
            Self::Success => None,
            Self::Failure(e) | Self::CurrentFailure(e) | Self::SpellFailure(e) => Some(e),
        }
    }
}

/// What the caster typed.
#[derive(Clone, Copy, Debug)]
pub struct CastRequest<'r> {
    pub caster: ActorId,
    pub spell: &'r str,
    /// Empty: the caster for helpful spells, the current foe for harmful ones.
    pub target: &'r str,
}

impl<'r> CastRequest<'r> {
    pub fn new(caster: ActorId, spell: &'r str) -> Self {
        Self {
            caster,
            spell,
            target: "",
        }
    }

    #[must_use]
    pub fn on(mut self, target: &'r str) -> Self {
        self.target = target;
        self
    }
}

// ============================================================================
// Class tables
// ============================================================================

/// Percent chance the incantation works before luck, or `None` if the
/// caster never fumbles one.
pub fn spell_success_base(actor: &Actor) -> Option<i32> {
    if !actor.is_player() {
        return None;
    }
    let base = actor.level_i32() + actor.stats.bonus(Stat::Intelligence);
    let second = actor.second_class;
    let chance = match actor.class {
        Class::Assassin => base * 5 + 30,
        Class::Berserker => base * 5,
        Class::Pureblood => base * 5 + 60,
        Class::Cleric | Class::Druid | Class::Bard => base * 5 + 65,
        Class::Fighter if second == Some(Class::Mage) => base * 5 + 75,
        Class::Fighter => base * 5 + 10,
        Class::Mage | Class::Lich => base * 5 + 75,
        Class::Monk | Class::Werewolf => base * 6 + 25,
        Class::Paladin | Class::DeathKnight => base * 5 + 50,
        Class::Ranger => base * 4 + 56,
        Class::Thief if second == Some(Class::Mage) => base * 5 + 75,
        Class::Thief | Class::Rogue => base * 6 + 22,
        _ => return None,
    };
    Some(chance)
}

/// Seconds before a player of this class may cast again.
pub fn class_recast_delay(actor: &Actor) -> u64 {
    let second = actor.second_class;
    match actor.class {
        Class::DungeonMaster | Class::Caretaker => 0,
        Class::Mage if matches!(second, Some(Class::Thief | Class::Assassin)) => 4,
        Class::Mage | Class::Builder | Class::Lich => 3,
        Class::Bard | Class::Pureblood | Class::Paladin | Class::Druid => 4,
        Class::Cleric if second == Some(Class::Assassin) => 5,
        Class::Cleric => 4,
        Class::Fighter | Class::Thief if second == Some(Class::Mage) => 4,
        _ => 5,
    }
}

/// Seconds before a non-player caster may cast again.
pub const CREATURE_RECAST_DELAY: u64 = 4;

// ============================================================================
// Resolution
// ============================================================================

/// Resolves one cast.
///
/// # Errors
///
/// Fails when the caster is missing, no spell book is configured, or the
/// catalog names a handler nothing registered.
pub fn cast(ctx: &mut CombatContext<'_>, request: &CastRequest<'_>) -> Result<CastResult, CombatError> {
    let now = ctx.now;
    let book = ctx.env.spells()?;
    let caster = ctx.actor(request.caster)?;
    if caster.is_dying() {
        return Err(CombatError::actor_dying(request.caster, now));
    }
    let staff = caster.is_staff();
    let player = caster.is_player();

    // ----- caster capability -----
    if caster.class == Class::Berserker {
        return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::Berserker)));
    }
    if !staff {
        let fx = &caster.effects;
        let current = if fx.has(EffectKind::Confusion, now) || fx.has(EffectKind::Drunkenness, now) {
            Some(CastError::Clouded)
        } else if fx.has(EffectKind::Blindness, now) {
            Some(CastError::Blind)
        } else if fx.has(EffectKind::Silence, now) {
            Some(CastError::Silenced)
        } else {
            None
        };
        if let Some(err) = current {
            return Ok(refuse(ctx, request.caster, CastResult::CurrentFailure(err)));
        }
    }

    // ----- the spell itself -----
    let spell = match book.catalog().find(request.spell) {
        Ok(spell) => spell,
        Err(LookupError::NotFound) => {
            return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::UnknownSpell)));
        }
        Err(LookupError::Ambiguous) => {
            return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::AmbiguousSpell)));
        }
    };
    if !caster.known_spells.contains(&spell.name) {
        return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::NotKnown)));
    }
    if !staff {
        let forbidden = match CastingType::of(caster.class) {
            CastingType::Divine => spell.domain.is_none().then_some(CastError::DomainForbidden),
            CastingType::Arcane => spell.school.is_none().then_some(CastError::SchoolForbidden),
            CastingType::Other => (spell.domain.is_none() || spell.school.is_none())
                .then_some(CastError::ClassForbidden),
        };
        if let Some(err) = forbidden {
            return Ok(refuse(ctx, request.caster, CastResult::Failure(err)));
        }
    }

    // ----- where and when -----
    let room_flags = ctx.world.room_of(request.caster).map(|r| r.flags).unwrap_or_default();
    if room_flags.contains(RoomFlags::NO_MAGIC) && !staff {
        return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::NoMagicRoom)));
    }
    let remaining = caster.cooldowns.remaining(CooldownKind::Spell, now);
    if remaining > 0 {
        return Ok(refuse(
            ctx,
            request.caster,
            CastResult::CurrentFailure(CastError::NotReady { remaining }),
        ));
    }
    let need = spell.required_level();
    if player && !caster.is_caretaker() && caster.level < need {
        return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::LevelTooLow { need })));
    }
    if room_flags.contains(RoomFlags::ANTI_MAGIC) && !staff {
        return Ok(refuse(ctx, request.caster, CastResult::SpellFailure(CastError::AntiMagic)));
    }

    // ----- cost -----
    let pays_hp = caster.class == Class::Lich;
    let cost = spell.cost.max(0);
    if pays_hp && caster.hp.cur() <= cost {
        return Ok(refuse(
            ctx,
            request.caster,
            CastResult::CurrentFailure(CastError::NotEnoughHp { need: cost }),
        ));
    }
    if !pays_hp && caster.mp.cur() < cost {
        return Ok(refuse(
            ctx,
            request.caster,
            CastResult::CurrentFailure(CastError::NotEnoughMana { need: cost }),
        ));
    }
    let success_chance = spell_success_base(caster).map(|base| base * (caster.luck() / 30));
    if let Some(chance) = success_chance
        && ctx.rolls.range(1, 100) > chance
    {
        if cost > 0 {
            charge(ctx.actor_mut(request.caster)?, pays_hp, (cost / 2).max(1));
        }
        debug!(target: "magic::cast", caster = %request.caster, spell = %spell.name, chance, "fizzled");
        return Ok(refuse(ctx, request.caster, CastResult::SpellFailure(CastError::Fizzled)));
    }

    // ----- target -----
    let target = if spell.is_offensive() {
        find_victim(ctx.world, request.caster, &TargetQuery::hostile(request.target), now)
    } else if request.target.trim().is_empty() {
        Ok(request.caster)
    } else {
        find_victim(
            ctx.world,
            request.caster,
            &TargetQuery::new(request.target).allowing_self(),
            now,
        )
    };
    let target = match target {
        Ok(id) if ctx.is_alive(id) => id,
        Ok(_) => {
            let err = CastError::Target(TargetError::NotFound);
            return Ok(refuse(ctx, request.caster, CastResult::Failure(err)));
        }
        Err(e) => {
            return Ok(refuse(ctx, request.caster, CastResult::Failure(CastError::Target(e))));
        }
    };
    if spell.is_offensive() && !can_attack(ctx, request.caster, target, false) {
        // The gate already told the caster why.
        return Ok(CastResult::Failure(CastError::Denied));
    }
    let anchor = if spell.movement {
        ctx.actor(target)?.effects.strength(EffectKind::DimensionalAnchor, now)
    } else {
        None
    };
    if let Some(anchor) = anchor
        && ctx.rolls.range(1, 100) <= anchor
    {
        return Ok(refuse(ctx, request.caster, CastResult::SpellFailure(CastError::Anchored)));
    }

    // ----- dispatch -----
    let Some(handler) = book.handler(&spell.handler) else {
        return Err(CombatError::UnknownSpell {
            spell: spell.name.clone(),
            context: ErrorContext::new(now)
                .with_actor(request.caster)
                .with_message("spell names a handler that is not registered"),
        });
    };
    let done = handler.cast(
        ctx,
        &SpellCast {
            caster: request.caster,
            target,
            spell,
        },
    )?;
    if !done {
        return Ok(CastResult::SpellFailure(CastError::NoEffect));
    }

    // ----- charge and delay -----
    let default_delay = ctx.config.default_weapon_delay;
    let Some(me) = ctx.world.actors.get_mut(request.caster) else {
        // Killed by its own reflected spell; nothing left to charge.
        return Ok(CastResult::Success);
    };
    charge(me, pays_hp, cost);
    me.player_flags.remove(PlayerFlags::HIDDEN);
    me.monster_flags.remove(MonsterFlags::HIDDEN);
    let delay = if me.is_player() {
        spell.delay.unwrap_or_else(|| class_recast_delay(me))
    } else {
        me.cooldowns.set(CooldownKind::Attack, now, default_delay);
        CREATURE_RECAST_DELAY
    };
    me.cooldowns.set(CooldownKind::Spell, now, CombatConfig::seconds(delay));
    info!(
        target: "magic::cast",
        caster = %request.caster,
        target = %target,
        spell = %spell.name,
        cost,
        delay,
        "cast"
    );
    Ok(CastResult::Success)
}

fn charge(actor: &mut Actor, pays_hp: bool, amount: i32) {
    if pays_hp {
        actor.hp.decrease(amount);
    } else {
        actor.mp.decrease(amount);
    }
}

fn refuse(ctx: &mut CombatContext<'_>, caster: ActorId, result: CastResult) -> CastResult {
    if let Some(err) = result.error() {
        debug!(target: "magic::cast", caster = %caster, code = err.error_code(), "cast refused");
        ctx.tell(caster, err.to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Env, PcgRng};
    use crate::magic::{School, SpellBook, SpellCatalog, SpellDef};
    use crate::state::{ActorKind, Dice, Effect, Pool, Realm, Room, RoomId, Stats, World};

    fn catalog() -> SpellCatalog {
        [
            SpellDef::offensive("fire bolt", Dice::new(1, 1, 9), Some(Realm::Fire))
                .with_school(School::Evocation)
                .with_cost(6),
            SpellDef::new("teleport", "teleport")
                .with_school(School::Translocation)
                .with_tier(4)
                .with_cost(20)
                .movement(),
            SpellDef::new("armor", "armor")
                .with_school(School::Abjuration)
                .with_power(Dice::new(1, 1, 9), 60),
        ]
        .into_iter()
        .collect()
    }

    struct Tower {
        world: World,
        mage: ActorId,
        goblin: ActorId,
    }

    fn tower(flags: RoomFlags) -> Tower {
        let mut world = World::new(11);
        world.add_room(Room::new(RoomId(0), "Tower").with_flags(flags));
        world.add_room(Room::new(RoomId(1), "Cellar"));
        let mage = world.spawn(|id| {
            let mut a = Actor::new(id, "Ilsa", ActorKind::Player);
            a.class = Class::Mage;
            a.level = 12;
            a.mp = Pool::new(50);
            for spell in ["fire bolt", "teleport", "armor"] {
                a.known_spells.insert(spell.to_owned());
            }
            a
        });
        let goblin = world.spawn(|id| {
            let mut m = Actor::new(id, "goblin", ActorKind::Monster);
            m.hp = Pool::new(100);
            m
        });
        Tower { world, mage, goblin }
    }

    fn run(world: &mut World, request: CastRequest<'_>, now: u64) -> CastResult {
        let config = CombatConfig::new();
        let rng = PcgRng;
        let book = SpellBook::with_defaults(catalog());
        let env = Env::new(Some(&config), Some(&rng), Some(&book), None);
        let mut ctx = CombatContext::new(world, env, now).unwrap();
        cast(&mut ctx, &request).unwrap()
    }

    #[test]
    fn bolt_charges_mana_and_starts_the_class_delay() {
        let Tower { mut world, mage, goblin } = tower(RoomFlags::empty());
        let result = run(&mut world, CastRequest::new(mage, "fire").on("goblin"), 100);
        assert_eq!(result, CastResult::Success);

        let me = world.actors.get(mage).unwrap();
        assert_eq!(me.mp.cur(), 44);
        assert_eq!(me.cooldowns.remaining(CooldownKind::Spell, 100), 30);
        let hp = world.actors.get(goblin).unwrap().hp.cur();
        assert!((90..100).contains(&hp), "goblin at {hp}");
        assert!(world.actors.get(goblin).unwrap().is_enemy(mage));
    }

    #[test]
    fn short_of_mana_spends_nothing() {
        let Tower { mut world, mage, .. } = tower(RoomFlags::empty());
        world.actors.get_mut(mage).unwrap().mp = Pool::with_current(5, 50);
        let result = run(&mut world, CastRequest::new(mage, "fire bolt").on("goblin"), 100);
        assert_eq!(result, CastResult::CurrentFailure(CastError::NotEnoughMana { need: 6 }));
        let me = world.actors.get(mage).unwrap();
        assert_eq!(me.mp.cur(), 5);
        assert!(me.cooldowns.ready(CooldownKind::Spell, 100));
    }

    #[test]
    fn fumbled_incantation_costs_half_and_sets_no_delay() {
        let Tower { mut world, mage, .. } = tower(RoomFlags::empty());
        {
            let me = world.actors.get_mut(mage).unwrap();
            // No luck at all: every roll fails.
            me.stats = Stats {
                intelligence: 0,
                constitution: 0,
                ..Stats::default()
            };
        }
        let result = run(&mut world, CastRequest::new(mage, "fire bolt").on("goblin"), 100);
        assert_eq!(result, CastResult::SpellFailure(CastError::Fizzled));
        let me = world.actors.get(mage).unwrap();
        assert_eq!(me.mp.cur(), 47);
        assert!(me.cooldowns.ready(CooldownKind::Spell, 100));
    }

    #[test]
    fn validation_order() {
        let Tower { mut world, mage, .. } = tower(RoomFlags::empty());
        let berserker = world.spawn(|id| {
            let mut a = Actor::new(id, "Grom", ActorKind::Player);
            a.class = Class::Berserker;
            a
        });
        assert_eq!(
            run(&mut world, CastRequest::new(berserker, "armor"), 0),
            CastResult::Failure(CastError::Berserker)
        );
        assert_eq!(
            run(&mut world, CastRequest::new(mage, "wish"), 0),
            CastResult::Failure(CastError::UnknownSpell)
        );

        world.actors.get_mut(mage).unwrap().level = 4;
        assert_eq!(
            run(&mut world, CastRequest::new(mage, "teleport"), 0),
            CastResult::Failure(CastError::LevelTooLow { need: 10 })
        );

        let silence = Effect::timed(EffectKind::Silence, 1, 500);
        world.actors.get_mut(mage).unwrap().effects.apply(silence, 0);
        assert_eq!(
            run(&mut world, CastRequest::new(mage, "armor"), 0),
            CastResult::CurrentFailure(CastError::Silenced)
        );
    }

    #[test]
    fn anti_magic_room_fails_without_cost() {
        let Tower { mut world, mage, .. } = tower(RoomFlags::ANTI_MAGIC);
        let result = run(&mut world, CastRequest::new(mage, "armor"), 0);
        assert_eq!(result, CastResult::SpellFailure(CastError::AntiMagic));
        assert_eq!(world.actors.get(mage).unwrap().mp.cur(), 50);
    }

    #[test]
    fn full_anchor_stops_teleport() {
        let Tower { mut world, mage, .. } = tower(RoomFlags::empty());
        let anchor = Effect::permanent(EffectKind::DimensionalAnchor, 100);
        world.actors.get_mut(mage).unwrap().effects.apply(anchor, 0);
        let result = run(&mut world, CastRequest::new(mage, "teleport"), 0);
        assert_eq!(result, CastResult::SpellFailure(CastError::Anchored));
        assert_eq!(world.actors.get(mage).unwrap().room, RoomId(0));

        world.actors.get_mut(mage).unwrap().effects.remove(EffectKind::DimensionalAnchor);
        assert_eq!(run(&mut world, CastRequest::new(mage, "teleport"), 0), CastResult::Success);
        assert_eq!(world.actors.get(mage).unwrap().room, RoomId(1));
    }

    #[test]
    fn monsters_wait_a_flat_delay() {
        let Tower { mut world, goblin, mage } = tower(RoomFlags::empty());
        {
            let g = world.actors.get_mut(goblin).unwrap();
            g.class = Class::Mage;
            g.known_spells.insert("armor".to_owned());
        }
        assert_eq!(run(&mut world, CastRequest::new(goblin, "armor"), 10), CastResult::Success);
        let g = world.actors.get(goblin).unwrap();
        assert_eq!(g.cooldowns.remaining(CooldownKind::Spell, 10), 40);
        assert!(g.effects.has(EffectKind::Armor, 10));
        assert!(!world.actors.get(mage).unwrap().effects.has(EffectKind::Armor, 10));
    }

    #[test]
    fn class_delays_follow_second_class() {
        let mut a = Actor::new(ActorId(1), "x", ActorKind::Player);
        a.class = Class::Cleric;
        assert_eq!(class_recast_delay(&a), 4);
        a.second_class = Some(Class::Assassin);
        assert_eq!(class_recast_delay(&a), 5);
        a.class = Class::Fighter;
        a.second_class = Some(Class::Mage);
        assert_eq!(class_recast_delay(&a), 4);
        a.second_class = None;
        assert_eq!(class_recast_delay(&a), 5);
    }
}
