//! Deciding whether a creature's special attack goes off, and resolving it.

use tracing::{debug, info};

use crate::combat::attack::dodge_message;
use crate::combat::pipeline::affinity_to;
use crate::combat::{
    AttackOutcome, Damage, DamageType, Modifiers, OutcomeFlags, check_die, chk_save,
    do_damage, get_attack_result, modify_damage, parry, stun,
};
use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::specials::{
    Handled, SaveType, SpecialAttack, SpecialFlags, SpecialHit, SpecialType, TargetShape,
    render,
};
use crate::state::{
    Actor, ActorId, Affinity, CooldownKind, CreatureType, Effect, EffectKind, MonsterFlags,
    PlayerFlags, SaveCategory, Stat, Tick, is_holy_war,
};

/// Result of trying a creature's special attacks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SpecialOutcome {
    /// Nothing went off this time.
    #[default]
    NotUsed,
    Fired(SpecialReport),
}

impl SpecialOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, Self::Fired(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialReport {
    pub name: String,
    /// Victims the attack was resolved against.
    pub hits: usize,
    pub killed: Vec<ActorId>,
    pub attacker_died: bool,
}

/// What one application did to one victim.
#[derive(Clone, Copy, Debug, Default)]
struct Landed {
    fired: bool,
    killed: bool,
    attacker_died: bool,
}

impl Landed {
    const SKIPPED: Self = Self {
        fired: false,
        killed: false,
        attacker_died: false,
    };
    const FIRED: Self = Self {
        fired: true,
        killed: false,
        attacker_died: false,
    };
}

// ============================================================================
// Entry points
// ============================================================================

/// Tries each special in order and stops at the first one that goes off.
///
/// # Errors
///
/// Fails if an actor vanishes mid-resolution.
pub fn run_special_attacks(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
) -> Result<SpecialOutcome, CombatError> {
    let count = ctx.actor(attacker)?.specials.len();
    for slot in 0..count.min(CombatConfig::MAX_SPECIALS) {
        let outcome = use_special(ctx, attacker, slot, victim)?;
        if outcome.fired() {
            return Ok(outcome);
        }
    }
    Ok(SpecialOutcome::NotUsed)
}

/// Looks a special up by name and tries it.
///
/// # Errors
///
/// Fails if an actor vanishes mid-resolution.
pub fn use_special_named(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    name: &str,
    victim: ActorId,
) -> Result<SpecialOutcome, CombatError> {
    let slot = ctx
        .actor(attacker)?
        .specials
        .iter()
        .position(|s| s.name == name);
    match slot {
        Some(slot) => use_special(ctx, attacker, slot, victim),
        None => Ok(SpecialOutcome::NotUsed),
    }
}

/// Whether the special in `slot` may go off now, before any dice.
pub fn special_ready(actor: &Actor, slot: usize, config: &CombatConfig, now: Tick) -> bool {
    let Some(special) = actor.specials.get(slot) else {
        return false;
    };
    if special.flags.contains(SpecialFlags::REQUIRE_HIDE) && !actor.is_hidden() {
        return false;
    }
    if !actor.cooldowns.ready(cooldown_for(slot), now) || special.is_exhausted() {
        return false;
    }
    let day = config.is_daytime(now);
    !(special.flags.contains(SpecialFlags::DAY_ONLY) && !day
        || special.flags.contains(SpecialFlags::NIGHT_ONLY) && day)
}

fn cooldown_for(slot: usize) -> CooldownKind {
    CooldownKind::Special(u8::try_from(slot).unwrap_or(u8::MAX))
}

/// Evaluates the special in `slot`: gates, chance roll, then every target.
///
/// Fires at most once per call.
///
/// # Errors
///
/// Fails if an actor vanishes mid-resolution.
pub fn use_special(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    slot: usize,
    victim: ActorId,
) -> Result<SpecialOutcome, CombatError> {
    let now = ctx.now;
    let config = ctx.config;
    if !special_ready(ctx.actor(attacker)?, slot, config, now) {
        return Ok(SpecialOutcome::NotUsed);
    }
    let Some(special) = ctx.actor(attacker)?.specials.get(slot).cloned() else {
        return Ok(SpecialOutcome::NotUsed);
    };
    if special.chance < ctx.rolls.range(1, 100) {
        return Ok(SpecialOutcome::NotUsed);
    }

    let me = ctx.actor_mut(attacker)?;
    if special.flags.contains(SpecialFlags::REQUIRE_HIDE) {
        me.player_flags.remove(PlayerFlags::HIDDEN);
        me.monster_flags.remove(MonsterFlags::HIDDEN);
    }
    me.cooldowns.set(cooldown_for(slot), now, special.delay);

    let mut report = SpecialReport {
        name: special.name.clone(),
        ..SpecialReport::default()
    };

    let targets = if special.shape.is_area() {
        let attacker_name = ctx.name(attacker);
        let text = render(&special.text.room, &attacker_name, "", None);
        if !text.is_empty() {
            ctx.broadcast_near(attacker, &[], text);
        }
        area_targets(ctx, attacker, special.shape)?
    } else {
        vec![victim]
    };

    let mut fired = false;
    for target in targets {
        if !ctx.is_alive(target) || !ctx.is_alive(attacker) {
            continue;
        }
        let landed = do_special(ctx, attacker, target, &special)?;
        // Area attacks count as used once anyone was in range.
        fired |= landed.fired || special.shape.is_area();
        if landed.fired || special.shape.is_area() {
            report.hits += 1;
        }
        if landed.killed {
            report.killed.push(target);
        }
        if landed.attacker_died {
            report.attacker_died = true;
            break;
        }
    }

    if !fired {
        return Ok(SpecialOutcome::NotUsed);
    }
    if special.limit > 0
        && let Some(s) = ctx
            .world
            .actors
            .get_mut(attacker)
            .and_then(|a| a.specials.get_mut(slot))
    {
        s.used += 1;
    }
    info!(
        target: "combat::special",
        attacker = %attacker,
        special = %special.name,
        hits = report.hits,
        killed = report.killed.len(),
        "special attack"
    );
    Ok(SpecialOutcome::Fired(report))
}

fn area_targets(
    ctx: &CombatContext<'_>,
    attacker: ActorId,
    shape: TargetShape,
) -> Result<Vec<ActorId>, CombatError> {
    let me = ctx.actor(attacker)?;
    let room = me.room;
    let world = &ctx.world;
    let mut out = Vec::new();
    if matches!(shape, TargetShape::Players | TargetShape::All) {
        out.extend(world.players_in(room));
        out.extend(
            world
                .monsters_in(room)
                .into_iter()
                .filter(|id| world.actors.get(*id).is_some_and(Actor::is_pet)),
        );
    }
    if matches!(shape, TargetShape::Monsters | TargetShape::All) {
        out.extend(
            world
                .monsters_in(room)
                .into_iter()
                .filter(|id| world.actors.get(*id).is_some_and(|a| !a.is_pet())),
        );
    }
    if shape == TargetShape::AllEnemies {
        out.extend(
            me.enemies
                .targets()
                .filter(|id| world.actors.get(*id).is_some_and(|a| a.room == room)),
        );
    }
    out.retain(|&id| id != attacker);
    Ok(out)
}

// ============================================================================
// Resolution against one victim
// ============================================================================

fn breathes(actor: &Actor) -> bool {
    !matches!(
        actor.creature_type,
        CreatureType::Undead | CreatureType::Construct | CreatureType::Elemental
    )
}

/// Target-side conditions that make the special skip this victim.
fn excluded(attacker: &Actor, victim: &Actor, special: &SpecialAttack, now: Tick) -> bool {
    let f = special.flags;
    if f.contains(SpecialFlags::NO_UNDEAD) && victim.is_undead() {
        return true;
    }
    if f.contains(SpecialFlags::BREATHING_TARGETS) && !breathes(victim) {
        return true;
    }
    if f.contains(SpecialFlags::UNDEAD_ONLY) && !victim.is_undead() {
        return true;
    }
    if f.contains(SpecialFlags::NO_UNDEAD_WARD)
        && attacker.is_undead()
        && victim.effects.has(EffectKind::UndeadWard, now)
    {
        return true;
    }
    if f.contains(SpecialFlags::NO_DRAIN_SHIELD) && victim.effects.has(EffectKind::DrainShield, now) {
        return true;
    }
    if f.contains(SpecialFlags::NO_ATTACK_ON_LOW_HP) && attacker.hp.cur() <= attacker.hp.max() / 5 {
        return true;
    }
    if f.contains(SpecialFlags::NO_UNCONSCIOUS)
        && victim.is_player()
        && (victim.effects.has(EffectKind::Blindness, now)
            || victim.effects.has(EffectKind::Petrification, now)
            || victim.is_unconscious())
    {
        return true;
    }
    if f.contains(SpecialFlags::HOLY_WAR)
        && !is_holy_war((attacker.class, attacker.deity), (victim.class, victim.deity))
    {
        return true;
    }
    f.contains(SpecialFlags::TARGET_NEEDS_MANA) && victim.mp.cur() <= 0
}

/// Rolls the victim's save.
fn victim_saves(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    special: &SpecialAttack,
) -> Result<bool, CombatError> {
    let (me, them) = (ctx.actor(attacker)?, ctx.actor(victim)?);
    let level_gap = them.level_i32() - me.level_i32();

    if let Some(category) = special.save.category() {
        let bonus = special
            .save_bonus
            .stat()
            .map_or(0, |stat| 10 * level_gap + 3 * them.stats.bonus(stat))
            .clamp(0, special.save_cap());
        return Ok(chk_save(ctx, victim, category, Some(attacker), bonus));
    }

    let chance = if let Some(stat) = special.save.stat() {
        50 - level_gap * 10 + (me.stats.get(stat) - them.stats.get(stat)) / 5
    } else if special.save == SaveType::Level {
        35 - level_gap * 20
    } else {
        return Ok(false);
    };
    // `chance` is the attacker's chance to get through.
    Ok(ctx.rolls.range(1, 100) > chance.clamp(1, 90))
}

fn print_fail(ctx: &mut CombatContext<'_>, attacker: ActorId, victim: ActorId, special: &SpecialAttack) {
    let (me, them) = (ctx.name(attacker), ctx.name(victim));
    let room = render(&special.text.room_fail, &me, &them, None);
    if !room.is_empty() {
        ctx.broadcast_near(victim, &[victim], room);
    }
    let target = render(&special.text.target_fail, &me, &them, None);
    if !target.is_empty() {
        ctx.tell(victim, target);
    }
}

fn do_special(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    special: &SpecialAttack,
) -> Result<Landed, CombatError> {
    let now = ctx.now;
    if excluded(ctx.actor(attacker)?, ctx.actor(victim)?, special, now) {
        return Ok(Landed::SKIPPED);
    }
    let (me, them) = (ctx.name(attacker), ctx.name(victim));

    if special.kind == SpecialType::Weapon {
        let mut flags = OutcomeFlags::NO_CRITICAL | OutcomeFlags::NO_FUMBLE;
        if special.flags.contains(SpecialFlags::NO_DODGE) {
            flags |= OutcomeFlags::NO_DODGE;
        }
        if special.flags.contains(SpecialFlags::NO_PARRY) {
            flags |= OutcomeFlags::NO_PARRY;
        }
        if special.flags.contains(SpecialFlags::NO_BLOCK) {
            flags |= OutcomeFlags::NO_BLOCK;
        }
        match get_attack_result(ctx, attacker, victim, None, flags, None)? {
            AttackOutcome::Dodge => {
                print_fail(ctx, attacker, victim, special);
                dodge_message(ctx, victim, attacker);
                return Ok(Landed::FIRED);
            }
            AttackOutcome::Parry => {
                print_fail(ctx, attacker, victim, special);
                let p = parry(ctx, victim, attacker)?;
                return Ok(Landed {
                    fired: true,
                    killed: p.defender_died,
                    attacker_died: p.attacker_died,
                });
            }
            AttackOutcome::Miss => {
                print_fail(ctx, attacker, victim, special);
                return Ok(Landed::FIRED);
            }
            AttackOutcome::Block => {
                ctx.tell(attacker, format!("{them} partially blocked your attack!"));
                ctx.tell(victim, format!("You manage to partially block {me}'s attack!"));
            }
            _ => {}
        }
    }

    let saved = victim_saves(ctx, attacker, victim, special)?;
    if saved {
        let room = render(&special.text.room_save, &me, &them, None);
        if !room.is_empty() {
            ctx.broadcast_near(victim, &[victim], room);
        }
        let target = render(&special.text.target_save, &me, &them, None);
        if !target.is_empty() {
            ctx.tell(victim, target);
        }
        if special.flags.contains(SpecialFlags::SAVE_NO_DAMAGE) {
            return Ok(Landed::FIRED);
        }
    }

    // ----- typed effects or damage -----
    let mut amount: Option<i32> = None;
    let mut experience: Option<i64> = None;
    if special.kind.is_handled() {
        let Ok(registry) = ctx.env.specials() else {
            debug!(target: "combat::special", special = %special.name, "no special registry; skipped");
            return Ok(Landed::SKIPPED);
        };
        let Some(handler) = registry.get(special.kind) else {
            debug!(target: "combat::special", kind = %special.kind, "no handler registered");
            return Ok(Landed::SKIPPED);
        };
        let hit = SpecialHit {
            attacker,
            victim,
            special,
            saved,
        };
        match handler.apply(ctx, &hit)? {
            Handled::Resisted => return Ok(Landed::SKIPPED),
            Handled::Applied => {}
            Handled::ExperienceLoss(xp) => experience = Some(xp),
        }
    } else if special.kind.deals_damage() {
        amount = Some(roll_damage(ctx, attacker, victim, special, saved)?);
    }

    side_effects(ctx, attacker, victim, special)?;

    if !special.shape.is_area() {
        let room = render(&special.text.room, &me, &them, amount);
        if !room.is_empty() {
            ctx.broadcast_near(victim, &[victim], room);
        }
    }

    let mut landed = Landed::FIRED;
    if let Some(xp) = experience {
        print_target(ctx, &me, &them, victim, special, i32::try_from(xp).ok());
        let v = ctx.actor_mut(victim)?;
        v.experience = (v.experience - xp).max(0);
    } else if let Some(dmg) = amount {
        print_target(ctx, &me, &them, victim, special, Some(dmg));
        if special.flags.contains(SpecialFlags::DRAINS_DAMAGE) {
            ctx.tell(victim, format!("{me} feeds on your energy."));
            ctx.actor_mut(attacker)?.hp.increase(dmg / 2);
        }
        if let Some(master) = ctx.actor(attacker)?.master {
            let verb = &special.text.verb;
            ctx.tell(master, format!("{me} {verb} {them} for {dmg} damage."));
        }
        do_damage(ctx, victim, Some(attacker), dmg)?;
        if check_die(ctx, victim, Some(attacker))? {
            landed.killed = true;
            return Ok(landed);
        }
    } else {
        print_target(ctx, &me, &them, victim, special, None);
    }

    if special.stun > 0 && !saved {
        let secs = if special.flags.contains(SpecialFlags::RANDOMIZE_STUN) {
            ctx.rolls.range(special.stun - 3, special.stun + 3).max(1)
        } else {
            special.stun
        };
        ctx.tell(victim, format!("You have been stunned for {secs} seconds!"));
        stun(ctx.actor_mut(victim)?, secs, now);
    }
    Ok(landed)
}

fn print_target(
    ctx: &mut CombatContext<'_>,
    me: &str,
    them: &str,
    victim: ActorId,
    special: &SpecialAttack,
    damage: Option<i32>,
) {
    let text = if special.text.target.is_empty() {
        match damage {
            Some(d) if !special.text.verb.is_empty() => {
                format!("{me} {} you for {d} damage!", special.text.verb)
            }
            _ => return,
        }
    } else {
        render(&special.text.target, me, them, damage)
    };
    ctx.tell(victim, text);
}

/// Damage for the damaging special types, through realm affinity and the
/// pipeline stages the flags ask for.
fn roll_damage(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    special: &SpecialAttack,
    saved: bool,
) -> Result<i32, CombatError> {
    let now = ctx.now;
    let flags = special.flags;
    let v = ctx.actor(victim)?;

    let mut amount = if flags.contains(SpecialFlags::HALF_HP_DAMAGE) {
        v.hp.cur() / 2
    } else if flags.contains(SpecialFlags::RESIST_MAGIC_NO_DAMAGE) && v.effects.has(EffectKind::ResistMagic, now) {
        0
    } else {
        let mut dice = special.damage;
        if flags.contains(SpecialFlags::INTELLIGENCE_REDUCE) {
            let cut = match v.stats.intelligence {
                i if i < 210 => 0,
                i if i < 240 => 1,
                _ => 2,
            };
            dice.count = dice.count.saturating_sub(cut).max(1);
        }
        dice.roll(&mut ctx.rolls)
    };
    if saved {
        amount /= 2;
    }

    let v = ctx.actor(victim)?;
    if let Some(realm) = special.kind.realm() {
        match affinity_to(v, realm, now) {
            Some(Affinity::Resist) => amount /= 2,
            Some(Affinity::Immune) => amount = 0,
            Some(Affinity::Vulnerable) => amount += amount / 2,
            None => {}
        }
    }
    if flags.contains(SpecialFlags::EARTH_SHIELD_REDUCE) && v.effects.has(EffectKind::EarthShield, now) {
        amount /= 2;
    }
    if flags.contains(SpecialFlags::UNDEAD_WARD_REDUCE)
        && ctx.actor(attacker)?.is_undead()
        && v.effects.has(EffectKind::UndeadWard, now)
    {
        amount /= 2;
    }
    if flags.contains(SpecialFlags::DRAIN_SHIELD_REDUCE) && v.effects.has(EffectKind::DrainShield, now) {
        amount /= 2;
    }
    let berserk = v.effects.has(EffectKind::Berserk, now);

    let kind = if special.kind == SpecialType::Weapon || flags.contains(SpecialFlags::CHECK_PHYSICAL_DAMAGE) {
        Some(DamageType::Physical)
    } else if flags.contains(SpecialFlags::CHECK_NEGATIVE_ENERGY) {
        Some(DamageType::NegativeEnergy)
    } else {
        None
    };
    if let Some(kind) = kind {
        let mut dmg = Damage::new(amount.max(0));
        modify_damage(ctx, victim, Some(attacker), kind, &mut dmg, Modifiers::default())?;
        amount = dmg.damage;
    }

    if flags.contains(SpecialFlags::BERSERK_REDUCE) && berserk {
        amount = ctx.rolls.range(1, 10);
    }

    if !saved && flags.contains(SpecialFlags::CAN_DISINTEGRATE) && ctx.rolls.range(1, 100) < 2 {
        let me = ctx.name(attacker);
        ctx.tell(victim, format!("{me} seriously damages you!"));
        amount = (ctx.actor(victim)?.hp.cur() - 5).max(1);
    }
    Ok(amount.max(0))
}

/// Poison, disease, blindness and mana zaps ride along on a monster's special.
fn side_effects(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    special: &SpecialAttack,
) -> Result<(), CombatError> {
    let now = ctx.now;
    let me = ctx.actor(attacker)?;
    if !me.is_monster() {
        return Ok(());
    }
    let owner = if me.is_pet() { me.master.unwrap_or(attacker) } else { attacker };
    let level = me.level_i32();
    let int_bonus = me.stats.bonus(Stat::Intelligence);
    let (name, them) = (ctx.name(attacker), ctx.name(victim));
    let flags = special.flags;

    if flags.contains(SpecialFlags::POISON) {
        let v = ctx.actor(victim)?;
        let protected = v.is_player() && v.effects.has(EffectKind::Stoneskin, now);
        if !protected && !v.effects.has(EffectKind::Poison, now) {
            let con = v.stats.bonus(Stat::Constitution);
            if chk_save(ctx, victim, SaveCategory::Poison, Some(attacker), 0) {
                ctx.tell(victim, "You avoided being poisoned!");
            } else {
                let secs = (ctx.rolls.range(2, 3) * 60 - 12 * con).max(60) as u64;
                let effect = Effect::timed(EffectKind::Poison, level.max(1), now + CombatConfig::seconds(secs))
                    .owned_by(owner);
                ctx.actor_mut(victim)?.effects.apply(effect, now);
                ctx.tell(victim, format!("{name} poisons you!"));
                ctx.broadcast_near(victim, &[victim], format!("{name} poisons {them}."));
            }
        }
    }

    if flags.contains(SpecialFlags::DISEASE) {
        let v = ctx.actor(victim)?;
        let protected = v.is_player() && v.effects.has(EffectKind::Stoneskin, now);
        let strength = (v.hp.max() / 20).max(1);
        if !protected {
            if chk_save(ctx, victim, SaveCategory::Poison, Some(attacker), 0) {
                ctx.tell(victim, "You narrowly avoid catching a disease!");
            } else {
                let effect = Effect::timed(EffectKind::Disease, strength, now + CombatConfig::seconds(600))
                    .owned_by(owner);
                ctx.actor_mut(victim)?.effects.apply(effect, now);
                ctx.tell(victim, format!("{name} infects you."));
                ctx.broadcast_near(victim, &[victim], format!("{name} infected {them}."));
            }
        }
    }

    if flags.contains(SpecialFlags::BLIND) {
        if chk_save(ctx, victim, SaveCategory::Luck, Some(attacker), 0) {
            ctx.tell(victim, "You narrowly avoided going blind!");
        } else {
            let secs = (180 - ctx.actor(victim)?.stats.constitution / 10).max(10) as u64;
            let effect = Effect::timed(EffectKind::Blindness, 1, now + CombatConfig::seconds(secs))
                .owned_by(owner);
            ctx.actor_mut(victim)?.effects.apply(effect, now);
            ctx.tell(victim, format!("{name} blinds your eyes."));
        }
    }

    if flags.contains(SpecialFlags::ZAP_MANA) {
        let mp = ctx.actor(victim)?.mp.cur();
        if mp > 0 {
            let mut n = mp.min(ctx.rolls.range(1 + level / 2, level) + int_bonus).max(0);
            ctx.tell(victim, format!("{name} zaps your magical talents!"));
            ctx.tell(victim, format!("{name} stole {n} magic points!"));
            ctx.broadcast_near(victim, &[victim], format!("{name} zapped {them}!"));
            if chk_save(ctx, victim, SaveCategory::Mental, Some(attacker), 0) {
                n /= 2;
            }
            ctx.actor_mut(victim)?.mp.decrease(n);
        }
    }
    Ok(())
}
