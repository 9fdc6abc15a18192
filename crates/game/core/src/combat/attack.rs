//! The attack state machine.
//!
//! One call to [`attack_creature`] resolves every swing of a single action:
//! pick the weapon, then per swing check it still works, roll the outcome
//! and route it. A death anywhere stops the remaining swings.

use tracing::{debug, info};

use crate::combat::{
    AttackOutcome, Blow, OutcomeFlags, WeaponSlot, cast_weapon, compute_damage,
    do_damage, do_reflection_damage, get_attack_result, simultaneous_death, stun,
};
use crate::combat::weapon::{Unequip, break_object, equipped, unequip, wear};
use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{
    Actor, ActorId, Class, CooldownKind, Effect, EffectKind, Item, ItemFlags, MonsterFlags,
    PlayerFlags, Posture, RoomId, Skill, Stat, Tick, WeaponCategory,
};

/// The flavor of a physical attack.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttackType {
    #[default]
    Normal,
    Bash,
    Kick,
    Maul,
    Ambush,
}

impl AttackType {
    /// Special moves run on their own timers, not the swing timer.
    pub const fn uses_attack_timer(self) -> bool {
        matches!(self, Self::Normal)
    }

    const fn skill(self) -> Option<Skill> {
        match self {
            Self::Normal => None,
            Self::Bash => Some(Skill::Bash),
            Self::Kick => Some(Skill::Kick),
            Self::Maul => Some(Skill::Maul),
            Self::Ambush => Some(Skill::Ambush),
        }
    }

    /// Past tense used when the move lands.
    const fn landed(self) -> Option<&'static str> {
        match self {
            Self::Bash => Some("bashed"),
            Self::Kick => Some("kicked"),
            Self::Maul => Some("mauled"),
            _ => None,
        }
    }
}

/// Why an attack action did or did not play out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttackStatus {
    #[default]
    Resolved,
    /// The swing timer has not run down.
    NotReady { remaining: u64 },
    /// Stunned, held, petrified or otherwise unable to act.
    Incapacitated,
    /// The victim cannot be hurt by this attacker's weapons.
    NoEffect,
    /// Nobody to fight.
    NoTarget,
}

/// What one attack action did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackReport {
    pub status: AttackStatus,
    /// Outcome of each swing, in order.
    pub swings: Vec<AttackOutcome>,
    /// Total damage realized against the victim.
    pub damage: i32,
    pub killed: bool,
    pub attacker_died: bool,
    /// Where the victim ran to, if it fled.
    pub victim_fled: Option<RoomId>,
}

impl AttackReport {
    fn with_status(status: AttackStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

// ============================================================================
// Timers
// ============================================================================

/// Ticks between swings with the wielded weapon.
pub fn weapon_delay(actor: &Actor, config: &CombatConfig) -> u64 {
    actor
        .equipment
        .wield
        .as_ref()
        .map_or(config.default_weapon_delay, |w| w.delay.max(1))
}

/// Swing interval after speed effects.
pub fn attack_interval(actor: &Actor, config: &CombatConfig, now: Tick) -> u64 {
    let base = weapon_delay(actor, config) + actor.attack_delay;
    let hasted = actor.effects.has(EffectKind::Haste, now) || actor.effects.has(EffectKind::Frenzy, now);
    if hasted {
        base * 2 / 3
    } else if actor.effects.has(EffectKind::Slow, now) {
        base * 4 / 3
    } else {
        base
    }
}

fn extend_attack_timer(actor: &mut Actor, extra: u64) {
    let interval = actor
        .cooldowns
        .get(CooldownKind::Attack)
        .map_or(0, |c| c.interval);
    actor
        .cooldowns
        .set_interval(CooldownKind::Attack, interval + extra);
}

fn incapacitated(actor: &Actor, now: Tick) -> bool {
    actor.is_dying()
        || actor.is_unconscious()
        || actor.effects.active_at(now).any(|e| e.kind.incapacitates())
}

/// Whether `attacker` can hurt `victim` at all with `weapon` (or bare hands).
///
/// Creatures always connect. Players need enchanted or silver weapons
/// against warded victims; lycanthropes and focused monks carry their own.
pub fn can_hit(attacker: &Actor, victim: &Actor, weapon: Option<&Item>, daytime: bool, now: Tick) -> bool {
    if attacker.is_monster() {
        return true;
    }
    let dm = attacker.class == Class::DungeonMaster;
    let enchant = weapon.map_or(0, |w| w.adjustment.abs());
    let silver = weapon.is_some_and(|w| w.flags.contains(ItemFlags::SILVER));
    let focused = attacker.class == Class::Monk
        && attacker.player_flags.contains(PlayerFlags::FOCUSED)
        && weapon.is_none();
    let lycan = |a: &Actor| {
        a.effects.has(EffectKind::Lycanthropy, now) || a.player_flags.contains(PlayerFlags::LYCANTHROPE)
    };

    if victim.is_player() {
        if dm {
            return true;
        }
        let warded = (lycan(victim) && victim.level >= 10 && !silver)
            || (victim.class == Class::Lich && victim.level >= 7)
            || victim.player_flags.contains(PlayerFlags::ENCHANT_ONLY);
        let mundane = match weapon {
            None => !focused,
            Some(_) => enchant < 1,
        };
        return !(warded && !lycan(attacker) && mundane);
    }

    let flags = victim.monster_flags;
    let gated = MonsterFlags::ENCHANTED_WEAPONS_ONLY | MonsterFlags::PLUS_TWO | MonsterFlags::PLUS_THREE;
    if !flags.intersects(gated) || dm {
        return true;
    }
    if lycan(attacker)
        && !daytime
        && attacker.level > 19
        && flags.contains(MonsterFlags::ENCHANTED_WEAPONS_ONLY)
    {
        return true;
    }
    if attacker.class == Class::Monk
        && attacker.player_flags.contains(PlayerFlags::FOCUSED)
        && attacker.level >= 16
        && flags.intersects(MonsterFlags::ENCHANTED_WEAPONS_ONLY | MonsterFlags::PLUS_TWO)
    {
        return true;
    }
    weapon.is_some()
        && ((flags.contains(MonsterFlags::ENCHANTED_WEAPONS_ONLY) && enchant > 0)
            || (flags.contains(MonsterFlags::PLUS_TWO) && enchant > 1)
            || (flags.contains(MonsterFlags::PLUS_THREE) && enchant > 2))
}

// ============================================================================
// Narration helpers
// ============================================================================

fn verbs(attacker: &Actor, weapon: Option<&Item>, now: Tick) -> (&'static str, &'static str) {
    match weapon.and_then(|w| w.category) {
        Some(WeaponCategory::Crushing) => ("smash", "smashes"),
        Some(WeaponCategory::Piercing) => ("stab", "stabs"),
        Some(WeaponCategory::Slashing) => ("slash", "slashes"),
        Some(WeaponCategory::Chopping) => ("chop", "chops"),
        Some(WeaponCategory::Ranged) => ("shoot", "shoots"),
        None if attacker.effects.has(EffectKind::Lycanthropy, now) => ("claw", "claws"),
        None => ("punch", "punches"),
    }
}

/// Anyone asleep in the actor's room wakes up.
pub fn wake_room(ctx: &mut CombatContext<'_>, about: ActorId) {
    let Some(room) = ctx.world.actors.get(about).map(|a| a.room) else {
        return;
    };
    let mut woken = Vec::new();
    for actor in ctx.world.actors.iter_mut() {
        if actor.room == room && actor.posture == Posture::Sleeping {
            actor.posture = Posture::Standing;
            woken.push(actor.id);
        }
    }
    for id in woken {
        ctx.tell(id, "Loud noises disturb your sleep.");
    }
}

/// Practice makes perfect, sometimes.
fn check_improve(ctx: &mut CombatContext<'_>, actor: ActorId, skill: Skill, success: bool) {
    let chance = if success { 10 } else { 5 };
    if !ctx.rolls.chance(chance) {
        return;
    }
    if let Some(a) = ctx.world.actors.get_mut(actor)
        && a.is_player()
    {
        a.improve_skill(skill);
    }
}

pub(crate) fn dodge_message(ctx: &mut CombatContext<'_>, defender: ActorId, attacker: ActorId) {
    let (me, them) = (ctx.name(defender), ctx.name(attacker));
    let (mine, theirs) = match ctx.rolls.range(1, 10) {
        1 => ("barely manage to dodge", "barely dodges"),
        2 | 3 => ("deftly dodge", "deftly dodges"),
        4 | 5 => ("dance gracefully around", "dances gracefully around"),
        6 | 7 => ("easily dodge", "easily dodges"),
        8 => ("duck under", "ducks under"),
        _ => ("laugh and dodge", "laughs and dodges"),
    };
    ctx.tell(defender, format!("You {mine} {them}'s attack."));
    ctx.tell(attacker, format!("{me} {theirs} your attack."));
    ctx.broadcast_near(defender, &[defender, attacker], format!("{me} {theirs} {them}'s attack."));
}

// ============================================================================
// Parry
// ============================================================================

/// Result of a defender parrying.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Parry {
    pub riposte: bool,
    pub attacker_died: bool,
    pub defender_died: bool,
}

/// Players and seasoned martial monsters can turn a parry into a counter.
pub fn can_riposte(actor: &Actor) -> bool {
    actor.is_player()
        || (actor.level >= 15
            && matches!(
                actor.class,
                Class::Fighter | Class::Berserker | Class::Assassin | Class::Thief | Class::Rogue
            ))
}

/// `defender` has parried `attacker`; they may riposte.
///
/// # Errors
///
/// Fails if either actor is missing.
pub fn parry(
    ctx: &mut CombatContext<'_>,
    defender: ActorId,
    attacker: ActorId,
) -> Result<Parry, CombatError> {
    let now = ctx.now;
    let weapon = equipped(ctx, defender, WeaponSlot::Wield);
    let def = ctx.actor_mut(defender)?;
    let riposte_delay = match def.class {
        Class::Thief | Class::Assassin | Class::Fighter => 9,
        _ => 6,
    };
    def.cooldowns
        .set(CooldownKind::Special(u8::MAX), now, CombatConfig::seconds(riposte_delay));
    let can = can_riposte(def) && (weapon.is_some() || def.is_monster());

    let outcome = if can {
        get_attack_result(
            ctx,
            defender,
            attacker,
            weapon.as_ref(),
            OutcomeFlags::DOUBLE_MISS
                | OutcomeFlags::NO_DODGE
                | OutcomeFlags::NO_PARRY
                | OutcomeFlags::NO_BLOCK
                | OutcomeFlags::NO_CRITICAL
                | OutcomeFlags::NO_FUMBLE
                | OutcomeFlags::NO_GLANCING,
            None,
        )?
    } else {
        AttackOutcome::Miss
    };

    let (me, them) = (ctx.name(defender), ctx.name(attacker));
    if outcome == AttackOutcome::Miss {
        ctx.tell(defender, format!("You parry {them}'s attack."));
        ctx.tell(attacker, format!("{me} parries your attack."));
        ctx.broadcast_near(defender, &[defender, attacker], format!("{me} parries {them}'s attack."));
        return Ok(Parry::default());
    }

    let computed = compute_damage(ctx, defender, attacker, weapon.as_ref(), Blow::new(AttackType::Normal, outcome))?;
    let mut dmg = computed.damage;
    dmg.damage += dmg.bonus;
    if ctx.actor(defender)?.is_monster() {
        dmg.damage = (dmg.damage / 2).max(1);
    }

    let (verb, verbs_) = verbs(ctx.actor(defender)?, weapon.as_ref(), now);
    ctx.tell(defender, format!("You riposte {them}'s attack and {verb} them for {} damage.", dmg.damage));
    ctx.tell(attacker, format!("{me} ripostes your attack and {verbs_} you for {} damage.", dmg.damage));
    ctx.broadcast_near(defender, &[defender, attacker], format!("{me} ripostes {them}'s attack and {verbs_} them."));

    if weapon.is_some() {
        wear(ctx, defender, WeaponSlot::Wield)?;
        if break_object(ctx, defender, WeaponSlot::Wield)? {
            debug!(target: "combat::attack", defender = %defender, "weapon broke on riposte");
        }
    }
    let att = ctx.actor_mut(attacker)?;
    if att.is_player() {
        att.cooldowns.stamp(CooldownKind::Attack, now);
    }

    let me_killed = do_reflection_damage(ctx, defender, attacker, &dmg)?;
    do_damage(ctx, attacker, Some(defender), dmg.damage)?;
    if me_killed || !ctx.is_alive(attacker) {
        let (attacker_died, defender_died) = simultaneous_death(ctx, defender, attacker)?;
        return Ok(Parry {
            riposte: true,
            attacker_died,
            defender_died,
        });
    }
    Ok(Parry {
        riposte: true,
        ..Parry::default()
    })
}

// ============================================================================
// Player attack
// ============================================================================

/// Resolves one attack action by `attacker` against `victim`.
///
/// The engagement gate is the caller's job; this assumes the attack is
/// allowed.
///
/// # Errors
///
/// Fails if either actor is missing or an invariant is broken mid-swing.
pub fn attack_creature(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    attack: AttackType,
) -> Result<AttackReport, CombatError> {
    let now = ctx.now;
    let config = ctx.config;

    // ----- preamble: timers -----
    {
        let me = ctx.actor_mut(attacker)?;
        if incapacitated(me, now) {
            return Ok(AttackReport::with_status(AttackStatus::Incapacitated));
        }
        if attack.uses_attack_timer() {
            if !me.cooldowns.ready(CooldownKind::Attack, now) {
                let remaining = me.cooldowns.remaining(CooldownKind::Attack, now);
                return Ok(AttackReport::with_status(AttackStatus::NotReady { remaining }));
            }
            let interval = attack_interval(me, config, now);
            me.cooldowns.set(CooldownKind::Attack, now, interval);
        }
        me.effects.remove(EffectKind::Invisibility);
        if me.effects.has(EffectKind::Blindness, now) {
            extend_attack_timer(me, 30);
        }
    }
    if !ctx.is_alive(victim) {
        return Ok(AttackReport::with_status(AttackStatus::NoTarget));
    }

    // ----- preamble: engagement narration -----
    let (me, them) = (ctx.name(attacker), ctx.name(victim));
    let attacker_is_staff = ctx.actor(attacker)?.is_staff();
    let victim_is_player = ctx.actor(victim)?.is_player();
    if victim_is_player {
        if attack == AttackType::Normal {
            ctx.tell(victim, format!("{me} attacked you!"));
            ctx.broadcast_near(victim, &[attacker, victim], format!("{me} attacked {them}!"));
        }
    } else {
        let newly = ctx.actor_mut(victim)?.add_enemy(attacker, now);
        if newly && attack == AttackType::Normal {
            ctx.tell(attacker, format!("You attack {them}."));
            ctx.broadcast_near(attacker, &[attacker], format!("{me} attacks {them}."));
        }
        let magic_only = ctx
            .actor(victim)?
            .monster_flags
            .contains(MonsterFlags::ONLY_HARMED_BY_MAGIC);
        if magic_only && !attacker_is_staff {
            ctx.tell(attacker, format!("Your weapon had no effect on {them}."));
            wake_room(ctx, attacker);
            return Ok(AttackReport::with_status(AttackStatus::NoEffect));
        }
    }

    // ----- SELECT_WEAPON -----
    let mut slot = None;
    let mut attacks: i32 = 1;
    let mut dual = false;
    let mut multi = false;
    {
        let eq = &ctx.actor(attacker)?.equipment;
        match attack {
            AttackType::Kick => {
                if eq.feet.is_some() {
                    slot = Some(WeaponSlot::Feet);
                }
            }
            AttackType::Maul => {}
            _ => {
                if eq.wield.is_some() {
                    slot = Some(WeaponSlot::Wield);
                    if attack != AttackType::Bash && eq.off_hand_weapon().is_some() {
                        dual = true;
                        attacks += 1;
                    }
                }
            }
        }
        let swings = slot
            .and_then(|s| s.get(eq))
            .map_or(1, |w| w.num_attacks);
        if swings > 1 && !matches!(attack, AttackType::Ambush | AttackType::Bash | AttackType::Maul) {
            attacks = ctx.rolls.range(1, swings as i32);
            multi = true;
            dual = false;
        }
    }

    let mut report = AttackReport::default();
    let mut swing = 0;
    let mut landed = false;

    'swings: while swing < attacks {
        swing += 1;

        // ----- CHECK_WEAPON_VIABLE -----
        'swing: {
            if let Some(s) = slot
                && break_object(ctx, attacker, s)?
            {
                slot = None;
                if multi {
                    attacks = 1;
                }
                break 'swing;
            }

            // ----- ROLL_OUTCOME -----
            let mut flags = OutcomeFlags::empty();
            let mut alt_skill = None;
            if matches!(attack, AttackType::Kick | AttackType::Maul) {
                flags |= OutcomeFlags::NO_FUMBLE;
                alt_skill = attack.skill().map(|s| ctx.actor(attacker).map_or(0, |a| a.skill(s)));
            }
            let weapon = slot.and_then(|s| equipped(ctx, attacker, s));
            let mut outcome = get_attack_result(ctx, attacker, victim, weapon.as_ref(), flags, alt_skill)?;
            if outcome == AttackOutcome::Fumble && multi && swing != 1 {
                outcome = AttackOutcome::Hit;
            }
            if attack == AttackType::Ambush
                && outcome.connects()
                && ctx.actor(victim)?.monster_flags.contains(MonsterFlags::NO_BACKSTAB)
            {
                outcome = AttackOutcome::Miss;
            }
            report.swings.push(outcome);
            debug!(target: "combat::attack", attacker = %attacker, victim = %victim, swing, ?outcome, "swing");

            match outcome {
                // ----- APPLY_HIT_BRANCH -----
                o if o.connects() => {
                    let daytime = config.is_daytime(now);
                    if !can_hit(ctx.actor(attacker)?, ctx.actor(victim)?, weapon.as_ref(), daytime, now) {
                        match &weapon {
                            Some(w) => ctx.tell(attacker, format!("Your {} has no effect on {them}.", w.name)),
                            None => ctx.tell(attacker, format!("Your attack has no effect on {them}.")),
                        }
                        if victim_is_player {
                            ctx.tell(victim, format!("{me}'s attack on you was ineffective."));
                        }
                        break 'swing;
                    }
                    landed = true;

                    let mut multiplier = 1.0;
                    if attack == AttackType::Ambush {
                        multiplier = 1.5;
                    } else if attack == AttackType::Bash {
                        let me = ctx.actor(attacker)?;
                        multiplier = if me.class == Class::Berserker { 0.75 } else { 0.5 };
                        if me
                            .equipment
                            .shield
                            .as_ref()
                            .is_some_and(|s| s.flags.contains(ItemFlags::ENHANCE_BASH))
                        {
                            multiplier += 0.1;
                        }
                    }
                    let mut blow = Blow::new(attack, outcome).with_multiplier(multiplier);
                    if multi && swing != 1 {
                        blow = blow.without_bonus();
                    }
                    let computed = compute_damage(ctx, attacker, victim, weapon.as_ref(), blow)?;
                    if computed.shattered
                        && let Some(s) = slot.take()
                    {
                        unequip(ctx, attacker, s, Unequip::Destroy)?;
                        if multi {
                            attacks = 1;
                        }
                    }
                    let mut dmg = computed.damage;
                    let mut drain = computed.drain;

                    if outcome == AttackOutcome::Block {
                        ctx.tell(attacker, format!("{them} partially blocked your attack!"));
                        ctx.tell(victim, format!("You manage to partially block {me}'s attack!"));
                    }
                    dmg.include_bonus(if multi { attacks } else { 1 });

                    let (verb, verb_s) = match attack.landed() {
                        Some(done) => {
                            ctx.broadcast_near(attacker, &[attacker], format!("{me} {done} {them}."));
                            (done, done)
                        }
                        None => verbs(ctx.actor(attacker)?, weapon.as_ref(), now),
                    };
                    let brittle = if ctx.actor(victim)?.is_brittle() { "r brittle body" } else { "" };
                    ctx.tell(attacker, format!("You {verb} {them} for {} damage.", dmg.damage));
                    ctx.tell(victim, format!("{me} {verb_s} you{brittle} for {} damage!", dmg.damage));

                    let mut me_killed = do_reflection_damage(ctx, attacker, victim, &dmg)?;
                    let mut proc_damage = 0;
                    if !me_killed && let Some(s) = slot {
                        let cast = cast_weapon(ctx, attacker, victim, s)?;
                        proc_damage = cast.damage;
                        me_killed |= cast.attacker_died;
                    }
                    if let Some(s) = slot {
                        wear(ctx, attacker, s)?;
                        if break_object(ctx, attacker, s)? {
                            slot = None;
                            if multi {
                                attacks = 1;
                            }
                        }
                    }
                    dmg.damage += proc_damage;

                    let victim_hp = ctx.actor(victim)?.hp.cur();
                    if !me_killed && drain > 0 && victim_hp - dmg.damage > 0 {
                        drain = drain.min(victim_hp - dmg.damage);
                        ctx.tell(attacker, format!("Your aura of evil drains {drain} hit points from your opponent."));
                        ctx.tell(victim, format!("{me} drains {drain} hit points from you!"));
                        dmg.damage += drain;
                        if !victim_is_player {
                            ctx.actor_mut(attacker)?.hp.increase(drain);
                        }
                    }

                    match attack {
                        AttackType::Bash => {
                            let secs = if victim_is_player {
                                ctx.rolls.range(4, 6)
                            } else {
                                ctx.rolls.range(5, 8)
                            };
                            stun(ctx.actor_mut(victim)?, secs, now);
                            check_improve(ctx, attacker, Skill::Bash, true);
                        }
                        AttackType::Maul => {
                            let mine = ctx.actor(attacker)?.stats.bonus(Stat::Strength);
                            let v = ctx.actor(victim)?;
                            let (theirs, undead) = (v.stats.bonus(Stat::Strength), v.is_undead());
                            let secs = if victim_is_player {
                                (ctx.rolls.range(3, 5) + (mine - theirs)).max(3)
                            } else if undead {
                                ctx.rolls.range(2, 4)
                            } else {
                                (ctx.rolls.range(3, 5) + ((mine - theirs) / 2).min(2)).max(3)
                            };
                            stun(ctx.actor_mut(victim)?, secs, now);
                            check_improve(ctx, attacker, Skill::Maul, true);
                        }
                        AttackType::Ambush => check_improve(ctx, attacker, Skill::Ambush, true),
                        AttackType::Kick => check_improve(ctx, attacker, Skill::Kick, true),
                        AttackType::Normal if !victim_is_player => {
                            let skill = weapon
                                .as_ref()
                                .and_then(|w| w.category)
                                .map_or(Skill::BareHand, Skill::for_weapon);
                            check_improve(ctx, attacker, skill, true);
                        }
                        AttackType::Normal => {}
                    }

                    wake_room(ctx, attacker);
                    let dealt = do_damage(ctx, victim, Some(attacker), dmg.damage)?;
                    report.damage += dealt;
                    if !ctx.is_alive(victim) || me_killed {
                        let (killed, attacker_died) = simultaneous_death(ctx, attacker, victim)?;
                        report.killed = killed;
                        report.attacker_died = attacker_died;
                        info!(target: "combat::attack", attacker = %attacker, victim = %victim, killed, attacker_died, "attack ended in death");
                        return Ok(report);
                    }
                }

                // ----- APPLY_MISS_BRANCH -----
                AttackOutcome::Miss => {
                    if attack == AttackType::Ambush && swing == 1 {
                        ctx.tell(attacker, "Your ambush failed!");
                        ctx.broadcast_near(attacker, &[attacker], format!("{me}'s ambush was detected."));
                        check_improve(ctx, attacker, Skill::Ambush, false);
                        let doubled = weapon_delay(ctx.actor(attacker)?, config) * 2;
                        ctx.actor_mut(attacker)?
                            .cooldowns
                            .set(CooldownKind::Attack, now, doubled);
                        break 'swings;
                    }
                    if let Some(skill) = attack.skill().filter(|_| attack != AttackType::Ambush) {
                        let what = attack.to_string();
                        ctx.tell(attacker, format!("Your {what} was ineffective."));
                        ctx.tell(victim, format!("{me} tried to {what} you."));
                        ctx.broadcast_near(victim, &[attacker, victim], format!("{me} tried to {what} {them}."));
                        check_improve(ctx, attacker, skill, false);
                        break 'swings;
                    }
                    ctx.tell(attacker, "You missed.");
                    ctx.tell(victim, format!("{me} missed."));
                    if !victim_is_player {
                        ctx.broadcast_near(victim, &[attacker, victim], format!("{me} missed {them}."));
                        let skill = weapon
                            .as_ref()
                            .and_then(|w| w.category)
                            .map_or(Skill::BareHand, Skill::for_weapon);
                        check_improve(ctx, attacker, skill, false);
                    }
                }

                // ----- APPLY_DODGE -----
                AttackOutcome::Dodge => dodge_message(ctx, victim, attacker),

                // ----- APPLY_PARRY -----
                AttackOutcome::Parry => {
                    let parried = parry(ctx, victim, attacker)?;
                    if parried.attacker_died || parried.defender_died {
                        report.attacker_died = parried.attacker_died;
                        report.killed = parried.defender_died;
                        wake_room(ctx, attacker);
                        return Ok(report);
                    }
                }

                // ----- APPLY_FUMBLE -----
                _ => {
                    ctx.tell(attacker, "You FUMBLED your weapon.");
                    ctx.broadcast_near(attacker, &[attacker], format!("{me} fumbled their weapon."));
                    if let Some(s) = slot.take() {
                        unequip(ctx, attacker, s, Unequip::ToInventory)?;
                        if multi {
                            attacks = 1;
                        }
                    }
                }
            }
        }

        // ----- NEXT_SWING_OR_DONE -----
        if swing == 1 && dual {
            slot = ctx
                .actor(attacker)?
                .equipment
                .held
                .is_some()
                .then_some(WeaponSlot::Held);
        }
    }

    // A wounded creature may bolt once it has been struck.
    if landed && !victim_is_player && ctx.is_alive(victim) {
        report.victim_fled = crate::npc::check_flee(ctx, victim)?;
    }
    wake_room(ctx, attacker);
    Ok(report)
}

// ============================================================================
// Monster attack
// ============================================================================

/// The enemy a monster is actually swinging at: its top-threat enemy in the
/// same room.
pub fn current_target(ctx: &CombatContext<'_>, monster: ActorId) -> Option<ActorId> {
    let me = ctx.world.actors.get(monster)?;
    let mut best: Option<(i64, ActorId)> = None;
    for entry in me.enemies.iter() {
        let Some(t) = ctx.world.actors.get(entry.target) else {
            continue;
        };
        if t.room != me.room || t.is_dying() || !me.can_see(t, ctx.now) {
            continue;
        }
        if best.is_none_or(|(threat, _)| entry.threat > threat) {
            best = Some((entry.threat, entry.target));
        }
    }
    best.map(|(_, id)| id)
}

/// One melee round by an autonomous creature against its current target.
///
/// # Errors
///
/// Fails if an actor vanishes mid-resolution.
pub fn monster_attack(
    ctx: &mut CombatContext<'_>,
    monster: ActorId,
) -> Result<AttackReport, CombatError> {
    let now = ctx.now;
    let config = ctx.config;
    {
        let me = ctx.actor(monster)?;
        if incapacitated(me, now) {
            return Ok(AttackReport::with_status(AttackStatus::Incapacitated));
        }
        if !me.cooldowns.ready(CooldownKind::Attack, now) {
            let remaining = me.cooldowns.remaining(CooldownKind::Attack, now);
            return Ok(AttackReport::with_status(AttackStatus::NotReady { remaining }));
        }
    }
    let Some(mut target) = current_target(ctx, monster) else {
        return Ok(AttackReport::with_status(AttackStatus::NoTarget));
    };

    // A pet's master standing nearby is the better mark.
    let t = ctx.actor(target)?;
    if let Some(master) = t.master.filter(|_| t.is_pet())
        && ctx.world.actors.get(master).is_some_and(|m| m.room == t.room && !m.is_dying())
    {
        let smart = t.stats.get(Stat::Intelligence) >= 150;
        if smart || ctx.rolls.range(1, 100) < 20 {
            target = master;
            ctx.actor_mut(monster)?.add_enemy(master, now);
        }
    }

    let target_is_player = ctx.actor(target)?.is_player();
    let me_actor = ctx.actor(monster)?;
    let is_pet = me_actor.is_pet();
    if target_is_player
        && is_pet
        && ctx.world.room_of(monster).is_some_and(|r| r.is_pk_safe())
        && !me_actor
            .master
            .and_then(|m| ctx.world.actors.get(m))
            .is_some_and(Actor::is_caretaker)
    {
        return Ok(AttackReport::with_status(AttackStatus::NoEffect));
    }

    let interval = attack_interval(me_actor, config, now);
    let me = ctx.actor_mut(monster)?;
    me.cooldowns.set(CooldownKind::Attack, now, interval);
    me.cooldowns.stamp(CooldownKind::AggroAction, now);
    wake_room(ctx, monster);

    // The target's pets rush in.
    if target_is_player {
        let pets = ctx.actor(target)?.pets.clone();
        for pet in pets {
            if pet == monster {
                continue;
            }
            let Some(p) = ctx.world.actors.get_mut(pet) else {
                continue;
            };
            if p.master == Some(target) && !p.is_enemy(monster) && !p.is_dying() {
                p.add_enemy(monster, now);
                let name = p.name.clone();
                ctx.tell(target, format!("{name} jumps to your aid!!"));
                break;
            }
        }
    }

    let me = ctx.actor_mut(monster)?;
    if me.hp.cur() <= me.hp.max() / 3
        && me.monster_flags.contains(MonsterFlags::WILL_BERSERK)
        && !me.effects.has(EffectKind::Berserk, now)
    {
        me.effects
            .apply(Effect::timed(EffectKind::Berserk, 1, now + CombatConfig::seconds(120)), now);
        let name = me.name.clone();
        ctx.broadcast_near(monster, &[], format!("{name} goes berserk!"));
    }

    let (me_name, them) = (ctx.name(monster), ctx.name(target));
    if is_pet {
        let target_actor = ctx.actor(target)?;
        let immune = !target_actor.is_player()
            && target_actor
                .monster_flags
                .contains(MonsterFlags::ONLY_HARMED_BY_MAGIC);
        if immune {
            if let Some(master) = ctx.actor(monster)?.master {
                ctx.tell(master, format!("{me_name}'s attack has no effect on {them}."));
            }
            return Ok(AttackReport::with_status(AttackStatus::NoEffect));
        }
    }

    let outcome = get_attack_result(
        ctx,
        monster,
        target,
        None,
        OutcomeFlags::NO_CRITICAL | OutcomeFlags::NO_FUMBLE,
        None,
    )?;
    let mut report = AttackReport {
        swings: vec![outcome],
        ..AttackReport::default()
    };

    match outcome {
        o if o.connects() => {
            let weapon = equipped(ctx, monster, WeaponSlot::Wield);
            let computed = compute_damage(ctx, monster, target, weapon.as_ref(), Blow::new(AttackType::Normal, outcome))?;
            let mut dmg = computed.damage;
            dmg.include_bonus(1);
            if outcome == AttackOutcome::Block {
                ctx.tell(target, format!("You manage to partially block {me_name}'s attack!"));
            }
            let brittle = if ctx.actor(target)?.is_brittle() { "r brittle body" } else { "" };
            ctx.tell(target, format!("{me_name} hits you{brittle} for {} damage.", dmg.damage.max(1)));
            if let Some(master) = ctx.actor(monster)?.master {
                ctx.tell(master, format!("{me_name} hit {them} for {} damage.", dmg.damage));
            }
            if let Some(master) = ctx.actor(target)?.master {
                ctx.tell(master, format!("{me_name} hit {them} for {} damage.", dmg.damage));
            }
            if !target_is_player {
                ctx.actor_mut(target)?.add_enemy(monster, now);
                if !is_pet {
                    ctx.broadcast_near(monster, &[target], format!("{me_name} hits {them}."));
                }
            }

            let mut me_killed = false;
            if weapon.is_some() {
                let cast = cast_weapon(ctx, monster, target, WeaponSlot::Wield)?;
                dmg.damage += cast.damage;
                me_killed |= cast.attacker_died;
            }
            me_killed |= do_reflection_damage(ctx, monster, target, &dmg)?;
            report.damage = do_damage(ctx, target, Some(monster), dmg.damage)?;
            if !ctx.is_alive(target) || me_killed {
                let (killed, attacker_died) = simultaneous_death(ctx, monster, target)?;
                report.killed = killed;
                report.attacker_died = attacker_died;
            }
        }
        AttackOutcome::Dodge => dodge_message(ctx, target, monster),
        AttackOutcome::Parry => {
            let parried = parry(ctx, target, monster)?;
            report.attacker_died = parried.attacker_died;
            report.killed = parried.defender_died;
        }
        _ => {
            ctx.tell(target, format!("{me_name} missed you."));
            if !target_is_player {
                ctx.actor_mut(target)?.add_enemy(monster, now);
            }
        }
    }
    Ok(report)
}
