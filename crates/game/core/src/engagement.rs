//! The engagement gate: may one actor start hostilities with another?
//!
//! [`check_engagement`] is a pure query over the world. [`can_attack`] wraps
//! it for command handlers: it tells the would-be attacker why they were
//! refused and, when the gate opens against a player, rouses that player's
//! first pet against the attacker.

use tracing::debug;

use crate::config::CombatConfig;
use crate::context::CombatContext;
use crate::state::{
    Actor, ActorId, Class, EffectKind, MonsterFlags, PlayerFlags, RoomFlags, Tick, World,
    is_holy_war,
};

/// Why the gate stayed shut.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Denial {
    SelfTarget,
    Missing,
    PetVersusMaster,
    OwnPet,
    StaffRank,
    CannotSee,
    BuilderVersusPlayer,
    BuilderNoMonsters,
    BuilderOutOfRange,
    Sitting,
    LostDuel,
    Petrified,
    Charmed,
    OutlawSafeRoom,
    TargetInCombat,
    SafeRoom,
    NoPkill,
    AttackerLawful,
    TargetLawful,
    PickOnYourOwnSize,
    OutOfYourLeague,
    Unkillable,
    Imprudent,
}

impl Denial {
    /// Text shown to the refused actor.
    pub fn message(self, verb: &str, target: &str) -> String {
        match self {
            Self::SelfTarget => format!("You can't {verb} yourself."),
            Self::Missing | Self::CannotSee => "You don't see that here.".to_owned(),
            Self::PetVersusMaster => format!("Pets cannot {verb} their masters."),
            Self::OwnPet => format!("You cannot {verb} your pet."),
            Self::StaffRank => format!("You are not allowed to {verb} {target}."),
            Self::BuilderVersusPlayer => format!("You are not allowed to {verb} players."),
            Self::BuilderNoMonsters => format!("You are not allowed to {verb} monsters."),
            Self::BuilderOutOfRange => {
                "This room is not inside any of your allotted ranges.".to_owned()
            }
            Self::Sitting => "You can't do that when sitting. Stand up!".to_owned(),
            Self::LostDuel => format!("{target} just lost a duel! You can't {verb} them now."),
            Self::Petrified => format!("You can't {verb} {target}! They're petrified!"),
            Self::Charmed => format!("You like {target} too much to do that."),
            Self::OutlawSafeRoom => format!("You cannot {verb} outlaws in this room."),
            Self::TargetInCombat => "Not in the middle of combat.".to_owned(),
            Self::SafeRoom => "No killing allowed in this room.".to_owned(),
            Self::NoPkill => format!("You cannot {verb} {target} right now."),
            Self::AttackerLawful => "Sorry, you're lawful.".to_owned(),
            Self::TargetLawful => format!("Sorry, {target} is lawful."),
            Self::PickOnYourOwnSize => "Pick on someone your own size!".to_owned(),
            Self::OutOfYourLeague => "Pick on someone you can kill.".to_owned(),
            Self::Unkillable => format!("You cannot harm {target}."),
            Self::Imprudent => "That wouldn't be very prudent at this time.".to_owned(),
        }
    }
}

/// A refusal and the actor who should hear about it. For a pet that is its
/// master.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Denied {
    pub tell: ActorId,
    pub reason: Denial,
}

fn deny(tell: ActorId, reason: Denial) -> Result<(), Denied> {
    Err(Denied { tell, reason })
}

/// Evaluates the gate without touching the world.
pub fn check_engagement(
    world: &World,
    config: &CombatConfig,
    attacker: ActorId,
    target: ActorId,
    now: Tick,
) -> Result<(), Denied> {
    if attacker == target {
        return deny(attacker, Denial::SelfTarget);
    }
    let (Some(me), Some(victim)) = (world.actors.get(attacker), world.actors.get(target)) else {
        return deny(attacker, Denial::Missing);
    };

    if !me.is_player() {
        return match me.master {
            Some(master) if master == target => deny(master, Denial::PetVersusMaster),
            Some(master) => check_engagement(world, config, master, target, now),
            None => Ok(()),
        };
    }

    if victim.is_pet() && victim.master == Some(attacker) && !me.is_staff() {
        return deny(attacker, Denial::OwnPet);
    }

    // Attacking a pet is judged against its master.
    let check = match victim.master.and_then(|m| world.actors.get(m)) {
        Some(master) if victim.is_pet() => master,
        _ => victim,
    };

    if check.is_staff() && me.class < check.class && !staff_pet_is_hostile(world, me, victim) {
        return deny(attacker, Denial::StaffRank);
    }

    if me.is_caretaker() {
        return Ok(());
    }

    if !me.can_see(victim, now) {
        return deny(attacker, Denial::CannotSee);
    }

    if me.class == Class::Builder {
        if check.is_player() {
            return deny(attacker, Denial::BuilderVersusPlayer);
        }
        if !me.player_flags.contains(PlayerFlags::BUILDER_MOBS) {
            return deny(attacker, Denial::BuilderNoMonsters);
        }
        let room = me.room.0;
        if !me.builder_ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&room)) {
            return deny(attacker, Denial::BuilderOutOfRange);
        }
    }

    if me.posture == crate::state::Posture::Sitting {
        return deny(attacker, Denial::Sitting);
    }

    if check.is_player() {
        check_player_law(world, config, me, victim, check, now)
    } else {
        check_monster_target(world, me, victim)
    }
}

/// A staff member's pet that is already fighting us, or that one of our
/// pets is fighting, may be struck back.
fn staff_pet_is_hostile(world: &World, me: &Actor, victim: &Actor) -> bool {
    victim.is_pet()
        && (victim.is_enemy(me.id)
            || me
                .pets
                .iter()
                .filter_map(|p| world.actors.get(*p))
                .any(|pet| pet.is_enemy(victim.id)))
}

fn check_player_law(
    world: &World,
    config: &CombatConfig,
    me: &Actor,
    victim: &Actor,
    check: &Actor,
    now: Tick,
) -> Result<(), Denied> {
    let id = me.id;
    if check.player_flags.contains(PlayerFlags::DIED_IN_DUEL) {
        return deny(id, Denial::LostDuel);
    }
    if check.effects.has(EffectKind::Petrification, now) {
        return deny(id, Denial::Petrified);
    }
    if me
        .effects
        .get(EffectKind::Charm, now)
        .is_some_and(|charm| charm.owner == Some(check.id))
    {
        return deny(id, Denial::Charmed);
    }

    let room_flags = world.room(me.room).map(|r| r.flags).unwrap_or_default();

    if check.player_flags.contains(PlayerFlags::OUTLAW) {
        if room_flags.contains(RoomFlags::OUTLAW_SAFE) {
            return deny(id, Denial::OutlawSafeRoom);
        }
        return Ok(());
    }

    if config.pkill_in_combat_disabled && !victim.is_pet() && world.in_combat(victim.id) {
        return deny(id, Denial::TargetInCombat);
    }
    if room_flags.contains(RoomFlags::PK_SAFE) {
        return deny(id, Denial::SafeRoom);
    }

    let dueling = me.duel_with == Some(check.id) && check.duel_with == Some(me.id);
    if dueling {
        return Ok(());
    }
    if check.player_flags.contains(PlayerFlags::NO_PKILL) {
        return deny(id, Denial::NoPkill);
    }

    let holy_war = is_holy_war((me.class, me.deity), (check.class, check.deity));
    let both_pledged = me.player_flags.contains(PlayerFlags::PLEDGED)
        && check.player_flags.contains(PlayerFlags::PLEDGED);
    let both_guilded = me.guild.is_some() && check.guild.is_some();
    if !holy_war && !both_pledged && !both_guilded {
        if !me.player_flags.contains(PlayerFlags::CHAOTIC) {
            return deny(id, Denial::AttackerLawful);
        }
        if !check.player_flags.contains(PlayerFlags::CHAOTIC) {
            return deny(id, Denial::TargetLawful);
        }
    }

    if check.level <= config.newbie_level && me.level >= config.veteran_level {
        return deny(id, Denial::PickOnYourOwnSize);
    }
    if check.level >= config.veteran_level && me.level <= config.newbie_level {
        return deny(id, Denial::OutOfYourLeague);
    }
    Ok(())
}

fn check_monster_target(world: &World, me: &Actor, victim: &Actor) -> Result<(), Denied> {
    if victim.monster_flags.contains(MonsterFlags::UNKILLABLE) && !me.is_staff() {
        return deny(me.id, Denial::Unkillable);
    }
    let one_person = world
        .room(me.room)
        .is_some_and(|r| r.has(RoomFlags::ONE_PERSON));
    if victim.monster_flags.contains(MonsterFlags::PERMANENT)
        && me.level < 3
        && victim.level > me.level
        && !one_person
        && !victim.is_enemy(me.id)
        && !me.is_staff()
    {
        return deny(me.id, Denial::Imprudent);
    }
    Ok(())
}

/// Gate used by attack and steal commands.
///
/// On refusal the reason is told to the attacker (or its master) and
/// nothing else changes. On success against a player, the first of that
/// player's pets standing nearby takes the attacker as an enemy.
pub fn can_attack(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    target: ActorId,
    stealing: bool,
) -> bool {
    if let Err(denied) = check_engagement(ctx.world, ctx.config, attacker, target, ctx.now) {
        let verb = if stealing { "steal from" } else { "attack" };
        let text = denied.reason.message(verb, &ctx.name(target));
        debug!(
            target: "combat::engagement",
            attacker = %attacker,
            victim = %target,
            reason = %denied.reason,
            "engagement denied"
        );
        ctx.tell(denied.tell, text);
        return false;
    }

    let attacker_is_player = ctx.world.actors.get(attacker).is_some_and(Actor::is_player);
    if stealing || !attacker_is_player {
        return true;
    }
    rouse_first_pet(ctx, attacker, target);
    true
}

fn rouse_first_pet(ctx: &mut CombatContext<'_>, attacker: ActorId, target: ActorId) {
    let Some(victim) = ctx.world.actors.get(target) else {
        return;
    };
    if !victim.is_player() {
        return;
    }
    let pet = victim.pets.iter().copied().find(|p| {
        ctx.world
            .actors
            .get(*p)
            .is_some_and(|pet| pet.master == Some(target) && pet.room == victim.room)
    });
    let Some(pet) = pet else {
        return;
    };
    let now = ctx.now;
    let newly = ctx
        .world
        .actors
        .get_mut(pet)
        .is_some_and(|p| !p.is_enemy(attacker) && p.add_enemy(attacker, now));
    if newly {
        let text = format!("{} stands loyally before its master!", ctx.name(pet));
        ctx.broadcast_near(target, &[], text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorKind, Room, RoomId};

    fn players() -> (World, ActorId, ActorId) {
        let mut world = World::new(3);
        world.add_room(Room::new(RoomId(0), "Square"));
        let a = world.spawn(|id| Actor::new(id, "Ann", ActorKind::Player));
        let b = world.spawn(|id| Actor::new(id, "Bex", ActorKind::Player));
        (world, a, b)
    }

    fn pet_of(world: &mut World, master: ActorId) -> ActorId {
        let pet = world.spawn(|id| {
            let mut wolf = Actor::new(id, "wolf", ActorKind::Monster);
            wolf.master = Some(master);
            wolf
        });
        if let Some(m) = world.actors.get_mut(master) {
            m.pets.push(pet);
        }
        pet
    }

    #[test]
    fn pet_never_attacks_its_master() {
        let (mut world, a, _) = players();
        let pet = pet_of(&mut world, a);
        let denied = check_engagement(&world, &CombatConfig::new(), pet, a, 0).unwrap_err();
        assert_eq!(denied.reason, Denial::PetVersusMaster);
        assert_eq!(denied.tell, a);
    }

    #[test]
    fn lawful_players_cannot_fight() {
        let (mut world, a, b) = players();
        let config = CombatConfig::new();
        let denied = check_engagement(&world, &config, a, b, 0).unwrap_err();
        assert_eq!(denied.reason, Denial::AttackerLawful);

        for id in [a, b] {
            world.actors.get_mut(id).map(|p| p.player_flags |= PlayerFlags::CHAOTIC);
        }
        assert!(check_engagement(&world, &config, a, b, 0).is_ok());

        world.actors.get_mut(a).map(|p| p.level = 12);
        let denied = check_engagement(&world, &config, a, b, 0).unwrap_err();
        assert_eq!(denied.reason, Denial::PickOnYourOwnSize);
    }

    #[test]
    fn higher_staff_is_shielded_unless_their_pet_is_hostile() {
        let (mut world, a, b) = players();
        world.actors.get_mut(b).map(|p| p.class = Class::DungeonMaster);
        let staff_pet = pet_of(&mut world, b);
        let config = CombatConfig::new();

        let denied = check_engagement(&world, &config, a, staff_pet, 0).unwrap_err();
        assert_eq!(denied.reason, Denial::StaffRank);

        let my_pet = pet_of(&mut world, a);
        world.actors.get_mut(my_pet).map(|p| p.enemies.add_enemy(staff_pet));
        let after = check_engagement(&world, &config, a, staff_pet, 0);
        assert_ne!(after.map_err(|d| d.reason), Err(Denial::StaffRank));
    }

    #[test]
    fn unkillable_monsters_are_refused() {
        let (mut world, a, _) = players();
        let statue = world.spawn(|id| {
            let mut m = Actor::new(id, "statue", ActorKind::Monster);
            m.monster_flags = MonsterFlags::UNKILLABLE;
            m
        });
        let denied = check_engagement(&world, &CombatConfig::new(), a, statue, 0).unwrap_err();
        assert_eq!(denied.reason, Denial::Unkillable);
    }
}
