//! Picking things up off the floor.

use tracing::debug;

use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{ActorId, CooldownKind, Item, ItemFlags, ItemKind, MonsterFlags, RoomFlags};

/// Loose items worth at least this much gold attract looters.
pub const VALUABLE: i64 = 100;

/// Fixtures, hidden and unique objects stay where they are.
pub fn can_scavenge(item: &Item) -> bool {
    !item.flags.intersects(
        ItemFlags::NO_TAKE
            | ItemFlags::SCENERY
            | ItemFlags::HIDDEN
            | ItemFlags::PERM_INV
            | ItemFlags::PERM
            | ItemFlags::UNIQUE,
    )
}

fn stow(ctx: &mut CombatContext<'_>, monster: ActorId, item: Item) -> Result<(), CombatError> {
    let me = ctx.actor_mut(monster)?;
    if item.is_money() {
        me.coins += item.value;
    } else {
        me.inventory.push(item);
    }
    Ok(())
}

/// A scavenger now and then grabs the first object lying in its room.
///
/// Returns the name of what it took.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn check_scavenge(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Option<String>, CombatError> {
    let now = ctx.now;
    let config = ctx.config;
    let me = ctx.actor(monster)?;
    let room_id = me.room;
    let flags = me.monster_flags;
    let due = me.cooldowns.elapsed(CooldownKind::Scavenge, now) > config.scavenge_interval;
    let Some(room) = ctx.world.room(room_id) else {
        return Ok(None);
    };
    if room.has(RoomFlags::SHOP_STORAGE) || !flags.contains(MonsterFlags::SCAVENGER) {
        return Ok(None);
    }
    let takeable = room.objects.first().is_some_and(|item| {
        can_scavenge(item)
            && !(item.kind == ItemKind::Weapon && flags.contains(MonsterFlags::WILL_WIELD))
    });
    if due {
        ctx.actor_mut(monster)?.cooldowns.stamp(CooldownKind::Scavenge, now);
    }
    if !(due && takeable && ctx.rolls.range(1, 100) <= config.scavenge_chance) {
        return Ok(None);
    }

    let Some(item) = ctx.world.room_mut(room_id).map(|r| r.objects.remove(0)) else {
        return Ok(None);
    };
    let (name, what) = (ctx.name(monster), item.name.clone());
    ctx.actor_mut(monster)?.monster_flags |= MonsterFlags::HAS_SCAVENGED;
    ctx.broadcast_near(monster, &[monster], format!("{name} picked up {what}."));
    stow(ctx, monster, item)?;
    debug!(target: "npc::controller", monster = %monster, item = %what, "scavenged");
    Ok(Some(what))
}

/// What a looting pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Haul {
    pub taken: Vec<String>,
    /// Something too heavy to carry that the creature tried to hide.
    pub hid: Option<String>,
}

/// Thieves sweep up coins and valuables every few seconds; street sweepers
/// take everything. What does not fit gets hidden for later.
///
/// # Errors
///
/// Fails if the creature vanished.
pub fn check_loot(ctx: &mut CombatContext<'_>, monster: ActorId) -> Result<Haul, CombatError> {
    let now = ctx.now;
    let me = ctx.actor(monster)?;
    let flags = me.monster_flags;
    let room_id = me.room;
    if !flags.intersects(MonsterFlags::TAKE_LOOT | MonsterFlags::STREET_SWEEPER)
        || me.cooldowns.elapsed(CooldownKind::ThiefSweep, now) <= ctx.config.loot_interval
        || ctx.world.room(room_id).is_none_or(|r| r.has(RoomFlags::SHOP_STORAGE))
    {
        return Ok(Haul::default());
    }
    let sweeper = flags.contains(MonsterFlags::STREET_SWEEPER);
    ctx.actor_mut(monster)?.cooldowns.stamp(CooldownKind::ThiefSweep, now);

    let loose = ctx
        .world
        .room_mut(room_id)
        .map(|r| std::mem::take(&mut r.objects))
        .unwrap_or_default();
    let mut haul = Haul::default();
    let mut left = Vec::with_capacity(loose.len());
    let mut overflow = None;
    for item in loose {
        let wanted = (sweeper || item.is_money() || item.value >= VALUABLE) && can_scavenge(&item);
        if !wanted {
            left.push(item);
            continue;
        }
        if !ctx.actor(monster)?.can_carry(&item) {
            if overflow.is_none() && !sweeper {
                overflow = Some(left.len());
            }
            left.push(item);
            continue;
        }
        haul.taken.push(item.name.clone());
        stow(ctx, monster, item)?;
    }

    let name = ctx.name(monster);
    if !haul.taken.is_empty() {
        ctx.broadcast_near(monster, &[monster], format!("{name} picked up {}.", haul.taken.join(", ")));
    }
    if let Some(slot) = overflow {
        let what = left[slot].name.clone();
        ctx.broadcast_near(monster, &[monster], format!("{name} attempts to hide {what}."));
        let skill = ctx.actor(monster)?.level_i32() * 10;
        if ctx.rolls.range(1, 100) <= skill {
            left[slot].flags |= ItemFlags::HIDDEN;
        }
        haul.hid = Some(what);
    }
    if let Some(room) = ctx.world.room_mut(room_id) {
        room.objects = left;
    }
    debug!(target: "npc::controller", monster = %monster, taken = haul.taken.len(), "looted");
    Ok(haul)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{Env, FixedRng};
    use crate::state::{Actor, ActorKind, Room, RoomId, World};

    fn alley(flags: MonsterFlags, objects: Vec<Item>) -> (World, ActorId) {
        let mut world = World::new(2);
        let mut room = Room::new(RoomId(0), "Alley");
        room.objects = objects;
        world.add_room(room);
        let rat = world.spawn(|id| {
            let mut m = Actor::new(id, "rat", ActorKind::Monster);
            m.monster_flags = flags;
            m.level = 10;
            m.profile.max_weight = 10;
            m
        });
        (world, rat)
    }

    fn trinket(name: &str, value: i64, weight: i32) -> Item {
        Item {
            name: name.to_owned(),
            value,
            weight,
            ..Item::default()
        }
    }

    #[test]
    fn scavenger_takes_the_first_object_and_settles() {
        let (mut world, rat) = alley(MonsterFlags::SCAVENGER, vec![Item::money(40), trinket("bone", 1, 1)]);
        let config = CombatConfig::new();
        let now = config.scavenge_interval + 1;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), now).unwrap();
        assert_eq!(check_scavenge(&mut ctx, rat).unwrap().as_deref(), Some("40 gold coins"));
        let me = ctx.actor(rat).unwrap();
        assert_eq!(me.coins, 40);
        assert!(me.monster_flags.contains(MonsterFlags::HAS_SCAVENGED));
        assert_eq!(ctx.world.room(RoomId(0)).unwrap().objects.len(), 1);

        // Timer restarted.
        assert_eq!(check_scavenge(&mut ctx, rat).unwrap(), None);
    }

    #[test]
    fn fixtures_are_left_alone() {
        let statue = trinket("statue", 500, 1).with_flags(ItemFlags::SCENERY);
        let (mut world, rat) = alley(MonsterFlags::SCAVENGER, vec![statue]);
        let config = CombatConfig::new();
        let now = config.scavenge_interval + 1;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), now).unwrap();
        assert_eq!(check_scavenge(&mut ctx, rat).unwrap(), None);
        assert!(can_scavenge(&trinket("bone", 1, 1)));
    }

    #[test]
    fn thief_takes_valuables_and_hides_what_it_cannot_carry() {
        let objects = vec![
            trinket("bone", 1, 1),
            Item::money(25),
            trinket("ruby", 300, 2),
            trinket("anvil", 150, 50),
        ];
        let (mut world, rat) = alley(MonsterFlags::TAKE_LOOT, objects);
        let config = CombatConfig::new();
        let now = config.loot_interval + 1;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), now).unwrap();
        let haul = check_loot(&mut ctx, rat).unwrap();
        assert_eq!(haul.taken, ["25 gold coins", "ruby"]);
        assert_eq!(haul.hid.as_deref(), Some("anvil"));

        let left = &ctx.world.room(RoomId(0)).unwrap().objects;
        assert_eq!(left.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(), ["bone", "anvil"]);
        assert!(left[1].flags.contains(ItemFlags::HIDDEN));
        let me = ctx.actor(rat).unwrap();
        assert_eq!(me.coins, 25);
        assert_eq!(me.inventory.len(), 1);
    }

    #[test]
    fn street_sweeper_takes_everything_that_fits() {
        let objects = vec![trinket("bone", 1, 1), trinket("anvil", 150, 50)];
        let (mut world, rat) = alley(MonsterFlags::STREET_SWEEPER, objects);
        let config = CombatConfig::new();
        let now = config.loot_interval + 1;
        let mut ctx = CombatContext::new(&mut world, Env::combat_only(&config, &FixedRng(0)), now).unwrap();
        let haul = check_loot(&mut ctx, rat).unwrap();
        assert_eq!(haul.taken, ["bone"]);
        assert_eq!(haul.hid, None);
    }
}
