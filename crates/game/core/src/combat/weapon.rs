//! Weapon wear, loss and spell procs during an attack.

use tracing::debug;

use crate::combat::{Damage, DamageType, Modifiers, do_reflection_damage, modify_damage};
use crate::context::CombatContext;
use crate::error::CombatError;
use crate::state::{ActorId, Equipment, Item, RoomFlags};

/// Where the swinging item is worn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponSlot {
    Wield,
    /// Off-hand weapon while dual wielding.
    Held,
    /// Boots, for kicks.
    Feet,
}

impl WeaponSlot {
    pub fn get(self, eq: &Equipment) -> Option<&Item> {
        match self {
            Self::Wield => eq.wield.as_ref(),
            Self::Held => eq.held.as_ref(),
            Self::Feet => eq.feet.as_ref(),
        }
    }

    pub fn get_mut(self, eq: &mut Equipment) -> Option<&mut Item> {
        match self {
            Self::Wield => eq.wield.as_mut(),
            Self::Held => eq.held.as_mut(),
            Self::Feet => eq.feet.as_mut(),
        }
    }

    fn take(self, eq: &mut Equipment) -> Option<Item> {
        match self {
            Self::Wield => eq.wield.take(),
            Self::Held => eq.held.take(),
            Self::Feet => eq.feet.take(),
        }
    }
}

/// What happens to an item that leaves the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unequip {
    ToInventory,
    Destroy,
}

/// Snapshot of the item in `slot`, if any.
pub fn equipped(ctx: &CombatContext<'_>, actor: ActorId, slot: WeaponSlot) -> Option<Item> {
    ctx.world
        .actors
        .get(actor)
        .and_then(|a| slot.get(&a.equipment))
        .cloned()
}

/// Removes the item in `slot`. Returns the item's name if one was there.
pub fn unequip(
    ctx: &mut CombatContext<'_>,
    actor: ActorId,
    slot: WeaponSlot,
    action: Unequip,
) -> Result<Option<String>, CombatError> {
    let a = ctx.actor_mut(actor)?;
    let Some(item) = slot.take(&mut a.equipment) else {
        return Ok(None);
    };
    let name = item.name.clone();
    if action == Unequip::ToInventory {
        a.inventory.push(item);
    }
    debug!(target: "combat::attack", actor = %actor, item = %name, ?slot, ?action, "unequipped");
    Ok(Some(name))
}

/// A worn-out item stops working and goes back to the pack.
///
/// Returns true if the item in `slot` was broken and removed.
pub fn break_object(
    ctx: &mut CombatContext<'_>,
    actor: ActorId,
    slot: WeaponSlot,
) -> Result<bool, CombatError> {
    if !equipped(ctx, actor, slot).is_some_and(|i| i.is_broken()) {
        return Ok(false);
    }
    if let Some(name) = unequip(ctx, actor, slot, Unequip::ToInventory)? {
        ctx.tell(actor, format!("Your {name} is broken."));
        let me = ctx.name(actor);
        ctx.broadcast_near(actor, &[actor], format!("{me} broke their {name}."));
    }
    Ok(true)
}

/// One time in four a swing costs the weapon a point of durability.
pub fn wear(ctx: &mut CombatContext<'_>, actor: ActorId, slot: WeaponSlot) -> Result<(), CombatError> {
    if ctx.rolls.range(0, 3) != 0 {
        return Ok(());
    }
    if let Some(item) = slot.get_mut(&mut ctx.actor_mut(actor)?.equipment) {
        item.shots_cur -= 1;
    }
    Ok(())
}

/// Result of a spell-bearing weapon discharging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponCast {
    pub damage: i32,
    /// The attacker died to the victim's reflection.
    pub attacker_died: bool,
}

/// Fires the offensive spell stored in the weapon in `slot`, if it has
/// charges and the room allows magic.
///
/// # Errors
///
/// Fails if either actor is missing.
pub fn cast_weapon(
    ctx: &mut CombatContext<'_>,
    attacker: ActorId,
    victim: ActorId,
    slot: WeaponSlot,
) -> Result<WeaponCast, CombatError> {
    let Some(weapon) = equipped(ctx, attacker, slot) else {
        return Ok(WeaponCast::default());
    };
    let Some(spell_name) = weapon.cast_spell.as_deref().filter(|_| weapon.charges > 0) else {
        return Ok(WeaponCast::default());
    };
    let no_magic = ctx
        .world
        .room_of(attacker)
        .is_some_and(|r| r.has(RoomFlags::NO_MAGIC));
    if no_magic {
        return Ok(WeaponCast::default());
    }
    let Ok(book) = ctx.env.spells() else {
        return Ok(WeaponCast::default());
    };
    let Some(spell) = book.catalog().get(spell_name) else {
        return Ok(WeaponCast::default());
    };
    let Some(offense) = spell.offense else {
        return Ok(WeaponCast::default());
    };

    let target = ctx.actor(victim)?;
    if target.is_monster() && spell.tier > 0 && target.profile.spell_immunity_tier >= spell.tier {
        ctx.tell(
            attacker,
            format!("Your {}'s {} spell fails!", weapon.name, spell.name),
        );
        if let Some(item) = slot.get_mut(&mut ctx.actor_mut(attacker)?.equipment) {
            item.shots_cur -= 1;
        }
        return Ok(WeaponCast::default());
    }

    let mut dmg = Damage::new(offense.damage.roll(&mut ctx.rolls).max(1));
    let mods = offense
        .realm
        .map_or_else(Modifiers::default, |realm| Modifiers::default().with_realm(realm));
    modify_damage(ctx, victim, Some(attacker), DamageType::Magical, &mut dmg, mods)?;

    let (me, them) = (ctx.name(attacker), ctx.name(victim));
    ctx.tell(
        attacker,
        format!(
            "Your {} casts a {} spell on {them} for {} damage.",
            weapon.name, spell.name, dmg.damage
        ),
    );
    ctx.tell(
        victim,
        format!(
            "{me}'s {} casts a {} spell on you for {} damage.",
            weapon.name, spell.name, dmg.damage
        ),
    );
    ctx.broadcast_near(
        attacker,
        &[attacker, victim],
        format!("{me}'s {} casts a {} spell on {them}.", weapon.name, spell.name),
    );

    let attacker_died = do_reflection_damage(ctx, attacker, victim, &dmg)?;
    if let Some(item) = slot.get_mut(&mut ctx.actor_mut(attacker)?.equipment) {
        item.charges -= 1;
    }
    Ok(WeaponCast {
        damage: dmg.damage,
        attacker_died,
    })
}
