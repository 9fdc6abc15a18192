//! Saving throws.
//!
//! A save is a percentage roll: the actor's base chance in the category,
//! shifted by stats, gear and the opponent, clamped to `1..=95`.

use tracing::trace;

use crate::context::CombatContext;
use crate::state::{
    Actor, ActorId, Class, Deity, EffectKind, ItemFlags, SaveCategory, Stat, Tick, bonus,
};

fn wisdom(actor: &Actor) -> i32 {
    (actor.stats.bonus(Stat::Intelligence) + actor.stats.bonus(Stat::Piety)) / 2
}

/// Chance in percent that `actor` saves against `opponent`.
pub fn save_chance(
    actor: &Actor,
    category: SaveCategory,
    opponent: Option<&Actor>,
    extra: i32,
    now: Tick,
) -> i32 {
    let opposing = opponent.filter(|o| o.id != actor.id);
    let mut chance = actor.saves.get(category);

    if let Some(held) = actor
        .equipment
        .held
        .as_ref()
        .filter(|i| i.flags.contains(ItemFlags::LUCKY) && i.adjustment > 0)
    {
        chance += held.adjustment * 5;
    }

    match category {
        SaveCategory::Poison => {
            chance += actor.stats.bonus(Stat::Constitution);
            if actor.hp.cur() <= actor.hp.max() / 3 {
                chance /= 2;
            }
            if actor.is_player() && actor.effects.has(EffectKind::Berserk, now) {
                chance += 15;
            }
        }
        SaveCategory::Death => {}
        SaveCategory::Breath => {
            chance += actor.stats.bonus(Stat::Dexterity) * 2;
            if let Some(body) = &actor.equipment.body {
                chance += body.adjustment * 5;
            }
        }
        SaveCategory::Mental => match opposing {
            Some(o) => chance -= 5 * (wisdom(o) - wisdom(actor)),
            None => chance += wisdom(actor),
        },
        SaveCategory::Spell => {
            if let Some(o) = opposing {
                chance -= 2
                    * (bonus(o.stats.intelligence) - bonus(actor.stats.intelligence));
            }
            if actor.is_player() && actor.effects.has(EffectKind::ResistMagic, now) {
                chance += 25;
            }
        }
        SaveCategory::Luck => {}
    }

    chance += extra;
    if actor.class == Class::Cleric && actor.deity == Some(Deity::Kamira) {
        chance += 5;
    }
    chance.clamp(1, 95)
}

/// Rolls a save. True means the actor resisted.
pub fn chk_save(
    ctx: &mut CombatContext<'_>,
    actor: ActorId,
    category: SaveCategory,
    opponent: Option<ActorId>,
    extra: i32,
) -> bool {
    let Some(me) = ctx.world.actors.get(actor) else {
        return false;
    };
    let them = opponent.and_then(|o| ctx.world.actors.get(o));
    let chance = save_chance(me, category, them, extra, ctx.now);
    let roll = ctx.rolls.d100();
    trace!(target: "combat::saves", actor = %actor, ?category, chance, roll, "save roll");
    roll <= chance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorKind, Effect, SaveChances};

    #[test]
    fn smarter_caster_lowers_spell_save() {
        let mut target = Actor::new(ActorId(1), "Ann", ActorKind::Player);
        target.saves = SaveChances::uniform(40);
        let mut caster = Actor::new(ActorId(2), "lich", ActorKind::Monster);
        caster.stats.intelligence = 250;

        let alone = save_chance(&target, SaveCategory::Spell, None, 0, 0);
        let opposed = save_chance(&target, SaveCategory::Spell, Some(&caster), 0, 0);
        assert_eq!(alone, 40);
        assert_eq!(opposed, 40 - 2 * (bonus(250) - bonus(100)));

        target
            .effects
            .apply(Effect::permanent(EffectKind::ResistMagic, 1), 0);
        assert_eq!(save_chance(&target, SaveCategory::Spell, None, 0, 0), 65);
    }

    #[test]
    fn saves_clamp_to_range() {
        let mut a = Actor::new(ActorId(1), "Ann", ActorKind::Player);
        a.saves = SaveChances::uniform(200);
        assert_eq!(save_chance(&a, SaveCategory::Death, None, 0, 0), 95);
        assert_eq!(save_chance(&a, SaveCategory::Death, None, -500, 0), 1);
    }
}
