//! Combat resolution.
//!
//! - [`outcome`]: one roll decides how a swing lands
//! - [`compute`]: raw damage for a landed blow
//! - [`pipeline`]: the ordered defensive stages every damage amount passes
//! - [`apply`]: hit points, reflection and death
//! - [`attack`]: the per-action swing loop for players and monsters
//!
//! Every function takes a [`CombatContext`](crate::context::CombatContext);
//! randomness comes from its roller, never from a global source.

pub mod apply;
pub mod attack;
pub mod compute;
pub mod damage;
pub mod outcome;
pub mod pipeline;
pub mod saves;
pub mod weapon;

pub use apply::{check_die, do_damage, do_reflection_damage, simultaneous_death, stun};
pub use attack::{
    AttackReport, AttackStatus, AttackType, Parry, attack_creature, attack_interval,
    can_hit, can_riposte, current_target, monster_attack, parry, wake_room, weapon_delay,
};
pub use compute::{
    Blow, Computed, MAX_ATTACK_POWER, attack_power, base_damage, compute_block,
    compute_damage, strike_of,
};
pub use damage::{Damage, DamageType};
pub use outcome::{
    AttackOutcome, OutcomeChances, OutcomeFlags, defense_skill, get_attack_result,
    outcome_chances, weapon_skill,
};
pub use pipeline::{Modifiers, OffGuard, Strike, modify_damage};
pub use saves::{chk_save, save_chance};
pub use weapon::{WeaponCast, WeaponSlot, cast_weapon};
