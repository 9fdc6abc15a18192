//! Autonomous creature behavior.
//!
//! - [`aggro`]: who a creature attacks on sight
//! - [`assist`]: allies joining fights and monster feuds
//! - [`roam`]: wandering, leaving and fleeing
//! - [`scavenge`]: picking up and looting
//! - [`regen`]: recovery between fights
//! - [`controller`]: the per-tick brain tying them together
//!
//! Creatures share nothing but the world; each tick is evaluated for one
//! creature at a time through a [`CombatContext`](crate::context::CombatContext).

pub mod aggro;
pub mod assist;
pub mod controller;
pub mod regen;
pub mod roam;
pub mod scavenge;

pub use aggro::{HOSTILE_REGARD, aggro_candidates, who_to_aggro, will_aggro};
pub use assist::{check_assist, check_enemy_mobs};
pub use controller::{CAST_CHANCE, Npc, NpcReport, npc_tick};
pub use regen::{Recovery, regenerate};
pub use roam::{Roam, check_flee, check_wander, depart, mobile_step};
pub use scavenge::{Haul, VALUABLE, can_scavenge, check_loot, check_scavenge};
