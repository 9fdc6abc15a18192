//! Deterministic combat rules for a multi-user dungeon.
//!
//! `combat-core` owns the actor arena and everything that resolves a fight:
//! targeting, the engagement gate, the damage modifier pipeline, the swing
//! loop, special attacks, spellcasting and the per-tick NPC brain. It does no
//! I/O and reads no clock; callers hand in the tick and an
//! [`env::RngOracle`], so a replay with the same seed reproduces every roll.
//!
//! All mutation flows through a [`CombatContext`] built per action or per
//! NPC tick. Narrative output is queued on the [`World`] outbox for the
//! surrounding layer to deliver.
pub mod combat;
pub mod config;
pub mod context;
pub mod engagement;
pub mod env;
pub mod error;
pub mod magic;
pub mod npc;
pub mod specials;
pub mod state;
pub mod targeting;

pub use combat::{AttackOutcome, AttackReport, AttackStatus, AttackType, attack_creature, monster_attack};
pub use config::CombatConfig;
pub use context::CombatContext;
pub use engagement::{Denial, Denied, can_attack, check_engagement};
pub use env::{ActorTemplate, Env, FixedRng, PcgRng, RngOracle, Roller, TemplateOracle};
pub use error::{CombatError, ErrorContext, ErrorSeverity, GameError};
pub use magic::{CastRequest, CastResult, SpellBook, SpellCatalog, SpellDef, cast};
pub use npc::{NpcReport, npc_tick};
pub use specials::{SpecialAttack, SpecialOutcome, SpecialRegistry, run_special_attacks};
pub use state::{
    Actor, ActorId, ActorKind, CooldownKind, Effect, EffectKind, Item, Room, RoomId, Tick,
    World, WorldEvent,
};
pub use targeting::{TargetError, TargetQuery, find_victim};
