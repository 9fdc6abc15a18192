//! Authoritative combat state.
//!
//! This module owns the data structures that describe actors, their effects
//! and cooldowns, items, rooms, and the world arena that ties them together.
//! Combat, magic and NPC code mutate it through `&mut World`; outside layers
//! treat it as a snapshot between ticks.
mod actor;
mod cooldown;
mod effects;
mod events;
mod flags;
mod identity;
mod ids;
mod item;
mod room;
mod stats;
mod threat;
mod world;

pub use actor::{Actor, MonsterProfile, SaveCategory, SaveChances, Skill};
pub use cooldown::{Cooldown, CooldownKind, Cooldowns};
pub use effects::{
    Affinity, Applied, Effect, EffectKind, EffectSet, Realm, StackRule, UnknownEffect,
};
pub use events::{Audience, WorldEvent};
pub use flags::{ExitFlags, ItemFlags, MonsterFlags, PlayerFlags, RoomFlags};
pub use identity::{
    ActorKind, Class, CreatureType, Deity, NEUTRAL_ALIGNMENT, Posture, Race, is_holy_war,
};
pub use ids::{ActorId, RoomId, TemplateId, Tick};
pub use item::{Dice, Equipment, Item, ItemKind, WeaponCategory, WearSlot};
pub use room::{Exit, Room};
pub use stats::{Pool, Stat, Stats, bonus};
pub use threat::{ThreatEntry, ThreatList};
pub use world::{ActorArena, World};
