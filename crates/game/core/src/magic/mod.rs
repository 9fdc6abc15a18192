//! Spellcasting: definitions, the book of handlers, and the cast resolver.

mod book;
mod cast;
mod spell;

pub use book::{Bolt, Heal, SpellBook, SpellCast, SpellHandler, Teleport, Ward};
pub use cast::{
    CREATURE_RECAST_DELAY, CastError, CastRequest, CastResult, CastingType, cast,
    class_recast_delay, spell_success_base,
};
pub use spell::{Domain, LookupError, Offense, School, SpellCatalog, SpellDef};
