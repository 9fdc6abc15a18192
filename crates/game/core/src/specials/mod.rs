//! Monster special attacks.
//!
//! - [`attack`]: the data a special is built from
//! - [`engine`]: gating, targeting and resolution
//! - [`registry`]: handlers for the typed effects (petrify, steal, drain, confuse)

pub mod attack;
pub mod engine;
pub mod registry;

pub use attack::{
    SaveBonus, SaveType, SpecialAttack, SpecialFlags, SpecialText, SpecialType, TargetShape,
    render,
};
pub use engine::{
    SpecialOutcome, SpecialReport, run_special_attacks, special_ready, use_special,
    use_special_named,
};
pub use registry::{
    Confuse, ExpDrain, Handled, Petrify, SpecialHandler, SpecialHit, SpecialRegistry, Steal,
};
