//! Minimal behavior tree for tick-driven creature AI.
//!
//! A creature's brain is evaluated once per world tick. Every node finishes
//! within that tick, so there is no `Running` state: a node either did its
//! job ([`Status::Success`]) or declined ([`Status::Failure`]).
//!
//! Trees are generic over the blackboard type `C`. Nodes are boxed with a
//! lifetime `'n` so a tree can be built around a blackboard that borrows
//! world state for the duration of one tick.
//!
//! # Architecture
//!
//! - [`Behavior`]: core trait for all nodes
//! - Leaves: [`Condition`], [`Action`]
//! - Composites: [`Sequence`], [`Selector`]
//! - Decorators: [`Inverter`], [`AlwaysSucceed`]

pub mod behavior;
pub mod builder;
pub mod composite;
pub mod decorator;
pub mod leaf;
pub mod status;

pub use behavior::{Behavior, Node};
pub use composite::{Selector, Sequence};
pub use decorator::{AlwaysSucceed, Inverter};
pub use leaf::{Action, Condition};
pub use status::Status;
