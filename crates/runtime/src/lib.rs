//! Runtime orchestration for the combat simulation.
//!
//! This crate wires the combat engine, loaded content, and post-tick hooks
//! into a tick driver. Consumers embed [`WorldRuntime`] to advance the world,
//! submit player actions, and collect the narration each step produces.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the tick driver and its builder
//! - [`action`] describes player commands and their results
//! - [`hooks`] provides the post-tick hook system
//! - [`event_log`] persists drained events as JSON lines
pub mod action;
pub mod error;
pub mod event_log;
pub mod hooks;
pub mod runtime;

pub use action::{ActionKind, ActionOutcome, ActionResult, PlayerAction, Target};
pub use error::{HookError, Result, RuntimeError};
pub use event_log::EventLog;
pub use hooks::{DeathSweepHook, HookContext, HookCriticality, HookRegistry, PostTickHook, RepopHook};
pub use runtime::{NpcTurn, RuntimeBuilder, TickReport, WorldRuntime};
