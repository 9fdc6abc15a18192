//! Core behavior trait.

use crate::Status;

/// A behavior tree node evaluated against a blackboard `C`.
pub trait Behavior<C>: Send + Sync {
    /// Evaluates the node. Nodes may read and mutate the blackboard.
    fn tick(&self, ctx: &mut C) -> Status;
}

/// A boxed node living at most `'n`.
pub type Node<'n, C> = Box<dyn Behavior<C> + 'n>;

impl<C> Behavior<C> for Box<dyn Behavior<C> + '_> {
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (**self).tick(ctx)
    }
}
