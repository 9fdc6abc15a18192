//! Shorthand constructors returning boxed [`Node`]s.
//!
//! ```
//! use behavior_tree::builder::{action, condition, selector, sequence};
//! use behavior_tree::{Behavior, Status};
//!
//! struct Mob { hp: i32, fled: bool }
//!
//! let brain = selector(vec![
//!     sequence(vec![
//!         condition(|m: &Mob| m.hp < 3),
//!         action(|m: &mut Mob| { m.fled = true; Status::Success }),
//!     ]),
//!     action(|_: &mut Mob| Status::Failure),
//! ]);
//! let mut mob = Mob { hp: 1, fled: false };
//! assert!(brain.tick(&mut mob).is_success());
//! assert!(mob.fled);
//! ```

use crate::{Action, AlwaysSucceed, Condition, Inverter, Node, Selector, Sequence, Status};

#[inline]
pub fn sequence<'n, C: 'n>(children: Vec<Node<'n, C>>) -> Node<'n, C> {
    Box::new(Sequence::new(children))
}

#[inline]
pub fn selector<'n, C: 'n>(children: Vec<Node<'n, C>>) -> Node<'n, C> {
    Box::new(Selector::new(children))
}

#[inline]
pub fn inverter<'n, C: 'n>(child: Node<'n, C>) -> Node<'n, C> {
    Box::new(Inverter::new(child))
}

#[inline]
pub fn always_succeed<'n, C: 'n>(child: Node<'n, C>) -> Node<'n, C> {
    Box::new(AlwaysSucceed::new(child))
}

#[inline]
pub fn condition<'n, C: 'n, F>(check: F) -> Node<'n, C>
where
    F: Fn(&C) -> bool + Send + Sync + 'n,
{
    Box::new(Condition::new(check))
}

#[inline]
pub fn action<'n, C: 'n, F>(run: F) -> Node<'n, C>
where
    F: Fn(&mut C) -> Status + Send + Sync + 'n,
{
    Box::new(Action::new(run))
}
