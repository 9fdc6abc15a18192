//! Leaf nodes wrapping plain functions.
//!
//! Most creature behaviors are a single function over the blackboard, so
//! these adapters save writing a unit struct and a trait impl per step.

use crate::{Behavior, Status};

/// Read-only check; succeeds when the predicate holds.
pub struct Condition<F> {
    check: F,
}

impl<F> Condition<F> {
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<C, F> Behavior<C> for Condition<F>
where
    F: Fn(&C) -> bool + Send + Sync,
{
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (self.check)(ctx).into()
    }
}

/// Step that may change the blackboard and reports its own status.
pub struct Action<F> {
    run: F,
}

impl<F> Action<F> {
    pub fn new(run: F) -> Self {
        Self { run }
    }
}

impl<C, F> Behavior<C> for Action<F>
where
    F: Fn(&mut C) -> Status + Send + Sync,
{
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (self.run)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Creature {
        hp: i32,
        fled: bool,
    }

    #[test]
    fn condition_reads_without_mutating() {
        let wounded = Condition::new(|c: &Creature| c.hp < 10);
        let mut rat = Creature { hp: 4, fled: false };
        assert_eq!(wounded.tick(&mut rat), Status::Success);
        rat.hp = 20;
        assert_eq!(wounded.tick(&mut rat), Status::Failure);
    }

    #[test]
    fn action_mutates_and_reports() {
        let flee = Action::new(|c: &mut Creature| {
            c.fled = true;
            Status::Success
        });
        let mut rat = Creature { hp: 4, fled: false };
        assert!(flee.tick(&mut rat).is_success());
        assert!(rat.fled);
    }
}
