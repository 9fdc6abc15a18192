//! Composite nodes: [`Sequence`] (AND) and [`Selector`] (OR).

use crate::{Behavior, Node, Status};

/// Runs children left to right until one fails.
///
/// Fails on the first failing child; succeeds when every child succeeds.
pub struct Sequence<'n, C> {
    children: Vec<Node<'n, C>>,
}

impl<'n, C> Sequence<'n, C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Node<'n, C>>) -> Self {
        assert!(
            !children.is_empty(),
            "Sequence must have at least one child"
        );
        Self { children }
    }
}

impl<C> Behavior<C> for Sequence<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx).is_failure() {
                return Status::Failure;
            }
        }
        Status::Success
    }
}

/// Runs children left to right until one succeeds.
///
/// Succeeds on the first succeeding child; fails when every child fails.
pub struct Selector<'n, C> {
    children: Vec<Node<'n, C>>,
}

impl<'n, C> Selector<'n, C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Node<'n, C>>) -> Self {
        assert!(
            !children.is_empty(),
            "Selector must have at least one child"
        );
        Self { children }
    }
}

impl<C> Behavior<C> for Selector<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx).is_success() {
                return Status::Success;
            }
        }
        Status::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tally {
        steps: Vec<&'static str>,
    }

    struct Step(&'static str, Status);
    impl Behavior<Tally> for Step {
        fn tick(&self, ctx: &mut Tally) -> Status {
            ctx.steps.push(self.0);
            self.1
        }
    }

    fn ok(name: &'static str) -> Node<'static, Tally> {
        Box::new(Step(name, Status::Success))
    }

    fn no(name: &'static str) -> Node<'static, Tally> {
        Box::new(Step(name, Status::Failure))
    }

    #[test]
    fn sequence_runs_everything_on_success() {
        let seq = Sequence::new(vec![ok("assist"), ok("regen")]);
        let mut t = Tally { steps: vec![] };
        assert_eq!(seq.tick(&mut t), Status::Success);
        assert_eq!(t.steps, ["assist", "regen"]);
    }

    #[test]
    fn sequence_stops_at_first_failure() {
        let seq = Sequence::new(vec![ok("assist"), no("ready"), ok("attack")]);
        let mut t = Tally { steps: vec![] };
        assert_eq!(seq.tick(&mut t), Status::Failure);
        assert_eq!(t.steps, ["assist", "ready"]);
    }

    #[test]
    fn selector_stops_at_first_success() {
        let sel = Selector::new(vec![no("flee"), ok("attack"), ok("wander")]);
        let mut t = Tally { steps: vec![] };
        assert_eq!(sel.tick(&mut t), Status::Success);
        assert_eq!(t.steps, ["flee", "attack"]);
    }

    #[test]
    fn selector_fails_when_all_fail() {
        let sel = Selector::new(vec![no("flee"), no("attack")]);
        let mut t = Tally { steps: vec![] };
        assert_eq!(sel.tick(&mut t), Status::Failure);
        assert_eq!(t.steps.len(), 2);
    }

    struct Borrowing<'w> {
        hp: &'w mut i32,
    }

    fn heal(b: &mut Borrowing<'_>) -> Status {
        *b.hp += 1;
        Status::Success
    }

    #[test]
    fn blackboard_may_borrow_for_one_tick() {
        let mut hp = 3;
        {
            let mut board = Borrowing { hp: &mut hp };
            let tree: Sequence<'_, Borrowing<'_>> = Sequence::new(vec![
                Box::new(crate::Action::new(heal)),
                Box::new(crate::Action::new(heal)),
            ]);
            assert!(tree.tick(&mut board).is_success());
        }
        assert_eq!(hp, 5);
    }
}
