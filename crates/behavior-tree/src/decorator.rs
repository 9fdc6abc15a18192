//! Decorators: [`Inverter`] (NOT) and [`AlwaysSucceed`] (optional step).

use crate::{Behavior, Node, Status};

/// Flips its child's status.
pub struct Inverter<'n, C> {
    child: Node<'n, C>,
}

impl<'n, C> Inverter<'n, C> {
    pub fn new(child: Node<'n, C>) -> Self {
        Self { child }
    }
}

impl<C> Behavior<C> for Inverter<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        self.child.tick(ctx).invert()
    }
}

/// Runs its child and succeeds regardless.
///
/// Used for housekeeping steps that must not cut a sequence short.
pub struct AlwaysSucceed<'n, C> {
    child: Node<'n, C>,
}

impl<'n, C> AlwaysSucceed<'n, C> {
    pub fn new(child: Node<'n, C>) -> Self {
        Self { child }
    }
}

impl<C> Behavior<C> for AlwaysSucceed<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        let _ = self.child.tick(ctx);
        Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Condition};

    struct Mob {
        hp: i32,
        ticks: u32,
    }

    #[test]
    fn inverter_flips_both_ways() {
        let healthy = Inverter::new(Box::new(Condition::new(|m: &Mob| m.hp < 5)));
        let mut mob = Mob { hp: 10, ticks: 0 };
        assert_eq!(healthy.tick(&mut mob), Status::Success);
        mob.hp = 1;
        assert_eq!(healthy.tick(&mut mob), Status::Failure);
    }

    #[test]
    fn always_succeed_still_runs_the_child() {
        let step = AlwaysSucceed::new(Box::new(Action::new(|m: &mut Mob| {
            m.ticks += 1;
            Status::Failure
        })));
        let mut mob = Mob { hp: 10, ticks: 0 };
        assert_eq!(step.tick(&mut mob), Status::Success);
        assert_eq!(mob.ticks, 1);
    }
}
