//! Status returned by behavior nodes.

/// The result of evaluating a node within one tick.
///
/// - Conditions: whether the condition held
/// - Actions: whether the creature did the thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
        }
    }
}

impl From<bool> for Status {
    #[inline]
    fn from(ok: bool) -> Self {
        if ok { Status::Success } else { Status::Failure }
    }
}
