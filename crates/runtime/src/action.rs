//! Player action descriptors and what came of them.

use combat_core::magic::CastResult;
use combat_core::state::{ActorId, WorldEvent};
use combat_core::{AttackReport, AttackType, Denial};

/// Who an action is aimed at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Id(ActorId),
    /// A typed reference such as `"2.rat"`, resolved from the actor's room.
    Named(String),
    /// The actor's current foe.
    Current,
}

impl From<ActorId> for Target {
    fn from(id: ActorId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        Self::Named(text.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Attack { target: Target, style: AttackType },
    /// `target` text is handed to the spell resolver as typed; empty means
    /// self for helpful spells and the current foe for harmful ones.
    Cast { spell: String, target: String },
}

/// One command from a player (or a script standing in for one).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerAction {
    pub actor: ActorId,
    pub kind: ActionKind,
}

impl PlayerAction {
    pub fn attack(actor: ActorId, target: impl Into<Target>) -> Self {
        Self::styled(actor, target, AttackType::Normal)
    }

    pub fn styled(actor: ActorId, target: impl Into<Target>, style: AttackType) -> Self {
        Self {
            actor,
            kind: ActionKind::Attack {
                target: target.into(),
                style,
            },
        }
    }

    pub fn cast(actor: ActorId, spell: &str, target: &str) -> Self {
        Self {
            actor,
            kind: ActionKind::Cast {
                spell: spell.to_owned(),
                target: target.to_owned(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActionResult {
    Attack(AttackReport),
    /// The engagement gate refused; the reason was already told to the actor.
    Denied(Denial),
    /// The reference did not name anyone attackable.
    NoTarget,
    Cast(CastResult),
}

/// Result plus everything narrated while resolving it.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionOutcome {
    pub result: ActionResult,
    pub events: Vec<WorldEvent>,
}
