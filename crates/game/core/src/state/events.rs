//! Output produced while resolving actions.
//!
//! The engine never writes to a socket. It appends [`WorldEvent`]s to the
//! world outbox; the surrounding layer drains and renders them.

use crate::state::{ActorId, RoomId};

/// Who should see a message.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Audience {
    Actor(ActorId),
    /// Everyone in the room except the listed actors.
    Room { room: RoomId, except: Vec<ActorId> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WorldEvent {
    Message { to: Audience, text: String },
    Died { victim: ActorId, killer: Option<ActorId> },
    Moved { actor: ActorId, from: RoomId, to: RoomId },
    /// A creature wandered out of the world entirely.
    Departed { actor: ActorId },
}

impl WorldEvent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } => Some(text),
            _ => None,
        }
    }

    /// True if `actor` would see this message.
    pub fn is_seen_by(&self, actor: ActorId, room: RoomId) -> bool {
        match self {
            Self::Message {
                to: Audience::Actor(id),
                ..
            } => *id == actor,
            Self::Message {
                to: Audience::Room { room: r, except },
                ..
            } => *r == room && !except.contains(&actor),
            _ => false,
        }
    }
}
