use crate::state::{ExitFlags, Item, RoomFlags, RoomId};

/// A one-way link out of a room.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exit {
    pub name: String,
    pub to: RoomId,
    pub flags: ExitFlags,
}

impl Exit {
    pub fn new(name: &str, to: RoomId) -> Self {
        Self {
            name: name.to_owned(),
            to,
            flags: ExitFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ExitFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Usable by a fleeing creature.
    pub fn can_flee_through(&self) -> bool {
        !self
            .flags
            .intersects(ExitFlags::NO_FLEE | ExitFlags::SECRET | ExitFlags::CONCEALED)
    }

    /// Usable by a wandering creature: visible, not barred to monsters,
    /// and not locked shut.
    pub fn can_wander_through(&self) -> bool {
        !self.flags.intersects(
            ExitFlags::NO_MOBILE | ExitFlags::SECRET | ExitFlags::CONCEALED | ExitFlags::LOCKED,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub flags: RoomFlags,
    pub exits: Vec<Exit>,
    /// Loose objects, in drop order.
    pub objects: Vec<Item>,
    /// Monster cap; zero means no cap.
    pub max_mobs: u32,
    /// Percent chance per idle check that a creature here wanders off.
    pub traffic: i32,
}

impl Room {
    pub fn new(id: RoomId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: RoomFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_exit(mut self, exit: Exit) -> Self {
        self.exits.push(exit);
        self
    }

    #[inline]
    pub fn has(&self, flag: RoomFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_pk_safe(&self) -> bool {
        self.has(RoomFlags::PK_SAFE)
    }

    pub fn is_outlaw_safe(&self) -> bool {
        self.has(RoomFlags::OUTLAW_SAFE)
    }
}
