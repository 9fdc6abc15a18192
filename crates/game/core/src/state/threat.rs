//! Enemy list with accumulated threat.
//!
//! Entries are weak: they hold an [`ActorId`] that may no longer resolve.
//! Readers skip dangling entries; death and flee processing prune them.

use crate::state::ActorId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatEntry {
    pub target: ActorId,
    pub threat: i64,
}

/// Ordered by first contact. The first entry is the current target unless
/// another entry has strictly more threat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatList {
    entries: Vec<ThreatEntry>,
}

impl ThreatList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `target` with zero threat. Returns false if already present.
    pub fn add_enemy(&mut self, target: ActorId) -> bool {
        if self.contains(target) {
            return false;
        }
        self.entries.push(ThreatEntry { target, threat: 0 });
        true
    }

    /// Adds `amount` to the target's threat, creating the entry if needed.
    pub fn adjust_threat(&mut self, target: ActorId, amount: i64) {
        match self.entries.iter_mut().find(|e| e.target == target) {
            Some(entry) => entry.threat = entry.threat.saturating_add(amount),
            None => self.entries.push(ThreatEntry {
                target,
                threat: amount,
            }),
        }
    }

    pub fn remove(&mut self, target: ActorId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.target != target);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, target: ActorId) -> bool {
        self.entries.iter().any(|e| e.target == target)
    }

    pub fn threat_of(&self, target: ActorId) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.target == target)
            .map(|e| e.threat)
    }

    /// Highest-threat entry; ties go to the earliest contact.
    pub fn top_target(&self) -> Option<ActorId> {
        self.entries
            .iter()
            .fold(None::<&ThreatEntry>, |best, e| match best {
                Some(b) if b.threat >= e.threat => Some(b),
                _ => Some(e),
            })
            .map(|e| e.target)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreatEntry> + '_ {
        self.entries.iter()
    }

    pub fn targets(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.entries.iter().map(|e| e.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut list = ThreatList::new();
        assert!(list.add_enemy(ActorId(1)));
        assert!(!list.add_enemy(ActorId(1)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn top_target_prefers_threat_then_contact_order() {
        let mut list = ThreatList::new();
        list.add_enemy(ActorId(1));
        list.add_enemy(ActorId(2));
        assert_eq!(list.top_target(), Some(ActorId(1)));
        list.adjust_threat(ActorId(2), 15);
        assert_eq!(list.top_target(), Some(ActorId(2)));
        list.adjust_threat(ActorId(1), 15);
        assert_eq!(list.top_target(), Some(ActorId(1)));
        list.remove(ActorId(1));
        assert_eq!(list.top_target(), Some(ActorId(2)));
    }
}
