//! Resolving a typed target reference to an actor in the searcher's room.
//!
//! References are a name fragment with an optional ordinal (`"2.rat"` or an
//! explicit ordinal). Matching is per-word prefix and case-insensitive.

use crate::config::CombatConfig;
use crate::state::{Actor, ActorId, Tick, World};

/// Why a reference did not resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("attack whom?")]
    EmptyInput,
    #[error("which one do you mean?")]
    Ambiguous,
    #[error("you don't see that here")]
    NotFound,
    #[error("you can't target yourself")]
    SelfDisallowed,
}

/// A target reference as typed by a player or chosen by a script.
#[derive(Clone, Copy, Debug, Default)]
pub struct TargetQuery<'q> {
    pub text: &'q str,
    /// 1-based; overrides an ordinal prefix in `text`.
    pub ordinal: Option<usize>,
    /// Hostile search: short fragments never name players or pets.
    pub aggressive: bool,
    pub allow_self: bool,
}

impl<'q> TargetQuery<'q> {
    pub fn new(text: &'q str) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    /// A hostile lookup, as used by attack commands.
    pub fn hostile(text: &'q str) -> Self {
        Self {
            text,
            aggressive: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn nth(mut self, ordinal: usize) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    #[must_use]
    pub fn allowing_self(mut self) -> Self {
        self.allow_self = true;
        self
    }
}

/// Splits `"3.goblin"` into `(Some(3), "goblin")`.
fn split_ordinal(text: &str) -> (Option<usize>, &str) {
    match text.split_once('.') {
        Some((n, rest)) if !rest.is_empty() => match n.parse::<usize>() {
            Ok(n) if n > 0 => (Some(n), rest),
            _ => (None, text),
        },
        _ => (None, text),
    }
}

fn name_matches(actor: &Actor, fragment: &str) -> bool {
    let fragment = fragment.to_ascii_lowercase();
    let name = actor.name.to_ascii_lowercase();
    name == fragment || name.split_whitespace().any(|w| w.starts_with(&fragment))
}

/// Resolves `query` from `searcher`'s point of view.
///
/// An empty reference falls back to the searcher's top threat target when
/// that target is still present and visible. Several matches without an
/// ordinal are ambiguous unless they all carry the same name, in which case
/// the first in room order is taken.
pub fn find_victim(
    world: &World,
    searcher: ActorId,
    query: &TargetQuery<'_>,
    now: Tick,
) -> Result<ActorId, TargetError> {
    let me = world.actors.get(searcher).ok_or(TargetError::NotFound)?;
    let text = query.text.trim();

    if text.is_empty() {
        return me
            .enemies
            .targets()
            .filter_map(|id| world.actors.get(id))
            .find(|t| t.room == me.room && me.can_see(t, now) && !t.is_dying())
            .map(|t| t.id)
            .ok_or(TargetError::EmptyInput);
    }

    let (prefix_ordinal, fragment) = split_ordinal(text);
    let ordinal = query.ordinal.or(prefix_ordinal);
    let short = fragment.chars().count() < CombatConfig::MIN_AGGRESSIVE_MATCH;

    let mut saw_self = false;
    let matches: Vec<&Actor> = world
        .actors
        .iter()
        .filter(|a| a.room == me.room && me.can_see(a, now) && name_matches(a, fragment))
        .filter(|a| {
            if a.id == searcher && !query.allow_self {
                saw_self = true;
                return false;
            }
            true
        })
        .filter(|a| !(query.aggressive && short && (a.is_player() || a.is_pet())))
        .collect();

    if matches.is_empty() {
        return Err(if saw_self {
            TargetError::SelfDisallowed
        } else {
            TargetError::NotFound
        });
    }

    if let Some(n) = ordinal {
        return n
            .checked_sub(1)
            .and_then(|i| matches.get(i))
            .map(|a| a.id)
            .ok_or(TargetError::NotFound);
    }

    let first = matches[0];
    if matches.len() == 1 || matches.iter().all(|a| a.name.eq_ignore_ascii_case(&first.name)) {
        return Ok(first.id);
    }
    // An exact full-name match beats partial matches.
    let mut exact = matches
        .iter()
        .filter(|a| a.name.eq_ignore_ascii_case(fragment));
    match (exact.next(), exact.next()) {
        (Some(a), None) => Ok(a.id),
        _ => Err(TargetError::Ambiguous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorKind, RoomId};

    fn room_of(names: &[(&str, ActorKind)]) -> (World, Vec<ActorId>) {
        let mut world = World::new(7);
        let ids = names
            .iter()
            .map(|(name, kind)| world.spawn(|id| Actor::new(id, name, *kind)))
            .collect();
        (world, ids)
    }

    #[test]
    fn empty_input_falls_back_to_engaged_target() {
        let (mut world, ids) = room_of(&[("Ann", ActorKind::Player), ("rat", ActorKind::Monster)]);
        assert_eq!(
            find_victim(&world, ids[0], &TargetQuery::new(""), 0),
            Err(TargetError::EmptyInput)
        );
        world.actors.get_mut(ids[0]).map(|a| a.enemies.add_enemy(ids[1]));
        assert_eq!(find_victim(&world, ids[0], &TargetQuery::new("  "), 0), Ok(ids[1]));
    }

    #[test]
    fn short_hostile_fragment_skips_players() {
        let (world, ids) = room_of(&[
            ("Ann", ActorKind::Player),
            ("Bo", ActorKind::Player),
            ("boar", ActorKind::Monster),
        ]);
        let found = find_victim(&world, ids[0], &TargetQuery::hostile("bo"), 0);
        assert_eq!(found, Ok(ids[2]));
        // A friendly search prefers the exact name.
        let friendly = find_victim(&world, ids[0], &TargetQuery::new("bo"), 0);
        assert_eq!(friendly, Ok(ids[1]));
        let vague = find_victim(&world, ids[0], &TargetQuery::new("b"), 0);
        assert_eq!(vague, Err(TargetError::Ambiguous));
    }

    #[test]
    fn ordinals_and_identical_names() {
        let (world, ids) = room_of(&[
            ("Ann", ActorKind::Player),
            ("rat", ActorKind::Monster),
            ("rat", ActorKind::Monster),
        ]);
        assert_eq!(find_victim(&world, ids[0], &TargetQuery::new("rat"), 0), Ok(ids[1]));
        assert_eq!(find_victim(&world, ids[0], &TargetQuery::new("2.rat"), 0), Ok(ids[2]));
        assert_eq!(
            find_victim(&world, ids[0], &TargetQuery::new("rat").nth(3), 0),
            Err(TargetError::NotFound)
        );
    }

    #[test]
    fn zeroth_match_is_not_found() {
        let (world, ids) = room_of(&[("Ann", ActorKind::Player), ("rat", ActorKind::Monster)]);
        assert_eq!(
            find_victim(&world, ids[0], &TargetQuery::new("rat").nth(0), 0),
            Err(TargetError::NotFound)
        );
        assert_eq!(find_victim(&world, ids[0], &TargetQuery::new("rat").nth(1), 0), Ok(ids[1]));
    }

    #[test]
    fn self_is_reported_distinctly() {
        let (mut world, ids) = room_of(&[("Ann", ActorKind::Player)]);
        assert_eq!(
            find_victim(&world, ids[0], &TargetQuery::new("ann"), 0),
            Err(TargetError::SelfDisallowed)
        );
        assert_eq!(
            find_victim(&world, ids[0], &TargetQuery::new("ann").allowing_self(), 0),
            Ok(ids[0])
        );
        world.move_actor(ids[0], RoomId(2));
        assert_eq!(
            find_victim(&world, ids[0], &TargetQuery::new("zed"), 0),
            Err(TargetError::NotFound)
        );
    }
}
