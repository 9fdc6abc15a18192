//! Actor arena, rooms and the narrative outbox.

use std::collections::BTreeMap;

use crate::error::CombatError;
use crate::state::{Actor, ActorId, Audience, Room, RoomId, Tick, WorldEvent};

/// Slot storage addressed by [`ActorId`]. Ids are never reused.
#[derive(Clone, Debug, Default)]
pub struct ActorArena {
    slots: Vec<Option<Actor>>,
}

impl ActorArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an actor built for the freshly allocated id.
    pub fn insert_with(&mut self, build: impl FnOnce(ActorId) -> Actor) -> ActorId {
        let id = ActorId(self.slots.len() as u32 + 1);
        let mut actor = build(id);
        actor.id = id;
        self.slots.push(Some(actor));
        id
    }

    #[inline]
    fn index(id: ActorId) -> Option<usize> {
        (id.0 as usize).checked_sub(1)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        Self::index(id)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        Self::index(id)
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        Self::index(id)
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::take)
    }

    /// Two distinct actors borrowed mutably at once.
    pub fn pair_mut(&mut self, a: ActorId, b: ActorId) -> Option<(&mut Actor, &mut Actor)> {
        let (ia, ib) = (Self::index(a)?, Self::index(b)?);
        if ia == ib || ia >= self.slots.len() || ib >= self.slots.len() {
            return None;
        }
        if ia < ib {
            let (left, right) = self.slots.split_at_mut(ib);
            Some((left[ia].as_mut()?, right[0].as_mut()?))
        } else {
            let (left, right) = self.slots.split_at_mut(ia);
            let (second, first) = (left[ib].as_mut()?, right[0].as_mut()?);
            Some((first, second))
        }
    }

    /// Live actors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> + '_ {
        self.slots.iter_mut().flatten()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.iter().map(|a| a.id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the engine reads and mutates during one tick.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub seed: u64,
    pub actors: ActorArena,
    pub rooms: BTreeMap<RoomId, Room>,
    /// Where players wake up after dying.
    pub respawn_room: RoomId,
    pub outbox: Vec<WorldEvent>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    pub fn spawn(&mut self, build: impl FnOnce(ActorId) -> Actor) -> ActorId {
        self.actors.insert_with(build)
    }

    pub fn actor(&self, id: ActorId, now: Tick) -> Result<&Actor, CombatError> {
        self.actors
            .get(id)
            .ok_or_else(|| CombatError::actor_not_found(id, now))
    }

    pub fn actor_mut(&mut self, id: ActorId, now: Tick) -> Result<&mut Actor, CombatError> {
        self.actors
            .get_mut(id)
            .ok_or_else(|| CombatError::actor_not_found(id, now))
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// Room of an actor, if both exist.
    pub fn room_of(&self, id: ActorId) -> Option<&Room> {
        self.actors.get(id).and_then(|a| self.rooms.get(&a.room))
    }

    pub fn occupants(&self, room: RoomId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.room == room)
            .map(|a| a.id)
            .collect()
    }

    pub fn players_in(&self, room: RoomId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.room == room && a.is_player())
            .map(|a| a.id)
            .collect()
    }

    pub fn monsters_in(&self, room: RoomId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.room == room && a.is_monster())
            .map(|a| a.id)
            .collect()
    }

    /// Monsters in the room that are not pets, counted against `max_mobs`.
    pub fn wild_monster_count(&self, room: RoomId) -> usize {
        self.actors
            .iter()
            .filter(|a| a.room == room && a.is_monster() && !a.is_pet())
            .count()
    }

    /// An enemy of `id` stands in the same room.
    pub fn enemy_near(&self, id: ActorId) -> bool {
        let Some(actor) = self.actors.get(id) else {
            return false;
        };
        actor
            .enemies
            .targets()
            .filter_map(|t| self.actors.get(t))
            .any(|t| t.room == actor.room)
    }

    /// Someone in the room is fighting `id`, or `id` is fighting someone here.
    pub fn in_combat(&self, id: ActorId) -> bool {
        let Some(actor) = self.actors.get(id) else {
            return false;
        };
        self.enemy_near(id)
            || self
                .actors
                .iter()
                .any(|other| other.room == actor.room && other.is_enemy(id))
    }

    /// Moves an actor and records the move.
    pub fn move_actor(&mut self, id: ActorId, to: RoomId) {
        if let Some(actor) = self.actors.get_mut(id) {
            let from = actor.room;
            actor.room = to;
            self.outbox.push(WorldEvent::Moved { actor: id, from, to });
        }
    }

    /// Drops every reference other actors hold to `id`.
    pub fn forget(&mut self, id: ActorId) {
        for other in self.actors.iter_mut() {
            other.enemies.remove(id);
            other.pets.retain(|p| *p != id);
            other.charmed.retain(|c| *c != id);
            if other.master == Some(id) {
                other.master = None;
            }
            if other.duel_with == Some(id) {
                other.duel_with = None;
            }
        }
    }

    // ===== narration =====

    pub fn tell(&mut self, to: ActorId, text: impl Into<String>) {
        self.outbox.push(WorldEvent::Message {
            to: Audience::Actor(to),
            text: text.into(),
        });
    }

    pub fn broadcast(&mut self, room: RoomId, except: &[ActorId], text: impl Into<String>) {
        self.outbox.push(WorldEvent::Message {
            to: Audience::Room {
                room,
                except: except.to_vec(),
            },
            text: text.into(),
        });
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn name_of(&self, id: ActorId) -> String {
        self.actors
            .get(id)
            .map_or_else(|| id.to_string(), |a| a.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ActorKind;

    fn world_with_two() -> (World, ActorId, ActorId) {
        let mut world = World::new(1);
        let a = world.spawn(|id| Actor::new(id, "Ann", ActorKind::Player));
        let b = world.spawn(|id| Actor::new(id, "rat", ActorKind::Monster));
        (world, a, b)
    }

    #[test]
    fn pair_mut_returns_in_argument_order() {
        let (mut world, a, b) = world_with_two();
        let (x, y) = world.actors.pair_mut(b, a).expect("distinct live actors");
        assert_eq!(x.id, b);
        assert_eq!(y.id, a);
        assert!(world.actors.pair_mut(a, a).is_none());
    }

    #[test]
    fn removed_ids_stay_dead() {
        let (mut world, a, _) = world_with_two();
        world.actors.remove(a);
        let c = world.spawn(|id| Actor::new(id, "Cy", ActorKind::Player));
        assert_ne!(a, c);
        assert!(world.actors.get(a).is_none());
    }

    #[test]
    fn enemy_near_requires_same_room() {
        let (mut world, a, b) = world_with_two();
        world.actors.get_mut(b).map(|rat| rat.enemies.add_enemy(a));
        assert!(world.enemy_near(b));
        assert!(world.in_combat(a));
        world.move_actor(a, RoomId(9));
        assert!(!world.enemy_near(b));
    }
}
