//! Creature templates and the oracle that serves them.
//!
//! A template is the static, data-loaded description of a monster: stats,
//! flags, natural weapon, aggro lists and special attacks. Spawning copies
//! it into a fresh [`Actor`]; the template itself is never mutated.

use std::collections::{BTreeMap, BTreeSet};

use crate::specials::SpecialAttack;
use crate::state::{
    Actor, ActorId, ActorKind, Class, CreatureType, Dice, Equipment, Item, MonsterFlags,
    MonsterProfile, Pool, Race, RoomId, SaveChances, Skill, Stats, TemplateId,
};

/// Static description of a creature.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActorTemplate {
    pub id: TemplateId,
    pub name: String,
    pub class: Class,
    pub race: Race,
    pub creature_type: CreatureType,
    pub level: u32,
    pub alignment: i32,
    pub stats: Stats,
    pub hp: i32,
    pub mp: i32,
    pub armor: i32,
    pub coins: i64,
    pub saves: SaveChances,
    pub skills: BTreeMap<Skill, i32>,
    pub flags: MonsterFlags,
    pub equipment: Equipment,
    pub inventory: Vec<Item>,
    pub known_spells: BTreeSet<String>,
    pub specials: Vec<SpecialAttack>,
    pub profile: MonsterProfile,
}

impl Default for ActorTemplate {
    fn default() -> Self {
        Self {
            id: TemplateId::NONE,
            name: "creature".to_owned(),
            class: Class::Commoner,
            race: Race::None,
            creature_type: CreatureType::Humanoid,
            level: 1,
            alignment: 0,
            stats: Stats::default(),
            hp: 10,
            mp: 0,
            armor: 0,
            coins: 0,
            saves: SaveChances::default(),
            skills: BTreeMap::new(),
            flags: MonsterFlags::empty(),
            equipment: Equipment::empty(),
            inventory: Vec::new(),
            known_spells: BTreeSet::new(),
            specials: Vec::new(),
            profile: MonsterProfile::default(),
        }
    }
}

impl ActorTemplate {
    /// Creates a builder for constructing templates.
    pub fn builder(name: &str) -> ActorTemplateBuilder {
        ActorTemplateBuilder {
            template: Self {
                name: name.to_owned(),
                ..Self::default()
            },
        }
    }

    /// Instantiates the template as a monster standing in `room`.
    pub fn to_actor(&self, id: ActorId, room: RoomId) -> Actor {
        let mut actor = Actor::new(id, &self.name, ActorKind::Monster);
        actor.class = self.class;
        actor.race = self.race;
        actor.creature_type = self.creature_type;
        actor.level = self.level.max(1);
        actor.alignment = self.alignment;
        actor.stats = self.stats.clone();
        actor.hp = Pool::new(self.hp.max(1));
        actor.mp = Pool::new(self.mp.max(0));
        actor.armor = self.armor;
        actor.coins = self.coins;
        actor.saves = self.saves;
        actor.skills = self.skills.clone();
        actor.monster_flags = self.flags;
        actor.equipment = self.equipment.clone();
        actor.inventory = self.inventory.clone();
        actor.known_spells = self.known_spells.clone();
        actor.specials = self.specials.clone();
        actor.profile = self.profile.clone();
        actor.profile.template = self.id;
        actor.room = room;
        actor
    }
}

/// Builder for [`ActorTemplate`], used by tests and hand-written content.
#[derive(Clone, Debug)]
pub struct ActorTemplateBuilder {
    template: ActorTemplate,
}

impl ActorTemplateBuilder {
    pub fn id(mut self, id: TemplateId) -> Self {
        self.template.id = id;
        self
    }

    pub fn class(mut self, class: Class) -> Self {
        self.template.class = class;
        self
    }

    pub fn race(mut self, race: Race) -> Self {
        self.template.race = race;
        self
    }

    pub fn creature_type(mut self, creature_type: CreatureType) -> Self {
        self.template.creature_type = creature_type;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.template.level = level;
        self
    }

    pub fn alignment(mut self, alignment: i32) -> Self {
        self.template.alignment = alignment;
        self
    }

    pub fn stats(mut self, stats: Stats) -> Self {
        self.template.stats = stats;
        self
    }

    pub fn hp(mut self, hp: i32) -> Self {
        self.template.hp = hp;
        self
    }

    pub fn armor(mut self, armor: i32) -> Self {
        self.template.armor = armor;
        self
    }

    pub fn coins(mut self, coins: i64) -> Self {
        self.template.coins = coins;
        self
    }

    pub fn flags(mut self, flags: MonsterFlags) -> Self {
        self.template.flags |= flags;
        self
    }

    /// Natural weapon used when nothing is wielded.
    pub fn damage(mut self, damage: Dice) -> Self {
        self.template.profile.damage = damage;
        self
    }

    pub fn skill(mut self, skill: Skill, value: i32) -> Self {
        self.template.skills.insert(skill, value);
        self
    }

    pub fn wield(mut self, weapon: Item) -> Self {
        self.template.equipment.wield = Some(weapon);
        self
    }

    pub fn carry(mut self, item: Item) -> Self {
        self.template.inventory.push(item);
        self
    }

    pub fn special(mut self, special: SpecialAttack) -> Self {
        self.template.specials.push(special);
        self
    }

    pub fn profile(mut self, profile: MonsterProfile) -> Self {
        self.template.profile = profile;
        self
    }

    pub fn build(self) -> ActorTemplate {
        self.template
    }
}

/// Oracle providing creature templates for spawning.
///
/// Content loaders implement this over whatever catalog they read; the
/// engine only asks for a template by id.
pub trait TemplateOracle: Send + Sync {
    fn template(&self, id: TemplateId) -> Option<&ActorTemplate>;

    /// All template ids, in catalog order.
    fn ids(&self) -> Vec<TemplateId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_actor_carries_template_id_and_full_hp() {
        let template = ActorTemplate::builder("cave troll")
            .id(TemplateId(12))
            .level(9)
            .hp(80)
            .flags(MonsterFlags::AGGRESSIVE)
            .damage(Dice::new(2, 6, 3))
            .build();

        let troll = template.to_actor(ActorId(3), RoomId(7));
        assert_eq!(troll.profile.template, TemplateId(12));
        assert_eq!(troll.hp.cur(), 80);
        assert_eq!(troll.room, RoomId(7));
        assert!(troll.is_monster());
        assert!(troll.monster_flags.contains(MonsterFlags::AGGRESSIVE));
    }
}
