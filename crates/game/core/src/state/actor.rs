//! The unifying creature record for players and monsters.
//!
//! Relations to other actors (master, pets, enemies, duel partner) are stored
//! as [`ActorId`]s and resolved through the arena; an actor never owns another
//! actor.

use std::collections::{BTreeMap, BTreeSet};

use crate::magic::{Domain, School};
use crate::specials::SpecialAttack;
use crate::state::{
    ActorId, ActorKind, Class, CooldownKind, Cooldowns, CreatureType, Deity, Dice, EffectKind, EffectSet,
    Equipment, Item, ItemFlags, MonsterFlags, NEUTRAL_ALIGNMENT, PlayerFlags, Pool, Posture, Race, Realm,
    RoomId, Stats, TemplateId, ThreatList, Tick, WeaponCategory,
};

/// Trained abilities. Values are "gained" points on a 0..=level*10 scale.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Skill {
    Defense,
    Parry,
    Block,
    Kick,
    Bash,
    Maul,
    Ambush,
    BareHand,
    Claw,
    Crushing,
    Piercing,
    Slashing,
    Chopping,
    Ranged,
}

impl Skill {
    pub const fn for_weapon(category: WeaponCategory) -> Self {
        match category {
            WeaponCategory::Crushing => Self::Crushing,
            WeaponCategory::Piercing => Self::Piercing,
            WeaponCategory::Slashing => Self::Slashing,
            WeaponCategory::Chopping => Self::Chopping,
            WeaponCategory::Ranged => Self::Ranged,
        }
    }
}

/// Saving-throw categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SaveCategory {
    Poison,
    Death,
    Breath,
    Mental,
    Spell,
    /// Average of the other five.
    Luck,
}

/// Base save chances in whole percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaveChances {
    pub poison: i32,
    pub death: i32,
    pub breath: i32,
    pub mental: i32,
    pub spell: i32,
}

impl SaveChances {
    pub const fn uniform(chance: i32) -> Self {
        Self {
            poison: chance,
            death: chance,
            breath: chance,
            mental: chance,
            spell: chance,
        }
    }

    pub const fn get(&self, category: SaveCategory) -> i32 {
        match category {
            SaveCategory::Poison => self.poison,
            SaveCategory::Death => self.death,
            SaveCategory::Breath => self.breath,
            SaveCategory::Mental => self.mental,
            SaveCategory::Spell => self.spell,
            SaveCategory::Luck => {
                (self.poison + self.death + self.breath + self.mental + self.spell) / 5
            }
        }
    }
}

impl Default for SaveChances {
    fn default() -> Self {
        Self::uniform(5)
    }
}

/// Data only autonomous creatures carry.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonsterProfile {
    pub template: TemplateId,
    /// Natural weapon when nothing is wielded.
    pub damage: Dice,
    pub weapon_skill: i32,
    pub defense_skill: i32,
    /// Templates this creature joins in a fight.
    pub assist_list: Vec<TemplateId>,
    /// Templates this creature picks fights with.
    pub enemy_mobs: Vec<TemplateId>,
    pub aggro_races: Vec<Race>,
    pub aggro_classes: Vec<Class>,
    pub aggro_deities: Vec<Deity>,
    pub prime_faction: Option<String>,
    /// Element a summoned pet attacks with.
    pub base_realm: Option<Realm>,
    /// Offensive spells at or below this tier fail against the creature.
    pub spell_immunity_tier: u8,
    /// Carry capacity for scavenged loot.
    pub max_weight: i32,
}

/// A player or monster.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,

    // ========================================================================
    // Identity
    // ========================================================================
    pub class: Class,
    pub second_class: Option<Class>,
    pub race: Race,
    pub deity: Option<Deity>,
    pub creature_type: CreatureType,
    pub level: u32,
    pub alignment: i32,
    pub clan: Option<u32>,
    pub guild: Option<u32>,

    // ========================================================================
    // Numbers
    // ========================================================================
    pub stats: Stats,
    pub hp: Pool,
    pub mp: Pool,
    pub experience: i64,
    pub coins: i64,
    /// Armor rating from natural toughness; equipment adds on top.
    pub armor: i32,
    pub saves: SaveChances,
    pub skills: BTreeMap<Skill, i32>,

    // ========================================================================
    // State
    // ========================================================================
    pub effects: EffectSet,
    pub player_flags: PlayerFlags,
    pub monster_flags: MonsterFlags,
    pub posture: Posture,
    pub equipment: Equipment,
    pub inventory: Vec<Item>,
    pub cooldowns: Cooldowns,
    /// Ticks added to the next attack wait.
    pub attack_delay: u64,
    pub room: RoomId,

    // ========================================================================
    // Relations
    // ========================================================================
    pub enemies: ThreatList,
    pub master: Option<ActorId>,
    pub pets: Vec<ActorId>,
    pub duel_with: Option<ActorId>,
    /// Actors this one currently holds charmed.
    pub charmed: Vec<ActorId>,
    pub faction_regard: BTreeMap<String, i32>,
    /// Room id ranges a builder may fight in.
    pub builder_ranges: Vec<(u32, u32)>,

    // ========================================================================
    // Magic
    // ========================================================================
    pub known_spells: BTreeSet<String>,
    pub schools: BTreeSet<School>,
    pub domains: BTreeSet<Domain>,

    // ========================================================================
    // Monster data
    // ========================================================================
    pub specials: Vec<SpecialAttack>,
    pub profile: MonsterProfile,
}

impl Actor {
    pub fn new(id: ActorId, name: &str, kind: ActorKind) -> Self {
        Self {
            id,
            name: name.to_owned(),
            kind,
            class: Class::default(),
            second_class: None,
            race: Race::default(),
            deity: None,
            creature_type: CreatureType::default(),
            level: 1,
            alignment: 0,
            clan: None,
            guild: None,
            stats: Stats::default(),
            hp: Pool::new(10),
            mp: Pool::new(0),
            experience: 0,
            coins: 0,
            armor: 0,
            saves: SaveChances::default(),
            skills: BTreeMap::new(),
            effects: EffectSet::empty(),
            player_flags: PlayerFlags::empty(),
            monster_flags: MonsterFlags::empty(),
            posture: Posture::Standing,
            equipment: Equipment::empty(),
            inventory: Vec::new(),
            cooldowns: Cooldowns::new(),
            attack_delay: 0,
            room: RoomId::default(),
            enemies: ThreatList::new(),
            master: None,
            pets: Vec::new(),
            duel_with: None,
            charmed: Vec::new(),
            faction_regard: BTreeMap::new(),
            builder_ranges: Vec::new(),
            known_spells: BTreeSet::new(),
            schools: BTreeSet::new(),
            domains: BTreeSet::new(),
            specials: Vec::new(),
            profile: MonsterProfile::default(),
        }
    }

    #[inline]
    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    #[inline]
    pub fn is_monster(&self) -> bool {
        self.kind == ActorKind::Monster
    }

    /// Monster bound to a master.
    #[inline]
    pub fn is_pet(&self) -> bool {
        self.is_monster() && self.master.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.class.is_staff()
    }

    pub fn is_caretaker(&self) -> bool {
        self.class.is_caretaker()
    }

    /// hp at zero: no pipeline stage may touch this actor until death is processed.
    #[inline]
    pub fn is_dying(&self) -> bool {
        self.hp.cur() <= 0
    }

    pub fn is_undead(&self) -> bool {
        self.class == Class::Lich
            || self.creature_type == CreatureType::Undead
            || self.monster_flags.contains(MonsterFlags::UNDEAD)
    }

    /// Lich players take extra physical damage.
    pub fn is_brittle(&self) -> bool {
        self.is_player() && self.class == Class::Lich
    }

    /// Undead, constructs and elementals have no life to drain.
    pub fn can_be_drained(&self, now: Tick) -> bool {
        !self.is_undead()
            && !self.effects.has(EffectKind::DrainShield, now)
            && !matches!(
                self.creature_type,
                CreatureType::Construct | CreatureType::Elemental
            )
    }

    pub fn is_hidden(&self) -> bool {
        self.player_flags.contains(PlayerFlags::HIDDEN)
            || self.monster_flags.contains(MonsterFlags::HIDDEN)
    }

    pub fn is_unconscious(&self) -> bool {
        self.posture == Posture::Unconscious
    }

    /// Off guard: sitting or sleeping.
    pub fn is_off_guard(&self) -> bool {
        matches!(self.posture, Posture::Sitting | Posture::Sleeping)
    }

    pub fn is_good(&self) -> bool {
        self.alignment > NEUTRAL_ALIGNMENT
    }

    pub fn is_evil(&self) -> bool {
        self.alignment < -NEUTRAL_ALIGNMENT
    }

    pub fn has_class(&self, class: Class) -> bool {
        self.class == class || self.second_class == Some(class)
    }

    pub fn skill(&self, skill: Skill) -> i32 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    /// Nudges a skill up by one point, capped at ten per level.
    pub fn improve_skill(&mut self, skill: Skill) -> bool {
        let cap = self.level as i32 * 10;
        let entry = self.skills.entry(skill).or_insert(0);
        if *entry >= cap {
            return false;
        }
        *entry += 1;
        true
    }

    /// Equipment armor plus natural armor.
    pub fn total_armor(&self) -> i32 {
        self.armor + self.equipment.total_armor()
    }

    pub fn carried_weight(&self) -> i32 {
        self.inventory.iter().map(|i| i.weight).sum::<i32>() + self.equipment.carried_weight()
    }

    pub fn can_carry(&self, item: &Item) -> bool {
        let capacity = if self.is_monster() && self.profile.max_weight > 0 {
            self.profile.max_weight
        } else {
            self.stats.strength
        };
        self.carried_weight() + item.weight <= capacity
    }

    /// Whether this actor notices `other` at all.
    pub fn can_see(&self, other: &Actor, now: Tick) -> bool {
        if self.id == other.id || self.is_staff() {
            return true;
        }
        if self.effects.has(EffectKind::Blindness, now) {
            return false;
        }
        if other.is_staff() && other.class > self.class && other.is_hidden() {
            return false;
        }
        !other.effects.has(EffectKind::Invisibility, now)
            || self.effects.has(EffectKind::DetectInvisible, now)
    }

    /// Stamps the aggro timer and puts `target` on the enemy list.
    pub fn add_enemy(&mut self, target: ActorId, now: Tick) -> bool {
        if target == self.id {
            return false;
        }
        self.cooldowns.stamp(CooldownKind::AggroAction, now);
        self.enemies.add_enemy(target)
    }

    pub fn is_enemy(&self, other: ActorId) -> bool {
        self.enemies.contains(other)
    }

    pub fn level_i32(&self) -> i32 {
        self.level as i32
    }

    /// 1..=99. Mind and body raise it; straying from a faith's alignment
    /// and carrying a fortune lower it.
    pub fn luck(&self) -> i32 {
        let mut strain = match self.class {
            Class::Paladin | Class::Cleric | Class::DeathKnight | Class::Lich => {
                (self.alignment.abs() + 1) / 10
            }
            _ => 0,
        };
        let favored = match self.class {
            Class::Paladin => self.deity != Some(Deity::Gradius) && self.is_good(),
            Class::DeathKnight => self.is_evil(),
            Class::Lich => self.alignment <= -500,
            Class::Cleric => match self.deity {
                Some(Deity::Enoch | Deity::Linothan | Deity::Kamira) => self.is_good(),
                Some(Deity::Aramon | Deity::Arachnus) => self.is_evil(),
                _ => false,
            },
            _ => false,
        };
        if strain == 0 || favored {
            strain = 1;
        }

        let body = if self.class == Class::Lich {
            self.stats.piety
        } else {
            self.stats.constitution
        } / 10;
        let mut luck = 100 * (self.stats.intelligence / 10 + body) / strain;
        if let Some(held) = &self.equipment.held
            && held.flags.contains(ItemFlags::LUCKY)
        {
            luck += held.damage.plus;
        }
        if !self.is_staff() {
            luck -= i32::try_from(self.coins / 20_000).unwrap_or(i32::MAX);
        }
        luck.clamp(1, 99)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Effect;

    #[test]
    fn lich_is_undead_brittle_and_undrainable() {
        let mut lich = Actor::new(ActorId(1), "Vex", ActorKind::Player);
        lich.class = Class::Lich;
        assert!(lich.is_undead());
        assert!(lich.is_brittle());
        assert!(!lich.can_be_drained(0));
    }

    #[test]
    fn drain_shield_blocks_drain() {
        let mut knight = Actor::new(ActorId(2), "Ser Ana", ActorKind::Player);
        assert!(knight.can_be_drained(0));
        knight
            .effects
            .apply(Effect::permanent(EffectKind::DrainShield, 1), 0);
        assert!(!knight.can_be_drained(0));
    }

    #[test]
    fn skills_cap_at_ten_per_level() {
        let mut a = Actor::new(ActorId(3), "Pip", ActorKind::Player);
        a.level = 1;
        for _ in 0..20 {
            a.improve_skill(Skill::Kick);
        }
        assert_eq!(a.skill(Skill::Kick), 10);
    }

    #[test]
    fn luck_save_is_average() {
        let saves = SaveChances {
            poison: 10,
            death: 20,
            breath: 30,
            mental: 40,
            spell: 50,
        };
        assert_eq!(saves.get(SaveCategory::Luck), 30);
    }
}
