//! Identity tags shared by players and monsters.
//!
//! Class ordering matters: staff classes sort above every adventuring class
//! and above each other, so rank comparisons are plain `<` / `>`.

/// Character class. Declaration order is rank order for staff comparisons.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Class {
    /// Classless creature.
    #[default]
    Commoner,
    Assassin,
    Berserker,
    Cleric,
    Fighter,
    Mage,
    Paladin,
    Ranger,
    Thief,
    Pureblood,
    Monk,
    DeathKnight,
    Druid,
    Lich,
    Werewolf,
    Bard,
    Rogue,
    // Staff ranks
    Builder,
    Caretaker,
    DungeonMaster,
}

impl Class {
    /// Any staff rank.
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Builder | Self::Caretaker | Self::DungeonMaster)
    }

    /// Caretaker or above: exempt from engagement law.
    pub const fn is_caretaker(self) -> bool {
        matches!(self, Self::Caretaker | Self::DungeonMaster)
    }

    /// Casters whose spells are gated by divine domain rather than arcane school.
    pub const fn is_divine(self) -> bool {
        matches!(
            self,
            Self::Cleric | Self::Paladin | Self::DeathKnight | Self::Druid
        )
    }
}

/// Playable and creature races.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Race {
    #[default]
    None,
    Human,
    Elf,
    HalfElf,
    Dwarf,
    Gnome,
    Halfling,
    Orc,
    HalfOrc,
    Ogre,
    Troll,
    DarkElf,
    Goblin,
    Kobold,
    Minotaur,
    Seraph,
    Cambion,
    Barbarian,
    Kataran,
}

/// Deities a character may be pledged to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Deity {
    Aramon,
    Ceris,
    Enoch,
    Gradius,
    Ares,
    Kamira,
    Linothan,
    Arachnus,
    Mara,
    Jakar,
}

/// Broad creature taxonomy, used for undead and arachnid rules.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CreatureType {
    #[default]
    Humanoid,
    Animal,
    Insect,
    Arachnid,
    Undead,
    Demon,
    Devil,
    Dragon,
    Elemental,
    Construct,
}

/// Player vs autonomous creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActorKind {
    Player,
    Monster,
}

/// Physical stance. Sitting and sleeping defenders can be caught off guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Posture {
    #[default]
    Standing,
    Sitting,
    Sleeping,
    Unconscious,
}

/// Alignment band boundaries. Values inside `[-NEUTRAL, NEUTRAL]` are neutral.
pub const NEUTRAL_ALIGNMENT: i32 = 100;

/// True when one side is a death knight and the other a paladin, or the two
/// serve deities locked in holy war.
pub fn is_holy_war(a: (Class, Option<Deity>), b: (Class, Option<Deity>)) -> bool {
    let classes = matches!(
        (a.0, b.0),
        (Class::DeathKnight, Class::Paladin) | (Class::Paladin, Class::DeathKnight)
    );
    let deities = matches!(
        (a.1, b.1),
        (Some(Deity::Linothan), Some(Deity::Arachnus))
            | (Some(Deity::Arachnus), Some(Deity::Linothan))
            | (Some(Deity::Enoch), Some(Deity::Aramon))
            | (Some(Deity::Aramon), Some(Deity::Enoch))
    );
    classes || deities
}
