use bitflags::bitflags;

bitflags! {
    /// Persistent player switches that the engagement gate and aggro rules read.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct PlayerFlags: u32 {
        /// Lost a duel; protected until the flag is cleared.
        const DIED_IN_DUEL          = 1 << 0;
        /// Opted out of player-killing.
        const NO_PKILL              = 1 << 1;
        /// Chaotic players may attack and be attacked by other chaotic players.
        const CHAOTIC               = 1 << 2;
        /// Outlaws lose pk protection everywhere but outlaw-safe rooms.
        const OUTLAW                = 1 << 3;
        /// Pledged to a guild-war side.
        const PLEDGED               = 1 << 4;
        /// Builder allowed to fight monsters inside their area range.
        const BUILDER_MOBS          = 1 << 5;
        const HIDDEN                = 1 << 6;
        const CLEAR_TARGET_ON_FLEE  = 1 << 7;
        /// Lycanthrope player (fights with claws when bare-handed).
        const LYCANTHROPE           = 1 << 8;
        /// Only enchanted weapons can hurt this player.
        const ENCHANT_ONLY          = 1 << 9;
        /// Monk fighting with a focused mind.
        const FOCUSED               = 1 << 10;
    }
}

bitflags! {
    /// Behavior switches for autonomous creatures.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct MonsterFlags: u64 {
        // ---- aggression ----
        const AGGRESSIVE            = 1 << 0;
        const ALWAYS_AGGRESSIVE     = 1 << 1;
        const AGGRESSIVE_GOOD       = 1 << 2;
        const AGGRESSIVE_EVIL       = 1 << 3;
        const WILL_BE_AGGRESSIVE    = 1 << 4;
        const OUTLAW_AGGRO          = 1 << 5;

        // ---- protection ----
        const UNKILLABLE            = 1 << 6;
        const PERMANENT             = 1 << 7;
        const ONLY_HARMED_BY_MAGIC  = 1 << 8;
        const NO_BACKSTAB           = 1 << 9;
        const UNDEAD                = 1 << 10;

        // ---- assistance ----
        const WILL_ASSIST           = 1 << 11;
        const WILL_BE_ASSISTED      = 1 << 12;
        const FACTION_ASSIST        = 1 << 13;
        const ALWAYS_ACTIVE         = 1 << 14;

        // ---- movement ----
        const MOBILE                = 1 << 15;
        const FAST_WANDER           = 1 << 16;
        const NO_WANDER             = 1 << 17;
        const DM_FOLLOW             = 1 << 18;
        const CHASING_SOMEONE       = 1 << 19;
        const ATTACKING_SHOPLIFTER  = 1 << 20;
        const PASSIVE_EXIT_GUARD    = 1 << 21;
        const WILL_SNEAK            = 1 << 22;
        const SNEAKING              = 1 << 23;
        const WILL_FLEE             = 1 << 24;

        // ---- scavenging ----
        const SCAVENGER             = 1 << 25;
        const HAS_SCAVENGED         = 1 << 26;
        const WILL_WIELD            = 1 << 27;
        const TAKE_LOOT             = 1 << 28;
        const STREET_SWEEPER        = 1 << 29;

        // ---- regeneration ----
        const FAST_TICK             = 1 << 30;
        const REGENERATES           = 1 << 31;
        const WAS_HIDDEN            = 1 << 32;
        const HIDDEN                = 1 << 33;
        const WILL_BERSERK          = 1 << 34;

        // ---- weapon gating ----
        const ENCHANTED_WEAPONS_ONLY = 1 << 35;
        const PLUS_TWO              = 1 << 36;
        const PLUS_THREE            = 1 << 37;
    }
}

bitflags! {
    /// Room properties consulted by combat and casting.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct RoomFlags: u32 {
        /// No spellcasting at all.
        const NO_MAGIC          = 1 << 0;
        /// Player-killing forbidden.
        const PK_SAFE           = 1 << 1;
        /// Outlaws cannot be attacked here.
        const OUTLAW_SAFE       = 1 << 2;
        /// Only one player fits.
        const ONE_PERSON        = 1 << 3;
        const SHOP_STORAGE      = 1 << 4;
        /// Anti-magic field: casting is attempted but fizzles.
        const ANTI_MAGIC        = 1 << 5;
        const HALLOWED          = 1 << 6;
        const UNHALLOWED        = 1 << 7;
        /// Area under construction; creatures never wander across the boundary.
        const CONSTRUCTION      = 1 << 8;
    }
}

bitflags! {
    /// Object properties.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ItemFlags: u32 {
        const SILVER        = 1 << 0;
        /// Shield that strengthens bash.
        const ENHANCE_BASH  = 1 << 1;
        const NO_TAKE       = 1 << 2;
        const SCENERY       = 1 << 3;
        const HIDDEN        = 1 << 4;
        const PERM_INV      = 1 << 5;
        const PERM          = 1 << 6;
        const UNIQUE        = 1 << 7;
        const LUCKY         = 1 << 8;
        const SMALL_SHIELD  = 1 << 9;
    }
}

bitflags! {
    /// Exit properties.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ExitFlags: u32 {
        const CLOSED        = 1 << 0;
        const LOCKED        = 1 << 1;
        const SECRET        = 1 << 2;
        const CONCEALED     = 1 << 3;
        const NO_FLEE       = 1 << 4;
        /// Wandering creatures will not take this exit.
        const NO_MOBILE     = 1 << 5;
    }
}
