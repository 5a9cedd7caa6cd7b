//! Static game data the carousel draws from
//!
//! Item families, synergy trigger thresholds and the dungeon maps a portal
//! can lead to.

use serde::{Deserialize, Serialize};

/// Every item the carousel can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Item {
    // Components
    FossilStone,
    MysticWater,
    Magnet,
    BlackGlasses,
    MiracleSeed,
    NeverMeltIce,
    Charcoal,
    HeartScale,
    // Craftable
    OldAmber,
    WaterIncense,
    ShellBell,
    SoulDew,
    WideLens,
    RazorClaw,
    AssaultVest,
    ChoiceSpecs,
    QuickClaw,
    Leftovers,
    RockyHelmet,
    ScopeLens,
    FocusBand,
    ShinyCharm,
    PokeDoll,
    RedOrb,
    // Synergy stones
    FireStone,
    WaterStone,
    ThunderStone,
    LeafStone,
    MoonStone,
    DawnStone,
    DuskStone,
    IceStone,
}

/// Base components, offered before the late game
pub const ITEM_COMPONENTS: &[Item] = &[
    Item::FossilStone,
    Item::MysticWater,
    Item::Magnet,
    Item::BlackGlasses,
    Item::MiracleSeed,
    Item::NeverMeltIce,
    Item::Charcoal,
    Item::HeartScale,
];

/// Full items made from two components
pub const CRAFTABLE_ITEMS: &[Item] = &[
    Item::OldAmber,
    Item::WaterIncense,
    Item::ShellBell,
    Item::SoulDew,
    Item::WideLens,
    Item::RazorClaw,
    Item::AssaultVest,
    Item::ChoiceSpecs,
    Item::QuickClaw,
    Item::Leftovers,
    Item::RockyHelmet,
    Item::ScopeLens,
    Item::FocusBand,
    Item::ShinyCharm,
    Item::PokeDoll,
    Item::RedOrb,
];

/// Stones granting a synergy to their holder
pub const SYNERGY_STONES: &[Item] = &[
    Item::FireStone,
    Item::WaterStone,
    Item::ThunderStone,
    Item::LeafStone,
    Item::MoonStone,
    Item::DawnStone,
    Item::DuskStone,
    Item::IceStone,
];

/// Thematic categories a player accumulates value in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Synergy {
    Normal,
    Grass,
    Fire,
    Water,
    Electric,
    Fighting,
    Psychic,
    Dark,
    Steel,
    Ground,
    Poison,
    Dragon,
    Field,
    Monster,
    Human,
    Aquatic,
    Bug,
    Flying,
    Flora,
    Rock,
    Ghost,
    Fairy,
    Ice,
    Fossil,
    Sound,
    Artificial,
    Baby,
    Light,
    Wild,
    Amorphous,
    Gourmet,
}

impl Synergy {
    pub const ALL: &'static [Synergy] = &[
        Synergy::Normal,
        Synergy::Grass,
        Synergy::Fire,
        Synergy::Water,
        Synergy::Electric,
        Synergy::Fighting,
        Synergy::Psychic,
        Synergy::Dark,
        Synergy::Steel,
        Synergy::Ground,
        Synergy::Poison,
        Synergy::Dragon,
        Synergy::Field,
        Synergy::Monster,
        Synergy::Human,
        Synergy::Aquatic,
        Synergy::Bug,
        Synergy::Flying,
        Synergy::Flora,
        Synergy::Rock,
        Synergy::Ghost,
        Synergy::Fairy,
        Synergy::Ice,
        Synergy::Fossil,
        Synergy::Sound,
        Synergy::Artificial,
        Synergy::Baby,
        Synergy::Light,
        Synergy::Wild,
        Synergy::Amorphous,
        Synergy::Gourmet,
    ];

    /// Ascending accumulated values at which each level triggers
    pub fn triggers(self) -> &'static [u32] {
        match self {
            Synergy::Normal => &[3, 5, 7, 9],
            Synergy::Grass => &[3, 5, 7],
            Synergy::Fire => &[2, 4, 6, 8],
            Synergy::Water => &[3, 6, 9],
            Synergy::Electric => &[3, 5, 7],
            Synergy::Fighting => &[2, 4, 6, 8],
            Synergy::Psychic => &[3, 5, 7],
            Synergy::Dark => &[3, 5, 7],
            Synergy::Steel => &[2, 4, 6, 8],
            Synergy::Ground => &[2, 4, 6, 8],
            Synergy::Poison => &[3, 5, 7],
            Synergy::Dragon => &[3, 5, 7],
            Synergy::Field => &[3, 6, 9],
            Synergy::Monster => &[2, 4, 6, 8],
            Synergy::Human => &[2, 4, 6],
            Synergy::Aquatic => &[2, 4, 6, 8],
            Synergy::Bug => &[2, 4, 6, 8],
            Synergy::Flying => &[2, 4, 6, 8],
            Synergy::Flora => &[3, 4, 5, 6],
            Synergy::Rock => &[2, 4, 6],
            Synergy::Ghost => &[2, 4, 6, 8],
            Synergy::Fairy => &[2, 4, 6, 8],
            Synergy::Ice => &[2, 4, 6, 8],
            Synergy::Fossil => &[2, 4, 6],
            Synergy::Sound => &[2, 4, 6],
            Synergy::Artificial => &[2, 4, 6],
            Synergy::Baby => &[3, 5, 7],
            Synergy::Light => &[2, 3, 4, 5],
            Synergy::Wild => &[2, 4, 6, 9],
            Synergy::Amorphous => &[3, 5, 7],
            Synergy::Gourmet => &[3, 4, 5],
        }
    }
}

/// Destination maps a portal can lead to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dungeon {
    AmpPlains,
    AppleWoods,
    BurningVolcano,
    CrystalCave,
    DarkCrater,
    DeepSeaCurrent,
    FrostyForest,
    GlimmerDesert,
    IcebergSteps,
    LightningField,
    MagmaCavern,
    MtSteel,
    MysteryJungle,
    SkyTower,
    SootheSpring,
    SpacialRift,
    StormySea,
    TemporalTower,
    TreeshroudForest,
    WishCave,
}

impl Dungeon {
    pub const ALL: &'static [Dungeon] = &[
        Dungeon::AmpPlains,
        Dungeon::AppleWoods,
        Dungeon::BurningVolcano,
        Dungeon::CrystalCave,
        Dungeon::DarkCrater,
        Dungeon::DeepSeaCurrent,
        Dungeon::FrostyForest,
        Dungeon::GlimmerDesert,
        Dungeon::IcebergSteps,
        Dungeon::LightningField,
        Dungeon::MagmaCavern,
        Dungeon::MtSteel,
        Dungeon::MysteryJungle,
        Dungeon::SkyTower,
        Dungeon::SootheSpring,
        Dungeon::SpacialRift,
        Dungeon::StormySea,
        Dungeon::TemporalTower,
        Dungeon::TreeshroudForest,
        Dungeon::WishCave,
    ];

    /// Synergies this map is themed around
    pub fn synergies(self) -> &'static [Synergy] {
        match self {
            Dungeon::AmpPlains => &[Synergy::Electric, Synergy::Field, Synergy::Normal],
            Dungeon::AppleWoods => &[Synergy::Grass, Synergy::Bug, Synergy::Gourmet],
            Dungeon::BurningVolcano => &[Synergy::Fire, Synergy::Rock, Synergy::Monster],
            Dungeon::CrystalCave => &[Synergy::Rock, Synergy::Light, Synergy::Fairy],
            Dungeon::DarkCrater => &[Synergy::Dark, Synergy::Ghost, Synergy::Fire],
            Dungeon::DeepSeaCurrent => &[Synergy::Water, Synergy::Aquatic, Synergy::Dragon],
            Dungeon::FrostyForest => &[Synergy::Ice, Synergy::Grass, Synergy::Baby],
            Dungeon::GlimmerDesert => &[Synergy::Ground, Synergy::Fossil, Synergy::Light],
            Dungeon::IcebergSteps => &[Synergy::Ice, Synergy::Water, Synergy::Wild],
            Dungeon::LightningField => &[Synergy::Electric, Synergy::Flying, Synergy::Artificial],
            Dungeon::MagmaCavern => &[Synergy::Fire, Synergy::Ground, Synergy::Fossil],
            Dungeon::MtSteel => &[Synergy::Steel, Synergy::Fighting, Synergy::Artificial],
            Dungeon::MysteryJungle => &[Synergy::Grass, Synergy::Psychic, Synergy::Wild],
            Dungeon::SkyTower => &[Synergy::Flying, Synergy::Dragon, Synergy::Sound],
            Dungeon::SootheSpring => &[Synergy::Flora, Synergy::Fairy, Synergy::Gourmet],
            Dungeon::SpacialRift => &[Synergy::Psychic, Synergy::Amorphous, Synergy::Dragon],
            Dungeon::StormySea => &[Synergy::Water, Synergy::Electric, Synergy::Aquatic],
            Dungeon::TemporalTower => &[Synergy::Psychic, Synergy::Steel, Synergy::Sound],
            Dungeon::TreeshroudForest => &[Synergy::Flora, Synergy::Bug, Synergy::Poison],
            Dungeon::WishCave => &[Synergy::Human, Synergy::Fairy, Synergy::Amorphous],
        }
    }
}
