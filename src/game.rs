//! Interface to the outer turn-based game
//!
//! Player records are owned by the outer game; the carousel only borrows
//! them mutably while a round is running. Everything the carousel needs to
//! tell the outer game goes through [`GameHooks`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Dungeon, Item, Synergy};

/// Stable player identifier, shared with the player's avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Persistent player state owned by the outer game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub money: u32,
    /// Permanent items, append-only
    pub items: Vec<Item>,
    /// Map the player's board currently sits on
    pub map: Option<Dungeon>,
    /// Accumulated value per synergy
    pub synergies: BTreeMap<Synergy, u32>,
    pub alive: bool,
    pub is_bot: bool,
    /// 1 = first place
    pub rank: u32,
}

impl Player {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId(id),
            name: name.into(),
            money: 0,
            items: Vec::new(),
            map: None,
            synergies: BTreeMap::new(),
            alive: true,
            is_bot: false,
            rank: 1,
        }
    }

    pub fn bot(id: u32, name: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            ..Self::new(id, name)
        }
    }
}

/// All players of a game, iterated in id order
pub type Players = BTreeMap<PlayerId, Player>;

/// Game-wide rule altering the carousel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialRule {
    /// Items cost money, one craftable of each
    KecleonsShop,
    /// Carousels offer synergy stones
    SynergyWheel,
    /// Rules the carousel does not react to
    GoldRush,
    DittoParty,
}

/// Shopkeeper talking to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Npc {
    Kecleon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcDialog {
    /// Player cannot afford the item
    TellPrice,
    /// Purchase confirmed
    ThankYou,
}

/// Calls the carousel makes into the outer game
pub trait GameHooks {
    /// Message to one player's session
    fn send_npc_dialog(&mut self, player: PlayerId, npc: Npc, dialog: NpcDialog);

    /// Maps picked for the portals, sent to every client for preloading
    fn broadcast_preload_maps(&mut self, maps: &[Dungeon]);

    /// Ask the shop for unique propositions matching the portal's synergies
    fn assign_unique_propositions(&mut self, player: &mut Player, stage_level: u32, synergies: &[Synergy]);

    /// Refresh the player's regional pool after a map change
    fn update_regional_pool(&mut self, player: &mut Player);
}

/// A recorded hook call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HookEvent {
    NpcDialog {
        player: PlayerId,
        npc: Npc,
        dialog: NpcDialog,
    },
    PreloadMaps(Vec<Dungeon>),
    UniquePropositions {
        player: PlayerId,
        stage_level: u32,
        synergies: Vec<Synergy>,
    },
    RegionalPool(PlayerId),
}

/// Hooks that record every call, for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    pub events: Vec<HookEvent>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialogs_for(&self, player: PlayerId) -> Vec<NpcDialog> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HookEvent::NpcDialog { player: p, dialog, .. } if *p == player => Some(*dialog),
                _ => None,
            })
            .collect()
    }
}

impl GameHooks for RecordingHooks {
    fn send_npc_dialog(&mut self, player: PlayerId, npc: Npc, dialog: NpcDialog) {
        self.events.push(HookEvent::NpcDialog { player, npc, dialog });
    }

    fn broadcast_preload_maps(&mut self, maps: &[Dungeon]) {
        self.events.push(HookEvent::PreloadMaps(maps.to_vec()));
    }

    fn assign_unique_propositions(&mut self, player: &mut Player, stage_level: u32, synergies: &[Synergy]) {
        self.events.push(HookEvent::UniquePropositions {
            player: player.id,
            stage_level,
            synergies: synergies.to_vec(),
        });
    }

    fn update_regional_pool(&mut self, player: &mut Player) {
        self.events.push(HookEvent::RegionalPool(player.id));
    }
}
