//! Carousel balance settings
//!
//! Policy constants the outer game may tune. Defaults reproduce the
//! shipped balance; any field missing from a JSON file keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunable carousel policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    // === Round classification ===
    /// Stages that run an item carousel
    pub item_carousel_stages: Vec<u32>,
    /// Stages that run a portal carousel
    pub portal_carousel_stages: Vec<u32>,
    /// From this stage on, items are full craftables instead of components
    pub late_game_stage: u32,

    // === Shop rule ===
    /// Money taken per item under the shop rule
    pub shop_cost: u32,

    // === Entry delays (seconds) ===
    /// Delay before any rank bonus applies
    pub entry_delay_base: f32,
    /// Extra delay per rank position above last place
    pub entry_delay_per_rank: f32,
    /// Stages below this use a flat delay
    pub early_stage: u32,
    /// Flat delay for early stages, and floor for item rounds
    pub item_entry_delay: f32,
    /// Flat delay for portal rounds
    pub portal_entry_delay: f32,
    /// Random extra delay range for bots
    pub bot_jitter: (f32, f32),

    // === Movement ===
    /// Avatar speed (pixels/sec)
    pub player_speed: f32,
    /// Below this distance to target an avatar stands still
    pub min_motion: f32,

    // === Orbits ===
    /// Radius items and portals orbit the arena centre at
    pub carousel_radius: f32,
    /// Radius symbols orbit their portal at
    pub symbol_orbit_radius: f32,
    /// Orbit rates (radians/sec)
    pub item_rotation_speed: f32,
    pub portal_rotation_speed: f32,
    pub symbol_rotation_speed: f32,

    // === Pool generation ===
    /// Draws per slot before an over-cap item is accepted
    pub max_pick_tries: u32,
    /// Symbols offered per alive player in portal rounds
    pub symbols_per_player: usize,

    // === Symbol reveal (seconds) ===
    /// Delay before the first symbol joins its portal
    pub reveal_delay: f32,
    /// Extra delay spread across the shuffled symbol order
    pub reveal_spread: f32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            item_carousel_stages: vec![4, 10, 17, 22, 27, 34],
            portal_carousel_stages: vec![0, 13, 20],
            late_game_stage: 20,

            shop_cost: 10,

            entry_delay_base: 4.0,
            entry_delay_per_rank: 2.0,
            early_stage: 5,
            item_entry_delay: 5.0,
            portal_entry_delay: 8.0,
            bot_jitter: (1.0, 6.0),

            player_speed: 120.0,
            min_motion: 2.0,

            carousel_radius: 150.0,
            symbol_orbit_radius: 25.0,
            item_rotation_speed: 0.4,
            portal_rotation_speed: 0.3,
            symbol_rotation_speed: 0.6,

            max_pick_tries: 10,
            symbols_per_player: 4,

            reveal_delay: 1.5,
            reveal_spread: 1.5,
        }
    }
}

impl CarouselConfig {
    pub fn is_item_carousel(&self, stage_level: u32) -> bool {
        self.item_carousel_stages.contains(&stage_level)
    }

    pub fn is_portal_carousel(&self, stage_level: u32) -> bool {
        self.portal_carousel_stages.contains(&stage_level)
    }

    /// Parse from JSON, missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded carousel config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Invalid carousel config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read carousel config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
