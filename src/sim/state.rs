//! Round entities
//!
//! Everything a replication layer reads while a round runs. Positions here
//! are copies written back from the arena after each step.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::catalog::{Dungeon, Item, Synergy};
use crate::game::PlayerId;

/// Avatar animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Idle,
    Walk,
}

/// Facing direction, 8-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    Up,
    UpRight,
    Right,
    DownRight,
    #[default]
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Orientation {
    /// Orientation of a vector whose y axis points up
    pub fn from_vector(v: Vec2) -> Self {
        if v == Vec2::ZERO {
            return Orientation::Down;
        }
        let angle = v.y.atan2(v.x).to_degrees();
        // 45° sectors centred on each direction, starting at Right
        let sector = ((angle + 360.0 + 22.5) / 45.0).floor() as i32 % 8;
        match sector {
            0 => Orientation::Right,
            1 => Orientation::UpRight,
            2 => Orientation::Up,
            3 => Orientation::UpLeft,
            4 => Orientation::Left,
            5 => Orientation::DownLeft,
            6 => Orientation::Down,
            _ => Orientation::DownRight,
        }
    }
}

/// Portal an avatar went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalClaim {
    Portal(u32),
    /// No portal taken; the outer game picks a destination
    Random,
}

/// A player's controllable proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    /// Same as the owning player
    pub id: PlayerId,
    pub pos: Vec2,
    pub target: Vec2,
    /// Seconds before the avatar can move; infinite when locked out
    pub timer: f32,
    pub action: ActionState,
    pub orientation: Orientation,
    pub item_id: Option<u32>,
    pub portal_id: Option<PortalClaim>,
}

impl Avatar {
    pub fn new(id: PlayerId, pos: Vec2, timer: f32) -> Self {
        Self {
            id,
            pos,
            target: pos,
            timer,
            action: ActionState::Idle,
            orientation: Orientation::Down,
            item_id: None,
            portal_id: None,
        }
    }

    /// Entry delay elapsed
    pub fn is_released(&self) -> bool {
        self.timer <= 0.0
    }
}

/// An item floating on the carousel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingItem {
    pub id: u32,
    pub name: Item,
    pub pos: Vec2,
    /// Orbit slot
    pub index: usize,
    pub avatar_id: Option<PlayerId>,
}

/// A stage-transition portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub id: u32,
    pub pos: Vec2,
    pub index: usize,
    pub map: Option<Dungeon>,
    pub avatar_id: Option<PlayerId>,
}

/// A synergy offered through a portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergySymbol {
    pub id: u32,
    pub pos: Vec2,
    pub synergy: Synergy,
    /// Player-local index until revealed, then slot within the portal
    pub index: usize,
    /// Set once the reveal fires
    pub portal_id: Option<u32>,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
