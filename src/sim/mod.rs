//! Deterministic carousel simulation
//!
//! All round logic lives here. This module must stay deterministic:
//! - Caller-driven timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No transport or rendering dependencies

pub mod arena;
pub mod collision;
pub mod movement;
pub mod rewards;
pub mod round;
pub mod schedule;
pub mod state;
pub mod symbols;

pub use arena::{Arena, Body, BodyId, Contact};
pub use collision::{ClaimOutcome, Resolver};
pub use rewards::{PoolRules, pick_items};
pub use round::{MiniGame, RoundKind, RoundPhase, RoundSnapshot, Settlement, entry_delay};
pub use schedule::{Reveal, RevealSchedule};
pub use state::{ActionState, Avatar, FloatingItem, Orientation, Portal, PortalClaim, SynergySymbol};
pub use symbols::{assign_maps, distribute, level_reached, pick_player_symbols};
