//! Deferred symbol reveals on round time
//!
//! Reveals fire when the round's own clock passes their due time, never on
//! wall-clock time, so stopping a round simply drops whatever is pending.

use serde::{Deserialize, Serialize};

/// Attach a symbol to its portal at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    /// Round time (seconds) at which this applies
    pub due: f32,
    pub symbol_id: u32,
    pub portal_id: u32,
    pub slot: usize,
}

/// Pending reveals, kept ordered by due time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevealSchedule {
    pending: Vec<Reveal>,
}

impl RevealSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reveal; equal due times keep insertion order
    pub fn push(&mut self, reveal: Reveal) {
        let at = self.pending.partition_point(|r| r.due <= reveal.due);
        self.pending.insert(at, reveal);
    }

    /// Remove and return every reveal due at or before `now`
    pub fn drain_due(&mut self, now: f32) -> Vec<Reveal> {
        let split = self.pending.partition_point(|r| r.due <= now);
        self.pending.drain(..split).collect()
    }

    /// Drop everything without running it
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Pending reveals, soonest first
    pub fn iter(&self) -> impl Iterator<Item = &Reveal> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
