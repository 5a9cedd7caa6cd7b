//! Synergy symbols and portal destinations
//!
//! Each alive player contributes a handful of symbols drawn from the
//! synergies they have built. Symbols are dealt round-robin over the
//! portals, and every portal then takes the unused map sharing the most
//! synergies with its symbols.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::catalog::{Dungeon, Synergy};

/// 1-based index of the highest trigger reached, 0 if none
pub fn level_reached(synergy: Synergy, value: u32) -> usize {
    synergy.triggers().iter().filter(|&&t| t <= value).count()
}

/// Level used when offering symbols, after balancing exceptions
pub fn offered_level(synergy: Synergy, value: u32) -> usize {
    let level = level_reached(synergy, value);
    match synergy {
        // Low triggers make these too easy to stack
        Synergy::Flora | Synergy::Light => level.saturating_sub(1),
        // Keeps the legendary pool from skewing
        Synergy::Gourmet => level.min(1),
        _ => level,
    }
}

/// Symbols a player brings to the portal carousel
pub fn pick_player_symbols<R: Rng + ?Sized>(
    rng: &mut R,
    synergies: &BTreeMap<Synergy, u32>,
    count: usize,
) -> Vec<Synergy> {
    let levels: Vec<(Synergy, usize)> = synergies
        .iter()
        .map(|(&synergy, &value)| (synergy, offered_level(synergy, value)))
        .collect();

    // One candidate per level reached
    let mut candidates: Vec<Synergy> = levels
        .iter()
        .flat_map(|&(synergy, level)| std::iter::repeat_n(synergy, level))
        .collect();

    if candidates.len() < count {
        // Started but not yet triggered synergies come next
        let incomplete: Vec<Synergy> = levels
            .iter()
            .filter(|&&(synergy, level)| level == 0 && synergies.get(&synergy).copied().unwrap_or(0) > 0)
            .map(|&(synergy, _)| synergy)
            .collect();
        let missing = count - candidates.len();
        candidates.extend(incomplete.choose_multiple(rng, missing).copied());
    }

    while candidates.len() < count {
        match Synergy::ALL.choose(rng) {
            Some(&synergy) => candidates.push(synergy),
            None => break,
        }
    }

    candidates.choose_multiple(rng, count).copied().collect()
}

/// Where a symbol ends up and when it gets there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub symbol_id: u32,
    pub portal_id: u32,
    /// Slot within the portal
    pub slot: usize,
    /// Position in the shuffled deal, drives the reveal delay
    pub order: usize,
}

/// Deal symbols round-robin over the portals, both shuffled first
pub fn distribute<R: Rng + ?Sized>(rng: &mut R, symbol_ids: &[u32], portal_ids: &[u32]) -> Vec<Placement> {
    if portal_ids.is_empty() {
        return Vec::new();
    }
    let mut portals = portal_ids.to_vec();
    portals.shuffle(rng);
    let mut symbols = symbol_ids.to_vec();
    symbols.shuffle(rng);

    symbols
        .iter()
        .enumerate()
        .map(|(i, &symbol_id)| Placement {
            symbol_id,
            portal_id: portals[i % portals.len()],
            slot: i / portals.len(),
            order: i,
        })
        .collect()
}

/// Pick a map per portal, in the given order, never reusing one
///
/// `remaining` is consumed: every chosen map is removed from it. A portal
/// gets `None` only once every map has been taken.
pub fn assign_maps<R: Rng + ?Sized>(
    rng: &mut R,
    portals: &[(u32, Vec<Synergy>)],
    remaining: &mut BTreeSet<Dungeon>,
) -> Vec<(u32, Option<Dungeon>)> {
    portals
        .iter()
        .map(|(portal_id, portal_synergies)| {
            let mut best = 0;
            let mut candidates: Vec<Dungeon> = Vec::new();
            for &map in remaining.iter() {
                let in_common = map
                    .synergies()
                    .iter()
                    .filter(|&s| portal_synergies.contains(s))
                    .count();
                if in_common > best {
                    best = in_common;
                    candidates.clear();
                    candidates.push(map);
                } else if in_common == best {
                    candidates.push(map);
                }
            }

            let map = candidates.choose(rng).copied();
            if let Some(map) = map {
                remaining.remove(&map);
            } else {
                log::warn!("No map left for portal {}", portal_id);
            }
            (*portal_id, map)
        })
        .collect()
}
