//! Item pool generation for item carousels
//!
//! Pool size and item family depend on stage and special rule. Duplicates
//! are capped with bounded rejection sampling: after `max_pick_tries`
//! rejected draws the last draw is kept even if it exceeds the cap.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::catalog::{CRAFTABLE_ITEMS, ITEM_COMPONENTS, Item, SYNERGY_STONES};
use crate::game::SpecialRule;
use crate::settings::CarouselConfig;

/// What a pool is drawn from and how large it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolRules {
    pub size: usize,
    pub candidates: &'static [Item],
    pub max_copies: usize,
}

impl PoolRules {
    pub fn new(stage_level: u32, rule: Option<SpecialRule>, alive: usize, config: &CarouselConfig) -> Self {
        let mut rules = Self {
            size: (alive + 3).clamp(5, 9),
            candidates: ITEM_COMPONENTS,
            max_copies: 2,
        };

        // Late carousels offer full items, one more of them
        if stage_level >= config.late_game_stage {
            rules.size += 1;
            rules.candidates = CRAFTABLE_ITEMS;
            rules.max_copies = 1;
        }

        match rule {
            Some(SpecialRule::SynergyWheel) => {
                rules.candidates = SYNERGY_STONES;
                rules.max_copies = 4;
            }
            Some(SpecialRule::KecleonsShop) => {
                rules.candidates = CRAFTABLE_ITEMS;
                rules.max_copies = 1;
                rules.size = 6;
            }
            _ => {}
        }

        rules
    }
}

/// Pick the items floating on this carousel
pub fn pick_items<R: Rng + ?Sized>(
    rng: &mut R,
    stage_level: u32,
    rule: Option<SpecialRule>,
    alive: usize,
    config: &CarouselConfig,
) -> Vec<Item> {
    let rules = PoolRules::new(stage_level, rule, alive, config);
    let (items, over_cap) = draw_capped(rng, &rules, config.max_pick_tries);
    if over_cap > 0 {
        log::warn!("Item pool accepted {} draws over the duplicate cap", over_cap);
    }
    log::info!("Item pool for stage {}: {:?}", stage_level, items);
    items
}

/// Draw `rules.size` items; returns the items and how many exceeded the cap
pub fn draw_capped<R: Rng + ?Sized>(rng: &mut R, rules: &PoolRules, max_tries: u32) -> (Vec<Item>, usize) {
    let mut items: Vec<Item> = Vec::with_capacity(rules.size);
    let mut over_cap = 0;

    for _ in 0..rules.size {
        let mut tries = 0;
        loop {
            let Some(&item) = rules.candidates.choose(rng) else {
                return (items, over_cap);
            };
            let count = items.iter().filter(|&&i| i == item).count();
            tries += 1;
            if count < rules.max_copies {
                items.push(item);
                break;
            }
            if tries >= max_tries {
                items.push(item);
                over_cap += 1;
                break;
            }
        }
    }

    (items, over_cap)
}
