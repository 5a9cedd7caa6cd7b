//! Carousel round lifecycle
//!
//! `initialize` builds avatars, items or portals and their bodies, `tick`
//! advances the arena and resolves claims, `stop` settles rewards onto the
//! player records and tears everything down. One round at a time.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::arena::{Arena, BodyId, Contact};
use super::collision::{ClaimOutcome, Resolver};
use super::movement::{self, carousel_point, start_ring_point};
use super::rewards::pick_items;
use super::schedule::{Reveal, RevealSchedule};
use super::state::{Avatar, FloatingItem, Portal, PortalClaim, RngState, SynergySymbol};
use super::symbols::{assign_maps, distribute, pick_player_symbols};
use crate::catalog::{Dungeon, Synergy};
use crate::consts::*;
use crate::game::{GameHooks, Player, PlayerId, Players, SpecialRule};
use crate::settings::CarouselConfig;
use crate::{ellipse_point, polar_to_cartesian, slot_angle};

/// Where the round is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundPhase {
    Idle,
    Initializing,
    Running,
    Settling,
}

/// What the carousel offers this stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundKind {
    ItemCarousel,
    PortalCarousel,
    /// Avatars only, nothing to pick up
    Plain,
}

impl RoundKind {
    pub fn for_stage(stage_level: u32, config: &CarouselConfig) -> Self {
        if config.is_portal_carousel(stage_level) {
            RoundKind::PortalCarousel
        } else if config.is_item_carousel(stage_level) {
            RoundKind::ItemCarousel
        } else {
            RoundKind::Plain
        }
    }
}

/// Seconds before a player's avatar can move
pub fn entry_delay<R: Rng + ?Sized>(
    rng: &mut R,
    config: &CarouselConfig,
    player: &Player,
    alive: usize,
    stage_level: u32,
    kind: RoundKind,
    rule: Option<SpecialRule>,
) -> f32 {
    // Players doing worse get in first
    let mut delay = config.entry_delay_base + config.entry_delay_per_rank * (alive as f32 - player.rank as f32);
    if stage_level < config.early_stage {
        delay = config.item_entry_delay;
    }
    match kind {
        RoundKind::ItemCarousel => delay = delay.max(config.item_entry_delay),
        RoundKind::PortalCarousel => delay = config.portal_entry_delay,
        RoundKind::Plain => {}
    }
    if player.is_bot {
        let (lo, hi) = config.bot_jitter;
        delay += if hi > lo { rng.random_range(lo..hi) } else { lo };
    }
    if kind == RoundKind::ItemCarousel && rule == Some(SpecialRule::KecleonsShop) && player.money < config.shop_cost {
        delay = f32::INFINITY;
    }
    delay
}

/// What settlement decided on the players' behalf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Humans handed a random leftover item
    pub fallback_items: Vec<(PlayerId, u32)>,
    /// Humans who took no portal
    pub random_portals: Vec<PlayerId>,
}

/// Read-only copy of the round for replication
#[derive(Debug, Clone, Serialize)]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub kind: RoundKind,
    pub time: f32,
    pub avatars: Vec<Avatar>,
    pub items: Vec<FloatingItem>,
    pub portals: Vec<Portal>,
    pub symbols: Vec<SynergySymbol>,
}

/// The carousel minigame
#[derive(Debug, Clone)]
pub struct MiniGame {
    config: CarouselConfig,
    rng_state: RngState,
    rng: Pcg32,
    phase: RoundPhase,
    kind: RoundKind,
    stage_level: u32,
    special_rule: Option<SpecialRule>,
    arena: Arena,
    avatars: BTreeMap<PlayerId, Avatar>,
    items: BTreeMap<u32, FloatingItem>,
    portals: BTreeMap<u32, Portal>,
    symbols: BTreeMap<u32, SynergySymbol>,
    /// Symbol ids dealt to each portal, in slot order
    symbols_by_portal: BTreeMap<u32, Vec<u32>>,
    alive_players: Vec<PlayerId>,
    bot_returns: BTreeMap<PlayerId, Vec2>,
    reveals: RevealSchedule,
    next_id: u32,
}

impl MiniGame {
    pub fn new(seed: u64, config: CarouselConfig) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            rng: rng_state.to_rng(),
            rng_state,
            config,
            phase: RoundPhase::Idle,
            kind: RoundKind::Plain,
            stage_level: 0,
            special_rule: None,
            arena: Arena::new(),
            avatars: BTreeMap::new(),
            items: BTreeMap::new(),
            portals: BTreeMap::new(),
            symbols: BTreeMap::new(),
            symbols_by_portal: BTreeMap::new(),
            alive_players: Vec::new(),
            bot_returns: BTreeMap::new(),
            reveals: RevealSchedule::new(),
            next_id: 1,
        }
    }

    // === Read access ===

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn kind(&self) -> RoundKind {
        self.kind
    }

    /// Round clock (seconds)
    pub fn time(&self) -> f32 {
        self.arena.elapsed()
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn avatars(&self) -> &BTreeMap<PlayerId, Avatar> {
        &self.avatars
    }

    pub fn items(&self) -> &BTreeMap<u32, FloatingItem> {
        &self.items
    }

    pub fn portals(&self) -> &BTreeMap<u32, Portal> {
        &self.portals
    }

    pub fn symbols(&self) -> &BTreeMap<u32, SynergySymbol> {
        &self.symbols
    }

    pub fn pending_reveals(&self) -> usize {
        self.reveals.len()
    }

    pub fn reveals(&self) -> &RevealSchedule {
        &self.reveals
    }

    /// Synergies of the symbols dealt to a portal
    pub fn portal_synergies(&self, portal_id: u32) -> Vec<Synergy> {
        self.symbols_by_portal
            .get(&portal_id)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).map(|s| s.synergy).collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase,
            kind: self.kind,
            time: self.time(),
            avatars: self.avatars.values().cloned().collect(),
            items: self.items.values().cloned().collect(),
            portals: self.portals.values().cloned().collect(),
            symbols: self.symbols.values().cloned().collect(),
        }
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // === Lifecycle ===

    /// Build the round for `stage_level`
    pub fn initialize<H: GameHooks + ?Sized>(
        &mut self,
        players: &Players,
        stage_level: u32,
        special_rule: Option<SpecialRule>,
        hooks: &mut H,
    ) {
        if self.phase != RoundPhase::Idle {
            log::warn!("Carousel initialize ignored, round is {:?}", self.phase);
            return;
        }
        self.phase = RoundPhase::Initializing;
        self.stage_level = stage_level;
        self.special_rule = special_rule;
        self.kind = RoundKind::for_stage(stage_level, &self.config);

        self.alive_players = players.values().filter(|p| p.alive).map(|p| p.id).collect();
        let alive = self.alive_players.len();
        log::info!(
            "Carousel stage {} ({:?}, rule {:?}) with {} players",
            stage_level,
            self.kind,
            special_rule,
            alive
        );

        for (i, player) in players.values().filter(|p| p.alive).enumerate() {
            let pos = start_ring_point(i, alive);
            let timer = entry_delay(
                &mut self.rng,
                &self.config,
                player,
                alive,
                stage_level,
                self.kind,
                special_rule,
            );
            let mut avatar = Avatar::new(player.id, pos, timer);
            if player.is_bot {
                avatar.target = carousel_point(i, alive, self.config.carousel_radius);
                self.bot_returns.insert(player.id, pos);
            }
            self.avatars.insert(player.id, avatar);

            let body = BodyId::Avatar(player.id);
            self.arena.add_circle(body, pos, AVATAR_RADIUS, false);
            // No collision until released
            self.arena.set_collides(body, false);
        }

        match self.kind {
            RoundKind::PortalCarousel => {
                self.initialize_portal_carousel(players);
                let maps: Vec<Dungeon> = self.portals.values().filter_map(|p| p.map).collect();
                hooks.broadcast_preload_maps(&maps);
            }
            RoundKind::ItemCarousel => self.initialize_items_carousel(),
            RoundKind::Plain => {}
        }

        self.phase = RoundPhase::Running;
    }

    fn initialize_items_carousel(&mut self) {
        let names = pick_items(
            &mut self.rng,
            self.stage_level,
            self.special_rule,
            self.alive_players.len(),
            &self.config,
        );
        for (j, &name) in names.iter().enumerate() {
            let pos = ellipse_point(ARENA_CENTER, ITEM_RING, slot_angle(j, names.len()));
            let id = self.next_entity_id();
            self.items.insert(
                id,
                FloatingItem {
                    id,
                    name,
                    pos,
                    index: j,
                    avatar_id: None,
                },
            );
            self.arena.add_circle(BodyId::Item(id), pos, ITEM_RADIUS, true);
        }
    }

    fn initialize_portal_carousel(&mut self, players: &Players) {
        let count = (self.alive_players.len() + 1).clamp(3, 9);
        for i in 0..count {
            let pos = ARENA_CENTER + polar_to_cartesian(PORTAL_RING_RADIUS, slot_angle(i, count));
            let id = self.next_entity_id();
            self.portals.insert(
                id,
                Portal {
                    id,
                    pos,
                    index: i,
                    map: None,
                    avatar_id: None,
                },
            );
            self.arena.add_circle(BodyId::Portal(id), pos, PORTAL_RADIUS, true);
        }

        self.pick_random_symbols(players);
    }

    /// Create every player's symbols, deal them to portals, then pick maps
    fn pick_random_symbols(&mut self, players: &Players) {
        let mut symbol_ids = Vec::new();
        for player_id in self.alive_players.clone() {
            let (Some(player), Some(avatar)) = (players.get(&player_id), self.avatars.get(&player_id)) else {
                continue;
            };
            let origin = avatar.pos;
            let offered = pick_player_symbols(&mut self.rng, &player.synergies, self.config.symbols_per_player);
            log::debug!("Symbols for player {:?}: {:?}", player_id, offered);
            for (i, synergy) in offered.into_iter().enumerate() {
                let id = self.next_entity_id();
                self.symbols.insert(
                    id,
                    SynergySymbol {
                        id,
                        pos: origin,
                        synergy,
                        index: i,
                        portal_id: None,
                    },
                );
                symbol_ids.push(id);
            }
        }

        let portal_ids: Vec<u32> = self.portals.keys().copied().collect();
        let placements = distribute(&mut self.rng, &symbol_ids, &portal_ids);
        let total = placements.len().max(1) as f32;
        let now = self.arena.elapsed();
        self.symbols_by_portal.clear();
        for placement in &placements {
            self.symbols_by_portal
                .entry(placement.portal_id)
                .or_default()
                .push(placement.symbol_id);
            self.reveals.push(Reveal {
                due: now + self.config.reveal_delay + self.config.reveal_spread * placement.order as f32 / total,
                symbol_id: placement.symbol_id,
                portal_id: placement.portal_id,
                slot: placement.slot,
            });
        }

        let portal_synergies: Vec<(u32, Vec<Synergy>)> =
            portal_ids.iter().map(|&id| (id, self.portal_synergies(id))).collect();
        let mut remaining: BTreeSet<Dungeon> = Dungeon::ALL.iter().copied().collect();
        for (portal_id, map) in assign_maps(&mut self.rng, &portal_synergies, &mut remaining) {
            if let Some(portal) = self.portals.get_mut(&portal_id) {
                portal.map = map;
            }
        }
        log::info!(
            "Portal maps: {:?}",
            self.portals.values().map(|p| p.map).collect::<Vec<_>>()
        );
    }

    /// Player input: steer avatar `id` by `(dx, dy)`
    pub fn apply_vector(&mut self, id: PlayerId, dx: f32, dy: f32) {
        if self.phase != RoundPhase::Running {
            return;
        }
        if let Some(avatar) = self.avatars.get_mut(&id) {
            movement::apply_vector(avatar, &mut self.arena, Vec2::new(dx, dy), &self.config);
        }
    }

    /// Resolve one contact against the round's claim state
    pub fn resolve_contact<H: GameHooks + ?Sized>(
        &mut self,
        contact: Contact,
        players: &mut Players,
        hooks: &mut H,
    ) -> ClaimOutcome {
        let shop_cost = (self.special_rule == Some(SpecialRule::KecleonsShop)).then_some(self.config.shop_cost);
        let mut resolver = Resolver {
            arena: &mut self.arena,
            avatars: &mut self.avatars,
            items: &mut self.items,
            portals: &mut self.portals,
            bot_returns: &self.bot_returns,
            shop_cost,
        };
        resolver.resolve(contact, players, hooks)
    }

    /// Advance the round by `dt` seconds
    pub fn tick<H: GameHooks + ?Sized>(&mut self, dt: f32, players: &mut Players, hooks: &mut H) {
        if self.phase != RoundPhase::Running {
            return;
        }

        self.place_on_orbits();
        let contacts = self.arena.step(dt);
        for contact in contacts {
            self.resolve_contact(contact, players, hooks);
        }

        for avatar in self.avatars.values_mut() {
            if avatar.timer > 0.0 {
                avatar.timer -= dt;
            }
        }

        let t = self.arena.elapsed();
        for id in self.arena.ids() {
            self.arena.clamp_to_playable(id);
            let Some(pos) = self.arena.body(id).map(|b| b.pos) else {
                continue;
            };
            match id {
                BodyId::Avatar(player_id) => {
                    if let Some(avatar) = self.avatars.get_mut(&player_id) {
                        avatar.pos = pos;
                        movement::update_player_vector(avatar, &mut self.arena, &self.config);
                    }
                }
                BodyId::Item(item_id) => {
                    if let Some(item) = self.items.get_mut(&item_id) {
                        item.pos = pos;
                    }
                }
                BodyId::Portal(portal_id) => {
                    if let Some(portal) = self.portals.get_mut(&portal_id) {
                        portal.pos = pos;
                    }
                    self.orbit_symbols(portal_id, pos, t);
                }
            }
        }

        for reveal in self.reveals.drain_due(t) {
            if !self.portals.contains_key(&reveal.portal_id) {
                continue;
            }
            if let Some(symbol) = self.symbols.get_mut(&reveal.symbol_id) {
                symbol.index = reveal.slot;
                symbol.portal_id = Some(reveal.portal_id);
                log::debug!("Symbol {} joined portal {}", reveal.symbol_id, reveal.portal_id);
            }
        }
    }

    /// Move unclaimed items and portals along the carousel
    ///
    /// Slots are handed out among the unclaimed entities only, in index
    /// order, so the survivors spread evenly once some are taken.
    fn place_on_orbits(&mut self) {
        let t = self.arena.elapsed();
        let radius = self.config.carousel_radius;

        let mut free_items: Vec<&FloatingItem> = self.items.values().filter(|i| i.avatar_id.is_none()).collect();
        free_items.sort_by_key(|i| i.index);
        let count = free_items.len();
        for (slot, item) in free_items.into_iter().enumerate() {
            let theta = t * self.config.item_rotation_speed + slot_angle(slot, count);
            self.arena
                .set_position(BodyId::Item(item.id), ARENA_CENTER + polar_to_cartesian(radius, theta));
        }

        let mut free_portals: Vec<&Portal> = self.portals.values().filter(|p| p.avatar_id.is_none()).collect();
        free_portals.sort_by_key(|p| p.index);
        let count = free_portals.len();
        for (slot, portal) in free_portals.into_iter().enumerate() {
            let theta = t * self.config.portal_rotation_speed + slot_angle(slot, count);
            self.arena
                .set_position(BodyId::Portal(portal.id), ARENA_CENTER + polar_to_cartesian(radius, theta));
        }
    }

    /// Revealed symbols circle their portal
    fn orbit_symbols(&mut self, portal_id: u32, center: Vec2, t: f32) {
        let Some(ids) = self.symbols_by_portal.get(&portal_id) else {
            return;
        };
        let count = ids.len();
        let spin = t * self.config.symbol_rotation_speed;
        for id in ids {
            let Some(symbol) = self.symbols.get_mut(id) else {
                continue;
            };
            if symbol.portal_id == Some(portal_id) {
                let theta = spin + slot_angle(symbol.index, count);
                symbol.pos = center + polar_to_cartesian(self.config.symbol_orbit_radius, theta);
            }
        }
    }

    /// End the round and apply its outcome to the players
    pub fn stop<H: GameHooks + ?Sized>(&mut self, players: &mut Players, hooks: &mut H) -> Settlement {
        let mut settlement = Settlement::default();
        if self.phase == RoundPhase::Idle {
            return settlement;
        }
        self.phase = RoundPhase::Settling;

        self.arena.clear();
        let dropped = self.reveals.cancel_all();
        if dropped > 0 {
            log::debug!("Dropped {} pending symbol reveals", dropped);
        }

        let shop = self.special_rule == Some(SpecialRule::KecleonsShop);
        let portal_round = self.kind == RoundKind::PortalCarousel;
        let avatar_ids: Vec<PlayerId> = self.avatars.keys().copied().collect();

        for avatar_id in avatar_ids {
            let Some(avatar) = self.avatars.get_mut(&avatar_id) else {
                continue;
            };
            let player = players.get_mut(&avatar_id);
            let human = player.as_ref().is_some_and(|p| !p.is_bot);

            if avatar.item_id.is_none() && human && !shop {
                // Nobody leaves empty-handed
                let leftovers: Vec<u32> = self
                    .items
                    .values()
                    .filter(|i| i.avatar_id.is_none())
                    .map(|i| i.id)
                    .collect();
                if let Some(&item_id) = leftovers.choose(&mut self.rng) {
                    avatar.item_id = Some(item_id);
                    if let Some(item) = self.items.get_mut(&item_id) {
                        item.avatar_id = Some(avatar_id);
                    }
                    settlement.fallback_items.push((avatar_id, item_id));
                }
            }

            if avatar.portal_id.is_none() && human {
                avatar.portal_id = Some(PortalClaim::Random);
                settlement.random_portals.push(avatar_id);
            }

            let Some(player) = player else {
                continue;
            };

            if human {
                if let Some(item) = avatar.item_id.and_then(|id| self.items.get(&id)) {
                    player.items.push(item.name);
                }
            }

            if portal_round {
                let mut portal_synergies = Vec::new();
                let claimed = match avatar.portal_id {
                    Some(PortalClaim::Portal(portal_id)) => self.portals.get(&portal_id),
                    _ => None,
                };
                if let Some(portal) = claimed {
                    let portal_id = portal.id;
                    if let Some(map) = portal.map {
                        player.map = Some(map);
                        hooks.update_regional_pool(player);
                    }
                    portal_synergies = self
                        .symbols_by_portal
                        .get(&portal_id)
                        .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).map(|s| s.synergy).collect())
                        .unwrap_or_default();
                }
                if self.stage_level > 1 {
                    hooks.assign_unique_propositions(player, self.stage_level, &portal_synergies);
                }
            }
        }

        log::info!(
            "Carousel stage {} settled: {} fallback items, {} random portals",
            self.stage_level,
            settlement.fallback_items.len(),
            settlement.random_portals.len()
        );

        self.avatars.clear();
        self.items.clear();
        self.portals.clear();
        self.symbols.clear();
        self.symbols_by_portal.clear();
        self.alive_players.clear();
        self.bot_returns.clear();
        self.kind = RoundKind::Plain;
        self.phase = RoundPhase::Idle;
        settlement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CRAFTABLE_ITEMS, ITEM_COMPONENTS, Item};
    use crate::game::{HookEvent, NpcDialog, RecordingHooks};
    use rand::SeedableRng;

    fn humans(count: u32) -> Players {
        (1..=count)
            .map(|id| {
                let mut player = Player::new(id, format!("player{id}"));
                player.rank = id;
                (player.id, player)
            })
            .collect()
    }

    fn max_copies(items: &[Item]) -> usize {
        items
            .iter()
            .map(|item| items.iter().filter(|&i| i == item).count())
            .max()
            .unwrap_or(0)
    }

    fn assert_claims_exclusive(game: &MiniGame) {
        let item_claimants: Vec<PlayerId> = game.items().values().filter_map(|i| i.avatar_id).collect();
        let unique: BTreeSet<PlayerId> = item_claimants.iter().copied().collect();
        assert_eq!(unique.len(), item_claimants.len());

        let portal_claimants: Vec<PlayerId> = game.portals().values().filter_map(|p| p.avatar_id).collect();
        let unique: BTreeSet<PlayerId> = portal_claimants.iter().copied().collect();
        assert_eq!(unique.len(), portal_claimants.len());

        for avatar in game.avatars().values() {
            if let Some(item_id) = avatar.item_id {
                assert_eq!(game.items()[&item_id].avatar_id, Some(avatar.id));
            }
        }
    }

    fn claim(game: &mut MiniGame, player: u32, body: BodyId, players: &mut Players, hooks: &mut RecordingHooks) -> ClaimOutcome {
        game.resolve_contact(Contact::new(BodyId::Avatar(PlayerId(player)), body), players, hooks)
    }

    #[test]
    fn test_round_kind_for_stage() {
        let config = CarouselConfig::default();
        assert_eq!(RoundKind::for_stage(10, &config), RoundKind::ItemCarousel);
        assert_eq!(RoundKind::for_stage(20, &config), RoundKind::PortalCarousel);
        assert_eq!(RoundKind::for_stage(7, &config), RoundKind::Plain);
    }

    #[test]
    fn test_entry_delay_rules() {
        let config = CarouselConfig::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut first = Player::new(1, "first");
        first.rank = 1;
        let mut last = Player::new(4, "last");
        last.rank = 4;

        // Last place gets in first, floored for item rounds
        let d = entry_delay(&mut rng, &config, &first, 4, 10, RoundKind::ItemCarousel, None);
        assert_eq!(d, 10.0);
        let d = entry_delay(&mut rng, &config, &last, 4, 10, RoundKind::ItemCarousel, None);
        assert_eq!(d, 5.0);
        // Early stage flat delay
        let d = entry_delay(&mut rng, &config, &first, 4, 4, RoundKind::ItemCarousel, None);
        assert_eq!(d, 5.0);
        // Portal rounds ignore rank
        let d = entry_delay(&mut rng, &config, &first, 4, 20, RoundKind::PortalCarousel, None);
        assert_eq!(d, 8.0);

        let mut bot = Player::bot(5, "bot");
        bot.rank = 4;
        let d = entry_delay(&mut rng, &config, &bot, 4, 20, RoundKind::PortalCarousel, None);
        assert!((9.0..14.0).contains(&d));
    }

    #[test]
    fn test_entry_delay_shop_lockout() {
        let config = CarouselConfig::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut poor = Player::new(1, "poor");
        poor.money = config.shop_cost - 1;
        let shop = Some(SpecialRule::KecleonsShop);
        let d = entry_delay(&mut rng, &config, &poor, 4, 10, RoundKind::ItemCarousel, shop);
        assert!(d.is_infinite());

        poor.money = config.shop_cost;
        let d = entry_delay(&mut rng, &config, &poor, 4, 10, RoundKind::ItemCarousel, shop);
        assert!(d.is_finite());
    }

    #[test]
    fn test_initialize_item_round() {
        let mut players = humans(4);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(10, CarouselConfig::default());
        assert_eq!(game.phase(), RoundPhase::Idle);
        game.initialize(&players, 10, None, &mut hooks);

        assert_eq!(game.phase(), RoundPhase::Running);
        assert_eq!(game.kind(), RoundKind::ItemCarousel);
        assert_eq!(game.avatars().len(), 4);
        assert!(game.portals().is_empty());
        let names: Vec<Item> = game.items().values().map(|i| i.name).collect();
        assert_eq!(names.len(), 7);
        assert!(names.iter().all(|n| ITEM_COMPONENTS.contains(n)));
        assert!(max_copies(&names) <= 2);

        // One body per avatar and item
        assert_eq!(game.arena().len(), 11);
        for avatar in game.avatars().values() {
            let body = game.arena().body(BodyId::Avatar(avatar.id)).unwrap();
            assert!(!body.collides);
            assert!(!body.sensor);
        }
        for item in game.items().values() {
            assert!(game.arena().body(BodyId::Item(item.id)).unwrap().sensor);
        }

        game.tick(SIM_DT, &mut players, &mut hooks);
        assert!(hooks.events.is_empty());
    }

    #[test]
    fn test_dead_players_sit_out() {
        let mut players = humans(3);
        players.get_mut(&PlayerId(2)).unwrap().alive = false;
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(3, CarouselConfig::default());
        game.initialize(&players, 7, None, &mut hooks);
        assert_eq!(game.kind(), RoundKind::Plain);
        assert_eq!(game.avatars().len(), 2);
        assert!(!game.avatars().contains_key(&PlayerId(2)));
        assert_eq!(game.arena().len(), 2);
    }

    #[test]
    fn test_item_round_end_to_end() {
        let mut players = humans(4);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(42, CarouselConfig::default());
        game.initialize(&players, 10, None, &mut hooks);
        assert_eq!(game.items().len(), 7);

        let item_ids: Vec<u32> = game.items().keys().copied().collect();
        let mut expected = BTreeMap::new();
        for (i, player) in (1..=4).enumerate() {
            let outcome = claim(&mut game, player, BodyId::Item(item_ids[i]), &mut players, &mut hooks);
            assert!(matches!(outcome, ClaimOutcome::ItemClaimed { .. }));
            expected.insert(PlayerId(player), game.items()[&item_ids[i]].name);
        }
        for _ in 0..30 {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        assert_claims_exclusive(&game);

        let settlement = game.stop(&mut players, &mut hooks);
        assert!(settlement.fallback_items.is_empty());
        for (id, name) in expected {
            assert_eq!(players[&id].items, vec![name]);
        }
        assert_eq!(game.phase(), RoundPhase::Idle);
        assert!(game.avatars().is_empty());
        assert!(game.items().is_empty());
        assert!(game.arena().is_empty());
    }

    #[test]
    fn test_fallback_items_are_distinct() {
        let mut players = humans(4);
        players.get_mut(&PlayerId(4)).unwrap().is_bot = true;
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(5, CarouselConfig::default());
        game.initialize(&players, 10, None, &mut hooks);
        let first_item = *game.items().keys().next().unwrap();
        claim(&mut game, 1, BodyId::Item(first_item), &mut players, &mut hooks);

        let settlement = game.stop(&mut players, &mut hooks);
        // Players 2 and 3 get leftovers, the bot does not
        assert_eq!(settlement.fallback_items.len(), 2);
        assert_ne!(settlement.fallback_items[0].1, settlement.fallback_items[1].1);
        assert!(settlement.fallback_items.iter().all(|&(_, id)| id != first_item));
        for id in 1..=3 {
            assert_eq!(players[&PlayerId(id)].items.len(), 1);
        }
        assert!(players[&PlayerId(4)].items.is_empty());
        // Humans who took no portal get the random sentinel
        assert_eq!(settlement.random_portals, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_shop_round_end_to_end() {
        let mut players = humans(2);
        let cost = CarouselConfig::default().shop_cost;
        players.get_mut(&PlayerId(1)).unwrap().money = cost - 1;
        players.get_mut(&PlayerId(2)).unwrap().money = cost + 5;
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(8, CarouselConfig::default());
        let shop = Some(SpecialRule::KecleonsShop);
        game.initialize(&players, 22, shop, &mut hooks);

        let names: Vec<Item> = game.items().values().map(|i| i.name).collect();
        assert_eq!(names.len(), 6);
        assert!(names.iter().all(|n| CRAFTABLE_ITEMS.contains(n)));
        assert!(max_copies(&names) <= 1);
        assert!(game.avatars()[&PlayerId(1)].timer.is_infinite());

        let item = *game.items().keys().next().unwrap();
        let outcome = claim(&mut game, 1, BodyId::Item(item), &mut players, &mut hooks);
        assert!(matches!(outcome, ClaimOutcome::CannotAfford { .. }));
        assert_eq!(players[&PlayerId(1)].money, cost - 1);
        assert_eq!(game.avatars()[&PlayerId(1)].item_id, None);
        assert_eq!(hooks.dialogs_for(PlayerId(1)), vec![NpcDialog::TellPrice]);

        players.get_mut(&PlayerId(1)).unwrap().money = cost + 3;
        let outcome = claim(&mut game, 1, BodyId::Item(item), &mut players, &mut hooks);
        assert!(matches!(outcome, ClaimOutcome::ItemClaimed { purchased: true, .. }));
        assert_eq!(players[&PlayerId(1)].money, 3);
        assert_eq!(hooks.dialogs_for(PlayerId(1)).last(), Some(&NpcDialog::ThankYou));

        // No free item under the shop rule
        let settlement = game.stop(&mut players, &mut hooks);
        assert!(settlement.fallback_items.is_empty());
        assert_eq!(players[&PlayerId(1)].items.len(), 1);
        assert!(players[&PlayerId(2)].items.is_empty());
        assert_eq!(players[&PlayerId(2)].money, cost + 5);
    }

    #[test]
    fn test_claim_through_physics() {
        let mut players = humans(1);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(11, CarouselConfig::default());
        game.initialize(&players, 10, None, &mut hooks);
        assert_eq!(game.items().len(), 5);

        let me = PlayerId(1);
        for _ in 0..(30.0 / SIM_DT) as usize {
            if game.avatars()[&me].item_id.is_some() {
                break;
            }
            // Chase the nearest free item
            let pos = game.avatars()[&me].pos;
            let target = game
                .items()
                .values()
                .filter(|i| i.avatar_id.is_none())
                .map(|i| i.pos)
                .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)))
                .unwrap();
            let d = target - pos;
            game.apply_vector(me, d.x, -d.y);
            game.tick(SIM_DT, &mut players, &mut hooks);
        }

        let item_id = game.avatars()[&me].item_id.expect("avatar reached an item");
        assert_eq!(game.items()[&item_id].avatar_id, Some(me));
        assert!(!game.arena().body(BodyId::Avatar(me)).unwrap().collides);

        // Item now rides along with the avatar
        let offset = game.items()[&item_id].pos - game.avatars()[&me].pos;
        game.apply_vector(me, 0.0, 100.0);
        for _ in 0..10 {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        let moved = game.items()[&item_id].pos - game.avatars()[&me].pos;
        assert!((moved - offset).length() < 1e-2);
        assert_claims_exclusive(&game);
    }

    #[test]
    fn test_portal_round_setup() {
        let mut players = humans(4);
        for player in players.values_mut() {
            player.synergies.insert(Synergy::Fire, 4);
        }
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(20, CarouselConfig::default());
        game.initialize(&players, 20, None, &mut hooks);

        assert_eq!(game.kind(), RoundKind::PortalCarousel);
        assert!(game.items().is_empty());
        assert_eq!(game.portals().len(), 5);
        assert_eq!(game.symbols().len(), 16);

        let maps: Vec<Dungeon> = game.portals().values().filter_map(|p| p.map).collect();
        assert_eq!(maps.len(), 5);
        let unique: BTreeSet<Dungeon> = maps.iter().copied().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(hooks.events, vec![HookEvent::PreloadMaps(maps)]);

        let mut per_portal: Vec<usize> = game.portals().keys().map(|&id| game.portal_synergies(id).len()).collect();
        per_portal.sort();
        assert_eq!(per_portal, vec![3, 3, 3, 3, 4]);

        // Nothing revealed yet
        assert_eq!(game.pending_reveals(), 16);
        assert!(game.symbols().values().all(|s| s.portal_id.is_none()));

        for _ in 0..(3.5 / SIM_DT) as usize {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        assert_eq!(game.pending_reveals(), 0);
        for (&portal_id, portal) in game.portals() {
            let attached: Vec<&SynergySymbol> =
                game.symbols().values().filter(|s| s.portal_id == Some(portal_id)).collect();
            assert_eq!(attached.len(), game.portal_synergies(portal_id).len());
            let mut slots: Vec<usize> = attached.iter().map(|s| s.index).collect();
            slots.sort();
            assert_eq!(slots, (0..attached.len()).collect::<Vec<_>>());
            for symbol in attached {
                let dist = symbol.pos.distance(portal.pos);
                assert!((dist - game.config().symbol_orbit_radius).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn test_free_items_spread_after_claims() {
        let mut players = humans(4);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(42, CarouselConfig::default());
        game.initialize(&players, 10, None, &mut hooks);
        assert_eq!(game.items().len(), 7);

        // Claim two items that are not neighbours on the orbit
        for (player, index) in [(1, 0), (2, 2)] {
            let item_id = game.items().values().find(|i| i.index == index).unwrap().id;
            claim(&mut game, player, BodyId::Item(item_id), &mut players, &mut hooks);
        }
        game.tick(SIM_DT, &mut players, &mut hooks);

        let free: Vec<Vec2> = game
            .items()
            .values()
            .filter(|i| i.avatar_id.is_none())
            .map(|i| i.pos)
            .collect();
        assert_eq!(free.len(), 5);
        for (i, a) in free.iter().enumerate() {
            assert!((a.distance(ARENA_CENTER) - game.config().carousel_radius).abs() < 1e-2);
            for b in &free[i + 1..] {
                assert!(a.distance(*b) > 2.0 * ITEM_RADIUS, "{a} and {b} overlap");
            }
        }
    }

    #[test]
    fn test_reveals_follow_shuffle_order() {
        let mut players = humans(4);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(20, CarouselConfig::default());
        game.initialize(&players, 20, None, &mut hooks);

        let reveals: Vec<Reveal> = game.reveals().iter().copied().collect();
        assert_eq!(reveals.len(), 16);
        assert_eq!(reveals[0].due, game.config().reveal_delay);
        assert!(reveals.windows(2).all(|w| w[0].due < w[1].due));
        let order: Vec<u32> = reveals.iter().map(|r| r.symbol_id).collect();

        for _ in 0..(1.6 / SIM_DT) as usize {
            game.tick(SIM_DT, &mut players, &mut hooks);
            // Whatever is attached is always a prefix of the shuffled order
            let attached: BTreeSet<u32> = game
                .symbols()
                .values()
                .filter(|s| s.portal_id.is_some())
                .map(|s| s.id)
                .collect();
            let prefix: BTreeSet<u32> = order[..attached.len()].iter().copied().collect();
            assert_eq!(attached, prefix);
        }

        let attached = game.symbols().values().filter(|s| s.portal_id.is_some()).count();
        assert!(attached > 0);
        assert!(attached < order.len());
        assert_eq!(game.pending_reveals(), order.len() - attached);
    }

    #[test]
    fn test_clock_restarts_each_round() {
        let mut players = humans(3);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(30, CarouselConfig::default());
        game.initialize(&players, 20, None, &mut hooks);
        for _ in 0..120 {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        assert!(game.time() > 1.9);
        game.stop(&mut players, &mut hooks);
        assert_eq!(game.time(), 0.0);

        game.initialize(&players, 13, None, &mut hooks);
        assert_eq!(game.time(), 0.0);
        let first = game.reveals().iter().next().unwrap();
        assert_eq!(first.due, game.config().reveal_delay);
    }

    #[test]
    fn test_rounds_share_one_stream() {
        let run = |seed| {
            let mut players = humans(4);
            let mut hooks = RecordingHooks::new();
            let mut game = MiniGame::new(seed, CarouselConfig::default());
            game.initialize(&players, 10, None, &mut hooks);
            game.stop(&mut players, &mut hooks);
            // The second round keeps drawing from the same generator
            game.initialize(&players, 10, None, &mut hooks);
            let names: Vec<Item> = game.items().values().map(|i| i.name).collect();
            (names, players[&PlayerId(1)].items.clone())
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn test_portal_round_settlement() {
        let mut players = humans(3);
        players.get_mut(&PlayerId(3)).unwrap().is_bot = true;
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(13, CarouselConfig::default());
        game.initialize(&players, 20, None, &mut hooks);

        let portal_id = *game.portals().keys().next().unwrap();
        let map = game.portals()[&portal_id].map;
        let synergies = game.portal_synergies(portal_id);
        let outcome = claim(&mut game, 1, BodyId::Portal(portal_id), &mut players, &mut hooks);
        assert!(matches!(outcome, ClaimOutcome::PortalClaimed { .. }));
        assert!(!game.arena().contains(BodyId::Avatar(PlayerId(1))));

        // A second portal does nothing for the same avatar
        let other = *game.portals().keys().nth(1).unwrap();
        assert_eq!(
            claim(&mut game, 1, BodyId::Portal(other), &mut players, &mut hooks),
            ClaimOutcome::Ignored
        );

        // Ticks keep going without the avatar's body
        for _ in 0..10 {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        hooks.events.clear();
        let settlement = game.stop(&mut players, &mut hooks);

        assert_eq!(players[&PlayerId(1)].map, map);
        assert_eq!(settlement.random_portals, vec![PlayerId(2)]);
        assert!(settlement.fallback_items.is_empty());
        assert!(players[&PlayerId(2)].map.is_none());

        assert!(hooks.events.contains(&HookEvent::RegionalPool(PlayerId(1))));
        assert!(hooks.events.contains(&HookEvent::UniquePropositions {
            player: PlayerId(1),
            stage_level: 20,
            synergies,
        }));
        for id in [2, 3] {
            assert!(hooks.events.contains(&HookEvent::UniquePropositions {
                player: PlayerId(id),
                stage_level: 20,
                synergies: Vec::new(),
            }));
        }
    }

    #[test]
    fn test_first_stage_skips_propositions() {
        let mut players = humans(2);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(0, CarouselConfig::default());
        game.initialize(&players, 0, None, &mut hooks);
        assert_eq!(game.kind(), RoundKind::PortalCarousel);
        hooks.events.clear();
        game.stop(&mut players, &mut hooks);
        assert!(
            !hooks
                .events
                .iter()
                .any(|e| matches!(e, HookEvent::UniquePropositions { .. }))
        );
    }

    #[test]
    fn test_stop_before_reveal() {
        let mut players = humans(3);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(21, CarouselConfig::default());
        game.initialize(&players, 13, None, &mut hooks);
        for _ in 0..30 {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        assert!(game.pending_reveals() > 0);

        game.stop(&mut players, &mut hooks);
        assert_eq!(game.pending_reveals(), 0);
        assert!(game.symbols().is_empty());
        assert!(game.portals().is_empty());

        // Later ticks never bring anything back
        for _ in 0..300 {
            game.tick(SIM_DT, &mut players, &mut hooks);
        }
        assert!(game.symbols().is_empty());
        assert!(game.arena().is_empty());
        assert_eq!(game.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_stop_is_safe_when_idle() {
        let mut players = humans(2);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(1, CarouselConfig::default());
        assert_eq!(game.stop(&mut players, &mut hooks), Settlement::default());

        game.initialize(&players, 10, None, &mut hooks);
        game.stop(&mut players, &mut hooks);
        assert_eq!(game.stop(&mut players, &mut hooks), Settlement::default());
        // Exactly one fallback each from the single settlement
        assert!(players.values().all(|p| p.items.len() == 1));
    }

    #[test]
    fn test_bots_play_item_round() {
        let mut players: Players = (1..=6)
            .map(|id| {
                let mut bot = Player::bot(id, format!("bot{id}"));
                bot.rank = id;
                (bot.id, bot)
            })
            .collect();
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(77, CarouselConfig::default());
        game.initialize(&players, 17, None, &mut hooks);
        for _ in 0..(25.0 / SIM_DT) as usize {
            game.tick(SIM_DT, &mut players, &mut hooks);
            assert_claims_exclusive(&game);
            for body in game.arena().ids() {
                let pos = game.arena().body(body).unwrap().pos;
                assert!(pos.cmpge(PLAYABLE_MIN).all() && pos.cmple(PLAYABLE_MAX).all());
            }
        }
        let settlement = game.stop(&mut players, &mut hooks);
        assert!(settlement.fallback_items.is_empty());
        assert!(settlement.random_portals.is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let players = humans(2);
        let mut hooks = RecordingHooks::new();
        let mut game = MiniGame::new(4, CarouselConfig::default());
        game.initialize(&players, 20, None, &mut hooks);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.avatars.len(), 2);
        assert_eq!(snapshot.portals.len(), 3);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("PortalCarousel"));
    }

    #[test]
    fn test_determinism() {
        let run = |seed| {
            let mut players = humans(4);
            let mut hooks = RecordingHooks::new();
            let mut game = MiniGame::new(seed, CarouselConfig::default());
            game.initialize(&players, 20, None, &mut hooks);
            for _ in 0..120 {
                game.tick(SIM_DT, &mut players, &mut hooks);
            }
            serde_json::to_string(&game.snapshot()).unwrap()
        };
        assert_eq!(run(99), run(99));
    }
}
