//! Claim resolution for arena contacts
//!
//! An avatar touching a free item picks it up; an avatar touching a free
//! portal goes through it. Both transitions are guarded on the claim fields
//! of both sides, so replaying a contact after a claim changes nothing.

use std::collections::BTreeMap;

use glam::Vec2;

use super::arena::{Arena, BodyId, Contact};
use super::state::{Avatar, FloatingItem, Portal, PortalClaim};
use crate::game::{GameHooks, Npc, NpcDialog, PlayerId, Players};

/// What a contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Not a claimable pair, already claimed, or entity gone
    Ignored,
    /// Shop rule: the player is short on money, nothing changed
    CannotAfford { avatar: PlayerId, item: u32 },
    ItemClaimed { avatar: PlayerId, item: u32, purchased: bool },
    PortalClaimed { avatar: PlayerId, portal: u32 },
}

/// Limited write access to a running round
///
/// May flip claim fields, link bodies, toggle collision and remove bodies.
/// Never adds or removes entities.
pub struct Resolver<'a> {
    pub arena: &'a mut Arena,
    pub avatars: &'a mut BTreeMap<PlayerId, Avatar>,
    pub items: &'a mut BTreeMap<u32, FloatingItem>,
    pub portals: &'a mut BTreeMap<u32, Portal>,
    /// Where each bot walks back to after picking an item
    pub bot_returns: &'a BTreeMap<PlayerId, Vec2>,
    /// Price per item when the shop rule is active
    pub shop_cost: Option<u32>,
}

impl Resolver<'_> {
    /// Apply one contact
    pub fn resolve<H: GameHooks + ?Sized>(&mut self, contact: Contact, players: &mut Players, hooks: &mut H) -> ClaimOutcome {
        match (contact.a, contact.b) {
            (BodyId::Avatar(avatar), BodyId::Item(item)) | (BodyId::Item(item), BodyId::Avatar(avatar)) => {
                self.avatar_meets_item(avatar, item, players, hooks)
            }
            (BodyId::Avatar(avatar), BodyId::Portal(portal)) | (BodyId::Portal(portal), BodyId::Avatar(avatar)) => {
                self.avatar_meets_portal(avatar, portal)
            }
            _ => ClaimOutcome::Ignored,
        }
    }

    fn avatar_meets_item<H: GameHooks + ?Sized>(
        &mut self,
        avatar_id: PlayerId,
        item_id: u32,
        players: &mut Players,
        hooks: &mut H,
    ) -> ClaimOutcome {
        let (Some(avatar), Some(item)) = (self.avatars.get_mut(&avatar_id), self.items.get_mut(&item_id)) else {
            return ClaimOutcome::Ignored;
        };
        if avatar.item_id.is_some() || item.avatar_id.is_some() {
            return ClaimOutcome::Ignored;
        }

        let purchased = if let Some(cost) = self.shop_cost {
            let money = players.get(&avatar_id).map_or(0, |p| p.money);
            if money < cost {
                hooks.send_npc_dialog(avatar_id, Npc::Kecleon, NpcDialog::TellPrice);
                log::debug!("Player {:?} cannot afford item {} ({} < {})", avatar_id, item_id, money, cost);
                return ClaimOutcome::CannotAfford {
                    avatar: avatar_id,
                    item: item_id,
                };
            }
            hooks.send_npc_dialog(avatar_id, Npc::Kecleon, NpcDialog::ThankYou);
            if let Some(player) = players.get_mut(&avatar_id) {
                player.money -= cost;
            }
            true
        } else {
            false
        };

        let avatar_body = BodyId::Avatar(avatar_id);
        let item_body = BodyId::Item(item_id);
        self.arena.link(avatar_body, item_body);
        avatar.item_id = Some(item_id);
        item.avatar_id = Some(avatar_id);
        self.arena.set_collides(item_body, false);
        self.arena.set_collides(avatar_body, false);

        // Bots leave the pickup area once served
        if let Some(&home) = self.bot_returns.get(&avatar_id) {
            avatar.target = home;
        }

        log::debug!("Player {:?} took item {} ({:?})", avatar_id, item_id, item.name);
        ClaimOutcome::ItemClaimed {
            avatar: avatar_id,
            item: item_id,
            purchased,
        }
    }

    fn avatar_meets_portal(&mut self, avatar_id: PlayerId, portal_id: u32) -> ClaimOutcome {
        let (Some(avatar), Some(portal)) = (self.avatars.get_mut(&avatar_id), self.portals.get_mut(&portal_id)) else {
            return ClaimOutcome::Ignored;
        };
        if avatar.portal_id.is_some() || portal.avatar_id.is_some() {
            return ClaimOutcome::Ignored;
        }

        portal.avatar_id = Some(avatar_id);
        avatar.portal_id = Some(PortalClaim::Portal(portal_id));
        // Going through a portal ends the avatar's run in the arena
        self.arena.remove(BodyId::Avatar(avatar_id));
        self.arena.remove(BodyId::Portal(portal_id));

        log::debug!("Player {:?} took portal {} to {:?}", avatar_id, portal_id, portal.map);
        ClaimOutcome::PortalClaimed {
            avatar: avatar_id,
            portal: portal_id,
        }
    }
}
