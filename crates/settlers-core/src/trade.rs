//! Bank trades and peer trade offers.

use crate::board::{PlayerId, Resource};
use crate::game::{GameError, GamePhase, GameState, TurnPhase};
use crate::player::ResourceHand;
use crate::validators;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An open offer from the current player to the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    /// Player making the offer
    pub proposer: PlayerId,
    /// Resources being offered
    pub offering: ResourceHand,
    /// Resources requested in return
    pub requesting: ResourceHand,
}

impl GameState {
    /// Trade with the bank at the player's harbor rates
    pub fn trade_with_bank(
        &self,
        player: PlayerId,
        offer: &ResourceHand,
        receive: &ResourceHand,
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        validators::can_trade_with_bank(self, player, offer, receive)?;

        let mut next = self.clone();
        let p = next.player_mut(player)?;
        p.resources = p
            .resources
            .checked_sub(offer)
            .ok_or(GameError::InsufficientResources)?;
        p.resources.add_hand(receive);

        debug!(player, gave = offer.total(), got = receive.total(), "bank trade");
        Ok(next)
    }

    /// Offer a swap to the other players, replacing any earlier offer
    pub fn propose_trade(
        &self,
        player: PlayerId,
        offering: ResourceHand,
        requesting: ResourceHand,
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        if offering.is_empty() || requesting.is_empty() {
            return Err(GameError::InvalidTrade);
        }
        if Resource::ALL
            .iter()
            .any(|r| offering.get(*r) > 0 && requesting.get(*r) > 0)
        {
            return Err(GameError::InvalidTrade);
        }
        if !self.player(player)?.resources.can_afford(&offering) {
            return Err(GameError::InsufficientResources);
        }

        let mut next = self.clone();
        next.pending_trade = Some(TradeOffer {
            proposer: player,
            offering,
            requesting,
        });

        debug!(player, "trade proposed");
        Ok(next)
    }

    /// Accept the open offer; both sides must still hold their half
    pub fn accept_trade(&self, player: PlayerId) -> Result<GameState, GameError> {
        self.require_active()?;
        self.player(player)?;
        if self.phase != GamePhase::MainGame || self.turn_phase != TurnPhase::Actions {
            return Err(GameError::InvalidPhase);
        }
        let offer = self.pending_trade.as_ref().ok_or(GameError::NoActiveTrade)?;
        if offer.proposer == player {
            return Err(GameError::InvalidTrade);
        }

        let mut next = self.clone();
        let proposer = next.player_mut(offer.proposer)?;
        proposer.resources = proposer
            .resources
            .checked_sub(&offer.offering)
            .ok_or(GameError::InsufficientResources)?;
        proposer.resources.add_hand(&offer.requesting);

        let acceptor = next.player_mut(player)?;
        acceptor.resources = acceptor
            .resources
            .checked_sub(&offer.requesting)
            .ok_or(GameError::InsufficientResources)?;
        acceptor.resources.add_hand(&offer.offering);

        next.pending_trade = None;

        debug!(proposer = offer.proposer, acceptor = player, "trade accepted");
        Ok(next)
    }

    /// Withdraw or turn down the open offer
    pub fn decline_trade(&self, player: PlayerId) -> Result<GameState, GameError> {
        self.require_active()?;
        self.player(player)?;
        if self.pending_trade.is_none() {
            return Err(GameError::NoActiveTrade);
        }

        let mut next = self.clone();
        next.pending_trade = None;

        debug!(player, "trade declined");
        Ok(next)
    }
}
