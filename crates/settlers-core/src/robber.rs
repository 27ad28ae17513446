//! Robber subsystem: discards after a 7, relocation, victim eligibility and theft.

use crate::board::{HexId, PlayerId, Resource};
use crate::game::{GameError, GamePhase, GameState, TurnPhase};
use crate::player::{Player, ResourceHand};
use crate::random::RandomSource;
use crate::rules::DISCARD_THRESHOLD;
use tracing::debug;

/// Whether the player must discard on a robber roll
pub fn needs_discard(player: &Player) -> bool {
    player.resources.total() > DISCARD_THRESHOLD
}

/// Cards the player must give up: half their hand, rounded down
pub fn discard_amount(player: &Player) -> u32 {
    player.resources.total() / 2
}

impl GameState {
    /// Discard half a hand after a 7. Any flagged player may submit, whoever's turn it is.
    pub fn discard_resources(
        &self,
        player: PlayerId,
        discard: &ResourceHand,
    ) -> Result<GameState, GameError> {
        self.require_active()?;
        let p = self.player(player)?;
        if self.phase != GamePhase::MainGame || self.turn_phase != TurnPhase::RobberActivation {
            return Err(GameError::InvalidPhase);
        }
        if !self.pending_discards.contains(&player) {
            return Err(GameError::DiscardNotRequired);
        }

        let expected = discard_amount(p);
        if discard.total() != expected {
            return Err(GameError::InvalidDiscard {
                expected,
                actual: discard.total(),
            });
        }
        if !p.resources.can_afford(discard) {
            return Err(GameError::InsufficientResources);
        }

        let mut next = self.clone();
        let p = next.player_mut(player)?;
        p.resources = p.resources.saturating_sub(discard);
        next.pending_discards.retain(|id| *id != player);

        debug!(player, discarded = expected, waiting = next.pending_discards.len(), "discarded");
        Ok(next)
    }

    /// Move the robber after a 7 and optionally rob a player on the new hex.
    /// Waits until every flagged player has discarded.
    pub fn move_robber(
        &self,
        player: PlayerId,
        hex: HexId,
        steal_from: Option<PlayerId>,
        rng: &mut impl RandomSource,
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::RobberActivation)?;
        if !self.pending_discards.is_empty() {
            return Err(GameError::DiscardsPending);
        }
        self.validate_robber_move(player, hex, steal_from)?;

        let mut next = self.clone();
        next.board.move_robber(hex);
        let stolen = match steal_from {
            Some(victim) => next.steal_random(player, victim, rng)?,
            None => None,
        };
        next.turn_phase = TurnPhase::Actions;

        debug!(player, %hex, victim = ?steal_from, stolen = ?stolen, "robber moved");
        Ok(next)
    }

    /// Players other than `excluding` with a building on the hex and at least one card
    pub fn eligible_robber_victims(&self, hex: HexId, excluding: PlayerId) -> Vec<PlayerId> {
        self.board
            .players_adjacent_to_hex(hex)
            .into_iter()
            .filter(|id| *id != excluding)
            .filter(|id| self.player(*id).is_ok_and(|p| !p.resources.is_empty()))
            .collect()
    }

    /// Target must be a different hex; a named victim must be eligible there
    pub(crate) fn validate_robber_move(
        &self,
        player: PlayerId,
        hex: HexId,
        steal_from: Option<PlayerId>,
    ) -> Result<(), GameError> {
        if self.hex(hex)?.has_robber {
            return Err(GameError::RobberAlreadyThere);
        }
        if let Some(victim) = steal_from {
            self.player(victim)?;
            if !self.eligible_robber_victims(hex, player).contains(&victim) {
                return Err(GameError::InvalidVictim);
            }
        }
        Ok(())
    }

    /// Move one card, chosen uniformly over the victim's whole hand, to the thief
    pub(crate) fn steal_random(
        &mut self,
        thief: PlayerId,
        victim: PlayerId,
        rng: &mut impl RandomSource,
    ) -> Result<Option<Resource>, GameError> {
        let hand = self.player(victim)?.resources;
        if hand.is_empty() {
            return Ok(None);
        }

        let index = rng.pick(hand.total() as usize) as u32;
        let Some(resource) = hand.nth_card(index) else {
            return Ok(None);
        };

        let victim_hand = &mut self.player_mut(victim)?.resources;
        *victim_hand = victim_hand
            .checked_sub(&ResourceHand::single(resource, 1))
            .ok_or(GameError::InsufficientResources)?;
        self.player_mut(thief)?.resources.add(resource, 1);
        Ok(Some(resource))
    }
}
