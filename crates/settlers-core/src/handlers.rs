//! Build and development-card reducers.
//!
//! Each command validates against `self`, applies the move to a clone and
//! returns the clone. Badges and scores are refreshed before returning.

use crate::board::{EdgeId, HexId, PlayerId, Resource, VertexId};
use crate::game::{GameError, GamePhase, GameState, TurnPhase};
use crate::player::{costs, DevelopmentCard, ResourceHand};
use crate::random::RandomSource;
use crate::validators::{self, BuildCost, Placement};
use tracing::debug;

/// Roads placed by a Road Building card
const ROAD_BUILDING_ROADS: usize = 2;

impl GameState {
    /// Build a road. During initial placement the road is free, must touch the
    /// settlement just placed, and hands the turn on in snake order.
    pub fn build_road(&self, player: PlayerId, edge: EdgeId) -> Result<GameState, GameError> {
        self.require_turn(player)?;

        match self.phase {
            GamePhase::InitialPlacement => {
                if self.initial_settlement.is_none() {
                    return Err(GameError::InvalidPhase);
                }
                validators::can_build_road(self, player, edge, BuildCost::Free)?;

                let mut next = self.clone();
                next.place_road(player, edge, BuildCost::Free)?;
                next.initial_settlement = None;
                next.check_longest_road(player);
                next.refresh_victory_points();
                debug!(player, %edge, round = self.initial_placement_round, "initial road placed");

                next.advance_initial_placement();
                Ok(next)
            }
            GamePhase::MainGame => {
                self.require_main_phase(player, TurnPhase::Actions)?;
                validators::can_build_road(self, player, edge, BuildCost::Paid)?;

                let mut next = self.clone();
                next.place_road(player, edge, BuildCost::Paid)?;
                next.check_longest_road(player);
                next.refresh_victory_points();
                debug!(player, %edge, "road built");
                Ok(next)
            }
            GamePhase::GameOver => Err(GameError::GameOver),
        }
    }

    /// Build a settlement. The second initial settlement collects one card
    /// from each adjacent producing hex.
    pub fn build_settlement(
        &self,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<GameState, GameError> {
        self.require_turn(player)?;

        match self.phase {
            GamePhase::InitialPlacement => {
                if self.initial_settlement.is_some() {
                    return Err(GameError::InvalidPhase);
                }
                validators::can_build_settlement(self, player, vertex, Placement::Initial)?;

                let mut next = self.clone();
                next.place_settlement(player, vertex, Placement::Initial)?;
                next.initial_settlement = Some(vertex);

                if next.initial_placement_round == 2 {
                    let starting = next.starting_resources(vertex)?;
                    next.player_mut(player)?.resources.add_hand(&starting);
                    debug!(player, cards = starting.total(), "starting resources granted");
                }

                next.refresh_victory_points();
                debug!(
                    player,
                    %vertex,
                    round = self.initial_placement_round,
                    "initial settlement placed"
                );
                Ok(next)
            }
            GamePhase::MainGame => {
                self.require_main_phase(player, TurnPhase::Actions)?;
                validators::can_build_settlement(self, player, vertex, Placement::Normal)?;

                let mut next = self.clone();
                next.place_settlement(player, vertex, Placement::Normal)?;
                // The new building may cut an opponent's road
                next.revalidate_longest_road();
                next.refresh_victory_points();
                debug!(player, %vertex, "settlement built");
                Ok(next)
            }
            GamePhase::GameOver => Err(GameError::GameOver),
        }
    }

    /// Upgrade one of the player's settlements; the settlement piece returns to stock
    pub fn build_city(&self, player: PlayerId, vertex: VertexId) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        validators::can_build_city(self, player, vertex)?;

        let mut next = self.clone();
        let p = next.player_mut(player)?;
        p.resources = p
            .resources
            .checked_sub(&costs::city())
            .ok_or(GameError::InsufficientResources)?;
        p.cities = p.cities.checked_sub(1).ok_or(GameError::NoPiecesRemaining)?;
        p.settlements += 1;
        next.board.upgrade_to_city(vertex, player);
        next.refresh_victory_points();

        debug!(player, %vertex, "city built");
        Ok(next)
    }

    /// Draw the top card of the pile. It joins the hand next turn.
    pub fn buy_dev_card(&self, player: PlayerId) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        validators::can_buy_dev_card(self, player)?;

        let mut next = self.clone();
        let card = next.dev_card_deck.pop().ok_or(GameError::EmptyDeck)?;
        let p = next.player_mut(player)?;
        p.resources = p
            .resources
            .checked_sub(&costs::development_card())
            .ok_or(GameError::InsufficientResources)?;
        p.dev_cards_bought_this_turn.push(card);
        next.refresh_victory_points();

        debug!(player, remaining = next.dev_card_deck.len(), "development card bought");
        Ok(next)
    }

    /// Play a knight: move the robber, optionally rob an adjacent player,
    /// and contest Largest Army. Allowed before or after rolling.
    pub fn play_knight(
        &self,
        player: PlayerId,
        hex: HexId,
        steal_from: Option<PlayerId>,
        rng: &mut impl RandomSource,
    ) -> Result<GameState, GameError> {
        self.require_turn(player)?;
        if self.phase != GamePhase::MainGame || self.turn_phase == TurnPhase::RobberActivation {
            return Err(GameError::InvalidPhase);
        }
        validators::can_play_dev_card(self, player, DevelopmentCard::Knight)?;
        self.validate_robber_move(player, hex, steal_from)?;

        let mut next = self.clone();
        next.spend_dev_card(player, DevelopmentCard::Knight)?;
        next.board.move_robber(hex);
        if let Some(victim) = steal_from {
            next.steal_random(player, victim, rng)?;
        }
        next.check_largest_army(player);
        next.refresh_victory_points();

        debug!(player, %hex, victim = ?steal_from, "knight played");
        Ok(next)
    }

    /// Take any two resources from the bank
    pub fn play_year_of_plenty(
        &self,
        player: PlayerId,
        first: Resource,
        second: Resource,
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        validators::can_play_dev_card(self, player, DevelopmentCard::YearOfPlenty)?;

        let mut next = self.clone();
        next.spend_dev_card(player, DevelopmentCard::YearOfPlenty)?;
        let p = next.player_mut(player)?;
        p.resources.add(first, 1);
        p.resources.add(second, 1);
        next.refresh_victory_points();

        debug!(player, %first, %second, "year of plenty played");
        Ok(next)
    }

    /// Collect every unit of `resource` held by the other players
    pub fn play_monopoly(
        &self,
        player: PlayerId,
        resource: Resource,
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        validators::can_play_dev_card(self, player, DevelopmentCard::Monopoly)?;

        let mut next = self.clone();
        next.spend_dev_card(player, DevelopmentCard::Monopoly)?;

        let mut collected = 0;
        for other in next.players.iter_mut().filter(|p| p.id != player) {
            collected += other.resources.get(resource);
            other.resources.set(resource, 0);
        }
        next.player_mut(player)?.resources.add(resource, collected);
        next.refresh_victory_points();

        debug!(player, %resource, collected, "monopoly played");
        Ok(next)
    }

    /// Build up to two free roads along `edges`, limited by the roads left in
    /// stock. Either every road is placed or none is.
    pub fn play_road_building(
        &self,
        player: PlayerId,
        edges: &[EdgeId],
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;
        validators::can_play_dev_card(self, player, DevelopmentCard::RoadBuilding)?;
        if edges.is_empty() {
            return Err(GameError::NoEdgesSupplied);
        }
        let stock = self.player(player)?.roads as usize;
        if stock == 0 {
            return Err(GameError::NoPiecesRemaining);
        }

        let mut next = self.clone();
        next.spend_dev_card(player, DevelopmentCard::RoadBuilding)?;
        let count = edges.len().min(ROAD_BUILDING_ROADS).min(stock);
        for edge in &edges[..count] {
            // Validated against the partial result so the second road may extend the first
            validators::can_build_road(&next, player, *edge, BuildCost::Free)?;
            next.place_road(player, *edge, BuildCost::Free)?;
        }
        next.check_longest_road(player);
        next.refresh_victory_points();

        debug!(player, roads = count, "road building played");
        Ok(next)
    }

    // ==================== Shared mutation steps ====================

    pub(crate) fn place_road(
        &mut self,
        player: PlayerId,
        edge: EdgeId,
        cost: BuildCost,
    ) -> Result<(), GameError> {
        let p = self.player_mut(player)?;
        if cost == BuildCost::Paid {
            p.resources = p
                .resources
                .checked_sub(&costs::road())
                .ok_or(GameError::InsufficientResources)?;
        }
        p.roads = p.roads.checked_sub(1).ok_or(GameError::NoPiecesRemaining)?;
        self.board.place_road(edge, player);
        Ok(())
    }

    fn place_settlement(
        &mut self,
        player: PlayerId,
        vertex: VertexId,
        placement: Placement,
    ) -> Result<(), GameError> {
        let p = self.player_mut(player)?;
        if placement == Placement::Normal {
            p.resources = p
                .resources
                .checked_sub(&costs::settlement())
                .ok_or(GameError::InsufficientResources)?;
        }
        p.settlements = p
            .settlements
            .checked_sub(1)
            .ok_or(GameError::NoPiecesRemaining)?;
        self.board.place_settlement(vertex, player);
        Ok(())
    }

    /// One card per producing hex around `vertex`
    fn starting_resources(&self, vertex: VertexId) -> Result<ResourceHand, GameError> {
        let mut hand = ResourceHand::new();
        for hex in &self.vertex(vertex)?.hexes {
            if let Some(resource) = self.hex(*hex)?.terrain.resource() {
                hand.add(resource, 1);
            }
        }
        Ok(hand)
    }

    fn spend_dev_card(&mut self, player: PlayerId, card: DevelopmentCard) -> Result<(), GameError> {
        let allow_fresh = self.rules.fresh_dev_cards_playable;
        if !self.player_mut(player)?.play_dev_card(card, allow_fresh) {
            return Err(GameError::NoSuchCard);
        }
        self.dev_card_played_this_turn = true;
        Ok(())
    }
}
