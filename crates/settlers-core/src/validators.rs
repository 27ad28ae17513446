//! Pure rule checks. Each validator answers "may this player do this now"
//! and never mutates state; the reducers call them before touching a copy.
//!
//! Turn and phase checks are done by the reducers. These functions cover
//! costs, piece stock and board geometry.

use crate::board::{Building, EdgeId, Harbor, PlayerId, Resource, VertexId};
use crate::game::{GameError, GamePhase, GameState};
use crate::player::{costs, DevelopmentCard, ResourceHand};

/// Whether a road is paid for with resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCost {
    Paid,
    /// Initial placement and Road Building
    Free,
}

/// Which settlement rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Free, and no road needed
    Initial,
    Normal,
}

pub fn can_build_road(
    state: &GameState,
    player: PlayerId,
    edge: EdgeId,
    cost: BuildCost,
) -> Result<(), GameError> {
    let p = state.player(player)?;
    let e = state.edge(edge)?;

    if cost == BuildCost::Paid && !p.resources.can_afford(&costs::road()) {
        return Err(GameError::InsufficientResources);
    }
    if p.roads == 0 {
        return Err(GameError::NoPiecesRemaining);
    }
    if e.road.is_some() {
        return Err(GameError::Occupied);
    }

    let connected = if state.phase == GamePhase::InitialPlacement {
        // Must hang off the settlement placed this turn
        state
            .pending_initial_settlement()
            .is_some_and(|v| e.vertices.contains(&v))
    } else {
        state.board.connects_to_network(edge, player)
    };
    if !connected {
        return Err(GameError::NotConnected);
    }
    Ok(())
}

pub fn can_build_settlement(
    state: &GameState,
    player: PlayerId,
    vertex: VertexId,
    placement: Placement,
) -> Result<(), GameError> {
    let p = state.player(player)?;
    let v = state.vertex(vertex)?;

    if placement == Placement::Normal && !p.resources.can_afford(&costs::settlement()) {
        return Err(GameError::InsufficientResources);
    }
    if p.settlements == 0 {
        return Err(GameError::NoPiecesRemaining);
    }
    if v.building.is_some() {
        return Err(GameError::Occupied);
    }
    if !state.board.satisfies_distance_rule(vertex) {
        return Err(GameError::DistanceRule);
    }
    if placement == Placement::Normal && !state.board.has_road_at(vertex, player) {
        return Err(GameError::NotConnected);
    }
    Ok(())
}

pub fn can_build_city(
    state: &GameState,
    player: PlayerId,
    vertex: VertexId,
) -> Result<(), GameError> {
    let p = state.player(player)?;
    let v = state.vertex(vertex)?;

    if !p.resources.can_afford(&costs::city()) {
        return Err(GameError::InsufficientResources);
    }
    if p.cities == 0 {
        return Err(GameError::NoPiecesRemaining);
    }
    if v.building != Some(Building::Settlement(player)) {
        return Err(GameError::NotYourSettlement);
    }
    Ok(())
}

pub fn can_buy_dev_card(state: &GameState, player: PlayerId) -> Result<(), GameError> {
    let p = state.player(player)?;
    if !p.resources.can_afford(&costs::development_card()) {
        return Err(GameError::InsufficientResources);
    }
    if state.dev_card_deck.is_empty() {
        return Err(GameError::EmptyDeck);
    }
    Ok(())
}

/// Card ownership and timing: one card per turn, none bought this turn
pub fn can_play_dev_card(
    state: &GameState,
    player: PlayerId,
    card: DevelopmentCard,
) -> Result<(), GameError> {
    let p = state.player(player)?;

    if !card.is_playable() {
        return Err(GameError::NoSuchCard);
    }
    if state.rules.one_dev_card_per_turn && state.dev_card_played_this_turn {
        return Err(GameError::DevCardAlreadyPlayed);
    }
    if p.has_dev_card(card) {
        return Ok(());
    }
    if p.has_fresh_dev_card(card) {
        if state.rules.fresh_dev_cards_playable {
            return Ok(());
        }
        return Err(GameError::CardNotYetPlayable);
    }
    Err(GameError::NoSuchCard)
}

/// Harbors reachable through the player's settlements and cities
pub fn player_ports(state: &GameState, player: PlayerId) -> Vec<Harbor> {
    state.board.player_harbors(player)
}

/// Bank exchange rate for giving up `resource`: 2 with a matching harbor,
/// 3 with a generic one, otherwise 4
pub fn trade_rate(state: &GameState, player: PlayerId, resource: Resource) -> u32 {
    player_ports(state, player)
        .iter()
        .filter(|h| match h {
            Harbor::Generic => true,
            Harbor::Specific(r) => *r == resource,
        })
        .map(|h| h.rate())
        .min()
        .unwrap_or(4)
}

/// Each offered amount must be a whole multiple of that resource's rate, and
/// the cards requested must match what the offer buys
pub fn can_trade_with_bank(
    state: &GameState,
    player: PlayerId,
    offer: &ResourceHand,
    receive: &ResourceHand,
) -> Result<(), GameError> {
    let p = state.player(player)?;

    if offer.is_empty() || receive.is_empty() {
        return Err(GameError::InvalidTrade);
    }
    if Resource::ALL
        .iter()
        .any(|r| offer.get(*r) > 0 && receive.get(*r) > 0)
    {
        return Err(GameError::InvalidTrade);
    }
    if !p.resources.can_afford(offer) {
        return Err(GameError::InsufficientResources);
    }

    let mut worth = 0;
    for (resource, amount) in offer.iter() {
        let rate = trade_rate(state, player, resource);
        if amount % rate != 0 {
            return Err(GameError::TradeRatio { resource, rate });
        }
        worth += amount / rate;
    }
    if worth != receive.total() {
        return Err(GameError::TradeValue {
            worth,
            requested: receive.total(),
        });
    }
    Ok(())
}

/// Empty vertices where the player could settle, ignoring cost: the distance
/// rule always applies, the road requirement only after initial placement
pub fn available_settlement_sites(state: &GameState, player: PlayerId) -> Vec<VertexId> {
    let initial = state.phase == GamePhase::InitialPlacement;
    state
        .board
        .vertices()
        .iter()
        .filter(|v| {
            v.building.is_none()
                && state.board.satisfies_distance_rule(v.id)
                && (initial || state.board.has_road_at(v.id, player))
        })
        .map(|v| v.id)
        .collect()
}

/// Empty edges where the player could build a road, ignoring cost
pub fn available_road_sites(state: &GameState, player: PlayerId) -> Vec<EdgeId> {
    state
        .board
        .edges()
        .iter()
        .filter(|e| e.road.is_none())
        .filter(|e| {
            if state.phase == GamePhase::InitialPlacement {
                state
                    .pending_initial_settlement()
                    .is_some_and(|v| e.vertices.contains(&v))
            } else {
                state.board.connects_to_network(e.id, player)
            }
        })
        .map(|e| e.id)
        .collect()
}
