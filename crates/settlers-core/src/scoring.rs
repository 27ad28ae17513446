//! Derived-state calculators: victory points, longest road, largest army and
//! dice payouts. Everything here is a pure function of the game state and is
//! recomputed from scratch on every call.

use crate::board::{Board, PlayerId, VertexId};
use crate::game::GameState;
use crate::player::{Player, ResourceHand};
use std::collections::BTreeMap;

/// Total victory points: buildings on the board, badges and VP cards held
pub fn victory_points(player: &Player, state: &GameState) -> u32 {
    let buildings: u32 = state
        .board
        .buildings_of(player.id)
        .map(|(_, building)| building.victory_points())
        .sum();

    let mut vp = buildings + player.victory_point_cards();
    if player.has_longest_road {
        vp += 2;
    }
    if player.has_largest_army {
        vp += 2;
    }
    vp
}

/// Length in edges of the player's longest road.
///
/// A path may pass through a vertex only if it is empty or holds one of the
/// player's own buildings, and may not reuse an edge. Every vertex touched by
/// the player's roads is tried as a starting point.
pub fn longest_road_length(state: &GameState, player: PlayerId) -> u32 {
    road_length_on(&state.board, player)
}

fn road_length_on(board: &Board, player: PlayerId) -> u32 {
    let mut starts: Vec<VertexId> = board
        .roads_of(player)
        .filter_map(|edge| board.edge(edge))
        .flat_map(|edge| edge.vertices)
        .collect();
    starts.sort_unstable();
    starts.dedup();

    let mut visited = vec![false; board.edges().len()];
    starts
        .into_iter()
        .map(|start| walk(board, player, start, &mut visited))
        .max()
        .unwrap_or(0)
}

/// Longest continuation from `from` over unvisited roads of `player`
fn walk(board: &Board, player: PlayerId, from: VertexId, visited: &mut [bool]) -> u32 {
    let Some(vertex) = board.vertex(from) else {
        return 0;
    };

    let mut best = 0;
    for edge_id in &vertex.edges {
        let index = edge_id.index();
        if visited[index] || board.road_owner(*edge_id) != Some(player) {
            continue;
        }
        let Some(far) = board.edge(*edge_id).and_then(|e| e.other_end(from)) else {
            continue;
        };

        visited[index] = true;
        // An opponent's building ends the road at `far`
        let blocked = board
            .building_at(far)
            .is_some_and(|b| b.owner() != player);
        let onward = if blocked {
            0
        } else {
            walk(board, player, far, visited)
        };
        visited[index] = false;

        best = best.max(1 + onward);
    }
    best
}

/// Whether `player` meets the minimum and is strictly longer than everyone else
pub fn qualifies_longest_road(state: &GameState, player: PlayerId) -> bool {
    let own = longest_road_length(state, player);
    own >= state.rules.longest_road_min
        && state
            .players
            .iter()
            .filter(|p| p.id != player)
            .all(|p| longest_road_length(state, p.id) < own)
}

/// Whether `player` meets the minimum knights and has strictly more than everyone else
pub fn qualifies_largest_army(state: &GameState, player: PlayerId) -> bool {
    let Ok(own) = state.player(player).map(|p| p.knights_played) else {
        return false;
    };
    own >= state.rules.largest_army_min
        && state
            .players
            .iter()
            .filter(|p| p.id != player)
            .all(|p| p.knights_played < own)
}

/// Resources each player earns for a dice sum. Hexes under the robber
/// produce nothing; cities earn double.
pub fn distribute_resources(state: &GameState, sum: u8) -> BTreeMap<PlayerId, ResourceHand> {
    let mut payout: BTreeMap<PlayerId, ResourceHand> = BTreeMap::new();

    for hex in state.board.hexes().iter().filter(|h| h.produces_on(sum)) {
        let Some(resource) = hex.terrain.resource() else {
            continue;
        };
        for vertex in hex.vertices {
            if let Some(building) = state.board.building_at(vertex) {
                payout
                    .entry(building.owner())
                    .or_default()
                    .add(resource, building.resource_multiplier());
            }
        }
    }

    payout
}
