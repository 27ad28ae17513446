//! Settlers - a rules engine for a Settlers-style hex board game
//!
//! This crate provides the authoritative game logic, including:
//! - Board graph of hexes, vertices, and edges with a randomized map generator
//! - Player state, resources, and development cards
//! - Pure validators and state-returning reducers for every move
//! - Robber, trading, and turn/phase state machine with scoring
//!
//! # Architecture
//!
//! The engine holds no global state. A host keeps the current [`GameState`]
//! and replaces it with the value each command returns; a rejected command
//! returns a [`GameError`] and leaves the old state as it was. All randomness
//! comes in through a [`RandomSource`], so games can be replayed from a seed
//! or scripted in tests.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates used while laying out the board
//! - [`board`]: Board graph tables and queries
//! - [`mapgen`]: Standard board generation, including harbors
//! - [`player`]: Player state and resources
//! - [`rules`]: Tunable rules and fixed constants
//! - [`random`]: Substitutable randomness
//! - [`scoring`]: Victory points, longest road, largest army, payouts
//! - [`validators`]: Pure rule checks and site queries
//! - [`handlers`]: Build and development-card commands
//! - [`robber`]: Discards, robber movement, theft
//! - [`trade`]: Bank and peer trading
//! - [`game`]: Game state machine
//! - [`actions`]: Action enum and dispatcher

pub mod actions;
pub mod board;
pub mod game;
pub mod handlers;
pub mod hex;
pub mod mapgen;
pub mod player;
pub mod random;
pub mod robber;
pub mod rules;
pub mod scoring;
pub mod trade;
pub mod validators;

// Re-export commonly used types
pub use actions::GameAction;
pub use board::{
    Board, Building, Edge, EdgeId, Harbor, Hex, HexId, PlayerId, Resource, Terrain, Vertex,
    VertexId,
};
pub use game::{ErrorKind, GameError, GamePhase, GameState, TurnPhase};
pub use hex::HexCoord;
pub use mapgen::generate_board;
pub use player::{costs, DevelopmentCard, Player, PlayerColor, PlayerKind, ResourceHand};
pub use random::{RandomSource, ScriptedRandom};
pub use robber::{discard_amount, needs_discard};
pub use rules::Rules;
pub use scoring::{distribute_resources, longest_road_length, victory_points};
pub use trade::TradeOffer;
pub use validators::{available_road_sites, available_settlement_sites};
