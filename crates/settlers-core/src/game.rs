//! Core game state machine.
//!
//! This module contains the `GameState` aggregate, the error taxonomy, and
//! the turn/phase transitions (initial placement, dice, end of turn, badges,
//! winner detection). Build, card, robber and trade commands live in their
//! own modules as further `impl GameState` blocks.
//!
//! Every command borrows the state immutably and returns a new one, so a
//! rejected command never leaves a partially updated state behind.

use crate::board::{Board, Edge, EdgeId, Hex, HexId, PlayerId, Resource, Vertex, VertexId};
use crate::player::{DevelopmentCard, Player};
use crate::random::RandomSource;
use crate::robber::needs_discard;
use crate::rules::{Rules, MAX_PLAYERS, MIN_PLAYERS, ROBBER_ROLL};
use crate::scoring;
use crate::trade::TradeOffer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Players place two settlements and roads each, in snake order
    InitialPlacement,
    /// Regular turns
    MainGame,
    /// A player reached the winning score; terminal
    GameOver,
}

/// Step within a main-game turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the current player to roll
    DiceRoll,
    /// A 7 was rolled: discards, then the robber must move
    RobberActivation,
    /// Build, trade, play cards, end turn
    Actions,
}

/// Broad classes of rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The move breaks a rule; state unchanged
    Rejected,
    /// A referenced player, hex, vertex or edge does not exist
    NotFound,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Cannot afford this")]
    InsufficientResources,

    #[error("No pieces remaining")]
    NoPiecesRemaining,

    #[error("Location is already occupied")]
    Occupied,

    #[error("Too close to another building")]
    DistanceRule,

    #[error("Not connected to your roads or buildings")]
    NotConnected,

    #[error("Only your own settlements can be upgraded")]
    NotYourSettlement,

    #[error("No development cards left in deck")]
    EmptyDeck,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("Cards bought this turn cannot be played yet")]
    CardNotYetPlayable,

    #[error("A development card was already played this turn")]
    DevCardAlreadyPlayed,

    #[error("No edges given for road building")]
    NoEdgesSupplied,

    #[error("The robber is already on that hex")]
    RobberAlreadyThere,

    #[error("Cannot steal from that player")]
    InvalidVictim,

    #[error("Must discard exactly {expected} cards, got {actual}")]
    InvalidDiscard { expected: u32, actual: u32 },

    #[error("Player does not need to discard")]
    DiscardNotRequired,

    #[error("Players still have to discard")]
    DiscardsPending,

    #[error("Invalid trade")]
    InvalidTrade,

    #[error("{resource} trades at {rate}:1")]
    TradeRatio { resource: Resource, rate: u32 },

    #[error("Offer buys {worth} cards from the bank but {requested} were requested")]
    TradeValue { worth: u32, requested: u32 },

    #[error("No active trade")]
    NoActiveTrade,

    #[error("Game is over")]
    GameOver,

    #[error("A game needs 2 to 4 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("Player at seat {index} has id {id}")]
    PlayerIdMismatch { index: usize, id: PlayerId },

    #[error("Malformed board: {0}")]
    MalformedBoard(String),

    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("Hex {0} not found")]
    HexNotFound(HexId),

    #[error("Vertex {0} not found")]
    VertexNotFound(VertexId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::PlayerNotFound(_)
            | GameError::HexNotFound(_)
            | GameError::VertexNotFound(_)
            | GameError::EdgeNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Rejected,
        }
    }
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current game phase
    pub phase: GamePhase,
    /// Step within the current turn (main game only)
    pub turn_phase: TurnPhase,
    /// Whose turn it is
    pub current_player: PlayerId,
    /// All players, indexed by id
    pub players: Vec<Player>,
    /// The game board
    pub board: Board,
    /// Development card draw pile; cards are drawn from the end
    pub dev_card_deck: Vec<DevelopmentCard>,
    /// Last dice roll
    pub dice_roll: Option<(u8, u8)>,
    pub longest_road_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    /// Turn number (0 during initial placement, then starts at 1)
    pub turn_number: u32,
    pub winner: Option<PlayerId>,
    /// 1 while placing forward, 2 while placing backward
    pub initial_placement_round: u8,
    /// Active peer trade offer
    pub pending_trade: Option<TradeOffer>,
    /// Players who still owe a discard after a 7
    pub pending_discards: Vec<PlayerId>,
    /// Whether a dev card has been played this turn
    pub dev_card_played_this_turn: bool,
    pub rules: Rules,
    /// Settlement placed in the current initial-placement turn, awaiting its road
    pub(crate) initial_settlement: Option<VertexId>,
}

impl GameState {
    /// Start a game with the default rules
    pub fn new(
        players: Vec<Player>,
        board: Board,
        rng: &mut impl RandomSource,
    ) -> Result<Self, GameError> {
        Self::with_rules(players, board, Rules::default(), rng)
    }

    /// Start a game: validates the seating and shuffles the development deck
    pub fn with_rules(
        players: Vec<Player>,
        board: Board,
        rules: Rules,
        rng: &mut impl RandomSource,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(GameError::InvalidPlayerCount(players.len()));
        }
        for (index, player) in players.iter().enumerate() {
            if player.id as usize != index {
                return Err(GameError::PlayerIdMismatch {
                    index,
                    id: player.id,
                });
            }
        }

        let mut dev_card_deck = DevelopmentCard::standard_deck();
        rng.shuffle(&mut dev_card_deck);

        info!(players = players.len(), "new game");

        Ok(Self {
            phase: GamePhase::InitialPlacement,
            turn_phase: TurnPhase::DiceRoll,
            current_player: 0,
            players,
            board,
            dev_card_deck,
            dice_roll: None,
            longest_road_holder: None,
            largest_army_holder: None,
            turn_number: 0,
            winner: None,
            initial_placement_round: 1,
            pending_trade: None,
            pending_discards: Vec::new(),
            dev_card_played_this_turn: false,
            rules,
            initial_settlement: None,
        })
    }

    /// Number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Settlement placed this initial-placement turn that still needs its road
    pub fn pending_initial_settlement(&self) -> Option<VertexId> {
        self.initial_settlement
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(id as usize)
            .ok_or(GameError::PlayerNotFound(id))
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::PlayerNotFound(id))
    }

    pub fn hex(&self, id: HexId) -> Result<&Hex, GameError> {
        self.board.hex(id).ok_or(GameError::HexNotFound(id))
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, GameError> {
        self.board.vertex(id).ok_or(GameError::VertexNotFound(id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GameError> {
        self.board.edge(id).ok_or(GameError::EdgeNotFound(id))
    }

    // ==================== Phase checks ====================

    pub(crate) fn require_active(&self) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    /// Checks shared by every command of the current player
    pub(crate) fn require_turn(&self, player: PlayerId) -> Result<(), GameError> {
        self.require_active()?;
        self.player(player)?;
        if self.current_player != player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    pub(crate) fn require_main_phase(
        &self,
        player: PlayerId,
        turn_phase: TurnPhase,
    ) -> Result<(), GameError> {
        self.require_turn(player)?;
        if self.phase != GamePhase::MainGame || self.turn_phase != turn_phase {
            return Err(GameError::InvalidPhase);
        }
        Ok(())
    }

    // ==================== Turn flow ====================

    /// Roll both dice. A 7 activates the robber and flags every player who
    /// must discard; any other sum pays out resources.
    pub fn roll_dice(
        &self,
        player: PlayerId,
        rng: &mut impl RandomSource,
    ) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::DiceRoll)?;

        let dice = (rng.roll_die(), rng.roll_die());
        let sum = dice.0 + dice.1;

        let mut next = self.clone();
        next.dice_roll = Some(dice);

        if sum == ROBBER_ROLL {
            next.pending_discards = next
                .players
                .iter()
                .filter(|p| needs_discard(p))
                .map(|p| p.id)
                .collect();
            next.turn_phase = TurnPhase::RobberActivation;
            debug!(player, sum, discards = ?next.pending_discards, "robber activated");
        } else {
            let payout = scoring::distribute_resources(&next, sum);
            for (owner, hand) in &payout {
                next.player_mut(*owner)?.resources.add_hand(hand);
            }
            next.turn_phase = TurnPhase::Actions;
            debug!(player, sum, receivers = payout.len(), "dice rolled");
        }

        Ok(next)
    }

    /// Finish the current player's turn. Scores are recomputed first; the
    /// first player (starting from the current one) at or above the winning
    /// score ends the game.
    pub fn end_turn(&self, player: PlayerId) -> Result<GameState, GameError> {
        self.require_main_phase(player, TurnPhase::Actions)?;

        let mut next = self.clone();
        next.refresh_victory_points();

        if let Some(winner) = next.find_winner() {
            next.winner = Some(winner);
            next.phase = GamePhase::GameOver;
            next.pending_trade = None;
            info!(
                winner,
                victory_points = next.players[winner as usize].victory_points,
                turn = next.turn_number,
                "game over"
            );
            return Ok(next);
        }

        next.player_mut(player)?.end_turn();
        next.pending_trade = None;
        next.dev_card_played_this_turn = false;
        next.current_player = (player + 1) % next.player_count() as PlayerId;
        next.turn_number += 1;
        next.turn_phase = TurnPhase::DiceRoll;

        debug!(player, next_player = next.current_player, turn = next.turn_number, "turn ended");
        Ok(next)
    }

    fn find_winner(&self) -> Option<PlayerId> {
        let count = self.player_count();
        (0..count)
            .map(|offset| &self.players[(self.current_player as usize + offset) % count])
            .find(|p| p.victory_points >= self.rules.victory_points_to_win)
            .map(|p| p.id)
    }

    /// Move to the next placement after an initial road, in snake order
    pub(crate) fn advance_initial_placement(&mut self) {
        let count = self.player_count() as PlayerId;
        let placed: u32 = self.players.iter().map(|p| p.settlements_built()).sum();

        if placed >= 2 * count as u32 {
            self.phase = GamePhase::MainGame;
            self.turn_phase = TurnPhase::DiceRoll;
            self.current_player = 0;
            self.turn_number = 1;
            info!("initial placement complete, main game begins");
        } else if self.initial_placement_round == 1 && placed >= count as u32 {
            // Same player opens round 2
            self.initial_placement_round = 2;
            debug!(player = self.current_player, "initial placement round 2");
        } else if self.initial_placement_round == 1 {
            self.current_player = (self.current_player + 1) % count;
        } else {
            self.current_player = self.current_player.checked_sub(1).unwrap_or(count - 1);
        }
    }

    // ==================== Derived state ====================

    /// Recompute every player's score from the board and their cards
    pub(crate) fn refresh_victory_points(&mut self) {
        let scores: Vec<u32> = self
            .players
            .iter()
            .map(|p| scoring::victory_points(p, self))
            .collect();
        for (player, score) in self.players.iter_mut().zip(scores) {
            player.victory_points = score;
        }
    }

    fn set_longest_road_holder(&mut self, holder: Option<PlayerId>) {
        if self.longest_road_holder == holder {
            return;
        }
        info!(previous = ?self.longest_road_holder, current = ?holder, "longest road changed");
        self.longest_road_holder = holder;
        for player in &mut self.players {
            player.has_longest_road = Some(player.id) == holder;
        }
    }

    fn set_largest_army_holder(&mut self, holder: Option<PlayerId>) {
        if self.largest_army_holder == holder {
            return;
        }
        info!(previous = ?self.largest_army_holder, current = ?holder, "largest army changed");
        self.largest_army_holder = holder;
        for player in &mut self.players {
            player.has_largest_army = Some(player.id) == holder;
        }
    }

    /// After `player` extends their roads: take the badge if they now lead outright
    pub(crate) fn check_longest_road(&mut self, player: PlayerId) {
        if self.longest_road_holder != Some(player)
            && scoring::qualifies_longest_road(self, player)
        {
            self.set_longest_road_holder(Some(player));
        }
    }

    /// After a road may have been cut: the holder keeps the badge while they
    /// meet the minimum and nobody is longer; otherwise it goes to the unique
    /// leader, or to nobody
    pub(crate) fn revalidate_longest_road(&mut self) {
        let lengths: Vec<u32> = self
            .players
            .iter()
            .map(|p| scoring::longest_road_length(self, p.id))
            .collect();
        let best = lengths.iter().copied().max().unwrap_or(0);

        if let Some(holder) = self.longest_road_holder {
            let own = lengths.get(holder as usize).copied().unwrap_or(0);
            if own >= self.rules.longest_road_min && own >= best {
                return;
            }
        }

        let leaders: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| lengths[p.id as usize] == best)
            .map(|p| p.id)
            .collect();
        let holder = match leaders.as_slice() {
            [only] if best >= self.rules.longest_road_min => Some(*only),
            _ => None,
        };
        self.set_longest_road_holder(holder);
    }

    /// After `player` plays a knight: take the badge if they now lead outright
    pub(crate) fn check_largest_army(&mut self, player: PlayerId) {
        if self.largest_army_holder != Some(player)
            && scoring::qualifies_largest_army(self, player)
        {
            self.set_largest_army_holder(Some(player));
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::mapgen::generate_board;
    use crate::player::{PlayerColor, PlayerKind, ResourceHand};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub fn players(count: u8) -> Vec<Player> {
        (0..count)
            .map(|id| {
                Player::new(
                    id,
                    format!("Player {}", id + 1),
                    PlayerColor::for_player(id),
                    PlayerKind::Human,
                )
            })
            .collect()
    }

    pub fn new_game(count: u8) -> GameState {
        let mut rng = StdRng::seed_from_u64(17);
        let board = generate_board(&mut rng);
        GameState::new(players(count), board, &mut rng).unwrap()
    }

    /// A game in the action step of player 0's first turn, with an empty board
    pub fn main_game(count: u8) -> GameState {
        let mut state = new_game(count);
        state.phase = GamePhase::MainGame;
        state.turn_phase = TurnPhase::Actions;
        state.turn_number = 1;
        state
    }

    /// The central hex, whose corners all have three edges
    pub fn center_hex(state: &GameState) -> Hex {
        state.board.hexes()[9].clone()
    }

    pub fn give(state: &mut GameState, player: PlayerId, hand: ResourceHand) {
        state.players[player as usize].resources.add_hand(&hand);
    }

    pub fn settle(state: &mut GameState, player: PlayerId, vertex: VertexId) {
        state.board.place_settlement(vertex, player);
        state.players[player as usize].settlements -= 1;
    }

    pub fn road(state: &mut GameState, player: PlayerId, edge: EdgeId) {
        state.board.place_road(edge, player);
        state.players[player as usize].roads -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::player::ResourceHand;
    use crate::random::ScriptedRandom;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_game_starts_in_initial_placement() {
        let game = new_game(4);
        assert_eq!(game.phase, GamePhase::InitialPlacement);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.initial_placement_round, 1);
        assert_eq!(game.turn_number, 0);
        assert_eq!(game.dev_card_deck.len(), 25);
        assert!(game.winner.is_none());
    }

    #[test]
    fn test_player_count_limits() {
        let mut rng = ScriptedRandom::new();
        let board = crate::mapgen::generate_board(&mut rng);
        let err = GameState::new(players(1), board.clone(), &mut rng).unwrap_err();
        assert_eq!(err, GameError::InvalidPlayerCount(1));
        assert!(GameState::new(players(5), board.clone(), &mut rng).is_err());

        let mut seats = players(3);
        seats.swap(0, 1);
        let err = GameState::new(seats, board, &mut rng).unwrap_err();
        assert_eq!(err, GameError::PlayerIdMismatch { index: 0, id: 1 });
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(GameError::VertexNotFound(VertexId(99)).kind(), ErrorKind::NotFound);
        assert_eq!(GameError::PlayerNotFound(7).kind(), ErrorKind::NotFound);
        assert_eq!(GameError::DistanceRule.kind(), ErrorKind::Rejected);
        assert_eq!(
            GameError::InvalidDiscard { expected: 4, actual: 3 }.to_string(),
            "Must discard exactly 4 cards, got 3"
        );
        assert_eq!(GameError::EdgeNotFound(EdgeId(80)).to_string(), "Edge e80 not found");
    }

    #[test]
    fn test_roll_pays_out() {
        let mut game = main_game(2);
        game.turn_phase = TurnPhase::DiceRoll;

        let hex = game
            .board
            .hexes()
            .iter()
            .find(|h| h.number == Some(8))
            .unwrap()
            .clone();
        let resource = hex.terrain.resource().unwrap();
        settle(&mut game, 1, hex.vertices[0]);

        let mut rng = ScriptedRandom::new().with_dice([5, 3]);
        let next = game.roll_dice(0, &mut rng).unwrap();

        assert_eq!(next.dice_roll, Some((5, 3)));
        assert_eq!(next.turn_phase, TurnPhase::Actions);
        assert!(next.players[1].resources.get(resource) >= 1);
        assert!(next.pending_discards.is_empty());
    }

    #[test]
    fn test_roll_seven_flags_discards() {
        let mut game = main_game(3);
        game.turn_phase = TurnPhase::DiceRoll;
        give(&mut game, 1, ResourceHand::with_amounts(2, 2, 2, 2, 1));
        give(&mut game, 2, ResourceHand::with_amounts(2, 2, 2, 1, 0));

        let mut rng = ScriptedRandom::new().with_dice([6, 1]);
        let next = game.roll_dice(0, &mut rng).unwrap();

        assert_eq!(next.turn_phase, TurnPhase::RobberActivation);
        assert_eq!(next.pending_discards, vec![1]);
        assert_eq!(next.players[1].resources.total(), 9);
    }

    #[test]
    fn test_roll_rejections() {
        let mut game = main_game(2);
        let mut rng = ScriptedRandom::new();

        // Already rolled
        assert_eq!(game.roll_dice(0, &mut rng).unwrap_err(), GameError::InvalidPhase);

        game.turn_phase = TurnPhase::DiceRoll;
        assert_eq!(game.roll_dice(1, &mut rng).unwrap_err(), GameError::NotYourTurn);
        assert_eq!(game.roll_dice(9, &mut rng).unwrap_err(), GameError::PlayerNotFound(9));
    }

    #[test]
    fn test_end_turn_advances() {
        let mut game = main_game(3);
        game.players[0].dev_cards_bought_this_turn.push(DevelopmentCard::Knight);
        game.dev_card_played_this_turn = true;

        let next = game.end_turn(0).unwrap();
        assert_eq!(next.current_player, 1);
        assert_eq!(next.turn_number, 2);
        assert_eq!(next.turn_phase, TurnPhase::DiceRoll);
        assert!(!next.dev_card_played_this_turn);
        assert_eq!(next.players[0].dev_cards, vec![DevelopmentCard::Knight]);

        // Wraps around
        let mut last = main_game(3);
        last.current_player = 2;
        assert_eq!(last.end_turn(2).unwrap().current_player, 0);
    }

    #[test]
    fn test_end_turn_detects_winner() {
        let mut game = main_game(2);
        let vertices: Vec<VertexId> = game.board.vertices().iter().map(|v| v.id).collect();
        // Five cities on scattered corners: 10 points
        for vertex in vertices.iter().step_by(11).take(5) {
            game.board.upgrade_to_city(*vertex, 1);
        }

        let next = game.end_turn(0).unwrap();
        assert_eq!(next.phase, GamePhase::GameOver);
        assert_eq!(next.winner, Some(1));
        assert_eq!(next.players[1].victory_points, 10);

        assert_eq!(next.end_turn(0).unwrap_err(), GameError::GameOver);
        let mut rng = ScriptedRandom::new();
        assert_eq!(next.roll_dice(0, &mut rng).unwrap_err(), GameError::GameOver);
    }

    #[test]
    fn test_custom_winning_score() {
        let mut game = main_game(2);
        game.rules.victory_points_to_win = 2;
        game.board.upgrade_to_city(VertexId(0), 0);

        let next = game.end_turn(0).unwrap();
        assert_eq!(next.winner, Some(0));
    }

    #[test]
    fn test_revalidate_longest_road_cut() {
        let mut game = main_game(2);
        let hex = center_hex(&game);
        for edge in &hex.edges[0..5] {
            road(&mut game, 0, *edge);
        }
        game.check_longest_road(0);
        assert_eq!(game.longest_road_holder, Some(0));

        // Opponent splits the road in the middle
        settle(&mut game, 1, hex.vertices[2]);
        game.revalidate_longest_road();
        assert_eq!(game.longest_road_holder, None);
        assert!(!game.players[0].has_longest_road);
    }

    #[test]
    fn test_revalidate_longest_road_passes_to_new_leader() {
        let mut game = main_game(2);
        let center = center_hex(&game);
        for edge in &center.edges[0..5] {
            road(&mut game, 0, *edge);
        }
        game.check_longest_road(0);

        let far = game.board.hexes()[0].clone();
        for edge in &far.edges[0..5] {
            road(&mut game, 1, *edge);
        }
        game.check_longest_road(1);
        assert_eq!(game.longest_road_holder, Some(0), "a tie does not move the badge");

        // Cutting player 0's road to 3 leaves player 1 alone in front
        settle(&mut game, 1, center.vertices[2]);
        game.revalidate_longest_road();
        assert_eq!(game.longest_road_holder, Some(1));
        assert!(!game.players[0].has_longest_road);
        assert!(game.players[1].has_longest_road);
    }
}
