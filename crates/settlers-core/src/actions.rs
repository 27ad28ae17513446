//! Game actions and the single entry point that routes them.
//!
//! Hosts that store a "current state" can feed every move through
//! [`GameState::apply`] instead of calling the individual commands.

use crate::board::{EdgeId, HexId, PlayerId, Resource, VertexId};
use crate::game::{GameError, GamePhase, GameState, TurnPhase};
use crate::player::{DevelopmentCard, ResourceHand};
use crate::random::RandomSource;
use crate::robber::discard_amount;
use crate::validators::{self, BuildCost, Placement};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Building ====================
    /// Build a road (free during initial placement)
    BuildRoad(EdgeId),
    /// Build a settlement (free during initial placement)
    BuildSettlement(VertexId),
    /// Upgrade settlement to city
    BuildCity(VertexId),

    // ==================== Turn flow ====================
    /// Roll the dice at start of turn
    RollDice,
    /// End the current turn
    EndTurn,

    // ==================== Robber ====================
    /// Discard half a hand after a 7
    Discard(ResourceHand),
    /// Move robber after a 7 and optionally steal
    MoveRobber {
        hex: HexId,
        steal_from: Option<PlayerId>,
    },

    // ==================== Development Cards ====================
    /// Buy a development card
    BuyDevCard,
    /// Play Knight card
    PlayKnight {
        hex: HexId,
        steal_from: Option<PlayerId>,
    },
    /// Play Road Building card
    PlayRoadBuilding(Vec<EdgeId>),
    /// Play Year of Plenty card
    PlayYearOfPlenty(Resource, Resource),
    /// Play Monopoly card
    PlayMonopoly(Resource),

    // ==================== Trading ====================
    /// Trade with the bank at the best available rate
    TradeWithBank {
        offer: ResourceHand,
        receive: ResourceHand,
    },
    /// Propose a trade to other players
    ProposeTrade {
        offering: ResourceHand,
        requesting: ResourceHand,
    },
    /// Accept the open trade offer
    AcceptTrade,
    /// Decline or withdraw the open trade offer
    DeclineTrade,
}

impl GameState {
    /// Apply an action on behalf of `player`
    pub fn apply(
        &self,
        player: PlayerId,
        action: &GameAction,
        rng: &mut impl RandomSource,
    ) -> Result<GameState, GameError> {
        let result = match action {
            GameAction::BuildRoad(edge) => self.build_road(player, *edge),
            GameAction::BuildSettlement(vertex) => self.build_settlement(player, *vertex),
            GameAction::BuildCity(vertex) => self.build_city(player, *vertex),
            GameAction::RollDice => self.roll_dice(player, rng),
            GameAction::EndTurn => self.end_turn(player),
            GameAction::Discard(hand) => self.discard_resources(player, hand),
            GameAction::MoveRobber { hex, steal_from } => {
                self.move_robber(player, *hex, *steal_from, rng)
            }
            GameAction::BuyDevCard => self.buy_dev_card(player),
            GameAction::PlayKnight { hex, steal_from } => {
                self.play_knight(player, *hex, *steal_from, rng)
            }
            GameAction::PlayRoadBuilding(edges) => self.play_road_building(player, edges),
            GameAction::PlayYearOfPlenty(first, second) => {
                self.play_year_of_plenty(player, *first, *second)
            }
            GameAction::PlayMonopoly(resource) => self.play_monopoly(player, *resource),
            GameAction::TradeWithBank { offer, receive } => {
                self.trade_with_bank(player, offer, receive)
            }
            GameAction::ProposeTrade {
                offering,
                requesting,
            } => self.propose_trade(player, *offering, *requesting),
            GameAction::AcceptTrade => self.accept_trade(player),
            GameAction::DeclineTrade => self.decline_trade(player),
        };

        if let Err(err) = &result {
            debug!(player, ?action, error = %err, "action rejected");
        }
        result
    }

    /// Actions `player` may take right now. Every returned action passes
    /// validation; choices with many combinations (discards, trades, road
    /// building) are represented by a single reasonable instance.
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let Ok(p) = self.player(player) else {
            return actions;
        };

        match self.phase {
            GamePhase::GameOver => {
                // No actions when game is over
            }

            GamePhase::InitialPlacement => {
                if player != self.current_player {
                    return actions;
                }
                if self.pending_initial_settlement().is_none() {
                    for vertex in validators::available_settlement_sites(self, player) {
                        actions.push(GameAction::BuildSettlement(vertex));
                    }
                } else {
                    for edge in validators::available_road_sites(self, player) {
                        actions.push(GameAction::BuildRoad(edge));
                    }
                }
            }

            GamePhase::MainGame => match self.turn_phase {
                TurnPhase::RobberActivation => {
                    if self.pending_discards.contains(&player) {
                        actions.push(GameAction::Discard(suggest_discard(
                            &p.resources,
                            discard_amount(p),
                        )));
                    } else if player == self.current_player && self.pending_discards.is_empty() {
                        for (hex, steal_from) in self.robber_targets(player) {
                            actions.push(GameAction::MoveRobber { hex, steal_from });
                        }
                    }
                }

                TurnPhase::DiceRoll => {
                    if player != self.current_player {
                        return actions;
                    }
                    actions.push(GameAction::RollDice);

                    // Can play knight before rolling
                    self.push_knight_moves(player, &mut actions);
                }

                TurnPhase::Actions => {
                    if player != self.current_player {
                        // Non-current players can only respond to trades
                        if let Some(offer) = &self.pending_trade {
                            if p.resources.can_afford(&offer.requesting) {
                                actions.push(GameAction::AcceptTrade);
                            }
                            actions.push(GameAction::DeclineTrade);
                        }
                        return actions;
                    }

                    // Can always end turn
                    actions.push(GameAction::EndTurn);

                    for edge in validators::available_road_sites(self, player) {
                        if validators::can_build_road(self, player, edge, BuildCost::Paid).is_ok() {
                            actions.push(GameAction::BuildRoad(edge));
                        }
                    }
                    for vertex in validators::available_settlement_sites(self, player) {
                        if validators::can_build_settlement(self, player, vertex, Placement::Normal)
                            .is_ok()
                        {
                            actions.push(GameAction::BuildSettlement(vertex));
                        }
                    }
                    for (vertex, _) in self.board.buildings_of(player) {
                        if validators::can_build_city(self, player, vertex).is_ok() {
                            actions.push(GameAction::BuildCity(vertex));
                        }
                    }
                    if validators::can_buy_dev_card(self, player).is_ok() {
                        actions.push(GameAction::BuyDevCard);
                    }

                    // Development cards
                    self.push_knight_moves(player, &mut actions);
                    if validators::can_play_dev_card(self, player, DevelopmentCard::YearOfPlenty)
                        .is_ok()
                    {
                        for first in Resource::ALL {
                            for second in Resource::ALL {
                                actions.push(GameAction::PlayYearOfPlenty(first, second));
                            }
                        }
                    }
                    if validators::can_play_dev_card(self, player, DevelopmentCard::Monopoly)
                        .is_ok()
                    {
                        for resource in Resource::ALL {
                            actions.push(GameAction::PlayMonopoly(resource));
                        }
                    }
                    if validators::can_play_dev_card(self, player, DevelopmentCard::RoadBuilding)
                        .is_ok()
                        && p.roads > 0
                    {
                        // One road; the card allows up to two
                        if let Some(edge) = validators::available_road_sites(self, player).first() {
                            actions.push(GameAction::PlayRoadBuilding(vec![*edge]));
                        }
                    }

                    // Bank trading
                    for give in Resource::ALL {
                        let rate = validators::trade_rate(self, player, give);
                        if p.resources.get(give) < rate {
                            continue;
                        }
                        for receive in Resource::ALL.into_iter().filter(|r| *r != give) {
                            actions.push(GameAction::TradeWithBank {
                                offer: ResourceHand::single(give, rate),
                                receive: ResourceHand::single(receive, 1),
                            });
                        }
                    }

                    // Trade management
                    if self.pending_trade.is_some() {
                        actions.push(GameAction::DeclineTrade);
                    }
                }
            },
        }

        actions
    }

    fn push_knight_moves(&self, player: PlayerId, actions: &mut Vec<GameAction>) {
        if validators::can_play_dev_card(self, player, DevelopmentCard::Knight).is_err() {
            return;
        }
        for (hex, steal_from) in self.robber_targets(player) {
            actions.push(GameAction::PlayKnight { hex, steal_from });
        }
    }

    /// Every hex the robber may move to, paired with each possible victim
    fn robber_targets(&self, player: PlayerId) -> Vec<(HexId, Option<PlayerId>)> {
        let mut targets = Vec::new();
        for hex in self.board.hexes().iter().filter(|h| !h.has_robber) {
            let victims = self.eligible_robber_victims(hex.id, player);
            if victims.is_empty() {
                targets.push((hex.id, None));
            }
            for victim in victims {
                targets.push((hex.id, Some(victim)));
            }
        }
        targets
    }
}

/// Give up `amount` cards, always from the largest pile
fn suggest_discard(hand: &ResourceHand, amount: u32) -> ResourceHand {
    let mut remaining = *hand;
    let mut discard = ResourceHand::new();
    for _ in 0..amount {
        let Some(largest) = Resource::ALL
            .into_iter()
            .filter(|r| remaining.get(*r) > 0)
            .max_by_key(|r| remaining.get(*r))
        else {
            break;
        };
        remaining.set(largest, remaining.get(largest) - 1);
        discard.add(largest, 1);
    }
    discard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures::*;
    use crate::random::ScriptedRandom;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_routes_to_commands() {
        let game = new_game(2);
        let hex = center_hex(&game);
        let mut rng = ScriptedRandom::new();

        let next = game
            .apply(0, &GameAction::BuildSettlement(hex.vertices[0]), &mut rng)
            .unwrap();
        let next = next
            .apply(0, &GameAction::BuildRoad(hex.edges[0]), &mut rng)
            .unwrap();
        assert_eq!(next.current_player, 1);
        let direct = game
            .build_settlement(0, hex.vertices[0])
            .unwrap()
            .build_road(0, hex.edges[0])
            .unwrap();
        assert_eq!(next, direct);
    }

    #[test]
    fn test_apply_reports_rejection() {
        let game = new_game(2);
        let mut rng = ScriptedRandom::new();
        assert_eq!(
            game.apply(0, &GameAction::RollDice, &mut rng).unwrap_err(),
            GameError::InvalidPhase
        );
        assert_eq!(
            game.apply(1, &GameAction::EndTurn, &mut rng).unwrap_err(),
            GameError::NotYourTurn
        );
    }

    #[test]
    fn test_apply_roll_and_end_turn() {
        let mut game = main_game(2);
        game.turn_phase = TurnPhase::DiceRoll;
        let mut rng = ScriptedRandom::new().with_dice([2, 2]);

        let next = game.apply(0, &GameAction::RollDice, &mut rng).unwrap();
        assert_eq!(next.turn_phase, TurnPhase::Actions);
        let next = next.apply(0, &GameAction::EndTurn, &mut rng).unwrap();
        assert_eq!(next.current_player, 1);
        assert_eq!(next.phase, GamePhase::MainGame);
    }

    #[test]
    fn test_valid_actions_initial_placement() {
        let game = new_game(3);
        let actions = game.valid_actions(0);
        assert_eq!(actions.len(), 54);
        assert!(actions
            .iter()
            .all(|a| matches!(a, GameAction::BuildSettlement(_))));
        assert!(game.valid_actions(1).is_empty());

        let hex = center_hex(&game);
        let next = game.build_settlement(0, hex.vertices[0]).unwrap();
        let roads = next.valid_actions(0);
        assert_eq!(roads.len(), 3);
        assert!(roads.iter().all(|a| matches!(a, GameAction::BuildRoad(_))));
    }

    #[test]
    fn test_valid_actions_all_apply() {
        let mut game = main_game(2);
        let hex = center_hex(&game);
        settle(&mut game, 0, hex.vertices[0]);
        give(&mut game, 0, ResourceHand::with_amounts(4, 2, 1, 3, 3));
        game.players[0].dev_cards.push(DevelopmentCard::Monopoly);
        game.players[0].dev_cards.push(DevelopmentCard::Knight);

        let actions = game.valid_actions(0);
        assert!(actions.contains(&GameAction::EndTurn));
        assert!(actions.contains(&GameAction::BuildCity(hex.vertices[0])));
        assert!(actions.contains(&GameAction::BuyDevCard));
        assert!(actions.contains(&GameAction::PlayMonopoly(Resource::Ore)));

        let mut rng = ScriptedRandom::new();
        for action in actions {
            assert!(
                game.apply(0, &action, &mut rng).is_ok(),
                "listed action {:?} should apply",
                action
            );
        }
    }

    #[test]
    fn test_valid_actions_after_seven() {
        let mut game = main_game(2);
        game.turn_phase = TurnPhase::RobberActivation;
        give(&mut game, 1, ResourceHand::with_amounts(5, 0, 0, 4, 0));
        game.pending_discards = vec![1];

        // Current player waits for the discard
        assert!(game.valid_actions(0).is_empty());

        let discard = game.valid_actions(1);
        assert_eq!(
            discard,
            vec![GameAction::Discard(ResourceHand::with_amounts(2, 0, 0, 2, 0))]
        );
        let mut rng = ScriptedRandom::new();
        let next = game.apply(1, &discard[0], &mut rng).unwrap();

        let moves = next.valid_actions(0);
        assert_eq!(moves.len(), 18);
        assert!(moves
            .iter()
            .all(|a| matches!(a, GameAction::MoveRobber { steal_from: None, .. })));
    }

    #[test]
    fn test_actions_serialize() {
        let action = GameAction::PlayYearOfPlenty(Resource::Ore, Resource::Wheat);
        let json = serde_json::to_string(&action).unwrap();
        let back: GameAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
