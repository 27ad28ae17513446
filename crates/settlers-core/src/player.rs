//! Player state and resource management.
//!
//! This module contains:
//! - Player struct with resources, piece stock, development cards, and badges
//! - ResourceHand for managing resource counts
//! - Development card types and the standard deck
//! - Building costs

use crate::board::{PlayerId, Resource};
use crate::rules::{CITIES_PER_PLAYER, ROADS_PER_PLAYER, SETTLEMENTS_PER_PLAYER};
use serde::{Deserialize, Serialize};

/// Player color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    White,
}

impl PlayerColor {
    /// Get color for a player index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 4 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::Orange,
            _ => PlayerColor::White,
        }
    }
}

/// Who submits this player's moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    Human,
    Ai,
}

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Move robber and steal, counts toward Largest Army
    Knight,
    /// Worth 1 VP while held
    VictoryPoint,
    /// Build 2 roads for free
    RoadBuilding,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// All players must give you all of one resource type
    Monopoly,
}

impl DevelopmentCard {
    /// Create the standard development card deck (25 cards, unshuffled)
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        let mut deck = Vec::with_capacity(25);

        // 14 Knights
        deck.extend(std::iter::repeat(DevelopmentCard::Knight).take(14));

        // 5 Victory Points
        deck.extend(std::iter::repeat(DevelopmentCard::VictoryPoint).take(5));

        // 2 Road Building
        deck.extend(std::iter::repeat(DevelopmentCard::RoadBuilding).take(2));

        // 2 Year of Plenty
        deck.extend(std::iter::repeat(DevelopmentCard::YearOfPlenty).take(2));

        // 2 Monopoly
        deck.extend(std::iter::repeat(DevelopmentCard::Monopoly).take(2));

        deck
    }

    /// Whether this card can be played (VP cards are never "played")
    pub fn is_playable(&self) -> bool {
        !matches!(self, DevelopmentCard::VictoryPoint)
    }
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.sheep + self.wheat + self.ore
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Wood => self.wood = count,
            Resource::Brick => self.brick = count,
            Resource::Sheep => self.sheep = count,
            Resource::Wheat => self.wheat = count,
            Resource::Ore => self.ore = count,
        }
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        let current = self.get(resource);
        self.set(resource, current + amount);
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|r| self.get(*r) >= cost.get(*r))
    }

    /// Subtract a cost, or None if any count would go negative
    pub fn checked_sub(&self, cost: &ResourceHand) -> Option<ResourceHand> {
        let mut result = *self;
        for resource in Resource::ALL {
            result.set(resource, self.get(resource).checked_sub(cost.get(resource))?);
        }
        Some(result)
    }

    /// Subtract per resource, stopping at zero
    pub fn saturating_sub(&self, other: &ResourceHand) -> ResourceHand {
        let mut result = *self;
        for resource in Resource::ALL {
            result.set(resource, self.get(resource).saturating_sub(other.get(resource)));
        }
        result
    }

    /// Resource kind of the card at `index` when the hand is laid out as a
    /// multiset in `Resource::ALL` order
    pub fn nth_card(&self, index: u32) -> Option<Resource> {
        let mut remaining = index;
        for resource in Resource::ALL {
            let count = self.get(resource);
            if remaining < count {
                return Some(resource);
            }
            remaining -= count;
        }
        None
    }

    /// Iterate over non-zero entries
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, n)| *n > 0)
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Cost to upgrade to city: 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }

    /// Cost to buy a development card: 1 sheep, 1 wheat, 1 ore
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID, equal to the seat index
    pub id: PlayerId,
    /// Display name
    pub name: String,
    pub color: PlayerColor,
    pub kind: PlayerKind,
    /// Current resources
    pub resources: ResourceHand,
    /// Settlements left in stock
    pub settlements: u32,
    /// Cities left in stock
    pub cities: u32,
    /// Roads left in stock
    pub roads: u32,
    /// Development cards in hand (playable)
    pub dev_cards: Vec<DevelopmentCard>,
    /// Development cards bought this turn (can't be played same turn)
    pub dev_cards_bought_this_turn: Vec<DevelopmentCard>,
    /// Cards already played, in order
    pub played_dev_cards: Vec<DevelopmentCard>,
    /// Number of knights played (for Largest Army)
    pub knights_played: u32,
    /// Last computed score; refreshed by the reducers
    pub victory_points: u32,
    /// Whether this player has the Longest Road card
    pub has_longest_road: bool,
    /// Whether this player has the Largest Army card
    pub has_largest_army: bool,
}

impl Player {
    /// Create a new player with a full stock of pieces and an empty hand
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        color: PlayerColor,
        kind: PlayerKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            kind,
            resources: ResourceHand::new(),
            settlements: SETTLEMENTS_PER_PLAYER,
            cities: CITIES_PER_PLAYER,
            roads: ROADS_PER_PLAYER,
            dev_cards: Vec::new(),
            dev_cards_bought_this_turn: Vec::new(),
            played_dev_cards: Vec::new(),
            knights_played: 0,
            victory_points: 0,
            has_longest_road: false,
            has_largest_army: false,
        }
    }

    /// Victory point cards held, including ones bought this turn
    pub fn victory_point_cards(&self) -> u32 {
        self.dev_cards
            .iter()
            .chain(&self.dev_cards_bought_this_turn)
            .filter(|c| matches!(c, DevelopmentCard::VictoryPoint))
            .count() as u32
    }

    /// Called at end of turn - move bought cards to playable pile
    pub fn end_turn(&mut self) {
        self.dev_cards.append(&mut self.dev_cards_bought_this_turn);
    }

    /// Check if player holds a card of the given type
    pub fn has_dev_card(&self, card: DevelopmentCard) -> bool {
        self.dev_cards.contains(&card)
    }

    /// Check if player holds a card of the given type bought this turn
    pub fn has_fresh_dev_card(&self, card: DevelopmentCard) -> bool {
        self.dev_cards_bought_this_turn.contains(&card)
    }

    /// Move a card from hand to the played history. Cards bought this turn
    /// are taken only when `allow_fresh` is set and no older copy exists.
    pub fn play_dev_card(&mut self, card: DevelopmentCard, allow_fresh: bool) -> bool {
        if let Some(pos) = self.dev_cards.iter().position(|c| *c == card) {
            self.dev_cards.remove(pos);
        } else if let (true, Some(pos)) = (
            allow_fresh,
            self.dev_cards_bought_this_turn.iter().position(|c| *c == card),
        ) {
            self.dev_cards_bought_this_turn.remove(pos);
        } else {
            return false;
        }

        if matches!(card, DevelopmentCard::Knight) {
            self.knights_played += 1;
        }
        self.played_dev_cards.push(card);
        true
    }

    /// Settlements currently on the board
    pub fn settlements_built(&self) -> u32 {
        SETTLEMENTS_PER_PLAYER.saturating_sub(self.settlements)
    }
}
