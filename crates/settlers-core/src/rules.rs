//! Game configuration.
//!
//! [`Rules`] holds the tunable thresholds; the physical contents of the box
//! (piece counts, the robber number, the discard limit) are constants.

use serde::{Deserialize, Serialize};

/// Settlements each player starts with
pub const SETTLEMENTS_PER_PLAYER: u32 = 5;
/// Cities each player starts with
pub const CITIES_PER_PLAYER: u32 = 4;
/// Roads each player starts with
pub const ROADS_PER_PLAYER: u32 = 15;

/// Dice sum that activates the robber
pub const ROBBER_ROLL: u8 = 7;
/// Players holding more than this many cards discard half on a robber roll
pub const DISCARD_THRESHOLD: u32 = 7;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Tunable rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Victory points needed to win
    pub victory_points_to_win: u32,
    /// Minimum road length for the Longest Road badge
    pub longest_road_min: u32,
    /// Minimum knights played for the Largest Army badge
    pub largest_army_min: u32,
    /// Limit players to one development card per turn
    pub one_dev_card_per_turn: bool,
    /// Allow playing a development card in the turn it was bought
    pub fresh_dev_cards_playable: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            victory_points_to_win: 10,
            longest_road_min: 5,
            largest_army_min: 3,
            one_dev_card_per_turn: true,
            fresh_dev_cards_playable: false,
        }
    }
}

impl Rules {
    /// Parse a (possibly partial) JSON rule set. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
