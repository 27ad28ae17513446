//! Axial hex coordinates used while laying out the board.
//!
//! This module provides the coordinate types the map generator needs:
//! - `HexCoord`: position of a tile in axial (q, r) form
//! - `CornerKey`: a normalized name for a physical corner, shared by every
//!   tile that touches it
//!
//! Coordinates only exist during generation. Once the board is built, tiles,
//! corners and sides are addressed by their arena ids (see [`crate::board`]).

use serde::{Deserialize, Serialize};

/// Which pole of a pointy-top hex a corner key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pole {
    /// Top corner of the hex
    North,
    /// Bottom corner of the hex
    South,
}

/// Direction towards a neighboring hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Get the neighbor in a specific direction
    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        match direction {
            Direction::East => HexCoord::new(self.q + 1, self.r),
            Direction::NorthEast => HexCoord::new(self.q + 1, self.r - 1),
            Direction::NorthWest => HexCoord::new(self.q, self.r - 1),
            Direction::West => HexCoord::new(self.q - 1, self.r),
            Direction::SouthWest => HexCoord::new(self.q - 1, self.r + 1),
            Direction::SouthEast => HexCoord::new(self.q, self.r + 1),
        }
    }

    /// Corner keys of this hex, clockwise from the top corner.
    ///
    /// Every physical corner of a pointy-top grid is the north pole of exactly
    /// one hex or the south pole of exactly one hex, so four of the six
    /// corners are named through a neighbor. Two hexes that share a corner
    /// therefore produce the same key for it.
    pub fn corners(&self) -> [CornerKey; 6] {
        [
            CornerKey::new(*self, Pole::North),
            CornerKey::new(self.neighbor(Direction::NorthEast), Pole::South),
            CornerKey::new(self.neighbor(Direction::SouthEast), Pole::North),
            CornerKey::new(*self, Pole::South),
            CornerKey::new(self.neighbor(Direction::SouthWest), Pole::North),
            CornerKey::new(self.neighbor(Direction::NorthWest), Pole::South),
        ]
    }
}

/// Normalized key for a board corner, used to merge the corners that
/// neighboring hexes share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CornerKey {
    pub hex: HexCoord,
    pub pole: Pole,
}

impl CornerKey {
    pub const fn new(hex: HexCoord, pole: Pole) -> Self {
        Self { hex, pole }
    }

}
