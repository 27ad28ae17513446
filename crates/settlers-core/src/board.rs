//! Board graph: hexes, vertices and edges stored as flat tables.
//!
//! This module contains:
//! - Resource, terrain, harbor and building types
//! - The `Hex`, `Vertex` and `Edge` records, cross-referenced by id
//! - Board queries (distance rule, connectivity, harbors, robber location)
//! - Raw placement methods used by the reducers once a move is validated
//!
//! The board is built once by [`crate::mapgen`]. Its topology never changes
//! afterwards; only buildings, roads and the robber flag move.

use crate::game::GameError;
use crate::hex::HexCoord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Player identifier, equal to the player's index in the game
pub type PlayerId = u8;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u8);

        impl $name {
            /// Position of the record in its table
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index into [`Board::hexes`]
    HexId,
    "h"
);
arena_id!(
    /// Index into [`Board::vertices`]
    VertexId,
    "v"
);
arena_id!(
    /// Index into [`Board::edges`]
    EdgeId,
    "e"
);

/// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terrain of a hex tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Produces wood
    Forest,
    /// Produces brick
    Hills,
    /// Produces sheep
    Pasture,
    /// Produces wheat
    Fields,
    /// Produces ore
    Mountains,
    /// No production; starts with the robber
    Desert,
}

impl Terrain {
    /// The resource this terrain produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Terrain::Forest => Some(Resource::Wood),
            Terrain::Hills => Some(Resource::Brick),
            Terrain::Pasture => Some(Resource::Sheep),
            Terrain::Fields => Some(Resource::Wheat),
            Terrain::Mountains => Some(Resource::Ore),
            Terrain::Desert => None,
        }
    }
}

/// Harbor types for maritime trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Harbor {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl Harbor {
    /// The exchange rate for this harbor
    pub fn rate(&self) -> u32 {
        match self {
            Harbor::Generic => 3,
            Harbor::Specific(_) => 2,
        }
    }
}

/// A settlement or city standing on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Building {
    /// 1 VP, 1 resource per adjacent producing hex
    Settlement(PlayerId),
    /// 2 VP, 2 resources per adjacent producing hex
    City(PlayerId),
}

impl Building {
    pub fn owner(&self) -> PlayerId {
        match self {
            Building::Settlement(p) | Building::City(p) => *p,
        }
    }

    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        match self {
            Building::Settlement(_) => 1,
            Building::City(_) => 2,
        }
    }

    /// Resource multiplier (how many resources per production)
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            Building::Settlement(_) => 1,
            Building::City(_) => 2,
        }
    }
}

/// A terrain tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hex {
    pub id: HexId,
    /// Position on the axial grid (used for layout only)
    pub coord: HexCoord,
    pub terrain: Terrain,
    /// Dice number that triggers production (None for the desert)
    pub number: Option<u8>,
    pub has_robber: bool,
    /// Corners, clockwise from the top
    pub vertices: [VertexId; 6],
    /// Sides, clockwise; `edges[i]` joins `vertices[i]` and `vertices[i + 1]`
    pub edges: [EdgeId; 6],
}

impl Hex {
    /// Whether this hex produces on a roll of `sum`
    pub fn produces_on(&self, sum: u8) -> bool {
        self.number == Some(sum) && !self.has_robber
    }
}

/// An intersection where up to three hexes meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub hexes: Vec<HexId>,
    pub building: Option<Building>,
    pub neighbors: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
    pub port: Option<Harbor>,
}

/// The side between two adjacent vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub vertices: [VertexId; 2],
    pub hexes: Vec<HexId>,
    pub road: Option<PlayerId>,
}

impl Edge {
    /// The endpoint opposite `vertex`, if `vertex` is an endpoint
    pub fn other_end(&self, vertex: VertexId) -> Option<VertexId> {
        match self.vertices {
            [a, b] if a == vertex => Some(b),
            [a, b] if b == vertex => Some(a),
            _ => None,
        }
    }
}

/// The complete game board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    hexes: Vec<Hex>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Board {
    /// Assemble a board from caller-supplied tables. Every id must equal its
    /// position in its table and every cross-reference must resolve.
    pub fn from_tables(
        hexes: Vec<Hex>,
        vertices: Vec<Vertex>,
        edges: Vec<Edge>,
    ) -> Result<Self, GameError> {
        let board = Self::from_parts(hexes, vertices, edges);
        board.check_tables()?;
        Ok(board)
    }

    /// Assemble a board from tables the generator built. Ids match positions.
    pub(crate) fn from_parts(hexes: Vec<Hex>, vertices: Vec<Vertex>, edges: Vec<Edge>) -> Self {
        Self {
            hexes,
            vertices,
            edges,
        }
    }

    fn check_tables(&self) -> Result<(), GameError> {
        for (index, hex) in self.hexes.iter().enumerate() {
            if hex.id.index() != index {
                return Err(GameError::MalformedBoard(format!(
                    "hex at index {} has id {}",
                    index, hex.id
                )));
            }
            self.require_vertices(&hex.vertices)?;
            self.require_edges(&hex.edges)?;
        }
        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.id.index() != index {
                return Err(GameError::MalformedBoard(format!(
                    "vertex at index {} has id {}",
                    index, vertex.id
                )));
            }
            self.require_hexes(&vertex.hexes)?;
            self.require_vertices(&vertex.neighbors)?;
            self.require_edges(&vertex.edges)?;
        }
        for (index, edge) in self.edges.iter().enumerate() {
            if edge.id.index() != index {
                return Err(GameError::MalformedBoard(format!(
                    "edge at index {} has id {}",
                    index, edge.id
                )));
            }
            self.require_vertices(&edge.vertices)?;
            self.require_hexes(&edge.hexes)?;
        }
        if self.hexes.iter().filter(|h| h.has_robber).count() > 1 {
            return Err(GameError::MalformedBoard("more than one robber".into()));
        }
        Ok(())
    }

    fn require_hexes(&self, ids: &[HexId]) -> Result<(), GameError> {
        match ids.iter().find(|id| self.hex(**id).is_none()) {
            Some(id) => Err(GameError::HexNotFound(*id)),
            None => Ok(()),
        }
    }

    fn require_vertices(&self, ids: &[VertexId]) -> Result<(), GameError> {
        match ids.iter().find(|id| self.vertex(**id).is_none()) {
            Some(id) => Err(GameError::VertexNotFound(*id)),
            None => Ok(()),
        }
    }

    fn require_edges(&self, ids: &[EdgeId]) -> Result<(), GameError> {
        match ids.iter().find(|id| self.edge(**id).is_none()) {
            Some(id) => Err(GameError::EdgeNotFound(*id)),
            None => Ok(()),
        }
    }

    pub fn hexes(&self) -> &[Hex] {
        &self.hexes
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn hex(&self, id: HexId) -> Option<&Hex> {
        self.hexes.get(id.index())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Building on a vertex (None for empty or unknown vertices)
    pub fn building_at(&self, vertex: VertexId) -> Option<Building> {
        self.vertex(vertex).and_then(|v| v.building)
    }

    /// Owner of the road on an edge, if any
    pub fn road_owner(&self, edge: EdgeId) -> Option<PlayerId> {
        self.edge(edge).and_then(|e| e.road)
    }

    /// Hex currently holding the robber
    pub fn robber_hex(&self) -> Option<HexId> {
        self.hexes.iter().find(|h| h.has_robber).map(|h| h.id)
    }

    /// Edges on the outer rim of the island (touching a single hex)
    pub fn coastal_edges(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|e| e.hexes.len() == 1)
            .map(|e| e.id)
            .collect()
    }

    // ==================== Queries ====================

    /// Check if a vertex satisfies the distance rule (no adjacent buildings of any owner)
    pub fn satisfies_distance_rule(&self, vertex: VertexId) -> bool {
        match self.vertex(vertex) {
            Some(v) => v
                .neighbors
                .iter()
                .all(|n| self.building_at(*n).is_none()),
            None => false,
        }
    }

    /// Whether one of the player's roads touches the vertex
    pub fn has_road_at(&self, vertex: VertexId, player: PlayerId) -> bool {
        self.vertex(vertex).is_some_and(|v| {
            v.edges
                .iter()
                .any(|e| self.road_owner(*e) == Some(player))
        })
    }

    /// Whether an edge connects to the player's network: one of its endpoints
    /// holds the player's building or touches another of the player's roads
    pub fn connects_to_network(&self, edge: EdgeId, player: PlayerId) -> bool {
        let Some(e) = self.edge(edge) else {
            return false;
        };
        e.vertices.iter().any(|endpoint| {
            if self.building_at(*endpoint).is_some_and(|b| b.owner() == player) {
                return true;
            }
            self.vertex(*endpoint).is_some_and(|v| {
                v.edges
                    .iter()
                    .any(|adj| *adj != edge && self.road_owner(*adj) == Some(player))
            })
        })
    }

    /// Players with a building on one of the hex's corners
    pub fn players_adjacent_to_hex(&self, hex: HexId) -> BTreeSet<PlayerId> {
        let mut players = BTreeSet::new();
        if let Some(h) = self.hex(hex) {
            for vertex in h.vertices {
                if let Some(building) = self.building_at(vertex) {
                    players.insert(building.owner());
                }
            }
        }
        players
    }

    /// Harbors a player has access to through their settlements and cities
    pub fn player_harbors(&self, player: PlayerId) -> Vec<Harbor> {
        let mut harbors = Vec::new();
        for vertex in &self.vertices {
            let owned = vertex.building.is_some_and(|b| b.owner() == player);
            if let (true, Some(port)) = (owned, vertex.port) {
                if !harbors.contains(&port) {
                    harbors.push(port);
                }
            }
        }
        harbors
    }

    /// Vertices holding one of the player's buildings
    pub fn buildings_of(
        &self,
        player: PlayerId,
    ) -> impl Iterator<Item = (VertexId, Building)> + '_ {
        self.vertices.iter().filter_map(move |v| match v.building {
            Some(b) if b.owner() == player => Some((v.id, b)),
            _ => None,
        })
    }

    /// Edges holding one of the player's roads
    pub fn roads_of(&self, player: PlayerId) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.road == Some(player))
            .map(|e| e.id)
    }

    // ==================== Mutation Methods ====================

    /// Place a settlement (assumes validation already done)
    pub fn place_settlement(&mut self, vertex: VertexId, player: PlayerId) {
        if let Some(v) = self.vertices.get_mut(vertex.index()) {
            v.building = Some(Building::Settlement(player));
        }
    }

    /// Upgrade a settlement to a city
    pub fn upgrade_to_city(&mut self, vertex: VertexId, player: PlayerId) {
        if let Some(v) = self.vertices.get_mut(vertex.index()) {
            v.building = Some(Building::City(player));
        }
    }

    /// Place a road
    pub fn place_road(&mut self, edge: EdgeId, player: PlayerId) {
        if let Some(e) = self.edges.get_mut(edge.index()) {
            e.road = Some(player);
        }
    }

    /// Move the robber to a new hex
    pub fn move_robber(&mut self, target: HexId) {
        for hex in &mut self.hexes {
            hex.has_robber = hex.id == target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::generate_board;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board() -> Board {
        generate_board(&mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_ids_match_positions() {
        let board = board();
        for (i, hex) in board.hexes().iter().enumerate() {
            assert_eq!(hex.id.index(), i);
        }
        for (i, vertex) in board.vertices().iter().enumerate() {
            assert_eq!(vertex.id.index(), i);
        }
        for (i, edge) in board.edges().iter().enumerate() {
            assert_eq!(edge.id.index(), i);
        }
    }

    #[test]
    fn test_from_tables_accepts_consistent_tables() {
        let board = board();
        let rebuilt = Board::from_tables(
            board.hexes().to_vec(),
            board.vertices().to_vec(),
            board.edges().to_vec(),
        )
        .unwrap();
        assert_eq!(rebuilt, board);
    }

    #[test]
    fn test_from_tables_rejects_bad_ids() {
        let board = board();

        let mut vertices = board.vertices().to_vec();
        vertices.swap(0, 1);
        let err = Board::from_tables(board.hexes().to_vec(), vertices, board.edges().to_vec())
            .unwrap_err();
        assert!(matches!(err, GameError::MalformedBoard(_)), "{:?}", err);

        let mut edges = board.edges().to_vec();
        edges[3].vertices[1] = VertexId(200);
        let err = Board::from_tables(board.hexes().to_vec(), board.vertices().to_vec(), edges)
            .unwrap_err();
        assert_eq!(err, GameError::VertexNotFound(VertexId(200)));

        let mut hexes = board.hexes().to_vec();
        hexes[0].has_robber = true;
        hexes[1].has_robber = true;
        let err = Board::from_tables(hexes, board.vertices().to_vec(), board.edges().to_vec())
            .unwrap_err();
        assert!(matches!(err, GameError::MalformedBoard(_)), "{:?}", err);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let board = board();
        assert!(board.hex(HexId(19)).is_none());
        assert!(board.vertex(VertexId(54)).is_none());
        assert!(board.edge(EdgeId(72)).is_none());
        assert!(!board.satisfies_distance_rule(VertexId(200)));
    }

    #[test]
    fn test_distance_rule() {
        let mut board = board();
        let vertex = VertexId(10);

        // Initially should satisfy distance rule
        assert!(board.satisfies_distance_rule(vertex));

        board.place_settlement(vertex, 0);

        // Adjacent vertices should now fail for every player
        let neighbors = board.vertex(vertex).unwrap().neighbors.clone();
        for adj in neighbors {
            assert!(
                !board.satisfies_distance_rule(adj),
                "Adjacent vertex should fail distance rule"
            );
        }
    }

    #[test]
    fn test_road_connectivity() {
        let mut board = board();
        let vertex = VertexId(20);
        let edges = board.vertex(vertex).unwrap().edges.clone();

        board.place_settlement(vertex, 0);
        for edge in &edges {
            assert!(
                board.connects_to_network(*edge, 0),
                "Should be able to build road adjacent to settlement"
            );
            assert!(!board.connects_to_network(*edge, 1));
        }

        // Extending from the far end of a road
        board.place_road(edges[0], 0);
        let far = board.edge(edges[0]).unwrap().other_end(vertex).unwrap();
        let onward: Vec<EdgeId> = board
            .vertex(far)
            .unwrap()
            .edges
            .iter()
            .copied()
            .filter(|e| *e != edges[0])
            .collect();
        for edge in onward {
            assert!(board.connects_to_network(edge, 0));
        }
        assert!(board.has_road_at(far, 0));
        assert!(!board.has_road_at(far, 1));
    }

    #[test]
    fn test_robber_moves() {
        let mut board = board();
        let start = board.robber_hex().unwrap();
        let target = board.hexes().iter().find(|h| h.id != start).unwrap().id;

        board.move_robber(target);
        assert_eq!(board.robber_hex(), Some(target));
        assert_eq!(board.hexes().iter().filter(|h| h.has_robber).count(), 1);
    }

    #[test]
    fn test_players_adjacent_to_hex() {
        let mut board = board();
        let hex = board.hexes()[9].clone();
        board.place_settlement(hex.vertices[0], 1);
        board.upgrade_to_city(hex.vertices[3], 2);

        let players = board.players_adjacent_to_hex(hex.id);
        assert_eq!(players.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_harbor_access() {
        let mut board = board();
        let port_vertex = board.vertices().iter().find(|v| v.port.is_some()).unwrap();
        let (id, port) = (port_vertex.id, port_vertex.port.unwrap());

        assert!(board.player_harbors(0).is_empty());
        board.place_settlement(id, 0);
        assert_eq!(board.player_harbors(0), vec![port]);
        assert!(board.player_harbors(1).is_empty());
    }

    #[test]
    fn test_building_values() {
        assert_eq!(Building::Settlement(0).victory_points(), 1);
        assert_eq!(Building::City(0).victory_points(), 2);
        assert_eq!(Building::City(3).resource_multiplier(), 2);
        assert_eq!(Building::City(3).owner(), 3);
        assert_eq!(Terrain::Desert.resource(), None);
        assert_eq!(Terrain::Fields.resource(), Some(Resource::Wheat));
    }
}
