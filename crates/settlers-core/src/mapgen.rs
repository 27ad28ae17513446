//! Map generation for the standard 19-hex island.
//!
//! Topology is fixed (rows of 3, 4, 5, 4 and 3 hexes); randomness only
//! decides terrain, number tokens and harbor types. Shared corners and sides
//! are merged through temporary key maps that are dropped once the id-based
//! adjacency lists are built.

use crate::board::{Board, Edge, EdgeId, Harbor, Hex, HexId, Resource, Terrain, Vertex, VertexId};
use crate::hex::{CornerKey, HexCoord};
use crate::random::RandomSource;
use std::collections::HashMap;
use tracing::debug;

/// Hexes per row, top to bottom
pub const ROW_SIZES: [usize; 5] = [3, 4, 5, 4, 3];

/// Terrain tiles in the box
pub const TERRAIN_COUNTS: [(Terrain, usize); 6] = [
    (Terrain::Forest, 4),
    (Terrain::Hills, 3),
    (Terrain::Pasture, 4),
    (Terrain::Fields, 4),
    (Terrain::Mountains, 3),
    (Terrain::Desert, 1),
];

/// Number tokens (no 7)
pub const NUMBER_TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// Positions of harbor edges along the 30-edge coastline. Gaps of at least
/// three keep any two harbors from sharing a vertex.
const HARBOR_SLOTS: [usize; 9] = [0, 3, 7, 10, 13, 17, 20, 23, 27];

/// Axial coordinates of the island, row by row
pub fn hex_layout() -> Vec<HexCoord> {
    let mut coords = Vec::with_capacity(19);
    for r in -2i32..=2 {
        let q_min = (-2i32).max(-2 - r);
        let q_max = 2i32.min(2 - r);
        for q in q_min..=q_max {
            coords.push(HexCoord::new(q, r));
        }
    }
    coords
}

fn terrain_pool() -> Vec<Terrain> {
    TERRAIN_COUNTS
        .iter()
        .flat_map(|(terrain, count)| std::iter::repeat(*terrain).take(*count))
        .collect()
}

fn harbor_pool() -> Vec<Harbor> {
    let mut harbors = vec![Harbor::Generic; 4];
    harbors.extend(Resource::ALL.iter().map(|r| Harbor::Specific(*r)));
    harbors
}

/// Generate a randomized standard board
pub fn generate_board(rng: &mut impl RandomSource) -> Board {
    let coords = hex_layout();

    let mut terrains = terrain_pool();
    rng.shuffle(&mut terrains);

    let mut numbers = NUMBER_TOKENS.to_vec();
    rng.shuffle(&mut numbers);
    let mut numbers = numbers.into_iter();

    // Hexes and de-duplicated corners
    let mut corner_ids: HashMap<CornerKey, VertexId> = HashMap::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut hexes: Vec<Hex> = Vec::with_capacity(coords.len());

    for (i, (coord, terrain)) in coords.iter().zip(terrains).enumerate() {
        let id = HexId(i as u8);
        let mut corners = [VertexId(0); 6];

        for (slot, key) in coord.corners().into_iter().enumerate() {
            let vertex_id = *corner_ids.entry(key).or_insert_with(|| {
                let vertex_id = VertexId(vertices.len() as u8);
                vertices.push(Vertex {
                    id: vertex_id,
                    hexes: Vec::new(),
                    building: None,
                    neighbors: Vec::new(),
                    edges: Vec::new(),
                    port: None,
                });
                vertex_id
            });
            vertices[vertex_id.index()].hexes.push(id);
            corners[slot] = vertex_id;
        }

        let number = match terrain {
            Terrain::Desert => None,
            _ => numbers.next(),
        };

        hexes.push(Hex {
            id,
            coord: *coord,
            terrain,
            number,
            has_robber: terrain == Terrain::Desert,
            vertices: corners,
            edges: [EdgeId(0); 6],
        });
    }

    // Sides, merged by their sorted endpoint pair
    let mut side_ids: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
    let mut edges: Vec<Edge> = Vec::new();

    for hex in &mut hexes {
        for slot in 0..6 {
            let a = hex.vertices[slot];
            let b = hex.vertices[(slot + 1) % 6];
            let key = if a < b { (a, b) } else { (b, a) };

            let edge_id = *side_ids.entry(key).or_insert_with(|| {
                let edge_id = EdgeId(edges.len() as u8);
                edges.push(Edge {
                    id: edge_id,
                    vertices: [key.0, key.1],
                    hexes: Vec::new(),
                    road: None,
                });
                edge_id
            });
            edges[edge_id.index()].hexes.push(hex.id);
            hex.edges[slot] = edge_id;
        }
    }

    for edge in &edges {
        let [a, b] = edge.vertices;
        vertices[a.index()].neighbors.push(b);
        vertices[a.index()].edges.push(edge.id);
        vertices[b.index()].neighbors.push(a);
        vertices[b.index()].edges.push(edge.id);
    }

    place_harbors(&edges, &mut vertices, rng);

    debug!(
        hexes = hexes.len(),
        vertices = vertices.len(),
        edges = edges.len(),
        "generated board"
    );

    Board::from_parts(hexes, vertices, edges)
}

/// Coastal edges in the order met when walking around the island
fn coastline(edges: &[Edge], vertices: &[Vertex]) -> Vec<EdgeId> {
    let is_coastal = |id: EdgeId| edges[id.index()].hexes.len() == 1;
    let total = edges.iter().filter(|e| e.hexes.len() == 1).count();

    let Some(first) = edges.iter().find(|e| e.hexes.len() == 1) else {
        return Vec::new();
    };

    let mut order = vec![first.id];
    let mut previous = first.id;
    let mut at = first.vertices[1];

    while order.len() < total {
        let next = vertices[at.index()]
            .edges
            .iter()
            .copied()
            .find(|e| *e != previous && is_coastal(*e));
        let Some(next) = next.filter(|e| *e != first.id) else {
            break;
        };
        let Some(far) = edges[next.index()].other_end(at) else {
            break;
        };
        order.push(next);
        previous = next;
        at = far;
    }

    order
}

fn place_harbors(edges: &[Edge], vertices: &mut [Vertex], rng: &mut impl RandomSource) {
    let coast = coastline(edges, vertices);
    if coast.len() <= HARBOR_SLOTS[HARBOR_SLOTS.len() - 1] {
        return;
    }

    let mut harbors = harbor_pool();
    rng.shuffle(&mut harbors);

    for (slot, harbor) in HARBOR_SLOTS.iter().zip(harbors) {
        for endpoint in edges[coast[*slot].index()].vertices {
            vertices[endpoint.index()].port = Some(harbor);
        }
    }
}

impl Board {
    /// Generate a standard board from the thread-local generator
    pub fn standard() -> Self {
        generate_board(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn board(seed: u64) -> Board {
        generate_board(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_layout_rows() {
        let coords = hex_layout();
        assert_eq!(coords.len(), 19);

        let mut rows = Vec::new();
        for r in -2..=2 {
            rows.push(coords.iter().filter(|c| c.r == r).count());
        }
        assert_eq!(rows, ROW_SIZES.to_vec());
    }

    #[test]
    fn test_standard_counts() {
        for seed in 0..5 {
            let board = board(seed);
            assert_eq!(board.hexes().len(), 19);
            assert_eq!(board.vertices().len(), 54);
            assert_eq!(board.edges().len(), 72);
        }
    }

    #[test]
    fn test_terrain_distribution() {
        let board = board(1);
        for (terrain, count) in TERRAIN_COUNTS {
            let found = board.hexes().iter().filter(|h| h.terrain == terrain).count();
            assert_eq!(found, count, "wrong number of {:?} hexes", terrain);
        }
    }

    #[test]
    fn test_number_tokens() {
        let board = board(2);
        let mut numbers: Vec<u8> = board.hexes().iter().filter_map(|h| h.number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, NUMBER_TOKENS.to_vec());

        let desert = board
            .hexes()
            .iter()
            .find(|h| h.terrain == Terrain::Desert)
            .unwrap();
        assert_eq!(desert.number, None);
        assert!(desert.has_robber);
        assert_eq!(board.robber_hex(), Some(desert.id));
    }

    #[test]
    fn test_adjacency_degrees() {
        let board = board(3);
        for vertex in board.vertices() {
            assert!((2..=3).contains(&vertex.edges.len()), "vertex {} degree", vertex.id);
            assert_eq!(vertex.edges.len(), vertex.neighbors.len());
            assert!((1..=3).contains(&vertex.hexes.len()));
        }
        for edge in board.edges() {
            assert_ne!(edge.vertices[0], edge.vertices[1]);
            assert!((1..=2).contains(&edge.hexes.len()));
        }
    }

    #[test]
    fn test_hex_sides_join_consecutive_corners() {
        let board = board(4);
        for hex in board.hexes() {
            let unique: HashSet<_> = hex.vertices.iter().collect();
            assert_eq!(unique.len(), 6);

            for slot in 0..6 {
                let edge = board.edge(hex.edges[slot]).unwrap();
                let a = hex.vertices[slot];
                let b = hex.vertices[(slot + 1) % 6];
                assert!(edge.vertices.contains(&a) && edge.vertices.contains(&b));
                assert!(edge.hexes.contains(&hex.id));
            }
        }
    }

    #[test]
    fn test_coastline_is_a_cycle() {
        let board = board(5);
        let coast = coastline(board.edges(), board.vertices());
        assert_eq!(coast.len(), 30);
        assert_eq!(board.coastal_edges().len(), 30);

        // Consecutive coastal edges share a vertex
        for pair in coast.windows(2) {
            let a = board.edge(pair[0]).unwrap();
            let b = board.edge(pair[1]).unwrap();
            assert!(a.vertices.iter().any(|v| b.vertices.contains(v)));
        }
    }

    #[test]
    fn test_harbors() {
        let board = board(6);
        let port_vertices: Vec<&Vertex> =
            board.vertices().iter().filter(|v| v.port.is_some()).collect();
        assert_eq!(port_vertices.len(), 18);

        let generic = port_vertices
            .iter()
            .filter(|v| v.port == Some(Harbor::Generic))
            .count();
        assert_eq!(generic, 8);

        for resource in Resource::ALL {
            let specific = port_vertices
                .iter()
                .filter(|v| v.port == Some(Harbor::Specific(resource)))
                .count();
            assert_eq!(specific, 2, "one {} harbor expected", resource);
        }

        for vertex in port_vertices {
            assert!(vertex.hexes.len() < 3, "harbor on an inland vertex");
        }
    }

    #[test]
    fn test_same_seed_same_board() {
        assert_eq!(board(99), board(99));
    }

    #[test]
    fn test_topology_independent_of_seed() {
        let a = board(7);
        let b = board(8);
        for (x, y) in a.edges().iter().zip(b.edges()) {
            assert_eq!(x.vertices, y.vertices);
        }
        for (x, y) in a.hexes().iter().zip(b.hexes()) {
            assert_eq!(x.vertices, y.vertices);
        }
    }

    #[test]
    fn test_standard_board_has_robber_on_desert() {
        let board = Board::standard();
        let robber = board.robber_hex().and_then(|id| board.hex(id)).unwrap();
        assert_eq!(robber.terrain, Terrain::Desert);
        assert_eq!(board.coastal_edges().len(), 30);
    }
}
