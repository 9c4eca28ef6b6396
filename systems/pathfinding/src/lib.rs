#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path graph construction and deterministic shortest-path search.
//!
//! [`PathGraph`] stores one node per open tile in a dense arena and records
//! neighbour links as node indices, so a rebuild only recomputes indices.
//! [`PathFinder`] runs a breadth-first search over the graph. Neighbours are
//! expanded in the fixed order given by [`Connectivity::directions`] and the
//! first discovery of a node wins, which makes results reproducible for an
//! unchanged graph.

use std::collections::VecDeque;

use glam::Vec3;
use tile_defense_core::{Connectivity, Path, TileCoord, Waypoint};

/// Stable index of a node inside a [`PathGraph`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Arena slot occupied by the node.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct GraphNode {
    tile: TileCoord,
    position: Vec3,
    first_edge: u32,
    edge_count: u32,
}

/// Graph of traversable nodes derived from the open tiles of a grid.
#[derive(Clone, Debug, Default)]
pub struct PathGraph {
    columns: u32,
    rows: u32,
    connectivity: Connectivity,
    lookup: Vec<Option<NodeIndex>>,
    nodes: Vec<GraphNode>,
    edges: Vec<NodeIndex>,
}

impl PathGraph {
    /// Rebuilds the graph from scratch.
    ///
    /// `open_position` returns the world position of an open tile and `None`
    /// for blocked tiles, which receive no node.
    pub fn rebuild_with<F>(
        &mut self,
        columns: u32,
        rows: u32,
        connectivity: Connectivity,
        mut open_position: F,
    ) where
        F: FnMut(TileCoord) -> Option<Vec3>,
    {
        self.columns = columns;
        self.rows = rows;
        self.connectivity = connectivity;
        self.nodes.clear();
        self.edges.clear();

        let tile_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        self.lookup.clear();
        self.lookup.resize(tile_count, None);
        if tile_count == 0 {
            return;
        }

        for row in 0..rows {
            for column in 0..columns {
                let tile = TileCoord::new(column, row);
                let Some(position) = open_position(tile) else {
                    continue;
                };
                let Some(slot) = index(columns, tile) else {
                    continue;
                };
                let Ok(node) = u32::try_from(self.nodes.len()) else {
                    return;
                };
                self.lookup[slot] = Some(NodeIndex(node));
                self.nodes.push(GraphNode {
                    tile,
                    position,
                    first_edge: 0,
                    edge_count: 0,
                });
            }
        }

        for node_slot in 0..self.nodes.len() {
            let tile = self.nodes[node_slot].tile;
            let first_edge = self.edges.len();
            for &direction in connectivity.directions() {
                let Some(neighbor) = tile.neighbor(direction, columns, rows) else {
                    continue;
                };
                let Some(neighbor_node) = self.node_at(neighbor) else {
                    continue;
                };
                if let Some((vertical, horizontal)) = direction.diagonal_components() {
                    let cuts_corner = [vertical, horizontal].into_iter().any(|component| {
                        tile.neighbor(component, columns, rows)
                            .and_then(|adjacent| self.node_at(adjacent))
                            .is_none()
                    });
                    if cuts_corner {
                        continue;
                    }
                }
                self.edges.push(neighbor_node);
            }

            let node = &mut self.nodes[node_slot];
            node.first_edge = u32::try_from(first_edge).unwrap_or(u32::MAX);
            node.edge_count = u32::try_from(self.edges.len() - first_edge).unwrap_or(0);
        }
    }

    /// Number of columns of the grid the graph was built from.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows of the grid the graph was built from.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Neighbourhood used when the graph was built.
    #[must_use]
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Number of nodes, equal to the number of open tiles.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed neighbour links.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node that represents the provided tile, if the tile is open.
    #[must_use]
    pub fn node_at(&self, tile: TileCoord) -> Option<NodeIndex> {
        if tile.column() >= self.columns || tile.row() >= self.rows {
            return None;
        }
        index(self.columns, tile).and_then(|slot| self.lookup.get(slot).copied().flatten())
    }

    /// Reports whether the provided tile has a node.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.node_at(tile).is_some()
    }

    /// Tile represented by the node.
    #[must_use]
    pub fn tile(&self, node: NodeIndex) -> Option<TileCoord> {
        self.nodes.get(node.get()).map(|entry| entry.tile)
    }

    /// World position of the tile represented by the node.
    #[must_use]
    pub fn position(&self, node: NodeIndex) -> Option<Vec3> {
        self.nodes.get(node.get()).map(|entry| entry.position)
    }

    /// Neighbours of the node in tie-break order.
    #[must_use]
    pub fn neighbors(&self, node: NodeIndex) -> &[NodeIndex] {
        let Some(entry) = self.nodes.get(node.get()) else {
            return &[];
        };
        let start = entry.first_edge as usize;
        let end = start + entry.edge_count as usize;
        self.edges.get(start..end).unwrap_or(&[])
    }

    fn waypoint(&self, node: NodeIndex) -> Option<Waypoint> {
        self.nodes
            .get(node.get())
            .map(|entry| Waypoint::new(entry.tile, entry.position))
    }
}

/// Breadth-first search with reusable scratch buffers.
#[derive(Debug, Default)]
pub struct PathFinder {
    queue: VecDeque<NodeIndex>,
    parents: Vec<Option<NodeIndex>>,
    visited: Vec<bool>,
}

impl PathFinder {
    /// Creates a path finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the shortest path between two tiles.
    ///
    /// Returns [`Path::empty`] when either tile is blocked, outside the graph
    /// or when the tiles are disconnected. The graph is never mutated.
    pub fn find_path(&mut self, graph: &PathGraph, start: TileCoord, end: TileCoord) -> Path {
        let (Some(start_node), Some(end_node)) = (graph.node_at(start), graph.node_at(end)) else {
            return Path::empty();
        };

        self.prepare(graph.node_count());
        self.visited[start_node.get()] = true;
        self.queue.push_back(start_node);

        let mut reached = start_node == end_node;
        while !reached {
            let Some(current) = self.queue.pop_front() else {
                break;
            };
            for &neighbor in graph.neighbors(current) {
                if self.visited[neighbor.get()] {
                    continue;
                }
                self.visited[neighbor.get()] = true;
                self.parents[neighbor.get()] = Some(current);
                if neighbor == end_node {
                    reached = true;
                    break;
                }
                self.queue.push_back(neighbor);
            }
        }

        if !reached {
            return Path::empty();
        }

        let mut nodes = vec![end_node];
        let mut cursor = end_node;
        while let Some(parent) = self.parents[cursor.get()] {
            nodes.push(parent);
            cursor = parent;
        }
        nodes.reverse();

        let waypoints: Vec<Waypoint> = nodes
            .into_iter()
            .filter_map(|node| graph.waypoint(node))
            .collect();
        Path::new(waypoints)
    }

    fn prepare(&mut self, node_count: usize) {
        self.queue.clear();
        self.parents.clear();
        self.parents.resize(node_count, None);
        self.visited.clear();
        self.visited.resize(node_count, false);
    }
}

/// Convenience wrapper around [`PathFinder::find_path`] with fresh buffers.
#[must_use]
pub fn find_path(graph: &PathGraph, start: TileCoord, end: TileCoord) -> Path {
    PathFinder::new().find_path(graph, start, end)
}

fn index(columns: u32, tile: TileCoord) -> Option<usize> {
    let width = usize::try_from(columns).ok()?;
    let column = usize::try_from(tile.column()).ok()?;
    let row = usize::try_from(tile.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
