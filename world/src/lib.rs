#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tile Defense.
//!
//! The [`World`] owns the tile grid, the path graph derived from it, the
//! canonical path and the object registry. Every tile mutation funnels through
//! [`World::set_blocked`] (or the tower commands built on it), which rebuilds
//! the graph, recomputes the canonical path and delivers it to every enemy
//! before returning, so a single command never leaves agents on a stale path.

mod grid;
mod registry;

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_defense_core::{
    AgentState, Command, Connectivity, Event, ObjectId, Path, PlacementError, PlayMode, TileCoord,
    TowerKind,
};
use tile_defense_system_movement::AgentPathState;
use tile_defense_system_pathfinding::{PathFinder, PathGraph};
use tracing::{debug, info, warn};

pub use grid::{Grid, Tile};
pub use registry::{Decoration, Enemy, GameObject, ObjectRegistry, Tower};

const DEFAULT_GRID_COLUMNS: u32 = 10;
const DEFAULT_GRID_ROWS: u32 = 10;
const DEFAULT_TILE_LENGTH: f32 = 1.0;
const DEFAULT_LIVES: u32 = 50;

/// Construction parameters of a [`World`]. Fixed for the world's lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a square tile in world units.
    pub tile_length: f32,
    /// Cosmetic height of the tile surface.
    pub elevation: f32,
    /// World position of tile `(0, 0)`.
    pub origin: Vec3,
    /// Tile where enemies spawn.
    pub start: TileCoord,
    /// Tile where enemies leave the grid.
    pub end: TileCoord,
    /// Neighbourhood used by the path graph.
    pub connectivity: Connectivity,
    /// Rejects placements that would disconnect start from end instead of
    /// letting enemies wait.
    pub reject_disconnecting_placements: bool,
    /// Lives the player starts with.
    pub starting_lives: u32,
}

impl WorldConfig {
    fn tile_count(&self) -> usize {
        usize::try_from(u64::from(self.columns) * u64::from(self.rows)).unwrap_or(0)
    }

    fn contains(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns && tile.row() < self.rows
    }

    /// Checks that the configuration describes a usable grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if !(self.tile_length.is_finite() && self.tile_length > 0.0) {
            return Err(ConfigError::InvalidTileLength(self.tile_length));
        }
        if !self.contains(self.start) {
            return Err(ConfigError::StartOutOfBounds(self.start));
        }
        if !self.contains(self.end) {
            return Err(ConfigError::EndOutOfBounds(self.end));
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            tile_length: DEFAULT_TILE_LENGTH,
            elevation: 0.0,
            origin: Vec3::ZERO,
            start: TileCoord::new(0, 0),
            end: TileCoord::new(DEFAULT_GRID_COLUMNS - 1, DEFAULT_GRID_ROWS - 1),
            connectivity: Connectivity::Four,
            reject_disconnecting_placements: false,
            starting_lives: DEFAULT_LIVES,
        }
    }
}

/// Reasons a [`WorldConfig`] cannot produce a world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no tiles.
    #[error("grid must contain at least one tile, got {columns}x{rows}")]
    EmptyGrid {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The tile length is not a positive finite number.
    #[error("tile length must be positive and finite, got {0}")]
    InvalidTileLength(f32),
    /// The start tile lies outside the grid.
    #[error("start tile {0:?} lies outside the grid")]
    StartOutOfBounds(TileCoord),
    /// The end tile lies outside the grid.
    #[error("end tile {0:?} lies outside the grid")]
    EndOutOfBounds(TileCoord),
}

/// Represents the authoritative Tile Defense world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    grid: Grid,
    graph: PathGraph,
    finder: PathFinder,
    canonical_path: Path,
    registry: ObjectRegistry,
    play_mode: PlayMode,
    lives: u32,
    level: u32,
}

impl World {
    /// Creates a world from a validated configuration.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WorldConfig) -> Self {
        let mut world = Self {
            grid: Grid::new(&config),
            graph: PathGraph::default(),
            finder: PathFinder::new(),
            canonical_path: Path::empty(),
            registry: ObjectRegistry::new(),
            play_mode: PlayMode::Attack,
            lives: config.starting_lives,
            level: 1,
            config,
        };
        world.rebuild_navigation();
        world
    }

    /// Sets the occupancy of a tile and propagates the consequences.
    ///
    /// Returns `Ok(false)` when the tile already has the requested state. On
    /// `Ok(true)` the path graph has been rebuilt and every enemy received the
    /// new canonical path. A tile holding a tower stays blocked until the
    /// tower is removed and reports [`PlacementError::Occupied`].
    pub fn set_blocked(
        &mut self,
        tile: TileCoord,
        blocked: bool,
        out_events: &mut Vec<Event>,
    ) -> Result<bool, PlacementError> {
        if !blocked && query::tower_at(self, tile).is_some() {
            return Err(PlacementError::Occupied);
        }
        let changed = self.mutate_tile(tile, blocked)?;
        if changed {
            self.repath(out_events);
        }
        Ok(changed)
    }

    fn mutate_tile(&mut self, tile: TileCoord, blocked: bool) -> Result<bool, PlacementError> {
        if blocked
            && self.config.reject_disconnecting_placements
            && !self.grid.is_blocked(tile)
            && !self.grid.is_reserved(tile)
            && self.would_disconnect(tile)
        {
            return Err(PlacementError::WouldDisconnect);
        }
        self.grid.set_blocked(tile, blocked)
    }

    fn would_disconnect(&mut self, candidate: TileCoord) -> bool {
        let mut hypothetical = PathGraph::default();
        let grid = &self.grid;
        hypothetical.rebuild_with(
            grid.columns(),
            grid.rows(),
            self.config.connectivity,
            |tile| {
                if tile == candidate {
                    None
                } else {
                    grid.open_position(tile)
                }
            },
        );
        self.finder
            .find_path(&hypothetical, grid.start(), grid.end())
            .is_empty()
    }

    fn rebuild_navigation(&mut self) {
        let grid = &self.grid;
        self.graph.rebuild_with(
            grid.columns(),
            grid.rows(),
            self.config.connectivity,
            |tile| grid.open_position(tile),
        );
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "rebuilt path graph"
        );
        self.canonical_path = self
            .finder
            .find_path(&self.graph, grid.start(), grid.end());
    }

    fn repath(&mut self, out_events: &mut Vec<Event>) {
        self.rebuild_navigation();
        if self.canonical_path.is_empty() {
            warn!("start and end tiles are disconnected; enemies will wait");
        } else {
            info!(
                waypoints = self.canonical_path.len(),
                "canonical path recomputed"
            );
        }
        out_events.push(Event::PathChanged {
            path: self.canonical_path.clone(),
        });
        self.registry
            .broadcast_path(&self.canonical_path, out_events);
    }

    fn place_tower(&mut self, kind: TowerKind, tile: TileCoord, out_events: &mut Vec<Event>) {
        let outcome = self.mutate_tile(tile, true);
        let reason = match outcome {
            Ok(true) => None,
            Ok(false) => Some(PlacementError::Occupied),
            Err(reason) => Some(reason),
        };
        if let Some(reason) = reason {
            debug!(?tile, %reason, "rejected tower placement");
            out_events.push(Event::TowerPlacementRejected { kind, tile, reason });
            return;
        }

        let position = self.grid.world_position_of(tile).unwrap_or_default();
        let tower = self.registry.add(
            GameObject::Tower(Tower::new(kind, tile, position)),
            out_events,
        );
        out_events.push(Event::TowerPlaced { tower, kind, tile });
        self.repath(out_events);
    }

    fn remove_object(&mut self, object: ObjectId, out_events: &mut Vec<Event>) {
        let Some(removed) = self.registry.remove(object, out_events) else {
            return;
        };
        let GameObject::Tower(tower) = removed else {
            return;
        };
        out_events.push(Event::TowerRemoved {
            tower: object,
            tile: tower.tile(),
        });
        if let Ok(true) = self.grid.set_blocked(tower.tile(), false) {
            self.repath(out_events);
        }
    }

    fn spawn_enemy(&mut self, speed: f32, out_events: &mut Vec<Event>) {
        let spawn_position = self
            .grid
            .world_position_of(self.grid.start())
            .unwrap_or(self.config.origin);
        let mut agent = AgentPathState::new(speed, spawn_position);
        let _ = agent.assign(&self.canonical_path);
        let state = agent.state();
        if state == AgentState::Stuck {
            debug!("enemy spawned without a path");
        }
        let enemy = self
            .registry
            .add(GameObject::Enemy(Enemy::new(agent)), out_events);
        out_events.push(Event::EnemySpawned { enemy, state });
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        let escaped = self.registry.update(dt, out_events);
        if escaped.is_empty() {
            return;
        }

        let lost = u32::try_from(escaped.len()).unwrap_or(u32::MAX);
        self.lives = self.lives.saturating_sub(lost);
        info!(escaped = escaped.len(), lives = self.lives, "enemies escaped");
        out_events.push(Event::LivesChanged { lives: self.lives });
    }

    fn reset_level(&mut self, out_events: &mut Vec<Event>) {
        self.registry.clear(out_events);
        self.grid.unblock_all();
        self.level = self.level.saturating_add(1);
        info!(level = self.level, "level reset");
        out_events.push(Event::LevelReset { level: self.level });
        self.repath(out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::from_valid_config(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTower { kind, tile } => world.place_tower(kind, tile, out_events),
        Command::RemoveObject { object } => world.remove_object(object, out_events),
        Command::SpawnEnemy { speed } => world.spawn_enemy(speed, out_events),
        Command::AddDecoration { tile } => {
            if let Some(position) = world.grid.world_position_of(tile) {
                let _ = world.registry.add(
                    GameObject::Decoration(Decoration::new(tile, position)),
                    out_events,
                );
            }
        }
        Command::Tick { dt } => {
            if world.play_mode == PlayMode::Attack {
                world.advance(dt, out_events);
            }
        }
        Command::SelectObject { object } => {
            if world.registry.select(object) {
                out_events.push(Event::SelectionChanged {
                    selected: Some(object),
                });
            }
        }
        Command::DeselectAll => {
            world.registry.deselect_all();
            out_events.push(Event::SelectionChanged { selected: None });
        }
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
        Command::ResetLevel => world.reset_level(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use tile_defense_core::{AgentState, ObjectId, Path, PlayMode, TileCoord};

    use super::{GameObject, Grid, World, WorldConfig};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Current canonical path. Empty when start and end are disconnected.
    #[must_use]
    pub fn canonical_path(world: &World) -> &Path {
        &world.canonical_path
    }

    /// Reports whether the tile is blocked. Out of range tiles count as blocked.
    #[must_use]
    pub fn is_blocked(world: &World, tile: TileCoord) -> bool {
        world.grid.is_blocked(tile)
    }

    /// Object stored under the identifier.
    #[must_use]
    pub fn object(world: &World, id: ObjectId) -> Option<&GameObject> {
        world.registry.get(id)
    }

    /// Iterator over live objects in identifier order.
    pub fn objects(world: &World) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        world.registry.iter()
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(world: &World) -> usize {
        world.registry.len()
    }

    /// Currently selected object, if any.
    #[must_use]
    pub fn selected(world: &World) -> Option<ObjectId> {
        world.registry.selected()
    }

    /// Position and navigation state of every live enemy in identifier order.
    #[must_use]
    pub fn enemy_positions(world: &World) -> Vec<(ObjectId, Vec3, AgentState)> {
        world
            .registry
            .iter()
            .filter_map(|(id, object)| {
                object
                    .as_enemy()
                    .map(|enemy| (id, enemy.agent().position(), enemy.agent().state()))
            })
            .collect()
    }

    /// Tower occupying the provided tile, if any.
    #[must_use]
    pub fn tower_at(world: &World, tile: TileCoord) -> Option<ObjectId> {
        world.registry.iter().find_map(|(id, object)| {
            object
                .as_tower()
                .filter(|tower| tower.tile() == tile)
                .map(|_| id)
        })
    }

    /// Active play mode.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.play_mode
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// One-based index of the current level.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_world_has_open_canonical_path() {
        let world = World::default();
        let path = query::canonical_path(&world);

        assert_eq!(path.len(), 19);
        assert_eq!(path.tiles().next(), Some(TileCoord::new(0, 0)));
        assert_eq!(path.tiles().last(), Some(TileCoord::new(9, 9)));
        assert_eq!(query::lives(&world), DEFAULT_LIVES);
        assert_eq!(query::level(&world), 1);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let empty = WorldConfig {
            columns: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            World::new(empty),
            Err(ConfigError::EmptyGrid { columns: 0, .. })
        ));

        let bad_start = WorldConfig {
            start: TileCoord::new(10, 0),
            ..WorldConfig::default()
        };
        assert_eq!(
            World::new(bad_start).err(),
            Some(ConfigError::StartOutOfBounds(TileCoord::new(10, 0)))
        );

        let bad_length = WorldConfig {
            tile_length: -1.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            World::new(bad_length),
            Err(ConfigError::InvalidTileLength(_))
        ));
    }

    #[test]
    fn opt_in_check_rejects_disconnecting_placement() {
        let mut world = World::new(WorldConfig {
            columns: 3,
            rows: 1,
            start: TileCoord::new(0, 0),
            end: TileCoord::new(2, 0),
            reject_disconnecting_placements: true,
            ..WorldConfig::default()
        })
        .expect("valid config");
        let mut events = Vec::new();

        assert_eq!(
            world.set_blocked(TileCoord::new(1, 0), true, &mut events),
            Err(PlacementError::WouldDisconnect)
        );
        assert!(events.is_empty());
        assert!(!query::is_blocked(&world, TileCoord::new(1, 0)));
        assert_eq!(query::canonical_path(&world).len(), 3);
    }
}
