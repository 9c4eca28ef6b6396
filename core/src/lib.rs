#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Defense engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! renderers to react to. Paths travel through the surface as immutable
//! [`Path`] values that are replaced wholesale whenever the grid changes.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Describes the active gameplay mode for the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Standard attack mode where enemies advance toward the end tile.
    #[default]
    Attack,
    /// Builder mode that pauses simulation to enable planning and placement.
    Builder,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests placement of a tower on the provided tile.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Tile the tower should block.
        tile: TileCoord,
    },
    /// Requests removal of any live object. Removing a tower reopens its tile.
    RemoveObject {
        /// Identifier of the object targeted for removal.
        object: ObjectId,
    },
    /// Requests that a new enemy enter the grid at the start tile.
    SpawnEnemy {
        /// Travel speed expressed in world units per second.
        speed: f32,
    },
    /// Places a static decorative object that never affects navigation.
    AddDecoration {
        /// Tile the decoration sits on.
        tile: TileCoord,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Marks the provided object as the current selection.
    SelectObject {
        /// Identifier of the object to select.
        object: ObjectId,
    },
    /// Clears the current selection.
    DeselectAll,
    /// Requests that the world transition to the provided play mode.
    SetPlayMode {
        /// Mode the world should activate.
        mode: PlayMode,
    },
    /// Tears the level down and starts the next one on a fresh grid.
    ResetLevel,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active after processing commands.
        mode: PlayMode,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the registry.
        tower: ObjectId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Tile blocked by the tower.
        tile: TileCoord,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Tile provided in the placement request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed and its tile reopened.
    TowerRemoved {
        /// Identifier of the tower that was removed.
        tower: ObjectId,
        /// Tile previously blocked by the tower.
        tile: TileCoord,
    },
    /// Carries the freshly recomputed canonical path.
    PathChanged {
        /// New canonical path. Empty when start and end are disconnected.
        path: Path,
    },
    /// Confirms that an enemy entered the grid.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: ObjectId,
        /// State the enemy resolved to after receiving its first path.
        state: AgentState,
    },
    /// Reports that an enemy changed navigation state.
    AgentStateChanged {
        /// Identifier of the enemy.
        object: ObjectId,
        /// State the enemy transitioned into.
        state: AgentState,
    },
    /// Reports that an enemy reached the end tile and left the grid.
    EnemyEscaped {
        /// Identifier of the enemy that escaped.
        enemy: ObjectId,
    },
    /// Confirms that an object joined the registry.
    ObjectAdded {
        /// Identifier assigned to the object.
        object: ObjectId,
        /// Variant of the object.
        kind: ObjectKind,
    },
    /// Confirms that an object left the registry. Adapters release any
    /// resources tied to the identifier.
    ObjectRemoved {
        /// Identifier of the removed object.
        object: ObjectId,
    },
    /// Hints that render resources of the listed objects should be refreshed.
    ResourcesInvalidated {
        /// Objects whose resources were marked dirty.
        objects: Vec<ObjectId>,
    },
    /// Reports the current selection after a selection command.
    SelectionChanged {
        /// Selected object, if any.
        selected: Option<ObjectId>,
    },
    /// Reports the remaining player lives.
    LivesChanged {
        /// Lives left after the change.
        lives: u32,
    },
    /// Confirms that a new level started.
    LevelReset {
        /// One-based index of the level that started.
        level: u32,
    },
}

/// Location of a single grid tile expressed as column and row coordinates.
///
/// The column is the logical `x` axis and the row the logical `y` axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Returns the neighbouring tile in the provided direction when it lies
    /// inside a grid of `columns` by `rows` tiles.
    #[must_use]
    pub fn neighbor(self, direction: Direction, columns: u32, rows: u32) -> Option<TileCoord> {
        let (dx, dy) = direction.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        if column < columns && row < rows {
            Some(TileCoord::new(column, row))
        } else {
            None
        }
    }
}

/// Movement directions between neighbouring tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
    /// Diagonal movement combining north and east.
    NorthEast,
    /// Diagonal movement combining south and east.
    SouthEast,
    /// Diagonal movement combining south and west.
    SouthWest,
    /// Diagonal movement combining north and west.
    NorthWest,
}

impl Direction {
    /// Cardinal directions in the order used to break ties during search.
    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// All directions: cardinals first, then diagonals clockwise from north-east.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Column and row offsets applied when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::NorthEast => (1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Cardinal components of a diagonal direction. Cardinals return `None`.
    #[must_use]
    pub const fn diagonal_components(self) -> Option<(Direction, Direction)> {
        match self {
            Self::NorthEast => Some((Self::North, Self::East)),
            Self::SouthEast => Some((Self::South, Self::East)),
            Self::SouthWest => Some((Self::South, Self::West)),
            Self::NorthWest => Some((Self::North, Self::West)),
            Self::North | Self::East | Self::South | Self::West => None,
        }
    }
}

/// Neighbourhood used when connecting open tiles into the path graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Tiles connect to their north, east, south and west neighbours.
    #[default]
    Four,
    /// Tiles additionally connect diagonally when no corner is cut.
    Eight,
}

impl Connectivity {
    /// Directions enumerated for this neighbourhood in tie-break order.
    #[must_use]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Self::Four => &Direction::CARDINAL,
            Self::Eight => &Direction::ALL,
        }
    }
}

/// Unique identifier assigned to an object held by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Variants of objects that live in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Mobile agent travelling from the start tile to the end tile.
    Enemy,
    /// Obstacle blocking a single tile.
    Tower,
    /// Static scenery without navigation impact.
    Decoration,
}

/// Types of towers that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Entry level tower.
    Basic,
    /// Mid tier tower.
    Advanced,
    /// Most expensive tower available to the player.
    Heavy,
}

impl TowerKind {
    /// Every buildable tower kind in menu order.
    pub const ALL: [TowerKind; 3] = [TowerKind::Basic, TowerKind::Advanced, TowerKind::Heavy];

    /// Human readable label shown by adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Heavy => "heavy",
        }
    }
}

/// Reasons a tile mutation or tower placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested tile lies outside the configured grid bounds.
    #[error("tile lies outside the grid")]
    OutOfBounds,
    /// The requested tile is the start or end tile, which can never be blocked.
    #[error("start and end tiles cannot be blocked")]
    ReservedTile,
    /// The requested tile is already blocked or holds a tower.
    #[error("tile is occupied")]
    Occupied,
    /// Blocking the tile would disconnect the start tile from the end tile.
    #[error("blocking the tile would disconnect start from end")]
    WouldDisconnect,
}

/// Navigation state of a single agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Created but not yet bound to a path.
    #[default]
    Spawning,
    /// Following the canonical path.
    Moving,
    /// Waiting in place because no path connects start and end.
    Stuck,
    /// Reached the end tile or was destroyed. Terminal.
    Despawned,
}

/// Single step of a [`Path`]: the tile and its world position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Logical tile visited by the path.
    pub tile: TileCoord,
    /// World position of the tile used as a spline control point.
    pub position: Vec3,
}

impl Waypoint {
    /// Creates a waypoint for the provided tile and world position.
    #[must_use]
    pub const fn new(tile: TileCoord, position: Vec3) -> Self {
        Self { tile, position }
    }
}

/// Ordered waypoint sequence from the start tile to the end tile, inclusive.
///
/// An empty path signals that no route exists. Paths are never mutated after
/// construction; recomputation produces a new value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Creates a path from the provided waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Creates the empty "no path exists" value.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
        }
    }

    /// Reports whether the path carries no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints contained in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Iterator over the tiles visited by the path.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.waypoints.iter().map(|waypoint| waypoint.tile)
    }

    /// World positions of the waypoints, used as spline control points.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec3> {
        self.waypoints
            .iter()
            .map(|waypoint| waypoint.position)
            .collect()
    }

    /// Reports whether the path visits the provided tile.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.tiles().any(|visited| visited == tile)
    }
}
