//! Static-size tile table owning the logical open/blocked state.

use glam::Vec3;
use tile_defense_core::{PlacementError, TileCoord};

use crate::WorldConfig;

/// Single cell of the logical grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    coord: TileCoord,
    world_position: Vec3,
    blocked: bool,
}

impl Tile {
    /// Logical coordinate of the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// World position renderers place the tile mesh at.
    #[must_use]
    pub const fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Reports whether a tower currently blocks the tile.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.blocked
    }
}

/// Dense row-major table of tiles with fixed start and end tiles.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    start: TileCoord,
    end: TileCoord,
    tiles: Vec<Tile>,
}

impl Grid {
    pub(crate) fn new(config: &WorldConfig) -> Self {
        let mut tiles = Vec::with_capacity(config.tile_count());
        for row in 0..config.rows {
            for column in 0..config.columns {
                let offset = Vec3::new(
                    column as f32 * config.tile_length,
                    config.elevation,
                    row as f32 * config.tile_length,
                );
                tiles.push(Tile {
                    coord: TileCoord::new(column, row),
                    world_position: config.origin + offset,
                    blocked: false,
                });
            }
        }

        Self {
            columns: config.columns,
            rows: config.rows,
            tile_length: config.tile_length,
            start: config.start,
            end: config.end,
            tiles,
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Tile where enemies enter the grid.
    #[must_use]
    pub const fn start(&self) -> TileCoord {
        self.start
    }

    /// Tile where enemies leave the grid.
    #[must_use]
    pub const fn end(&self) -> TileCoord {
        self.end
    }

    /// All tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at the provided coordinate, if it lies inside the grid.
    #[must_use]
    pub fn tile_at(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).and_then(|index| self.tiles.get(index))
    }

    /// World position of the tile at the provided coordinate.
    #[must_use]
    pub fn world_position_of(&self, coord: TileCoord) -> Option<Vec3> {
        self.tile_at(coord).map(Tile::world_position)
    }

    /// World position of the tile when it is open. Blocked and out of range
    /// tiles yield `None`.
    #[must_use]
    pub fn open_position(&self, coord: TileCoord) -> Option<Vec3> {
        self.tile_at(coord)
            .filter(|tile| !tile.blocked)
            .map(Tile::world_position)
    }

    /// Tile whose world position lies closest to `position`.
    #[must_use]
    pub fn nearest_tile(&self, position: Vec3) -> Option<TileCoord> {
        self.tiles
            .iter()
            .min_by(|a, b| {
                a.world_position
                    .distance_squared(position)
                    .total_cmp(&b.world_position.distance_squared(position))
            })
            .map(Tile::coord)
    }

    /// Reports whether the tile is blocked. Out of range tiles count as blocked.
    #[must_use]
    pub fn is_blocked(&self, coord: TileCoord) -> bool {
        self.tile_at(coord).map_or(true, Tile::is_blocked)
    }

    /// Reports whether the tile is the start or end tile.
    #[must_use]
    pub fn is_reserved(&self, coord: TileCoord) -> bool {
        coord == self.start || coord == self.end
    }

    /// Sets the occupancy of a tile, returning whether it changed.
    pub(crate) fn set_blocked(
        &mut self,
        coord: TileCoord,
        blocked: bool,
    ) -> Result<bool, PlacementError> {
        let reserved = self.is_reserved(coord);
        let index = self.index(coord).ok_or(PlacementError::OutOfBounds)?;
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(PlacementError::OutOfBounds)?;

        if tile.blocked == blocked {
            return Ok(false);
        }
        if blocked && reserved {
            return Err(PlacementError::ReservedTile);
        }

        tile.blocked = blocked;
        Ok(true)
    }

    /// Reopens every tile.
    pub(crate) fn unblock_all(&mut self) {
        for tile in &mut self.tiles {
            tile.blocked = false;
        }
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            let row = usize::try_from(coord.row()).ok()?;
            let column = usize::try_from(coord.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(&WorldConfig {
            columns: 4,
            rows: 3,
            tile_length: 2.0,
            elevation: 0.5,
            origin: Vec3::new(-1.0, 0.0, -1.0),
            start: TileCoord::new(0, 0),
            end: TileCoord::new(3, 2),
            ..WorldConfig::default()
        })
    }

    #[test]
    fn world_positions_follow_tile_length_and_origin() {
        let grid = grid();
        assert_eq!(grid.tiles().len(), 12);
        assert_eq!(
            grid.world_position_of(TileCoord::new(2, 1)),
            Some(Vec3::new(3.0, 0.5, 1.0))
        );
        assert_eq!(grid.world_position_of(TileCoord::new(4, 0)), None);
    }

    #[test]
    fn nearest_tile_snaps_world_positions() {
        let grid = grid();
        assert_eq!(
            grid.nearest_tile(Vec3::new(3.4, 0.0, 0.6)),
            Some(TileCoord::new(2, 1))
        );
        assert_eq!(
            grid.nearest_tile(Vec3::new(-50.0, 0.0, 50.0)),
            Some(TileCoord::new(0, 2))
        );
    }

    #[test]
    fn set_blocked_reports_changes_only() {
        let mut grid = grid();
        let tile = TileCoord::new(1, 1);

        assert_eq!(grid.set_blocked(tile, true), Ok(true));
        assert_eq!(grid.set_blocked(tile, true), Ok(false));
        assert!(grid.is_blocked(tile));
        assert_eq!(grid.open_position(tile), None);
        assert_eq!(grid.set_blocked(tile, false), Ok(true));
        assert_eq!(grid.set_blocked(tile, false), Ok(false));
    }

    #[test]
    fn reserved_and_out_of_range_tiles_are_rejected() {
        let mut grid = grid();

        assert_eq!(
            grid.set_blocked(TileCoord::new(0, 0), true),
            Err(PlacementError::ReservedTile)
        );
        assert_eq!(
            grid.set_blocked(TileCoord::new(3, 2), true),
            Err(PlacementError::ReservedTile)
        );
        assert_eq!(grid.set_blocked(TileCoord::new(0, 0), false), Ok(false));
        assert_eq!(
            grid.set_blocked(TileCoord::new(9, 9), true),
            Err(PlacementError::OutOfBounds)
        );
        assert!(grid.is_blocked(TileCoord::new(9, 9)));
    }

    #[test]
    fn unblock_all_reopens_tiles() {
        let mut grid = grid();
        let _ = grid.set_blocked(TileCoord::new(1, 0), true);
        let _ = grid.set_blocked(TileCoord::new(2, 2), true);

        grid.unblock_all();

        assert!(grid.tiles().iter().all(|tile| !tile.is_blocked()));
    }
}
