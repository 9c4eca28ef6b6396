//! ASCII rendering of the grid for terminal output.

use std::collections::BTreeSet;

use tile_defense_core::TileCoord;
use tile_defense_world::{query, World};

const OPEN: char = '.';
const TOWER: char = '#';
const PATH: char = '*';
const ENEMY: char = 'e';
const START: char = 'S';
const END: char = 'E';

/// Renders one line per grid row. Enemies are drawn over every open tile,
/// including start and end, so agents waiting at the entry stay visible.
pub(crate) fn render(world: &World) -> String {
    let grid = query::grid(world);
    let path: BTreeSet<TileCoord> = query::canonical_path(world).tiles().collect();
    let enemies: BTreeSet<TileCoord> = query::objects(world)
        .filter_map(|(_, object)| object.as_enemy())
        .filter_map(|enemy| {
            let agent = enemy.agent();
            agent
                .tile()
                .or_else(|| grid.nearest_tile(agent.position()))
        })
        .collect();

    let mut output = String::new();
    for row in 0..grid.rows() {
        for column in 0..grid.columns() {
            let tile = TileCoord::new(column, row);
            let glyph = if grid.is_blocked(tile) {
                TOWER
            } else if enemies.contains(&tile) {
                ENEMY
            } else if tile == grid.start() {
                START
            } else if tile == grid.end() {
                END
            } else if path.contains(&tile) {
                PATH
            } else {
                OPEN
            };
            output.push(glyph);
        }
        output.push('\n');
    }
    output
}
