use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::config::{ConfigError, GameConfig, TileCell};
use crate::sim::entity::Vec2;
use crate::sim::resolver::BoundaryClamp;
use crate::sim::tile_grid::{is_solid_symbol, TileGrid, EMPTY_SYMBOL};
use crate::sim::world::{LevelSetup, LevelWorld};

/// Parses `text` and places the player, key, portal, enemies, boss and
/// parallax layers for `level`. Any layout problem is a [`ConfigError`].
pub fn build_level_world(
    level: u32,
    text: &str,
    config: &GameConfig,
    final_level: bool,
) -> Result<LevelWorld, ConfigError> {
    let grid = TileGrid::from_source(text, config.tile_width, config.tile_height)?;
    let layout = &config.layout;

    let region = layout.key_region;
    let min_columns = (region.last_column + 1) as u32;
    let min_rows = (region.row + 1) as u32;
    if grid.columns() < min_columns || grid.rows() < min_rows {
        return Err(ConfigError::MapTooSmall {
            columns: grid.columns(),
            rows: grid.rows(),
            min_columns,
            min_rows,
        });
    }

    let portal = layout.portal_tile;
    if !grid.contains(portal.column, portal.row) {
        return Err(ConfigError::PortalOutOfBounds {
            column: portal.column,
            row: portal.row,
        });
    }

    for cell in &layout.gate_cells {
        let found = grid.symbol_at(cell.column, cell.row);
        if !is_solid_symbol(found) {
            return Err(ConfigError::MissingGateTile {
                column: cell.column,
                row: cell.row,
                found,
            });
        }
    }

    let key_cell = choose_key_cell(&grid, config, level)?;
    let tile_width = config.tile_width as f32;
    let tile_height = config.tile_height as f32;
    let key_position = Vec2::new(
        key_cell.column as f32 * tile_width,
        key_cell.row as f32 * tile_height + config.entities.key.height,
    );
    let portal_position = Vec2::new(
        portal.column as f32 * tile_width,
        portal.row as f32 * tile_height,
    );

    let clamp = BoundaryClamp::for_grid(&grid, config.screen_width, config.player_screen_offset);
    let mut world = LevelWorld::new(LevelSetup {
        level,
        final_level,
        grid,
        clamp,
        catalog: config.entities.clone(),
        gate_cells: layout.gate_cells.clone(),
        player_start: Vec2::new(config.player_screen_offset, 0.0),
        key_position,
        portal_position,
    });

    for column in layout.enemy_columns(level) {
        world.spawn_enemy(Vec2::new(*column as f32 * tile_width, layout.enemy_spawn_y));
    }
    if final_level {
        world.spawn_boss(Vec2::new(
            layout.boss_column as f32 * tile_width,
            layout.enemy_spawn_y,
        ));
    }
    for layer in &config.parallax {
        world.add_parallax_layer(layer);
    }
    world.apply_pending();

    debug!(
        level,
        key_column = key_cell.column,
        key_row = key_cell.row,
        enemies = world.enemies().len(),
        boss = world.boss().is_some(),
        "level_layout_built"
    );
    Ok(world)
}

/// Picks an empty cell in the key region. The RNG is seeded per level so a
/// given config always yields the same layout.
fn choose_key_cell(grid: &TileGrid, config: &GameConfig, level: u32) -> Result<TileCell, ConfigError> {
    let region = config.layout.key_region;
    let candidates: Vec<TileCell> = (region.first_column..=region.last_column)
        .filter(|column| grid.symbol_at(*column, region.row) == EMPTY_SYMBOL)
        .map(|column| TileCell::new(column, region.row))
        .collect();
    let mut rng = StdRng::seed_from_u64(config.layout.key_seed.wrapping_add(u64::from(level)));
    candidates
        .choose(&mut rng)
        .copied()
        .ok_or(ConfigError::NoKeySpot {
            first_column: region.first_column,
            last_column: region.last_column,
            row: region.row,
        })
}
