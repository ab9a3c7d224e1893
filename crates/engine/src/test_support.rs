//! Small level fixtures shared by unit tests.

use crate::config::{GameConfig, KeyRegion, LayoutConfig, TileCell};

pub(crate) const SMALL_COLUMNS: usize = 40;
pub(crate) const SMALL_ROWS: usize = 10;

/// 40x10 map: gate tiles at (25..=26, 2), ground on the bottom row, open elsewhere.
pub(crate) fn small_map_rows() -> Vec<String> {
    let mut rows = vec![".".repeat(SMALL_COLUMNS); SMALL_ROWS];
    rows[2].replace_range(25..27, "44");
    rows[SMALL_ROWS - 1] = "g".repeat(SMALL_COLUMNS);
    rows
}

pub(crate) fn small_map_text() -> String {
    let mut text = small_map_rows().join("\n");
    text.push('\n');
    text
}

/// Screen 400 px wide with the player anchored at x = 100, so the last
/// visible x (980) is past the portal (960).
pub(crate) fn small_config() -> GameConfig {
    GameConfig {
        screen_width: 400,
        screen_height: 320,
        player_screen_offset: 100.0,
        layout: LayoutConfig {
            key_region: KeyRegion {
                first_column: 10,
                last_column: 14,
                row: 7,
            },
            key_seed: 7,
            portal_tile: TileCell::new(30, 7),
            gate_cells: vec![TileCell::new(25, 2), TileCell::new(26, 2)],
            enemy_columns_by_level: vec![vec![8], vec![8, 20], vec![12]],
            enemy_spawn_y: 200.0,
            boss_column: 20,
        },
        ..GameConfig::default()
    }
}
