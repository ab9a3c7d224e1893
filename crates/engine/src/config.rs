use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while turning level data into a playable level. These are fatal
/// for the load that raised them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("level map has no rows")]
    EmptyMap,
    #[error("tile size must be non-zero, got {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },
    #[error("map row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error(
        "map is {columns}x{rows} tiles but key placement needs at least {min_columns}x{min_rows}"
    )]
    MapTooSmall {
        columns: u32,
        rows: u32,
        min_columns: u32,
        min_rows: u32,
    },
    #[error("no empty cell for the key in columns {first_column}..={last_column} of row {row}")]
    NoKeySpot {
        first_column: i32,
        last_column: i32,
        row: i32,
    },
    #[error("gate tile ({column},{row}) must be solid, found '{found}'")]
    MissingGateTile { column: i32, row: i32, found: char },
    #[error("portal tile ({column},{row}) lies outside the map")]
    PortalOutOfBounds { column: i32, row: i32 },
    #[error("level {level} does not exist (available: 1..={available})")]
    MissingLevel { level: u32, available: u32 },
    #[error("failed to read level file {path}: {source}")]
    ReadLevel {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GameConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse config json at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config value {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCell {
    pub column: i32,
    pub row: i32,
}

impl TileCell {
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySpec {
    pub width: f32,
    pub height: f32,
    #[serde(default = "unit_scale")]
    pub scale: f32,
    #[serde(default = "single_frame")]
    pub frame_count: u32,
    #[serde(default = "default_frame_ms")]
    pub frame_duration_ms: u32,
    #[serde(default)]
    pub health: Option<i32>,
}

fn unit_scale() -> f32 {
    1.0
}

fn single_frame() -> u32 {
    1
}

fn default_frame_ms() -> u32 {
    60
}

impl EntitySpec {
    fn sheet(width: f32, height: f32, frame_count: u32, frame_duration_ms: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            frame_count,
            frame_duration_ms,
            health: None,
        }
    }

    fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    fn with_health(mut self, health: i32) -> Self {
        self.health = Some(health);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntityCatalog {
    pub player: EntitySpec,
    pub enemy: EntitySpec,
    pub boss: EntitySpec,
    pub attack: EntitySpec,
    pub projectile: EntitySpec,
    pub key: EntitySpec,
    pub portal: EntitySpec,
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self {
            player: EntitySpec::sheet(32.0, 48.0, 9, 120)
                .with_scale(1.5)
                .with_health(1000),
            enemy: EntitySpec::sheet(48.0, 48.0, 4, 60).with_health(140),
            boss: EntitySpec::sheet(48.0, 48.0, 4, 60)
                .with_scale(3.0)
                .with_health(1400),
            attack: EntitySpec::sheet(32.0, 64.0, 8, 60),
            projectile: EntitySpec::sheet(64.0, 32.0, 7, 60),
            key: EntitySpec::sheet(32.0, 32.0, 1, 60),
            portal: EntitySpec::sheet(64.0, 96.0, 5, 120),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallaxSpec {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub factor: f32,
}

fn default_parallax() -> Vec<ParallaxSpec> {
    vec![
        ParallaxSpec {
            x: 0.0,
            y: 400.0,
            width: 1200.0,
            height: 400.0,
            factor: 0.15,
        },
        ParallaxSpec {
            x: 300.0,
            y: 270.0,
            width: 240.0,
            height: 400.0,
            factor: 0.2,
        },
        ParallaxSpec {
            x: 800.0,
            y: 270.0,
            width: 240.0,
            height: 400.0,
            factor: 0.3,
        },
        ParallaxSpec {
            x: 500.0,
            y: 270.0,
            width: 240.0,
            height: 400.0,
            factor: 0.1,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyRegion {
    pub first_column: i32,
    pub last_column: i32,
    pub row: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub key_region: KeyRegion,
    pub key_seed: u64,
    pub portal_tile: TileCell,
    pub gate_cells: Vec<TileCell>,
    /// Enemy spawn columns, one list per level. Levels past the end reuse the last list.
    pub enemy_columns_by_level: Vec<Vec<i32>>,
    pub enemy_spawn_y: f32,
    pub boss_column: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            key_region: KeyRegion {
                first_column: 142,
                last_column: 154,
                row: 13,
            },
            key_seed: 1337,
            portal_tile: TileCell::new(230, 13),
            gate_cells: vec![
                TileCell::new(218, 4),
                TileCell::new(219, 4),
                TileCell::new(220, 4),
            ],
            enemy_columns_by_level: vec![vec![40, 90], vec![40, 90, 170], vec![60, 120]],
            enemy_spawn_y: 200.0,
            boss_column: 210,
        }
    }
}

impl LayoutConfig {
    pub fn enemy_columns(&self, level: u32) -> &[i32] {
        let index = level.saturating_sub(1) as usize;
        self.enemy_columns_by_level
            .get(index)
            .or_else(|| self.enemy_columns_by_level.last())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub player_screen_offset: f32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub gravity: f32,
    pub run_speed: f32,
    pub fast_run_speed: f32,
    pub jump_velocity: f32,
    pub jump_animation_speed: f32,
    /// Horizontal factor between the player's world x and the x the tile sampler sees.
    pub player_sample_scale: f32,
    pub projectile_speed: f32,
    pub level_change_delay_ms: u32,
    pub projectile_damage: i32,
    pub attack_damage: i32,
    pub low_health_threshold: i32,
    pub attack_range: f32,
    pub attack_speed: f32,
    pub layout: LayoutConfig,
    pub entities: EntityCatalog,
    #[serde(default = "default_parallax")]
    pub parallax: Vec<ParallaxSpec>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 1200,
            screen_height: 800,
            player_screen_offset: 200.0,
            tile_width: 32,
            tile_height: 32,
            gravity: 0.0003,
            run_speed: 0.1,
            fast_run_speed: 1.0,
            jump_velocity: -0.2,
            jump_animation_speed: 1.8,
            player_sample_scale: 1.5,
            projectile_speed: 0.0,
            level_change_delay_ms: 2500,
            projectile_damage: 2,
            attack_damage: 2,
            low_health_threshold: 500,
            attack_range: 500.0,
            attack_speed: 0.04,
            layout: LayoutConfig::default(),
            entities: EntityCatalog::default(),
            parallax: default_parallax(),
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, GameConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| GameConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, GameConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer) {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let message = error.into_inner().to_string();
                return Err(GameConfigError::Parse { path, message });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameConfigError> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(GameConfigError::Invalid {
                field: "tile_width/tile_height",
                message: format!("{}x{} is not a usable tile", self.tile_width, self.tile_height),
            });
        }
        if !(0.0..self.screen_width as f32).contains(&self.player_screen_offset) {
            return Err(GameConfigError::Invalid {
                field: "player_screen_offset",
                message: format!(
                    "{} lies outside a {} px wide screen",
                    self.player_screen_offset, self.screen_width
                ),
            });
        }
        if self.player_sample_scale <= 0.0 {
            return Err(GameConfigError::Invalid {
                field: "player_sample_scale",
                message: "must be positive".to_string(),
            });
        }
        if self.level_change_delay_ms == 0 {
            return Err(GameConfigError::Invalid {
                field: "level_change_delay_ms",
                message: "must be positive".to_string(),
            });
        }
        let region = self.layout.key_region;
        if region.first_column > region.last_column || region.first_column < 0 || region.row < 0
        {
            return Err(GameConfigError::Invalid {
                field: "layout.key_region",
                message: format!(
                    "columns {}..={} on row {} is not a valid region",
                    region.first_column, region.last_column, region.row
                ),
            });
        }
        Ok(())
    }

    /// Smallest y any simulated entity may hold.
    pub fn ceiling_y(&self) -> f32 {
        self.tile_height as f32 * 2.0
    }
}
