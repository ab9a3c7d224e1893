use super::entity::Entity;
use super::tile_grid::{is_solid_symbol, TileGrid, OUT_OF_BOUNDS_SYMBOL};

/// Named probe positions on an entity's box. Which pixel each one maps to
/// depends on the [`SamplingPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplePoint {
    Bottom,
    Top,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
}

const PLAYER_POINTS: [SamplePoint; 8] = [
    SamplePoint::Bottom,
    SamplePoint::Top,
    SamplePoint::TopLeft,
    SamplePoint::TopRight,
    SamplePoint::BottomLeft,
    SamplePoint::BottomRight,
    SamplePoint::Left,
    SamplePoint::Right,
];

const ENEMY_POINTS: [SamplePoint; 4] = [
    SamplePoint::Bottom,
    SamplePoint::Top,
    SamplePoint::Left,
    SamplePoint::Right,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplingPattern {
    /// Eight points on a screen-anchored, scaled sprite.
    Player,
    /// Four points straight from world position.
    Enemy,
}

impl SamplingPattern {
    /// Points in outcome order.
    pub const fn points(self) -> &'static [SamplePoint] {
        match self {
            Self::Player => &PLAYER_POINTS,
            Self::Enemy => &ENEMY_POINTS,
        }
    }

    /// Pixel probed for `point`, or `None` when the pattern has no such point.
    ///
    /// Player: LEFT and RIGHT probe the bottom corners, so they repeat
    /// BOTTOM_LEFT and BOTTOM_RIGHT. Enemy: BOTTOM probes half a height below
    /// the origin, TOP a full height above it, the sides half a height above.
    pub fn pixel(
        self,
        point: SamplePoint,
        origin: SampleOrigin,
        width: i32,
        height: i32,
    ) -> Option<(i32, i32)> {
        let SampleOrigin { x, y } = origin;
        let pixel = match (self, point) {
            (Self::Player, SamplePoint::Top) => (x + width / 2, y),
            (Self::Player, SamplePoint::Bottom) => (x + width / 2, y + height),
            (Self::Player, SamplePoint::TopLeft) => (x, y),
            (Self::Player, SamplePoint::TopRight) => (x + width, y),
            (Self::Player, SamplePoint::BottomLeft | SamplePoint::Left) => (x, y + height),
            (Self::Player, SamplePoint::BottomRight | SamplePoint::Right) => {
                (x + width, y + height)
            }
            (Self::Enemy, SamplePoint::Bottom) => (x + width / 2, y + height / 2),
            (Self::Enemy, SamplePoint::Top) => (x + width / 2, y - height),
            (Self::Enemy, SamplePoint::Left) => (x, y - height / 2),
            (Self::Enemy, SamplePoint::Right) => (x + width, y - height / 2),
            (Self::Enemy, _) => return None,
        };
        Some(pixel)
    }
}

/// Integer pixel the pattern offsets are applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleOrigin {
    pub x: i32,
    pub y: i32,
}

impl SampleOrigin {
    /// Maps the player's world position into the grid's pixel space. The x
    /// offset is recomputed from the position as `trunc(-x / 2)`, not taken
    /// from the configured screen anchor, and the result is divided by the
    /// sample scale. Casts truncate toward zero.
    pub fn for_player(entity: &Entity, tile_height: u32, sample_scale: f32) -> Self {
        let x = entity.position.x;
        let x_offset = (-x / 2.0) as i32;
        let sample_x = (f64::from(x - x_offset as f32) / f64::from(sample_scale)) as i32;
        let y_offset = tile_height as i32 * 2;
        let sample_y = (entity.position.y as i32 - y_offset) + tile_height as i32;
        Self {
            x: sample_x,
            y: sample_y,
        }
    }

    pub fn for_enemy(entity: &Entity) -> Self {
        Self {
            x: entity.position.x as i32,
            y: entity.position.y as i32,
        }
    }
}

/// `.` and the `?` sentinel are passable; so is every symbol outside the solid set.
pub fn is_blocking(symbol: char) -> bool {
    is_solid_symbol(symbol)
}

/// Symbols found at each point of a pattern, in [`SamplingPattern::points`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionSample {
    pattern: SamplingPattern,
    symbols: Vec<char>,
}

impl CollisionSample {
    pub fn pattern(&self) -> SamplingPattern {
        self.pattern
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn symbol(&self, point: SamplePoint) -> Option<char> {
        let index = self.pattern.points().iter().position(|p| *p == point)?;
        self.symbols.get(index).copied()
    }

    pub fn outcome(&self) -> CollisionOutcome {
        CollisionOutcome {
            pattern: self.pattern,
            blocked: self.symbols.iter().map(|symbol| is_blocking(*symbol)).collect(),
        }
    }
}

/// One blocked flag per sample point, parallel to [`SamplingPattern::points`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionOutcome {
    pattern: SamplingPattern,
    blocked: Vec<bool>,
}

impl CollisionOutcome {
    pub fn pattern(&self) -> SamplingPattern {
        self.pattern
    }

    pub fn flags(&self) -> &[bool] {
        &self.blocked
    }

    /// `false` for points the pattern does not sample.
    pub fn is_blocked(&self, point: SamplePoint) -> bool {
        self.pattern
            .points()
            .iter()
            .position(|p| *p == point)
            .and_then(|index| self.blocked.get(index).copied())
            .unwrap_or(false)
    }

    pub fn any_blocked(&self) -> bool {
        self.blocked.iter().any(|flag| *flag)
    }
}

pub fn sample(
    grid: &TileGrid,
    pattern: SamplingPattern,
    origin: SampleOrigin,
    width: i32,
    height: i32,
) -> CollisionSample {
    let tile_width = grid.tile_width() as i32;
    let tile_height = grid.tile_height() as i32;
    let symbols = pattern
        .points()
        .iter()
        .map(|point| match pattern.pixel(*point, origin, width, height) {
            Some((px, py)) => grid.symbol_at(px / tile_width, py / tile_height),
            None => OUT_OF_BOUNDS_SYMBOL,
        })
        .collect();
    CollisionSample { pattern, symbols }
}

pub fn sample_player(grid: &TileGrid, entity: &Entity, sample_scale: f32) -> CollisionSample {
    let origin = SampleOrigin::for_player(entity, grid.tile_height(), sample_scale);
    sample(
        grid,
        SamplingPattern::Player,
        origin,
        entity.width as i32,
        entity.height as i32,
    )
}

pub fn sample_enemy(grid: &TileGrid, entity: &Entity) -> CollisionSample {
    sample(
        grid,
        SamplingPattern::Enemy,
        SampleOrigin::for_enemy(entity),
        entity.width as i32,
        entity.height as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntitySpec;
    use crate::sim::entity::{EntityId, EntityKind, Vec2};
    use crate::sim::tile_grid::{EMPTY_SYMBOL, SOLID_SYMBOLS};

    fn open_grid(columns: usize, rows: usize) -> TileGrid {
        let row = ".".repeat(columns);
        let rows: Vec<String> = (0..rows).map(|_| row.clone()).collect();
        TileGrid::from_rows(&rows, 32, 32).expect("grid")
    }

    fn entity_at(kind: EntityKind, x: f32, y: f32, width: f32, height: f32) -> Entity {
        let spec = EntitySpec {
            width,
            height,
            scale: 1.0,
            frame_count: 1,
            frame_duration_ms: 60,
            health: None,
        };
        Entity::from_spec(EntityId(0), kind, &spec, Vec2::new(x, y))
    }

    #[test]
    fn symbol_classification_vectors() {
        for symbol in SOLID_SYMBOLS {
            assert!(is_blocking(symbol), "{symbol} should block");
        }
        assert!(is_blocking('p'));
        assert!(!is_blocking(EMPTY_SYMBOL));
        assert!(!is_blocking(OUT_OF_BOUNDS_SYMBOL));
        assert!(!is_blocking('5'));
        assert!(!is_blocking('k'));
    }

    #[test]
    fn player_origin_truncates_like_integer_math() {
        let player = entity_at(EntityKind::Player, 301.0, 100.7, 32.0, 48.0);
        let origin = SampleOrigin::for_player(&player, 32, 1.5);
        // x_offset = trunc(-150.5) = -150; (301 + 150) / 1.5 = 300.66 -> 300
        assert_eq!(origin, SampleOrigin { x: 300, y: 68 });
    }

    #[test]
    fn player_pattern_probes_corners_and_repeats_bottom_corners_for_sides() {
        let origin = SampleOrigin { x: 100, y: 40 };
        let pattern = SamplingPattern::Player;
        assert_eq!(pattern.pixel(SamplePoint::Top, origin, 32, 48), Some((116, 40)));
        assert_eq!(pattern.pixel(SamplePoint::Bottom, origin, 32, 48), Some((116, 88)));
        assert_eq!(
            pattern.pixel(SamplePoint::Left, origin, 32, 48),
            pattern.pixel(SamplePoint::BottomLeft, origin, 32, 48)
        );
        assert_eq!(
            pattern.pixel(SamplePoint::Right, origin, 32, 48),
            Some((132, 88))
        );
    }

    #[test]
    fn enemy_pattern_has_no_corners() {
        let origin = SampleOrigin { x: 64, y: 96 };
        let pattern = SamplingPattern::Enemy;
        assert_eq!(pattern.pixel(SamplePoint::TopLeft, origin, 48, 48), None);
        assert_eq!(pattern.pixel(SamplePoint::Bottom, origin, 48, 48), Some((88, 120)));
        assert_eq!(pattern.pixel(SamplePoint::Top, origin, 48, 48), Some((88, 48)));
        assert_eq!(pattern.pixel(SamplePoint::Left, origin, 48, 48), Some((64, 72)));
        assert_eq!(pattern.pixel(SamplePoint::Right, origin, 48, 48), Some((112, 72)));
    }

    #[test]
    fn open_grid_yields_all_false_outcome() {
        let grid = open_grid(20, 10);
        let player = entity_at(EntityKind::Player, 200.0, 120.0, 32.0, 48.0);
        let outcome = sample_player(&grid, &player, 1.5).outcome();
        assert_eq!(outcome.flags().len(), 8);
        assert!(outcome.flags().iter().all(|flag| !flag));
        assert!(!outcome.any_blocked());
    }

    #[test]
    fn samples_outside_grid_are_sentinel_and_unblocked() {
        let grid = open_grid(4, 4);
        let enemy = entity_at(EntityKind::Enemy, 5000.0, 5000.0, 48.0, 48.0);
        let sample = sample_enemy(&grid, &enemy);
        assert!(sample
            .symbols()
            .iter()
            .all(|symbol| *symbol == OUT_OF_BOUNDS_SYMBOL));
        assert!(!sample.outcome().any_blocked());
    }

    #[test]
    fn enemy_on_ground_blocks_bottom_only() {
        let mut rows = vec![".".repeat(10); 5];
        rows.push("g".repeat(10));
        let grid = TileGrid::from_rows(&rows, 32, 32).expect("grid");
        // bottom probe at y + 24 = 165 -> row 5 (ground)
        let enemy = entity_at(EntityKind::Enemy, 64.0, 141.0, 48.0, 48.0);
        let sample = sample_enemy(&grid, &enemy);
        assert_eq!(sample.symbol(SamplePoint::Bottom), Some('g'));
        let outcome = sample.outcome();
        assert_eq!(outcome.flags(), &[true, false, false, false]);
        assert!(outcome.is_blocked(SamplePoint::Bottom));
        assert!(!outcome.is_blocked(SamplePoint::TopLeft));
    }

    #[test]
    fn sampling_is_deterministic_without_mutation() {
        let mut rows = vec![".tp.".repeat(5); 6];
        rows.push("g".repeat(20));
        let grid = TileGrid::from_rows(&rows, 32, 32).expect("grid");
        let player = entity_at(EntityKind::Player, 250.0, 150.0, 32.0, 48.0);
        let first = sample_player(&grid, &player, 1.5);
        let second = sample_player(&grid, &player, 1.5);
        assert_eq!(first, second);
        assert_eq!(first.outcome(), second.outcome());
    }
}
