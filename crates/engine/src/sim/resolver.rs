use super::collision::{CollisionOutcome, SamplePoint, SamplingPattern};
use super::entity::Entity;
use super::tile_grid::TileGrid;

pub const SETTLE_VELOCITY: f32 = 0.02;
pub const CEILING_BOUNCE_VELOCITY: f32 = -0.02;
pub const FLOOR_NUDGE_PX: f32 = 2.0;
pub const PLAYER_CEILING_NUDGE_PX: f32 = 15.0;
pub const ENEMY_CEILING_NUDGE_PX: f32 = 10.0;
pub const PLAYER_SIDE_NUDGE_PX: f32 = 4.0;
pub const ENEMY_SIDE_NUDGE_PX: f32 = 2.0;
pub const ENEMY_SIDE_VELOCITY: f32 = 0.01;

pub fn resolve(entity: &mut Entity, outcome: &CollisionOutcome) {
    match outcome.pattern() {
        SamplingPattern::Player => resolve_player(entity, outcome),
        SamplingPattern::Enemy => resolve_enemy(entity, outcome),
    }
}

/// Rules fire independently, in sample order. Bottom-side pushes are
/// skipped while standing on a floor; top corners always push.
pub fn resolve_player(entity: &mut Entity, outcome: &CollisionOutcome) {
    let on_floor = outcome.is_blocked(SamplePoint::Bottom);
    if on_floor {
        entity.velocity.y = SETTLE_VELOCITY;
        entity.position.y -= FLOOR_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::Top) {
        entity.velocity.y = CEILING_BOUNCE_VELOCITY;
        entity.position.y += PLAYER_CEILING_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::TopLeft) {
        entity.position.x += PLAYER_SIDE_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::TopRight) {
        entity.position.x -= PLAYER_SIDE_NUDGE_PX;
    }
    if on_floor {
        return;
    }
    if outcome.is_blocked(SamplePoint::BottomLeft) {
        entity.position.x += PLAYER_SIDE_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::BottomRight) {
        entity.position.x -= PLAYER_SIDE_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::Left) {
        entity.position.x += PLAYER_SIDE_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::Right) {
        entity.position.x -= PLAYER_SIDE_NUDGE_PX;
    }
}

/// Side hits also set a small horizontal velocity; RIGHT is applied before LEFT.
pub fn resolve_enemy(entity: &mut Entity, outcome: &CollisionOutcome) {
    if outcome.is_blocked(SamplePoint::Bottom) {
        entity.velocity.y = SETTLE_VELOCITY;
        entity.position.y -= FLOOR_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::Top) {
        entity.velocity.y = CEILING_BOUNCE_VELOCITY;
        entity.position.y += ENEMY_CEILING_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::Right) {
        entity.velocity.x = ENEMY_SIDE_VELOCITY;
        entity.position.x -= ENEMY_SIDE_NUDGE_PX;
    }
    if outcome.is_blocked(SamplePoint::Left) {
        entity.velocity.x = -ENEMY_SIDE_VELOCITY;
        entity.position.x += ENEMY_SIDE_NUDGE_PX;
    }
}

/// Keeps an entity inside the playable part of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryClamp {
    pub map_pixel_height: f32,
    pub anchor_offset: f32,
    /// Rightmost x at which the screen still shows map tiles.
    pub last_visible_x: f32,
    pub ceiling_y: f32,
}

impl BoundaryClamp {
    pub fn for_grid(grid: &TileGrid, screen_width: u32, anchor_offset: f32) -> Self {
        Self {
            map_pixel_height: grid.pixel_height() as f32,
            anchor_offset,
            last_visible_x: grid.pixel_width() as f32 - (screen_width as f32 - anchor_offset),
            ceiling_y: grid.tile_height() as f32 * 2.0,
        }
    }

    /// Applies the four edges in order: floor, left, right, ceiling. Returns
    /// whether anything changed.
    pub fn apply(&self, entity: &mut Entity) -> bool {
        let before = (entity.position, entity.velocity);
        if entity.position.y + entity.height > self.map_pixel_height {
            // one pixel above the floor so the next bottom probe still lands on ground
            entity.position.y = self.map_pixel_height - entity.height - 1.0;
        }
        if entity.position.x < self.anchor_offset {
            entity.position.x = self.anchor_offset;
        }
        if entity.position.x > self.last_visible_x {
            entity.position.x = self.last_visible_x;
        }
        if entity.position.y < self.ceiling_y {
            entity.position.y = self.ceiling_y;
            entity.velocity.y = 0.0;
        }
        before != (entity.position, entity.velocity)
    }
}
