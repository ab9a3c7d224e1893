use crate::sim::{Aabb, Entity, EntityId, EntityKind, GamePhase, GameState, LevelWorld, MenuItem, Vec2};

/// Health bar colour band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTier {
    Green,
    Orange,
    Red,
}

impl HealthTier {
    /// Enemies use a 140-point scale; the player and boss use a 1000-point one.
    pub fn for_entity(kind: EntityKind, health: i32) -> Self {
        let (green_above, orange_above) = match kind {
            EntityKind::Enemy => (80, 50),
            _ => (800, 500),
        };
        if health > green_above {
            Self::Green
        } else if health > orange_above {
            Self::Orange
        } else {
            Self::Red
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub bounds: Aabb,
    pub scale: f32,
    pub flip_x: bool,
    pub frame: u32,
    pub health: Option<i32>,
    pub health_tier: Option<HealthTier>,
}

impl RenderEntity {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            position: entity.position,
            bounds: entity.bounds(),
            scale: entity.scale,
            flip_x: entity.flip_x,
            frame: entity.animation.frame(),
            health: entity.health,
            health_tier: entity
                .health
                .map(|health| HealthTier::for_entity(entity.kind, health)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    pub items: Vec<&'static str>,
    pub selected: usize,
    pub debug_mode_pending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugView {
    pub player_position: Vec2,
    pub hitboxes: Vec<Aabb>,
}

/// Read-only view of one frame for an external renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub phase: GamePhase,
    pub level: u32,
    pub game_time_ms: f64,
    /// Pixel offset at which the tile grid is drawn so the player stays at
    /// the screen anchor.
    pub tile_offset: Vec2,
    pub parallax_offsets: Vec<f32>,
    pub entities: Vec<RenderEntity>,
    pub menu: Option<MenuView>,
    pub debug: Option<DebugView>,
    pub error: Option<String>,
}

impl FrameSnapshot {
    pub fn capture(
        state: &GameState,
        world: Option<&LevelWorld>,
        player_screen_offset: f32,
    ) -> Self {
        let mut frame = Self {
            phase: state.phase(),
            level: state.level(),
            game_time_ms: 0.0,
            tile_offset: Vec2::default(),
            parallax_offsets: Vec::new(),
            entities: Vec::new(),
            menu: None,
            debug: None,
            error: state.error().map(str::to_string),
        };

        if state.phase() == GamePhase::Paused {
            frame.menu = Some(MenuView {
                items: MenuItem::ALL.iter().map(|item| item.label()).collect(),
                selected: state.menu().selected_index(),
                debug_mode_pending: state.pending_debug_overlay(),
            });
        }

        let Some(world) = world else {
            return frame;
        };
        let player = world.player();
        frame.game_time_ms = world.game_time_ms();
        frame.tile_offset = Vec2::new(
            -(player.position.x - player_screen_offset),
            -(world.grid().tile_height() as f32),
        );
        frame.parallax_offsets = world
            .parallax()
            .iter()
            .map(|layer| layer.offset_for(player.position.x))
            .collect();

        let drawn = std::iter::once(world.portal())
            .chain(std::iter::once(world.key()))
            .chain(std::iter::once(player))
            .chain(world.enemies().iter())
            .chain(world.boss())
            .chain(world.projectiles().iter())
            .filter(|entity| entity.visible);
        frame.entities = drawn.map(RenderEntity::from_entity).collect();

        if state.debug_overlay() {
            let attacks = world
                .enemies()
                .iter()
                .chain(world.boss())
                .filter_map(|entity| entity.attack.as_deref());
            frame.debug = Some(DebugView {
                player_position: player.position,
                hitboxes: frame
                    .entities
                    .iter()
                    .map(|entity| entity.bounds)
                    .chain(attacks.map(Entity::bounds))
                    .collect(),
            });
        }
        frame
    }
}

pub trait FrameSink {
    fn present(&mut self, frame: &FrameSnapshot);
}

#[derive(Debug, Default)]
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn present(&mut self, _frame: &FrameSnapshot) {}
}
