pub mod collision;
pub mod deferred;
pub mod entity;
pub mod resolver;
pub mod scheduler;
pub mod state;
pub mod tile_grid;
pub mod world;

pub use collision::{
    is_blocking, sample, sample_enemy, sample_player, CollisionOutcome, CollisionSample,
    SampleOrigin, SamplePoint, SamplingPattern,
};
pub use deferred::{DeferredAction, DeferredQueue};
pub use entity::{Aabb, Animation, Entity, EntityId, EntityIdAllocator, EntityKind, Vec2};
pub use resolver::{resolve, resolve_enemy, resolve_player, BoundaryClamp};
pub use scheduler::{
    EntityUpdateScheduler, MotionIntent, PhysicsParams, SimEvent, SystemId, TickReport,
    SYSTEM_ORDER, SYSTEM_ORDER_TEXT,
};
pub use state::{GamePhase, GameState, MenuItem, PauseMenu};
pub use tile_grid::{TileGrid, EMPTY_SYMBOL, OUT_OF_BOUNDS_SYMBOL, SOLID_SYMBOLS};
pub use world::{LevelSetup, LevelWorld, ParallaxLayer};
