use tracing::{debug, info};

use super::entity::{Entity, EntityId, EntityIdAllocator, EntityKind, Vec2};
use super::resolver::BoundaryClamp;
use super::tile_grid::{TileGrid, EMPTY_SYMBOL};
use crate::config::{EntityCatalog, EntitySpec, ParallaxSpec, TileCell};

/// Background sprite scrolled at a fraction of the player's x.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxLayer {
    pub entity: Entity,
    pub factor: f32,
}

impl ParallaxLayer {
    pub fn offset_for(&self, player_x: f32) -> f32 {
        -(player_x * self.factor)
    }
}

/// Everything [`LevelWorld::new`] needs that is fixed for the level's lifetime.
#[derive(Debug, Clone)]
pub struct LevelSetup {
    pub level: u32,
    pub final_level: bool,
    pub grid: TileGrid,
    pub clamp: BoundaryClamp,
    pub catalog: EntityCatalog,
    pub gate_cells: Vec<TileCell>,
    pub player_start: Vec2,
    pub key_position: Vec2,
    pub portal_position: Vec2,
}

/// One loaded level: the tile grid plus every entity that lives on it.
///
/// Enemies and projectiles are transient. Spawns and despawns requested while
/// a tick is iterating are queued and applied by [`LevelWorld::apply_pending`].
#[derive(Debug)]
pub struct LevelWorld {
    level: u32,
    final_level: bool,
    pub(crate) grid: TileGrid,
    pub(crate) clamp: BoundaryClamp,
    catalog: EntityCatalog,
    gate_cells: Vec<TileCell>,
    allocator: EntityIdAllocator,
    pub(crate) player: Entity,
    pub(crate) key: Entity,
    pub(crate) portal: Entity,
    pub(crate) boss: Option<Entity>,
    pub(crate) enemies: Vec<Entity>,
    pub(crate) projectiles: Vec<Entity>,
    parallax: Vec<ParallaxLayer>,
    key_collected: bool,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    game_time_ms: f64,
}

impl LevelWorld {
    pub fn new(setup: LevelSetup) -> Self {
        let LevelSetup {
            level,
            final_level,
            grid,
            clamp,
            catalog,
            gate_cells,
            player_start,
            key_position,
            portal_position,
        } = setup;
        let mut allocator = EntityIdAllocator::default();
        let player = Entity::from_spec(
            allocator.allocate(),
            EntityKind::Player,
            &catalog.player,
            player_start,
        );
        let key = Entity::from_spec(
            allocator.allocate(),
            EntityKind::Key,
            &catalog.key,
            key_position,
        );
        let portal = Entity::from_spec(
            allocator.allocate(),
            EntityKind::Portal,
            &catalog.portal,
            portal_position,
        );
        Self {
            level,
            final_level,
            grid,
            clamp,
            catalog,
            gate_cells,
            allocator,
            player,
            key,
            portal,
            boss: None,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            parallax: Vec::new(),
            key_collected: false,
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
            game_time_ms: 0.0,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_final_level(&self) -> bool {
        self.final_level
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn clamp(&self) -> &BoundaryClamp {
        &self.clamp
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.player
    }

    pub fn key(&self) -> &Entity {
        &self.key
    }

    pub fn portal(&self) -> &Entity {
        &self.portal
    }

    pub fn boss(&self) -> Option<&Entity> {
        self.boss.as_ref()
    }

    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    pub fn projectiles(&self) -> &[Entity] {
        &self.projectiles
    }

    pub fn parallax(&self) -> &[ParallaxLayer] {
        &self.parallax
    }

    pub fn key_collected(&self) -> bool {
        self.key_collected
    }

    pub fn game_time_ms(&self) -> f64 {
        self.game_time_ms
    }

    pub(crate) fn add_game_time(&mut self, elapsed_ms: f32) {
        self.game_time_ms += f64::from(elapsed_ms.max(0.0));
    }

    /// Player, key, portal, boss, enemies with their attacks, and projectiles.
    pub fn live_entity_count(&self) -> usize {
        let attacks = self
            .enemies
            .iter()
            .chain(self.boss.iter())
            .filter(|entity| entity.attack.is_some())
            .count();
        3 + usize::from(self.boss.is_some()) + self.enemies.len() + attacks + self.projectiles.len()
    }

    fn with_attack(&mut self, mut parent: Entity) -> Entity {
        let attack_spec = self.catalog.attack;
        let position = Vec2::new(
            parent.position.x,
            parent.position.y + parent.height - attack_spec.height,
        );
        let attack = Entity::from_spec(
            self.allocator.allocate(),
            EntityKind::Attack,
            &attack_spec,
            position,
        );
        parent.attack = Some(Box::new(attack));
        parent
    }

    /// Queues an enemy with its attack. Visible after the next `apply_pending`.
    pub fn spawn_enemy(&mut self, position: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        let enemy = Entity::from_spec(id, EntityKind::Enemy, &self.catalog.enemy, position);
        let enemy = self.with_attack(enemy);
        self.pending_spawns.push(enemy);
        id
    }

    pub fn spawn_boss(&mut self, position: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        let boss = Entity::from_spec(id, EntityKind::Boss, &self.catalog.boss, position);
        self.boss = Some(self.with_attack(boss));
        id
    }

    /// Queues a projectile at the player's leading edge, a quarter of the way
    /// down, facing the same way as the player.
    pub fn spawn_projectile(&mut self, speed: f32) -> EntityId {
        let id = self.allocator.allocate();
        let spec = self.catalog.projectile;
        let player = &self.player;
        let x = if player.flip_x {
            player.position.x - spec.width
        } else {
            player.position.x + player.width
        };
        let y = player.position.y + player.height / 4.0;
        let mut projectile =
            Entity::from_spec(id, EntityKind::Projectile, &spec, Vec2::new(x, y));
        projectile.flip_x = player.flip_x;
        projectile.velocity.x = if player.flip_x { -speed } else { speed };
        self.pending_spawns.push(projectile);
        id
    }

    pub fn add_parallax_layer(&mut self, spec: &ParallaxSpec) {
        let layer_spec = EntitySpec {
            width: spec.width,
            height: spec.height,
            scale: 1.0,
            frame_count: 1,
            frame_duration_ms: 60,
            health: None,
        };
        let entity = Entity::from_spec(
            self.allocator.allocate(),
            EntityKind::ParallaxLayer,
            &layer_spec,
            Vec2::new(spec.x, spec.y),
        );
        self.parallax.push(ParallaxLayer {
            entity,
            factor: spec.factor,
        });
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self
            .enemies
            .iter()
            .chain(self.projectiles.iter())
            .any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn is_pending_despawn(&self, id: EntityId) -> bool {
        self.pending_despawns.contains(&id)
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            let keep = |entity: &Entity| pending.binary_search(&entity.id).is_err();
            self.enemies.retain(keep);
            self.projectiles.retain(keep);
            self.pending_spawns.retain(keep);
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            for entity in self.pending_spawns.drain(..) {
                debug!(id = entity.id.0, kind = entity.kind.label(), "entity_spawned");
                match entity.kind {
                    EntityKind::Projectile => self.projectiles.push(entity),
                    _ => self.enemies.push(entity),
                }
            }
        }
    }

    /// Hides the key and opens every gate cell. Returns `false` if the key was
    /// already collected.
    pub fn collect_key(&mut self) -> bool {
        if self.key_collected {
            return false;
        }
        self.key_collected = true;
        self.key.visible = false;
        for cell in &self.gate_cells {
            self.grid.set_symbol(EMPTY_SYMBOL, cell.column, cell.row);
        }
        info!(
            level = self.level,
            gates_opened = self.gate_cells.len(),
            "key_collected"
        );
        true
    }

    pub fn silence_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            projectile.visible = false;
        }
    }
}
