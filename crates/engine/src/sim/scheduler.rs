use tracing::{debug, info};

use super::collision::{sample_enemy, sample_player};
use super::entity::{Aabb, Entity, EntityId};
use super::resolver::resolve;
use super::world::LevelWorld;
use crate::config::GameConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemId {
    Gravity,
    Intent,
    Advance,
    Expiry,
    TileCollision,
    BoundaryClamp,
    Overlap,
    Cleanup,
}

impl SystemId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gravity => "Gravity",
            Self::Intent => "Intent",
            Self::Advance => "Advance",
            Self::Expiry => "Expiry",
            Self::TileCollision => "TileCollision",
            Self::BoundaryClamp => "BoundaryClamp",
            Self::Overlap => "Overlap",
            Self::Cleanup => "Cleanup",
        }
    }
}

/// Projectile expiry runs before overlap so a projectile that finished its
/// loop this tick never deals damage.
pub const SYSTEM_ORDER: [SystemId; 8] = [
    SystemId::Gravity,
    SystemId::Intent,
    SystemId::Advance,
    SystemId::Expiry,
    SystemId::TileCollision,
    SystemId::BoundaryClamp,
    SystemId::Overlap,
    SystemId::Cleanup,
];

pub const SYSTEM_ORDER_TEXT: &str =
    "Gravity>Intent>Advance>Expiry>TileCollision>BoundaryClamp>Overlap>Cleanup";

/// Per-tick tuning taken from [`GameConfig`]; `run_speed` already reflects
/// the fast-run debug toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub run_speed: f32,
    pub jump_velocity: f32,
    pub jump_animation_speed: f32,
    pub player_sample_scale: f32,
    pub projectile_speed: f32,
    pub projectile_damage: i32,
    pub attack_damage: i32,
    pub low_health_threshold: i32,
    pub attack_range: f32,
    pub attack_speed: f32,
}

impl PhysicsParams {
    pub fn from_config(config: &GameConfig, fast_run: bool) -> Self {
        Self {
            gravity: config.gravity,
            run_speed: if fast_run {
                config.fast_run_speed
            } else {
                config.run_speed
            },
            jump_velocity: config.jump_velocity,
            jump_animation_speed: config.jump_animation_speed,
            player_sample_scale: config.player_sample_scale,
            projectile_speed: config.projectile_speed,
            projectile_damage: config.projectile_damage,
            attack_damage: config.attack_damage,
            low_health_threshold: config.low_health_threshold,
            attack_range: config.attack_range,
            attack_speed: config.attack_speed,
        }
    }
}

/// Held movement state plus this tick's fire press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionIntent {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub fire: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    ProjectileFired { id: EntityId },
    ProjectileExpired { id: EntityId },
    EnemyDefeated { id: EntityId },
    BossDefeated { id: EntityId },
    PlayerHit { health: i32 },
    /// Player health dropped below the warning threshold this tick.
    LowHealthWarning { health: i32 },
    /// Player health dropped below 1 this tick.
    PlayerDefeated,
    KeyCollected,
    /// Player is past the portal with the key collected. Repeats every tick
    /// the condition holds.
    PortalReached,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<SimEvent>,
}

impl TickReport {
    pub fn contains(&self, event: SimEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn count_matching(&self, predicate: impl Fn(&SimEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

struct TickContext<'a> {
    world: &'a mut LevelWorld,
    params: &'a PhysicsParams,
    motion: MotionIntent,
    elapsed_ms: f32,
    report: &'a mut TickReport,
    defeated_enemies: Vec<EntityId>,
}

/// Runs one simulation tick over a [`LevelWorld`] in [`SYSTEM_ORDER`].
#[derive(Debug, Default)]
pub struct EntityUpdateScheduler {
    last_tick_order: Vec<SystemId>,
}

impl EntityUpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_tick_order(&self) -> &[SystemId] {
        &self.last_tick_order
    }

    pub fn tick(
        &mut self,
        world: &mut LevelWorld,
        params: &PhysicsParams,
        motion: MotionIntent,
        elapsed_ms: f32,
    ) -> TickReport {
        let mut report = TickReport::default();
        let mut context = TickContext {
            world,
            params,
            motion,
            elapsed_ms: elapsed_ms.max(0.0),
            report: &mut report,
            defeated_enemies: Vec::new(),
        };
        self.last_tick_order.clear();
        for system_id in SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            Self::run_system(system_id, &mut context);
        }
        report
    }

    fn run_system(system_id: SystemId, context: &mut TickContext<'_>) {
        match system_id {
            SystemId::Gravity => Self::gravity_system(context),
            SystemId::Intent => Self::intent_system(context),
            SystemId::Advance => Self::advance_system(context),
            SystemId::Expiry => Self::expiry_system(context),
            SystemId::TileCollision => Self::tile_collision_system(context),
            SystemId::BoundaryClamp => Self::boundary_clamp_system(context),
            SystemId::Overlap => Self::overlap_system(context),
            SystemId::Cleanup => Self::cleanup_system(context),
        }
    }

    fn gravity_system(context: &mut TickContext<'_>) {
        let dv = context.params.gravity * context.elapsed_ms;
        let world = &mut *context.world;
        world.player.velocity.y += dv;
        for enemy in &mut world.enemies {
            enemy.velocity.y += dv;
        }
        if let Some(boss) = world.boss.as_mut().filter(|boss| boss.visible) {
            boss.velocity.y += dv;
        }
    }

    fn intent_system(context: &mut TickContext<'_>) {
        let params = context.params;
        let motion = context.motion;
        let player = &mut context.world.player;
        match (motion.move_left, motion.move_right) {
            (false, true) => {
                player.velocity.x = params.run_speed;
                player.flip_x = false;
            }
            (true, false) => {
                player.velocity.x = -params.run_speed;
                player.flip_x = true;
            }
            (false, false) => player.velocity.x = 0.0,
            (true, true) => {}
        }
        player.animation.set_speed(1.0);
        if motion.jump {
            player.animation.set_speed(params.jump_animation_speed);
            player.velocity.y = params.jump_velocity;
        }
        if motion.fire {
            let id = context.world.spawn_projectile(params.projectile_speed);
            context.report.events.push(SimEvent::ProjectileFired { id });
        }
    }

    fn advance_system(context: &mut TickContext<'_>) {
        let elapsed_ms = context.elapsed_ms;
        let params = context.params;
        let world = &mut *context.world;
        world.player.advance(elapsed_ms);
        world.key.advance(elapsed_ms);
        world.portal.advance(elapsed_ms);
        let player_x = world.player.position.x;
        for enemy in &mut world.enemies {
            advance_with_attack(enemy, player_x, params, elapsed_ms);
        }
        if let Some(boss) = world.boss.as_mut().filter(|boss| boss.visible) {
            advance_with_attack(boss, player_x, params, elapsed_ms);
        }
        for projectile in &mut world.projectiles {
            projectile.advance(elapsed_ms);
        }
    }

    fn expiry_system(context: &mut TickContext<'_>) {
        let mut expired = Vec::new();
        for projectile in &mut context.world.projectiles {
            if projectile.animation.has_looped() {
                projectile.visible = false;
                expired.push(projectile.id);
            }
        }
        for id in expired {
            if context.world.despawn(id) {
                debug!(id = id.0, "projectile_expired");
                context
                    .report
                    .events
                    .push(SimEvent::ProjectileExpired { id });
            }
        }
    }

    fn tile_collision_system(context: &mut TickContext<'_>) {
        let sample_scale = context.params.player_sample_scale;
        let world = &mut *context.world;
        let outcome = sample_player(&world.grid, &world.player, sample_scale).outcome();
        resolve(&mut world.player, &outcome);
        for enemy in &mut world.enemies {
            let outcome = sample_enemy(&world.grid, enemy).outcome();
            resolve(enemy, &outcome);
        }
        if let Some(boss) = world.boss.as_mut().filter(|boss| boss.visible) {
            let outcome = sample_enemy(&world.grid, boss).outcome();
            resolve(boss, &outcome);
        }
    }

    fn boundary_clamp_system(context: &mut TickContext<'_>) {
        let world = &mut *context.world;
        let clamp = world.clamp;
        clamp.apply(&mut world.player);
        for enemy in &mut world.enemies {
            clamp.apply(enemy);
        }
        if let Some(boss) = world.boss.as_mut().filter(|boss| boss.visible) {
            clamp.apply(boss);
        }
    }

    fn overlap_system(context: &mut TickContext<'_>) {
        Self::projectile_hits(context);
        Self::attack_hits(context);
        Self::key_and_portal(context);
    }

    /// Drains every enemy a live projectile overlaps. An enemy that drops
    /// below zero is queued for removal and skips the remaining checks.
    fn projectile_hits(context: &mut TickContext<'_>) {
        let damage = context.params.projectile_damage;
        let world = &mut *context.world;
        let projectile_boxes: Vec<Aabb> = world
            .projectiles
            .iter()
            .filter(|projectile| !world.is_pending_despawn(projectile.id))
            .map(Entity::bounds)
            .collect();
        if projectile_boxes.is_empty() {
            return;
        }

        for enemy in &mut world.enemies {
            for projectile_box in &projectile_boxes {
                if !enemy.bounds().intersects(projectile_box) {
                    continue;
                }
                enemy.drain_health(damage);
                if enemy.is_defeated() {
                    context.defeated_enemies.push(enemy.id);
                    break;
                }
            }
        }

        if let Some(boss) = world.boss.as_mut().filter(|boss| boss.visible) {
            for projectile_box in &projectile_boxes {
                if boss.bounds().intersects(projectile_box) {
                    boss.drain_health(damage);
                }
            }
            if boss.is_defeated() {
                boss.visible = false;
                info!(id = boss.id.0, "boss_defeated");
                context
                    .report
                    .events
                    .push(SimEvent::BossDefeated { id: boss.id });
            }
        }

        for id in context.defeated_enemies.clone() {
            if world.despawn(id) {
                info!(id = id.0, "enemy_defeated");
                context.report.events.push(SimEvent::EnemyDefeated { id });
            }
        }
    }

    fn attack_hits(context: &mut TickContext<'_>) {
        let params = context.params;
        let world = &mut *context.world;
        let defeated = &context.defeated_enemies;
        let attack_boxes: Vec<Aabb> = world
            .enemies
            .iter()
            .filter(|enemy| !defeated.contains(&enemy.id))
            .chain(world.boss.iter().filter(|boss| boss.visible))
            .filter_map(|parent| parent.attack.as_deref())
            .filter(|attack| attack.visible)
            .map(Entity::bounds)
            .collect();

        let player_box = world.player.bounds();
        for attack_box in attack_boxes {
            if !player_box.intersects(&attack_box) {
                continue;
            }
            let before = world.player.health.unwrap_or(0);
            let Some(after) = world.player.drain_health(params.attack_damage) else {
                return;
            };
            context
                .report
                .events
                .push(SimEvent::PlayerHit { health: after });
            if before >= params.low_health_threshold && after < params.low_health_threshold {
                context
                    .report
                    .events
                    .push(SimEvent::LowHealthWarning { health: after });
            }
            if before >= 1 && after < 1 {
                context.report.events.push(SimEvent::PlayerDefeated);
            }
        }
    }

    fn key_and_portal(context: &mut TickContext<'_>) {
        let world = &mut *context.world;
        if !world.key_collected()
            && world.key.visible
            && world.player.bounds().intersects(&world.key.bounds())
            && world.collect_key()
        {
            context.report.events.push(SimEvent::KeyCollected);
        }
        if world.key_collected() && world.player.position.x > world.portal.position.x {
            context.report.events.push(SimEvent::PortalReached);
        }
    }

    fn cleanup_system(context: &mut TickContext<'_>) {
        context.world.apply_pending();
        context.world.add_game_time(context.elapsed_ms);
    }
}

/// Steers the attack toward the player when within range, advances the
/// parent, then keeps the attack level with the parent's feet.
fn advance_with_attack(parent: &mut Entity, player_x: f32, params: &PhysicsParams, elapsed_ms: f32) {
    if let Some(attack) = parent.attack.as_deref_mut() {
        let direction = if attack.position.x < player_x { 1.0 } else { -1.0 };
        attack.velocity.x = if (player_x - attack.position.x) * direction < params.attack_range {
            params.attack_speed * direction
        } else {
            0.0
        };
    }
    parent.advance(elapsed_ms);
    let feet_y = parent.position.y + parent.height;
    if let Some(attack) = parent.attack.as_deref_mut() {
        attack.position.y = feet_y - attack.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityCatalog, TileCell};
    use crate::sim::entity::{EntityKind, Vec2};
    use crate::sim::resolver::BoundaryClamp;
    use crate::sim::tile_grid::{TileGrid, EMPTY_SYMBOL};
    use crate::sim::world::LevelSetup;

    const DT: f32 = 16.0;

    fn params() -> PhysicsParams {
        PhysicsParams {
            gravity: 0.0,
            ..PhysicsParams::from_config(&GameConfig::default(), false)
        }
    }

    /// 40x10 open map with a gate strip at (25..=26, 2) and ground on the bottom row.
    fn test_world() -> LevelWorld {
        let mut rows = vec![".".repeat(40); 9];
        rows[2].replace_range(25..27, "44");
        rows.push("g".repeat(40));
        let grid = TileGrid::from_rows(&rows, 32, 32).expect("grid");
        let clamp = BoundaryClamp::for_grid(&grid, 400, 100.0);
        LevelWorld::new(LevelSetup {
            level: 1,
            final_level: false,
            grid,
            clamp,
            catalog: EntityCatalog::default(),
            gate_cells: vec![TileCell::new(25, 2), TileCell::new(26, 2)],
            player_start: Vec2::new(300.0, 150.0),
            key_position: Vec2::new(700.0, 150.0),
            portal_position: Vec2::new(900.0, 150.0),
        })
    }

    fn no_input() -> MotionIntent {
        MotionIntent::default()
    }

    #[test]
    fn tick_runs_systems_in_declared_order() {
        let mut world = test_world();
        let mut scheduler = EntityUpdateScheduler::new();
        scheduler.tick(&mut world, &params(), no_input(), DT);
        assert_eq!(scheduler.last_tick_order(), &SYSTEM_ORDER);
        let text: Vec<&str> = SYSTEM_ORDER.iter().map(|id| id.name()).collect();
        assert_eq!(text.join(">"), SYSTEM_ORDER_TEXT);
    }

    #[test]
    fn gravity_accumulates_then_jump_overrides() {
        let mut world = test_world();
        let mut scheduler = EntityUpdateScheduler::new();
        let physics = PhysicsParams {
            gravity: 0.0003,
            ..params()
        };
        scheduler.tick(&mut world, &physics, no_input(), 10.0);
        assert!((world.player().velocity.y - 0.003).abs() < 1e-6);

        let jump = MotionIntent {
            jump: true,
            ..no_input()
        };
        scheduler.tick(&mut world, &physics, jump, 10.0);
        assert_eq!(world.player().velocity.y, -0.2);
        assert_eq!(world.player().animation.speed(), 1.8);

        scheduler.tick(&mut world, &physics, no_input(), 10.0);
        assert_eq!(world.player().animation.speed(), 1.0);
    }

    #[test]
    fn run_intent_sets_velocity_and_facing() {
        let mut world = test_world();
        let mut scheduler = EntityUpdateScheduler::new();
        let left = MotionIntent {
            move_left: true,
            ..no_input()
        };
        scheduler.tick(&mut world, &params(), left, 100.0);
        assert_eq!(world.player().velocity.x, -0.1);
        assert!(world.player().flip_x);
        assert!((world.player().position.x - 290.0).abs() < 1e-3);

        let both = MotionIntent {
            move_left: true,
            move_right: true,
            ..no_input()
        };
        scheduler.tick(&mut world, &params(), both, 10.0);
        assert_eq!(world.player().velocity.x, -0.1);

        scheduler.tick(&mut world, &params(), no_input(), 10.0);
        assert_eq!(world.player().velocity.x, 0.0);
    }

    #[test]
    fn projectile_expires_on_loop_and_only_once() {
        let mut world = test_world();
        let mut scheduler = EntityUpdateScheduler::new();
        let fire = MotionIntent {
            fire: true,
            ..no_input()
        };
        let report = scheduler.tick(&mut world, &params(), fire, DT);
        assert_eq!(report.count_matching(|e| matches!(e, SimEvent::ProjectileFired { .. })), 1);
        assert_eq!(world.projectiles().len(), 1);

        // 7 frames x 60 ms = 420 ms; the 27th advance crosses it
        let mut expired = 0;
        for tick in 1..=40 {
            let report = scheduler.tick(&mut world, &params(), no_input(), DT);
            let expired_now =
                report.count_matching(|e| matches!(e, SimEvent::ProjectileExpired { .. }));
            expired += expired_now;
            if tick < 27 {
                assert_eq!(world.projectiles().len(), 1, "tick {tick}");
            }
            if tick == 27 {
                assert_eq!(expired_now, 1);
                assert!(world.projectiles().is_empty());
            }
        }
        assert_eq!(expired, 1);
    }

    #[test]
    fn defeated_enemy_is_removed_same_tick_and_stops_attacking() {
        let mut world = test_world();
        world.spawn_enemy(Vec2::new(300.0, 150.0));
        world.spawn_projectile(0.0);
        world.spawn_projectile(0.0);
        world.apply_pending();
        world.enemies[0].health = Some(1);
        let player_health = world.player().health;

        let mut scheduler = EntityUpdateScheduler::new();
        let report = scheduler.tick(&mut world, &params(), no_input(), DT);

        assert!(world.enemies().is_empty());
        assert_eq!(
            report.count_matching(|e| matches!(e, SimEvent::EnemyDefeated { .. })),
            1
        );
        assert!(!report.events.iter().any(|e| matches!(e, SimEvent::PlayerHit { .. })));
        assert_eq!(world.player().health, player_health);
    }

    #[test]
    fn live_enemy_attack_drains_player() {
        let mut world = test_world();
        world.spawn_enemy(Vec2::new(300.0, 150.0));
        world.apply_pending();

        let mut scheduler = EntityUpdateScheduler::new();
        let report = scheduler.tick(&mut world, &params(), no_input(), DT);
        assert!(report.contains(SimEvent::PlayerHit { health: 998 }));
        assert_eq!(world.player().health, Some(998));
    }

    #[test]
    fn low_health_warning_fires_on_crossing() {
        let mut world = test_world();
        world.spawn_enemy(Vec2::new(300.0, 150.0));
        world.apply_pending();
        world.player_mut().health = Some(501);

        let mut scheduler = EntityUpdateScheduler::new();
        let first = scheduler.tick(&mut world, &params(), no_input(), DT);
        assert!(first.contains(SimEvent::LowHealthWarning { health: 499 }));
        let second = scheduler.tick(&mut world, &params(), no_input(), DT);
        assert!(!second
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::LowHealthWarning { .. })));
    }

    #[test]
    fn boss_defeat_is_reported_once() {
        let mut world = test_world();
        let boss_id = world.spawn_boss(Vec2::new(500.0, 150.0));
        world.player_mut().position = Vec2::new(468.0, 150.0);
        world.spawn_projectile(0.0);
        world.apply_pending();
        world.boss.as_mut().expect("boss").health = Some(1);
        world.player_mut().position = Vec2::new(120.0, 150.0);

        let mut scheduler = EntityUpdateScheduler::new();
        let mut defeated = 0;
        for _ in 0..5 {
            let report = scheduler.tick(&mut world, &params(), no_input(), DT);
            defeated += report.count_matching(|e| *e == SimEvent::BossDefeated { id: boss_id });
        }
        assert_eq!(defeated, 1);
        assert!(!world.boss().expect("boss").visible);
    }

    #[test]
    fn touching_key_opens_gates_and_enables_portal() {
        let mut world = test_world();
        let mut scheduler = EntityUpdateScheduler::new();
        world.player_mut().position = Vec2::new(690.0, 150.0);
        let report = scheduler.tick(&mut world, &params(), no_input(), DT);
        assert!(report.contains(SimEvent::KeyCollected));
        assert_eq!(world.grid().symbol_at(25, 2), EMPTY_SYMBOL);
        assert!(!report.contains(SimEvent::PortalReached));

        world.player_mut().position = Vec2::new(950.0, 150.0);
        let report = scheduler.tick(&mut world, &params(), no_input(), DT);
        assert!(report.contains(SimEvent::PortalReached));
        assert!(!report.contains(SimEvent::KeyCollected));
    }

    #[test]
    fn portal_without_key_does_nothing() {
        let mut world = test_world();
        world.player_mut().position = Vec2::new(950.0, 150.0);
        let mut scheduler = EntityUpdateScheduler::new();
        let report = scheduler.tick(&mut world, &params(), no_input(), DT);
        assert!(!report.contains(SimEvent::PortalReached));
    }

    #[test]
    fn clamp_keeps_player_inside_map_after_tick() {
        let mut world = test_world();
        world.player_mut().position = Vec2::new(10.0, 10.0);
        let mut scheduler = EntityUpdateScheduler::new();
        scheduler.tick(&mut world, &params(), no_input(), DT);
        assert_eq!(world.player().position, Vec2::new(100.0, 64.0));
        assert_eq!(world.player().kind, EntityKind::Player);
    }

    #[test]
    fn game_time_accumulates_per_tick() {
        let mut world = test_world();
        let mut scheduler = EntityUpdateScheduler::new();
        for _ in 0..3 {
            scheduler.tick(&mut world, &params(), no_input(), DT);
        }
        assert_eq!(world.game_time_ms(), 48.0);
    }
}
