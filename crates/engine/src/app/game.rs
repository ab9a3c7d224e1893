use tracing::{info, warn};

use super::audio::{AudioCommand, EffectMode, SoundId, TrackId};
use super::input::{InputAction, InputSnapshot};
use super::render::FrameSnapshot;
use crate::config::{ConfigError, GameConfig};
use crate::level::{build_level_world, level_fingerprint, LevelSource};
use crate::sim::{
    DeferredAction, EntityUpdateScheduler, GamePhase, GameState, LevelWorld, MenuItem, MotionIntent,
    PhysicsParams, SimEvent, TickReport, Vec2,
};

/// Horizontal distance ahead of the player at which the debug intent drops an enemy.
const DEBUG_SPAWN_AHEAD_PX: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    Continue,
    Quit,
}

/// Owns the level state machine and the current level, and turns per-tick
/// input into simulation, state transitions and audio requests.
pub struct Game {
    config: GameConfig,
    levels: Box<dyn LevelSource>,
    state: GameState,
    world: Option<LevelWorld>,
    scheduler: EntityUpdateScheduler,
    audio: Vec<AudioCommand>,
    last_tick_events: usize,
}

impl Game {
    pub fn new(config: GameConfig, levels: Box<dyn LevelSource>) -> Self {
        let state = GameState::new(levels.level_count());
        Self {
            config,
            levels,
            state,
            world: None,
            scheduler: EntityUpdateScheduler::new(),
            audio: Vec::new(),
            last_tick_events: 0,
        }
    }

    /// Loads the first level. A layout error leaves the game in [`GamePhase::Error`].
    pub fn start(&mut self) {
        let level = self.state.level();
        self.load_level(level);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn world(&self) -> Option<&LevelWorld> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut LevelWorld> {
        self.world.as_mut()
    }

    pub fn scheduler(&self) -> &EntityUpdateScheduler {
        &self.scheduler
    }

    pub fn live_entity_count(&self) -> usize {
        self.world.as_ref().map_or(0, LevelWorld::live_entity_count)
    }

    /// Simulation events raised by the most recent `update`.
    pub fn last_tick_event_count(&self) -> usize {
        self.last_tick_events
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(
            &self.state,
            self.world.as_ref(),
            self.config.player_screen_offset,
        )
    }

    pub fn drain_audio(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.audio)
    }

    pub fn update(&mut self, elapsed_ms: f32, input: &InputSnapshot) -> GameCommand {
        self.last_tick_events = 0;
        if input.was_pressed(InputAction::Quit) {
            return GameCommand::Quit;
        }

        match self.state.phase() {
            GamePhase::Loading => {}
            GamePhase::Playing | GamePhase::LevelTransition => {
                self.update_simulating(elapsed_ms, input);
            }
            GamePhase::Paused => return self.update_paused(input),
            GamePhase::Won => {
                if input.was_pressed(InputAction::Continue) {
                    if let Some(level) = self.state.continue_after_win() {
                        self.load_level(level);
                    }
                }
            }
            GamePhase::GameOver | GamePhase::Error => {
                if input.was_pressed(InputAction::Restart) {
                    self.restart_level();
                }
            }
        }
        GameCommand::Continue
    }

    fn update_simulating(&mut self, elapsed_ms: f32, input: &InputSnapshot) {
        if input.was_pressed(InputAction::Pause) {
            if self.state.pause() {
                self.play_track(TrackId::Level, EffectMode::Echo);
            }
            return;
        }
        if input.was_pressed(InputAction::Restart) {
            self.restart_level();
            return;
        }
        if input.was_pressed(InputAction::DebugToggle) {
            self.state.toggle_fast_run();
        }

        let Some(world) = self.world.as_mut() else {
            return;
        };
        if input.was_pressed(InputAction::SpawnEnemy) {
            let x = world.player().position.x + DEBUG_SPAWN_AHEAD_PX;
            let id = world.spawn_enemy(Vec2::new(x, self.config.layout.enemy_spawn_y));
            info!(id = id.0, x, "debug_enemy_spawned");
        }

        // The player is frozen once the portal has been reached.
        let motion = if self.state.phase() == GamePhase::LevelTransition {
            MotionIntent::default()
        } else {
            MotionIntent {
                move_left: input.is_down(InputAction::MoveLeft),
                move_right: input.is_down(InputAction::MoveRight),
                jump: input.is_down(InputAction::Jump),
                fire: input.was_pressed(InputAction::Fire),
            }
        };
        let params = PhysicsParams::from_config(&self.config, self.state.fast_run());
        let report = self.scheduler.tick(world, &params, motion, elapsed_ms);
        self.last_tick_events = report.events.len();

        let player_down = world.player().health.is_some_and(|health| health < 1);
        if player_down {
            if self.state.game_over() {
                self.audio.push(AudioCommand::StopOneShots);
                self.audio.push(AudioCommand::StopTrack);
            }
            return;
        }
        self.handle_events(&report);

        for action in self.state.advance_clock(elapsed_ms) {
            match action {
                DeferredAction::LoadLevel { level } => self.load_level(level),
            }
        }
    }

    fn handle_events(&mut self, report: &TickReport) {
        for event in &report.events {
            match *event {
                SimEvent::ProjectileFired { .. } => {
                    self.audio.push(AudioCommand::PlayOneShot(SoundId::Fire));
                }
                SimEvent::LowHealthWarning { health } => {
                    warn!(health, "player_low_health");
                    self.audio.push(AudioCommand::PlayOneShot(SoundId::LowHealth));
                }
                SimEvent::BossDefeated { .. } => {
                    self.audio
                        .push(AudioCommand::PlayOneShot(SoundId::BossDefeated));
                    if self.state.is_final_level() && self.state.declare_won() {
                        self.play_track(TrackId::Victory, EffectMode::None);
                    }
                }
                SimEvent::PortalReached => self.begin_level_transition(),
                SimEvent::ProjectileExpired { .. }
                | SimEvent::EnemyDefeated { .. }
                | SimEvent::PlayerHit { .. }
                | SimEvent::PlayerDefeated
                | SimEvent::KeyCollected => {}
            }
        }
    }

    fn begin_level_transition(&mut self) {
        if !self
            .state
            .trigger_level_transition(self.config.level_change_delay_ms)
        {
            return;
        }
        if let Some(world) = self.world.as_mut() {
            world.player_mut().velocity.x = 0.0;
            world.silence_projectiles();
        }
        self.audio.push(AudioCommand::StopOneShots);
        self.audio.push(AudioCommand::PlayOneShot(SoundId::Portal));
    }

    fn update_paused(&mut self, input: &InputSnapshot) -> GameCommand {
        if input.was_pressed(InputAction::MenuUp) {
            self.state.menu_mut().move_up();
        }
        if input.was_pressed(InputAction::MenuDown) {
            self.state.menu_mut().move_down();
        }

        let mut resume = input.was_pressed(InputAction::Resume)
            || input.was_pressed(InputAction::Pause);
        if input.was_pressed(InputAction::MenuSelect) {
            match self.state.menu().selected() {
                MenuItem::Resume => resume = true,
                MenuItem::RestartLevel => {
                    self.restart_level();
                    return GameCommand::Continue;
                }
                MenuItem::DebugMode => {
                    self.state.toggle_pending_debug_overlay();
                }
                MenuItem::Exit => return GameCommand::Quit,
            }
        }

        if resume && self.state.resume() {
            self.play_track(TrackId::Level, EffectMode::None);
        }
        GameCommand::Continue
    }

    fn restart_level(&mut self) {
        if let Some(level) = self.state.restart() {
            self.load_level(level);
        }
    }

    fn load_level(&mut self, level: u32) {
        self.state.begin_loading(level);
        let level = self.state.level();
        let final_level = self.state.is_final_level();
        match self.build_world(level, final_level) {
            Ok(world) => {
                self.world = Some(world);
                self.state.finish_loading();
                self.play_track(TrackId::Level, EffectMode::None);
            }
            Err(error) => {
                self.world = None;
                self.state.fail_loading(error.to_string());
                self.audio.push(AudioCommand::StopOneShots);
                self.audio.push(AudioCommand::StopTrack);
            }
        }
    }

    fn build_world(&self, level: u32, final_level: bool) -> Result<LevelWorld, ConfigError> {
        let text = self.levels.level_text(level)?;
        let world = build_level_world(level, &text, &self.config, final_level)?;
        info!(
            level,
            fingerprint = %level_fingerprint(&text),
            columns = world.grid().columns(),
            rows = world.grid().rows(),
            enemies = world.enemies().len(),
            boss = world.boss().is_some(),
            entity_count = world.live_entity_count(),
            "level_loaded"
        );
        Ok(world)
    }

    fn play_track(&mut self, track: TrackId, effect: EffectMode) {
        self.audio.push(AudioCommand::PlayTrack { track, effect });
    }
}
