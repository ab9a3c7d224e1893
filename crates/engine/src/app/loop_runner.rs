use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, GameConfig, GameConfigError};
use crate::level::{DirLevelSource, LevelSource};
use crate::sim::GamePhase;
use crate::{resolve_app_paths, StartupError};

use super::audio::AudioSink;
use super::game::{Game, GameCommand};
use super::input::{Intent, IntentCollector};
use super::metrics::MetricsAccumulator;
use super::render::FrameSink;
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    /// Stop after this many frames. `None` runs until a quit intent.
    pub max_frames: Option<u64>,
    /// Drive the accumulator from the wall clock. When off, every frame
    /// advances by exactly one fixed step and never sleeps.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            max_frames: None,
            realtime: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load game config: {0}")]
    Config(#[from] GameConfigError),
    #[error("failed to prepare levels: {0}")]
    Level(#[from] ConfigError),
    #[error("level {level} could not be loaded: {message}")]
    Unrecoverable { level: u32, message: String },
}

/// Produces the intents that arrive before a given frame.
pub trait IntentSource {
    fn poll_intents(&mut self, frame: u64) -> Vec<Intent>;
}

/// Where the loop reads intents from and sends frames and sounds to.
pub struct LoopIo<'a> {
    pub intents: &'a mut dyn IntentSource,
    pub frames: &'a mut dyn FrameSink,
    pub audio: &'a mut dyn AudioSink,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub ticks: u64,
    pub final_phase: GamePhase,
    pub level: u32,
    pub quit_requested: bool,
}

pub fn run_app(config: LoopConfig, io: LoopIo<'_>) -> Result<RunSummary, AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, io, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    io: LoopIo<'_>,
    metrics_handle: MetricsHandle,
) -> Result<RunSummary, AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        levels_dir = %app_paths.levels_dir.display(),
        config_path = %app_paths.config_path.display(),
        "startup"
    );
    let game_config = GameConfig::load(&app_paths.config_path)?;
    let levels = DirLevelSource::discover(&app_paths.levels_dir)?;
    info!(level_count = levels.level_count(), "levels_discovered");

    let mut game = Game::new(game_config, Box::new(levels));
    run_game(&config, &mut game, io, &metrics_handle)
}

/// Runs `game` on a fixed timestep until a quit intent, the frame limit, or
/// an unrecoverable level error.
pub fn run_game(
    config: &LoopConfig,
    game: &mut Game,
    io: LoopIo<'_>,
    metrics_handle: &MetricsHandle,
) -> Result<RunSummary, AppError> {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_ms = fixed_dt.as_secs_f32() * 1000.0;
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        max_render_fps = %format_render_cap(effective_render_cap),
        max_frames = ?config.max_frames,
        realtime = config.realtime,
        "loop_config"
    );

    let LoopIo {
        intents,
        frames,
        audio,
    } = io;
    game.start();
    for command in game.drain_audio() {
        audio.submit(command);
    }

    let mut input = IntentCollector::new();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut frame_index = 0u64;
    let mut tick_count = 0u64;
    let mut quit_requested = false;

    while !quit_requested && config.max_frames.map_or(true, |max| frame_index < max) {
        let frame_start = Instant::now();
        let raw_frame_dt = if config.realtime {
            frame_start.saturating_duration_since(last_frame_instant)
        } else {
            fixed_dt
        };
        last_frame_instant = frame_start;
        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

        for intent in intents.poll_intents(frame_index) {
            input.apply(intent);
        }

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        accumulator = step_plan.remaining_accumulator;
        for _ in 0..step_plan.ticks_to_run {
            let snapshot = input.snapshot_for_tick();
            let command = game.update(fixed_dt_ms, &snapshot);
            tick_count = tick_count.saturating_add(1);
            metrics_accumulator.record_tick(game.last_tick_event_count());
            for audio_command in game.drain_audio() {
                audio.submit(audio_command);
            }
            if command == GameCommand::Quit {
                quit_requested = true;
                break;
            }
        }
        if !step_plan.dropped_backlog.is_zero() {
            metrics_accumulator.record_clamp();
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        frames.present(&game.snapshot());

        if game.state().phase() == GamePhase::Error {
            let message = game.state().error().unwrap_or("unknown error").to_string();
            info!(frames = frame_index + 1, ticks = tick_count, "shutdown");
            return Err(AppError::Unrecoverable {
                level: game.state().level(),
                message,
            });
        }

        if config.realtime {
            let sleep_for = compute_cap_sleep(frame_start.elapsed(), render_frame_target);
            if !sleep_for.is_zero() {
                thread::sleep(sleep_for);
            }
        }

        metrics_accumulator.record_frame(raw_frame_dt, game.live_entity_count());
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                live_entities = snapshot.live_entities,
                peak_entities = snapshot.peak_entities,
                clamped_frames = snapshot.clamped_frames,
                sim_events = snapshot.sim_events,
                phase = ?game.state().phase(),
                level = game.state().level(),
                "loop_metrics"
            );
        }
        frame_index = frame_index.saturating_add(1);
    }

    let summary = RunSummary {
        frames: frame_index,
        ticks: tick_count,
        final_phase: game.state().phase(),
        level: game.state().level(),
        quit_requested,
    };
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        phase = ?summary.final_phase,
        level = summary.level,
        quit_requested,
        "shutdown"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::audio::{AudioCommand, SoundId};
    use crate::app::input::InputAction;
    use crate::app::render::FrameSnapshot;
    use crate::level::InMemoryLevelSource;
    use crate::test_support::{small_config, small_map_text};

    #[derive(Default)]
    struct Script {
        steps: Vec<(u64, Intent)>,
    }

    impl IntentSource for Script {
        fn poll_intents(&mut self, frame: u64) -> Vec<Intent> {
            self.steps
                .iter()
                .filter(|(at_frame, _)| *at_frame == frame)
                .map(|(_, intent)| *intent)
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingFrames {
        frames: Vec<FrameSnapshot>,
    }

    impl FrameSink for RecordingFrames {
        fn present(&mut self, frame: &FrameSnapshot) {
            self.frames.push(frame.clone());
        }
    }

    #[derive(Default)]
    struct RecordingAudio {
        commands: Vec<AudioCommand>,
    }

    impl AudioSink for RecordingAudio {
        fn submit(&mut self, command: AudioCommand) {
            self.commands.push(command);
        }
    }

    fn headless(max_frames: u64) -> LoopConfig {
        LoopConfig {
            max_frames: Some(max_frames),
            realtime: false,
            ..LoopConfig::default()
        }
    }

    fn small_game(levels: Vec<String>) -> Game {
        Game::new(small_config(), Box::new(InMemoryLevelSource::new(levels)))
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn plan_sim_steps_keeps_partial_step() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(20), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 1);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(4));
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }

    #[test]
    fn headless_run_ticks_once_per_frame() {
        let mut game = small_game(vec![small_map_text(); 3]);
        let mut script = Script::default();
        let mut frames = RecordingFrames::default();
        let mut audio = RecordingAudio::default();
        let io = LoopIo {
            intents: &mut script,
            frames: &mut frames,
            audio: &mut audio,
        };

        let summary =
            run_game(&headless(30), &mut game, io, &MetricsHandle::default()).expect("run");

        assert_eq!(summary.frames, 30);
        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.final_phase, GamePhase::Playing);
        assert!(!summary.quit_requested);
        assert_eq!(frames.frames.len(), 30);
        let last = frames.frames.last().expect("frame");
        assert!((last.game_time_ms - 30.0 * 1000.0 / 60.0).abs() < 0.01);
    }

    #[test]
    fn metrics_track_live_entities() {
        let mut game = small_game(vec![small_map_text(); 3]);
        let mut script = Script::default();
        let mut frames = RecordingFrames::default();
        let mut audio = RecordingAudio::default();
        let io = LoopIo {
            intents: &mut script,
            frames: &mut frames,
            audio: &mut audio,
        };
        let config = LoopConfig {
            metrics_log_interval: Duration::from_nanos(1),
            ..headless(5)
        };
        let metrics = MetricsHandle::default();

        run_game(&config, &mut game, io, &metrics).expect("run");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.live_entities, game.live_entity_count());
        assert!(snapshot.live_entities > 0);
        assert!(snapshot.peak_entities >= snapshot.live_entities);
        assert_eq!(snapshot.clamped_frames, 0);
    }

    #[test]
    fn scripted_intents_reach_the_game() {
        let mut game = small_game(vec![small_map_text(); 3]);
        let mut script = Script {
            steps: vec![
                (2, Intent::Press(InputAction::Fire)),
                (3, Intent::Release(InputAction::Fire)),
                (5, Intent::Press(InputAction::Quit)),
            ],
        };
        let mut frames = RecordingFrames::default();
        let mut audio = RecordingAudio::default();
        let io = LoopIo {
            intents: &mut script,
            frames: &mut frames,
            audio: &mut audio,
        };

        let summary =
            run_game(&headless(100), &mut game, io, &MetricsHandle::default()).expect("run");

        assert!(summary.quit_requested);
        assert_eq!(summary.frames, 6);
        assert_eq!(
            audio
                .commands
                .iter()
                .filter(|command| **command == AudioCommand::PlayOneShot(SoundId::Fire))
                .count(),
            1
        );
    }

    #[test]
    fn level_error_ends_run_as_unrecoverable() {
        let mut game = small_game(vec!["gg\n".to_string()]);
        let mut script = Script::default();
        let mut frames = RecordingFrames::default();
        let mut audio = RecordingAudio::default();
        let io = LoopIo {
            intents: &mut script,
            frames: &mut frames,
            audio: &mut audio,
        };

        let error = run_game(&headless(10), &mut game, io, &MetricsHandle::default())
            .expect_err("must fail");
        assert!(matches!(error, AppError::Unrecoverable { level: 1, .. }));
        assert_eq!(frames.frames.len(), 1);
        assert_eq!(frames.frames[0].phase, GamePhase::Error);
    }
}
