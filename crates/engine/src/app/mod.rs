mod audio;
mod game;
mod input;
mod loop_runner;
mod metrics;
mod render;

pub use audio::{AudioCommand, AudioSink, EffectMode, NullAudio, SoundId, TrackId};
pub use game::{Game, GameCommand};
pub use input::{InputAction, InputSnapshot, Intent, IntentCollector};
pub use loop_runner::{
    run_app, run_app_with_metrics, run_game, AppError, IntentSource, LoopConfig, LoopIo,
    RunSummary,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use render::{
    DebugView, FrameSink, FrameSnapshot, HealthTier, MenuView, NullFrameSink, RenderEntity,
};
