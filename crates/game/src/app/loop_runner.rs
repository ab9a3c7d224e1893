use std::process::ExitCode;

use skyline_engine::{run_app, LoopIo};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::trace_sink::{TraceAudio, TraceFrameSink};

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let mut frames = TraceFrameSink::default();
    let mut audio = TraceAudio::default();
    let io = LoopIo {
        intents: &mut app.autopilot,
        frames: &mut frames,
        audio: &mut audio,
    };

    match run_app(app.config, io) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                ticks = summary.ticks,
                phase = ?summary.final_phase,
                level = summary.level,
                phase_changes = frames.phase_changes(),
                sounds = audio.one_shots(),
                "run_complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}
