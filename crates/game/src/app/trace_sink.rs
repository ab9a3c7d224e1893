use skyline_engine::{AudioCommand, AudioSink, FrameSink, FrameSnapshot, GamePhase};
use tracing::{debug, info};

const FRAME_LOG_INTERVAL: u64 = 120;

/// Logs phase changes and a periodic frame summary instead of drawing.
#[derive(Debug, Default)]
pub(crate) struct TraceFrameSink {
    last_phase: Option<(GamePhase, u32)>,
    frames_seen: u64,
    phase_changes: u32,
}

impl TraceFrameSink {
    pub(crate) fn phase_changes(&self) -> u32 {
        self.phase_changes
    }
}

impl FrameSink for TraceFrameSink {
    fn present(&mut self, frame: &FrameSnapshot) {
        let current = (frame.phase, frame.level);
        if self.last_phase != Some(current) {
            self.last_phase = Some(current);
            self.phase_changes = self.phase_changes.saturating_add(1);
            info!(
                phase = ?frame.phase,
                level = frame.level,
                menu = frame.menu.is_some(),
                error = frame.error.as_deref().unwrap_or(""),
                "frame_phase"
            );
        }
        if self.frames_seen % FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = self.frames_seen,
                entities = frame.entities.len(),
                game_time_ms = frame.game_time_ms,
                tile_offset_x = frame.tile_offset.x,
                "frame_summary"
            );
        }
        self.frames_seen = self.frames_seen.saturating_add(1);
    }
}

#[derive(Debug, Default)]
pub(crate) struct TraceAudio {
    one_shots: u32,
}

impl TraceAudio {
    pub(crate) fn one_shots(&self) -> u32 {
        self.one_shots
    }
}

impl AudioSink for TraceAudio {
    fn submit(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::PlayOneShot(sound) => {
                self.one_shots = self.one_shots.saturating_add(1);
                debug!(sound = sound.name(), "sound_played");
            }
            AudioCommand::StopOneShots => debug!("sounds_stopped"),
            AudioCommand::PlayTrack { track, effect } => {
                info!(track = track.name(), effect = ?effect, "track_started");
            }
            AudioCommand::StopTrack => info!("track_stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use skyline_engine::{EffectMode, SoundId, TrackId, Vec2};

    use super::*;

    fn frame(phase: GamePhase, level: u32) -> FrameSnapshot {
        FrameSnapshot {
            phase,
            level,
            game_time_ms: 0.0,
            tile_offset: Vec2::default(),
            parallax_offsets: Vec::new(),
            entities: Vec::new(),
            menu: None,
            debug: None,
            error: None,
        }
    }

    #[test]
    fn counts_phase_and_level_changes_once() {
        let mut sink = TraceFrameSink::default();
        sink.present(&frame(GamePhase::Playing, 1));
        sink.present(&frame(GamePhase::Playing, 1));
        sink.present(&frame(GamePhase::LevelTransition, 2));
        sink.present(&frame(GamePhase::Playing, 2));

        assert_eq!(sink.phase_changes(), 3);
    }

    #[test]
    fn audio_counts_only_one_shots() {
        let mut audio = TraceAudio::default();
        audio.submit(AudioCommand::PlayTrack {
            track: TrackId::Level,
            effect: EffectMode::None,
        });
        audio.submit(AudioCommand::PlayOneShot(SoundId::Fire));
        audio.submit(AudioCommand::StopOneShots);
        audio.submit(AudioCommand::PlayOneShot(SoundId::Portal));

        assert_eq!(audio.one_shots(), 2);
    }
}
