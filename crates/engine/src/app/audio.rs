#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    Fire,
    Portal,
    LowHealth,
    BossDefeated,
}

impl SoundId {
    pub const fn name(self) -> &'static str {
        match self {
            SoundId::Fire => "fire",
            SoundId::Portal => "portal",
            SoundId::LowHealth => "low_health",
            SoundId::BossDefeated => "boss_defeated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackId {
    Level,
    Victory,
}

impl TrackId {
    pub const fn name(self) -> &'static str {
        match self {
            TrackId::Level => "level",
            TrackId::Victory => "victory",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EffectMode {
    #[default]
    None,
    Echo,
    Fast,
}

/// Fire-and-forget requests for the audio layer. The game never waits on
/// playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCommand {
    PlayOneShot(SoundId),
    StopOneShots,
    PlayTrack { track: TrackId, effect: EffectMode },
    StopTrack,
}

pub trait AudioSink {
    fn submit(&mut self, command: AudioCommand);
}

#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn submit(&mut self, _command: AudioCommand) {}
}
