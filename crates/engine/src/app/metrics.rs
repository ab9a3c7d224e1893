use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Loop and simulation counters for one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    /// Entities alive in the level at the end of the interval.
    pub live_entities: usize,
    pub peak_entities: usize,
    /// Frames whose backlog exceeded the tick cap and was dropped.
    pub clamped_frames: u32,
    pub sim_events: u32,
}

/// Most recent published snapshot. A poisoned lock still hands out the last value.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
    live_entities: usize,
    peak_entities: usize,
    clamped_frames: u32,
    sim_events: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
            live_entities: 0,
            peak_entities: 0,
            clamped_frames: 0,
            sim_events: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration, live_entities: usize) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.live_entities = live_entities;
        self.peak_entities = self.peak_entities.max(live_entities);
    }

    pub(crate) fn record_tick(&mut self, sim_events: usize) {
        self.ticks = self.ticks.saturating_add(1);
        self.sim_events = self
            .sim_events
            .saturating_add(u32::try_from(sim_events).unwrap_or(u32::MAX));
    }

    pub(crate) fn record_clamp(&mut self) {
        self.clamped_frames = self.clamped_frames.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_sum.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            live_entities: self.live_entities,
            peak_entities: self.peak_entities,
            clamped_frames: self.clamped_frames,
            sim_events: self.sim_events,
        };

        // The live count carries over; it seeds the next interval's peak.
        *self = Self {
            interval_start: now,
            live_entities: self.live_entities,
            peak_entities: self.live_entities,
            ..Self::new(self.interval)
        };
        Some(snapshot)
    }
}
