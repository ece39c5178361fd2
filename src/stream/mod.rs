//! Producer/consumer threads around one ring

mod analysis;
mod engine;

pub use analysis::{check_ramp, Continuity};
pub use engine::{EngineState, StreamEngine, StreamStats};

use crate::audio::FrameFormat;
use crate::error::{Result, SatRingError};
use crate::ring::{ReadOutcome, RingGeometry};
use std::time::{Duration, Instant};

/// Stream engine configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Format of the produced frames
    pub format: FrameFormat,
    /// Layout of the ring between producer and consumer
    pub geometry: RingGeometry,
    /// Frames written per producer callback
    pub callback_frames: usize,
    /// Time between consumer snapshots
    pub snapshot_interval: Duration,
    /// Snapshots queued for the receiver before new ones are dropped
    pub snapshot_queue: usize,
}

impl StreamConfig {
    /// Check the producer and consumer settings against the ring
    pub fn validate(&self) -> Result<()> {
        if !self.format.matches(&self.geometry) {
            return Err(SatRingError::geometry(format!(
                "format {} does not match ring frame layout {}",
                self.format, self.geometry
            )));
        }
        if self.format.sample_rate == 0 {
            return Err(SatRingError::geometry("sample rate must be > 0"));
        }
        if self.callback_frames == 0
            || self.callback_frames >= self.geometry.total_capacity_frames()
        {
            return Err(SatRingError::geometry(format!(
                "callback of {} frames must be between 1 and {}",
                self.callback_frames,
                self.geometry.total_capacity_frames() - 1
            )));
        }
        if self.snapshot_interval.is_zero() {
            return Err(SatRingError::geometry("snapshot interval must be > 0"));
        }
        if self.snapshot_queue == 0 {
            return Err(SatRingError::geometry("snapshot queue must hold at least 1"));
        }
        Ok(())
    }

    /// Wall-clock length of one producer callback
    pub fn callback_period(&self) -> Duration {
        Duration::from_secs_f64(self.callback_frames as f64 / self.format.sample_rate as f64)
    }
}

/// One consumer read delivered to the snapshot receiver
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Read count since start, including dropped snapshots
    pub sequence: u64,
    pub outcome: ReadOutcome,
    /// User-visible window; all zero when `outcome` is `NotFull`
    pub data: Vec<u8>,
    pub captured_at: Instant,
}
