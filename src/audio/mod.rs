//! Frame format and producer-side frame sources

mod source;

pub use source::{FrameSource, RampSource, SilenceSource};

use crate::error::Result;
use crate::ring::{RingGeometry, SafetyMargin};

/// Interleaved PCM frame format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bytes_per_channel: u16,
}

impl FrameFormat {
    pub fn new(sample_rate: u32, channels: u16, bytes_per_channel: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bytes_per_channel,
        }
    }

    /// Bytes in one frame (one sample per channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.bytes_per_channel as usize
    }

    /// Calculate bytes per second
    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.bytes_per_frame()
    }

    /// Calculate number of frames for given milliseconds
    pub fn frames_for_ms(&self, ms: u32) -> usize {
        ((self.sample_rate as u64 * ms as u64) / 1000) as usize
    }

    /// Calculate number of frames for given bytes
    pub fn bytes_to_frames(&self, bytes: usize) -> usize {
        bytes / self.bytes_per_frame()
    }

    /// Calculate bytes for given number of frames
    pub fn frames_to_bytes(&self, frames: usize) -> usize {
        frames * self.bytes_per_frame()
    }

    /// Ring geometry holding `user_capacity_frames` of this format
    pub fn ring_geometry(
        &self,
        user_capacity_frames: usize,
        safety_margin: SafetyMargin,
    ) -> Result<RingGeometry> {
        RingGeometry::with_safety_margin(
            user_capacity_frames,
            safety_margin,
            self.channels as usize,
            self.bytes_per_channel as usize,
        )
    }

    /// Whether frames of this format fit a ring's frame layout
    pub fn matches(&self, geometry: &RingGeometry) -> bool {
        self.channels as usize == geometry.channels_per_frame()
            && self.bytes_per_channel as usize == geometry.bytes_per_channel()
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::new(44100, 2, 2)
    }
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz {}ch {}bit",
            self.sample_rate,
            self.channels,
            self.bytes_per_channel * 8
        )
    }
}
