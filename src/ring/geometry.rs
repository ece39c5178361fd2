//! Ring geometry: capacities in frames and bytes, derived once at creation

use crate::error::{Result, SatRingError};

/// Hidden frames appended to the user capacity when none is configured
pub const DEFAULT_SAFETY_MARGIN_FRAMES: usize = 2;

const _: () = assert!(
    DEFAULT_SAFETY_MARGIN_FRAMES % 2 == 0 && DEFAULT_SAFETY_MARGIN_FRAMES >= 2,
    "default safety margin must be even and >= 2"
);

/// Frames of ring capacity the reader never returns
///
/// Half of the margin sits just behind the write cursor and half just
/// ahead of it. Always even and at least 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyMargin(usize);

impl SafetyMargin {
    /// Validate a margin in frames
    pub fn new(frames: usize) -> Result<Self> {
        if frames < 2 || frames % 2 != 0 {
            return Err(SatRingError::InvalidSafetyMargin(frames));
        }
        Ok(Self(frames))
    }

    /// Total margin in frames
    pub fn frames(&self) -> usize {
        self.0
    }

    /// Frames skipped on each side of the write cursor
    pub fn half_frames(&self) -> usize {
        self.0 / 2
    }
}

impl Default for SafetyMargin {
    fn default() -> Self {
        Self(DEFAULT_SAFETY_MARGIN_FRAMES)
    }
}

/// Immutable memory layout of a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    user_capacity_frames: usize,
    safety_margin: SafetyMargin,
    channels_per_frame: usize,
    bytes_per_channel: usize,
    bytes_per_frame: usize,
    total_capacity_frames: usize,
    total_capacity_bytes: usize,
}

impl RingGeometry {
    /// Geometry with the default safety margin
    pub fn new(
        user_capacity_frames: usize,
        channels_per_frame: usize,
        bytes_per_channel: usize,
    ) -> Result<Self> {
        Self::with_safety_margin(
            user_capacity_frames,
            SafetyMargin::default(),
            channels_per_frame,
            bytes_per_channel,
        )
    }

    /// Geometry with an explicit safety margin
    pub fn with_safety_margin(
        user_capacity_frames: usize,
        safety_margin: SafetyMargin,
        channels_per_frame: usize,
        bytes_per_channel: usize,
    ) -> Result<Self> {
        if user_capacity_frames == 0 {
            return Err(SatRingError::geometry("user capacity must be > 0 frames"));
        }
        if channels_per_frame == 0 {
            return Err(SatRingError::geometry("channels per frame must be > 0"));
        }
        if bytes_per_channel == 0 {
            return Err(SatRingError::geometry("bytes per channel must be > 0"));
        }

        let bytes_per_frame = channels_per_frame
            .checked_mul(bytes_per_channel)
            .ok_or(SatRingError::CapacityOverflow)?;
        let total_capacity_frames = user_capacity_frames
            .checked_add(safety_margin.frames())
            .ok_or(SatRingError::CapacityOverflow)?;
        let total_capacity_bytes = total_capacity_frames
            .checked_mul(bytes_per_frame)
            .ok_or(SatRingError::CapacityOverflow)?;

        Ok(Self {
            user_capacity_frames,
            safety_margin,
            channels_per_frame,
            bytes_per_channel,
            bytes_per_frame,
            total_capacity_frames,
            total_capacity_bytes,
        })
    }

    /// Frames visible to readers
    pub fn user_capacity_frames(&self) -> usize {
        self.user_capacity_frames
    }

    /// Bytes a reader's output buffer must hold
    pub fn user_capacity_bytes(&self) -> usize {
        self.user_capacity_frames * self.bytes_per_frame
    }

    pub fn safety_margin(&self) -> SafetyMargin {
        self.safety_margin
    }

    pub fn channels_per_frame(&self) -> usize {
        self.channels_per_frame
    }

    pub fn bytes_per_channel(&self) -> usize {
        self.bytes_per_channel
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_frame
    }

    /// User capacity plus safety margin
    pub fn total_capacity_frames(&self) -> usize {
        self.total_capacity_frames
    }

    /// Size of the backing storage
    pub fn total_capacity_bytes(&self) -> usize {
        self.total_capacity_bytes
    }

    /// Distance from the write cursor to the first byte a reader returns
    pub fn read_lead_bytes(&self) -> usize {
        self.safety_margin.half_frames() * self.bytes_per_frame
    }

    /// Advance a byte offset, wrapping at the end of storage
    pub fn wrap_offset(&self, offset: usize, delta: usize) -> usize {
        (offset + delta) % self.total_capacity_bytes
    }
}

impl std::fmt::Display for RingGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames (+{} safety) x {}ch x {}B = {} bytes",
            self.user_capacity_frames,
            self.safety_margin.frames(),
            self.channels_per_frame,
            self.bytes_per_channel,
            self.total_capacity_bytes
        )
    }
}
