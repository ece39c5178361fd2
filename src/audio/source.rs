//! Frame sources standing in for a hardware capture callback

use crate::audio::FrameFormat;

/// Producer-side supplier of interleaved frames
///
/// `fill` runs on the producer thread once per callback and must not block.
pub trait FrameSource: Send {
    /// Format of the frames this source produces
    fn format(&self) -> &FrameFormat;

    /// Fill the first `frame_count` frames of `buffer`
    fn fill(&mut self, buffer: &mut [u8], frame_count: usize);
}

/// Counts frames: every channel sample of frame `n` holds `n`
///
/// Samples are little-endian and truncated to the channel width, so the
/// count wraps at `2^(8 * bytes_per_channel)`. Used to check snapshot
/// continuity.
pub struct RampSource {
    format: FrameFormat,
    next_frame: u64,
}

impl RampSource {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            next_frame: 0,
        }
    }

    /// Index of the next frame to be produced
    pub fn position(&self) -> u64 {
        self.next_frame
    }
}

impl FrameSource for RampSource {
    fn format(&self) -> &FrameFormat {
        &self.format
    }

    fn fill(&mut self, buffer: &mut [u8], frame_count: usize) {
        let width = self.format.bytes_per_channel as usize;
        let bytes = self.format.frames_to_bytes(frame_count);

        for frame in buffer[..bytes].chunks_exact_mut(self.format.bytes_per_frame()) {
            let value = self.next_frame.to_le_bytes();
            for sample in frame.chunks_exact_mut(width) {
                let copied = width.min(value.len());
                sample[..copied].copy_from_slice(&value[..copied]);
                sample[copied..].fill(0);
            }
            self.next_frame = self.next_frame.wrapping_add(1);
        }
    }
}

/// Produces digital silence
pub struct SilenceSource {
    format: FrameFormat,
}

impl SilenceSource {
    pub fn new(format: FrameFormat) -> Self {
        Self { format }
    }
}

impl FrameSource for SilenceSource {
    fn format(&self) -> &FrameFormat {
        &self.format
    }

    fn fill(&mut self, buffer: &mut [u8], frame_count: usize) {
        let bytes = self.format.frames_to_bytes(frame_count);
        buffer[..bytes].fill(0);
    }
}
