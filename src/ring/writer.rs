//! Producer side: append frames at the write cursor

use crate::ring::geometry::RingGeometry;
use crate::ring::state::RingState;
use crate::ring::storage::{store_bytes, SatRing};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

impl SatRing {
    /// Write `frame_count` interleaved frames from `frames`
    ///
    /// Performs at most two copies and never blocks or allocates.
    ///
    /// # Panics
    /// Panics if the ring is not initialized, if `frame_count` is not
    /// strictly less than the total capacity in frames, or if `frames`
    /// holds fewer than `frame_count` frames.
    pub fn write_frames(&mut self, frames: &[u8], frame_count: usize) {
        self.append(frames, frame_count);
    }

    pub(crate) fn append(&self, frames: &[u8], frame_count: usize) {
        let storage = self.live_storage();
        let geometry = self.geometry();
        let total_frames = geometry.total_capacity_frames();

        assert!(
            frame_count < total_frames,
            "write of {} frames must be smaller than ring capacity of {} frames",
            frame_count,
            total_frames
        );
        let bytes_to_write = frame_count * geometry.bytes_per_frame();
        assert!(
            frames.len() >= bytes_to_write,
            "source holds {} bytes, {} frames need {}",
            frames.len(),
            frame_count,
            bytes_to_write
        );
        let source = &frames[..bytes_to_write];

        let cursor = self.cursor().load(Ordering::Relaxed);
        let bytes_available_before_wrap = storage.len() - cursor;

        let mut next_cursor = if bytes_available_before_wrap > bytes_to_write {
            store_bytes(&storage[cursor..cursor + bytes_to_write], source);
            cursor + bytes_to_write
        } else {
            let (to_end, from_start) = source.split_at(bytes_available_before_wrap);
            store_bytes(&storage[cursor..], to_end);
            store_bytes(&storage[..from_start.len()], from_start);
            from_start.len()
        };

        // Never leave the cursor one past the end
        if next_cursor == storage.len() {
            next_cursor = 0;
        }
        self.cursor().store(next_cursor, Ordering::Release);

        let written = self.fill_counter().load(Ordering::Relaxed);
        if written < total_frames {
            let written = (written + frame_count).min(total_frames);
            self.fill_counter().store(written, Ordering::Relaxed);
            if written == total_frames {
                self.state_cell().mark_ready();
                debug!("Ring full after {} frames, ready for reading", written);
            }
        }
    }
}

/// Producer handle; held by the callback that feeds the ring
///
/// Not `Clone`: there is exactly one writer per ring.
#[derive(Debug)]
pub struct RingWriter {
    ring: Arc<SatRing>,
}

impl RingWriter {
    pub(crate) fn new(ring: Arc<SatRing>) -> Self {
        Self { ring }
    }

    /// Write frames into the shared ring (single producer)
    ///
    /// Same contract as [`SatRing::write_frames`].
    pub fn write_frames(&mut self, frames: &[u8], frame_count: usize) {
        self.ring.append(frames, frame_count);
    }

    pub fn geometry(&self) -> &RingGeometry {
        self.ring.geometry()
    }

    /// Largest frame count a single write accepts
    pub fn max_frames_per_write(&self) -> usize {
        self.ring.geometry().total_capacity_frames() - 1
    }

    pub fn state(&self) -> RingState {
        self.ring.state()
    }

    pub fn frames_written(&self) -> usize {
        self.ring.frames_written()
    }
}
