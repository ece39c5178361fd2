//! Consumer side: snapshot the user-visible window behind the write cursor

use crate::ring::geometry::RingGeometry;
use crate::ring::state::{ReadOutcome, RingState};
use crate::ring::storage::{load_bytes, SatRing};
use std::sync::atomic::Ordering;
use std::sync::Arc;

impl SatRing {
    /// Copy the most recent `user_capacity_frames` frames into `output`
    ///
    /// While the ring has not been completely written once, `output` is
    /// zero-filled and [`ReadOutcome::NotFull`] is returned. Otherwise the
    /// window starts half a safety margin past the write cursor (the oldest
    /// retained frame) and ends half a margin short of it.
    ///
    /// The read never blocks and never touches writer state. A writer
    /// running concurrently may overwrite part of the window mid-copy.
    ///
    /// # Panics
    /// Panics if the ring is not initialized or `output` is smaller than
    /// `user_capacity_frames * bytes_per_frame`.
    pub fn read(&self, output: &mut [u8]) -> ReadOutcome {
        let storage = self.live_storage();
        let window = self.geometry().user_capacity_bytes();

        assert!(
            output.len() >= window,
            "output holds {} bytes, window needs {}",
            output.len(),
            window
        );

        match self.state() {
            RingState::NotFull => {
                output.fill(0);
                ReadOutcome::NotFull
            }
            RingState::ReadyForReading => {
                let start = self.read_start_offset();
                let output = &mut output[..window];
                let bytes_before_wrap = storage.len() - start;

                if window <= bytes_before_wrap {
                    load_bytes(&storage[start..start + window], output);
                } else {
                    let (to_end, from_start) = output.split_at_mut(bytes_before_wrap);
                    load_bytes(&storage[start..], to_end);
                    load_bytes(&storage[..from_start.len()], from_start);
                }
                ReadOutcome::ReadSuccess
            }
        }
    }

    /// Byte offset of the first frame a read returns
    ///
    /// Sampled from the write cursor at call time.
    pub fn read_start_offset(&self) -> usize {
        let geometry = self.geometry();
        let cursor = self.cursor().load(Ordering::Acquire);
        geometry.wrap_offset(cursor, geometry.read_lead_bytes())
    }
}

/// Consumer handle; held by the analysis side
///
/// Not `Clone`: there is exactly one reader per ring.
#[derive(Debug)]
pub struct RingReader {
    ring: Arc<SatRing>,
}

impl RingReader {
    pub(crate) fn new(ring: Arc<SatRing>) -> Self {
        Self { ring }
    }

    /// Snapshot the shared ring (single consumer)
    ///
    /// Same contract as [`SatRing::read`].
    pub fn read(&mut self, output: &mut [u8]) -> ReadOutcome {
        self.ring.read(output)
    }

    /// A zeroed buffer sized for one snapshot
    pub fn snapshot_buffer(&self) -> Vec<u8> {
        vec![0u8; self.ring.geometry().user_capacity_bytes()]
    }

    pub fn geometry(&self) -> &RingGeometry {
        self.ring.geometry()
    }

    pub fn state(&self) -> RingState {
        self.ring.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::geometry::SafetyMargin;

    fn live_ring(geometry: RingGeometry) -> SatRing {
        let mut ring = SatRing::create(geometry).unwrap();
        ring.initialize();
        ring
    }

    fn frames_u16(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let mut ring = live_ring(RingGeometry::new(10, 1, 2).unwrap());
        let mut output = vec![0xFFu8; 20];

        ring.write_frames(&frames_u16(&[0x1111; 5]), 5);
        assert_eq!(ring.read(&mut output), ReadOutcome::NotFull);
        assert_eq!(output, vec![0u8; 20]);

        let later: Vec<u16> = (1..=7).map(|i| 0x2200 + i).collect();
        ring.write_frames(&frames_u16(&later), 7);
        assert_eq!(ring.state(), RingState::ReadyForReading);

        assert_eq!(ring.read(&mut output), ReadOutcome::ReadSuccess);
        // Oldest frame and newest frame are the hidden safety frames
        let expected = frames_u16(&[
            0x1111, 0x1111, 0x1111, 0x1111, 0x2201, 0x2202, 0x2203, 0x2204, 0x2205, 0x2206,
        ]);
        assert_eq!(output, expected);
    }

    #[test]
    fn test_not_full_gating() {
        let mut ring = live_ring(RingGeometry::new(16, 2, 2).unwrap());
        let source = vec![0x5A; 17 * 4];
        let mut output = vec![0x77u8; 64];

        ring.write_frames(&source, 17);
        assert_eq!(ring.read(&mut output), ReadOutcome::NotFull);
        assert!(output.iter().all(|&b| b == 0));

        ring.write_frames(&source, 1);
        assert_eq!(ring.read(&mut output), ReadOutcome::ReadSuccess);
        assert!(output.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_wrap_correctness_with_ramp() {
        let user = 10;
        let margin = SafetyMargin::new(2).unwrap();
        let geometry = RingGeometry::with_safety_margin(user, margin, 1, 1).unwrap();
        let total = geometry.total_capacity_frames();
        let mut ring = live_ring(geometry);
        let mut output = vec![0u8; user];

        let mut next = 0u8;
        for chunk in [5usize, 7, 3, 11, 1, 10] {
            let frames: Vec<u8> = (0..chunk).map(|i| next + i as u8).collect();
            next += chunk as u8;
            ring.write_frames(&frames, chunk);

            if (next as usize) < total {
                assert_eq!(ring.read(&mut output), ReadOutcome::NotFull);
                continue;
            }
            assert_eq!(ring.read(&mut output), ReadOutcome::ReadSuccess);
            let first = next as usize - total + margin.half_frames();
            let expected: Vec<u8> = (first..first + user).map(|v| v as u8).collect();
            assert_eq!(output, expected, "after writing {} frames", next);
        }
    }

    #[test]
    fn test_wide_margin_multichannel() {
        let margin = SafetyMargin::new(4).unwrap();
        let geometry = RingGeometry::with_safety_margin(6, margin, 2, 2).unwrap();
        let total = geometry.total_capacity_frames();
        let mut ring = live_ring(geometry);
        let mut output = vec![0u8; geometry.user_capacity_bytes()];

        let mut frame_index = 0u16;
        for chunk in [3usize, 9, 4, 8, 2] {
            let mut source = Vec::new();
            for _ in 0..chunk {
                for _channel in 0..2 {
                    source.extend_from_slice(&frame_index.to_le_bytes());
                }
                frame_index += 1;
            }
            ring.write_frames(&source, chunk);
        }
        assert_eq!(ring.read(&mut output), ReadOutcome::ReadSuccess);

        let first = frame_index as usize - total + margin.half_frames();
        let decoded: Vec<u16> = output
            .chunks_exact(4)
            .map(|frame| {
                let left = u16::from_le_bytes([frame[0], frame[1]]);
                let right = u16::from_le_bytes([frame[2], frame[3]]);
                assert_eq!(left, right);
                left
            })
            .collect();
        let expected: Vec<u16> = (first..first + 6).map(|v| v as u16).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_read_start_offset_wraps() {
        let margin = SafetyMargin::new(4).unwrap();
        let geometry = RingGeometry::with_safety_margin(4, margin, 1, 1).unwrap();
        let mut ring = live_ring(geometry);

        ring.write_frames(&[0u8; 7], 7);
        assert_eq!(ring.write_cursor(), 7);
        // 7 + 2 wraps past the 8-byte end
        assert_eq!(ring.read_start_offset(), 1);
    }

    #[test]
    fn test_larger_output_only_window_written_on_success() {
        let mut ring = live_ring(RingGeometry::new(4, 1, 1).unwrap());
        ring.write_frames(&[1, 2, 3, 4, 5], 5);
        ring.write_frames(&[6], 1);

        let mut output = vec![0xEEu8; 6];
        assert!(ring.read(&mut output).is_success());
        assert_eq!(output, vec![2, 3, 4, 5, 0xEE, 0xEE]);
    }

    #[test]
    fn test_read_does_not_move_cursor() {
        let mut ring = live_ring(RingGeometry::new(4, 1, 1).unwrap());
        ring.write_frames(&[1, 2, 3, 4, 5], 5);
        ring.write_frames(&[6, 7], 2);
        let cursor = ring.write_cursor();
        let mut output = vec![0u8; 4];

        ring.read(&mut output);
        ring.read(&mut output);
        assert_eq!(ring.write_cursor(), cursor);
        assert_eq!(ring.frames_written(), 6);
    }

    #[test]
    #[should_panic(expected = "output holds 19 bytes")]
    fn test_small_output_panics() {
        let ring = live_ring(RingGeometry::new(10, 1, 2).unwrap());
        let mut output = vec![0u8; 19];
        ring.read(&mut output);
    }

    #[test]
    #[should_panic(expected = "ring not initialized")]
    fn test_read_before_initialize_panics() {
        let ring = SatRing::create(RingGeometry::new(10, 1, 2).unwrap()).unwrap();
        let mut output = vec![0u8; 20];
        ring.read(&mut output);
    }

    #[test]
    #[should_panic(expected = "ring storage has been released")]
    fn test_read_after_destroy_panics() {
        let mut ring = live_ring(RingGeometry::new(10, 1, 2).unwrap());
        ring.destroy();
        let mut output = vec![0u8; 20];
        ring.read(&mut output);
    }

    #[test]
    fn test_reader_handle() {
        let ring = live_ring(RingGeometry::new(4, 1, 1).unwrap());
        let (mut writer, mut reader) = ring.split();
        let mut output = reader.snapshot_buffer();
        assert_eq!(output.len(), 4);

        writer.write_frames(&[9, 8, 7, 6, 5], 5);
        assert_eq!(reader.read(&mut output), ReadOutcome::NotFull);

        writer.write_frames(&[4], 1);
        assert_eq!(reader.state(), RingState::ReadyForReading);
        assert_eq!(reader.read(&mut output), ReadOutcome::ReadSuccess);
        assert_eq!(output, vec![8, 7, 6, 5]);
    }
}
