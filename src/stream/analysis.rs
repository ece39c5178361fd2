//! Continuity checks for snapshots of ramp data

use crate::audio::FrameFormat;

/// Summary of one snapshot checked against a frame ramp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuity {
    /// Frames inspected
    pub frames: usize,
    /// Adjacent frame pairs that do not count up by one
    pub discontinuities: usize,
    /// Frames whose channels disagree
    pub mismatched_frames: usize,
    /// Ramp value of the first frame
    pub first_value: u64,
}

impl Continuity {
    /// No torn or reordered frames were found
    pub fn is_contiguous(&self) -> bool {
        self.discontinuities == 0 && self.mismatched_frames == 0
    }
}

/// Check that `data` holds consecutive ramp frames
///
/// Counts wrap at the channel width, matching [`crate::audio::RampSource`].
pub fn check_ramp(data: &[u8], format: &FrameFormat) -> Continuity {
    let width = (format.bytes_per_channel as usize).min(8);
    let modulus_mask = if width == 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    };

    let mut frames = 0;
    let mut discontinuities = 0;
    let mut mismatched_frames = 0;
    let mut first_value = 0;
    let mut previous: Option<u64> = None;

    for frame in data.chunks_exact(format.bytes_per_frame()) {
        let mut samples = frame
            .chunks_exact(format.bytes_per_channel as usize)
            .map(|sample| decode(&sample[..width]));
        let value = samples.next().unwrap_or(0);
        if samples.any(|other| other != value) {
            mismatched_frames += 1;
        }

        match previous {
            None => first_value = value,
            Some(prev) if prev.wrapping_add(1) & modulus_mask != value => discontinuities += 1,
            Some(_) => {}
        }
        previous = Some(value);
        frames += 1;
    }

    Continuity {
        frames,
        discontinuities,
        mismatched_frames,
        first_value,
    }
}

fn decode(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{FrameSource, RampSource};

    #[test]
    fn test_ramp_is_contiguous() {
        let format = FrameFormat::new(8000, 2, 1);
        let mut source = RampSource::new(format.clone());
        let mut data = vec![0u8; 2 * 400];
        source.fill(&mut data, 400);

        let report = check_ramp(&data, &format);
        assert_eq!(report.frames, 400);
        assert_eq!(report.first_value, 0);
        assert!(report.is_contiguous(), "{:?}", report);
    }

    #[test]
    fn test_detects_torn_window() {
        let format = FrameFormat::new(8000, 1, 2);
        let mut data: Vec<u8> = (10u16..20).flat_map(|v| v.to_le_bytes()).collect();
        data[8..10].copy_from_slice(&900u16.to_le_bytes());

        let report = check_ramp(&data, &format);
        assert_eq!(report.first_value, 10);
        assert_eq!(report.discontinuities, 2);
        assert!(!report.is_contiguous());
    }

    #[test]
    fn test_detects_channel_mismatch() {
        let format = FrameFormat::new(8000, 2, 1);
        let data = [0, 0, 1, 1, 2, 7, 3, 3];
        let report = check_ramp(&data, &format);
        assert_eq!(report.discontinuities, 0);
        assert_eq!(report.mismatched_frames, 1);
    }
}
