use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use satring::audio::{FrameFormat, FrameSource, RampSource};
use satring::ring::{ReadOutcome, RingGeometry, RingState, SafetyMargin, SatRing};
use satring::stream::{check_ramp, EngineState, StreamConfig, StreamEngine};

#[test]
fn writer_and_reader_on_separate_threads() {
    let format = FrameFormat::new(48000, 2, 2);
    let geometry = format.ring_geometry(256, SafetyMargin::new(8).unwrap()).unwrap();
    let mut ring = SatRing::create(geometry).unwrap();
    ring.initialize();
    let (mut writer, mut reader) = ring.split();

    let done = Arc::new(AtomicBool::new(false));
    let producer_done = done.clone();
    let producer = thread::spawn(move || {
        let mut source = RampSource::new(format);
        let mut scratch = vec![0u8; 100 * 4];
        for round in 0..2_000 {
            let frames = 1 + round % 100;
            source.fill(&mut scratch, frames);
            writer.write_frames(&scratch, frames);
        }
        producer_done.store(true, Ordering::SeqCst);
        writer
    });

    let mut output = reader.snapshot_buffer();
    let mut seen_success = false;
    while !done.load(Ordering::SeqCst) {
        match reader.read(&mut output) {
            ReadOutcome::NotFull => {
                assert!(!seen_success, "ring reported not full after being full");
                assert!(output.iter().all(|&b| b == 0));
            }
            ReadOutcome::ReadSuccess => seen_success = true,
        }
        assert_eq!(output.len(), 256 * 4);
    }

    let writer = producer.join().unwrap();
    assert_eq!(writer.state(), RingState::ReadyForReading);
    assert_eq!(writer.frames_written(), 264);

    // Writer is idle now, so the final snapshot cannot be torn
    assert_eq!(reader.read(&mut output), ReadOutcome::ReadSuccess);
    let report = check_ramp(&output, &FrameFormat::new(48000, 2, 2));
    assert!(report.is_contiguous(), "{:?}", report);
    assert_eq!(report.frames, 256);
}

#[test]
fn engine_delivers_snapshots_in_order() {
    let format = FrameFormat::new(8000, 1, 2);
    let geometry: RingGeometry = format.ring_geometry(200, SafetyMargin::default()).unwrap();
    let config = StreamConfig {
        format: format.clone(),
        geometry,
        callback_frames: 40,
        snapshot_interval: Duration::from_millis(20),
        snapshot_queue: 256,
    };

    let mut engine = StreamEngine::new(config);
    engine
        .start(Box::new(RampSource::new(format.clone())))
        .unwrap();
    let snapshots = engine.snapshots().unwrap();

    thread::sleep(Duration::from_millis(400));
    engine.stop().unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);

    let received: Vec<_> = snapshots.try_iter().collect();
    assert!(!received.is_empty());

    let mut seen_success = false;
    let mut contiguous = 0;
    for (i, snapshot) in received.iter().enumerate() {
        assert_eq!(snapshot.sequence, i as u64);
        assert_eq!(snapshot.data.len(), 400);
        match snapshot.outcome {
            ReadOutcome::NotFull => {
                assert!(!seen_success);
                assert!(snapshot.data.iter().all(|&b| b == 0));
            }
            ReadOutcome::ReadSuccess => {
                seen_success = true;
                if check_ramp(&snapshot.data, &format).is_contiguous() {
                    contiguous += 1;
                }
            }
        }
    }
    assert!(seen_success, "ring never filled in 400ms");
    assert!(contiguous > 0);
    assert!(engine.stats().frames_produced.load(Ordering::Relaxed) >= 202);
}
