//! Stream engine - runs the capture producer and snapshot consumer threads

use crate::audio::FrameSource;
use crate::error::{Result, SatRingError};
use crate::ring::{RingReader, RingWriter, SatRing};
use crate::stream::{Snapshot, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Initialized but not running
    Stopped,
    /// Running
    Running,
    /// Shutting down
    ShuttingDown,
}

/// Counters shared with the worker threads
#[derive(Debug, Default)]
pub struct StreamStats {
    /// Frames handed to the ring by the producer
    pub frames_produced: AtomicU64,
    /// Producer callbacks that started after their deadline
    pub late_callbacks: AtomicU64,
    /// Snapshots delivered to the receiver
    pub snapshots_sent: AtomicU64,
    /// Snapshots discarded because the receiver fell behind
    pub snapshots_dropped: AtomicU64,
}

/// Command sent to the consumer thread
enum ConsumerCommand {
    Stop,
}

/// Raises its flag when dropped, on normal return or unwind
struct ExitSignal(Arc<AtomicBool>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Drives one ring with a paced producer and a periodic consumer
pub struct StreamEngine {
    config: StreamConfig,
    state: Arc<Mutex<EngineState>>,
    stop_flag: Arc<AtomicBool>,
    producer_done: Arc<AtomicBool>,
    producer_handle: Option<JoinHandle<()>>,
    consumer_handle: Option<JoinHandle<()>>,
    command_tx: Option<Sender<ConsumerCommand>>,
    snapshot_rx: Option<Receiver<Snapshot>>,
    stats: Arc<StreamStats>,
}

impl StreamEngine {
    /// Create a new stream engine with the given configuration
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(EngineState::Stopped)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            producer_done: Arc::new(AtomicBool::new(false)),
            producer_handle: None,
            consumer_handle: None,
            command_tx: None,
            snapshot_rx: None,
            stats: Arc::new(StreamStats::default()),
        }
    }

    /// Get current engine state
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Check if engine is running
    ///
    /// Turns false as soon as the producer thread exits, including by panic.
    pub fn is_running(&self) -> bool {
        *self.state.lock() == EngineState::Running && !self.producer_done.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Receiver for consumer snapshots (available while running)
    pub fn snapshots(&self) -> Option<Receiver<Snapshot>> {
        self.snapshot_rx.clone()
    }

    /// Create the ring and start both threads
    pub fn start(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        {
            let state = self.state.lock();
            if *state != EngineState::Stopped {
                return Err(SatRingError::AlreadyRunning);
            }
        }

        self.config.validate()?;
        if source.format() != &self.config.format {
            return Err(SatRingError::geometry(format!(
                "source format {} differs from stream format {}",
                source.format(),
                self.config.format
            )));
        }

        info!("Starting stream engine...");
        debug!(
            "Format {}, ring {}, callback {} frames, snapshot every {:?}",
            self.config.format,
            self.config.geometry,
            self.config.callback_frames,
            self.config.snapshot_interval
        );

        self.stop_flag.store(false, Ordering::SeqCst);
        self.producer_done.store(false, Ordering::SeqCst);
        self.stats = Arc::new(StreamStats::default());

        let mut ring = SatRing::create(self.config.geometry)?;
        ring.initialize();
        let (writer, reader) = ring.split();

        let (command_tx, command_rx) = bounded::<ConsumerCommand>(1);
        let (snapshot_tx, snapshot_rx) = bounded::<Snapshot>(self.config.snapshot_queue);

        let producer_stop = self.stop_flag.clone();
        let producer_done = self.producer_done.clone();
        let producer_stats = self.stats.clone();
        let callback_frames = self.config.callback_frames;
        let period = self.config.callback_period();
        let producer = thread::Builder::new()
            .name("satring-producer".into())
            .spawn(move || {
                let _exit = ExitSignal(producer_done);
                producer_thread(
                    writer,
                    source,
                    callback_frames,
                    period,
                    producer_stop,
                    producer_stats,
                );
            })
            .map_err(|e| {
                error!("Failed to spawn producer thread: {}", e);
                SatRingError::Stream(e.to_string())
            })?;

        let consumer_done = self.producer_done.clone();
        let consumer_stats = self.stats.clone();
        let interval = self.config.snapshot_interval;
        let consumer = thread::Builder::new()
            .name("satring-consumer".into())
            .spawn(move || {
                consumer_thread(
                    reader,
                    interval,
                    command_rx,
                    snapshot_tx,
                    consumer_done,
                    consumer_stats,
                );
            });
        let consumer = match consumer {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to spawn consumer thread: {}", e);
                self.stop_flag.store(true, Ordering::SeqCst);
                let _ = producer.join();
                return Err(SatRingError::Stream(e.to_string()));
            }
        };

        self.producer_handle = Some(producer);
        self.consumer_handle = Some(consumer);
        self.command_tx = Some(command_tx);
        self.snapshot_rx = Some(snapshot_rx);

        *self.state.lock() = EngineState::Running;
        info!("Stream engine started");

        Ok(())
    }

    /// Stop the engine
    pub fn stop(&mut self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != EngineState::Running {
                return Ok(());
            }
            *state = EngineState::ShuttingDown;
        }

        info!("Stopping stream engine...");

        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(tx) = &self.command_tx {
            let _ = tx.send(ConsumerCommand::Stop);
        }

        let producer_panicked = self
            .producer_handle
            .take()
            .is_some_and(|handle| handle.join().is_err());
        let consumer_panicked = self
            .consumer_handle
            .take()
            .is_some_and(|handle| handle.join().is_err());

        self.command_tx = None;
        self.snapshot_rx = None;

        *self.state.lock() = EngineState::Stopped;
        info!(
            "Stream engine stopped ({} frames produced, {} snapshots sent, {} dropped)",
            self.stats.frames_produced.load(Ordering::Relaxed),
            self.stats.snapshots_sent.load(Ordering::Relaxed),
            self.stats.snapshots_dropped.load(Ordering::Relaxed)
        );

        if producer_panicked {
            error!("Producer thread panicked");
            return Err(SatRingError::Stream("producer thread panicked".into()));
        }
        if consumer_panicked {
            error!("Consumer thread panicked");
            return Err(SatRingError::Stream("consumer thread panicked".into()));
        }

        Ok(())
    }
}

impl Drop for StreamEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Producer thread function: one ring write per callback period
fn producer_thread(
    mut writer: RingWriter,
    mut source: Box<dyn FrameSource>,
    callback_frames: usize,
    period: Duration,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<StreamStats>,
) {
    info!("Producer thread started");

    let mut scratch = vec![0u8; source.format().frames_to_bytes(callback_frames)];
    let mut deadline = Instant::now();

    while !stop_flag.load(Ordering::Relaxed) {
        source.fill(&mut scratch, callback_frames);
        writer.write_frames(&scratch, callback_frames);
        stats
            .frames_produced
            .fetch_add(callback_frames as u64, Ordering::Relaxed);

        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            stats.late_callbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    info!("Producer thread stopped");
}

/// Consumer thread function: snapshot the ring every interval
fn consumer_thread(
    mut reader: RingReader,
    interval: Duration,
    command_rx: Receiver<ConsumerCommand>,
    snapshot_tx: Sender<Snapshot>,
    producer_done: Arc<AtomicBool>,
    stats: Arc<StreamStats>,
) {
    info!("Consumer thread started");

    let mut buffer = reader.snapshot_buffer();
    let mut sequence = 0u64;

    loop {
        match command_rx.recv_timeout(interval) {
            Ok(ConsumerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        if producer_done.load(Ordering::SeqCst) {
            debug!("Producer thread exited, consumer stopping");
            break;
        }

        let outcome = reader.read(&mut buffer);
        trace!("Snapshot {}: {}", sequence, outcome);

        let snapshot = Snapshot {
            sequence,
            outcome,
            data: buffer.clone(),
            captured_at: Instant::now(),
        };
        sequence += 1;

        match snapshot_tx.try_send(snapshot) {
            Ok(()) => {
                stats.snapshots_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                stats.snapshots_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    info!("Consumer thread stopped");
}
