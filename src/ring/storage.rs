//! Ring storage and lifecycle: create, initialize, destroy, split

use crate::error::{Result, SatRingError};
use crate::ring::geometry::RingGeometry;
use crate::ring::reader::RingReader;
use crate::ring::state::{RingState, StateCell};
use crate::ring::writer::RingWriter;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Always-full audio ring with one producer and one consumer
///
/// The producer overwrites the oldest frames in place. The consumer copies
/// out a window of `user_capacity_frames` that stops short of the write
/// cursor on both sides by half the safety margin.
///
/// There is no lock between the two sides. Bytes are stored in relaxed
/// atomics and only the cursor and fill state carry acquire/release
/// ordering, so a reader slower than one lap of the writer may return a
/// torn window. It never observes an invalid offset.
pub struct SatRing {
    geometry: RingGeometry,
    storage: Option<Box<[AtomicU8]>>,
    write_cursor: AtomicUsize,
    frames_written: AtomicUsize,
    state: StateCell,
    initialized: bool,
}

impl SatRing {
    /// Allocate storage for the given geometry
    ///
    /// The ring starts uninitialized; call [`SatRing::initialize`] before
    /// writing or reading.
    pub fn create(geometry: RingGeometry) -> Result<Self> {
        let storage = allocate(geometry.total_capacity_bytes())?;

        info!("Ring created: {}", geometry);

        Ok(Self {
            geometry,
            storage: Some(storage),
            write_cursor: AtomicUsize::new(0),
            frames_written: AtomicUsize::new(0),
            state: StateCell::new(),
            initialized: false,
        })
    }

    /// Zero the storage, reset counters and make the ring live
    ///
    /// # Panics
    /// Panics if the storage has been released by [`SatRing::destroy`].
    pub fn initialize(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            panic!("cannot initialize a destroyed ring");
        };

        for byte in storage.iter_mut() {
            *byte.get_mut() = 0;
        }
        *self.write_cursor.get_mut() = 0;
        *self.frames_written.get_mut() = 0;
        self.state.reset();
        self.initialized = true;

        debug!("Ring initialized ({} bytes zeroed)", storage.len());
    }

    /// Release the storage
    ///
    /// Destroying an already destroyed ring is a no-op.
    pub fn destroy(&mut self) {
        if let Some(storage) = self.storage.take() {
            info!("Ring destroyed, released {} bytes", storage.len());
        }
        self.initialized = false;
    }

    /// Hand the ring to one producer and one consumer
    ///
    /// # Panics
    /// Panics if the ring is not initialized.
    pub fn split(self) -> (RingWriter, RingReader) {
        self.live_storage();
        let ring = Arc::new(self);
        (RingWriter::new(ring.clone()), RingReader::new(ring))
    }

    pub fn geometry(&self) -> &RingGeometry {
        &self.geometry
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_destroyed(&self) -> bool {
        self.storage.is_none()
    }

    /// Current fill state
    pub fn state(&self) -> RingState {
        self.state.load()
    }

    /// Frames written since initialization, saturating at total capacity
    pub fn frames_written(&self) -> usize {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Byte offset where the next write begins
    pub fn write_cursor(&self) -> usize {
        self.write_cursor.load(Ordering::Acquire)
    }

    /// Storage of an initialized, not destroyed ring
    ///
    /// # Panics
    /// Operating on a destroyed or uninitialized ring is a contract violation.
    pub(crate) fn live_storage(&self) -> &[AtomicU8] {
        match (&self.storage, self.initialized) {
            (Some(storage), true) => storage,
            (None, _) => panic!("ring storage has been released"),
            (Some(_), false) => panic!("ring not initialized"),
        }
    }

    pub(crate) fn cursor(&self) -> &AtomicUsize {
        &self.write_cursor
    }

    pub(crate) fn fill_counter(&self) -> &AtomicUsize {
        &self.frames_written
    }

    pub(crate) fn state_cell(&self) -> &StateCell {
        &self.state
    }
}

impl std::fmt::Debug for SatRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SatRing")
            .field("geometry", &self.geometry)
            .field("initialized", &self.initialized)
            .field("destroyed", &self.is_destroyed())
            .field("write_cursor", &self.write_cursor.load(Ordering::Relaxed))
            .field("frames_written", &self.frames_written())
            .finish()
    }
}

fn allocate(bytes: usize) -> Result<Box<[AtomicU8]>> {
    let mut storage: Vec<AtomicU8> = Vec::new();
    storage
        .try_reserve_exact(bytes)
        .map_err(|_| SatRingError::Allocation { bytes })?;
    storage.resize_with(bytes, || AtomicU8::new(0));
    Ok(storage.into_boxed_slice())
}

/// Copy `src` into ring bytes
pub(crate) fn store_bytes(dst: &[AtomicU8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (slot, &byte) in dst.iter().zip(src) {
        slot.store(byte, Ordering::Relaxed);
    }
}

/// Copy ring bytes into `dst`
pub(crate) fn load_bytes(src: &[AtomicU8], dst: &mut [u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (byte, slot) in dst.iter_mut().zip(src) {
        *byte = slot.load(Ordering::Relaxed);
    }
}
