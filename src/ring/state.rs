//! Fill state of the ring and outcomes of a single read

use std::sync::atomic::{AtomicU8, Ordering};

/// Persisted fill state
///
/// `NotFull` is the initial state. The ring moves to `ReadyForReading`
/// once every frame of the total capacity has been written and never
/// moves back while it stays initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RingState {
    NotFull = 0,
    ReadyForReading = 1,
}

impl RingState {
    /// Decode a stored state value
    ///
    /// # Panics
    /// Any value other than a known state is an invalid state and a defect.
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => RingState::NotFull,
            1 => RingState::ReadyForReading,
            other => panic!("invalid ring state: {other}"),
        }
    }
}

/// Result of one `read` against the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Not enough history yet; the output was zero-filled
    NotFull,
    /// The output holds a full user-visible window
    ReadSuccess,
}

impl ReadOutcome {
    pub fn is_success(&self) -> bool {
        *self == ReadOutcome::ReadSuccess
    }
}

impl std::fmt::Display for ReadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadOutcome::NotFull => write!(f, "not full"),
            ReadOutcome::ReadSuccess => write!(f, "read success"),
        }
    }
}

/// Atomic holder for `RingState` shared between producer and consumer
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(RingState::NotFull as u8))
    }

    pub(crate) fn load(&self) -> RingState {
        RingState::from_raw(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn mark_ready(&self) {
        self.0
            .store(RingState::ReadyForReading as u8, Ordering::Release);
    }

    /// Only valid while the ring is exclusively borrowed
    pub(crate) fn reset(&mut self) {
        *self.0.get_mut() = RingState::NotFull as u8;
    }

    #[cfg(test)]
    pub(crate) fn store_raw(&self, raw: u8) {
        self.0.store(raw, Ordering::Release);
    }
}
