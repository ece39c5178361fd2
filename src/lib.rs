//! satring - always-full audio ring buffer
//!
//! A single-producer/single-consumer ring for continuous audio frames.
//! The capture callback writes without blocking or allocating; the
//! analysis side periodically copies out the most recent window.
//!
//! ```text
//! FrameSource → RingWriter → SatRing storage → RingReader → Snapshot
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod ring;
pub mod stream;

pub use error::{Result, SatRingError};
pub use ring::{
    ReadOutcome, RingGeometry, RingReader, RingState, RingWriter, SafetyMargin, SatRing,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
