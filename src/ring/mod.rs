//! Always-full single-producer/single-consumer audio ring
//!
//! The producer (a real-time capture callback) overwrites the oldest
//! frames and never blocks. The consumer periodically snapshots the most
//! recent window for analysis. A hidden safety margin around the write
//! cursor stands in for synchronization between the two.

mod geometry;
mod reader;
mod state;
mod storage;
mod writer;

pub use geometry::{RingGeometry, SafetyMargin, DEFAULT_SAFETY_MARGIN_FRAMES};
pub use reader::RingReader;
pub use state::{ReadOutcome, RingState};
pub use storage::SatRing;
pub use writer::RingWriter;
