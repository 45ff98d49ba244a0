//! Stream assembly: state tracking, address windowing, redundancy
//! elimination, and cycle estimation.
//!
//! The assembler layers on top of the codec in `crate::isa`: it decides
//! *which* records to emit (and which configuration writes to omit),
//! while the codec decides how each record becomes a word.

/// Stream builder and finalized programs.
pub mod builder;
/// Cycle estimation by stream interpretation.
pub mod estimate;
/// Configuration-register redundancy tracking.
pub mod tracker;
/// Base/offset address windowing.
pub mod window;

pub use builder::{GlbDescriptor, MemMode, Program, StreamBuilder};
pub use estimate::CycleEstimator;
