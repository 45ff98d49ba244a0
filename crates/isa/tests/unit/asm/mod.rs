//! Unit tests for the assembler layer.


/// Cycle estimation by stream interpretation.
pub mod estimator;

/// Configuration-register state tracking.
pub mod tracker;
