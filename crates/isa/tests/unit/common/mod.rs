//! Unit tests for crate-wide shared components.

/// Bit-field packing, extraction, and sign extension.
pub mod bits;

/// Error display formatting.
pub mod error;
