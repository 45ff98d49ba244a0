//! Common primitives shared by the codec and the assembler.

/// Width-checked bit-field packing and extraction.
pub mod bits;
/// Error taxonomy and result alias.
pub mod error;

pub use error::{IsaError, Result};
