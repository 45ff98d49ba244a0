//! Unit tests for the instruction set and word codec.


/// Gen1/Gen2 layout divergence.
pub mod profiles;

/// Round-trip laws over every registered mnemonic format.
pub mod roundtrip;
