//! Instruction codec and stream assembler for a tensor-accelerator
//! vector engine.
//!
//! The crate is split along the two jobs it does:
//!
//! - [`isa`]: the stateless instruction codec. Operation enums, the
//!   structured [`isa::field::FieldRecord`] middle form, per-generation
//!   encoding profiles, the mnemonic format registry, and the 32-bit
//!   word encode/decode behind the [`isa::InstructionCodec`] trait.
//! - [`asm`]: the stateful assembler. [`asm::StreamBuilder`] turns byte
//!   addresses and operation enums into a legal instruction stream,
//!   emitting and suppressing configuration-register traffic as needed,
//!   and [`asm::CycleEstimator`] interprets finalized streams for a
//!   cycle count.
//!
//! # Example
//!
//! ```
//! use vpuasm_core::asm::{MemMode, StreamBuilder};
//! use vpuasm_core::config::AsmConfig;
//! use vpuasm_core::isa::op::{AluOp, Dtype};
//!
//! # fn main() -> vpuasm_core::Result<()> {
//! let mut builder = StreamBuilder::new(AsmConfig::default());
//! builder.load(0, Dtype::Int8, MemMode::default(), 0x4000)?;
//! builder.compute(AluOp::Add, 0, 0, 1)?;
//! builder.store(1, Dtype::Int8, MemMode::default(), 0x8_0000)?;
//! let program = builder.finalize()?;
//! assert_eq!(program.len() % 8, 0);
//! # Ok(())
//! # }
//! ```

/// Stream assembly and cycle estimation.
pub mod asm;
/// Bit packing and error types shared across the crate.
pub mod common;
/// Assembler configuration.
pub mod config;
/// The instruction set and word codec.
pub mod isa;

pub use common::error::{IsaError, Result};
pub use config::AsmConfig;
pub use isa::{EngineKind, InstructionCodec, VpuCodec};
