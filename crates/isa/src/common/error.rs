//! Error taxonomy for the codec and assembler.
//!
//! All failures in this crate are local and synchronous: they are raised
//! at the call that detects them and there is no deferred or batched
//! reporting. Encoding-side failures ([`IsaError::FieldRange`],
//! [`IsaError::UnknownMnemonic`]) indicate a compiler-internal bug in the
//! caller; decoding-side failures ([`IsaError::Unrepresentable`],
//! [`IsaError::MalformedText`]) can legitimately occur when reading
//! hand-written or foreign-generation assembly.

use thiserror::Error;

/// Errors produced by the instruction codec and stream assembler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsaError {
    /// A field value exceeds its declared bit width.
    ///
    /// Raised at the bit-packing chokepoint; the value is never
    /// truncated into the word.
    #[error("field `{field}` value {value} does not fit in {width} bits")]
    FieldRange {
        /// Name of the offending field.
        field: &'static str,
        /// The out-of-range value.
        value: u32,
        /// Declared width of the field in bits.
        width: u32,
    },

    /// No mnemonic format matches the requested name and argument count.
    #[error("unknown mnemonic `{0}` for the given argument count")]
    UnknownMnemonic(String),

    /// No registered mnemonic format can render the given word.
    ///
    /// Disassembly is best-effort; this surfaces the empty table result
    /// at the codec boundary.
    #[error("instruction word {0:#010x} has no mnemonic representation")]
    Unrepresentable(u32),

    /// A text line could not be tokenised into a mnemonic and decimal
    /// integer arguments, or a record is structurally incomplete.
    #[error("malformed instruction text: `{0}`")]
    MalformedText(String),

    /// A configuration selector is not encodable under the active
    /// encoding profile.
    #[error("configuration selector {0} is not valid under the active encoding profile")]
    UnsupportedSelector(u32),

    /// A memory offset is not aligned to the 64-byte access granule.
    #[error("byte offset {0:#x} is not 64-byte aligned")]
    MisalignedOffset(u64),

    /// A label name was introduced twice in one stream.
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),

    /// A branch referenced a label that has not been defined.
    #[error("unknown label `{0}`")]
    UnknownLabel(String),

    /// A branch target does not fit the 16-bit signed offset field.
    #[error("branch offset {0} out of range for a 16-bit field")]
    BranchOutOfRange(i64),

    /// The cycle estimator exhausted its step budget before reaching END.
    #[error("stream did not terminate within the step budget ({executed} instructions executed)")]
    NonterminatingEstimate {
        /// Number of instructions executed before giving up.
        executed: u64,
    },

    /// An emission method was called on an already finalized stream.
    #[error("instruction stream is already finalized")]
    StreamFinalized,
}

/// Convenience alias for results carrying [`IsaError`].
pub type Result<T> = std::result::Result<T, IsaError>;
