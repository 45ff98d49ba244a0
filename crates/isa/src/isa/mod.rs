//! Instruction set: operations, field records, encoding profiles,
//! mnemonic formats, and the word codec.
//!
//! The [`InstructionCodec`] trait is the seam between engines: each
//! compute engine of the accelerator exposes the same six
//! text/binary/record conversions behind an explicit [`EngineKind`] tag.
//! This crate implements the vector engine ([`VpuCodec`]), the richest
//! and most irregular encoding; the sibling engines are flat bit-field
//! tables that plug in beside it.

/// Operand fields and the structured field record.
pub mod field;
/// Mnemonic format registry.
pub mod mnemonic;
/// Operation enums.
pub mod op;
/// Encoding-generation profiles.
pub mod profile;
/// Instruction word encode/decode.
pub mod word;

use crate::common::error::{IsaError, Result};
use crate::isa::field::FieldRecord;
use crate::isa::mnemonic::MnemonicTable;
use crate::isa::profile::EncodingProfile;

/// Identifies which compute engine a codec serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EngineKind {
    /// The vector compute engine.
    Vector,
}

/// Conversions between the three instruction representations: mnemonic
/// text line, structured field record, and raw binary word.
pub trait InstructionCodec {
    /// The engine this codec encodes for.
    fn engine(&self) -> EngineKind;

    /// Width of one encoded instruction in bytes.
    fn word_bytes(&self) -> usize;

    /// Encodes a field record into its binary word bytes
    /// (little-endian).
    ///
    /// # Errors
    ///
    /// Propagates width violations and structural record errors.
    fn encode_binary(&self, record: &FieldRecord) -> Result<Vec<u8>>;

    /// Decodes binary word bytes into a field record.
    ///
    /// # Errors
    ///
    /// Fails on a wrong-sized buffer or a word with no meaning in this
    /// engine/profile.
    fn decode_binary(&self, bytes: &[u8]) -> Result<FieldRecord>;

    /// Renders a field record as a mnemonic text line.
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::Unrepresentable`] if no registered mnemonic
    /// format matches the record.
    fn encode_text(&self, record: &FieldRecord) -> Result<String>;

    /// Parses a mnemonic text line into a field record.
    ///
    /// # Errors
    ///
    /// Fails on unparseable text or an unknown mnemonic/arity.
    fn decode_text(&self, line: &str) -> Result<FieldRecord>;

    /// Assembles one text line straight to binary.
    ///
    /// # Errors
    ///
    /// Propagates text-parsing and encoding failures.
    fn assemble(&self, line: &str) -> Result<Vec<u8>> {
        self.encode_binary(&self.decode_text(line)?)
    }

    /// Disassembles binary word bytes straight to text.
    ///
    /// # Errors
    ///
    /// Propagates decoding and rendering failures.
    fn disassemble(&self, bytes: &[u8]) -> Result<String> {
        self.encode_text(&self.decode_binary(bytes)?)
    }
}

/// The vector-engine codec, bound to one encoding profile.
#[derive(Debug, Clone, Copy)]
pub struct VpuCodec {
    profile: EncodingProfile,
}

impl VpuCodec {
    /// Creates a codec for the given encoding generation.
    pub const fn new(profile: EncodingProfile) -> Self {
        Self { profile }
    }

    /// The profile this codec encodes under.
    pub const fn profile(&self) -> EncodingProfile {
        self.profile
    }

    /// Encodes a record into a raw 32-bit word.
    ///
    /// # Errors
    ///
    /// See [`word::encode`].
    pub fn encode_word(&self, record: &FieldRecord) -> Result<u32> {
        word::encode(record, self.profile)
    }

    /// Decodes a raw 32-bit word into a record.
    ///
    /// # Errors
    ///
    /// See [`word::decode`].
    pub fn decode_word(&self, word: u32) -> Result<FieldRecord> {
        word::decode(word, self.profile)
    }
}

impl InstructionCodec for VpuCodec {
    fn engine(&self) -> EngineKind {
        EngineKind::Vector
    }

    fn word_bytes(&self) -> usize {
        4
    }

    fn encode_binary(&self, record: &FieldRecord) -> Result<Vec<u8>> {
        Ok(self.encode_word(record)?.to_le_bytes().to_vec())
    }

    fn decode_binary(&self, bytes: &[u8]) -> Result<FieldRecord> {
        let word: [u8; 4] = bytes
            .try_into()
            .map_err(|_| IsaError::MalformedText(format!("expected 4 bytes, got {}", bytes.len())))?;
        self.decode_word(u32::from_le_bytes(word))
    }

    fn encode_text(&self, record: &FieldRecord) -> Result<String> {
        let table = MnemonicTable::shared(self.profile);
        table.decode(record).ok_or_else(|| {
            let word = word::encode(record, self.profile).unwrap_or(0);
            IsaError::Unrepresentable(word)
        })
    }

    fn decode_text(&self, line: &str) -> Result<FieldRecord> {
        let mut tokens = line.split_whitespace();
        let mnemonic = tokens
            .next()
            .ok_or_else(|| IsaError::MalformedText(line.to_owned()))?;
        let args = tokens
            .map(|tok| {
                tok.parse::<i64>()
                    .map_err(|_| IsaError::MalformedText(line.to_owned()))
            })
            .collect::<Result<Vec<i64>>>()?;
        MnemonicTable::shared(self.profile).encode(mnemonic, &args)
    }
}
