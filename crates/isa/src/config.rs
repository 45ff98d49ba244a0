//! Assembler configuration.
//!
//! Parameterizes one assembly run: the encoding generation, the engine's
//! command-memory geometry, and the estimator's step budget. Supplied as
//! JSON by the surrounding toolchain or via [`AsmConfig::default`].

use serde::Deserialize;

use crate::common::error::{IsaError, Result};
use crate::isa::profile::EncodingProfile;

/// Default configuration constants for the vector engine.
pub mod defaults {
    /// Command-memory capacity in instruction words.
    ///
    /// The estimator's program counter wraps at this boundary.
    pub const COMMAND_MEMORY_WORDS: usize = 1024;

    /// Instructions per DMA transfer granule.
    ///
    /// A finalized stream is padded with NOPs so its length is a
    /// multiple of this ratio (transfer granularity / instruction
    /// size).
    pub const COMMANDS_PER_TRANSFER: usize = 8;

    /// Cycle-estimator step budget.
    ///
    /// Interpretation aborts with a nontermination error once this many
    /// instructions have executed without reaching END.
    pub const STEP_BUDGET: u64 = 1 << 20;
}

/// Configuration for one assembly/estimation run.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    /// Encoding generation, fixed for the whole program.
    pub profile: EncodingProfile,
    /// Command-memory capacity in instruction words.
    pub command_memory_words: usize,
    /// Stream padding ratio (instructions per transfer granule).
    pub commands_per_transfer: usize,
    /// Cycle-estimator step budget.
    pub step_budget: u64,
}

impl AsmConfig {
    /// Parses a configuration from its JSON representation. Absent
    /// fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::MalformedText`] on invalid JSON or an
    /// unknown profile name.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| IsaError::MalformedText(err.to_string()))
    }
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            profile: EncodingProfile::default(),
            command_memory_words: defaults::COMMAND_MEMORY_WORDS,
            commands_per_transfer: defaults::COMMANDS_PER_TRANSFER,
            step_budget: defaults::STEP_BUDGET,
        }
    }
}
