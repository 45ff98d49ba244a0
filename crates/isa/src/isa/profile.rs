//! Encoding profiles for the two vector-engine generations.
//!
//! The base (Gen1) and extended (Gen2) generations share the word-class
//! structure but diverge in a handful of bit positions: the GLB
//! descriptor layout (Gen2 narrows the inline cluster mask and adds a
//! channel-broadcast flag), the dequantize payload width (16 vs 24
//! bits), and two extra configuration selectors (format select and the
//! high-order cluster mask). A profile is chosen once per program and
//! never mixed within one stream.

use serde::Deserialize;

use crate::isa::op::Selector;

/// Position of one field within a 24-bit descriptor payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    /// Field width in bits.
    pub width: u32,
    /// Bit position of the least significant bit.
    pub low: u32,
}

/// Bit layout of a GLB stride/mask/broadcast descriptor payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorLayout {
    /// Stride field.
    pub stride: FieldSlot,
    /// Cluster-mask field.
    pub cluster_mask: FieldSlot,
    /// Bank-mask field.
    pub bank_mask: FieldSlot,
    /// Broadcast field.
    pub broadcast: FieldSlot,
    /// Channel-broadcast flag; absent in Gen1.
    pub chan_broadcast: Option<FieldSlot>,
}

/// Layout table for one encoding generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileTables {
    /// Layout of load- and store-side GLB descriptors.
    pub descriptor: DescriptorLayout,
    /// Width of the dequantize factor payloads in bits.
    pub dequant_width: u32,
    /// Highest valid configuration selector value.
    pub max_selector: u32,
}

/// Gen1 layout: 9 selectors, 16-bit dequantize payload, 8-bit inline
/// cluster mask, no channel broadcast.
static GEN1_TABLES: ProfileTables = ProfileTables {
    descriptor: DescriptorLayout {
        stride: FieldSlot { width: 3, low: 21 },
        cluster_mask: FieldSlot { width: 8, low: 13 },
        bank_mask: FieldSlot { width: 4, low: 9 },
        broadcast: FieldSlot { width: 9, low: 0 },
        chan_broadcast: None,
    },
    dequant_width: 16,
    max_selector: Selector::Aai.raw(),
};

/// Gen2 layout: 11 selectors, 24-bit dequantize payload, 7-bit inline
/// cluster mask (high bits via [`Selector::ClusterMaskHigh`]), channel
/// broadcast at bit 20.
static GEN2_TABLES: ProfileTables = ProfileTables {
    descriptor: DescriptorLayout {
        stride: FieldSlot { width: 3, low: 21 },
        cluster_mask: FieldSlot { width: 7, low: 13 },
        bank_mask: FieldSlot { width: 4, low: 9 },
        broadcast: FieldSlot { width: 9, low: 0 },
        chan_broadcast: Some(FieldSlot { width: 1, low: 20 }),
    },
    dequant_width: 24,
    max_selector: Selector::ClusterMaskHigh.raw(),
};

/// The encoding generation a program is assembled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingProfile {
    /// Base generation.
    #[default]
    Gen1,
    /// Extended generation: channel broadcast, wide dequantize payload,
    /// format-select and high-order cluster-mask selectors.
    Gen2,
}

impl EncodingProfile {
    /// Layout table for this generation.
    pub const fn tables(self) -> &'static ProfileTables {
        match self {
            Self::Gen1 => &GEN1_TABLES,
            Self::Gen2 => &GEN2_TABLES,
        }
    }

    /// True if `selector` is encodable under this generation.
    pub const fn supports(self, selector: Selector) -> bool {
        selector.raw() <= self.tables().max_selector
    }
}
