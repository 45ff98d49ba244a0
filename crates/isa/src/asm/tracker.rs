//! Configuration-register state tracking.
//!
//! The engine's configuration registers (base addresses, GLB
//! descriptors, quantization factors, AAI) persist across data
//! instructions, so the assembler caches the last value it emitted for
//! each register class and suppresses SETs that would not change
//! anything. A scalar instruction can write any configuration register
//! indirectly, so executing one invalidates every tracked slot.

use crate::isa::field::{Field, FieldRecord};
use crate::isa::op::{Op, Selector};

/// A hardware configuration-register class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum RegClass {
    /// Primary load base address.
    LoadBase,
    /// Secondary (dual-load) base address.
    Load2Base,
    /// Store base address.
    StoreBase,
    /// Load-side GLB descriptor.
    LoadDesc,
    /// Store-side GLB descriptor.
    StoreDesc,
    /// Quantization factor.
    Quant,
    /// Primary dequantization factor.
    Dequant,
    /// Secondary dequantization factor.
    Dequant2,
    /// Auto-address-increment configuration.
    Aai,
    /// Format select (Gen2).
    Format,
    /// High-order cluster mask (Gen2).
    ClusterMaskHigh,
}

/// Number of tracked register classes.
const CLASS_COUNT: usize = 11;

/// Which data-instruction family observes a register class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFamily {
    /// Observed by the load side of memory instructions.
    Load,
    /// Observed by the store side of memory instructions.
    Store,
    /// Observed by either side.
    Either,
}

impl RegClass {
    /// The SET selector that writes this register class.
    pub const fn selector(self) -> Selector {
        match self {
            Self::LoadBase => Selector::LoadBase,
            Self::Load2Base => Selector::Load2Base,
            Self::StoreBase => Selector::StoreBase,
            Self::LoadDesc => Selector::LoadGlb,
            Self::StoreDesc => Selector::StoreGlb,
            Self::Quant => Selector::Quant,
            Self::Dequant => Selector::Dequant,
            Self::Dequant2 => Selector::Dequant2,
            Self::Aai => Selector::Aai,
            Self::Format => Selector::Format,
            Self::ClusterMaskHigh => Selector::ClusterMaskHigh,
        }
    }

    /// Inverse of [`RegClass::selector`].
    pub const fn from_selector(sel: Selector) -> Self {
        match sel {
            Selector::LoadBase => Self::LoadBase,
            Selector::Load2Base => Self::Load2Base,
            Selector::StoreBase => Self::StoreBase,
            Selector::LoadGlb => Self::LoadDesc,
            Selector::StoreGlb => Self::StoreDesc,
            Selector::Quant => Self::Quant,
            Selector::Dequant => Self::Dequant,
            Selector::Dequant2 => Self::Dequant2,
            Selector::Aai => Self::Aai,
            Selector::Format => Self::Format,
            Selector::ClusterMaskHigh => Self::ClusterMaskHigh,
        }
    }

    /// The fixed relativity table: which instruction family consumes
    /// this register class.
    pub const fn family(self) -> AccessFamily {
        match self {
            Self::LoadBase | Self::Load2Base | Self::LoadDesc | Self::Dequant | Self::Dequant2 => {
                AccessFamily::Load
            }
            Self::StoreBase | Self::StoreDesc | Self::Quant => AccessFamily::Store,
            Self::Aai | Self::Format | Self::ClusterMaskHigh => AccessFamily::Either,
        }
    }
}

/// Returns the register class a SET record writes, if the record is one.
pub const fn set_class(record: &FieldRecord) -> Option<RegClass> {
    match record.op {
        Some(Op::Set(sel)) => Some(RegClass::from_selector(sel)),
        _ => None,
    }
}

/// True if `record` is a scalar-class instruction.
pub const fn is_scalar(record: &FieldRecord) -> bool {
    matches!(record.op, Some(Op::Scalar(_)))
}

/// True if executing `record` observes the configuration register
/// `class`.
pub const fn consumes(record: &FieldRecord, class: RegClass) -> bool {
    let touches_load = matches!(record.op, Some(Op::Load));
    // A fully fused instruction stores as well as loads.
    let touches_store = matches!(record.op, Some(Op::Store)) || matches!(record.op3, Some(Op::Store));
    let dual = record.get_or_zero(Field::DualLoad) == 1;
    match class.family() {
        AccessFamily::Load => match class {
            // The secondary base and dequantize factor only feed dual
            // loads.
            RegClass::Load2Base | RegClass::Dequant2 => touches_load && dual,
            _ => touches_load,
        },
        AccessFamily::Store => touches_store,
        AccessFamily::Either => touches_load || touches_store,
    }
}

/// Cache of the last value emitted for each configuration register
/// class.
///
/// Values are canonical 64-bit keys chosen by the builder (raw payloads
/// for scalar registers, packed field tuples for descriptors); the
/// tracker only compares them.
#[derive(Debug, Clone, Default)]
pub struct ConfigTracker {
    values: [Option<u64>; CLASS_COUNT],
}

impl ConfigTracker {
    /// Creates an empty tracker: every class reads as unknown.
    pub const fn new() -> Self {
        Self {
            values: [None; CLASS_COUNT],
        }
    }

    /// True if emitting `value` for `class` would change hardware
    /// state; false means the SET can be suppressed.
    pub const fn would_change(&self, class: RegClass, value: u64) -> bool {
        match self.values[class as usize] {
            Some(current) => current != value,
            None => true,
        }
    }

    /// Records `value` as the live content of `class`.
    pub const fn record(&mut self, class: RegClass, value: u64) {
        self.values[class as usize] = Some(value);
    }

    /// Forgets all tracked state.
    ///
    /// Called after any scalar instruction: a scalar write could alter
    /// any configuration register indirectly, so every later
    /// configuration use must re-emit unconditionally.
    pub const fn invalidate_all(&mut self) {
        self.values = [None; CLASS_COUNT];
    }
}
