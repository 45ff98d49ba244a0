//! Operand fields and the field record.
//!
//! A [`FieldRecord`] is the structured middle form between mnemonic text
//! and the binary instruction word: three opcode slots plus a closed,
//! enum-indexed set of named unsigned operand values. The closed [`Field`]
//! enum replaces an open string-keyed map; the generic name/value view
//! exists only at the mnemonic-table boundary ([`Field::name`] /
//! [`Field::from_name`]). Width checking happens at the bit-packing
//! chokepoint, not here: a record may briefly hold an out-of-range value,
//! but it can never be encoded.

use crate::isa::op::Op;

/// A named operand or descriptor field of the vector engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Field {
    /// First source register.
    Rs,
    /// Second source register.
    Rt,
    /// Destination register.
    Rd,
    /// 16-bit immediate (rendered signed in text).
    Imm,
    /// Memory offset in 64-byte units.
    Offset,
    /// Signed branch offset in instruction counts.
    BranchOff,
    /// Element data-type tag.
    Dtype,
    /// Immediate-form flag on arithmetic instructions.
    HasImm,
    /// Upper-half mode flag on plain memory instructions.
    UpperHalf,
    /// 16-bit-integer mode flag on plain memory instructions.
    Int16,
    /// Dual-load flag.
    DualLoad,
    /// Raw configuration payload (bases, factors, format select).
    Payload,
    /// GLB descriptor stride.
    Stride,
    /// GLB descriptor cluster mask.
    ClusterMask,
    /// GLB descriptor bank mask.
    BankMask,
    /// GLB descriptor broadcast bits.
    Broadcast,
    /// GLB descriptor channel-broadcast flag (Gen2 only).
    ChanBroadcast,
    /// AAI enable flag.
    AaiEnable,
    /// AAI burst length.
    AaiLength,
    /// AAI address stride.
    AaiStride,
    /// Hardware loop iteration count.
    Count,
    /// Register-file bank index.
    Bank,
    /// Configuration selector operand of an indirect config write.
    Selector,
}

/// Number of distinct fields; sizes the record's value table.
pub const FIELD_COUNT: usize = 23;

/// Every field, in declaration order. Used to iterate a record's
/// populated fields.
pub const ALL_FIELDS: [Field; FIELD_COUNT] = [
    Field::Rs,
    Field::Rt,
    Field::Rd,
    Field::Imm,
    Field::Offset,
    Field::BranchOff,
    Field::Dtype,
    Field::HasImm,
    Field::UpperHalf,
    Field::Int16,
    Field::DualLoad,
    Field::Payload,
    Field::Stride,
    Field::ClusterMask,
    Field::BankMask,
    Field::Broadcast,
    Field::ChanBroadcast,
    Field::AaiEnable,
    Field::AaiLength,
    Field::AaiStride,
    Field::Count,
    Field::Bank,
    Field::Selector,
];

impl Field {
    /// Canonical text name, used only at the mnemonic-table boundary.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rs => "rs",
            Self::Rt => "rt",
            Self::Rd => "rd",
            Self::Imm => "imm",
            Self::Offset => "offset",
            Self::BranchOff => "branch_off",
            Self::Dtype => "dtype",
            Self::HasImm => "has_imm",
            Self::UpperHalf => "upper_half",
            Self::Int16 => "int16",
            Self::DualLoad => "dual_load",
            Self::Payload => "payload",
            Self::Stride => "stride",
            Self::ClusterMask => "cluster_mask",
            Self::BankMask => "bank_mask",
            Self::Broadcast => "broadcast",
            Self::ChanBroadcast => "chan_broadcast",
            Self::AaiEnable => "aai_enable",
            Self::AaiLength => "aai_length",
            Self::AaiStride => "aai_stride",
            Self::Count => "count",
            Self::Bank => "bank",
            Self::Selector => "selector",
        }
    }

    /// Inverse of [`Field::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_FIELDS.iter().copied().find(|f| f.name() == name)
    }

    /// True for fields whose 16-bit value is rendered as a signed
    /// integer in mnemonic text.
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Imm | Self::BranchOff)
    }
}

/// The structured form of one instruction.
///
/// Value type with no shared ownership; cloning a record (or any
/// container of records) yields a fully independent copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldRecord {
    /// Primary operation.
    pub op: Option<Op>,
    /// Fused compute half, when present.
    pub op2: Option<Op>,
    /// Fused store half, when present.
    pub op3: Option<Op>,
    values: [Option<u32>; FIELD_COUNT],
}

impl FieldRecord {
    /// Creates an empty record.
    pub const fn new() -> Self {
        Self {
            op: None,
            op2: None,
            op3: None,
            values: [None; FIELD_COUNT],
        }
    }

    /// Creates a record with only the primary operation populated.
    pub const fn with_op(op: Op) -> Self {
        let mut rec = Self::new();
        rec.op = Some(op);
        rec
    }

    /// Stores a field value, replacing any previous value.
    pub const fn set(&mut self, field: Field, value: u32) -> &mut Self {
        self.values[field as usize] = Some(value);
        self
    }

    /// Returns the stored value for `field`, if populated.
    pub const fn get(&self, field: Field) -> Option<u32> {
        self.values[field as usize]
    }

    /// Returns the stored value for `field`, or zero.
    ///
    /// Decode populates every field its class declares, so a zero
    /// default is only reachable for fields a class treats as
    /// irrelevant.
    pub const fn get_or_zero(&self, field: Field) -> u32 {
        match self.values[field as usize] {
            Some(v) => v,
            None => 0,
        }
    }

    /// Iterates over the populated `(field, value)` pairs in
    /// declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, u32)> + '_ {
        ALL_FIELDS
            .iter()
            .filter_map(|&f| self.values[f as usize].map(|v| (f, v)))
    }
}
