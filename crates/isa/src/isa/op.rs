//! Operation enums for the vector engine.
//!
//! Every operation the engine can perform is a variant of a closed enum:
//! the word codec and the cycle estimator dispatch on these exhaustively,
//! so a new operation cannot be added to the encoder without the
//! estimator being forced to handle (or explicitly ignore) it.

/// A configuration-register SET selector (bits [30:24] of a
/// configuration-class word).
///
/// Selectors 1..=9 exist in both encoding generations;
/// [`Selector::Format`] and [`Selector::ClusterMaskHigh`] are Gen2 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Primary load base address (64-byte granular).
    LoadBase,
    /// Secondary load base address, used by dual loads.
    Load2Base,
    /// Store base address.
    StoreBase,
    /// Load-side GLB stride/mask/broadcast descriptor.
    LoadGlb,
    /// Store-side GLB stride/mask/broadcast descriptor.
    StoreGlb,
    /// Quantization factor applied on the store path.
    Quant,
    /// Primary dequantization factor applied on the load path.
    Dequant,
    /// Secondary dequantization factor, used by dual loads.
    Dequant2,
    /// Auto-address-increment configuration (enable, length, stride).
    Aai,
    /// Data-format select (Gen2 only).
    Format,
    /// High-order cluster-mask bits (Gen2 only).
    ClusterMaskHigh,
}

impl Selector {
    /// Raw 7-bit selector value carried in the word.
    pub const fn raw(self) -> u32 {
        match self {
            Self::LoadBase => 1,
            Self::Load2Base => 2,
            Self::StoreBase => 3,
            Self::LoadGlb => 4,
            Self::StoreGlb => 5,
            Self::Quant => 6,
            Self::Dequant => 7,
            Self::Dequant2 => 8,
            Self::Aai => 9,
            Self::Format => 10,
            Self::ClusterMaskHigh => 11,
        }
    }

    /// Maps a raw selector value back to its variant.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::LoadBase),
            2 => Some(Self::Load2Base),
            3 => Some(Self::StoreBase),
            4 => Some(Self::LoadGlb),
            5 => Some(Self::StoreGlb),
            6 => Some(Self::Quant),
            7 => Some(Self::Dequant),
            8 => Some(Self::Dequant2),
            9 => Some(Self::Aai),
            10 => Some(Self::Format),
            11 => Some(Self::ClusterMaskHigh),
            _ => None,
        }
    }
}

/// A vector arithmetic operation (bits [28:24] of an arithmetic-class
/// word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Element-wise addition.
    Add,
    /// Element-wise subtraction.
    Sub,
    /// Element-wise multiplication.
    Mul,
    /// Element-wise maximum.
    Max,
    /// Element-wise minimum.
    Min,
    /// Register move.
    Mov,
    /// Horizontal reduce-sum into the destination slot.
    RSum,
    /// Compare equal.
    Eq,
    /// Compare not-equal.
    Ne,
    /// Compare less-than.
    Lt,
    /// Compare less-or-equal.
    Le,
    /// Compare greater-than.
    Gt,
    /// Lane select by mask.
    Sel,
}

impl AluOp {
    /// Raw 5-bit operation value.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Maps a raw operation value back to its variant.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Add),
            1 => Some(Self::Sub),
            2 => Some(Self::Mul),
            3 => Some(Self::Max),
            4 => Some(Self::Min),
            5 => Some(Self::Mov),
            6 => Some(Self::RSum),
            7 => Some(Self::Eq),
            8 => Some(Self::Ne),
            9 => Some(Self::Lt),
            10 => Some(Self::Le),
            11 => Some(Self::Gt),
            12 => Some(Self::Sel),
            _ => None,
        }
    }

    /// True for operations that take two source registers; `Mov` and
    /// `RSum` are unary.
    pub const fn is_binary(self) -> bool {
        !matches!(self, Self::Mov | Self::RSum)
    }
}

/// The compute selector of a fused memory instruction (bits [26:24]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FusedOp {
    /// Fused addition.
    Add,
    /// Fused subtraction.
    Sub,
    /// Fused multiplication.
    Mul,
    /// Fused maximum.
    Max,
    /// Fused minimum.
    Min,
    /// Fused multiply-accumulate.
    Mac,
    /// Fused rectified linear unit.
    Relu,
    /// Fused accumulating sum.
    Sum,
}

impl FusedOp {
    /// Raw 3-bit selector value.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Maps a raw selector value back to its variant.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Add),
            1 => Some(Self::Sub),
            2 => Some(Self::Mul),
            3 => Some(Self::Max),
            4 => Some(Self::Min),
            5 => Some(Self::Mac),
            6 => Some(Self::Relu),
            7 => Some(Self::Sum),
            _ => None,
        }
    }
}

/// A scalar-class operation (bits [29:24] of a scalar-class word).
///
/// Scalar instructions run on the engine's control processor: immediate
/// and register arithmetic, branches with instruction-count offsets,
/// hardware loop control, register-file bank selection, and indirect
/// configuration-register writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ScalarOp {
    /// Add immediate.
    Addi = 0x01,
    /// Subtract immediate.
    Subi = 0x02,
    /// Multiply by immediate.
    Muli = 0x03,
    /// Bitwise AND with immediate.
    Andi = 0x04,
    /// Bitwise OR with immediate.
    Ori = 0x05,
    /// Bitwise XOR with immediate.
    Xori = 0x06,
    /// Shift left logical by immediate.
    Slli = 0x07,
    /// Shift right logical by immediate.
    Srli = 0x08,
    /// Load upper 16 bits from immediate.
    Lui = 0x09,
    /// Move immediate into register.
    Movi = 0x0A,

    /// Register addition.
    Add = 0x10,
    /// Register subtraction.
    Sub = 0x11,
    /// Register multiplication.
    Mul = 0x12,
    /// Bitwise AND.
    And = 0x13,
    /// Bitwise OR.
    Or = 0x14,
    /// Bitwise XOR.
    Xor = 0x15,
    /// Shift left logical.
    Sll = 0x16,
    /// Shift right logical.
    Srl = 0x17,
    /// Register move.
    Mov = 0x18,
    /// Register maximum.
    Max = 0x19,
    /// Register minimum.
    Min = 0x1A,
    /// Set destination to 1 if `rs < rt`, else 0.
    Slt = 0x1B,
    /// Conditional select: `rd = if rs != 0 { rt } else { rd }`.
    Sel = 0x1C,

    /// Unconditional jump by a signed instruction-count offset.
    Jmp = 0x20,
    /// Branch if `rs == rt`.
    Jeq = 0x21,
    /// Branch if `rs != rt`.
    Jne = 0x22,
    /// Branch if `rs < rt`.
    Jlt = 0x23,
    /// Branch if `rs >= rt`.
    Jge = 0x24,

    /// Hardware loop start with an iteration count.
    LoopStart = 0x28,
    /// Hardware loop end; jumps back while iterations remain.
    LoopEnd = 0x29,
    /// Register-file bank select (0 = low bank, 1 = high bank).
    BankSel = 0x2A,
    /// Indirect configuration-register write from a scalar register.
    CfgWr = 0x2B,
}

impl ScalarOp {
    /// Raw 6-bit opcode value.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Maps a raw opcode value back to its variant.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0x01 => Some(Self::Addi),
            0x02 => Some(Self::Subi),
            0x03 => Some(Self::Muli),
            0x04 => Some(Self::Andi),
            0x05 => Some(Self::Ori),
            0x06 => Some(Self::Xori),
            0x07 => Some(Self::Slli),
            0x08 => Some(Self::Srli),
            0x09 => Some(Self::Lui),
            0x0A => Some(Self::Movi),
            0x10 => Some(Self::Add),
            0x11 => Some(Self::Sub),
            0x12 => Some(Self::Mul),
            0x13 => Some(Self::And),
            0x14 => Some(Self::Or),
            0x15 => Some(Self::Xor),
            0x16 => Some(Self::Sll),
            0x17 => Some(Self::Srl),
            0x18 => Some(Self::Mov),
            0x19 => Some(Self::Max),
            0x1A => Some(Self::Min),
            0x1B => Some(Self::Slt),
            0x1C => Some(Self::Sel),
            0x20 => Some(Self::Jmp),
            0x21 => Some(Self::Jeq),
            0x22 => Some(Self::Jne),
            0x23 => Some(Self::Jlt),
            0x24 => Some(Self::Jge),
            0x28 => Some(Self::LoopStart),
            0x29 => Some(Self::LoopEnd),
            0x2A => Some(Self::BankSel),
            0x2B => Some(Self::CfgWr),
            _ => None,
        }
    }

    /// True for immediate-arithmetic forms (`rd, rs, imm`).
    pub const fn is_imm_arith(self) -> bool {
        matches!(
            self,
            Self::Addi
                | Self::Subi
                | Self::Muli
                | Self::Andi
                | Self::Ori
                | Self::Xori
                | Self::Slli
                | Self::Srli
        )
    }

    /// True for register-arithmetic forms (`rd, rs, rt`).
    pub const fn is_reg_arith(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::And
                | Self::Or
                | Self::Xor
                | Self::Sll
                | Self::Srl
                | Self::Max
                | Self::Min
                | Self::Slt
                | Self::Sel
        )
    }

    /// True for conditional branches (`rs, rt, offset`).
    pub const fn is_cond_branch(self) -> bool {
        matches!(self, Self::Jeq | Self::Jne | Self::Jlt | Self::Jge)
    }
}

/// The element data type of a memory-class instruction (bits [29:28]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Dtype {
    /// Signed 8-bit integer.
    Int8 = 0,
    /// Unsigned 8-bit integer.
    Uint8 = 1,
    /// bfloat16.
    Bf16 = 2,
    /// 32-bit float.
    Fp32 = 3,
}

impl Dtype {
    /// Raw 2-bit tag value.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Maps a raw tag back to its variant. Total over 2-bit inputs.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Int8),
            1 => Some(Self::Uint8),
            2 => Some(Self::Bf16),
            3 => Some(Self::Fp32),
            _ => None,
        }
    }
}

/// An operation occupying one of a record's three opcode slots.
///
/// The primary slot (`op`) may hold any variant except [`Op::Fused`];
/// the second slot (`op2`) holds the compute half of a fused memory
/// instruction; the third slot (`op3`) is only ever [`Op::Store`], on
/// fully fused load+compute+store instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// No-operation sentinel (all-zero word).
    Nop,
    /// Terminal end-of-stream sentinel.
    End,
    /// Configuration-register SET.
    Set(Selector),
    /// Vector load from GLB.
    Load,
    /// Vector store to GLB.
    Store,
    /// Vector arithmetic operation.
    Alu(AluOp),
    /// Fused compute selector (secondary slot only).
    Fused(FusedOp),
    /// Scalar control-processor operation.
    Scalar(ScalarOp),
}
