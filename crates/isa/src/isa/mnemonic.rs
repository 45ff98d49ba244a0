//! Mnemonic format registry.
//!
//! Maps between mnemonic text lines and field records. Many mnemonics are
//! overloaded onto the same opcode with different fixed-field
//! combinations (e.g. every plain-load variant shares the load opcode),
//! so decoding selects among the formats registered for an opcode by
//! fixed-field equality plus `op2`/`op3` presence, preferring the format
//! with the most fixed fields. Encoding selects among the formats
//! registered for a name by argument count.
//!
//! The per-profile tables are built exactly once behind a [`LazyLock`]
//! and are immutable afterwards; lookups are lock-free reads.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::common::bits::sign_extend;
use crate::common::error::{IsaError, Result};
use crate::isa::field::{Field, FieldRecord};
use crate::isa::op::{AluOp, FusedOp, Op, ScalarOp, Selector};
use crate::isa::profile::EncodingProfile;

/// One registered text form: a mnemonic, its ordered argument fields,
/// the opcode slots it implies, and the fixed field values that
/// distinguish it from its opcode siblings.
#[derive(Debug, Clone)]
pub struct MnemonicFormat {
    /// Mnemonic name (first token of the text line).
    pub mnemonic: &'static str,
    /// Ordered argument fields following the mnemonic.
    pub args: Vec<Field>,
    /// Primary opcode slot.
    pub op: Op,
    /// Fused compute slot, when the form is a fused instruction.
    pub op2: Option<Op>,
    /// Fused store slot, on fully fused forms.
    pub op3: Option<Op>,
    /// Fixed field values implied by the mnemonic.
    pub fixed: Vec<(Field, u32)>,
    /// Parse and render the 16-bit immediate as an unsigned bit pattern
    /// (`vpu_s_lui` loads a raw upper half, not a signed value).
    pub unsigned_imm: bool,
}

impl MnemonicFormat {
    /// Builds the field record for this format given parsed argument
    /// values (in `args` order).
    fn to_record(&self, values: &[u32]) -> FieldRecord {
        debug_assert_eq!(values.len(), self.args.len());
        let mut rec = FieldRecord::with_op(self.op);
        rec.op2 = self.op2;
        rec.op3 = self.op3;
        for &(field, value) in &self.fixed {
            let _ = rec.set(field, value);
        }
        for (&field, &value) in self.args.iter().zip(values) {
            let _ = rec.set(field, value);
        }
        rec
    }

    /// True if every fixed field of this format is present in `record`
    /// with an equal value, and the opcode slots line up.
    fn matches(&self, record: &FieldRecord) -> bool {
        record.op == Some(self.op)
            && record.op2 == self.op2
            && record.op3 == self.op3
            && self
                .fixed
                .iter()
                .all(|&(field, value)| record.get(field) == Some(value))
    }
}

/// The immutable per-profile format registry.
#[derive(Debug)]
pub struct MnemonicTable {
    formats: Vec<MnemonicFormat>,
    by_name: HashMap<&'static str, Vec<usize>>,
    by_op: HashMap<Op, Vec<usize>>,
}

impl MnemonicTable {
    /// Returns the shared table for `profile`, building it on first use.
    pub fn shared(profile: EncodingProfile) -> &'static Self {
        static GEN1: LazyLock<MnemonicTable> =
            LazyLock::new(|| MnemonicTable::build(EncodingProfile::Gen1));
        static GEN2: LazyLock<MnemonicTable> =
            LazyLock::new(|| MnemonicTable::build(EncodingProfile::Gen2));
        match profile {
            EncodingProfile::Gen1 => &GEN1,
            EncodingProfile::Gen2 => &GEN2,
        }
    }

    /// Builds and self-checks the registry for one profile.
    ///
    /// # Panics
    ///
    /// Panics if two registered formats for the same opcode slots carry
    /// identical fixed-field sets. That is a static data error in this
    /// table, caught here at initialization rather than at runtime.
    fn build(profile: EncodingProfile) -> Self {
        let formats = register_formats(profile);
        let mut by_name: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut by_op: HashMap<Op, Vec<usize>> = HashMap::new();
        for (idx, format) in formats.iter().enumerate() {
            by_name.entry(format.mnemonic).or_default().push(idx);
            by_op.entry(format.op).or_default().push(idx);
        }
        for indices in by_op.values() {
            for (i, &a) in indices.iter().enumerate() {
                for &b in &indices[i + 1..] {
                    let (fa, fb) = (&formats[a], &formats[b]);
                    let ambiguous = fa.op2 == fb.op2
                        && fa.op3 == fb.op3
                        && fixed_map(fa) == fixed_map(fb);
                    assert!(
                        !ambiguous,
                        "mnemonic formats `{}` and `{}` are indistinguishable on decode",
                        fa.mnemonic, fb.mnemonic
                    );
                }
            }
        }
        Self {
            formats,
            by_name,
            by_op,
        }
    }

    /// All registered formats, in registration order.
    pub fn formats(&self) -> &[MnemonicFormat] {
        &self.formats
    }

    /// Builds a field record from a mnemonic and its argument values.
    ///
    /// The format is selected by argument count among the formats
    /// registered under `mnemonic`. Signed argument fields accept
    /// negative values and are stored in 16-bit two's-complement form.
    ///
    /// # Errors
    ///
    /// [`IsaError::UnknownMnemonic`] if no format matches the name and
    /// arity; [`IsaError::MalformedText`] if an argument value cannot be
    /// represented in its field.
    pub fn encode(&self, mnemonic: &str, args: &[i64]) -> Result<FieldRecord> {
        let format = self
            .by_name
            .get(mnemonic)
            .into_iter()
            .flatten()
            .map(|&idx| &self.formats[idx])
            .find(|format| format.args.len() == args.len())
            .ok_or_else(|| IsaError::UnknownMnemonic(mnemonic.to_owned()))?;
        let mut values = Vec::with_capacity(args.len());
        for (&field, &arg) in format.args.iter().zip(args) {
            let signed = field.is_signed() && !format.unsigned_imm;
            values.push(field_value(field, arg, signed)?);
        }
        Ok(format.to_record(&values))
    }

    /// Renders a field record as a mnemonic text line.
    ///
    /// Returns `None` when no registered format matches; disassembly is
    /// best-effort and callers translate emptiness into
    /// [`IsaError::Unrepresentable`].
    pub fn decode(&self, record: &FieldRecord) -> Option<String> {
        let indices = self.by_op.get(&record.op?)?;
        let mut best: Option<&MnemonicFormat> = None;
        for &idx in indices {
            let format = &self.formats[idx];
            if !format.matches(record) {
                continue;
            }
            // Most specific wins; first registered wins ties.
            if best.is_none_or(|b| format.fixed.len() > b.fixed.len()) {
                best = Some(format);
            }
        }
        let format = best?;
        let mut line = format.mnemonic.to_owned();
        for &field in &format.args {
            let raw = record.get_or_zero(field);
            if field.is_signed() && !format.unsigned_imm {
                line.push_str(&format!(" {}", sign_extend(raw, 16)));
            } else {
                line.push_str(&format!(" {raw}"));
            }
        }
        Some(line)
    }
}

/// Converts a parsed decimal argument into its field value.
fn field_value(field: Field, arg: i64, signed: bool) -> Result<u32> {
    if signed {
        if (-32768..=32767).contains(&arg) {
            return Ok((arg as i16 as u16).into());
        }
    } else if (0..=i64::from(u32::MAX)).contains(&arg) {
        return Ok(arg as u32);
    }
    Err(IsaError::MalformedText(format!(
        "argument {arg} out of range for field `{}`",
        field.name()
    )))
}

/// A format's fixed fields as a map, for the ambiguity self-check.
fn fixed_map(format: &MnemonicFormat) -> HashMap<Field, u32> {
    format.fixed.iter().copied().collect()
}

// ── Registration ──────────────────────────────────────────

/// Shorthand constructor for a single-opcode format.
fn fmt(
    mnemonic: &'static str,
    op: Op,
    args: &[Field],
    fixed: &[(Field, u32)],
) -> MnemonicFormat {
    MnemonicFormat {
        mnemonic,
        args: args.to_vec(),
        op,
        op2: None,
        op3: None,
        fixed: fixed.to_vec(),
        unsigned_imm: false,
    }
}

/// Shorthand constructor for a fused-form format.
fn fused_fmt(
    mnemonic: &'static str,
    op: Op,
    op2: FusedOp,
    op3: Option<Op>,
    args: &[Field],
    fixed: &[(Field, u32)],
) -> MnemonicFormat {
    MnemonicFormat {
        mnemonic,
        args: args.to_vec(),
        op,
        op2: Some(Op::Fused(op2)),
        op3,
        fixed: fixed.to_vec(),
        unsigned_imm: false,
    }
}

/// The full mnemonic set for one profile, in registration order.
fn register_formats(profile: EncodingProfile) -> Vec<MnemonicFormat> {
    use Field as F;

    let mut v = Vec::new();

    // Sentinels.
    v.push(fmt("vpu_nop", Op::Nop, &[], &[]));
    v.push(fmt("vpu_end", Op::End, &[], &[]));

    // Configuration-register SETs.
    v.push(fmt("vpu_set_load_base", Op::Set(Selector::LoadBase), &[F::Payload], &[]));
    v.push(fmt("vpu_set_load2_base", Op::Set(Selector::Load2Base), &[F::Payload], &[]));
    v.push(fmt("vpu_set_store_base", Op::Set(Selector::StoreBase), &[F::Payload], &[]));
    let glb_args: &[Field] = match profile {
        EncodingProfile::Gen1 => &[F::Stride, F::ClusterMask, F::BankMask, F::Broadcast],
        EncodingProfile::Gen2 => &[
            F::Stride,
            F::ClusterMask,
            F::BankMask,
            F::Broadcast,
            F::ChanBroadcast,
        ],
    };
    v.push(fmt("vpu_set_load_glb", Op::Set(Selector::LoadGlb), glb_args, &[]));
    v.push(fmt("vpu_set_store_glb", Op::Set(Selector::StoreGlb), glb_args, &[]));
    v.push(fmt("vpu_set_quant", Op::Set(Selector::Quant), &[F::Payload], &[]));
    v.push(fmt("vpu_set_dequant", Op::Set(Selector::Dequant), &[F::Payload], &[]));
    v.push(fmt("vpu_set_dequant2", Op::Set(Selector::Dequant2), &[F::Payload], &[]));
    v.push(fmt(
        "vpu_set_aai",
        Op::Set(Selector::Aai),
        &[F::AaiEnable, F::AaiLength, F::AaiStride],
        &[],
    ));
    if profile == EncodingProfile::Gen2 {
        v.push(fmt("vpu_set_format", Op::Set(Selector::Format), &[F::Payload], &[]));
        v.push(fmt(
            "vpu_set_cmask_hi",
            Op::Set(Selector::ClusterMaskHigh),
            &[F::Payload],
            &[],
        ));
    }

    // Plain loads: one mnemonic per dtype/mode combination, all
    // overloaded onto the load opcode.
    let loads: &[(&'static str, &[(Field, u32)])] = &[
        ("vpu_load8", &[(F::Dtype, 0)]),
        ("vpu_loadu8", &[(F::Dtype, 1)]),
        ("vpu_load16", &[(F::Dtype, 2)]),
        ("vpu_load32", &[(F::Dtype, 3)]),
        ("vpu_load16h", &[(F::Dtype, 2), (F::UpperHalf, 1)]),
        ("vpu_load16i", &[(F::Dtype, 2), (F::Int16, 1)]),
        ("vpu_dload8", &[(F::Dtype, 0), (F::DualLoad, 1)]),
        ("vpu_dload16", &[(F::Dtype, 2), (F::DualLoad, 1)]),
        ("vpu_dload32", &[(F::Dtype, 3), (F::DualLoad, 1)]),
    ];
    for &(name, fixed) in loads {
        v.push(fmt(name, Op::Load, &[F::Rd, F::Offset], fixed));
    }

    // Plain stores.
    let stores: &[(&'static str, &[(Field, u32)])] = &[
        ("vpu_store8", &[(F::Dtype, 0)]),
        ("vpu_storeu8", &[(F::Dtype, 1)]),
        ("vpu_store16", &[(F::Dtype, 2)]),
        ("vpu_store32", &[(F::Dtype, 3)]),
        ("vpu_store16h", &[(F::Dtype, 2), (F::UpperHalf, 1)]),
        ("vpu_store16i", &[(F::Dtype, 2), (F::Int16, 1)]),
    ];
    for &(name, fixed) in stores {
        v.push(fmt(name, Op::Store, &[F::Rs, F::Offset], fixed));
    }

    // Fused forms, one mnemonic family per compute selector.
    let fused: &[(&'static str, FusedOp)] = &[
        ("add", FusedOp::Add),
        ("sub", FusedOp::Sub),
        ("mul", FusedOp::Mul),
        ("max", FusedOp::Max),
        ("min", FusedOp::Min),
        ("mac", FusedOp::Mac),
        ("relu", FusedOp::Relu),
        ("sum", FusedOp::Sum),
    ];
    for &(name, op2) in fused {
        v.push(fused_fmt(
            lcs_name(name),
            Op::Load,
            op2,
            Some(Op::Store),
            &[F::Dtype, F::Offset],
            &[(F::DualLoad, 0)],
        ));
        v.push(fused_fmt(
            dlcs_name(name),
            Op::Load,
            op2,
            Some(Op::Store),
            &[F::Dtype, F::Offset],
            &[(F::DualLoad, 1)],
        ));
        v.push(fused_fmt(
            lc_name(name),
            Op::Load,
            op2,
            None,
            &[F::Rd, F::Dtype, F::Offset],
            &[],
        ));
        v.push(fused_fmt(
            cs_name(name),
            Op::Store,
            op2,
            None,
            &[F::Rs, F::Dtype, F::Offset],
            &[],
        ));
    }

    // Vector arithmetic: register forms and immediate twins.
    let binary: &[(&'static str, &'static str, AluOp)] = &[
        ("vpu_fadd", "vpu_faddi", AluOp::Add),
        ("vpu_fsub", "vpu_fsubi", AluOp::Sub),
        ("vpu_fmul", "vpu_fmuli", AluOp::Mul),
        ("vpu_fmax", "vpu_fmaxi", AluOp::Max),
        ("vpu_fmin", "vpu_fmini", AluOp::Min),
    ];
    for &(reg_name, imm_name, op) in binary {
        v.push(fmt(reg_name, Op::Alu(op), &[F::Rs, F::Rt, F::Rd], &[(F::HasImm, 0)]));
        v.push(fmt(imm_name, Op::Alu(op), &[F::Rs, F::Imm, F::Rd], &[(F::HasImm, 1)]));
    }
    v.push(fmt("vpu_fmov", Op::Alu(AluOp::Mov), &[F::Rs, F::Rd], &[(F::HasImm, 0)]));
    v.push(fmt("vpu_frsum", Op::Alu(AluOp::RSum), &[F::Rs, F::Rd], &[(F::HasImm, 0)]));
    let compares: &[(&'static str, AluOp)] = &[
        ("vpu_feq", AluOp::Eq),
        ("vpu_fne", AluOp::Ne),
        ("vpu_flt", AluOp::Lt),
        ("vpu_fle", AluOp::Le),
        ("vpu_fgt", AluOp::Gt),
        ("vpu_fsel", AluOp::Sel),
    ];
    for &(name, op) in compares {
        v.push(fmt(name, Op::Alu(op), &[F::Rs, F::Rt, F::Rd], &[(F::HasImm, 0)]));
    }

    // Scalar operations.
    let scalar_imm: &[(&'static str, ScalarOp)] = &[
        ("vpu_s_addi", ScalarOp::Addi),
        ("vpu_s_subi", ScalarOp::Subi),
        ("vpu_s_muli", ScalarOp::Muli),
        ("vpu_s_andi", ScalarOp::Andi),
        ("vpu_s_ori", ScalarOp::Ori),
        ("vpu_s_xori", ScalarOp::Xori),
        ("vpu_s_slli", ScalarOp::Slli),
        ("vpu_s_srli", ScalarOp::Srli),
    ];
    for &(name, op) in scalar_imm {
        v.push(fmt(name, Op::Scalar(op), &[F::Rd, F::Rs, F::Imm], &[]));
    }
    let mut lui = fmt("vpu_s_lui", Op::Scalar(ScalarOp::Lui), &[F::Rd, F::Imm], &[]);
    lui.unsigned_imm = true;
    v.push(lui);
    v.push(fmt("vpu_s_movi", Op::Scalar(ScalarOp::Movi), &[F::Rd, F::Imm], &[]));
    let scalar_reg: &[(&'static str, ScalarOp)] = &[
        ("vpu_s_add", ScalarOp::Add),
        ("vpu_s_sub", ScalarOp::Sub),
        ("vpu_s_mul", ScalarOp::Mul),
        ("vpu_s_and", ScalarOp::And),
        ("vpu_s_or", ScalarOp::Or),
        ("vpu_s_xor", ScalarOp::Xor),
        ("vpu_s_sll", ScalarOp::Sll),
        ("vpu_s_srl", ScalarOp::Srl),
        ("vpu_s_max", ScalarOp::Max),
        ("vpu_s_min", ScalarOp::Min),
        ("vpu_s_slt", ScalarOp::Slt),
        ("vpu_s_sel", ScalarOp::Sel),
    ];
    for &(name, op) in scalar_reg {
        v.push(fmt(name, Op::Scalar(op), &[F::Rd, F::Rs, F::Rt], &[]));
    }
    v.push(fmt("vpu_s_mov", Op::Scalar(ScalarOp::Mov), &[F::Rd, F::Rs], &[]));
    v.push(fmt("vpu_s_jmp", Op::Scalar(ScalarOp::Jmp), &[F::BranchOff], &[]));
    let branches: &[(&'static str, ScalarOp)] = &[
        ("vpu_s_jeq", ScalarOp::Jeq),
        ("vpu_s_jne", ScalarOp::Jne),
        ("vpu_s_jlt", ScalarOp::Jlt),
        ("vpu_s_jge", ScalarOp::Jge),
    ];
    for &(name, op) in branches {
        v.push(fmt(name, Op::Scalar(op), &[F::Rs, F::Rt, F::BranchOff], &[]));
    }
    v.push(fmt("vpu_s_loop", Op::Scalar(ScalarOp::LoopStart), &[F::Count], &[]));
    v.push(fmt("vpu_s_loopend", Op::Scalar(ScalarOp::LoopEnd), &[], &[]));
    v.push(fmt("vpu_s_bank", Op::Scalar(ScalarOp::BankSel), &[F::Bank], &[]));
    v.push(fmt(
        "vpu_s_cfgwr",
        Op::Scalar(ScalarOp::CfgWr),
        &[F::Rs, F::Selector],
        &[],
    ));

    v
}

/// `vpu_lcs_<op>`: fused load+compute+store.
fn lcs_name(op: &str) -> &'static str {
    match op {
        "add" => "vpu_lcs_add",
        "sub" => "vpu_lcs_sub",
        "mul" => "vpu_lcs_mul",
        "max" => "vpu_lcs_max",
        "min" => "vpu_lcs_min",
        "mac" => "vpu_lcs_mac",
        "relu" => "vpu_lcs_relu",
        _ => "vpu_lcs_sum",
    }
}

/// `vpu_dlcs_<op>`: fused dual-load+compute+store.
fn dlcs_name(op: &str) -> &'static str {
    match op {
        "add" => "vpu_dlcs_add",
        "sub" => "vpu_dlcs_sub",
        "mul" => "vpu_dlcs_mul",
        "max" => "vpu_dlcs_max",
        "min" => "vpu_dlcs_min",
        "mac" => "vpu_dlcs_mac",
        "relu" => "vpu_dlcs_relu",
        _ => "vpu_dlcs_sum",
    }
}

/// `vpu_lc_<op>`: fused load+compute.
fn lc_name(op: &str) -> &'static str {
    match op {
        "add" => "vpu_lc_add",
        "sub" => "vpu_lc_sub",
        "mul" => "vpu_lc_mul",
        "max" => "vpu_lc_max",
        "min" => "vpu_lc_min",
        "mac" => "vpu_lc_mac",
        "relu" => "vpu_lc_relu",
        _ => "vpu_lc_sum",
    }
}

/// `vpu_cs_<op>`: fused compute+store.
fn cs_name(op: &str) -> &'static str {
    match op {
        "add" => "vpu_cs_add",
        "sub" => "vpu_cs_sub",
        "mul" => "vpu_cs_mul",
        "max" => "vpu_cs_max",
        "min" => "vpu_cs_min",
        "mac" => "vpu_cs_mac",
        "relu" => "vpu_cs_relu",
        _ => "vpu_cs_sum",
    }
}
