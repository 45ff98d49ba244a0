//! Instruction word codec for the vector engine.
//!
//! A vector-engine instruction is a 4-byte little-endian word holding one
//! of six mutually exclusive classes, selected by inspecting the high
//! bits before any field is extracted:
//!
//! | Priority | Pattern                  | Class                       |
//! |----------|--------------------------|-----------------------------|
//! | 1        | byte 3 == `0x00`         | NOP sentinel                |
//! | 2        | byte 3 == `0xFF`         | END sentinel                |
//! | 3        | bits 31..30 == `01`      | scalar                      |
//! | 4        | bits 31..30 == `00`      | configuration-register SET  |
//! | 5        | bits 31..30 == `11`      | load/store or fused         |
//! | 6        | bits 31..30 == `10`      | vector arithmetic           |
//!
//! [`encode`] selects the class from which opcode slots of the record are
//! meaningful and is the exact inverse of [`decode`]: for every word
//! produced by `encode`, `decode` reproduces the semantically relevant
//! fields of the originating record.

use crate::common::bits::{extract, pack};
use crate::common::error::{IsaError, Result};
use crate::isa::field::{Field, FieldRecord};
use crate::isa::op::{AluOp, FusedOp, Op, ScalarOp, Selector};
use crate::isa::profile::{EncodingProfile, FieldSlot};

/// The encoded END sentinel word (byte 3 = `0xFF`, low bytes zero).
pub const END_WORD: u32 = 0xFF00_0000;

/// The encoded NOP sentinel word.
pub const NOP_WORD: u32 = 0x0000_0000;

/// Two-bit class pattern of the scalar class.
const CLASS_SCALAR: u32 = 0b01;
/// Two-bit class pattern of the vector-arithmetic class.
const CLASS_ARITH: u32 = 0b10;
/// Two-bit class pattern of the load/store/fused class.
const CLASS_MEM: u32 = 0b11;

/// Encodes a field record into a 32-bit instruction word.
///
/// # Errors
///
/// Returns [`IsaError::FieldRange`] if any field value exceeds its
/// declared width, [`IsaError::UnsupportedSelector`] for a configuration
/// selector outside the profile, and [`IsaError::MalformedText`] for a
/// structurally invalid record (no primary operation, or a fused
/// selector in the primary slot).
pub fn encode(record: &FieldRecord, profile: EncodingProfile) -> Result<u32> {
    match record.op {
        Some(Op::Nop) => Ok(NOP_WORD),
        Some(Op::End) => Ok(END_WORD),
        Some(Op::Set(sel)) => encode_config(record, sel, profile),
        Some(Op::Scalar(op)) => encode_scalar(record, op),
        Some(Op::Alu(op)) => encode_arith(record, op),
        Some(Op::Load | Op::Store) => encode_mem(record),
        Some(Op::Fused(_)) => Err(IsaError::MalformedText(
            "fused selector in the primary opcode slot".into(),
        )),
        None => Err(IsaError::MalformedText(
            "record has no primary operation".into(),
        )),
    }
}

/// Decodes a 32-bit instruction word into a field record.
///
/// Decode populates every field its class declares, including zero-valued
/// mode flags, so that mnemonic-format matching can distinguish formats
/// by fixed-field equality.
///
/// # Errors
///
/// Returns [`IsaError::Unrepresentable`] for words whose opcode or
/// selector value has no meaning in this engine or profile.
pub fn decode(word: u32, profile: EncodingProfile) -> Result<FieldRecord> {
    let byte3 = word >> 24;
    if byte3 == 0x00 {
        return Ok(FieldRecord::with_op(Op::Nop));
    }
    if byte3 == 0xFF {
        return Ok(FieldRecord::with_op(Op::End));
    }
    match extract(word, 2, 30) {
        CLASS_SCALAR => decode_scalar(word),
        CLASS_ARITH => decode_arith(word),
        CLASS_MEM => decode_mem(word),
        _ => decode_config(word, profile),
    }
}

// ── Configuration-register class ──────────────────────────

fn encode_config(record: &FieldRecord, sel: Selector, profile: EncodingProfile) -> Result<u32> {
    if !profile.supports(sel) {
        return Err(IsaError::UnsupportedSelector(sel.raw()));
    }
    let tables = profile.tables();
    let mut word = 0;
    pack(&mut word, "selector", sel.raw(), 7, 24)?;
    match sel {
        Selector::LoadBase | Selector::Load2Base | Selector::StoreBase | Selector::Quant => {
            pack(&mut word, "payload", record.get_or_zero(Field::Payload), 24, 0)?;
        }
        Selector::Dequant | Selector::Dequant2 => {
            pack(
                &mut word,
                "payload",
                record.get_or_zero(Field::Payload),
                tables.dequant_width,
                0,
            )?;
        }
        Selector::LoadGlb | Selector::StoreGlb => {
            let desc = &tables.descriptor;
            pack_slot(&mut word, record, Field::Stride, desc.stride)?;
            pack_slot(&mut word, record, Field::ClusterMask, desc.cluster_mask)?;
            pack_slot(&mut word, record, Field::BankMask, desc.bank_mask)?;
            pack_slot(&mut word, record, Field::Broadcast, desc.broadcast)?;
            if let Some(slot) = desc.chan_broadcast {
                pack_slot(&mut word, record, Field::ChanBroadcast, slot)?;
            }
        }
        Selector::Aai => {
            pack(&mut word, "aai_enable", record.get_or_zero(Field::AaiEnable), 1, 23)?;
            pack(&mut word, "aai_length", record.get_or_zero(Field::AaiLength), 11, 12)?;
            pack(&mut word, "aai_stride", record.get_or_zero(Field::AaiStride), 12, 0)?;
        }
        Selector::Format => {
            pack(&mut word, "payload", record.get_or_zero(Field::Payload), 4, 0)?;
        }
        Selector::ClusterMaskHigh => {
            pack(&mut word, "payload", record.get_or_zero(Field::Payload), 8, 0)?;
        }
    }
    Ok(word)
}

fn decode_config(word: u32, profile: EncodingProfile) -> Result<FieldRecord> {
    let raw = extract(word, 7, 24);
    let sel = Selector::from_raw(raw).ok_or(IsaError::Unrepresentable(word))?;
    if !profile.supports(sel) {
        return Err(IsaError::Unrepresentable(word));
    }
    let tables = profile.tables();
    let mut rec = FieldRecord::with_op(Op::Set(sel));
    match sel {
        Selector::LoadBase | Selector::Load2Base | Selector::StoreBase | Selector::Quant => {
            let _ = rec.set(Field::Payload, extract(word, 24, 0));
        }
        Selector::Dequant | Selector::Dequant2 => {
            let _ = rec.set(Field::Payload, extract(word, tables.dequant_width, 0));
        }
        Selector::LoadGlb | Selector::StoreGlb => {
            let desc = &tables.descriptor;
            let _ = rec.set(Field::Stride, extract_slot(word, desc.stride));
            let _ = rec.set(Field::ClusterMask, extract_slot(word, desc.cluster_mask));
            let _ = rec.set(Field::BankMask, extract_slot(word, desc.bank_mask));
            let _ = rec.set(Field::Broadcast, extract_slot(word, desc.broadcast));
            if let Some(slot) = desc.chan_broadcast {
                let _ = rec.set(Field::ChanBroadcast, extract_slot(word, slot));
            }
        }
        Selector::Aai => {
            let _ = rec.set(Field::AaiEnable, extract(word, 1, 23));
            let _ = rec.set(Field::AaiLength, extract(word, 11, 12));
            let _ = rec.set(Field::AaiStride, extract(word, 12, 0));
        }
        Selector::Format => {
            let _ = rec.set(Field::Payload, extract(word, 4, 0));
        }
        Selector::ClusterMaskHigh => {
            let _ = rec.set(Field::Payload, extract(word, 8, 0));
        }
    }
    Ok(rec)
}

fn pack_slot(word: &mut u32, record: &FieldRecord, field: Field, slot: FieldSlot) -> Result<()> {
    pack(word, field.name(), record.get_or_zero(field), slot.width, slot.low)
}

fn extract_slot(word: u32, slot: FieldSlot) -> u32 {
    extract(word, slot.width, slot.low)
}

// ── Scalar class ──────────────────────────────────────────

fn encode_scalar(record: &FieldRecord, op: ScalarOp) -> Result<u32> {
    let mut word = 0;
    pack(&mut word, "class", CLASS_SCALAR, 2, 30)?;
    pack(&mut word, "scalar_op", op.raw(), 6, 24)?;
    if op.is_imm_arith() {
        pack(&mut word, "rd", record.get_or_zero(Field::Rd), 4, 20)?;
        pack(&mut word, "rs", record.get_or_zero(Field::Rs), 4, 16)?;
        pack(&mut word, "imm", record.get_or_zero(Field::Imm), 16, 0)?;
    } else if op.is_reg_arith() {
        pack(&mut word, "rd", record.get_or_zero(Field::Rd), 4, 20)?;
        pack(&mut word, "rs", record.get_or_zero(Field::Rs), 4, 16)?;
        pack(&mut word, "rt", record.get_or_zero(Field::Rt), 4, 12)?;
    } else if op.is_cond_branch() {
        pack(&mut word, "rs", record.get_or_zero(Field::Rs), 4, 20)?;
        pack(&mut word, "rt", record.get_or_zero(Field::Rt), 4, 16)?;
        pack(&mut word, "branch_off", record.get_or_zero(Field::BranchOff), 16, 0)?;
    } else {
        match op {
            ScalarOp::Lui | ScalarOp::Movi => {
                pack(&mut word, "rd", record.get_or_zero(Field::Rd), 4, 20)?;
                pack(&mut word, "imm", record.get_or_zero(Field::Imm), 16, 0)?;
            }
            ScalarOp::Jmp => {
                pack(&mut word, "branch_off", record.get_or_zero(Field::BranchOff), 16, 0)?;
            }
            ScalarOp::LoopStart => {
                pack(&mut word, "count", record.get_or_zero(Field::Count), 16, 0)?;
            }
            ScalarOp::Mov => {
                pack(&mut word, "rd", record.get_or_zero(Field::Rd), 4, 20)?;
                pack(&mut word, "rs", record.get_or_zero(Field::Rs), 4, 16)?;
            }
            ScalarOp::LoopEnd => {}
            ScalarOp::BankSel => {
                pack(&mut word, "bank", record.get_or_zero(Field::Bank), 1, 0)?;
            }
            ScalarOp::CfgWr => {
                pack(&mut word, "rs", record.get_or_zero(Field::Rs), 4, 16)?;
                pack(&mut word, "selector", record.get_or_zero(Field::Selector), 7, 0)?;
            }
            // Covered by the arity predicates above.
            _ => {}
        }
    }
    Ok(word)
}

fn decode_scalar(word: u32) -> Result<FieldRecord> {
    let op =
        ScalarOp::from_raw(extract(word, 6, 24)).ok_or(IsaError::Unrepresentable(word))?;
    let mut rec = FieldRecord::with_op(Op::Scalar(op));
    if op.is_imm_arith() {
        let _ = rec.set(Field::Rd, extract(word, 4, 20));
        let _ = rec.set(Field::Rs, extract(word, 4, 16));
        let _ = rec.set(Field::Imm, extract(word, 16, 0));
    } else if op.is_reg_arith() {
        let _ = rec.set(Field::Rd, extract(word, 4, 20));
        let _ = rec.set(Field::Rs, extract(word, 4, 16));
        let _ = rec.set(Field::Rt, extract(word, 4, 12));
    } else if op.is_cond_branch() {
        let _ = rec.set(Field::Rs, extract(word, 4, 20));
        let _ = rec.set(Field::Rt, extract(word, 4, 16));
        let _ = rec.set(Field::BranchOff, extract(word, 16, 0));
    } else {
        match op {
            ScalarOp::Lui | ScalarOp::Movi => {
                let _ = rec.set(Field::Rd, extract(word, 4, 20));
                let _ = rec.set(Field::Imm, extract(word, 16, 0));
            }
            ScalarOp::Jmp => {
                let _ = rec.set(Field::BranchOff, extract(word, 16, 0));
            }
            ScalarOp::LoopStart => {
                let _ = rec.set(Field::Count, extract(word, 16, 0));
            }
            ScalarOp::Mov => {
                let _ = rec.set(Field::Rd, extract(word, 4, 20));
                let _ = rec.set(Field::Rs, extract(word, 4, 16));
            }
            ScalarOp::LoopEnd => {}
            ScalarOp::BankSel => {
                let _ = rec.set(Field::Bank, extract(word, 1, 0));
            }
            ScalarOp::CfgWr => {
                let _ = rec.set(Field::Rs, extract(word, 4, 16));
                let _ = rec.set(Field::Selector, extract(word, 7, 0));
            }
            _ => {}
        }
    }
    Ok(rec)
}

// ── Vector arithmetic class ───────────────────────────────

fn encode_arith(record: &FieldRecord, op: AluOp) -> Result<u32> {
    let mut word = 0;
    pack(&mut word, "class", CLASS_ARITH, 2, 30)?;
    let has_imm = record.get_or_zero(Field::HasImm);
    pack(&mut word, "has_imm", has_imm, 1, 29)?;
    pack(&mut word, "alu_op", op.raw(), 5, 24)?;
    pack(&mut word, "rd", record.get_or_zero(Field::Rd), 3, 21)?;
    pack(&mut word, "rs", record.get_or_zero(Field::Rs), 3, 18)?;
    if has_imm == 1 {
        pack(&mut word, "imm", record.get_or_zero(Field::Imm), 16, 0)?;
    } else {
        pack(&mut word, "rt", record.get_or_zero(Field::Rt), 3, 15)?;
    }
    Ok(word)
}

fn decode_arith(word: u32) -> Result<FieldRecord> {
    let op = AluOp::from_raw(extract(word, 5, 24)).ok_or(IsaError::Unrepresentable(word))?;
    let has_imm = extract(word, 1, 29);
    let mut rec = FieldRecord::with_op(Op::Alu(op));
    let _ = rec.set(Field::HasImm, has_imm);
    let _ = rec.set(Field::Rd, extract(word, 3, 21));
    let _ = rec.set(Field::Rs, extract(word, 3, 18));
    if has_imm == 1 {
        let _ = rec.set(Field::Imm, extract(word, 16, 0));
    } else if op.is_binary() {
        let _ = rec.set(Field::Rt, extract(word, 3, 15));
    }
    Ok(rec)
}

// ── Load/store and fused class ────────────────────────────

fn encode_mem(record: &FieldRecord) -> Result<u32> {
    let mut word = 0;
    pack(&mut word, "class", CLASS_MEM, 2, 30)?;
    pack(&mut word, "dtype", record.get_or_zero(Field::Dtype), 2, 28)?;
    pack(&mut word, "offset", record.get_or_zero(Field::Offset), 16, 0)?;

    let fused = match record.op2 {
        Some(Op::Fused(f)) => Some(f),
        None => None,
        Some(_) => {
            return Err(IsaError::MalformedText(
                "second opcode slot must hold a fused selector".into(),
            ));
        }
    };

    match (record.op, fused, record.op3) {
        // Fully fused load+compute+store ("super acceleration").
        (Some(Op::Load), Some(f), Some(Op::Store)) => {
            pack(&mut word, "super", 1, 1, 19)?;
            pack(&mut word, "fused_op", f.raw(), 3, 24)?;
            pack(&mut word, "dual_load", record.get_or_zero(Field::DualLoad), 1, 17)?;
        }
        // Load+compute fusion ("special acceleration", load side).
        (Some(Op::Load), Some(f), None) => {
            pack(&mut word, "special", 1, 1, 16)?;
            pack(&mut word, "fused_op", f.raw(), 3, 24)?;
            pack(&mut word, "rd", record.get_or_zero(Field::Rd), 4, 20)?;
        }
        // Compute+store fusion ("special acceleration", store side).
        // The direction flag sits at bit 18 on this form: at bit 27, an
        // fp32 dtype plus selector 7 would assemble byte 3 as the END
        // sentinel.
        (Some(Op::Store), Some(f), None) => {
            pack(&mut word, "direction", 1, 1, 18)?;
            pack(&mut word, "special", 1, 1, 16)?;
            pack(&mut word, "fused_op", f.raw(), 3, 24)?;
            pack(&mut word, "rs", record.get_or_zero(Field::Rs), 2, 20)?;
        }
        // Plain load.
        (Some(Op::Load), None, None) => {
            pack(&mut word, "upper_half", record.get_or_zero(Field::UpperHalf), 1, 25)?;
            pack(&mut word, "int16", record.get_or_zero(Field::Int16), 1, 24)?;
            pack(&mut word, "dual_load", record.get_or_zero(Field::DualLoad), 1, 17)?;
            pack(&mut word, "rd", record.get_or_zero(Field::Rd), 2, 20)?;
        }
        // Plain store.
        (Some(Op::Store), None, None) => {
            pack(&mut word, "direction", 1, 1, 27)?;
            pack(&mut word, "upper_half", record.get_or_zero(Field::UpperHalf), 1, 25)?;
            pack(&mut word, "int16", record.get_or_zero(Field::Int16), 1, 24)?;
            pack(&mut word, "rs", record.get_or_zero(Field::Rs), 2, 20)?;
        }
        _ => {
            return Err(IsaError::MalformedText(
                "memory record with inconsistent opcode slots".into(),
            ));
        }
    }
    Ok(word)
}

fn decode_mem(word: u32) -> Result<FieldRecord> {
    let dtype = extract(word, 2, 28);
    let is_store = extract(word, 1, 27) == 1;
    let special = extract(word, 1, 16) == 1;
    let is_super = extract(word, 1, 19) == 1;

    let mut rec = FieldRecord::new();
    let _ = rec.set(Field::Dtype, dtype);
    let _ = rec.set(Field::Offset, extract(word, 16, 0));

    if special {
        let fused =
            FusedOp::from_raw(extract(word, 3, 24)).ok_or(IsaError::Unrepresentable(word))?;
        rec.op2 = Some(Op::Fused(fused));
        // Special forms carry direction at bit 18, not bit 27.
        if extract(word, 1, 18) == 1 {
            rec.op = Some(Op::Store);
            let _ = rec.set(Field::Rs, extract(word, 2, 20));
        } else {
            rec.op = Some(Op::Load);
            let _ = rec.set(Field::Rd, extract(word, 4, 20));
        }
    } else if is_super {
        let fused =
            FusedOp::from_raw(extract(word, 3, 24)).ok_or(IsaError::Unrepresentable(word))?;
        rec.op = Some(Op::Load);
        rec.op2 = Some(Op::Fused(fused));
        rec.op3 = Some(Op::Store);
        let _ = rec.set(Field::DualLoad, extract(word, 1, 17));
    } else {
        let _ = rec.set(Field::UpperHalf, extract(word, 1, 25));
        let _ = rec.set(Field::Int16, extract(word, 1, 24));
        if is_store {
            rec.op = Some(Op::Store);
            let _ = rec.set(Field::Rs, extract(word, 2, 20));
        } else {
            rec.op = Some(Op::Load);
            let _ = rec.set(Field::DualLoad, extract(word, 1, 17));
            let _ = rec.set(Field::Rd, extract(word, 2, 20));
        }
    }
    Ok(rec)
}
