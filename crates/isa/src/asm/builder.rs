//! Stateful instruction-stream assembly.
//!
//! [`StreamBuilder`] is the programmatic front end of the assembler: a
//! caller describes loads, stores, arithmetic, and control flow in terms
//! of byte addresses and operation enums, and the builder emits the
//! configuration traffic (base SETs, descriptors, factors) needed to
//! make each data instruction legal, while suppressing writes that
//! would not change hardware state. [`StreamBuilder::finalize`] runs
//! the redundancy-elimination pass, appends the NOP/END terminator with
//! transfer-granule padding, and encodes the stream into a [`Program`].

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::asm::tracker::{self, ConfigTracker, RegClass};
use crate::asm::window::BaseWindow;
use crate::common::error::{IsaError, Result};
use crate::config::AsmConfig;
use crate::isa::field::{Field, FieldRecord};
use crate::isa::op::{AluOp, Dtype, FusedOp, Op, ScalarOp, Selector};
use crate::isa::profile::EncodingProfile;
use crate::isa::{InstructionCodec, VpuCodec};

/// Granule shift between byte addresses and base-register payloads.
const BASE_SHIFT: u32 = 6;

/// A GLB access descriptor: stride, masks, and broadcast controls.
///
/// `chan_broadcast` is only encoded on Gen2; on Gen1 it is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlbDescriptor {
    /// Row stride selector.
    pub stride: u32,
    /// Cluster enable mask.
    pub cluster_mask: u32,
    /// Bank enable mask.
    pub bank_mask: u32,
    /// Broadcast control bits.
    pub broadcast: u32,
    /// Channel-broadcast flag (Gen2).
    pub chan_broadcast: u32,
}

impl GlbDescriptor {
    /// Canonical comparison key for redundancy tracking.
    const fn key(self) -> u64 {
        (self.stride as u64) << 48
            | (self.cluster_mask as u64) << 32
            | (self.bank_mask as u64) << 24
            | (self.chan_broadcast as u64) << 20
            | self.broadcast as u64
    }
}

/// Element-width mode flags of a plain load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemMode {
    /// Access the upper half of 16-bit elements.
    pub upper_half: bool,
    /// 16-bit integer element mode.
    pub int16: bool,
}

/// A finalized, encoded instruction stream.
#[derive(Debug, Clone)]
pub struct Program {
    profile: EncodingProfile,
    records: Vec<FieldRecord>,
    words: Vec<u32>,
}

impl Program {
    /// The encoding generation the program was assembled under.
    pub const fn profile(&self) -> EncodingProfile {
        self.profile
    }

    /// The finalized record stream, terminator included.
    pub fn records(&self) -> &[FieldRecord] {
        &self.records
    }

    /// The encoded instruction words, in stream order.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of instructions, terminator included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True for a program with no instructions.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Serializes the program as little-endian word bytes.
    pub fn to_binary(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// Renders the program as mnemonic text, one instruction per line.
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::Unrepresentable`] if a record has no
    /// registered mnemonic format.
    pub fn to_text(&self) -> Result<String> {
        let codec = VpuCodec::new(self.profile);
        let lines = self
            .records
            .iter()
            .map(|rec| codec.encode_text(rec))
            .collect::<Result<Vec<String>>>()?;
        Ok(lines.join("\n"))
    }
}

/// Incremental assembler for one vector-engine instruction stream.
///
/// The builder is a plain value: cloning it forks the entire assembly
/// state (stream, configuration cache, address windows, labels), which
/// is how callers explore alternative instruction sequences.
#[derive(Debug, Clone)]
pub struct StreamBuilder {
    config: AsmConfig,
    codec: VpuCodec,
    stream: Vec<FieldRecord>,
    tracker: ConfigTracker,
    load_window: BaseWindow,
    store_window: BaseWindow,
    labels: HashMap<String, usize>,
    finalized: bool,
}

impl StreamBuilder {
    /// Creates an empty builder for the given configuration.
    pub fn new(config: AsmConfig) -> Self {
        Self {
            config,
            codec: VpuCodec::new(config.profile),
            stream: Vec::new(),
            tracker: ConfigTracker::new(),
            load_window: BaseWindow::new(),
            store_window: BaseWindow::new(),
            labels: HashMap::new(),
            finalized: false,
        }
    }

    /// The encoding generation this builder assembles for.
    pub const fn profile(&self) -> EncodingProfile {
        self.config.profile
    }

    /// Number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// True if nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// The records emitted so far.
    pub fn records(&self) -> &[FieldRecord] {
        &self.stream
    }

    const fn ensure_building(&self) -> Result<()> {
        if self.finalized {
            return Err(IsaError::StreamFinalized);
        }
        Ok(())
    }

    /// Validates and appends one record.
    fn push(&mut self, record: FieldRecord) -> Result<()> {
        self.ensure_building()?;
        // Encode up front so range violations surface at the emitting
        // call, not at finalize.
        let _ = self.codec.encode_word(&record)?;
        self.stream.push(record);
        Ok(())
    }

    /// Emits a configuration SET unless the tracker knows the register
    /// already holds `key`.
    fn emit_set(&mut self, class: RegClass, key: u64, record: FieldRecord) -> Result<()> {
        if !self.tracker.would_change(class, key) {
            trace!(?class, "suppressed no-op configuration write");
            return Ok(());
        }
        self.push(record)?;
        self.tracker.record(class, key);
        Ok(())
    }

    /// Emits an unconditional base SET after a window move.
    fn emit_base(&mut self, class: RegClass, addr: u64) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Set(class.selector()));
        let _ = rec.set(Field::Payload, (addr >> BASE_SHIFT) as u32);
        self.push(rec)?;
        self.tracker.record(class, addr);
        Ok(())
    }

    /// Every scalar instruction may rewrite configuration registers
    /// indirectly, so all cached assembly state becomes stale.
    const fn scalar_clobber(&mut self) {
        self.tracker.invalidate_all();
        self.load_window.invalidate();
        self.store_window.invalidate();
    }

    // ── Configuration registers ───────────────────────────

    /// Pins the primary load base to `addr` (64-byte aligned).
    ///
    /// # Errors
    ///
    /// Misaligned addresses are rejected; emission after finalize fails.
    pub fn set_load_base(&mut self, addr: u64) -> Result<()> {
        self.ensure_building()?;
        self.load_window.set_base(addr)?;
        let mut rec = FieldRecord::with_op(Op::Set(Selector::LoadBase));
        let _ = rec.set(Field::Payload, (addr >> BASE_SHIFT) as u32);
        self.emit_set(RegClass::LoadBase, addr, rec)
    }

    /// Sets the secondary load base consumed by dual loads.
    ///
    /// # Errors
    ///
    /// Misaligned addresses are rejected; emission after finalize fails.
    pub fn set_load2_base(&mut self, addr: u64) -> Result<()> {
        self.ensure_building()?;
        if !addr.is_multiple_of(1 << BASE_SHIFT) {
            return Err(IsaError::MisalignedOffset(addr));
        }
        let mut rec = FieldRecord::with_op(Op::Set(Selector::Load2Base));
        let _ = rec.set(Field::Payload, (addr >> BASE_SHIFT) as u32);
        self.emit_set(RegClass::Load2Base, addr, rec)
    }

    /// Pins the store base to `addr` (64-byte aligned).
    ///
    /// # Errors
    ///
    /// Misaligned addresses are rejected; emission after finalize fails.
    pub fn set_store_base(&mut self, addr: u64) -> Result<()> {
        self.ensure_building()?;
        self.store_window.set_base(addr)?;
        let mut rec = FieldRecord::with_op(Op::Set(Selector::StoreBase));
        let _ = rec.set(Field::Payload, (addr >> BASE_SHIFT) as u32);
        self.emit_set(RegClass::StoreBase, addr, rec)
    }

    /// Writes the load-side GLB descriptor.
    ///
    /// # Errors
    ///
    /// Field-width violations and post-finalize emission fail.
    pub fn set_load_descriptor(&mut self, desc: GlbDescriptor) -> Result<()> {
        self.emit_set(
            RegClass::LoadDesc,
            desc.key(),
            Self::descriptor_record(Selector::LoadGlb, desc),
        )
    }

    /// Writes the store-side GLB descriptor.
    ///
    /// # Errors
    ///
    /// Field-width violations and post-finalize emission fail.
    pub fn set_store_descriptor(&mut self, desc: GlbDescriptor) -> Result<()> {
        self.emit_set(
            RegClass::StoreDesc,
            desc.key(),
            Self::descriptor_record(Selector::StoreGlb, desc),
        )
    }

    fn descriptor_record(sel: Selector, desc: GlbDescriptor) -> FieldRecord {
        let mut rec = FieldRecord::with_op(Op::Set(sel));
        let _ = rec.set(Field::Stride, desc.stride);
        let _ = rec.set(Field::ClusterMask, desc.cluster_mask);
        let _ = rec.set(Field::BankMask, desc.bank_mask);
        let _ = rec.set(Field::Broadcast, desc.broadcast);
        let _ = rec.set(Field::ChanBroadcast, desc.chan_broadcast);
        rec
    }

    /// Sets the store-path quantization factor.
    ///
    /// # Errors
    ///
    /// Field-width violations and post-finalize emission fail.
    pub fn set_quant(&mut self, factor: u32) -> Result<()> {
        self.set_payload(RegClass::Quant, factor)
    }

    /// Sets the primary load-path dequantization factor.
    ///
    /// # Errors
    ///
    /// Field-width violations and post-finalize emission fail.
    pub fn set_dequant(&mut self, factor: u32) -> Result<()> {
        self.set_payload(RegClass::Dequant, factor)
    }

    /// Sets the secondary dequantization factor used by dual loads.
    ///
    /// # Errors
    ///
    /// Field-width violations and post-finalize emission fail.
    pub fn set_dequant2(&mut self, factor: u32) -> Result<()> {
        self.set_payload(RegClass::Dequant2, factor)
    }

    /// Configures auto address increment for fused instructions.
    ///
    /// # Errors
    ///
    /// Field-width violations and post-finalize emission fail.
    pub fn set_aai(&mut self, enable: bool, length: u32, stride: u32) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Set(Selector::Aai));
        let _ = rec.set(Field::AaiEnable, u32::from(enable));
        let _ = rec.set(Field::AaiLength, length);
        let _ = rec.set(Field::AaiStride, stride);
        let key = u64::from(enable) | u64::from(length) << 1 | u64::from(stride) << 12;
        self.emit_set(RegClass::Aai, key, rec)
    }

    /// Sets the data-format select register (Gen2 only).
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::UnsupportedSelector`] on Gen1.
    pub fn set_format(&mut self, format: u32) -> Result<()> {
        self.set_payload(RegClass::Format, format)
    }

    /// Sets the high-order cluster-mask bits (Gen2 only).
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::UnsupportedSelector`] on Gen1.
    pub fn set_cluster_mask_high(&mut self, mask: u32) -> Result<()> {
        self.set_payload(RegClass::ClusterMaskHigh, mask)
    }

    fn set_payload(&mut self, class: RegClass, payload: u32) -> Result<()> {
        let sel = class.selector();
        if !self.config.profile.supports(sel) {
            return Err(IsaError::UnsupportedSelector(sel.raw()));
        }
        let mut rec = FieldRecord::with_op(Op::Set(sel));
        let _ = rec.set(Field::Payload, payload);
        self.emit_set(class, u64::from(payload), rec)
    }

    // ── Memory instructions ───────────────────────────────

    /// Emits a vector load of `addr` into slot `rd`, rebasing the load
    /// window when the address falls outside it.
    ///
    /// # Errors
    ///
    /// Fails on a misaligned address or an out-of-range slot index.
    pub fn load(&mut self, rd: u32, dtype: Dtype, mode: MemMode, addr: u64) -> Result<()> {
        self.mem_access(Op::Load, rd, dtype, mode, addr, false)
    }

    /// Emits a dual load: the primary element comes from `addr` under
    /// the load base, the secondary from the same offset under the
    /// second load base (see [`StreamBuilder::set_load2_base`]).
    ///
    /// # Errors
    ///
    /// Fails on a misaligned address or an out-of-range slot index.
    pub fn dual_load(&mut self, rd: u32, dtype: Dtype, mode: MemMode, addr: u64) -> Result<()> {
        self.mem_access(Op::Load, rd, dtype, mode, addr, true)
    }

    /// Emits a vector store of slot `rs` to `addr`, rebasing the store
    /// window when the address falls outside it.
    ///
    /// # Errors
    ///
    /// Fails on a misaligned address or an out-of-range slot index.
    pub fn store(&mut self, rs: u32, dtype: Dtype, mode: MemMode, addr: u64) -> Result<()> {
        self.mem_access(Op::Store, rs, dtype, mode, addr, false)
    }

    fn mem_access(
        &mut self,
        op: Op,
        reg: u32,
        dtype: Dtype,
        mode: MemMode,
        addr: u64,
        dual: bool,
    ) -> Result<()> {
        self.ensure_building()?;
        let (window, base_class) = if matches!(op, Op::Store) {
            (&mut self.store_window, RegClass::StoreBase)
        } else {
            (&mut self.load_window, RegClass::LoadBase)
        };
        let adj = window.adjust(addr)?;
        if let Some(base) = adj.new_base {
            trace!(addr, base, "window moved");
            self.emit_base(base_class, base)?;
        }
        let mut rec = FieldRecord::with_op(op);
        let _ = rec.set(Field::Dtype, dtype.raw());
        let _ = rec.set(Field::Offset, adj.offset);
        let _ = rec.set(Field::UpperHalf, u32::from(mode.upper_half));
        let _ = rec.set(Field::Int16, u32::from(mode.int16));
        if matches!(op, Op::Store) {
            let _ = rec.set(Field::Rs, reg);
        } else {
            let _ = rec.set(Field::DualLoad, u32::from(dual));
            let _ = rec.set(Field::Rd, reg);
        }
        self.push(rec)
    }

    // ── Vector arithmetic ─────────────────────────────────

    /// Emits a register-form vector arithmetic instruction. The second
    /// source is ignored for unary operations.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range slot index.
    pub fn compute(&mut self, op: AluOp, rs: u32, rt: u32, rd: u32) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Alu(op));
        let _ = rec.set(Field::HasImm, 0);
        let _ = rec.set(Field::Rs, rs);
        if op.is_binary() {
            let _ = rec.set(Field::Rt, rt);
        }
        let _ = rec.set(Field::Rd, rd);
        self.push(rec)
    }

    /// Emits an immediate-form vector arithmetic instruction.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range slot index.
    pub fn compute_imm(&mut self, op: AluOp, rs: u32, imm: i16, rd: u32) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Alu(op));
        let _ = rec.set(Field::HasImm, 1);
        let _ = rec.set(Field::Rs, rs);
        let _ = rec.set(Field::Imm, u32::from(imm as u16));
        let _ = rec.set(Field::Rd, rd);
        self.push(rec)
    }

    // ── Fused memory/compute instructions ─────────────────

    /// Emits a fully fused load+compute+store.
    ///
    /// The shared offset is resolved against the load window; the store
    /// base must already be positioned (via
    /// [`StreamBuilder::set_store_base`]) so the same offset is valid on
    /// the store side.
    ///
    /// # Errors
    ///
    /// Fails on a misaligned address.
    pub fn fused_load_compute_store(
        &mut self,
        op: FusedOp,
        dtype: Dtype,
        dual: bool,
        addr: u64,
    ) -> Result<()> {
        self.ensure_building()?;
        let adj = self.load_window.adjust(addr)?;
        if let Some(base) = adj.new_base {
            self.emit_base(RegClass::LoadBase, base)?;
        }
        let mut rec = FieldRecord::with_op(Op::Load);
        rec.op2 = Some(Op::Fused(op));
        rec.op3 = Some(Op::Store);
        let _ = rec.set(Field::Dtype, dtype.raw());
        let _ = rec.set(Field::Offset, adj.offset);
        let _ = rec.set(Field::DualLoad, u32::from(dual));
        self.push(rec)
    }

    /// Emits a fused load+compute leaving the result in slot `rd`.
    ///
    /// # Errors
    ///
    /// Fails on a misaligned address or an out-of-range slot index.
    pub fn fused_load_compute(
        &mut self,
        op: FusedOp,
        dtype: Dtype,
        rd: u32,
        addr: u64,
    ) -> Result<()> {
        self.ensure_building()?;
        let adj = self.load_window.adjust(addr)?;
        if let Some(base) = adj.new_base {
            self.emit_base(RegClass::LoadBase, base)?;
        }
        let mut rec = FieldRecord::with_op(Op::Load);
        rec.op2 = Some(Op::Fused(op));
        let _ = rec.set(Field::Dtype, dtype.raw());
        let _ = rec.set(Field::Offset, adj.offset);
        let _ = rec.set(Field::Rd, rd);
        self.push(rec)
    }

    /// Emits a fused compute+store of slot `rs`.
    ///
    /// # Errors
    ///
    /// Fails on a misaligned address or an out-of-range slot index.
    pub fn fused_compute_store(
        &mut self,
        op: FusedOp,
        dtype: Dtype,
        rs: u32,
        addr: u64,
    ) -> Result<()> {
        self.ensure_building()?;
        let adj = self.store_window.adjust(addr)?;
        if let Some(base) = adj.new_base {
            self.emit_base(RegClass::StoreBase, base)?;
        }
        let mut rec = FieldRecord::with_op(Op::Store);
        rec.op2 = Some(Op::Fused(op));
        let _ = rec.set(Field::Dtype, dtype.raw());
        let _ = rec.set(Field::Offset, adj.offset);
        let _ = rec.set(Field::Rs, rs);
        self.push(rec)
    }

    // ── Scalar instructions ───────────────────────────────

    /// Emits an immediate-arithmetic scalar instruction.
    ///
    /// # Errors
    ///
    /// Rejects operations outside the immediate-arithmetic group.
    pub fn scalar_imm(&mut self, op: ScalarOp, rd: u32, rs: u32, imm: i16) -> Result<()> {
        if !op.is_imm_arith() {
            return Err(IsaError::MalformedText(format!(
                "{op:?} is not an immediate-arithmetic operation"
            )));
        }
        let mut rec = FieldRecord::with_op(Op::Scalar(op));
        let _ = rec.set(Field::Rd, rd);
        let _ = rec.set(Field::Rs, rs);
        let _ = rec.set(Field::Imm, u32::from(imm as u16));
        self.push_scalar(rec)
    }

    /// Emits a register-arithmetic scalar instruction.
    ///
    /// # Errors
    ///
    /// Rejects operations outside the register-arithmetic group.
    pub fn scalar_reg(&mut self, op: ScalarOp, rd: u32, rs: u32, rt: u32) -> Result<()> {
        if !op.is_reg_arith() {
            return Err(IsaError::MalformedText(format!(
                "{op:?} is not a register-arithmetic operation"
            )));
        }
        let mut rec = FieldRecord::with_op(Op::Scalar(op));
        let _ = rec.set(Field::Rd, rd);
        let _ = rec.set(Field::Rs, rs);
        let _ = rec.set(Field::Rt, rt);
        self.push_scalar(rec)
    }

    /// Emits a scalar register move.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range register index.
    pub fn scalar_mov(&mut self, rd: u32, rs: u32) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::Mov));
        let _ = rec.set(Field::Rd, rd);
        let _ = rec.set(Field::Rs, rs);
        self.push_scalar(rec)
    }

    /// Emits a scalar move-immediate.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range register index.
    pub fn scalar_movi(&mut self, rd: u32, imm: i16) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::Movi));
        let _ = rec.set(Field::Rd, rd);
        let _ = rec.set(Field::Imm, u32::from(imm as u16));
        self.push_scalar(rec)
    }

    /// Emits a scalar load-upper-immediate.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range register index.
    pub fn scalar_lui(&mut self, rd: u32, imm: u16) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::Lui));
        let _ = rec.set(Field::Rd, rd);
        let _ = rec.set(Field::Imm, u32::from(imm));
        self.push_scalar(rec)
    }

    /// Selects the active scalar register bank.
    ///
    /// # Errors
    ///
    /// Fails on a bank index other than 0 or 1.
    pub fn bank_select(&mut self, bank: u32) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::BankSel));
        let _ = rec.set(Field::Bank, bank);
        self.push_scalar(rec)
    }

    /// Emits an indirect configuration write of scalar register `rs` to
    /// the register selected by `sel`.
    ///
    /// # Errors
    ///
    /// Fails on an out-of-range register index.
    pub fn config_write(&mut self, rs: u32, sel: Selector) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::CfgWr));
        let _ = rec.set(Field::Rs, rs);
        let _ = rec.set(Field::Selector, sel.raw());
        self.push_scalar(rec)
    }

    /// Opens a hardware loop running its body `count` times.
    ///
    /// # Errors
    ///
    /// Fails on a count wider than 16 bits.
    pub fn loop_start(&mut self, count: u32) -> Result<()> {
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::LoopStart));
        let _ = rec.set(Field::Count, count);
        self.push_scalar(rec)
    }

    /// Closes the innermost hardware loop.
    ///
    /// # Errors
    ///
    /// Fails after finalize.
    pub fn loop_end(&mut self) -> Result<()> {
        self.push_scalar(FieldRecord::with_op(Op::Scalar(ScalarOp::LoopEnd)))
    }

    fn push_scalar(&mut self, record: FieldRecord) -> Result<()> {
        self.push(record)?;
        self.scalar_clobber();
        Ok(())
    }

    // ── Labels and branches ───────────────────────────────

    /// Defines `name` at the current stream position.
    ///
    /// Labels resolve backwards only: a branch may target any label
    /// defined before it, and defining any label disables the
    /// redundancy-elimination pass (it would shift branch targets).
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::DuplicateLabel`] if `name` already exists.
    pub fn label(&mut self, name: &str) -> Result<()> {
        self.ensure_building()?;
        if self.labels.contains_key(name) {
            return Err(IsaError::DuplicateLabel(name.to_owned()));
        }
        let _ = self.labels.insert(name.to_owned(), self.stream.len());
        Ok(())
    }

    /// Emits an unconditional jump to `label`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown label or an offset outside 16 bits.
    pub fn jump(&mut self, label: &str) -> Result<()> {
        let off = self.label_offset(label)?;
        let mut rec = FieldRecord::with_op(Op::Scalar(ScalarOp::Jmp));
        let _ = rec.set(Field::BranchOff, off);
        self.push_scalar(rec)
    }

    /// Emits a conditional branch comparing scalar registers `rs` and
    /// `rt`, targeting `label`.
    ///
    /// # Errors
    ///
    /// Rejects non-branch operations, unknown labels, and offsets
    /// outside 16 bits.
    pub fn branch(&mut self, op: ScalarOp, rs: u32, rt: u32, label: &str) -> Result<()> {
        if !op.is_cond_branch() {
            return Err(IsaError::MalformedText(format!(
                "{op:?} is not a conditional branch"
            )));
        }
        let off = self.label_offset(label)?;
        let mut rec = FieldRecord::with_op(Op::Scalar(op));
        let _ = rec.set(Field::Rs, rs);
        let _ = rec.set(Field::Rt, rt);
        let _ = rec.set(Field::BranchOff, off);
        self.push_scalar(rec)
    }

    /// Resolves `label` to a branch-offset field value relative to the
    /// instruction about to be emitted.
    fn label_offset(&self, label: &str) -> Result<u32> {
        let target = *self
            .labels
            .get(label)
            .ok_or_else(|| IsaError::UnknownLabel(label.to_owned()))?;
        let off = target as i64 - (self.stream.len() as i64 + 1);
        if i16::try_from(off).is_err() {
            return Err(IsaError::BranchOutOfRange(off));
        }
        Ok(u32::from(off as u16))
    }

    // ── Sentinels and finalization ────────────────────────

    /// Emits an explicit NOP.
    ///
    /// # Errors
    ///
    /// Fails after finalize.
    pub fn nop(&mut self) -> Result<()> {
        self.push(FieldRecord::with_op(Op::Nop))
    }

    /// Emits an explicit END sentinel. Finalization keeps it terminal
    /// and pads before it instead of appending its own terminator.
    ///
    /// # Errors
    ///
    /// Fails after finalize.
    pub fn end(&mut self) -> Result<()> {
        self.push(FieldRecord::with_op(Op::End))
    }

    /// Deletes configuration SETs that no later instruction can
    /// observe: overwritten before any consumer of their register
    /// class, with no intervening scalar instruction, or never consumed
    /// at all.
    ///
    /// Skipped entirely once any label exists, since deleting
    /// instructions would invalidate resolved branch offsets.
    pub fn trim_redundant(&mut self) {
        if !self.labels.is_empty() {
            debug!("labels present, skipping redundancy elimination");
            return;
        }
        let n = self.stream.len();
        let mut dead = vec![false; n];
        for i in 0..n {
            let Some(class) = tracker::set_class(&self.stream[i]) else {
                continue;
            };
            let mut observed = false;
            for later in &self.stream[i + 1..] {
                // Scalar instructions may read any configuration
                // register indirectly.
                if tracker::is_scalar(later) {
                    observed = true;
                    break;
                }
                if tracker::set_class(later) == Some(class) {
                    break;
                }
                if tracker::consumes(later, class) {
                    observed = true;
                    break;
                }
            }
            dead[i] = !observed;
        }
        let removed = dead.iter().filter(|&&d| d).count();
        if removed > 0 {
            debug!(removed, "eliminated unobservable configuration writes");
            let mut keep = dead.iter().map(|&d| !d);
            self.stream.retain(|_| keep.next().unwrap_or(true));
        }
    }

    /// Finalizes the stream: runs redundancy elimination, appends the
    /// NOP/NOP terminator prelude and END sentinel with NOP padding to a
    /// multiple of the transfer granule, and encodes every word.
    ///
    /// The builder refuses further emission afterwards.
    ///
    /// # Errors
    ///
    /// Fails if already finalized.
    pub fn finalize(&mut self) -> Result<Program> {
        self.ensure_building()?;
        self.finalized = true;
        self.trim_redundant();

        if self.stream.last().map(|r| r.op) == Some(Some(Op::End)) {
            let _ = self.stream.pop();
        } else {
            // Drain the pipeline before the terminator.
            self.stream.push(FieldRecord::with_op(Op::Nop));
            self.stream.push(FieldRecord::with_op(Op::Nop));
        }
        let granule = self.config.commands_per_transfer.max(1);
        while !(self.stream.len() + 1).is_multiple_of(granule) {
            self.stream.push(FieldRecord::with_op(Op::Nop));
        }
        self.stream.push(FieldRecord::with_op(Op::End));

        let words = self
            .stream
            .iter()
            .map(|rec| self.codec.encode_word(rec))
            .collect::<Result<Vec<u32>>>()?;
        debug!(
            instructions = words.len(),
            profile = ?self.config.profile,
            "stream finalized"
        );
        Ok(Program {
            profile: self.config.profile,
            records: self.stream.clone(),
            words,
        })
    }
}
