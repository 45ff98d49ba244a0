//! Stream interpretation for cycle estimation.
//!
//! Walks a finalized record stream the way the engine's sequencer would,
//! tracking just enough architectural state to resolve control flow:
//! the scalar register file (two banks of sixteen), the hardware loop
//! stack, and the AAI configuration that amortizes fused-instruction
//! cost. Every data instruction is charged a fixed cycle count; the
//! point is ordering-faithful control flow, not a timing model of the
//! datapath.

use tracing::trace;

use crate::asm::tracker::RegClass;
use crate::common::bits::sign_extend;
use crate::common::error::{IsaError, Result};
use crate::config::AsmConfig;
use crate::isa::field::{Field, FieldRecord};
use crate::isa::op::{Op, ScalarOp};

/// Scalar register-file size across both banks.
const SCALAR_REGS: usize = 32;
/// Registers addressable per bank select.
const BANK_SIZE: u32 = 16;

/// One entry of the hardware loop stack.
#[derive(Debug, Clone, Copy)]
struct LoopBinding {
    /// Program counter of the first body instruction.
    start: usize,
    /// Body passes still to run, including the current one.
    remaining: u32,
}

/// Live auto-address-increment configuration.
#[derive(Debug, Clone, Copy, Default)]
struct AaiState {
    enabled: bool,
    length: u32,
}

/// Interprets instruction streams to estimate execution cycles.
#[derive(Debug, Clone, Copy)]
pub struct CycleEstimator {
    command_memory_words: usize,
    step_budget: u64,
}

impl CycleEstimator {
    /// Creates an estimator with the given engine geometry and budget.
    ///
    /// A zero `command_memory_words` is treated as one word: the program
    /// counter modulus requires a nonzero memory size.
    pub const fn new(config: &AsmConfig) -> Self {
        let command_memory_words = if config.command_memory_words == 0 {
            1
        } else {
            config.command_memory_words
        };
        Self {
            command_memory_words,
            step_budget: config.step_budget,
        }
    }

    /// Runs `stream` from its first instruction until END and returns
    /// the cycle total.
    ///
    /// The program counter wraps at the command-memory boundary, and
    /// words past the end of `stream` read as NOPs, matching the
    /// engine's uninitialized command memory.
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::NonterminatingEstimate`] if the step budget
    /// is exhausted before an END executes.
    pub fn estimate(&self, stream: &[FieldRecord]) -> Result<u64> {
        let nop = FieldRecord::with_op(Op::Nop);
        let mut regs = [0_u32; SCALAR_REGS];
        let mut bank = 0_u32;
        let mut loops: Vec<LoopBinding> = Vec::new();
        let mut aai = AaiState::default();
        let mut pc = 0_usize;
        let mut cycles = 0_u64;
        let mut executed = 0_u64;

        loop {
            if executed >= self.step_budget {
                return Err(IsaError::NonterminatingEstimate { executed });
            }
            let record = stream.get(pc).unwrap_or(&nop);
            let mut next = pc + 1;
            let mut cost = 1_u64;

            match record.op.unwrap_or(Op::Nop) {
                Op::End => {
                    trace!(pc, cycles = cycles + 1, "reached stream end");
                    return Ok(cycles + 1);
                }
                Op::Set(sel) => {
                    if RegClass::from_selector(sel) == RegClass::Aai {
                        aai = AaiState {
                            enabled: record.get_or_zero(Field::AaiEnable) == 1,
                            length: record.get_or_zero(Field::AaiLength),
                        };
                    }
                }
                Op::Load | Op::Store if record.op2.is_some() => {
                    // Fused pipelines overlap their element burst with the
                    // next issue; AAI extends the burst without re-issue.
                    cost += if aai.enabled {
                        u64::from(aai.length.saturating_sub(1))
                    } else {
                        1
                    };
                }
                Op::Scalar(op) => {
                    self.step_scalar(record, op, &mut regs, &mut bank, &mut loops, pc, &mut next);
                }
                Op::Nop | Op::Load | Op::Store | Op::Alu(_) | Op::Fused(_) => {}
            }

            cycles += cost;
            executed += 1;
            pc = next % self.command_memory_words;
        }
    }

    /// Executes one scalar instruction against the register file and
    /// loop stack, updating `next` for taken control flow.
    #[allow(clippy::too_many_arguments)]
    fn step_scalar(
        &self,
        record: &FieldRecord,
        op: ScalarOp,
        regs: &mut [u32; SCALAR_REGS],
        bank: &mut u32,
        loops: &mut Vec<LoopBinding>,
        pc: usize,
        next: &mut usize,
    ) {
        let idx = |bank: u32, r: u32| ((bank * BANK_SIZE + (r % BANK_SIZE)) as usize);
        let rs = regs[idx(*bank, record.get_or_zero(Field::Rs))];
        let rt = regs[idx(*bank, record.get_or_zero(Field::Rt))];
        let rd_slot = idx(*bank, record.get_or_zero(Field::Rd));
        let imm_raw = record.get_or_zero(Field::Imm);
        let imm = sign_extend(imm_raw, 16) as u32;

        match op {
            ScalarOp::Addi => regs[rd_slot] = rs.wrapping_add(imm),
            ScalarOp::Subi => regs[rd_slot] = rs.wrapping_sub(imm),
            ScalarOp::Muli => regs[rd_slot] = rs.wrapping_mul(imm),
            // Logical immediates take the raw 16-bit pattern unextended.
            ScalarOp::Andi => regs[rd_slot] = rs & imm_raw,
            ScalarOp::Ori => regs[rd_slot] = rs | imm_raw,
            ScalarOp::Xori => regs[rd_slot] = rs ^ imm_raw,
            ScalarOp::Slli => regs[rd_slot] = rs << (imm_raw & 31),
            ScalarOp::Srli => regs[rd_slot] = rs >> (imm_raw & 31),
            ScalarOp::Lui => regs[rd_slot] = imm_raw << 16,
            ScalarOp::Movi => regs[rd_slot] = imm,
            ScalarOp::Add => regs[rd_slot] = rs.wrapping_add(rt),
            ScalarOp::Sub => regs[rd_slot] = rs.wrapping_sub(rt),
            ScalarOp::Mul => regs[rd_slot] = rs.wrapping_mul(rt),
            ScalarOp::And => regs[rd_slot] = rs & rt,
            ScalarOp::Or => regs[rd_slot] = rs | rt,
            ScalarOp::Xor => regs[rd_slot] = rs ^ rt,
            ScalarOp::Sll => regs[rd_slot] = rs << (rt & 31),
            ScalarOp::Srl => regs[rd_slot] = rs >> (rt & 31),
            ScalarOp::Mov => regs[rd_slot] = rs,
            ScalarOp::Max => regs[rd_slot] = signed_max(rs, rt),
            ScalarOp::Min => regs[rd_slot] = signed_min(rs, rt),
            ScalarOp::Slt => regs[rd_slot] = u32::from((rs as i32) < (rt as i32)),
            ScalarOp::Sel => {
                if rs != 0 {
                    regs[rd_slot] = rt;
                }
            }
            ScalarOp::Jmp => *next = self.branch_target(record, pc),
            ScalarOp::Jeq => {
                if rs == rt {
                    *next = self.branch_target(record, pc);
                }
            }
            ScalarOp::Jne => {
                if rs != rt {
                    *next = self.branch_target(record, pc);
                }
            }
            ScalarOp::Jlt => {
                if (rs as i32) < (rt as i32) {
                    *next = self.branch_target(record, pc);
                }
            }
            ScalarOp::Jge => {
                if (rs as i32) >= (rt as i32) {
                    *next = self.branch_target(record, pc);
                }
            }
            ScalarOp::LoopStart => {
                // A zero count still runs the body once; the sequencer
                // decrements after the first pass.
                loops.push(LoopBinding {
                    start: (pc + 1) % self.command_memory_words,
                    remaining: record.get_or_zero(Field::Count).max(1),
                });
            }
            ScalarOp::LoopEnd => {
                if let Some(top) = loops.last_mut() {
                    if top.remaining > 1 {
                        top.remaining -= 1;
                        *next = top.start;
                    } else {
                        let _ = loops.pop();
                    }
                }
            }
            ScalarOp::BankSel => *bank = record.get_or_zero(Field::Bank) & 1,
            // Timing only; the estimator does not model the target
            // configuration register's content.
            ScalarOp::CfgWr => {}
        }
    }

    /// Resolves a signed instruction-count branch offset relative to
    /// the word after `pc`, wrapping at the command-memory boundary.
    fn branch_target(&self, record: &FieldRecord, pc: usize) -> usize {
        let off = i64::from(sign_extend(record.get_or_zero(Field::BranchOff), 16));
        let words = self.command_memory_words as i64;
        ((pc as i64 + 1 + off).rem_euclid(words)) as usize
    }
}

const fn signed_max(a: u32, b: u32) -> u32 {
    if (a as i32) >= (b as i32) { a } else { b }
}

const fn signed_min(a: u32, b: u32) -> u32 {
    if (a as i32) <= (b as i32) { a } else { b }
}
