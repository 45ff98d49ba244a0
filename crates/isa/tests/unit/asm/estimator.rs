//! Cycle Estimator Unit Tests.
//!
//! Exercises the stream interpreter on finalized builder output and on
//! hand-built record streams: hardware loops, conditional branches over
//! live scalar state, AAI cost amortization, bank isolation, program
//! counter wrapping, and the step budget.

use vpuasm_core::asm::{CycleEstimator, StreamBuilder};
use vpuasm_core::isa::field::{Field, FieldRecord};
use vpuasm_core::isa::op::{AluOp, Dtype, FusedOp, Op, ScalarOp};
use vpuasm_core::{AsmConfig, IsaError};

fn estimator() -> CycleEstimator {
    CycleEstimator::new(&AsmConfig::default())
}

fn scalar(op: ScalarOp, fields: &[(Field, u32)]) -> FieldRecord {
    let mut rec = FieldRecord::with_op(Op::Scalar(op));
    for &(field, value) in fields {
        let _ = rec.set(field, value);
    }
    rec
}

// ══════════════════════════════════════════════════════════
// 1. Loops
// ══════════════════════════════════════════════════════════

#[test]
fn hardware_loop_multiplies_body_cost() {
    let mut b = StreamBuilder::new(AsmConfig::default());
    b.loop_start(4).unwrap();
    b.compute(AluOp::Add, 0, 1, 2).unwrap();
    b.loop_end().unwrap();
    let program = b.finalize().unwrap();
    assert_eq!(program.len(), 8);

    // loop_start + 4 * (compute + loop_end) + 4 pad NOPs + END.
    let cycles = estimator().estimate(program.records()).unwrap();
    assert_eq!(cycles, 1 + 4 * 2 + 4 + 1);
}

#[test]
fn zero_count_loop_still_runs_once() {
    let stream = [
        scalar(ScalarOp::LoopStart, &[(Field::Count, 0)]),
        FieldRecord::with_op(Op::Nop),
        scalar(ScalarOp::LoopEnd, &[]),
        FieldRecord::with_op(Op::End),
    ];
    assert_eq!(estimator().estimate(&stream).unwrap(), 4);
}

#[test]
fn nested_loops_compose() {
    let stream = [
        scalar(ScalarOp::LoopStart, &[(Field::Count, 2)]),
        scalar(ScalarOp::LoopStart, &[(Field::Count, 3)]),
        FieldRecord::with_op(Op::Nop),
        scalar(ScalarOp::LoopEnd, &[]),
        scalar(ScalarOp::LoopEnd, &[]),
        FieldRecord::with_op(Op::End),
    ];
    // Inner pass = loop_start + 3 * (nop + loop_end) = 7; the outer loop
    // runs it twice with one loop_end per pass.
    assert_eq!(estimator().estimate(&stream).unwrap(), 1 + 2 * (7 + 1) + 1);
}

// ══════════════════════════════════════════════════════════
// 2. Branches over scalar state
// ══════════════════════════════════════════════════════════

#[test]
fn countdown_branch_loop_terminates() {
    let mut b = StreamBuilder::new(AsmConfig::default());
    b.scalar_movi(1, 3).unwrap();
    b.label("top").unwrap();
    b.scalar_imm(ScalarOp::Subi, 1, 1, 1).unwrap();
    b.branch(ScalarOp::Jne, 1, 0, "top").unwrap();
    let program = b.finalize().unwrap();
    assert_eq!(program.len(), 8);

    // movi + 3 * (subi + jne) + 4 pad NOPs + END.
    let cycles = estimator().estimate(program.records()).unwrap();
    assert_eq!(cycles, 1 + 3 * 2 + 4 + 1);
}

#[test]
fn backward_jump_wraps_at_the_memory_boundary() {
    let config = AsmConfig {
        command_memory_words: 4,
        ..AsmConfig::default()
    };
    // Offset -2 from pc 0 lands on word 3 after wrapping.
    let stream = [
        scalar(ScalarOp::Jmp, &[(Field::BranchOff, 0xFFFE)]),
        FieldRecord::with_op(Op::Nop),
        FieldRecord::with_op(Op::Nop),
        FieldRecord::with_op(Op::End),
    ];
    assert_eq!(CycleEstimator::new(&config).estimate(&stream).unwrap(), 2);
}

#[test]
fn untaken_branch_falls_through() {
    // r1 == r0 == 0, so Jne falls through into the END.
    let stream = [
        scalar(
            ScalarOp::Jne,
            &[(Field::Rs, 1), (Field::Rt, 0), (Field::BranchOff, 0xFFFF)],
        ),
        FieldRecord::with_op(Op::End),
    ];
    assert_eq!(estimator().estimate(&stream).unwrap(), 2);
}

// ══════════════════════════════════════════════════════════
// 3. AAI amortization
// ══════════════════════════════════════════════════════════

#[test]
fn aai_burst_charges_per_element() {
    let mut b = StreamBuilder::new(AsmConfig::default());
    b.set_aai(true, 8, 1).unwrap();
    b.fused_load_compute_store(FusedOp::Mac, Dtype::Int8, false, 0)
        .unwrap();
    let program = b.finalize().unwrap();
    assert_eq!(program.len(), 8);

    // AAI SET + base SET + fused burst (1 + 7) + 4 pad NOPs + END.
    let cycles = estimator().estimate(program.records()).unwrap();
    assert_eq!(cycles, 1 + 1 + 8 + 4 + 1);
}

#[test]
fn fused_without_aai_costs_two_cycles() {
    let mut b = StreamBuilder::new(AsmConfig::default());
    b.fused_load_compute_store(FusedOp::Mac, Dtype::Int8, false, 0)
        .unwrap();
    let program = b.finalize().unwrap();
    assert_eq!(program.len(), 8);

    // base SET + fused (2) + 5 pad NOPs + END.
    let cycles = estimator().estimate(program.records()).unwrap();
    assert_eq!(cycles, 1 + 2 + 5 + 1);
}

#[test]
fn plain_loads_are_not_amortized() {
    // AAI applies to fused instructions only.
    let mut rec = FieldRecord::with_op(Op::Load);
    let _ = rec.set(Field::Dtype, 0);
    let _ = rec.set(Field::Rd, 0);
    let _ = rec.set(Field::Offset, 0);
    let _ = rec.set(Field::DualLoad, 0);

    let mut aai = FieldRecord::with_op(Op::Set(vpuasm_core::isa::op::Selector::Aai));
    let _ = aai.set(Field::AaiEnable, 1);
    let _ = aai.set(Field::AaiLength, 100);
    let _ = aai.set(Field::AaiStride, 1);

    let stream = [aai, rec, FieldRecord::with_op(Op::End)];
    assert_eq!(estimator().estimate(&stream).unwrap(), 3);
}

// ══════════════════════════════════════════════════════════
// 4. Register banks
// ══════════════════════════════════════════════════════════

#[test]
fn banks_hold_independent_registers() {
    // Write r1 in bank 1, switch to bank 0, and test r1 there: the
    // branch must see zero and fall through.
    let stream = [
        scalar(ScalarOp::BankSel, &[(Field::Bank, 1)]),
        scalar(ScalarOp::Movi, &[(Field::Rd, 1), (Field::Imm, 1)]),
        scalar(ScalarOp::BankSel, &[(Field::Bank, 0)]),
        scalar(
            ScalarOp::Jne,
            &[(Field::Rs, 1), (Field::Rt, 0), (Field::BranchOff, 2)],
        ),
        FieldRecord::with_op(Op::Nop),
        FieldRecord::with_op(Op::End),
        FieldRecord::with_op(Op::End),
    ];
    // Fall-through path: banksel, movi, banksel, jne, nop, end.
    assert_eq!(estimator().estimate(&stream).unwrap(), 6);
}

// ══════════════════════════════════════════════════════════
// 5. Step budget
// ══════════════════════════════════════════════════════════

#[test]
fn missing_terminator_exhausts_the_budget() {
    let config = AsmConfig {
        step_budget: 16,
        ..AsmConfig::default()
    };
    // Out-of-range words read as NOPs, so the walk never ends.
    let stream = [FieldRecord::with_op(Op::Nop)];
    assert_eq!(
        CycleEstimator::new(&config).estimate(&stream).unwrap_err(),
        IsaError::NonterminatingEstimate { executed: 16 }
    );
}

#[test]
fn zero_word_geometry_is_clamped_not_divided_by() {
    // A pathological config must degrade to a budget error, not a
    // division-by-zero panic at the pc modulus.
    let config = AsmConfig {
        command_memory_words: 0,
        step_budget: 8,
        ..AsmConfig::default()
    };
    let stream = [FieldRecord::with_op(Op::Nop)];
    assert_eq!(
        CycleEstimator::new(&config).estimate(&stream).unwrap_err(),
        IsaError::NonterminatingEstimate { executed: 8 }
    );
}

#[test]
fn self_jump_exhausts_the_budget() {
    let config = AsmConfig {
        step_budget: 50,
        ..AsmConfig::default()
    };
    // Offset -2 from pc 1 jumps back to the movi forever.
    let stream = [
        scalar(ScalarOp::Movi, &[(Field::Rd, 1), (Field::Imm, 7)]),
        scalar(ScalarOp::Jmp, &[(Field::BranchOff, 0xFFFE)]),
        FieldRecord::with_op(Op::End),
    ];
    assert_eq!(
        CycleEstimator::new(&config).estimate(&stream).unwrap_err(),
        IsaError::NonterminatingEstimate { executed: 50 }
    );
}
