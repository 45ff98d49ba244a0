//! Configuration Tracker Unit Tests.
//!
//! Verifies the suppression cache and the fixed relativity table that
//! decides which instruction family observes each register class.

use vpuasm_core::isa::field::{Field, FieldRecord};
use vpuasm_core::isa::op::{Op, ScalarOp, Selector};
use vpuasm_core::asm::tracker::{ConfigTracker, RegClass, consumes, is_scalar, set_class};

// ══════════════════════════════════════════════════════════
// 1. Suppression cache
// ══════════════════════════════════════════════════════════

#[test]
fn unknown_slot_always_changes() {
    let tracker = ConfigTracker::new();
    assert!(tracker.would_change(RegClass::Quant, 5));
}

#[test]
fn recorded_value_suppresses_equal_write() {
    let mut tracker = ConfigTracker::new();
    tracker.record(RegClass::Quant, 5);
    assert!(!tracker.would_change(RegClass::Quant, 5));
    assert!(tracker.would_change(RegClass::Quant, 6));
    // Other classes are unaffected.
    assert!(tracker.would_change(RegClass::Dequant, 5));
}

#[test]
fn invalidate_forgets_every_slot() {
    let mut tracker = ConfigTracker::new();
    tracker.record(RegClass::LoadBase, 0x1000);
    tracker.record(RegClass::StoreDesc, 42);
    tracker.invalidate_all();
    assert!(tracker.would_change(RegClass::LoadBase, 0x1000));
    assert!(tracker.would_change(RegClass::StoreDesc, 42));
}

// ══════════════════════════════════════════════════════════
// 2. Relativity table
// ══════════════════════════════════════════════════════════

fn plain_load() -> FieldRecord {
    let mut rec = FieldRecord::with_op(Op::Load);
    let _ = rec.set(Field::DualLoad, 0);
    rec
}

fn dual_load() -> FieldRecord {
    let mut rec = FieldRecord::with_op(Op::Load);
    let _ = rec.set(Field::DualLoad, 1);
    rec
}

fn plain_store() -> FieldRecord {
    FieldRecord::with_op(Op::Store)
}

fn super_fused() -> FieldRecord {
    let mut rec = FieldRecord::with_op(Op::Load);
    rec.op2 = Some(Op::Fused(vpuasm_core::isa::op::FusedOp::Mac));
    rec.op3 = Some(Op::Store);
    rec
}

#[test]
fn load_observes_load_side_classes_only() {
    let load = plain_load();
    assert!(consumes(&load, RegClass::LoadBase));
    assert!(consumes(&load, RegClass::LoadDesc));
    assert!(consumes(&load, RegClass::Dequant));
    assert!(!consumes(&load, RegClass::StoreBase));
    assert!(!consumes(&load, RegClass::Quant));
    // The secondary base feeds dual loads only.
    assert!(!consumes(&load, RegClass::Load2Base));
    assert!(!consumes(&load, RegClass::Dequant2));
}

#[test]
fn dual_load_also_observes_secondary_classes() {
    let load = dual_load();
    assert!(consumes(&load, RegClass::Load2Base));
    assert!(consumes(&load, RegClass::Dequant2));
}

#[test]
fn store_observes_store_side_classes_only() {
    let store = plain_store();
    assert!(consumes(&store, RegClass::StoreBase));
    assert!(consumes(&store, RegClass::StoreDesc));
    assert!(consumes(&store, RegClass::Quant));
    assert!(!consumes(&store, RegClass::LoadBase));
    assert!(!consumes(&store, RegClass::Dequant));
}

#[test]
fn fully_fused_observes_both_sides_and_aai() {
    let fused = super_fused();
    assert!(consumes(&fused, RegClass::LoadBase));
    assert!(consumes(&fused, RegClass::StoreBase));
    assert!(consumes(&fused, RegClass::Aai));
}

#[test]
fn arithmetic_observes_nothing() {
    let rec = FieldRecord::with_op(Op::Alu(vpuasm_core::isa::op::AluOp::Add));
    assert!(!consumes(&rec, RegClass::LoadBase));
    assert!(!consumes(&rec, RegClass::Aai));
}

// ══════════════════════════════════════════════════════════
// 3. Record classification
// ══════════════════════════════════════════════════════════

#[test]
fn set_class_maps_selector_to_register_class() {
    let rec = FieldRecord::with_op(Op::Set(Selector::LoadGlb));
    assert_eq!(set_class(&rec), Some(RegClass::LoadDesc));
    assert_eq!(set_class(&plain_load()), None);
}

#[test]
fn scalar_classification() {
    assert!(is_scalar(&FieldRecord::with_op(Op::Scalar(ScalarOp::Addi))));
    assert!(!is_scalar(&plain_load()));
}
