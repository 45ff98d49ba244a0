//! Bit-Field Packing Unit Tests.
//!
//! Verifies the pack/extract chokepoint: in-range values land at the
//! declared bit position, out-of-range values are rejected before
//! anything is written, and sign extension reproduces two's-complement
//! semantics for 16-bit immediates.

use proptest::prelude::*;
use vpuasm_core::IsaError;
use vpuasm_core::common::bits::{extract, pack, sign_extend};

// ══════════════════════════════════════════════════════════
// 1. Packing
// ══════════════════════════════════════════════════════════

#[test]
fn pack_places_value_at_low_bit() {
    let mut word = 0;
    pack(&mut word, "selector", 0b101, 3, 24).unwrap();
    assert_eq!(word, 0b101 << 24);
}

#[test]
fn pack_merges_disjoint_fields() {
    let mut word = 0;
    pack(&mut word, "a", 0xF, 4, 0).unwrap();
    pack(&mut word, "b", 0x3, 2, 30).unwrap();
    assert_eq!(word, 0xC000_000F);
}

#[test]
fn pack_rejects_over_width_value() {
    let mut word = 0;
    let err = pack(&mut word, "dtype", 4, 2, 28).unwrap_err();
    assert_eq!(
        err,
        IsaError::FieldRange {
            field: "dtype",
            value: 4,
            width: 2,
        }
    );
}

#[test]
fn pack_failure_leaves_word_untouched() {
    let mut word = 0xDEAD_0000;
    assert!(pack(&mut word, "imm", 0x1_0000, 16, 0).is_err());
    assert_eq!(word, 0xDEAD_0000, "rejected pack must not truncate-write");
}

#[test]
fn pack_accepts_full_width_maximum() {
    let mut word = 0;
    pack(&mut word, "offset", 0xFFFF, 16, 0).unwrap();
    assert_eq!(word, 0xFFFF);
}

// ══════════════════════════════════════════════════════════
// 2. Extraction
// ══════════════════════════════════════════════════════════

#[test]
fn extract_reads_back_packed_value() {
    let mut word = 0;
    pack(&mut word, "rd", 5, 3, 21).unwrap();
    assert_eq!(extract(word, 3, 21), 5);
}

#[test]
fn extract_masks_neighbouring_bits() {
    assert_eq!(extract(0xFFFF_FFFF, 4, 20), 0xF);
    assert_eq!(extract(0xABCD_1234, 8, 8), 0x12);
}

// ══════════════════════════════════════════════════════════
// 3. Sign extension
// ══════════════════════════════════════════════════════════

#[test]
fn sign_extend_positive_is_identity() {
    assert_eq!(sign_extend(0x7FFF, 16), 32767);
    assert_eq!(sign_extend(42, 16), 42);
}

#[test]
fn sign_extend_negative_sets_high_bits() {
    assert_eq!(sign_extend(0xFFFF, 16), -1);
    assert_eq!(sign_extend(0x8000, 16), -32768);
    assert_eq!(sign_extend(0xFFFB, 16), -5);
}

// ══════════════════════════════════════════════════════════
// 4. Width invariant (property)
// ══════════════════════════════════════════════════════════

proptest! {
    /// `pack` rejects every value at or above `2^width` and round-trips
    /// every value below it.
    #[test]
    fn pack_width_invariant(value in 0u32..=0x1_FFFF, width in 1u32..=16, low in 0u32..=15) {
        let mut word = 0;
        let result = pack(&mut word, "field", value, width, low);
        if u64::from(value) < 1u64 << width {
            prop_assert!(result.is_ok());
            prop_assert_eq!(extract(word, width, low), value);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(word, 0);
        }
    }
}
