//! Round-Trip Law Tests — Full Format Coverage.
//!
//! For every format registered in the mnemonic table, under both
//! profiles and several argument patterns: build the record from text
//! arguments, encode it to a word, decode the word, and require (a) the
//! decoded record to preserve every declared argument and fixed field,
//! and (b) the re-rendered text line to equal the original.

use vpuasm_core::isa::field::Field;
use vpuasm_core::isa::mnemonic::{MnemonicFormat, MnemonicTable};
use vpuasm_core::isa::op::Op;
use vpuasm_core::isa::profile::EncodingProfile;
use vpuasm_core::isa::word::{decode, encode};

/// A representative in-range value for `field`, with `variant` choosing
/// between a small and a large exemplar. Values stay within the
/// narrowest width the field occupies in any class.
fn arg_for(format: &MnemonicFormat, field: Field, variant: usize) -> i64 {
    // Unsigned-immediate forms take the raw 16-bit pattern; exercise a
    // value above i16 range.
    if format.unsigned_imm && field == Field::Imm {
        return [9, 40_000][variant % 2];
    }
    let pair: [i64; 2] = match field {
        Field::Rs | Field::Rt | Field::Rd => [1, 3],
        Field::Imm => [7, -8],
        Field::Offset => [0, 513],
        Field::BranchOff => [-2, 5],
        Field::Dtype => [0, 3],
        Field::Payload => [0, 15],
        Field::Stride => [1, 7],
        Field::ClusterMask => [3, 85],
        Field::BankMask => [1, 15],
        Field::Broadcast => [0, 256],
        Field::AaiLength => [4, 2000],
        Field::AaiStride => [1, 4000],
        Field::Count => [4, 65535],
        Field::Selector => [1, 9],
        // Single-bit fields and anything else that appears as an
        // argument in no wider slot.
        _ => [0, 1],
    };
    pair[variant % 2]
}

fn render(mnemonic: &str, args: &[i64]) -> String {
    let mut line = mnemonic.to_owned();
    for arg in args {
        line.push_str(&format!(" {arg}"));
    }
    line
}

fn check_profile(profile: EncodingProfile) {
    let table = MnemonicTable::shared(profile);
    for format in table.formats() {
        for variant in 0..2 {
            let args: Vec<i64> = format
                .args
                .iter()
                .enumerate()
                .map(|(i, &field)| arg_for(format, field, variant + i))
                .collect();
            let line = render(format.mnemonic, &args);

            let record = table.encode(format.mnemonic, &args).unwrap();
            let word = encode(&record, profile).unwrap();
            let decoded = decode(word, profile).unwrap();

            // Sentinel-byte law: only NOP and END may place 0x00 or
            // 0xFF in byte 3; a colliding instruction would terminate
            // the stream mid-program.
            if !matches!(record.op, Some(Op::Nop | Op::End)) {
                let byte3 = word >> 24;
                assert!(
                    byte3 != 0x00 && byte3 != 0xFF,
                    "`{line}` encodes a sentinel top byte ({word:#010x})"
                );
            }

            // Restricted record round-trip: every field the format
            // declares (argument or fixed) survives the word.
            for (&field, _) in format.args.iter().zip(&args) {
                assert_eq!(
                    decoded.get(field),
                    record.get(field),
                    "field `{}` lost by `{}`",
                    field.name(),
                    format.mnemonic
                );
            }
            for &(field, value) in &format.fixed {
                assert_eq!(
                    decoded.get(field),
                    Some(value),
                    "fixed field `{}` lost by `{}`",
                    field.name(),
                    format.mnemonic
                );
            }
            assert_eq!(decoded.op, record.op, "{}", format.mnemonic);
            assert_eq!(decoded.op2, record.op2, "{}", format.mnemonic);
            assert_eq!(decoded.op3, record.op3, "{}", format.mnemonic);

            // Text round-trip: decode must re-render the exact line.
            assert_eq!(table.decode(&decoded).as_deref(), Some(line.as_str()));
        }
    }
}

#[test]
fn every_gen1_format_roundtrips() {
    check_profile(EncodingProfile::Gen1);
}

#[test]
fn every_gen2_format_roundtrips() {
    check_profile(EncodingProfile::Gen2);
}

#[test]
fn table_self_check_accepts_both_profiles() {
    // Building the shared tables runs the decode-ambiguity assertion;
    // reaching here means both passed.
    assert!(!MnemonicTable::shared(EncodingProfile::Gen1).formats().is_empty());
    assert!(!MnemonicTable::shared(EncodingProfile::Gen2).formats().is_empty());
}
