//! Encoding Profile Divergence Unit Tests.
//!
//! Verifies the points where Gen1 and Gen2 disagree: dequantize payload
//! width, inline cluster-mask width, the channel-broadcast flag, and
//! the two Gen2-only configuration selectors.

use rstest::rstest;
use vpuasm_core::isa::field::{Field, FieldRecord};
use vpuasm_core::isa::op::{Op, Selector};
use vpuasm_core::isa::profile::EncodingProfile;
use vpuasm_core::isa::word::{decode, encode};
use vpuasm_core::{InstructionCodec, IsaError, VpuCodec};

fn dequant_record(payload: u32) -> FieldRecord {
    let mut rec = FieldRecord::with_op(Op::Set(Selector::Dequant));
    let _ = rec.set(Field::Payload, payload);
    rec
}

#[rstest]
#[case::gen1(EncodingProfile::Gen1, false)]
#[case::gen2(EncodingProfile::Gen2, true)]
fn dequant_payload_width_diverges(#[case] profile: EncodingProfile, #[case] wide_ok: bool) {
    // 0x10000 needs 17 bits: beyond Gen1's 16-bit payload, within
    // Gen2's 24-bit payload.
    let result = encode(&dequant_record(0x1_0000), profile);
    assert_eq!(result.is_ok(), wide_ok);
    // 16-bit values fit both generations.
    assert!(encode(&dequant_record(0xFFFF), profile).is_ok());
}

#[rstest]
#[case::gen1(EncodingProfile::Gen1, true)]
#[case::gen2(EncodingProfile::Gen2, false)]
fn inline_cluster_mask_width_diverges(#[case] profile: EncodingProfile, #[case] full_ok: bool) {
    // Gen1 keeps all 8 cluster-mask bits inline; Gen2 keeps 7 and moves
    // the high bits behind the cmask-high selector.
    let mut rec = FieldRecord::with_op(Op::Set(Selector::LoadGlb));
    let _ = rec.set(Field::ClusterMask, 0xFF);
    assert_eq!(encode(&rec, profile).is_ok(), full_ok);
}

#[test]
fn chan_broadcast_roundtrips_on_gen2_only() {
    let gen2 = EncodingProfile::Gen2;
    let mut rec = FieldRecord::with_op(Op::Set(Selector::StoreGlb));
    let _ = rec.set(Field::Stride, 2);
    let _ = rec.set(Field::ChanBroadcast, 1);
    let back = decode(encode(&rec, gen2).unwrap(), gen2).unwrap();
    assert_eq!(back.get(Field::ChanBroadcast), Some(1));

    // Gen1 has no channel-broadcast slot; the field is simply absent.
    let gen1 = EncodingProfile::Gen1;
    let back = decode(encode(&rec, gen1).unwrap(), gen1).unwrap();
    assert_eq!(back.get(Field::ChanBroadcast), None);
}

#[rstest]
#[case(Selector::Format)]
#[case(Selector::ClusterMaskHigh)]
fn gen2_selectors_unrepresentable_under_gen1(#[case] sel: Selector) {
    let gen2 = EncodingProfile::Gen2;
    let mut rec = FieldRecord::with_op(Op::Set(sel));
    let _ = rec.set(Field::Payload, 3);
    let word = encode(&rec, gen2).unwrap();
    assert!(decode(word, gen2).is_ok());
    assert_eq!(
        decode(word, EncodingProfile::Gen1).unwrap_err(),
        IsaError::Unrepresentable(word)
    );
}

#[test]
fn gen2_mnemonics_unknown_to_gen1_table() {
    let gen1 = VpuCodec::new(EncodingProfile::Gen1);
    assert_eq!(
        gen1.decode_text("vpu_set_format 3").unwrap_err(),
        IsaError::UnknownMnemonic("vpu_set_format".to_owned())
    );

    let gen2 = VpuCodec::new(EncodingProfile::Gen2);
    let bytes = gen2.assemble("vpu_set_format 3").unwrap();
    assert_eq!(gen2.disassemble(&bytes).unwrap(), "vpu_set_format 3");
}

#[test]
fn glb_mnemonic_arity_tracks_profile() {
    // The descriptor SET takes four arguments on Gen1 and five on Gen2.
    let gen1 = VpuCodec::new(EncodingProfile::Gen1);
    let gen2 = VpuCodec::new(EncodingProfile::Gen2);
    assert!(gen1.decode_text("vpu_set_load_glb 1 2 3 4").is_ok());
    assert!(gen1.decode_text("vpu_set_load_glb 1 2 3 4 1").is_err());
    assert!(gen2.decode_text("vpu_set_load_glb 1 2 3 4 1").is_ok());
    assert!(gen2.decode_text("vpu_set_load_glb 1 2 3 4").is_err());
}
