//! Error Display Unit Tests.
//!
//! Verifies the rendered diagnostics for each error variant a toolchain
//! user can plausibly hit.

use vpuasm_core::IsaError;

#[test]
fn field_range_names_field_and_width() {
    let err = IsaError::FieldRange {
        field: "offset",
        value: 70000,
        width: 16,
    };
    assert_eq!(
        err.to_string(),
        "field `offset` value 70000 does not fit in 16 bits"
    );
}

#[test]
fn unrepresentable_formats_word_as_hex() {
    let err = IsaError::Unrepresentable(0x8F00_0000);
    assert_eq!(
        err.to_string(),
        "instruction word 0x8f000000 has no mnemonic representation"
    );
}

#[test]
fn misaligned_offset_formats_as_hex() {
    let err = IsaError::MisalignedOffset(0x1001);
    assert_eq!(err.to_string(), "byte offset 0x1001 is not 64-byte aligned");
}

#[test]
fn label_errors_quote_the_name() {
    assert_eq!(
        IsaError::DuplicateLabel("loop_top".into()).to_string(),
        "duplicate label `loop_top`"
    );
    assert_eq!(
        IsaError::UnknownLabel("exit".into()).to_string(),
        "unknown label `exit`"
    );
}

#[test]
fn nonterminating_reports_step_count() {
    let err = IsaError::NonterminatingEstimate { executed: 1024 };
    assert_eq!(
        err.to_string(),
        "stream did not terminate within the step budget (1024 instructions executed)"
    );
}
