//! Bit-field packing and extraction for instruction words.
//!
//! Every field that ends up in a hardware-bound instruction word passes
//! through [`pack`]. This is the single chokepoint that enforces the width
//! invariant: a value that does not fit its declared bit width is rejected
//! with [`IsaError::FieldRange`], never truncated. Silent truncation here
//! would corrupt binary destined for silicon.

use crate::common::error::IsaError;

/// Total width of a vector-engine instruction word in bits.
pub const WORD_WIDTH: u32 = 32;

/// Writes `value` into `word[low, low + width)`, leaving all other bits
/// untouched.
///
/// # Arguments
///
/// * `word` - The instruction word under construction.
/// * `field` - Field name used in diagnostics.
/// * `value` - The field value; must satisfy `value < 2^width`.
/// * `width` - Field width in bits (1..=32).
/// * `low` - Bit position of the field's least significant bit.
///
/// # Errors
///
/// Returns [`IsaError::FieldRange`] if `value` does not fit in `width`
/// bits.
pub fn pack(
    word: &mut u32,
    field: &'static str,
    value: u32,
    width: u32,
    low: u32,
) -> Result<(), IsaError> {
    debug_assert!(width >= 1 && low + width <= WORD_WIDTH);
    let mask = field_mask(width);
    if value > mask {
        return Err(IsaError::FieldRange {
            field,
            value,
            width,
        });
    }
    *word = (*word & !(mask << low)) | (value << low);
    Ok(())
}

/// Returns the masked, right-aligned field `word[low, low + width)`.
#[inline]
pub fn extract(word: u32, width: u32, low: u32) -> u32 {
    debug_assert!(width >= 1 && low + width <= WORD_WIDTH);
    (word >> low) & field_mask(width)
}

/// Sign-extends a `bits`-wide field value to a 32-bit signed integer.
///
/// Used for branch offsets and signed immediates, which are stored in
/// their two's-complement field form inside records.
#[inline]
pub fn sign_extend(value: u32, bits: u32) -> i32 {
    debug_assert!(bits >= 1 && bits <= WORD_WIDTH);
    let shift = WORD_WIDTH - bits;
    ((value << shift) as i32) >> shift
}

/// All-ones mask for a `width`-bit field, right-aligned.
#[inline]
const fn field_mask(width: u32) -> u32 {
    if width >= WORD_WIDTH {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}
