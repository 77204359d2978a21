//! 128-bit integer helpers
//!
//! The wire format carries signed 128-bit integers as an `(hi: i64, lo: u64)`
//! pair, which is exactly the two's-complement representation cut in half.

use crate::error::{Result, XdrAsmError};
use std::num::IntErrorKind;

const LOW_MASK: i128 = u64::MAX as i128;

/// Split into the high (signed) and low (unsigned) 64-bit words.
pub fn split_i128(value: i128) -> (i64, u64) {
    let lo = (value & LOW_MASK) as u64;
    let hi = (value >> 64) as i64;
    (hi, lo)
}

/// Inverse of [`split_i128`].
pub fn reassemble_i128(hi: i64, lo: u64) -> i128 {
    (i128::from(hi) << 64) | i128::from(lo)
}

/// Parse decimal text of any length into an `i128`.
///
/// Values beyond the signed 128-bit range fail with `IntegerOverflow`
/// before anything is split.
pub fn parse_i128(text: &str) -> Result<i128> {
    let trimmed = text.trim();
    trimmed.parse::<i128>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            XdrAsmError::IntegerOverflow(format!("{} does not fit in a signed 128-bit integer", trimmed))
        }
        _ => XdrAsmError::InvalidInteger(trimmed.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minus_one_is_all_ones() {
        assert_eq!(split_i128(-1), (-1, u64::MAX));
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(split_i128(0), (0, 0));
        assert_eq!(split_i128(u64::MAX as i128), (0, u64::MAX));
        assert_eq!(split_i128(1i128 << 64), (1, 0));
        assert_eq!(split_i128(-(1i128 << 64)), (-1, 0));
        assert_eq!(split_i128(i128::MAX), (i64::MAX, u64::MAX));
        assert_eq!(split_i128(i128::MIN), (i64::MIN, 0));
    }

    #[test]
    fn test_reassemble_inverts_split() {
        let samples = [
            0,
            1,
            -1,
            42,
            -42,
            i64::MIN as i128,
            i64::MAX as i128 + 1,
            u64::MAX as i128 + 12345,
            -(u64::MAX as i128) - 7,
            0x0123_4567_89ab_cdef_fedc_ba98_7654_3210,
            i128::MAX,
            i128::MIN,
            i128::MIN + 1,
        ];
        for value in samples {
            let (hi, lo) = split_i128(value);
            assert_eq!(reassemble_i128(hi, lo), value, "value {}", value);
        }
    }

    #[test]
    fn test_parse_in_range() {
        assert_eq!(parse_i128("-1").unwrap(), -1);
        assert_eq!(
            parse_i128("170141183460469231731687303715884105727").unwrap(),
            i128::MAX
        );
        assert_eq!(
            parse_i128(" -170141183460469231731687303715884105728 ").unwrap(),
            i128::MIN
        );
    }

    #[test]
    fn test_parse_overflow() {
        assert!(matches!(
            parse_i128("170141183460469231731687303715884105728"),
            Err(XdrAsmError::IntegerOverflow(_))
        ));
        assert!(matches!(
            parse_i128("-999999999999999999999999999999999999999999"),
            Err(XdrAsmError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert!(matches!(parse_i128("12abc"), Err(XdrAsmError::InvalidInteger(_))));
        assert!(matches!(parse_i128(""), Err(XdrAsmError::InvalidInteger(_))));
    }
}
