//! ZigZag mapping between signed integers and unsigned varint payloads.
//!
//! Plain two's-complement varints spend 10 bytes on any negative value.
//! ZigZag interleaves the two sign halves (`0, -1, 1, -2, 2, ..`) so that
//! small magnitudes of either sign stay small on the wire. Used exclusively
//! for `sint32`/`sint64`.

// Sign-twiddling below relies on wrapping `as` casts.
#![allow(clippy::as_conversions)]

#[inline]
pub const fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub const fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

#[inline]
pub const fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub const fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_zigzag_32_known_values() {
        assert_eq!(zigzag_encode_32(0), 0);
        assert_eq!(zigzag_encode_32(-1), 1);
        assert_eq!(zigzag_encode_32(1), 2);
        assert_eq!(zigzag_encode_32(-2), 3);
        assert_eq!(zigzag_encode_32(2), 4);
        assert_eq!(zigzag_encode_32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_encode_32(i32::MIN), u32::MAX);
    }

    #[test]
    fn test_zigzag_64_known_values() {
        assert_eq!(zigzag_encode_64(0), 0);
        assert_eq!(zigzag_encode_64(-1), 1);
        assert_eq!(zigzag_encode_64(1), 2);
        assert_eq!(zigzag_encode_64(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag_encode_64(i64::MIN), u64::MAX);
    }

    #[test]
    fn test_zigzag_32_boundaries_roundtrip() {
        for n in [0, 1, -1, 2, -2, i32::MAX, i32::MIN, i32::MAX - 1, i32::MIN + 1] {
            assert_eq!(zigzag_decode_32(zigzag_encode_32(n)), n);
        }
    }

    #[test]
    fn test_zigzag_64_boundaries_roundtrip() {
        for n in [0, 1, -1, 2, -2, i64::MAX, i64::MIN, i64::MAX - 1, i64::MIN + 1] {
            assert_eq!(zigzag_decode_64(zigzag_encode_64(n)), n);
        }
    }

    proptest! {
        #[test]
        fn proptest_zigzag_32_roundtrip(n: i32) {
            prop_assert_eq!(zigzag_decode_32(zigzag_encode_32(n)), n);
        }

        #[test]
        fn proptest_zigzag_64_roundtrip(n: i64) {
            prop_assert_eq!(zigzag_decode_64(zigzag_encode_64(n)), n);
        }

        #[test]
        fn proptest_zigzag_32_is_injective_on_sign(n in 1i32..) {
            // Positive values land on evens, negatives on odds.
            prop_assert_eq!(zigzag_encode_32(n) % 2, 0);
            prop_assert_eq!(zigzag_encode_32(-n) % 2, 1);
        }
    }
}
