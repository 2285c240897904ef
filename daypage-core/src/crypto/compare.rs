//! Timing-safe comparison of stored verifiers.

use subtle::ConstantTimeEq;

/// Compare two verifiers without leaking where they first differ
///
/// Unequal lengths return `false` immediately; the length of a hex digest
/// is public. Equal-length inputs are XOR-accumulated over every byte.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();

    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_strings() {
        assert!(timing_safe_eq("", ""));
        assert!(timing_safe_eq("a1b2c3", "a1b2c3"));
    }

    #[test]
    fn test_differing_strings() {
        assert!(!timing_safe_eq("a1b2c3", "a1b2c4"));
        assert!(!timing_safe_eq("a1b2c3", "01b2c3"));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!timing_safe_eq("abc", "abcd"));
        assert!(!timing_safe_eq("abcd", ""));
    }
}
