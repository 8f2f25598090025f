//! Numeric code generation

use rand::{rngs::OsRng, Rng};

/// Generate a numeric code of `length` digits, uniform over
/// `[10^(length-1), 10^length - 1]` (`[100000, 999999]` for six digits).
///
/// `length` is clamped to `1..=9` so the range fits in a `u32`.
pub fn generate_code(length: usize) -> String {
    let length = length.clamp(1, 9) as u32;
    let low = if length == 1 { 0 } else { 10u32.pow(length - 1) };
    let high = 10u32.pow(length) - 1;
    OsRng.gen_range(low..=high).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_digit_codes_stay_in_range() {
        for _ in 0..1000 {
            let code = generate_code(6);
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_codes_vary() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| generate_code(6)).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_length_is_respected() {
        assert_eq!(generate_code(4).len(), 4);
        assert_eq!(generate_code(8).len(), 8);
    }
}
