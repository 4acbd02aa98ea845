//! Size string parsing
//!
//! Sizes are written as a decimal number followed by exactly one lowercase
//! binary unit: `k` (KiB), `m` (MiB) or `g` (GiB). `"512k"`, `"5m"` and
//! `"1.5g"` are valid; `"5M"`, `" 5m"`, `"5"` and `"5mb"` are not.

use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Size parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("Invalid size format: {0:?} (expected a number followed by k, m or g)")]
    InvalidSizeFormat(String),
}

/// Parse a size string into a byte count.
///
/// Returns `round(prefix * 1024^n)` where `n` is 1, 2 or 3 for `k`, `m`, `g`.
pub fn parse_size(input: &str) -> Result<u64, SizeError> {
    let invalid = || SizeError::InvalidSizeFormat(input.to_string());

    let (prefix, unit) = match input.char_indices().last() {
        Some((idx, unit)) => (&input[..idx], unit),
        None => return Err(invalid()),
    };

    let multiplier = match unit {
        'k' => KIB,
        'm' => MIB,
        'g' => GIB,
        _ => return Err(invalid()),
    };

    if !is_plain_decimal(prefix) {
        return Err(invalid());
    }

    let value: f64 = prefix.parse().map_err(|_| invalid())?;
    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(bytes as u64)
}

/// Render a byte count with the largest unit that divides it exactly.
///
/// Used to derive scenario names, so it must be total and deterministic:
/// `5 MiB` renders as `5m`, `1.5 GiB` as `1536m`, and a count that is not a
/// whole number of KiB falls back to plain bytes (`1000b`).
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0b".to_string();
    }
    for (unit, suffix) in [(GIB, 'g'), (MIB, 'm'), (KIB, 'k')] {
        if bytes % unit == 0 {
            return format!("{}{}", bytes / unit, suffix);
        }
    }
    format!("{}b", bytes)
}

/// Digits with at most one decimal point and at least one digit.
fn is_plain_decimal(s: &str) -> bool {
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in s.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_sizes() {
        assert_eq!(parse_size("512k").unwrap(), 512 * 1024);
        assert_eq!(parse_size("5m").unwrap(), 5 * 1024 * 1024);
        assert_eq!(parse_size("1g").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_exact_multiples() {
        for n in [1u64, 2, 7, 10, 100, 1000] {
            assert_eq!(parse_size(&format!("{}k", n)).unwrap(), n * KIB);
            assert_eq!(parse_size(&format!("{}m", n)).unwrap(), n * MIB);
            assert_eq!(parse_size(&format!("{}g", n)).unwrap(), n * GIB);
        }
    }

    #[test]
    fn test_parse_decimal_sizes() {
        assert_eq!(parse_size("1.5g").unwrap(), 1536 * MIB);
        assert_eq!(parse_size("0.5k").unwrap(), 512);
        assert_eq!(parse_size(".5m").unwrap(), 512 * KIB);
        assert_eq!(parse_size("2.m").unwrap(), 2 * MIB);
    }

    #[test]
    fn test_parse_rounds_fractional_bytes() {
        // 0.001 * 1024 = 1.024
        assert_eq!(parse_size("0.001k").unwrap(), 1);
        // 0.0009765625 * 1024 * 1024 = 1024 exactly
        assert_eq!(parse_size("0.0009765625m").unwrap(), 1024);
    }

    #[test]
    fn test_reject_other_suffixes() {
        for input in ["5M", "5K", "5G", "5t", "5mb", "5MiB", "5b", "5"] {
            assert_eq!(
                parse_size(input),
                Err(SizeError::InvalidSizeFormat(input.to_string())),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_reject_malformed_prefix() {
        for input in ["", "m", ".m", "1.2.3m", "-5m", "+5m", " 5m", "5m ", "5 m", "1e3k", "abcm"] {
            assert!(parse_size(input).is_err(), "{:?} should be rejected", input);
        }
    }

    #[test]
    fn test_reject_sizes_beyond_u64() {
        for input in ["99999999999999999999g", "17179869184g"] {
            assert_eq!(
                parse_size(input),
                Err(SizeError::InvalidSizeFormat(input.to_string()))
            );
        }
        assert_eq!(parse_size("17179869183g").unwrap(), 17179869183 * GIB);
    }

    #[test]
    fn test_format_size_picks_largest_exact_unit() {
        assert_eq!(format_size(512 * KIB), "512k");
        assert_eq!(format_size(5 * MIB), "5m");
        assert_eq!(format_size(GIB), "1g");
        assert_eq!(format_size(1536 * MIB), "1536m");
        assert_eq!(format_size(1000), "1000b");
        assert_eq!(format_size(0), "0b");
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        for input in ["512k", "5m", "10m", "100m", "1g"] {
            assert_eq!(format_size(parse_size(input).unwrap()), input);
        }
    }
}
