//! Number conversions with script semantics
//!
//! Every Array method receives its numeric arguments as doubles and has to
//! normalize them the same way the engine does. These helpers are the single
//! place where that happens.

/// Format a double the way `Number.prototype.toString()` does (radix 10).
///
/// Integers below 10^21 print without a fraction or exponent; everything
/// else uses the shortest round-trip digits with the exponent thresholds of
/// the language (`1e21`, `1e-7`).
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // -0 prints as "0"
        return "0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if abs.fract() == 0.0 && abs < 1e21 {
        return format!("{sign}{}", abs as u128);
    }

    // Rust's `{:e}` yields the shortest round-trip digits, e.g. "1.2345e3".
    let repr = format!("{abs:e}");
    let (mantissa, exponent) = match repr.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (repr.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        let mut s = digits;
        s.extend(std::iter::repeat('0').take((n - k) as usize));
        s
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{int_part}.{frac_part}")
    } else if -6 < n && n <= 0 {
        let zeros = "0".repeat((-n) as usize);
        format!("0.{zeros}{digits}")
    } else {
        let exp = n - 1;
        let exp_sign = if exp >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{exp_sign}{}", exp.abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{}", exp.abs())
        }
    };

    format!("{sign}{body}")
}

/// Parse a string the way `Number(string)` does.
///
/// Surrounding whitespace is ignored, the empty string is 0, and anything
/// that is not a complete numeric literal is NaN.
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix_body = |prefix: &[&str]| {
        prefix
            .iter()
            .find_map(|p| trimmed.strip_prefix(p))
            .filter(|rest| !rest.is_empty())
    };
    if let Some(hex) = radix_body(&["0x", "0X"]) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if let Some(oct) = radix_body(&["0o", "0O"]) {
        return u64::from_str_radix(oct, 8).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if let Some(bin) = radix_body(&["0b", "0B"]) {
        return u64::from_str_radix(bin, 2).map(|v| v as f64).unwrap_or(f64::NAN);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Rust accepts "inf"/"nan" spellings the language does not.
    let literal = trimmed.trim_start_matches(['+', '-']);
    if !literal.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `ToIntegerOrInfinity`: truncate towards zero, NaN becomes 0.
pub fn to_integer_or_infinity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value.is_infinite() {
        value
    } else {
        value.trunc()
    }
}

/// Resolve a relative index argument against `len`.
///
/// Negative values count from the end; the result is clamped to `[0, len]`.
/// A missing argument resolves to `default`.
pub fn relative_index(argument: Option<f64>, len: usize, default: usize) -> usize {
    let Some(raw) = argument else {
        return default;
    };
    let relative = to_integer_or_infinity(raw);
    let len_f = len as f64;
    if relative < 0.0 {
        (len_f + relative).max(0.0) as usize
    } else {
        relative.min(len_f) as usize
    }
}

/// Validate a requested array length the way `arr.length = n` does.
///
/// Returns `None` when `value` is not a valid uint32 length.
pub fn array_length(value: f64) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as usize)
    } else {
        None
    }
}

/// SameValueZero: like `===` on numbers, but NaN equals NaN.
pub fn same_value_zero(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_print_without_fraction() {
        assert_eq!(number_to_string(0.0), "0");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-8123.0), "-8123");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
    }

    #[test]
    fn test_fractions_and_exponents() {
        assert_eq!(number_to_string(32.3), "32.3");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(0.0000001), "1e-7");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e300), "1.5e+300");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  12 "), 12.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
        assert_eq!(string_to_number(".5"), 0.5);
    }

    #[test]
    fn test_relative_index_clamps() {
        assert_eq!(relative_index(Some(-2.0), 3, 0), 1);
        assert_eq!(relative_index(Some(-10.0), 3, 0), 0);
        assert_eq!(relative_index(Some(10.0), 3, 0), 3);
        assert_eq!(relative_index(Some(f64::NAN), 3, 3), 0);
        assert_eq!(relative_index(None, 3, 3), 3);
        assert_eq!(relative_index(Some(f64::NEG_INFINITY), 3, 0), 0);
        assert_eq!(relative_index(Some(1.7), 3, 0), 1);
    }

    #[test]
    fn test_array_length_validation() {
        assert_eq!(array_length(3.0), Some(3));
        assert_eq!(array_length(-1.0), None);
        assert_eq!(array_length(1.5), None);
        assert_eq!(array_length(f64::NAN), None);
    }

    #[test]
    fn test_same_value_zero() {
        assert!(same_value_zero(f64::NAN, f64::NAN));
        assert!(same_value_zero(0.0, -0.0));
        assert!(!same_value_zero(1.0, 2.0));
    }
}
