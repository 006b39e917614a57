//! Number ↔ string conversions with JavaScript semantics
//!
//! Rust's float formatting already produces the shortest round-tripping digit
//! string; these helpers only rearrange those digits into the layout
//! `Number.prototype.toString` specifies (plain decimal between `1e-7` and
//! `1e21`, exponent form outside), and implement `toFixed`, `toPrecision`,
//! radix conversion and `StringToNumber`.

/// `Number.prototype.toString()` / `String(n)`
pub fn number_to_string(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if x < 0.0 {
        return format!("-{}", number_to_string(-x));
    }

    let (digits, exponent) = shortest_digits(x);
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 >= 0 { '+' } else { '-' };
        let e = (n - 1).abs();
        if k == 1 {
            format!("{}e{}{}", digits, sign, e)
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], sign, e)
        }
    }
}

/// Shortest round-trip decimal digits of a positive finite number and the
/// decimal exponent of the first digit.
fn shortest_digits(x: f64) -> (String, i32) {
    let repr = format!("{:e}", x);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
            (digits, exponent.parse().unwrap_or(0))
        }
        None => (repr, 0),
    }
}

/// `Number.prototype.toString(radix)` for radix 2..=36
pub fn number_to_radix_string(x: f64, radix: u32) -> String {
    if radix == 10 || !x.is_finite() {
        return number_to_string(x);
    }
    if x < 0.0 {
        return format!("-{}", number_to_radix_string(-x, radix));
    }

    let base = radix as f64;
    let mut int_part = x.trunc();
    let mut frac = x - int_part;

    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let digit = (int_part % base) as u32;
        int_digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        int_part = (int_part / base).trunc();
    }
    int_digits.reverse();

    let mut result: String = int_digits.into_iter().collect();
    if frac > 0.0 {
        result.push('.');
        let mut count = 0;
        while frac > 0.0 && count < 52 {
            frac *= base;
            let digit = frac.trunc();
            result.push(std::char::from_digit(digit as u32, radix).unwrap_or('0'));
            frac -= digit;
            count += 1;
        }
    }
    result
}

/// `Number.prototype.toFixed(digits)`; `digits` is already range checked.
///
/// Rounds half away from zero on the exact binary value, so `(2.5).toFixed(0)`
/// is `"3"` while `(1.005).toFixed(2)` is `"1.00"`.
pub fn to_fixed(x: f64, digits: usize) -> String {
    if !x.is_finite() || x.abs() >= 1e21 {
        return number_to_string(x);
    }

    let negative = x < 0.0;
    // 30 extra digits reach past any tie a double in this range can express
    let exact = format!("{:.*}", digits + 30, x.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((&exact, ""));
    let (kept, dropped) = frac_part.split_at(digits.min(frac_part.len()));

    let mut number: Vec<u8> = int_part.bytes().chain(kept.bytes()).collect();
    if dropped.as_bytes().first().is_some_and(|d| *d >= b'5') {
        increment_decimal(&mut number);
    }

    let int_len = number.len() - kept.len();
    let mut result = String::with_capacity(number.len() + 2);
    if negative {
        result.push('-');
    }
    result.push_str(&String::from_utf8_lossy(&number[..int_len]));
    if digits > 0 {
        result.push('.');
        result.push_str(&String::from_utf8_lossy(&number[int_len..]));
    }
    result
}

/// Add one unit in the last place to a string of ASCII digits
fn increment_decimal(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

/// `Number.prototype.toPrecision(precision)`; `precision` is already range checked.
pub fn to_precision(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return number_to_string(x);
    }
    if x == 0.0 {
        return if precision > 1 {
            format!("0.{}", "0".repeat(precision - 1))
        } else {
            "0".to_string()
        };
    }

    let sign = if x < 0.0 { "-" } else { "" };
    let repr = format!("{:.*e}", precision - 1, x.abs());
    let (mantissa, exponent) = repr.split_once('e').unwrap_or((&repr, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let p = precision as i32;

    if exponent < -6 || exponent >= p {
        let e_sign = if exponent >= 0 { '+' } else { '-' };
        if digits.len() == 1 {
            return format!("{}{}e{}{}", sign, digits, e_sign, exponent.abs());
        }
        return format!(
            "{}{}.{}e{}{}",
            sign,
            &digits[..1],
            &digits[1..],
            e_sign,
            exponent.abs()
        );
    }

    if exponent == p - 1 {
        return format!("{}{}", sign, digits);
    }
    if exponent >= 0 {
        let split = (exponent + 1) as usize;
        return format!("{}{}.{}", sign, &digits[..split], &digits[split..]);
    }
    format!(
        "{}0.{}{}",
        sign,
        "0".repeat((-exponent - 1) as usize),
        digits
    )
}

/// JavaScript whitespace and line terminators, as trimmed by `Number()` and `trim()`
pub fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// `StringToNumber`: the conversion behind `Number("...")` and unary `+`
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let prefixed = |prefix: [&str; 2], radix: u32| -> Option<f64> {
        let rest = trimmed
            .strip_prefix(prefix[0])
            .or_else(|| trimmed.strip_prefix(prefix[1]))?;
        if rest.is_empty() {
            return Some(f64::NAN);
        }
        let mut value = 0f64;
        for c in rest.chars() {
            match c.to_digit(radix) {
                Some(d) => value = value * radix as f64 + d as f64,
                None => return Some(f64::NAN),
            }
        }
        Some(value)
    };

    if let Some(v) = prefixed(["0x", "0X"], 16)
        .or_else(|| prefixed(["0o", "0O"], 8))
        .or_else(|| prefixed(["0b", "0B"], 2))
    {
        return v;
    }

    if decimal_literal_len(trimmed) == Some(trimmed.len()) {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// `parseFloat`: longest decimal prefix after leading whitespace
pub fn parse_float(s: &str) -> f64 {
    let trimmed = s.trim_start_matches(is_js_whitespace);
    for (literal, value) in [
        ("Infinity", f64::INFINITY),
        ("+Infinity", f64::INFINITY),
        ("-Infinity", f64::NEG_INFINITY),
    ] {
        if trimmed.starts_with(literal) {
            return value;
        }
    }

    match decimal_literal_len(trimmed) {
        Some(len) => trimmed[..len].parse::<f64>().unwrap_or(f64::NAN),
        None => f64::NAN,
    }
}

/// `parseInt(string, radix)`; a radix of 0 means "detect", as when omitted
pub fn parse_int(s: &str, radix: i32) -> f64 {
    let mut rest = s.trim_start_matches(is_js_whitespace);
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let mut radix = radix;
    let has_hex_prefix = rest.starts_with("0x") || rest.starts_with("0X");
    if radix == 0 {
        radix = if has_hex_prefix { 16 } else { 10 };
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    if radix == 16 && has_hex_prefix {
        rest = &rest[2..];
    }

    let mut value = 0f64;
    let mut any = false;
    for c in rest.chars() {
        match c.to_digit(radix as u32) {
            Some(d) => {
                value = value * radix as f64 + d as f64;
                any = true;
            }
            None => break,
        }
    }

    if any {
        sign * value
    } else {
        f64::NAN
    }
}

/// Length of the longest prefix of `s` forming a signed decimal literal
/// (`-12.5e3`, `.5`, `7.`), or `None` when no digits are present.
fn decimal_literal_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digit_count = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if digit_count > 0 || j > frac_start {
            digit_count += j - frac_start;
            i = j;
        }
    }

    if digit_count == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    Some(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string_layouts() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-42.0), "-42");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(123456789012.0), "123456789012");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e21), "1.5e+21");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(1.25e-7), "1.25e-7");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_radix_conversion() {
        assert_eq!(number_to_radix_string(255.0, 16), "ff");
        assert_eq!(number_to_radix_string(5.0, 2), "101");
        assert_eq!(number_to_radix_string(-8.0, 8), "-10");
        assert_eq!(number_to_radix_string(0.5, 2), "0.1");
        assert_eq!(number_to_radix_string(35.0, 36), "z");
    }

    #[test]
    fn test_to_fixed_rounding() {
        assert_eq!(to_fixed(3.14159, 2), "3.14");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(1.45, 1), "1.4");
        assert_eq!(to_fixed(9.995, 2), "9.99");
        assert_eq!(to_fixed(99.5, 0), "100");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_fixed(0.0, 2), "0.00");
        assert_eq!(to_fixed(1e21, 2), "1e+21");
    }

    #[test]
    fn test_to_precision() {
        assert_eq!(to_precision(123.456, 4), "123.5");
        assert_eq!(to_precision(0.000123, 2), "0.00012");
        assert_eq!(to_precision(123456.0, 2), "1.2e+5");
        assert_eq!(to_precision(1.0, 3), "1.00");
        assert_eq!(to_precision(0.0, 3), "0.00");
        assert_eq!(to_precision(1e-7, 1), "1e-7");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  42  "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("-1.5e3"), -1500.0);
        assert_eq!(string_to_number(".5"), 0.5);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("-0x10").is_nan());
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42px", 0), 42.0);
        assert_eq!(parse_int("  -0x1f", 0), -31.0);
        assert_eq!(parse_int("101", 2), 5.0);
        assert_eq!(parse_int("3.9", 10), 3.0);
        assert!(parse_int("z", 10).is_nan());
        assert!(parse_int("10", 40).is_nan());
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float("  -2e2px"), -200.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert!(parse_float("abc").is_nan());
        assert!(parse_float(".").is_nan());
    }
}
