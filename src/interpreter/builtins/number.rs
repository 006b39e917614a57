//! `Number`, `Boolean`, `Math` and the numeric globals
//!
//! `new Number(x)` and `new Boolean(x)` produce primitives; wrapper objects
//! are not modelled.

use super::arg;
use crate::inspect::number::{
    number_to_radix_string, number_to_string, parse_float, parse_int, to_fixed, to_precision,
};
use crate::interpreter::constants::MAX_SAFE_INTEGER;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::power;
use crate::interpreter::type_system::{to_boolean, to_int32, to_uint32};
use crate::memory::heap::NativeFn;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;

type NativeResult = Result<Value, RuntimeError>;

pub(super) fn install(interp: &mut Interpreter) {
    install_number(interp);
    install_boolean(interp);
    install_math(interp);

    let globals: [(&'static str, usize, NativeFn); 4] = [
        ("parseInt", 2, global_parse_int),
        ("parseFloat", 1, global_parse_float),
        ("isNaN", 1, global_is_nan),
        ("isFinite", 1, global_is_finite),
    ];
    for (name, length, call) in globals {
        let function = interp.native_function(name, length, call, false);
        interp.define_global(name, Value::Object(function));
    }
}

fn install_number(interp: &mut Interpreter) {
    let proto = interp.realm.number_prototype;
    let ctor = interp.define_constructor("Number", 1, number_constructor, proto);

    let constants = [
        ("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER),
        ("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER),
        ("EPSILON", f64::EPSILON),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ];
    for (name, value) in constants {
        interp.define_value(ctor, name, Value::Number(value));
    }

    interp.define_method(ctor, "isInteger", 1, number_is_integer);
    interp.define_method(ctor, "isSafeInteger", 1, number_is_safe_integer);
    interp.define_method(ctor, "isFinite", 1, number_is_finite);
    interp.define_method(ctor, "isNaN", 1, number_is_nan);
    interp.define_method(ctor, "parseFloat", 1, global_parse_float);
    interp.define_method(ctor, "parseInt", 2, global_parse_int);

    interp.define_method(proto, "toFixed", 1, number_to_fixed);
    interp.define_method(proto, "toString", 1, number_to_string_method);
    interp.define_method(proto, "toPrecision", 1, number_to_precision);
    interp.define_method(proto, "toLocaleString", 0, number_to_locale_string);
    interp.define_method(proto, "valueOf", 0, number_value_of);
}

fn install_boolean(interp: &mut Interpreter) {
    let proto = interp.realm.boolean_prototype;
    interp.define_constructor("Boolean", 1, boolean_constructor, proto);
    interp.define_method(proto, "toString", 0, boolean_to_string);
    interp.define_method(proto, "valueOf", 0, boolean_value_of);
}

// ========== Number ==========

fn number_constructor(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    match args.first() {
        None => Ok(Value::Number(0.0)),
        Some(value) => Ok(Value::Number(interp.to_number(value, location)?)),
    }
}

/// The numeric argument of a `Number.isX` predicate, without coercion
fn number_arg(args: &[Value]) -> Option<f64> {
    args.first().and_then(Value::as_number)
}

fn number_is_integer(
    _interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    let yes = number_arg(args).is_some_and(|n| n.is_finite() && n.trunc() == n);
    Ok(Value::Bool(yes))
}

fn number_is_safe_integer(
    _interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    let yes = number_arg(args)
        .is_some_and(|n| n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER);
    Ok(Value::Bool(yes))
}

fn number_is_finite(
    _interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    Ok(Value::Bool(number_arg(args).is_some_and(f64::is_finite)))
}

fn number_is_nan(
    _interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    Ok(Value::Bool(number_arg(args).is_some_and(f64::is_nan)))
}

fn this_number(this: &Value, method: &str, location: SourceLocation) -> Result<f64, RuntimeError> {
    this.as_number().ok_or_else(|| {
        RuntimeError::type_error(
            format!("Number.prototype.{} requires that 'this' be a Number", method),
            location,
        )
    })
}

/// Optional integer argument checked against an inclusive range
fn digits_arg(
    interp: &mut Interpreter,
    args: &[Value],
    range: std::ops::RangeInclusive<f64>,
    message: &str,
    location: SourceLocation,
) -> Result<Option<usize>, RuntimeError> {
    let value = arg(args, 0);
    if value.is_undefined() {
        return Ok(None);
    }
    let n = interp.to_integer_value(&value, location)?;
    if !range.contains(&n) {
        return Err(RuntimeError::range_error(message, location));
    }
    Ok(Some(n as usize))
}

fn number_to_fixed(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let x = this_number(this, "toFixed", location)?;
    let digits = digits_arg(
        interp,
        args,
        0.0..=100.0,
        "toFixed() digits argument must be between 0 and 100",
        location,
    )?;
    Ok(Value::from(to_fixed(x, digits.unwrap_or(0))))
}

fn number_to_string_method(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let x = this_number(this, "toString", location)?;
    let radix = digits_arg(
        interp,
        args,
        2.0..=36.0,
        "toString() radix must be between 2 and 36",
        location,
    )?;
    Ok(Value::from(number_to_radix_string(x, radix.unwrap_or(10) as u32)))
}

fn number_to_precision(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let x = this_number(this, "toPrecision", location)?;
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    let precision = digits_arg(
        interp,
        args,
        1.0..=100.0,
        "toPrecision() argument must be between 1 and 100",
        location,
    )?;
    Ok(Value::from(match precision {
        Some(p) => to_precision(x, p),
        None => number_to_string(x),
    }))
}

/// `en-US` style: thousands separators, at most three fraction digits
fn number_to_locale_string(
    _interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let x = this_number(this, "toLocaleString", location)?;
    Ok(Value::from(locale_format(x)))
}

fn locale_format(x: f64) -> String {
    if !x.is_finite() {
        return if x.is_nan() { "NaN" } else if x > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    let fixed = to_fixed(x.abs(), 3);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if x < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

fn number_value_of(
    _interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    Ok(Value::Number(this_number(this, "valueOf", location)?))
}

// ========== Boolean ==========

fn boolean_constructor(
    _interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    Ok(Value::Bool(to_boolean(&arg(args, 0))))
}

fn this_boolean(this: &Value, method: &str, location: SourceLocation) -> Result<bool, RuntimeError> {
    match this {
        Value::Bool(b) => Ok(*b),
        _ => Err(RuntimeError::type_error(
            format!("Boolean.prototype.{} requires that 'this' be a Boolean", method),
            location,
        )),
    }
}

fn boolean_to_string(
    _interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let b = this_boolean(this, "toString", location)?;
    Ok(Value::str(if b { "true" } else { "false" }))
}

fn boolean_value_of(
    _interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    Ok(Value::Bool(this_boolean(this, "valueOf", location)?))
}

// ========== Globals ==========

fn global_parse_int(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let text = interp.to_js_string(&arg(args, 0), location)?;
    let radix = match arg(args, 1) {
        Value::Undefined => 0,
        other => to_int32(interp.to_number(&other, location)?),
    };
    Ok(Value::Number(parse_int(&text, radix)))
}

fn global_parse_float(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let text = interp.to_js_string(&arg(args, 0), location)?;
    Ok(Value::Number(parse_float(&text)))
}

fn global_is_nan(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    Ok(Value::Bool(interp.to_number(&arg(args, 0), location)?.is_nan()))
}

fn global_is_finite(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    Ok(Value::Bool(interp.to_number(&arg(args, 0), location)?.is_finite()))
}

// ========== Math ==========

/// Defines a `Math` function of one coerced numeric argument
macro_rules! math_unary {
    ($($name:ident => $op:expr;)*) => {
        $(
            fn $name(
                interp: &mut Interpreter,
                _this: &Value,
                args: &[Value],
                location: SourceLocation,
            ) -> NativeResult {
                let x = interp.to_number(&arg(args, 0), location)?;
                let op: fn(f64) -> f64 = $op;
                Ok(Value::Number(op(x)))
            }
        )*
    };
}

math_unary! {
    math_abs => f64::abs;
    math_floor => f64::floor;
    math_ceil => f64::ceil;
    math_round => js_round;
    math_trunc => f64::trunc;
    math_sign => js_sign;
    math_sqrt => f64::sqrt;
    math_cbrt => f64::cbrt;
    math_log => f64::ln;
    math_log2 => f64::log2;
    math_log10 => f64::log10;
    math_log1p => f64::ln_1p;
    math_exp => f64::exp;
    math_expm1 => f64::exp_m1;
    math_sin => f64::sin;
    math_cos => f64::cos;
    math_tan => f64::tan;
    math_asin => f64::asin;
    math_acos => f64::acos;
    math_atan => f64::atan;
    math_sinh => f64::sinh;
    math_cosh => f64::cosh;
    math_tanh => f64::tanh;
    math_fround => |x| x as f32 as f64;
    math_clz32 => |x| to_uint32(x).leading_zeros() as f64;
}

fn install_math(interp: &mut Interpreter) {
    let math = interp.define_namespace("Math");
    let constants = [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("SQRT2", std::f64::consts::SQRT_2),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
    ];
    for (name, value) in constants {
        interp.define_value(math, name, Value::Number(value));
    }

    let functions: [(&'static str, usize, NativeFn); 33] = [
        ("abs", 1, math_abs),
        ("floor", 1, math_floor),
        ("ceil", 1, math_ceil),
        ("round", 1, math_round),
        ("trunc", 1, math_trunc),
        ("sign", 1, math_sign),
        ("sqrt", 1, math_sqrt),
        ("cbrt", 1, math_cbrt),
        ("log", 1, math_log),
        ("log2", 1, math_log2),
        ("log10", 1, math_log10),
        ("log1p", 1, math_log1p),
        ("exp", 1, math_exp),
        ("expm1", 1, math_expm1),
        ("sin", 1, math_sin),
        ("cos", 1, math_cos),
        ("tan", 1, math_tan),
        ("asin", 1, math_asin),
        ("acos", 1, math_acos),
        ("atan", 1, math_atan),
        ("sinh", 1, math_sinh),
        ("cosh", 1, math_cosh),
        ("tanh", 1, math_tanh),
        ("fround", 1, math_fround),
        ("clz32", 1, math_clz32),
        ("pow", 2, math_pow),
        ("atan2", 2, math_atan2),
        ("imul", 2, math_imul),
        ("min", 2, math_min),
        ("max", 2, math_max),
        ("hypot", 2, math_hypot),
        ("random", 0, math_random),
        ("toString", 0, math_to_string),
    ];
    for (name, length, call) in functions {
        interp.define_method(math, name, length, call);
    }
}

/// Round half up, keeping `-0` for inputs in `[-0.5, 0)`
fn js_round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    let rounded = (x + 0.5).floor();
    if rounded == 0.0 && x < 0.0 {
        -0.0
    } else {
        rounded
    }
}

fn js_sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 {
        x
    } else {
        x.signum()
    }
}

/// Both arguments coerced to numbers
fn two_numbers(
    interp: &mut Interpreter,
    args: &[Value],
    location: SourceLocation,
) -> Result<(f64, f64), RuntimeError> {
    let a = interp.to_number(&arg(args, 0), location)?;
    let b = interp.to_number(&arg(args, 1), location)?;
    Ok((a, b))
}

fn math_pow(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let (base, exponent) = two_numbers(interp, args, location)?;
    Ok(Value::Number(power(base, exponent)))
}

fn math_atan2(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let (y, x) = two_numbers(interp, args, location)?;
    Ok(Value::Number(y.atan2(x)))
}

fn math_imul(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let (a, b) = two_numbers(interp, args, location)?;
    Ok(Value::Number(to_int32(a).wrapping_mul(to_int32(b)) as f64))
}

fn all_numbers(
    interp: &mut Interpreter,
    args: &[Value],
    location: SourceLocation,
) -> Result<Vec<f64>, RuntimeError> {
    args.iter()
        .map(|value| interp.to_number(value, location))
        .collect()
}

fn math_min(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let mut result = f64::INFINITY;
    for n in all_numbers(interp, args, location)? {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        // -0 is smaller than +0
        if n < result || (n == 0.0 && result == 0.0 && n.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

fn math_max(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let mut result = f64::NEG_INFINITY;
    for n in all_numbers(interp, args, location)? {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n > result || (n == 0.0 && result == 0.0 && n.is_sign_positive()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

fn math_hypot(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> NativeResult {
    let numbers = all_numbers(interp, args, location)?;
    if numbers.iter().any(|n| n.is_infinite()) {
        return Ok(Value::Number(f64::INFINITY));
    }
    let sum: f64 = numbers.iter().map(|n| n * n).sum();
    Ok(Value::Number(sum.sqrt()))
}

fn math_random(
    _interp: &mut Interpreter,
    _this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    Ok(Value::Number(rand::random::<f64>()))
}

fn math_to_string(
    _interp: &mut Interpreter,
    _this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> NativeResult {
    Ok(Value::str("[object Math]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_round() {
        assert_eq!(js_round(2.5), 3.0);
        assert_eq!(js_round(-2.5), -2.0);
        assert_eq!(js_round(-0.4), 0.0);
        assert!(js_round(-0.4).is_sign_negative());
        assert_eq!(js_round(1e300), 1e300);
        assert!(js_round(f64::NAN).is_nan());
    }

    #[test]
    fn test_js_sign() {
        assert_eq!(js_sign(-3.0), -1.0);
        assert_eq!(js_sign(7.5), 1.0);
        assert!(js_sign(-0.0).is_sign_negative());
    }

    #[test]
    fn test_locale_format() {
        assert_eq!(locale_format(1234567.891), "1,234,567.891");
        assert_eq!(locale_format(1000.0), "1,000");
        assert_eq!(locale_format(-42.5), "-42.5");
        assert_eq!(locale_format(0.1 + 0.2), "0.3");
        assert_eq!(locale_format(999.0), "999");
    }
}
