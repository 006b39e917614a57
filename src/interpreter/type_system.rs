//! Type conversions and type tests
//!
//! This module implements the abstract conversions every operator relies on:
//!
//! - `ToPrimitive`: objects call `valueOf`/`toString` (order set by the hint)
//! - `ToNumber` / `ToString` / `ToBoolean` / `ToPropertyKey`
//! - `typeof` and the `==` comparison algorithm
//!
//! # Conversion Rules
//!
//! - `undefined` → `NaN`, `null` → `0`, booleans → `0`/`1`
//! - Strings are parsed with `StringToNumber` (whitespace trimmed, `""` → `0`)
//! - Objects convert through their primitive value, so `[5] * 2 === 10`
//!   and `String([1, 2]) === "1,2"`

use crate::inspect::number::{number_to_string, string_to_number};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::ObjectKind;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use std::rc::Rc;

/// Preferred result type of `ToPrimitive`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Default,
    Number,
    String,
}

/// `ToBoolean`
pub(crate) fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => !(n.is_nan() || *n == 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) => true,
    }
}

/// `ToString` for primitives; `None` for objects, which need the interpreter
pub(crate) fn primitive_to_string(value: &Value) -> Option<Rc<str>> {
    match value {
        Value::Undefined => Some(Rc::from("undefined")),
        Value::Null => Some(Rc::from("null")),
        Value::Bool(b) => Some(Rc::from(if *b { "true" } else { "false" })),
        Value::Number(n) => Some(Rc::from(number_to_string(*n))),
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => None,
    }
}

/// `ToNumber` for primitives
pub(crate) fn primitive_to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Object(_) => f64::NAN,
    }
}

/// `ToInt32`
pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// `ToUint32`
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let modulo = n.trunc().rem_euclid(4_294_967_296.0);
    modulo as u32
}

/// `ToIntegerOrInfinity` on an already converted number
pub(crate) fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolve a relative index (negative counts from the end) into `0..=len`
pub(crate) fn relative_index(n: f64, len: usize) -> usize {
    let n = to_integer(n);
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

impl Interpreter {
    /// `ToPrimitive`
    pub(crate) fn to_primitive(
        &mut self,
        value: &Value,
        hint: Hint,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if value.as_object().is_none() {
            return Ok(value.clone());
        }

        let order = if hint == Hint::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for method_name in order {
            let method = self.get_property(value, method_name, location)?;
            if self.is_callable(&method) {
                let result = self.call_function(&method, value.clone(), Vec::new(), location)?;
                if result.as_object().is_none() {
                    return Ok(result);
                }
            }
        }
        Err(RuntimeError::type_error(
            "Cannot convert object to primitive value",
            location,
        ))
    }

    /// `ToNumber`
    pub(crate) fn to_number(
        &mut self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<f64, RuntimeError> {
        match value {
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Hint::Number, location)?;
                Ok(primitive_to_number(&primitive))
            }
            other => Ok(primitive_to_number(other)),
        }
    }

    /// `ToString`
    pub(crate) fn to_js_string(
        &mut self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Rc<str>, RuntimeError> {
        if let Some(s) = primitive_to_string(value) {
            return Ok(s);
        }
        let primitive = self.to_primitive(value, Hint::String, location)?;
        Ok(primitive_to_string(&primitive).unwrap_or_else(|| Rc::from("")))
    }

    /// `ToPropertyKey`
    pub(crate) fn to_property_key(
        &mut self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Rc<str>, RuntimeError> {
        self.to_js_string(value, location)
    }

    /// `ToIntegerOrInfinity` of an argument
    pub(crate) fn to_integer_value(
        &mut self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<f64, RuntimeError> {
        Ok(to_integer(self.to_number(value, location)?))
    }

    /// The `typeof` operator
    pub(crate) fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(id) => match self.heap.get(*id).kind {
                ObjectKind::Function(_) => "function",
                _ => "object",
            },
        }
    }

    /// The `==` operator
    pub(crate) fn loose_equals(
        &mut self,
        a: &Value,
        b: &Value,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        match (a, b) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => Ok(false),
            (Value::Number(_), Value::String(s)) => {
                Ok(a.strict_equals(&Value::Number(string_to_number(s))))
            }
            (Value::String(s), Value::Number(_)) => {
                Ok(Value::Number(string_to_number(s)).strict_equals(b))
            }
            (Value::Bool(x), _) => {
                let n = Value::Number(f64::from(u8::from(*x)));
                self.loose_equals(&n, b, location)
            }
            (_, Value::Bool(y)) => {
                let n = Value::Number(f64::from(u8::from(*y)));
                self.loose_equals(a, &n, location)
            }
            (Value::Object(_), Value::Number(_) | Value::String(_)) => {
                let primitive = self.to_primitive(a, Hint::Default, location)?;
                self.loose_equals(&primitive, b, location)
            }
            (Value::Number(_) | Value::String(_), Value::Object(_)) => {
                let primitive = self.to_primitive(b, Hint::Default, location)?;
                self.loose_equals(a, &primitive, location)
            }
            _ => Ok(a.strict_equals(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!to_boolean(&Value::Number(f64::NAN)));
        assert!(!to_boolean(&Value::Number(-0.0)));
        assert!(!to_boolean(&Value::str("")));
        assert!(to_boolean(&Value::str("0")));
        assert!(to_boolean(&Value::Object(crate::memory::value::ObjectId(0))));
    }

    #[test]
    fn test_int32_wraparound() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(2_147_483_648.0), -2_147_483_648);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn test_relative_index() {
        assert_eq!(relative_index(-1.0, 5), 4);
        assert_eq!(relative_index(-10.0, 5), 0);
        assert_eq!(relative_index(10.0, 5), 5);
        assert_eq!(relative_index(f64::NAN, 5), 0);
    }

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(primitive_to_number(&Value::str(" 12 ")), 12.0);
        assert!(primitive_to_number(&Value::Undefined).is_nan());
        assert_eq!(primitive_to_number(&Value::Null), 0.0);
        assert_eq!(
            primitive_to_string(&Value::Number(1e21)).as_deref(),
            Some("1e+21")
        );
    }
}
