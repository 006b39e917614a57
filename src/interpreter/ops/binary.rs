use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::{primitive_to_number, primitive_to_string, to_int32, to_uint32, Hint};
use crate::memory::heap::FunctionObject;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, BinOp, SourceLocation};
use std::cmp::Ordering;
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn evaluate_binary_op(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let left_val = self.evaluate_expr(left)?;
        let right_val = self.evaluate_expr(right)?;
        self.current_location = location;
        self.binary_op(op, &left_val, &right_val, location)
    }

    /// Apply a binary operator to two evaluated operands
    pub(crate) fn binary_op(
        &mut self,
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            BinOp::Add => self.add(left, right, location),
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Exp => {
                let a = self.to_number(left, location)?;
                let b = self.to_number(right, location)?;
                Ok(Value::Number(arithmetic(op, a, b)))
            }
            BinOp::StrictEq => Ok(Value::Bool(left.strict_equals(right))),
            BinOp::StrictNe => Ok(Value::Bool(!left.strict_equals(right))),
            BinOp::Eq => Ok(Value::Bool(self.loose_equals(left, right, location)?)),
            BinOp::Ne => Ok(Value::Bool(!self.loose_equals(left, right, location)?)),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let ordering = self.compare(left, right, location)?;
                let result = match (op, ordering) {
                    (_, None) => false,
                    (BinOp::Lt, Some(o)) => o == Ordering::Less,
                    (BinOp::Le, Some(o)) => o != Ordering::Greater,
                    (BinOp::Gt, Some(o)) => o == Ordering::Greater,
                    (_, Some(o)) => o != Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
                let a = to_int32(self.to_number(left, location)?);
                let b = to_int32(self.to_number(right, location)?);
                let shift = (b as u32) & 31;
                let result = match op {
                    BinOp::BitAnd => a & b,
                    BinOp::BitOr => a | b,
                    BinOp::BitXor => a ^ b,
                    BinOp::Shl => a.wrapping_shl(shift),
                    _ => a >> shift,
                };
                Ok(Value::Number(f64::from(result)))
            }
            BinOp::UShr => {
                let a = to_uint32(self.to_number(left, location)?);
                let b = to_uint32(self.to_number(right, location)?) & 31;
                Ok(Value::Number(f64::from(a >> b)))
            }
            BinOp::In => {
                let Some(id) = right.as_object() else {
                    let key = self.to_js_string(left, location)?;
                    let shown = self.inspector().inspect(right);
                    return Err(RuntimeError::type_error(
                        format!("Cannot use 'in' operator to search for '{}' in {}", key, shown),
                        location,
                    ));
                };
                let key = self.to_property_key(left, location)?;
                Ok(Value::Bool(self.has_property(id, &key)))
            }
            BinOp::InstanceOf => self.instance_of(left, right, location).map(Value::Bool),
        }
    }

    /// `+`: string concatenation if either primitive is a string, else numeric addition
    fn add(
        &mut self,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let (Value::Number(a), Value::Number(b)) = (left, right) {
            return Ok(Value::Number(a + b));
        }
        let a = self.to_primitive(left, Hint::Default, location)?;
        let b = self.to_primitive(right, Hint::Default, location)?;
        if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
            let a = primitive_to_string(&a).unwrap_or_else(|| Rc::from(""));
            let b = primitive_to_string(&b).unwrap_or_else(|| Rc::from(""));
            let mut joined = String::new();
            self.push_str_checked(&mut joined, &a, location)?;
            self.push_str_checked(&mut joined, &b, location)?;
            return Ok(Value::from(joined));
        }
        Ok(Value::Number(primitive_to_number(&a) + primitive_to_number(&b)))
    }

    /// Abstract relational comparison; `None` when either side is `NaN`
    fn compare(
        &mut self,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Option<Ordering>, RuntimeError> {
        let a = self.to_primitive(left, Hint::Number, location)?;
        let b = self.to_primitive(right, Hint::Number, location)?;
        if let (Value::String(x), Value::String(y)) = (&a, &b) {
            // Strings compare by UTF-16 code units
            return Ok(Some(x.encode_utf16().cmp(y.encode_utf16())));
        }
        let x = primitive_to_number(&a);
        let y = primitive_to_number(&b);
        Ok(x.partial_cmp(&y))
    }

    /// `value instanceof ctor`
    pub(crate) fn instance_of(
        &mut self,
        value: &Value,
        ctor: &Value,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        if !self.is_callable(ctor) {
            return Err(RuntimeError::type_error(
                "Right-hand side of 'instanceof' is not callable",
                location,
            ));
        }
        let mut ctor = ctor.clone();
        while let Some(FunctionObject::Bound { target, .. }) = ctor
            .as_object()
            .and_then(|id| self.heap.get(id).as_function())
        {
            ctor = Value::Object(*target);
        }

        let Some(id) = value.as_object() else {
            return Ok(false);
        };
        match self.get_property(&ctor, "prototype", location)? {
            Value::Object(proto) => Ok(self.heap.inherits_from(id, proto)),
            _ => Err(RuntimeError::type_error(
                "Function has non-object prototype in instanceof check",
                location,
            )),
        }
    }
}

/// Numeric operators on already converted operands
pub(crate) fn arithmetic(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        // Rust's `%` truncates like JavaScript's remainder operator
        BinOp::Mod => a % b,
        BinOp::Exp => power(a, b),
        _ => a + b,
    }
}

/// `**` / `Math.pow`: like `powf` except `(±1) ** ±Infinity` and `1 ** NaN` are `NaN`
pub(crate) fn power(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    if base.abs() == 1.0 && exponent.is_infinite() {
        return f64::NAN;
    }
    base.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_edge_cases() {
        assert_eq!(arithmetic(BinOp::Mod, -7.0, 3.0), -1.0);
        assert!(arithmetic(BinOp::Mod, 5.0, 0.0).is_nan());
        assert_eq!(arithmetic(BinOp::Div, 1.0, 0.0), f64::INFINITY);
        assert_eq!(arithmetic(BinOp::Exp, 2.0, 10.0), 1024.0);
        assert!(power(1.0, f64::INFINITY).is_nan());
        assert!(power(1.0, f64::NAN).is_nan());
        assert_eq!(power(f64::NAN, 0.0), 1.0);
    }
}
