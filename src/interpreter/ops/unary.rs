use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::{to_boolean, to_int32};
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, SourceLocation, UnOp};

impl Interpreter {
    pub(crate) fn evaluate_unary_op(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            // `typeof undeclared` is "undefined", not a ReferenceError
            UnOp::TypeOf => {
                if let AstNode::Identifier(name, _) = operand {
                    if !self.is_declared(name) {
                        return Ok(Value::str("undefined"));
                    }
                }
                let value = self.evaluate_expr(operand)?;
                Ok(Value::str(self.type_of(&value)))
            }
            UnOp::Delete => self.evaluate_delete(operand, location),
            _ => {
                let value = self.evaluate_expr(operand)?;
                self.current_location = location;
                match op {
                    UnOp::Neg => Ok(Value::Number(-self.to_number(&value, location)?)),
                    UnOp::Plus => Ok(Value::Number(self.to_number(&value, location)?)),
                    UnOp::Not => Ok(Value::Bool(!to_boolean(&value))),
                    UnOp::BitNot => {
                        let n = to_int32(self.to_number(&value, location)?);
                        Ok(Value::Number(f64::from(!n)))
                    }
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }

    fn evaluate_delete(
        &mut self,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let deleted = match operand {
            AstNode::MemberAccess { object, member, .. } => {
                let target = self.evaluate_expr(object)?;
                self.delete_property(&target, member, location)?
            }
            AstNode::IndexAccess { object, index, .. } => {
                let target = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                let key = self.to_property_key(&key, location)?;
                self.delete_property(&target, &key, location)?
            }
            // Bindings cannot be deleted
            AstNode::Identifier(..) => false,
            other => {
                self.evaluate_expr(other)?;
                true
            }
        };
        Ok(Value::Bool(deleted))
    }

    /// `++x`, `x++`, `--x`, `x--`
    pub(crate) fn evaluate_update(
        &mut self,
        increment: bool,
        prefix: bool,
        target: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let delta = if increment { 1.0 } else { -1.0 };

        let (old, new) = match target {
            AstNode::Identifier(name, loc) => {
                let current = self.lookup_variable(name, *loc)?;
                let old = self.to_number(&current, location)?;
                self.assign_variable(name, Value::Number(old + delta), *loc)?;
                (old, old + delta)
            }
            AstNode::MemberAccess { object, member, .. } => {
                let base = self.evaluate_expr(object)?;
                let current = self.get_property(&base, member, location)?;
                let old = self.to_number(&current, location)?;
                self.set_property(&base, member.clone(), Value::Number(old + delta), location)?;
                (old, old + delta)
            }
            AstNode::IndexAccess { object, index, .. } => {
                let base = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                let current = self.get_index(&base, &key, location)?;
                let old = self.to_number(&current, location)?;
                self.set_index(&base, &key, Value::Number(old + delta), location)?;
                (old, old + delta)
            }
            _ => {
                return Err(RuntimeError::syntax_error(
                    "Invalid left-hand side expression in postfix operation",
                    location,
                ))
            }
        };

        Ok(Value::Number(if prefix { new } else { old }))
    }
}
