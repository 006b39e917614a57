//! Expression evaluation implementation
//!
//! This module handles the evaluation of all expression types, including:
//!
//! - Literals (numbers, strings, templates, regular expressions)
//! - Array and object literals, including spread and accessors
//! - Function and class expressions
//! - Operators (delegated to [`ops`](super::ops))
//! - Calls, `new`, `super(...)` and `super.x`
//! - Optional chains
//!
//! # Implementation
//!
//! All expression evaluation methods are implemented as `pub(crate)` methods
//! on the [`Interpreter`] struct. Every expression yields a [`Value`] or a
//! [`RuntimeError`] that unwinds to the nearest `try` or to the caller.
//!
//! # Optional Chains
//!
//! A nullish base under `?.` raises the internal `OptionalShortCircuit`
//! signal; the [`AstNode::OptionalChain`] boundary turns it into `undefined`.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::to_boolean;
use crate::memory::heap::ObjectKind;
use crate::memory::scope::Binding;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::*;
use std::rc::Rc;

impl Interpreter {
    /// Evaluate an expression to a value
    pub(crate) fn evaluate_expr(&mut self, expr: &AstNode) -> Result<Value, RuntimeError> {
        match expr {
            AstNode::NumberLiteral(n, _) => Ok(Value::Number(*n)),
            AstNode::StringLiteral(s, _) => Ok(Value::String(s.clone())),
            AstNode::BoolLiteral(b, _) => Ok(Value::Bool(*b)),
            AstNode::Null { .. } => Ok(Value::Null),

            AstNode::Template {
                quasis,
                expressions,
                location,
            } => {
                let mut result = String::new();
                for (i, quasi) in quasis.iter().enumerate() {
                    self.push_str_checked(&mut result, quasi, *location)?;
                    if let Some(expr) = expressions.get(i) {
                        let value = self.evaluate_expr(expr)?;
                        let text = self.to_js_string(&value, *location)?;
                        self.push_str_checked(&mut result, &text, *location)?;
                    }
                }
                Ok(Value::from(result))
            }

            AstNode::RegExpLiteral {
                pattern,
                flags,
                location,
            } => self
                .create_regexp(pattern, flags, *location)
                .map(Value::Object),

            AstNode::Identifier(name, location) => self.lookup_variable(name, *location),

            AstNode::This { location } => self.current_this(*location),

            AstNode::ArrayLiteral { elements, location } => {
                self.evaluate_array_literal(elements, *location)
            }

            AstNode::ObjectLiteral {
                properties,
                location,
            } => self.evaluate_object_literal(properties, *location),

            AstNode::Function(function) => Ok(Value::Object(self.evaluate_function_expr(function))),

            AstNode::Class(class) => self.evaluate_class(class, None),

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => self.evaluate_binary_op(*op, left, right, *location),

            AstNode::LogicalOp {
                op, left, right, ..
            } => {
                let left_val = self.evaluate_expr(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !to_boolean(&left_val),
                    LogicalOp::Or => to_boolean(&left_val),
                    LogicalOp::Nullish => !left_val.is_nullish(),
                };
                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate_expr(right)
                }
            }

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => self.evaluate_unary_op(*op, operand, *location),

            AstNode::Update {
                increment,
                prefix,
                target,
                location,
            } => self.evaluate_update(*increment, *prefix, target, *location),

            AstNode::Assignment {
                op,
                target,
                value,
                location,
            } => self.evaluate_assignment(*op, target, value, *location),

            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                let cond_val = self.evaluate_expr(condition)?;
                if to_boolean(&cond_val) {
                    self.evaluate_expr(true_expr)
                } else {
                    self.evaluate_expr(false_expr)
                }
            }

            AstNode::Sequence { expressions, .. } => {
                let mut last = Value::Undefined;
                for expr in expressions {
                    last = self.evaluate_expr(expr)?;
                }
                Ok(last)
            }

            AstNode::Call {
                callee,
                args,
                optional,
                location,
            } => self.evaluate_call(callee, args, *optional, *location),

            AstNode::New {
                callee,
                args,
                location,
            } => {
                let ctor = self.evaluate_expr(callee)?;
                let args = self.evaluate_arguments(args)?;
                self.current_location = *location;
                self.construct(&ctor, args, *location)
            }

            AstNode::SuperCall { args, location } => self.evaluate_super_call(args, *location),

            AstNode::SuperMember { property, location } => {
                let this = self.current_this(*location)?;
                self.super_property(property, &this, *location)
            }

            AstNode::MemberAccess {
                object,
                member,
                optional,
                location,
            } => self.evaluate_member_access(object, member, *optional, *location),

            AstNode::IndexAccess {
                object,
                index,
                optional,
                location,
            } => self.evaluate_index_access(object, index, *optional, *location),

            AstNode::OptionalChain { expr, .. } => match self.evaluate_expr(expr) {
                Err(RuntimeError::OptionalShortCircuit { .. }) => Ok(Value::Undefined),
                other => other,
            },

            AstNode::Spread { location, .. } => Err(RuntimeError::syntax_error(
                "Unexpected token '...'",
                *location,
            )),

            other => Err(RuntimeError::syntax_error(
                "Unexpected statement in expression position",
                *other.location(),
            )),
        }
    }

    /// Evaluate call arguments, expanding `...spread` elements
    pub(crate) fn evaluate_arguments(&mut self, args: &[AstNode]) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                AstNode::Spread { expr, location } => {
                    let source = self.evaluate_expr(expr)?;
                    values.extend(self.iterate(&source, *location)?);
                }
                other => values.push(self.evaluate_expr(other)?),
            }
        }
        Ok(values)
    }

    /// Materialize the values produced by iterating `value`.
    ///
    /// Arrays yield their elements (holes as `undefined`), strings their code
    /// points, maps `[key, value]` pairs and sets their members.
    pub(crate) fn iterate(
        &mut self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        if let Value::String(s) = value {
            return Ok(s.chars().map(|c| Value::from(c.to_string())).collect());
        }
        let kind = value.as_object().map(|id| &self.heap.get(id).kind);
        match kind {
            Some(ObjectKind::Array(elements)) => Ok(elements
                .iter()
                .map(|e| e.clone().unwrap_or_default())
                .collect()),
            Some(ObjectKind::Set(items)) => Ok(items.clone()),
            Some(ObjectKind::Map(entries)) => {
                let entries = entries.clone();
                Ok(entries
                    .into_iter()
                    .map(|(k, v)| Value::Object(self.new_array(vec![k, v])))
                    .collect())
            }
            _ => {
                let shown = self.inspector().inspect(value);
                Err(RuntimeError::type_error(
                    format!("{} is not iterable", shown),
                    location,
                ))
            }
        }
    }

    fn evaluate_array_literal(
        &mut self,
        elements: &[Option<AstNode>],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut items: Vec<Option<Value>> = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                None => items.push(None),
                Some(AstNode::Spread { expr, location }) => {
                    let source = self.evaluate_expr(expr)?;
                    items.extend(self.iterate(&source, *location)?.into_iter().map(Some));
                }
                Some(expr) => items.push(Some(self.evaluate_expr(expr)?)),
            }
        }
        self.current_location = location;
        Ok(Value::Object(self.new_array_with_holes(items)))
    }

    fn evaluate_object_literal(
        &mut self,
        properties: &[ObjectProperty],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let object = self.new_object();

        for property in properties {
            match property {
                ObjectProperty::KeyValue(key, value) => {
                    let key = self.evaluate_property_key(key)?;
                    let value = self.evaluate_named(value, &key)?;
                    // `__proto__: value` in a literal sets the prototype
                    if &*key == "__proto__" && matches!(property, ObjectProperty::KeyValue(PropertyKey::Named(_), _)) {
                        match value {
                            Value::Object(proto) => self.heap.get_mut(object).prototype = Some(proto),
                            Value::Null => self.heap.get_mut(object).prototype = None,
                            _ => {}
                        }
                        continue;
                    }
                    self.define_own(object, key, value);
                }
                ObjectProperty::Shorthand(name, loc) => {
                    let value = self.lookup_variable(name, *loc)?;
                    self.define_own(object, name.clone(), value);
                }
                ObjectProperty::ShorthandDefault(_, _, loc) => {
                    return Err(RuntimeError::syntax_error(
                        "Invalid shorthand property initializer",
                        *loc,
                    ));
                }
                ObjectProperty::Method(key, function, kind) => {
                    let key = self.evaluate_property_key(key)?;
                    let scope = self.scope.clone();
                    let method = self.create_closure(function, scope, Some(object));
                    self.set_function_name(&Value::Object(method), &key);
                    match kind {
                        MethodKind::Method => self.define_own(object, key, Value::Object(method)),
                        MethodKind::Getter => {
                            self.define_accessor(object, key, Some(method), None, true)
                        }
                        MethodKind::Setter => {
                            self.define_accessor(object, key, None, Some(method), true)
                        }
                    }
                }
                ObjectProperty::Spread(expr) => {
                    let source = self.evaluate_expr(expr)?;
                    self.copy_data_properties(object, &source, location)?;
                }
            }
        }

        Ok(Value::Object(object))
    }

    /// `{...source}` / `Object.assign`: copy own enumerable properties onto `target`
    pub(crate) fn copy_data_properties(
        &mut self,
        target: ObjectId,
        source: &Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match source {
            Value::Object(id) => {
                for key in self.own_enumerable_keys(*id) {
                    let value = self.get_property(source, &key, location)?;
                    self.set_property(&Value::Object(target), key, value, location)?;
                }
            }
            Value::String(s) => {
                for (i, c) in s.chars().enumerate() {
                    self.set_property(
                        &Value::Object(target),
                        Rc::from(i.to_string()),
                        Value::from(c.to_string()),
                        location,
                    )?;
                }
            }
            // Other primitives have no own enumerable properties
            _ => {}
        }
        Ok(())
    }

    /// A function expression; a named one can refer to itself by name
    fn evaluate_function_expr(&mut self, function: &Rc<FunctionNode>) -> ObjectId {
        match (&function.name, function.kind) {
            (Some(name), FunctionKind::Normal) => {
                let saved = self.enter_scope();
                let scope = self.scope.clone();
                let id = self.create_closure(function, scope, None);
                self.scope.borrow_mut().declare(
                    name.clone(),
                    Binding {
                        value: Value::Object(id),
                        mutable: false,
                        initialized: true,
                    },
                );
                self.exit_scope(saved);
                id
            }
            _ => {
                let scope = self.scope.clone();
                self.create_closure(function, scope, None)
            }
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        optional: bool,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let (func, this) = self.evaluate_callee(callee)?;
        if optional && func.is_nullish() {
            return Err(RuntimeError::OptionalShortCircuit { location });
        }
        let args = self.evaluate_arguments(args)?;
        self.current_location = location;

        if !self.is_callable(&func) {
            return Err(RuntimeError::type_error(
                format!("{} is not a function", describe_callee(callee)),
                location,
            ));
        }
        self.call_function(&func, this, args, location)
    }

    /// Resolve a callee to the function and the `this` it is called with
    fn evaluate_callee(&mut self, callee: &AstNode) -> Result<(Value, Value), RuntimeError> {
        match callee {
            AstNode::MemberAccess {
                object,
                member,
                optional,
                location,
            } => {
                let base = self.evaluate_expr(object)?;
                if *optional && base.is_nullish() {
                    return Err(RuntimeError::OptionalShortCircuit {
                        location: *location,
                    });
                }
                let func = self.get_property(&base, member, *location)?;
                Ok((func, base))
            }
            AstNode::IndexAccess {
                object,
                index,
                optional,
                location,
            } => {
                let base = self.evaluate_expr(object)?;
                if *optional && base.is_nullish() {
                    return Err(RuntimeError::OptionalShortCircuit {
                        location: *location,
                    });
                }
                let key = self.evaluate_expr(index)?;
                let func = self.get_index(&base, &key, *location)?;
                Ok((func, base))
            }
            AstNode::SuperMember { property, location } => {
                let this = self.current_this(*location)?;
                let func = self.super_property(property, &this, *location)?;
                Ok((func, this))
            }
            other => Ok((self.evaluate_expr(other)?, Value::Undefined)),
        }
    }

    /// `super(...args)` inside a derived constructor
    fn evaluate_super_call(
        &mut self,
        args: &[AstNode],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let frame = self.current_frame(location)?;
        let (callee, this, initialized) = (frame.callee, frame.this.clone(), frame.this_initialized);
        let Some(ctor) = callee.filter(|id| self.heap.get(*id).class_info().is_some()) else {
            return Err(RuntimeError::syntax_error(
                "'super' keyword unexpected here",
                location,
            ));
        };
        if initialized {
            return Err(RuntimeError::reference_error(
                "Super constructor may only be called once",
                location,
            ));
        }

        let args = self.evaluate_arguments(args)?;
        self.current_location = location;
        self.super_construct(ctor, this, args, location)?;
        if let Some(frame) = self.call_stack.current_mut() {
            frame.this_initialized = true;
        }
        Ok(Value::Undefined)
    }

    /// `super.key`: look the property up above the current home object
    fn super_property(
        &mut self,
        key: &str,
        receiver: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let home = self.current_frame(location)?.home_object;
        let Some(home) = home else {
            return Err(RuntimeError::syntax_error(
                "'super' keyword unexpected here",
                location,
            ));
        };
        let Some(proto) = self.heap.get(home).prototype else {
            return Ok(Value::Undefined);
        };

        let found = self
            .heap
            .find_property(proto, key)
            .map(|(_, prop)| (prop.is_accessor(), prop.getter, prop.value.clone()));
        match found {
            Some((true, Some(getter), _)) => {
                self.call_function(&Value::Object(getter), receiver.clone(), Vec::new(), location)
            }
            Some((false, _, value)) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }
}

/// Source-like rendering of a callee for "x is not a function" messages
fn describe_callee(callee: &AstNode) -> String {
    match callee {
        AstNode::Identifier(name, _) => name.to_string(),
        AstNode::This { .. } => "this".to_string(),
        AstNode::MemberAccess { object, member, .. } => {
            format!("{}.{}", describe_callee(object), member)
        }
        AstNode::IndexAccess { object, .. } => format!("{}[...]", describe_callee(object)),
        AstNode::SuperMember { property, .. } => format!("(intermediate value).{}", property),
        AstNode::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        AstNode::OptionalChain { expr, .. } => describe_callee(expr),
        _ => "(intermediate value)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_describe_callee_member_chain() {
        let callee = AstNode::MemberAccess {
            object: Box::new(AstNode::MemberAccess {
                object: Box::new(AstNode::Identifier("a".into(), loc())),
                member: "b".into(),
                optional: false,
                location: loc(),
            }),
            member: "c".into(),
            optional: false,
            location: loc(),
        };
        assert_eq!(describe_callee(&callee), "a.b.c");
    }

    #[test]
    fn test_describe_callee_literal() {
        let callee = AstNode::NumberLiteral(1.0, loc());
        assert_eq!(describe_callee(&callee), "(intermediate value)");
    }
}
