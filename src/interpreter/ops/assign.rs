//! Assignment and destructuring
//!
//! This module provides everything that stores a value into a target:
//!
//! - `=`, compound (`+=`, `**=`, ...) and logical (`&&=`, `||=`, `??=`) assignment
//! - Binding of declarations, parameters and `catch` clauses
//! - Array and object destructuring with defaults, holes and rest elements
//!
//! # Binding Modes
//!
//! The same pattern walker serves declarations and plain assignment; the
//! [`BindingMode`] decides whether identifiers create bindings in the current
//! scope or assign through the scope chain.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::to_boolean;
use crate::memory::value::Value;
use crate::parser::ast::*;
use std::rc::Rc;

/// How identifiers inside a pattern are bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingMode {
    /// `var`/`let`/`const` declarations
    Declare(VarKind),
    /// Function parameters and `catch` parameters
    Parameter,
    /// Assignment expressions
    Assign,
}

impl Interpreter {
    pub(crate) fn evaluate_assignment(
        &mut self,
        op: AssignOp,
        target: &Pattern,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match target {
            Pattern::Identifier(name, loc) => self.assign_identifier(op, name, *loc, value, location),
            Pattern::Expression(node) => self.assign_member(op, node, value, location),
            Pattern::Array { .. } | Pattern::Object { .. } => {
                let rhs = self.evaluate_expr(value)?;
                self.bind_pattern(target, rhs.clone(), BindingMode::Assign)?;
                Ok(rhs)
            }
        }
    }

    fn assign_identifier(
        &mut self,
        op: AssignOp,
        name: &Rc<str>,
        name_location: SourceLocation,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let result = match op {
            AssignOp::Assign => self.evaluate_named(value, name)?,
            AssignOp::Compound(bin_op) => {
                let current = self.lookup_variable(name, name_location)?;
                let rhs = self.evaluate_expr(value)?;
                self.binary_op(bin_op, &current, &rhs, location)?
            }
            AssignOp::Logical(logical) => {
                let current = self.lookup_variable(name, name_location)?;
                if !should_assign(logical, &current) {
                    return Ok(current);
                }
                self.evaluate_named(value, name)?
            }
        };
        self.current_location = location;
        self.assign_variable(name, result.clone(), name_location)?;
        Ok(result)
    }

    fn assign_member(
        &mut self,
        op: AssignOp,
        target: &AstNode,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        // Resolve the reference before evaluating the right-hand side
        let (base, key) = match target {
            AstNode::MemberAccess { object, member, .. } => {
                (self.evaluate_expr(object)?, Value::String(member.clone()))
            }
            AstNode::IndexAccess { object, index, .. } => {
                let base = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                (base, key)
            }
            _ => {
                return Err(RuntimeError::syntax_error(
                    "Invalid left-hand side in assignment",
                    location,
                ))
            }
        };
        if base.is_nullish() {
            let key = self.to_property_key(&key, location)?;
            return Err(RuntimeError::type_error(
                format!(
                    "Cannot set properties of {} (setting '{}')",
                    if base.is_undefined() { "undefined" } else { "null" },
                    key
                ),
                location,
            ));
        }

        let result = match op {
            AssignOp::Assign => self.evaluate_expr(value)?,
            AssignOp::Compound(bin_op) => {
                let current = self.get_index(&base, &key, location)?;
                let rhs = self.evaluate_expr(value)?;
                self.binary_op(bin_op, &current, &rhs, location)?
            }
            AssignOp::Logical(logical) => {
                let current = self.get_index(&base, &key, location)?;
                if !should_assign(logical, &current) {
                    return Ok(current);
                }
                self.evaluate_expr(value)?
            }
        };
        self.current_location = location;
        self.set_index(&base, &key, result.clone(), location)?;
        Ok(result)
    }

    /// Evaluate `node`, naming it after `name` if it is an anonymous function or class
    pub(crate) fn evaluate_named(&mut self, node: &AstNode, name: &str) -> Result<Value, RuntimeError> {
        match node {
            AstNode::Class(class) if class.name.is_none() => self.evaluate_class(class, Some(name)),
            _ => {
                let value = self.evaluate_expr(node)?;
                if node.is_anonymous_definition() {
                    self.set_function_name(&value, name);
                }
                Ok(value)
            }
        }
    }

    /// Default value of a pattern element, named after a plain identifier target
    pub(crate) fn evaluate_default(
        &mut self,
        default: &AstNode,
        target: &Pattern,
    ) -> Result<Value, RuntimeError> {
        match target {
            Pattern::Identifier(name, _) => self.evaluate_named(default, name),
            _ => self.evaluate_expr(default),
        }
    }

    /// Store `value` into `pattern`, destructuring as needed
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        mode: BindingMode,
    ) -> Result<(), RuntimeError> {
        match pattern {
            Pattern::Identifier(name, location) => self.bind_identifier(name, value, mode, *location),
            Pattern::Expression(node) => {
                let location = *node.location();
                match node.as_ref() {
                    AstNode::MemberAccess { object, member, .. } => {
                        let base = self.evaluate_expr(object)?;
                        self.set_property(&base, member.clone(), value, location)
                    }
                    AstNode::IndexAccess { object, index, .. } => {
                        let base = self.evaluate_expr(object)?;
                        let key = self.evaluate_expr(index)?;
                        self.set_index(&base, &key, value, location)
                    }
                    _ => Err(RuntimeError::syntax_error(
                        "Invalid destructuring assignment target",
                        location,
                    )),
                }
            }
            Pattern::Array {
                elements,
                rest,
                location,
            } => {
                if value.is_nullish() {
                    let shown = if value.is_undefined() { "undefined" } else { "null" };
                    return Err(RuntimeError::type_error(
                        format!("{} is not iterable", shown),
                        *location,
                    ));
                }
                let items = self.iterate(&value, *location)?;
                let mut items = items.into_iter();
                for element in elements {
                    let item = items.next().unwrap_or_default();
                    if let Some(element) = element {
                        self.bind_element(element, item, mode)?;
                    }
                }
                if let Some(rest) = rest {
                    let remaining: Vec<Value> = items.collect();
                    let array = self.new_array(remaining);
                    self.bind_pattern(rest, Value::Object(array), mode)?;
                }
                Ok(())
            }
            Pattern::Object {
                properties,
                rest,
                location,
            } => {
                if value.is_nullish() {
                    let shown = if value.is_undefined() { "undefined" } else { "null" };
                    return Err(RuntimeError::type_error(
                        format!("Cannot destructure '{}' as it is {}.", shown, shown),
                        *location,
                    ));
                }
                let mut used: Vec<Rc<str>> = Vec::with_capacity(properties.len());
                for property in properties {
                    let key = self.evaluate_property_key(&property.key)?;
                    let item = self.get_property(&value, &key, *location)?;
                    used.push(key);
                    self.bind_element(&property.value, item, mode)?;
                }
                if let Some(rest) = rest {
                    let remaining = self.new_object();
                    if let Some(source) = value.as_object() {
                        for key in self.own_enumerable_keys(source) {
                            if used.contains(&key) {
                                continue;
                            }
                            let item = self.get_property(&value, &key, *location)?;
                            self.define_own(remaining, key, item);
                        }
                    }
                    self.bind_pattern(rest, Value::Object(remaining), mode)?;
                }
                Ok(())
            }
        }
    }

    fn bind_element(
        &mut self,
        element: &PatternElement,
        value: Value,
        mode: BindingMode,
    ) -> Result<(), RuntimeError> {
        let value = match (&element.default, value.is_undefined()) {
            (Some(default), true) => self.evaluate_default(default, &element.target)?,
            _ => value,
        };
        self.bind_pattern(&element.target, value, mode)
    }

    fn bind_identifier(
        &mut self,
        name: &Rc<str>,
        value: Value,
        mode: BindingMode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match mode {
            BindingMode::Assign | BindingMode::Declare(VarKind::Var) => {
                self.assign_variable(name, value, location)
            }
            BindingMode::Declare(kind) => {
                self.initialize_binding(name, value, kind == VarKind::Let);
                Ok(())
            }
            BindingMode::Parameter => {
                self.initialize_binding(name, value, true);
                Ok(())
            }
        }
    }
}

/// Whether a logical assignment stores its right-hand side
fn should_assign(op: LogicalOp, current: &Value) -> bool {
    match op {
        LogicalOp::And => to_boolean(current),
        LogicalOp::Or => !to_boolean(current),
        LogicalOp::Nullish => current.is_nullish(),
    }
}
