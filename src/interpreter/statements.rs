//! Statement execution implementation
//!
//! This module handles the execution of statement types, including:
//!
//! - Variable, function and class declarations
//! - Blocks and their lexical scopes
//! - `if`/`else` and labeled statements
//! - Dispatch to the loop and jump handlers in [`loops`](super::loops) and
//!   [`jumps`](super::jumps)
//!
//! # Implementation
//!
//! All statement execution methods are implemented as `pub(crate)` methods
//! on the [`Interpreter`] struct, allowing them to access and modify the
//! interpreter's state (scopes, heap, console, etc.).
//!
//! # Control Flow
//!
//! - `break`, `continue` and `return` set `control_flow`; statement lists stop
//!   at the first non-normal completion and leave the signal for their owner
//! - Exceptions travel as `Err(RuntimeError)` and unwind through `?`

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::assign::BindingMode;
use crate::interpreter::type_system::to_boolean;
use crate::memory::value::Value;
use crate::parser::ast::*;
use std::rc::Rc;

impl Interpreter {
    /// Execute a single statement
    pub(crate) fn execute_statement(&mut self, stmt: &AstNode) -> Result<(), RuntimeError> {
        self.current_location = *stmt.location();

        match stmt {
            AstNode::VarDecl {
                kind, declarations, ..
            } => self.execute_var_decl(*kind, declarations),

            // Hoisted when the enclosing block was entered
            AstNode::FunctionDecl(_) => Ok(()),

            AstNode::ClassDecl(class) => {
                let value = self.evaluate_class(class, None)?;
                if let Some(name) = &class.name {
                    self.initialize_binding(name, value, true);
                }
                Ok(())
            }

            AstNode::Return { expr, location } => self.execute_return(expr.as_deref(), *location),

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let cond_val = self.evaluate_expr(condition)?;
                if to_boolean(&cond_val) {
                    self.execute_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(())
                }
            }

            AstNode::While {
                condition,
                body,
                location,
            } => self.execute_while(condition, body, None, *location),

            AstNode::DoWhile {
                body,
                condition,
                location,
            } => self.execute_do_while(body, condition, None, *location),

            AstNode::For {
                init,
                condition,
                increment,
                body,
                location,
            } => self.execute_for(
                init.as_deref(),
                condition.as_deref(),
                increment.as_deref(),
                body,
                None,
                *location,
            ),

            AstNode::ForIn {
                binding,
                object,
                body,
                location,
            } => self.execute_for_in(binding, object, body, None, *location),

            AstNode::ForOf {
                binding,
                iterable,
                body,
                location,
            } => self.execute_for_of(binding, iterable, body, None, *location),

            AstNode::Labeled { label, body, .. } => self.execute_labeled(label, body),

            AstNode::Switch {
                expr,
                cases,
                location,
            } => self.execute_switch(expr, cases, *location),

            AstNode::Break { label, .. } => {
                self.control_flow = ControlFlow::Break(label.clone());
                Ok(())
            }

            AstNode::Continue { label, .. } => {
                self.control_flow = ControlFlow::Continue(label.clone());
                Ok(())
            }

            AstNode::Throw { expr, location } => self.execute_throw(expr, *location),

            AstNode::Try {
                block,
                param,
                handler,
                finalizer,
                ..
            } => self.execute_try(block, param.as_ref(), handler.as_deref(), finalizer.as_deref()),

            AstNode::Block { statements, .. } => self.execute_block(statements),

            AstNode::Empty { .. } => Ok(()),

            AstNode::ExpressionStatement { expr, .. } => {
                self.evaluate_expr(expr)?;
                Ok(())
            }

            // Bare expressions in statement position
            other => {
                self.evaluate_expr(other)?;
                Ok(())
            }
        }
    }

    /// Run `statements` in a fresh block scope
    pub(crate) fn execute_block(&mut self, statements: &[AstNode]) -> Result<(), RuntimeError> {
        let saved = self.enter_scope();
        let scope = self.scope.clone();
        self.hoist_lexical(statements, &scope);
        let result = self.execute_statements(statements);
        self.exit_scope(saved);
        result
    }

    /// Run statements in the current scope until one completes abruptly
    pub(crate) fn execute_statements(&mut self, statements: &[AstNode]) -> Result<(), RuntimeError> {
        for stmt in statements {
            self.execute_statement(stmt)?;
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    fn execute_var_decl(
        &mut self,
        kind: VarKind,
        declarations: &[Declarator],
    ) -> Result<(), RuntimeError> {
        for declarator in declarations {
            let value = match &declarator.init {
                Some(init) => match &declarator.target {
                    Pattern::Identifier(name, _) => self.evaluate_named(init, name)?,
                    _ => self.evaluate_expr(init)?,
                },
                // `var x;` keeps whatever x already holds
                None if kind == VarKind::Var => continue,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.target, value, BindingMode::Declare(kind))?;
        }
        Ok(())
    }

    /// `label: statement`; loops receive the label so `continue label` works
    fn execute_labeled(&mut self, label: &Rc<str>, body: &AstNode) -> Result<(), RuntimeError> {
        let own = Some(label.as_ref());
        match body {
            AstNode::While {
                condition,
                body,
                location,
            } => self.execute_while(condition, body, own, *location)?,
            AstNode::DoWhile {
                body,
                condition,
                location,
            } => self.execute_do_while(body, condition, own, *location)?,
            AstNode::For {
                init,
                condition,
                increment,
                body,
                location,
            } => self.execute_for(
                init.as_deref(),
                condition.as_deref(),
                increment.as_deref(),
                body,
                own,
                *location,
            )?,
            AstNode::ForIn {
                binding,
                object,
                body,
                location,
            } => self.execute_for_in(binding, object, body, own, *location)?,
            AstNode::ForOf {
                binding,
                iterable,
                body,
                location,
            } => self.execute_for_of(binding, iterable, body, own, *location)?,
            other => self.execute_statement(other)?,
        }

        if matches!(&self.control_flow, ControlFlow::Break(Some(l)) if l == label) {
            self.control_flow = ControlFlow::Normal;
        }
        Ok(())
    }
}
