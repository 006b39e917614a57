//! Loop statement execution (`while`, `do-while`, `for`, `for-in`, `for-of`).
//!
//! Adds `impl Interpreter` methods for the loop forms of the language.
//! `break` and `continue` are propagated via `LoopBodyResult` so the loop
//! driver can react without inspecting `control_flow` directly.
//!
//! A labeled `break` or `continue` that names an outer statement, and
//! `return`, end the body with `LoopBodyResult::Exit`, which unwinds the loop
//! and leaves the control-flow signal for the enclosing construct.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::assign::BindingMode;
use crate::interpreter::type_system::to_boolean;
use crate::memory::scope::Scope;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, ForBinding, SourceLocation, VarKind};

/// Result returned by [`Interpreter::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit cleanly.
    Break,
    /// `return` or a jump to an outer label; the loop driver should unwind and
    /// propagate `self.control_flow` to the caller.
    Exit,
}

impl Interpreter {
    /// Executes all statements in `body` inside a fresh block scope.
    ///
    /// Unlabeled jumps, and jumps naming `label`, belong to this loop.
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[AstNode],
        label: Option<&str>,
    ) -> Result<LoopBodyResult, RuntimeError> {
        self.execute_block(body)?;

        let owned = |target: &Option<std::rc::Rc<str>>| match target {
            None => true,
            Some(name) => label == Some(name.as_ref()),
        };
        let result = match &self.control_flow {
            ControlFlow::Normal => return Ok(LoopBodyResult::Continue),
            ControlFlow::Break(target) if owned(target) => LoopBodyResult::Break,
            ControlFlow::Continue(target) if owned(target) => LoopBodyResult::Continue,
            _ => return Ok(LoopBodyResult::Exit),
        };
        self.control_flow = ControlFlow::Normal;
        Ok(result)
    }

    /// Executes a `while (condition) { body }` loop.
    pub(crate) fn execute_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        loop {
            self.current_location = location;
            let cond_val = self.evaluate_expr(condition)?;
            if !to_boolean(&cond_val) {
                break;
            }

            match self.execute_loop_body(body, label)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }

    /// Executes a `do { body } while (condition)` loop.
    ///
    /// The body always runs at least once; `continue` jumps to the condition.
    pub(crate) fn execute_do_while(
        &mut self,
        body: &[AstNode],
        condition: &AstNode,
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        loop {
            match self.execute_loop_body(body, label)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }

            self.current_location = location;
            let cond_val = self.evaluate_expr(condition)?;
            if !to_boolean(&cond_val) {
                break;
            }
        }
        Ok(())
    }

    /// Executes a `for (init; condition; increment) { body }` loop.
    ///
    /// The loop gets its own scope for the initializer. When the initializer
    /// declares `let` bindings, each iteration runs against a fresh copy of
    /// them so closures created in the body capture that iteration's values.
    pub(crate) fn execute_for(
        &mut self,
        init: Option<&AstNode>,
        condition: Option<&AstNode>,
        increment: Option<&AstNode>,
        body: &[AstNode],
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let saved = self.enter_scope();
        let result = self.run_for(init, condition, increment, body, label, location);
        self.exit_scope(saved);
        result
    }

    fn run_for(
        &mut self,
        init: Option<&AstNode>,
        condition: Option<&AstNode>,
        increment: Option<&AstNode>,
        body: &[AstNode],
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let per_iteration = matches!(
            init,
            Some(AstNode::VarDecl {
                kind: VarKind::Let,
                ..
            })
        );
        if let Some(init) = init {
            let scope = self.scope.clone();
            self.hoist_lexical(std::slice::from_ref(init), &scope);
            self.execute_statement(init)?;
        }

        loop {
            self.current_location = location;
            if let Some(cond) = condition {
                let cond_val = self.evaluate_expr(cond)?;
                if !to_boolean(&cond_val) {
                    break;
                }
            }

            match self.execute_loop_body(body, label)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }

            if per_iteration {
                self.scope = Scope::fork(&self.scope);
            }
            if let Some(inc) = increment {
                self.evaluate_expr(inc)?;
            }
        }
        Ok(())
    }

    /// Executes `for (binding in object) { body }`.
    ///
    /// Visits enumerable string keys, own keys first and then inherited ones.
    /// A `null` or `undefined` object runs zero iterations.
    pub(crate) fn execute_for_in(
        &mut self,
        binding: &ForBinding,
        object: &AstNode,
        body: &[AstNode],
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let target = self.evaluate_expr(object)?;
        let keys: Vec<Value> = match &target {
            Value::Object(id) => self
                .enumerable_keys_with_inherited(*id)
                .into_iter()
                .map(Value::String)
                .collect(),
            Value::String(s) => (0..crate::interpreter::builtins::string::utf16_len(s))
                .map(|i| Value::from(i.to_string()))
                .collect(),
            _ => Vec::new(),
        };

        for key in keys {
            self.current_location = location;
            match self.run_iteration(binding, key, body, label)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }

    /// Executes `for (binding of iterable) { body }`.
    ///
    /// Arrays are walked by index against their live length, so elements
    /// pushed during the loop are visited. Other iterables are snapshotted.
    pub(crate) fn execute_for_of(
        &mut self,
        binding: &ForBinding,
        iterable: &AstNode,
        body: &[AstNode],
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let source = self.evaluate_expr(iterable)?;

        if self.array_elements(&source).is_some() {
            let mut index = 0;
            loop {
                let item = match self.array_elements(&source) {
                    Some(elements) if index < elements.len() => {
                        elements[index].clone().unwrap_or_default()
                    }
                    _ => break,
                };
                index += 1;
                self.current_location = location;
                match self.run_iteration(binding, item, body, label)? {
                    LoopBodyResult::Continue => {}
                    LoopBodyResult::Break | LoopBodyResult::Exit => break,
                }
            }
            return Ok(());
        }

        let items = self.iterate(&source, location)?;
        for item in items {
            self.current_location = location;
            match self.run_iteration(binding, item, body, label)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }

    /// Bind one `for-in`/`for-of` value in a fresh scope and run the body
    fn run_iteration(
        &mut self,
        binding: &ForBinding,
        value: Value,
        body: &[AstNode],
        label: Option<&str>,
    ) -> Result<LoopBodyResult, RuntimeError> {
        let saved = self.enter_scope();
        let result = match binding {
            ForBinding::Declaration(kind, pattern) => {
                self.bind_pattern(pattern, value, BindingMode::Declare(*kind))
            }
            ForBinding::Target(pattern) => self.bind_pattern(pattern, value, BindingMode::Assign),
        }
        .and_then(|()| self.execute_loop_body(body, label));
        self.exit_scope(saved);
        result
    }
}
