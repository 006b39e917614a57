use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::assign::BindingMode;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, CaseNode, Pattern, SourceLocation};

impl Interpreter {
    pub(crate) fn execute_return(
        &mut self,
        expr: Option<&AstNode>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        self.return_value = match expr {
            Some(ret_expr) => self.evaluate_expr(ret_expr)?,
            None => Value::Undefined,
        };
        self.current_location = location;
        self.control_flow = ControlFlow::Return;
        Ok(())
    }

    pub(crate) fn execute_switch(
        &mut self,
        expr: &AstNode,
        cases: &[CaseNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let switch_val = self.evaluate_expr(expr)?;

        let mut match_index: Option<usize> = None;
        let mut default_index: Option<usize> = None;

        for (i, case) in cases.iter().enumerate() {
            match case {
                CaseNode::Case { value, .. } => {
                    let case_val = self.evaluate_expr(value)?;
                    if switch_val.strict_equals(&case_val) {
                        match_index = Some(i);
                        break;
                    }
                }
                CaseNode::Default { .. } => {
                    default_index = Some(i);
                }
            }
        }

        let Some(start) = match_index.or(default_index) else {
            return Ok(());
        };
        self.current_location = location;

        // All clauses share one block scope
        let saved = self.enter_scope();
        let scope = self.scope.clone();
        for case in cases {
            let (CaseNode::Case { statements, .. } | CaseNode::Default { statements, .. }) = case;
            self.hoist_lexical(statements, &scope);
        }

        let mut result = Ok(());
        'cases: for case in &cases[start..] {
            let (CaseNode::Case { statements, .. } | CaseNode::Default { statements, .. }) = case;
            for stmt in statements {
                if let Err(err) = self.execute_statement(stmt) {
                    result = Err(err);
                    break 'cases;
                }
                if self.control_flow != ControlFlow::Normal {
                    break 'cases;
                }
            }
        }
        self.exit_scope(saved);

        if self.control_flow == ControlFlow::Break(None) {
            self.control_flow = ControlFlow::Normal;
        }
        result
    }

    pub(crate) fn execute_throw(
        &mut self,
        expr: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let value = self.evaluate_expr(expr)?;
        self.current_location = location;
        self.capture_trace(location);
        Err(RuntimeError::Thrown { value, location })
    }

    /// `try`/`catch`/`finally`.
    ///
    /// A `finally` block that completes abruptly (throws, returns, breaks)
    /// replaces whatever the `try` or `catch` produced.
    pub(crate) fn execute_try(
        &mut self,
        block: &[AstNode],
        param: Option<&Pattern>,
        handler: Option<&[AstNode]>,
        finalizer: Option<&[AstNode]>,
    ) -> Result<(), RuntimeError> {
        let mut result = self.execute_block(block);

        if let Some(handler) = handler {
            if let Err(err) = result {
                result = if err.is_catchable() {
                    self.execute_catch(err, param, handler)
                } else {
                    Err(err)
                };
            }
        }

        let Some(finalizer) = finalizer else {
            return result;
        };

        let saved_flow = std::mem::replace(&mut self.control_flow, ControlFlow::Normal);
        let saved_return = self.return_value.clone();
        let saved_trace = self.pending_trace.take();

        self.execute_block(finalizer)?;

        if self.control_flow != ControlFlow::Normal {
            // Abrupt `finally` discards the pending completion
            return Ok(());
        }
        self.control_flow = saved_flow;
        self.return_value = saved_return;
        self.pending_trace = saved_trace;
        result
    }

    fn execute_catch(
        &mut self,
        err: RuntimeError,
        param: Option<&Pattern>,
        handler: &[AstNode],
    ) -> Result<(), RuntimeError> {
        tracing::trace!(error = %err, "exception caught");
        let value = self.error_to_value(err);
        self.pending_trace = None;

        let saved = self.enter_scope();
        let result = match param {
            Some(pattern) => self.bind_pattern(pattern, value, BindingMode::Parameter),
            None => Ok(()),
        }
        .and_then(|()| self.execute_block(handler));
        self.exit_scope(saved);
        result
    }

    /// The JavaScript value an error is observed as by `catch`.
    ///
    /// Engine-raised errors become `Error` objects of the matching type,
    /// carrying the trace recorded where they were raised.
    pub(crate) fn error_to_value(&mut self, err: RuntimeError) -> Value {
        match err {
            RuntimeError::Thrown { value, .. } => value,
            other => {
                let trace = self
                    .pending_trace
                    .take()
                    .unwrap_or_else(|| self.call_stack.trace(other.location()));
                let error = self.create_error(other.name(), &other.message(), &trace);
                Value::Object(error)
            }
        }
    }
}
