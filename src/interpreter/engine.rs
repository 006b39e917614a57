// Execution engine for the snippet interpreter

use crate::config::EngineConfig;
use crate::console::ConsoleBuffer;
use crate::inspect::Inspector;
use crate::interpreter::builtins::Realm;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{Heap, ObjectKind};
use crate::memory::scope::{self, Binding, Scope, ScopeRef};
use crate::memory::stack::{CallStack, Frame, TraceFrame};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::*;
use std::rc::Rc;

/// Pending non-local jump produced by the last executed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break(Option<Rc<str>>),
    Continue(Option<Rc<str>>),
    Return,
}

/// The tree-walking interpreter for one snippet run.
///
/// A fresh interpreter is a fresh realm: its own heap, global scope, built-in
/// objects and console buffer. Nothing is shared between instances.
pub struct Interpreter {
    /// Every object created during the run
    pub(crate) heap: Heap,

    /// Intrinsic prototypes and the global object
    pub(crate) realm: Realm,

    pub(crate) global_scope: ScopeRef,

    /// Innermost lexical scope of the code being executed
    pub(crate) scope: ScopeRef,

    /// Active calls, used for `this`, `super` and stack traces
    pub(crate) call_stack: CallStack,

    /// Captured console output
    pub(crate) console: ConsoleBuffer,

    /// Set by `break`, `continue` and `return`, consumed by the enclosing construct
    pub(crate) control_flow: ControlFlow,

    /// Value of the last executed `return`
    pub(crate) return_value: Value,

    /// Current source location being executed
    pub(crate) current_location: SourceLocation,

    pub(crate) config: EngineConfig,

    /// Next handle returned by `setTimeout` and friends
    pub(crate) next_timer_id: u32,

    /// Trace of the error currently unwinding, captured where it was raised
    pub(crate) pending_trace: Option<Vec<TraceFrame>>,

    /// Arrays currently inside `join`, so cyclic arrays stringify as empty
    pub(crate) joining: Vec<ObjectId>,
}

impl Interpreter {
    /// Create an interpreter with a brand new realm
    pub fn new(config: EngineConfig) -> Self {
        let mut heap = Heap::new();
        let realm = Realm::bootstrap(&mut heap);
        let global_scope = Scope::new_root();
        let console = ConsoleBuffer::new(config.max_output_lines);

        let mut interpreter = Interpreter {
            heap,
            realm,
            scope: global_scope.clone(),
            global_scope,
            call_stack: CallStack::new(),
            console,
            control_flow: ControlFlow::Normal,
            return_value: Value::Undefined,
            current_location: SourceLocation::new(1, 1),
            config,
            next_timer_id: 1,
            pending_trace: None,
            joining: Vec::new(),
        };
        interpreter
            .call_stack
            .push(Frame::top_level(Value::Undefined));
        interpreter.install_builtins();
        tracing::trace!(objects = interpreter.heap.len(), "realm initialized");
        interpreter
    }

    /// Run a parsed program to completion
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let global = self.global_scope.clone();
        self.hoist_declarations(&program.nodes, &global);
        tracing::trace!(statements = program.nodes.len(), "declarations hoisted");

        for stmt in &program.nodes {
            if let Err(err) = self.execute_statement(stmt) {
                self.capture_trace(err.location());
                return Err(err);
            }
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// Console lines captured so far
    pub fn output(&self) -> &[String] {
        self.console.lines()
    }

    /// Consume the interpreter, returning its console output
    pub fn into_output(self) -> Vec<String> {
        self.console.into_lines()
    }

    /// Render an uncaught error the way it is reported to the caller:
    /// `Name: message` (or `Uncaught <value>`) plus a few `at` lines.
    pub fn describe_error(&self, err: &RuntimeError) -> String {
        let (header, frames) = match err {
            RuntimeError::Thrown {
                value: Value::Object(id),
                ..
            } if self.is_error_object(*id) => {
                let header = self.inspector().error_header(*id);
                let frames = self
                    .stack_lines(*id)
                    .unwrap_or_else(|| self.pending_trace_lines());
                (header, frames)
            }
            RuntimeError::Thrown { value, .. } => (
                format!("Uncaught {}", self.inspector().inspect(value)),
                self.pending_trace_lines(),
            ),
            other => (other.to_string(), self.pending_trace_lines()),
        };

        let mut message = header;
        for line in frames.into_iter().take(self.config.stack_frames) {
            message.push('\n');
            message.push_str(&line);
        }
        message
    }

    /// Formatter configured for this realm
    pub(crate) fn inspector(&self) -> Inspector<'_> {
        Inspector::new(
            &self.heap,
            Some(self.realm.object_prototype),
            self.config.inspect_depth.min(self.config.max_nesting_depth),
        )
    }

    pub(crate) fn is_error_object(&self, id: ObjectId) -> bool {
        matches!(self.heap.get(id).kind, ObjectKind::Error)
    }

    /// `at` lines stored in an error object's `stack` property
    fn stack_lines(&self, id: ObjectId) -> Option<Vec<String>> {
        let stack = self.heap.get(id).properties.get("stack")?;
        let text = stack.value.as_str()?;
        Some(
            text.lines()
                .filter(|line| line.starts_with("    at "))
                .map(str::to_string)
                .collect(),
        )
    }

    fn pending_trace_lines(&self) -> Vec<String> {
        self.pending_trace
            .as_deref()
            .map(format_trace)
            .unwrap_or_default()
    }

    /// Remember where the error now unwinding was raised, unless already known
    pub(crate) fn capture_trace(&mut self, location: SourceLocation) {
        if self.pending_trace.is_none() {
            self.pending_trace = Some(self.call_stack.trace(location));
        }
    }

    // ========== Scopes ==========

    /// Enter a new block scope, returning the scope to restore afterwards
    pub(crate) fn enter_scope(&mut self) -> ScopeRef {
        let child = Scope::child(&self.scope, false);
        std::mem::replace(&mut self.scope, child)
    }

    pub(crate) fn exit_scope(&mut self, saved: ScopeRef) {
        self.scope = saved;
    }

    /// Hoist `var` names to the enclosing function scope, then create the
    /// block's own `let`/`const`/`class`/function bindings.
    pub(crate) fn hoist_declarations(&mut self, statements: &[AstNode], scope: &ScopeRef) {
        let mut names = Vec::new();
        collect_var_names(statements, &mut names);
        let target = scope::function_scope(scope);
        {
            let mut target = target.borrow_mut();
            for name in names {
                if !target.has_own(&name) {
                    target.declare(name, Binding::mutable(Value::Undefined));
                }
            }
        }
        self.hoist_lexical(statements, scope);
    }

    /// Declare the block-scoped names of `statements` in `scope`.
    ///
    /// Function declarations are initialized immediately; everything else
    /// starts in its temporal dead zone.
    pub(crate) fn hoist_lexical(&mut self, statements: &[AstNode], scope: &ScopeRef) {
        for stmt in statements {
            match stmt {
                AstNode::VarDecl {
                    kind: kind @ (VarKind::Let | VarKind::Const),
                    declarations,
                    ..
                } => {
                    let mut names = Vec::new();
                    for declarator in declarations {
                        declarator.target.bound_names(&mut names);
                    }
                    let mut scope = scope.borrow_mut();
                    for name in names {
                        scope.declare(name, Binding::uninitialized(*kind == VarKind::Let));
                    }
                }
                AstNode::ClassDecl(class) => {
                    if let Some(name) = &class.name {
                        scope
                            .borrow_mut()
                            .declare(name.clone(), Binding::uninitialized(true));
                    }
                }
                AstNode::FunctionDecl(function) => {
                    let func = self.create_closure(function, scope.clone(), None);
                    if let Some(name) = &function.name {
                        scope
                            .borrow_mut()
                            .declare(name.clone(), Binding::mutable(Value::Object(func)));
                    }
                }
                _ => {}
            }
        }
    }

    // ========== Variables ==========

    pub(crate) fn lookup_variable(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut current = Some(self.scope.clone());
        while let Some(scope_ref) = current {
            let scope = scope_ref.borrow();
            if let Some(binding) = scope.get(name) {
                if !binding.initialized {
                    return Err(RuntimeError::UninitializedBinding {
                        name: Rc::from(name),
                        location,
                    });
                }
                return Ok(binding.value.clone());
            }
            current = scope.parent.clone();
        }
        Err(RuntimeError::UndefinedVariable {
            name: Rc::from(name),
            location,
        })
    }

    /// Whether `name` resolves anywhere on the scope chain
    pub(crate) fn is_declared(&self, name: &str) -> bool {
        scope::resolve(&self.scope, name).is_some()
    }

    /// Plain assignment to an identifier.
    ///
    /// Undeclared names become globals, as in a non-module script.
    pub(crate) fn assign_variable(
        &mut self,
        name: &str,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if let Some(scope_ref) = scope::resolve(&self.scope, name) {
            let mut scope = scope_ref.borrow_mut();
            if let Some(binding) = scope.get_mut(name) {
                if !binding.initialized {
                    return Err(RuntimeError::UninitializedBinding {
                        name: Rc::from(name),
                        location,
                    });
                }
                if !binding.mutable {
                    return Err(RuntimeError::ConstAssignment {
                        name: Rc::from(name),
                        location,
                    });
                }
                binding.value = value;
                return Ok(());
            }
        }

        self.global_scope
            .borrow_mut()
            .declare(Rc::from(name), Binding::mutable(value));
        Ok(())
    }

    /// Initialize a binding in the current scope, ending its temporal dead zone
    pub(crate) fn initialize_binding(&mut self, name: &Rc<str>, value: Value, mutable: bool) {
        let mut scope = self.scope.borrow_mut();
        match scope.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                binding.initialized = true;
            }
            None => scope.declare(
                name.clone(),
                Binding {
                    value,
                    mutable,
                    initialized: true,
                },
            ),
        }
    }

    // ========== Frames ==========

    pub(crate) fn current_frame(&self, location: SourceLocation) -> Result<&Frame, RuntimeError> {
        self.call_stack
            .current()
            .ok_or_else(|| RuntimeError::reference_error("no active frame", location))
    }

    /// `this` of the innermost call, subject to the derived-constructor check
    pub(crate) fn current_this(&self, location: SourceLocation) -> Result<Value, RuntimeError> {
        let frame = self.current_frame(location)?;
        if !frame.this_initialized {
            return Err(RuntimeError::reference_error(
                "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
                location,
            ));
        }
        Ok(frame.this.clone())
    }
}

/// Render trace frames as `    at name (line:column)` lines
pub(crate) fn format_trace(trace: &[TraceFrame]) -> Vec<String> {
    trace
        .iter()
        .map(|frame| {
            format!(
                "    at {} ({}:{})",
                frame.function_name, frame.location.line, frame.location.column
            )
        })
        .collect()
}

/// Collect `var`-declared names in `statements`, without entering nested functions
fn collect_var_names(statements: &[AstNode], names: &mut Vec<Rc<str>>) {
    for stmt in statements {
        collect_var_names_in(stmt, names);
    }
}

fn collect_var_names_in(stmt: &AstNode, names: &mut Vec<Rc<str>>) {
    match stmt {
        AstNode::VarDecl {
            kind: VarKind::Var,
            declarations,
            ..
        } => {
            for declarator in declarations {
                declarator.target.bound_names(names);
            }
        }
        AstNode::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_var_names(then_branch, names);
            if let Some(else_branch) = else_branch {
                collect_var_names(else_branch, names);
            }
        }
        AstNode::While { body, .. } | AstNode::DoWhile { body, .. } => {
            collect_var_names(body, names)
        }
        AstNode::For { init, body, .. } => {
            if let Some(init) = init {
                collect_var_names_in(init, names);
            }
            collect_var_names(body, names);
        }
        AstNode::ForIn { binding, body, .. } | AstNode::ForOf { binding, body, .. } => {
            if let ForBinding::Declaration(VarKind::Var, pattern) = binding {
                pattern.bound_names(names);
            }
            collect_var_names(body, names);
        }
        AstNode::Switch { cases, .. } => {
            for case in cases {
                match case {
                    CaseNode::Case { statements, .. } | CaseNode::Default { statements, .. } => {
                        collect_var_names(statements, names)
                    }
                }
            }
        }
        AstNode::Labeled { body, .. } => collect_var_names_in(body, names),
        AstNode::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            collect_var_names(block, names);
            if let Some(handler) = handler {
                collect_var_names(handler, names);
            }
            if let Some(finalizer) = finalizer {
                collect_var_names(finalizer, names);
            }
        }
        AstNode::Block { statements, .. } => collect_var_names(statements, names),
        _ => {}
    }
}
