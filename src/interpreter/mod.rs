//! JavaScript interpreter execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: The [`Interpreter`](engine::Interpreter) state, scopes and
//!   error reporting
//! - [`statements`], [`loops`], [`jumps`]: statement execution and control flow
//! - [`expressions`], [`ops`]: expression evaluation and operators
//! - [`functions`], [`classes`]: calls, closures, `new` and class semantics
//! - [`type_system`]: JavaScript type conversions
//! - [`builtins`]: the global objects a snippet can use
//! - [`errors`]: Runtime error types
//!
//! # Execution Model
//!
//! The interpreter walks the AST and executes statements one at a time.
//! `break`, `continue` and `return` are recorded in a control-flow flag that
//! the enclosing construct consumes; exceptions unwind as `Err` values.
//!
//! # Built-in Functions
//!
//! Built-ins are native functions installed into a fresh realm for every run,
//! so nothing a snippet does can leak into the next one.

pub mod builtins;
pub mod classes;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod functions;
pub mod jumps;
pub mod loops;
pub mod ops;
pub mod statements;
pub mod type_system;
