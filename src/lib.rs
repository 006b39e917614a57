//! # Introduction
//!
//! snippet-runner evaluates short JavaScript snippets of the kind interactive
//! lessons embed, captures what they print through `console`, and records a
//! succeeded/failed result per snippet id.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter (fresh realm + console) → ExecutionOutcome → ExecutionTable
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST.
//! 2. [`interpreter`]: walks the AST in a sandbox realm with the standard
//!    built-ins and an injected console.
//! 3. [`memory`]: values, the object heap, lexical scopes and the call stack.
//! 4. [`inspect`]: console rendering of values (`[1, 2, 3]`, `{a: 1}`,
//!    `[Circular]`).
//! 5. [`engine`]: [`SnippetEngine`] runs snippets and publishes results into
//!    the [`ExecutionTable`].
//!
//! ## Example
//!
//! ```
//! use snippet_runner::{ExecutionStatus, SnippetEngine};
//!
//! let mut engine = SnippetEngine::default();
//! let result = engine.execute("arrays", "const arr = [1, 2, 3]; console.log(arr);");
//! assert_eq!(result.status, ExecutionStatus::Succeeded);
//! assert_eq!(result.output_lines, vec!["[1, 2, 3]"]);
//! ```
//!
//! ## Supported JavaScript subset
//!
//! Declarations (`var`/`let`/`const`, functions, classes), destructuring,
//! closures, all statements except `with`, exceptions, template literals,
//! regular expressions, optional chaining and spread. Asynchronous code,
//! generators and modules are rejected as syntax errors; timers exist but
//! never fire.

pub mod config;
pub mod console;
pub mod engine;
pub mod inspect;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod table;

pub use config::{ConfigError, EngineConfig};
pub use engine::{evaluate, SnippetEngine};
pub use table::{ExecutionOutcome, ExecutionResult, ExecutionStatus, ExecutionTable};
