//! JavaScript source code parser
//!
//! This module transforms snippet source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → AST), split across `statements`,
//!   `expressions` and `declarations`
//! - [`ast`]: AST node definitions
//!
//! # Supported Subset
//!
//! The parser accepts the JavaScript lesson snippets are written in:
//! - `var`/`let`/`const`, functions, arrow functions, classes, destructuring
//! - All statements except `with`, plus labels and `try`/`catch`/`finally`
//! - Template literals, regular expression literals, optional chaining, spread
//! - Automatic semicolon insertion
//!
//! Modules, generators, `async`/`await` and tagged templates are rejected
//! with a syntax error.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{ParseError, Parser};
