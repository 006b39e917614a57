//! Operator implementations, all as methods on the interpreter
//!
//! - [`access`]: property reads and writes, allocation helpers
//! - [`assign`]: assignment, compound assignment and destructuring
//! - [`binary`]: binary, logical and relational operators
//! - [`unary`]: unary operators and `++`/`--`

pub mod access;
pub mod assign;
pub mod binary;
pub mod unary;
