//! Memory model for the interpreter
//!
//! This module provides the core runtime storage abstractions:
//! - [`value`]: Runtime value representation (primitives and object handles)
//! - [`heap`]: Object arena with property maps, prototypes and internal slots
//! - [`scope`]: Lexical environments with temporal-dead-zone tracking
//! - [`stack`]: Call stack frames used for `this`, `super` and stack traces
//!
//! # Ownership
//!
//! Objects are owned by the [`heap::Heap`] arena and referenced by
//! [`value::ObjectId`], so cyclic object graphs need no reference counting.
//! Scopes are reference counted because closures capture them.

pub mod heap;
pub mod scope;
pub mod stack;
pub mod value;
