//! Runtime error types for the snippet interpreter
//!
//! This module defines [`RuntimeError`], which represents every abrupt
//! completion that unwinds Rust frames: JavaScript exceptions raised by the
//! engine itself (`ReferenceError`, `TypeError`, ...), values thrown by user
//! code, and the internal optional-chain signal.
//!
//! Engine-raised errors stay lightweight until a `catch` clause observes them;
//! only then are they materialized as JavaScript error objects.

use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use std::rc::Rc;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// Read of a name with no binding anywhere on the scope chain
    #[error("ReferenceError: {name} is not defined")]
    UndefinedVariable {
        name: Rc<str>,
        location: SourceLocation,
    },

    /// Access to a `let`/`const`/`class` binding inside its temporal dead zone
    #[error("ReferenceError: Cannot access '{name}' before initialization")]
    UninitializedBinding {
        name: Rc<str>,
        location: SourceLocation,
    },

    /// Write to a `const` binding
    #[error("TypeError: Assignment to constant variable.")]
    ConstAssignment {
        name: Rc<str>,
        location: SourceLocation,
    },

    #[error("TypeError: {message}")]
    TypeError {
        message: String,
        location: SourceLocation,
    },

    #[error("RangeError: {message}")]
    RangeError {
        message: String,
        location: SourceLocation,
    },

    #[error("SyntaxError: {message}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("ReferenceError: {message}")]
    ReferenceError {
        message: String,
        location: SourceLocation,
    },

    /// Recursion deeper than the configured call depth
    #[error("RangeError: Maximum call stack size exceeded")]
    CallStackExceeded { location: SourceLocation },

    /// A value thrown by `throw`, or an engine error after `catch` observed it
    #[error("Uncaught exception")]
    Thrown {
        value: Value,
        location: SourceLocation,
    },

    /// `a?.b` met a nullish base (internal signal, not a real error)
    #[error("optional chain short-circuited")]
    OptionalShortCircuit { location: SourceLocation },
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
            location,
        }
    }

    pub fn range_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::RangeError {
            message: message.into(),
            location,
        }
    }

    pub fn syntax_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::SyntaxError {
            message: message.into(),
            location,
        }
    }

    pub fn reference_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::ReferenceError {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::UninitializedBinding { location, .. }
            | RuntimeError::ConstAssignment { location, .. }
            | RuntimeError::TypeError { location, .. }
            | RuntimeError::RangeError { location, .. }
            | RuntimeError::SyntaxError { location, .. }
            | RuntimeError::ReferenceError { location, .. }
            | RuntimeError::CallStackExceeded { location }
            | RuntimeError::Thrown { location, .. }
            | RuntimeError::OptionalShortCircuit { location } => *location,
        }
    }

    /// Constructor name of the JavaScript error this maps to
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedVariable { .. }
            | RuntimeError::UninitializedBinding { .. }
            | RuntimeError::ReferenceError { .. } => "ReferenceError",
            RuntimeError::ConstAssignment { .. } | RuntimeError::TypeError { .. } => "TypeError",
            RuntimeError::RangeError { .. } | RuntimeError::CallStackExceeded { .. } => {
                "RangeError"
            }
            RuntimeError::SyntaxError { .. } => "SyntaxError",
            RuntimeError::Thrown { .. } | RuntimeError::OptionalShortCircuit { .. } => "Error",
        }
    }

    /// The `message` property of the materialized error object
    pub fn message(&self) -> String {
        match self {
            RuntimeError::UndefinedVariable { name, .. } => format!("{} is not defined", name),
            RuntimeError::UninitializedBinding { name, .. } => {
                format!("Cannot access '{}' before initialization", name)
            }
            RuntimeError::ConstAssignment { .. } => "Assignment to constant variable.".to_string(),
            RuntimeError::TypeError { message, .. }
            | RuntimeError::RangeError { message, .. }
            | RuntimeError::SyntaxError { message, .. }
            | RuntimeError::ReferenceError { message, .. } => message.clone(),
            RuntimeError::CallStackExceeded { .. } => {
                "Maximum call stack size exceeded".to_string()
            }
            RuntimeError::Thrown { .. } | RuntimeError::OptionalShortCircuit { .. } => {
                String::new()
            }
        }
    }

    /// Whether `try/catch` may observe this error
    pub fn is_catchable(&self) -> bool {
        !matches!(self, RuntimeError::OptionalShortCircuit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_javascript_messages() {
        let loc = SourceLocation::new(1, 1);
        let err = RuntimeError::UndefinedVariable {
            name: Rc::from("undefinedVar"),
            location: loc,
        };
        assert_eq!(err.to_string(), "ReferenceError: undefinedVar is not defined");
        assert_eq!(err.name(), "ReferenceError");
        assert_eq!(err.message(), "undefinedVar is not defined");

        let err = RuntimeError::ConstAssignment {
            name: Rc::from("x"),
            location: loc,
        };
        assert_eq!(err.to_string(), "TypeError: Assignment to constant variable.");

        let err = RuntimeError::CallStackExceeded { location: loc };
        assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");
    }

    #[test]
    fn test_optional_signal_is_not_catchable() {
        let loc = SourceLocation::new(3, 7);
        assert!(!RuntimeError::OptionalShortCircuit { location: loc }.is_catchable());
        assert!(RuntimeError::type_error("x", loc).is_catchable());
        assert_eq!(RuntimeError::type_error("x", loc).location(), loc);
    }
}
