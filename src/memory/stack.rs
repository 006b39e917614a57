//! Call stack implementation
//!
//! This module provides the call stack used for function execution:
//! - [`CallStack`]: The stack of active frames
//! - [`Frame`]: A single function's activation record (`this`, callee, call site)
//! - [`TraceFrame`]: One line of a captured stack trace
//!
//! Variables do not live here; they live in [`Scope`](super::scope::Scope)
//! chains, since closures may outlive the frame that created them.

use super::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;
use std::rc::Rc;

/// Name used for the top-level program frame in traces
pub const TOP_LEVEL_NAME: &str = "<anonymous>";

/// Activation record for a function call
#[derive(Debug, Clone)]
pub struct Frame {
    pub function_name: Rc<str>,
    /// Location of the call expression in the caller
    pub call_site: SourceLocation,
    pub this: Value,
    /// False inside a derived constructor until `super()` returns
    pub this_initialized: bool,
    pub home_object: Option<ObjectId>,
    /// The function object being executed
    pub callee: Option<ObjectId>,
}

impl Frame {
    pub fn top_level(this: Value) -> Self {
        Frame {
            function_name: Rc::from(TOP_LEVEL_NAME),
            call_site: SourceLocation::new(1, 1),
            this,
            this_initialized: true,
            home_object: None,
            callee: None,
        }
    }
}

/// One entry of a stack trace, innermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub function_name: Rc<str>,
    pub location: SourceLocation,
}

/// The call stack
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Capture a trace for an error raised at `location` in the innermost frame.
    ///
    /// Each frame reports where execution was inside it: the innermost one at
    /// `location`, every outer one at the call site of the frame above it.
    pub fn trace(&self, location: SourceLocation) -> Vec<TraceFrame> {
        let mut trace = Vec::with_capacity(self.frames.len());
        let mut at = location;
        for frame in self.frames.iter().rev() {
            trace.push(TraceFrame {
                function_name: frame.function_name.clone(),
                location: at,
            });
            at = frame.call_site;
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_uses_call_sites_of_inner_frames() {
        let mut stack = CallStack::new();
        stack.push(Frame::top_level(Value::Undefined));
        stack.push(Frame {
            function_name: Rc::from("outer"),
            call_site: SourceLocation::new(10, 1),
            ..Frame::top_level(Value::Undefined)
        });
        stack.push(Frame {
            function_name: Rc::from("inner"),
            call_site: SourceLocation::new(5, 3),
            ..Frame::top_level(Value::Undefined)
        });

        let trace = stack.trace(SourceLocation::new(2, 9));
        let rendered: Vec<(String, usize)> = trace
            .iter()
            .map(|t| (t.function_name.to_string(), t.location.line))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("inner".to_string(), 2),
                ("outer".to_string(), 5),
                (TOP_LEVEL_NAME.to_string(), 10),
            ]
        );
    }
}
