//! `Error` and its subclasses
//!
//! Error objects carry `message` and `stack` as own non-enumerable
//! properties; `name` is inherited from the prototype. The stack is rendered
//! when the object is created, so it names the frames active at `new Error()`
//! rather than at `throw`.

use super::arg;
use crate::interpreter::engine::{format_trace, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{JsObject, NativeFn, ObjectKind};
use crate::memory::stack::TraceFrame;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;

pub(super) fn install(interp: &mut Interpreter) {
    let realm = interp.realm.clone();
    let kinds: [(&'static str, ObjectId, NativeFn); 5] = [
        ("Error", realm.error_prototype, error_constructor),
        ("TypeError", realm.type_error_prototype, type_error_constructor),
        ("RangeError", realm.range_error_prototype, range_error_constructor),
        ("ReferenceError", realm.reference_error_prototype, reference_error_constructor),
        ("SyntaxError", realm.syntax_error_prototype, syntax_error_constructor),
    ];

    let mut base = None;
    for (name, prototype, call) in kinds {
        let ctor = interp.define_constructor(name, 1, call, prototype);
        interp.define_value(prototype, "name", Value::str(name));
        interp.define_value(prototype, "message", Value::str(""));
        match base {
            None => base = Some(ctor),
            // `TypeError.__proto__ === Error`
            Some(error_ctor) => interp.heap.get_mut(ctor).prototype = Some(error_ctor),
        }
    }

    interp.define_method(realm.error_prototype, "toString", 0, error_to_string);
}

impl Interpreter {
    /// Allocate an error object whose `stack` lists `trace`
    pub(crate) fn create_error(&mut self, name: &str, message: &str, trace: &[TraceFrame]) -> ObjectId {
        let prototype = self.realm.error_prototype_for(name);
        let id = self.heap.alloc(JsObject::new(ObjectKind::Error, Some(prototype)));
        if !message.is_empty() {
            self.define_value(id, "message", Value::str(message));
        }
        self.attach_stack(id, trace);
        id
    }

    /// Render the `stack` property: the error header followed by `at` lines
    fn attach_stack(&mut self, id: ObjectId, trace: &[TraceFrame]) {
        let mut stack = self.inspector().error_header(id);
        for line in format_trace(trace) {
            stack.push('\n');
            stack.push_str(&line);
        }
        self.define_value(id, "stack", Value::from(stack));
    }
}

/// Shared body of the error constructors.
///
/// With `new` (or `super()` from a subclass) `this` is an ordinary object
/// already linked to the right prototype; it is converted in place. A plain
/// call allocates a fresh error of the default kind.
fn construct_error(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
    default_prototype: ObjectId,
) -> Result<Value, RuntimeError> {
    let id = match this {
        Value::Object(id) if matches!(interp.heap.get(*id).kind, ObjectKind::Ordinary) => {
            interp.heap.get_mut(*id).kind = ObjectKind::Error;
            *id
        }
        _ => interp
            .heap
            .alloc(JsObject::new(ObjectKind::Error, Some(default_prototype))),
    };

    let message = arg(args, 0);
    if !message.is_undefined() {
        let text = interp.to_js_string(&message, location)?;
        interp.define_value(id, "message", Value::String(text));
    }
    if let Some(options) = args.get(1).and_then(Value::as_object) {
        if interp.has_property(options, "cause") {
            let cause = interp.get_property(&Value::Object(options), "cause", location)?;
            interp.define_value(id, "cause", cause);
        }
    }

    let trace = interp.call_stack.trace(location);
    interp.attach_stack(id, &trace);
    Ok(Value::Object(id))
}

fn error_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.error_prototype;
    construct_error(interp, this, args, location, proto)
}

fn type_error_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.type_error_prototype;
    construct_error(interp, this, args, location, proto)
}

fn range_error_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.range_error_prototype;
    construct_error(interp, this, args, location, proto)
}

fn reference_error_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.reference_error_prototype;
    construct_error(interp, this, args, location, proto)
}

fn syntax_error_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.syntax_error_prototype;
    construct_error(interp, this, args, location, proto)
}

/// `Error.prototype.toString`
fn error_to_string(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if this.as_object().is_none() {
        return Err(RuntimeError::type_error(
            "Error.prototype.toString requires that 'this' be an Object",
            location,
        ));
    }
    let name = match interp.get_property(this, "name", location)? {
        Value::Undefined => "Error".into(),
        other => interp.to_js_string(&other, location)?,
    };
    let message = match interp.get_property(this, "message", location)? {
        Value::Undefined => "".into(),
        other => interp.to_js_string(&other, location)?,
    };
    let text = match (name.is_empty(), message.is_empty()) {
        (_, true) => name.to_string(),
        (true, false) => message.to_string(),
        (false, false) => format!("{}: {}", name, message),
    };
    Ok(Value::from(text))
}
