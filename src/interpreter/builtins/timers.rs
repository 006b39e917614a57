//! Timer stubs and `Date.now`
//!
//! A run ends when the top-level code finishes, so scheduled callbacks never
//! fire. The scheduling functions still validate their callback and hand out
//! increasing numeric handles so snippets that use them do not fail.

use super::arg;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::NativeFn;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use std::time::{SystemTime, UNIX_EPOCH};

pub(super) fn install(interp: &mut Interpreter) {
    let timers: [(&'static str, usize, NativeFn); 7] = [
        ("setTimeout", 2, schedule),
        ("setInterval", 2, schedule),
        ("setImmediate", 1, schedule),
        ("queueMicrotask", 1, queue_microtask),
        ("clearTimeout", 1, clear),
        ("clearInterval", 1, clear),
        ("clearImmediate", 1, clear),
    ];
    for (name, length, call) in timers {
        let function = interp.native_function(name, length, call, false);
        interp.define_global(name, Value::Object(function));
    }

    let date = interp.define_namespace("Date");
    interp.define_method(date, "now", 0, date_now);
}

impl Interpreter {
    fn next_timer_handle(&mut self) -> Value {
        let id = self.next_timer_id;
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        Value::Number(id as f64)
    }
}

fn require_callback(
    interp: &Interpreter,
    callback: &Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    if interp.is_callable(callback) {
        return Ok(());
    }
    let shown = interp.inspector().inspect(callback);
    Err(RuntimeError::type_error(
        format!(
            "The \"callback\" argument must be of type function. Received {}",
            shown
        ),
        location,
    ))
}

/// `setTimeout`/`setInterval`/`setImmediate`: the callback is dropped
fn schedule(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    require_callback(interp, &arg(args, 0), location)?;
    let handle = interp.next_timer_handle();
    tracing::trace!(handle = ?handle, "timer scheduled, will not fire");
    Ok(handle)
}

fn queue_microtask(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    require_callback(interp, &arg(args, 0), location)?;
    Ok(Value::Undefined)
}

fn clear(
    _interp: &mut Interpreter,
    _this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(Value::Undefined)
}

/// Milliseconds since the Unix epoch
fn date_now(
    _interp: &mut Interpreter,
    _this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0);
    Ok(Value::Number(millis))
}
