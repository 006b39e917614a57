//! The injected `console` object
//!
//! Every method appends exactly one line to the run's [`ConsoleBuffer`]
//! (`groupEnd` and `countReset` append nothing). Severity is not recorded:
//! `warn` and `error` lines land in the same buffer as `log`.
//!
//! [`ConsoleBuffer`]: crate::console::ConsoleBuffer

use super::arg;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::to_boolean;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;

pub(super) fn install(interp: &mut Interpreter) {
    let console = interp.define_namespace("console");
    for name in ["log", "info", "debug", "warn", "error", "trace", "table", "dir"] {
        interp.define_method(console, name, 0, console_log);
    }
    interp.define_method(console, "group", 0, console_group);
    interp.define_method(console, "groupCollapsed", 0, console_group);
    interp.define_method(console, "groupEnd", 0, console_group_end);
    interp.define_method(console, "assert", 0, console_assert);
    interp.define_method(console, "count", 0, console_count);
    interp.define_method(console, "countReset", 0, console_count_reset);
}

impl Interpreter {
    /// Format console arguments and append them as one line
    fn console_print(&mut self, args: &[Value]) {
        let line = self.inspector().format_args(args);
        self.console.push_line(&line);
    }
}

fn console_log(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    interp.console_print(args);
    Ok(Value::Undefined)
}

fn console_group(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        interp.console_print(args);
    }
    interp.console.group();
    Ok(Value::Undefined)
}

fn console_group_end(
    interp: &mut Interpreter,
    _this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    interp.console.group_end();
    Ok(Value::Undefined)
}

/// `console.assert(cond, ...data)`: prints only when `cond` is falsy
fn console_assert(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if to_boolean(&arg(args, 0)) {
        return Ok(Value::Undefined);
    }
    let data = args.get(1..).unwrap_or_default();
    let line = match data.split_first() {
        None => "Assertion failed".to_string(),
        Some((Value::String(first), rest)) => {
            // A leading string message keeps printf semantics
            let mut all = vec![Value::from(format!("Assertion failed: {}", first))];
            all.extend(rest.iter().cloned());
            interp.inspector().format_args(&all)
        }
        Some(_) => {
            let body = interp.inspector().format_args(data);
            format!("Assertion failed: {}", body)
        }
    };
    interp.console.push_line(&line);
    Ok(Value::Undefined)
}

/// Label argument of `count`/`countReset`, `"default"` when absent
fn count_label(
    interp: &mut Interpreter,
    args: &[Value],
    location: SourceLocation,
) -> Result<String, RuntimeError> {
    match arg(args, 0) {
        Value::Undefined => Ok("default".to_string()),
        other => Ok(interp.to_js_string(&other, location)?.to_string()),
    }
}

fn console_count(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let label = count_label(interp, args, location)?;
    let n = interp.console.count(&label);
    interp.console.push_line(&format!("{}: {}", label, n));
    Ok(Value::Undefined)
}

fn console_count_reset(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let label = count_label(interp, args, location)?;
    interp.console.count_reset(&label);
    Ok(Value::Undefined)
}
