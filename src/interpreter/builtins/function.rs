//! `Function.prototype`: `call`, `apply`, `bind`, `toString`

use super::arg;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.function_prototype;
    interp.define_constructor("Function", 1, function_constructor, proto);
    interp.define_method(proto, "call", 1, function_call);
    interp.define_method(proto, "apply", 2, function_apply);
    interp.define_method(proto, "bind", 1, function_bind);
    interp.define_method(proto, "toString", 0, function_to_string);
}

/// Compiling source at runtime is outside the sandbox
fn function_constructor(
    _interp: &mut Interpreter,
    _this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Err(RuntimeError::type_error(
        "Code generation from strings disallowed for this context",
        location,
    ))
}

fn require_callable(
    interp: &Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    if interp.is_callable(this) {
        return Ok(());
    }
    Err(RuntimeError::type_error(
        format!("Function.prototype.{} called on a non-function", method),
        location,
    ))
}

fn function_call(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    require_callable(interp, this, "call", location)?;
    let rest = args.get(1..).unwrap_or_default().to_vec();
    interp.call_function(this, arg(args, 0), rest, location)
}

fn function_apply(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    require_callable(interp, this, "apply", location)?;
    let list = match arg(args, 1) {
        Value::Undefined | Value::Null => Vec::new(),
        list @ Value::Object(_) => interp.iterate(&list, location)?,
        _ => {
            return Err(RuntimeError::type_error(
                "CreateListFromArrayLike called on non-object",
                location,
            ))
        }
    };
    interp.call_function(this, arg(args, 0), list, location)
}

fn function_bind(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    require_callable(interp, this, "bind", location)?;
    let Some(target) = this.as_object() else {
        return Ok(Value::Undefined);
    };
    let rest = args.get(1..).unwrap_or_default().to_vec();
    Ok(Value::Object(interp.bind_function(target, arg(args, 0), rest)))
}

/// Source text is not retained, so every function prints a native-style body
fn function_to_string(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    require_callable(interp, this, "toString", location)?;
    let Some(id) = this.as_object() else {
        return Ok(Value::Undefined);
    };
    let name = match interp.heap.get(id).properties.get("name") {
        Some(prop) => prop.value.as_str().unwrap_or_default().to_string(),
        None => String::new(),
    };
    let text = if interp.heap.get(id).class_info().is_some() {
        format!("class {} {{ }}", name)
    } else {
        format!("function {}() {{ [native code] }}", name)
    };
    Ok(Value::from(text))
}
