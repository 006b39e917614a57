//! `Map` and `Set`
//!
//! Entries live in insertion order in the object's [`ObjectKind`] slot and are
//! compared with SameValueZero. Lookups are linear, which is fine for the
//! collection sizes snippets build.

use super::arg;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{JsObject, NativeFn, ObjectKind};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;

pub(super) fn install(interp: &mut Interpreter) {
    let map_proto = interp.realm.map_prototype;
    interp.define_constructor("Map", 0, map_constructor, map_proto);
    let map_methods: [(&'static str, usize, NativeFn); 9] = [
        ("get", 1, map_get),
        ("set", 2, map_set),
        ("has", 1, map_has),
        ("delete", 1, map_delete),
        ("clear", 0, map_clear),
        ("forEach", 1, map_for_each),
        ("keys", 0, map_keys),
        ("values", 0, map_values),
        ("entries", 0, map_entries),
    ];
    for (name, length, call) in map_methods {
        interp.define_method(map_proto, name, length, call);
    }
    interp.define_getter(map_proto, "size", map_size);

    let set_proto = interp.realm.set_prototype;
    interp.define_constructor("Set", 0, set_constructor, set_proto);
    let set_methods: [(&'static str, usize, NativeFn); 8] = [
        ("add", 1, set_add),
        ("has", 1, set_has),
        ("delete", 1, set_delete),
        ("clear", 0, set_clear),
        ("forEach", 1, set_for_each),
        ("values", 0, set_values),
        ("keys", 0, set_values),
        ("entries", 0, set_entries),
    ];
    for (name, length, call) in set_methods {
        interp.define_method(set_proto, name, length, call);
    }
    interp.define_getter(set_proto, "size", set_size);
}

/// The object a collection constructor fills: `this` under `new`
fn construct_target(
    interp: &mut Interpreter,
    this: &Value,
    name: &str,
    kind: ObjectKind,
    prototype: ObjectId,
    location: SourceLocation,
) -> Result<ObjectId, RuntimeError> {
    match this {
        Value::Object(id) if matches!(interp.heap.get(*id).kind, ObjectKind::Ordinary) => {
            interp.heap.get_mut(*id).kind = kind;
            Ok(*id)
        }
        Value::Undefined => Err(RuntimeError::type_error(
            format!("Constructor {} requires 'new'", name),
            location,
        )),
        _ => Ok(interp.heap.alloc(JsObject::new(kind, Some(prototype)))),
    }
}

// ========== Map ==========

fn this_map<'a>(
    interp: &'a mut Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<&'a mut Vec<(Value, Value)>, RuntimeError> {
    let incompatible = || {
        RuntimeError::type_error(
            format!("Method Map.prototype.{} called on incompatible receiver", method),
            location,
        )
    };
    let id = this.as_object().ok_or_else(incompatible)?;
    match &mut interp.heap.get_mut(id).kind {
        ObjectKind::Map(entries) => Ok(entries),
        _ => Err(incompatible()),
    }
}

fn map_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.map_prototype;
    let id = construct_target(interp, this, "Map", ObjectKind::Map(Vec::new()), proto, location)?;
    let source = arg(args, 0);
    if source.is_nullish() {
        return Ok(Value::Object(id));
    }

    let mut entries: Vec<(Value, Value)> = Vec::new();
    for entry in interp.iterate(&source, location)? {
        if entry.as_object().is_none() {
            let shown = interp.inspector().inspect(&entry);
            return Err(RuntimeError::type_error(
                format!("Iterator value {} is not an entry object", shown),
                location,
            ));
        }
        let key = interp.get_index(&entry, &Value::Number(0.0), location)?;
        let value = interp.get_index(&entry, &Value::Number(1.0), location)?;
        match entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
            Some(existing) => existing.1 = value,
            None => entries.push((key, value)),
        }
    }
    if let ObjectKind::Map(slot) = &mut interp.heap.get_mut(id).kind {
        *slot = entries;
    }
    Ok(Value::Object(id))
}

fn map_get(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let key = arg(args, 0);
    let entries = this_map(interp, this, "get", location)?;
    Ok(entries
        .iter()
        .find(|(k, _)| k.same_value_zero(&key))
        .map(|(_, v)| v.clone())
        .unwrap_or_default())
}

/// `map.set(key, value)`, returning the map for chaining
fn map_set(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut key = arg(args, 0);
    // -0 is normalized to +0 as a key
    if key.as_number() == Some(0.0) {
        key = Value::Number(0.0);
    }
    let value = arg(args, 1);
    let entries = this_map(interp, this, "set", location)?;
    match entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
        Some(existing) => existing.1 = value,
        None => entries.push((key, value)),
    }
    Ok(this.clone())
}

fn map_has(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let key = arg(args, 0);
    let entries = this_map(interp, this, "has", location)?;
    Ok(Value::Bool(entries.iter().any(|(k, _)| k.same_value_zero(&key))))
}

fn map_delete(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let key = arg(args, 0);
    let entries = this_map(interp, this, "delete", location)?;
    let before = entries.len();
    entries.retain(|(k, _)| !k.same_value_zero(&key));
    Ok(Value::Bool(entries.len() != before))
}

fn map_clear(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    this_map(interp, this, "clear", location)?.clear();
    Ok(Value::Undefined)
}

fn map_size(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let entries = this_map(interp, this, "size", location)?;
    Ok(Value::from(entries.len()))
}

/// `forEach(callback(value, key, map), thisArg)`; entries added during the
/// walk are visited, matching live iteration
fn map_for_each(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    this_map(interp, this, "forEach", location)?;
    let callback = arg(args, 0);
    interp.expect_callable(&callback, location)?;
    let this_arg = arg(args, 1);
    let mut index = 0;
    loop {
        let entry = this_map(interp, this, "forEach", location)?.get(index).cloned();
        let Some((key, value)) = entry else {
            break;
        };
        interp.call_function(&callback, this_arg.clone(), vec![value, key, this.clone()], location)?;
        index += 1;
    }
    Ok(Value::Undefined)
}

fn map_keys(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let keys = this_map(interp, this, "keys", location)?
        .iter()
        .map(|(k, _)| k.clone())
        .collect();
    Ok(Value::Object(interp.new_array(keys)))
}

fn map_values(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let values = this_map(interp, this, "values", location)?
        .iter()
        .map(|(_, v)| v.clone())
        .collect();
    Ok(Value::Object(interp.new_array(values)))
}

fn map_entries(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    this_map(interp, this, "entries", location)?;
    let pairs = interp.iterate(this, location)?;
    Ok(Value::Object(interp.new_array(pairs)))
}

// ========== Set ==========

fn this_set<'a>(
    interp: &'a mut Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<&'a mut Vec<Value>, RuntimeError> {
    let incompatible = || {
        RuntimeError::type_error(
            format!("Method Set.prototype.{} called on incompatible receiver", method),
            location,
        )
    };
    let id = this.as_object().ok_or_else(incompatible)?;
    match &mut interp.heap.get_mut(id).kind {
        ObjectKind::Set(items) => Ok(items),
        _ => Err(incompatible()),
    }
}

fn set_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let proto = interp.realm.set_prototype;
    let id = construct_target(interp, this, "Set", ObjectKind::Set(Vec::new()), proto, location)?;
    let source = arg(args, 0);
    if source.is_nullish() {
        return Ok(Value::Object(id));
    }

    let mut items: Vec<Value> = Vec::new();
    for value in interp.iterate(&source, location)? {
        if !items.iter().any(|v| v.same_value_zero(&value)) {
            items.push(value);
        }
    }
    if let ObjectKind::Set(slot) = &mut interp.heap.get_mut(id).kind {
        *slot = items;
    }
    Ok(Value::Object(id))
}

fn set_add(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut value = arg(args, 0);
    if value.as_number() == Some(0.0) {
        value = Value::Number(0.0);
    }
    let items = this_set(interp, this, "add", location)?;
    if !items.iter().any(|v| v.same_value_zero(&value)) {
        items.push(value);
    }
    Ok(this.clone())
}

fn set_has(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let value = arg(args, 0);
    let items = this_set(interp, this, "has", location)?;
    Ok(Value::Bool(items.iter().any(|v| v.same_value_zero(&value))))
}

fn set_delete(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let value = arg(args, 0);
    let items = this_set(interp, this, "delete", location)?;
    let before = items.len();
    items.retain(|v| !v.same_value_zero(&value));
    Ok(Value::Bool(items.len() != before))
}

fn set_clear(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    this_set(interp, this, "clear", location)?.clear();
    Ok(Value::Undefined)
}

fn set_size(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let items = this_set(interp, this, "size", location)?;
    Ok(Value::from(items.len()))
}

/// `forEach(callback(value, value, set), thisArg)`
fn set_for_each(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    this_set(interp, this, "forEach", location)?;
    let callback = arg(args, 0);
    interp.expect_callable(&callback, location)?;
    let this_arg = arg(args, 1);
    let mut index = 0;
    loop {
        let item = this_set(interp, this, "forEach", location)?.get(index).cloned();
        let Some(value) = item else {
            break;
        };
        interp.call_function(
            &callback,
            this_arg.clone(),
            vec![value.clone(), value, this.clone()],
            location,
        )?;
        index += 1;
    }
    Ok(Value::Undefined)
}

fn set_values(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let values = this_set(interp, this, "values", location)?.clone();
    Ok(Value::Object(interp.new_array(values)))
}

fn set_entries(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let values = this_set(interp, this, "entries", location)?.clone();
    let pairs = values
        .into_iter()
        .map(|v| Value::Object(interp.new_array(vec![v.clone(), v])))
        .collect();
    Ok(Value::Object(interp.new_array(pairs)))
}
