//! `Object` and `Object.prototype`

use super::arg;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{JsObject, ObjectKind, Property};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;
use std::rc::Rc;

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.object_prototype;
    let ctor = interp.define_constructor("Object", 1, object_constructor, proto);

    interp.define_method(ctor, "keys", 1, object_keys);
    interp.define_method(ctor, "values", 1, object_values);
    interp.define_method(ctor, "entries", 1, object_entries);
    interp.define_method(ctor, "assign", 2, object_assign);
    interp.define_method(ctor, "fromEntries", 1, object_from_entries);
    interp.define_method(ctor, "freeze", 1, object_freeze);
    interp.define_method(ctor, "isFrozen", 1, object_is_frozen);
    interp.define_method(ctor, "create", 2, object_create);
    interp.define_method(ctor, "getPrototypeOf", 1, object_get_prototype_of);
    interp.define_method(ctor, "setPrototypeOf", 2, object_set_prototype_of);
    interp.define_method(ctor, "getOwnPropertyNames", 1, object_get_own_property_names);
    interp.define_method(ctor, "defineProperty", 3, object_define_property);

    interp.define_method(proto, "hasOwnProperty", 1, object_has_own_property);
    interp.define_method(proto, "isPrototypeOf", 1, object_is_prototype_of);
    interp.define_method(proto, "toString", 0, object_to_string);
    interp.define_method(proto, "toLocaleString", 0, object_to_string);
    interp.define_method(proto, "valueOf", 0, object_value_of);
}

impl Interpreter {
    /// Reject `null`/`undefined` where an object is required
    fn require_object_coercible(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if value.is_nullish() {
            return Err(RuntimeError::type_error(
                "Cannot convert undefined or null to object",
                location,
            ));
        }
        Ok(())
    }

    /// Own enumerable keys of any value (string primitives expose their indices)
    pub(crate) fn enumerable_keys_of(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Vec<Rc<str>>, RuntimeError> {
        self.require_object_coercible(value, location)?;
        Ok(match value {
            Value::Object(id) => self.own_enumerable_keys(*id),
            Value::String(s) => (0..super::string::utf16_len(s))
                .map(|i| Rc::from(i.to_string()))
                .collect(),
            _ => Vec::new(),
        })
    }
}

fn object_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match arg(args, 0) {
        value @ Value::Object(_) => Ok(value),
        _ => match this {
            // `new Object()` / `super()` from a class extending Object
            Value::Object(_) => Ok(this.clone()),
            _ => Ok(Value::Object(interp.new_object())),
        },
    }
}

fn object_keys(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let keys = interp.enumerable_keys_of(&arg(args, 0), location)?;
    let values = keys.into_iter().map(Value::String).collect();
    Ok(Value::Object(interp.new_array(values)))
}

fn object_values(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    let keys = interp.enumerable_keys_of(&target, location)?;
    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        values.push(interp.get_property(&target, &key, location)?);
    }
    Ok(Value::Object(interp.new_array(values)))
}

fn object_entries(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    let keys = interp.enumerable_keys_of(&target, location)?;
    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let value = interp.get_property(&target, &key, location)?;
        let pair = interp.new_array(vec![Value::String(key), value]);
        entries.push(Value::Object(pair));
    }
    Ok(Value::Object(interp.new_array(entries)))
}

fn object_assign(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    interp.require_object_coercible(&target, location)?;
    let Some(id) = target.as_object() else {
        // Primitive targets would be boxed; without wrapper objects, return as is
        return Ok(target);
    };
    for source in args.iter().skip(1) {
        interp.copy_data_properties(id, source, location)?;
    }
    Ok(target)
}

fn object_from_entries(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let entries = interp.iterate(&arg(args, 0), location)?;
    let object = interp.new_object();
    for entry in entries {
        if entry.as_object().is_none() {
            let shown = interp.inspector().inspect(&entry);
            return Err(RuntimeError::type_error(
                format!("Iterator value {} is not an entry object", shown),
                location,
            ));
        }
        let key = interp.get_index(&entry, &Value::Number(0.0), location)?;
        let value = interp.get_index(&entry, &Value::Number(1.0), location)?;
        let key = interp.to_property_key(&key, location)?;
        interp.define_own(object, key, value);
    }
    Ok(Value::Object(object))
}

fn object_freeze(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    if let Some(id) = target.as_object() {
        interp.heap.get_mut(id).frozen = true;
    }
    Ok(target)
}

fn object_is_frozen(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let frozen = match arg(args, 0) {
        Value::Object(id) => interp.heap.get(id).frozen,
        // Primitives are trivially frozen
        _ => true,
    };
    Ok(Value::Bool(frozen))
}

/// Prototype argument of `Object.create` / `Object.setPrototypeOf`
fn prototype_arg(
    interp: &Interpreter,
    value: &Value,
    location: SourceLocation,
) -> Result<Option<ObjectId>, RuntimeError> {
    match value {
        Value::Object(id) => Ok(Some(*id)),
        Value::Null => Ok(None),
        other => {
            let shown = interp.inspector().inspect(other);
            Err(RuntimeError::type_error(
                format!("Object prototype may only be an Object or null: {}", shown),
                location,
            ))
        }
    }
}

fn object_create(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let prototype = prototype_arg(interp, &arg(args, 0), location)?;
    let id = interp.heap.alloc(JsObject::new(ObjectKind::Ordinary, prototype));
    if let Value::Object(_) = arg(args, 1) {
        define_properties(interp, id, &arg(args, 1), location)?;
    }
    Ok(Value::Object(id))
}

fn object_get_prototype_of(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    interp.require_object_coercible(&target, location)?;
    let prototype = match &target {
        Value::Object(id) => interp.heap.get(*id).prototype,
        Value::String(_) => Some(interp.realm.string_prototype),
        Value::Number(_) => Some(interp.realm.number_prototype),
        Value::Bool(_) => Some(interp.realm.boolean_prototype),
        _ => None,
    };
    Ok(prototype.map(Value::Object).unwrap_or(Value::Null))
}

fn object_set_prototype_of(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    interp.require_object_coercible(&target, location)?;
    let prototype = prototype_arg(interp, &arg(args, 1), location)?;
    if let Some(id) = target.as_object() {
        if prototype.is_some_and(|p| p == id || interp.heap.inherits_from(p, id)) {
            return Err(RuntimeError::type_error("Cyclic __proto__ value", location));
        }
        interp.heap.get_mut(id).prototype = prototype;
    }
    Ok(target)
}

fn object_get_own_property_names(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    interp.require_object_coercible(&target, location)?;
    let mut names: Vec<Value> = Vec::new();
    if let Some(id) = target.as_object() {
        let object = interp.heap.get(id);
        if let ObjectKind::Array(elements) = &object.kind {
            names.extend(
                elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.is_some())
                    .map(|(i, _)| Value::from(i.to_string())),
            );
            names.push(Value::str("length"));
        }
        names.extend(
            object
                .properties
                .keys()
                .into_iter()
                .filter(|key| !key.starts_with('#'))
                .map(Value::String),
        );
    }
    Ok(Value::Object(interp.new_array(names)))
}

/// `Object.defineProperty(obj, key, descriptor)` for data and accessor descriptors
fn object_define_property(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let target = arg(args, 0);
    let Some(id) = target.as_object() else {
        return Err(RuntimeError::type_error(
            "Object.defineProperty called on non-object",
            location,
        ));
    };
    let key = interp.to_property_key(&arg(args, 1), location)?;
    define_one_property(interp, id, key, &arg(args, 2), location)?;
    Ok(target)
}

fn define_properties(
    interp: &mut Interpreter,
    id: ObjectId,
    descriptors: &Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let keys = interp.enumerable_keys_of(descriptors, location)?;
    for key in keys {
        let descriptor = interp.get_property(descriptors, &key, location)?;
        define_one_property(interp, id, key, &descriptor, location)?;
    }
    Ok(())
}

fn define_one_property(
    interp: &mut Interpreter,
    id: ObjectId,
    key: Rc<str>,
    descriptor: &Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let Some(desc_id) = descriptor.as_object() else {
        let shown = interp.inspector().inspect(descriptor);
        return Err(RuntimeError::type_error(
            format!("Property description must be an object: {}", shown),
            location,
        ));
    };
    let field = |interp: &mut Interpreter, name: &str| -> Result<Option<Value>, RuntimeError> {
        if interp.has_property(desc_id, name) {
            interp.get_property(descriptor, name, location).map(Some)
        } else {
            Ok(None)
        }
    };
    let enumerable = field(interp, "enumerable")?
        .map(|v| crate::interpreter::type_system::to_boolean(&v))
        .unwrap_or(false);
    let getter = field(interp, "get")?.and_then(|v| v.as_object());
    let setter = field(interp, "set")?.and_then(|v| v.as_object());

    if getter.is_some() || setter.is_some() {
        interp.define_accessor(id, key, getter, setter, enumerable);
        return Ok(());
    }

    let value = field(interp, "value")?.unwrap_or_default();
    if interp.heap.get(id).is_array() && crate::memory::heap::array_index(&key).is_some() {
        interp.define_own(id, key, value);
        return Ok(());
    }
    interp.heap.get_mut(id).properties.insert(
        key,
        Property {
            value,
            getter: None,
            setter: None,
            enumerable,
        },
    );
    Ok(())
}

fn object_has_own_property(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let key = interp.to_property_key(&arg(args, 0), location)?;
    let result = match this {
        Value::Object(id) => interp.has_own_property(*id, &key),
        Value::String(s) => {
            &*key == "length"
                || crate::memory::heap::array_index(&key)
                    .is_some_and(|i| (i as usize) < super::string::utf16_len(s))
        }
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn object_is_prototype_of(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let result = match (this, arg(args, 0)) {
        (Value::Object(proto), Value::Object(id)) => interp.heap.inherits_from(id, *proto),
        _ => false,
    };
    Ok(Value::Bool(result))
}

/// `Object.prototype.toString`: `[object Tag]`
fn object_to_string(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let tag = match this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Object(id) => match interp.heap.get(*id).kind {
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error => "Error",
            ObjectKind::RegExp(_) => "RegExp",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Set(_) => "Set",
            ObjectKind::Ordinary => "Object",
        },
    };
    Ok(Value::from(format!("[object {}]", tag)))
}

fn object_value_of(
    _interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(this.clone())
}
