//! Property access: `obj.name`, `obj[key]`, and the property model behind them.
//!
//! Arrays keep their elements outside the property map, so index and `length`
//! reads and writes are routed to the element vector here. Accessors found on
//! the prototype chain are invoked with the original receiver.

use crate::interpreter::builtins::string::{code_unit_string, utf16_len};
use crate::interpreter::constants::MAX_ARRAY_LENGTH;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{array_index, JsObject, ObjectKind, Property};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{AstNode, SourceLocation};
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn evaluate_member_access(
        &mut self,
        object: &AstNode,
        member: &str,
        optional: bool,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let target = self.evaluate_expr(object)?;
        if optional && target.is_nullish() {
            return Err(RuntimeError::OptionalShortCircuit { location });
        }
        self.get_property(&target, member, location)
    }

    pub(crate) fn evaluate_index_access(
        &mut self,
        object: &AstNode,
        index: &AstNode,
        optional: bool,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let target = self.evaluate_expr(object)?;
        if optional && target.is_nullish() {
            return Err(RuntimeError::OptionalShortCircuit { location });
        }
        let key = self.evaluate_expr(index)?;
        self.get_index(&target, &key, location)
    }

    // ========== Allocation ==========

    pub(crate) fn new_object(&mut self) -> ObjectId {
        self.heap.alloc(JsObject::new(
            ObjectKind::Ordinary,
            Some(self.realm.object_prototype),
        ))
    }

    pub(crate) fn new_array(&mut self, values: Vec<Value>) -> ObjectId {
        self.new_array_with_holes(values.into_iter().map(Some).collect())
    }

    pub(crate) fn new_array_with_holes(&mut self, elements: Vec<Option<Value>>) -> ObjectId {
        self.heap.alloc(JsObject::new(
            ObjectKind::Array(elements),
            Some(self.realm.array_prototype),
        ))
    }

    // ========== Reads ==========

    /// `target[key]` for any value
    pub(crate) fn get_property(
        &mut self,
        target: &Value,
        key: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match target {
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    if target.is_undefined() { "undefined" } else { "null" },
                    key
                ),
                location,
            )),
            Value::Object(id) => self.get_from_object(target, *id, key, location),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::from(utf16_len(s)));
                }
                if let Some(index) = array_index(key) {
                    return Ok(code_unit_string(s, index as usize)
                        .map(Value::from)
                        .unwrap_or_default());
                }
                let proto = self.realm.string_prototype;
                self.get_from_object(target, proto, key, location)
            }
            Value::Number(_) => {
                let proto = self.realm.number_prototype;
                self.get_from_object(target, proto, key, location)
            }
            Value::Bool(_) => {
                let proto = self.realm.boolean_prototype;
                self.get_from_object(target, proto, key, location)
            }
        }
    }

    /// Property lookup starting at `id`, with `receiver` as `this` for getters
    fn get_from_object(
        &mut self,
        receiver: &Value,
        id: ObjectId,
        key: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let ObjectKind::Array(elements) = &self.heap.get(id).kind {
            if key == "length" {
                return Ok(Value::from(elements.len()));
            }
            if let Some(index) = array_index(key) {
                if let Some(Some(value)) = elements.get(index as usize) {
                    return Ok(value.clone());
                }
            }
        }

        let found = self
            .heap
            .find_property(id, key)
            .map(|(_, prop)| (prop.is_accessor(), prop.getter, prop.value.clone()));
        match found {
            Some((true, Some(getter), _)) => {
                self.call_function(&Value::Object(getter), receiver.clone(), Vec::new(), location)
            }
            Some((true, None, _)) | None => Ok(Value::Undefined),
            Some((false, _, value)) => Ok(value),
        }
    }

    /// `target[index]` where `index` is any value
    pub(crate) fn get_index(
        &mut self,
        target: &Value,
        index: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let (Value::Object(id), Some(i)) = (target, integer_index(index)) {
            if let ObjectKind::Array(elements) = &self.heap.get(*id).kind {
                if let Some(Some(value)) = elements.get(i) {
                    return Ok(value.clone());
                }
            }
        }
        if let (Value::String(s), Some(i)) = (target, integer_index(index)) {
            return Ok(code_unit_string(s, i).map(Value::from).unwrap_or_default());
        }
        let key = self.to_property_key(index, location)?;
        self.get_property(target, &key, location)
    }

    // ========== Writes ==========

    /// `target[key] = value`, honouring setters, frozen objects and array length
    pub(crate) fn set_property(
        &mut self,
        target: &Value,
        key: Rc<str>,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let id = match target {
            Value::Undefined | Value::Null => {
                return Err(RuntimeError::type_error(
                    format!(
                        "Cannot set properties of {} (setting '{}')",
                        if target.is_undefined() { "undefined" } else { "null" },
                        key
                    ),
                    location,
                ))
            }
            Value::Object(id) => *id,
            // Writes to primitives are dropped
            _ => return Ok(()),
        };

        let accessor = self
            .heap
            .find_property(id, &key)
            .filter(|(_, prop)| prop.is_accessor())
            .map(|(_, prop)| prop.setter);
        if let Some(setter) = accessor {
            if let Some(setter) = setter {
                self.call_function(&Value::Object(setter), target.clone(), vec![value], location)?;
            }
            return Ok(());
        }

        if self.heap.get(id).frozen {
            return Ok(());
        }

        let is_array = self.heap.get(id).is_array();
        if is_array && &*key == "length" {
            let length = self.to_array_length(&value, location)?;
            if let ObjectKind::Array(elements) = &mut self.heap.get_mut(id).kind {
                elements.resize(length, None);
            }
            return Ok(());
        }
        if is_array {
            if let Some(index) = array_index(&key) {
                return self.set_element(id, index as usize, value, location);
            }
        }

        let properties = &mut self.heap.get_mut(id).properties;
        match properties.get_mut(&key) {
            Some(existing) => existing.value = value,
            None => properties.insert(key, Property::data(value)),
        }
        Ok(())
    }

    /// `target[index] = value` where `index` is any value
    pub(crate) fn set_index(
        &mut self,
        target: &Value,
        index: &Value,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if let (Value::Object(id), Some(i)) = (target, integer_index(index)) {
            let object = self.heap.get(*id);
            if object.is_array() && !object.frozen {
                return self.set_element(*id, i, value, location);
            }
        }
        let key = self.to_property_key(index, location)?;
        self.set_property(target, key, value, location)
    }

    /// Store an array element, growing the array with holes as needed
    fn set_element(
        &mut self,
        id: ObjectId,
        index: usize,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if index >= MAX_ARRAY_LENGTH {
            return Err(RuntimeError::range_error("Invalid array length", location));
        }
        if let ObjectKind::Array(elements) = &mut self.heap.get_mut(id).kind {
            if index >= elements.len() {
                elements.resize(index + 1, None);
            }
            elements[index] = Some(value);
        }
        Ok(())
    }

    /// Create or overwrite an own data property without consulting setters
    pub(crate) fn define_own(&mut self, id: ObjectId, key: Rc<str>, value: Value) {
        let object = self.heap.get_mut(id);
        if let ObjectKind::Array(elements) = &mut object.kind {
            if let Some(index) = array_index(&key) {
                let index = index as usize;
                if index < MAX_ARRAY_LENGTH {
                    if index >= elements.len() {
                        elements.resize(index + 1, None);
                    }
                    elements[index] = Some(value);
                }
                return;
            }
        }
        object.properties.insert(key, Property::data(value));
    }

    /// Validate a value assigned to `array.length`
    pub(crate) fn to_array_length(
        &mut self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<usize, RuntimeError> {
        let n = self.to_number(value, location)?;
        if n < 0.0 || n.fract() != 0.0 || n > MAX_ARRAY_LENGTH as f64 {
            return Err(RuntimeError::range_error("Invalid array length", location));
        }
        Ok(n as usize)
    }

    /// `delete target[key]`
    pub(crate) fn delete_property(
        &mut self,
        target: &Value,
        key: &str,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        let id = match target {
            Value::Undefined | Value::Null => {
                return Err(RuntimeError::type_error(
                    "Cannot convert undefined or null to object",
                    location,
                ))
            }
            Value::Object(id) => *id,
            _ => return Ok(true),
        };

        let object = self.heap.get_mut(id);
        if object.frozen {
            return Ok(false);
        }
        if let ObjectKind::Array(elements) = &mut object.kind {
            if key == "length" {
                return Ok(false);
            }
            if let Some(index) = array_index(key) {
                if let Some(slot) = elements.get_mut(index as usize) {
                    *slot = None;
                }
                return Ok(true);
            }
        }
        object.properties.remove(key);
        Ok(true)
    }

    // ========== Queries ==========

    /// `key in object`, including the prototype chain
    pub(crate) fn has_property(&self, id: ObjectId, key: &str) -> bool {
        self.has_own_property(id, key) || self.heap.find_property(id, key).is_some()
    }

    pub(crate) fn has_own_property(&self, id: ObjectId, key: &str) -> bool {
        let object = self.heap.get(id);
        if let ObjectKind::Array(elements) = &object.kind {
            if key == "length" {
                return true;
            }
            if let Some(index) = array_index(key) {
                return matches!(elements.get(index as usize), Some(Some(_)));
            }
        }
        object.properties.contains(key)
    }

    /// Own enumerable string keys in property order (`Object.keys`)
    pub(crate) fn own_enumerable_keys(&self, id: ObjectId) -> Vec<Rc<str>> {
        let object = self.heap.get(id);
        let mut keys: Vec<Rc<str>> = Vec::new();
        if let ObjectKind::Array(elements) = &object.kind {
            keys.extend(
                elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.is_some())
                    .map(|(i, _)| Rc::from(i.to_string())),
            );
        }
        keys.extend(
            object
                .properties
                .ordered()
                .into_iter()
                .filter(|(key, prop)| prop.enumerable && !key.starts_with('#'))
                .map(|(key, _)| key),
        );
        keys
    }

    /// Enumerable keys for `for...in`: own keys first, then inherited ones
    pub(crate) fn enumerable_keys_with_inherited(&self, id: ObjectId) -> Vec<Rc<str>> {
        let mut keys = self.own_enumerable_keys(id);
        let mut current = self.heap.get(id).prototype;
        while let Some(proto) = current {
            for key in self.own_enumerable_keys(proto) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            current = self.heap.get(proto).prototype;
        }
        keys
    }

    /// Elements of an array object (holes included), if it is one
    pub(crate) fn array_elements(&self, value: &Value) -> Option<&Vec<Option<Value>>> {
        match &self.heap.get(value.as_object()?).kind {
            ObjectKind::Array(elements) => Some(elements),
            _ => None,
        }
    }
}

/// Non-negative integral number usable directly as an element index
fn integer_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < MAX_ARRAY_LENGTH as f64 => {
            Some(*n as usize)
        }
        _ => None,
    }
}
