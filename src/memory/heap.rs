//! Object heap for the interpreter
//!
//! Every non-primitive value lives in a single arena, [`Heap`], and is referenced
//! by [`ObjectId`]. Objects are never freed during a run: a realm only lives as
//! long as one snippet evaluation, after which the whole arena is dropped.
//!
//! An object is a [`PropertyMap`] plus a prototype link and an [`ObjectKind`]
//! describing any internal slots (array elements, function code, map entries).

use super::scope::ScopeRef;
use super::value::{ObjectId, Value};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{AstNode, ClassNode, FunctionNode, SourceLocation};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A single own property: either a data property or an accessor pair
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub getter: Option<ObjectId>,
    pub setter: Option<ObjectId>,
    pub enumerable: bool,
}

impl Property {
    /// Enumerable data property, what plain assignment creates
    pub fn data(value: Value) -> Self {
        Property {
            value,
            getter: None,
            setter: None,
            enumerable: true,
        }
    }

    /// Non-enumerable data property (methods on prototypes, `name`, `length`)
    pub fn hidden(value: Value) -> Self {
        Property {
            enumerable: false,
            ..Property::data(value)
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }
}

/// Insertion-ordered property storage with hashed lookup.
///
/// Iteration follows JavaScript's own-key order: integer-like keys in
/// ascending numeric order first, then string keys in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(Rc<str>, Property)>,
    index: FxHashMap<Rc<str>, usize>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Property> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace a property, keeping the original position on replace
    pub fn insert(&mut self, key: Rc<str>, property: Property) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = property;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, property));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Property> {
        let i = self.index.remove(key)?;
        let (_, property) = self.entries.remove(i);
        for (_, slot) in self.index.iter_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(property)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Own keys in JavaScript enumeration order
    pub fn keys(&self) -> Vec<Rc<str>> {
        let mut integer_keys: Vec<(u32, Rc<str>)> = Vec::new();
        let mut string_keys = Vec::new();
        for (key, _) in &self.entries {
            match array_index(key) {
                Some(i) => integer_keys.push((i, key.clone())),
                None => string_keys.push(key.clone()),
            }
        }
        integer_keys.sort_by_key(|(i, _)| *i);
        integer_keys
            .into_iter()
            .map(|(_, k)| k)
            .chain(string_keys)
            .collect()
    }

    /// Own `(key, property)` pairs in enumeration order
    pub fn ordered(&self) -> Vec<(Rc<str>, &Property)> {
        self.keys()
            .into_iter()
            .filter_map(|k| {
                let property = self.get(&k)?;
                Some((k, property))
            })
            .collect()
    }
}

/// Parse a canonical array index (`"0"`, `"17"`, never `"01"` or `"-1"`)
pub fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || key.len() > 10 || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&i| i != u32::MAX)
}

/// Signature of host-implemented functions.
///
/// Receives the interpreter, the `this` value, the evaluated arguments and the
/// call site location.
pub type NativeFn =
    fn(&mut Interpreter, &Value, &[Value], SourceLocation) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub call: NativeFn,
    /// Whether `new` may be applied
    pub constructible: bool,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// Instance field declared in a class body
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub key: Rc<str>,
    pub init: Option<AstNode>,
    pub location: SourceLocation,
}

/// Extra slots carried by class constructors
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub node: Rc<ClassNode>,
    pub fields: Rc<Vec<FieldDef>>,
    /// Constructor named in `extends`, if any
    pub parent: Option<ObjectId>,
}

/// User-defined function with its captured environment
#[derive(Debug, Clone)]
pub struct Closure {
    pub node: Rc<FunctionNode>,
    pub scope: ScopeRef,
    /// Lexical `this` captured by arrow functions
    pub this_value: Option<Value>,
    /// Object whose prototype `super.x` resolves against
    pub home_object: Option<ObjectId>,
    pub class: Option<ClassInfo>,
}

#[derive(Debug, Clone)]
pub enum FunctionObject {
    Closure(Closure),
    Native(NativeFunction),
    Bound {
        target: ObjectId,
        this: Value,
        args: Vec<Value>,
    },
}

/// Compiled regular expression plus its original source and flags
#[derive(Debug, Clone)]
pub struct RegExpData {
    pub source: Rc<str>,
    pub flags: Rc<str>,
    pub regex: Rc<regex::Regex>,
}

impl RegExpData {
    pub fn global(&self) -> bool {
        self.flags.contains('g')
    }

    pub fn sticky(&self) -> bool {
        self.flags.contains('y')
    }
}

/// Internal slots distinguishing exotic objects from ordinary ones
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    /// Elements with `None` for holes
    Array(Vec<Option<Value>>),
    Function(Box<FunctionObject>),
    Error,
    RegExp(RegExpData),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

/// A heap-allocated object
#[derive(Debug, Clone)]
pub struct JsObject {
    pub kind: ObjectKind,
    pub properties: PropertyMap,
    pub prototype: Option<ObjectId>,
    /// Set by `Object.freeze`; writes are silently ignored
    pub frozen: bool,
}

impl JsObject {
    pub fn new(kind: ObjectKind, prototype: Option<ObjectId>) -> Self {
        JsObject {
            kind,
            properties: PropertyMap::new(),
            prototype,
            frozen: false,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Class metadata when this object is a class constructor
    pub fn class_info(&self) -> Option<&ClassInfo> {
        match &self.kind {
            ObjectKind::Function(f) => match f.as_ref() {
                FunctionObject::Closure(c) => c.class.as_ref(),
                _ => None,
            },
            _ => None,
        }
    }
}

/// The object arena
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<JsObject>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an object and return its handle
    pub fn alloc(&mut self, object: JsObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    pub fn get(&self, id: ObjectId) -> &JsObject {
        &self.objects[id.0]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut JsObject {
        &mut self.objects[id.0]
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Walk the prototype chain looking for an own property named `key`.
    /// Returns the holder together with the property.
    pub fn find_property(&self, id: ObjectId, key: &str) -> Option<(ObjectId, &Property)> {
        let mut current = Some(id);
        while let Some(obj_id) = current {
            let object = self.get(obj_id);
            if let Some(property) = object.properties.get(key) {
                return Some((obj_id, property));
            }
            current = object.prototype;
        }
        None
    }

    /// Whether `proto` appears on the prototype chain of `id`
    pub fn inherits_from(&self, id: ObjectId, proto: ObjectId) -> bool {
        let mut current = self.get(id).prototype;
        while let Some(obj_id) = current {
            if obj_id == proto {
                return true;
            }
            current = self.get(obj_id).prototype;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_order_puts_integer_keys_first() {
        let mut map = PropertyMap::new();
        map.insert("b".into(), Property::data(Value::Number(1.0)));
        map.insert("10".into(), Property::data(Value::Number(2.0)));
        map.insert("a".into(), Property::data(Value::Number(3.0)));
        map.insert("2".into(), Property::data(Value::Number(4.0)));

        let keys: Vec<String> = map.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["2", "10", "b", "a"]);
    }

    #[test]
    fn test_replace_keeps_position_and_remove_reindexes() {
        let mut map = PropertyMap::new();
        map.insert("x".into(), Property::data(Value::Number(1.0)));
        map.insert("y".into(), Property::data(Value::Number(2.0)));
        map.insert("z".into(), Property::data(Value::Number(3.0)));
        map.insert("x".into(), Property::data(Value::Number(9.0)));

        assert!(map.remove("y").is_some());
        let keys: Vec<String> = map.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["x", "z"]);
        assert!(matches!(map.get("z").map(|p| &p.value), Some(Value::Number(n)) if *n == 3.0));
        assert!(matches!(map.get("x").map(|p| &p.value), Some(Value::Number(n)) if *n == 9.0));
    }

    #[test]
    fn test_array_index_is_canonical() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("007"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("1.5"), None);
    }

    #[test]
    fn test_prototype_lookup() {
        let mut heap = Heap::new();
        let proto = heap.alloc(JsObject::new(ObjectKind::Ordinary, None));
        heap.get_mut(proto)
            .properties
            .insert("greet".into(), Property::hidden(Value::str("hi")));
        let child = heap.alloc(JsObject::new(ObjectKind::Ordinary, Some(proto)));

        let (holder, _) = heap.find_property(child, "greet").unwrap();
        assert_eq!(holder, proto);
        assert!(heap.inherits_from(child, proto));
        assert!(!heap.inherits_from(proto, child));
    }
}
