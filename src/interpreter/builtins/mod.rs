//! Built-in objects of the sandbox realm
//!
//! This module creates the intrinsic prototypes ([`Realm`]) and installs the
//! global bindings a snippet can see: the injected `console`, the standard
//! constructors and namespaces, and the timer stubs.
//!
//! # Supported Built-ins
//!
//! - [`console`]: `log`, `info`, `warn`, `error`, `group`, `count`, `assert`, ...
//! - [`object`]: `Object` and `Object.prototype`
//! - [`array`]: `Array` and `Array.prototype`
//! - [`string`]: `String` and `String.prototype`
//! - [`number`]: `Number`, `Boolean`, `Math` and the numeric globals
//! - [`json`]: `JSON.stringify` / `JSON.parse`
//! - [`regexp`]: `RegExp`, backed by the `regex` crate
//! - [`collections`]: `Map` and `Set`
//! - [`error`]: `Error` and its subclasses
//! - [`function`]: `Function.prototype.call/apply/bind/toString`
//! - [`timers`]: `setTimeout` and friends (never fire), `Date.now`
//!
//! # Implementation Notes
//!
//! Every built-in is a plain [`NativeFn`] receiving the interpreter, `this`,
//! the evaluated arguments and the call site. Methods are installed as
//! non-enumerable properties so they never show up in console output.

pub mod array;
pub mod collections;
pub mod console;
pub mod error;
pub mod function;
pub mod json;
pub mod number;
pub mod object;
pub mod regexp;
pub mod string;
pub mod timers;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{FunctionObject, Heap, JsObject, NativeFn, NativeFunction, ObjectKind, Property};
use crate::memory::scope::Binding;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;
use std::rc::Rc;

/// Intrinsic objects shared by everything created in one run
#[derive(Debug, Clone)]
pub(crate) struct Realm {
    pub object_prototype: ObjectId,
    pub function_prototype: ObjectId,
    pub array_prototype: ObjectId,
    pub string_prototype: ObjectId,
    pub number_prototype: ObjectId,
    pub boolean_prototype: ObjectId,
    pub error_prototype: ObjectId,
    pub type_error_prototype: ObjectId,
    pub range_error_prototype: ObjectId,
    pub reference_error_prototype: ObjectId,
    pub syntax_error_prototype: ObjectId,
    pub regexp_prototype: ObjectId,
    pub map_prototype: ObjectId,
    pub set_prototype: ObjectId,
    /// `globalThis`
    pub global_object: ObjectId,
}

impl Realm {
    /// Allocate the bare prototype objects; methods are added by `install_builtins`
    pub(crate) fn bootstrap(heap: &mut Heap) -> Self {
        let object_prototype = heap.alloc(JsObject::new(ObjectKind::Ordinary, None));
        fn derived(heap: &mut Heap, parent: ObjectId) -> ObjectId {
            heap.alloc(JsObject::new(ObjectKind::Ordinary, Some(parent)))
        }

        let function_prototype = derived(heap, object_prototype);
        let array_prototype = derived(heap, object_prototype);
        let string_prototype = derived(heap, object_prototype);
        let number_prototype = derived(heap, object_prototype);
        let boolean_prototype = derived(heap, object_prototype);
        let error_prototype = derived(heap, object_prototype);
        let type_error_prototype = derived(heap, error_prototype);
        let range_error_prototype = derived(heap, error_prototype);
        let reference_error_prototype = derived(heap, error_prototype);
        let syntax_error_prototype = derived(heap, error_prototype);
        let regexp_prototype = derived(heap, object_prototype);
        let map_prototype = derived(heap, object_prototype);
        let set_prototype = derived(heap, object_prototype);
        let global_object = derived(heap, object_prototype);

        Realm {
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            error_prototype,
            type_error_prototype,
            range_error_prototype,
            reference_error_prototype,
            syntax_error_prototype,
            regexp_prototype,
            map_prototype,
            set_prototype,
            global_object,
        }
    }

    /// Prototype for an error of the given constructor name
    pub(crate) fn error_prototype_for(&self, name: &str) -> ObjectId {
        match name {
            "TypeError" => self.type_error_prototype,
            "RangeError" => self.range_error_prototype,
            "ReferenceError" => self.reference_error_prototype,
            "SyntaxError" => self.syntax_error_prototype,
            _ => self.error_prototype,
        }
    }
}

impl Interpreter {
    /// Populate the global scope of a fresh realm
    pub(crate) fn install_builtins(&mut self) {
        let global = self.realm.global_object;
        self.define_global("globalThis", Value::Object(global));
        self.define_global("undefined", Value::Undefined);
        self.define_global("NaN", Value::Number(f64::NAN));
        self.define_global("Infinity", Value::Number(f64::INFINITY));

        object::install(self);
        function::install(self);
        array::install(self);
        string::install(self);
        number::install(self);
        error::install(self);
        regexp::install(self);
        collections::install(self);
        json::install(self);
        console::install(self);
        timers::install(self);
    }

    /// Allocate a native function object
    pub(crate) fn native_function(
        &mut self,
        name: &'static str,
        length: usize,
        call: NativeFn,
        constructible: bool,
    ) -> ObjectId {
        let native = NativeFunction {
            name,
            call,
            constructible,
        };
        self.create_function_object(FunctionObject::Native(native), name, length)
    }

    /// Install a non-enumerable method on `target`
    pub(crate) fn define_method(
        &mut self,
        target: ObjectId,
        name: &'static str,
        length: usize,
        call: NativeFn,
    ) {
        let method = self.native_function(name, length, call, false);
        self.define_value(target, name, Value::Object(method));
    }

    /// Install a non-enumerable accessor backed by a native getter
    pub(crate) fn define_getter(&mut self, target: ObjectId, name: &'static str, call: NativeFn) {
        let getter = self.native_function(name, 0, call, false);
        self.define_accessor(target, Rc::from(name), Some(getter), None, false);
    }

    /// Install a non-enumerable data property
    pub(crate) fn define_value(&mut self, target: ObjectId, name: &str, value: Value) {
        self.heap
            .get_mut(target)
            .properties
            .insert(Rc::from(name), Property::hidden(value));
    }

    /// Declare a global binding, mirrored on `globalThis`
    pub(crate) fn define_global(&mut self, name: &str, value: Value) {
        let global = self.realm.global_object;
        self.define_value(global, name, value.clone());
        self.global_scope
            .borrow_mut()
            .declare(Rc::from(name), Binding::mutable(value));
    }

    /// Create a global constructor wired to its prototype object
    pub(crate) fn define_constructor(
        &mut self,
        name: &'static str,
        length: usize,
        call: NativeFn,
        prototype: ObjectId,
    ) -> ObjectId {
        let ctor = self.native_function(name, length, call, true);
        self.define_value(ctor, "prototype", Value::Object(prototype));
        self.define_value(prototype, "constructor", Value::Object(ctor));
        self.define_global(name, Value::Object(ctor));
        ctor
    }

    /// Plain namespace object (`Math`, `JSON`, `console`) bound as a global
    pub(crate) fn define_namespace(&mut self, name: &str) -> ObjectId {
        let namespace = self.new_object();
        self.define_global(name, Value::Object(namespace));
        namespace
    }

    /// Require a callable argument, naming the method in the error
    pub(crate) fn expect_callable(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if self.is_callable(value) {
            return Ok(());
        }
        let shown = self.inspector().inspect(value);
        Err(RuntimeError::type_error(
            format!("{} is not a function", shown),
            location,
        ))
    }
}

/// The `i`th argument, `undefined` when missing
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}
