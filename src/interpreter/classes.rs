//! Class definitions.
//!
//! A class evaluates to a constructor closure whose [`ClassInfo`] slot keeps
//! the instance field definitions and the parent constructor. Methods go on
//! the `prototype` object (static ones on the constructor), all
//! non-enumerable, and each method remembers its home object for `super.x`.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{ClassInfo, Closure, FieldDef, FunctionObject, JsObject, ObjectKind, Property};
use crate::memory::scope::Scope;
use crate::memory::stack::Frame;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{
    ClassMember, ClassNode, FunctionBody, FunctionKind, FunctionNode, MethodKind, PropertyKey,
    SourceLocation,
};
use std::rc::Rc;

impl Interpreter {
    /// Evaluate a class declaration or expression to its constructor
    pub(crate) fn evaluate_class(
        &mut self,
        class: &Rc<ClassNode>,
        binding_name: Option<&str>,
    ) -> Result<Value, RuntimeError> {
        let location = class.location;

        let (parent, parent_prototype) = match &class.superclass {
            None => (None, Some(self.realm.object_prototype)),
            Some(expr) => {
                let value = self.evaluate_expr(expr)?;
                match value {
                    Value::Null => (None, None),
                    Value::Object(id) if self.heap.get(id).is_callable() => {
                        let proto = self.get_property(&value, "prototype", location)?;
                        match proto {
                            Value::Object(p) => (Some(id), Some(p)),
                            Value::Null => (Some(id), None),
                            _ => {
                                return Err(RuntimeError::type_error(
                                    "Class extends value does not have valid prototype property",
                                    location,
                                ))
                            }
                        }
                    }
                    other => {
                        let shown = self.inspector().inspect(&other);
                        return Err(RuntimeError::type_error(
                            format!("Class extends value {} is not a constructor or null", shown),
                            location,
                        ));
                    }
                }
            }
        };

        let name: Option<Rc<str>> = class
            .name
            .clone()
            .or_else(|| binding_name.map(Rc::from));

        // The class body sees its own name, initialized once the class exists
        let saved = self.enter_scope();
        let result = self.build_class(class, name, parent, parent_prototype, location);
        let class_scope = std::mem::replace(&mut self.scope, saved);
        let ctor = result?;
        if let Some(own_name) = &class.name {
            class_scope.borrow_mut().declare(
                own_name.clone(),
                crate::memory::scope::Binding {
                    value: Value::Object(ctor),
                    mutable: false,
                    initialized: true,
                },
            );
        }
        Ok(Value::Object(ctor))
    }

    fn build_class(
        &mut self,
        class: &Rc<ClassNode>,
        name: Option<Rc<str>>,
        parent: Option<ObjectId>,
        parent_prototype: Option<ObjectId>,
        location: SourceLocation,
    ) -> Result<ObjectId, RuntimeError> {
        let prototype = self
            .heap
            .alloc(JsObject::new(ObjectKind::Ordinary, parent_prototype));

        let constructor_node = class.constructor.clone().unwrap_or_else(|| {
            Rc::new(FunctionNode {
                name: name.clone(),
                params: Vec::new(),
                rest: None,
                body: FunctionBody::Block(Vec::new()),
                kind: FunctionKind::Constructor,
                location,
            })
        });

        // Instance fields keep their key now and their initializer for later
        let mut fields = Vec::new();
        for member in &class.members {
            if let ClassMember::Field {
                key,
                value,
                is_static: false,
                location,
            } = member
            {
                let key = self.evaluate_property_key(key)?;
                fields.push(FieldDef {
                    key,
                    init: value.clone(),
                    location: *location,
                });
            }
        }

        let closure = Closure {
            node: constructor_node.clone(),
            scope: self.scope.clone(),
            this_value: None,
            home_object: Some(prototype),
            class: Some(ClassInfo {
                node: class.clone(),
                fields: Rc::new(fields),
                parent,
            }),
        };
        let ctor = self.create_function_object(
            FunctionObject::Closure(closure),
            name.as_deref().unwrap_or(""),
            constructor_node.arity(),
        );
        if let Some(parent) = parent {
            self.heap.get_mut(ctor).prototype = Some(parent);
        }
        self.heap
            .get_mut(ctor)
            .properties
            .insert("prototype".into(), Property::hidden(Value::Object(prototype)));
        self.heap
            .get_mut(prototype)
            .properties
            .insert("constructor".into(), Property::hidden(Value::Object(ctor)));

        for member in &class.members {
            match member {
                ClassMember::Method {
                    key,
                    function,
                    kind,
                    is_static,
                } => {
                    let target = if *is_static { ctor } else { prototype };
                    let key = self.evaluate_property_key(key)?;
                    let method = self.create_closure(function, self.scope.clone(), Some(target));
                    self.set_function_name(&Value::Object(method), &key);
                    match kind {
                        MethodKind::Method => {
                            self.heap
                                .get_mut(target)
                                .properties
                                .insert(key, Property::hidden(Value::Object(method)));
                        }
                        MethodKind::Getter => self.define_accessor(target, key, Some(method), None, false),
                        MethodKind::Setter => self.define_accessor(target, key, None, Some(method), false),
                    }
                }
                ClassMember::Field {
                    key,
                    value,
                    is_static: true,
                    location,
                } => {
                    let key = self.evaluate_property_key(key)?;
                    let value = match value {
                        Some(init) => self.with_this_frame(
                            Value::Object(ctor),
                            Some(ctor),
                            Some(ctor),
                            *location,
                            |interp| interp.evaluate_named(init, &key),
                        )?,
                        None => Value::Undefined,
                    };
                    self.define_field(ctor, key, value);
                }
                ClassMember::Field { .. } => {}
            }
        }

        tracing::trace!(class = name.as_deref().unwrap_or("(anonymous)"), "class defined");
        Ok(ctor)
    }

    /// Run the instance field initializers of class `ctor_id` against `this`
    pub(crate) fn initialize_fields(
        &mut self,
        ctor_id: ObjectId,
        this: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let (fields, scope, home) = match self.heap.get(ctor_id).as_function() {
            Some(FunctionObject::Closure(closure)) => match &closure.class {
                Some(info) if !info.fields.is_empty() => (
                    info.fields.clone(),
                    closure.scope.clone(),
                    closure.home_object,
                ),
                _ => return Ok(()),
            },
            _ => return Ok(()),
        };
        let Some(target) = this.as_object() else {
            return Ok(());
        };

        let saved = std::mem::replace(&mut self.scope, Scope::child(&scope, true));
        let result = self.with_this_frame(this, home, Some(ctor_id), location, |interp| {
            for field in fields.iter() {
                let value = match &field.init {
                    Some(init) => {
                        interp.current_location = field.location;
                        interp.evaluate_named(init, &field.key)?
                    }
                    None => Value::Undefined,
                };
                interp.define_field(target, field.key.clone(), value);
            }
            Ok(())
        });
        self.scope = saved;
        result
    }

    /// Evaluate `body` inside a synthetic frame with the given `this`
    fn with_this_frame<T>(
        &mut self,
        this: Value,
        home_object: Option<ObjectId>,
        callee: Option<ObjectId>,
        location: SourceLocation,
        body: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        self.call_stack.push(Frame {
            function_name: Rc::from("<instance_members_initializer>"),
            call_site: location,
            this,
            this_initialized: true,
            home_object,
            callee,
        });
        let result = body(self);
        if let Err(err) = &result {
            self.capture_trace(err.location());
        }
        self.call_stack.pop();
        result
    }

    /// Own data property created by a field; `#private` fields stay hidden
    fn define_field(&mut self, target: ObjectId, key: Rc<str>, value: Value) {
        let property = if key.starts_with('#') {
            Property::hidden(value)
        } else {
            Property::data(value)
        };
        self.heap.get_mut(target).properties.insert(key, property);
    }

    /// Install one half of an accessor pair, keeping the other half if present
    pub(crate) fn define_accessor(
        &mut self,
        target: ObjectId,
        key: Rc<str>,
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
        enumerable: bool,
    ) {
        let properties = &mut self.heap.get_mut(target).properties;
        let (old_getter, old_setter) = match properties.get(&key) {
            Some(existing) if existing.is_accessor() => (existing.getter, existing.setter),
            _ => (None, None),
        };
        properties.insert(
            key,
            Property {
                value: Value::Undefined,
                getter: getter.or(old_getter),
                setter: setter.or(old_setter),
                enumerable,
            },
        );
    }

    /// Resolve a literal or computed property name
    pub(crate) fn evaluate_property_key(&mut self, key: &PropertyKey) -> Result<Rc<str>, RuntimeError> {
        match key {
            PropertyKey::Named(name) => Ok(name.clone()),
            PropertyKey::Computed(expr) => {
                let value = self.evaluate_expr(expr)?;
                self.to_property_key(&value, *expr.location())
            }
        }
    }
}
