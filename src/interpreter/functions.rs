//! Function objects, calls and construction.
//!
//! Adds `impl Interpreter` methods that create closures, invoke them with a
//! fresh function scope and call-stack frame, and implement `new`. Native
//! functions are plain `fn` pointers and run without a frame of their own.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::assign::BindingMode;
use crate::memory::heap::{Closure, FunctionObject, JsObject, ObjectKind, Property};
use crate::memory::scope::{Scope, ScopeRef};
use crate::memory::stack::{Frame, TOP_LEVEL_NAME};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{FunctionBody, FunctionKind, FunctionNode, SourceLocation};
use std::rc::Rc;

impl Interpreter {
    /// Allocate a function object with its `name` and `length` properties
    pub(crate) fn create_function_object(
        &mut self,
        function: FunctionObject,
        name: &str,
        length: usize,
    ) -> ObjectId {
        let mut object = JsObject::new(
            ObjectKind::Function(Box::new(function)),
            Some(self.realm.function_prototype),
        );
        object
            .properties
            .insert("length".into(), Property::hidden(Value::from(length)));
        object
            .properties
            .insert("name".into(), Property::hidden(Value::str(name)));
        self.heap.alloc(object)
    }

    /// Create a closure over `scope`.
    ///
    /// Arrow functions capture the current `this` and home object; ordinary
    /// functions get a fresh `prototype` object so they can be used with `new`.
    pub(crate) fn create_closure(
        &mut self,
        node: &Rc<FunctionNode>,
        scope: ScopeRef,
        home_object: Option<ObjectId>,
    ) -> ObjectId {
        let (this_value, home_object) = if node.kind == FunctionKind::Arrow {
            let frame = self.call_stack.current();
            (
                Some(frame.map(|f| f.this.clone()).unwrap_or_default()),
                frame.and_then(|f| f.home_object),
            )
        } else {
            (None, home_object)
        };

        let closure = Closure {
            node: node.clone(),
            scope,
            this_value,
            home_object,
            class: None,
        };
        let name = node.name.as_deref().unwrap_or("");
        let id = self.create_function_object(FunctionObject::Closure(closure), name, node.arity());

        if node.kind == FunctionKind::Normal {
            let prototype = self.new_object();
            self.heap
                .get_mut(prototype)
                .properties
                .insert("constructor".into(), Property::hidden(Value::Object(id)));
            self.heap
                .get_mut(id)
                .properties
                .insert("prototype".into(), Property::hidden(Value::Object(prototype)));
        }
        id
    }

    /// Give an anonymous function the name of the binding it is assigned to
    pub(crate) fn set_function_name(&mut self, value: &Value, name: &str) {
        let Some(id) = value.as_object() else {
            return;
        };
        let object = self.heap.get_mut(id);
        if !object.is_callable() {
            return;
        }
        let unnamed = match object.properties.get("name") {
            Some(prop) => matches!(&prop.value, Value::String(s) if s.is_empty()),
            None => true,
        };
        if unnamed {
            object
                .properties
                .insert("name".into(), Property::hidden(Value::str(name)));
        }
    }

    /// Name shown for a function in stack traces
    pub(crate) fn function_display_name(&self, id: ObjectId) -> Rc<str> {
        match self.heap.get(id).properties.get("name") {
            Some(Property {
                value: Value::String(s),
                ..
            }) if !s.is_empty() => s.clone(),
            _ => Rc::from(TOP_LEVEL_NAME),
        }
    }

    pub(crate) fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|id| self.heap.get(id).is_callable())
    }

    /// Call `callee` with an explicit `this`
    pub(crate) fn call_function(
        &mut self,
        callee: &Value,
        this: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let function = match callee.as_object() {
            Some(id) => self
                .heap
                .get(id)
                .as_function()
                .cloned()
                .map(|f| (id, f)),
            None => None,
        };
        let Some((func_id, function)) = function else {
            let shown = self.inspector().inspect(callee);
            return Err(RuntimeError::type_error(
                format!("{} is not a function", shown),
                location,
            ));
        };

        match function {
            FunctionObject::Native(native) => (native.call)(self, &this, &args, location),
            FunctionObject::Bound {
                target,
                this: bound_this,
                args: bound_args,
            } => {
                let mut all = bound_args;
                all.extend(args);
                self.call_function(&Value::Object(target), bound_this, all, location)
            }
            FunctionObject::Closure(closure) => {
                if closure.class.is_some() {
                    let name = self.function_display_name(func_id);
                    return Err(RuntimeError::type_error(
                        format!("Class constructor {} cannot be invoked without 'new'", name),
                        location,
                    ));
                }
                self.invoke_closure(func_id, &closure, this, args, location)
                    .map(|(value, _)| value)
            }
        }
    }

    /// Run a closure body in a new frame.
    ///
    /// Returns the completion value together with the popped frame, whose
    /// `this_initialized` flag tells a derived constructor whether `super()` ran.
    pub(crate) fn invoke_closure(
        &mut self,
        func_id: ObjectId,
        closure: &Closure,
        this: Value,
        args: Vec<Value>,
        call_site: SourceLocation,
    ) -> Result<(Value, Frame), RuntimeError> {
        let this_initialized = !self.is_derived_constructor(closure);
        self.invoke_closure_with(func_id, closure, this, args, call_site, this_initialized)
    }

    fn is_derived_constructor(&self, closure: &Closure) -> bool {
        closure
            .class
            .as_ref()
            .is_some_and(|info| info.parent.is_some())
            && closure.node.kind == FunctionKind::Constructor
    }

    fn invoke_closure_with(
        &mut self,
        func_id: ObjectId,
        closure: &Closure,
        this: Value,
        args: Vec<Value>,
        call_site: SourceLocation,
        this_initialized: bool,
    ) -> Result<(Value, Frame), RuntimeError> {
        // depth includes the top-level frame
        if self.call_stack.depth() > self.config.max_call_depth {
            return Err(RuntimeError::CallStackExceeded {
                location: call_site,
            });
        }

        let this = match &closure.this_value {
            Some(captured) => captured.clone(),
            None => this,
        };
        self.call_stack.push(Frame {
            function_name: self.function_display_name(func_id),
            call_site,
            this,
            this_initialized,
            home_object: closure.home_object,
            callee: Some(func_id),
        });

        let saved = std::mem::replace(&mut self.scope, Scope::child(&closure.scope, true));
        let result = self.run_function_body(&closure.node, args);
        if let Err(err) = &result {
            self.capture_trace(err.location());
        }
        self.scope = saved;

        let frame = self.call_stack.pop();
        let value = result?;
        match frame {
            Some(frame) => Ok((value, frame)),
            None => Err(RuntimeError::reference_error("call stack underflow", call_site)),
        }
    }

    fn run_function_body(
        &mut self,
        node: &FunctionNode,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.bind_parameters(node, args)?;

        match &node.body {
            FunctionBody::Expression(expr) => self.evaluate_expr(expr),
            FunctionBody::Block(statements) => {
                let scope = self.scope.clone();
                self.hoist_declarations(statements, &scope);
                for stmt in statements {
                    self.execute_statement(stmt)?;
                    if self.control_flow != ControlFlow::Normal {
                        break;
                    }
                }
                let flow = std::mem::replace(&mut self.control_flow, ControlFlow::Normal);
                if flow == ControlFlow::Return {
                    Ok(std::mem::take(&mut self.return_value))
                } else {
                    Ok(Value::Undefined)
                }
            }
        }
    }

    fn bind_parameters(&mut self, node: &FunctionNode, args: Vec<Value>) -> Result<(), RuntimeError> {
        let mut args = args.into_iter();
        for param in &node.params {
            let mut value = args.next().unwrap_or_default();
            if value.is_undefined() {
                if let Some(default) = &param.default {
                    value = self.evaluate_default(default, &param.target)?;
                }
            }
            self.bind_pattern(&param.target, value, BindingMode::Parameter)?;
        }
        if let Some(rest) = &node.rest {
            let remaining: Vec<Value> = args.collect();
            let array = self.new_array(remaining);
            self.bind_pattern(rest, Value::Object(array), BindingMode::Parameter)?;
        }
        Ok(())
    }

    /// `new callee(...args)`
    pub(crate) fn construct(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let function = match callee.as_object() {
            Some(id) => self
                .heap
                .get(id)
                .as_function()
                .cloned()
                .map(|f| (id, f)),
            None => None,
        };
        let Some((ctor_id, function)) = function else {
            let shown = self.inspector().inspect(callee);
            return Err(RuntimeError::type_error(
                format!("{} is not a constructor", shown),
                location,
            ));
        };

        let constructible = match &function {
            FunctionObject::Native(native) => native.constructible,
            FunctionObject::Bound { .. } => true,
            FunctionObject::Closure(closure) => {
                matches!(closure.node.kind, FunctionKind::Normal | FunctionKind::Constructor)
            }
        };
        if !constructible {
            let name = self.function_display_name(ctor_id);
            return Err(RuntimeError::type_error(
                format!("{} is not a constructor", name),
                location,
            ));
        }

        if let FunctionObject::Bound {
            target,
            args: bound_args,
            ..
        } = function
        {
            let mut all = bound_args;
            all.extend(args);
            return self.construct(&Value::Object(target), all, location);
        }

        let prototype = self.prototype_of_constructor(ctor_id);
        let this = self
            .heap
            .alloc(JsObject::new(ObjectKind::Ordinary, Some(prototype)));
        self.construct_with_this(ctor_id, Value::Object(this), args, location)
    }

    /// The object `new ctor()` inherits from
    fn prototype_of_constructor(&self, ctor_id: ObjectId) -> ObjectId {
        match self.heap.get(ctor_id).properties.get("prototype") {
            Some(Property {
                value: Value::Object(proto),
                ..
            }) => *proto,
            _ => self.realm.object_prototype,
        }
    }

    /// Run constructor `ctor_id` against an already allocated `this`.
    ///
    /// Used by `new` and by `super(...)`, which passes the derived instance.
    pub(crate) fn construct_with_this(
        &mut self,
        ctor_id: ObjectId,
        this: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let function = self.heap.get(ctor_id).as_function().cloned();
        match function {
            Some(FunctionObject::Native(native)) => (native.call)(self, &this, &args, location),
            Some(FunctionObject::Bound {
                target,
                args: bound_args,
                ..
            }) => {
                let mut all = bound_args;
                all.extend(args);
                self.construct_with_this(target, this, all, location)
            }
            Some(FunctionObject::Closure(closure)) => match closure.class.clone() {
                Some(info) => {
                    self.run_class_constructor(ctor_id, &closure, &info, this, args, location)
                }
                None => {
                    let (value, _) = self.invoke_closure(ctor_id, &closure, this.clone(), args, location)?;
                    Ok(if value.as_object().is_some() { value } else { this })
                }
            },
            None => Err(RuntimeError::type_error(
                "Super constructor is not a constructor",
                location,
            )),
        }
    }

    /// Class constructor body with field initialization around `super()`
    fn run_class_constructor(
        &mut self,
        ctor_id: ObjectId,
        closure: &Closure,
        info: &crate::memory::heap::ClassInfo,
        this: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if info.parent.is_none() {
            self.initialize_fields(ctor_id, this.clone(), location)?;
            let (value, _) = self.invoke_closure(ctor_id, closure, this.clone(), args, location)?;
            return Ok(if value.as_object().is_some() { value } else { this });
        }

        if info.node.constructor.is_none() {
            self.super_construct(ctor_id, this.clone(), args, location)?;
            return Ok(this);
        }

        let (value, frame) = self.invoke_closure(ctor_id, closure, this.clone(), args, location)?;
        if value.as_object().is_some() {
            return Ok(value);
        }
        if !frame.this_initialized {
            return Err(RuntimeError::reference_error(
                "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
                location,
            ));
        }
        Ok(this)
    }

    /// `super(...args)` on behalf of class `ctor_id`: run the parent
    /// constructor against `this`, then this class's field initializers.
    pub(crate) fn super_construct(
        &mut self,
        ctor_id: ObjectId,
        this: Value,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let parent = self
            .heap
            .get(ctor_id)
            .class_info()
            .and_then(|info| info.parent);
        let Some(parent) = parent else {
            return Err(RuntimeError::type_error(
                "Super constructor null of anonymous class is not a constructor",
                location,
            ));
        };
        self.construct_with_this(parent, this.clone(), args, location)?;
        self.initialize_fields(ctor_id, this, location)
    }

    /// Bind `fn.call`/`fn.bind` style: a new function with fixed `this` and leading args
    pub(crate) fn bind_function(
        &mut self,
        target: ObjectId,
        this: Value,
        args: Vec<Value>,
    ) -> ObjectId {
        let name = format!("bound {}", self.heap_function_name(target));
        let length = match self.heap.get(target).properties.get("length") {
            Some(Property {
                value: Value::Number(n),
                ..
            }) => (*n as usize).saturating_sub(args.len()),
            _ => 0,
        };
        self.create_function_object(FunctionObject::Bound { target, this, args }, &name, length)
    }

    fn heap_function_name(&self, id: ObjectId) -> String {
        match self.heap.get(id).properties.get("name") {
            Some(Property {
                value: Value::String(s),
                ..
            }) => s.to_string(),
            _ => String::new(),
        }
    }
}
