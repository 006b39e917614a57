//! Lexical environments
//!
//! Each block, function body and the global program get a [`Scope`]. Scopes
//! form a parent chain through shared [`ScopeRef`] handles, which closures keep
//! alive for as long as they are reachable.
//!
//! # Temporal Dead Zone
//!
//! `let`, `const` and `class` bindings are declared uninitialized when their
//! block is entered and become usable once their declaration executes. Reading
//! them earlier is a `ReferenceError`.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ScopeRef = Rc<RefCell<Scope>>;

/// A named slot in a scope
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
    pub initialized: bool,
}

impl Binding {
    /// Initialized, writable binding (`var`, parameters, function declarations)
    pub fn mutable(value: Value) -> Self {
        Binding {
            value,
            mutable: true,
            initialized: true,
        }
    }

    /// Binding in its temporal dead zone
    pub fn uninitialized(mutable: bool) -> Self {
        Binding {
            value: Value::Undefined,
            mutable,
            initialized: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<Rc<str>, Binding>,
    pub parent: Option<ScopeRef>,
    /// Function bodies and the program scope receive `var` declarations
    pub is_function: bool,
}

impl Scope {
    /// Root (global) scope
    pub fn new_root() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent: None,
            is_function: true,
        }))
    }

    pub fn child(parent: &ScopeRef, is_function: bool) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent.clone()),
            is_function,
        }))
    }

    pub fn declare(&mut self, name: Rc<str>, binding: Binding) {
        self.bindings.insert(name, binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.bindings.get_mut(name)
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Copy every binding into a fresh sibling scope (per-iteration `for (let ...)` copies)
    pub fn fork(scope: &ScopeRef) -> ScopeRef {
        let current = scope.borrow();
        Rc::new(RefCell::new(Scope {
            bindings: current.bindings.clone(),
            parent: current.parent.clone(),
            is_function: current.is_function,
        }))
    }
}

/// Find the nearest scope on the chain that declares `name`
pub fn resolve(scope: &ScopeRef, name: &str) -> Option<ScopeRef> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        if s.borrow().has_own(name) {
            return Some(s);
        }
        current = s.borrow().parent.clone();
    }
    None
}

/// The closest enclosing function (or global) scope, target of `var` hoisting
pub fn function_scope(scope: &ScopeRef) -> ScopeRef {
    let mut current = scope.clone();
    loop {
        let parent = {
            let s = current.borrow();
            if s.is_function {
                break;
            }
            s.parent.clone()
        };
        match parent {
            Some(p) => current = p,
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_walks_parent_chain() {
        let global = Scope::new_root();
        global
            .borrow_mut()
            .declare("x".into(), Binding::mutable(Value::Number(1.0)));
        let block = Scope::child(&global, false);
        block
            .borrow_mut()
            .declare("y".into(), Binding::mutable(Value::Number(2.0)));

        assert!(Rc::ptr_eq(&resolve(&block, "x").unwrap(), &global));
        assert!(Rc::ptr_eq(&resolve(&block, "y").unwrap(), &block));
        assert!(resolve(&global, "y").is_none());
    }

    #[test]
    fn test_function_scope_skips_blocks() {
        let global = Scope::new_root();
        let function = Scope::child(&global, true);
        let block = Scope::child(&function, false);
        let inner = Scope::child(&block, false);

        assert!(Rc::ptr_eq(&function_scope(&inner), &function));
        assert!(Rc::ptr_eq(&function_scope(&global), &global));
    }

    #[test]
    fn test_fork_copies_bindings_independently() {
        let global = Scope::new_root();
        let loop_scope = Scope::child(&global, false);
        loop_scope
            .borrow_mut()
            .declare("i".into(), Binding::mutable(Value::Number(0.0)));

        let next = Scope::fork(&loop_scope);
        if let Some(b) = next.borrow_mut().get_mut("i") {
            b.value = Value::Number(1.0);
        }

        assert!(matches!(
            loop_scope.borrow().get("i").map(|b| b.value.clone()),
            Some(Value::Number(n)) if n == 0.0
        ));
    }
}
