//! Console rendering of runtime values
//!
//! [`Inspector`] turns values into the text a console statement prints. It
//! only reads the heap: accessors are shown as `[Getter]`/`[Setter]` instead
//! of being invoked, so formatting can never run user code or fail.
//!
//! # Layout
//!
//! ```text
//! [1, "two", <1 empty item>, {a: 1}]
//! Point {x: 1, y: 2}
//! Map(1) {"k" => [Function: f]}
//! ```

pub mod number;

use crate::memory::heap::{Heap, JsObject, ObjectKind, Property};
use crate::memory::value::{ObjectId, Value};
use number::{number_to_string, parse_int, string_to_number};

/// Array elements printed before the rest is summarized
const MAX_ARRAY_ITEMS: usize = 100;

/// Read-only value formatter bound to one heap
pub struct Inspector<'a> {
    heap: &'a Heap,
    object_prototype: Option<ObjectId>,
    max_depth: usize,
    /// Objects currently being rendered, outermost first
    seen: Vec<ObjectId>,
}

impl<'a> Inspector<'a> {
    /// `object_prototype` identifies plain objects, which get no class-name prefix
    pub fn new(heap: &'a Heap, object_prototype: Option<ObjectId>, max_depth: usize) -> Self {
        Inspector {
            heap,
            object_prototype,
            max_depth,
            seen: Vec::new(),
        }
    }

    /// Render a full console call: printf directives first, then the
    /// remaining arguments joined by single spaces.
    pub fn format_args(&mut self, args: &[Value]) -> String {
        let mut parts = Vec::with_capacity(args.len());
        let mut rest = args;

        if let [Value::String(format), tail @ ..] = args {
            if !tail.is_empty() && format.contains('%') {
                let (text, consumed) = self.apply_format(format, tail);
                parts.push(text);
                rest = &tail[consumed..];
            }
        }

        if parts.is_empty() {
            if let Some((first, tail)) = rest.split_first() {
                parts.push(self.format_top_level(first));
                rest = tail;
            }
        }

        for arg in rest {
            parts.push(self.format_top_level(arg));
        }
        parts.join(" ")
    }

    /// Render one console argument: strings raw, everything else inspected
    pub fn format_top_level(&mut self, value: &Value) -> String {
        match value {
            Value::String(s) => s.to_string(),
            other => self.inspect(other),
        }
    }

    /// Nested rendering of any value
    pub fn inspect(&mut self, value: &Value) -> String {
        self.inspect_at(value, 0)
    }

    /// Substitute `%` directives, returning the text and the number of arguments used
    fn apply_format(&mut self, format: &str, args: &[Value]) -> (String, usize) {
        let mut out = String::with_capacity(format.len());
        let mut used = 0;
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let Some(&directive) = chars.peek() else {
                out.push('%');
                break;
            };
            if directive == '%' {
                chars.next();
                out.push('%');
                continue;
            }
            if !matches!(directive, 's' | 'd' | 'i' | 'f' | 'o' | 'O' | 'j' | 'c') {
                out.push('%');
                continue;
            }
            chars.next();
            let Some(arg) = args.get(used) else {
                out.push('%');
                out.push(directive);
                continue;
            };
            used += 1;

            match directive {
                's' => {
                    let text = match arg {
                        Value::String(s) => s.to_string(),
                        Value::Object(_) => self.inspect(arg),
                        other => self.primitive_text(other),
                    };
                    out.push_str(&text);
                }
                'd' => out.push_str(&format_number(coerce_number(arg))),
                'i' => {
                    let n = match arg {
                        Value::Number(n) => n.trunc(),
                        Value::String(s) => parse_int(s, 10),
                        other => coerce_number(other).trunc(),
                    };
                    out.push_str(&format_number(n));
                }
                'f' => out.push_str(&format_number(coerce_number(arg))),
                'c' => {}
                _ => {
                    let text = self.inspect(arg);
                    out.push_str(&text);
                }
            }
        }
        (out, used)
    }

    fn primitive_text(&self, value: &Value) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Object(_) => String::new(),
        }
    }

    fn inspect_at(&mut self, value: &Value, depth: usize) -> String {
        match value {
            Value::String(s) => quote(s),
            Value::Object(id) => self.inspect_object(*id, depth),
            other => self.primitive_text(other),
        }
    }

    fn inspect_object(&mut self, id: ObjectId, depth: usize) -> String {
        if self.seen.contains(&id) {
            return "[Circular]".to_string();
        }

        let heap = self.heap;
        let object = heap.get(id);
        // These never recurse, so neither depth nor cycles apply
        match &object.kind {
            ObjectKind::Error => return self.error_header(id),
            ObjectKind::RegExp(data) => return format!("/{}/{}", data.source, data.flags),
            ObjectKind::Function(_) if !has_enumerable_props(object) => {
                return self.function_label(id);
            }
            _ => {}
        }

        if depth > self.max_depth {
            return if object.is_array() {
                "[Array]".to_string()
            } else {
                "[Object]".to_string()
            };
        }

        self.seen.push(id);
        let rendered = match &object.kind {
            ObjectKind::Array(elements) => self.inspect_array(object, elements, depth),
            ObjectKind::Map(entries) => {
                let items: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| {
                        format!(
                            "{} => {}",
                            self.inspect_at(k, depth + 1),
                            self.inspect_at(v, depth + 1)
                        )
                    })
                    .collect();
                format!("Map({}) {}", entries.len(), braced(&items))
            }
            ObjectKind::Set(values) => {
                let items: Vec<String> = values
                    .iter()
                    .map(|v| self.inspect_at(v, depth + 1))
                    .collect();
                format!("Set({}) {}", values.len(), braced(&items))
            }
            ObjectKind::Function(_) => {
                let label = self.function_label(id);
                let props = self.property_items(object, depth);
                format!("{} {}", label, braced(&props))
            }
            ObjectKind::Ordinary | ObjectKind::Error | ObjectKind::RegExp(_) => {
                let props = self.property_items(object, depth);
                match self.class_prefix(object) {
                    Some(prefix) => format!("{} {}", prefix, braced(&props)),
                    None => braced(&props),
                }
            }
        };
        self.seen.pop();
        rendered
    }

    fn inspect_array(
        &mut self,
        object: &JsObject,
        elements: &[Option<Value>],
        depth: usize,
    ) -> String {
        let mut items = Vec::new();
        let mut holes = 0usize;
        let mut shown = 0usize;

        for element in elements {
            if shown >= MAX_ARRAY_ITEMS {
                break;
            }
            match element {
                None => holes += 1,
                Some(value) => {
                    if holes > 0 {
                        items.push(empty_items(holes));
                        shown += 1;
                        holes = 0;
                    }
                    items.push(self.inspect_at(value, depth + 1));
                    shown += 1;
                }
            }
        }
        if holes > 0 {
            items.push(empty_items(holes));
        }

        let covered: usize = count_covered(elements, MAX_ARRAY_ITEMS);
        if covered < elements.len() {
            let remaining = elements.len() - covered;
            items.push(format!(
                "... {} more item{}",
                remaining,
                if remaining == 1 { "" } else { "s" }
            ));
        }

        items.extend(self.property_items(object, depth));
        format!("[{}]", items.join(", "))
    }

    /// `key: value` pairs for the enumerable own properties of an object
    fn property_items(&mut self, object: &JsObject, depth: usize) -> Vec<String> {
        object
            .properties
            .ordered()
            .into_iter()
            .filter(|(key, prop)| prop.enumerable && !key.starts_with('#'))
            .map(|(key, prop)| {
                let value = self.property_text(prop, depth);
                format!("{}: {}", format_key(&key), value)
            })
            .collect()
    }

    fn property_text(&mut self, prop: &Property, depth: usize) -> String {
        match (prop.getter, prop.setter) {
            (Some(_), Some(_)) => "[Getter/Setter]".to_string(),
            (Some(_), None) => "[Getter]".to_string(),
            (None, Some(_)) => "[Setter]".to_string(),
            (None, None) => self.inspect_at(&prop.value, depth + 1),
        }
    }

    /// `Point` for class instances, `[Object: null prototype]` for bare objects
    fn class_prefix(&self, object: &JsObject) -> Option<String> {
        let proto = match object.prototype {
            Some(proto) => proto,
            None => return Some("[Object: null prototype]".to_string()),
        };
        if Some(proto) == self.object_prototype {
            return None;
        }
        let (_, ctor) = self.heap.find_property(proto, "constructor")?;
        let name = self.function_name(ctor.value.as_object()?)?;
        if name == "Object" {
            None
        } else {
            Some(name)
        }
    }

    fn function_name(&self, id: ObjectId) -> Option<String> {
        let name = self.heap.get(id).properties.get("name")?;
        match &name.value {
            Value::String(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        }
    }

    fn function_label(&self, id: ObjectId) -> String {
        let object = self.heap.get(id);
        let name = self.function_name(id);

        if let Some(info) = object.class_info() {
            let mut label = match name {
                Some(name) => format!("[class {}", name),
                None => "[class (anonymous)".to_string(),
            };
            if let Some(parent) = info.parent {
                let parent_name = self
                    .function_name(parent)
                    .unwrap_or_else(|| "(anonymous)".to_string());
                label.push_str(&format!(" extends {}", parent_name));
            }
            label.push(']');
            return label;
        }

        match name {
            Some(name) => format!("[Function: {}]", name),
            None => "[Function (anonymous)]".to_string(),
        }
    }

    /// `Name: message`, or just `Name` when the message is empty
    pub fn error_header(&self, id: ObjectId) -> String {
        let name = match self.heap.find_property(id, "name") {
            Some((_, prop)) => match &prop.value {
                Value::String(s) => s.to_string(),
                other => self.primitive_text(other),
            },
            None => "Error".to_string(),
        };
        let message = match self.heap.find_property(id, "message") {
            Some((_, prop)) => match &prop.value {
                Value::String(s) => s.to_string(),
                Value::Undefined => String::new(),
                other => self.primitive_text(other),
            },
            None => String::new(),
        };

        match (name.is_empty(), message.is_empty()) {
            (_, true) => name,
            (true, false) => message,
            (false, false) => format!("{}: {}", name, message),
        }
    }
}

fn has_enumerable_props(object: &JsObject) -> bool {
    object
        .properties
        .ordered()
        .iter()
        .any(|(key, prop)| prop.enumerable && !key.starts_with('#'))
}

/// Number of elements consumed when at most `limit` entries are shown
/// (a run of holes counts as one entry).
fn count_covered(elements: &[Option<Value>], limit: usize) -> usize {
    let mut entries = 0;
    let mut i = 0;
    while i < elements.len() && entries < limit {
        if elements[i].is_none() {
            while i < elements.len() && elements[i].is_none() {
                i += 1;
            }
        } else {
            i += 1;
        }
        entries += 1;
    }
    i
}

fn empty_items(count: usize) -> String {
    if count == 1 {
        "<1 empty item>".to_string()
    } else {
        format!("<{} empty items>", count)
    }
}

fn braced(items: &[String]) -> String {
    if items.is_empty() {
        "{}".to_string()
    } else {
        format!("{{{}}}", items.join(", "))
    }
}

/// Numbers as printed by the console: like `String(n)` except for `-0`
pub fn format_number(n: f64) -> String {
    if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else {
        number_to_string(n)
    }
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => string_to_number(s),
        Value::Undefined | Value::Object(_) => f64::NAN,
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Double-quoted string literal with escapes
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::heap::{FunctionObject, NativeFunction, Property};
    use std::rc::Rc;

    struct Fixture {
        heap: Heap,
        object_proto: ObjectId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut heap = Heap::new();
            let object_proto = heap.alloc(JsObject::new(ObjectKind::Ordinary, None));
            Fixture { heap, object_proto }
        }

        fn object(&mut self, props: &[(&str, Value)]) -> ObjectId {
            let id = self
                .heap
                .alloc(JsObject::new(ObjectKind::Ordinary, Some(self.object_proto)));
            for (key, value) in props {
                self.heap
                    .get_mut(id)
                    .properties
                    .insert(Rc::from(*key), Property::data(value.clone()));
            }
            id
        }

        fn array(&mut self, elements: Vec<Option<Value>>) -> ObjectId {
            self.heap.alloc(JsObject::new(ObjectKind::Array(elements), None))
        }

        fn render(&self, value: &Value, depth: usize) -> String {
            Inspector::new(&self.heap, Some(self.object_proto), depth).inspect(value)
        }
    }

    fn nums(values: &[f64]) -> Vec<Option<Value>> {
        values.iter().map(|n| Some(Value::Number(*n))).collect()
    }

    #[test]
    fn test_primitives() {
        let fx = Fixture::new();
        assert_eq!(fx.render(&Value::Number(f64::NAN), 4), "NaN");
        assert_eq!(fx.render(&Value::Number(-0.0), 4), "-0");
        assert_eq!(fx.render(&Value::Number(f64::NEG_INFINITY), 4), "-Infinity");
        assert_eq!(fx.render(&Value::Undefined, 4), "undefined");
        assert_eq!(fx.render(&Value::str("say \"hi\"\n"), 4), r#""say \"hi\"\n""#);
    }

    #[test]
    fn test_arrays_and_holes() {
        let mut fx = Fixture::new();
        let arr = fx.array(nums(&[1.0, 2.0, 3.0]));
        assert_eq!(fx.render(&Value::Object(arr), 4), "[1, 2, 3]");

        let holes = fx.array(vec![Some(Value::Number(1.0)), None, None, Some(Value::Null), None]);
        assert_eq!(
            fx.render(&Value::Object(holes), 4),
            "[1, <2 empty items>, null, <1 empty item>]"
        );

        let empty = fx.array(Vec::new());
        assert_eq!(fx.render(&Value::Object(empty), 4), "[]");
    }

    #[test]
    fn test_long_arrays_are_summarized() {
        let mut fx = Fixture::new();
        let values: Vec<f64> = (0..105).map(f64::from).collect();
        let arr = fx.array(nums(&values));
        let text = fx.render(&Value::Object(arr), 4);
        assert!(text.ends_with("99, ... 5 more items]"));
    }

    #[test]
    fn test_objects_quote_non_identifier_keys() {
        let mut fx = Fixture::new();
        let obj = fx.object(&[
            ("a", Value::Number(1.0)),
            ("b-c", Value::str("x")),
            ("1", Value::Bool(true)),
        ]);
        assert_eq!(
            fx.render(&Value::Object(obj), 4),
            r#"{"1": true, a: 1, "b-c": "x"}"#
        );
    }

    #[test]
    fn test_circular_reference() {
        let mut fx = Fixture::new();
        let obj = fx.object(&[("name", Value::str("loop"))]);
        fx.heap
            .get_mut(obj)
            .properties
            .insert("self".into(), Property::data(Value::Object(obj)));
        assert_eq!(
            fx.render(&Value::Object(obj), 4),
            r#"{name: "loop", self: [Circular]}"#
        );
    }

    #[test]
    fn test_shared_reference_is_not_circular() {
        let mut fx = Fixture::new();
        let shared = fx.object(&[("v", Value::Number(1.0))]);
        let arr = fx.array(vec![
            Some(Value::Object(shared)),
            Some(Value::Object(shared)),
        ]);
        assert_eq!(fx.render(&Value::Object(arr), 4), "[{v: 1}, {v: 1}]");
    }

    #[test]
    fn test_depth_limit_placeholders() {
        let mut fx = Fixture::new();
        let inner_arr = fx.array(nums(&[1.0]));
        let inner = fx.object(&[("list", Value::Object(inner_arr))]);
        let outer = fx.object(&[("inner", Value::Object(inner))]);
        assert_eq!(
            fx.render(&Value::Object(outer), 1),
            "{inner: {list: [Array]}}"
        );
        assert_eq!(fx.render(&Value::Object(outer), 0), "{inner: [Object]}");
    }

    #[test]
    fn test_null_prototype_and_accessors() {
        let mut fx = Fixture::new();
        let bare = fx.heap.alloc(JsObject::new(ObjectKind::Ordinary, None));
        assert_eq!(
            fx.render(&Value::Object(bare), 4),
            "[Object: null prototype] {}"
        );

        let getter = fx.object(&[]);
        let obj = fx.object(&[]);
        fx.heap.get_mut(obj).properties.insert(
            "total".into(),
            Property {
                value: Value::Undefined,
                getter: Some(getter),
                setter: None,
                enumerable: true,
            },
        );
        assert_eq!(fx.render(&Value::Object(obj), 4), "{total: [Getter]}");
    }

    #[test]
    fn test_functions_maps_and_sets() {
        let mut fx = Fixture::new();
        let native = fx.heap.alloc(JsObject::new(
            ObjectKind::Function(Box::new(FunctionObject::Native(NativeFunction {
                name: "greet",
                call: |_, _, _, _| Ok(Value::Undefined),
                constructible: false,
            }))),
            None,
        ));
        fx.heap
            .get_mut(native)
            .properties
            .insert("name".into(), Property::hidden(Value::str("greet")));
        assert_eq!(fx.render(&Value::Object(native), 4), "[Function: greet]");

        let map = fx.heap.alloc(JsObject::new(
            ObjectKind::Map(vec![(Value::str("a"), Value::Number(1.0))]),
            None,
        ));
        assert_eq!(fx.render(&Value::Object(map), 4), r#"Map(1) {"a" => 1}"#);

        let set = fx.heap.alloc(JsObject::new(ObjectKind::Set(Vec::new()), None));
        assert_eq!(fx.render(&Value::Object(set), 4), "Set(0) {}");
    }

    #[test]
    fn test_format_args() {
        let mut fx = Fixture::new();
        let arr = fx.array(nums(&[1.0, 2.0]));
        let mut inspector = Inspector::new(&fx.heap, Some(fx.object_proto), 4);

        assert_eq!(
            inspector.format_args(&[Value::str("a"), Value::str("b")]),
            "a b"
        );
        assert_eq!(
            inspector.format_args(&[
                Value::str("%s has %d items (%i%%)"),
                Value::str("list"),
                Value::Number(2.0),
                Value::str("42.9"),
                Value::Object(arr),
            ]),
            "list has 2 items (42%) [1, 2]"
        );
        assert_eq!(
            inspector.format_args(&[Value::str("%c styled"), Value::str("color: red")]),
            " styled"
        );
        assert_eq!(inspector.format_args(&[Value::str("100%")]), "100%");
        assert_eq!(inspector.format_args(&[]), "");
    }
}
