//! `JSON.stringify` / `JSON.parse`
//!
//! Both directions go through `serde_json::Value` (with `preserve_order`, so
//! object keys keep insertion order). Values JSON cannot represent follow the
//! usual rules: `undefined` and functions are dropped from objects and become
//! `null` inside arrays, non-finite numbers become `null`.

use super::arg;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::ObjectKind;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;
use crate::inspect::number::number_to_string;
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::{Map, Number, Value as Json};
use std::io;
use std::rc::Rc;

pub(super) fn install(interp: &mut Interpreter) {
    let json = interp.define_namespace("JSON");
    interp.define_method(json, "stringify", 3, json_stringify);
    interp.define_method(json, "parse", 2, json_parse);
}

impl Interpreter {
    /// Convert a value to JSON; `None` for values that are skipped entirely
    fn to_json(
        &mut self,
        value: &Value,
        stack: &mut Vec<ObjectId>,
        location: SourceLocation,
    ) -> Result<Option<Json>, RuntimeError> {
        let value = match value.as_object() {
            Some(_) => self.apply_to_json(value, location)?,
            None => value.clone(),
        };
        let id = match value {
            Value::Undefined => return Ok(None),
            Value::Null => return Ok(Some(Json::Null)),
            Value::Bool(b) => return Ok(Some(Json::Bool(b))),
            Value::Number(n) => return Ok(Some(json_number(n))),
            Value::String(s) => return Ok(Some(Json::String(s.to_string()))),
            Value::Object(id) => id,
        };
        if self.heap.get(id).is_callable() {
            return Ok(None);
        }
        if stack.contains(&id) {
            return Err(RuntimeError::type_error(
                "Converting circular structure to JSON",
                location,
            ));
        }
        if stack.len() >= self.config.max_nesting_depth {
            return Err(RuntimeError::CallStackExceeded { location });
        }

        stack.push(id);
        let result = self.object_to_json(id, stack, location);
        stack.pop();
        result.map(Some)
    }

    /// Call a `toJSON` method when the object has one
    fn apply_to_json(&mut self, value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
        let method = self.get_property(value, "toJSON", location)?;
        if self.is_callable(&method) {
            return self.call_function(&method, value.clone(), Vec::new(), location);
        }
        Ok(value.clone())
    }

    fn object_to_json(
        &mut self,
        id: ObjectId,
        stack: &mut Vec<ObjectId>,
        location: SourceLocation,
    ) -> Result<Json, RuntimeError> {
        if let ObjectKind::Array(elements) = &self.heap.get(id).kind {
            let elements = elements.clone();
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                let item = match element {
                    Some(value) => self.to_json(&value, stack, location)?,
                    None => None,
                };
                items.push(item.unwrap_or(Json::Null));
            }
            return Ok(Json::Array(items));
        }

        let target = Value::Object(id);
        let mut map = Map::new();
        for key in self.own_enumerable_keys(id) {
            let value = self.get_property(&target, &key, location)?;
            if let Some(json) = self.to_json(&value, stack, location)? {
                map.insert(key.to_string(), json);
            }
        }
        Ok(Json::Object(map))
    }

    fn from_json(&mut self, json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::str(s),
            Json::Array(items) => {
                let values = items.iter().map(|item| self.from_json(item)).collect();
                Value::Object(self.new_array(values))
            }
            Json::Object(map) => {
                let object = self.new_object();
                for (key, item) in map {
                    let value = self.from_json(item);
                    self.define_own(object, Rc::from(key.as_str()), value);
                }
                Value::Object(object)
            }
        }
    }
}

/// Non-finite numbers have no JSON form
fn json_number(n: f64) -> Json {
    Number::from_f64(n).map_or(Json::Null, Json::Number)
}

/// Wraps a serde formatter so numbers are written the way `String(n)` writes them
struct JsNumbers<F>(F);

impl<F: Formatter> Formatter for JsNumbers<F> {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(number_to_string(value).as_bytes())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn end_object_key<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_key(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}

/// The `space` argument: a number of spaces (max 10) or a string prefix
fn indent_arg(
    interp: &mut Interpreter,
    space: &Value,
    location: SourceLocation,
) -> Result<String, RuntimeError> {
    Ok(match space {
        Value::Number(_) => {
            let n = interp.to_integer_value(space, location)?.clamp(0.0, 10.0);
            " ".repeat(n as usize)
        }
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    })
}

fn render(json: &Json, indent: &str) -> String {
    if indent.is_empty() {
        serialize_with(json, JsNumbers(CompactFormatter))
    } else {
        serialize_with(json, JsNumbers(PrettyFormatter::with_indent(indent.as_bytes())))
    }
}

fn serialize_with<F: Formatter>(json: &Json, formatter: F) -> String {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    match json.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => json.to_string(),
    }
}

fn json_stringify(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let indent = indent_arg(interp, &arg(args, 2), location)?;
    let mut stack = Vec::new();
    match interp.to_json(&arg(args, 0), &mut stack, location)? {
        Some(json) => Ok(Value::from(render(&json, &indent))),
        None => Ok(Value::Undefined),
    }
}

fn json_parse(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let text = interp.to_js_string(&arg(args, 0), location)?;
    match serde_json::from_str::<Json>(&text) {
        Ok(json) => Ok(interp.from_json(&json)),
        Err(err) if err.is_eof() => Err(RuntimeError::syntax_error(
            "Unexpected end of JSON input",
            location,
        )),
        Err(err) => Err(RuntimeError::syntax_error(
            format!(
                "Unexpected token in JSON at line {} column {}",
                err.line(),
                err.column()
            ),
            location,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_render_like_javascript() {
        let cases = [
            (3.0, "3"),
            (-0.0, "0"),
            (1.5, "1.5"),
            (9007199254740992.0, "9007199254740992"),
            (1e20, "100000000000000000000"),
            (1e21, "1e+21"),
            (1.5e-7, "1.5e-7"),
        ];
        for (n, expected) in cases {
            assert_eq!(render(&json_number(n), ""), expected, "{}", n);
        }
        assert_eq!(json_number(f64::NAN), Json::Null);
        assert_eq!(json_number(f64::INFINITY), Json::Null);
    }

    #[test]
    fn test_render_with_indent() {
        let json: Json = serde_json::from_str(r#"{"b":1,"a":[true,null]}"#).unwrap();
        assert_eq!(render(&json, ""), r#"{"b":1,"a":[true,null]}"#);
        assert_eq!(
            render(&json, "  "),
            "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}"
        );
    }
}
