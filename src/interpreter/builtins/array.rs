//! `Array` and `Array.prototype`
//!
//! Methods operate on array objects only; generic array-likes are accepted by
//! `Array.from` and nowhere else. Callback-taking methods read elements live,
//! so a callback that mutates the array sees its own writes, matching the
//! observable order of a JavaScript engine.

use super::arg;
use crate::interpreter::constants::MAX_ARRAY_LENGTH;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::{relative_index, to_boolean};
use crate::memory::heap::{NativeFn, ObjectKind};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;
use std::cmp::Ordering;

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.array_prototype;
    let ctor = interp.define_constructor("Array", 1, array_constructor, proto);
    interp.define_method(ctor, "isArray", 1, array_is_array);
    interp.define_method(ctor, "of", 0, array_of);
    interp.define_method(ctor, "from", 1, array_from);

    let methods: [(&'static str, usize, NativeFn); 32] = [
        ("push", 1, array_push),
        ("pop", 0, array_pop),
        ("shift", 0, array_shift),
        ("unshift", 1, array_unshift),
        ("slice", 2, array_slice),
        ("splice", 2, array_splice),
        ("concat", 1, array_concat),
        ("join", 1, array_join),
        ("reverse", 0, array_reverse),
        ("indexOf", 1, array_index_of),
        ("lastIndexOf", 1, array_last_index_of),
        ("includes", 1, array_includes),
        ("find", 1, array_find),
        ("findIndex", 1, array_find_index),
        ("findLast", 1, array_find_last),
        ("findLastIndex", 1, array_find_last_index),
        ("filter", 1, array_filter),
        ("map", 1, array_map),
        ("forEach", 1, array_for_each),
        ("reduce", 1, array_reduce),
        ("reduceRight", 1, array_reduce_right),
        ("some", 1, array_some),
        ("every", 1, array_every),
        ("sort", 1, array_sort),
        ("flat", 0, array_flat),
        ("flatMap", 1, array_flat_map),
        ("fill", 1, array_fill),
        ("at", 1, array_at),
        ("keys", 0, array_keys),
        ("values", 0, array_values),
        ("entries", 0, array_entries),
        ("toString", 0, array_to_string),
    ];
    for (name, length, call) in methods {
        interp.define_method(proto, name, length, call);
    }
}

// ========== Helpers ==========

fn this_array(
    interp: &Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<ObjectId, RuntimeError> {
    match this.as_object() {
        Some(id) if interp.heap.get(id).is_array() => Ok(id),
        _ => Err(RuntimeError::type_error(
            format!("Array.prototype.{} called on non-array", method),
            location,
        )),
    }
}

/// `this_array` for methods that write, rejecting frozen arrays
fn this_mutable_array(
    interp: &Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<ObjectId, RuntimeError> {
    let id = this_array(interp, this, method, location)?;
    if !interp.heap.get(id).frozen {
        return Ok(id);
    }
    let message = match method {
        "push" | "unshift" | "splice" => format!(
            "Cannot add property {}, object is not extensible",
            elements_len(interp, id)
        ),
        _ => "Cannot assign to read only property '0' of object '[object Array]'".to_string(),
    };
    Err(RuntimeError::type_error(message, location))
}

fn elements_len(interp: &Interpreter, id: ObjectId) -> usize {
    match &interp.heap.get(id).kind {
        ObjectKind::Array(elements) => elements.len(),
        _ => 0,
    }
}

/// Element `i`; `None` for holes and out-of-range indices
fn element(interp: &Interpreter, id: ObjectId, i: usize) -> Option<Value> {
    match &interp.heap.get(id).kind {
        ObjectKind::Array(elements) => elements.get(i).cloned().flatten(),
        _ => None,
    }
}

fn snapshot(interp: &Interpreter, id: ObjectId) -> Vec<Option<Value>> {
    match &interp.heap.get(id).kind {
        ObjectKind::Array(elements) => elements.clone(),
        _ => Vec::new(),
    }
}

fn elements_mut(interp: &mut Interpreter, id: ObjectId) -> Option<&mut Vec<Option<Value>>> {
    match &mut interp.heap.get_mut(id).kind {
        ObjectKind::Array(elements) => Some(elements),
        _ => None,
    }
}

/// Integer argument resolved against `len` (negative counts from the end)
fn relative_arg(
    interp: &mut Interpreter,
    args: &[Value],
    i: usize,
    len: usize,
    default: usize,
    location: SourceLocation,
) -> Result<usize, RuntimeError> {
    match arg(args, i) {
        Value::Undefined => Ok(default),
        other => Ok(relative_index(interp.to_integer_value(&other, location)?, len)),
    }
}

fn callback_arg(
    interp: &Interpreter,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let callback = arg(args, 0);
    interp.expect_callable(&callback, location)?;
    Ok(callback)
}

/// Call `callback(value, index, array)` with the optional `thisArg`
fn call_back(
    interp: &mut Interpreter,
    callback: &Value,
    this_arg: &Value,
    value: Value,
    index: usize,
    array: ObjectId,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    interp.call_function(
        callback,
        this_arg.clone(),
        vec![value, Value::from(index), Value::Object(array)],
        location,
    )
}

fn finish(interp: &mut Interpreter, values: Vec<Value>) -> Result<Value, RuntimeError> {
    Ok(Value::Object(interp.new_array(values)))
}

// ========== Constructor and statics ==========

/// `Array(...)` / `new Array(...)`; a lone numeric argument is a length
fn array_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let elements = match args {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || *n > MAX_ARRAY_LENGTH as f64 {
                return Err(RuntimeError::range_error("Invalid array length", location));
            }
            vec![None; *n as usize]
        }
        _ => args.iter().cloned().map(Some).collect(),
    };
    match this {
        Value::Object(id) if matches!(interp.heap.get(*id).kind, ObjectKind::Ordinary) => {
            interp.heap.get_mut(*id).kind = ObjectKind::Array(elements);
            Ok(this.clone())
        }
        _ => Ok(Value::Object(interp.new_array_with_holes(elements))),
    }
}

fn array_is_array(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let is_array = args
        .first()
        .and_then(Value::as_object)
        .is_some_and(|id| interp.heap.get(id).is_array());
    Ok(Value::Bool(is_array))
}

fn array_of(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    finish(interp, args.to_vec())
}

/// `Array.from(iterable | arrayLike, mapFn?)`
fn array_from(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let source = arg(args, 0);
    let map_fn = arg(args, 1);
    if !map_fn.is_undefined() {
        interp.expect_callable(&map_fn, location)?;
    }

    let iterable = match &source {
        Value::String(_) => true,
        Value::Object(id) => matches!(
            interp.heap.get(*id).kind,
            ObjectKind::Array(_) | ObjectKind::Map(_) | ObjectKind::Set(_)
        ),
        Value::Undefined | Value::Null => {
            let shown = interp.inspector().inspect(&source);
            return Err(RuntimeError::type_error(
                format!("{} is not iterable", shown),
                location,
            ));
        }
        _ => false,
    };
    let items = if iterable {
        interp.iterate(&source, location)?
    } else if let Value::Object(_) = source {
        let length = interp.get_property(&source, "length", location)?;
        let length = interp.to_integer_value(&length, location)?.max(0.0);
        if length > MAX_ARRAY_LENGTH as f64 {
            return Err(RuntimeError::range_error("Invalid array length", location));
        }
        let mut items = Vec::with_capacity(length as usize);
        for i in 0..length as usize {
            items.push(interp.get_index(&source, &Value::from(i), location)?);
        }
        items
    } else {
        Vec::new()
    };

    if map_fn.is_undefined() {
        return finish(interp, items);
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(interp.call_function(
            &map_fn,
            Value::Undefined,
            vec![item, Value::from(i)],
            location,
        )?);
    }
    finish(interp, mapped)
}

// ========== Mutators ==========

fn array_push(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "push", location)?;
    if elements_len(interp, id) + args.len() > MAX_ARRAY_LENGTH {
        return Err(RuntimeError::range_error("Invalid array length", location));
    }
    let Some(elements) = elements_mut(interp, id) else {
        return Ok(Value::Undefined);
    };
    elements.extend(args.iter().cloned().map(Some));
    Ok(Value::from(elements.len()))
}

fn array_pop(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "pop", location)?;
    Ok(elements_mut(interp, id)
        .and_then(Vec::pop)
        .flatten()
        .unwrap_or_default())
}

fn array_shift(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "shift", location)?;
    let Some(elements) = elements_mut(interp, id) else {
        return Ok(Value::Undefined);
    };
    if elements.is_empty() {
        return Ok(Value::Undefined);
    }
    Ok(elements.remove(0).unwrap_or_default())
}

fn array_unshift(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "unshift", location)?;
    let Some(elements) = elements_mut(interp, id) else {
        return Ok(Value::Undefined);
    };
    elements.splice(0..0, args.iter().cloned().map(Some));
    Ok(Value::from(elements.len()))
}

/// `splice(start, deleteCount, ...items)`, returning the removed elements
fn array_splice(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "splice", location)?;
    let len = elements_len(interp, id);
    let start = relative_arg(interp, args, 0, len, 0, location)?;
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => {
            let n = interp.to_integer_value(&args[1], location)?;
            n.max(0.0).min((len - start) as f64) as usize
        }
    };
    let inserted = args.get(2..).unwrap_or_default().iter().cloned().map(Some);
    let removed: Vec<Option<Value>> = match elements_mut(interp, id) {
        Some(elements) => elements.splice(start..start + delete_count, inserted).collect(),
        None => Vec::new(),
    };
    Ok(Value::Object(interp.new_array_with_holes(removed)))
}

fn array_reverse(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "reverse", location)?;
    if let Some(elements) = elements_mut(interp, id) {
        elements.reverse();
    }
    Ok(this.clone())
}

fn array_fill(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_mutable_array(interp, this, "fill", location)?;
    let len = elements_len(interp, id);
    let start = relative_arg(interp, args, 1, len, 0, location)?;
    let end = relative_arg(interp, args, 2, len, len, location)?;
    let value = arg(args, 0);
    if let Some(elements) = elements_mut(interp, id) {
        for slot in elements.iter_mut().take(end).skip(start) {
            *slot = Some(value.clone());
        }
    }
    Ok(this.clone())
}

/// Stable merge sort; `undefined` sorts last and holes after that
fn array_sort(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let comparator = arg(args, 0);
    if !comparator.is_undefined() && !interp.is_callable(&comparator) {
        return Err(RuntimeError::type_error(
            "The comparison function must be either a function or undefined",
            location,
        ));
    }
    let id = this_mutable_array(interp, this, "sort", location)?;

    let elements = snapshot(interp, id);
    let total = elements.len();
    let present: Vec<Value> = elements.into_iter().flatten().collect();
    let holes = total - present.len();
    let (defined, undefined): (Vec<Value>, Vec<Value>) =
        present.into_iter().partition(|v| !v.is_undefined());

    let mut compare = |interp: &mut Interpreter, a: &Value, b: &Value| {
        compare_elements(interp, &comparator, a, b, location)
    };
    let mut sorted = merge_sort(interp, defined, &mut compare)?;
    sorted.extend(undefined);

    let mut result: Vec<Option<Value>> = sorted.into_iter().map(Some).collect();
    result.resize(total.max(result.len() + holes), None);
    if let Some(elements) = elements_mut(interp, id) {
        *elements = result;
    }
    Ok(this.clone())
}

fn compare_elements(
    interp: &mut Interpreter,
    comparator: &Value,
    a: &Value,
    b: &Value,
    location: SourceLocation,
) -> Result<Ordering, RuntimeError> {
    if comparator.is_undefined() {
        let a = interp.to_js_string(a, location)?;
        let b = interp.to_js_string(b, location)?;
        return Ok(a.encode_utf16().cmp(b.encode_utf16()));
    }
    let result = interp.call_function(
        comparator,
        Value::Undefined,
        vec![a.clone(), b.clone()],
        location,
    )?;
    let n = interp.to_number(&result, location)?;
    Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
}

type Comparator<'a> =
    dyn FnMut(&mut Interpreter, &Value, &Value) -> Result<Ordering, RuntimeError> + 'a;

fn merge_sort(
    interp: &mut Interpreter,
    mut items: Vec<Value>,
    compare: &mut Comparator<'_>,
) -> Result<Vec<Value>, RuntimeError> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(interp, items, compare)?;
    let right = merge_sort(interp, right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // Ties keep the left element first
        let next = if compare(interp, l, r)? == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

// ========== Accessors ==========

fn array_slice(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "slice", location)?;
    let len = elements_len(interp, id);
    let start = relative_arg(interp, args, 0, len, 0, location)?;
    let end = relative_arg(interp, args, 1, len, len, location)?;
    let elements = snapshot(interp, id);
    let sliced = elements.get(start..end.max(start)).unwrap_or_default().to_vec();
    Ok(Value::Object(interp.new_array_with_holes(sliced)))
}

fn array_concat(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "concat", location)?;
    let mut result = snapshot(interp, id);
    for value in args {
        match interp.array_elements(value) {
            Some(elements) => result.extend(elements.iter().cloned()),
            None => result.push(Some(value.clone())),
        }
    }
    if result.len() > MAX_ARRAY_LENGTH {
        return Err(RuntimeError::range_error("Invalid array length", location));
    }
    Ok(Value::Object(interp.new_array_with_holes(result)))
}

impl Interpreter {
    /// `Array.prototype.join`, with cyclic references rendered as empty strings
    pub(crate) fn join_array(
        &mut self,
        id: ObjectId,
        separator: &str,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        if self.joining.contains(&id) {
            return Ok(String::new());
        }
        if self.joining.len() >= self.config.max_nesting_depth {
            return Err(RuntimeError::CallStackExceeded { location });
        }
        self.joining.push(id);
        let result = self.join_elements(id, separator, location);
        self.joining.pop();
        result
    }

    fn join_elements(
        &mut self,
        id: ObjectId,
        separator: &str,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        let len = elements_len(self, id);
        let mut out = String::new();
        for i in 0..len {
            if i > 0 {
                self.push_str_checked(&mut out, separator, location)?;
            }
            match element(self, id, i) {
                None | Some(Value::Undefined) | Some(Value::Null) => {}
                Some(value) => {
                    let text = self.to_js_string(&value, location)?;
                    self.push_str_checked(&mut out, &text, location)?;
                }
            }
        }
        Ok(out)
    }
}

fn array_join(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "join", location)?;
    let separator = match arg(args, 0) {
        Value::Undefined => ",".into(),
        other => interp.to_js_string(&other, location)?,
    };
    Ok(Value::from(interp.join_array(id, &separator, location)?))
}

fn array_to_string(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match this.as_object() {
        Some(id) if interp.heap.get(id).is_array() => {
            Ok(Value::from(interp.join_array(id, ",", location)?))
        }
        _ => Ok(Value::str("[object Object]")),
    }
}

fn array_index_of(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "indexOf", location)?;
    let len = elements_len(interp, id);
    let from = relative_arg(interp, args, 1, len, 0, location)?;
    let target = arg(args, 0);
    let found = snapshot(interp, id)
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, e)| e.as_ref().is_some_and(|v| v.strict_equals(&target)))
        .map(|(i, _)| i);
    Ok(found.map_or(Value::Number(-1.0), Value::from))
}

fn array_last_index_of(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "lastIndexOf", location)?;
    let len = elements_len(interp, id);
    if len == 0 {
        return Ok(Value::Number(-1.0));
    }
    let from = match arg(args, 1) {
        Value::Undefined => len - 1,
        other => {
            let n = interp.to_integer_value(&other, location)?;
            if n < 0.0 && -n > len as f64 {
                return Ok(Value::Number(-1.0));
            }
            relative_index(n, len).min(len - 1)
        }
    };
    let target = arg(args, 0);
    let elements = snapshot(interp, id);
    let found = (0..=from)
        .rev()
        .find(|&i| elements[i].as_ref().is_some_and(|v| v.strict_equals(&target)));
    Ok(found.map_or(Value::Number(-1.0), Value::from))
}

/// `includes` treats holes as `undefined` and `NaN` as equal to itself
fn array_includes(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "includes", location)?;
    let len = elements_len(interp, id);
    let from = relative_arg(interp, args, 1, len, 0, location)?;
    let target = arg(args, 0);
    let found = snapshot(interp, id)
        .into_iter()
        .skip(from)
        .any(|e| e.unwrap_or_default().same_value_zero(&target));
    Ok(Value::Bool(found))
}

fn array_at(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "at", location)?;
    let len = elements_len(interp, id) as f64;
    let n = interp.to_integer_value(&arg(args, 0), location)?;
    let index = if n < 0.0 { len + n } else { n };
    if index < 0.0 || index >= len {
        return Ok(Value::Undefined);
    }
    Ok(element(interp, id, index as usize).unwrap_or_default())
}

// ========== Iteration ==========

/// Shared body of `find`, `findIndex`, `findLast` and `findLastIndex`.
/// Holes are visited as `undefined`.
fn find_with(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
    method: &str,
    from_end: bool,
) -> Result<Option<(usize, Value)>, RuntimeError> {
    let id = this_array(interp, this, method, location)?;
    let callback = callback_arg(interp, args, location)?;
    let this_arg = arg(args, 1);
    let len = elements_len(interp, id);
    let indices: Box<dyn Iterator<Item = usize>> = if from_end {
        Box::new((0..len).rev())
    } else {
        Box::new(0..len)
    };
    for i in indices {
        let value = element(interp, id, i).unwrap_or_default();
        let result = call_back(interp, &callback, &this_arg, value.clone(), i, id, location)?;
        if to_boolean(&result) {
            return Ok(Some((i, value)));
        }
    }
    Ok(None)
}

fn array_find(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let found = find_with(interp, this, args, location, "find", false)?;
    Ok(found.map(|(_, v)| v).unwrap_or_default())
}

fn array_find_index(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let found = find_with(interp, this, args, location, "findIndex", false)?;
    Ok(found.map_or(Value::Number(-1.0), |(i, _)| Value::from(i)))
}

fn array_find_last(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let found = find_with(interp, this, args, location, "findLast", true)?;
    Ok(found.map(|(_, v)| v).unwrap_or_default())
}

fn array_find_last_index(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let found = find_with(interp, this, args, location, "findLastIndex", true)?;
    Ok(found.map_or(Value::Number(-1.0), |(i, _)| Value::from(i)))
}

/// Visit present elements in order, stopping early when `visit` returns false
fn each_present(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
    method: &str,
    mut visit: impl FnMut(&mut Interpreter, usize, Value, Value) -> Result<bool, RuntimeError>,
) -> Result<(), RuntimeError> {
    let id = this_array(interp, this, method, location)?;
    let callback = callback_arg(interp, args, location)?;
    let this_arg = arg(args, 1);
    let len = elements_len(interp, id);
    for i in 0..len {
        let Some(value) = element(interp, id, i) else {
            continue;
        };
        let result = call_back(interp, &callback, &this_arg, value.clone(), i, id, location)?;
        if !visit(interp, i, value, result)? {
            break;
        }
    }
    Ok(())
}

fn array_for_each(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    each_present(interp, this, args, location, "forEach", |_, _, _, _| Ok(true))?;
    Ok(Value::Undefined)
}

fn array_map(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "map", location)?;
    let mut mapped: Vec<Option<Value>> = vec![None; elements_len(interp, id)];
    each_present(interp, this, args, location, "map", |_, i, _, result| {
        if let Some(slot) = mapped.get_mut(i) {
            *slot = Some(result);
        }
        Ok(true)
    })?;
    Ok(Value::Object(interp.new_array_with_holes(mapped)))
}

fn array_filter(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut kept = Vec::new();
    each_present(interp, this, args, location, "filter", |_, _, value, result| {
        if to_boolean(&result) {
            kept.push(value);
        }
        Ok(true)
    })?;
    finish(interp, kept)
}

fn array_some(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut found = false;
    each_present(interp, this, args, location, "some", |_, _, _, result| {
        found = to_boolean(&result);
        Ok(!found)
    })?;
    Ok(Value::Bool(found))
}

fn array_every(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut all = true;
    each_present(interp, this, args, location, "every", |_, _, _, result| {
        all = to_boolean(&result);
        Ok(all)
    })?;
    Ok(Value::Bool(all))
}

fn reduce_with(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
    method: &str,
    from_end: bool,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, method, location)?;
    let callback = callback_arg(interp, args, location)?;
    let len = elements_len(interp, id);
    let mut indices: Box<dyn Iterator<Item = usize>> = if from_end {
        Box::new((0..len).rev())
    } else {
        Box::new(0..len)
    };

    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => loop {
            match indices.next() {
                Some(i) => {
                    if let Some(value) = element(interp, id, i) {
                        break value;
                    }
                }
                None => {
                    return Err(RuntimeError::type_error(
                        "Reduce of empty array with no initial value",
                        location,
                    ))
                }
            }
        },
    };
    for i in indices {
        let Some(value) = element(interp, id, i) else {
            continue;
        };
        accumulator = interp.call_function(
            &callback,
            Value::Undefined,
            vec![accumulator, value, Value::from(i), Value::Object(id)],
            location,
        )?;
    }
    Ok(accumulator)
}

fn array_reduce(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    reduce_with(interp, this, args, location, "reduce", false)
}

fn array_reduce_right(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    reduce_with(interp, this, args, location, "reduceRight", true)
}

/// Append `value` to `out`, spreading arrays up to `depth` levels deep.
/// `nesting` counts the arrays already entered.
fn flatten_into(
    interp: &Interpreter,
    out: &mut Vec<Value>,
    value: Value,
    depth: f64,
    nesting: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    if depth >= 1.0 {
        if let Some(elements) = interp.array_elements(&value) {
            if nesting >= interp.config.max_nesting_depth {
                return Err(RuntimeError::CallStackExceeded { location });
            }
            for element in elements.clone().into_iter().flatten() {
                flatten_into(interp, out, element, depth - 1.0, nesting + 1, location)?;
            }
            return Ok(());
        }
    }
    out.push(value);
    Ok(())
}

fn array_flat(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "flat", location)?;
    let depth = match arg(args, 0) {
        Value::Undefined => 1.0,
        other => interp.to_integer_value(&other, location)?,
    };
    let mut out = Vec::new();
    for value in snapshot(interp, id).into_iter().flatten() {
        flatten_into(interp, &mut out, value, depth, 0, location)?;
    }
    finish(interp, out)
}

fn array_flat_map(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut out = Vec::new();
    each_present(interp, this, args, location, "flatMap", |interp, _, _, result| {
        flatten_into(interp, &mut out, result, 1.0, 0, location)?;
        Ok(true)
    })?;
    finish(interp, out)
}

fn array_keys(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "keys", location)?;
    let keys = (0..elements_len(interp, id)).map(Value::from).collect();
    finish(interp, keys)
}

fn array_values(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "values", location)?;
    let values = snapshot(interp, id)
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    finish(interp, values)
}

fn array_entries(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_array(interp, this, "entries", location)?;
    let mut entries = Vec::new();
    for (i, value) in snapshot(interp, id).into_iter().enumerate() {
        let pair = interp.new_array(vec![Value::from(i), value.unwrap_or_default()]);
        entries.push(Value::Object(pair));
    }
    finish(interp, entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_number(_: &mut Interpreter, a: &Value, b: &Value) -> Result<Ordering, RuntimeError> {
        let (a, b) = (a.as_number().unwrap_or(0.0), b.as_number().unwrap_or(0.0));
        Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
    }

    #[test]
    fn test_merge_sort_orders_values() {
        let mut interp = Interpreter::new(Default::default());
        let items = [5.0, 1.0, 4.0, 2.0, 3.0].map(Value::Number).to_vec();
        let sorted = merge_sort(&mut interp, items, &mut by_number).unwrap();
        let numbers: Vec<f64> = sorted.iter().filter_map(Value::as_number).collect();
        assert_eq!(numbers, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_merge_sort_is_stable() {
        let mut interp = Interpreter::new(Default::default());
        let items = vec![
            interp.new_array(vec![Value::Number(1.0), Value::str("a")]),
            interp.new_array(vec![Value::Number(0.0), Value::str("b")]),
            interp.new_array(vec![Value::Number(1.0), Value::str("c")]),
            interp.new_array(vec![Value::Number(0.0), Value::str("d")]),
        ];
        let values = items.into_iter().map(Value::Object).collect();
        let mut by_first = |interp: &mut Interpreter, a: &Value, b: &Value| {
            let first = |v: &Value| {
                interp
                    .array_elements(v)
                    .and_then(|e| e[0].as_ref().and_then(Value::as_number))
                    .unwrap_or(0.0)
            };
            Ok::<_, RuntimeError>(first(a).partial_cmp(&first(b)).unwrap_or(Ordering::Equal))
        };
        let sorted = merge_sort(&mut interp, values, &mut by_first).unwrap();
        let labels: Vec<String> = sorted
            .iter()
            .map(|v| {
                interp.array_elements(v).unwrap()[1]
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(labels, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_join_guards_cycles() {
        let mut interp = Interpreter::new(Default::default());
        let inner = interp.new_array(vec![Value::Number(1.0)]);
        let outer = interp.new_array(vec![Value::Object(inner), Value::Number(2.0)]);
        interp.define_own(inner, "1".into(), Value::Object(outer));
        let joined = interp.join_array(outer, ",", SourceLocation::new(1, 1)).unwrap();
        assert_eq!(joined, "1,,2");
    }
}
