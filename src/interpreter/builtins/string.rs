//! `String` and `String.prototype`
//!
//! Strings are stored as UTF-8, but every index a snippet can observe counts
//! UTF-16 code units, so methods that take or return positions work on the
//! code-unit view of the string.

use super::arg;
use crate::inspect::number::is_js_whitespace;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::{relative_index, to_integer, to_uint32};
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use std::cmp::Ordering;
use std::rc::Rc;

/// Length in UTF-16 code units
pub(crate) fn utf16_len(s: &str) -> usize {
    if s.is_ascii() {
        s.len()
    } else {
        s.encode_utf16().count()
    }
}

/// The code unit at `index` as a one-unit string (lone surrogates become U+FFFD)
pub(crate) fn code_unit_string(s: &str, index: usize) -> Option<String> {
    if s.is_ascii() {
        return s.get(index..index + 1).map(str::to_string);
    }
    let unit = s.encode_utf16().nth(index)?;
    Some(String::from_utf16_lossy(&[unit]))
}

pub(crate) fn to_units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub(crate) fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// First occurrence of `needle` in `hay` at or after `from`
pub(crate) fn find_units(hay: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= hay.len()).then_some(from);
    }
    if needle.len() > hay.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()] == *needle)
}

/// Last occurrence of `needle` in `hay` starting at or before `from`
fn rfind_units(hay: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.len() > hay.len() {
        return None;
    }
    let last = (hay.len() - needle.len()).min(from);
    (0..=last).rev().find(|&i| hay[i..i + needle.len()] == *needle)
}

/// Clamp an integer argument into `0..=len`
fn clamp_index(n: f64, len: usize) -> usize {
    n.max(0.0).min(len as f64) as usize
}

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.string_prototype;
    let ctor = interp.define_constructor("String", 1, string_constructor, proto);
    interp.define_method(ctor, "fromCharCode", 1, string_from_char_code);
    interp.define_method(ctor, "fromCodePoint", 1, string_from_code_point);

    let methods: [(&'static str, usize, crate::memory::heap::NativeFn); 36] = [
        ("charAt", 1, string_char_at),
        ("charCodeAt", 1, string_char_code_at),
        ("codePointAt", 1, string_code_point_at),
        ("at", 1, string_at),
        ("indexOf", 1, string_index_of),
        ("lastIndexOf", 1, string_last_index_of),
        ("includes", 1, string_includes),
        ("startsWith", 1, string_starts_with),
        ("endsWith", 1, string_ends_with),
        ("slice", 2, string_slice),
        ("substring", 2, string_substring),
        ("substr", 2, string_substr),
        ("toUpperCase", 0, string_to_upper_case),
        ("toLowerCase", 0, string_to_lower_case),
        ("toLocaleUpperCase", 0, string_to_upper_case),
        ("toLocaleLowerCase", 0, string_to_lower_case),
        ("trim", 0, string_trim),
        ("trimStart", 0, string_trim_start),
        ("trimEnd", 0, string_trim_end),
        ("trimLeft", 0, string_trim_start),
        ("trimRight", 0, string_trim_end),
        ("padStart", 2, string_pad_start),
        ("padEnd", 2, string_pad_end),
        ("repeat", 1, string_repeat),
        ("split", 2, string_split),
        ("replace", 2, string_replace),
        ("replaceAll", 2, string_replace_all),
        ("match", 1, string_match),
        ("matchAll", 1, string_match_all),
        ("search", 1, string_search),
        ("concat", 1, string_concat),
        ("localeCompare", 1, string_locale_compare),
        ("normalize", 0, string_normalize),
        ("toString", 0, string_to_string),
        ("valueOf", 0, string_to_string),
        ("isWellFormed", 0, string_is_well_formed),
    ];
    for (name, length, call) in methods {
        interp.define_method(proto, name, length, call);
    }
}

/// `this` of a string method, converted with `ToString`
fn this_string(
    interp: &mut Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<Rc<str>, RuntimeError> {
    if this.is_nullish() {
        return Err(RuntimeError::type_error(
            format!("String.prototype.{} called on null or undefined", method),
            location,
        ));
    }
    interp.to_js_string(this, location)
}

/// Optional integer argument; `undefined` maps to `default`
fn int_arg(
    interp: &mut Interpreter,
    args: &[Value],
    i: usize,
    default: f64,
    location: SourceLocation,
) -> Result<f64, RuntimeError> {
    match arg(args, i) {
        Value::Undefined => Ok(default),
        other => interp.to_integer_value(&other, location),
    }
}

fn string_arg(
    interp: &mut Interpreter,
    args: &[Value],
    i: usize,
    location: SourceLocation,
) -> Result<Rc<str>, RuntimeError> {
    interp.to_js_string(&arg(args, i), location)
}

fn string_constructor(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Ok(Value::str(""));
    }
    Ok(Value::String(string_arg(interp, args, 0, location)?))
}

fn string_from_char_code(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut units = Vec::with_capacity(args.len());
    for value in args {
        let n = interp.to_number(value, location)?;
        units.push(to_uint32(n) as u16);
    }
    Ok(Value::from(from_units(&units)))
}

fn string_from_code_point(
    interp: &mut Interpreter,
    _this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let mut text = String::new();
    for value in args {
        let n = interp.to_number(value, location)?;
        let c = (n.fract() == 0.0 && n >= 0.0)
            .then(|| char::from_u32(n as u32))
            .flatten()
            .ok_or_else(|| {
                RuntimeError::range_error(
                    format!("Invalid code point {}", crate::inspect::format_number(n)),
                    location,
                )
            })?;
        text.push(c);
    }
    Ok(Value::from(text))
}

fn string_char_at(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "charAt", location)?;
    let index = int_arg(interp, args, 0, 0.0, location)?;
    if index < 0.0 {
        return Ok(Value::str(""));
    }
    Ok(Value::from(code_unit_string(&s, index as usize).unwrap_or_default()))
}

fn string_char_code_at(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "charCodeAt", location)?;
    let index = int_arg(interp, args, 0, 0.0, location)?;
    let unit = (index >= 0.0)
        .then(|| s.encode_utf16().nth(index as usize))
        .flatten();
    Ok(Value::Number(unit.map_or(f64::NAN, f64::from)))
}

fn string_code_point_at(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "codePointAt", location)?;
    let index = int_arg(interp, args, 0, 0.0, location)?;
    let units = to_units(&s);
    if index < 0.0 || index as usize >= units.len() {
        return Ok(Value::Undefined);
    }
    let i = index as usize;
    let first = units[i];
    let code = match units.get(i + 1) {
        Some(&second) if (0xD800..0xDC00).contains(&first) && (0xDC00..0xE000).contains(&second) => {
            0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
        }
        _ => u32::from(first),
    };
    Ok(Value::Number(f64::from(code)))
}

fn string_at(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "at", location)?;
    let index = int_arg(interp, args, 0, 0.0, location)?;
    let len = utf16_len(&s) as f64;
    let index = if index < 0.0 { len + index } else { index };
    if index < 0.0 || index >= len {
        return Ok(Value::Undefined);
    }
    Ok(code_unit_string(&s, index as usize)
        .map(Value::from)
        .unwrap_or_default())
}

fn string_index_of(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "indexOf", location)?;
    let search = string_arg(interp, args, 0, location)?;
    let hay = to_units(&s);
    let from = clamp_index(int_arg(interp, args, 1, 0.0, location)?, hay.len());
    let found = find_units(&hay, &to_units(&search), from);
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn string_last_index_of(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "lastIndexOf", location)?;
    let search = string_arg(interp, args, 0, location)?;
    let hay = to_units(&s);
    // NaN position means "search everything"
    let position = match interp.to_number(&arg(args, 1), location)? {
        n if n.is_nan() => f64::INFINITY,
        n => to_integer(n),
    };
    let from = clamp_index(position, hay.len());
    let found = rfind_units(&hay, &to_units(&search), from);
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

/// `includes`/`startsWith`/`endsWith` reject regular expressions
fn search_string_arg(
    interp: &mut Interpreter,
    args: &[Value],
    method: &str,
    location: SourceLocation,
) -> Result<Rc<str>, RuntimeError> {
    if interp.as_regexp(&arg(args, 0)).is_some() {
        return Err(RuntimeError::type_error(
            format!(
                "First argument to String.prototype.{} must not be a regular expression",
                method
            ),
            location,
        ));
    }
    string_arg(interp, args, 0, location)
}

fn string_includes(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "includes", location)?;
    let search = search_string_arg(interp, args, "includes", location)?;
    let hay = to_units(&s);
    let from = clamp_index(int_arg(interp, args, 1, 0.0, location)?, hay.len());
    Ok(Value::Bool(find_units(&hay, &to_units(&search), from).is_some()))
}

fn string_starts_with(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "startsWith", location)?;
    let search = to_units(&search_string_arg(interp, args, "startsWith", location)?);
    let hay = to_units(&s);
    let start = clamp_index(int_arg(interp, args, 1, 0.0, location)?, hay.len());
    Ok(Value::Bool(hay[start..].starts_with(&search)))
}

fn string_ends_with(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "endsWith", location)?;
    let search = to_units(&search_string_arg(interp, args, "endsWith", location)?);
    let hay = to_units(&s);
    let end = clamp_index(
        int_arg(interp, args, 1, hay.len() as f64, location)?,
        hay.len(),
    );
    Ok(Value::Bool(hay[..end].ends_with(&search)))
}

fn string_slice(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "slice", location)?;
    let units = to_units(&s);
    let len = units.len();
    let start = relative_index(int_arg(interp, args, 0, 0.0, location)?, len);
    let end = relative_index(int_arg(interp, args, 1, len as f64, location)?, len);
    if start >= end {
        return Ok(Value::str(""));
    }
    Ok(Value::from(from_units(&units[start..end])))
}

fn string_substring(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "substring", location)?;
    let units = to_units(&s);
    let len = units.len();
    let a = clamp_index(int_arg(interp, args, 0, 0.0, location)?, len);
    let b = clamp_index(int_arg(interp, args, 1, len as f64, location)?, len);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(Value::from(from_units(&units[start..end])))
}

fn string_substr(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "substr", location)?;
    let units = to_units(&s);
    let len = units.len();
    let start = relative_index(int_arg(interp, args, 0, 0.0, location)?, len);
    let count = int_arg(interp, args, 1, len as f64, location)?;
    let end = clamp_index(start as f64 + count.max(0.0), len);
    if start >= end {
        return Ok(Value::str(""));
    }
    Ok(Value::from(from_units(&units[start..end])))
}

fn string_to_upper_case(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "toUpperCase", location)?;
    Ok(Value::from(s.to_uppercase()))
}

fn string_to_lower_case(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "toLowerCase", location)?;
    Ok(Value::from(s.to_lowercase()))
}

fn string_trim(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "trim", location)?;
    Ok(Value::str(s.trim_matches(is_js_whitespace)))
}

fn string_trim_start(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "trimStart", location)?;
    Ok(Value::str(s.trim_start_matches(is_js_whitespace)))
}

fn string_trim_end(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "trimEnd", location)?;
    Ok(Value::str(s.trim_end_matches(is_js_whitespace)))
}

/// Shared body of `padStart`/`padEnd`
fn pad(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    at_start: bool,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let method = if at_start { "padStart" } else { "padEnd" };
    let s = this_string(interp, this, method, location)?;
    let target = int_arg(interp, args, 0, 0.0, location)?;
    let filler = match arg(args, 1) {
        Value::Undefined => vec![u16::from(b' ')],
        other => to_units(&interp.to_js_string(&other, location)?),
    };
    let units = to_units(&s);
    if target <= units.len() as f64 || filler.is_empty() {
        return Ok(Value::String(s));
    }
    if target > interp.config.max_string_length as f64 {
        return Err(RuntimeError::range_error("Invalid string length", location));
    }

    let fill_len = target as usize - units.len();
    let padding: Vec<u16> = filler.iter().copied().cycle().take(fill_len).collect();
    let mut result = Vec::with_capacity(target as usize);
    if at_start {
        result.extend_from_slice(&padding);
        result.extend_from_slice(&units);
    } else {
        result.extend_from_slice(&units);
        result.extend_from_slice(&padding);
    }
    Ok(Value::from(from_units(&result)))
}

fn string_pad_start(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    pad(interp, this, args, true, location)
}

fn string_pad_end(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    pad(interp, this, args, false, location)
}

fn string_repeat(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "repeat", location)?;
    let count = int_arg(interp, args, 0, 0.0, location)?;
    if count < 0.0 || count.is_infinite() {
        return Err(RuntimeError::range_error(
            format!("Invalid count value: {}", crate::inspect::format_number(count)),
            location,
        ));
    }
    if s.is_empty() {
        return Ok(Value::str(""));
    }
    if count * s.len() as f64 > interp.config.max_string_length as f64 {
        return Err(RuntimeError::range_error("Invalid string length", location));
    }
    Ok(Value::from(s.repeat(count as usize)))
}

fn string_split(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "split", location)?;
    let limit = match arg(args, 1) {
        Value::Undefined => u32::MAX as usize,
        other => to_uint32(interp.to_number(&other, location)?) as usize,
    };

    let separator = arg(args, 0);
    if let Some(re) = interp.as_regexp(&separator) {
        return interp.regexp_split(re, &s, limit, location);
    }

    let parts: Vec<Value> = match separator {
        _ if limit == 0 => Vec::new(),
        Value::Undefined => vec![Value::String(s.clone())],
        other => {
            let sep = to_units(&interp.to_js_string(&other, location)?);
            let units = to_units(&s);
            if sep.is_empty() {
                units
                    .iter()
                    .take(limit)
                    .map(|u| Value::from(from_units(&[*u])))
                    .collect()
            } else {
                let mut parts = Vec::new();
                let mut start = 0;
                while let Some(found) = find_units(&units, &sep, start) {
                    if parts.len() >= limit {
                        break;
                    }
                    parts.push(Value::from(from_units(&units[start..found])));
                    start = found + sep.len();
                }
                if parts.len() < limit {
                    parts.push(Value::from(from_units(&units[start..])));
                }
                parts
            }
        }
    };
    Ok(Value::Object(interp.new_array(parts)))
}

/// Shared body of `replace`/`replaceAll` with a string pattern
fn replace_string(
    interp: &mut Interpreter,
    s: &str,
    pattern: &str,
    replacement: &Value,
    all: bool,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let hay = to_units(s);
    let needle = to_units(pattern);

    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(found) = find_units(&hay, &needle, from) {
        positions.push(found);
        if !all {
            break;
        }
        from = found + needle.len().max(1);
        if from > hay.len() {
            break;
        }
    }
    if positions.is_empty() {
        return Ok(Value::from(s));
    }

    let template = match replacement {
        value if interp.is_callable(value) => None,
        other => Some(interp.to_js_string(other, location)?),
    };
    let mut result: Vec<u16> = Vec::with_capacity(hay.len());
    let mut last = 0;
    for position in positions {
        result.extend_from_slice(&hay[last..position]);
        let replaced = match &template {
            Some(template) => super::regexp::expand_replacement(
                template,
                pattern,
                position,
                s,
                &[],
                &[],
            ),
            None => {
                let args = vec![
                    Value::str(pattern),
                    Value::from(position),
                    Value::str(s),
                ];
                let value = interp.call_function(replacement, Value::Undefined, args, location)?;
                interp.to_js_string(&value, location)?.to_string()
            }
        };
        result.extend(replaced.encode_utf16());
        last = position + needle.len();
    }
    result.extend_from_slice(&hay[last..]);
    Ok(Value::from(from_units(&result)))
}

fn string_replace(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "replace", location)?;
    let pattern = arg(args, 0);
    let replacement = arg(args, 1);
    if let Some(re) = interp.as_regexp(&pattern) {
        return interp.regexp_replace(re, &s, &replacement, false, location);
    }
    let pattern = interp.to_js_string(&pattern, location)?;
    replace_string(interp, &s, &pattern, &replacement, false, location)
}

fn string_replace_all(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "replaceAll", location)?;
    let pattern = arg(args, 0);
    let replacement = arg(args, 1);
    if let Some(re) = interp.as_regexp(&pattern) {
        return interp.regexp_replace(re, &s, &replacement, true, location);
    }
    let pattern = interp.to_js_string(&pattern, location)?;
    replace_string(interp, &s, &pattern, &replacement, true, location)
}

fn string_match(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "match", location)?;
    let re = interp.regexp_argument(&arg(args, 0), "", location)?;
    interp.regexp_match(re, &s, location)
}

fn string_match_all(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "matchAll", location)?;
    let re = interp.regexp_argument(&arg(args, 0), "g", location)?;
    interp.regexp_match_all(re, &s, location)
}

fn string_search(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "search", location)?;
    let re = interp.regexp_argument(&arg(args, 0), "", location)?;
    interp.regexp_search(re, &s, location)
}

impl Interpreter {
    /// Append `piece` to `out`, or fail with `RangeError: Invalid string length`
    /// past the configured limit. Byte length never undercounts UTF-16 length.
    pub(crate) fn push_str_checked(
        &self,
        out: &mut String,
        piece: &str,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        if out.len().saturating_add(piece.len()) > self.config.max_string_length {
            return Err(RuntimeError::range_error("Invalid string length", location));
        }
        out.push_str(piece);
        Ok(())
    }
}

fn string_concat(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "concat", location)?;
    let mut result = s.to_string();
    for value in args {
        let piece = interp.to_js_string(value, location)?;
        interp.push_str_checked(&mut result, &piece, location)?;
    }
    Ok(Value::from(result))
}

/// Case-insensitive first, then lowercase before uppercase
pub(crate) fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a.to_lowercase().cmp(&b.to_lowercase());
    if folded != Ordering::Equal {
        return folded;
    }
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            return match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            };
        }
    }
    a.len().cmp(&b.len())
}

fn string_locale_compare(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "localeCompare", location)?;
    let other = string_arg(interp, args, 0, location)?;
    let result = match locale_compare(&s, &other) {
        Ordering::Less => -1.0,
        Ordering::Equal => 0.0,
        Ordering::Greater => 1.0,
    };
    Ok(Value::Number(result))
}

/// Without Unicode normalization tables the string is returned as given
fn string_normalize(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = this_string(interp, this, "normalize", location)?;
    let form = match arg(args, 0) {
        Value::Undefined => Rc::from("NFC"),
        other => interp.to_js_string(&other, location)?,
    };
    if !matches!(&*form, "NFC" | "NFD" | "NFKC" | "NFKD") {
        return Err(RuntimeError::range_error(
            "The normalization form should be one of NFC, NFD, NFKC, NFKD.",
            location,
        ));
    }
    Ok(Value::String(s))
}

fn string_to_string(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match this {
        Value::String(_) => Ok(this.clone()),
        _ => Err(RuntimeError::type_error(
            format!(
                "String.prototype.toString requires that 'this' be a String, got {}",
                interp.type_of(this)
            ),
            location,
        )),
    }
}

fn string_is_well_formed(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    // Rust strings cannot hold lone surrogates
    this_string(interp, this, "isWellFormed", location)?;
    Ok(Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_length_counts_surrogate_pairs() {
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("héllo"), 5);
        assert_eq!(utf16_len("😀"), 2);
    }

    #[test]
    fn test_code_unit_string() {
        assert_eq!(code_unit_string("abc", 1).as_deref(), Some("b"));
        assert_eq!(code_unit_string("abc", 3), None);
        assert_eq!(code_unit_string("é!", 1).as_deref(), Some("!"));
    }

    #[test]
    fn test_find_units() {
        let hay = to_units("abcabc");
        assert_eq!(find_units(&hay, &to_units("bc"), 0), Some(1));
        assert_eq!(find_units(&hay, &to_units("bc"), 2), Some(4));
        assert_eq!(find_units(&hay, &to_units(""), 6), Some(6));
        assert_eq!(find_units(&hay, &to_units("x"), 0), None);
        assert_eq!(rfind_units(&hay, &to_units("abc"), 6), Some(3));
    }

    #[test]
    fn test_locale_compare_order() {
        assert_eq!(locale_compare("a", "B"), Ordering::Less);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("b", "a"), Ordering::Greater);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }
}
