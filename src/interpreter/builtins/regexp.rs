//! `RegExp`, backed by the `regex` crate
//!
//! Patterns are translated from JavaScript syntax into `regex` syntax when
//! the object is created. The engine has no backtracking, so lookaround and
//! backreferences are rejected with a `SyntaxError` instead of silently
//! matching something else.
//!
//! # Offsets
//!
//! `regex` reports byte offsets into the UTF-8 haystack. Everything a snippet
//! sees (`index`, `lastIndex`, replacement positions) is converted to UTF-16
//! code units first.

use super::arg;
use super::string::{from_units, to_units, utf16_len};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::heap::{JsObject, ObjectKind, RegExpData};
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::SourceLocation;
use regex::Regex;
use std::rc::Rc;

const VALID_FLAGS: &str = "dgimsuy";

pub(super) fn install(interp: &mut Interpreter) {
    let proto = interp.realm.regexp_prototype;
    interp.define_constructor("RegExp", 2, regexp_constructor, proto);
    interp.define_method(proto, "test", 1, regexp_test);
    interp.define_method(proto, "exec", 1, regexp_exec);
    interp.define_method(proto, "toString", 0, regexp_to_string);
    interp.define_getter(proto, "source", regexp_source);
    interp.define_getter(proto, "flags", regexp_flags);
    interp.define_getter(proto, "global", regexp_global);
    interp.define_getter(proto, "ignoreCase", regexp_ignore_case);
    interp.define_getter(proto, "multiline", regexp_multiline);
    interp.define_getter(proto, "sticky", regexp_sticky);
    interp.define_getter(proto, "unicode", regexp_unicode);
    interp.define_getter(proto, "dotAll", regexp_dot_all);
}

/// One successful match, in byte offsets of the haystack
struct MatchRecord {
    start: usize,
    end: usize,
    captures: Vec<Option<String>>,
    named: Vec<(String, Option<String>)>,
}

impl MatchRecord {
    fn from_captures(regex: &Regex, caps: &regex::Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        let captures = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        let named = regex
            .capture_names()
            .flatten()
            .map(|name| (name.to_string(), caps.name(name).map(|m| m.as_str().to_string())))
            .collect();
        Some(MatchRecord {
            start: whole.start(),
            end: whole.end(),
            captures,
            named,
        })
    }

    fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compile a JavaScript pattern, reporting failures as `SyntaxError`
fn compile(source: &str, flags: &str, location: SourceLocation) -> Result<RegExpData, RuntimeError> {
    let translated = translate_pattern(source, flags).map_err(|reason| {
        RuntimeError::syntax_error(reason, location)
    })?;
    let regex = Regex::new(&translated).map_err(|err| {
        tracing::debug!(pattern = %translated, error = %err, "regex compilation failed");
        RuntimeError::syntax_error(
            format!("Invalid regular expression: /{}/: Invalid pattern", source),
            location,
        )
    })?;
    Ok(RegExpData {
        source: Rc::from(escape_source(source)),
        flags: Rc::from(flags),
        regex: Rc::new(regex),
    })
}

/// Translate JavaScript regular expression syntax into `regex` syntax.
///
/// Returns the reason as an error message when the pattern uses features
/// `regex` cannot express.
pub(crate) fn translate_pattern(source: &str, flags: &str) -> Result<String, String> {
    let mut seen = String::new();
    for flag in flags.chars() {
        if !VALID_FLAGS.contains(flag) || seen.contains(flag) {
            return Err(format!("Invalid regular expression flags '{}'", flags));
        }
        seen.push(flag);
    }
    let unsupported =
        |what: &str| format!("Invalid regular expression: /{}/: {} are not supported", source, what);

    let mut out = String::with_capacity(source.len() + 8);
    let inline: String = flags.chars().filter(|f| "ims".contains(*f)).collect();
    if !inline.is_empty() {
        out.push_str(&format!("(?{})", inline));
    }

    let chars: Vec<char> = source.chars().collect();
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    return Err(format!(
                        "Invalid regular expression: /{}/: \\ at end of pattern",
                        source
                    ));
                };
                i += 1;
                match next {
                    'd' if in_class => out.push_str("0-9"),
                    'd' => out.push_str("[0-9]"),
                    'D' => out.push_str("[^0-9]"),
                    'w' if in_class => out.push_str("A-Za-z0-9_"),
                    'w' => out.push_str("[A-Za-z0-9_]"),
                    'W' => out.push_str("[^A-Za-z0-9_]"),
                    '1'..='9' => return Err(unsupported("backreferences")),
                    'k' if chars.get(i + 1) == Some(&'<') => {
                        return Err(unsupported("backreferences"))
                    }
                    '0' => out.push_str("\\x00"),
                    'c' => match chars.get(i + 1) {
                        Some(letter) if letter.is_ascii_alphabetic() => {
                            out.push_str(&format!("\\x{:02X}", (*letter as u8) % 32));
                            i += 1;
                        }
                        _ => out.push_str("\\\\c"),
                    },
                    's' | 'S' | 'b' | 'B' | 'n' | 'r' | 't' | 'f' | 'v' | 'x' | 'u' | 'p'
                    | 'P' => {
                        out.push('\\');
                        out.push(next);
                    }
                    other => out.push_str(&regex::escape(&other.to_string())),
                }
            }
            '[' if in_class => out.push_str("\\["),
            '[' => {
                match (chars.get(i + 1), chars.get(i + 2)) {
                    (Some('^'), Some(']')) => {
                        out.push_str("[\\s\\S]");
                        i += 3;
                        continue;
                    }
                    (Some(']'), _) => {
                        out.push_str("[^\\s\\S]");
                        i += 2;
                        continue;
                    }
                    _ => {}
                }
                in_class = true;
                out.push('[');
                if chars.get(i + 1) == Some(&'^') {
                    out.push('^');
                    i += 1;
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            '&' | '~' if in_class => {
                out.push('\\');
                out.push(c);
            }
            '(' if !in_class && chars.get(i + 1) == Some(&'?') => {
                let rest: String = chars[i + 2..].iter().take(2).collect();
                if rest.starts_with('=') || rest.starts_with('!') {
                    return Err(unsupported("lookahead assertions"));
                }
                if rest == "<=" || rest == "<!" {
                    return Err(unsupported("lookbehind assertions"));
                }
                if rest.starts_with('<') {
                    out.push_str("(?P<");
                    i += 3;
                    continue;
                }
                out.push('(');
            }
            '{' if !in_class => {
                let quantifier = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == '}')
                    .map(|len| chars[i + 1..i + 1 + len].iter().collect::<String>())
                    .filter(|body| is_quantifier_body(body));
                match quantifier {
                    Some(body) => {
                        out.push('{');
                        out.push_str(&body);
                        out.push('}');
                        i += body.chars().count() + 2;
                        continue;
                    }
                    None => out.push_str("\\{"),
                }
            }
            '}' if !in_class => out.push_str("\\}"),
            _ => out.push(c),
        }
        i += 1;
    }
    Ok(out)
}

/// `n`, `n,` or `n,m`
fn is_quantifier_body(body: &str) -> bool {
    let mut parts = body.splitn(2, ',');
    let min = parts.next().unwrap_or_default();
    let max = parts.next().unwrap_or_default();
    !min.is_empty()
        && min.chars().all(|c| c.is_ascii_digit())
        && max.chars().all(|c| c.is_ascii_digit())
}

/// `source` as it prints between slashes
fn escape_source(source: &str) -> String {
    if source.is_empty() {
        return "(?:)".to_string();
    }
    let mut out = String::with_capacity(source.len());
    let mut escaped = false;
    let mut in_class = false;
    for c in source.chars() {
        match c {
            '/' if !escaped && !in_class => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
        match c {
            '[' if !escaped => in_class = true,
            ']' if !escaped => in_class = false,
            _ => {}
        }
        escaped = c == '\\' && !escaped;
    }
    out
}

/// Byte offset of UTF-16 position `units`, rounded up to a char boundary
fn utf16_to_byte(s: &str, units: usize) -> usize {
    if s.is_ascii() {
        return units.min(s.len());
    }
    let mut count = 0;
    for (byte, c) in s.char_indices() {
        if count >= units {
            return byte;
        }
        count += c.len_utf16();
    }
    s.len()
}

fn byte_to_utf16(s: &str, byte: usize) -> usize {
    utf16_len(&s[..byte])
}

/// The byte offset one character after `pos`
fn next_char(s: &str, pos: usize) -> usize {
    pos + s[pos..].chars().next().map_or(1, char::len_utf8)
}

/// Every match from `start` onwards, stepping over empty matches
fn collect_matches(data: &RegExpData, input: &str, start: usize) -> Vec<MatchRecord> {
    let mut matches = Vec::new();
    let mut pos = start;
    while pos <= input.len() {
        let Some(record) = data
            .regex
            .captures_at(input, pos)
            .and_then(|caps| MatchRecord::from_captures(&data.regex, &caps))
        else {
            break;
        };
        pos = if record.is_empty() {
            next_char(input, record.end)
        } else {
            record.end
        };
        matches.push(record);
    }
    matches
}

impl Interpreter {
    /// Create a regexp object from literal or constructor parts
    pub(crate) fn create_regexp(
        &mut self,
        pattern: &str,
        flags: &str,
        location: SourceLocation,
    ) -> Result<ObjectId, RuntimeError> {
        let data = compile(pattern, flags, location)?;
        let proto = self.realm.regexp_prototype;
        let id = self.heap.alloc(JsObject::new(ObjectKind::RegExp(data), Some(proto)));
        self.define_value(id, "lastIndex", Value::Number(0.0));
        Ok(id)
    }

    pub(crate) fn as_regexp(&self, value: &Value) -> Option<ObjectId> {
        let id = value.as_object()?;
        matches!(self.heap.get(id).kind, ObjectKind::RegExp(_)).then_some(id)
    }

    /// Coerce a `match`/`search` argument into a regexp
    pub(crate) fn regexp_argument(
        &mut self,
        value: &Value,
        default_flags: &str,
        location: SourceLocation,
    ) -> Result<ObjectId, RuntimeError> {
        if let Some(id) = self.as_regexp(value) {
            return Ok(id);
        }
        let pattern = match value {
            Value::Undefined => Rc::from(""),
            other => self.to_js_string(other, location)?,
        };
        self.create_regexp(&pattern, default_flags, location)
    }

    fn regexp_data(&self, id: ObjectId) -> Option<RegExpData> {
        match &self.heap.get(id).kind {
            ObjectKind::RegExp(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn last_index(&mut self, id: ObjectId, location: SourceLocation) -> Result<usize, RuntimeError> {
        let value = self.get_property(&Value::Object(id), "lastIndex", location)?;
        Ok(self.to_integer_value(&value, location)?.max(0.0) as usize)
    }

    fn set_last_index(&mut self, id: ObjectId, units: usize) {
        self.define_value(id, "lastIndex", Value::from(units));
    }

    /// One match honoring `lastIndex` for global and sticky regexps
    fn exec_record(
        &mut self,
        id: ObjectId,
        data: &RegExpData,
        input: &str,
        location: SourceLocation,
    ) -> Result<Option<MatchRecord>, RuntimeError> {
        let tracks_index = data.global() || data.sticky();
        let start_units = if tracks_index {
            self.last_index(id, location)?
        } else {
            0
        };
        if start_units > utf16_len(input) {
            self.set_last_index(id, 0);
            return Ok(None);
        }
        let start = utf16_to_byte(input, start_units);
        let record = data
            .regex
            .captures_at(input, start)
            .and_then(|caps| MatchRecord::from_captures(&data.regex, &caps))
            .filter(|record| !data.sticky() || record.start == start);
        if tracks_index {
            let next = record.as_ref().map_or(0, |r| byte_to_utf16(input, r.end));
            self.set_last_index(id, next);
        }
        Ok(record)
    }

    /// The match array: `[match, ...captures]` plus `index`, `input`, `groups`
    fn match_array(&mut self, record: &MatchRecord, input: &str) -> Value {
        let mut items = vec![Value::from(&input[record.start..record.end])];
        items.extend(
            record
                .captures
                .iter()
                .map(|c| c.as_deref().map_or(Value::Undefined, Value::from)),
        );
        let array = self.new_array(items);
        self.define_own(array, Rc::from("index"), Value::from(byte_to_utf16(input, record.start)));
        self.define_own(array, Rc::from("input"), Value::str(input));
        let groups = self.groups_object(record);
        self.define_own(array, Rc::from("groups"), groups);
        Value::Object(array)
    }

    fn groups_object(&mut self, record: &MatchRecord) -> Value {
        if record.named.is_empty() {
            return Value::Undefined;
        }
        let groups = self.new_object();
        for (name, value) in &record.named {
            let value = value.as_deref().map_or(Value::Undefined, Value::from);
            self.define_own(groups, Rc::from(name.as_str()), value);
        }
        Value::Object(groups)
    }

    pub(crate) fn regexp_exec_value(
        &mut self,
        id: ObjectId,
        input: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let Some(data) = self.regexp_data(id) else {
            return Ok(Value::Null);
        };
        match self.exec_record(id, &data, input, location)? {
            Some(record) => Ok(self.match_array(&record, input)),
            None => Ok(Value::Null),
        }
    }

    /// `String.prototype.match` with a regexp
    pub(crate) fn regexp_match(
        &mut self,
        id: ObjectId,
        input: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let Some(data) = self.regexp_data(id) else {
            return Ok(Value::Null);
        };
        if !data.global() {
            return self.regexp_exec_value(id, input, location);
        }
        let matches = collect_matches(&data, input, 0);
        self.set_last_index(id, 0);
        if matches.is_empty() {
            return Ok(Value::Null);
        }
        let items = matches
            .iter()
            .map(|m| Value::from(&input[m.start..m.end]))
            .collect();
        Ok(Value::Object(self.new_array(items)))
    }

    /// `String.prototype.matchAll`, materialized as an array of match arrays
    pub(crate) fn regexp_match_all(
        &mut self,
        id: ObjectId,
        input: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let Some(data) = self.regexp_data(id) else {
            return Ok(Value::Null);
        };
        if !data.global() {
            return Err(RuntimeError::type_error(
                "String.prototype.matchAll called with a non-global RegExp argument",
                location,
            ));
        }
        let start = utf16_to_byte(input, self.last_index(id, location)?);
        let items = collect_matches(&data, input, start)
            .iter()
            .map(|record| self.match_array(record, input))
            .collect();
        Ok(Value::Object(self.new_array(items)))
    }

    /// `String.prototype.search`: first match index, ignoring `lastIndex`
    pub(crate) fn regexp_search(
        &mut self,
        id: ObjectId,
        input: &str,
        _location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let Some(data) = self.regexp_data(id) else {
            return Ok(Value::Number(-1.0));
        };
        Ok(match data.regex.find(input) {
            Some(m) => Value::from(byte_to_utf16(input, m.start())),
            None => Value::Number(-1.0),
        })
    }

    /// `String.prototype.replace`/`replaceAll` with a regexp pattern
    pub(crate) fn regexp_replace(
        &mut self,
        id: ObjectId,
        input: &str,
        replacement: &Value,
        all: bool,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let Some(data) = self.regexp_data(id) else {
            return Ok(Value::str(input));
        };
        if all && !data.global() {
            return Err(RuntimeError::type_error(
                "replaceAll must be called with a global RegExp",
                location,
            ));
        }
        let matches = if data.global() {
            self.set_last_index(id, 0);
            collect_matches(&data, input, 0)
        } else {
            self.exec_record(id, &data, input, location)?
                .into_iter()
                .collect()
        };
        if matches.is_empty() {
            return Ok(Value::str(input));
        }

        let template = match replacement {
            value if self.is_callable(value) => None,
            other => Some(self.to_js_string(other, location)?),
        };
        let mut result = String::with_capacity(input.len());
        let mut last = 0;
        for record in &matches {
            result.push_str(&input[last..record.start]);
            let matched = &input[record.start..record.end];
            let position = byte_to_utf16(input, record.start);
            let replaced = match &template {
                Some(template) => expand_replacement(
                    template,
                    matched,
                    position,
                    input,
                    &record.captures,
                    &record.named,
                ),
                None => {
                    let mut args = vec![Value::str(matched)];
                    args.extend(
                        record
                            .captures
                            .iter()
                            .map(|c| c.as_deref().map_or(Value::Undefined, Value::from)),
                    );
                    args.push(Value::from(position));
                    args.push(Value::str(input));
                    if !record.named.is_empty() {
                        args.push(self.groups_object(record));
                    }
                    let value = self.call_function(replacement, Value::Undefined, args, location)?;
                    self.to_js_string(&value, location)?.to_string()
                }
            };
            result.push_str(&replaced);
            last = record.end;
        }
        result.push_str(&input[last..]);
        Ok(Value::from(result))
    }

    /// `String.prototype.split` with a regexp separator; captures are spliced in
    pub(crate) fn regexp_split(
        &mut self,
        id: ObjectId,
        input: &str,
        limit: usize,
        _location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let Some(data) = self.regexp_data(id) else {
            return Ok(Value::Object(self.new_array(vec![Value::str(input)])));
        };
        if limit == 0 {
            return Ok(Value::Object(self.new_array(Vec::new())));
        }
        if input.is_empty() {
            let parts = if data.regex.is_match(input) {
                Vec::new()
            } else {
                vec![Value::str(input)]
            };
            return Ok(Value::Object(self.new_array(parts)));
        }

        let mut parts = Vec::new();
        let mut p = 0;
        let mut q = 0;
        while q < input.len() {
            let Some(record) = data
                .regex
                .captures_at(input, q)
                .and_then(|caps| MatchRecord::from_captures(&data.regex, &caps))
            else {
                break;
            };
            if record.start >= input.len() {
                break;
            }
            if record.end == p {
                q = next_char(input, record.start);
                continue;
            }
            parts.push(Value::from(&input[p..record.start]));
            if parts.len() >= limit {
                return Ok(Value::Object(self.new_array(parts)));
            }
            for capture in &record.captures {
                parts.push(capture.as_deref().map_or(Value::Undefined, Value::from));
                if parts.len() >= limit {
                    return Ok(Value::Object(self.new_array(parts)));
                }
            }
            p = record.end;
            q = p;
        }
        parts.push(Value::from(&input[p..]));
        Ok(Value::Object(self.new_array(parts)))
    }
}

/// Expand `$` patterns in a replacement template.
///
/// `position` is the UTF-16 offset of the match in `input`.
pub(crate) fn expand_replacement(
    template: &str,
    matched: &str,
    position: usize,
    input: &str,
    captures: &[Option<String>],
    named: &[(String, Option<String>)],
) -> String {
    if !template.contains('$') {
        return template.to_string();
    }
    let units = to_units(input);
    let tail_start = (position + utf16_len(matched)).min(units.len());

    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '$' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars[i + 1] {
            '$' => {
                out.push('$');
                i += 2;
            }
            '&' => {
                out.push_str(matched);
                i += 2;
            }
            '`' => {
                out.push_str(&from_units(&units[..position.min(units.len())]));
                i += 2;
            }
            '\'' => {
                out.push_str(&from_units(&units[tail_start..]));
                i += 2;
            }
            '<' if !named.is_empty() => {
                let close = chars[i + 2..].iter().position(|&c| c == '>');
                match close {
                    Some(len) => {
                        let name: String = chars[i + 2..i + 2 + len].iter().collect();
                        if let Some((_, Some(value))) = named.iter().find(|(n, _)| *n == name) {
                            out.push_str(value);
                        }
                        i += len + 3;
                    }
                    None => {
                        out.push('$');
                        i += 1;
                    }
                }
            }
            d if d.is_ascii_digit() => {
                let one = d.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .get(i + 2)
                    .and_then(|c| c.to_digit(10))
                    .map(|d2| one * 10 + d2 as usize)
                    .filter(|&n| n >= 1 && n <= captures.len());
                match (two, one) {
                    (Some(n), _) => {
                        out.push_str(captures[n - 1].as_deref().unwrap_or_default());
                        i += 3;
                    }
                    (None, n) if n >= 1 && n <= captures.len() => {
                        out.push_str(captures[n - 1].as_deref().unwrap_or_default());
                        i += 2;
                    }
                    _ => {
                        out.push('$');
                        i += 1;
                    }
                }
            }
            _ => {
                out.push('$');
                i += 1;
            }
        }
    }
    out
}

fn regexp_constructor(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let pattern = arg(args, 0);
    let (source, inherited_flags) = match interp.as_regexp(&pattern).and_then(|id| interp.regexp_data(id)) {
        Some(data) => (unescape_source(&data.source), Some(data.flags.to_string())),
        None => match pattern {
            Value::Undefined => (String::new(), None),
            other => (interp.to_js_string(&other, location)?.to_string(), None),
        },
    };
    let flags = match arg(args, 1) {
        Value::Undefined => inherited_flags.unwrap_or_default(),
        other => interp.to_js_string(&other, location)?.to_string(),
    };
    let data = compile(&source, &flags, location)?;

    let id = match this {
        Value::Object(id) if matches!(interp.heap.get(*id).kind, ObjectKind::Ordinary) => {
            interp.heap.get_mut(*id).kind = ObjectKind::RegExp(data);
            *id
        }
        _ => {
            let proto = interp.realm.regexp_prototype;
            interp
                .heap
                .alloc(JsObject::new(ObjectKind::RegExp(data), Some(proto)))
        }
    };
    interp.define_value(id, "lastIndex", Value::Number(0.0));
    Ok(Value::Object(id))
}

/// Undo [`escape_source`] so a copied pattern compiles to the same thing
fn unescape_source(source: &str) -> String {
    if source == "(?:)" {
        return String::new();
    }
    source.replace("\\/", "/").replace("\\n", "\n")
}

fn this_regexp(
    interp: &Interpreter,
    this: &Value,
    method: &str,
    location: SourceLocation,
) -> Result<ObjectId, RuntimeError> {
    interp.as_regexp(this).ok_or_else(|| {
        RuntimeError::type_error(
            format!("RegExp.prototype.{} called on incompatible receiver", method),
            location,
        )
    })
}

fn regexp_test(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_regexp(interp, this, "test", location)?;
    let input = interp.to_js_string(&arg(args, 0), location)?;
    let Some(data) = interp.regexp_data(id) else {
        return Ok(Value::Bool(false));
    };
    let found = interp.exec_record(id, &data, &input, location)?;
    Ok(Value::Bool(found.is_some()))
}

fn regexp_exec(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_regexp(interp, this, "exec", location)?;
    let input = interp.to_js_string(&arg(args, 0), location)?;
    interp.regexp_exec_value(id, &input, location)
}

fn regexp_to_string(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let id = this_regexp(interp, this, "toString", location)?;
    let text = match interp.regexp_data(id) {
        Some(data) => format!("/{}/{}", data.source, data.flags),
        None => "/(?:)/".to_string(),
    };
    Ok(Value::from(text))
}

/// Getters on `RegExp.prototype` itself answer `undefined`
fn flag_getter(interp: &Interpreter, this: &Value, flag: char) -> Value {
    match interp.as_regexp(this).and_then(|id| interp.regexp_data(id)) {
        Some(data) => Value::Bool(data.flags.contains(flag)),
        None => Value::Undefined,
    }
}

fn regexp_source(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(match interp.as_regexp(this).and_then(|id| interp.regexp_data(id)) {
        Some(data) => Value::String(data.source),
        None => Value::str("(?:)"),
    })
}

/// Flags in canonical order
fn regexp_flags(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let Some(data) = interp.as_regexp(this).and_then(|id| interp.regexp_data(id)) else {
        return Ok(Value::str(""));
    };
    let flags: String = VALID_FLAGS.chars().filter(|f| data.flags.contains(*f)).collect();
    Ok(Value::from(flags))
}

fn regexp_global(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(flag_getter(interp, this, 'g'))
}

fn regexp_ignore_case(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(flag_getter(interp, this, 'i'))
}

fn regexp_multiline(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(flag_getter(interp, this, 'm'))
}

fn regexp_sticky(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(flag_getter(interp, this, 'y'))
}

fn regexp_unicode(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(flag_getter(interp, this, 'u'))
}

fn regexp_dot_all(
    interp: &mut Interpreter,
    this: &Value,
    _args: &[Value],
    _location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Ok(flag_getter(interp, this, 's'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(source: &str) -> String {
        translate_pattern(source, "").unwrap()
    }

    #[test]
    fn test_flags_become_inline_groups() {
        assert_eq!(translate_pattern("a", "gi").unwrap(), "(?i)a");
        assert_eq!(translate_pattern("a", "ms").unwrap(), "(?ms)a");
        assert!(translate_pattern("a", "gg").is_err());
        assert!(translate_pattern("a", "x").is_err());
    }

    #[test]
    fn test_character_classes_are_ascii() {
        assert_eq!(translate(r"\d+"), "[0-9]+");
        assert_eq!(translate(r"[\d.]"), "[0-9.]");
        assert_eq!(translate(r"\w\W"), "[A-Za-z0-9_][^A-Za-z0-9_]");
        assert_eq!(translate("[^]"), r"[\s\S]");
    }

    #[test]
    fn test_named_groups_and_literal_braces() {
        assert_eq!(translate("(?<year>[0-9]{4})"), "(?P<year>[0-9]{4})");
        assert_eq!(translate("a{b}"), r"a\{b\}");
        assert_eq!(translate("x{2,}"), "x{2,}");
        assert_eq!(translate(r"\/"), "/");
    }

    #[test]
    fn test_unsupported_features_are_rejected() {
        let err = translate_pattern("a(?=b)", "").unwrap_err();
        assert_eq!(
            err,
            "Invalid regular expression: /a(?=b)/: lookahead assertions are not supported"
        );
        assert!(translate_pattern("(?<!a)b", "").is_err());
        assert!(translate_pattern(r"(a)\1", "").is_err());
    }

    #[test]
    fn test_translated_patterns_compile() {
        for source in [r"\d{3}-\d{4}", "[a-z&~]+", r"^\s*$", "(?<w>\\w+) (?<n>\\d)"] {
            let translated = translate(source);
            assert!(Regex::new(&translated).is_ok(), "{} -> {}", source, translated);
        }
    }

    #[test]
    fn test_expand_replacement() {
        let captures = vec![Some("John".to_string()), Some("Smith".to_string())];
        assert_eq!(
            expand_replacement("$2, $1", "John Smith", 0, "John Smith", &captures, &[]),
            "Smith, John"
        );
        assert_eq!(expand_replacement("[$&]", "b", 1, "abc", &[], &[]), "[b]");
        assert_eq!(expand_replacement("$`|$'", "b", 1, "abc", &[], &[]), "a|c");
        assert_eq!(expand_replacement("$$ $3", "b", 1, "abc", &[], &[]), "$ $3");

        let named = vec![("n".to_string(), Some("42".to_string()))];
        assert_eq!(expand_replacement("<$<n>>", "42", 0, "42", &[], &named), "<42>");
    }

    #[test]
    fn test_utf16_offsets() {
        let s = "h\u{e9}\u{1F600}x";
        assert_eq!(byte_to_utf16(s, s.len()), 5);
        assert_eq!(utf16_to_byte(s, 2), 3);
        assert_eq!(utf16_to_byte(s, 4), 7);
        assert_eq!(utf16_to_byte(s, 3), 7);
    }

    #[test]
    fn test_empty_matches_step_forward() {
        let data = RegExpData {
            source: Rc::from("a*"),
            flags: Rc::from("g"),
            regex: Rc::new(Regex::new("a*").unwrap()),
        };
        let spans: Vec<(usize, usize)> = collect_matches(&data, "baaac", 0)
            .iter()
            .map(|m| (m.start, m.end))
            .collect();
        assert_eq!(spans, vec![(0, 0), (1, 4), (4, 4), (5, 5)]);
    }

    #[test]
    fn test_source_escaping() {
        assert_eq!(escape_source(""), "(?:)");
        assert_eq!(escape_source("a/b"), r"a\/b");
        assert_eq!(escape_source(r"a\/b"), r"a\/b");
        assert_eq!(escape_source("[/]"), "[/]");
    }
}
