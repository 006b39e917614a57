// Constants for the snippet interpreter

/// Default limit on nested function calls before `RangeError`
pub const DEFAULT_MAX_CALL_DEPTH: usize = 400;

/// Default limit on nested arrays/objects walked by `join` and `JSON.stringify`
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 1000;

/// Default number of console lines kept per run
pub const DEFAULT_MAX_OUTPUT_LINES: usize = 1000;

/// Default number of `at ...` lines appended to an error message
pub const DEFAULT_STACK_FRAMES: usize = 5;

/// Default nesting depth rendered by console formatting before `[Object]`
pub const DEFAULT_INSPECT_DEPTH: usize = 4;

/// Default stack size of the evaluation thread (64 MiB)
pub const DEFAULT_THREAD_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Largest integer exactly representable as a double (`Number.MAX_SAFE_INTEGER`)
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Maximum array length accepted by `new Array(n)` and `length` writes
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Default limit on the length of any string a run builds (128 MiB)
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1 << 27;

/// Indentation added by `console.group`
pub const GROUP_INDENT: &str = "  ";
