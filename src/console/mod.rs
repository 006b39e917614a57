//! Captured console output
//!
//! [`ConsoleBuffer`] is the run-local sink behind the injected `console`
//! object. Every console call appends exactly one formatted line; nothing is
//! written to the process stdout or stderr.
//!
//! The buffer also owns the small amount of state console methods carry
//! between calls: the `console.group` indentation level and the
//! `console.count` counters.

use crate::interpreter::constants::GROUP_INDENT;
use rustc_hash::FxHashMap;

/// Output buffer for one snippet run
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    lines: Vec<String>,
    group_depth: usize,
    counters: FxHashMap<String, usize>,
    max_lines: usize,
    dropped: usize,
}

impl ConsoleBuffer {
    pub fn new(max_lines: usize) -> Self {
        ConsoleBuffer {
            lines: Vec::new(),
            group_depth: 0,
            counters: FxHashMap::default(),
            max_lines,
            dropped: 0,
        }
    }

    /// Append one console line, indented by the current group depth.
    /// Embedded newlines are indented too so grouped multi-line values line up.
    pub fn push_line(&mut self, text: &str) {
        if self.lines.len() >= self.max_lines {
            self.dropped += 1;
            return;
        }

        if self.group_depth == 0 {
            self.lines.push(text.to_string());
            return;
        }

        let indent = GROUP_INDENT.repeat(self.group_depth);
        let indented = text
            .split('\n')
            .map(|part| format!("{}{}", indent, part))
            .collect::<Vec<_>>()
            .join("\n");
        self.lines.push(indented);
    }

    pub fn group(&mut self) {
        self.group_depth += 1;
    }

    pub fn group_end(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
    }

    /// Increment and return the counter for `label`
    pub fn count(&mut self, label: &str) -> usize {
        let counter = self.counters.entry(label.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn count_reset(&mut self, label: &str) {
        self.counters.insert(label.to_string(), 0);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines discarded because the buffer was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Consume the buffer, appending a truncation notice if lines were dropped
    pub fn into_lines(self) -> Vec<String> {
        let mut lines = self.lines;
        if self.dropped > 0 {
            tracing::warn!(dropped = self.dropped, "console output truncated");
            lines.push(format!("... ({} more lines truncated)", self.dropped));
        }
        lines
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(crate::interpreter::constants::DEFAULT_MAX_OUTPUT_LINES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_in_call_order() {
        let mut console = ConsoleBuffer::new(10);
        console.push_line("1");
        console.push_line("a b");
        assert_eq!(console.into_lines(), vec!["1", "a b"]);
    }

    #[test]
    fn test_group_indentation() {
        let mut console = ConsoleBuffer::new(10);
        console.push_line("Outer");
        console.group();
        console.push_line("inner\nsecond");
        console.group_end();
        console.group_end();
        console.push_line("after");

        assert_eq!(
            console.into_lines(),
            vec!["Outer", "  inner\n  second", "after"]
        );
    }

    #[test]
    fn test_truncation_notice() {
        let mut console = ConsoleBuffer::new(2);
        for i in 0..5 {
            console.push_line(&i.to_string());
        }
        assert_eq!(console.dropped(), 3);
        assert_eq!(
            console.into_lines(),
            vec!["0", "1", "... (3 more lines truncated)"]
        );
    }

    #[test]
    fn test_counters() {
        let mut console = ConsoleBuffer::new(10);
        assert_eq!(console.count("default"), 1);
        assert_eq!(console.count("default"), 2);
        assert_eq!(console.count("other"), 1);
        console.count_reset("default");
        assert_eq!(console.count("default"), 1);
    }
}
