//! Engine configuration
//!
//! [`EngineConfig`] holds the resource limits applied to every evaluation.
//! Defaults can be overridden through `SNIPPET_*` environment variables with
//! [`EngineConfig::from_env`]; environment values take precedence over the
//! built-in defaults, and the CLI applies its own flags on top.

use crate::interpreter::constants::{
    DEFAULT_INSPECT_DEPTH, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_NESTING_DEPTH,
    DEFAULT_MAX_OUTPUT_LINES, DEFAULT_MAX_STRING_LENGTH,
    DEFAULT_STACK_FRAMES, DEFAULT_THREAD_STACK_SIZE,
};
use std::env;
use thiserror::Error;

pub const ENV_MAX_CALL_DEPTH: &str = "SNIPPET_MAX_CALL_DEPTH";
pub const ENV_MAX_NESTING_DEPTH: &str = "SNIPPET_MAX_NESTING_DEPTH";
pub const ENV_MAX_STRING_LENGTH: &str = "SNIPPET_MAX_STRING_LENGTH";
pub const ENV_MAX_OUTPUT_LINES: &str = "SNIPPET_MAX_OUTPUT_LINES";
pub const ENV_STACK_FRAMES: &str = "SNIPPET_STACK_FRAMES";
pub const ENV_INSPECT_DEPTH: &str = "SNIPPET_INSPECT_DEPTH";
pub const ENV_THREAD_STACK_SIZE: &str = "SNIPPET_THREAD_STACK_SIZE";

/// Invalid configuration value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be at least {min}, got {value}")]
    TooSmall {
        key: &'static str,
        value: usize,
        min: usize,
    },
}

/// Limits applied to a single snippet evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Nested calls allowed before `RangeError: Maximum call stack size exceeded`
    pub max_call_depth: usize,
    /// Nested arrays/objects walked by `join` and `JSON.stringify` before the same `RangeError`
    pub max_nesting_depth: usize,
    /// Longest string a run may build, in bytes, before `RangeError: Invalid string length`
    pub max_string_length: usize,
    /// Console lines kept per run; the rest are summarized in one final line
    pub max_output_lines: usize,
    /// `at ...` lines appended to an error message
    pub stack_frames: usize,
    /// Nesting depth rendered by console formatting
    pub inspect_depth: usize,
    /// Stack size of the evaluation thread in bytes
    pub thread_stack_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_output_lines: DEFAULT_MAX_OUTPUT_LINES,
            stack_frames: DEFAULT_STACK_FRAMES,
            inspect_depth: DEFAULT_INSPECT_DEPTH,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `SNIPPET_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values returned by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        let read = |key: &'static str, target: &mut usize| -> Result<(), ConfigError> {
            if let Some(raw) = lookup(key) {
                let trimmed = raw.trim();
                *target = trimmed
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        key,
                        value: raw.clone(),
                    })?;
            }
            Ok(())
        };

        read(ENV_MAX_CALL_DEPTH, &mut config.max_call_depth)?;
        read(ENV_MAX_NESTING_DEPTH, &mut config.max_nesting_depth)?;
        read(ENV_MAX_STRING_LENGTH, &mut config.max_string_length)?;
        read(ENV_MAX_OUTPUT_LINES, &mut config.max_output_lines)?;
        read(ENV_STACK_FRAMES, &mut config.stack_frames)?;
        read(ENV_INSPECT_DEPTH, &mut config.inspect_depth)?;
        read(ENV_THREAD_STACK_SIZE, &mut config.thread_stack_size)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every run fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth < 1 {
            return Err(ConfigError::TooSmall {
                key: ENV_MAX_CALL_DEPTH,
                value: self.max_call_depth,
                min: 1,
            });
        }
        if self.max_nesting_depth < 1 {
            return Err(ConfigError::TooSmall {
                key: ENV_MAX_NESTING_DEPTH,
                value: self.max_nesting_depth,
                min: 1,
            });
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err(ConfigError::TooSmall {
                key: ENV_THREAD_STACK_SIZE,
                value: self.thread_stack_size,
                min: 64 * 1024,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_call_depth, 400);
        assert_eq!(config.max_nesting_depth, 1000);
        assert_eq!(config.max_output_lines, 1000);
        assert_eq!(config.stack_frames, 5);
        assert_eq!(config.inspect_depth, 4);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_MAX_CALL_DEPTH, "50"),
            (ENV_MAX_OUTPUT_LINES, " 10 "),
            (ENV_STACK_FRAMES, "0"),
        ]))
        .unwrap();

        assert_eq!(config.max_call_depth, 50);
        assert_eq!(config.max_output_lines, 10);
        assert_eq!(config.stack_frames, 0);
        assert_eq!(config.inspect_depth, DEFAULT_INSPECT_DEPTH);
    }

    #[test]
    fn test_malformed_value_is_reported() {
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_INSPECT_DEPTH, "deep")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: ENV_INSPECT_DEPTH,
                value: "deep".to_string()
            }
        );
    }

    #[test]
    fn test_zero_call_depth_is_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_MAX_CALL_DEPTH, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooSmall { min: 1, .. }));
    }
}
