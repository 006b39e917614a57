//! Snippet execution engine
//!
//! [`SnippetEngine`] is the public entry point: it evaluates a snippet in a
//! fresh realm and publishes the result under the snippet's id in its
//! [`ExecutionTable`]. [`evaluate`] performs one evaluation without a table.
//!
//! # Isolation
//!
//! Every evaluation builds a new [`Interpreter`], so globals, prototypes and
//! console state never carry over between runs. The interpreter runs on a
//! scoped worker thread with a dedicated stack, and a panic inside it is
//! reported as an `InternalError` result instead of unwinding into the caller.

use crate::config::EngineConfig;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::Parser;
use crate::table::{ExecutionOutcome, ExecutionResult, ExecutionTable};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;

const EVAL_THREAD_NAME: &str = "snippet-eval";

static QUIET_PANICS: Once = Once::new();

/// Runs snippets and keeps the latest result for each snippet id
#[derive(Debug, Default)]
pub struct SnippetEngine {
    config: EngineConfig,
    table: ExecutionTable,
}

impl SnippetEngine {
    pub fn new(config: EngineConfig) -> Self {
        SnippetEngine {
            config,
            table: ExecutionTable::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `source` and publish its result under `snippet_id`.
    ///
    /// The entry is `running` only while this call is in progress; the
    /// returned result is always `succeeded` or `failed`.
    pub fn execute(&mut self, snippet_id: &str, source: &str) -> &ExecutionResult {
        self.table.begin(snippet_id);
        tracing::debug!(snippet_id, bytes = source.len(), "run started");

        let outcome = evaluate(source, &self.config);
        tracing::debug!(
            snippet_id,
            status = %outcome.status(),
            lines = outcome.output_lines.len(),
            "run finished"
        );
        self.table.finish(snippet_id, outcome)
    }

    /// Every result recorded so far
    pub fn results(&self) -> &ExecutionTable {
        &self.table
    }

    pub fn result(&self, snippet_id: &str) -> Option<&ExecutionResult> {
        self.table.get(snippet_id)
    }

    /// Forget all results
    pub fn clear(&mut self) {
        self.table.clear();
    }
}

/// Evaluate one snippet in a fresh realm.
///
/// Never panics: syntax errors, uncaught exceptions and interpreter faults
/// all come back as an outcome with `error_message` set.
pub fn evaluate(source: &str, config: &EngineConfig) -> ExecutionOutcome {
    install_quiet_panic_hook();
    let joined = thread::scope(|scope| {
        thread::Builder::new()
            .name(EVAL_THREAD_NAME.to_string())
            .stack_size(config.thread_stack_size)
            .spawn_scoped(scope, || run_guarded(source, config))
            .map(|handle| handle.join())
    });
    match joined {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(payload)) => internal_error(payload.as_ref()),
        Err(err) => {
            tracing::warn!(error = %err, "could not spawn evaluation thread, running inline");
            run_guarded(source, config)
        }
    }
}

/// Panics on evaluation threads are reported through the run's result, so
/// keep the default hook from also printing them to the host's stderr.
fn install_quiet_panic_hook() {
    QUIET_PANICS.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if thread::current().name() == Some(EVAL_THREAD_NAME) {
                tracing::debug!(location = ?info.location(), "evaluation thread panicked");
                return;
            }
            previous(info);
        }));
    });
}

fn run_guarded(source: &str, config: &EngineConfig) -> ExecutionOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| run(source, config))) {
        Ok(outcome) => outcome,
        Err(payload) => internal_error(payload.as_ref()),
    }
}

fn run(source: &str, config: &EngineConfig) -> ExecutionOutcome {
    let program = match Parser::new(source).and_then(|mut parser| parser.parse_program()) {
        Ok(program) => program,
        Err(err) => {
            return ExecutionOutcome {
                output_lines: Vec::new(),
                error_message: Some(format!("SyntaxError: {}", err)),
            }
        }
    };

    let mut interpreter = Interpreter::new(config.clone());
    let result = panic::catch_unwind(AssertUnwindSafe(|| interpreter.run(&program)));
    conclude(interpreter, result)
}

/// Build the outcome of a finished run, keeping console output printed
/// before an exception or an interpreter panic
fn conclude(
    interpreter: Interpreter,
    result: thread::Result<Result<(), RuntimeError>>,
) -> ExecutionOutcome {
    let error_message = match result {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(interpreter.describe_error(&err)),
        Err(payload) => internal_error(payload.as_ref()).error_message,
    };
    ExecutionOutcome {
        output_lines: interpreter.into_output(),
        error_message,
    }
}

fn internal_error(payload: &(dyn Any + Send)) -> ExecutionOutcome {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "interpreter panicked".to_string());
    tracing::warn!(%message, "interpreter panic caught");
    ExecutionOutcome {
        output_lines: Vec::new(),
        error_message: Some(format!("InternalError: {}", message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ExecutionStatus;

    #[test]
    fn test_execute_publishes_result() {
        let mut engine = SnippetEngine::default();
        let result = engine.execute("intro", "console.log(1 + 1);");
        assert_eq!(result.status, ExecutionStatus::Succeeded);
        assert_eq!(result.output_lines, vec!["2"]);
        assert!(result.started_at.is_some() && result.finished_at.is_some());
        assert_eq!(engine.results().len(), 1);
    }

    #[test]
    fn test_syntax_error_fails_the_run() {
        let outcome = evaluate("let = ;", &EngineConfig::default());
        let message = outcome.error_message.unwrap();
        assert!(message.starts_with("SyntaxError: "), "{}", message);
        assert!(outcome.output_lines.is_empty());
    }

    #[test]
    fn test_panic_payload_is_reported() {
        let outcome = internal_error(&"boom");
        assert_eq!(outcome.error_message.as_deref(), Some("InternalError: boom"));
        let outcome = internal_error(&String::from("bad state"));
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("InternalError: bad state")
        );
    }

    #[test]
    fn test_panic_keeps_earlier_output() {
        let program = Parser::new("console.log('before'); console.log([1]);")
            .and_then(|mut parser| parser.parse_program())
            .unwrap();
        let mut interpreter = Interpreter::new(EngineConfig::default());
        interpreter.run(&program).unwrap();

        let payload: Box<dyn Any + Send> = Box::new("heap corrupted");
        let outcome = conclude(interpreter, Err(payload));
        assert_eq!(outcome.output_lines, vec!["before", "[1]"]);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("InternalError: heap corrupted")
        );
    }

    #[test]
    fn test_clear_empties_the_table() {
        let mut engine = SnippetEngine::default();
        engine.execute("a", "1");
        engine.execute("b", "2");
        engine.clear();
        assert!(engine.results().is_empty());
        assert!(engine.result("a").is_none());
    }
}
