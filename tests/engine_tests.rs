// Integration tests for the snippet engine and its result table

use snippet_runner::{evaluate, EngineConfig, ExecutionStatus, SnippetEngine};

fn run(source: &str) -> (Vec<String>, Option<String>) {
    let outcome = evaluate(source, &EngineConfig::default());
    (outcome.output_lines, outcome.error_message)
}

fn lines(source: &str) -> Vec<String> {
    let (output, error) = run(source);
    assert!(error.is_none(), "snippet failed: {:?}", error);
    output
}

#[test]
fn test_array_snippet() {
    let mut engine = SnippetEngine::default();
    let result = engine.execute("arrays", "const arr=[1,2,3]; console.log(arr);");
    assert_eq!(result.status, ExecutionStatus::Succeeded);
    assert_eq!(result.output_lines, vec!["[1, 2, 3]"]);
    assert!(result.error_message.is_none());
}

#[test]
fn test_multiple_log_calls() {
    assert_eq!(
        lines(r#"console.log(1); console.log("a","b");"#),
        vec!["1", "a b"]
    );
}

#[test]
fn test_reference_error_fails_without_output() {
    let mut engine = SnippetEngine::default();
    let result = engine.execute("broken", "undefinedVar.prop;");
    assert_eq!(result.status, ExecutionStatus::Failed);
    assert!(result.output_lines.is_empty());
    let message = result.error_message.as_deref().unwrap_or_default();
    assert!(
        message.starts_with("ReferenceError: undefinedVar is not defined"),
        "{}",
        message
    );
}

#[test]
fn test_partial_output_is_kept() {
    let (output, error) = run(
        r#"
        console.log("before");
        null.length;
        console.log("after");
    "#,
    );
    assert_eq!(output, vec!["before"]);
    let message = error.unwrap_or_default();
    assert!(message.starts_with("TypeError: Cannot read properties of null"), "{}", message);
}

#[test]
fn test_circular_object_succeeds() {
    let output = lines(
        r#"
        const node = { name: "root" };
        node.self = node;
        console.log(node);
    "#,
    );
    assert_eq!(output, vec![r#"{name: "root", self: [Circular]}"#]);
}

#[test]
fn test_distinct_ids_keep_their_own_output() {
    let mut engine = SnippetEngine::default();
    engine.execute("first", r#"console.log("one");"#);
    engine.execute("second", r#"console.log("two"); console.log("three");"#);

    assert_eq!(engine.results().len(), 2);
    assert_eq!(engine.result("first").unwrap().output_lines, vec!["one"]);
    assert_eq!(
        engine.result("second").unwrap().output_lines,
        vec!["two", "three"]
    );
}

#[test]
fn test_rerun_replaces_previous_result() {
    let mut engine = SnippetEngine::default();
    engine.execute("demo", "console.log(1);");
    engine.execute("demo", "throw new Error('nope');");

    assert_eq!(engine.results().len(), 1);
    let result = engine.result("demo").unwrap();
    assert_eq!(result.status, ExecutionStatus::Failed);
    assert!(result.output_lines.is_empty());
    assert!(result
        .error_message
        .as_deref()
        .unwrap_or_default()
        .starts_with("Error: nope"));
}

#[test]
fn test_rerun_is_idempotent() {
    let source = r#"
        let total = 0;
        for (let i = 1; i <= 4; i++) total += i * i;
        console.log("total:", total);
    "#;
    let mut engine = SnippetEngine::default();
    let first = engine.execute("squares", source).clone();
    let second = engine.execute("squares", source).clone();
    assert_eq!(first.status, second.status);
    assert_eq!(first.output_lines, second.output_lines);
    assert_eq!(second.output_lines, vec!["total: 30"]);
}

#[test]
fn test_globals_do_not_leak_between_runs() {
    let mut engine = SnippetEngine::default();
    engine.execute("a", "var shared = 42; leaked = true;");
    let result = engine.execute("b", "console.log(typeof shared, typeof leaked);");
    assert_eq!(result.output_lines, vec!["undefined undefined"]);

    let result = engine.execute("c", "Array.prototype.extra = 1; console.log([].extra);");
    assert_eq!(result.output_lines, vec!["1"]);
    let result = engine.execute("d", "console.log([].extra);");
    assert_eq!(result.output_lines, vec!["undefined"]);
}

#[test]
fn test_syntax_error_reports_position() {
    let (output, error) = run("console.log('hi');\nlet x = ;");
    assert!(output.is_empty());
    let message = error.unwrap_or_default();
    assert!(message.starts_with("SyntaxError: "), "{}", message);
    assert!(message.contains("line 2"), "{}", message);
}

#[test]
fn test_thrown_primitive_is_uncaught() {
    let (_, error) = run(r#"throw "plain string";"#);
    let message = error.unwrap_or_default();
    assert_eq!(message.lines().next(), Some(r#"Uncaught "plain string""#));

    let (_, error) = run("throw { code: 7 };");
    let message = error.unwrap_or_default();
    assert_eq!(message.lines().next(), Some("Uncaught {code: 7}"));
}

#[test]
fn test_runaway_recursion_is_a_range_error() {
    let (output, error) = run(
        r#"
        console.log("start");
        function down(n) { return down(n + 1); }
        down(0);
    "#,
    );
    assert_eq!(output, vec!["start"]);
    assert!(error
        .unwrap_or_default()
        .starts_with("RangeError: Maximum call stack size exceeded"));
}

#[test]
fn test_deeply_nested_arrays_are_range_errors() {
    let (output, error) = run(
        r#"
        let a = [];
        for (let i = 0; i < 200000; i++) a = [a];
        try { JSON.stringify(a); } catch (e) { console.log(e.name, e.message); }
        try { String(a); } catch (e) { console.log(e.name, e.message); }
        const cyclic = [1];
        cyclic.push(cyclic);
        try { cyclic.flat(Infinity); } catch (e) { console.log(e.name); }
        console.log(String([[1, [2]], 3]), JSON.stringify([[[]]]));
    "#,
    );
    assert_eq!(error, None);
    assert_eq!(
        output,
        vec![
            "RangeError Maximum call stack size exceeded",
            "RangeError Maximum call stack size exceeded",
            "RangeError",
            "1,2,3 [[[]]]",
        ]
    );
}

#[test]
fn test_deeply_nested_source_is_a_syntax_error() {
    let source = format!("const a = {}1{};", "[".repeat(100_000), "]".repeat(100_000));
    let (output, error) = run(&source);
    assert!(output.is_empty());
    let message = error.unwrap_or_default();
    assert!(
        message.starts_with("SyntaxError: Maximum nesting depth exceeded"),
        "{}",
        message
    );

    let source = format!("let x = {}1;", "-".repeat(50_000));
    let message = run(&source).1.unwrap_or_default();
    assert!(message.starts_with("SyntaxError: "), "{}", message);

    assert_eq!(lines("console.log([[[[[[1]]]]]].flat(Infinity));"), vec!["[1]"]);
}

#[test]
fn test_string_growth_is_bounded() {
    let config = EngineConfig {
        max_string_length: 1000,
        ..EngineConfig::default()
    };
    let outcome = evaluate(
        r#"
        let s = "x";
        try {
            for (let i = 0; i < 40; i++) s += s;
        } catch (e) {
            console.log(e.name, e.message, s.length);
        }
        try { `${s}${s}`; } catch (e) { console.log("template", e.message); }
        try { [s, s].join(""); } catch (e) { console.log("join", e.message); }
        try { s.repeat(2); } catch (e) { console.log("repeat", e.name); }
    "#,
        &config,
    );
    assert_eq!(outcome.error_message, None);
    assert_eq!(
        outcome.output_lines,
        vec![
            "RangeError Invalid string length 512",
            "template Invalid string length",
            "join Invalid string length",
            "repeat RangeError",
        ]
    );

    let outcome = evaluate("let s = 'x'; while (true) s += s;", &config);
    assert!(outcome
        .error_message
        .unwrap_or_default()
        .starts_with("RangeError: Invalid string length"));
}

#[test]
fn test_caught_errors_do_not_fail_the_run() {
    let output = lines(
        r#"
        try {
            missing();
        } catch (err) {
            console.log(err.name, "-", err.message);
        } finally {
            console.log("cleanup");
        }
    "#,
    );
    assert_eq!(output, vec!["ReferenceError - missing is not defined", "cleanup"]);
}

#[test]
fn test_error_message_carries_stack_frames() {
    let (_, error) = run(
        r#"
        function inner() { throw new TypeError("bad input"); }
        function outer() { inner(); }
        outer();
    "#,
    );
    let message = error.unwrap_or_default();
    let mut message_lines = message.lines();
    assert_eq!(message_lines.next(), Some("TypeError: bad input"));
    assert!(message_lines.next().unwrap_or_default().contains("at inner"));

    let config = EngineConfig {
        stack_frames: 0,
        ..EngineConfig::default()
    };
    let outcome = evaluate("function f() { throw new Error('x'); } f();", &config);
    assert_eq!(outcome.error_message.as_deref(), Some("Error: x"));
}

#[test]
fn test_output_truncation() {
    let config = EngineConfig {
        max_output_lines: 3,
        ..EngineConfig::default()
    };
    let outcome = evaluate("for (let i = 0; i < 10; i++) console.log(i);", &config);
    assert_eq!(
        outcome.output_lines,
        vec!["0", "1", "2", "... (7 more lines truncated)"]
    );
    assert!(outcome.error_message.is_none());
}

#[test]
fn test_timers_never_fire() {
    let output = lines(
        r#"
        const id = setTimeout(() => console.log("later"), 0);
        console.log("now", typeof id);
        clearTimeout(id);
    "#,
    );
    assert_eq!(output, vec!["now number"]);

    let (_, error) = run("setTimeout('not a function', 10);");
    assert!(error.unwrap_or_default().starts_with("TypeError: "));
}

#[test]
fn test_result_table_serializes_to_json() {
    let mut engine = SnippetEngine::default();
    engine.execute("hello", "console.log('hi');");
    let json: serde_json::Value = serde_json::to_value(engine.results()).unwrap();
    let entry = &json["hello"];
    assert_eq!(entry["status"], "succeeded");
    assert_eq!(entry["output_lines"][0], "hi");
    assert!(entry["error_message"].is_null());
}

#[test]
fn test_config_rejects_malformed_environment() {
    let config = EngineConfig::from_lookup(|key| match key {
        "SNIPPET_MAX_CALL_DEPTH" => Some("12".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.max_call_depth, 12);

    let err = EngineConfig::from_lookup(|key| match key {
        "SNIPPET_INSPECT_DEPTH" => Some("deep".to_string()),
        _ => None,
    });
    assert!(err.is_err());
}
