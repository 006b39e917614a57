// Console formatting of values as seen from snippets

use snippet_runner::{evaluate, EngineConfig};

fn lines(source: &str) -> Vec<String> {
    let outcome = evaluate(source, &EngineConfig::default());
    assert!(
        outcome.error_message.is_none(),
        "snippet failed: {:?}",
        outcome.error_message
    );
    outcome.output_lines
}

fn line(source: &str) -> String {
    let mut output = lines(source);
    assert_eq!(output.len(), 1, "expected one line, got {:?}", output);
    output.remove(0)
}

#[test]
fn test_primitives() {
    assert_eq!(
        lines(
            r#"
            console.log(42, -0, 0.1 + 0.2, 1e21, NaN, -Infinity);
            console.log(true, null, undefined);
            console.log("top-level strings are raw", "even here");
        "#
        ),
        vec![
            "42 -0 0.30000000000000004 1e+21 NaN -Infinity",
            "true null undefined",
            "top-level strings are raw even here",
        ]
    );
}

#[test]
fn test_nested_strings_are_quoted() {
    assert_eq!(
        line(r#"console.log(["a", 'b"c'], { s: "x\ny" });"#),
        r#"["a", "b\"c"] {s: "x\ny"}"#
    );
}

#[test]
fn test_objects_keep_insertion_order() {
    assert_eq!(
        line(r#"console.log({ b: 1, a: { c: [true] }, "d-e": null });"#),
        r#"{b: 1, a: {c: [true]}, "d-e": null}"#
    );
    assert_eq!(line("console.log({}, []);"), "{} []");
}

#[test]
fn test_array_holes() {
    assert_eq!(
        line("const a = [1, , , 4]; a.length = 6; console.log(a);"),
        "[1, <2 empty items>, 4, <2 empty items>]"
    );
}

#[test]
fn test_class_instances_and_functions() {
    let output = lines(
        r#"
        class Point {
            constructor(x, y) { this.x = x; this.y = y; }
        }
        class Point3 extends Point {}
        function named() {}
        console.log(new Point(1, 2));
        console.log(Point, Point3);
        console.log(named, () => 1);
    "#,
    );
    assert_eq!(
        output,
        vec![
            "Point {x: 1, y: 2}",
            "[class Point] [class Point3 extends Point]",
            "[Function: named] [Function (anonymous)]",
        ]
    );
}

#[test]
fn test_errors_maps_sets_and_regexps() {
    let output = lines(
        r#"
        console.log(new RangeError("too far"));
        console.log(new Map([["k", 1], [2, { v: true }]]));
        console.log(new Set([1, "two", 1]));
        console.log(/ab+c/gi);
    "#,
    );
    assert_eq!(output[0].lines().next(), Some("RangeError: too far"));
    assert_eq!(output[1], r#"Map(2) {"k" => 1, 2 => {v: true}}"#);
    assert_eq!(output[2], r#"Set(2) {1, "two"}"#);
    assert_eq!(output[3], "/ab+c/gi");
}

#[test]
fn test_nesting_depth_limit() {
    assert_eq!(
        line("console.log({ a: { b: { c: { d: { e: { f: 1 } } } } } });"),
        "{a: {b: {c: {d: {e: [Object]}}}}}"
    );

    let config = EngineConfig {
        inspect_depth: 0,
        ..EngineConfig::default()
    };
    let outcome = evaluate("console.log({ list: [1, 2] });", &config);
    assert_eq!(outcome.output_lines, vec!["{list: [Array]}"]);
}

#[test]
fn test_cycles_through_arrays() {
    assert_eq!(
        line("const a = [1]; a.push(a); console.log(a);"),
        "[1, [Circular]]"
    );
}

#[test]
fn test_format_directives() {
    assert_eq!(
        lines(
            r#"
            console.log("%s scored %d points", "Ada", 12.7);
            console.log("%o and %%", { x: 1 }, "extra");
            console.log("%c styled", "color: red");
        "#
        ),
        vec!["Ada scored 12 points", "{x: 1} and % extra", " styled"]
    );
}

#[test]
fn test_string_conversion_differs_from_console() {
    assert_eq!(
        lines(
            r#"
            console.log(String([1, [2, 3]]), `${{ a: 1 }}`);
            console.log("" + new Error("boom"), String(null));
            console.log([1, null, undefined, 2].join("-"));
        "#
        ),
        vec!["1,2,3 [object Object]", "Error: boom null", "1---2"]
    );
}

#[test]
fn test_console_methods() {
    assert_eq!(
        lines(
            r#"
            console.info("info");
            console.group("Group");
            console.warn("inside");
            console.groupEnd();
            console.assert(1 === 2, "math is broken");
            console.assert(true, "never shown");
            console.count();
            console.count("x");
            console.count();
            console.countReset();
            console.count();
        "#
        ),
        vec![
            "info",
            "Group",
            "  inside",
            "Assertion failed: math is broken",
            "default: 1",
            "x: 1",
            "default: 2",
            "default: 1",
        ]
    );
}
