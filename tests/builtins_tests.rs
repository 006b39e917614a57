// Built-in library behavior exercised through whole snippets

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

fn error_of(source: &str) -> String {
    let outcome = evaluate(source, &EngineConfig::default());
    outcome.error_message.unwrap_or_default()
}

#[test]
fn test_array_methods() {
    assert_eq!(
        lines(
            r#"
            const nums = [5, 1, 4, 2, 3];
            console.log(nums.map(n => n * 2).filter(n => n > 4));
            console.log(nums.reduce((sum, n) => sum + n, 0));
            console.log([...nums].sort((a, b) => a - b), nums.includes(4));
            console.log([10, 9, 1].sort());
            console.log([1, [2, [3, [4]]]].flat(Infinity));
            console.log(nums.slice(-2), nums.at(-1), nums.indexOf(4));
            const removed = nums.splice(1, 2, "x");
            console.log(removed, nums);
            console.log(Array.from({ length: 3 }, (_, i) => i * i));
            console.log(Array.from("héllo").length, Array.of(7, 8));
        "#
        ),
        vec![
            "[10, 8, 6]",
            "15",
            "[1, 2, 3, 4, 5] true",
            "[1, 10, 9]",
            "[1, 2, 3, 4]",
            "[2, 3] 3 2",
            r#"[1, 4] [5, "x", 2, 3]"#,
            "[0, 1, 4]",
            "5 [7, 8]",
        ]
    );
}

#[test]
fn test_sort_is_stable() {
    assert_eq!(
        lines(
            r#"
            const people = [
                { name: "a", age: 30 },
                { name: "b", age: 25 },
                { name: "c", age: 30 },
                { name: "d", age: 25 },
            ];
            people.sort((x, y) => x.age - y.age);
            console.log(people.map(p => p.name).join(""));
            console.log([3, undefined, 1].sort());
        "#
        ),
        vec!["bdac", "[1, 3, undefined]"]
    );
}

#[test]
fn test_string_methods() {
    assert_eq!(
        lines(
            r#"
            const s = "  Hello, World  ";
            console.log(s.trim().toUpperCase(), s.trim().length);
            console.log("a-b-c".split("-"), "abc".split(""));
            console.log("5".padStart(3, "0"), "ab".repeat(3));
            console.log("banana".replaceAll("a", "o"), "banana".lastIndexOf("a"));
            console.log("hello".slice(1, -1), "hello".substring(3, 1), "hello".at(-1));
            console.log("😀".length, "abc".charCodeAt(1), String.fromCharCode(72, 105));
        "#
        ),
        vec![
            "HELLO, WORLD 12",
            r#"["a", "b", "c"] ["a", "b", "c"]"#,
            "005 ababab",
            "bonono 5",
            "ell el o",
            "2 98 Hi",
        ]
    );
}

#[test]
fn test_regular_expressions() {
    assert_eq!(
        lines(
            r#"
            const date = /(?<year>\d{4})-(?<month>\d{2})/;
            const m = date.exec("due 2024-03");
            console.log(m[0], m.index, m.groups.year);
            console.log("2024-03".replace(date, "$<month>/$<year>"));
            console.log("a1b22c333".match(/\d+/g));
            console.log("x".match(/y/), /^h/i.test("Hello"));
            console.log("one  two".split(/\s+/), "aaa".replace(/a/g, (c, i) => i));
            const re = /o/g;
            re.test("foo");
            console.log(re.lastIndex);
            console.log("baaac".replace(/a*/g, "-"));
        "#
        ),
        vec![
            "2024-03 4 2024",
            "03/2024",
            r#"["1", "22", "333"]"#,
            "null true",
            r#"["one", "two"] 012"#,
            "2",
            "-b--c-",
        ]
    );
}

#[test]
fn test_unsupported_regex_is_a_syntax_error() {
    let message = error_of(r#"new RegExp("(?<=a)b");"#);
    assert!(
        message.starts_with("SyntaxError: Invalid regular expression"),
        "{}",
        message
    );
}

#[test]
fn test_json_roundtrip() {
    assert_eq!(
        lines(
            r#"
            const data = { name: "Ada", tags: ["x", "y"], skip: undefined, n: 1.5 };
            const text = JSON.stringify(data);
            console.log(text);
            console.log(JSON.parse(text).tags[1]);
            console.log(JSON.stringify([undefined, NaN, () => 1]));
            console.log(JSON.stringify({ a: [1] }, null, 2));
            console.log(JSON.stringify([2 ** 53, 1e20, 1e21, -0, 0.1]));
            console.log(JSON.stringify({ big: 1e20 }, null, 1));
        "#
        ),
        vec![
            r#"{"name":"Ada","tags":["x","y"],"n":1.5}"#,
            "y",
            "[null,null,null]",
            "{\n  \"a\": [\n    1\n  ]\n}",
            "[9007199254740992,100000000000000000000,1e+21,0,0.1]",
            "{\n \"big\": 100000000000000000000\n}",
        ]
    );
}

#[test]
fn test_json_errors() {
    assert!(error_of("JSON.parse('{\"a\":');").starts_with("SyntaxError: Unexpected end of JSON input"));
    assert!(error_of("const o = {}; o.o = o; JSON.stringify(o);")
        .starts_with("TypeError: Converting circular structure to JSON"));
}

#[test]
fn test_map_and_set() {
    assert_eq!(
        lines(
            r#"
            const counts = new Map();
            for (const word of "a b a c a".split(" ")) {
                counts.set(word, (counts.get(word) ?? 0) + 1);
            }
            console.log(counts.size, counts.get("a"), counts.has("z"));
            console.log([...counts.keys()]);
            const unique = new Set([3, 1, 3, NaN, NaN]);
            console.log(unique.size, [...unique]);
            unique.delete(1);
            for (const [k, v] of counts) if (v === 1) console.log(k);
            console.log(unique.has(NaN), Array.from(unique));
        "#
        ),
        vec![
            "3 3 false",
            r#"["a", "b", "c"]"#,
            "3 [3, 1, NaN]",
            "b",
            "c",
            "true [3, NaN]",
        ]
    );
}

#[test]
fn test_object_helpers() {
    assert_eq!(
        lines(
            r#"
            const base = { a: 1, b: 2 };
            console.log(Object.keys(base), Object.entries(base));
            const copy = Object.assign({}, base, { c: 3 });
            console.log(copy, { ...copy, a: 0 });
            const frozen = Object.freeze({ x: 1 });
            frozen.x = 2;
            console.log(frozen.x, Object.isFrozen(frozen));
            console.log(Object.fromEntries([["k", "v"]]), "a" in base);
        "#
        ),
        vec![
            r#"["a", "b"] [["a", 1], ["b", 2]]"#,
            "{a: 1, b: 2, c: 3} {a: 0, b: 2, c: 3}",
            "1 true",
            r#"{k: "v"} true"#,
        ]
    );
}

#[test]
fn test_numbers_and_math() {
    assert_eq!(
        lines(
            r#"
            console.log((3.14159).toFixed(2), (255).toString(16), (0.000123).toPrecision(2));
            console.log(parseInt("42px"), parseFloat("3.5e2"), Number("  "), Number("x"));
            console.log(Math.max(1, 7, 3), Math.min(), Math.round(2.5), Math.round(-2.5));
            console.log(Math.trunc(-4.7), Math.sign(-3), Math.hypot(3, 4), 2 ** 10);
            console.log(Number.isInteger(5.0), Number.isSafeInteger(2 ** 53), 0.1 * 3);
            const r = Math.random();
            console.log(r >= 0 && r < 1);
        "#
        ),
        vec![
            "3.14 ff 0.00012",
            "42 350 0 NaN",
            "7 Infinity 3 -2",
            "-4 -1 5 1024",
            "true false 0.30000000000000004",
            "true",
        ]
    );
}

#[test]
fn test_classes_and_inheritance() {
    assert_eq!(
        lines(
            r#"
            class Animal {
                constructor(name) { this.name = name; }
                speak() { return `${this.name} makes a sound`; }
                static create(name) { return new this(name); }
            }
            class Dog extends Animal {
                speak() { return super.speak() + " (woof)"; }
                get shout() { return this.name.toUpperCase(); }
            }
            const d = Dog.create("Rex");
            console.log(d.speak(), d.shout, d instanceof Animal);

            class ValidationError extends Error {
                constructor(field) {
                    super(`${field} is required`);
                    this.name = "ValidationError";
                }
            }
            try {
                throw new ValidationError("email");
            } catch (e) {
                console.log(e.name, e.message, e instanceof Error);
            }
        "#
        ),
        vec![
            "Rex makes a sound (woof) REX true",
            "ValidationError email is required true",
        ]
    );
}

#[test]
fn test_closures_and_destructuring() {
    assert_eq!(
        lines(
            r#"
            function counter() {
                let count = 0;
                return { inc: () => ++count, get: () => count };
            }
            const c = counter();
            c.inc(); c.inc();
            console.log(c.get());

            const { a, b: { c: deep = 5 } = {}, ...rest } = { a: 1, x: 2, y: 3 };
            const [first, , third = "d", ...tail] = [1, 2, undefined, 4, 5];
            console.log(a, deep, rest, first, third, tail);

            const settings = { theme: null };
            console.log(settings.theme ?? "light", settings.user?.name);
        "#
        ),
        vec!["2", "1 5 {x: 2, y: 3} 1 d [4, 5]", "light undefined"]
    );
}

#[test]
fn test_control_flow() {
    assert_eq!(
        lines(
            r#"
            outer: for (let i = 0; i < 3; i++) {
                for (let j = 0; j < 3; j++) {
                    if (j === 1) continue outer;
                    if (i === 2) break outer;
                    console.log(i, j);
                }
            }
            function grade(score) {
                switch (true) {
                    case score >= 90: return "A";
                    case score >= 80: return "B";
                    default: return "C";
                }
            }
            console.log(grade(95), grade(85), grade(10));
            let n = 0;
            do { n++; } while (n < 5);
            for (const key in { p: 1, q: 2 }) console.log(key);
            console.log(n, typeof n, typeof null, typeof undefined, typeof grade);
        "#
        ),
        vec![
            "0 0",
            "1 0",
            "A B C",
            "p",
            "q",
            "5 number object undefined function",
        ]
    );
}

#[test]
fn test_documented_range_limits() {
    assert!(error_of("const a = []; a[4294967294] = 2;").starts_with("RangeError: Invalid array length"));
    assert!(error_of("const a = []; a.length = 4294967295;").starts_with("RangeError: Invalid array length"));
    assert!(error_of("JSON.parse('1e400');").starts_with("SyntaxError: "));
}
