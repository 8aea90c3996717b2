// End-to-end tests for the source rewriter
use overflow_guard::{
    ClassUniverse, Error, TransformOptions, Transformer, UnresolvedPolicy,
};

fn template(body: &str) -> String {
    format!(
        "class Test {{\n\n    public static void main(String[] args) {{\n        {}\n    }}\n}}\n",
        body.replace('\n', "\n        ")
    )
}

fn transform(source: &str) -> String {
    Transformer::default()
        .transform_source(source)
        .unwrap_or_else(|e| panic!("transform failed: {}", e))
        .source
}

fn check(input: &str, expected: &str) {
    let transformer = Transformer::default();
    let mut out = Vec::new();
    transformer
        .transform(template(input).as_bytes(), &mut out)
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), template(expected));
}

#[test]
fn test_int_int() {
    check(
        "System.out.println(1 + 2);",
        "System.out.println(Math.addExact(1, 2));",
    );
}

#[test]
fn test_int_long() {
    check(
        "System.out.println(1 + 2L);",
        "System.out.println(Math.addExact(1, 2L));",
    );
}

#[test]
fn test_int_variable() {
    check(
        "int a = 1;\nSystem.out.println(a + 2);",
        "int a = 1;\nSystem.out.println(Math.addExact(a, 2));",
    );
}

#[test]
fn test_declared_type_wins_over_initializer() {
    check(
        "int a = 1L;\nSystem.out.println(a + 2);",
        "int a = 1L;\nSystem.out.println(Math.addExact(a, 2));",
    );
}

#[test]
fn test_nested() {
    check(
        "System.out.println(1 + 2 + 3 + 4);",
        "System.out.println(Math.addExact(Math.addExact(Math.addExact(1, 2), 3), 4));",
    );
}

#[test]
fn test_increment() {
    check("int a = 1;\na++;", "int a = 1;\na = Math.incrementExact(a);");
}

#[test]
fn test_add_assign() {
    check("int a = 1;\na += 2;", "int a = 1;\na = Math.addExact(a, 2);");
}

#[test]
fn test_assign_binary() {
    check("int a;\na = 1 + 2;", "int a;\na = Math.addExact(1, 2);");
}

#[test]
fn test_int_variables() {
    check(
        "int x = 1, y = 2;\nx + y;",
        "int x = 1, y = 2;\nMath.addExact(x, y);",
    );
}

#[test]
fn test_decrement_and_negate() {
    check(
        "long a = 5;\n--a;\nint b = -a;",
        "long a = 5;\na = Math.decrementExact(a);\nint b = a = Math.negateExact(a);",
    );
}

#[test]
fn test_subtract_and_multiply_assign() {
    check(
        "long total = 10;\ntotal -= 3;\ntotal *= total;",
        "long total = 10;\ntotal = Math.subtractExact(total, 3);\ntotal = Math.multiplyExact(total, total);",
    );
}

#[test]
fn test_untouched_operators() {
    let body = "int x = 7, y = 2;\nint q = x / y;\nint r = x % y;\nint s = x << y;\nboolean b = x < y && y > 0;\nx /= 2;";
    check(body, body);
}

#[test]
fn test_non_integral_operands_untouched() {
    let body = "double d = 1.5;\nd = d + 1;\nshort s = 1;\nInteger boxed = 3;\nString t = \"n=\" + s;\nfloat f = 2f * 3;";
    check(body, body);
}

#[test]
fn test_narrow_operand_untouched() {
    let body = "byte b = 1;\nlong c = b + 2L;\nchar ch = 'x';\nint code = ch * 2;";
    check(body, body);
}

#[test]
fn test_cast_to_long_qualifies() {
    check(
        "byte b = 1;\nlong c = (long) b + 2L;",
        "byte b = 1;\nlong c = Math.addExact((long) b, 2L);",
    );
}

#[test]
fn test_source_parens_are_kept() {
    check(
        "int a = 1, b = 2;\nint c = (a + b) * 3;",
        "int a = 1, b = 2;\nint c = Math.multiplyExact((Math.addExact(a, b)), 3);",
    );
}

#[test]
fn test_unary_rewrite_inside_expression_is_parenthesized() {
    check(
        "int a = 1;\nint b = a++ / 2;",
        "int a = 1;\nint b = (a = Math.incrementExact(a)) / 2;",
    );
}

#[test]
fn test_loops_and_fields() {
    let source = "class Counter {\n\n    private long total;\n\n    void add(int[] values) {\n        for (int i = 0; i < values.length; i++) {\n            total += values[i] * 2;\n        }\n        for (int v : values) {\n            total = total - v;\n        }\n    }\n}\n";
    let expected = "class Counter {\n\n    private long total;\n\n    void add(int[] values) {\n        for (int i = 0; i < values.length; i = Math.incrementExact(i)) {\n            total = Math.addExact(total, Math.multiplyExact(values[i], 2));\n        }\n        for (int v : values) {\n            total = Math.subtractExact(total, v);\n        }\n    }\n}\n";
    assert_eq!(transform(source), expected);
}

#[test]
fn test_method_return_types() {
    let source = "class T {\n\n    static int twice(int x) {\n        return x * 2;\n    }\n\n    long f() {\n        return twice(3) + Math.max(1L, 2) - \"abc\".length();\n    }\n}\n";
    let output = transform(source);
    assert!(output.contains("return Math.multiplyExact(x, 2);"));
    assert!(output.contains(
        "return Math.subtractExact(Math.addExact(twice(3), Math.max(1L, 2)), \"abc\".length());"
    ));
}

#[test]
fn test_min_value_literal_is_not_negated() {
    check(
        "int m = -2147483648;\nlong n = -9223372036854775808L;",
        "int m = -2147483648;\nlong n = -9223372036854775808L;",
    );
}

#[test]
fn test_idempotent() {
    let once = transform(&template(
        "int a = 1;\na++;\na += a * 3 - 1;\nSystem.out.println(1 + 2 + a);",
    ));
    let transformer = Transformer::default();
    let again = transformer.transform_source(&once).unwrap();
    assert_eq!(again.source, once);
    assert_eq!(again.report.rewrites, 0);
    assert_eq!(again.report.passes, 1);
}

#[test]
fn test_report_counts() {
    let output = Transformer::default()
        .transform_source(&template("int a = 1;\na = a + 1 + 2;\na++;"))
        .unwrap();
    assert_eq!(output.report.rewrites, 3);
    assert!(output.report.passes >= 2);
}

#[test]
fn test_unresolved_symbol_fails() {
    let mut out = Vec::new();
    let err = Transformer::default()
        .transform(template("int b = missing + 1;").as_bytes(), &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvedSymbol { ref name } if name == "missing"));
    assert!(out.is_empty());
}

#[test]
fn test_unresolved_operand_fails_for_any_operator() {
    for body in [
        "int q = missing / 2;",
        "missing = 2;",
        "boolean z = missing == null;",
        "int k = 0;\nk = unknownCall();",
    ] {
        let err = Transformer::default()
            .transform_source(&template(body))
            .unwrap_err();
        assert!(err.is_resolution(), "`{}` gave {}", body, err);
    }
}

#[test]
fn test_negated_literals_are_rewritten() {
    check(
        "int x = -1;\nlong y = -5L;",
        "int x = 1 = Math.negateExact(1);\nlong y = 5L = Math.negateExact(5L);",
    );
}

#[test]
fn test_negated_expression_output_does_not_reparse() {
    let output = transform(&template("int a = 1, b = 2;\nint c = -(a + b);"));
    assert!(output.contains(
        "int c = (Math.addExact(a, b)) = Math.negateExact((Math.addExact(a, b)));"
    ));
    let err = Transformer::default().transform_source(&output).unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn test_unresolved_member_fails() {
    let err = Transformer::default()
        .transform_source(&template("int b = Math.nope(1) + 1;"))
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvedMember { .. }));
}

#[test]
fn test_skip_policy_leaves_node() {
    let transformer = Transformer::new(TransformOptions {
        unresolved: UnresolvedPolicy::Skip,
        ..TransformOptions::default()
    });
    let output = transformer
        .transform_source(&template("int a = 1;\nint b = missing + 1;\nint c = a + 1;"))
        .unwrap();
    assert!(output.source.contains("int b = missing + 1;"));
    assert!(output.source.contains("int c = Math.addExact(a, 1);"));
    assert_eq!(output.report.rewrites, 1);
}

#[test]
fn test_syntax_error() {
    let err = Transformer::default()
        .transform_source(&template("int a = ;"))
        .unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn test_custom_checked_class() {
    let transformer = Transformer::new(TransformOptions {
        checked_class: "StrictMath".to_string(),
        ..TransformOptions::default()
    });
    let output = transformer
        .transform_source(&template("int a = 1;\na *= 2 + a;"))
        .unwrap();
    assert!(output
        .source
        .contains("a = StrictMath.multiplyExact(a, StrictMath.addExact(2, a));"));
}

#[test]
fn test_universe_from_json() {
    let json = r#"{ "classes": [
        { "name": "Clock", "methods": [{ "name": "ticks", "arity": 0, "returns": { "fixed": "long" }, "static": true }] }
    ] }"#;
    let mut universe = ClassUniverse::java_lang();
    universe.merge(ClassUniverse::from_json(json).unwrap());

    let transformer = Transformer::with_universe(universe, TransformOptions::default());
    let output = transformer
        .transform_source(&template("long t = Clock.ticks() * 1000;"))
        .unwrap();
    assert!(output
        .source
        .contains("long t = Math.multiplyExact(Clock.ticks(), 1000);"));

    // Without the declaration the same source cannot be resolved
    assert!(Transformer::default()
        .transform_source(&template("long t = Clock.ticks() * 1000;"))
        .is_err());
}
