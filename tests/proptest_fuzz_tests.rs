//! Property-based fuzzing tests for the scanner, parser and rewriter
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. The scanner and parser never panic on arbitrary input
//! 2. Every `+`, `-`, `*` over `int` operands is rewritten, and nothing else
//! 3. Rewriting is idempotent: transformed output transforms to itself

use overflow_guard::parser::ast::{ClassDecl, Member};
use overflow_guard::{
    classify, ClassUniverse, CompilationUnit, ExprArena, ExprId, NodeRewriter, Parser, Scanner,
    Stmt, Transformer, Type, TypeResolver,
};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Generate random strings that might break the scanner
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,500}").unwrap()
}

/// Generate Java-looking token soup
fn java_like_string() -> impl Strategy<Value = String> {
    prop::collection::vec(java_token(), 0..60).prop_map(|tokens| tokens.join(" "))
}

fn java_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("class".to_string()),
        Just("Test".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just(";".to_string()),
        Just("int".to_string()),
        Just("long".to_string()),
        Just("void".to_string()),
        Just("return".to_string()),
        Just("for".to_string()),
        Just("if".to_string()),
        Just("new".to_string()),
        Just("=".to_string()),
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("++".to_string()),
        Just("+=".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
        Just(">>".to_string()),
        Just("?".to_string()),
        Just(":".to_string()),
        Just(".".to_string()),
        Just(",".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        (0i64..100_000).prop_map(|n| n.to_string()),
        (0i64..100_000).prop_map(|n| format!("{}L", n)),
        "[a-z][a-z0-9_]{0,8}".prop_map(|s| s),
        r#""[a-zA-Z0-9 ]{0,10}""#.prop_map(|s| s),
    ]
}

/// Generate well-typed `int` expressions over `a`, `b` and small literals
fn int_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("a".to_string()),
        Just("b".to_string()),
        (0i32..1000).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), binary_op(), inner.clone())
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.prop_map(|e| format!("({})", e)),
        ]
    })
}

fn binary_op() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")]
}

/// Mix `int` and `long` operands with negations and increments
fn mixed_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("a".to_string()),
        Just("c".to_string()),
        Just("-a".to_string()),
        Just("c++".to_string()),
        (0i32..1000).prop_map(|n| n.to_string()),
        (0i64..1000).prop_map(|n| format!("{}L", n)),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), binary_op(), inner.clone())
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.prop_map(|e| format!("({})", e)),
        ]
    })
}

/// Rewrite `expr` node by node, checking that each rewritten slot resolves
/// to the same type as the node it replaced
fn check_types_preserved(expr: &str) -> Result<(), TestCaseError> {
    let source = format!(
        "class Test {{ static long f(int a, long c) {{ return {}; }} }}",
        expr
    );
    let tokens = Scanner::new(&source).scan_tokens().unwrap();
    let mut unit = Parser::new(tokens).parse().unwrap();
    let universe = ClassUniverse::java_lang();
    let rewriter = NodeRewriter::default();

    let CompilationUnit {
        types,
        imports,
        arena,
        ..
    } = &mut unit;
    let types: &[ClassDecl] = types;
    let mut resolver = TypeResolver::new(&universe, types, imports);
    resolver.enter_class(&types[0]);
    resolver.push_scope();
    resolver.declare("a", Type::Int);
    resolver.declare("c", Type::Long);

    let root = match &types[0].members[0] {
        Member::Method(method) => match method.body.as_deref() {
            Some([Stmt::Return(Some(id))]) => *id,
            other => panic!("unexpected body {:?}", other),
        },
        other => panic!("unexpected member {:?}", other),
    };

    fn post_order(arena: &ExprArena, id: ExprId, out: &mut Vec<ExprId>) {
        for child in arena.children(id) {
            post_order(arena, child, out);
        }
        out.push(id);
    }
    let mut order = Vec::new();
    post_order(arena, root, &mut order);

    for id in order {
        if let Some(candidate) = classify(arena, id, &resolver).unwrap() {
            let before = resolver.resolve(arena, id).unwrap();
            rewriter.rewrite(arena, candidate);
            let after = resolver.resolve(arena, id).unwrap();
            prop_assert_eq!(before, after);
        }
    }
    Ok(())
}

fn program(expr: &str) -> String {
    format!(
        "class Test {{ static int f(int a, int b) {{ return {}; }} }}",
        expr
    )
}

// =============================================================================
// SCANNER AND PARSER ROBUSTNESS
// =============================================================================

proptest! {
    /// The scanner should never panic on arbitrary input
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let mut scanner = Scanner::new(&source);
        // Should either succeed or return an error, never panic
        let _ = scanner.scan_tokens();
    }

    /// The parser should never panic on Java-like token soup
    #[test]
    fn parser_never_panics(source in java_like_string()) {
        let mut scanner = Scanner::new(&source);
        if let Ok(tokens) = scanner.scan_tokens() {
            let mut parser = Parser::new(tokens);
            let _ = parser.parse();
        }
    }

    /// The whole pipeline returns an error instead of panicking
    #[test]
    fn transform_never_panics(source in java_like_string()) {
        let _ = Transformer::default().transform_source(&format!("class T {{ void m() {{ {} }} }}", source));
    }

    /// Deeply parenthesized operands keep their parentheses
    #[test]
    fn deep_parens(depth in 1usize..60) {
        let expr = format!("{}a + b{}", "(".repeat(depth), ")".repeat(depth));
        let output = Transformer::default().transform_source(&program(&expr)).unwrap();
        let expected = format!(
            "return {}Math.addExact(a, b){};",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        prop_assert!(output.source.contains(&expected));
    }
}

// =============================================================================
// REWRITE PROPERTIES
// =============================================================================

proptest! {
    /// A left-associated sum of n literals nests n - 1 calls in one pass
    #[test]
    fn sum_chain_collapses(values in prop::collection::vec(0i32..1000, 2..20)) {
        let expr = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" + ");
        let output = Transformer::default().transform_source(&program(&expr)).unwrap();

        let mut expected = values[0].to_string();
        for v in &values[1..] {
            expected = format!("Math.addExact({}, {})", expected, v);
        }
        let needle = format!("return {};", expected);
        prop_assert!(output.source.contains(&needle));
        prop_assert_eq!(output.report.rewrites, values.len() - 1);
        prop_assert_eq!(output.report.passes, 2);
    }

    /// Exactly the `+`, `-`, `*` nodes of an all-int expression are rewritten
    #[test]
    fn every_int_arithmetic_node_rewritten(expr in int_expr()) {
        let expected = expr.chars().filter(|c| matches!(c, '+' | '-' | '*')).count();
        let output = Transformer::default().transform_source(&program(&expr)).unwrap();

        prop_assert_eq!(output.report.rewrites, expected);
        prop_assert_eq!(output.source.matches("Exact(").count(), expected);
        prop_assert_eq!(output.source.matches('/').count(), expr.matches('/').count());
        prop_assert_eq!(output.source.matches('%').count(), expr.matches('%').count());
    }

    /// Every rewritten slot keeps the static type of the node it replaced
    #[test]
    fn rewrite_preserves_types(expr in mixed_expr()) {
        check_types_preserved(&expr)?;
    }

    /// Transforming the output again changes nothing
    #[test]
    fn rewrite_is_idempotent(expr in int_expr()) {
        let transformer = Transformer::default();
        let once = transformer.transform_source(&program(&expr)).unwrap();
        let twice = transformer.transform_source(&once.source).unwrap();

        prop_assert_eq!(&twice.source, &once.source);
        prop_assert_eq!(twice.report.rewrites, 0);
        prop_assert_eq!(twice.report.passes, 1);
    }
}

// =============================================================================
// REGRESSION TESTS
// =============================================================================

#[test]
fn regression_empty_input() {
    let output = Transformer::default().transform_source("").unwrap();
    assert_eq!(output.report.rewrites, 0);
}

#[test]
fn regression_only_comments() {
    let output = Transformer::default()
        .transform_source("// nothing\n/* at all */")
        .unwrap();
    assert_eq!(output.report.rewrites, 0);
}

#[test]
fn regression_unterminated_comment() {
    assert!(Transformer::default()
        .transform_source("class T { /* open")
        .is_err());
}

#[test]
fn regression_null_bytes() {
    assert!(Transformer::default().transform_source("class\0T {}").is_err());
}

#[test]
fn regression_shift_then_generic_close() {
    let source = "class T { java.util.List<java.util.List<Integer>> xs; int f(int a) { return a >> 1 >>> 2; } }";
    let output = Transformer::default().transform_source(source).unwrap();
    assert!(output.source.contains("java.util.List<java.util.List<Integer>> xs;"));
    assert!(output.source.contains("return a >> 1 >>> 2;"));
}
