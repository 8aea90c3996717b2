//! # Overflow Guard - Checked Arithmetic for Java Sources
//!
//! A source-to-source rewriter that makes silent `int`/`long` overflow in Java
//! programs throw. Every overflow-prone operation is replaced with the
//! matching `Math.*Exact` call:
//!
//! ```text
//! int a = x + y * 2;          int a = Math.addExact(x, Math.multiplyExact(y, 2));
//! a++;                  →     a = Math.incrementExact(a);
//! total -= delta;             total = Math.subtractExact(total, delta);
//! ```
//!
//! ## Features
//!
//! - **Type-aware** - only primitive `int` and `long` operands are rewritten;
//!   `double`, `short`, boxed and `String` arithmetic keeps its shape
//! - **Fixed point** - nested expressions are rewritten inside out until
//!   nothing changes, and the output is stable under re-transformation
//! - **Canonical output** - the rewritten unit is pretty-printed with only the
//!   parentheses it needs
//! - **Configurable** - any class with static `*Exact` methods can stand in for
//!   `Math`, and unresolvable operands can be skipped instead of failing
//!
//! ## Quick Start
//!
//! ```rust
//! use overflow_guard::{Transformer, TransformOptions};
//!
//! # fn main() -> overflow_guard::Result<()> {
//! let source = r#"
//!     class Test {
//!         public static void main(String[] args) {
//!             int a = 1;
//!             a += 2;
//!             System.out.println(a * 3);
//!         }
//!     }
//! "#;
//!
//! let transformer = Transformer::new(TransformOptions::default());
//! let output = transformer.transform_source(source)?;
//!
//! assert!(output.source.contains("a = Math.addExact(a, 2);"));
//! assert!(output.source.contains("System.out.println(Math.multiplyExact(a, 3));"));
//! assert_eq!(output.report.rewrites, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ### Step by Step
//!
//! The pipeline stages are public and can be driven separately:
//!
//! ```rust
//! use overflow_guard::{print_unit, Parser, Scanner, Transformer};
//!
//! # fn main() -> overflow_guard::Result<()> {
//! let code = "class T { long f(long x) { return x * x - 1; } }";
//!
//! let mut scanner = Scanner::new(code);
//! let tokens = scanner.scan_tokens()?;
//! let mut parser = Parser::new(tokens);
//! let mut unit = parser.parse()?;
//!
//! let report = Transformer::default().transform_unit(&mut unit)?;
//! assert_eq!(report.rewrites, 2);
//! assert!(print_unit(&unit).contains("return Math.subtractExact(Math.multiplyExact(x, x), 1);"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source → Scanner → Tokens → Parser → Arena AST → Fixed-point rewrite → Printer → Source
//!                                                        ↑
//!                                          TypeResolver + ClassUniverse
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes Java source
//! - [`Parser`] - Builds a [`CompilationUnit`] whose expressions live in an [`ExprArena`]
//! - [`TypeResolver`] - Computes static types from scopes, unit classes and the [`ClassUniverse`]
//! - [`classify`] / [`NodeRewriter`] - Decide and perform one rewrite
//! - [`FixedPointDriver`] - Repeats post-order passes until nothing changes
//! - [`Transformer`] - Parse, rewrite, print in one call
//!
//! ## Error Handling
//!
//! Every stage returns [`Result`]. Parse errors carry a position, and
//! resolution errors name the symbol that could not be found:
//!
//! ```rust
//! use overflow_guard::{Error, Transformer};
//!
//! let err = Transformer::default()
//!     .transform_source("class T { void m() { int a = missing + 1; } }")
//!     .unwrap_err();
//! assert!(matches!(err, Error::UnresolvedSymbol { ref name } if name == "missing"));
//! ```
//!
//! With [`UnresolvedPolicy::Skip`] such nodes are left unchanged and logged
//! through `tracing` instead.

#![allow(clippy::only_used_in_recursion)] // Resolver helpers thread `self` through recursion

/// Version of the rewriter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod overflow;
pub mod parser;
pub mod transformer;
pub mod types;

// Re-export main types
pub use error::{Error, Result};
pub use lexer::{Token, TokenKind};
pub use overflow::{
    classify, CandidateShape, CheckedOp, FixedPointDriver, NodeRewriter, OverflowCandidate,
    PassReport,
};
pub use parser::{
    print_expr, print_unit, AssignOp, BinaryOp, CompilationUnit, Expr, ExprArena, ExprId, Stmt,
    UnaryOp,
};
pub use transformer::{TransformOptions, TransformOutput, Transformer, UnresolvedPolicy};
pub use types::{ClassInfo, ClassUniverse, ReturnRule, Type, TypeResolver};

/// Type alias for the Java scanner (lexer).
/// Converts raw source text into tokens for the parser.
pub type Scanner = lexer::Scanner;

/// Type alias for the Java parser.
/// Converts tokens into a compilation unit.
pub type Parser = parser::JavaParser;
