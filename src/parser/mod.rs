//! Java Parser Module
//!
//! Parses a token stream into an arena-backed syntax tree and prints it back.

pub mod ast;
mod java_parser;
mod printer;

pub use ast::{
    AssignOp, BinaryOp, ClassDecl, CompilationUnit, Expr, ExprArena, ExprId, Literal, Member,
    Precedence, Stmt, TypeRef, UnaryOp,
};
pub use java_parser::JavaParser;
pub use printer::{print_expr, print_unit};
