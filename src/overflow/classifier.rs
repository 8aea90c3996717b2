use crate::error::Result;
use crate::parser::ast::{AssignOp, BinaryOp, Expr, ExprArena, ExprId, UnaryOp};
use crate::types::TypeResolver;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checked-arithmetic primitive a node is rewritten to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckedOp {
    /// `addExact`
    Add,
    /// `subtractExact`
    Subtract,
    /// `multiplyExact`
    Multiply,
    /// `incrementExact`
    Increment,
    /// `decrementExact`
    Decrement,
    /// `negateExact`
    Negate,
}

impl CheckedOp {
    /// Name of the static method on the checked-arithmetic class
    pub fn method_name(self) -> &'static str {
        match self {
            CheckedOp::Add => "addExact",
            CheckedOp::Subtract => "subtractExact",
            CheckedOp::Multiply => "multiplyExact",
            CheckedOp::Increment => "incrementExact",
            CheckedOp::Decrement => "decrementExact",
            CheckedOp::Negate => "negateExact",
        }
    }

    /// All primitives, in declaration order
    pub fn all() -> [CheckedOp; 6] {
        [
            CheckedOp::Add,
            CheckedOp::Subtract,
            CheckedOp::Multiply,
            CheckedOp::Increment,
            CheckedOp::Decrement,
            CheckedOp::Negate,
        ]
    }

    /// `+`, `-`, `*`
    pub fn from_binary(op: BinaryOp) -> Option<CheckedOp> {
        match op {
            BinaryOp::Add => Some(CheckedOp::Add),
            BinaryOp::Sub => Some(CheckedOp::Subtract),
            BinaryOp::Mul => Some(CheckedOp::Multiply),
            _ => None,
        }
    }

    /// `++`, `--` (either position) and unary `-`
    pub fn from_unary(op: UnaryOp) -> Option<CheckedOp> {
        match op {
            UnaryOp::PreInc | UnaryOp::PostInc => Some(CheckedOp::Increment),
            UnaryOp::PreDec | UnaryOp::PostDec => Some(CheckedOp::Decrement),
            UnaryOp::Neg => Some(CheckedOp::Negate),
            UnaryOp::Plus | UnaryOp::Not | UnaryOp::BitNot => None,
        }
    }

    /// `+=`, `-=`, `*=`
    pub fn from_compound(op: AssignOp) -> Option<CheckedOp> {
        match op {
            AssignOp::AddAssign => Some(CheckedOp::Add),
            AssignOp::SubAssign => Some(CheckedOp::Subtract),
            AssignOp::MulAssign => Some(CheckedOp::Multiply),
            _ => None,
        }
    }
}

impl fmt::Display for CheckedOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Operand ids of a node that will be rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateShape {
    /// `left op right`
    Binary {
        /// Left operand
        left: ExprId,
        /// Right operand
        right: ExprId,
    },
    /// `++e`, `e++`, `--e`, `e--`, `-e`
    Unary {
        /// Operand (and assignment target after rewriting)
        operand: ExprId,
    },
    /// `target op= value`
    CompoundAssign {
        /// Assigned location
        target: ExprId,
        /// Right-hand side
        value: ExprId,
    },
}

/// A node proven overflow-prone, with everything needed to rewrite it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowCandidate {
    /// Node to replace
    pub id: ExprId,
    /// Checked primitive to call
    pub op: CheckedOp,
    /// Operands of the node
    pub shape: CandidateShape,
}

/// Decide whether the node behind `id` is overflow-prone.
///
/// Binary and assignment nodes resolve their left (target) operand, then
/// their right (value) operand, and only then look at the operator: they
/// qualify when both operands are primitive `int` or `long` and the operator
/// is `+`, `-`, `*` or its compound form. The right operand is not resolved
/// when the left one already fails, so a resolution error surfaces for any
/// operator. Unary `++`/`--`/`-` qualify regardless of operand type.
pub fn classify(
    arena: &ExprArena,
    id: ExprId,
    resolver: &TypeResolver<'_>,
) -> Result<Option<OverflowCandidate>> {
    let candidate = match *arena.get(id) {
        Expr::Binary { op, left, right } => {
            if !both_overflow_relevant(arena, left, right, resolver)? {
                return Ok(None);
            }
            let Some(op) = CheckedOp::from_binary(op) else {
                return Ok(None);
            };
            OverflowCandidate {
                id,
                op,
                shape: CandidateShape::Binary { left, right },
            }
        }
        Expr::Unary { op, operand } => {
            let Some(op) = CheckedOp::from_unary(op) else {
                return Ok(None);
            };
            OverflowCandidate {
                id,
                op,
                shape: CandidateShape::Unary { operand },
            }
        }
        Expr::Assign { op, target, value } => {
            if !both_overflow_relevant(arena, target, value, resolver)? {
                return Ok(None);
            }
            let Some(op) = CheckedOp::from_compound(op) else {
                return Ok(None);
            };
            OverflowCandidate {
                id,
                op,
                shape: CandidateShape::CompoundAssign { target, value },
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(candidate))
}

fn both_overflow_relevant(
    arena: &ExprArena,
    left: ExprId,
    right: ExprId,
    resolver: &TypeResolver<'_>,
) -> Result<bool> {
    Ok(resolver.resolve(arena, left)?.is_overflow_relevant()
        && resolver.resolve(arena, right)?.is_overflow_relevant())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lexer::Scanner;
    use crate::parser::ast::{CompilationUnit, Member, Stmt};
    use crate::parser::JavaParser;
    use crate::types::{ClassUniverse, Type};

    fn unit_for(body: &str) -> CompilationUnit {
        let source = format!("class T {{ void m() {{ {} }} }}", body);
        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        JavaParser::new(tokens).parse().unwrap()
    }

    fn classify_stmt(
        body: &str,
        locals: &[(&str, Type)],
        index: usize,
    ) -> Result<Option<OverflowCandidate>> {
        let unit = unit_for(body);
        let universe = ClassUniverse::java_lang();
        let mut resolver = TypeResolver::new(&universe, &unit.types, &unit.imports);
        resolver.enter_class(&unit.types[0]);
        for (name, ty) in locals {
            resolver.declare(name, ty.clone());
        }
        let stmts = match &unit.types[0].members[0] {
            Member::Method(m) => m.body.clone().unwrap(),
            other => panic!("unexpected {:?}", other),
        };
        match &stmts[index] {
            Stmt::Expr(id) => classify(&unit.arena, *id, &resolver),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_operator_mapping() {
        assert_eq!(CheckedOp::from_binary(BinaryOp::Sub), Some(CheckedOp::Subtract));
        assert_eq!(CheckedOp::from_binary(BinaryOp::Div), None);
        assert_eq!(CheckedOp::from_binary(BinaryOp::Shl), None);
        assert_eq!(CheckedOp::from_unary(UnaryOp::PostDec), Some(CheckedOp::Decrement));
        assert_eq!(CheckedOp::from_unary(UnaryOp::BitNot), None);
        assert_eq!(CheckedOp::from_compound(AssignOp::MulAssign), Some(CheckedOp::Multiply));
        assert_eq!(CheckedOp::from_compound(AssignOp::Assign), None);
        assert_eq!(CheckedOp::Negate.to_string(), "negateExact");
    }

    #[test]
    fn test_int_and_long_binary() {
        let locals = [("x", Type::Int), ("y", Type::Long)];
        let candidate = classify_stmt("x * y;", &locals, 0).unwrap().unwrap();
        assert_eq!(candidate.op, CheckedOp::Multiply);
        assert!(matches!(candidate.shape, CandidateShape::Binary { .. }));
    }

    #[test]
    fn test_other_types_are_left_alone() {
        let locals = [
            ("d", Type::Double),
            ("s", Type::Short),
            ("boxed", Type::class("Integer")),
            ("x", Type::Int),
        ];
        assert_eq!(classify_stmt("x + d;", &locals, 0).unwrap(), None);
        assert_eq!(classify_stmt("s + s;", &locals, 0).unwrap(), None);
        assert_eq!(classify_stmt("boxed + x;", &locals, 0).unwrap(), None);
        assert_eq!(classify_stmt("\"a\" + x;", &locals, 0).unwrap(), None);
    }

    #[test]
    fn test_operands_resolved_for_every_operator() {
        for body in ["missing / 2;", "missing << 2;", "missing %= 2;", "missing = 2;", "missing == null;"] {
            let err = classify_stmt(body, &[], 0).unwrap_err();
            assert!(matches!(err, Error::UnresolvedSymbol { ref name } if name == "missing"));
        }

        let locals = [("k", Type::Int)];
        assert!(classify_stmt("k = missing;", &locals, 0).is_err());
        assert_eq!(classify_stmt("k / 2;", &locals, 0).unwrap(), None);
        assert_eq!(classify_stmt("k = 2;", &locals, 0).unwrap(), None);
    }

    #[test]
    fn test_unary_without_type_check() {
        let candidate = classify_stmt("undeclared++;", &[], 0).unwrap().unwrap();
        assert_eq!(candidate.op, CheckedOp::Increment);
        let locals = [("d", Type::Double)];
        let candidate = classify_stmt("--d;", &locals, 0).unwrap().unwrap();
        assert_eq!(candidate.op, CheckedOp::Decrement);
        assert_eq!(classify_stmt("+d;", &locals, 0).unwrap(), None);
    }

    #[test]
    fn test_compound_assignment() {
        let locals = [("a", Type::Int)];
        let candidate = classify_stmt("a -= 3;", &locals, 0).unwrap().unwrap();
        assert_eq!(candidate.op, CheckedOp::Subtract);
        assert!(matches!(
            candidate.shape,
            CandidateShape::CompoundAssign { .. }
        ));
    }

    #[test]
    fn test_unresolved_operand_is_an_error() {
        let err = classify_stmt("missing + 1;", &[], 0).unwrap_err();
        assert!(matches!(err, Error::UnresolvedSymbol { .. }));
    }

    #[test]
    fn test_right_operand_skipped_when_left_disqualifies() {
        let locals = [("d", Type::Double)];
        assert_eq!(classify_stmt("d + missing;", &locals, 0).unwrap(), None);
    }
}
