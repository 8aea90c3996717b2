use super::classifier::{CandidateShape, OverflowCandidate};
use crate::parser::ast::{AssignOp, Expr, ExprArena, ExprId};

/// Replaces overflow-prone nodes with checked-arithmetic calls.
///
/// The replacement is written into the candidate's own arena slot, so the
/// parent keeps its child id and every operand keeps its identity. Operand
/// subtrees are moved, never copied: the target of a compound assignment ends
/// up referenced twice by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRewriter {
    checked_class: String,
}

impl NodeRewriter {
    /// Creates a rewriter that calls static methods on `checked_class`
    pub fn new(checked_class: impl Into<String>) -> Self {
        NodeRewriter {
            checked_class: checked_class.into(),
        }
    }

    /// Class qualifying the generated calls
    pub fn checked_class(&self) -> &str {
        &self.checked_class
    }

    /// Substitute the checked form for `candidate`
    ///
    /// - `l op r` becomes `Math.xExact(l, r)`
    /// - `e++`, `--e`, `-e` become `e = Math.xExact(e)`
    /// - `t op= v` becomes `t = Math.xExact(t, v)`
    pub fn rewrite(&self, arena: &mut ExprArena, candidate: OverflowCandidate) {
        let method = candidate.op.method_name();

        let replacement = match candidate.shape {
            CandidateShape::Binary { left, right } => {
                self.checked_call(arena, method, vec![left, right])
            }
            CandidateShape::Unary { operand } => {
                let call = self.checked_call(arena, method, vec![operand]);
                Expr::Assign {
                    op: AssignOp::Assign,
                    target: operand,
                    value: arena.alloc(call),
                }
            }
            CandidateShape::CompoundAssign { target, value } => {
                let call = self.checked_call(arena, method, vec![target, value]);
                Expr::Assign {
                    op: AssignOp::Assign,
                    target,
                    value: arena.alloc(call),
                }
            }
        };

        arena.replace(candidate.id, replacement);
    }

    fn checked_call(&self, arena: &mut ExprArena, method: &str, args: Vec<ExprId>) -> Expr {
        let qualifier = arena.alloc(Expr::Name(self.checked_class.clone()));
        Expr::MethodCall {
            target: Some(qualifier),
            name: method.to_string(),
            args,
        }
    }
}

impl Default for NodeRewriter {
    fn default() -> Self {
        Self::new("Math")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overflow::classifier::CheckedOp;
    use crate::parser::ast::{BinaryOp, Literal, UnaryOp};
    use crate::parser::print_expr;

    fn name(arena: &mut ExprArena, n: &str) -> ExprId {
        arena.alloc(Expr::Name(n.to_string()))
    }

    #[test]
    fn test_binary_keeps_slot_and_operands() {
        let mut arena = ExprArena::new();
        let x = name(&mut arena, "x");
        let y = name(&mut arena, "y");
        let sum = arena.alloc(Expr::Binary {
            op: BinaryOp::Add,
            left: x,
            right: y,
        });

        NodeRewriter::default().rewrite(
            &mut arena,
            OverflowCandidate {
                id: sum,
                op: CheckedOp::Add,
                shape: CandidateShape::Binary { left: x, right: y },
            },
        );

        assert_eq!(print_expr(&arena, sum), "Math.addExact(x, y)");
        match &arena[sum] {
            Expr::MethodCall { args, .. } => assert_eq!(args, &vec![x, y]),
            other => panic!("unexpected {:?}", other),
        }
        // Only the qualifier was allocated
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_unary_becomes_assignment() {
        let mut arena = ExprArena::new();
        let a = name(&mut arena, "a");
        let inc = arena.alloc(Expr::Unary {
            op: UnaryOp::PostInc,
            operand: a,
        });

        NodeRewriter::default().rewrite(
            &mut arena,
            OverflowCandidate {
                id: inc,
                op: CheckedOp::Increment,
                shape: CandidateShape::Unary { operand: a },
            },
        );

        assert_eq!(print_expr(&arena, inc), "a = Math.incrementExact(a)");
    }

    #[test]
    fn test_compound_target_is_shared() {
        let mut arena = ExprArena::new();
        let a = name(&mut arena, "a");
        let two = arena.alloc(Expr::Literal(Literal::Int("2".to_string())));
        let assign = arena.alloc(Expr::Assign {
            op: AssignOp::MulAssign,
            target: a,
            value: two,
        });

        NodeRewriter::new("StrictMath").rewrite(
            &mut arena,
            OverflowCandidate {
                id: assign,
                op: CheckedOp::Multiply,
                shape: CandidateShape::CompoundAssign { target: a, value: two },
            },
        );

        assert_eq!(
            print_expr(&arena, assign),
            "a = StrictMath.multiplyExact(a, 2)"
        );
        match arena[assign] {
            Expr::Assign { target, value, .. } => {
                assert_eq!(target, a);
                assert!(matches!(&arena[value], Expr::MethodCall { args, .. } if args[0] == a));
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }
}
