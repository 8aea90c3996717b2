use super::classifier::{classify, OverflowCandidate};
use super::rewriter::NodeRewriter;
use crate::error::{Error, Result};
use crate::parser::ast::{
    ClassDecl, CompilationUnit, Expr, ExprArena, ExprId, ForInit, Member, Param, Stmt,
    TypeRef, VarDeclarator,
};
use crate::parser::print_expr;
use crate::transformer::UnresolvedPolicy;
use crate::types::{ClassUniverse, Type, TypeResolver};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of a fixed-point run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Whole-unit passes performed, including the final one that changed nothing
    pub passes: usize,
    /// Nodes rewritten over all passes
    pub rewrites: usize,
}

/// Repeats rewrite passes over a unit until one pass changes nothing
pub struct FixedPointDriver<'u> {
    universe: &'u ClassUniverse,
    rewriter: NodeRewriter,
    policy: UnresolvedPolicy,
}

impl<'u> FixedPointDriver<'u> {
    /// Creates a driver over a class universe
    pub fn new(universe: &'u ClassUniverse, rewriter: NodeRewriter, policy: UnresolvedPolicy) -> Self {
        FixedPointDriver {
            universe,
            rewriter,
            policy,
        }
    }

    /// Rewrite `unit` in place until it reaches a fixed point
    pub fn run(&self, unit: &mut CompilationUnit) -> Result<PassReport> {
        let mut report = PassReport::default();
        let mut skipped = HashSet::new();

        loop {
            let rewrites = self.pass(unit, &mut skipped)?;
            report.passes += 1;
            report.rewrites += rewrites;
            tracing::debug!(pass = report.passes, rewrites, "rewrite pass finished");

            if rewrites == 0 {
                break;
            }
        }

        tracing::info!(
            passes = report.passes,
            rewrites = report.rewrites,
            "reached fixed point"
        );
        Ok(report)
    }

    /// One post-order walk over every expression of the unit
    fn pass(&self, unit: &mut CompilationUnit, skipped: &mut HashSet<ExprId>) -> Result<usize> {
        let CompilationUnit {
            types,
            imports,
            arena,
            ..
        } = unit;
        let types: &[ClassDecl] = types;

        let mut walker = PassWalker {
            resolver: TypeResolver::new(self.universe, types, imports),
            arena,
            rewriter: &self.rewriter,
            policy: self.policy,
            skipped,
            rewrites: 0,
        };
        for class in types {
            walker.class(class)?;
        }
        Ok(walker.rewrites)
    }
}

/// State of a single pass
struct PassWalker<'a> {
    resolver: TypeResolver<'a>,
    arena: &'a mut ExprArena,
    rewriter: &'a NodeRewriter,
    policy: UnresolvedPolicy,
    /// Nodes already reported as unresolvable, so each is logged once per run
    skipped: &'a mut HashSet<ExprId>,
    rewrites: usize,
}

impl<'a> PassWalker<'a> {
    fn class(&mut self, class: &'a ClassDecl) -> Result<()> {
        self.resolver.enter_class(class);

        for member in &class.members {
            match member {
                Member::Field(field) => {
                    for declarator in &field.declarators {
                        if let Some(init) = declarator.init {
                            self.expr(init)?;
                        }
                    }
                }
                Member::Method(method) => {
                    if let Some(body) = &method.body {
                        self.callable(&method.params, body)?;
                    }
                }
                Member::Constructor(ctor) => self.callable(&ctor.params, &ctor.body)?,
                Member::Class(nested) => self.class(nested)?,
                Member::Initializer { body, .. } => self.block(body)?,
            }
        }

        self.resolver.exit_class();
        Ok(())
    }

    fn callable(&mut self, params: &'a [Param], body: &'a [Stmt]) -> Result<()> {
        self.resolver.push_scope();
        for param in params {
            if let Some(ty) = Type::from_ref(&param.ty) {
                let ty = if param.varargs { ty.with_dims(1) } else { ty };
                self.resolver.declare(&param.name, ty);
            }
        }
        for stmt in body {
            self.stmt(stmt)?;
        }
        self.resolver.pop_scope();
        Ok(())
    }

    fn block(&mut self, body: &'a [Stmt]) -> Result<()> {
        self.resolver.push_scope();
        for stmt in body {
            self.stmt(stmt)?;
        }
        self.resolver.pop_scope();
        Ok(())
    }

    /// A statement in its own scope (loop bodies, `if` branches)
    fn scoped(&mut self, stmt: &'a Stmt) -> Result<()> {
        self.resolver.push_scope();
        self.stmt(stmt)?;
        self.resolver.pop_scope();
        Ok(())
    }

    fn stmt(&mut self, stmt: &'a Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(body) => self.block(body)?,
            Stmt::LocalVar {
                ty, declarators, ..
            } => self.locals(ty, declarators)?,
            Stmt::Expr(id) | Stmt::Throw(id) | Stmt::Return(Some(id)) => self.expr(*id)?,
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(*condition)?;
                self.scoped(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.scoped(else_branch)?;
                }
            }
            Stmt::While { condition, body } => {
                self.expr(*condition)?;
                self.scoped(body)?;
            }
            Stmt::DoWhile { body, condition } => {
                self.scoped(body)?;
                self.expr(*condition)?;
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                self.resolver.push_scope();
                match init {
                    Some(ForInit::Decl {
                        ty, declarators, ..
                    }) => self.locals(ty, declarators)?,
                    Some(ForInit::Exprs(exprs)) => {
                        for id in exprs {
                            self.expr(*id)?;
                        }
                    }
                    None => {}
                }
                if let Some(condition) = condition {
                    self.expr(*condition)?;
                }
                for id in update {
                    self.expr(*id)?;
                }
                self.scoped(body)?;
                self.resolver.pop_scope();
            }
            Stmt::ForEach {
                ty,
                name,
                iterable,
                body,
                ..
            } => {
                self.expr(*iterable)?;
                self.resolver.push_scope();
                let declared = match Type::from_ref(ty) {
                    Some(ty) => Some(ty),
                    None => self.infer(name, |resolver, arena| {
                        let iterable_ty = resolver.resolve(arena, *iterable)?;
                        iterable_ty.element_type().cloned().ok_or_else(|| {
                            Error::TypeResolution(format!(
                                "cannot infer `var` element type from {}",
                                iterable_ty
                            ))
                        })
                    })?,
                };
                if let Some(declared) = declared {
                    self.resolver.declare(name, declared);
                }
                self.scoped(body)?;
                self.resolver.pop_scope();
            }
            Stmt::Labeled { body, .. } => self.stmt(body)?,
            Stmt::Return(None) | Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty => {}
        }
        Ok(())
    }

    /// Visit initializers and declare each variable after its own initializer
    fn locals(&mut self, ty: &'a TypeRef, declarators: &'a [VarDeclarator]) -> Result<()> {
        let declared = Type::from_ref(ty);

        for declarator in declarators {
            if let Some(init) = declarator.init {
                self.expr(init)?;
            }

            let var_ty = match (&declared, declarator.init) {
                (Some(ty), _) => Some(ty.clone().with_dims(declarator.dims)),
                (None, Some(init)) => self.infer(&declarator.name, |resolver, arena| {
                    resolver.resolve(arena, init)
                })?,
                (None, None) => None,
            };
            if let Some(var_ty) = var_ty {
                self.resolver.declare(&declarator.name, var_ty);
            }
        }
        Ok(())
    }

    /// Type of a `var` variable. An initializer that cannot be resolved
    /// leaves the variable undeclared; only arithmetic that uses it fails.
    fn infer(
        &self,
        name: &str,
        step: impl FnOnce(&TypeResolver<'a>, &ExprArena) -> Result<Type>,
    ) -> Result<Option<Type>> {
        match step(&self.resolver, &*self.arena) {
            Ok(ty) => Ok(Some(ty)),
            Err(err) if err.is_resolution() => {
                tracing::debug!(name, %err, "`var` type left unknown");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Post-order over an explicit work stack: children first, then the node
    fn expr(&mut self, root: ExprId) -> Result<()> {
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if !expanded {
                stack.push((id, true));
                let children = self.arena.children(id);
                stack.extend(children.into_iter().rev().map(|child| (child, false)));
                continue;
            }

            if !matches!(
                self.arena.get(id),
                Expr::Binary { .. } | Expr::Unary { .. } | Expr::Assign { .. }
            ) {
                continue;
            }

            let candidate: Option<OverflowCandidate> =
                self.tolerate(id, |resolver, arena| classify(arena, id, resolver))?.flatten();

            if let Some(candidate) = candidate {
                tracing::trace!(node = %candidate.id, op = %candidate.op, "rewriting");
                self.rewriter.rewrite(self.arena, candidate);
                self.rewrites += 1;
            }
        }
        Ok(())
    }

    /// Run a resolution step under the unresolved-symbol policy.
    ///
    /// Returns `Ok(None)` when the step failed to resolve and the policy says
    /// to skip. Other errors always propagate.
    fn tolerate<T>(
        &mut self,
        node: ExprId,
        step: impl FnOnce(&TypeResolver<'a>, &ExprArena) -> Result<T>,
    ) -> Result<Option<T>> {
        match step(&self.resolver, &*self.arena) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_resolution() => match self.policy {
                UnresolvedPolicy::Fail => Err(err),
                UnresolvedPolicy::Skip => {
                    if self.skipped.insert(node) {
                        tracing::warn!(
                            "Leaving `{}` unchanged: {}",
                            print_expr(self.arena, node),
                            err
                        );
                    }
                    Ok(None)
                }
            },
            Err(err) => Err(err),
        }
    }
}
