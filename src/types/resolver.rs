//! Static type resolution for expressions.
//!
//! The resolver answers one question: what is the static type of the
//! expression behind an [`ExprId`]? It only computes what the answer needs.
//! Comparison and logical operators are `boolean` without looking at their
//! operands, and method arguments are resolved only when the result type
//! depends on them.
//!
//! Names are looked up in this order: locals (innermost scope first), fields of
//! the enclosing classes (innermost class first, then superclasses), statically
//! imported fields. A name that is none of these, but appears left of a `.`,
//! is tried as a class name and then as a package prefix.

use super::universe::{ClassUniverse, MethodInfo, ReturnRule};
use super::Type;
use crate::error::{Error, Result};
use crate::parser::ast::{
    BinaryOp, ClassDecl, Expr, ExprArena, ExprId, Import, Literal, Member, MethodDecl,
    Modifier, UnaryOp,
};
use std::collections::HashMap;

/// Superclass chains longer than this are treated as cyclic
const MAX_INHERITANCE_DEPTH: usize = 32;

/// What the left-hand side of a `.` denotes
#[derive(Debug, Clone, PartialEq)]
enum Target {
    Value(Type),
    Class(String),
    Package(String),
}

/// A method found for a call site
enum MethodSource<'u> {
    Declared(&'u MethodDecl),
    Known(&'u MethodInfo),
}

/// Resolves expression types inside one compilation unit
pub struct TypeResolver<'u> {
    universe: &'u ClassUniverse,
    /// Classes declared in the unit, by simple name and by `Outer.Inner` path
    unit_classes: HashMap<String, &'u ClassDecl>,
    static_imports: Vec<&'u Import>,
    /// Local variable scopes, innermost last
    scopes: Vec<HashMap<String, Type>>,
    /// Enclosing classes, innermost last
    class_stack: Vec<&'u ClassDecl>,
}

impl<'u> TypeResolver<'u> {
    /// Creates a resolver for the classes and imports of one unit
    pub fn new(universe: &'u ClassUniverse, types: &'u [ClassDecl], imports: &'u [Import]) -> Self {
        let mut unit_classes = HashMap::new();
        index_classes(types, None, &mut unit_classes);

        TypeResolver {
            universe,
            unit_classes,
            static_imports: imports.iter().filter(|i| i.is_static).collect(),
            scopes: Vec::new(),
            class_stack: Vec::new(),
        }
    }

    /// Open a new local scope
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Close the innermost local scope
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare a local in the innermost scope
    pub fn declare(&mut self, name: &str, ty: Type) {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    /// Enter a class body
    pub fn enter_class(&mut self, class: &'u ClassDecl) {
        self.class_stack.push(class);
    }

    /// Leave the innermost class body
    pub fn exit_class(&mut self) {
        self.class_stack.pop();
    }

    /// Local scope depth (for tests and diagnostics)
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Resolve the static type of `id`
    pub fn resolve(&self, arena: &ExprArena, id: ExprId) -> Result<Type> {
        match arena.get(id) {
            Expr::Literal(literal) => Ok(literal_type(literal)),
            Expr::Name(name) => self.resolve_name(name),
            Expr::This => self
                .class_stack
                .last()
                .map(|class| Type::Class(class.name.clone()))
                .ok_or_else(|| Error::TypeResolution("`this` outside a class".to_string())),
            Expr::FieldAccess { .. } => match self.resolve_target(arena, id)? {
                Target::Value(ty) => Ok(ty),
                Target::Class(name) => Err(Error::TypeResolution(format!(
                    "class {} used as a value",
                    name
                ))),
                Target::Package(name) => Err(Error::UnresolvedSymbol { name }),
            },
            Expr::MethodCall { target, name, args } => {
                self.resolve_call(arena, *target, name, args)
            }
            Expr::Binary { op, left, right } => self.resolve_binary(arena, *op, *left, *right),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => Ok(Type::Boolean),
                UnaryOp::PreInc | UnaryOp::PostInc | UnaryOp::PreDec | UnaryOp::PostDec => {
                    self.resolve(arena, *operand)
                }
                UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => {
                    let ty = self.resolve(arena, *operand)?;
                    ty.unary_promotion().ok_or_else(|| {
                        Error::TypeResolution(format!("bad operand type {} for `{}`", ty, op))
                    })
                }
            },
            Expr::Assign { target, .. } => self.resolve(arena, *target),
            Expr::Conditional {
                then_expr,
                else_expr,
                ..
            } => {
                let then_ty = self.resolve(arena, *then_expr)?;
                let else_ty = self.resolve(arena, *else_expr)?;
                Ok(conditional_type(then_ty, else_ty))
            }
            Expr::Cast { ty, .. } => Type::from_ref(ty)
                .ok_or_else(|| Error::TypeResolution("cast to `var`".to_string())),
            Expr::Paren(inner) => self.resolve(arena, *inner),
            Expr::ArrayAccess { array, .. } => {
                let ty = self.resolve(arena, *array)?;
                ty.element_type().cloned().ok_or_else(|| {
                    Error::TypeResolution(format!("array required, but {} found", ty))
                })
            }
            Expr::NewObject { class, .. } => Type::from_ref(class)
                .ok_or_else(|| Error::TypeResolution("`new var`".to_string())),
            Expr::NewArray {
                element,
                dims,
                extra_dims,
                ..
            } => Type::from_ref(element)
                .map(|ty| ty.with_dims(dims.len() + extra_dims))
                .ok_or_else(|| Error::TypeResolution("`new var[]`".to_string())),
            Expr::ArrayInit(_) => Err(Error::TypeResolution(
                "array initializer outside a declaration".to_string(),
            )),
        }
    }

    fn resolve_name(&self, name: &str) -> Result<Type> {
        self.lookup_value(name).ok_or_else(|| Error::UnresolvedSymbol {
            name: name.to_string(),
        })
    }

    /// Locals, then fields of enclosing classes, then static imports
    fn lookup_value(&self, name: &str) -> Option<Type> {
        if let Some(ty) = self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            return Some(ty.clone());
        }

        for class in self.class_stack.iter().rev() {
            if let Some(ty) = self.class_field(&class.name, name, 0) {
                return Some(ty);
            }
        }

        self.static_import_owners(name).into_iter().find_map(|owner| {
            self.universe
                .lookup_field(owner, name)
                .filter(|field| field.is_static)
                .map(|field| field.ty.clone())
        })
    }

    /// Classes a statically imported `member` may come from
    fn static_import_owners<'a>(&'a self, member: &str) -> Vec<&'a str> {
        self.static_imports
            .iter()
            .filter_map(|import| {
                if import.wildcard {
                    Some(import.path.as_str())
                } else {
                    let (owner, name) = import.path.rsplit_once('.')?;
                    (name == member).then_some(owner)
                }
            })
            .collect()
    }

    fn is_class(&self, name: &str) -> bool {
        self.unit_classes.contains_key(name) || self.universe.contains(name)
    }

    fn resolve_target(&self, arena: &ExprArena, id: ExprId) -> Result<Target> {
        match arena.get(id) {
            Expr::Name(name) => {
                if let Some(ty) = self.lookup_value(name) {
                    Ok(Target::Value(ty))
                } else if self.is_class(name) {
                    Ok(Target::Class(name.clone()))
                } else {
                    Ok(Target::Package(name.clone()))
                }
            }
            Expr::FieldAccess { target, field } => {
                let owner = self.resolve_target(arena, *target)?;
                self.access_field(owner, field)
            }
            _ => Ok(Target::Value(self.resolve(arena, id)?)),
        }
    }

    fn access_field(&self, owner: Target, field: &str) -> Result<Target> {
        match owner {
            Target::Package(prefix) => {
                let qualified = format!("{}.{}", prefix, field);
                if self.is_class(&qualified) {
                    Ok(Target::Class(qualified))
                } else {
                    Ok(Target::Package(qualified))
                }
            }
            Target::Class(class) => {
                if let Some(ty) = self.static_field(&class, field) {
                    return Ok(Target::Value(ty));
                }
                let nested = format!("{}.{}", class, field);
                if self.unit_classes.contains_key(&nested) {
                    return Ok(Target::Class(nested));
                }
                Err(Error::UnresolvedMember {
                    owner: class,
                    member: field.to_string(),
                })
            }
            Target::Value(Type::Array(_)) if field == "length" => Ok(Target::Value(Type::Int)),
            Target::Value(Type::Class(class)) => self
                .class_field(&class, field, 0)
                .map(Target::Value)
                .ok_or(Error::UnresolvedMember {
                    owner: class,
                    member: field.to_string(),
                }),
            Target::Value(other) => Err(Error::UnresolvedMember {
                owner: other.to_string(),
                member: field.to_string(),
            }),
        }
    }

    fn static_field(&self, class: &str, field: &str) -> Option<Type> {
        if let Some(decl) = self.unit_classes.get(class) {
            return self.declared_field(decl, field, true);
        }
        self.universe
            .lookup_field(class, field)
            .filter(|f| f.is_static)
            .map(|f| f.ty.clone())
    }

    /// Field of a unit class (with inherited ones) or of a universe class
    fn class_field(&self, class: &str, field: &str, depth: usize) -> Option<Type> {
        if depth > MAX_INHERITANCE_DEPTH {
            return None;
        }
        let Some(decl) = self.unit_classes.get(class) else {
            return self.universe.lookup_field(class, field).map(|f| f.ty.clone());
        };

        if let Some(ty) = self.declared_field(decl, field, false) {
            return Some(ty);
        }
        let parent = decl.extends.as_ref().and_then(Type::from_ref)?;
        match parent {
            Type::Class(parent) => self.class_field(&parent, field, depth + 1),
            _ => None,
        }
    }

    fn declared_field(&self, decl: &ClassDecl, field: &str, static_only: bool) -> Option<Type> {
        decl.members.iter().find_map(|member| match member {
            Member::Field(f) if !static_only || f.modifiers.contains(&Modifier::Static) => f
                .declarators
                .iter()
                .find(|d| d.name == field)
                .and_then(|d| Type::from_ref(&f.ty).map(|ty| ty.with_dims(d.dims))),
            _ => None,
        })
    }

    fn resolve_call(
        &self,
        arena: &ExprArena,
        target: Option<ExprId>,
        name: &str,
        args: &[ExprId],
    ) -> Result<Type> {
        let Some(target) = target else {
            for class in self.class_stack.iter().rev() {
                if let Some(method) = self.find_method(&class.name, name, args.len(), 0) {
                    return self.method_result(arena, method, args);
                }
            }
            for owner in self.static_import_owners(name) {
                if let Some(method) = self.universe.lookup_method(owner, name, args.len()) {
                    return self.method_result(arena, MethodSource::Known(method), args);
                }
            }
            return Err(Error::UnresolvedMember {
                owner: self
                    .class_stack
                    .last()
                    .map_or_else(|| "<unit>".to_string(), |c| c.name.clone()),
                member: name.to_string(),
            });
        };

        let owner = match self.resolve_target(arena, target)? {
            Target::Value(Type::Array(element)) => {
                if name == "clone" && args.is_empty() {
                    return Ok(Type::Array(element));
                }
                "Object".to_string()
            }
            Target::Value(Type::Class(class)) | Target::Class(class) => class,
            Target::Value(other) => {
                return Err(Error::TypeResolution(format!(
                    "cannot invoke {}() on primitive type {}",
                    name, other
                )))
            }
            Target::Package(package) => return Err(Error::UnresolvedSymbol { name: package }),
        };

        match self.find_method(&owner, name, args.len(), 0) {
            Some(method) => self.method_result(arena, method, args),
            None => Err(Error::UnresolvedMember {
                owner,
                member: name.to_string(),
            }),
        }
    }

    fn find_method(
        &self,
        class: &str,
        name: &str,
        argc: usize,
        depth: usize,
    ) -> Option<MethodSource<'u>> {
        if depth > MAX_INHERITANCE_DEPTH {
            return None;
        }
        let Some(decl) = self.unit_classes.get(class).copied() else {
            return self
                .universe
                .lookup_method(class, name, argc)
                .map(MethodSource::Known);
        };

        let declared = decl.members.iter().find_map(|member| match member {
            Member::Method(m) if m.name == name && accepts(m, argc) => Some(m),
            _ => None,
        });
        if let Some(method) = declared {
            return Some(MethodSource::Declared(method));
        }

        match decl.extends.as_ref().and_then(Type::from_ref) {
            Some(Type::Class(parent)) => self.find_method(&parent, name, argc, depth + 1),
            _ => self
                .universe
                .lookup_method("Object", name, argc)
                .map(MethodSource::Known),
        }
    }

    fn method_result(
        &self,
        arena: &ExprArena,
        method: MethodSource<'_>,
        args: &[ExprId],
    ) -> Result<Type> {
        let info = match method {
            MethodSource::Declared(decl) => {
                return Type::from_ref(&decl.return_type).ok_or_else(|| {
                    Error::TypeResolution(format!("method {} has no return type", decl.name))
                })
            }
            MethodSource::Known(info) => info,
        };

        match &info.returns {
            ReturnRule::Fixed(ty) => Ok(ty.clone()),
            ReturnRule::FirstArg => match args.first() {
                Some(first) => self.resolve(arena, *first),
                None => Err(Error::TypeResolution(format!(
                    "{}() needs an argument to determine its type",
                    info.name
                ))),
            },
            ReturnRule::Promoted => {
                let mut promoted: Option<Type> = None;
                for arg in args {
                    let ty = self.resolve(arena, *arg)?;
                    let next = match &promoted {
                        None => ty.unary_promotion(),
                        Some(acc) => Type::binary_promotion(acc, &ty),
                    };
                    promoted = Some(next.ok_or_else(|| {
                        Error::TypeResolution(format!(
                            "bad argument type {} for {}()",
                            ty, info.name
                        ))
                    })?);
                }
                promoted.ok_or_else(|| {
                    Error::TypeResolution(format!("{}() called without arguments", info.name))
                })
            }
        }
    }

    fn resolve_binary(
        &self,
        arena: &ExprArena,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<Type> {
        match op {
            BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => return Ok(Type::Boolean),
            _ => {}
        }

        let left_ty = self.resolve(arena, left)?;
        let bad_operands = |right_ty: &Type| {
            Error::TypeResolution(format!(
                "bad operand types for `{}`: {} and {}",
                op, left_ty, right_ty
            ))
        };

        match op {
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                left_ty.unary_promotion().ok_or_else(|| {
                    Error::TypeResolution(format!("bad operand type {} for `{}`", left_ty, op))
                })
            }
            BinaryOp::Add => {
                let right_ty = self.resolve(arena, right)?;
                if left_ty.is_string() || right_ty.is_string() {
                    return Ok(Type::class("String"));
                }
                Type::binary_promotion(&left_ty, &right_ty).ok_or_else(|| bad_operands(&right_ty))
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                let right_ty = self.resolve(arena, right)?;
                if left_ty.unboxed() == Type::Boolean && right_ty.unboxed() == Type::Boolean {
                    return Ok(Type::Boolean);
                }
                Type::binary_promotion(&left_ty, &right_ty).ok_or_else(|| bad_operands(&right_ty))
            }
            _ => {
                let right_ty = self.resolve(arena, right)?;
                Type::binary_promotion(&left_ty, &right_ty).ok_or_else(|| bad_operands(&right_ty))
            }
        }
    }
}

fn index_classes<'u>(
    classes: &'u [ClassDecl],
    outer: Option<&str>,
    index: &mut HashMap<String, &'u ClassDecl>,
) {
    for class in classes {
        let path = match outer {
            Some(outer) => format!("{}.{}", outer, class.name),
            None => class.name.clone(),
        };
        index.entry(class.name.clone()).or_insert(class);
        index.insert(path.clone(), class);

        for member in &class.members {
            if let Member::Class(inner) = member {
                index_classes(std::slice::from_ref(inner), Some(&path), index);
            }
        }
    }
}

fn accepts(method: &MethodDecl, argc: usize) -> bool {
    match method.params.last() {
        Some(last) if last.varargs => argc + 1 >= method.params.len(),
        _ => argc == method.params.len(),
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Int(_) => Type::Int,
        Literal::Long(_) => Type::Long,
        Literal::Float(_) => Type::Float,
        Literal::Double(_) => Type::Double,
        Literal::Char(_) => Type::Char,
        Literal::String(_) => Type::class("String"),
        Literal::Bool(_) => Type::Boolean,
        Literal::Null => Type::Null,
    }
}

fn conditional_type(then_ty: Type, else_ty: Type) -> Type {
    if then_ty == else_ty {
        return then_ty;
    }
    match (&then_ty, &else_ty) {
        (Type::Null, _) => else_ty,
        (_, Type::Null) => then_ty,
        _ => Type::binary_promotion(&then_ty, &else_ty).unwrap_or(then_ty),
    }
}
