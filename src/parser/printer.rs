//! Canonical source printer
//!
//! Emits a compilation unit in a fixed layout: four-space indentation, a
//! blank line before every class member, annotations on their own line for
//! declarations. Parentheses written in the source are kept; any others are
//! added only where operator precedence requires them, which happens after a
//! rewrite puts an assignment in operand position.

use super::ast::{
    ClassDecl, CompilationUnit, Expr, ExprArena, ExprId, ForInit, Literal, Member, Modifier,
    Param, Precedence, Stmt, TypeRef, UnaryOp, VarDeclarator,
};

const INDENT: &str = "    ";

/// Print a whole compilation unit
pub fn print_unit(unit: &CompilationUnit) -> String {
    let mut printer = JavaPrinter::new(&unit.arena);
    printer.unit(unit);
    printer.finish()
}

/// Print a single expression
pub fn print_expr(arena: &ExprArena, id: ExprId) -> String {
    let mut printer = JavaPrinter::new(arena);
    printer.expr(id, Precedence::Assignment);
    printer.finish()
}

struct JavaPrinter<'a> {
    arena: &'a ExprArena,
    out: String,
    indent: usize,
}

impl<'a> JavaPrinter<'a> {
    fn new(arena: &'a ExprArena) -> Self {
        Self {
            arena,
            out: String::new(),
            indent: 0,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn unit(&mut self, unit: &CompilationUnit) {
        if let Some(package) = &unit.package {
            self.push(&format!("package {};\n\n", package));
        }

        if !unit.imports.is_empty() {
            for import in &unit.imports {
                self.push("import ");
                if import.is_static {
                    self.push("static ");
                }
                self.push(&import.path);
                if import.wildcard {
                    self.push(".*");
                }
                self.push(";\n");
            }
            self.newline();
        }

        for (i, class) in unit.types.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.class(class);
        }
    }

    /// Annotations each on their own line, keywords inline on the current one
    fn declaration_modifiers(&mut self, modifiers: &[Modifier]) {
        for modifier in modifiers {
            if let Modifier::Annotation(_) = modifier {
                self.push(&modifier.to_string());
                self.newline();
                self.line_start();
            }
        }
        for modifier in modifiers {
            if !matches!(modifier, Modifier::Annotation(_)) {
                self.push(&modifier.to_string());
                self.push(" ");
            }
        }
    }

    /// All modifiers inline, as for parameters and locals
    fn inline_modifiers(&mut self, modifiers: &[Modifier]) {
        for modifier in modifiers {
            self.push(&modifier.to_string());
            self.push(" ");
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        self.line_start();
        self.declaration_modifiers(&class.modifiers);
        self.push("class ");
        self.push(&class.name);
        if let Some(extends) = &class.extends {
            self.push(&format!(" extends {}", extends));
        }
        if !class.implements.is_empty() {
            self.push(" implements ");
            self.push(&join_types(&class.implements));
        }
        self.push(" {\n");

        self.indent += 1;
        for member in &class.members {
            self.newline();
            self.member(member);
        }
        self.indent -= 1;

        self.line_start();
        self.push("}\n");
    }

    fn member(&mut self, member: &Member) {
        match member {
            Member::Field(field) => {
                self.line_start();
                self.declaration_modifiers(&field.modifiers);
                self.push(&field.ty.to_string());
                self.push(" ");
                self.declarators(&field.declarators);
                self.push(";\n");
            }
            Member::Method(method) => {
                self.line_start();
                self.declaration_modifiers(&method.modifiers);
                self.push(&format!("{} {}", method.return_type, method.name));
                self.params(&method.params);
                self.throws(&method.throws);
                match &method.body {
                    Some(body) => {
                        self.push(" ");
                        self.block(body);
                        self.newline();
                    }
                    None => self.push(";\n"),
                }
            }
            Member::Constructor(ctor) => {
                self.line_start();
                self.declaration_modifiers(&ctor.modifiers);
                self.push(&ctor.name);
                self.params(&ctor.params);
                self.throws(&ctor.throws);
                self.push(" ");
                self.block(&ctor.body);
                self.newline();
            }
            Member::Class(class) => self.class(class),
            Member::Initializer { is_static, body } => {
                self.line_start();
                if *is_static {
                    self.push("static ");
                }
                self.block(body);
                self.newline();
            }
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.inline_modifiers(&param.modifiers);
            self.push(&param.ty.to_string());
            self.push(if param.varargs { "... " } else { " " });
            self.push(&param.name);
        }
        self.push(")");
    }

    fn throws(&mut self, throws: &[TypeRef]) {
        if !throws.is_empty() {
            self.push(" throws ");
            self.push(&join_types(throws));
        }
    }

    fn declarators(&mut self, declarators: &[VarDeclarator]) {
        for (i, declarator) in declarators.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&declarator.name);
            for _ in 0..declarator.dims {
                self.push("[]");
            }
            if let Some(init) = declarator.init {
                self.push(" = ");
                self.expr(init, Precedence::Assignment);
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `{ ... }` starting at the current position, leaving the cursor after `}`
    fn block(&mut self, body: &[Stmt]) {
        self.push("{\n");
        self.indent += 1;
        for stmt in body {
            self.line_start();
            self.stmt(stmt);
            self.newline();
        }
        self.indent -= 1;
        self.line_start();
        self.push("}");
    }

    /// Body of `if`/`while`/`for`: blocks stay on the header line
    fn nested(&mut self, body: &Stmt) {
        if let Stmt::Block(stmts) = body {
            self.push(" ");
            self.block(stmts);
        } else {
            self.newline();
            self.indent += 1;
            self.line_start();
            self.stmt(body);
            self.indent -= 1;
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(body) => self.block(body),
            Stmt::LocalVar {
                modifiers,
                ty,
                declarators,
            } => {
                self.inline_modifiers(modifiers);
                self.push(&ty.to_string());
                self.push(" ");
                self.declarators(declarators);
                self.push(";");
            }
            Stmt::Expr(id) => {
                self.expr(*id, Precedence::Assignment);
                self.push(";");
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.expr(*condition, Precedence::Assignment);
                self.push(")");
                self.nested(then_branch);
                if let Some(else_branch) = else_branch {
                    if matches!(**then_branch, Stmt::Block(_)) {
                        self.push(" ");
                    } else {
                        self.newline();
                        self.line_start();
                    }
                    self.push("else");
                    if matches!(**else_branch, Stmt::If { .. }) {
                        self.push(" ");
                        self.stmt(else_branch);
                    } else {
                        self.nested(else_branch);
                    }
                }
            }
            Stmt::While { condition, body } => {
                self.push("while (");
                self.expr(*condition, Precedence::Assignment);
                self.push(")");
                self.nested(body);
            }
            Stmt::DoWhile { body, condition } => {
                self.push("do");
                self.nested(body);
                if matches!(**body, Stmt::Block(_)) {
                    self.push(" ");
                } else {
                    self.newline();
                    self.line_start();
                }
                self.push("while (");
                self.expr(*condition, Precedence::Assignment);
                self.push(");");
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                self.push("for (");
                match init {
                    Some(ForInit::Decl {
                        modifiers,
                        ty,
                        declarators,
                    }) => {
                        self.inline_modifiers(modifiers);
                        self.push(&ty.to_string());
                        self.push(" ");
                        self.declarators(declarators);
                    }
                    Some(ForInit::Exprs(exprs)) => self.expr_list(exprs),
                    None => {}
                }
                self.push(";");
                if let Some(condition) = condition {
                    self.push(" ");
                    self.expr(*condition, Precedence::Assignment);
                }
                self.push(";");
                if !update.is_empty() {
                    self.push(" ");
                    self.expr_list(update);
                }
                self.push(")");
                self.nested(body);
            }
            Stmt::ForEach {
                modifiers,
                ty,
                name,
                iterable,
                body,
            } => {
                self.push("for (");
                self.inline_modifiers(modifiers);
                self.push(&format!("{} {} : ", ty, name));
                self.expr(*iterable, Precedence::Assignment);
                self.push(")");
                self.nested(body);
            }
            Stmt::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.expr(*value, Precedence::Assignment);
                }
                self.push(";");
            }
            Stmt::Break(label) => self.jump("break", label.as_deref()),
            Stmt::Continue(label) => self.jump("continue", label.as_deref()),
            Stmt::Throw(value) => {
                self.push("throw ");
                self.expr(*value, Precedence::Assignment);
                self.push(";");
            }
            Stmt::Labeled { label, body } => {
                self.push(label);
                self.push(": ");
                self.stmt(body);
            }
            Stmt::Empty => self.push(";"),
        }
    }

    fn jump(&mut self, keyword: &str, label: Option<&str>) {
        self.push(keyword);
        if let Some(label) = label {
            self.push(" ");
            self.push(label);
        }
        self.push(";");
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr_list(&mut self, ids: &[ExprId]) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(*id, Precedence::Assignment);
        }
    }

    /// Print `id`, parenthesized if it binds looser than `required`
    fn expr(&mut self, id: ExprId, required: Precedence) {
        let arena = self.arena;
        let node = arena.get(id);
        let wrap = node.precedence() < required;
        if wrap {
            self.push("(");
        }

        match node {
            Expr::Literal(literal) => self.literal(literal),
            Expr::Name(name) => self.push(name),
            Expr::This => self.push("this"),
            Expr::FieldAccess { target, field } => {
                self.expr(*target, Precedence::Primary);
                self.push(".");
                self.push(field);
            }
            Expr::MethodCall { target, name, args } => {
                if let Some(target) = target {
                    self.expr(*target, Precedence::Primary);
                    self.push(".");
                }
                self.push(name);
                self.push("(");
                self.expr_list(args);
                self.push(")");
            }
            Expr::Binary { op, left, right } => {
                let precedence = op.precedence();
                self.expr(*left, precedence);
                self.push(&format!(" {} ", op));
                // Left-associative: an equal-precedence right operand needs parens
                self.expr(*right, tighter(precedence));
            }
            Expr::Unary { op, operand } if op.is_postfix() => {
                self.expr(*operand, Precedence::Postfix);
                self.push(&op.to_string());
            }
            Expr::Unary { op, operand } => {
                let symbol = op.to_string();
                let mut inner = JavaPrinter::new(arena);
                inner.expr(*operand, Precedence::Unary);
                let inner = inner.finish();

                self.push(&symbol);
                // `- -x` and `+ +x` must not fuse into `--x` / `++x`
                let sign = match op {
                    UnaryOp::Neg | UnaryOp::PreDec => Some('-'),
                    UnaryOp::Plus | UnaryOp::PreInc => Some('+'),
                    _ => None,
                };
                if let Some(sign) = sign {
                    if inner.starts_with(sign) {
                        self.push(" ");
                    }
                }
                self.push(&inner);
            }
            Expr::Assign { op, target, value } => {
                self.expr(*target, Precedence::Postfix);
                self.push(&format!(" {} ", op));
                self.expr(*value, Precedence::Assignment);
            }
            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(*condition, Precedence::Or);
                self.push(" ? ");
                self.expr(*then_expr, Precedence::Assignment);
                self.push(" : ");
                self.expr(*else_expr, Precedence::Conditional);
            }
            Expr::Cast { ty, expr } => {
                self.push(&format!("({}) ", ty));
                self.expr(*expr, Precedence::Unary);
            }
            Expr::Paren(inner) => {
                self.push("(");
                self.expr(*inner, Precedence::Assignment);
                self.push(")");
            }
            Expr::ArrayAccess { array, index } => {
                self.expr(*array, Precedence::Primary);
                self.push("[");
                self.expr(*index, Precedence::Assignment);
                self.push("]");
            }
            Expr::NewObject { class, args } => {
                self.push(&format!("new {}(", class));
                self.expr_list(args);
                self.push(")");
            }
            Expr::NewArray {
                element,
                dims,
                extra_dims,
                initializer,
            } => {
                self.push(&format!("new {}", element));
                for dim in dims {
                    self.push("[");
                    self.expr(*dim, Precedence::Assignment);
                    self.push("]");
                }
                for _ in 0..*extra_dims {
                    self.push("[]");
                }
                if let Some(init) = initializer {
                    self.push(" ");
                    self.expr(*init, Precedence::Assignment);
                }
            }
            Expr::ArrayInit(elements) => {
                if elements.is_empty() {
                    self.push("{}");
                } else {
                    self.push("{ ");
                    self.expr_list(elements);
                    self.push(" }");
                }
            }
        }

        if wrap {
            self.push(")");
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Int(text)
            | Literal::Long(text)
            | Literal::Float(text)
            | Literal::Double(text) => self.push(text),
            Literal::Char(text) => self.push(&format!("'{}'", text)),
            Literal::String(text) => self.push(&format!("\"{}\"", text)),
            Literal::Bool(value) => self.push(if *value { "true" } else { "false" }),
            Literal::Null => self.push("null"),
        }
    }
}

fn join_types(types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Minimum precedence for the right operand of a left-associative operator
fn tighter(precedence: Precedence) -> Precedence {
    match precedence {
        Precedence::Assignment => Precedence::Conditional,
        Precedence::Conditional => Precedence::Or,
        Precedence::Or => Precedence::And,
        Precedence::And => Precedence::BitOr,
        Precedence::BitOr => Precedence::BitXor,
        Precedence::BitXor => Precedence::BitAnd,
        Precedence::BitAnd => Precedence::Equality,
        Precedence::Equality => Precedence::Relational,
        Precedence::Relational => Precedence::Shift,
        Precedence::Shift => Precedence::Additive,
        Precedence::Additive => Precedence::Multiplicative,
        Precedence::Multiplicative => Precedence::Unary,
        Precedence::Unary => Precedence::Postfix,
        Precedence::Postfix | Precedence::Primary => Precedence::Primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::ast::{BinaryOp, UnaryOp};
    use crate::parser::JavaParser;

    fn round_trip(source: &str) -> String {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let unit = JavaParser::new(tokens).parse().unwrap();
        print_unit(&unit)
    }

    #[test]
    fn test_canonical_layout() {
        let printed = round_trip(
            "class Test { public static void main(String[] args) { int a = 1; a++; } }",
        );
        assert_eq!(
            printed,
            "class Test {\n\n    public static void main(String[] args) {\n        int a = 1;\n        a++;\n    }\n}\n"
        );
    }

    #[test]
    fn test_printing_is_stable() {
        let source = "package p;\n\nimport java.util.List;\n\npublic class A extends B {\n\n    @Override\n    public int f(int x, long... ys) {\n        for (int i = 0; i < x; i++) {\n            x += i;\n        }\n        return x > 0 ? x : -x;\n    }\n}\n";
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn test_source_parens_are_kept() {
        let printed = round_trip("class T { void m() { x = (a + b) * c; } }");
        assert!(printed.contains("x = (a + b) * c;"));
    }

    #[test]
    fn test_assignment_operand_gets_parens() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(Expr::Name("a".to_string()));
        let math = arena.alloc(Expr::Name("Math".to_string()));
        let call = arena.alloc(Expr::MethodCall {
            target: Some(math),
            name: "incrementExact".to_string(),
            args: vec![a],
        });
        let assign = arena.alloc(Expr::Assign {
            op: crate::parser::ast::AssignOp::Assign,
            target: a,
            value: call,
        });
        let two = arena.alloc(Expr::Literal(Literal::Int("2".to_string())));
        let div = arena.alloc(Expr::Binary {
            op: BinaryOp::Div,
            left: assign,
            right: two,
        });
        assert_eq!(print_expr(&arena, div), "(a = Math.incrementExact(a)) / 2");
    }

    #[test]
    fn test_right_operand_of_equal_precedence() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(Expr::Name("a".to_string()));
        let b = arena.alloc(Expr::Name("b".to_string()));
        let c = arena.alloc(Expr::Name("c".to_string()));
        let inner = arena.alloc(Expr::Binary {
            op: BinaryOp::Sub,
            left: b,
            right: c,
        });
        let outer = arena.alloc(Expr::Binary {
            op: BinaryOp::Sub,
            left: a,
            right: inner,
        });
        assert_eq!(print_expr(&arena, outer), "a - (b - c)");
    }

    #[test]
    fn test_nested_negation_keeps_space() {
        let mut arena = ExprArena::new();
        let x = arena.alloc(Expr::Name("x".to_string()));
        let inner = arena.alloc(Expr::Unary {
            op: UnaryOp::Neg,
            operand: x,
        });
        let outer = arena.alloc(Expr::Unary {
            op: UnaryOp::Neg,
            operand: inner,
        });
        assert_eq!(print_expr(&arena, outer), "- -x");
    }

    #[test]
    fn test_else_if_chain() {
        let printed = round_trip(
            "class T { void m() { if (a) { b(); } else if (c) d(); else { e(); } } }",
        );
        assert!(printed.contains("} else if (c)\n            d();\n        else {\n"));
    }
}
