use super::ast::{
    AssignOp, BinaryOp, ClassDecl, CompilationUnit, ConstructorDecl, Expr, ExprArena, ExprId,
    FieldDecl, ForInit, Import, Literal, Member, MethodDecl, Modifier, Param, Precedence,
    PrimitiveType, Stmt, TypeRef, UnaryOp, VarDeclarator,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Recursive-descent parser for the supported Java subset
pub struct JavaParser {
    tokens: Vec<Token>,
    current: usize,
    arena: ExprArena,
}

/// Operators spelled with two or three adjacent `>` tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GtRun {
    Gt,
    GtEq,
    Shr,
    UShr,
    ShrAssign,
    UShrAssign,
}

impl JavaParser {
    /// Creates a new parser over a token stream ending in `Eof`
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        JavaParser {
            tokens,
            current: 0,
            arena: ExprArena::new(),
        }
    }

    /// Parses the tokens into a compilation unit
    pub fn parse(&mut self) -> Result<CompilationUnit> {
        let package = if self.match_kind(&TokenKind::Package) {
            let name = self.qualified_name()?;
            self.consume(TokenKind::Semicolon)?;
            Some(name)
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.match_kind(&TokenKind::Import) {
            imports.push(self.parse_import()?);
        }

        let mut types = Vec::new();
        while !self.is_at_end() {
            if self.match_kind(&TokenKind::Semicolon) {
                continue;
            }
            let modifiers = self.parse_modifiers()?;
            types.push(self.parse_class(modifiers)?);
        }

        Ok(CompilationUnit {
            package,
            imports,
            types,
            arena: std::mem::take(&mut self.arena),
        })
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_import(&mut self) -> Result<Import> {
        let is_static = self.match_kind(&TokenKind::Static);
        let mut path = self.expect_identifier()?;
        let mut wildcard = false;

        while self.match_kind(&TokenKind::Dot) {
            if self.match_kind(&TokenKind::Star) {
                wildcard = true;
                break;
            }
            path.push('.');
            path.push_str(&self.expect_identifier()?);
        }

        self.consume(TokenKind::Semicolon)?;
        Ok(Import {
            path,
            is_static,
            wildcard,
        })
    }

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>> {
        let mut modifiers = Vec::new();

        loop {
            let modifier = match self.peek().kind {
                TokenKind::Public => Modifier::Public,
                TokenKind::Protected => Modifier::Protected,
                TokenKind::Private => Modifier::Private,
                TokenKind::Static => Modifier::Static,
                TokenKind::Final => Modifier::Final,
                TokenKind::Abstract => Modifier::Abstract,
                TokenKind::Synchronized => Modifier::Synchronized,
                TokenKind::Native => Modifier::Native,
                TokenKind::Transient => Modifier::Transient,
                TokenKind::Volatile => Modifier::Volatile,
                TokenKind::Strictfp => Modifier::Strictfp,
                TokenKind::At => {
                    self.advance();
                    let name = self.qualified_name()?;
                    if self.check(&TokenKind::LeftParen) {
                        return Err(self.syntax_error(format!(
                            "Annotation arguments are not supported (on @{})",
                            name
                        )));
                    }
                    modifiers.push(Modifier::Annotation(name));
                    continue;
                }
                _ => break,
            };
            self.advance();
            modifiers.push(modifier);
        }

        Ok(modifiers)
    }

    fn parse_class(&mut self, modifiers: Vec<Modifier>) -> Result<ClassDecl> {
        if !self.check(&TokenKind::Class) {
            return Err(self.expected_error(
                "class declaration",
                Some("Only `class` declarations are supported at this level."),
            ));
        }
        self.advance();
        let name = self.expect_identifier()?;

        if self.check(&TokenKind::Lt) {
            return Err(self.syntax_error(format!(
                "Generic class declarations are not supported (class {})",
                name
            )));
        }

        let extends = if self.match_kind(&TokenKind::Extends) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let mut implements = Vec::new();
        if self.match_kind(&TokenKind::Implements) {
            loop {
                implements.push(self.parse_type()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::LeftBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            if self.match_kind(&TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_member(&name)?);
        }
        self.consume(TokenKind::RightBrace)?;

        Ok(ClassDecl {
            modifiers,
            name,
            extends,
            implements,
            members,
        })
    }

    fn parse_member(&mut self, class_name: &str) -> Result<Member> {
        if self.check(&TokenKind::LeftBrace) {
            let body = self.parse_block()?;
            return Ok(Member::Initializer {
                is_static: false,
                body,
            });
        }
        if self.check(&TokenKind::Static) && self.peek_at(1).kind == TokenKind::LeftBrace {
            self.advance();
            let body = self.parse_block()?;
            return Ok(Member::Initializer {
                is_static: true,
                body,
            });
        }

        let modifiers = self.parse_modifiers()?;

        if self.check(&TokenKind::Class) {
            return Ok(Member::Class(self.parse_class(modifiers)?));
        }

        if matches!(&self.peek().kind, TokenKind::Identifier(n) if n == class_name)
            && self.peek_at(1).kind == TokenKind::LeftParen
        {
            self.advance();
            let params = self.parse_params()?;
            let throws = self.parse_throws()?;
            let body = self.parse_block()?;
            return Ok(Member::Constructor(ConstructorDecl {
                modifiers,
                name: class_name.to_string(),
                params,
                throws,
                body,
            }));
        }

        let ty = self.parse_type()?;
        let name = self.expect_identifier()?;

        if self.check(&TokenKind::LeftParen) {
            let params = self.parse_params()?;
            let dims = self.parse_dims();
            let throws = self.parse_throws()?;
            let body = if self.match_kind(&TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_block()?)
            };
            return Ok(Member::Method(MethodDecl {
                modifiers,
                return_type: ty.with_dims(dims),
                name,
                params,
                throws,
                body,
            }));
        }

        let declarators = self.parse_declarators(name)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Member::Field(FieldDecl {
            modifiers,
            ty,
            declarators,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.consume(TokenKind::LeftParen)?;
        let mut params = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                let modifiers = self.parse_modifiers()?;
                let ty = self.parse_type()?;
                let varargs = self.match_kind(&TokenKind::Ellipsis);
                let name = self.expect_identifier()?;
                let dims = self.parse_dims();
                params.push(Param {
                    modifiers,
                    ty: ty.with_dims(dims),
                    name,
                    varargs,
                });
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen)?;
        Ok(params)
    }

    fn parse_throws(&mut self) -> Result<Vec<TypeRef>> {
        let mut throws = Vec::new();
        if self.match_kind(&TokenKind::Throws) {
            loop {
                throws.push(self.parse_type()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(throws)
    }

    /// Parse `name [dims] [= init] {, name [dims] [= init]}` after the first name
    fn parse_declarators(&mut self, first: String) -> Result<Vec<VarDeclarator>> {
        let mut declarators = vec![self.parse_declarator_rest(first)?];
        while self.match_kind(&TokenKind::Comma) {
            let name = self.expect_identifier()?;
            declarators.push(self.parse_declarator_rest(name)?);
        }
        Ok(declarators)
    }

    fn parse_declarator_rest(&mut self, name: String) -> Result<VarDeclarator> {
        let dims = self.parse_dims();
        let init = if self.match_kind(&TokenKind::Assign) {
            Some(self.parse_var_init()?)
        } else {
            None
        };
        Ok(VarDeclarator { name, dims, init })
    }

    fn parse_var_init(&mut self) -> Result<ExprId> {
        if self.check(&TokenKind::LeftBrace) {
            self.parse_array_init()
        } else {
            self.parse_expression()
        }
    }

    /// Count `[]` pairs
    fn parse_dims(&mut self) -> usize {
        let mut dims = 0;
        while self.check(&TokenKind::LeftBracket) && self.peek_at(1).kind == TokenKind::RightBracket
        {
            self.advance();
            self.advance();
            dims += 1;
        }
        dims
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeRef> {
        let base = if let Some(primitive) = Self::primitive_of(&self.peek().kind) {
            self.advance();
            TypeRef::Primitive(primitive)
        } else {
            let name = self.qualified_type_name()?;
            let args = self.parse_type_args()?;
            TypeRef::Class { name, args }
        };

        let dims = self.parse_dims();
        Ok(base.with_dims(dims))
    }

    /// Like [`Self::qualified_name`] but stops before `.` that is not followed by a name
    fn qualified_type_name(&mut self) -> Result<String> {
        let mut name = self.expect_identifier()?;
        while self.check(&TokenKind::Dot)
            && matches!(self.peek_at(1).kind, TokenKind::Identifier(_))
        {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    fn parse_type_args(&mut self) -> Result<Vec<TypeRef>> {
        if !self.match_kind(&TokenKind::Lt) {
            return Ok(Vec::new());
        }

        // Diamond `<>` is stored as a single inferred argument
        if self.match_kind(&TokenKind::Gt) {
            return Ok(vec![TypeRef::Inferred]);
        }

        let mut args = Vec::new();
        loop {
            if self.match_kind(&TokenKind::Question) {
                args.push(TypeRef::Class {
                    name: "?".to_string(),
                    args: Vec::new(),
                });
            } else {
                args.push(self.parse_type()?);
            }
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::Gt)?;
        Ok(args)
    }

    fn primitive_of(kind: &TokenKind) -> Option<PrimitiveType> {
        let primitive = match kind {
            TokenKind::Byte => PrimitiveType::Byte,
            TokenKind::Short => PrimitiveType::Short,
            TokenKind::CharKw => PrimitiveType::Char,
            TokenKind::Int => PrimitiveType::Int,
            TokenKind::LongKw => PrimitiveType::Long,
            TokenKind::FloatKw => PrimitiveType::Float,
            TokenKind::DoubleKw => PrimitiveType::Double,
            TokenKind::Boolean => PrimitiveType::Boolean,
            TokenKind::Void => PrimitiveType::Void,
            _ => return None,
        };
        Some(primitive)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenKind::LeftBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => {
                self.advance();
                let condition = self.parse_paren_condition()?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { condition, body })
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.consume(TokenKind::While)?;
                let condition = self.parse_paren_condition()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::DoWhile { body, condition })
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.advance().kind == TokenKind::Break;
                let label = match &self.peek().kind {
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                self.consume(TokenKind::Semicolon)?;
                Ok(if is_break {
                    Stmt::Break(label)
                } else {
                    Stmt::Continue(label)
                })
            }
            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::Throw(value))
            }
            TokenKind::Class => Err(self.syntax_error("Local classes are not supported")),
            TokenKind::Identifier(label) if self.peek_at(1).kind == TokenKind::Colon => {
                self.advance();
                self.advance();
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::Labeled { label, body })
            }
            _ if self.at_local_var_decl() => {
                let (modifiers, ty, declarators) = self.parse_local_var()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::LocalVar {
                    modifiers,
                    ty,
                    declarators,
                })
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::If)?;
        let condition = self.parse_paren_condition()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_kind(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_paren_condition(&mut self) -> Result<ExprId> {
        self.consume(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen)?;
        Ok(condition)
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::For)?;
        self.consume(TokenKind::LeftParen)?;

        let mut init = None;
        if !self.check(&TokenKind::Semicolon) {
            if self.at_local_var_decl() {
                let modifiers = self.parse_modifiers()?;
                let ty = self.parse_local_type()?;
                let name = self.expect_identifier()?;

                if self.match_kind(&TokenKind::Colon) {
                    let iterable = self.parse_expression()?;
                    self.consume(TokenKind::RightParen)?;
                    let body = Box::new(self.parse_statement()?);
                    return Ok(Stmt::ForEach {
                        modifiers,
                        ty,
                        name,
                        iterable,
                        body,
                    });
                }

                let declarators = self.parse_declarators(name)?;
                init = Some(ForInit::Decl {
                    modifiers,
                    ty,
                    declarators,
                });
            } else {
                init = Some(ForInit::Exprs(self.parse_expression_list()?));
            }
        }
        self.consume(TokenKind::Semicolon)?;

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        self.consume(TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_expression_list(&mut self) -> Result<Vec<ExprId>> {
        let mut exprs = vec![self.parse_expression()?];
        while self.match_kind(&TokenKind::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    fn parse_local_var(&mut self) -> Result<(Vec<Modifier>, TypeRef, Vec<VarDeclarator>)> {
        let modifiers = self.parse_modifiers()?;
        let ty = self.parse_local_type()?;
        let name = self.expect_identifier()?;
        let declarators = self.parse_declarators(name)?;
        Ok((modifiers, ty, declarators))
    }

    fn parse_local_type(&mut self) -> Result<TypeRef> {
        if matches!(&self.peek().kind, TokenKind::Identifier(n) if n == "var")
            && matches!(self.peek_at(1).kind, TokenKind::Identifier(_))
        {
            self.advance();
            return Ok(TypeRef::Inferred);
        }
        self.parse_type()
    }

    /// Decide, without consuming anything, whether a local declaration starts here
    fn at_local_var_decl(&mut self) -> bool {
        let kind = &self.peek().kind;
        if kind.is_modifier() || *kind == TokenKind::At {
            return true;
        }
        if !kind.is_primitive_type() && !matches!(kind, TokenKind::Identifier(_)) {
            return false;
        }

        let saved = self.current;
        let is_decl = self.parse_local_type().is_ok()
            && matches!(self.peek().kind, TokenKind::Identifier(_));
        self.current = saved;
        is_decl
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Parse a full expression (assignment level)
    fn parse_expression(&mut self) -> Result<ExprId> {
        let target = self.parse_conditional()?;

        let Some((op, width)) = self.peek_assign_op() else {
            return Ok(target);
        };

        if !self.is_assignable(target) {
            return Err(self.syntax_error(
                "Invalid assignment target.\n\n\
                 Help: Only variables, fields and array elements can be assigned.",
            ));
        }
        self.current += width;
        let value = self.parse_expression()?;
        Ok(self.arena.alloc(Expr::Assign { op, target, value }))
    }

    fn is_assignable(&self, id: ExprId) -> bool {
        match self.arena.get(id) {
            Expr::Name(_) | Expr::FieldAccess { .. } | Expr::ArrayAccess { .. } => true,
            Expr::Paren(inner) => self.is_assignable(*inner),
            _ => false,
        }
    }

    fn parse_conditional(&mut self) -> Result<ExprId> {
        let condition = self.parse_binary(Precedence::Or)?;
        if !self.match_kind(&TokenKind::Question) {
            return Ok(condition);
        }

        let then_expr = self.parse_expression()?;
        self.consume(TokenKind::Colon)?;
        let else_expr = self.parse_conditional()?;
        Ok(self.arena.alloc(Expr::Conditional {
            condition,
            then_expr,
            else_expr,
        }))
    }

    /// Precedence climbing over left-associative binary operators
    fn parse_binary(&mut self, min: Precedence) -> Result<ExprId> {
        let mut left = self.parse_unary()?;

        while let Some((op, width)) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min {
                break;
            }
            self.current += width;
            let right = self.parse_binary(Self::tighter(precedence))?;
            left = self.arena.alloc(Expr::Binary { op, left, right });
        }

        Ok(left)
    }

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

    fn parse_unary(&mut self) -> Result<ExprId> {
        let op = match self.peek().kind {
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Minus => {
                if let Some(literal) = self.negative_literal() {
                    self.advance();
                    self.advance();
                    let id = self.arena.alloc(Expr::Literal(literal));
                    return self.parse_postfix_ops(id);
                }
                UnaryOp::Neg
            }
            TokenKind::LeftParen => {
                if let Some(cast) = self.try_parse_cast()? {
                    return Ok(cast);
                }
                return self.parse_postfix();
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        Ok(self.arena.alloc(Expr::Unary { op, operand }))
    }

    /// `-2147483648` and `-9223372036854775808L` are single literals: their
    /// magnitude alone is out of range. Every other `-literal` is a negation.
    fn negative_literal(&self) -> Option<Literal> {
        let literal = match &self.peek_at(1).kind {
            TokenKind::Integer(text) if magnitude(text) == "2147483648" => {
                Literal::Int(format!("-{}", text))
            }
            TokenKind::Long(text) if magnitude(text) == "9223372036854775808" => {
                Literal::Long(format!("-{}", text))
            }
            _ => return None,
        };
        // `-1.foo` or `-1[...]` would change meaning if folded
        match self.peek_at(2).kind {
            TokenKind::Dot | TokenKind::LeftBracket => None,
            _ => Some(literal),
        }
    }

    fn try_parse_cast(&mut self) -> Result<Option<ExprId>> {
        let saved = self.current;
        let next = self.peek_at(1).kind.clone();

        let primitive_cast = next.is_primitive_type();
        let reference_cast = matches!(next, TokenKind::Identifier(_));
        if !primitive_cast && !reference_cast {
            return Ok(None);
        }

        self.advance(); // (
        let ty = match self.parse_type() {
            Ok(ty) if self.check(&TokenKind::RightParen) => ty,
            _ => {
                self.current = saved;
                return Ok(None);
            }
        };

        // `(a) + b` is a parenthesized name, `(String) o` a cast
        let follower = &self.peek_at(1).kind;
        let starts_operand = if primitive_cast {
            !matches!(follower, TokenKind::Dot)
        } else {
            matches!(
                follower,
                TokenKind::Identifier(_)
                    | TokenKind::LeftParen
                    | TokenKind::This
                    | TokenKind::New
                    | TokenKind::Bang
                    | TokenKind::Tilde
            ) || follower.is_literal()
        };
        if !starts_operand {
            self.current = saved;
            return Ok(None);
        }

        self.advance(); // )
        let expr = self.parse_unary()?;
        Ok(Some(self.arena.alloc(Expr::Cast { ty, expr })))
    }

    fn parse_postfix(&mut self) -> Result<ExprId> {
        let primary = self.parse_primary()?;
        let expr = self.parse_selectors(primary)?;
        self.parse_postfix_ops(expr)
    }

    fn parse_postfix_ops(&mut self, mut expr: ExprId) -> Result<ExprId> {
        loop {
            let op = match self.peek().kind {
                TokenKind::PlusPlus => UnaryOp::PostInc,
                TokenKind::MinusMinus => UnaryOp::PostDec,
                _ => return Ok(expr),
            };
            self.advance();
            expr = self.arena.alloc(Expr::Unary { op, operand: expr });
        }
    }

    fn parse_selectors(&mut self, mut expr: ExprId) -> Result<ExprId> {
        loop {
            if self.match_kind(&TokenKind::Dot) {
                let name = self.expect_identifier()?;
                expr = if self.check(&TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    self.arena.alloc(Expr::MethodCall {
                        target: Some(expr),
                        name,
                        args,
                    })
                } else {
                    self.arena.alloc(Expr::FieldAccess {
                        target: expr,
                        field: name,
                    })
                };
            } else if self.match_kind(&TokenKind::LeftBracket) {
                let index = self.parse_expression()?;
                self.consume(TokenKind::RightBracket)?;
                expr = self.arena.alloc(Expr::ArrayAccess { array: expr, index });
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<ExprId> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::Integer(text) => Expr::Literal(Literal::Int(text)),
            TokenKind::Long(text) => Expr::Literal(Literal::Long(text)),
            TokenKind::Float(text) => Expr::Literal(Literal::Float(text)),
            TokenKind::Double(text) => Expr::Literal(Literal::Double(text)),
            TokenKind::Char(text) => Expr::Literal(Literal::Char(text)),
            TokenKind::String(text) => Expr::Literal(Literal::String(text)),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::Null => Expr::Literal(Literal::Null),
            TokenKind::This => Expr::This,
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                return Ok(self.arena.alloc(Expr::Paren(inner)));
            }
            TokenKind::New => return self.parse_new(),
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    return Ok(self.arena.alloc(Expr::MethodCall {
                        target: None,
                        name,
                        args,
                    }));
                }
                return Ok(self.arena.alloc(Expr::Name(name)));
            }
            TokenKind::Eof => return Err(Error::UnexpectedEof),
            other => {
                return Err(self.syntax_error(format!(
                    "Unexpected token {} in expression.\n\n\
                     Help: Expected a literal, a name, `this`, `new` or `(`.",
                    Self::token_kind_name(&other)
                )));
            }
        };
        self.advance();
        Ok(self.arena.alloc(expr))
    }

    fn parse_new(&mut self) -> Result<ExprId> {
        self.consume(TokenKind::New)?;

        let element = if let Some(primitive) = Self::primitive_of(&self.peek().kind) {
            self.advance();
            TypeRef::Primitive(primitive)
        } else {
            let name = self.qualified_type_name()?;
            let args = self.parse_type_args()?;
            TypeRef::Class { name, args }
        };

        if self.check(&TokenKind::LeftBracket) {
            let mut dims = Vec::new();
            let mut extra_dims = 0;
            while self.match_kind(&TokenKind::LeftBracket) {
                if self.match_kind(&TokenKind::RightBracket) {
                    extra_dims += 1;
                    continue;
                }
                if extra_dims > 0 {
                    return Err(self.syntax_error(
                        "Sized array dimension after an unsized one",
                    ));
                }
                dims.push(self.parse_expression()?);
                self.consume(TokenKind::RightBracket)?;
            }

            let initializer = if dims.is_empty() {
                Some(self.parse_array_init()?)
            } else {
                None
            };
            let id = self.arena.alloc(Expr::NewArray {
                element,
                dims,
                extra_dims,
                initializer,
            });
            return self.parse_selectors(id);
        }

        if matches!(element, TypeRef::Primitive(_)) {
            return Err(self.expected_error("`[` after primitive type in `new`", None));
        }

        let args = self.parse_arguments()?;
        if self.check(&TokenKind::LeftBrace) {
            return Err(self.syntax_error("Anonymous classes are not supported"));
        }
        let id = self.arena.alloc(Expr::NewObject {
            class: element,
            args,
        });
        self.parse_selectors(id)
    }

    fn parse_array_init(&mut self) -> Result<ExprId> {
        self.consume(TokenKind::LeftBrace)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            elements.push(self.parse_var_init()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(self.arena.alloc(Expr::ArrayInit(elements)))
    }

    fn parse_arguments(&mut self) -> Result<Vec<ExprId>> {
        self.consume(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            args = self.parse_expression_list()?;
        }
        self.consume(TokenKind::RightParen)?;
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Operator lookahead
    // ------------------------------------------------------------------

    fn peek_gt_run(&self) -> Option<(GtRun, usize)> {
        let first = self.peek();
        match first.kind {
            TokenKind::GtEq => return Some((GtRun::GtEq, 1)),
            TokenKind::Gt => {}
            _ => return None,
        }

        let second = self.peek_at(1);
        if !first.is_adjacent_to(second) {
            return Some((GtRun::Gt, 1));
        }
        match second.kind {
            TokenKind::GtEq => Some((GtRun::ShrAssign, 2)),
            TokenKind::Gt => {
                let third = self.peek_at(2);
                if !second.is_adjacent_to(third) {
                    return Some((GtRun::Shr, 2));
                }
                match third.kind {
                    TokenKind::Gt => Some((GtRun::UShr, 3)),
                    TokenKind::GtEq => Some((GtRun::UShrAssign, 3)),
                    _ => Some((GtRun::Shr, 2)),
                }
            }
            _ => Some((GtRun::Gt, 1)),
        }
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, usize)> {
        if let Some((run, width)) = self.peek_gt_run() {
            return match run {
                GtRun::Gt => Some((BinaryOp::Gt, width)),
                GtRun::GtEq => Some((BinaryOp::Ge, width)),
                GtRun::Shr => Some((BinaryOp::Shr, width)),
                GtRun::UShr => Some((BinaryOp::UShr, width)),
                GtRun::ShrAssign | GtRun::UShrAssign => None,
            };
        }

        let op = match self.peek().kind {
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            _ => return None,
        };
        Some((op, 1))
    }

    fn peek_assign_op(&self) -> Option<(AssignOp, usize)> {
        if let Some((run, width)) = self.peek_gt_run() {
            return match run {
                GtRun::ShrAssign => Some((AssignOp::ShrAssign, width)),
                GtRun::UShrAssign => Some((AssignOp::UShrAssign, width)),
                _ => None,
            };
        }

        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::AddAssign,
            TokenKind::MinusAssign => AssignOp::SubAssign,
            TokenKind::StarAssign => AssignOp::MulAssign,
            TokenKind::SlashAssign => AssignOp::DivAssign,
            TokenKind::PercentAssign => AssignOp::RemAssign,
            TokenKind::AmpAssign => AssignOp::AndAssign,
            TokenKind::PipeAssign => AssignOp::OrAssign,
            TokenKind::CaretAssign => AssignOp::XorAssign,
            TokenKind::ShlAssign => AssignOp::ShlAssign,
            _ => return None,
        };
        Some((op, 1))
    }

    // Helper methods

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.current + offset).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            if token.kind == TokenKind::Eof {
                return Err(Error::UnexpectedEof);
            }
            let message = self.build_error_message(&kind, token);

            Err(Error::SyntaxError {
                line: token.line,
                col: token.column,
                message,
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => Err(self.expected_error("identifier", None)),
        }
    }

    fn qualified_name(&mut self) -> Result<String> {
        let mut name = self.expect_identifier()?;
        while self.match_kind(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    /// Build a helpful error message like Rust's compiler
    fn build_error_message(&self, expected: &TokenKind, got: &Token) -> String {
        let expected_str = Self::token_kind_name(expected);
        let got_str = Self::token_kind_name(&got.kind);

        let mut message = format!("Expected {}, found {}", expected_str, got_str);

        let hint = match (expected, &got.kind) {
            (TokenKind::Semicolon, _) => Some("Statements and field declarations end with `;`."),
            (TokenKind::RightParen, _) => Some(
                "Missing closing `)` for an earlier opening `(`.\n\
                      Count your parentheses to find the unmatched one.",
            ),
            (TokenKind::RightBrace, _) => Some(
                "Missing closing `}`.\n\
                      Check that every block and class body is closed.",
            ),
            (TokenKind::RightBracket, _) => Some("Missing closing `]` for an array index."),
            _ => None,
        };

        if let Some(hint) = hint {
            message.push_str("\n\nHelp: ");
            message.push_str(hint);
        }

        message
    }

    /// Get a human-readable name for a token kind
    fn token_kind_name(kind: &TokenKind) -> String {
        match kind {
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::LeftBracket => "`[`".to_string(),
            TokenKind::RightBracket => "`]`".to_string(),
            TokenKind::LeftBrace => "`{`".to_string(),
            TokenKind::RightBrace => "`}`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Assign => "`=`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::Integer(_) | TokenKind::Long(_) => "integer literal".to_string(),
            TokenKind::Float(_) | TokenKind::Double(_) => "floating-point literal".to_string(),
            TokenKind::Char(_) => "character literal".to_string(),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::True | TokenKind::False => "boolean".to_string(),
            TokenKind::Null => "`null`".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("{:?}", kind),
        }
    }

    /// Helper to create a syntax error at current position with helpful message
    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }

    /// Helper to create a syntax error with expected/got pattern
    fn expected_error(&self, expected: &str, hint: Option<&str>) -> Error {
        let token = self.peek();
        let got_str = Self::token_kind_name(&token.kind);

        let mut message = format!("Expected {}, found {}", expected, got_str);

        if let Some(hint) = hint {
            message.push_str("\n\nHelp: ");
            message.push_str(hint);
        }

        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message,
        }
    }
}

/// Decimal digits of an integer literal without underscores or `L` suffix
fn magnitude(text: &str) -> String {
    text.trim_end_matches(|c| c == 'l' || c == 'L')
        .chars()
        .filter(|c| *c != '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse_str(source: &str) -> Result<CompilationUnit> {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens()?;
        let mut parser = JavaParser::new(tokens);
        parser.parse()
    }

    fn method_body(source: &str) -> (CompilationUnit, Vec<Stmt>) {
        let wrapped = format!("class T {{ void m() {{ {} }} }}", source);
        let unit = parse_str(&wrapped).unwrap();
        let body = match &unit.types[0].members[0] {
            Member::Method(m) => m.body.clone().unwrap(),
            other => panic!("expected method, got {:?}", other),
        };
        (unit, body)
    }

    fn expr_of(stmt: &Stmt) -> ExprId {
        match stmt {
            Stmt::Expr(id) => *id,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_main() {
        let unit = parse_str(
            "package demo;\nimport java.util.*;\nclass Test {\n  public static void main(String[] args) {}\n}",
        )
        .unwrap();
        assert_eq!(unit.package.as_deref(), Some("demo"));
        assert!(unit.imports[0].wildcard);
        assert_eq!(unit.types[0].name, "Test");
        match &unit.types[0].members[0] {
            Member::Method(m) => {
                assert_eq!(m.name, "main");
                assert_eq!(m.params[0].ty.to_string(), "String[]");
                assert_eq!(m.modifiers, vec![Modifier::Public, Modifier::Static]);
            }
            other => panic!("unexpected member {:?}", other),
        }
    }

    #[test]
    fn test_left_associative_addition() {
        let (unit, body) = method_body("1 + 2 + 3;");
        let root = expr_of(&body[0]);
        match unit.arena[root] {
            Expr::Binary {
                op: BinaryOp::Add,
                left,
                ..
            } => assert!(matches!(
                unit.arena[left],
                Expr::Binary {
                    op: BinaryOp::Add,
                    ..
                }
            )),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let (unit, body) = method_body("a + b * c;");
        let root = expr_of(&body[0]);
        match unit.arena[root] {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                unit.arena[right],
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compound_and_shift_assignment() {
        let (unit, body) = method_body("a += 2; b >>= 1; c >>>= 3; d = e >> 1;");
        let ops: Vec<AssignOp> = body
            .iter()
            .map(|s| match unit.arena[expr_of(s)] {
                Expr::Assign { op, .. } => op,
                ref other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                AssignOp::AddAssign,
                AssignOp::ShrAssign,
                AssignOp::UShrAssign,
                AssignOp::Assign
            ]
        );
    }

    #[test]
    fn test_increment_forms() {
        let (unit, body) = method_body("a++; --b;");
        assert!(matches!(
            unit.arena[expr_of(&body[0])],
            Expr::Unary {
                op: UnaryOp::PostInc,
                ..
            }
        ));
        assert!(matches!(
            unit.arena[expr_of(&body[1])],
            Expr::Unary {
                op: UnaryOp::PreDec,
                ..
            }
        ));
    }

    #[test]
    fn test_only_min_value_literals_are_folded() {
        let (unit, body) = method_body("x = -2147483648; y = -z; w = -1; v = -9_223_372_036_854_775_808L;");
        match unit.arena[expr_of(&body[0])] {
            Expr::Assign { value, .. } => assert_eq!(
                unit.arena[value],
                Expr::Literal(Literal::Int("-2147483648".to_string()))
            ),
            ref other => panic!("unexpected {:?}", other),
        }
        match unit.arena[expr_of(&body[1])] {
            Expr::Assign { value, .. } => assert!(matches!(
                unit.arena[value],
                Expr::Unary {
                    op: UnaryOp::Neg,
                    ..
                }
            )),
            ref other => panic!("unexpected {:?}", other),
        }
        match unit.arena[expr_of(&body[2])] {
            Expr::Assign { value, .. } => match unit.arena[value] {
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand,
                } => assert_eq!(unit.arena[operand], Expr::Literal(Literal::Int("1".to_string()))),
                ref other => panic!("unexpected {:?}", other),
            },
            ref other => panic!("unexpected {:?}", other),
        }
        match unit.arena[expr_of(&body[3])] {
            Expr::Assign { value, .. } => assert_eq!(
                unit.arena[value],
                Expr::Literal(Literal::Long("-9_223_372_036_854_775_808L".to_string()))
            ),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_local_declarations() {
        let (_, body) = method_body(
            "int a = 1, b; long[] xs = {1L, 2L}; List<List<Integer>> nested = null; var v = 3;",
        );
        assert_eq!(body.len(), 4);
        match &body[0] {
            Stmt::LocalVar { declarators, .. } => assert_eq!(declarators.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        match &body[2] {
            Stmt::LocalVar { ty, .. } => assert_eq!(ty.to_string(), "List<List<Integer>>"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            &body[3],
            Stmt::LocalVar {
                ty: TypeRef::Inferred,
                ..
            }
        ));
    }

    #[test]
    fn test_casts_and_parens() {
        let (unit, body) = method_body("x = (int) y; z = (a) + b; s = (String) o;");
        let value = |i: usize| match unit.arena[expr_of(&body[i])] {
            Expr::Assign { value, .. } => unit.arena[value].clone(),
            ref other => panic!("unexpected {:?}", other),
        };
        assert!(matches!(value(0), Expr::Cast { .. }));
        assert!(matches!(
            value(1),
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
        assert!(matches!(value(2), Expr::Cast { .. }));
    }

    #[test]
    fn test_control_flow() {
        let (_, body) = method_body(
            "for (int i = 0; i < n; i++) { s += i; } \
             for (int x : xs) s -= x; \
             while (a > b) a--; \
             do { b++; } while (b < 10); \
             if (a == b) return; else { throw new IllegalStateException(\"x\"); }",
        );
        assert!(matches!(body[0], Stmt::For { .. }));
        assert!(matches!(body[1], Stmt::ForEach { .. }));
        assert!(matches!(body[2], Stmt::While { .. }));
        assert!(matches!(body[3], Stmt::DoWhile { .. }));
        assert!(matches!(body[4], Stmt::If { .. }));
    }

    #[test]
    fn test_method_chain_and_array_access() {
        let (unit, body) = method_body("System.out.println(xs[i + 1]);");
        match &unit.arena[expr_of(&body[0])] {
            Expr::MethodCall { target, name, args } => {
                assert_eq!(name, "println");
                assert!(matches!(
                    unit.arena[target.unwrap()],
                    Expr::FieldAccess { .. }
                ));
                assert!(matches!(unit.arena[args[0]], Expr::ArrayAccess { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_str("class T { void m() { int a = ; } }").is_err());
        assert!(parse_str("class T { void m() { 1 = 2; } }").is_err());
        assert!(matches!(
            parse_str("class T { void m() {"),
            Err(Error::UnexpectedEof)
        ));
        let err = parse_str("class T { int a = 1 }").unwrap_err();
        assert!(err.to_string().contains("Expected `;`"));
    }
}
