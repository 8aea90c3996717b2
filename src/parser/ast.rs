use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Complete compilation unit (one source file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// `package a.b.c;`
    pub package: Option<String>,
    /// Import declarations in source order
    pub imports: Vec<Import>,
    /// Top-level class declarations
    pub types: Vec<ClassDecl>,
    /// Storage for every expression referenced from the declarations
    pub arena: ExprArena,
}

/// `import [static] a.b.C[.*];`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Dotted path without the trailing `.*`
    pub path: String,
    /// `import static`
    pub is_static: bool,
    /// Ends in `.*`
    pub wildcard: bool,
}

/// Declaration modifiers, kept in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
    /// `static`
    Static,
    /// `final`
    Final,
    /// `abstract`
    Abstract,
    /// `synchronized`
    Synchronized,
    /// `native`
    Native,
    /// `transient`
    Transient,
    /// `volatile`
    Volatile,
    /// `strictfp`
    Strictfp,
    /// Marker annotation such as `@Override`
    Annotation(String),
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Modifiers and annotations
    pub modifiers: Vec<Modifier>,
    /// Simple class name
    pub name: String,
    /// `extends` clause
    pub extends: Option<TypeRef>,
    /// `implements` clause
    pub implements: Vec<TypeRef>,
    /// Members in source order
    pub members: Vec<Member>,
}

/// Class member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Member {
    /// Field declaration (possibly several declarators)
    Field(FieldDecl),
    /// Method declaration
    Method(MethodDecl),
    /// Constructor declaration
    Constructor(ConstructorDecl),
    /// Nested class
    Class(ClassDecl),
    /// `{ ... }` or `static { ... }`
    Initializer {
        /// Whether the block is a static initializer
        is_static: bool,
        /// Block statements
        body: Vec<Stmt>,
    },
}

/// Field declaration: `private int a = 1, b;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Modifiers and annotations
    pub modifiers: Vec<Modifier>,
    /// Declared type
    pub ty: TypeRef,
    /// Declared variables
    pub declarators: Vec<VarDeclarator>,
}

/// Method declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Modifiers and annotations
    pub modifiers: Vec<Modifier>,
    /// Return type (`void` is [`PrimitiveType::Void`])
    pub return_type: TypeRef,
    /// Method name
    pub name: String,
    /// Formal parameters
    pub params: Vec<Param>,
    /// `throws` clause
    pub throws: Vec<TypeRef>,
    /// Body, absent for abstract and native methods
    pub body: Option<Vec<Stmt>>,
}

/// Constructor declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    /// Modifiers and annotations
    pub modifiers: Vec<Modifier>,
    /// Class name
    pub name: String,
    /// Formal parameters
    pub params: Vec<Param>,
    /// `throws` clause
    pub throws: Vec<TypeRef>,
    /// Body statements
    pub body: Vec<Stmt>,
}

/// Formal parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// `final` and annotations
    pub modifiers: Vec<Modifier>,
    /// Declared type (element type for varargs)
    pub ty: TypeRef,
    /// Parameter name
    pub name: String,
    /// `T... name`
    pub varargs: bool,
}

/// One variable in a field or local declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclarator {
    /// Variable name
    pub name: String,
    /// C-style array brackets after the name: `int a[]`
    pub dims: usize,
    /// Initializer expression
    pub init: Option<ExprId>,
}

/// Syntactic type reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    /// Primitive type or `void`
    Primitive(PrimitiveType),
    /// Class type, possibly qualified and parameterized
    Class {
        /// Dotted name as written (`java.util.List`)
        name: String,
        /// Generic arguments as written
        args: Vec<TypeRef>,
    },
    /// `T[]`
    Array(Box<TypeRef>),
    /// `var` in a local declaration
    Inferred,
}

impl TypeRef {
    /// Wrap this type in `dims` array levels
    pub fn with_dims(self, dims: usize) -> TypeRef {
        (0..dims).fold(self, |ty, _| TypeRef::Array(Box::new(ty)))
    }
}

/// Primitive type keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `char`
    Char,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `boolean`
    Boolean,
    /// `void`
    Void,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// Local variable declaration
    LocalVar {
        /// `final` and annotations
        modifiers: Vec<Modifier>,
        /// Declared type
        ty: TypeRef,
        /// Declared variables
        declarators: Vec<VarDeclarator>,
    },
    /// Expression statement
    Expr(ExprId),
    /// `if (cond) then [else otherwise]`
    If {
        /// Condition expression
        condition: ExprId,
        /// Statement executed when the condition holds
        then_branch: Box<Stmt>,
        /// Optional `else` statement
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (cond) body`
    While {
        /// Loop condition
        condition: ExprId,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `do body while (cond);`
    DoWhile {
        /// Loop body
        body: Box<Stmt>,
        /// Loop condition
        condition: ExprId,
    },
    /// Classic `for (init; cond; update) body`
    For {
        /// Initializer clause
        init: Option<ForInit>,
        /// Loop condition
        condition: Option<ExprId>,
        /// Update expressions
        update: Vec<ExprId>,
        /// Loop body
        body: Box<Stmt>,
    },
    /// Enhanced `for (T x : iterable) body`
    ForEach {
        /// `final` and annotations
        modifiers: Vec<Modifier>,
        /// Loop variable type
        ty: TypeRef,
        /// Loop variable name
        name: String,
        /// Collection or array expression
        iterable: ExprId,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `return [expr];`
    Return(Option<ExprId>),
    /// `break [label];`
    Break(Option<String>),
    /// `continue [label];`
    Continue(Option<String>),
    /// `throw expr;`
    Throw(ExprId),
    /// `label: stmt`
    Labeled {
        /// Label name
        label: String,
        /// Labeled statement
        body: Box<Stmt>,
    },
    /// `;`
    Empty,
}

/// Initializer clause of a classic `for` loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForInit {
    /// `int i = 0, j = 1`
    Decl {
        /// `final` and annotations
        modifiers: Vec<Modifier>,
        /// Declared type
        ty: TypeRef,
        /// Declared variables
        declarators: Vec<VarDeclarator>,
    },
    /// `i = 0, j = 1`
    Exprs(Vec<ExprId>),
}

/// Handle to an expression stored in an [`ExprArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(u32);

impl ExprId {
    /// Position of the node in its arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Flat storage for expression nodes.
///
/// Parents refer to children by [`ExprId`]. Replacing a node overwrites its
/// slot, so the parent keeps pointing at the same id and nothing else moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExprArena {
    nodes: Vec<Expr>,
}

impl ExprArena {
    /// Creates an empty arena
    pub fn new() -> Self {
        ExprArena { nodes: Vec::new() }
    }

    /// Store a node and return its id
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        id
    }

    /// Borrow the node behind `id`
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    /// Overwrite the node behind `id`, returning the previous node
    pub fn replace(&mut self, id: ExprId, expr: Expr) -> Expr {
        std::mem::replace(&mut self.nodes[id.index()], expr)
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node was allocated
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of `id` in evaluation order
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        match self.get(id) {
            Expr::Literal(_) | Expr::Name(_) | Expr::This => Vec::new(),
            Expr::FieldAccess { target, .. } => vec![*target],
            Expr::MethodCall { target, args, .. } => {
                target.iter().chain(args.iter()).copied().collect()
            }
            Expr::Binary { left, right, .. } => vec![*left, *right],
            Expr::Unary { operand, .. } => vec![*operand],
            Expr::Assign { target, value, .. } => vec![*target, *value],
            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
            } => vec![*condition, *then_expr, *else_expr],
            Expr::Cast { expr, .. } => vec![*expr],
            Expr::Paren(inner) => vec![*inner],
            Expr::ArrayAccess { array, index } => vec![*array, *index],
            Expr::NewObject { args, .. } => args.clone(),
            Expr::NewArray {
                dims, initializer, ..
            } => dims.iter().chain(initializer.iter()).copied().collect(),
            Expr::ArrayInit(elements) => elements.clone(),
        }
    }
}

impl Index<ExprId> for ExprArena {
    type Output = Expr;

    fn index(&self, id: ExprId) -> &Expr {
        self.get(id)
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Simple name: local, field or class
    Name(String),
    /// `this`
    This,
    /// `target.field`
    FieldAccess {
        /// Qualifier expression
        target: ExprId,
        /// Field name
        field: String,
    },
    /// `[target.]name(args)`
    MethodCall {
        /// Optional qualifier
        target: Option<ExprId>,
        /// Method name
        name: String,
        /// Arguments in order
        args: Vec<ExprId>,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: ExprId,
        /// Right operand
        right: ExprId,
    },
    /// Prefix or postfix unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: ExprId,
    },
    /// Plain (`=`) or compound (`+=`, ...) assignment
    Assign {
        /// Operator
        op: AssignOp,
        /// Assigned location
        target: ExprId,
        /// Assigned value
        value: ExprId,
    },
    /// `condition ? then_expr : else_expr`
    Conditional {
        /// Condition
        condition: ExprId,
        /// Value when true
        then_expr: ExprId,
        /// Value when false
        else_expr: ExprId,
    },
    /// `(T) expr`
    Cast {
        /// Target type
        ty: TypeRef,
        /// Converted expression
        expr: ExprId,
    },
    /// Parentheses written in the source
    Paren(ExprId),
    /// `array[index]`
    ArrayAccess {
        /// Array expression
        array: ExprId,
        /// Index expression
        index: ExprId,
    },
    /// `new T(args)`
    NewObject {
        /// Instantiated class
        class: TypeRef,
        /// Constructor arguments
        args: Vec<ExprId>,
    },
    /// `new T[n][m][]` or `new T[] { ... }`
    NewArray {
        /// Element type
        element: TypeRef,
        /// Sized dimensions
        dims: Vec<ExprId>,
        /// Unsized trailing dimensions
        extra_dims: usize,
        /// Optional [`Expr::ArrayInit`]
        initializer: Option<ExprId>,
    },
    /// `{ a, b, c }`
    ArrayInit(Vec<ExprId>),
}

/// Literal values, kept as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    /// `int` literal
    Int(String),
    /// `long` literal
    Long(String),
    /// `float` literal
    Float(String),
    /// `double` literal
    Double(String),
    /// `char` literal, text between quotes
    Char(String),
    /// String literal, text between quotes
    String(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,

    // Shifts
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,

    // Bitwise / non-short-circuit logical
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,

    // Logical
    /// `&&`
    And,
    /// `||`
    Or,

    // Comparison
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `++x`
    PreInc,
    /// `x++`
    PostInc,
    /// `--x`
    PreDec,
    /// `x--`
    PostDec,
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

impl UnaryOp {
    /// True for `x++` and `x--`
    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    RemAssign,
    /// `&=`
    AndAssign,
    /// `|=`
    OrAssign,
    /// `^=`
    XorAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `>>>=`
    UShrAssign,
}

/// Operator precedence levels, loosest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Assignment operators (right-associative)
    Assignment,
    /// `?:`
    Conditional,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `==`, `!=`
    Equality,
    /// `<`, `>`, `<=`, `>=`
    Relational,
    /// `<<`, `>>`, `>>>`
    Shift,
    /// `+`, `-`
    Additive,
    /// `*`, `/`, `%`
    Multiplicative,
    /// Prefix operators and casts
    Unary,
    /// Postfix `++`/`--`
    Postfix,
    /// Literals, names, calls, field and array access
    Primary,
}

impl BinaryOp {
    /// Returns the precedence level of this binary operator
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::Or => Precedence::Or,
            BinaryOp::And => Precedence::And,
            BinaryOp::BitOr => Precedence::BitOr,
            BinaryOp::BitXor => Precedence::BitXor,
            BinaryOp::BitAnd => Precedence::BitAnd,
            BinaryOp::Eq | BinaryOp::Ne => Precedence::Equality,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => Precedence::Relational,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => Precedence::Shift,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Additive,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => Precedence::Multiplicative,
        }
    }
}

impl Expr {
    /// Precedence of the construct this node prints as
    pub fn precedence(&self) -> Precedence {
        match self {
            Expr::Assign { .. } => Precedence::Assignment,
            Expr::Conditional { .. } => Precedence::Conditional,
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { op, .. } if op.is_postfix() => Precedence::Postfix,
            Expr::Unary { .. } | Expr::Cast { .. } => Precedence::Unary,
            _ => Precedence::Primary,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        };
        f.write_str(s)
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
            AssignOp::AndAssign => "&=",
            AssignOp::OrAssign => "|=",
            AssignOp::XorAssign => "^=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Void => "void",
        };
        f.write_str(s)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Class { name, args } => {
                write!(f, "{}", name)?;
                if args.as_slice() == [TypeRef::Inferred] {
                    write!(f, "<>")?;
                } else if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            TypeRef::Array(elem) => write!(f, "{}[]", elem),
            TypeRef::Inferred => write!(f, "var"),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
            Modifier::Synchronized => "synchronized",
            Modifier::Native => "native",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Annotation(name) => return write!(f, "@{}", name),
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        assert!(BinaryOp::Add.precedence() > BinaryOp::And.precedence());
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Shl.precedence() < BinaryOp::Sub.precedence());
        assert!(Precedence::Assignment < Precedence::Conditional);
    }

    #[test]
    fn test_replace_keeps_id() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(Expr::Name("a".to_string()));
        let b = arena.alloc(Expr::Name("b".to_string()));
        let sum = arena.alloc(Expr::Binary {
            op: BinaryOp::Add,
            left: a,
            right: b,
        });

        let old = arena.replace(sum, Expr::Paren(a));
        assert!(matches!(old, Expr::Binary { .. }));
        assert_eq!(arena[sum], Expr::Paren(a));
        assert_eq!(arena.children(sum), vec![a]);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_children_order() {
        let mut arena = ExprArena::new();
        let target = arena.alloc(Expr::Name("Math".to_string()));
        let x = arena.alloc(Expr::Name("x".to_string()));
        let y = arena.alloc(Expr::Name("y".to_string()));
        let call = arena.alloc(Expr::MethodCall {
            target: Some(target),
            name: "max".to_string(),
            args: vec![x, y],
        });
        assert_eq!(arena.children(call), vec![target, x, y]);
    }

    #[test]
    fn test_type_ref_display() {
        let list = TypeRef::Class {
            name: "List".to_string(),
            args: vec![TypeRef::Class {
                name: "Integer".to_string(),
                args: vec![],
            }],
        };
        assert_eq!(list.to_string(), "List<Integer>");
        assert_eq!(
            TypeRef::Primitive(PrimitiveType::Int).with_dims(2).to_string(),
            "int[][]"
        );
    }
}
