use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// True when `next` starts immediately after this token on the same line.
    ///
    /// The scanner emits every `>` on its own so that nested generic arguments
    /// close cleanly; the parser glues adjacent ones back into shift operators.
    pub fn is_adjacent_to(&self, next: &Token) -> bool {
        self.line == next.line && self.column + self.lexeme.chars().count() == next.column
    }
}

/// All possible token types in the supported Java subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals (source text is kept verbatim so the printer can echo it)
    /// Integer literal (`42`, `0x2A`, `1_000`)
    Integer(String),
    /// Long literal (`42L`)
    Long(String),
    /// Float literal (`1.5f`)
    Float(String),
    /// Double literal (`1.5`, `1e3`, `2d`)
    Double(String),
    /// Character literal, text between the quotes
    Char(String),
    /// String literal, text between the quotes with escapes untouched
    String(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    /// Identifier
    Identifier(String),

    // Declaration keywords
    /// `package`
    Package,
    /// `import`
    Import,
    /// `class`
    Class,
    /// `extends`
    Extends,
    /// `implements`
    Implements,
    /// `throws`
    Throws,

    // Modifiers
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

    // Primitive type keywords
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `char`
    CharKw,
    /// `int`
    Int,
    /// `long`
    LongKw,
    /// `float`
    FloatKw,
    /// `double`
    DoubleKw,
    /// `boolean`
    Boolean,
    /// `void`
    Void,

    // Statement keywords
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `do`
    Do,
    /// `for`
    For,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `throw`
    Throw,

    // Expression keywords
    /// `new`
    New,
    /// `this`
    This,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>` (always single, see [`Token::is_adjacent_to`])
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `<<`
    Shl,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `%=`
    PercentAssign,
    /// `&=`
    AmpAssign,
    /// `|=`
    PipeAssign,
    /// `^=`
    CaretAssign,
    /// `<<=`
    ShlAssign,
    /// `?`
    Question,
    /// `:`
    Colon,

    // Delimiters
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `;`
    Semicolon,
    /// `@`
    At,

    // Special
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Map a reserved word to its token kind
    pub fn keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "package" => TokenKind::Package,
            "import" => TokenKind::Import,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "implements" => TokenKind::Implements,
            "throws" => TokenKind::Throws,
            "public" => TokenKind::Public,
            "protected" => TokenKind::Protected,
            "private" => TokenKind::Private,
            "static" => TokenKind::Static,
            "final" => TokenKind::Final,
            "abstract" => TokenKind::Abstract,
            "synchronized" => TokenKind::Synchronized,
            "native" => TokenKind::Native,
            "transient" => TokenKind::Transient,
            "volatile" => TokenKind::Volatile,
            "strictfp" => TokenKind::Strictfp,
            "byte" => TokenKind::Byte,
            "short" => TokenKind::Short,
            "char" => TokenKind::CharKw,
            "int" => TokenKind::Int,
            "long" => TokenKind::LongKw,
            "float" => TokenKind::FloatKw,
            "double" => TokenKind::DoubleKw,
            "boolean" => TokenKind::Boolean,
            "void" => TokenKind::Void,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "throw" => TokenKind::Throw,
            "new" => TokenKind::New,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    /// Check if token is a declaration modifier
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Static
                | TokenKind::Final
                | TokenKind::Abstract
                | TokenKind::Synchronized
                | TokenKind::Native
                | TokenKind::Transient
                | TokenKind::Volatile
                | TokenKind::Strictfp
        )
    }

    /// Check if token names a primitive type (including `void`)
    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Byte
                | TokenKind::Short
                | TokenKind::CharKw
                | TokenKind::Int
                | TokenKind::LongKw
                | TokenKind::FloatKw
                | TokenKind::DoubleKw
                | TokenKind::Boolean
                | TokenKind::Void
        )
    }

    /// Check if token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Integer(_)
                | TokenKind::Long(_)
                | TokenKind::Float(_)
                | TokenKind::Double(_)
                | TokenKind::Char(_)
                | TokenKind::String(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n)
            | TokenKind::Long(n)
            | TokenKind::Float(n)
            | TokenKind::Double(n) => write!(f, "{}", n),
            TokenKind::Char(c) => write!(f, "'{}'", c),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("int"), Some(TokenKind::Int));
        assert_eq!(TokenKind::keyword("while"), Some(TokenKind::While));
        assert_eq!(TokenKind::keyword("var"), None);
        assert_eq!(TokenKind::keyword("Math"), None);
    }

    #[test]
    fn test_token_classes() {
        assert!(TokenKind::Static.is_modifier());
        assert!(!TokenKind::Int.is_modifier());
        assert!(TokenKind::LongKw.is_primitive_type());
        assert!(TokenKind::Long("1L".to_string()).is_literal());
        assert!(!TokenKind::Identifier("x".to_string()).is_literal());
    }

    #[test]
    fn test_adjacency() {
        let a = Token::new(TokenKind::Gt, ">".to_string(), 3, 10);
        let b = Token::new(TokenKind::Gt, ">".to_string(), 3, 11);
        let c = Token::new(TokenKind::Gt, ">".to_string(), 3, 13);
        assert!(a.is_adjacent_to(&b));
        assert!(!b.is_adjacent_to(&c));
    }
}
