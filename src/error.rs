//! Error types for the overflow rewriter

use thiserror::Error;

/// Rewriter errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Parse errors
    /// Syntax error encountered during parsing
    ///
    /// **Triggered by:** Source that is not valid for the supported Java subset
    /// **Example:** `int a = ;` (missing initializer expression)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// General parse error (lexical problems such as an unterminated string)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unexpected end of file during parsing
    #[error("Unexpected end of file")]
    UnexpectedEof,

    // Type resolution errors
    /// Reference to a name that is neither a local, a field nor a known class
    ///
    /// **Triggered by:** `undefined + 1` where `undefined` was never declared
    #[error("Cannot resolve symbol: {name}")]
    UnresolvedSymbol {
        /// Symbol name
        name: String,
    },

    /// Reference to a field or method the owning type does not declare
    ///
    /// **Triggered by:** `Math.nope(1)` or `System.missing`
    #[error("Cannot resolve member {member} of {owner}")]
    UnresolvedMember {
        /// Type the member was looked up on
        owner: String,
        /// Field or method name
        member: String,
    },

    /// An expression whose type cannot be computed for another reason
    #[error("Type resolution failed: {0}")]
    TypeResolution(String),

    /// Class universe file could not be read
    #[error("Invalid class universe: {0}")]
    InvalidUniverse(String),

    /// Transformer options that cannot produce valid Java
    ///
    /// **Triggered by:** `--checked-class "not a name"`
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    // I/O errors
    /// Reading or writing an input failed
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path (or `<stdin>`/`<stdout>`) of the failing stream
        path: String,
        /// Underlying error message
        message: String,
    },
}

impl Error {
    /// Create an I/O error for a path
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// True for errors raised while computing the static type of an expression
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedSymbol { .. }
                | Error::UnresolvedMember { .. }
                | Error::TypeResolution(_)
        )
    }

    /// True for errors raised by the scanner or the parser
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Error::SyntaxError { .. } | Error::ParseError(_) | Error::UnexpectedEof
        )
    }
}

/// Result type for rewriter operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = Error::UnresolvedSymbol {
            name: "x".to_string(),
        };
        assert!(err.is_resolution());
        assert!(!err.is_parse());

        let err = Error::SyntaxError {
            line: 1,
            col: 2,
            message: "bad".to_string(),
        };
        assert!(err.is_parse());
        assert_eq!(err.to_string(), "Syntax error at line 1, column 2: bad");
    }
}
