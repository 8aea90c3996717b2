//! # Java Expression Types
//!
//! Static types for the Java subset, just detailed enough to decide whether an
//! arithmetic node works on `int` or `long` operands.
//!
//! ## Numeric Promotion
//!
//! Operator result types follow the Java rules:
//!
//! ```java
//! byte b; short s; char c;
//! b + s      // int   (unary promotion of both sides)
//! 1 + 2L     // long  (binary promotion)
//! 1 + 2.0f   // float
//! "n=" + 1   // String
//! ```
//!
//! Boxed `Integer`/`Long`/... operands are unboxed before promotion. A boxed
//! operand is never overflow-relevant on its own: `Integer a; a += 1` keeps
//! its shape.
//!
//! ## Class Universe
//!
//! Member lookups go through a [`ClassUniverse`], an explicit table of known
//! classes. The built-in table covers the `java.lang` classes that ordinary
//! test programs touch; more can be loaded from JSON.

pub mod resolver;
pub mod universe;

pub use resolver::TypeResolver;
pub use universe::{ClassInfo, ClassUniverse, FieldInfo, MethodInfo, ReturnRule};

use crate::error::{Error, Result};
use crate::parser::ast::{PrimitiveType, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved static type of an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    // === Primitives ===
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 16-bit unsigned character
    Char,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// `boolean`
    Boolean,
    /// `void` (method results only)
    Void,

    // === References ===
    /// Type of the `null` literal
    Null,
    /// Class or interface, by the name it was written with (`java.lang.` dropped)
    Class(String),
    /// `T[]`
    Array(Box<Type>),
}

impl Type {
    /// Parse a type from its Java spelling (`int`, `long[]`, `String`)
    pub fn from_name(name: &str) -> Result<Type> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return Ok(Type::Array(Box::new(Type::from_name(element)?)));
        }

        let ty = match name {
            "byte" => Type::Byte,
            "short" => Type::Short,
            "char" => Type::Char,
            "int" => Type::Int,
            "long" => Type::Long,
            "float" => Type::Float,
            "double" => Type::Double,
            "boolean" => Type::Boolean,
            "void" => Type::Void,
            "null" => Type::Null,
            "" => return Err(Error::InvalidUniverse("empty type name".to_string())),
            other => {
                let valid = other
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(is_java_ident_char));
                if !valid {
                    return Err(Error::InvalidUniverse(format!(
                        "invalid type name `{}`",
                        other
                    )));
                }
                Type::class(other)
            }
        };
        Ok(ty)
    }

    /// Class type, normalizing `java.lang.X` to `X`
    pub fn class(name: &str) -> Type {
        let name = name.strip_prefix("java.lang.").unwrap_or(name);
        Type::Class(name.to_string())
    }

    /// Convert a written type reference. `var` has no type of its own.
    pub fn from_ref(ty: &TypeRef) -> Option<Type> {
        match ty {
            TypeRef::Primitive(p) => Some(Type::from_primitive(*p)),
            TypeRef::Class { name, .. } => Some(Type::class(name)),
            TypeRef::Array(element) => {
                Type::from_ref(element).map(|element| Type::Array(Box::new(element)))
            }
            TypeRef::Inferred => None,
        }
    }

    /// Convert a primitive keyword
    pub fn from_primitive(p: PrimitiveType) -> Type {
        match p {
            PrimitiveType::Byte => Type::Byte,
            PrimitiveType::Short => Type::Short,
            PrimitiveType::Char => Type::Char,
            PrimitiveType::Int => Type::Int,
            PrimitiveType::Long => Type::Long,
            PrimitiveType::Float => Type::Float,
            PrimitiveType::Double => Type::Double,
            PrimitiveType::Boolean => Type::Boolean,
            PrimitiveType::Void => Type::Void,
        }
    }

    /// Wrap in `dims` array levels
    pub fn with_dims(self, dims: usize) -> Type {
        (0..dims).fold(self, |ty, _| Type::Array(Box::new(ty)))
    }

    /// True exactly for primitive `int` and `long`
    pub fn is_overflow_relevant(&self) -> bool {
        matches!(self, Type::Int | Type::Long)
    }

    /// Check if this type is a primitive numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Byte
                | Type::Short
                | Type::Char
                | Type::Int
                | Type::Long
                | Type::Float
                | Type::Double
        )
    }

    /// Check if this is `String`
    pub fn is_string(&self) -> bool {
        matches!(self, Type::Class(name) if name == "String")
    }

    /// Primitive counterpart of a wrapper class, or the type itself
    pub fn unboxed(&self) -> Type {
        match self {
            Type::Class(name) => match name.as_str() {
                "Byte" => Type::Byte,
                "Short" => Type::Short,
                "Character" => Type::Char,
                "Integer" => Type::Int,
                "Long" => Type::Long,
                "Float" => Type::Float,
                "Double" => Type::Double,
                "Boolean" => Type::Boolean,
                _ => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Unary numeric promotion: `byte`/`short`/`char` widen to `int`
    pub fn unary_promotion(&self) -> Option<Type> {
        match self.unboxed() {
            Type::Byte | Type::Short | Type::Char | Type::Int => Some(Type::Int),
            ty @ (Type::Long | Type::Float | Type::Double) => Some(ty),
            _ => None,
        }
    }

    /// Binary numeric promotion of two operands
    pub fn binary_promotion(left: &Type, right: &Type) -> Option<Type> {
        let left = left.unary_promotion()?;
        let right = right.unary_promotion()?;
        let ty = if left == Type::Double || right == Type::Double {
            Type::Double
        } else if left == Type::Float || right == Type::Float {
            Type::Float
        } else if left == Type::Long || right == Type::Long {
            Type::Long
        } else {
            Type::Int
        };
        Some(ty)
    }

    /// Get the element type for array types
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }
}

fn is_java_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Byte => write!(f, "byte"),
            Type::Short => write!(f, "short"),
            Type::Char => write!(f, "char"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Boolean => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array(element) => write!(f, "{}[]", element),
        }
    }
}

impl TryFrom<String> for Type {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        Type::from_name(&name)
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> String {
        ty.to_string()
    }
}
