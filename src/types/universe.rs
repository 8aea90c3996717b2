//! Read-only table of known classes and their members.
//!
//! A universe file is JSON:
//!
//! ```json
//! {
//!   "classes": [
//!     {
//!       "name": "Counter",
//!       "fields": [{ "name": "LIMIT", "type": "int", "static": true }],
//!       "methods": [
//!         { "name": "next", "arity": 0, "returns": { "fixed": "long" } },
//!         { "name": "clamp", "arity": 2, "returns": "promoted" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use super::Type;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// How a method's result type is derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnRule {
    /// Always this type
    Fixed(Type),
    /// Binary numeric promotion of all arguments (`Math.max`, `Math.addExact`)
    Promoted,
    /// Type of the first argument
    FirstArg,
}

/// Field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: Type,
    /// Accessible through the class name
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// Method declaration (one entry per overload arity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Number of parameters, `None` for any
    #[serde(default)]
    pub arity: Option<usize>,
    /// Result type rule
    pub returns: ReturnRule,
    /// Callable through the class name
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl MethodInfo {
    fn accepts(&self, args: usize) -> bool {
        self.arity.map_or(true, |arity| arity == args)
    }
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Class name as used in source
    pub name: String,
    /// Direct superclass, `Object` when absent
    #[serde(default)]
    pub superclass: Option<String>,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    /// Creates an empty class extending `Object`
    pub fn new(name: impl Into<String>) -> Self {
        ClassInfo {
            name: name.into(),
            superclass: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn field(mut self, name: &str, ty: Type, is_static: bool) -> Self {
        self.fields.push(FieldInfo {
            name: name.to_string(),
            ty,
            is_static,
        });
        self
    }

    fn method(mut self, name: &str, arity: Option<usize>, returns: ReturnRule) -> Self {
        self.methods.push(MethodInfo {
            name: name.to_string(),
            arity,
            returns,
            is_static: false,
        });
        self
    }

    fn static_method(mut self, name: &str, arity: Option<usize>, returns: ReturnRule) -> Self {
        self.methods.push(MethodInfo {
            name: name.to_string(),
            arity,
            returns,
            is_static: true,
        });
        self
    }
}

const CHECKED_METHODS: [(&str, usize); 6] = [
    ("addExact", 2),
    ("subtractExact", 2),
    ("multiplyExact", 2),
    ("incrementExact", 1),
    ("decrementExact", 1),
    ("negateExact", 1),
];

#[derive(Deserialize)]
struct UniverseFile {
    classes: Vec<ClassInfo>,
}

/// Known classes, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassUniverse {
    classes: BTreeMap<String, ClassInfo>,
}

impl ClassUniverse {
    /// Creates an empty universe
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in `java.lang` subset
    pub fn java_lang() -> Self {
        use ReturnRule::{Fixed, Promoted};

        let string = || Type::class("String");
        let mut universe = ClassUniverse::new();

        universe.insert(
            ClassInfo::new("Object")
                .method("toString", Some(0), Fixed(string()))
                .method("hashCode", Some(0), Fixed(Type::Int))
                .method("equals", Some(1), Fixed(Type::Boolean))
                .method("getClass", Some(0), Fixed(Type::class("Class"))),
        );

        for name in ["Math", "StrictMath"] {
            let mut math = ClassInfo::new(name)
                .field("PI", Type::Double, true)
                .field("E", Type::Double, true)
                .static_method("toIntExact", Some(1), Fixed(Type::Int))
                .static_method("round", Some(1), Fixed(Type::Long))
                .static_method("random", Some(0), Fixed(Type::Double));
            for promoted in [
                "abs",
                "max",
                "min",
                "addExact",
                "subtractExact",
                "multiplyExact",
                "incrementExact",
                "decrementExact",
                "negateExact",
                "floorDiv",
                "floorMod",
                "signum",
            ] {
                math = math.static_method(promoted, None, Promoted);
            }
            for double in [
                "sqrt", "cbrt", "pow", "exp", "log", "log10", "sin", "cos", "tan", "floor",
                "ceil", "hypot",
            ] {
                math = math.static_method(double, None, Fixed(Type::Double));
            }
            universe.insert(math);
        }

        universe.insert(
            ClassInfo::new("System")
                .field("out", Type::class("PrintStream"), true)
                .field("err", Type::class("PrintStream"), true)
                .static_method("currentTimeMillis", Some(0), Fixed(Type::Long))
                .static_method("nanoTime", Some(0), Fixed(Type::Long))
                .static_method("identityHashCode", Some(1), Fixed(Type::Int))
                .static_method("arraycopy", Some(5), Fixed(Type::Void))
                .static_method("exit", Some(1), Fixed(Type::Void))
                .static_method("getProperty", None, Fixed(string()))
                .static_method("lineSeparator", Some(0), Fixed(string())),
        );

        universe.insert(
            ClassInfo::new("PrintStream")
                .method("println", None, Fixed(Type::Void))
                .method("print", None, Fixed(Type::Void))
                .method("printf", None, Fixed(Type::class("PrintStream")))
                .method("flush", Some(0), Fixed(Type::Void)),
        );

        universe.insert(
            ClassInfo::new("String")
                .method("length", Some(0), Fixed(Type::Int))
                .method("charAt", Some(1), Fixed(Type::Char))
                .method("isEmpty", Some(0), Fixed(Type::Boolean))
                .method("substring", None, Fixed(string()))
                .method("indexOf", None, Fixed(Type::Int))
                .method("lastIndexOf", None, Fixed(Type::Int))
                .method("contains", Some(1), Fixed(Type::Boolean))
                .method("startsWith", None, Fixed(Type::Boolean))
                .method("endsWith", Some(1), Fixed(Type::Boolean))
                .method("compareTo", Some(1), Fixed(Type::Int))
                .method("concat", Some(1), Fixed(string()))
                .method("trim", Some(0), Fixed(string()))
                .method("toUpperCase", None, Fixed(string()))
                .method("toLowerCase", None, Fixed(string()))
                .method("split", None, Fixed(string().with_dims(1)))
                .method("toCharArray", Some(0), Fixed(Type::Char.with_dims(1)))
                .static_method("valueOf", Some(1), Fixed(string()))
                .static_method("format", None, Fixed(string())),
        );

        for (wrapper, primitive, parse) in [
            ("Integer", Type::Int, "parseInt"),
            ("Long", Type::Long, "parseLong"),
        ] {
            universe.insert(
                ClassInfo::new(wrapper)
                    .field("MAX_VALUE", primitive.clone(), true)
                    .field("MIN_VALUE", primitive.clone(), true)
                    .field("SIZE", Type::Int, true)
                    .static_method(parse, None, Fixed(primitive.clone()))
                    .static_method("valueOf", None, Fixed(Type::class(wrapper)))
                    .static_method("toString", None, Fixed(string()))
                    .static_method("toHexString", Some(1), Fixed(string()))
                    .static_method("toBinaryString", Some(1), Fixed(string()))
                    .static_method("compare", Some(2), Fixed(Type::Int))
                    .static_method("signum", Some(1), Fixed(Type::Int))
                    .static_method("bitCount", Some(1), Fixed(Type::Int))
                    .static_method("sum", Some(2), Fixed(primitive.clone()))
                    .static_method("max", Some(2), Fixed(primitive.clone()))
                    .static_method("min", Some(2), Fixed(primitive.clone()))
                    .method("intValue", Some(0), Fixed(Type::Int))
                    .method("longValue", Some(0), Fixed(Type::Long))
                    .method("doubleValue", Some(0), Fixed(Type::Double))
                    .method("compareTo", Some(1), Fixed(Type::Int)),
            );
        }

        let builder = || Type::class("StringBuilder");
        universe.insert(
            ClassInfo::new("StringBuilder")
                .method("append", Some(1), Fixed(builder()))
                .method("insert", Some(2), Fixed(builder()))
                .method("reverse", Some(0), Fixed(builder()))
                .method("length", Some(0), Fixed(Type::Int))
                .method("charAt", Some(1), Fixed(Type::Char))
                .method("setLength", Some(1), Fixed(Type::Void))
                .method("toString", Some(0), Fixed(string())),
        );

        universe
    }

    /// Parse a universe from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let file: UniverseFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidUniverse(e.to_string()))?;

        let mut universe = ClassUniverse::new();
        for class in file.classes {
            if class.name.is_empty() {
                return Err(Error::InvalidUniverse("class with empty name".to_string()));
            }
            universe.insert(class);
        }
        Ok(universe)
    }

    /// Read a universe file from disk
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::from_json(&json)
    }

    /// Add (or replace) a class
    pub fn insert(&mut self, class: ClassInfo) {
        self.classes.insert(class.name.clone(), class);
    }

    /// Add every class from `other`, replacing same-named ones
    pub fn merge(&mut self, other: ClassUniverse) {
        self.classes.extend(other.classes);
    }

    /// Make sure `name` exists and declares the static `*Exact` methods,
    /// so calls produced by earlier passes stay resolvable.
    pub fn with_checked_class(mut self, name: &str) -> Self {
        let key = match self.get(name) {
            Some(class) => class.name.clone(),
            None => {
                self.insert(ClassInfo::new(name));
                name.to_string()
            }
        };

        if let Some(class) = self.classes.get_mut(&key) {
            for (method, arity) in CHECKED_METHODS {
                let declared = class
                    .methods
                    .iter()
                    .any(|m| m.name == method && m.accepts(arity));
                if !declared {
                    class.methods.push(MethodInfo {
                        name: method.to_string(),
                        arity: Some(arity),
                        returns: ReturnRule::Promoted,
                        is_static: true,
                    });
                }
            }
        }
        self
    }

    /// Number of known classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if no class is known
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Find a class by exact, `java.lang`-stripped, or simple name
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        if let Some(class) = self.classes.get(name) {
            return Some(class);
        }
        let simple = name.rsplit('.').next().unwrap_or(name);
        self.classes.get(simple).or_else(|| {
            self.classes
                .values()
                .find(|class| class.name.rsplit('.').next() == Some(simple))
        })
    }

    /// Check if a class is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Superclass chain starting at `name`, ending at `Object` when it is known
    fn ancestry(&self, name: &str) -> Vec<&ClassInfo> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.get(name);

        while let Some(class) = current {
            if !seen.insert(class.name.as_str()) {
                break;
            }
            chain.push(class);
            current = match &class.superclass {
                Some(parent) => self.get(parent),
                None if class.name != "Object" => self.get("Object"),
                None => None,
            };
        }
        chain
    }

    /// Look up a field on `class` or its superclasses
    pub fn lookup_field(&self, class: &str, field: &str) -> Option<&FieldInfo> {
        self.ancestry(class)
            .into_iter()
            .find_map(|c| c.fields.iter().find(|f| f.name == field))
    }

    /// Look up a method by name and argument count on `class`, its superclasses or `Object`
    pub fn lookup_method(&self, class: &str, method: &str, args: usize) -> Option<&MethodInfo> {
        let found = self
            .ancestry(class)
            .into_iter()
            .find_map(|c| c.methods.iter().find(|m| m.name == method && m.accepts(args)));

        found.or_else(|| {
            self.classes
                .get("Object")
                .and_then(|o| o.methods.iter().find(|m| m.name == method && m.accepts(args)))
        })
    }
}
