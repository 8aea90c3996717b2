//! Source-to-source entry point: parse, rewrite to a fixed point, print.

use crate::error::{Error, Result};
use crate::lexer::Scanner;
use crate::overflow::{FixedPointDriver, NodeRewriter, PassReport};
use crate::parser::{print_unit, CompilationUnit, JavaParser};
use crate::types::ClassUniverse;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// What to do when an operand's type cannot be determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Abort the transformation of the unit (default)
    #[default]
    Fail,
    /// Log a warning and leave the node unchanged
    Skip,
}

/// Transformation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Class whose static `*Exact` methods the rewritten code calls
    pub checked_class: String,
    /// Handling of unresolvable operands
    pub unresolved: UnresolvedPolicy,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            checked_class: "Math".to_string(),
            unresolved: UnresolvedPolicy::Fail,
        }
    }
}

impl TransformOptions {
    /// Check that the options can produce valid Java
    pub fn validate(&self) -> Result<()> {
        let valid = !self.checked_class.is_empty()
            && self.checked_class.split('.').all(|part| {
                let mut chars = part.chars();
                matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
                    && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidOptions(format!(
                "`{}` is not a class name",
                self.checked_class
            )))
        }
    }
}

/// Rewritten source with pass statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Canonical text of the rewritten unit
    pub source: String,
    /// Passes and rewrites performed
    pub report: PassReport,
}

/// Rewrites overflow-prone arithmetic in Java source
pub struct Transformer {
    universe: ClassUniverse,
    options: TransformOptions,
}

impl Transformer {
    /// Create a transformer over the built-in `java.lang` classes
    pub fn new(options: TransformOptions) -> Self {
        Self::with_universe(ClassUniverse::java_lang(), options)
    }

    /// Create a transformer over a caller-supplied class universe
    pub fn with_universe(universe: ClassUniverse, options: TransformOptions) -> Self {
        let universe = universe.with_checked_class(&options.checked_class);
        Self { universe, options }
    }

    /// The options in effect
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// The class universe in effect
    pub fn universe(&self) -> &ClassUniverse {
        &self.universe
    }

    /// Parse source text into a compilation unit
    pub fn parse(&self, source: &str) -> Result<CompilationUnit> {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens()?;
        let mut parser = JavaParser::new(tokens);
        parser.parse()
    }

    /// Rewrite a parsed unit in place
    pub fn transform_unit(&self, unit: &mut CompilationUnit) -> Result<PassReport> {
        self.options.validate()?;
        let rewriter = NodeRewriter::new(self.options.checked_class.clone());
        let driver = FixedPointDriver::new(&self.universe, rewriter, self.options.unresolved);
        driver.run(unit)
    }

    /// Rewrite source text, returning the printed result
    pub fn transform_source(&self, source: &str) -> Result<TransformOutput> {
        // Phase 1: Parse
        let mut unit = self.parse(source)?;
        tracing::debug!(
            types = unit.types.len(),
            nodes = unit.arena.len(),
            "parsed compilation unit"
        );

        // Phase 2: Rewrite to a fixed point
        let report = self.transform_unit(&mut unit)?;

        // Phase 3: Print
        Ok(TransformOutput {
            source: print_unit(&unit),
            report,
        })
    }

    /// Read a unit from `reader` and write the rewritten text to `writer`.
    ///
    /// Nothing is written when reading, parsing or rewriting fails.
    pub fn transform<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<PassReport> {
        let mut source = String::new();
        reader
            .read_to_string(&mut source)
            .map_err(|e| Error::io("<input>", e))?;

        let output = self.transform_source(&source)?;

        writer
            .write_all(output.source.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io("<output>", e))?;
        Ok(output.report)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(TransformOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TransformOptions::default();
        assert_eq!(options.checked_class, "Math");
        assert_eq!(options.unresolved, UnresolvedPolicy::Fail);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_checked_class() {
        let transformer = Transformer::new(TransformOptions {
            checked_class: "not a class".to_string(),
            ..TransformOptions::default()
        });
        let err = transformer
            .transform_source("class T { void m() { int a = 1 + 2; } }")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOptions(_)));
    }

    #[test]
    fn test_custom_checked_class_is_resolvable() {
        let transformer = Transformer::new(TransformOptions {
            checked_class: "com.acme.SafeMath".to_string(),
            ..TransformOptions::default()
        });
        let output = transformer
            .transform_source("class T { void m() { long a = 1 + 2 + 3L; } }")
            .unwrap();
        assert!(output.source.contains(
            "long a = com.acme.SafeMath.addExact(com.acme.SafeMath.addExact(1, 2), 3L);"
        ));
    }

    #[test]
    fn test_reader_writer() {
        let transformer = Transformer::default();
        let mut out = Vec::new();
        let report = transformer
            .transform(
                "class T { void m() { int a = 0; a++; } }".as_bytes(),
                &mut out,
            )
            .unwrap();
        assert_eq!(report.rewrites, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("a = Math.incrementExact(a);"));
    }

    #[test]
    fn test_nothing_written_on_error() {
        let transformer = Transformer::default();
        let mut out = Vec::new();
        let result = transformer.transform("class T { void m() { x + 1; } }".as_bytes(), &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_options_serde() {
        let json = r#"{ "checked_class": "StrictMath", "unresolved": "skip" }"#;
        let options: TransformOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.unresolved, UnresolvedPolicy::Skip);
        assert_eq!(options.checked_class, "StrictMath");
    }
}
