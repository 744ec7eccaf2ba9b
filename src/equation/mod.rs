//! Equation discovery and normalization.
//!
//! - [`scanner`] finds inline macros (`stem:[...]`, `latexmath:[...]`,
//!   `asciimath:[...]`) in a text span and rewrites them.
//! - [`normalize`] turns a payload into the delimited LaTeX handed to the engine.
//! - [`asciimath`] translates AsciiMath to LaTeX.

pub mod asciimath;
pub mod normalize;
pub mod scanner;

pub use normalize::{normalize, NormalizedEquation};
pub use scanner::{InlineScanner, Rewrite};

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Notation language of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// LaTeX math
    Latex,
    /// AsciiMath
    #[default]
    AsciiMath,
}

impl Dialect {
    /// Resolve the document-wide default from the `stem` attribute.
    ///
    /// `latexmath`, `latex` and `tex` select LaTeX; anything else, including an
    /// unset attribute, selects AsciiMath.
    pub fn from_stem_attr(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("latexmath") | Some("latex") | Some("tex") => Dialect::Latex,
            _ => Dialect::AsciiMath,
        }
    }

    /// Resolve a math block style (`latexmath`, `asciimath`, `stem`).
    ///
    /// Returns `None` for styles that are not math notations.
    pub fn from_style(style: &str, default: Dialect) -> Option<Self> {
        match style {
            "latexmath" => Some(Dialect::Latex),
            "asciimath" => Some(Dialect::AsciiMath),
            "stem" => Some(default),
            _ => None,
        }
    }

    /// Canonical style name.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Latex => "latexmath",
            Dialect::AsciiMath => "asciimath",
        }
    }
}

/// The macro name an inline occurrence was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroKind {
    /// Generic `stem:`; defers to the document default
    Stem,
    /// Explicit `latexmath:`
    Latexmath,
    /// Explicit `asciimath:`
    Asciimath,
}

impl MacroKind {
    /// Look up a macro by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stem" => Some(MacroKind::Stem),
            "latexmath" => Some(MacroKind::Latexmath),
            "asciimath" => Some(MacroKind::Asciimath),
            _ => None,
        }
    }

    /// Resolve the dialect, deferring to `default` for the generic macro.
    pub fn dialect(&self, default: Dialect) -> Dialect {
        match self {
            MacroKind::Stem => default,
            MacroKind::Latexmath => Dialect::Latex,
            MacroKind::Asciimath => Dialect::AsciiMath,
        }
    }
}

/// A single inline macro occurrence found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquationExpression {
    /// Macro name used
    pub kind: MacroKind,

    /// Resolved notation
    pub dialect: Dialect,

    /// Raw payload between the brackets
    pub payload: String,

    /// Bracketed substitution list, if any (`c,a` in `stem:c,a[...]`)
    pub subs: Option<String>,

    /// Whether the occurrence was written inline (always true for macros)
    pub inline: bool,

    /// Whether the occurrence was preceded by a backslash
    pub escaped: bool,

    /// Byte range of the whole occurrence in the scanned text
    pub span: Range<usize>,
}

impl EquationExpression {
    /// Whether the payload is blank after trimming trailing whitespace.
    pub fn is_blank(&self) -> bool {
        self.payload.trim_end().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_stem_attr() {
        assert_eq!(Dialect::from_stem_attr(Some("latexmath")), Dialect::Latex);
        assert_eq!(Dialect::from_stem_attr(Some("tex")), Dialect::Latex);
        assert_eq!(Dialect::from_stem_attr(Some("asciimath")), Dialect::AsciiMath);
        assert_eq!(Dialect::from_stem_attr(Some("")), Dialect::AsciiMath);
        assert_eq!(Dialect::from_stem_attr(None), Dialect::AsciiMath);
    }

    #[test]
    fn test_dialect_from_style() {
        assert_eq!(
            Dialect::from_style("stem", Dialect::Latex),
            Some(Dialect::Latex)
        );
        assert_eq!(
            Dialect::from_style("asciimath", Dialect::Latex),
            Some(Dialect::AsciiMath)
        );
        assert_eq!(Dialect::from_style("source", Dialect::Latex), None);
    }

    #[test]
    fn test_macro_kind_overrides_default() {
        assert_eq!(MacroKind::Stem.dialect(Dialect::Latex), Dialect::Latex);
        assert_eq!(
            MacroKind::Latexmath.dialect(Dialect::AsciiMath),
            Dialect::Latex
        );
        assert_eq!(
            MacroKind::Asciimath.dialect(Dialect::Latex),
            Dialect::AsciiMath
        );
    }
}
