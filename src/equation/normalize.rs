//! Equation normalization: payload text to delimited LaTeX input.

use super::{asciimath, Dialect};
use crate::subs::SubstitutionSet;
use std::collections::BTreeMap;

/// A payload ready for the math engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEquation {
    /// Canonical LaTeX, without delimiters
    pub latex: String,

    /// Delimited input: `$...$` inline, `$$...$$` display
    pub input: String,

    /// Whether the equation is typeset inline
    pub inline: bool,
}

/// Normalize a payload: trim, unescape `\]`, convert the dialect and delimit.
pub fn normalize(payload: &str, dialect: Dialect, inline: bool) -> NormalizedEquation {
    let latex = canonical_latex(payload, dialect);
    NormalizedEquation {
        input: delimit(&latex, inline),
        latex,
        inline,
    }
}

/// Normalize a payload, applying substitutions to the LaTeX before delimiting.
pub fn normalize_with_subs(
    payload: &str,
    dialect: Dialect,
    inline: bool,
    subs: &SubstitutionSet,
    attributes: &BTreeMap<String, String>,
) -> NormalizedEquation {
    let mut latex = canonical_latex(payload, dialect);
    if !subs.is_empty() {
        latex = subs.apply(&latex, Some(attributes));
    }
    NormalizedEquation {
        input: delimit(&latex, inline),
        latex,
        inline,
    }
}

/// Trim, unescape and translate a payload to LaTeX.
pub fn canonical_latex(payload: &str, dialect: Dialect) -> String {
    let text = payload.trim().replace("\\]", "]");
    match dialect {
        Dialect::Latex => text,
        Dialect::AsciiMath => asciimath::to_latex(&text),
    }
}

/// Wrap LaTeX in inline (`$`) or display (`$$`) delimiters.
pub fn delimit(latex: &str, inline: bool) -> String {
    if inline {
        format!("${}$", latex)
    } else {
        format!("$${}$$", latex)
    }
}
