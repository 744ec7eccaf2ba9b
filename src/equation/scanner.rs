//! Inline macro scanner.
//!
//! Finds `stem:[...]`, `latexmath:[...]` and `asciimath:[...]` occurrences in a
//! single left-to-right, non-overlapping pass. A `]` inside the payload must be
//! escaped as `\]`.

use super::{Dialect, EquationExpression, MacroKind};
use regex::{Captures, Regex};

const INLINE_MACRO_PATTERN: &str = r"(?s)\\?(stem|latexmath|asciimath):([a-z,]*)\[(.*?[^\\])\]";

const MACRO_NAMES: [&str; 3] = ["stem", "latexmath", "asciimath"];

/// Result of rewriting a text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Rewritten text
    pub text: String,

    /// Whether the text differs from the input
    pub modified: bool,

    /// Escaped occurrences that were unescaped
    pub escaped: usize,
}

/// Scanner for inline math macros.
#[derive(Debug, Clone)]
pub struct InlineScanner {
    pattern: Regex,
    default_dialect: Dialect,
}

impl InlineScanner {
    /// Create a scanner resolving the generic `stem:` macro to `default_dialect`.
    pub fn new(default_dialect: Dialect) -> Self {
        Self {
            pattern: Regex::new(INLINE_MACRO_PATTERN).expect("inline macro pattern is valid"),
            default_dialect,
        }
    }

    /// The dialect used for the generic macro.
    pub fn default_dialect(&self) -> Dialect {
        self.default_dialect
    }

    /// Cheap check that `text` may contain a macro.
    pub fn may_contain(&self, text: &str) -> bool {
        text.contains(':') && MACRO_NAMES.iter().any(|name| text.contains(name))
    }

    /// Find every occurrence in `text`, in order.
    pub fn scan(&self, text: &str) -> Vec<EquationExpression> {
        if !self.may_contain(text) {
            return Vec::new();
        }
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| self.expression(&caps))
            .collect()
    }

    /// Rewrite every occurrence in `text`.
    ///
    /// Escaped occurrences lose their backslash and are otherwise kept. Occurrences
    /// with a blank payload are kept as written. For the rest, `replace` returns the
    /// replacement text, or `None` to keep the occurrence as written. An error from
    /// `replace` aborts the rewrite.
    pub fn rewrite<E, F>(&self, text: &str, mut replace: F) -> Result<Rewrite, E>
    where
        F: FnMut(&EquationExpression) -> Result<Option<String>, E>,
    {
        if !self.may_contain(text) {
            return Ok(Rewrite {
                text: text.to_string(),
                modified: false,
                escaped: 0,
            });
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut modified = false;
        let mut escaped = 0;

        for caps in self.pattern.captures_iter(text) {
            let Some(expr) = self.expression(&caps) else {
                continue;
            };
            let whole = &text[expr.span.clone()];

            let replacement = if expr.escaped {
                escaped += 1;
                Some(whole[1..].to_string())
            } else if expr.is_blank() {
                None
            } else {
                replace(&expr)?
            };

            if let Some(replacement) = replacement {
                out.push_str(&text[last..expr.span.start]);
                out.push_str(&replacement);
                last = expr.span.end;
                modified = true;
            }
        }

        if !modified {
            return Ok(Rewrite {
                text: text.to_string(),
                modified: false,
                escaped,
            });
        }
        out.push_str(&text[last..]);
        Ok(Rewrite {
            text: out,
            modified,
            escaped,
        })
    }

    fn expression(&self, caps: &Captures<'_>) -> Option<EquationExpression> {
        let whole = caps.get(0)?;
        let kind = MacroKind::from_name(caps.get(1)?.as_str())?;
        let subs = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Some(EquationExpression {
            kind,
            dialect: kind.dialect(self.default_dialect),
            payload: caps.get(3)?.as_str().to_string(),
            subs,
            inline: true,
            escaped: whole.as_str().starts_with('\\'),
            span: whole.range(),
        })
    }
}

impl Default for InlineScanner {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}
