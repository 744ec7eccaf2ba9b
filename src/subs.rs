//! Named text substitutions.
//!
//! Inline macros may carry a bracketed list of substitutions to apply to their
//! payload (`stem:c,a[...]`). Prose blocks carry the list the downstream converter
//! will apply, which decides whether inline macros are expanded at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single substitution step, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitution {
    /// Escape `&`, `<` and `>`
    SpecialCharacters,
    /// Inline formatting marks
    Quotes,
    /// Attribute references (`{name}`)
    Attributes,
    /// Typographic replacements (`(C)`, `...`, `->`)
    Replacements,
    /// Inline macros
    Macros,
    /// Hard line breaks
    PostReplacements,
}

impl Substitution {
    /// Look up a substitution by its long or short name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "specialcharacters" | "specialchars" | "c" => Some(Self::SpecialCharacters),
            "quotes" | "q" => Some(Self::Quotes),
            "attributes" | "a" => Some(Self::Attributes),
            "replacements" | "r" => Some(Self::Replacements),
            "macros" | "m" => Some(Self::Macros),
            "post_replacements" | "p" => Some(Self::PostReplacements),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SpecialCharacters => "specialcharacters",
            Self::Quotes => "quotes",
            Self::Attributes => "attributes",
            Self::Replacements => "replacements",
            Self::Macros => "macros",
            Self::PostReplacements => "post_replacements",
        }
    }
}

const NORMAL: [Substitution; 6] = [
    Substitution::SpecialCharacters,
    Substitution::Quotes,
    Substitution::Attributes,
    Substitution::Replacements,
    Substitution::Macros,
    Substitution::PostReplacements,
];

const REPLACEMENTS: [(&str, &str); 12] = [
    ("(C)", "&#169;"),
    ("(R)", "&#174;"),
    ("(TM)", "&#8482;"),
    ("...", "&#8230;&#8203;"),
    ("-&gt;", "&#8594;"),
    ("=&gt;", "&#8658;"),
    ("&lt;-", "&#8592;"),
    ("&lt;=", "&#8656;"),
    ("->", "&#8594;"),
    ("=>", "&#8658;"),
    ("<-", "&#8592;"),
    ("<=", "&#8656;"),
];

/// An ordered, duplicate-free set of substitutions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionSet(Vec<Substitution>);

impl SubstitutionSet {
    /// Build a set from substitutions, sorted into canonical order.
    pub fn new(subs: impl IntoIterator<Item = Substitution>) -> Self {
        let mut subs: Vec<Substitution> = subs.into_iter().collect();
        subs.sort();
        subs.dedup();
        Self(subs)
    }

    /// No substitutions.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// All substitutions, as applied to paragraphs.
    pub fn normal() -> Self {
        Self(NORMAL.to_vec())
    }

    /// Special characters only, as applied to literal and listing blocks.
    pub fn verbatim() -> Self {
        Self(vec![Substitution::SpecialCharacters])
    }

    /// Resolve a comma-separated list of substitution names.
    ///
    /// Unknown names are ignored with a warning.
    pub fn resolve(list: &str) -> Self {
        let mut subs = Vec::new();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name {
                "none" => {}
                "normal" | "n" => subs.extend(NORMAL),
                "verbatim" | "v" => subs.push(Substitution::SpecialCharacters),
                other => match Substitution::from_name(other) {
                    Some(sub) => subs.push(sub),
                    None => log::warn!("Ignoring unknown substitution '{}'", other),
                },
            }
        }
        Self::new(subs)
    }

    /// Check if a substitution is part of the set.
    pub fn contains(&self, sub: Substitution) -> bool {
        self.0.contains(&sub)
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in application order.
    pub fn iter(&self) -> impl Iterator<Item = Substitution> + '_ {
        self.0.iter().copied()
    }

    /// Apply the substitutions this crate implements to `text`.
    ///
    /// Quotes, macros and post-replacements belong to the downstream converter and
    /// are skipped.
    pub fn apply(&self, text: &str, attributes: Option<&BTreeMap<String, String>>) -> String {
        let mut result = text.to_string();
        for sub in self.iter() {
            result = match sub {
                Substitution::SpecialCharacters => escape_special_chars(&result),
                Substitution::Attributes => match attributes {
                    Some(attrs) => replace_attribute_refs(&result, attrs),
                    None => result,
                },
                Substitution::Replacements => apply_replacements(&result),
                Substitution::Quotes | Substitution::Macros | Substitution::PostReplacements => {
                    log::debug!("Substitution '{}' left to the converter", sub.name());
                    result
                }
            };
        }
        result
    }
}

impl FromIterator<Substitution> for SubstitutionSet {
    fn from_iter<I: IntoIterator<Item = Substitution>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Escape the characters that are special in HTML/XML output.
pub fn escape_special_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace `{name}` references with attribute values; unknown references stay.
fn replace_attribute_refs(text: &str, attributes: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let closed = after[name_len..].starts_with('}');
        match attributes.get(name) {
            Some(value) if closed && !name.is_empty() => {
                out.push_str(value);
                rest = &after[name_len + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn apply_replacements(text: &str) -> String {
    REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}
