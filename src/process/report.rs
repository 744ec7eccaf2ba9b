//! Processing statistics.

use crate::error::RenderFailure;

/// What a processing pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Math blocks replaced
    pub math_blocks: usize,

    /// Math blocks left alone (unknown style or empty content)
    pub skipped_blocks: usize,

    /// Text spans scanned for inline macros
    pub spans_scanned: usize,

    /// Text spans rewritten
    pub spans_rewritten: usize,

    /// Inline equations substituted
    pub inline_equations: usize,

    /// Escaped occurrences unescaped
    pub escaped: usize,

    /// Nested documents processed
    pub nested_documents: usize,

    /// Artifact files written
    pub files_written: usize,

    /// Equations that failed to render
    pub failures: Vec<RenderFailure>,
}

impl ProcessReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total equations substituted.
    pub fn equations(&self) -> usize {
        self.math_blocks + self.inline_equations
    }

    /// Whether any equation failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Record a failed equation.
    pub fn add_failure(&mut self, failure: RenderFailure) {
        log::warn!("Skipping equation {}", failure);
        self.failures.push(failure);
    }
}

impl std::fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} block(s), {} inline equation(s) in {} of {} span(s), {} file(s) written",
            self.math_blocks,
            self.inline_equations,
            self.spans_rewritten,
            self.spans_scanned,
            self.files_written
        )?;
        if self.nested_documents > 0 {
            write!(f, ", {} nested document(s)", self.nested_documents)?;
        }
        if self.has_failures() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        Ok(())
    }
}
