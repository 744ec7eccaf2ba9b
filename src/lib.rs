//! # stemrender
//!
//! Render the math in a document tree to images or embedded markup.
//!
//! A pass finds display math blocks and inline macros (`stem:[...]`,
//! `latexmath:[...]`, `asciimath:[...]`) in prose, list items, table cells and
//! section titles, typesets each one through a [`MathEngine`], and rewrites the
//! tree so the converter emits the artifact instead of the raw notation.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stemrender::model::{Document, MathBlock, Prose};
//! use stemrender::render::CommandEngine;
//!
//! fn main() -> stemrender::Result<()> {
//!     let mut doc = Document::new()
//!         .with_attribute("stem", "latexmath")
//!         .with_attribute("imagesoutdir", "build/img")
//!         .with_block(MathBlock::latex("e^{i\\pi} + 1 = 0"))
//!         .with_block(Prose::paragraph("The value stem:[x^2] is shown."));
//!
//!     let engine = CommandEngine::new("tex2png").arg("--ppi={ppi}");
//!     let report = stemrender::process_document(&mut doc, &engine)?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Content-addressed artifacts**: file names derive from the equation, so
//!   repeated runs write the same files
//! - **LaTeX and AsciiMath**: AsciiMath is translated to LaTeX before rendering
//! - **PNG, SVG and MathML**: raster images carry their declared size, markup is
//!   embedded inline
//! - **Skip and report**: equations the engine rejects are left as written and
//!   reported together at the end

pub mod detect;
pub mod equation;
pub mod error;
pub mod model;
pub mod path;
pub mod process;
pub mod render;
pub mod subs;

// Re-export commonly used types
pub use equation::{Dialect, EquationExpression, InlineScanner, MacroKind};
pub use error::{Error, RenderFailure, Result};
pub use model::{Block, Document, MathBlock, Prose, Section, Table, TableCell};
pub use path::OutputLocation;
pub use process::{ProcessOptions, ProcessReport, StemProcessor};
pub use render::{
    CommandEngine, EngineOutput, EngineRequest, JsonFormat, MathEngine, OutputFormat,
    RenderedArtifact,
};
pub use subs::{Substitution, SubstitutionSet};

use std::path::PathBuf;

/// Process a document configured by its own attributes.
///
/// # Example
///
/// ```no_run
/// use stemrender::{process_document, CommandEngine, Document};
///
/// let mut doc = Document::new();
/// let engine = CommandEngine::new("tex2svg");
/// let report = process_document(&mut doc, &engine).unwrap();
/// assert_eq!(report.equations(), 0);
/// ```
pub fn process_document(doc: &mut Document, engine: &dyn MathEngine) -> Result<ProcessReport> {
    StemProcessor::from_document(doc, engine).process(doc)
}

/// Read a JSON tree, process it and return the rewritten tree as JSON.
///
/// # Example
///
/// ```no_run
/// use stemrender::{process_json, CommandEngine, JsonFormat};
///
/// let json = std::fs::read_to_string("tree.json").unwrap();
/// let engine = CommandEngine::new("tex2svg");
/// let output = process_json(&json, &engine, JsonFormat::Pretty).unwrap();
/// std::fs::write("tree.out.json", output).unwrap();
/// ```
pub fn process_json(json: &str, engine: &dyn MathEngine, format: JsonFormat) -> Result<String> {
    let mut doc = render::from_json(json)?;
    process_document(&mut doc, engine)?;
    render::to_json(&doc, format)
}

/// Scan text for inline macros without rendering.
///
/// # Example
///
/// ```
/// use stemrender::{scan_text, Dialect};
///
/// let found = scan_text("Let stem:[x] and \\stem:[y].", Dialect::Latex);
/// assert_eq!(found.len(), 2);
/// assert!(found[1].escaped);
/// ```
pub fn scan_text(text: &str, default_dialect: Dialect) -> Vec<EquationExpression> {
    InlineScanner::new(default_dialect).scan(text)
}

/// Builder layering explicit settings over document attributes.
///
/// # Example
///
/// ```no_run
/// use stemrender::{CommandEngine, Document, OutputFormat, StemRender};
///
/// let mut doc = Document::new();
/// let engine = CommandEngine::new("tex2svg");
/// let report = StemRender::new()
///     .with_format(OutputFormat::Svg)
///     .with_imagesoutdir("build/img")
///     .process(&mut doc, &engine)?;
/// # Ok::<(), stemrender::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StemRender {
    dialect: Option<Dialect>,
    format: Option<OutputFormat>,
    ppi: Option<f64>,
    inline: Option<bool>,
    imagesdir: Option<PathBuf>,
    imagesoutdir: Option<PathBuf>,
    outdir: Option<PathBuf>,
}

impl StemRender {
    /// Create a builder with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Override the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Override the raster resolution.
    pub fn with_ppi(mut self, ppi: f64) -> Self {
        self.ppi = Some(ppi);
        self
    }

    /// Override inline mode.
    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = Some(inline);
        self
    }

    /// Override the images directory.
    pub fn with_imagesdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.imagesdir = Some(dir.into());
        self
    }

    /// Override the images output directory.
    pub fn with_imagesoutdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.imagesoutdir = Some(dir.into());
        self
    }

    /// Override the output root.
    pub fn with_outdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outdir = Some(dir.into());
        self
    }

    /// Options for `doc`: its attributes, then the overrides, reconciled once.
    pub fn options_for(&self, doc: &Document) -> ProcessOptions {
        let mut options = ProcessOptions::from_attributes(doc);
        if let Some(dialect) = self.dialect {
            options = options.with_dialect(dialect);
        }
        if let Some(format) = self.format {
            options = options.with_format(format);
        }
        if let Some(ppi) = self.ppi {
            options = options.with_ppi(ppi);
        }
        if let Some(inline) = self.inline {
            options = options.with_inline(inline);
        }
        if let Some(dir) = &self.imagesdir {
            options = options.with_imagesdir(dir.clone());
        }
        if let Some(dir) = &self.imagesoutdir {
            options = options.with_imagesoutdir(dir.clone());
        }
        if let Some(dir) = &self.outdir {
            options = options.with_outdir(dir.clone());
        }
        options.resolve()
    }

    /// Process `doc` with `engine`.
    pub fn process(&self, doc: &mut Document, engine: &dyn MathEngine) -> Result<ProcessReport> {
        StemProcessor::new(self.options_for(doc), engine).process(doc)
    }

    /// Process `doc`, returning render failures in the report instead of as an error.
    pub fn run(&self, doc: &mut Document, engine: &dyn MathEngine) -> Result<ProcessReport> {
        StemProcessor::new(self.options_for(doc), engine).run(doc)
    }
}
