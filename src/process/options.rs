//! Processing configuration.

use crate::equation::Dialect;
use crate::error::Result;
use crate::model::Document;
use crate::path::OutputLocation;
use crate::render::{OutputFormat, DEFAULT_PPI, VECTOR_PPI};
use crate::subs::SubstitutionSet;
use std::path::{Path, PathBuf};

/// Attribute selecting the default dialect.
pub const ATTR_STEM: &str = "stem";
/// Attribute selecting the output format.
pub const ATTR_FORMAT: &str = "mathematical-format";
/// Attribute selecting the raster resolution.
pub const ATTR_PPI: &str = "mathematical-ppi";
/// Attribute enabling inline mode.
pub const ATTR_INLINE: &str = "mathematical-inline";
/// Attribute naming the images directory.
pub const ATTR_IMAGESDIR: &str = "imagesdir";
/// Attribute naming the images output directory.
pub const ATTR_IMAGESOUTDIR: &str = "imagesoutdir";
/// Attribute naming the output root.
pub const ATTR_OUTDIR: &str = "outdir";
/// Attribute naming the document directory.
pub const ATTR_DOCDIR: &str = "docdir";

/// Options for a processing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Dialect of the generic `stem` macro and `stem` blocks
    pub default_dialect: Dialect,

    /// Output format
    pub format: OutputFormat,

    /// Requested raster resolution
    pub ppi: f64,

    /// Embed rendered markup instead of referencing files
    pub inline: bool,

    /// Images directory
    pub imagesdir: Option<PathBuf>,

    /// Images output directory
    pub imagesoutdir: Option<PathBuf>,

    /// Output root
    pub outdir: Option<PathBuf>,

    /// Document directory
    pub docdir: Option<PathBuf>,

    /// Whether the output backend produces HTML
    pub html_backend: bool,

    warnings: Vec<String>,
}

impl ProcessOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from document attributes.
    ///
    /// Invalid or conflicting values fall back to safe defaults with a warning.
    pub fn from_document(doc: &Document) -> Self {
        Self::from_attributes(doc).resolve()
    }

    /// Read document attributes without reconciling them.
    ///
    /// Call [`resolve`](Self::resolve) once any overrides are applied.
    pub fn from_attributes(doc: &Document) -> Self {
        let mut options = Self {
            default_dialect: Dialect::from_stem_attr(doc.attr(ATTR_STEM)),
            html_backend: doc.is_html_backend(),
            imagesdir: path_attr(doc, ATTR_IMAGESDIR),
            imagesoutdir: path_attr(doc, ATTR_IMAGESOUTDIR),
            outdir: path_attr(doc, ATTR_OUTDIR),
            docdir: path_attr(doc, ATTR_DOCDIR),
            ..Self::default()
        };

        if let Some(name) = doc.attr(ATTR_FORMAT) {
            match OutputFormat::from_name(name) {
                Some(format) => options.format = format,
                None => options.warn(format!(
                    "Unknown {} '{}', using {}",
                    ATTR_FORMAT,
                    name,
                    OutputFormat::Png
                )),
            }
        }

        if let Some(value) = doc.attr(ATTR_PPI) {
            match value.trim().parse::<f64>() {
                Ok(ppi) => options.ppi = ppi,
                Err(_) => options.warn(format!(
                    "Invalid {} '{}', using {}",
                    ATTR_PPI, value, DEFAULT_PPI
                )),
            }
        }

        options.inline = doc
            .attr(ATTR_INLINE)
            .map(|value| value.trim() != "false")
            .unwrap_or(false);

        options
    }

    /// Set the default dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.default_dialect = dialect;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the raster resolution.
    pub fn with_ppi(mut self, ppi: f64) -> Self {
        self.ppi = ppi;
        self
    }

    /// Enable or disable inline mode.
    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    /// Set the images directory.
    pub fn with_imagesdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.imagesdir = Some(dir.into());
        self
    }

    /// Set the images output directory.
    pub fn with_imagesoutdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.imagesoutdir = Some(dir.into());
        self
    }

    /// Set the output root.
    pub fn with_outdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outdir = Some(dir.into());
        self
    }

    /// Set the document directory.
    pub fn with_docdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.docdir = Some(dir.into());
        self
    }

    /// Set whether the backend produces HTML.
    pub fn with_html_backend(mut self, html: bool) -> Self {
        self.html_backend = html;
        self
    }

    /// Reconcile conflicting settings.
    ///
    /// - A non-positive resolution is reset to the default.
    /// - Inline mode is turned off for raster output.
    /// - Inline mode is turned on for markup output.
    pub fn resolve(mut self) -> Self {
        if !(self.ppi.is_finite() && self.ppi > 0.0) {
            self.warn(format!(
                "Resolution {} is not positive, using {}",
                self.ppi, DEFAULT_PPI
            ));
            self.ppi = DEFAULT_PPI;
        }

        if self.inline && self.format.is_raster() {
            self.warn(format!(
                "Inline mode is not supported with {}, referencing image files instead",
                self.format
            ));
            self.inline = false;
        }

        if !self.inline && self.format.is_markup() {
            self.warn(format!(
                "Format {} can only be embedded, enabling inline mode",
                self.format
            ));
            self.inline = true;
        }

        self
    }

    /// Resolution handed to the engine; fixed for non-raster formats.
    pub fn effective_ppi(&self) -> f64 {
        if self.format.is_raster() {
            self.ppi
        } else {
            VECTOR_PPI
        }
    }

    /// Substitutions applied to inline payloads without an explicit list.
    pub fn default_inline_subs(&self) -> SubstitutionSet {
        if self.html_backend {
            SubstitutionSet::verbatim()
        } else {
            SubstitutionSet::none()
        }
    }

    /// Base directory relative paths are resolved against.
    ///
    /// The output root, else the document directory, else the working directory.
    /// A relative root is taken from the working directory.
    pub fn output_root(&self) -> Result<PathBuf> {
        match self.outdir.as_ref().or(self.docdir.as_ref()) {
            Some(dir) if dir.is_absolute() => Ok(dir.clone()),
            Some(dir) => Ok(std::env::current_dir()?.join(dir)),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Resolve where artifacts go and how they are referenced.
    pub fn location(&self) -> Result<OutputLocation> {
        let base = self.output_root()?;
        Ok(OutputLocation::resolve(
            self.imagesoutdir.as_deref(),
            self.imagesdir.as_deref(),
            &base,
        ))
    }

    /// Configuration warnings emitted so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            default_dialect: Dialect::AsciiMath,
            format: OutputFormat::Png,
            ppi: DEFAULT_PPI,
            inline: false,
            imagesdir: None,
            imagesoutdir: None,
            outdir: None,
            docdir: None,
            html_backend: true,
            warnings: Vec::new(),
        }
    }
}

fn path_attr(doc: &Document, name: &str) -> Option<PathBuf> {
    doc.attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| Path::new(value).to_path_buf())
}
