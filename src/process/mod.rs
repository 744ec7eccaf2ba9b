//! The processing pass: find equations, render them, rewrite the tree.

pub mod collect;
pub mod mutate;
mod options;
mod report;

pub use collect::{collect, Candidate, CandidateKind};
pub use options::{
    ProcessOptions, ATTR_DOCDIR, ATTR_FORMAT, ATTR_IMAGESDIR, ATTR_IMAGESOUTDIR, ATTR_INLINE,
    ATTR_OUTDIR, ATTR_PPI, ATTR_STEM,
};
pub use report::ProcessReport;

use crate::equation::normalize::{canonical_latex, delimit, normalize_with_subs};
use crate::equation::{Dialect, EquationExpression, InlineScanner};
use crate::error::{Error, RenderFailure, Result};
use crate::model::{Block, Document, MathBlock, NodeMut, NodeRef};
use crate::render::{EquationRenderer, MathEngine, RenderedArtifact};
use crate::subs::SubstitutionSet;
use std::collections::BTreeMap;

/// Runs the pass over a document with one engine and one configuration.
///
/// # Example
/// ```no_run
/// use stemrender::model::{Document, MathBlock};
/// use stemrender::process::{ProcessOptions, StemProcessor};
/// use stemrender::render::CommandEngine;
///
/// let mut doc = Document::new()
///     .with_attribute("stem", "latexmath")
///     .with_block(MathBlock::latex("x^2"));
/// let engine = CommandEngine::new("tex2png");
/// let processor = StemProcessor::new(ProcessOptions::from_document(&doc), &engine);
/// let report = processor.process(&mut doc)?;
/// println!("{}", report);
/// # Ok::<(), stemrender::Error>(())
/// ```
pub struct StemProcessor<'e> {
    options: ProcessOptions,
    engine: &'e dyn MathEngine,
    scanner: InlineScanner,
}

impl<'e> StemProcessor<'e> {
    /// Create a processor.
    pub fn new(options: ProcessOptions, engine: &'e dyn MathEngine) -> Self {
        let scanner = InlineScanner::new(options.default_dialect);
        Self {
            options,
            engine,
            scanner,
        }
    }

    /// Create a processor configured from the document's attributes.
    pub fn from_document(doc: &Document, engine: &'e dyn MathEngine) -> Self {
        Self::new(ProcessOptions::from_document(doc), engine)
    }

    /// Processing options.
    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Process `doc`, failing if any equation could not be rendered.
    ///
    /// Equations that render are substituted even when others fail.
    pub fn process(&self, doc: &mut Document) -> Result<ProcessReport> {
        let report = self.run(doc)?;
        if report.has_failures() {
            return Err(Error::EquationsFailed(report.failures));
        }
        Ok(report)
    }

    /// Process `doc`, returning failed equations in the report.
    ///
    /// Only filesystem and tree errors are returned as `Err`.
    pub fn run(&self, doc: &mut Document) -> Result<ProcessReport> {
        let location = self.options.location()?;
        log::debug!(
            "Rendering {} to {} (prefix '{}')",
            self.options.format,
            location.output_dir.display(),
            location.target_prefix
        );
        let mut renderer = EquationRenderer::new(
            self.engine,
            self.options.format,
            self.options.effective_ppi(),
            location,
        )
        .with_inline_mode(self.options.inline);

        let mut report = ProcessReport::new();
        let attributes = doc.attributes.clone();
        self.run_with(doc, &attributes, &mut renderer, &mut report)?;
        report.files_written = renderer.files_written();
        Ok(report)
    }

    fn run_with(
        &self,
        doc: &mut Document,
        attributes: &BTreeMap<String, String>,
        renderer: &mut EquationRenderer<'_>,
        report: &mut ProcessReport,
    ) -> Result<()> {
        let candidates = collect(doc);
        log::debug!("Collected {} candidate node(s)", candidates.len());

        for candidate in &candidates {
            match candidate.kind {
                CandidateKind::MathBlock => {
                    self.process_math_block(doc, candidate, renderer, report)?;
                }
                CandidateKind::NestedDocument => {
                    let Some(NodeMut::Cell(cell)) = doc.node_mut(&candidate.path) else {
                        continue;
                    };
                    let Some(inner) = cell.inner_document.as_mut() else {
                        continue;
                    };
                    let mut inherited = attributes.clone();
                    inherited.extend(inner.attributes.clone());
                    report.nested_documents += 1;
                    self.run_with(inner, &inherited, renderer, report)?;
                }
                kind if kind.is_text() => {
                    self.process_text(doc, candidate, attributes, renderer, report)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn process_math_block(
        &self,
        doc: &mut Document,
        candidate: &Candidate,
        renderer: &mut EquationRenderer<'_>,
        report: &mut ProcessReport,
    ) -> Result<()> {
        let math = match doc.node(&candidate.path) {
            Some(NodeRef::Block(Block::Math(math))) => math.clone(),
            _ => return Ok(()),
        };

        let Some(dialect) = Dialect::from_style(&math.style, self.options.default_dialect) else {
            log::debug!("Skipping math block with style '{}'", math.style);
            report.skipped_blocks += 1;
            return Ok(());
        };

        let latex = canonical_latex(&math.content, dialect);
        if latex.is_empty() {
            report.skipped_blocks += 1;
            return Ok(());
        }
        let input = delimit(&latex, false);

        let Some(artifact) = self.render(renderer, &input, false, math.id.as_deref(), report)?
        else {
            return Ok(());
        };

        let replacement = if renderer.inline_mode() {
            mutate::passthrough_block(&math, &artifact)
        } else {
            mutate::image_block(&math, &artifact, alt_text(&math, dialect, &latex))
        };
        mutate::replace_block(doc, candidate, replacement)?;
        report.math_blocks += 1;
        Ok(())
    }

    fn process_text(
        &self,
        doc: &mut Document,
        candidate: &Candidate,
        attributes: &BTreeMap<String, String>,
        renderer: &mut EquationRenderer<'_>,
        report: &mut ProcessReport,
    ) -> Result<()> {
        let Some(text) = collect::text_of(doc, candidate) else {
            return Ok(());
        };
        if !self.scanner.may_contain(&text) {
            return Ok(());
        }
        report.spans_scanned += 1;

        let mut substituted = 0;
        let rewrite = self.scanner.rewrite(&text, |expr| {
            let replacement = self.inline_replacement(expr, attributes, renderer, report)?;
            if replacement.is_some() {
                substituted += 1;
            }
            Ok::<_, Error>(replacement)
        })?;

        report.inline_equations += substituted;
        report.escaped += rewrite.escaped;
        if rewrite.modified {
            mutate::set_text(doc, candidate, rewrite.text)?;
            report.spans_rewritten += 1;
        }
        Ok(())
    }

    fn inline_replacement(
        &self,
        expr: &EquationExpression,
        attributes: &BTreeMap<String, String>,
        renderer: &mut EquationRenderer<'_>,
        report: &mut ProcessReport,
    ) -> Result<Option<String>> {
        let subs = match expr.subs.as_deref() {
            Some(list) => SubstitutionSet::resolve(list),
            None => self.options.default_inline_subs(),
        };
        let equation = normalize_with_subs(&expr.payload, expr.dialect, true, &subs, attributes);

        let Some(artifact) = self.render(renderer, &equation.input, true, None, report)? else {
            return Ok(None);
        };

        Ok(Some(inline_reference(&artifact, renderer.inline_mode())))
    }

    /// Render, recording per-equation failures instead of returning them.
    fn render(
        &self,
        renderer: &mut EquationRenderer<'_>,
        input: &str,
        inline: bool,
        explicit_id: Option<&str>,
        report: &mut ProcessReport,
    ) -> Result<Option<RenderedArtifact>> {
        match renderer.render(input, inline, explicit_id) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(e) if e.is_render_failure() => {
                report.add_failure(RenderFailure::new(input, e.to_string()));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for StemProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemProcessor")
            .field("options", &self.options)
            .field("engine", &self.engine.name())
            .finish()
    }
}

/// Alt text for an image replacing a math block.
fn alt_text(math: &MathBlock, dialect: Dialect, latex: &str) -> String {
    if let Some(alt) = math.alt.as_ref().filter(|a| !a.is_empty()) {
        return alt.clone();
    }
    match dialect {
        Dialect::Latex => delimit(latex, false),
        Dialect::AsciiMath => format!("`{}`", math.content.trim()),
    }
}

/// Replacement text for an inline occurrence.
fn inline_reference(artifact: &RenderedArtifact, inline_mode: bool) -> String {
    if inline_mode {
        return format!(
            "pass:[<span class=\"steminline\">{}</span>]",
            artifact.markup()
        );
    }
    let target = artifact.target.as_deref().unwrap_or_default();
    match (artifact.width, artifact.height) {
        (Some(w), Some(h)) => format!("image:{}[width={},height={}]", target, w, h),
        _ => format!("image:{}[]", target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{content_identifier, EngineOutput, EngineRequest, OutputFormat};

    struct EchoEngine;

    impl MathEngine for EchoEngine {
        fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput> {
            if request.input.contains("\\bad") {
                return Err(Error::Engine("Undefined control sequence".to_string()));
            }
            let data = match request.format {
                OutputFormat::Png => [&b"\x89PNG\r\n\x1a\n"[..], request.input.as_bytes()].concat(),
                _ => format!("<math>{}</math>", request.input).into_bytes(),
            };
            Ok(EngineOutput::new(data).with_size(300, 100))
        }
    }

    fn options(dir: &std::path::Path) -> ProcessOptions {
        ProcessOptions::new()
            .with_dialect(Dialect::Latex)
            .with_outdir(dir)
    }

    #[test]
    fn test_alt_text() {
        let latex = MathBlock::latex("x^2");
        assert_eq!(alt_text(&latex, Dialect::Latex, "x^2"), "$$x^2$$");

        let ascii = MathBlock::asciimath(" sqrt x ");
        assert_eq!(alt_text(&ascii, Dialect::AsciiMath, "\\sqrt{x}"), "`sqrt x`");

        let explicit = MathBlock::latex("x").with_alt("x");
        assert_eq!(alt_text(&explicit, Dialect::Latex, "x"), "x");
    }

    #[test]
    fn test_inline_reference_forms() {
        let mut artifact = RenderedArtifact {
            identifier: "stem-1".into(),
            format: OutputFormat::Png,
            data: b"<svg/>".to_vec(),
            width: Some(72),
            height: Some(24),
            target: Some("img/stem-1.png".into()),
            path: None,
        };
        assert_eq!(
            inline_reference(&artifact, false),
            "image:img/stem-1.png[width=72,height=24]"
        );

        artifact.width = None;
        artifact.height = None;
        assert_eq!(inline_reference(&artifact, false), "image:img/stem-1.png[]");
        assert_eq!(
            inline_reference(&artifact, true),
            "pass:[<span class=\"steminline\"><svg/></span>]"
        );
    }

    #[test]
    fn test_failure_skips_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new()
            .with_block(crate::model::Prose::paragraph("ok stem:[x] bad stem:[\\bad]"));
        let processor = StemProcessor::new(options(dir.path()), &EchoEngine);

        let report = processor.run(&mut doc).unwrap();
        assert_eq!(report.inline_equations, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].input, "$\\bad$");

        let expected = format!(
            "ok image:{}.png[width=72,height=24] bad stem:[\\bad]",
            content_identifier("$x$")
        );
        match &doc.blocks[0] {
            Block::Prose(prose) => assert_eq!(prose.text(), expected),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_process_returns_aggregate_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new().with_block(MathBlock::latex("\\bad"));
        let processor = StemProcessor::new(options(dir.path()), &EchoEngine);

        match processor.process(&mut doc) {
            Err(Error::EquationsFailed(failures)) => assert_eq!(failures[0].input, "$$\\bad$$"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(doc.blocks[0], Block::Math(_)));
    }

    #[test]
    fn test_unknown_style_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new().with_block(MathBlock::new("gnuplot", "plot x"));
        let processor = StemProcessor::new(options(dir.path()), &EchoEngine);

        let report = processor.run(&mut doc).unwrap();
        assert_eq!(report.skipped_blocks, 1);
        assert_eq!(report.files_written, 0);
        assert!(matches!(doc.blocks[0], Block::Math(_)));
    }
}
