//! Integration tests for the processing pass.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use stemrender::model::{
    Block, CompoundBlock, Document, List, ListItem, MathBlock, NodePath, NodeRef, Prose, Section,
    Table, TableCell, TableRow,
};
use stemrender::render::{content_identifier, EngineOutput, EngineRequest};
use stemrender::{
    process_document, process_json, Error, JsonFormat, MathEngine, OutputFormat, Result,
    StemProcessor, StemRender,
};

/// Deterministic engine recording every request.
struct MockEngine {
    requests: RefCell<Vec<String>>,
}

impl MockEngine {
    fn new() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

fn png(width: u32, height: u32, payload: &str) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(payload.as_bytes());
    data
}

impl MathEngine for MockEngine {
    fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput> {
        self.requests.borrow_mut().push(request.input.to_string());
        if request.input.contains("\\undefined") {
            return Err(Error::Engine("Undefined control sequence".to_string()));
        }
        let output = match request.format {
            OutputFormat::Png => EngineOutput::new(png(300, 150, request.input)),
            OutputFormat::Svg => EngineOutput::new(format!("<svg>{}</svg>", request.input)),
            OutputFormat::MathMl => EngineOutput::new(format!("<math>{}</math>", request.input)),
        };
        Ok(output)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn latex_doc(dir: &Path) -> Document {
    Document::new()
        .with_attribute("stem", "latexmath")
        .with_attribute("outdir", dir.to_string_lossy().to_string())
}

fn prose_text(doc: &Document, index: usize) -> String {
    match &doc.blocks[index] {
        Block::Prose(prose) => prose.text(),
        other => panic!("expected prose, got {:?}", other),
    }
}

// ==================== Block Math ====================

#[test]
fn test_block_math_becomes_image() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(MathBlock::latex("x^2"));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(report.math_blocks, 1);
    assert_eq!(report.files_written, 1);

    let id = content_identifier("$$x^2$$");
    match &doc.blocks[0] {
        Block::Image(image) => {
            assert_eq!(image.target, format!("{}.png", id));
            assert_eq!(image.alt, "$$x^2$$");
            assert_eq!(image.width, Some(72));
            assert_eq!(image.height, Some(36));
            assert!(image.id.is_none());
        }
        other => panic!("expected image, got {:?}", other),
    }
    assert!(dir.path().join(format!("{}.png", id)).exists());
}

#[test]
fn test_block_math_keeps_id_and_title() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(
        MathBlock::latex("E = mc^2")
            .with_id("energy")
            .with_title("Mass-energy"),
    );

    process_document(&mut doc, &engine).unwrap();

    match &doc.blocks[0] {
        Block::Image(image) => {
            assert_eq!(image.target, "energy.png");
            assert_eq!(image.id.as_deref(), Some("energy"));
            assert_eq!(image.title.as_deref(), Some("Mass-energy"));
        }
        other => panic!("expected image, got {:?}", other),
    }
    assert!(dir.path().join("energy.png").exists());
}

#[test]
fn test_asciimath_block_alt_text() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(MathBlock::asciimath("sqrt x"));

    process_document(&mut doc, &engine).unwrap();

    assert_eq!(engine.requests.borrow()[0], "$$\\sqrt{x}$$");
    match &doc.blocks[0] {
        Block::Image(image) => assert_eq!(image.alt, "`sqrt x`"),
        other => panic!("expected image, got {:?}", other),
    }
}

#[test]
fn test_stem_block_follows_document_dialect() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = Document::new()
        .with_attribute("outdir", dir.path().to_string_lossy().to_string())
        .with_block(MathBlock::new("stem", "a/b"));

    process_document(&mut doc, &engine).unwrap();
    assert_eq!(engine.requests.borrow()[0], "$$\\frac{a}{b}$$");
}

// ==================== Inline Macros ====================

#[test]
fn test_inline_macro_becomes_image_reference() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(Prose::paragraph("The value stem:[x^2] is shown."));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(report.inline_equations, 1);

    let id = content_identifier("$x^2$");
    assert_eq!(
        prose_text(&doc, 0),
        format!("The value image:{}.png[width=72,height=36] is shown.", id)
    );
}

#[test]
fn test_multiple_equations_on_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(Prose::paragraph("stem:[a] and stem:[b], stem:[a]"));

    process_document(&mut doc, &engine).unwrap();

    let a = content_identifier("$a$");
    let b = content_identifier("$b$");
    assert_eq!(
        prose_text(&doc, 0),
        format!(
            "image:{a}.png[width=72,height=36] and image:{b}.png[width=72,height=36], image:{a}.png[width=72,height=36]"
        )
    );
    // repeated input is rendered once
    assert_eq!(engine.calls(), 2);
}

#[test]
fn test_asciimath_and_latex_share_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_block(Prose::paragraph("asciimath:[x^2]"))
        .with_block(Prose::paragraph("latexmath:[x^2]"));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(prose_text(&doc, 0), prose_text(&doc, 1));
    assert_eq!(report.files_written, 1);
}

#[test]
fn test_escaped_macro_is_not_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let engine = MockEngine::new();
    let mut doc = Document::new()
        .with_attribute("stem", "latexmath")
        .with_attribute("outdir", out.to_string_lossy().to_string())
        .with_block(Prose::paragraph("Type \\stem:[x^2] to get math."));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(prose_text(&doc, 0), "Type stem:[x^2] to get math.");
    assert_eq!(report.escaped, 1);
    assert_eq!(engine.calls(), 0);
    assert!(!out.exists());
}

#[test]
fn test_blank_payload_left_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(Prose::paragraph("Nothing stem:[   ] here."));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(prose_text(&doc, 0), "Nothing stem:[   ] here.");
    assert_eq!(report.spans_rewritten, 0);
    assert_eq!(engine.calls(), 0);
}

#[test]
fn test_escaped_bracket_in_payload() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(Prose::paragraph("stem:[[0,1\\]]"));

    process_document(&mut doc, &engine).unwrap();
    assert_eq!(engine.requests.borrow()[0], "$[0,1]$");
}

#[test]
fn test_generic_macro_uses_asciimath_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = Document::new()
        .with_attribute("outdir", dir.path().to_string_lossy().to_string())
        .with_block(Prose::paragraph("stem:[sqrt x] latexmath:[\\sqrt{y}]"));

    process_document(&mut doc, &engine).unwrap();
    let requests = engine.requests.borrow();
    assert_eq!(requests[0], "$\\sqrt{x}$");
    assert_eq!(requests[1], "$\\sqrt{y}$");
}

#[test]
fn test_special_characters_escaped_for_html() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(Prose::paragraph("stem:[a < b]"));

    process_document(&mut doc, &engine).unwrap();
    assert_eq!(engine.requests.borrow()[0], "$a &lt; b$");
}

#[test]
fn test_no_default_subs_for_other_backends() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("backend", "pdf")
        .with_block(Prose::paragraph("stem:[a < b]"));

    process_document(&mut doc, &engine).unwrap();
    assert_eq!(engine.requests.borrow()[0], "$a < b$");
}

#[test]
fn test_explicit_subs_list() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("n", "42")
        .with_block(Prose::paragraph("stem:a[x^{n}]"));

    process_document(&mut doc, &engine).unwrap();
    assert_eq!(engine.requests.borrow()[0], "$x^42$");
}

#[test]
fn test_literal_prose_not_scanned() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(Prose::literal("stem:[x]"));

    process_document(&mut doc, &engine).unwrap();
    assert_eq!(prose_text(&doc, 0), "stem:[x]");
    assert_eq!(engine.calls(), 0);
}

// ==================== Other Text Nodes ====================

#[test]
fn test_list_items_and_nested_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path()).with_block(List::unordered(vec![
        ListItem::new("first stem:[a]").with_block(MathBlock::latex("b")),
        ListItem::new("second"),
    ]));

    process_document(&mut doc, &engine).unwrap();

    match doc.node(&NodePath::root(0).item(0)) {
        Some(NodeRef::Item(item)) => assert!(item.text.starts_with("first image:")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        doc.node(&NodePath::root(0).item(0).block(0)),
        Some(NodeRef::Block(Block::Image(_)))
    ));
}

#[test]
fn test_section_title_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut section = Section::new("About stem:[x]", 1);
    section.add_block(CompoundBlock::new(
        "example",
        vec![MathBlock::latex("y").into()],
    ));
    let mut doc = latex_doc(dir.path()).with_block(section);

    process_document(&mut doc, &engine).unwrap();

    match &doc.blocks[0] {
        Block::Section(section) => {
            let expected = format!("About image:{}.png[width=72,height=36]", content_identifier("$x$"));
            assert_eq!(section.title(), expected);
            assert!(!section.has_substituted_title());
            assert!(matches!(
                section.blocks[0].children().map(|c| &c[0]),
                Some(Block::Image(_))
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_table_cells() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let nested = Document::new()
        .with_block(MathBlock::latex("z"))
        .with_block(Prose::paragraph("inner stem:[w]"));
    let mut table = Table::with_header(1);
    table.add_row(TableRow::new(vec![
        TableCell::text("stem:[a]"),
        TableCell::literal("stem:[b]"),
        TableCell::asciidoc(nested),
    ]));
    let mut doc = latex_doc(dir.path()).with_block(table);

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(report.nested_documents, 1);
    assert_eq!(report.math_blocks, 1);
    assert_eq!(report.inline_equations, 2);

    match doc.node(&NodePath::root(0).cell(0, 0)) {
        Some(NodeRef::Cell(cell)) => assert!(cell.text.starts_with("image:")),
        other => panic!("unexpected {:?}", other),
    }
    match doc.node(&NodePath::root(0).cell(0, 1)) {
        Some(NodeRef::Cell(cell)) => assert_eq!(cell.text, "stem:[b]"),
        other => panic!("unexpected {:?}", other),
    }
    match doc.node(&NodePath::root(0).cell(0, 2)) {
        Some(NodeRef::Cell(cell)) => {
            let inner = cell.inner_document.as_ref().unwrap();
            assert!(matches!(inner.blocks[0], Block::Image(_)));
            assert!(prose_text(inner, 1).starts_with("inner image:"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!engine.requests.borrow().iter().any(|r| r.contains('b')));
}

// ==================== Configuration ====================

#[test]
fn test_imagesoutdir_relative_to_imagesdir() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("imagesdir", "assets/img")
        .with_attribute("imagesoutdir", "build/img")
        .with_block(MathBlock::latex("x"));

    process_document(&mut doc, &engine).unwrap();

    let file = format!("{}.png", content_identifier("$$x$$"));
    match &doc.blocks[0] {
        Block::Image(image) => assert_eq!(image.target, format!("../../build/img/{}", file)),
        other => panic!("unexpected {:?}", other),
    }
    assert!(dir.path().join("build/img").join(&file).exists());
}

#[test]
fn test_imagesdir_without_imagesoutdir() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("imagesdir", "images")
        .with_block(MathBlock::latex("x"));

    process_document(&mut doc, &engine).unwrap();

    let file = format!("{}.png", content_identifier("$$x$$"));
    match &doc.blocks[0] {
        Block::Image(image) => assert_eq!(image.target, file),
        other => panic!("unexpected {:?}", other),
    }
    assert!(dir.path().join("images").join(&file).exists());
}

#[test]
fn test_unknown_format_falls_back_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("mathematical-format", "bogus")
        .with_block(MathBlock::latex("x"));

    let processor = StemProcessor::from_document(&doc, &engine);
    assert_eq!(processor.options().format, OutputFormat::Png);
    assert_eq!(processor.options().warnings().len(), 1);

    processor.process(&mut doc).unwrap();
    match &doc.blocks[0] {
        Block::Image(image) => assert!(image.target.ends_with(".png")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_inline_with_raster_still_processes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("mathematical-inline", "true")
        .with_block(MathBlock::latex("x"));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(report.files_written, 1);
    assert!(matches!(doc.blocks[0], Block::Image(_)));
}

#[test]
fn test_svg_has_no_declared_size() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("mathematical-format", "svg")
        .with_block(MathBlock::latex("x"))
        .with_block(Prose::paragraph("stem:[y]"));

    process_document(&mut doc, &engine).unwrap();

    match &doc.blocks[0] {
        Block::Image(image) => {
            assert!(image.target.ends_with(".svg"));
            assert_eq!(image.width, None);
            assert_eq!(image.height, None);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        prose_text(&doc, 1),
        format!("image:{}.svg[]", content_identifier("$y$"))
    );
}

#[test]
fn test_inline_mode_embeds_markup() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let engine = MockEngine::new();
    let mut doc = Document::new()
        .with_attribute("stem", "latexmath")
        .with_attribute("outdir", out.to_string_lossy().to_string())
        .with_attribute("mathematical-format", "mathml")
        .with_block(MathBlock::latex("x").with_id("eq"))
        .with_block(Prose::paragraph("see stem:[y]"));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(report.files_written, 0);
    assert!(!out.exists());

    match &doc.blocks[0] {
        Block::Passthrough(pass) => {
            assert_eq!(pass.content, "<div class=\"stemblock\"> <math>$$x$$</math> </div>");
            assert_eq!(pass.id.as_deref(), Some("eq"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        prose_text(&doc, 1),
        "see pass:[<span class=\"steminline\"><math>$y$</math></span>]"
    );
}

#[test]
fn test_builder_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = Document::new().with_block(Prose::paragraph("stem:[x]"));

    StemRender::new()
        .with_dialect(stemrender::Dialect::Latex)
        .with_format(OutputFormat::Svg)
        .with_inline(true)
        .with_outdir(dir.path())
        .process(&mut doc, &engine)
        .unwrap();

    assert_eq!(
        prose_text(&doc, 0),
        "pass:[<span class=\"steminline\"><svg>$x$</svg></span>]"
    );
}

// ==================== Caching and Failures ====================

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let build = |engine: &MockEngine| {
        let mut doc = latex_doc(dir.path())
            .with_block(MathBlock::latex("\\int_0^1 f"))
            .with_block(Prose::paragraph("stem:[g(x)]"));
        process_document(&mut doc, engine).unwrap();
        doc
    };

    let first = build(&MockEngine::new());
    let id = content_identifier("$$\\int_0^1 f$$");
    let bytes = fs::read(dir.path().join(format!("{}.png", id))).unwrap();

    let second = build(&MockEngine::new());
    assert_eq!(first, second);
    assert_eq!(
        fs::read(dir.path().join(format!("{}.png", id))).unwrap(),
        bytes
    );
}

#[test]
fn test_failures_are_skipped_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_block(MathBlock::latex("\\undefined"))
        .with_block(Prose::paragraph("ok stem:[x] bad stem:[\\undefined{y}]"))
        .with_block(MathBlock::latex("z"));

    match process_document(&mut doc, &engine) {
        Err(Error::EquationsFailed(failures)) => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].input, "$$\\undefined$$");
            assert_eq!(failures[1].input, "$\\undefined{y}$");
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(doc.blocks[0], Block::Math(_)));
    assert!(matches!(doc.blocks[2], Block::Image(_)));
    let text = prose_text(&doc, 1);
    assert!(text.starts_with("ok image:"));
    assert!(text.ends_with("bad stem:[\\undefined{y}]"));
}

#[test]
fn test_output_dir_not_created_without_math() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let engine = MockEngine::new();
    let mut doc = Document::new()
        .with_attribute("outdir", out.to_string_lossy().to_string())
        .with_block(Prose::paragraph("Just words: no math."));

    let report = process_document(&mut doc, &engine).unwrap();
    assert_eq!(report.equations(), 0);
    assert!(!out.exists());
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file").unwrap();
    let engine = MockEngine::new();
    let mut doc = latex_doc(dir.path())
        .with_attribute("imagesoutdir", blocker.join("img").to_string_lossy().to_string())
        .with_block(MathBlock::latex("x"));

    let result = process_document(&mut doc, &engine);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_process_json() {
    let dir = tempfile::tempdir().unwrap();
    let engine = MockEngine::new();
    let json = format!(
        r#"{{
            "attributes": {{ "stem": "latexmath", "outdir": {:?} }},
            "blocks": [
                {{ "type": "math", "style": "latexmath", "content": "x^2" }},
                {{ "type": "prose", "context": "paragraph", "lines": ["a stem:[y]"] }}
            ]
        }}"#,
        dir.path().to_string_lossy()
    );

    let output = process_json(&json, &engine, JsonFormat::Compact).unwrap();
    assert!(output.contains("\"type\":\"image\""));
    assert!(output.contains(&content_identifier("$$x^2$$")));
    assert!(output.contains(&content_identifier("$y$")));
}

#[test]
fn test_output_in_wrong_format_is_reported() {
    struct SvgOnly;

    impl MathEngine for SvgOnly {
        fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput> {
            Ok(EngineOutput::new(format!("<svg>{}</svg>", request.input)))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut doc = Document::new()
        .with_attribute("outdir", out.to_string_lossy().to_string())
        .with_block(MathBlock::latex("x"));

    let report = StemRender::new().run(&mut doc, &SvgOnly).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("expected PNG"));
    assert!(matches!(doc.blocks[0], Block::Math(_)));
    assert!(!out.exists());
}
