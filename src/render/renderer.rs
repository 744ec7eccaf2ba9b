//! Content-addressed equation rendering.

use super::{EngineRequest, MathEngine, OutputFormat};
use crate::detect::{check_format, png_dimensions};
use crate::error::Result;
use crate::path::OutputLocation;
use md5::{Digest, Md5};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Prefix of generated artifact identifiers.
pub const IDENTIFIER_PREFIX: &str = "stem-";

/// Default raster resolution.
pub const DEFAULT_PPI: f64 = 300.0;

/// Resolution assumed for non-raster formats.
pub const VECTOR_PPI: f64 = 72.0;

/// Deterministic identifier for a delimited input string.
///
/// ```
/// use stemrender::render::content_identifier;
///
/// let id = content_identifier("$$x^2$$");
/// assert!(id.starts_with("stem-"));
/// assert_eq!(id, content_identifier("$$x^2$$"));
/// ```
pub fn content_identifier(input: &str) -> String {
    format!("{}{:x}", IDENTIFIER_PREFIX, Md5::digest(input.as_bytes()))
}

/// Convert a pixel length to points at the given resolution.
pub fn px_to_points(px: u32, ppi: f64) -> u32 {
    (f64::from(px) * 72.0 / ppi).round() as u32
}

/// A rendered equation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    /// Explicit id or content hash
    pub identifier: String,

    /// Format of `data`
    pub format: OutputFormat,

    /// Image bytes or markup
    pub data: Vec<u8>,

    /// Declared width in points (raster only)
    pub width: Option<u32>,

    /// Declared height in points (raster only)
    pub height: Option<u32>,

    /// Reference target, when written to a file
    pub target: Option<String>,

    /// File written, if any
    pub path: Option<PathBuf>,
}

impl RenderedArtifact {
    /// Artifact data as markup text.
    pub fn markup(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Whether the artifact was written to a file.
    pub fn is_file(&self) -> bool {
        self.path.is_some()
    }
}

/// Renders equations through a [`MathEngine`], naming artifacts by content.
///
/// One renderer is used per document pass. Each distinct identifier is rendered
/// and written once; repeats within the pass reuse the first artifact. The output
/// directory is created on the first write.
pub struct EquationRenderer<'e> {
    engine: &'e dyn MathEngine,
    format: OutputFormat,
    ppi: f64,
    inline_mode: bool,
    location: OutputLocation,
    dir_ready: bool,
    cache: HashMap<String, RenderedArtifact>,
    files_written: usize,
}

impl<'e> EquationRenderer<'e> {
    /// Create a renderer writing files under `location`.
    pub fn new(
        engine: &'e dyn MathEngine,
        format: OutputFormat,
        ppi: f64,
        location: OutputLocation,
    ) -> Self {
        Self {
            engine,
            format,
            ppi,
            inline_mode: false,
            location,
            dir_ready: false,
            cache: HashMap::new(),
            files_written: 0,
        }
    }

    /// Return artifacts as data instead of writing files.
    pub fn with_inline_mode(mut self, inline_mode: bool) -> Self {
        self.inline_mode = inline_mode;
        self
    }

    /// Output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether artifacts are returned as data.
    pub fn inline_mode(&self) -> bool {
        self.inline_mode
    }

    /// Resolved output location.
    pub fn location(&self) -> &OutputLocation {
        &self.location
    }

    /// Number of files written so far.
    pub fn files_written(&self) -> usize {
        self.files_written
    }

    /// Render delimited `input`.
    ///
    /// `inline` records whether the expression was written inline; the delimiters
    /// in `input` already carry that distinction for the engine. The identifier is
    /// `explicit_id` when given, else the content hash of `input`.
    pub fn render(
        &mut self,
        input: &str,
        inline: bool,
        explicit_id: Option<&str>,
    ) -> Result<RenderedArtifact> {
        let identifier = match explicit_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => content_identifier(input),
        };

        if let Some(artifact) = self.cache.get(&identifier) {
            log::debug!("Reusing {} for {}", identifier, input);
            return Ok(artifact.clone());
        }

        let output = self.engine.render(&EngineRequest {
            input,
            format: self.format,
            ppi: self.ppi,
        })?;
        check_format(&output.data, self.format)?;

        let (width, height) = if self.format.is_raster() {
            let (w, h) = match (output.width_px, output.height_px) {
                (Some(w), Some(h)) => (w, h),
                _ => png_dimensions(&output.data)?,
            };
            (
                Some(px_to_points(w, self.ppi)),
                Some(px_to_points(h, self.ppi)),
            )
        } else {
            (None, None)
        };

        let mut artifact = RenderedArtifact {
            identifier: identifier.clone(),
            format: self.format,
            data: output.data,
            width,
            height,
            target: None,
            path: None,
        };

        if !self.inline_mode {
            let file_name = format!("{}.{}", identifier, self.format.extension());
            let path = self.location.file_path(&file_name);
            self.ensure_output_dir()?;
            fs::write(&path, &artifact.data)?;
            self.files_written += 1;
            log::debug!(
                "Rendered {} {} to {}",
                if inline { "inline" } else { "block" },
                input,
                path.display()
            );
            artifact.target = Some(self.location.target_for(&file_name));
            artifact.path = Some(path);
        }

        self.cache.insert(identifier, artifact.clone());
        Ok(artifact)
    }

    fn ensure_output_dir(&mut self) -> Result<()> {
        if !self.dir_ready {
            log::debug!("Creating {}", self.location.output_dir.display());
            fs::create_dir_all(&self.location.output_dir)?;
            self.dir_ready = true;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EquationRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquationRenderer")
            .field("engine", &self.engine.name())
            .field("format", &self.format)
            .field("ppi", &self.ppi)
            .field("inline_mode", &self.inline_mode)
            .field("location", &self.location)
            .field("files_written", &self.files_written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::render::EngineOutput;
    use std::cell::Cell;
    use tempfile::tempdir;

    struct FixedEngine {
        calls: Cell<usize>,
    }

    impl MathEngine for FixedEngine {
        fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput> {
            self.calls.set(self.calls.get() + 1);
            if request.input.contains("bad") {
                return Err(Error::Engine("parse error".to_string()));
            }
            if request.input.contains("gif") {
                return Ok(EngineOutput::new(b"GIF89a".to_vec()));
            }
            let data = match request.format {
                OutputFormat::Png => {
                    let mut data = PNG.to_vec();
                    data.extend_from_slice(request.input.as_bytes());
                    data
                }
                OutputFormat::Svg => format!("<svg>{}</svg>", request.input).into_bytes(),
                OutputFormat::MathMl => format!("<math>{}</math>", request.input).into_bytes(),
            };
            Ok(EngineOutput::new(data).with_size(600, 150))
        }
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn engine() -> FixedEngine {
        FixedEngine {
            calls: Cell::new(0),
        }
    }

    fn location(dir: &std::path::Path) -> OutputLocation {
        OutputLocation {
            output_dir: dir.join("img"),
            target_prefix: ".".to_string(),
        }
    }

    #[test]
    fn test_identifier_is_md5_of_input() {
        assert_eq!(
            content_identifier(""),
            "stem-d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_ne!(content_identifier("$x$"), content_identifier("$$x$$"));
    }

    #[test]
    fn test_px_to_points() {
        assert_eq!(px_to_points(600, 300.0), 144);
        assert_eq!(px_to_points(100, 72.0), 100);
    }

    #[test]
    fn test_render_png_writes_file() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut renderer =
            EquationRenderer::new(&engine, OutputFormat::Png, 300.0, location(dir.path()));

        let artifact = renderer.render("$$x^2$$", false, None).unwrap();
        let expected_id = content_identifier("$$x^2$$");
        assert_eq!(artifact.identifier, expected_id);
        assert_eq!(artifact.width, Some(144));
        assert_eq!(artifact.height, Some(36));
        assert_eq!(artifact.target, Some(format!("{}.png", expected_id)));

        let written = fs::read(dir.path().join("img").join(format!("{}.png", expected_id))).unwrap();
        assert!(written.starts_with(PNG));
        assert!(written.ends_with(b"$$x^2$$"));
        assert_eq!(renderer.files_written(), 1);
    }

    #[test]
    fn test_render_repeated_input_once() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut renderer =
            EquationRenderer::new(&engine, OutputFormat::Svg, 72.0, location(dir.path()));

        let first = renderer.render("$x$", true, None).unwrap();
        let second = renderer.render("$x$", true, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.calls.get(), 1);
        assert_eq!(renderer.files_written(), 1);
        assert_eq!(first.width, None);
    }

    #[test]
    fn test_explicit_id() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut renderer =
            EquationRenderer::new(&engine, OutputFormat::Svg, 72.0, location(dir.path()));

        let artifact = renderer.render("$$y$$", false, Some("euler")).unwrap();
        assert_eq!(artifact.identifier, "euler");
        assert!(dir.path().join("img/euler.svg").exists());
    }

    #[test]
    fn test_inline_mode_writes_nothing() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut renderer =
            EquationRenderer::new(&engine, OutputFormat::MathMl, 72.0, location(dir.path()))
                .with_inline_mode(true);

        let artifact = renderer.render("$x$", true, None).unwrap();
        assert_eq!(artifact.markup(), "<math>$x$</math>");
        assert!(!artifact.is_file());
        assert!(!dir.path().join("img").exists());
    }

    #[test]
    fn test_engine_error_creates_nothing() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut renderer =
            EquationRenderer::new(&engine, OutputFormat::Png, 300.0, location(dir.path()));

        let result = renderer.render("$bad$", true, None);
        assert!(matches!(result, Err(Error::Engine(_))));
        assert!(!dir.path().join("img").exists());
    }

    #[test]
    fn test_unexpected_output_format_rejected() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut renderer =
            EquationRenderer::new(&engine, OutputFormat::Png, 300.0, location(dir.path()));

        let err = renderer.render("$gif$", true, None).unwrap_err();
        assert!(matches!(err, Error::UnknownImageFormat(_)));
        assert!(err.is_render_failure());
        assert!(!dir.path().join("img").exists());
        assert_eq!(renderer.files_written(), 0);
    }
}
