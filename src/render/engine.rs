//! The math engine seam.
//!
//! Typesetting LaTeX is delegated to an engine. [`CommandEngine`] runs an external
//! program; tests and embedders can supply their own [`MathEngine`].

use super::OutputFormat;
use crate::error::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// A single typesetting request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineRequest<'a> {
    /// Delimited LaTeX (`$...$` or `$$...$$`)
    pub input: &'a str,

    /// Requested output format
    pub format: OutputFormat,

    /// Raster resolution in pixels per inch
    pub ppi: f64,
}

/// Engine output for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// Image bytes or markup
    pub data: Vec<u8>,

    /// Pixel width, if the engine reports it
    pub width_px: Option<u32>,

    /// Pixel height, if the engine reports it
    pub height_px: Option<u32>,
}

impl EngineOutput {
    /// Create output without size information.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            width_px: None,
            height_px: None,
        }
    }

    /// Attach pixel dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width_px = Some(width);
        self.height_px = Some(height);
        self
    }
}

/// Typesets LaTeX into images or markup.
///
/// Malformed input is reported as [`Error::Engine`]; the caller performs no
/// syntax validation of its own.
pub trait MathEngine {
    /// Render one delimited expression.
    fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput>;

    /// Engine name for diagnostics.
    fn name(&self) -> &str {
        "engine"
    }
}

impl<E: MathEngine + ?Sized> MathEngine for &E {
    fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput> {
        (**self).render(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Engine backed by an external program.
///
/// The delimited LaTeX is written to the program's stdin and the artifact is read
/// from its stdout. `{format}` and `{ppi}` in arguments are replaced per request.
///
/// # Example
/// ```no_run
/// use stemrender::render::{CommandEngine, EngineRequest, MathEngine, OutputFormat};
///
/// let engine = CommandEngine::new("tex2img").arg("--format").arg("{format}");
/// let output = engine.render(&EngineRequest {
///     input: "$x^2$",
///     format: OutputFormat::Svg,
///     ppi: 72.0,
/// })?;
/// # Ok::<(), stemrender::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Create an engine running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn expand_args(&self, request: &EngineRequest<'_>) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{format}", request.format.name())
                    .replace("{ppi}", &request.ppi.to_string())
            })
            .collect()
    }
}

impl MathEngine for CommandEngine {
    fn render(&self, request: &EngineRequest<'_>) -> Result<EngineOutput> {
        let mut child = Command::new(&self.program)
            .args(self.expand_args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Engine(format!("failed to run '{}': {}", self.program, e)))?;

        // An engine may exit before reading its input; the exit status decides.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(request.input.as_bytes()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Engine(format!("failed to wait for '{}': {}", self.program, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Engine(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        if let Err(e) = written {
            return Err(Error::Engine(format!(
                "failed to write input to '{}': {}",
                self.program, e
            )));
        }
        if output.stdout.is_empty() {
            return Err(Error::Engine(format!(
                "'{}' produced no output for {}",
                self.program, request.input
            )));
        }

        Ok(EngineOutput::new(output.stdout))
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: OutputFormat) -> EngineRequest<'static> {
        EngineRequest {
            input: "$x^2$",
            format,
            ppi: 300.0,
        }
    }

    #[test]
    fn test_expand_args() {
        let engine = CommandEngine::new("tex2img").args(["-f", "{format}", "--ppi={ppi}"]);
        assert_eq!(
            engine.expand_args(&request(OutputFormat::Png)),
            vec!["-f", "png", "--ppi=300"]
        );
    }

    #[test]
    fn test_missing_program() {
        let engine = CommandEngine::new("stemrender-no-such-program");
        let result = engine.render(&request(OutputFormat::Svg));
        assert!(matches!(result, Err(Error::Engine(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_echoes_stdin() {
        let engine = CommandEngine::new("cat");
        let output = engine.render(&request(OutputFormat::Svg)).unwrap();
        assert_eq!(output.data, b"$x^2$");
        assert_eq!(output.width_px, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit() {
        let engine = CommandEngine::new("sh").args(["-c", "cat >/dev/null; echo bad input >&2; exit 3"]);
        match engine.render(&request(OutputFormat::Svg)) {
            Err(Error::Engine(message)) => assert!(message.contains("bad input")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_without_reading_input() {
        let input = format!("${}$", "x".repeat(1 << 20));
        let request = EngineRequest {
            input: &input,
            format: OutputFormat::Png,
            ppi: 300.0,
        };
        let engine = CommandEngine::new("sh").args(["-c", "echo unsupported >&2; exit 2"]);

        let result = engine.render(&request);
        match &result {
            Err(Error::Engine(message)) => assert!(message.contains("unsupported")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(result.unwrap_err().is_render_failure());
    }
}
