//! Error types for stemrender library.

use std::io;
use thiserror::Error;

/// Result type alias for stemrender operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rendering equations in a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when creating directories or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error (de)serializing a document tree.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The math engine rejected an expression or could not be run.
    #[error("Math engine error: {0}")]
    Engine(String),

    /// Engine output is not a recognized image format.
    #[error("Unknown image format: {0}")]
    UnknownImageFormat(String),

    /// One or more equations failed to render during a pass.
    #[error("{} equation(s) failed to render; first: {}", .0.len(), first_failure(.0))]
    EquationsFailed(Vec<RenderFailure>),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error concerns a single equation rather than the whole pass.
    ///
    /// Engine rejections and unreadable engine output are recorded and skipped;
    /// everything else aborts processing.
    pub fn is_render_failure(&self) -> bool {
        matches!(self, Error::Engine(_) | Error::UnknownImageFormat(_))
    }
}

/// A single equation that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    /// Delimited input handed to the engine (e.g. `$x^2$`)
    pub input: String,

    /// Engine diagnostic
    pub message: String,
}

impl RenderFailure {
    /// Create a new failure record.
    pub fn new(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.input, self.message)
    }
}

fn first_failure(failures: &[RenderFailure]) -> String {
    failures
        .first()
        .map(|f| f.to_string())
        .unwrap_or_default()
}
