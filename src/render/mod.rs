//! Rendering equations to artifacts, and tree (de)serialization.

mod engine;
mod format;
mod json;
mod renderer;

pub use engine::{CommandEngine, EngineOutput, EngineRequest, MathEngine};
pub use format::OutputFormat;
pub use json::{from_json, to_json, JsonFormat};
pub use renderer::{
    content_identifier, px_to_points, EquationRenderer, RenderedArtifact, DEFAULT_PPI,
    IDENTIFIER_PREFIX, VECTOR_PPI,
};
