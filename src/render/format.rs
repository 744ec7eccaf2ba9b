//! Output format selection.

use serde::{Deserialize, Serialize};

/// Format rendered equations are produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raster image at a fixed resolution
    #[default]
    Png,
    /// Vector image
    Svg,
    /// Markup embedded directly in the document
    MathMl,
}

impl OutputFormat {
    /// Parse a format name (`png`, `svg`, `mathml`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "svg" => Some(OutputFormat::Svg),
            "mathml" => Some(OutputFormat::MathMl),
            _ => None,
        }
    }

    /// Format name as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::MathMl => "mathml",
        }
    }

    /// File extension for written artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::MathMl => "mml",
        }
    }

    /// Whether this is a raster format with a resolution and declared size.
    pub fn is_raster(&self) -> bool {
        matches!(self, OutputFormat::Png)
    }

    /// Whether artifacts in this format can only be embedded, never written.
    pub fn is_markup(&self) -> bool {
        matches!(self, OutputFormat::MathMl)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(OutputFormat::from_name("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_name("SVG"), Some(OutputFormat::Svg));
        assert_eq!(OutputFormat::from_name("mathml"), Some(OutputFormat::MathMl));
        assert_eq!(OutputFormat::from_name("bogus"), None);
    }

    #[test]
    fn test_raster() {
        assert!(OutputFormat::Png.is_raster());
        assert!(!OutputFormat::Svg.is_raster());
        assert!(OutputFormat::MathMl.is_markup());
    }
}
