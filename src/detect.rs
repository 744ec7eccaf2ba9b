//! Engine output format detection and raster dimension probing.

use crate::error::{Error, Result};
use crate::render::OutputFormat;

/// Image format of rendered engine output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG raster image
    Png,
    /// SVG vector image
    Svg,
    /// MathML markup
    MathMl,
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Svg => write!(f, "SVG"),
            ImageFormat::MathMl => write!(f, "MathML"),
        }
    }
}

impl From<OutputFormat> for ImageFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Svg => ImageFormat::Svg,
            OutputFormat::MathMl => ImageFormat::MathMl,
        }
    }
}

/// PNG signature bytes
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
/// Signature, chunk length, chunk type, width, height
const PNG_HEADER_LEN: usize = 8 + 4 + 4 + 4 + 4;
const SNIFF_LEN: usize = 256;

/// Detect the image format of engine output.
///
/// # Returns
/// * `Ok(ImageFormat)` for PNG, SVG or MathML data
/// * `Err(Error::UnknownImageFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(PNG_MAGIC) {
        return Ok(ImageFormat::Png);
    }

    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();

    if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
        return Ok(ImageFormat::Svg);
    }
    if text.starts_with("<math") || (text.starts_with("<?xml") && text.contains("<math")) {
        return Ok(ImageFormat::MathMl);
    }

    Err(Error::UnknownImageFormat(describe(head)))
}

/// Check that engine output is in the requested format.
///
/// # Example
/// ```
/// use stemrender::detect::check_format;
/// use stemrender::OutputFormat;
///
/// assert!(check_format(b"<svg/>", OutputFormat::Svg).is_ok());
/// assert!(check_format(b"<svg/>", OutputFormat::Png).is_err());
/// ```
pub fn check_format(data: &[u8], expected: OutputFormat) -> Result<()> {
    let found = detect_format_from_bytes(data)?;
    if found == ImageFormat::from(expected) {
        Ok(())
    } else {
        Err(Error::UnknownImageFormat(format!(
            "expected {}, engine produced {}",
            ImageFormat::from(expected),
            found
        )))
    }
}

/// Read pixel dimensions from a PNG header.
///
/// # Returns
/// * `Ok((width, height))` if the data starts with a valid PNG `IHDR` chunk
/// * `Err(Error::UnknownImageFormat)` otherwise
pub fn png_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.len() < PNG_HEADER_LEN || !data.starts_with(PNG_MAGIC) {
        return Err(Error::UnknownImageFormat(describe(data)));
    }
    if &data[12..16] != b"IHDR" {
        return Err(Error::UnknownImageFormat(
            "PNG without leading IHDR chunk".to_string(),
        ));
    }

    let width = read_u32_be(&data[16..20]);
    let height = read_u32_be(&data[20..24]);
    Ok((width, height))
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn describe(data: &[u8]) -> String {
    let prefix: String = String::from_utf8_lossy(&data[..data.len().min(16)])
        .chars()
        .map(|c| if c.is_control() { '.' } else { c })
        .collect();
    format!("{} bytes starting with {:?}", data.len(), prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn test_detect_png() {
        let data = png_header(10, 20);
        assert_eq!(detect_format_from_bytes(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_svg() {
        let data = b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        assert_eq!(detect_format_from_bytes(data).unwrap(), ImageFormat::Svg);
        assert_eq!(
            detect_format_from_bytes(b"  <svg width=\"1pt\"></svg>").unwrap(),
            ImageFormat::Svg
        );
    }

    #[test]
    fn test_detect_mathml() {
        let data = b"<math xmlns=\"http://www.w3.org/1998/Math/MathML\"><mi>x</mi></math>";
        assert_eq!(detect_format_from_bytes(data).unwrap(), ImageFormat::MathMl);
    }

    #[test]
    fn test_detect_unknown() {
        let result = detect_format_from_bytes(b"GIF89a");
        assert!(matches!(result, Err(Error::UnknownImageFormat(_))));
    }

    #[test]
    fn test_check_format() {
        assert!(check_format(&png_header(1, 1), OutputFormat::Png).is_ok());
        assert!(check_format(b"<math><mi>x</mi></math>", OutputFormat::MathMl).is_ok());

        match check_format(&png_header(1, 1), OutputFormat::Svg) {
            Err(Error::UnknownImageFormat(message)) => {
                assert_eq!(message, "expected SVG, engine produced PNG")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(check_format(b"plain text", OutputFormat::Svg)
            .unwrap_err()
            .is_render_failure());
    }

    #[test]
    fn test_png_dimensions() {
        assert_eq!(png_dimensions(&png_header(600, 150)).unwrap(), (600, 150));
    }

    #[test]
    fn test_png_dimensions_truncated() {
        let data = png_header(1, 1);
        assert!(png_dimensions(&data[..20]).is_err());
    }
}
