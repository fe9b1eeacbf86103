//! Format detection utilities.
//!
//! Sniffs artifact formats from magic bytes, so rendered output can be
//! checked against the format that was asked for.

use crate::{IoError, IoResult};
use figcheck_core::ArtifactFormat;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes inspected when sniffing text-based formats.
const SNIFF_LEN: usize = 512;

/// Detects format from raw bytes (magic number check).
pub fn from_bytes(bytes: &[u8]) -> Option<ArtifactFormat> {
    if bytes.len() < 4 {
        return None;
    }

    if bytes.starts_with(&PNG_SIGNATURE) {
        return Some(ArtifactFormat::Png);
    }

    // PDF: %PDF
    if bytes.starts_with(b"%PDF") {
        return Some(ArtifactFormat::Pdf);
    }

    // EPS: %!PS, or the DOS EPS binary header C5 D0 D3 C6
    if bytes.starts_with(b"%!PS") || bytes.starts_with(&[0xC5, 0xD0, 0xD3, 0xC6]) {
        return Some(ArtifactFormat::Eps);
    }

    // SVG: an <svg element near the start of an XML document
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    let markup = ["<?xml", "<svg", "<!DOCTYPE", "<!--"]
        .iter()
        .any(|start| trimmed.starts_with(start));
    if markup && text.contains("<svg") {
        return Some(ArtifactFormat::Svg);
    }

    None
}

/// Checks that rendered bytes are an artifact of the declared format.
///
/// ```rust
/// use figcheck_core::ArtifactFormat;
/// use figcheck_io::detect::check_format;
///
/// assert!(check_format(b"%PDF-1.7\n%%EOF\n", ArtifactFormat::Pdf).is_ok());
/// assert!(check_format(b"<svg/>", ArtifactFormat::Png).is_err());
/// ```
pub fn check_format(bytes: &[u8], declared: ArtifactFormat) -> IoResult<()> {
    match from_bytes(bytes) {
        Some(found) if found == declared => Ok(()),
        found => Err(IoError::FormatMismatch {
            declared,
            found: found.map_or_else(|| "unrecognized bytes".to_string(), |f| f.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(from_bytes(&PNG_SIGNATURE), Some(ArtifactFormat::Png));
        assert_eq!(from_bytes(b"%PDF-1.4\n"), Some(ArtifactFormat::Pdf));
        assert_eq!(from_bytes(b"%!PS-Adobe-3.0 EPSF-3.0"), Some(ArtifactFormat::Eps));
        assert_eq!(
            from_bytes(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\">"),
            Some(ArtifactFormat::Svg)
        );
        assert_eq!(
            from_bytes(b"<!-- made by plotter -->\n<svg/>"),
            Some(ArtifactFormat::Svg)
        );
        assert_eq!(from_bytes(b"GIF89a"), None);
        assert_eq!(from_bytes(b"ab"), None);
    }

    #[test]
    fn test_check_format() {
        check_format(&PNG_SIGNATURE, ArtifactFormat::Png).unwrap();
        check_format(b"%!PS-Adobe-3.0\n", ArtifactFormat::Eps).unwrap();

        let err = check_format(b"%PDF-1.4\n", ArtifactFormat::Png).unwrap_err();
        assert_eq!(err.to_string(), "rendered artifact is pdf, expected png");

        let err = check_format(b"GIF89a....", ArtifactFormat::Svg).unwrap_err();
        assert!(matches!(err, IoError::FormatMismatch { declared: ArtifactFormat::Svg, .. }));
    }
}
