use super::gemini::Part;
use crate::{Error, Result};
use base64::Engine as _;

const FALLBACK_MIME: &str = "image/png";

/// Sniffs an image mime type from magic bytes.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}

/// A caller-supplied image to send alongside an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    mime_type: String,
    bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidRequest("image payload is empty".to_string()));
        }
        Ok(Self {
            mime_type: mime_type.into(),
            bytes,
        })
    }

    /// Builds an input with the mime type sniffed from `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mime_type = detect_image_mime(&bytes).unwrap_or_else(|| {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                FALLBACK_MIME
            );
            FALLBACK_MIME
        });
        Self::new(bytes, mime_type)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Inline-data request part carrying the base64 encoded bytes.
    pub fn to_part(&self) -> Part {
        Part::inline(
            self.mime_type.clone(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some("image/png")
        );
    }

    #[test]
    fn test_detect_jpeg_webp_gif() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
        assert_eq!(detect_image_mime(b"GIF89a"), Some("image/gif"));
    }

    #[test]
    fn test_unknown_format_is_none() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_from_bytes_falls_back_to_png() {
        let input = ImageInput::from_bytes(vec![0x00, 0x01]).unwrap();
        assert_eq!(input.mime_type(), "image/png");
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let err = ImageInput::from_bytes(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_to_part_encodes_base64() {
        let input = ImageInput::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg").unwrap();
        assert_eq!(input.to_part(), Part::inline("image/jpeg", "/9j/"));
    }
}
