//! Picks the image out of a multi-part model response.

use super::gemini::{GenerateContentResponse, InlineData, Part};
use base64::Engine as _;

/// Stateless finder for inline media in response segments.
pub struct MultipartExtractor;

impl MultipartExtractor {
    /// Returns the first inline-binary segment, skipping text segments.
    ///
    /// `None` is an ordinary outcome: the model may answer an image request
    /// with text only.
    pub fn first_image(segments: &[Part]) -> Option<&InlineData> {
        segments.iter().find_map(|segment| match segment {
            Part::InlineData { inline_data } => Some(inline_data),
            Part::Text { .. } => None,
        })
    }

    /// [`MultipartExtractor::first_image`] over the first candidate, decoded to bytes.
    ///
    /// A payload that is not valid base64 counts as absent.
    pub fn first_image_in(response: &GenerateContentResponse) -> Option<EditedImage> {
        let inline = Self::first_image(response.parts())?;
        match base64::engine::general_purpose::STANDARD.decode(&inline.data) {
            Ok(bytes) => Some(EditedImage {
                mime_type: inline.mime_type.clone(),
                bytes,
            }),
            Err(e) => {
                tracing::warn!(
                    mime_type = %inline.mime_type,
                    "Discarding image part with invalid base64 payload: {}",
                    e
                );
                None
            }
        }
    }
}

/// Image bytes returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EditedImage {
    /// Conventional file extension for the mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}
