//! Generative model integration
//!
//! [`GenerativeService`] is the single seam to the hosted model. Everything
//! else in this module is built on top of it: shape-constrained JSON decoding,
//! image extraction from multi-part responses, and chat relaying.

pub mod decode;
pub mod extract;
pub mod gemini;
pub mod generator;
pub mod mime;
pub mod mock;
pub mod relay;

pub use decode::{DecodeFailure, Decoded};
pub use extract::{EditedImage, MultipartExtractor};
pub use gemini::GeminiHttpClient;
pub use generator::{GenerationRequest, Modality, SchemaGenerator};
pub use mime::ImageInput;
pub use mock::MockGenerativeClient;
pub use relay::{ChatRelay, ChatSession};

use crate::Result;
use async_trait::async_trait;
use gemini::{GenerateContentRequest, GenerateContentResponse};

/// One request/response exchange with the hosted model.
///
/// Implementations hold no per-call state, so one handle may serve
/// concurrent callers.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}
