//! Schema-constrained generation: one request, one decode.

use super::decode::{self, Decoded};
use super::gemini::{Content, GenerateContentRequest, GenerationConfig, Part};
use super::mime::ImageInput;
use super::GenerativeService;
use crate::schema::Shape;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Output modality requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Text,
    Image,
    Json,
}

/// Everything needed to issue one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    instruction: String,
    shape: Option<Shape>,
    modality: Modality,
    image: Option<ImageInput>,
    system_instruction: Option<String>,
}

impl GenerationRequest {
    /// JSON output constrained to `shape`.
    pub fn json(instruction: impl Into<String>, shape: Shape) -> Self {
        Self {
            instruction: instruction.into(),
            shape: Some(shape),
            modality: Modality::Json,
            image: None,
            system_instruction: None,
        }
    }

    /// Unconstrained text output.
    pub fn text(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            shape: None,
            modality: Modality::Text,
            image: None,
            system_instruction: None,
        }
    }

    /// Image-only output derived from a source image.
    pub fn image_edit(image: ImageInput, instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            shape: None,
            modality: Modality::Image,
            image: Some(image),
            system_instruction: None,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(text.into());
        self
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Rejects requests that must not reach the network.
    pub fn validate(&self) -> Result<()> {
        if self.instruction.trim().is_empty() {
            return Err(Error::InvalidRequest("instruction is empty".to_string()));
        }
        match (&self.modality, &self.shape) {
            (Modality::Json, None) => Err(Error::InvalidRequest(
                "JSON generation requires an output shape".to_string(),
            )),
            (_, Some(shape)) => shape.validate(),
            _ => Ok(()),
        }
    }

    /// Gemini wire form. The image, when present, precedes the instruction.
    pub fn to_wire(&self) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &self.image {
            parts.push(image.to_part());
        }
        parts.push(Part::text(self.instruction.clone()));

        let generation_config = match self.modality {
            Modality::Text => None,
            Modality::Json => Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: self.shape.clone(),
                ..Default::default()
            }),
            Modality::Image => Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            }),
        };

        GenerateContentRequest {
            system_instruction: self.system_instruction.as_deref().map(Content::bare),
            contents: vec![Content::user(parts)],
            generation_config,
        }
    }
}

/// Issues shape-constrained requests and decodes their text output.
pub struct SchemaGenerator {
    service: Arc<dyn GenerativeService>,
    strict: bool,
}

impl SchemaGenerator {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self {
            service,
            strict: false,
        }
    }

    /// When enabled, decoded values are also checked against the shape and
    /// violations become decode failures.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Asks for JSON matching `shape` and decodes it as `T`.
    pub async fn generate<T: DeserializeOwned>(
        &self,
        instruction: &str,
        shape: &Shape,
    ) -> Result<Decoded<T>> {
        self.generate_request(&GenerationRequest::json(instruction, shape.clone()))
            .await
    }

    /// Sends `request` once and decodes the response text as JSON.
    ///
    /// `Err` means the call itself failed. A completed call whose text is
    /// missing or undecodable yields `Decoded::Failed`.
    pub async fn generate_request<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
    ) -> Result<Decoded<T>> {
        request.validate()?;

        let response = self.service.generate_content(&request.to_wire()).await?;

        let decoded = match response.text() {
            None => Decoded::failed("", "response contained no text"),
            Some(raw) => self.decode_text(&raw, request.shape()),
        };

        if let Some(failure) = decoded.failure() {
            tracing::warn!("Model output could not be decoded: {}", failure);
        }
        Ok(decoded)
    }

    fn decode_text<T: DeserializeOwned>(&self, raw: &str, shape: Option<&Shape>) -> Decoded<T> {
        let value = match decode::decode_value(raw) {
            Decoded::Value(value) => value,
            Decoded::Failed(failure) => return Decoded::Failed(failure),
        };

        if self.strict {
            if let Some(violation) = shape.and_then(|s| s.check(&value).err()) {
                return Decoded::failed(raw, format!("shape violation at {}", violation));
            }
        }

        decode::cast(raw, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::GenerateContentResponse;
    use crate::ai::MockGenerativeClient;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    const NEON_TAGS: &str = "[{\"label\":\"sun\",\"tone\":\"neon\"}]";

    fn tags_shape() -> Shape {
        Shape::array(Shape::object([
            ("label", Shape::string()),
            ("tone", Shape::one_of(["warm", "cool"])),
        ]))
    }

    #[test]
    fn test_json_request_wire_form() {
        let wire = serde_json::to_value(
            GenerationRequest::json("Give me tags", tags_shape()).to_wire(),
        )
        .unwrap();

        assert_eq!(wire["contents"][0]["parts"], json!([{ "text": "Give me tags" }]));
        assert_eq!(
            wire["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(wire["generationConfig"]["responseSchema"]["type"], json!("ARRAY"));
        assert!(wire.get("system_instruction").is_none());
    }

    #[test]
    fn test_image_edit_wire_form_puts_image_first() {
        let image = ImageInput::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png").unwrap();
        let wire =
            serde_json::to_value(GenerationRequest::image_edit(image, "make it blue").to_wire())
                .unwrap();

        let parts = &wire["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/png"));
        assert_eq!(parts[1]["text"], json!("make it blue"));
        assert_eq!(
            wire["generationConfig"],
            json!({ "responseModalities": ["IMAGE"] })
        );
    }

    #[test]
    fn test_text_request_has_no_generation_config() {
        let wire = serde_json::to_value(
            GenerationRequest::text("describe").with_system_instruction("be brief").to_wire(),
        )
        .unwrap();
        assert!(wire.get("generationConfig").is_none());
        assert_eq!(wire["system_instruction"]["parts"][0]["text"], json!("be brief"));
    }

    #[test]
    fn test_validate_rejects_empty_instruction_and_missing_shape() {
        let err = GenerationRequest::json("  ", tags_shape()).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let mut request = GenerationRequest::text("x");
        request.modality = Modality::Json;
        assert!(request.validate().is_err());
    }

    #[tokio::test]
    async fn test_generate_decodes_fenced_output() {
        let client = Arc::new(
            MockGenerativeClient::new()
                .with_text_response("```json\n[{\"label\":\"sun\",\"tone\":\"warm\"}]\n```"),
        );
        let generator = SchemaGenerator::new(client.clone());

        let decoded: Decoded<Value> = generator
            .generate("Give me tags", &tags_shape())
            .await
            .unwrap();

        assert_eq!(
            decoded,
            Decoded::Value(json!([{ "label": "sun", "tone": "warm" }]))
        );
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_returns_failure_for_prose() {
        let raw = "Sure! Here's your JSON: {\"a\":1}";
        let client = Arc::new(MockGenerativeClient::new().with_text_response(raw));
        let generator = SchemaGenerator::new(client);

        let decoded: Decoded<Value> = generator.generate("x", &tags_shape()).await.unwrap();
        assert_eq!(decoded.failure().map(|f| f.raw.as_str()), Some(raw));
    }

    #[tokio::test]
    async fn test_generate_treats_missing_text_as_failure() {
        let client = Arc::new(
            MockGenerativeClient::new().with_response(GenerateContentResponse::default()),
        );
        let generator = SchemaGenerator::new(client);

        let decoded: Decoded<Value> = generator.generate("x", &tags_shape()).await.unwrap();
        assert!(!decoded.is_value());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = Arc::new(MockGenerativeClient::new().with_failure("status 503"));
        let generator = SchemaGenerator::new(client);

        let err = generator
            .generate::<Value>("x", &tags_shape())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_service() {
        let client = Arc::new(MockGenerativeClient::new());
        let generator = SchemaGenerator::new(client.clone());

        let broken = Shape::object([("a", Shape::string())]).with_required(["b"]);
        let err = generator.generate::<Value>("x", &broken).await.unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(client.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_lenient_mode_trusts_nonconforming_output() {
        let client = Arc::new(MockGenerativeClient::new().with_text_response(NEON_TAGS));
        let generator = SchemaGenerator::new(client);

        let decoded: Decoded<Value> = generator.generate("x", &tags_shape()).await.unwrap();
        assert!(decoded.is_value());
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_enum_violation() {
        let client = Arc::new(MockGenerativeClient::new().with_text_response(NEON_TAGS));
        let generator = SchemaGenerator::new(client).strict(true);

        let decoded: Decoded<Value> = generator.generate("x", &tags_shape()).await.unwrap();
        let failure = decoded.failure().unwrap();
        assert!(failure.reason.contains("$[0].tone"));
    }

    #[tokio::test]
    async fn test_count_in_instruction_is_not_enforced() {
        let client = Arc::new(MockGenerativeClient::new().with_text_response(
            "[{\"label\":\"a\",\"tone\":\"warm\"},{\"label\":\"b\",\"tone\":\"cool\"}]",
        ));
        let generator = SchemaGenerator::new(client);

        let decoded: Vec<Value> = generator
            .generate("Generate 5 tags", &tags_shape())
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(decoded.len(), 2);
    }
}
