//! Caller-facing surface: one operation per generated entity family.

use crate::ai::{
    ChatRelay, ChatSession, EditedImage, GeminiHttpClient, GenerationRequest, GenerativeService,
    ImageInput, MultipartExtractor, SchemaGenerator,
};
use crate::models::{
    Canvas, ChatSummary, Config, Integration, LogReport, Message, Shaped, UserProfile, VaultNode,
};
use crate::schema::Shape;
use crate::{prompts, Error, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::info;

/// Mock data generator over a text model and an image model.
pub struct App {
    generator: SchemaGenerator,
    relay: ChatRelay,
    text: Arc<dyn GenerativeService>,
    image: Arc<dyn GenerativeService>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text: Arc<dyn GenerativeService>,
    pub image: Arc<dyn GenerativeService>,
    pub strict_shapes: bool,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            generator: SchemaGenerator::new(services.text.clone()).strict(services.strict_shapes),
            relay: ChatRelay::new(services.text.clone()),
            text: services.text,
            image: services.image,
        }
    }

    /// Build Gemini-backed services from configuration.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across both model clients.
        let http_client = reqwest::Client::new();

        info!("Text model: {}", config.text_model);
        info!("Image model: {}", config.image_model);

        let text = GeminiHttpClient::new_with_client(
            config.api_key.clone(),
            config.text_model.clone(),
            config.timeout,
            http_client.clone(),
        );
        let image = GeminiHttpClient::new_with_client(
            config.api_key.clone(),
            config.image_model.clone(),
            config.timeout,
            http_client,
        );

        Self::with_services(AppServices {
            text: Arc::new(text),
            image: Arc::new(image),
            strict_shapes: config.strict_shapes,
        })
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        operation: &str,
        instruction: String,
        shape: Shape,
    ) -> Result<Option<T>> {
        info!("Generating {}", operation);
        let decoded = self.generator.generate(&instruction, &shape).await?;
        if !decoded.is_value() {
            info!("No usable {} in model output", operation);
        }
        Ok(decoded.into_option())
    }

    pub async fn generate_profile(&self) -> Result<Option<UserProfile>> {
        self.generate("profile", prompts::PROFILE.to_string(), UserProfile::shape())
            .await
    }

    pub async fn generate_chat_list(&self, count: usize) -> Result<Option<Vec<ChatSummary>>> {
        let instruction = counted(prompts::CHAT_LIST, count, &[])?;
        self.generate("chat list", instruction, ChatSummary::list_shape())
            .await
    }

    pub async fn generate_chat_history(
        &self,
        title: &str,
        count: usize,
    ) -> Result<Option<Vec<Message>>> {
        let title = prompts::neutralize_fences(title);
        let instruction = counted(prompts::CHAT_HISTORY, count, &[("title", title.as_str())])?;
        self.generate("chat history", instruction, Message::list_shape())
            .await
    }

    pub async fn generate_canvases(&self, count: usize) -> Result<Option<Vec<Canvas>>> {
        let instruction = counted(prompts::CANVASES, count, &[])?;
        self.generate("canvases", instruction, Canvas::list_shape())
            .await
    }

    pub async fn generate_vault_nodes(&self, count: usize) -> Result<Option<Vec<VaultNode>>> {
        let instruction = counted(prompts::VAULT_NODES, count, &[])?;
        self.generate("vault nodes", instruction, VaultNode::list_shape())
            .await
    }

    pub async fn generate_integrations(&self, count: usize) -> Result<Option<Vec<Integration>>> {
        let instruction = counted(prompts::INTEGRATIONS, count, &[])?;
        self.generate("integrations", instruction, Integration::list_shape())
            .await
    }

    /// Restructures a raw log. The log text is only fence-neutralized, never
    /// parsed locally.
    pub async fn extract_log(&self, raw_log: &str) -> Result<Option<LogReport>> {
        if raw_log.trim().is_empty() {
            return Err(Error::InvalidRequest("log text is empty".to_string()));
        }
        let log = prompts::neutralize_fences(raw_log);
        let instruction = prompts::render(prompts::LOG_EXTRACTION, &[("log", log.as_str())]);
        self.generate("log report", instruction, LogReport::shape())
            .await
    }

    /// Plain-text description of an image, verbatim from the model.
    pub async fn describe_image(&self, image: ImageInput) -> Result<Option<String>> {
        let request = GenerationRequest::text(prompts::DESCRIBE_IMAGE).with_image(image);
        request.validate()?;

        info!("Describing image");
        let response = self.text.generate_content(&request.to_wire()).await?;
        Ok(response.text().filter(|text| !text.is_empty()))
    }

    /// Edits an image; `None` when the model returned no image part.
    pub async fn edit_image(
        &self,
        image: ImageInput,
        instruction: &str,
    ) -> Result<Option<EditedImage>> {
        let request = GenerationRequest::image_edit(image, instruction);
        request.validate()?;

        info!("Editing image");
        let response = self.image.generate_content(&request.to_wire()).await?;
        let edited = MultipartExtractor::first_image_in(&response);
        if edited.is_none() {
            info!("Image edit returned no image part");
        }
        Ok(edited)
    }

    /// A fresh chat session primed with the assistant persona.
    pub fn new_chat_session(&self) -> ChatSession {
        ChatSession::new().with_system_instruction(prompts::CHAT_SYSTEM.trim())
    }

    pub async fn send_chat(
        &self,
        session: &mut ChatSession,
        message: &str,
    ) -> Result<Option<String>> {
        self.relay.send(session, message).await
    }
}

fn counted(template: &str, count: usize, vars: &[(&str, &str)]) -> Result<String> {
    if count == 0 {
        return Err(Error::InvalidRequest(
            "requested item count must be at least 1".to_string(),
        ));
    }
    let count = count.to_string();
    let mut all = vec![("count", count.as_str())];
    all.extend_from_slice(vars);
    Ok(prompts::render(template, &all))
}
