use super::gemini::{GenerateContentRequest, GenerateContentResponse, Part};
use super::GenerativeService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockReply {
    Response(GenerateContentResponse),
    Failure(String),
}

/// Scripted stand-in for the hosted model.
///
/// Replies are served in order and cycle once exhausted. Every request is
/// recorded for later inspection.
pub struct MockGenerativeClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<GenerateContentRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerativeClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: GenerateContentResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Response(response));
        self
    }

    /// Queues a single-candidate reply with one text part.
    pub fn with_text_response(self, text: impl Into<String>) -> Self {
        self.with_response(GenerateContentResponse::from_parts(vec![Part::text(text)]))
    }

    pub fn with_parts_response(self, parts: Vec<Part>) -> Self {
        self.with_response(GenerateContentResponse::from_parts(parts))
    }

    /// Queues a transport failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGenerativeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeService for MockGenerativeClient {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests.lock().unwrap().push(request.clone());

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(GenerateContentResponse::default());
        }

        match &replies[(*count - 1) % replies.len()] {
            MockReply::Response(response) => Ok(response.clone()),
            MockReply::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}
