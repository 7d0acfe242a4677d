//! Free-form chat continuation over a caller-owned session.

use super::gemini::{Content, GenerateContentRequest, Part};
use super::GenerativeService;
use crate::{Error, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Conversation state owned by the caller.
///
/// The relay only ever appends a user turn together with the model's reply,
/// so the history always alternates roles.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    system_instruction: Option<String>,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            system_instruction: None,
            history: Vec::new(),
        }
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(text.into());
        self
    }

    /// Resumes a conversation from previously stored turns.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends one user turn and reads back one text reply.
pub struct ChatRelay {
    service: Arc<dyn GenerativeService>,
}

impl ChatRelay {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    /// Returns the model's reply verbatim, or `None` when it is empty.
    ///
    /// The session is only extended when a reply arrives; a failed or empty
    /// exchange leaves it untouched.
    pub async fn send(&self, session: &mut ChatSession, message: &str) -> Result<Option<String>> {
        if message.trim().is_empty() {
            return Err(Error::InvalidRequest("chat message is empty".to_string()));
        }

        let mut contents = session.history.clone();
        contents.push(Content::user(vec![Part::text(message)]));
        let request = GenerateContentRequest {
            system_instruction: session.system_instruction.as_deref().map(Content::bare),
            contents,
            generation_config: None,
        };

        tracing::debug!(
            session = %session.id,
            prior_turns = session.history.len(),
            "Relaying chat message"
        );
        let response = self.service.generate_content(&request).await?;

        match response.text().filter(|reply| !reply.is_empty()) {
            Some(reply) => {
                session.history = request.contents;
                session.history.push(Content::model(reply.clone()));
                Ok(Some(reply))
            }
            None => {
                tracing::warn!(session = %session.id, "Chat reply contained no text");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerativeClient;
    use pretty_assertions::assert_eq;

    fn prior_session() -> ChatSession {
        ChatSession::new().with_history(vec![
            Content::user(vec![Part::text("hi")]),
            Content::model("Hello! How can I help?"),
        ])
    }

    #[tokio::test]
    async fn test_send_returns_reply_unchanged_and_extends_history() {
        let client = Arc::new(MockGenerativeClient::new().with_text_response("  Hey there!\n"));
        let relay = ChatRelay::new(client.clone());
        let mut session = prior_session();

        let reply = relay.send(&mut session, "hello").await.unwrap();

        assert_eq!(reply.as_deref(), Some("  Hey there!\n"));
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[2], Content::user(vec![Part::text("hello")]));
        assert_eq!(session.history()[3], Content::model("  Hey there!\n"));

        let sent = &client.requests()[0];
        assert_eq!(sent.contents.len(), 3);
        assert!(sent.generation_config.is_none());
    }

    #[tokio::test]
    async fn test_empty_reply_is_none_and_history_untouched() {
        let client = Arc::new(MockGenerativeClient::new().with_text_response(""));
        let relay = ChatRelay::new(client);
        let mut session = prior_session();

        let reply = relay.send(&mut session, "hello").await.unwrap();

        assert_eq!(reply, None);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_and_history_untouched() {
        let client = Arc::new(MockGenerativeClient::new().with_failure("status 500"));
        let relay = ChatRelay::new(client);
        let mut session = prior_session();

        let err = relay.send(&mut session, "hello").await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_system_instruction_is_sent() {
        let client = Arc::new(MockGenerativeClient::new().with_text_response("ok"));
        let relay = ChatRelay::new(client.clone());
        let mut session = ChatSession::new().with_system_instruction("You are a pirate");

        relay.send(&mut session, "ahoy").await.unwrap();

        let sent = &client.requests()[0];
        assert_eq!(sent.system_instruction, Some(Content::bare("You are a pirate")));
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let client = Arc::new(MockGenerativeClient::new());
        let relay = ChatRelay::new(client.clone());

        let err = relay.send(&mut ChatSession::new(), " ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(client.get_call_count(), 0);
    }
}
