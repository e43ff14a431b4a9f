use std::sync::Arc;

use super::client::GeminiClient;
use super::types::{ChatConfig, Content, GenerateContentRequest, GenerationConfig};
use crate::error::{AIError, Result};

/// A stateful conversation with one model.
///
/// The session owns its turn history. A turn is only recorded once the model
/// has answered, so a failed call leaves the history untouched.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: Arc<GeminiClient>,
    model: String,
    config: ChatConfig,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new(
        client: Arc<GeminiClient>,
        model: impl Into<String>,
        config: ChatConfig,
        history: Vec<Content>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            config,
            history,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Content> {
        self.history
    }

    fn request_with(&self, message: &Content) -> GenerateContentRequest {
        let mut contents = self.history.clone();
        contents.push(message.clone());
        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(self.config.system_instruction.as_str())),
            tools: self.config.tools.clone(),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.config.temperature),
            }),
        }
    }

    pub async fn send_message(&mut self, text: &str) -> Result<String> {
        let message = Content::user(text);
        let request = self.request_with(&message);
        let response = self.client.generate_content(&self.model, &request).await?;
        let reply = response.text().ok_or(AIError::EmptyResponse)?;

        self.record(message, &reply);
        Ok(reply)
    }

    pub async fn send_message_stream(
        &mut self,
        text: &str,
        on_chunk: impl FnMut(&str),
    ) -> Result<String> {
        let message = Content::user(text);
        let request = self.request_with(&message);
        let reply = self
            .client
            .stream_generate_content(&self.model, &request, on_chunk)
            .await?;
        if reply.is_empty() {
            return Err(AIError::EmptyResponse);
        }

        self.record(message, &reply);
        Ok(reply)
    }

    fn record(&mut self, message: Content, reply: &str) {
        self.history.push(message);
        self.history.push(Content::model(reply));
    }
}
