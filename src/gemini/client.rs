use serde::Serialize;

use super::types::{
    Content, EmbedContentRequest, EmbedContentResponse, ErrorBody, GenerateContentRequest,
    GenerateContentResponse,
};
use crate::error::{AIError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Thin REST client for the Gemini API.
///
/// Construction never fails, even with an empty key: a bad key is reported by
/// the API on the first request.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url,
            model.trim_start_matches("models/"),
            method
        )
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent");
        log::debug!("POST {url}");
        let response = self.post(&url, request).await?;
        Ok(response.json().await?)
    }

    /// Streams the reply, handing each text delta to `on_chunk`, and returns
    /// the concatenated text.
    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        mut on_chunk: impl FnMut(&str),
    ) -> Result<String> {
        let url = format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent"));
        log::debug!("POST {url}");
        let mut response = self.post(&url, request).await?;

        let mut full_text = String::new();
        let mut buffer: Vec<u8> = Vec::new();
        let mut handle_line = |line: &[u8]| -> Result<()> {
            if let Some(text) = parse_sse_line(&String::from_utf8_lossy(line))? {
                on_chunk(&text);
                full_text.push_str(&text);
            }
            Ok(())
        };

        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                handle_line(&line)?;
            }
        }
        if !buffer.is_empty() {
            handle_line(&buffer)?;
        }

        Ok(full_text)
    }

    pub async fn embed_content(&self, model: &str, text: &str) -> Result<EmbedContentResponse> {
        let url = self.endpoint(model, "embedContent");
        let request = EmbedContentRequest {
            model: format!("models/{}", model.trim_start_matches("models/")),
            content: Content {
                role: None,
                ..Content::user(text)
            },
        };
        let response = self.post(&url, &request).await?;
        let body = response.text().await?;
        Ok(EmbedContentResponse::from_body(&body))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    log::error!("Gemini API returned {status}: {message}");
    Err(AIError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extracts the text delta carried by one server-sent-event line.
fn parse_sse_line(line: &str) -> Result<Option<String>> {
    let Some(data) = line.trim_end().strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }
    let event: GenerateContentResponse = serde_json::from_str(data)?;
    Ok(event.text().filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_bare_and_prefixed_model_names() {
        let client = GeminiClient::new("k").with_base_url("http://localhost:1234/v1beta/");
        assert_eq!(
            client.endpoint("gemini-2.5-flash", "generateContent"),
            "http://localhost:1234/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client.endpoint("models/text-embedding-004", "embedContent"),
            "http://localhost:1234/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn empty_key_still_builds_a_client() {
        let client = GeminiClient::new("");
        assert_eq!(client.api_key(), "");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn sse_lines_yield_text_deltas() {
        let line = r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"Neon"}]}}]}"#;
        assert_eq!(parse_sse_line(line).expect("parse").as_deref(), Some("Neon"));
        assert_eq!(parse_sse_line("").expect("blank"), None);
        assert_eq!(parse_sse_line(": keep-alive").expect("comment"), None);
        assert_eq!(parse_sse_line("data: [DONE]").expect("done"), None);
    }

    #[test]
    fn malformed_sse_payload_is_an_error() {
        assert!(parse_sse_line("data: {not json").is_err());
    }
}
