use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Content {
            role: Some(role),
            parts: parts.into_iter().map(|text| Part { text: text.into() }).collect(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, [Into::<String>::into(text)])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, [Into::<String>::into(text)])
    }

    // System instructions carry no role.
    pub fn system(text: impl Into<String>) -> Self {
        Content {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    pub fn google_search() -> Self {
        Tool {
            google_search: Some(GoogleSearch::default()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Everything fixed for the lifetime of a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub temperature: f32,
    pub system_instruction: String,
    pub tools: Option<Vec<Tool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(Content::text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    pub model: String,
    pub content: Content,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentEmbedding {
    #[serde(default)]
    pub values: Vec<f32>,
}

impl ContentEmbedding {
    fn from_value(value: &Value) -> Self {
        let values = value
            .get("values")
            .and_then(|values| serde_json::from_value(values.clone()).ok())
            .unwrap_or_default();
        Self { values }
    }
}

/// The provider answers either with a list of embeddings or a single one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedContentResponse {
    #[serde(default)]
    pub embeddings: Option<Vec<ContentEmbedding>>,
    #[serde(default)]
    pub embedding: Option<ContentEmbedding>,
}

impl EmbedContentResponse {
    /// Decodes a response body leniently: a body or entry that is not shaped
    /// like an embedding counts as no data rather than an error.
    pub fn from_body(body: &str) -> Self {
        let value: Value = serde_json::from_str(body).unwrap_or_else(|e| {
            log::warn!("Unparseable embedding response: {e}");
            Value::Null
        });
        let embeddings = value
            .get("embeddings")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(ContentEmbedding::from_value).collect());
        let embedding = value.get("embedding").map(ContentEmbedding::from_value);

        Self {
            embeddings,
            embedding,
        }
    }

    pub fn into_values(self) -> Vec<f32> {
        if let Some(first) = self.embeddings.and_then(|list| list.into_iter().next()) {
            return first.values;
        }
        self.embedding.map(|e| e.values).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
