use crate::ai;
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::retry::{RetryPolicy, with_retry};

pub const EMBEDDING_MODEL: &str = "text-embedding-004";

/// One embedding request, no retries. Errors are logged and passed on so the
/// caller's retry policy can decide what to do.
pub async fn embed_once(client: &GeminiClient, text: &str) -> Result<Vec<f32>> {
    match client.embed_content(EMBEDDING_MODEL, text).await {
        Ok(response) => Ok(response.into_values()),
        Err(e) => {
            log::error!("Embedding request failed: {e}");
            Err(e)
        }
    }
}

pub async fn embed_with(client: &GeminiClient, text: &str, policy: RetryPolicy) -> Result<Vec<f32>> {
    with_retry(policy, || embed_once(client, text)).await
}

/// Embeds `text` with the shared client, retrying rate-limit failures.
pub async fn embed(text: &str) -> Result<Vec<f32>> {
    let client = ai::get();
    embed_with(&client, text, RetryPolicy::default()).await
}
