pub mod youtube;

use async_trait::async_trait;

use crate::llm::LlmError;

/// External video lookup. Returns the best-matching video ID for a free-text
/// query, or None when the search came back empty.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn first_video_id(&self, query: &str) -> Result<Option<String>, LlmError>;
}
