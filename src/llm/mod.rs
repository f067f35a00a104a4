pub mod gemini;
pub mod imagen;
pub mod models;

use gemini::GeminiProvider;
use imagen::ImagenProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use models::{ChatOptions, ChatResponse, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Rate Limited")]
    RateLimited,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;
}

/// Generates an image for a prompt and returns a renderable URL
/// (typically a `data:image/png;base64,...` URL).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// A registry or factory to initialize providers from config.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_default(config: &AppConfig) -> Option<Arc<dyn LlmProvider>> {
        match config.llm.provider.as_str() {
            "gemini" => {
                let cfg = config.llm.gemini.as_ref()?;
                Some(Arc::new(GeminiProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.default_model.clone(),
                )))
            }
            _ => None,
        }
    }

    /// None when no API key is configured; the visual resolver treats that
    /// as "image generation unavailable".
    pub fn create_image_provider(config: &AppConfig) -> Option<Arc<dyn ImageProvider>> {
        let cfg = config.llm.gemini.as_ref()?;
        if cfg.api_key.is_empty() || config.media.image_model.is_empty() {
            return None;
        }
        Some(Arc::new(ImagenProvider::new(
            cfg.api_key.clone(),
            cfg.api_base.clone(),
            config.media.image_model.clone(),
        )))
    }
}
