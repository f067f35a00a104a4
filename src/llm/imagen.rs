use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::llm::{ImageProvider, LlmError};

pub struct ImagenProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ImagenProvider {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1 },
        });

        let response = self
            .client
            .post(format!(
                "{}/models/{}:predict?key={}",
                self.base_url, self.model, self.api_key
            ))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("Imagen Error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let bytes = json["predictions"][0]["bytesBase64Encoded"]
            .as_str()
            .ok_or_else(|| LlmError::Api("No image generated".to_string()))?;

        Ok(format!("data:image/png;base64,{}", bytes))
    }
}
