use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::llm::LlmError;
use crate::tools::VideoSearch;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: Option<ItemId>,
}

#[derive(Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn first_video_id(&self, query: &str) -> Result<Option<String>, LlmError> {
        info!("Searching YouTube for: {}", query);

        let url = format!(
            "{}?part=id&type=video&maxResults=1&q={}&key={}",
            SEARCH_URL,
            urlencoding::encode(query),
            self.api_key
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("YouTube HTTP {}: {}", status, text)));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(data
            .items
            .into_iter()
            .next()
            .and_then(|item| item.id)
            .and_then(|id| id.video_id))
    }
}
