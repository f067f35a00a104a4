use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ai::directive::VisualDirective;
use crate::llm::ImageProvider;
use crate::tools::VideoSearch;

/// Wire shape returned to the client alongside the reply.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisualPayload {
    Image { url: String, caption: String },
    Video { url: String, caption: String },
    Youtube { id: String, caption: String },
}

/// Normalizes a visual directive into a renderable payload. Every failure is
/// logged and degrades to None; resolution never aborts the enclosing turn.
pub struct VisualResolver {
    image: Option<Arc<dyn ImageProvider>>,
    search: Option<Arc<dyn VideoSearch>>,
}

impl VisualResolver {
    pub fn new(
        image: Option<Arc<dyn ImageProvider>>,
        search: Option<Arc<dyn VideoSearch>>,
    ) -> Self {
        Self { image, search }
    }

    pub async fn resolve(&self, directive: &VisualDirective) -> Option<VisualPayload> {
        match directive {
            VisualDirective::Image { prompt, caption } => {
                let provider = match &self.image {
                    Some(p) => p,
                    None => {
                        warn!("Image generation not configured, dropping visual");
                        return None;
                    }
                };
                match provider.generate(prompt).await {
                    Ok(url) => Some(VisualPayload::Image {
                        url,
                        caption: caption.clone(),
                    }),
                    Err(e) => {
                        warn!("Image generation failed: {}", e);
                        None
                    }
                }
            }
            VisualDirective::Video { url, caption } => Some(VisualPayload::Video {
                url: url.clone(),
                caption: caption.clone(),
            }),
            VisualDirective::YoutubeId { id, caption } => Some(VisualPayload::Youtube {
                id: id.clone(),
                caption: caption.clone(),
            }),
            VisualDirective::YoutubeSearch { query, caption } => {
                let search = match &self.search {
                    Some(s) => s,
                    None => {
                        warn!("Video search not configured, dropping visual");
                        return None;
                    }
                };
                match search.first_video_id(query).await {
                    Ok(Some(id)) => Some(VisualPayload::Youtube {
                        id,
                        caption: if caption.is_empty() {
                            query.clone()
                        } else {
                            caption.clone()
                        },
                    }),
                    Ok(None) => {
                        debug!("No video result for \"{}\"", query);
                        None
                    }
                    Err(e) => {
                        warn!("Video search failed: {}", e);
                        None
                    }
                }
            }
            VisualDirective::Unrecognized => {
                debug!("Unrecognized visual directive dropped");
                None
            }
        }
    }
}
