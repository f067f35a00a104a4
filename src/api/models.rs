use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub filter: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: Option<String>,
    #[serde(rename = "voiceId")]
    pub voice_id: Option<String>,
    #[serde(rename = "modelId")]
    pub model_id: Option<String>,
    pub voice_settings: Option<serde_json::Value>,
}
