use actix_web::{post, web, HttpResponse, Result as WebResult};
use serde_json::json;
use tracing::error;

use crate::api::models::TtsRequest;
use crate::config::AppConfig;

/// Speech-synthesis proxy. Streams are not needed here; the whole clip is
/// buffered and returned as audio/mpeg.
#[post("/tts/eleven")]
pub async fn tts_eleven(
    config: web::Data<AppConfig>,
    req: web::Json<TtsRequest>,
) -> WebResult<HttpResponse> {
    let body = req.into_inner();
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "Missing text"})));
    }

    let eleven = match &config.media.eleven {
        Some(cfg) if !cfg.api_key.is_empty() => cfg,
        _ => {
            return Ok(HttpResponse::InternalServerError()
                .json(json!({"error": "Missing ElevenLabs API key"})))
        }
    };

    let voice_id = body.voice_id.unwrap_or_else(|| eleven.voice_id.clone());
    let model_id = body.model_id.unwrap_or_else(|| eleven.model_id.clone());

    let url = format!(
        "https://api.elevenlabs.io/v1/text-to-speech/{}?optimize_streaming_latency=2&output_format=mp3_44100_128",
        urlencoding::encode(&voice_id)
    );

    let response = reqwest::Client::new()
        .post(url)
        .header("xi-api-key", &eleven.api_key)
        .header("Content-Type", "application/json")
        .header("Accept", "audio/mpeg")
        .json(&json!({
            "text": text,
            "model_id": model_id,
            "voice_settings": body.voice_settings,
        }))
        .send()
        .await;

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            error!("TTS request failed: {}", e);
            return Ok(HttpResponse::BadGateway().json(json!({
                "error": "ElevenLabs error",
                "details": e.to_string(),
            })));
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let details = response.text().await.unwrap_or_default();
        return Ok(HttpResponse::BadGateway().json(json!({
            "error": "ElevenLabs error",
            "upstreamStatus": status,
            "details": details,
        })));
    }

    match response.bytes().await {
        Ok(audio) => Ok(HttpResponse::Ok()
            .content_type("audio/mpeg")
            .insert_header(("Cache-Control", "no-store"))
            .body(audio)),
        Err(e) => Ok(HttpResponse::BadGateway().json(json!({
            "error": "ElevenLabs error",
            "details": e.to_string(),
        }))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(tts_eleven);
}
