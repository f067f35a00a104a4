use actix_web::{get, post, web, HttpResponse, Result as WebResult};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::ai::processor::{TurnError, TurnProcessor, DEFAULT_SESSION};
use crate::api::middleware::RequestContext;
use crate::api::models::ChatRequest;
use crate::llm::{
    models::{ChatOptions, Message as LlmMessage},
    LlmProvider,
};

#[post("/chat")]
pub async fn chat(
    processor: web::Data<TurnProcessor>,
    ctx: RequestContext,
    req: web::Json<ChatRequest>,
) -> WebResult<HttpResponse> {
    let body = req.into_inner();
    let text = body.text.unwrap_or_default();
    let session_id = body.session_id.as_deref().unwrap_or(DEFAULT_SESSION);

    match processor.run_turn(&ctx, session_id, &text).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        Err(TurnError::MissingText) => {
            Ok(HttpResponse::BadRequest().json(json!({"error": "Missing text"})))
        }
        Err(e) => {
            error!("Chat turn failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()})))
        }
    }
}

#[get("/ping")]
pub async fn ping(llm: web::Data<Arc<dyn LlmProvider>>) -> WebResult<HttpResponse> {
    let messages = [LlmMessage::user("ping")];

    match llm.chat(&messages, ChatOptions::default()).await {
        Ok(res) => Ok(HttpResponse::Ok().json(json!({"ok": true, "text": res.content.trim()}))),
        Err(e) => {
            error!("Ping generation failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({"ok": false, "error": e.to_string()})))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/ai").service(chat).service(ping));
}
