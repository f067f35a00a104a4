use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::ai::action::{ActionExecutor, ActionResult};
use crate::ai::directive::extract_directives;
use crate::ai::visual::{VisualPayload, VisualResolver};
use crate::api::middleware::RequestContext;
use crate::db::{service::DbService, DbPool};
use crate::llm::{
    models::{ChatOptions, Message as LlmMessage},
    LlmError, LlmProvider,
};

pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Missing text")]
    MissingText,
    #[error("Session store inconsistency: {0}")]
    SessionStore(String),
    #[error("Database error: {0}")]
    Db(#[from] duckdb::Error),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Serialize)]
pub struct TurnOutcome {
    #[serde(rename = "replyText")]
    pub reply_text: String,
    pub visual: Option<VisualPayload>,
    pub action: Option<ActionResult>,
}

/// Orchestrates one chat turn end to end: ensure session, append the user
/// message, generate, extract directives, resolve/execute them, append the
/// clean reply. Visual resolution and action execution are independent; a
/// failure in one never blocks the other or the reply.
pub struct TurnProcessor {
    pool: DbPool,
    llm: Arc<dyn LlmProvider>,
    resolver: VisualResolver,
    executor: ActionExecutor,
    system_prompt: String,
    max_history: usize,
}

impl TurnProcessor {
    pub fn new(
        pool: DbPool,
        llm: Arc<dyn LlmProvider>,
        resolver: VisualResolver,
        system_prompt: String,
        max_history: usize,
    ) -> Self {
        let executor = ActionExecutor::new(pool.clone());
        Self {
            pool,
            llm,
            resolver,
            executor,
            system_prompt,
            max_history,
        }
    }

    /// Wires the resolver's media clients from config; missing API keys just
    /// leave the corresponding client out.
    pub fn from_config(
        config: &crate::config::AppConfig,
        pool: DbPool,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        use crate::llm::ProviderFactory;
        use crate::tools::{youtube::YouTubeClient, VideoSearch};

        let image = ProviderFactory::create_image_provider(config);
        let search: Option<Arc<dyn VideoSearch>> = if config.media.youtube_api_key.is_empty() {
            None
        } else {
            Some(Arc::new(YouTubeClient::new(
                config.media.youtube_api_key.clone(),
            )))
        };

        Self::new(
            pool,
            llm,
            VisualResolver::new(image, search),
            config.chat.system_prompt.clone(),
            config.chat.max_history_messages,
        )
    }

    pub async fn run_turn(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::MissingText);
        }
        let sid = if session_id.trim().is_empty() {
            DEFAULT_SESSION
        } else {
            session_id
        };

        let (session_pk, contents) = {
            let conn = self.pool.lock().unwrap();
            let pk = DbService::ensure_session(
                &conn,
                &ctx.tenant_id,
                &ctx.user_id,
                sid,
                &self.system_prompt,
            )?;
            DbService::append_message(&conn, pk, "user", text)?;

            let history = DbService::recent_messages(&conn, pk, self.max_history)?;
            if history.is_empty() {
                // The message we just appended must be readable back
                return Err(TurnError::SessionStore(
                    "no messages found after append".to_string(),
                ));
            }

            // Stored role "model" maps to generation role "model"; user and
            // system turns both replay as "user"
            let contents: Vec<LlmMessage> = history
                .into_iter()
                .map(|m| LlmMessage {
                    role: if m.role == "model" { "model" } else { "user" }.to_string(),
                    content: m.text,
                })
                .collect();
            (pk, contents)
        }; // release the DB lock across the slow generation call

        let response = self.llm.chat(&contents, ChatOptions::default()).await?;
        let extraction = extract_directives(&response.content);

        let visual = match &extraction.visual {
            Some(directive) => self.resolver.resolve(directive).await,
            None => None,
        };

        let mut reply = extraction.clean_reply;
        let action = match &extraction.action {
            Some(directive) => match self.executor.execute(ctx, directive) {
                Some(outcome) => {
                    reply.push_str(&outcome.annotation);
                    Some(outcome.result)
                }
                None => None,
            },
            None => None,
        };

        {
            let conn = self.pool.lock().unwrap();
            if DbService::find_session(&conn, &ctx.tenant_id, &ctx.user_id, sid)?.is_none() {
                return Err(TurnError::SessionStore(format!(
                    "session \"{}\" disappeared mid-turn",
                    sid
                )));
            }
            DbService::append_message(&conn, session_pk, "model", &reply)?;
        }

        Ok(TurnOutcome {
            reply_text: reply,
            visual,
            action,
        })
    }
}
