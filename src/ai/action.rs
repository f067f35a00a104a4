use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::ai::directive::ActionDirective;
use crate::api::middleware::RequestContext;
use crate::db::{service::DbService, DbPool};

/// Result of an executed action, echoed back to the client.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionResult {
    pub action: String,
    pub ok: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub struct ActionOutcome {
    pub result: ActionResult,
    /// Suffix appended to the clean reply, e.g. a checkmark confirmation.
    pub annotation: String,
}

/// Applies an action directive against the tenant's model/record store and
/// appends an audit event per successful mutation. Failures are logged and
/// reflected only in the annotation, never raised to the caller.
pub struct ActionExecutor {
    pool: DbPool,
}

impl ActionExecutor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn execute(&self, ctx: &RequestContext, directive: &ActionDirective) -> Option<ActionOutcome> {
        match directive {
            ActionDirective::CreateModel {
                name,
                collection,
                fields,
            } => {
                let conn = self.pool.lock().unwrap();
                let inserted = DbService::insert_model(
                    &conn,
                    &ctx.tenant_id,
                    &ctx.user_id,
                    name,
                    collection,
                    fields,
                    1,
                    true,
                )
                .and_then(|def| {
                    let after = serde_json::to_value(&def).unwrap_or_else(|_| json!({}));
                    DbService::append_event(
                        &conn,
                        &ctx.tenant_id,
                        "record.created",
                        "ModelDef",
                        &ctx.user_id,
                        &after,
                    )?;
                    Ok(def)
                });

                match inserted {
                    Ok(_) => Some(ActionOutcome {
                        result: ActionResult {
                            action: "create_model".to_string(),
                            ok: true,
                            model: name.clone(),
                            detail: Some(collection.clone()),
                        },
                        annotation: format!(
                            "\n\n✅ Created model \"{}\" backed by collection \"{}\".",
                            name, collection
                        ),
                    }),
                    Err(e) => {
                        error!("create_model \"{}\" failed: {}", name, e);
                        Some(ActionOutcome {
                            result: ActionResult {
                                action: "create_model".to_string(),
                                ok: false,
                                model: name.clone(),
                                detail: Some(e.to_string()),
                            },
                            annotation: format!("\n\n❌ Couldn't create model \"{}\".", name),
                        })
                    }
                }
            }
            ActionDirective::CreateDocument { model, data } => {
                let conn = self.pool.lock().unwrap();

                let def = match DbService::get_active_model(&conn, &ctx.tenant_id, model) {
                    Ok(Some(def)) => def,
                    Ok(None) => {
                        return Some(ActionOutcome {
                            result: ActionResult {
                                action: "create_document".to_string(),
                                ok: false,
                                model: model.clone(),
                                detail: Some("model not found".to_string()),
                            },
                            annotation: format!(
                                "\n\n⚠️ I don't know a model called \"{}\" yet.",
                                model
                            ),
                        })
                    }
                    Err(e) => {
                        error!("model lookup for \"{}\" failed: {}", model, e);
                        return Some(ActionOutcome {
                            result: ActionResult {
                                action: "create_document".to_string(),
                                ok: false,
                                model: model.clone(),
                                detail: Some(e.to_string()),
                            },
                            annotation: format!("\n\n❌ Couldn't save a \"{}\" record.", model),
                        });
                    }
                };

                let data_value = serde_json::Value::Object(data.clone());
                let inserted = DbService::insert_record(
                    &conn,
                    &ctx.tenant_id,
                    &ctx.user_id,
                    &def.collection,
                    &data_value,
                )
                .and_then(|record| {
                    let after = serde_json::to_value(&record).unwrap_or_else(|_| json!({}));
                    DbService::append_event(
                        &conn,
                        &ctx.tenant_id,
                        "record.created",
                        model,
                        &ctx.user_id,
                        &after,
                    )?;
                    Ok(record)
                });

                match inserted {
                    Ok(_) => Some(ActionOutcome {
                        result: ActionResult {
                            action: "create_document".to_string(),
                            ok: true,
                            model: model.clone(),
                            detail: None,
                        },
                        annotation: format!("\n\n✅ Saved a new \"{}\" record.", model),
                    }),
                    Err(e) => {
                        error!("create_document for \"{}\" failed: {}", model, e);
                        Some(ActionOutcome {
                            result: ActionResult {
                                action: "create_document".to_string(),
                                ok: false,
                                model: model.clone(),
                                detail: Some(e.to_string()),
                            },
                            annotation: format!("\n\n❌ Couldn't save a \"{}\" record.", model),
                        })
                    }
                }
            }
            ActionDirective::Unrecognized => {
                debug!("Unrecognized action directive dropped");
                None
            }
        }
    }
}
