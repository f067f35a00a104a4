use actix_web::{get, post, web, HttpResponse, Result as WebResult};
use chrono::Utc;
use serde_json::json;

use crate::api::middleware::RequestContext;
use crate::api::models::QueryRequest;
use crate::db::models::FieldDef;
use crate::db::{service::DbService, DbPool};

// --- Design: models ---

#[post("/design/models")]
pub async fn create_model(
    pool: web::Data<DbPool>,
    ctx: RequestContext,
    req: web::Json<serde_json::Value>,
) -> WebResult<HttpResponse> {
    let payload = req.into_inner();

    // Permissive shape check only; deeper validation is out of scope
    let mut errors: Vec<String> = Vec::new();
    let name = payload["name"].as_str().unwrap_or("").trim().to_string();
    let collection = payload["collection"].as_str().unwrap_or("").trim().to_string();
    if name.is_empty() {
        errors.push("name must be a non-empty string".to_string());
    }
    if collection.is_empty() {
        errors.push("collection must be a non-empty string".to_string());
    }
    let fields: Option<Vec<FieldDef>> = payload
        .get("fields")
        .cloned()
        .and_then(|f| serde_json::from_value(f).ok());
    if fields.is_none() {
        errors.push("fields must be an array of {name, type, required}".to_string());
    }
    if !errors.is_empty() {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({
            "error": "Invalid model",
            "errors": errors,
        })));
    }
    let fields = fields.unwrap();
    let version = payload["version"].as_i64().unwrap_or(1);
    let active = payload["active"].as_bool().unwrap_or(true);

    let conn = pool.lock().unwrap();
    let inserted = DbService::insert_model(
        &conn,
        &ctx.tenant_id,
        &ctx.user_id,
        &name,
        &collection,
        &fields,
        version,
        active,
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
        )
    });

    match inserted {
        Ok(_) => Ok(HttpResponse::Created().json(json!({"ok": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

#[get("/design/models/{name}")]
pub async fn get_model_def(
    pool: web::Data<DbPool>,
    ctx: RequestContext,
    name: web::Path<String>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::get_active_model(&conn, &ctx.tenant_id, &name) {
        Ok(Some(def)) => Ok(HttpResponse::Ok().json(def)),
        Ok(None) => Ok(HttpResponse::NotFound().finish()),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

// --- Data: create + query against the model's collection ---

#[post("/data/{model}/create")]
pub async fn create_record(
    pool: web::Data<DbPool>,
    ctx: RequestContext,
    model: web::Path<String>,
    req: web::Json<serde_json::Value>,
) -> WebResult<HttpResponse> {
    let body = req.into_inner();
    let conn = pool.lock().unwrap();

    let def = match DbService::get_active_model(&conn, &ctx.tenant_id, &model) {
        Ok(Some(def)) => def,
        Ok(None) => return Ok(HttpResponse::NotFound().body("Model not found")),
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };

    let missing = def.missing_required(&body);
    if !missing.is_empty() {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({
            "error": "Missing required fields",
            "fields": missing,
        })));
    }

    let inserted = DbService::insert_record(&conn, &ctx.tenant_id, &ctx.user_id, &def.collection, &body)
        .and_then(|record| {
            let after = serde_json::to_value(&record).unwrap_or_else(|_| json!({}));
            DbService::append_event(
                &conn,
                &ctx.tenant_id,
                "record.created",
                &def.name,
                &ctx.user_id,
                &after,
            )
        });

    match inserted {
        Ok(_) => Ok(HttpResponse::Created().json(json!({"ok": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

#[post("/data/{model}/query")]
pub async fn query_records(
    pool: web::Data<DbPool>,
    ctx: RequestContext,
    model: web::Path<String>,
    req: web::Json<QueryRequest>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    let def = match DbService::get_active_model(&conn, &ctx.tenant_id, &model) {
        Ok(Some(def)) => def,
        Ok(None) => return Ok(HttpResponse::NotFound().body("Model not found")),
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };

    match DbService::query_records(&conn, &ctx.tenant_id, &def.collection, &req.filter, 100) {
        Ok(rows) => Ok(HttpResponse::Ok().json(json!({ "rows": rows }))),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

// --- Meta ---

#[get("/__meta/models")]
pub async fn meta_models(pool: web::Data<DbPool>, ctx: RequestContext) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::list_models(&conn, &ctx.tenant_id) {
        Ok(models) => Ok(HttpResponse::Ok().json(models)),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

#[get("/__health")]
pub async fn health() -> WebResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({"ok": true, "time": Utc::now().to_rfc3339()})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_model)
        .service(get_model_def)
        .service(create_record)
        .service(query_records)
        .service(meta_models)
        .service(health);
}
