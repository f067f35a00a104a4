use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub tenant_id: String,
    pub user_id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub session_pk: Uuid,
    pub role: String,
    pub text: String,
    pub ts: DateTime<Utc>,
}

/// One field of a tenant-defined model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
}

/// Tenant-defined schema describing a dynamic record collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDef {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub collection: String,
    pub fields: Vec<FieldDef>,
    pub version: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

impl ModelDef {
    /// Names of required fields absent from `data`, in declaration order.
    pub fn missing_required(&self, data: &serde_json::Value) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| data.get(&f.name).is_none())
            .map(|f| f.name.clone())
            .collect()
    }
}

/// ModelDef without its field list, for listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub id: Uuid,
    pub name: String,
    pub collection: String,
    pub version: i64,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: Uuid,
    pub tenant_id: String,
    pub collection: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub tenant_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub model: String,
    pub actor: String,
    pub after: serde_json::Value,
    pub ts: DateTime<Utc>,
}
