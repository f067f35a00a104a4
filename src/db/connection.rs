use crate::config::DatabaseConfig;
use duckdb::{Connection, Result as DbResult};
use std::sync::{Arc, Mutex};
use tracing::info;

pub type DbPool = Arc<Mutex<Connection>>;

// Timestamps are stored as RFC 3339 text rather than native TIMESTAMPs so the
// driver never has to round-trip DuckDB's timestamp representation.
pub const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS seq_messages_id;
CREATE SEQUENCE IF NOT EXISTS seq_events_id;

CREATE TABLE IF NOT EXISTS ai_sessions (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR NOT NULL,
    user_id VARCHAR NOT NULL,
    session_id VARCHAR NOT NULL,
    created_at VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_key
    ON ai_sessions(tenant_id, user_id, session_id);

CREATE TABLE IF NOT EXISTS messages (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_messages_id'),
    session_pk UUID NOT NULL,
    role VARCHAR NOT NULL,
    text TEXT NOT NULL,
    ts VARCHAR NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_pk, id);

CREATE TABLE IF NOT EXISTS models (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    collection VARCHAR NOT NULL,
    fields JSON NOT NULL,
    version INTEGER NOT NULL,
    active BOOLEAN NOT NULL,
    created_at VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL,
    created_by VARCHAR NOT NULL,
    updated_by VARCHAR NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_models_lookup ON models(tenant_id, name, active);

CREATE TABLE IF NOT EXISTS records (
    id UUID PRIMARY KEY,
    tenant_id VARCHAR NOT NULL,
    collection VARCHAR NOT NULL,
    data JSON NOT NULL,
    created_at VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL,
    created_by VARCHAR NOT NULL,
    updated_by VARCHAR NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_collection ON records(tenant_id, collection);

CREATE TABLE IF NOT EXISTS event_store (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_events_id'),
    tenant_id VARCHAR NOT NULL,
    type VARCHAR NOT NULL,
    model VARCHAR NOT NULL,
    actor VARCHAR NOT NULL,
    after JSON NOT NULL,
    ts VARCHAR NOT NULL
);
"#;

pub fn get_connection(config: &DatabaseConfig) -> DbResult<DbPool> {
    info!("Connecting to DuckDB at {}", config.path);
    let conn = Connection::open(&config.path)?;

    init_schema(&conn)?;

    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_schema(conn: &Connection) -> DbResult<()> {
    info!("Initializing database schema");
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
