use crate::db::models::{Event, FieldDef, Message, ModelDef, ModelSummary, Record, Session};
use chrono::{DateTime, Utc};
use duckdb::{params, Connection, Result as DbResult, Row};
use uuid::Uuid;

pub struct DbService;

fn parse_ts(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>().unwrap_or_else(|_| Utc::now())
}

impl DbService {
    fn row_to_session(row: &Row) -> DbResult<Session> {
        Ok(Session {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            tenant_id: row.get(1)?,
            user_id: row.get(2)?,
            session_id: row.get(3)?,
            created_at: parse_ts(&row.get::<_, String>(4)?),
            updated_at: parse_ts(&row.get::<_, String>(5)?),
        })
    }

    fn row_to_message(row: &Row) -> DbResult<Message> {
        Ok(Message {
            id: row.get(0)?,
            session_pk: row.get::<_, String>(1)?.parse().unwrap_or_default(),
            role: row.get(2)?,
            text: row.get(3)?,
            ts: parse_ts(&row.get::<_, String>(4)?),
        })
    }

    fn row_to_model(row: &Row) -> DbResult<ModelDef> {
        let fields_str: String = row.get(4)?;
        let fields: Vec<FieldDef> = serde_json::from_str(&fields_str).unwrap_or_default();

        Ok(ModelDef {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            tenant_id: row.get(1)?,
            name: row.get(2)?,
            collection: row.get(3)?,
            fields,
            version: row.get(5)?,
            active: row.get(6)?,
            created_at: parse_ts(&row.get::<_, String>(7)?),
            updated_at: parse_ts(&row.get::<_, String>(8)?),
            created_by: row.get(9)?,
            updated_by: row.get(10)?,
        })
    }

    fn row_to_record(row: &Row) -> DbResult<Record> {
        let data_str: String = row.get(3)?;
        let data = serde_json::from_str(&data_str).unwrap_or(serde_json::json!({}));

        Ok(Record {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            tenant_id: row.get(1)?,
            collection: row.get(2)?,
            data,
            created_at: parse_ts(&row.get::<_, String>(4)?),
            updated_at: parse_ts(&row.get::<_, String>(5)?),
            created_by: row.get(6)?,
            updated_by: row.get(7)?,
        })
    }

    fn row_to_event(row: &Row) -> DbResult<Event> {
        let after_str: String = row.get(4)?;
        let after = serde_json::from_str(&after_str).unwrap_or(serde_json::json!({}));

        Ok(Event {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            event_type: row.get(2)?,
            model: row.get(3)?,
            after,
            actor: row.get(5)?,
            ts: parse_ts(&row.get::<_, String>(6)?),
        })
    }

    // --- Session Operations ---

    /// Creates the session iff absent, seeding `messages[0]` with the system
    /// prompt. Repeat calls are no-ops and never touch existing messages.
    /// Returns the session primary key either way.
    pub fn ensure_session(
        conn: &Connection,
        tenant_id: &str,
        user_id: &str,
        session_id: &str,
        system_prompt: &str,
    ) -> DbResult<Uuid> {
        if let Some(existing) = Self::find_session(conn, tenant_id, user_id, session_id)? {
            return Ok(existing.id);
        }

        let pk = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO ai_sessions (id, tenant_id, user_id, session_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![pk.to_string(), tenant_id, user_id, session_id, now, now],
        )?;
        conn.execute(
            "INSERT INTO messages (session_pk, role, text, ts) VALUES (?, 'system', ?, ?)",
            params![pk.to_string(), system_prompt, now],
        )?;

        Ok(pk)
    }

    pub fn find_session(
        conn: &Connection,
        tenant_id: &str,
        user_id: &str,
        session_id: &str,
    ) -> DbResult<Option<Session>> {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, user_id, session_id, created_at, updated_at
             FROM ai_sessions WHERE tenant_id = ? AND user_id = ? AND session_id = ?",
        )?;
        let mut rows = stmt.query_map(params![tenant_id, user_id, session_id], Self::row_to_session)?;

        if let Some(row) = rows.next() {
            Ok(Some(row?))
        } else {
            Ok(None)
        }
    }

    pub fn list_sessions(conn: &Connection, tenant_id: &str, limit: usize) -> DbResult<Vec<Session>> {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, user_id, session_id, created_at, updated_at
             FROM ai_sessions WHERE tenant_id = ? ORDER BY updated_at DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![tenant_id, limit as i64], Self::row_to_session)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    // --- Message Operations ---

    pub fn append_message(
        conn: &Connection,
        session_pk: Uuid,
        role: &str,
        text: &str,
    ) -> DbResult<Message> {
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO messages (session_pk, role, text, ts) VALUES (?, ?, ?, ?)",
            params![session_pk.to_string(), role, text, now],
        )?;
        conn.execute(
            "UPDATE ai_sessions SET updated_at = ? WHERE id = ?",
            params![now, session_pk.to_string()],
        )?;

        // Fetch the message we just inserted (the ID comes from a sequence)
        let mut stmt = conn.prepare(
            "SELECT id, session_pk, role, text, ts FROM messages
             WHERE session_pk = ? ORDER BY id DESC LIMIT 1",
        )?;
        stmt.query_row(params![session_pk.to_string()], Self::row_to_message)
    }

    /// The most recent `n` messages in original insertion order. Older
    /// messages stay stored; they are just excluded from generation input.
    pub fn recent_messages(conn: &Connection, session_pk: Uuid, n: usize) -> DbResult<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT id, session_pk, role, text, ts FROM (
                 SELECT id, session_pk, role, text, ts FROM messages
                 WHERE session_pk = ? ORDER BY id DESC LIMIT ?
             ) ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_pk.to_string(), n as i64], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn get_messages(conn: &Connection, session_pk: Uuid, limit: usize) -> DbResult<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT id, session_pk, role, text, ts FROM messages
             WHERE session_pk = ? ORDER BY id ASC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![session_pk.to_string(), limit as i64], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    // --- Model Operations ---

    pub fn insert_model(
        conn: &Connection,
        tenant_id: &str,
        actor: &str,
        name: &str,
        collection: &str,
        fields: &[FieldDef],
        version: i64,
        active: bool,
    ) -> DbResult<ModelDef> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let fields_str = serde_json::to_string(fields).unwrap_or_else(|_| "[]".to_string());

        conn.execute(
            "INSERT INTO models (id, tenant_id, name, collection, fields, version, active,
                                 created_at, updated_at, created_by, updated_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                tenant_id,
                name,
                collection,
                fields_str,
                version,
                active,
                now,
                now,
                actor,
                actor
            ],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, name, collection, CAST(fields AS VARCHAR), version, active,
                    created_at, updated_at, created_by, updated_by
             FROM models WHERE id = ?",
        )?;
        stmt.query_row(params![id.to_string()], Self::row_to_model)
    }

    /// Only one active model per name per tenant is expected; latest version wins.
    pub fn get_active_model(
        conn: &Connection,
        tenant_id: &str,
        name: &str,
    ) -> DbResult<Option<ModelDef>> {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, name, collection, CAST(fields AS VARCHAR), version, active,
                    created_at, updated_at, created_by, updated_by
             FROM models WHERE tenant_id = ? AND name = ? AND active = true
             ORDER BY version DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![tenant_id, name], Self::row_to_model)?;

        if let Some(row) = rows.next() {
            Ok(Some(row?))
        } else {
            Ok(None)
        }
    }

    pub fn list_models(conn: &Connection, tenant_id: &str) -> DbResult<Vec<ModelSummary>> {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, name, collection, CAST(fields AS VARCHAR), version, active,
                    created_at, updated_at, created_by, updated_by
             FROM models WHERE tenant_id = ? ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![tenant_id], Self::row_to_model)?;

        let mut out = Vec::new();
        for row in rows {
            let m = row?;
            out.push(ModelSummary {
                id: m.id,
                name: m.name,
                collection: m.collection,
                version: m.version,
                active: m.active,
                updated_at: m.updated_at,
            });
        }
        Ok(out)
    }

    // --- Record Operations ---

    pub fn insert_record(
        conn: &Connection,
        tenant_id: &str,
        actor: &str,
        collection: &str,
        data: &serde_json::Value,
    ) -> DbResult<Record> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO records (id, tenant_id, collection, data, created_at, updated_at,
                                  created_by, updated_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                tenant_id,
                collection,
                data.to_string(),
                now,
                now,
                actor,
                actor
            ],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, collection, CAST(data AS VARCHAR), created_at, updated_at,
                    created_by, updated_by
             FROM records WHERE id = ?",
        )?;
        stmt.query_row(params![id.to_string()], Self::row_to_record)
    }

    /// Top-level equality filter applied over the tenant's collection, Mongo
    /// style: every `filter` key must match the record's `data` value exactly.
    pub fn query_records(
        conn: &Connection,
        tenant_id: &str,
        collection: &str,
        filter: &serde_json::Map<String, serde_json::Value>,
        limit: usize,
    ) -> DbResult<Vec<Record>> {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, collection, CAST(data AS VARCHAR), created_at, updated_at,
                    created_by, updated_by
             FROM records WHERE tenant_id = ? AND collection = ? ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![tenant_id, collection], Self::row_to_record)?;

        let mut out = Vec::new();
        for row in rows {
            let r = row?;
            let matches = filter
                .iter()
                .all(|(k, v)| r.data.get(k).map(|dv| dv == v).unwrap_or(false));
            if matches {
                out.push(r);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    // --- Event Operations ---

    pub fn append_event(
        conn: &Connection,
        tenant_id: &str,
        event_type: &str,
        model: &str,
        actor: &str,
        after: &serde_json::Value,
    ) -> DbResult<()> {
        conn.execute(
            "INSERT INTO event_store (tenant_id, type, model, after, actor, ts)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                tenant_id,
                event_type,
                model,
                after.to_string(),
                actor,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn list_events(conn: &Connection, tenant_id: &str) -> DbResult<Vec<Event>> {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, type, model, CAST(after AS VARCHAR), actor, ts
             FROM event_store WHERE tenant_id = ? ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![tenant_id], Self::row_to_event)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
