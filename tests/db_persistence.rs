#[cfg(test)]
mod tests {
    use maxcrm::db::connection::init_schema;
    use maxcrm::db::models::FieldDef;
    use maxcrm::db::service::DbService;
    use serde_json::json;

    const SYSTEM_PROMPT: &str = "You are Max, a CRM operator.";

    fn get_test_db() -> duckdb::Connection {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_ensure_session_is_idempotent() {
        let conn = get_test_db();

        let pk1 = DbService::ensure_session(&conn, "tenant-A", "dev-user", "default", SYSTEM_PROMPT)
            .unwrap();
        let pk2 = DbService::ensure_session(&conn, "tenant-A", "dev-user", "default", SYSTEM_PROMPT)
            .unwrap();
        assert_eq!(pk1, pk2);

        // the system seed exists exactly once and stays messages[0]
        let messages = DbService::get_messages(&conn, pk1, 100).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].text, SYSTEM_PROMPT);

        DbService::append_message(&conn, pk1, "user", "hello").unwrap();
        DbService::ensure_session(&conn, "tenant-A", "dev-user", "default", SYSTEM_PROMPT).unwrap();
        let messages = DbService::get_messages(&conn, pk1, 100).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
    }

    #[test]
    fn test_sessions_are_scoped_by_key_triple() {
        let conn = get_test_db();

        let a = DbService::ensure_session(&conn, "tenant-A", "dev-user", "default", SYSTEM_PROMPT)
            .unwrap();
        let b = DbService::ensure_session(&conn, "tenant-B", "dev-user", "default", SYSTEM_PROMPT)
            .unwrap();
        let c = DbService::ensure_session(&conn, "tenant-A", "dev-user", "support", SYSTEM_PROMPT)
            .unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);

        assert_eq!(DbService::list_sessions(&conn, "tenant-A", 50).unwrap().len(), 2);
        assert_eq!(DbService::list_sessions(&conn, "tenant-B", 50).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_messages_window_preserves_order() {
        let conn = get_test_db();
        let pk = DbService::ensure_session(&conn, "tenant-A", "dev-user", "default", SYSTEM_PROMPT)
            .unwrap();

        for i in 0..20 {
            DbService::append_message(&conn, pk, "user", &format!("msg {}", i)).unwrap();
        }

        let recent = DbService::recent_messages(&conn, pk, 16).unwrap();
        assert_eq!(recent.len(), 16);
        // 21 stored (seed + 20); the window holds msg 4..=19 in original order
        assert_eq!(recent[0].text, "msg 4");
        assert_eq!(recent[15].text, "msg 19");
        for pair in recent.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }

        // older messages are excluded, not deleted
        let all = DbService::get_messages(&conn, pk, 1000).unwrap();
        assert_eq!(all.len(), 21);
        assert_eq!(all[0].role, "system");
    }

    #[test]
    fn test_recent_messages_short_history() {
        let conn = get_test_db();
        let pk = DbService::ensure_session(&conn, "tenant-A", "dev-user", "default", SYSTEM_PROMPT)
            .unwrap();
        DbService::append_message(&conn, pk, "user", "hi").unwrap();

        let recent = DbService::recent_messages(&conn, pk, 16).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role, "system");
        assert_eq!(recent[1].text, "hi");
    }

    #[test]
    fn test_model_lifecycle() {
        let conn = get_test_db();
        let fields = vec![
            FieldDef {
                name: "title".to_string(),
                field_type: "string".to_string(),
                required: true,
            },
            FieldDef {
                name: "amount".to_string(),
                field_type: "number".to_string(),
                required: false,
            },
        ];

        let def = DbService::insert_model(
            &conn, "tenant-A", "dev-user", "Deal", "deal_records", &fields, 1, true,
        )
        .unwrap();
        assert_eq!(def.name, "Deal");
        assert_eq!(def.collection, "deal_records");
        assert_eq!(def.version, 1);
        assert!(def.active);
        assert_eq!(def.fields, fields);
        assert_eq!(def.created_by, "dev-user");

        let found = DbService::get_active_model(&conn, "tenant-A", "Deal").unwrap().unwrap();
        assert_eq!(found.id, def.id);

        // tenant isolation
        assert!(DbService::get_active_model(&conn, "tenant-B", "Deal").unwrap().is_none());
        // inactive models don't resolve
        DbService::insert_model(&conn, "tenant-A", "dev-user", "Old", "old_records", &[], 1, false)
            .unwrap();
        assert!(DbService::get_active_model(&conn, "tenant-A", "Old").unwrap().is_none());

        let summaries = DbService::list_models(&conn, "tenant-A").unwrap();
        assert_eq!(summaries.len(), 2);
    }

    #[test]
    fn test_missing_required_fields() {
        let conn = get_test_db();
        let fields = vec![
            FieldDef {
                name: "title".to_string(),
                field_type: "string".to_string(),
                required: true,
            },
            FieldDef {
                name: "stage".to_string(),
                field_type: "string".to_string(),
                required: true,
            },
            FieldDef {
                name: "notes".to_string(),
                field_type: "string".to_string(),
                required: false,
            },
        ];
        let def = DbService::insert_model(
            &conn, "tenant-A", "dev-user", "Deal", "deal_records", &fields, 1, true,
        )
        .unwrap();

        let missing = def.missing_required(&json!({"title": "Acme"}));
        assert_eq!(missing, vec!["stage".to_string()]);

        let missing = def.missing_required(&json!({}));
        assert_eq!(missing, vec!["title".to_string(), "stage".to_string()]);

        assert!(def
            .missing_required(&json!({"title": "Acme", "stage": "open"}))
            .is_empty());
    }

    #[test]
    fn test_record_insert_and_query_filter() {
        let conn = get_test_db();

        DbService::insert_record(
            &conn,
            "tenant-A",
            "dev-user",
            "deal_records",
            &json!({"title": "Acme", "stage": "open"}),
        )
        .unwrap();
        DbService::insert_record(
            &conn,
            "tenant-A",
            "dev-user",
            "deal_records",
            &json!({"title": "Globex", "stage": "won"}),
        )
        .unwrap();
        DbService::insert_record(
            &conn,
            "tenant-B",
            "dev-user",
            "deal_records",
            &json!({"title": "Initech", "stage": "open"}),
        )
        .unwrap();

        let empty_filter = serde_json::Map::new();
        let rows =
            DbService::query_records(&conn, "tenant-A", "deal_records", &empty_filter, 100).unwrap();
        assert_eq!(rows.len(), 2);

        let mut filter = serde_json::Map::new();
        filter.insert("stage".to_string(), json!("open"));
        let rows = DbService::query_records(&conn, "tenant-A", "deal_records", &filter, 100).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data["title"], "Acme");

        let mut filter = serde_json::Map::new();
        filter.insert("stage".to_string(), json!("lost"));
        let rows = DbService::query_records(&conn, "tenant-A", "deal_records", &filter, 100).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_event_append_and_list() {
        let conn = get_test_db();

        DbService::append_event(
            &conn,
            "tenant-A",
            "record.created",
            "ModelDef",
            "dev-user",
            &json!({"name": "Deal"}),
        )
        .unwrap();
        DbService::append_event(
            &conn,
            "tenant-A",
            "record.created",
            "Deal",
            "dev-user",
            &json!({"title": "Acme"}),
        )
        .unwrap();

        let events = DbService::list_events(&conn, "tenant-A").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "record.created");
        assert_eq!(events[0].model, "ModelDef");
        assert_eq!(events[1].model, "Deal");
        assert_eq!(events[1].after["title"], "Acme");

        assert!(DbService::list_events(&conn, "tenant-B").unwrap().is_empty());
    }
}
