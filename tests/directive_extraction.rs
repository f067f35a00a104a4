#[cfg(test)]
mod tests {
    use maxcrm::ai::directive::{
        extract_directives, first_json_object, normalize_visual, parse_youtube_id, scrape_links,
        ActionDirective, VisualDirective, FALLBACK_REPLY,
    };
    use serde_json::json;

    // --- URL parsing ---

    #[test]
    fn test_parse_youtube_id_variants() {
        assert_eq!(
            parse_youtube_id("https://youtu.be/abc123XYZ9"),
            Some("abc123XYZ9".to_string())
        );
        assert_eq!(
            parse_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            parse_youtube_id("https://www.youtube.com/watch?t=30&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            parse_youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            parse_youtube_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(parse_youtube_id("https://example.com/watch?v=nope"), None);
        assert_eq!(parse_youtube_id("not a url"), None);
    }

    // --- Link scraping ---

    #[test]
    fn test_markdown_youtube_link_scraped() {
        let out = extract_directives("Check this [here](https://youtu.be/abc123XYZ9) out");
        assert_eq!(out.clean_reply, "Check this out");
        assert_eq!(
            out.visual,
            Some(VisualDirective::YoutubeId {
                id: "abc123XYZ9".to_string(),
                caption: String::new(),
            })
        );
        assert_eq!(out.action, None);
    }

    #[test]
    fn test_markdown_link_always_stripped_even_without_youtube() {
        let out = extract_directives("See [the docs](https://example.com/docs) for more.");
        assert_eq!(out.clean_reply, "See for more.");
        assert_eq!(out.visual, None);
    }

    #[test]
    fn test_bare_non_youtube_url_preserved() {
        let out = extract_directives("Go to https://example.com/pricing for details.");
        assert_eq!(out.clean_reply, "Go to https://example.com/pricing for details.");
        assert_eq!(out.visual, None);
    }

    #[test]
    fn test_bare_youtube_url_removed() {
        let out = extract_directives("Watch https://www.youtube.com/watch?v=dQw4w9WgXcQ tonight");
        assert_eq!(out.clean_reply, "Watch tonight");
        assert_eq!(
            out.visual,
            Some(VisualDirective::YoutubeId {
                id: "dQw4w9WgXcQ".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn test_scraped_ids_deduplicated_first_seen_order() {
        let text = "A [x](https://youtu.be/firstID123) B [y](https://youtu.be/secondID45) \
                    C https://youtu.be/firstID123";
        let (_, ids) = scrape_links(text);
        assert_eq!(ids, vec!["firstID123".to_string(), "secondID45".to_string()]);

        // extraction picks the first id
        let out = extract_directives(text);
        assert_eq!(
            out.visual,
            Some(VisualDirective::YoutubeId {
                id: "firstID123".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn test_link_scrape_suppresses_visual_fallback() {
        let out = extract_directives(
            "Try [this](https://youtu.be/abc123XYZ9)\nVISUAL:{\"type\":\"image\",\"prompt\":\"a fox\"}",
        );
        // the scraped link wins; the VISUAL line is not consulted
        assert_eq!(
            out.visual,
            Some(VisualDirective::YoutubeId {
                id: "abc123XYZ9".to_string(),
                caption: String::new(),
            })
        );
    }

    // --- Round trip ---

    #[test]
    fn test_plain_reply_passes_through_unchanged() {
        let raw = "  Deals closed this week: 4.\nNice work!  ";
        let out = extract_directives(raw);
        assert_eq!(out.clean_reply, raw.trim());
        assert_eq!(out.visual, None);
        assert_eq!(out.action, None);
    }

    #[test]
    fn test_empty_reply_becomes_fallback() {
        let out = extract_directives("   \n  ");
        assert_eq!(out.clean_reply, FALLBACK_REPLY);
        assert_eq!(out.visual, None);
        assert_eq!(out.action, None);
    }

    // --- VISUAL marker ---

    #[test]
    fn test_visual_image_directive() {
        let out = extract_directives("Sure!\nVISUAL:{\"type\":\"image\",\"prompt\":\"a red fox\"}");
        assert_eq!(out.clean_reply, "Sure!");
        assert_eq!(
            out.visual,
            Some(VisualDirective::Image {
                prompt: "a red fox".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn test_visual_directive_with_code_fences() {
        let out = extract_directives(
            "Here you go.\nVISUAL:```json\n{\"type\":\"youtube\",\"id\":\"dQw4w9WgXcQ\"}\n```",
        );
        assert_eq!(out.clean_reply, "Here you go.");
        assert_eq!(
            out.visual,
            Some(VisualDirective::YoutubeId {
                id: "dQw4w9WgXcQ".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn test_last_visual_marker_wins() {
        let out = extract_directives(
            "VISUAL:{\"type\":\"image\",\"prompt\":\"old\"}\nActually:\nVISUAL:{\"type\":\"image\",\"prompt\":\"new\"}",
        );
        assert_eq!(
            out.visual,
            Some(VisualDirective::Image {
                prompt: "new".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn test_malformed_visual_json_degrades_and_is_deterministic() {
        let raw = "Sorry.\nVISUAL:{\"type\":\"image\",";
        for _ in 0..3 {
            let out = extract_directives(raw);
            assert_eq!(out.clean_reply, "Sorry.");
            assert_eq!(out.visual, None);
        }
    }

    #[test]
    fn test_visual_youtube_from_url_field() {
        let out = extract_directives(
            "Enjoy.\nVISUAL:{\"type\":\"youtube\",\"url\":\"https://youtu.be/dQw4w9WgXcQ\"}",
        );
        assert_eq!(
            out.visual,
            Some(VisualDirective::YoutubeId {
                id: "dQw4w9WgXcQ".to_string(),
                caption: String::new(),
            })
        );
    }

    #[test]
    fn test_visual_youtube_search_aliases() {
        for key in ["search", "query", "q"] {
            let raw = format!("Ok.\nVISUAL:{{\"type\":\"yt\",\"{}\":\"lofi beats\"}}", key);
            let out = extract_directives(&raw);
            assert_eq!(
                out.visual,
                Some(VisualDirective::YoutubeSearch {
                    query: "lofi beats".to_string(),
                    caption: String::new(),
                }),
                "alias {} should normalize",
                key
            );
        }
    }

    #[test]
    fn test_visual_normalization_rejects_bad_shapes() {
        assert_eq!(
            normalize_visual(&json!({"type": "image", "prompt": "  "})),
            VisualDirective::Unrecognized
        );
        assert_eq!(
            normalize_visual(&json!({"type": "video", "url": "ftp://example.com/clip"})),
            VisualDirective::Unrecognized
        );
        assert_eq!(
            normalize_visual(&json!({"type": "hologram"})),
            VisualDirective::Unrecognized
        );
        assert_eq!(
            normalize_visual(&json!({"type": "youtube"})),
            VisualDirective::Unrecognized
        );
    }

    #[test]
    fn test_visual_type_case_insensitive() {
        assert_eq!(
            normalize_visual(&json!({"type": "Video", "url": "https://cdn.example.com/a.mp4"})),
            VisualDirective::Video {
                url: "https://cdn.example.com/a.mp4".to_string(),
                caption: String::new(),
            }
        );
    }

    // --- ACTION marker ---

    #[test]
    fn test_action_create_model_parsed() {
        let out = extract_directives(
            "Done.\nACTION:{\"type\":\"create_model\",\"name\":\"Deal\",\"collection\":\"deal_records\",\
             \"fields\":[{\"name\":\"title\",\"type\":\"string\",\"required\":true}]}",
        );
        assert_eq!(out.clean_reply, "Done.");
        match out.action {
            Some(ActionDirective::CreateModel {
                name,
                collection,
                fields,
            }) => {
                assert_eq!(name, "Deal");
                assert_eq!(collection, "deal_records");
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].name, "title");
                assert!(fields[0].required);
            }
            other => panic!("expected CreateModel, got {:?}", other),
        }
    }

    #[test]
    fn test_action_create_document_parsed() {
        let out = extract_directives(
            "Saving.\nACTION:{\"type\":\"create_document\",\"model\":\"Deal\",\"data\":{\"title\":\"Acme\"}}",
        );
        match out.action {
            Some(ActionDirective::CreateDocument { model, data }) => {
                assert_eq!(model, "Deal");
                assert_eq!(data["title"], "Acme");
            }
            other => panic!("expected CreateDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_action_with_non_object_data_unrecognized() {
        let out = extract_directives(
            "Hmm.\nACTION:{\"type\":\"create_document\",\"model\":\"Deal\",\"data\":\"oops\"}",
        );
        assert_eq!(out.action, Some(ActionDirective::Unrecognized));
    }

    #[test]
    fn test_visual_and_action_both_extracted() {
        let out = extract_directives(
            "All set.\nVISUAL:{\"type\":\"image\",\"prompt\":\"a chart\"}\n\
             ACTION:{\"type\":\"create_document\",\"model\":\"Deal\",\"data\":{\"title\":\"Acme\"}}",
        );
        assert_eq!(out.clean_reply, "All set.");
        assert!(matches!(out.visual, Some(VisualDirective::Image { .. })));
        assert!(matches!(
            out.action,
            Some(ActionDirective::CreateDocument { .. })
        ));
    }

    #[test]
    fn test_malformed_action_json_degrades() {
        let out = extract_directives("Oops.\nACTION:{\"type\":");
        assert_eq!(out.clean_reply, "Oops.");
        assert_eq!(out.action, None);
    }

    // --- Balanced JSON scanning ---

    #[test]
    fn test_first_json_object_nested_braces() {
        let s = "noise {\"a\":{\"b\":1},\"c\":2} trailing {ignored}";
        assert_eq!(first_json_object(s), Some("{\"a\":{\"b\":1},\"c\":2}"));
    }

    #[test]
    fn test_first_json_object_braces_inside_strings() {
        let s = "{\"text\":\"curly } brace { soup\",\"n\":1} rest";
        assert_eq!(
            first_json_object(s),
            Some("{\"text\":\"curly } brace { soup\",\"n\":1}")
        );
    }

    #[test]
    fn test_first_json_object_unterminated() {
        assert_eq!(first_json_object("{\"a\": 1"), None);
        assert_eq!(first_json_object("no braces here"), None);
    }
}
