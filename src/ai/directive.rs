//! Directive extraction over raw model output.
//!
//! Grammar, applied in strict order to the trimmed reply:
//! 1. Link scrape: markdown `[label](url)` links and bare URLs. Markdown links
//!    are always removed; bare URLs are removed only when they carry a YouTube
//!    video ID. The first scraped ID (de-duplicated, first-seen order) becomes
//!    the visual and suppresses the `VISUAL:` fallback.
//! 2. `ACTION:` marker: last occurrence wins; text before it is the candidate
//!    clean reply; text after is stripped of code fences and scanned for the
//!    first balanced `{...}` span. Parse failures never fail the turn.
//!    Action comes off first because the contract puts the `ACTION:` line
//!    after any `VISUAL:` line.
//! 3. `VISUAL:` marker: same strategy over the remaining clean text, skipped
//!    entirely when step 1 already produced a visual.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::db::models::FieldDef;

pub const FALLBACK_REPLY: &str = "Okay.";

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[([^\]]*)\]\(([^)\s]+)\)|(https?://[^\s<>"'\)\]]+)"#).unwrap());

static YT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtu\.be/|youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/))([A-Za-z0-9_-]{6,})")
        .unwrap()
});

static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// A visual request parsed out of model output. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualDirective {
    Image { prompt: String, caption: String },
    Video { url: String, caption: String },
    YoutubeId { id: String, caption: String },
    YoutubeSearch { query: String, caption: String },
    /// Parsed JSON that matches no known visual shape. Dropped silently.
    Unrecognized,
}

/// A data-mutation request parsed out of model output. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDirective {
    CreateModel {
        name: String,
        collection: String,
        fields: Vec<FieldDef>,
    },
    CreateDocument {
        model: String,
        data: serde_json::Map<String, Value>,
    },
    /// Parsed JSON that matches no known action shape. Dropped silently.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub clean_reply: String,
    pub visual: Option<VisualDirective>,
    pub action: Option<ActionDirective>,
}

/// Parses a YouTube video ID out of a URL. Supports `youtu.be/<id>`,
/// `youtube.com/watch?v=<id>`, `/embed/<id>` and `/shorts/<id>`.
pub fn parse_youtube_id(url: &str) -> Option<String> {
    YT_RE.captures(url).map(|caps| caps[1].to_string())
}

/// Removes markdown links (always) and YouTube-bearing bare URLs from `text`,
/// collecting de-duplicated video IDs in first-seen order. Bare URLs that are
/// not YouTube links stay in place.
pub fn scrape_links(text: &str) -> (String, Vec<String>) {
    let mut ids: Vec<String> = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut removed_any = false;

    for caps in LINK_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let url = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|g| g.as_str())
            .unwrap_or("");
        let id = parse_youtube_id(url);
        if let Some(ref id) = id {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        let is_markdown = caps.get(2).is_some();
        out.push_str(&text[last..whole.start()]);
        if is_markdown || id.is_some() {
            removed_any = true;
        } else {
            out.push_str(whole.as_str());
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);

    if removed_any {
        (SPACE_RE.replace_all(&out, " ").trim().to_string(), ids)
    } else {
        (out.trim().to_string(), ids)
    }
}

/// First balanced `{...}` span in `s`, tracking strings and escapes so braces
/// inside JSON string values don't terminate the scan early.
pub fn first_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escape = false;

    for (i, &b) in s.as_bytes().iter().enumerate().skip(start) {
        if in_str {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_str = false;
            }
            continue;
        }
        match b {
            b'"' => in_str = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_code_fences(s: &str) -> String {
    s.replace("```json", "").replace("```", "")
}

/// Splits on the last occurrence of `marker`. Returns the trimmed text before
/// the marker and the parsed JSON object after it, if any.
fn split_marker(text: &str, marker: &str) -> Option<(String, Option<Value>)> {
    let idx = text.rfind(marker)?;
    let before = text[..idx].trim().to_string();
    let after = strip_code_fences(&text[idx + marker.len()..]);
    let parsed = first_json_object(&after).and_then(|span| serde_json::from_str::<Value>(span).ok());
    Some((before, parsed))
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// Canonicalizes a parsed visual object. `type` is lower-cased, `yt` is an
/// alias for `youtube`; anything that fits no known shape is `Unrecognized`.
pub fn normalize_visual(v: &Value) -> VisualDirective {
    let kind = v
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_ascii_lowercase();
    let kind = if kind == "yt" { "youtube".to_string() } else { kind };
    let caption = v
        .get("caption")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match kind.as_str() {
        "image" => match str_field(v, "prompt") {
            Some(prompt) => VisualDirective::Image {
                prompt: prompt.to_string(),
                caption,
            },
            None => VisualDirective::Unrecognized,
        },
        "video" => match str_field(v, "url") {
            Some(url) if url.starts_with("http") => VisualDirective::Video {
                url: url.to_string(),
                caption,
            },
            _ => VisualDirective::Unrecognized,
        },
        "youtube" => {
            let id = str_field(v, "id")
                .map(|s| s.to_string())
                .or_else(|| str_field(v, "url").and_then(parse_youtube_id));
            if let Some(id) = id {
                return VisualDirective::YoutubeId { id, caption };
            }
            let query = str_field(v, "search")
                .or_else(|| str_field(v, "query"))
                .or_else(|| str_field(v, "q"));
            match query {
                Some(q) => VisualDirective::YoutubeSearch {
                    query: q.to_string(),
                    caption,
                },
                None => VisualDirective::Unrecognized,
            }
        }
        _ => VisualDirective::Unrecognized,
    }
}

pub fn normalize_action(v: &Value) -> ActionDirective {
    let kind = v
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_ascii_lowercase();

    match kind.as_str() {
        "create_model" => {
            let name = str_field(v, "name");
            let collection = str_field(v, "collection");
            let fields = v
                .get("fields")
                .cloned()
                .and_then(|f| serde_json::from_value::<Vec<FieldDef>>(f).ok());
            match (name, collection, fields) {
                (Some(name), Some(collection), Some(fields)) => ActionDirective::CreateModel {
                    name: name.to_string(),
                    collection: collection.to_string(),
                    fields,
                },
                _ => ActionDirective::Unrecognized,
            }
        }
        "create_document" => {
            let model = str_field(v, "model");
            let data = v.get("data").and_then(Value::as_object);
            match (model, data) {
                (Some(model), Some(data)) => ActionDirective::CreateDocument {
                    model: model.to_string(),
                    data: data.clone(),
                },
                _ => ActionDirective::Unrecognized,
            }
        }
        _ => ActionDirective::Unrecognized,
    }
}

/// Decomposes raw model output into a clean reply plus optional visual and
/// action directives. Never fails; malformed directives degrade to None or
/// the Unrecognized variants.
pub fn extract_directives(raw: &str) -> Extraction {
    let trimmed = raw.trim();
    let base = if trimmed.is_empty() { FALLBACK_REPLY } else { trimmed };

    let (mut clean, ids) = scrape_links(base);

    let mut action = None;
    if let Some((before, parsed)) = split_marker(&clean, "ACTION:") {
        clean = before;
        action = parsed.map(|v| normalize_action(&v));
    }

    let mut visual = None;
    if let Some(first) = ids.into_iter().next() {
        visual = Some(VisualDirective::YoutubeId {
            id: first,
            caption: String::new(),
        });
    } else if let Some((before, parsed)) = split_marker(&clean, "VISUAL:") {
        clean = before;
        visual = parsed.map(|v| normalize_visual(&v));
    }

    Extraction {
        clean_reply: clean,
        visual,
        action,
    }
}
