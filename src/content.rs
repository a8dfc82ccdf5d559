//! Decides whether a bookmark is worth publishing and renders it as a post.
//!
//! Everything here is pure: the same bookmark always yields the same payload.

use chrono::DateTime;
use chrono_tz::America::Los_Angeles;

use crate::model::{Bookmark, PostMeta, PostPayload};

pub const UNTITLED: &str = "Untitled";
pub const PUBLISH: &str = "publish";

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.trim().is_empty())
}

/// A bookmark is publishable once the user has written something about it:
/// a note, at least one highlight, or a note on a highlight.
pub fn should_publish(bookmark: &Bookmark) -> bool {
    let has_note = non_blank(&bookmark.note).is_some();
    let has_highlights = !bookmark.highlights.is_empty();
    let has_highlight_notes = bookmark.highlights.iter().any(|h| non_blank(&h.note).is_some());
    has_note || has_highlights || has_highlight_notes
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders a Raindrop timestamp as e.g. `January 4, 2024`, in Pacific time.
///
/// Timestamps that do not parse as RFC 3339 are passed through unchanged.
pub fn format_date(created: Option<&str>) -> String {
    let Some(raw) = created else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Los_Angeles).format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn render_html(bookmark: &Bookmark) -> String {
    let created = format_date(bookmark.created.as_deref());
    let mut parts = Vec::new();

    parts.push(format!(
        r#"<div class="link-item" data-raindrop-id="{}" data-created="{}">"#,
        escape_html(&bookmark.id),
        escape_html(&created)
    ));

    if let Some(note) = non_blank(&bookmark.note) {
        parts.push(format!("<p>{}</p>", escape_html(note)));
    }

    for highlight in &bookmark.highlights {
        // A highlight note only renders under its quoted text.
        let Some(text) = non_blank(&highlight.text) else {
            continue;
        };
        parts.push(format!("<blockquote>{}</blockquote>", escape_html(text)));
        if let Some(note) = non_blank(&highlight.note) {
            parts.push(format!("<p>{}</p>", escape_html(note)));
        }
    }

    parts.push(format!(
        r#"<p><a href="{}" target="_blank">Original link</a></p>"#,
        escape_html(&bookmark.link)
    ));
    parts.push("</div>".to_string());

    parts.join("\n")
}

pub fn format_post(bookmark: &Bookmark, post_tag: &str) -> PostPayload {
    let title = bookmark
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED);

    PostPayload {
        title: title.to_string(),
        content: render_html(bookmark),
        status: PUBLISH.to_string(),
        excerpt: bookmark.excerpt.clone().unwrap_or_default(),
        meta: PostMeta {
            raindrop_id: bookmark.id.clone(),
        },
        tags: vec![post_tag.to_string()],
    }
}
