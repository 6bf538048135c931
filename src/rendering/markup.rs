//! Markup normalization: restricted HTML to plain text with break and
//! emphasis markers.
//!
//! The output keeps one `\n` per block close or `<br>`, and encodes emphasis as
//! `**bold**` and `_italic_` so the run tokenizer can pick it up line by line.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const BOLD_MARKER: &str = "**";
pub const ITALIC_MARKER: &str = "_";
pub const BULLET: &str = "• ";

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"(?s)<(/?)([A-Za-z][A-Za-z0-9]*)([^>]*)>").unwrap())
}

fn leftover_regex() -> &'static Regex {
    // comments, doctype, processing instructions
    static LEFTOVER_REGEX: OnceLock<Regex> = OnceLock::new();
    LEFTOVER_REGEX.get_or_init(|| Regex::new(r"(?s)<[!?/][^>]*>").unwrap())
}

fn entity_regex() -> &'static Regex {
    static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap()
    })
}

/// Normalize restricted HTML into marked-up plain text.
///
/// Never fails: unknown tags are dropped, unknown entities and stray `<` are
/// kept literally.
pub fn normalize(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let text = tag_regex().replace_all(markup, |caps: &Captures| replace_tag(caps));
    let text = leftover_regex().replace_all(&text, "");
    let text = decode_entities(&text);

    text.trim_matches(|c| c == ' ' || c == '\t' || c == '\r')
        .to_string()
}

fn replace_tag(caps: &Captures) -> &'static str {
    let closing = !caps[1].is_empty();
    let name = caps[2].to_ascii_lowercase();
    match (name.as_str(), closing) {
        ("div" | "p" | "li", true) => "\n",
        ("div" | "p" | "ul" | "ol" | "u", _) => "",
        ("br", _) => "\n",
        ("li", false) => BULLET,
        ("b" | "strong", _) => BOLD_MARKER,
        ("i" | "em", _) => ITALIC_MARKER,
        _ => "",
    }
}

/// Decode HTML entities one by one so a single bad entity cannot spoil the
/// rest of the text. Non-breaking spaces become plain spaces.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') && !text.contains('\u{a0}') {
        return Cow::Borrowed(text);
    }
    let decoded = entity_regex().replace_all(text, |caps: &Captures| {
        let entity = &caps[0];
        match quick_xml::escape::unescape_with(entity, quick_xml::escape::resolve_html5_entity) {
            Ok(resolved) => resolved.into_owned(),
            Err(_) => entity.to_string(),
        }
    });
    if decoded.contains('\u{a0}') {
        Cow::Owned(decoded.replace('\u{a0}', " "))
    } else {
        decoded
    }
}
