//! Self-contained HTML preview of an announcement.
//!
//! The document mirrors the raster layout with absolutely positioned blocks.
//! It is what the screenshot renderer loads, and it is handy on its own for
//! previewing in a browser.

use std::fmt::Write as _;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::warn;
use quick_xml::escape::escape;

use crate::rendering::compositor::{clamp_layout, field_size, special_title_lines};
use crate::rendering::layout::{PANEL_PADDING, PANEL_WIDTH};
use crate::rendering::markup;
use crate::rendering::runs::{tokenize, RunStyle};
use crate::style::{to_hex_color, FieldStyle};
use crate::{AnnouncementContent, AnnouncementLayout, FieldLayout, StyleConfig};

/// Viewport of the screenshot taken from the preview.
pub const PREVIEW_WIDTH: u32 = 1000;
pub const PREVIEW_HEIGHT: u32 = 1300;

const GRADIENT_CSS: &str =
    "linear-gradient(90deg, #00BFFF 0%, #1E90FF 25%, #6A5ACD 75%, #8B5CF6 100%)";

/// Build the preview document.
///
/// A background that cannot be read is replaced by the gradient.
pub fn preview_html(
    content: &AnnouncementContent,
    layout: &AnnouncementLayout,
    style: &StyleConfig,
    background: Option<&Path>,
) -> String {
    let layout = &clamp_layout(layout);
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         @font-face {{ font-family: 'AnnounceRegular'; src: url('{regular}'); }}\n\
         @font-face {{ font-family: 'AnnounceBold'; src: url('{bold}'); }}\n\
         html, body {{ margin: 0; padding: 0; }}\n\
         #canvas {{ position: relative; width: {w}px; height: {h}px; overflow: hidden; \
         background: {bg}; background-size: cover; font-family: 'AnnounceRegular', sans-serif; }}\n\
         .field {{ position: absolute; box-sizing: border-box; }}\n\
         .bold {{ font-family: 'AnnounceBold', sans-serif; font-weight: bold; }}\n\
         .panel {{ position: absolute; background: rgba(255, 255, 255, 0.9); }}\n\
         </style>\n</head>\n<body>\n<div id=\"canvas\">\n",
        regular = escape(&style.font_regular.display().to_string()),
        bold = escape(&style.font_bold.display().to_string()),
        w = PREVIEW_WIDTH,
        h = PREVIEW_HEIGHT,
        bg = background_css(background),
    );

    if let Some(title) = non_empty(&content.title) {
        let inner = match special_title_lines(title) {
            Some(lines) => lines.join("<br>"),
            None => escape(&title.trim().to_uppercase()).into_owned(),
        };
        push_field(&mut html, "title bold", &layout.title, &style.title, 1.2, &inner);
    }
    if let Some(subtitle) = non_empty(&content.subtitle) {
        push_field(
            &mut html,
            "subtitle bold",
            &layout.subtitle,
            &style.subtitle,
            1.2,
            &escape(subtitle),
        );
    }
    if let Some(body) = non_empty(&content.body) {
        let field = &layout.body;
        let _ = writeln!(
            html,
            "<div class=\"panel\" style=\"left: {}px; top: {}px; width: {}px; min-height: 200px;\"></div>",
            field.x as i64 - PANEL_PADDING as i64,
            field.y as i64 - PANEL_PADDING as i64,
            PANEL_WIDTH + PANEL_PADDING,
        );
        let padded = FieldLayout {
            x: field.x + PANEL_PADDING,
            y: field.y + PANEL_PADDING,
            ..*field
        };
        push_block(
            &mut html,
            "body",
            &padded,
            &style.body,
            Some(PANEL_WIDTH - 2 * PANEL_PADDING),
            1.6,
            &rich_html(body),
        );
    }
    if let Some(footer) = non_empty(&content.footer) {
        push_field(&mut html, "footer", &layout.footer, &style.footer, 1.2, &rich_html(footer));
    }
    if let Some(audience) = non_empty(&content.audience) {
        push_field(
            &mut html,
            "audience",
            &layout.audience,
            &style.audience,
            1.2,
            &escape(audience),
        );
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn background_css(background: Option<&Path>) -> String {
    let Some(path) = background else {
        return GRADIENT_CSS.to_string();
    };
    match std::fs::read(path) {
        Ok(bytes) => format!(
            "url('data:{};base64,{}')",
            mime_type(path),
            STANDARD.encode(bytes)
        ),
        Err(e) => {
            warn!(
                "Failed to read preview background {}: {}; using gradient",
                path.display(),
                e
            );
            GRADIENT_CSS.to_string()
        }
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Normalized markup as escaped HTML with `<b>`, `<i>` and `<br>` only.
fn rich_html(markup_text: &str) -> String {
    let normalized = markup::normalize(markup_text);
    let mut out = String::new();
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        for run in tokenize(line) {
            let text = escape(&run.text);
            match run.style {
                RunStyle::Plain => out.push_str(&text),
                RunStyle::Bold => {
                    let _ = write!(out, "<b class=\"bold\">{}</b>", text);
                }
                RunStyle::Italic => {
                    let _ = write!(out, "<i>{}</i>", text);
                }
            }
        }
    }
    out
}

fn push_field(
    html: &mut String,
    class: &str,
    field: &FieldLayout,
    style: &FieldStyle,
    line_height: f32,
    inner: &str,
) {
    let width = PREVIEW_WIDTH.saturating_sub(2 * field.x);
    push_block(html, class, field, style, Some(width), line_height, inner);
}

fn push_block(
    html: &mut String,
    class: &str,
    field: &FieldLayout,
    style: &FieldStyle,
    width: Option<u32>,
    line_height: f32,
    inner: &str,
) {
    let mut css = format!(
        "left: {}px; top: {}px; font-size: {}px; line-height: {}; color: {}; text-align: {};",
        field.x,
        field.y,
        field_size(field, style),
        line_height,
        to_hex_color(style.color),
        field.alignment.as_str(),
    );
    if let Some(w) = width {
        let _ = write!(css, " width: {}px;", w);
    }
    let _ = writeln!(
        html,
        "<div class=\"field {}\" style=\"{}\">{}</div>",
        class, css, inner
    );
}
