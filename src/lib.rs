//! Announcement Raster Engine
//!
//! Turns a structured announcement (title, subtitle, rich-text body, footer and
//! audience line, each with its own position, size and alignment) into a PNG or
//! JPEG image ready to be shared.
//!
//! # Features
//!
//! - **Raster engine** (default): markup normalization, style-aware line
//!   wrapping, panel sizing and compositing over a template or a procedural
//!   gradient
//! - **CDP fallback** (`cdp` feature): renders an HTML preview of the same
//!   announcement through headless Chrome
//! - **Graceful degradation**: missing fonts, missing templates and malformed
//!   markup never fail a render
//!
//! # Example
//!
//! ```no_run
//! use announce_raster::{
//!     AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, RasterEngine,
//!     RenderOptions, StyleConfig,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let content = AnnouncementContent {
//!     title: Some("Instabilidade".to_string()),
//!     body: Some("<p>Service is <b>degraded</b>.</p>".to_string()),
//!     ..Default::default()
//! };
//! let layout = AnnouncementLayout::defaults_for(&content);
//!
//! let engine = RasterEngine::new(RenderOptions::default());
//! let output = engine.render(&content, &layout, &StyleConfig::default(), None)?;
//! std::fs::write("announcement.png", &output.bytes)?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod style;
pub use style::{FieldStyle, StyleConfig};

// Text layout and rasterization pipeline
pub mod rendering;

pub mod engine;
pub use engine::RasterEngine;

// Async-friendly wrapper running renders on the blocking pool
pub mod async_api;
pub use async_api::{AsyncRenderer, RenderJob};

// Self-contained HTML preview used by the screenshot fallback
pub mod preview;

#[cfg(feature = "cdp")]
pub mod cdp;

/// Text content of one announcement.
///
/// `title`, `subtitle` and `audience` are plain text; `body` and `footer`
/// carry the restricted HTML vocabulary understood by
/// [`rendering::markup::normalize`]. A field that is `None` or empty is not
/// drawn at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub footer: Option<String>,
    pub audience: Option<String>,
}

/// Horizontal alignment of a text block inside its box.
///
/// `Justify` is accepted for compatibility with stored records but renders
/// exactly like `Left`; no inter-word stretching is performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Parse an alignment name; unknown names resolve to `Left`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" => Alignment::Center,
            "right" => Alignment::Right,
            "justify" => Alignment::Justify,
            "left" => Alignment::Left,
            other => {
                warn!("Unknown alignment {:?}, using left", other);
                Alignment::Left
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl From<String> for Alignment {
    fn from(value: String) -> Self {
        Alignment::parse(&value)
    }
}

impl From<Alignment> for String {
    fn from(value: Alignment) -> Self {
        value.as_str().to_string()
    }
}

/// Position, size and alignment of one block on the canvas.
///
/// A `font_size` of 0 means "unset": the style configuration's size for the
/// field is used instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub font_size: u32,
    #[serde(default)]
    pub alignment: Alignment,
}

impl FieldLayout {
    pub const fn new(x: u32, y: u32, font_size: u32, alignment: Alignment) -> Self {
        Self {
            x,
            y,
            font_size,
            alignment,
        }
    }
}

/// Per-field layout of an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementLayout {
    pub title: FieldLayout,
    pub subtitle: FieldLayout,
    pub body: FieldLayout,
    pub footer: FieldLayout,
    pub audience: FieldLayout,
}

impl Default for AnnouncementLayout {
    fn default() -> Self {
        Self {
            title: FieldLayout::new(60, 80, 42, Alignment::Left),
            subtitle: FieldLayout::new(0, 430, 32, Alignment::Center),
            body: FieldLayout::new(60, 510, 24, Alignment::Justify),
            footer: FieldLayout::new(60, 1000, 24, Alignment::Center),
            audience: FieldLayout::new(60, 1120, 16, Alignment::Left),
        }
    }
}

impl AnnouncementLayout {
    /// Default layout for a given announcement.
    ///
    /// Announcements whose title is one of the fixed incident titles get a
    /// larger title placed lower on the canvas.
    pub fn defaults_for(content: &AnnouncementContent) -> Self {
        let mut layout = Self::default();
        let special = content
            .title
            .as_deref()
            .and_then(rendering::compositor::special_title_lines)
            .is_some();
        if special {
            layout.title = FieldLayout::new(60, 120, 60, Alignment::Left);
        }
        layout
    }
}

/// Encoded image format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Options that apply to every render performed by an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Output encoding
    pub format: OutputFormat,
}

/// The result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Encoding of `bytes`
    pub format: OutputFormat,
    /// Whether body text was cut off before the footer or the canvas bottom
    pub truncated: bool,
}

/// Core trait for announcement renderers.
///
/// Implementations must be callable concurrently; a render only reads its
/// arguments.
pub trait AnnouncementRenderer {
    /// Render an announcement to encoded image bytes.
    ///
    /// `background` is the path of an optional template image. Content-level
    /// problems degrade gracefully; only unrecoverable conditions return `Err`.
    fn render(
        &self,
        content: &AnnouncementContent,
        layout: &AnnouncementLayout,
        style: &StyleConfig,
        background: Option<&Path>,
    ) -> Result<RenderOutput>;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "renderer"
    }
}

/// Render with a one-off raster engine.
///
/// Long-lived callers should keep a [`RasterEngine`] around instead so fonts
/// and templates are loaded only once.
pub fn render(
    content: &AnnouncementContent,
    layout: &AnnouncementLayout,
    style: &StyleConfig,
    background: Option<&Path>,
) -> Result<RenderOutput> {
    RasterEngine::new(RenderOptions::default()).render(content, layout, style, background)
}

/// Try `preferred` first and fall back to `fallback` if it fails.
///
/// The preferred renderer is called once, without retries. Its error is
/// logged and discarded; the fallback's result is returned as-is.
pub fn render_with_fallback(
    preferred: &dyn AnnouncementRenderer,
    fallback: &dyn AnnouncementRenderer,
    content: &AnnouncementContent,
    layout: &AnnouncementLayout,
    style: &StyleConfig,
    background: Option<&Path>,
) -> Result<RenderOutput> {
    match preferred.render(content, layout, style, background) {
        Ok(output) => Ok(output),
        Err(e) => {
            warn!(
                "{} renderer failed ({}), falling back to {}",
                preferred.name(),
                e,
                fallback.name()
            );
            fallback.render(content, layout, style, background)
        }
    }
}
