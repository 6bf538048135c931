//! Font loading, fallback and text metrics.
//!
//! Faces are resolved through an ordered list of [`FontSource`]s: a TrueType
//! file when it can be read and parsed, otherwise the built-in ISO-8859-1
//! bitmap fonts. Parsed files are kept in a [`FontCache`] owned by the engine.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use embedded_graphics::mono_font::{iso_8859_1, MonoFont};
use log::{debug, info, warn};

use super::runs::{FormattingRun, RunStyle};
use crate::StyleConfig;

/// Per-character width estimate, relative to the font size, used when a face
/// cannot measure a string.
pub const ESTIMATED_CHAR_WIDTH_RATIO: f32 = 0.6;

/// Width provider used by the line wrapper and the compositor.
pub trait TextMeasurer {
    /// Advance width of `text` set in `style`, or `None` when the face cannot
    /// measure it.
    fn measure(&self, text: &str, style: RunStyle) -> Option<f32>;

    /// Per-character width used when `measure` gives up.
    fn fallback_char_width(&self) -> f32;

    /// Advance width with the fixed-width estimate as fallback.
    fn advance(&self, text: &str, style: RunStyle) -> f32 {
        match self.measure(text, style) {
            Some(w) => w,
            None => {
                debug!("No metrics for {:?}, estimating width", text);
                text.chars().count() as f32 * self.fallback_char_width()
            }
        }
    }

    /// Total advance of a sequence of runs.
    fn runs_width(&self, runs: &[FormattingRun]) -> f32 {
        runs.iter().map(|r| self.advance(&r.text, r.style)).sum()
    }
}

/// Measurer with a fixed advance per character and style.
///
/// Handy for deterministic layout and for tests that must not depend on font
/// files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    pub plain: f32,
    pub bold: f32,
    pub italic: f32,
}

impl FixedAdvance {
    pub fn uniform(width: f32) -> Self {
        Self {
            plain: width,
            bold: width,
            italic: width,
        }
    }
}

impl TextMeasurer for FixedAdvance {
    fn measure(&self, text: &str, style: RunStyle) -> Option<f32> {
        let per_char = match style {
            RunStyle::Plain => self.plain,
            RunStyle::Bold => self.bold,
            RunStyle::Italic => self.italic,
        };
        Some(text.chars().count() as f32 * per_char)
    }

    fn fallback_char_width(&self) -> f32 {
        self.plain
    }
}

/// Where a face may come from, in order of preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    Builtin,
}

/// A usable face.
#[derive(Clone)]
pub enum FontFace {
    /// Parsed TrueType/OpenType font
    Outline(FontArc),
    /// Built-in bitmap fonts, picked by size at draw time
    Builtin,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Outline(_) => f.write_str("Outline"),
            FontFace::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontFace {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontFace::Builtin)
    }
}

/// Process-wide cache of parsed font files, keyed by path.
///
/// Only successful loads are cached; fonts are static assets so entries are
/// never invalidated.
#[derive(Default)]
pub struct FontCache {
    faces: Mutex<HashMap<PathBuf, FontArc>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or fetch from cache) the font at `path`.
    pub fn load(&self, path: &Path) -> Option<FontArc> {
        let mut faces = self.faces.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(font) = faces.get(path) {
            return Some(font.clone());
        }
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read font {}: {}", path.display(), e);
                return None;
            }
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                faces.insert(path.to_path_buf(), font.clone());
                Some(font)
            }
            Err(e) => {
                warn!("Failed to parse font {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Walk `chain` in order and return the first face that is available.
    pub fn resolve(&self, chain: &[FontSource]) -> FontFace {
        for source in chain {
            match source {
                FontSource::File(path) => {
                    if let Some(font) = self.load(path) {
                        debug!("Using font file {}", path.display());
                        return FontFace::Outline(font);
                    }
                }
                FontSource::Builtin => {
                    info!("Using built-in bitmap font");
                    return FontFace::Builtin;
                }
            }
        }
        warn!("No font source in chain was usable, using built-in bitmap font");
        FontFace::Builtin
    }

    /// Resolve the regular and bold faces for a style configuration.
    pub fn font_set(&self, style: &StyleConfig) -> FontSet {
        let regular = self.resolve(&[
            FontSource::File(style.font_regular.clone()),
            FontSource::Builtin,
        ]);
        let bold = self.resolve(&[
            FontSource::File(style.font_bold.clone()),
            FontSource::File(style.font_regular.clone()),
            FontSource::Builtin,
        ]);
        FontSet { regular, bold }
    }

    pub fn len(&self) -> usize {
        self.faces.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Regular and bold faces for one render. Italic runs reuse the regular face
/// (the bitmap fallback has real italic glyphs for small sizes).
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: FontFace,
    pub bold: FontFace,
}

impl FontSet {
    /// A set using only the built-in bitmap fonts.
    pub fn builtin() -> Self {
        Self {
            regular: FontFace::Builtin,
            bold: FontFace::Builtin,
        }
    }

    pub fn face(&self, style: RunStyle) -> &FontFace {
        match style {
            RunStyle::Bold => &self.bold,
            RunStyle::Plain | RunStyle::Italic => &self.regular,
        }
    }

    /// Bind the set to a pixel size.
    pub fn at(&self, px: f32) -> ScaledFonts<'_> {
        ScaledFonts { fonts: self, px }
    }
}

/// A [`FontSet`] at a given pixel size.
#[derive(Debug, Clone, Copy)]
pub struct ScaledFonts<'a> {
    pub fonts: &'a FontSet,
    pub px: f32,
}

impl TextMeasurer for ScaledFonts<'_> {
    fn measure(&self, text: &str, style: RunStyle) -> Option<f32> {
        match self.fonts.face(style) {
            FontFace::Outline(font) => outline_width(font, self.px, text),
            FontFace::Builtin => Some(builtin_width(builtin_font(self.px, style), text)),
        }
    }

    fn fallback_char_width(&self) -> f32 {
        self.px * ESTIMATED_CHAR_WIDTH_RATIO
    }
}

/// Sum of horizontal advances plus kerning. `None` when the font has no
/// usable units-per-em.
pub fn outline_width(font: &FontArc, px: f32, text: &str) -> Option<f32> {
    font.units_per_em()?;
    let scaled = font.as_scaled(PxScale::from(px));
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    Some(width)
}

/// Pick the bitmap font closest to `px` for a run style.
pub fn builtin_font(px: f32, style: RunStyle) -> &'static MonoFont<'static> {
    if px < 16.0 {
        match style {
            RunStyle::Plain => &iso_8859_1::FONT_7X13,
            RunStyle::Bold => &iso_8859_1::FONT_7X13_BOLD,
            RunStyle::Italic => &iso_8859_1::FONT_7X13_ITALIC,
        }
    } else if px < 22.0 {
        match style {
            RunStyle::Plain | RunStyle::Italic => &iso_8859_1::FONT_9X15,
            RunStyle::Bold => &iso_8859_1::FONT_9X15_BOLD,
        }
    } else {
        match style {
            RunStyle::Plain | RunStyle::Italic => &iso_8859_1::FONT_10X20,
            RunStyle::Bold => &iso_8859_1::FONT_9X18_BOLD,
        }
    }
}

pub fn builtin_width(font: &MonoFont<'_>, text: &str) -> f32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0.0;
    }
    (n * font.character_size.width + (n - 1) * font.character_spacing) as f32
}

/// Replace characters outside ISO-8859-1 that have a close Latin-1 stand-in.
/// Anything else is drawn as the font's replacement glyph.
pub fn latin1_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(|c| (c as u32) < 0x100) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '\u{2022}' => '\u{00B7}', // bullet -> middle dot
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                other => other,
            })
            .collect(),
    )
}
