//! Style configuration: colors, default sizes and font files per field.
//!
//! Collaborators hand the style over as a flat string map (the shape it has in
//! their settings store). Missing keys keep the documented defaults; keys that
//! fail to parse are logged and ignored.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use image::Rgb;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const DEFAULT_REGULAR_FONT: &str = "static/fonts/GlobotipoCorporativa-Regular.ttf";
pub const DEFAULT_BOLD_FONT: &str = "static/fonts/GlobotipoCorporativa-Bold.ttf";

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Color and fallback size of one text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStyle {
    #[serde(with = "hex_color")]
    pub color: Rgb<u8>,
    /// Used when the field layout leaves `font_size` at 0
    pub size: u32,
}

impl FieldStyle {
    pub const fn new(color: Rgb<u8>, size: u32) -> Self {
        Self { color, size }
    }
}

/// Style defaults for a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub title: FieldStyle,
    pub subtitle: FieldStyle,
    pub body: FieldStyle,
    pub footer: FieldStyle,
    pub audience: FieldStyle,
    /// Regular face, also used for italic runs
    pub font_regular: PathBuf,
    /// Bold face, used for titles, subtitles and bold runs
    pub font_bold: PathBuf,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            title: FieldStyle::new(WHITE, 42),
            subtitle: FieldStyle::new(BLACK, 32),
            body: FieldStyle::new(BLACK, 24),
            footer: FieldStyle::new(BLACK, 24),
            audience: FieldStyle::new(BLACK, 16),
            font_regular: PathBuf::from(DEFAULT_REGULAR_FONT),
            font_bold: PathBuf::from(DEFAULT_BOLD_FONT),
        }
    }
}

impl StyleConfig {
    /// Build a style from a flat key-value map.
    ///
    /// Recognized keys are `<field>_color` (`#RRGGBB`), `<field>_size`
    /// (positive integer) for `title`, `subtitle`, `body`, `footer` and
    /// `audience`, plus `font_regular` and `font_bold` (file paths).
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let mut cfg = Self::default();
        for (field, style) in [
            ("title", &mut cfg.title),
            ("subtitle", &mut cfg.subtitle),
            ("body", &mut cfg.body),
            ("footer", &mut cfg.footer),
            ("audience", &mut cfg.audience),
        ] {
            let color_key = format!("{}_color", field);
            if let Some(raw) = map.get(&color_key) {
                match parse_hex_color(raw) {
                    Some(c) => style.color = c,
                    None => warn!("Ignoring {}: {:?} is not a #RRGGBB color", color_key, raw),
                }
            }
            let size_key = format!("{}_size", field);
            if let Some(raw) = map.get(&size_key) {
                match raw.trim().parse::<u32>() {
                    Ok(size) if size > 0 => style.size = size,
                    _ => warn!("Ignoring {}: {:?} is not a positive size", size_key, raw),
                }
            }
        }
        if let Some(path) = map.get("font_regular").filter(|p| !p.trim().is_empty()) {
            cfg.font_regular = PathBuf::from(path.trim());
        }
        if let Some(path) = map.get("font_bold").filter(|p| !p.trim().is_empty()) {
            cfg.font_bold = PathBuf::from(path.trim());
        }
        cfg
    }

    /// Parse a style document.
    ///
    /// An object whose values are all strings or numbers is the flat
    /// key-value format and goes through [`StyleConfig::from_map`]; anything
    /// else must be a serialized `StyleConfig`.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::ConfigError(format!("style is not valid JSON: {}", e)))?;
        if let Value::Object(obj) = &value {
            let flat: Option<HashMap<String, String>> = obj
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Some((k.clone(), s.clone())),
                    Value::Number(n) => Some((k.clone(), n.to_string())),
                    _ => None,
                })
                .collect();
            if let Some(map) = flat {
                return Ok(Self::from_map(&map));
            }
        }
        serde_json::from_value(value)
            .map_err(|e| Error::ConfigError(format!("invalid style: {}", e)))
    }
}

/// Parse `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    static HEX_COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = HEX_COLOR_REGEX.get_or_init(|| {
        Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").unwrap()
    });
    let caps = re.captures(value.trim())?;
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
    Some(Rgb([channel(1)?, channel(2)?, channel(3)?]))
}

pub fn to_hex_color(color: Rgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color.0[0], color.0[1], color.0[2])
}

mod hex_color {
    use image::Rgb;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Rgb<u8>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_hex_color(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rgb<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_hex_color(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid color {:?}", raw)))
    }
}
