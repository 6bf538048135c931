//! Compositor: turns an announcement into a display list for one canvas.
//!
//! Paint order is fixed: body panel, title, subtitle, body runs, footer,
//! audience. The background itself is the canvas the list is executed on.

use image::Rgb;
use log::{debug, warn};

use super::fonts::{FontSet, TextMeasurer};
use super::layout::{
    align_offset, line_height, panel_geometry, wrap_plain, wrap_rich_text, WrappedLine,
    PANEL_PADDING, PANEL_WIDTH,
};
use super::markup;
use super::paint::{DisplayList, PaintCommand};
use super::raster::MAX_CANVAS_SIDE;
use super::runs::RunStyle;
use crate::style::FieldStyle;
use crate::{Alignment, AnnouncementContent, AnnouncementLayout, FieldLayout, StyleConfig};

/// Extra space between title lines.
pub const TITLE_SPACING: u32 = 10;
pub const SUBTITLE_SPACING: u32 = 8;
pub const FOOTER_SPACING: u32 = 5;
pub const AUDIENCE_SPACING: u32 = 5;

/// Horizontal margin used for title and subtitle wrapping.
pub const TEXT_MARGIN: u32 = 60;
/// Total horizontal margin left to the footer.
pub const FOOTER_WRAP_MARGIN: u32 = 48;
/// Body text stops this far above the footer.
pub const FOOTER_CLEARANCE: i32 = 30;
/// Body text stops this far above the canvas bottom.
pub const BOTTOM_MARGIN: i32 = 50;

/// Body panel fill.
pub const PANEL_FILL: (u8, u8, u8, u8) = (255, 255, 255, 230);

/// Coordinates beyond this are clamped; they are off any accepted canvas.
pub const MAX_COORDINATE: u32 = MAX_CANVAS_SIDE;
/// Largest font size honored for any field.
pub const MAX_FONT_SIZE: u32 = 1024;

const SPECIAL_TITLES: [(&str, [&str; 2]); 4] = [
    ("INDISPONIBILIDADE", ["INDISPONIBILIDADE", "DETECTADA"]),
    ("INSTABILIDADE", ["INSTABILIDADE", "DETECTADA"]),
    ("DEGRADAÇÃO", ["DEGRADAÇÃO", "DETECTADA"]),
    ("NORMALIZAÇÃO", ["AMBIENTE", "NORMALIZADO"]),
];

/// Fixed two-line rendering of the incident titles, matched
/// case-insensitively against the whole title.
pub fn special_title_lines(title: &str) -> Option<[&'static str; 2]> {
    let upper = title.trim().to_uppercase();
    SPECIAL_TITLES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, lines)| *lines)
}

/// Font size for a field: the layout's when set, otherwise the style's.
pub fn field_size(layout: &FieldLayout, style: &FieldStyle) -> u32 {
    let size = if layout.font_size > 0 {
        layout.font_size
    } else {
        style.size.max(1)
    };
    size.min(MAX_FONT_SIZE)
}

/// Field layout with its coordinates pulled back onto the largest canvas and
/// its font size capped.
pub fn clamp_field(field: &FieldLayout) -> FieldLayout {
    let clamped = FieldLayout {
        x: field.x.min(MAX_COORDINATE),
        y: field.y.min(MAX_COORDINATE),
        font_size: field.font_size.min(MAX_FONT_SIZE),
        alignment: field.alignment,
    };
    if clamped != *field {
        warn!("Layout {:?} out of range, clamped to {:?}", field, clamped);
    }
    clamped
}

/// [`clamp_field`] applied to every field.
pub fn clamp_layout(layout: &AnnouncementLayout) -> AnnouncementLayout {
    AnnouncementLayout {
        title: clamp_field(&layout.title),
        subtitle: clamp_field(&layout.subtitle),
        body: clamp_field(&layout.body),
        footer: clamp_field(&layout.footer),
        audience: clamp_field(&layout.audience),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Body block laid out ahead of the other fields so the panel can go first.
struct BodyBlock {
    panel: PaintCommand,
    runs: Vec<PaintCommand>,
    truncated: bool,
}

pub struct Compositor<'a> {
    fonts: &'a FontSet,
    width: u32,
    height: u32,
}

impl<'a> Compositor<'a> {
    pub fn new(fonts: &'a FontSet, width: u32, height: u32) -> Self {
        Self {
            fonts,
            width,
            height,
        }
    }

    pub fn compose(
        &self,
        content: &AnnouncementContent,
        layout: &AnnouncementLayout,
        style: &StyleConfig,
    ) -> DisplayList {
        let layout = &clamp_layout(layout);
        let mut list = DisplayList::default();

        let body = non_empty(&content.body).and_then(|body| {
            self.body(body, &layout.body, &layout.footer, &style.body)
        });
        if let Some(block) = &body {
            list.push(block.panel.clone());
        }
        if let Some(title) = non_empty(&content.title) {
            self.title(&mut list, title, &layout.title, &style.title);
        }
        if let Some(subtitle) = non_empty(&content.subtitle) {
            self.subtitle(&mut list, subtitle, &layout.subtitle, &style.subtitle);
        }
        if let Some(block) = body {
            list.commands.extend(block.runs);
            list.truncated = block.truncated;
        }
        if let Some(footer) = non_empty(&content.footer) {
            self.footer(&mut list, footer, &layout.footer, &style.footer);
        }
        if let Some(audience) = non_empty(&content.audience) {
            self.audience(&mut list, audience, &layout.audience, &style.audience);
        }
        debug!(
            "Composed {} paint commands (truncated: {})",
            list.commands.len(),
            list.truncated
        );
        list
    }

    /// Box `[x, canvas width − 2x]` used by every field but the body.
    fn field_box(&self, field: &FieldLayout) -> (i32, i32) {
        let x = field.x as i32;
        (x, self.width as i32 - 2 * x)
    }

    #[allow(clippy::too_many_arguments)]
    fn plain_lines(
        &self,
        list: &mut DisplayList,
        lines: &[String],
        field: &FieldLayout,
        alignment: Alignment,
        run_style: RunStyle,
        size: u32,
        spacing: u32,
        color: Rgb<u8>,
    ) {
        let px = size as f32;
        let measurer = self.fonts.at(px);
        let (origin, box_width) = self.field_box(field);
        let mut y = field.y as i32;
        for line in lines {
            let w = measurer.advance(line, run_style).round() as i32;
            list.push(PaintCommand::Text {
                x: align_offset(origin, box_width, w, alignment),
                y,
                text: line.clone(),
                style: run_style,
                px,
                color,
            });
            y = y.saturating_add((size + spacing) as i32);
        }
    }

    fn title(
        &self,
        list: &mut DisplayList,
        title: &str,
        field: &FieldLayout,
        style: &FieldStyle,
    ) {
        let size = field_size(field, style);
        let lines: Vec<String> = match special_title_lines(title) {
            Some(fixed) => fixed.iter().map(|l| l.to_string()).collect(),
            None => {
                let max = self.width.saturating_sub(2 * TEXT_MARGIN) as f32;
                wrap_plain(
                    &title.trim().to_uppercase(),
                    max,
                    RunStyle::Bold,
                    &self.fonts.at(size as f32),
                )
            }
        };
        self.plain_lines(
            list,
            &lines,
            field,
            field.alignment,
            RunStyle::Bold,
            size,
            TITLE_SPACING,
            style.color,
        );
    }

    fn subtitle(
        &self,
        list: &mut DisplayList,
        subtitle: &str,
        field: &FieldLayout,
        style: &FieldStyle,
    ) {
        let size = field_size(field, style);
        let max = self.width.saturating_sub(2 * TEXT_MARGIN) as f32;
        let lines = wrap_plain(subtitle, max, RunStyle::Bold, &self.fonts.at(size as f32));
        // x == 0 means centered on the canvas
        let alignment = if field.x == 0 {
            Alignment::Center
        } else {
            field.alignment
        };
        self.plain_lines(
            list,
            &lines,
            field,
            alignment,
            RunStyle::Bold,
            size,
            SUBTITLE_SPACING,
            style.color,
        );
    }

    fn body(
        &self,
        body: &str,
        field: &FieldLayout,
        footer: &FieldLayout,
        style: &FieldStyle,
    ) -> Option<BodyBlock> {
        let normalized = markup::normalize(body);
        if normalized.trim().is_empty() {
            return None;
        }
        let size = field_size(field, style);
        let px = size as f32;
        let measurer = self.fonts.at(px);
        let text_width = PANEL_WIDTH - 2 * PANEL_PADDING;
        let lines = wrap_rich_text(&normalized, text_width as f32, &measurer);
        let advance = line_height(size);

        let rect = panel_geometry(field.x, field.y, &lines, advance);
        debug!(
            "Body: {} rows, panel {}x{} at ({}, {})",
            lines.len(),
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
        let panel = PaintCommand::SolidRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rgba: PANEL_FILL,
        };

        let footer_limit = footer.y as i32 - FOOTER_CLEARANCE;
        let bottom_limit = self.height as i32 - BOTTOM_MARGIN;
        let origin = (field.x + PANEL_PADDING) as i32;
        let mut y = (field.y + PANEL_PADDING) as i32;
        let mut runs = Vec::new();
        let mut truncated = false;

        for (i, line) in lines.iter().enumerate() {
            if y > footer_limit || y > bottom_limit {
                let dropped = lines[i..].iter().filter(|l| !l.is_blank()).count();
                if dropped > 0 {
                    warn!("Body text truncated, {} rows did not fit", dropped);
                    truncated = true;
                }
                break;
            }
            if !line.is_blank() {
                self.body_line(
                    &mut runs,
                    line,
                    origin,
                    y,
                    text_width,
                    field.alignment,
                    px,
                    style.color,
                );
            }
            y = y.saturating_add(advance as i32);
        }

        Some(BodyBlock {
            panel,
            runs,
            truncated,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn body_line(
        &self,
        out: &mut Vec<PaintCommand>,
        line: &WrappedLine,
        origin: i32,
        y: i32,
        box_width: u32,
        alignment: Alignment,
        px: f32,
        color: Rgb<u8>,
    ) {
        let measurer = self.fonts.at(px);
        let width = line.width(&measurer).round() as i32;
        let mut x = align_offset(origin, box_width as i32, width, alignment) as f32;
        for run in &line.runs {
            out.push(PaintCommand::Text {
                x: x.round() as i32,
                y,
                text: run.text.clone(),
                style: run.style,
                px,
                color,
            });
            x += measurer.advance(&run.text, run.style);
        }
    }

    fn footer(
        &self,
        list: &mut DisplayList,
        footer: &str,
        field: &FieldLayout,
        style: &FieldStyle,
    ) {
        let normalized = markup::normalize(footer);
        let size = field_size(field, style);
        let px = size as f32;
        let measurer = self.fonts.at(px);
        let max = self.width.saturating_sub(FOOTER_WRAP_MARGIN) as f32;
        let (origin, box_width) = self.field_box(field);
        let mut y = field.y as i32;
        for line in wrap_rich_text(&normalized, max, &measurer)
            .iter()
            .filter(|l| !l.is_blank())
        {
            self.body_line(
                &mut list.commands,
                line,
                origin,
                y,
                box_width.max(0) as u32,
                field.alignment,
                px,
                style.color,
            );
            y = y.saturating_add((size + FOOTER_SPACING) as i32);
        }
    }

    fn audience(
        &self,
        list: &mut DisplayList,
        audience: &str,
        field: &FieldLayout,
        style: &FieldStyle,
    ) {
        let size = field_size(field, style);
        let max = self.width.saturating_sub(2 * field.x) as f32;
        let lines = wrap_plain(audience, max, RunStyle::Plain, &self.fonts.at(size as f32));
        self.plain_lines(
            list,
            &lines,
            field,
            field.alignment,
            RunStyle::Plain,
            size,
            AUDIENCE_SPACING,
            style.color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compose(content: &AnnouncementContent, layout: &AnnouncementLayout) -> DisplayList {
        let fonts = FontSet::builtin();
        Compositor::new(&fonts, 1200, 630).compose(content, layout, &StyleConfig::default())
    }

    fn text_at(list: &DisplayList, wanted: &str) -> (i32, i32, RunStyle) {
        list.commands
            .iter()
            .find_map(|c| match c {
                PaintCommand::Text {
                    x, y, text, style, ..
                } if text == wanted => Some((*x, *y, *style)),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no text {:?}", wanted))
    }

    #[test]
    fn special_titles_match_case_insensitively() {
        assert_eq!(
            special_title_lines("Indisponibilidade"),
            Some(["INDISPONIBILIDADE", "DETECTADA"])
        );
        assert_eq!(
            special_title_lines("normalização"),
            Some(["AMBIENTE", "NORMALIZADO"])
        );
        assert_eq!(special_title_lines(" degradação "), Some(["DEGRADAÇÃO", "DETECTADA"]));
        assert_eq!(special_title_lines("Instabilidade parcial"), None);
    }

    #[test]
    fn special_title_renders_two_fixed_lines() {
        let content = AnnouncementContent {
            title: Some("iNdIsPoNiBiLiDaDe".into()),
            ..Default::default()
        };
        let layout = AnnouncementLayout::defaults_for(&content);
        let list = compose(&content, &layout);
        assert_eq!(list.texts(), vec!["INDISPONIBILIDADE", "DETECTADA"]);
        let (x0, y0, style) = text_at(&list, "INDISPONIBILIDADE");
        let (_, y1, _) = text_at(&list, "DETECTADA");
        assert_eq!((x0, y0, style), (60, 120, RunStyle::Bold));
        assert_eq!(y1 - y0, 60 + TITLE_SPACING as i32);
    }

    #[test]
    fn ordinary_title_is_uppercased() {
        let content = AnnouncementContent {
            title: Some("Manutenção programada".into()),
            ..Default::default()
        };
        let list = compose(&content, &AnnouncementLayout::default());
        assert_eq!(list.texts(), vec!["MANUTENÇÃO PROGRAMADA"]);
    }

    #[test]
    fn subtitle_at_x_zero_is_centered_on_canvas() {
        let content = AnnouncementContent {
            subtitle: Some("Hello".into()),
            ..Default::default()
        };
        let list = compose(&content, &AnnouncementLayout::default());
        // 9x18 bold cells at 32 px
        let (x, y, _) = text_at(&list, "Hello");
        assert_eq!((x, y), ((1200 - 45) / 2, 430));
    }

    #[test]
    fn panel_comes_first_and_text_has_no_markers() {
        let content = AnnouncementContent {
            title: Some("Aviso".into()),
            body: Some("<p>Hello <b>world</b> this is <i>italic</i></p>".into()),
            ..Default::default()
        };
        let mut layout = AnnouncementLayout::default();
        layout.body.y = 100;
        layout.body.alignment = Alignment::Left;
        let list = compose(&content, &layout);

        match &list.commands[0] {
            PaintCommand::SolidRect {
                x, y, width, rgba, ..
            } => {
                assert_eq!((*x, *y, *width), (40, 80, 900));
                assert_eq!(*rgba, PANEL_FILL);
            }
            other => panic!("expected panel first, got {:?}", other),
        }
        assert!(list.texts().iter().all(|t| !t.contains("**") && !t.contains('_')));
        let (x, y, style) = text_at(&list, "world");
        assert_eq!(style, RunStyle::Bold);
        assert_eq!(y, 120);
        // "Hello " at 10 px per cell
        assert_eq!(x, 80 + 60);
        assert_eq!(text_at(&list, "italic").2, RunStyle::Italic);
        assert!(!list.truncated);
    }

    #[test]
    fn body_stops_above_the_canvas_bottom() {
        let body = (1..=20)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("<br>");
        let content = AnnouncementContent {
            body: Some(body),
            ..Default::default()
        };
        let list = compose(&content, &AnnouncementLayout::default());
        // rows start at 530 and advance 38; 606 is past 630 - 50
        assert_eq!(list.texts(), vec!["line 1", "line 2"]);
        assert!(list.truncated);
    }

    #[test]
    fn trailing_blank_rows_do_not_count_as_truncation() {
        let content = AnnouncementContent {
            body: Some("a<br>b<br><br><br><br>".into()),
            ..Default::default()
        };
        let list = compose(&content, &AnnouncementLayout::default());
        assert_eq!(list.texts(), vec!["a", "b"]);
        assert!(!list.truncated);
    }

    #[test]
    fn footer_and_audience_use_their_spacing() {
        let content = AnnouncementContent {
            footer: Some("<p>Equipe <b>NOC</b></p>".into()),
            audience: Some("Todos".into()),
            ..Default::default()
        };
        let mut layout = AnnouncementLayout::default();
        layout.footer.y = 500;
        layout.audience.y = 560;
        let list = compose(&content, &layout);
        assert_eq!(list.texts(), vec!["Equipe ", "NOC", "Todos"]);
        let (_, y, style) = text_at(&list, "NOC");
        assert_eq!((y, style), (500, RunStyle::Bold));
        assert_eq!(text_at(&list, "Todos"), (60, 560, RunStyle::Plain));
    }

    #[test]
    fn empty_fields_draw_nothing() {
        let content = AnnouncementContent {
            title: Some("   ".into()),
            body: Some("<p></p>".into()),
            ..Default::default()
        };
        let list = compose(&content, &AnnouncementLayout::default());
        assert!(list.commands.is_empty());
    }

    #[test]
    fn body_stops_above_the_footer() {
        let body = (1..=10)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("<br>");
        let content = AnnouncementContent {
            body: Some(body),
            ..Default::default()
        };
        let mut layout = AnnouncementLayout::default();
        layout.footer.y = 600;
        let fonts = FontSet::builtin();
        let list = Compositor::new(&fonts, 1000, 1300).compose(
            &content,
            &layout,
            &StyleConfig::default(),
        );
        // 606 is past 600 - 30 while the canvas bottom is far below
        assert_eq!(list.texts(), vec!["line 1", "line 2"]);
        assert_eq!(text_at(&list, "line 2").1, 568);
        assert!(list.truncated);
    }

    #[test]
    fn out_of_range_layout_is_clamped() {
        let content = AnnouncementContent {
            title: Some("Aviso".into()),
            subtitle: Some("Sub".into()),
            body: Some("<p>corpo</p>".into()),
            footer: Some("rodape".into()),
            audience: Some("todos".into()),
        };
        let mut layouts = Vec::new();
        let mut layout = AnnouncementLayout::default();
        layout.title.x = 1_500_000_000;
        layouts.push(layout);
        let mut layout = AnnouncementLayout::default();
        layout.audience.x = 3_000_000_000;
        layouts.push(layout);
        let mut layout = AnnouncementLayout::default();
        layout.body.y = u32::MAX;
        layouts.push(layout);
        let mut layout = AnnouncementLayout::default();
        layout.body.font_size = 3_000_000_000;
        layout.body.y = 100;
        layouts.push(layout);
        let mut layout = AnnouncementLayout::default();
        layout.footer = FieldLayout::new(u32::MAX, u32::MAX, u32::MAX, Alignment::Right);
        layouts.push(layout);

        for layout in &layouts {
            let list = compose(&content, layout);
            assert!(matches!(list.commands[0], PaintCommand::SolidRect { .. }));
        }

        let big = compose(&content, &layouts[3]);
        let px = big.commands.iter().find_map(|c| match c {
            PaintCommand::Text { text, px, .. } if text == "corpo" => Some(*px),
            _ => None,
        });
        assert_eq!(px, Some(MAX_FONT_SIZE as f32));
    }

    #[test]
    fn clamp_field_caps_each_value() {
        let field = FieldLayout::new(u32::MAX, 70_000, 5_000, Alignment::Center);
        assert_eq!(
            clamp_field(&field),
            FieldLayout::new(MAX_COORDINATE, MAX_COORDINATE, MAX_FONT_SIZE, Alignment::Center)
        );
        let sane = FieldLayout::new(60, 510, 24, Alignment::Left);
        assert_eq!(clamp_field(&sane), sane);
    }

    #[test]
    fn layout_size_overrides_style_size() {
        let style = FieldStyle::new(Rgb([0, 0, 0]), 18);
        assert_eq!(field_size(&FieldLayout::new(0, 0, 0, Alignment::Left), &style), 18);
        assert_eq!(field_size(&FieldLayout::new(0, 0, 30, Alignment::Left), &style), 30);
        let huge = FieldStyle::new(Rgb([0, 0, 0]), u32::MAX);
        assert_eq!(
            field_size(&FieldLayout::new(0, 0, 0, Alignment::Left), &huge),
            MAX_FONT_SIZE
        );
    }
}
