/// Line wrapping, alignment and panel sizing.
///
/// Everything here works on widths reported by a [`TextMeasurer`], so the
/// same code drives real fonts, the bitmap fallback and fixed-width tests.

use super::fonts::TextMeasurer;
use super::runs::{coalesce, tokenize, FormattingRun, RunStyle};
use crate::Alignment;

/// Padding around body text inside the panel.
pub const PANEL_PADDING: u32 = 20;
/// Width of the body panel (text box is this minus twice the padding).
pub const PANEL_WIDTH: u32 = 880;
/// Smallest panel height.
pub const PANEL_MIN_HEIGHT: u32 = 200;
/// Body line height relative to the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One visual row of styled text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedLine {
    pub runs: Vec<FormattingRun>,
}

impl WrappedLine {
    pub fn new(runs: Vec<FormattingRun>) -> Self {
        Self { runs }
    }

    /// A row produced by an explicit break with nothing on it.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Text without styling.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn width(&self, measurer: &dyn TextMeasurer) -> f32 {
        measurer.runs_width(&self.runs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Word(&'a str, RunStyle),
    Space(RunStyle),
}

/// Break runs into words and single inter-word spaces. A stretch of spaces,
/// even across run boundaries, yields one space token carrying the style of
/// the run where it starts.
fn words<'a>(runs: &'a [FormattingRun]) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    for run in runs {
        for (i, piece) in run.text.split(' ').enumerate() {
            if i > 0 && !matches!(tokens.last(), Some(Token::Space(_)) | None) {
                tokens.push(Token::Space(run.style));
            }
            if !piece.is_empty() {
                tokens.push(Token::Word(piece, run.style));
            }
        }
    }
    if matches!(tokens.last(), Some(Token::Space(_))) {
        tokens.pop();
    }
    tokens
}

fn to_runs(tokens: &[Token<'_>]) -> Vec<FormattingRun> {
    coalesce(tokens.iter().map(|t| match t {
        Token::Word(w, style) => FormattingRun::new(*w, *style),
        Token::Space(style) => FormattingRun::new(" ", *style),
    }))
}

/// Greedily pack the runs of one logical line into rows no wider than
/// `max_width`.
///
/// A word that is wider than `max_width` on its own gets a row of its own and
/// overflows; nothing is dropped. Styles carry over wrap points, so a bold
/// phrase split across rows stays bold on both.
pub fn wrap_runs(
    runs: &[FormattingRun],
    max_width: f32,
    measurer: &dyn TextMeasurer,
) -> Vec<WrappedLine> {
    let mut lines = Vec::new();
    let mut current: Vec<Token<'_>> = Vec::new();
    let mut pending_space: Option<RunStyle> = None;

    for token in words(runs) {
        match token {
            Token::Space(style) => pending_space = Some(style),
            Token::Word(..) => {
                if current.is_empty() {
                    current.push(token);
                } else {
                    let mut candidate = current.clone();
                    if let Some(style) = pending_space {
                        candidate.push(Token::Space(style));
                    }
                    candidate.push(token);
                    if measurer.runs_width(&to_runs(&candidate)) <= max_width {
                        current = candidate;
                    } else {
                        lines.push(WrappedLine::new(to_runs(&current)));
                        current = vec![token];
                    }
                }
                pending_space = None;
            }
        }
    }
    if !current.is_empty() {
        lines.push(WrappedLine::new(to_runs(&current)));
    }
    if lines.is_empty() {
        lines.push(WrappedLine::default());
    }
    lines
}

/// Wrap normalized markup: explicit `\n` breaks first, then width-based
/// wrapping of each logical line. Every explicit break is kept, so an empty
/// logical line becomes one blank row.
pub fn wrap_rich_text(
    normalized: &str,
    max_width: f32,
    measurer: &dyn TextMeasurer,
) -> Vec<WrappedLine> {
    let mut out = Vec::new();
    for logical in normalized.split('\n') {
        let logical = logical.trim_end_matches([' ', '\t', '\r']);
        if logical.trim().is_empty() {
            out.push(WrappedLine::default());
            continue;
        }
        out.extend(wrap_runs(&tokenize(logical), max_width, measurer));
    }
    out
}

/// Wrap plain text on whitespace, joining words with single spaces.
pub fn wrap_plain(
    text: &str,
    max_width: f32,
    style: RunStyle,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measurer.advance(&candidate, style) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// X coordinate at which a row of `line_width` starts inside the box
/// `[origin, origin + box_width)`.
///
/// Justify resolves like left. Rows wider than the box get a negative
/// centering term rather than being clamped.
pub fn align_offset(origin: i32, box_width: i32, line_width: i32, alignment: Alignment) -> i32 {
    match alignment {
        Alignment::Left | Alignment::Justify => origin,
        Alignment::Center => origin + (box_width - line_width).div_euclid(2),
        Alignment::Right => origin + box_width - line_width,
    }
}

/// Body line height for a font size.
pub fn line_height(font_size: u32) -> u32 {
    (font_size as f32 * LINE_HEIGHT_RATIO).round() as u32
}

/// Panel height for `line_count` non-blank rows:
/// `2·padding + rows·line_height + padding`, at least [`PANEL_MIN_HEIGHT`].
pub fn panel_height(line_count: usize, line_height: u32) -> u32 {
    let rows = u32::try_from(line_count).unwrap_or(u32::MAX);
    rows.saturating_mul(line_height)
        .saturating_add(PANEL_PADDING * 3)
        .max(PANEL_MIN_HEIGHT)
}

/// Panel rectangle for body text anchored at `(x, y)`.
pub fn panel_geometry(x: u32, y: u32, lines: &[WrappedLine], line_height: u32) -> Rect {
    let filled = lines.iter().filter(|l| !l.is_blank()).count();
    Rect {
        x: x as i32 - PANEL_PADDING as i32,
        y: y as i32 - PANEL_PADDING as i32,
        width: PANEL_WIDTH + PANEL_PADDING,
        height: panel_height(filled, line_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::fonts::FixedAdvance;
    use pretty_assertions::assert_eq;

    fn ten() -> FixedAdvance {
        FixedAdvance::uniform(10.0)
    }

    #[test]
    fn wraps_mixed_styles_at_word_boundaries() {
        let runs = tokenize("Hello **world** this is _italic_");
        let lines = wrap_runs(&runs, 150.0, &ten());
        assert_eq!(
            lines,
            vec![
                WrappedLine::new(vec![
                    FormattingRun::plain("Hello "),
                    FormattingRun::bold("world"),
                ]),
                WrappedLine::new(vec![
                    FormattingRun::plain("this is "),
                    FormattingRun::italic("italic"),
                ]),
            ]
        );
    }

    #[test]
    fn bold_phrase_reopens_after_wrap() {
        let runs = tokenize("see **very important notice** now");
        let lines = wrap_runs(&runs, 100.0, &ten());
        assert_eq!(lines[0].runs, vec![FormattingRun::plain("see "), FormattingRun::bold("very")]);
        assert_eq!(lines[1].runs, vec![FormattingRun::bold("important")]);
        assert_eq!(
            lines[2].runs,
            vec![FormattingRun::bold("notice"), FormattingRun::plain(" now")]
        );
    }

    #[test]
    fn long_word_gets_its_own_row() {
        let runs = tokenize("a supercalifragilistic b");
        let lines = wrap_runs(&runs, 50.0, &ten());
        let texts: Vec<String> = lines.iter().map(|l| l.text()).collect();
        assert_eq!(texts, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn repeated_spaces_collapse_to_one() {
        let runs = tokenize("a   **b**  c");
        let lines = wrap_runs(&runs, 1000.0, &ten());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "a b c");
    }

    #[test]
    fn style_widths_decide_the_break() {
        let m = FixedAdvance {
            plain: 10.0,
            bold: 20.0,
            italic: 10.0,
        };
        // "ab cd" plain = 50, with bold "cd" = 70
        let plain = wrap_runs(&tokenize("ab cd"), 60.0, &m);
        assert_eq!(plain.len(), 1);
        let bold = wrap_runs(&tokenize("ab **cd**"), 60.0, &m);
        assert_eq!(bold.len(), 2);
    }

    #[test]
    fn explicit_breaks_become_blank_rows() {
        let lines = wrap_rich_text("first\n\n\nsecond", 500.0, &ten());
        let blanks: Vec<bool> = lines.iter().map(|l| l.is_blank()).collect();
        assert_eq!(blanks, vec![false, true, true, false]);
    }

    #[test]
    fn plain_wrap_joins_with_single_spaces() {
        let lines = wrap_plain("one  two\tthree four", 90.0, RunStyle::Plain, &ten());
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert!(wrap_plain("   ", 90.0, RunStyle::Plain, &ten()).is_empty());
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(align_offset(20, 100, 40, Alignment::Left), 20);
        assert_eq!(align_offset(20, 100, 40, Alignment::Justify), 20);
        assert_eq!(align_offset(20, 100, 41, Alignment::Center), 49);
        assert_eq!(align_offset(0, 100, 100, Alignment::Center), 0);
        assert_eq!(align_offset(20, 100, 40, Alignment::Right), 80);
        assert_eq!(align_offset(0, 100, 103, Alignment::Center), -2);
    }

    #[test]
    fn panel_height_is_floored_and_monotone() {
        assert_eq!(panel_height(0, 38), PANEL_MIN_HEIGHT);
        assert_eq!(panel_height(5, 38), 60 + 190);
        let mut last = 0;
        for n in 0..40 {
            let h = panel_height(n, 38);
            assert!(h >= last);
            assert!(h >= PANEL_MIN_HEIGHT);
            last = h;
        }
    }

    #[test]
    fn panel_height_saturates() {
        assert_eq!(panel_height(usize::MAX, 38), u32::MAX);
        assert_eq!(panel_height(3, u32::MAX), u32::MAX);
    }

    #[test]
    fn panel_counts_only_filled_rows() {
        let lines = wrap_rich_text("a\n\nb\nc", 500.0, &ten());
        let rect = panel_geometry(60, 510, &lines, 100);
        assert_eq!(rect.x, 40);
        assert_eq!(rect.y, 490);
        assert_eq!(rect.width, 900);
        assert_eq!(rect.height, 60 + 300);
    }

    #[test]
    fn line_height_rounds() {
        assert_eq!(line_height(24), 38);
        assert_eq!(line_height(18), 29);
    }
}
