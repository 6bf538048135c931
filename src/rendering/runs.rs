//! Formatting runs: splitting one normalized line into plain, bold and italic
//! spans.

use super::markup::{BOLD_MARKER, ITALIC_MARKER};

/// Inline style of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStyle {
    Plain,
    Bold,
    Italic,
}

/// A contiguous piece of text sharing one style. Never contains markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingRun {
    pub text: String,
    pub style: RunStyle,
}

impl FormattingRun {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::Plain)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::Bold)
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::Italic)
    }
}

/// Split one line (no `\n`) into runs.
///
/// `**…**` and `_…_` spans must close on the same line; an unterminated
/// marker stays in the text as a literal. Markers nested inside a span are
/// dropped and the span keeps its outer style.
pub fn tokenize(line: &str) -> Vec<FormattingRun> {
    let mut runs: Vec<FormattingRun> = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        if let Some((inner, after)) = closed_span(rest, BOLD_MARKER) {
            flush(&mut runs, &mut plain, RunStyle::Plain);
            push_run(&mut runs, strip_markers(inner), RunStyle::Bold);
            rest = after;
        } else if let Some((inner, after)) = closed_span(rest, ITALIC_MARKER) {
            flush(&mut runs, &mut plain, RunStyle::Plain);
            push_run(&mut runs, strip_markers(inner), RunStyle::Italic);
            rest = after;
        } else {
            plain.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    flush(&mut runs, &mut plain, RunStyle::Plain);
    runs
}

/// If `text` opens with `marker` and the marker closes later on, return the
/// enclosed text and what follows the closing marker.
fn closed_span<'a>(text: &'a str, marker: &str) -> Option<(&'a str, &'a str)> {
    let body = text.strip_prefix(marker)?;
    let end = body.find(marker)?;
    Some((&body[..end], &body[end + marker.len()..]))
}

fn strip_markers(inner: &str) -> String {
    if !inner.contains(BOLD_MARKER) && !inner.contains(ITALIC_MARKER) {
        return inner.to_string();
    }
    // only balanced markers are markup; tokenizing again tells them apart
    // from literal ones
    tokenize(inner).into_iter().map(|r| r.text).collect()
}

fn flush(runs: &mut Vec<FormattingRun>, buf: &mut String, style: RunStyle) {
    if !buf.is_empty() {
        push_run(runs, std::mem::take(buf), style);
    }
}

fn push_run(runs: &mut Vec<FormattingRun>, text: String, style: RunStyle) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == style => last.text.push_str(&text),
        _ => runs.push(FormattingRun { text, style }),
    }
}

/// Merge adjacent runs of the same style and drop empty ones.
pub fn coalesce(runs: impl IntoIterator<Item = FormattingRun>) -> Vec<FormattingRun> {
    let mut out = Vec::new();
    for run in runs {
        push_run(&mut out, run.text, run.style);
    }
    out
}
