/// Paint commands produced by the compositor and executed by the rasterizer

use image::Rgb;

use super::runs::RunStyle;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Rectangle blended over whatever is below it with `rgba.3` as alpha
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    /// One run of text; `(x, y)` is the top-left of the line box
    Text {
        x: i32,
        y: i32,
        text: String,
        style: RunStyle,
        px: f32,
        color: Rgb<u8>,
    },
}

/// Ordered paint commands for one canvas, bottom layer first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<PaintCommand>,
    /// Body rows were dropped for lack of vertical space
    pub truncated: bool,
}

impl DisplayList {
    pub fn push(&mut self, cmd: PaintCommand) {
        self.commands.push(cmd);
    }

    /// Text of every `Text` command, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
