/// Rasterizer: executes a display list on an RGB canvas and encodes it.

use std::io::Cursor;

use ab_glyph::PxScale;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use log::debug;

use super::fonts::{builtin_font, latin1_text, FontFace, FontSet};
use super::paint::{DisplayList, PaintCommand};
use super::runs::RunStyle;
use crate::error::{Error, Result};
use crate::OutputFormat;

/// JPEG quality used for every JPEG render.
pub const JPEG_QUALITY: u8 = 95;

/// Largest canvas side accepted.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Reject canvases that cannot be allocated or encoded.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::RenderError(format!(
            "canvas has zero area ({}x{})",
            width, height
        )));
    }
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(Error::RenderError(format!(
            "canvas {}x{} exceeds the {} px limit",
            width, height, MAX_CANVAS_SIDE
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| Error::RenderError(format!("canvas {}x{} overflows", width, height)))?;
    Ok(())
}

/// Run every command of `list` on `canvas`, in order.
pub fn execute(canvas: &mut RgbImage, list: &DisplayList, fonts: &FontSet) {
    debug!(
        "Painting {} commands on {}x{} canvas",
        list.commands.len(),
        canvas.width(),
        canvas.height()
    );
    for cmd in &list.commands {
        match cmd {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => blend_rect(canvas, *x, *y, *width, *height, *rgba),
            PaintCommand::Text {
                x,
                y,
                text,
                style,
                px,
                color,
            } => draw_run(canvas, fonts, *x, *y, text, *style, *px, *color),
        }
    }
}

/// Alpha-blend a solid rectangle over the canvas, clipped to its bounds.
pub fn blend_rect(
    canvas: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    rgba: (u8, u8, u8, u8),
) {
    let x0 = x.max(0) as i64;
    let y0 = y.max(0) as i64;
    let x1 = (x as i64 + width as i64).min(canvas.width() as i64);
    let y1 = (y as i64 + height as i64).min(canvas.height() as i64);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let (r, g, b, a) = rgba;
    let alpha = a as u32;
    let src = [r, g, b];
    for py in y0..y1 {
        for px in x0..x1 {
            let dst = canvas.get_pixel_mut(px as u32, py as u32);
            for (c, s) in dst.0.iter_mut().zip(src) {
                *c = ((s as u32 * alpha + *c as u32 * (255 - alpha) + 127) / 255) as u8;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_run(
    canvas: &mut RgbImage,
    fonts: &FontSet,
    x: i32,
    y: i32,
    text: &str,
    style: RunStyle,
    px: f32,
    color: Rgb<u8>,
) {
    if text.trim().is_empty() {
        return;
    }
    match fonts.face(style) {
        FontFace::Outline(font) => {
            draw_text_mut(canvas, color, x, y, PxScale::from(px), font, text);
        }
        FontFace::Builtin => {
            let [r, g, b] = color.0;
            let text_style = MonoTextStyle::new(builtin_font(px, style), Rgb888::new(r, g, b));
            let text = latin1_text(text);
            let mut target = ImageTarget(canvas);
            let _ = Text::with_baseline(&*text, Point::new(x, y), text_style, Baseline::Top)
                .draw(&mut target);
        }
    }
}

/// Lets the bitmap fonts draw straight into an [`RgbImage`].
struct ImageTarget<'a>(&'a mut RgbImage);

impl OriginDimensions for ImageTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for ImageTarget<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.0.width() as i32;
        let h = self.0.height() as i32;
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= w || point.y >= h {
                continue;
            }
            self.0.put_pixel(
                point.x as u32,
                point.y as u32,
                Rgb([color.r(), color.g(), color.b()]),
            );
        }
        Ok(())
    }
}

/// Encode the finished canvas.
pub fn encode(canvas: &RgbImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    match format {
        OutputFormat::Png => canvas.write_with_encoder(PngEncoder::new(&mut cursor))?,
        OutputFormat::Jpeg => {
            canvas.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY))?
        }
    }
    debug!("Encoded {:?} image, {} bytes", format, buffer.len());
    Ok(buffer)
}
