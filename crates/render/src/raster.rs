//! Replays a display list onto an RGB canvas.
//! 將繪圖指令繪製到 RGB 畫布。

use std::convert::Infallible;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::{
    DrawTarget, Drawable, OriginDimensions, Pixel, Point as EgPoint, RgbColor, Size as EgSize,
};
use embedded_graphics::text::{Baseline, Text};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::display::{Color, DisplayCommand, PageDisplayList, Point, TextRun};
use crate::fonts::{FontHandle, BUILTIN_FACE};
use crate::layout::ComposedPage;

/// Preview images are this many times smaller than the page.
pub const DEFAULT_PREVIEW_FACTOR: u32 = 3;

/// Rasterizes a composed page at its native pixel size.
pub fn rasterize(page: &ComposedPage) -> RgbImage {
    rasterize_display_list(&page.display_list, page.page.width_px, page.page.height_px)
}

/// Paints `list` onto a white `width`×`height` canvas.
pub fn rasterize_display_list(list: &PageDisplayList, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, rgb(Color::WHITE));

    for command in &list.commands {
        match command {
            DisplayCommand::FillRect(rect) => {
                fill_rect(
                    &mut canvas,
                    rect.origin.x.round() as i32,
                    rect.origin.y.round() as i32,
                    rect.size.width.ceil() as i32,
                    rect.size.height.ceil() as i32,
                    rect.color,
                );
            }
            DisplayCommand::HorizontalRule { start, end, stroke } => {
                let x0 = start.x.min(end.x).round() as i32;
                let x1 = start.x.max(end.x).round() as i32;
                let thickness = stroke.width.round().max(1.0) as i32;
                fill_rect(
                    &mut canvas,
                    x0,
                    start.y.round() as i32,
                    x1 - x0,
                    thickness,
                    stroke.color,
                );
            }
            DisplayCommand::Text(run) => draw_text(&mut canvas, run),
        }
    }

    canvas
}

/// Downscaled copy for on-screen preview; `factor` below 1 is treated as 1.
pub fn preview(image: &RgbImage, factor: u32) -> RgbImage {
    let factor = factor.max(1);
    let width = (image.width() / factor).max(1);
    let height = (image.height() / factor).max(1);
    imageops::resize(image, width, height, FilterType::Triangle)
}

fn draw_text(canvas: &mut RgbImage, run: &TextRun) {
    match &run.font {
        FontHandle::Outline { font, size, .. } => {
            draw_outline_text(canvas, font, *size, run.position, &run.text, run.color)
        }
        FontHandle::Builtin { scale, .. } => {
            draw_builtin_text(canvas, *scale, run.position, &run.text, run.color)
        }
    }
}

fn draw_outline_text(
    canvas: &mut RgbImage,
    font: &FontArc,
    size: f32,
    position: Point,
    text: &str,
    color: Color,
) {
    let scaled = font.as_scaled(PxScale::from(size));
    let baseline = position.y + scaled.ascent();
    let mut caret = position.x;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                blend_pixel(canvas, x, y, color, coverage);
            });
        }
    }
}

fn draw_builtin_text(canvas: &mut RgbImage, scale: u32, position: Point, text: &str, color: Color) {
    let style = MonoTextStyle::new(&BUILTIN_FACE, Rgb888::new(color.r, color.g, color.b));
    let mut target = ScaledCanvas {
        image: canvas,
        origin_x: position.x.round() as i32,
        origin_y: position.y.round() as i32,
        scale: scale.max(1) as i32,
    };
    let text = Text::with_baseline(text, EgPoint::zero(), style, Baseline::Top);
    if let Err(never) = text.draw(&mut target) {
        match never {}
    }
}

/// Draw target that blows every pixel up into a `scale`×`scale` block.
struct ScaledCanvas<'a> {
    image: &'a mut RgbImage,
    origin_x: i32,
    origin_y: i32,
    scale: i32,
}

impl OriginDimensions for ScaledCanvas<'_> {
    fn size(&self) -> EgSize {
        EgSize::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for ScaledCanvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(at, rgb) in pixels {
            let color = Color::new(rgb.r(), rgb.g(), rgb.b());
            fill_rect(
                &mut *self.image,
                self.origin_x + at.x * self.scale,
                self.origin_y + at.y * self.scale,
                self.scale,
                self.scale,
                color,
            );
        }
        Ok(())
    }
}

fn fill_rect(buffer: &mut RgbImage, x: i32, y: i32, width: i32, height: i32, color: Color) {
    if width <= 0 || height <= 0 {
        return;
    }
    let width_px = buffer.width() as i32;
    let height_px = buffer.height() as i32;
    let x0 = x.clamp(0, width_px);
    let y0 = y.clamp(0, height_px);
    let x1 = x.saturating_add(width).clamp(0, width_px);
    let y1 = y.saturating_add(height).clamp(0, height_px);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let fill = rgb(color);
    for yy in y0..y1 {
        for xx in x0..x1 {
            buffer.put_pixel(xx as u32, yy as u32, fill);
        }
    }
}

fn rgb(color: Color) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

fn blend_pixel(buffer: &mut RgbImage, x: i32, y: i32, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= buffer.width() as i32 || y >= buffer.height() as i32 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let pixel = buffer.get_pixel_mut(x as u32, y as u32);
    let source = [color.r, color.g, color.b];
    for (channel, src) in pixel.0.iter_mut().zip(source) {
        let mixed = *channel as f32 * (1.0 - alpha) + src as f32 * alpha;
        *channel = mixed.round() as u8;
    }
}
