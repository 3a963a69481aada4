// SPDX-License-Identifier: GPL-3.0-only

//! Rasterizer for composed frames
//!
//! Styling only touches the frame around the photos; photo pixels are scaled
//! to cover their cell and center-cropped, never recolored.

use super::glyphs::{self, GLYPH_HEIGHT};
use super::layout::Rect;
use super::style::Rgb;
use super::{FrameTree, Slot};
use crate::constants::frame;
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Render a frame at `scale` times its logical size
pub fn render(tree: &FrameTree, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let geometry = &tree.geometry;
    let colors = tree.colors;

    let mut canvas = RgbaImage::from_pixel(
        geometry.width * scale,
        geometry.height * scale,
        colors.background.to_rgba(),
    );

    let outer = Rect {
        x: 0,
        y: 0,
        width: geometry.width,
        height: geometry.height,
    };
    stroke_rect(&mut canvas, outer.scaled(scale), geometry.border * scale, colors.border);

    let outline = Rgb::BLACK.over(colors.background, frame::CELL_OUTLINE_ALPHA);
    let shade = Rgb::BLACK.over(colors.background, frame::PLACEHOLDER_SHADE);

    for (slot, cell) in tree.slots.iter().zip(&geometry.cells) {
        let cell = cell.scaled(scale);
        match slot {
            Slot::Photo(photo) => draw_cover(&mut canvas, photo.pixels(), cell),
            Slot::Placeholder { number } => {
                fill_rect(&mut canvas, cell, shade);
                let text_color = colors.text.over(shade, frame::PLACEHOLDER_TEXT_ALPHA);
                let px = (cell.height * 2 / 5 / GLYPH_HEIGHT).max(1);
                draw_text_centered(&mut canvas, &number.to_string(), cell, px, text_color);
            }
        }
        stroke_rect(&mut canvas, cell, scale, outline);
    }

    if let Some(caption) = &tree.caption {
        let footer = geometry.footer.scaled(scale);
        let text_color = colors.text.over(colors.background, frame::CAPTION_TEXT_ALPHA);
        draw_caption(&mut canvas, caption, footer, scale, text_color);
    }

    canvas
}

/// Scale `photo` to cover `cell` and center-crop the overflow
fn draw_cover(canvas: &mut RgbaImage, photo: &RgbaImage, cell: Rect) {
    let (src_w, src_h) = photo.dimensions();
    if src_w == 0 || src_h == 0 || cell.width == 0 || cell.height == 0 {
        return;
    }

    let factor = f64::max(
        cell.width as f64 / src_w as f64,
        cell.height as f64 / src_h as f64,
    );
    let resized_w = ((src_w as f64 * factor).ceil() as u32).max(cell.width);
    let resized_h = ((src_h as f64 * factor).ceil() as u32).max(cell.height);
    let resized = imageops::resize(photo, resized_w, resized_h, FilterType::Triangle);

    let crop_x = (resized_w - cell.width) / 2;
    let crop_y = (resized_h - cell.height) / 2;
    let cropped = imageops::crop_imm(&resized, crop_x, crop_y, cell.width, cell.height).to_image();
    imageops::replace(canvas, &cropped, cell.x as i64, cell.y as i64);
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgb) {
    let pixel = color.to_rgba();
    let x_end = (rect.x + rect.width).min(canvas.width());
    let y_end = (rect.y + rect.height).min(canvas.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            canvas.put_pixel(x, y, pixel);
        }
    }
}

fn stroke_rect(canvas: &mut RgbaImage, rect: Rect, thickness: u32, color: Rgb) {
    let t = thickness.min(rect.width / 2).min(rect.height / 2);
    if t == 0 {
        return;
    }
    let top = Rect { height: t, ..rect };
    let bottom = Rect {
        y: rect.y + rect.height - t,
        height: t,
        ..rect
    };
    let left = Rect { width: t, ..rect };
    let right = Rect {
        x: rect.x + rect.width - t,
        width: t,
        ..rect
    };
    for edge in [top, bottom, left, right] {
        fill_rect(canvas, edge, color);
    }
}

fn draw_text(canvas: &mut RgbaImage, text: &str, x: u32, y: u32, px: u32, color: Rgb) {
    glyphs::for_each_pixel(text, |gx, gy| {
        let dot = Rect {
            x: x + gx * px,
            y: y + gy * px,
            width: px,
            height: px,
        };
        fill_rect(canvas, dot, color);
    });
}

fn draw_text_centered(canvas: &mut RgbaImage, text: &str, area: Rect, px: u32, color: Rgb) {
    let width = glyphs::text_width(text) * px;
    let height = GLYPH_HEIGHT * px;
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    draw_text(canvas, text, x, y, px, color);
}

/// Draw the caption as large as fits the footer, truncating if needed
fn draw_caption(canvas: &mut RgbaImage, caption: &str, footer: Rect, scale: u32, color: Rgb) {
    let max_px = (footer.height / GLYPH_HEIGHT).clamp(1, 2 * scale);
    let px = (1..=max_px)
        .rev()
        .find(|px| glyphs::text_width(caption) * px <= footer.width)
        .unwrap_or(1);

    let mut text: String = caption.to_string();
    while glyphs::text_width(&text) * px > footer.width && !text.is_empty() {
        text.pop();
    }
    draw_text_centered(canvas, &text, footer, px, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::frame::{FrameStyle, Layout, compose};
    use crate::pipelines::photo::CapturedImage;

    fn solid_photo(rgb: [u8; 3], w: u32, h: u32) -> CapturedImage {
        CapturedImage::from_pixels(RgbaImage::from_pixel(
            w,
            h,
            image::Rgba([rgb[0], rgb[1], rgb[2], 255]),
        ))
        .unwrap()
    }

    #[test]
    fn test_render_dimensions_follow_scale() {
        let tree = compose(&[], &FrameStyle::default(), Layout::Grid2x2);
        let one = render(&tree, 1);
        let two = render(&tree, 2);
        assert_eq!(one.dimensions(), (tree.geometry.width, tree.geometry.height));
        assert_eq!(two.width(), one.width() * 2);
        assert_eq!(two.height(), one.height() * 2);
    }

    #[test]
    fn test_render_zero_scale_is_treated_as_one() {
        let tree = compose(&[], &FrameStyle::default(), Layout::Strip1x4);
        assert_eq!(render(&tree, 0).dimensions(), render(&tree, 1).dimensions());
    }

    #[test]
    fn test_border_and_background_colors() {
        let tree = compose(&[], &FrameStyle::default(), Layout::Grid2x2);
        let colors = tree.colors;
        let image = render(&tree, 1);
        assert_eq!(image.get_pixel(0, 0).0, colors.border.to_rgba().0);
        // Inside the padding, between border and first cell
        let inset = frame::BORDER + 1;
        assert_eq!(image.get_pixel(inset, inset).0, colors.background.to_rgba().0);
    }

    #[test]
    fn test_photo_pixels_are_not_restyled() {
        let photo = solid_photo([10, 200, 30], 64, 48);
        let style = FrameStyle::custom(Rgb::BLACK);
        let tree = compose(&[photo], &style, Layout::Grid2x2);
        let image = render(&tree, 1);
        let cell = tree.geometry.cells[0];
        let center = image.get_pixel(cell.x + cell.width / 2, cell.y + cell.height / 2);
        assert_eq!(center.0, [10, 200, 30, 255]);
    }

    #[test]
    fn test_placeholder_has_number_pixels() {
        let tree = compose(&[], &FrameStyle::default(), Layout::Grid2x2);
        let image = render(&tree, 1);
        let cell = tree.geometry.cells[0];
        let shade = Rgb::BLACK.over(tree.colors.background, frame::PLACEHOLDER_SHADE);
        let inner_pixels = (cell.y + 2..cell.y + cell.height - 2)
            .flat_map(|y| (cell.x + 2..cell.x + cell.width - 2).map(move |x| (x, y)));
        let inked = inner_pixels
            .filter(|&(x, y)| image.get_pixel(x, y).0 != shade.to_rgba().0)
            .count();
        assert!(inked > 0, "placeholder number was not drawn");
    }

    #[test]
    fn test_long_caption_does_not_overflow() {
        let tree = compose(&[], &FrameStyle::default(), Layout::Strip1x4)
            .with_caption("A caption that is far too long to fit the narrow strip footer");
        // Must not panic on out-of-bounds drawing
        let image = render(&tree, 1);
        assert_eq!(image.width(), tree.geometry.width);
    }
}
