//! Audit overlay: contour outlines and their union bounding box drawn on an
//! RGB copy of the original image.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::contour::Contour;
use super::decode::RasterImage;
use super::roi::union_bounds;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const STROKE: u32 = 2;

/// Render the overlay. Without contours the copy is returned unmarked.
pub fn render_overlay(image: &RasterImage, contours: &[Contour]) -> RgbImage {
    let mut canvas = image.as_dynamic().to_rgb8();

    for contour in contours {
        draw_closed_polyline(&mut canvas, contour, OUTLINE_COLOR);
    }

    if let Some(bounds) = union_bounds(contours) {
        for inset in 0..STROKE {
            let w = (bounds.width + 2 * inset).max(1);
            let h = (bounds.height + 2 * inset).max(1);
            let rect = Rect::at(bounds.x as i32 - inset as i32, bounds.y as i32 - inset as i32)
                .of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
    }
    canvas
}

fn draw_closed_polyline(canvas: &mut RgbImage, contour: &Contour, color: Rgb<u8>) {
    let points = &contour.points;
    if points.len() == 1 {
        let p = points[0];
        if p.x < canvas.width() && p.y < canvas.height() {
            canvas.put_pixel(p.x, p.y, color);
        }
        return;
    }
    for i in 0..points.len() {
        let p1 = points[i];
        let p2 = points[(i + 1) % points.len()];
        // second pass offset by one pixel gives the 2 px stroke
        for offset in 0..STROKE {
            let d = offset as f32;
            draw_line_segment_mut(
                canvas,
                (p1.x as f32 + d, p1.y as f32),
                (p2.x as f32 + d, p2.y as f32),
                color,
            );
            draw_line_segment_mut(
                canvas,
                (p1.x as f32, p1.y as f32 + d),
                (p2.x as f32, p2.y as f32 + d),
                color,
            );
        }
    }
}
