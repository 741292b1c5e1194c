//! Common test utilities and helpers for the signature pipeline tests
//!
//! Synthetic signatures are drawn with `imageproc` as dark strokes on light
//! paper and encoded to PNG in memory.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

pub const PAPER: u8 = 245;
pub const INK: u8 = 20;

/// Draw a polyline with round 4 px wide strokes.
pub fn stroke(img: &mut GrayImage, points: &[(i32, i32)]) {
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
        for s in 0..=steps {
            let x = x0 + (x1 - x0) * s / steps;
            let y = y0 + (y1 - y0) * s / steps;
            draw_filled_circle_mut(img, (x, y), 2, Luma([INK]));
        }
    }
}

/// A 480×200 signature: zigzag, a loop, an underline and a tick.
pub fn signature(dx: i32, dy: i32) -> GrayImage {
    let mut img = GrayImage::from_pixel(480, 200, Luma([PAPER]));
    let shift = |pts: &[(i32, i32)]| -> Vec<(i32, i32)> {
        pts.iter().map(|&(x, y)| (x + dx, y + dy)).collect()
    };

    stroke(
        &mut img,
        &shift(&[(60, 140), (100, 60), (140, 140), (180, 60), (220, 140), (260, 60), (300, 140)]),
    );
    let loop_pts: Vec<(i32, i32)> = (0..=12)
        .map(|i| {
            let t = i as f32 / 12.0 * std::f32::consts::TAU;
            (360 + (30.0 * t.cos()) as i32, 100 + (30.0 * t.sin()) as i32)
        })
        .collect();
    stroke(&mut img, &shift(&loop_pts));
    stroke(&mut img, &shift(&[(80, 170), (420, 165)]));
    stroke(&mut img, &shift(&[(400, 60), (430, 90), (445, 55)]));
    img
}

/// A different hand: sparse vertical strokes and a wave.
pub fn other_signature() -> GrayImage {
    let mut img = GrayImage::from_pixel(480, 200, Luma([PAPER]));
    stroke(&mut img, &[(90, 40), (90, 160)]);
    stroke(&mut img, &[(90, 40), (150, 100), (90, 160)]);
    let wave: Vec<(i32, i32)> = (0..=20)
        .map(|i| {
            let x = 190 + i * 12;
            let y = 100 + (40.0 * (i as f32 * 0.9).sin()) as i32;
            (x, y)
        })
        .collect();
    stroke(&mut img, &wave);
    img
}

pub fn blank(w: u32, h: u32) -> GrayImage {
    GrayImage::from_pixel(w, h, Luma([PAPER]))
}

/// Ink running off the left and bottom edges.
pub fn edge_touching() -> GrayImage {
    let mut img = blank(300, 160);
    stroke(&mut img, &[(0, 80), (120, 20), (200, 159)]);
    stroke(&mut img, &[(0, 159), (299, 159)]);
    img
}

pub fn to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

pub fn png_bytes(image: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encoding");
    buf
}

pub fn gray_png(image: &GrayImage) -> Vec<u8> {
    png_bytes(DynamicImage::ImageLuma8(image.clone()))
}

pub fn rgb_png(image: &GrayImage) -> Vec<u8> {
    png_bytes(DynamicImage::ImageRgb8(to_rgb(image)))
}
