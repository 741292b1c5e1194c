//! FAST-9 corner detection with non-maximum suppression and Harris ranking.

use image::GrayImage;

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC: usize = 9;
const HARRIS_BLOCK: i32 = 7;

/// A FAST corner that survived suppression, with its Harris response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub response: f32,
}

/// Score of the pixel as a FAST-9 corner, or 0 when it is not one.
///
/// The score is the larger of the summed excess brightness of the brighter
/// circle pixels and the summed excess darkness of the darker ones.
fn fast_score(img: &GrayImage, x: u32, y: u32, threshold: u8) -> u32 {
    let center = img.get_pixel(x, y).0[0] as i32;
    let t = threshold as i32;
    let mut ring = [0i32; 16];
    for (slot, &(dx, dy)) in ring.iter_mut().zip(CIRCLE.iter()) {
        *slot = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32).0[0] as i32;
    }

    let brighter = |v: i32| v > center + t;
    let darker = |v: i32| v < center - t;
    if !has_arc(&ring, brighter) && !has_arc(&ring, darker) {
        return 0;
    }

    let bright: i32 = ring.iter().filter(|&&v| brighter(v)).map(|&v| v - center - t).sum();
    let dark: i32 = ring.iter().filter(|&&v| darker(v)).map(|&v| center - t - v).sum();
    bright.max(dark) as u32
}

/// True when at least `ARC` contiguous circle pixels (wrapping) satisfy `pred`.
fn has_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> bool {
    let mut run = 0;
    for i in 0..ring.len() + ARC - 1 {
        if pred(ring[i % ring.len()]) {
            run += 1;
            if run >= ARC {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Detect FAST corners at least `border` pixels from every edge, keep local
/// maxima of the FAST score in a 3×3 window and attach a Harris response.
pub fn detect_corners(img: &GrayImage, threshold: u8, border: u32, harris_k: f32) -> Vec<Corner> {
    let (w, h) = img.dimensions();
    // FAST circle and the Harris window both need a 4 px margin
    let border = border.max(4);
    if w <= 2 * border || h <= 2 * border {
        return Vec::new();
    }

    let mut scores = vec![0u32; (w * h) as usize];
    for y in border..h - border {
        for x in border..w - border {
            scores[(y * w + x) as usize] = fast_score(img, x, y, threshold);
        }
    }

    let score_at = |x: u32, y: u32| scores[(y * w + x) as usize];
    let mut corners = Vec::new();
    for y in border..h - border {
        for x in border..w - border {
            let s = score_at(x, y);
            if s == 0 || !is_local_max(&score_at, x, y, s) {
                continue;
            }
            corners.push(Corner {
                x,
                y,
                response: harris_response(img, x, y, harris_k),
            });
        }
    }
    corners
}

/// Strict maximum over the 8-neighbourhood; among equal scores the first in
/// raster order wins.
fn is_local_max(score_at: &impl Fn(u32, u32) -> u32, x: u32, y: u32, s: u32) -> bool {
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let n = score_at((x as i32 + dx) as u32, (y as i32 + dy) as u32);
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if n > s || (n == s && earlier) {
                return false;
            }
        }
    }
    true
}

/// Harris corner measure `det(M) - k * trace(M)^2` over a 7×7 window of Sobel
/// gradients centred on `(x, y)`.
pub fn harris_response(img: &GrayImage, x: u32, y: u32, k: f32) -> f32 {
    let px = |x: i32, y: i32| img.get_pixel(x as u32, y as u32).0[0] as f32;
    let r = HARRIS_BLOCK / 2;
    let (cx, cy) = (x as i32, y as i32);
    let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);

    for v in cy - r..=cy + r {
        for u in cx - r..=cx + r {
            let ix = (px(u + 1, v - 1) + 2.0 * px(u + 1, v) + px(u + 1, v + 1))
                - (px(u - 1, v - 1) + 2.0 * px(u - 1, v) + px(u - 1, v + 1));
            let iy = (px(u - 1, v + 1) + 2.0 * px(u, v + 1) + px(u + 1, v + 1))
                - (px(u - 1, v - 1) + 2.0 * px(u, v - 1) + px(u + 1, v - 1));
            a += ix * ix;
            b += iy * iy;
            c += ix * iy;
        }
    }

    let scale = 1.0 / (4.0 * HARRIS_BLOCK as f32 * 255.0);
    let (a, b, c) = (a * scale * scale, b * scale * scale, c * scale * scale);
    (a * b - c * c) - k * (a + b) * (a + b)
}

/// Sort by response descending, ties by `(y, x)`, and keep the first `limit`.
pub fn retain_strongest(mut corners: Vec<Corner>, limit: usize) -> Vec<Corner> {
    corners.sort_by(|p, q| {
        q.response
            .total_cmp(&p.response)
            .then(p.y.cmp(&q.y))
            .then(p.x.cmp(&q.x))
    });
    corners.truncate(limit);
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn arc_detection_wraps_around() {
        let mut ring = [0i32; 16];
        for i in [12, 13, 14, 15, 0, 1, 2, 3, 4] {
            ring[i] = 1;
        }
        assert!(has_arc(&ring, |v| v == 1));
        ring[0] = 0;
        assert!(!has_arc(&ring, |v| v == 1));
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(80, 80, Luma([128]));
        assert!(detect_corners(&img, 20, 10, 0.04).is_empty());
    }

    #[test]
    fn square_corners_are_detected() {
        let img = square(100, 100, 35, 35, 30);
        let corners = detect_corners(&img, 20, 10, 0.04);
        assert!(!corners.is_empty());
        for (cx, cy) in [(35, 35), (64, 35), (35, 64), (64, 64)] {
            assert!(
                corners.iter().any(|c| c.x.abs_diff(cx) <= 2 && c.y.abs_diff(cy) <= 2),
                "missing corner near ({cx}, {cy})"
            );
        }
    }

    #[test]
    fn border_pixels_are_skipped() {
        let img = square(100, 100, 2, 2, 20);
        let corners = detect_corners(&img, 20, 31, 0.04);
        assert!(corners.iter().all(|c| c.x >= 31 && c.y >= 31 && c.x < 69 && c.y < 69));
    }

    #[test]
    fn harris_prefers_corners_over_edges() {
        let img = square(100, 100, 35, 35, 30);
        let corner = harris_response(&img, 35, 35, 0.04);
        let edge = harris_response(&img, 50, 35, 0.04);
        assert!(corner > edge);
        assert!(corner > 0.0);
    }

    #[test]
    fn retain_strongest_orders_and_breaks_ties() {
        let corners = vec![
            Corner { x: 5, y: 1, response: 0.5 },
            Corner { x: 2, y: 1, response: 0.5 },
            Corner { x: 9, y: 0, response: 0.9 },
            Corner { x: 1, y: 9, response: 0.1 },
        ];
        let kept = retain_strongest(corners, 3);
        assert_eq!(
            kept.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>(),
            vec![(9, 0), (2, 1), (5, 1)]
        );
    }
}
