//! Outer ink contours of a binary mask, filtered by relative area.

use imageproc::contours::{self, BorderType};
use imageproc::point::Point;
use tracing::debug;

use crate::config::ContourConfig;

/// Closed outline of one ink blob, collinear runs removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<u32>>,
}

impl Contour {
    /// Enclosed polygon area (shoelace formula).
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }
}

/// Find the outer contours of `mask`, sorted by area descending, keeping only
/// those whose area exceeds `min_area_ratio` of the largest one.
///
/// An empty result is valid and means no ink was found.
pub fn extract_contours(mask: &image::GrayImage, cfg: &ContourConfig) -> Vec<Contour> {
    let outer: Vec<Contour> = contours::find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| Contour {
            points: simplify(&c.points),
        })
        .collect();

    let found = outer.len();
    let kept = filter_by_relative_area(outer, cfg.min_area_ratio);
    debug!(found, kept = kept.len(), "contour extraction");
    kept
}

/// Sort by area descending and drop contours with `area <= largest * ratio`.
pub fn filter_by_relative_area(contours: Vec<Contour>, ratio: f64) -> Vec<Contour> {
    let mut scored: Vec<(f64, Contour)> = contours.into_iter().map(|c| (c.area(), c)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let Some(largest) = scored.first().map(|(area, _)| *area) else {
        return Vec::new();
    };
    let min_area = largest * ratio;
    scored
        .into_iter()
        .filter(|(area, _)| *area > min_area)
        .map(|(_, c)| c)
        .collect()
}

/// Drop every point whose incoming and outgoing steps share a direction,
/// leaving only the corners of the closed chain.
pub fn simplify(points: &[Point<u32>]) -> Vec<Point<u32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let step = |a: Point<u32>, b: Point<u32>| {
        (
            (b.x as i64 - a.x as i64).signum(),
            (b.y as i64 - a.y as i64).signum(),
        )
    };
    let corners: Vec<Point<u32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if corners.is_empty() {
        vec![points[0]]
    } else {
        corners
    }
}

/// Absolute shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn square_mask(w: u32, h: u32, squares: &[(u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for &(x0, y0, side) in squares {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn square_simplifies_to_four_corners() {
        let mask = square_mask(20, 20, &[(5, 5, 6)]);
        let contours = extract_contours(&mask, &ContourConfig::default());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 4);
        assert_eq!(contours[0].area(), 25.0);
    }

    #[test]
    fn holes_are_not_reported() {
        let mut mask = square_mask(30, 30, &[(5, 5, 20)]);
        for y in 10..20 {
            for x in 10..20 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        let contours = extract_contours(&mask, &ContourConfig::default());
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn blank_mask_yields_no_contours() {
        let contours = extract_contours(&GrayImage::new(40, 40), &ContourConfig::default());
        assert!(contours.is_empty());
    }

    #[test]
    fn small_blobs_relative_to_largest_are_dropped() {
        // ~1000 px blob next to a 5 px speck
        let mut mask = square_mask(100, 100, &[(10, 10, 32)]);
        for x in 70..75 {
            mask.put_pixel(x, 70, Luma([255]));
        }
        mask.put_pixel(72, 71, Luma([255]));
        let contours = extract_contours(&mask, &ContourConfig::default());
        assert_eq!(contours.len(), 1);
        assert!(contours[0].points.iter().all(|p| p.x < 50 && p.y < 50));
    }

    #[test]
    fn contours_sorted_by_area() {
        let mask = square_mask(100, 100, &[(5, 5, 10), (40, 40, 30)]);
        let contours = extract_contours(&mask, &ContourConfig::default());
        assert_eq!(contours.len(), 2);
        assert!(contours[0].area() > contours[1].area());
    }

    #[test]
    fn polygon_area_of_triangle() {
        let pts = [Point::new(0, 0), Point::new(4, 0), Point::new(0, 3)];
        assert_eq!(polygon_area(&pts), 6.0);
        assert_eq!(polygon_area(&pts[..2]), 0.0);
    }
}
