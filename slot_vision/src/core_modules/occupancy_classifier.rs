// THEORY:
// The classifier answers one question per region: is the slot vacant? Bare or
// painted pavement reflects a lot of light, while a car body and its shadow pull the
// average down, so the decision is a single global threshold on the mean gray level
// inside the region:
//
//     vacant  <=>  mean_brightness > threshold
//
// The inequality is strict. A region sitting exactly on the threshold is occupied.
//
// There is no hysteresis and no per-slot calibration, and the classifier never
// fails. A region that selects no pixels (entirely off-frame) reads as brightness 0,
// which is occupied under any non-negative threshold.

use crate::core_modules::region::Region;
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use log::trace;

/// Outcome of classifying one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_vacant: bool,
    /// Mean gray level (0..255) inside the region.
    pub mean_brightness: f64,
}

const SELECTED: Luma<u8> = Luma([255]);

/// Rasterizes the region into a frame-sized selection mask (255 inside, 0 outside).
/// Edge pixels count as inside and anything off-frame is clipped.
pub fn region_mask(gray: &GrayImage, region: &Region) -> GrayImage {
    let mut mask = GrayImage::new(gray.width(), gray.height());
    let mut polygon: Vec<Point<i32>> = region
        .corners()
        .iter()
        .map(|corner| Point::new(corner.x, corner.y))
        .collect();
    polygon.dedup();
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    match polygon.as_slice() {
        [] => {}
        // Zero width or height: the region collapses onto a segment.
        [a] | [a, _] => {
            let b = polygon.last().unwrap_or(a);
            draw_line_segment_mut(
                &mut mask,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                SELECTED,
            );
        }
        _ => draw_polygon_mut(&mut mask, &polygon, SELECTED),
    }
    mask
}

/// Arithmetic mean of the gray values inside `region`; 0.0 if it selects nothing.
pub fn mean_brightness(gray: &GrayImage, region: &Region) -> f64 {
    let mask = region_mask(gray, region);
    let (sum, count) = gray
        .pixels()
        .zip(mask.pixels())
        .filter(|(_, selected)| selected[0] == SELECTED[0])
        .fold((0u64, 0u64), |(sum, count), (pixel, _)| {
            (sum + pixel[0] as u64, count + 1)
        });
    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}

pub fn classify(gray: &GrayImage, region: &Region, threshold: f64) -> Classification {
    let mean_brightness = mean_brightness(gray, region);
    let is_vacant = mean_brightness > threshold;
    trace!(
        "region at {:?}: mean {:.1} vs threshold {:.1} -> {}",
        region.top_left(),
        mean_brightness,
        threshold,
        if is_vacant { "vacant" } else { "occupied" }
    );
    Classification {
        is_vacant,
        mean_brightness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::region::BoundingRect;

    fn rect(x: i32, y: i32, width: i32, height: i32) -> Region {
        Region::from_rect(BoundingRect { x, y, width, height })
    }

    #[test]
    fn rectangle_selection_includes_its_edges() {
        let gray = GrayImage::new(20, 20);
        let mask = region_mask(&gray, &rect(2, 3, 4, 5));
        let selected = mask.pixels().filter(|p| p[0] == 255).count();
        assert_eq!(selected, 5 * 6);
        assert_eq!(mask.get_pixel(2, 3)[0], 255);
        assert_eq!(mask.get_pixel(6, 8)[0], 255);
        assert_eq!(mask.get_pixel(7, 8)[0], 0);
    }

    #[test]
    fn selection_is_clipped_to_the_frame() {
        let gray = GrayImage::from_pixel(10, 10, Luma([200]));
        let region = rect(-5, -5, 8, 8);
        let mask = region_mask(&gray, &region);
        assert_eq!(mask.pixels().filter(|p| p[0] == 255).count(), 4 * 4);
        assert_eq!(mean_brightness(&gray, &region), 200.0);
    }

    #[test]
    fn off_frame_region_reads_as_dark_and_occupied() {
        let gray = GrayImage::from_pixel(10, 10, Luma([255]));
        let result = classify(&gray, &rect(50, 50, 10, 10), 0.0);
        assert_eq!(result.mean_brightness, 0.0);
        assert!(!result.is_vacant);
    }

    #[test]
    fn bright_region_is_vacant() {
        let gray = GrayImage::from_pixel(40, 40, Luma([255]));
        let result = classify(&gray, &rect(5, 5, 20, 20), 120.0);
        assert!(result.is_vacant);
        assert_eq!(result.mean_brightness, 255.0);
    }

    #[test]
    fn decision_is_monotone_in_threshold() {
        let gray = GrayImage::from_fn(30, 30, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let region = rect(3, 4, 20, 15);
        let mut was_vacant = true;
        for threshold in (0..=255).step_by(5) {
            let result = classify(&gray, &region, threshold as f64);
            assert!(was_vacant || !result.is_vacant, "flipped back to vacant at {threshold}");
            was_vacant = result.is_vacant;
        }
    }

    #[test]
    fn collapsed_region_selects_a_segment() {
        let gray = GrayImage::from_fn(10, 10, |x, _| Luma([if x == 4 { 90 } else { 10 }]));
        let region = rect(4, 2, 0, 5);
        let mask = region_mask(&gray, &region);
        assert_eq!(mask.pixels().filter(|p| p[0] == 255).count(), 6);
        assert_eq!(mean_brightness(&gray, &region), 90.0);
    }
}
