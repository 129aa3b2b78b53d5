// THEORY:
// The contour finder turns the cleaned marker mask into a list of outlines, one per
// marker. It only reports *external* outlines: a marker is treated as a single outer
// boundary, so the holes inside a painted rectangle, and anything sitting inside
// those holes, are ignored.
//
// Border following (Suzuki-Abe, 8-connected foreground) yields the full border
// hierarchy. An outline is external iff it is an outer border with no parent; an
// outer border whose parent is a hole belongs to a blob painted inside a slot.
//
// Areas are taken over the border polygon through pixel centers, so a filled
// `w` x `h` block measures `(w - 1) * (h - 1)`, while extents are measured over
// whole pixels.

use crate::core_modules::region::BoundingRect;
use image::GrayImage;
use imageproc::contours::{self, BorderType};
use imageproc::geometry::contour_area;
use imageproc::point::Point;

/// An ordered outer border of one mask component.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Enclosed area of the border polygon, in square pixels.
    pub fn area(&self) -> f64 {
        contour_area(&self.points).abs()
    }

    /// Smallest axis-aligned rectangle covering every border pixel.
    pub fn bounding_rect(&self) -> BoundingRect {
        let Some(first) = self.points.first() else {
            return BoundingRect { x: 0, y: 0, width: 0, height: 0 };
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        BoundingRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }
}

/// Finds the outer borders of every external component of a binary mask, in raster
/// order of their top-left-most pixel. Any non-zero pixel is foreground.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }
    contours::find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| {
            matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
        })
        .map(|contour| Contour {
            points: contour.points,
        })
        .collect()
}
