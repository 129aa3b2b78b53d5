// THEORY:
// The `BoundaryDetector` is the spatial layer of the system. It looks at one color
// frame and answers "where are the painted slot markers?" with an ordered list of
// `Region`s.
//
// Key architectural principles & algorithm steps:
// 1.  **Color Segmentation**: every pixel is converted to HSV and tested against the
//     configured `MarkerProfile`, yielding a binary marker mask.
// 2.  **Mask Cleanup**: closing then opening with a small square kernel. Closing
//     reconnects worn outlines; opening then removes specks.
// 3.  **Outline Extraction**: only external contours are kept, so each painted
//     slot contributes exactly one outline no matter what is drawn inside it.
// 4.  **Geometric Filtering**: contours that enclose too little area are sensor
//     noise or distant blobs; bounding boxes outside the aspect window are glare
//     slivers or stray yellow objects.
// 5.  **Stable Ordering**: regions are sorted top-to-bottom by their top-left
//     corner. This is display order only, never an identity.
// 6.  **Stateless Utility**: like the classifier, the detector has no memory. The
//     same frame always produces the same list.

use crate::config::DetectorConfig;
use crate::core_modules::color_mask;
use crate::core_modules::contour::find_external_contours;
use crate::core_modules::morphology;
use crate::core_modules::region::Region;
use image::{GrayImage, RgbImage};
use log::debug;

#[derive(Debug, Clone, Default)]
pub struct BoundaryDetector {
    config: DetectorConfig,
}

impl BoundaryDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The cleaned binary marker mask (0 or 255) for `frame`.
    pub fn marker_mask(&self, frame: &RgbImage) -> GrayImage {
        let raw = color_mask::in_range(frame, &self.config.marker);
        morphology::clean(&raw, self.config.kernel_size)
    }

    /// Finds candidate slot regions in `frame`, ordered by top-left y.
    pub fn detect(&self, frame: &RgbImage) -> Vec<Region> {
        let mask = self.marker_mask(frame);
        let contours = find_external_contours(&mask);
        let total = contours.len();

        let mut regions: Vec<Region> = contours
            .iter()
            .filter(|contour| contour.area() >= self.config.min_area)
            .map(|contour| contour.bounding_rect())
            .filter(|rect| self.config.aspect_ratio.admits(rect.aspect_ratio()))
            .map(Region::from_rect)
            .collect();

        regions.sort_by_key(|region| region.top_left().y);

        debug!(
            "boundary detector: {} contours, {} regions kept",
            total,
            regions.len()
        );
        regions
    }
}
