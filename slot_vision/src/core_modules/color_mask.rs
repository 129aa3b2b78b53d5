// THEORY:
// The color mask is the bridge from "what color is this pixel" to "is this pixel
// part of a marker". It is a pure, per-pixel band test in HSV space and produces a
// binary image (0 or 255) the same size as the input frame.

use crate::config::MarkerProfile;
use crate::core_modules::hsv::hsv::Hsv;
use image::{GrayImage, Luma, RgbImage};

pub const SELECTED: u8 = 255;
pub const UNSELECTED: u8 = 0;

impl MarkerProfile {
    #[inline]
    pub fn matches(&self, pixel: Hsv) -> bool {
        self.hue.contains(pixel.hue)
            && self.saturation.contains(pixel.saturation)
            && self.value.contains(pixel.value)
    }
}

/// Selects every pixel of `frame` whose HSV triple lies inside `profile`.
pub fn in_range(frame: &RgbImage, profile: &MarkerProfile) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let hsv = Hsv::from(frame.get_pixel(x, y));
        if profile.matches(hsv) {
            Luma([SELECTED])
        } else {
            Luma([UNSELECTED])
        }
    })
}
