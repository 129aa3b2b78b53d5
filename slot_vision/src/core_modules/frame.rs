// THEORY:
// A `Frame` is the unit of work for the whole pipeline: one instant of the camera,
// carried in the two representations the core consumes. The color plane feeds the
// marker detector; the gray plane feeds the brightness classifier. Both planes must
// describe the same pixels, so the constructor refuses mismatched dimensions.
//
// Frames are immutable once built and are dropped at the end of the tick that
// produced them.

use crate::error::FrameError;
use image::{GrayImage, Luma, RgbImage};

/// Rec. 601 luma, rounded to the nearest byte.
#[inline]
pub fn luminance(red: u8, green: u8, blue: u8) -> u8 {
    let luma = 0.299_f64 * red as f64 + 0.587_f64 * green as f64 + 0.114_f64 * blue as f64;
    luma.round().clamp(0.0, 255.0) as u8
}

/// Derives the intensity plane of a color frame.
pub fn to_gray(color: &RgbImage) -> GrayImage {
    GrayImage::from_fn(color.width(), color.height(), |x, y| {
        let pixel = color.get_pixel(x, y);
        Luma([luminance(pixel[0], pixel[1], pixel[2])])
    })
}

/// One captured instant: a color plane and its intensity plane.
#[derive(Debug, Clone)]
pub struct Frame {
    color: RgbImage,
    gray: GrayImage,
}

impl Frame {
    pub fn new(color: RgbImage, gray: GrayImage) -> Result<Self, FrameError> {
        if color.dimensions() != gray.dimensions() {
            return Err(FrameError::DimensionMismatch {
                color_width: color.width(),
                color_height: color.height(),
                gray_width: gray.width(),
                gray_height: gray.height(),
            });
        }
        Ok(Self { color, gray })
    }

    /// Builds a frame whose gray plane is derived from the color plane.
    pub fn from_color(color: RgbImage) -> Self {
        let gray = to_gray(&color);
        Self { color, gray }
    }

    pub fn color(&self) -> &RgbImage {
        &self.color
    }

    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }
}
