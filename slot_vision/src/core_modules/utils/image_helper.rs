pub mod image_helper {
    use crate::core_modules::frame::Frame;
    use crate::error::FrameError;
    use image::{GrayImage, ImageEncoder};
    use std::path::Path;

    /// Decodes a still image into a `Frame`, deriving the gray plane from color.
    pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame, FrameError> {
        let color = image::open(path)?.to_rgb8();
        Ok(Frame::from_color(color))
    }

    /// Writes a single-channel mask (marker mask, region selection) as a PNG.
    pub fn save_mask(path: impl AsRef<Path>, mask: &GrayImage) -> Result<(), FrameError> {
        let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            mask.as_raw(),
            mask.width(),
            mask.height(),
            image::ExtendedColorType::L8,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn saved_mask_reads_back_as_a_frame() {
        let width = 64u32;
        let height = 32u32;
        let mut mask = GrayImage::new(width, height);
        for x in 0..width / 2 {
            for y in 0..height {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let path = std::env::temp_dir().join("slot_vision_half_mask.png");

        save_mask(&path, &mask).expect("Error Saving File.");
        let frame = load_frame(&path).expect("Error Loading File.");

        assert_eq!((frame.width(), frame.height()), (width, height));
        assert_eq!(frame.gray().get_pixel(0, 0)[0], 255);
        assert_eq!(frame.gray().get_pixel(width - 1, 0)[0], 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn color_png_keeps_its_color_plane() {
        let mut color = RgbImage::from_pixel(8, 8, Rgb([70, 70, 75]));
        color.put_pixel(3, 3, Rgb([255, 255, 0]));
        let path = std::env::temp_dir().join("slot_vision_color_frame.png");
        color.save(&path).expect("Error Saving File.");

        let frame = load_frame(&path).expect("Error Loading File.");
        assert_eq!(frame.color().get_pixel(3, 3), &Rgb([255, 255, 0]));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_frame("/nonexistent/slot_vision/frame.png").is_err());
    }
}
