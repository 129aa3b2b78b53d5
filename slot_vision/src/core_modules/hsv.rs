// THEORY (Single-Pixel HSV):
// The marker detector segments by color, and color segmentation is far more stable
// in HSV than in RGB: a yellow stripe in sunlight and the same stripe in shade share
// a hue band, while their RGB triples are nowhere near each other.
//
// This module is the 1D layer of the detector. Every function looks at exactly one
// pixel, with no knowledge of neighbors. Anything spatial (masks, morphology,
// contours) lives in higher modules.
//
// Scale convention:
// - Hue is stored in half-degrees, 0..180, so it fits a byte. Pure yellow (60°) is 30.
// - Saturation and value are 0..255.
// This is the 8-bit convention of common capture libraries, so marker profiles tuned
// against a live camera preview transfer unchanged.

pub mod hsv {
    use image::Rgb;

    pub type HueHalfDegrees = u8;
    pub type Saturation = u8;
    pub type Value = u8;

    /// A single pixel in 8-bit HSV.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Hsv {
        /// Hue in half-degrees (0..180).
        pub hue: HueHalfDegrees,
        /// Saturation (0..255). Zero for any gray.
        pub saturation: Saturation,
        /// Value (0..255), the brightest channel.
        pub value: Value,
    }

    impl Hsv {
        pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
            let maximum_channel = red.max(green).max(blue);
            let minimum_channel = red.min(green).min(blue);
            let chroma = (maximum_channel - minimum_channel) as f32;

            let value = maximum_channel;
            let saturation = if maximum_channel == 0 {
                0
            } else {
                (255.0 * chroma / maximum_channel as f32).round() as u8
            };

            // Achromatic pixels have no defined hue; pin them to zero.
            if chroma == 0.0 {
                return Self { hue: 0, saturation, value };
            }

            let (red, green, blue) = (red as f32, green as f32, blue as f32);
            let (base_difference, sector_offset) = if maximum_channel as f32 == red {
                (green - blue, 0.0)
            } else if maximum_channel as f32 == green {
                (blue - red, 120.0)
            } else {
                (red - green, 240.0)
            };

            let mut hue_degrees = 60.0 * base_difference / chroma + sector_offset;
            if hue_degrees < 0.0 {
                hue_degrees += 360.0;
            }
            let hue = (hue_degrees / 2.0).round() as u16 % 180;

            Self { hue: hue as u8, saturation, value }
        }
    }

    impl From<&Rgb<u8>> for Hsv {
        fn from(pixel: &Rgb<u8>) -> Self {
            Hsv::from_rgb(pixel[0], pixel[1], pixel[2])
        }
    }
}
