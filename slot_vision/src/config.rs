// THEORY:
// Every tunable constant of the system lives here. The detector constants (marker
// color band, minimum contour area, aspect window) were tuned against one camera and
// one lighting setup, so they are defaults rather than semantics: a different car park
// is a different JSON file, not a code change.
//
// The core trusts the values it is handed. Validation happens once, at load time, in
// `PipelineConfig::validate`, which is what `from_json_file` calls before returning.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An inclusive 8-bit band on one HSV channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub low: u8,
    pub high: u8,
}

impl ChannelRange {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, channel: u8) -> bool {
        self.low <= channel && channel <= self.high
    }
}

/// The HSV band that identifies painted slot markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerProfile {
    /// Hue band in half-degrees (0..180).
    pub hue: ChannelRange,
    pub saturation: ChannelRange,
    pub value: ChannelRange,
}

impl MarkerProfile {
    /// Wide yellow band: tolerant of faded paint and dusk lighting.
    pub const YELLOW: MarkerProfile = MarkerProfile {
        hue: ChannelRange::new(15, 35),
        saturation: ChannelRange::new(80, 255),
        value: ChannelRange::new(80, 255),
    };
}

impl Default for MarkerProfile {
    fn default() -> Self {
        Self::YELLOW
    }
}

/// Exclusive bounds on a bounding rectangle's width / height ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRange {
    pub min: f64,
    pub max: f64,
}

impl AspectRange {
    #[inline]
    pub fn admits(&self, ratio: f64) -> bool {
        self.min < ratio && ratio < self.max
    }
}

impl Default for AspectRange {
    fn default() -> Self {
        Self { min: 0.2, max: 5.0 }
    }
}

/// Configuration for the `BoundaryDetector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub marker: MarkerProfile,
    /// Contours enclosing less than this many square pixels are dropped as noise.
    pub min_area: f64,
    pub aspect_ratio: AspectRange,
    /// Side of the square structuring element used by the mask cleanup. Must be odd.
    pub kernel_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            marker: MarkerProfile::default(),
            min_area: 2000.0,
            aspect_ratio: AspectRange::default(),
            kernel_size: 3,
        }
    }
}

/// Configuration for the `OccupancyPipeline`, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    /// Mean gray level above which a slot reads as vacant.
    pub initial_threshold: f64,
    /// `Decrease` never pushes the threshold below this.
    pub threshold_floor: f64,
    /// Magnitude of one `Increase` or `Decrease` event.
    pub threshold_step: f64,
    /// Frames the concurrent pipeline may buffer between capture and processing.
    pub capture_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            initial_threshold: 120.0,
            threshold_floor: 50.0,
            threshold_step: 5.0,
            capture_buffer: 2,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON config. Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let marker = &self.detector.marker;
        for (name, range) in [
            ("hue", marker.hue),
            ("saturation", marker.saturation),
            ("value", marker.value),
        ] {
            if range.low > range.high {
                return Err(ConfigError::Invalid(format!(
                    "{name} range is inverted ({} > {})",
                    range.low, range.high
                )));
            }
        }
        if marker.hue.high >= 180 {
            return Err(ConfigError::Invalid(format!(
                "hue upper bound {} is outside 0..180",
                marker.hue.high
            )));
        }
        if !(self.detector.min_area >= 0.0) {
            return Err(ConfigError::Invalid("min_area must be non-negative".into()));
        }
        let aspect = self.detector.aspect_ratio;
        if !(aspect.min >= 0.0 && aspect.min < aspect.max) {
            return Err(ConfigError::Invalid(format!(
                "aspect ratio window ({}, {}) is empty or negative",
                aspect.min, aspect.max
            )));
        }
        if self.detector.kernel_size == 0 || self.detector.kernel_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "kernel_size must be odd and positive, got {}",
                self.detector.kernel_size
            )));
        }
        if !(self.threshold_floor >= 0.0 && self.threshold_step >= 0.0) {
            return Err(ConfigError::Invalid(
                "threshold_floor and threshold_step must be non-negative".into(),
            ));
        }
        if self.initial_threshold < self.threshold_floor {
            return Err(ConfigError::Invalid(format!(
                "initial_threshold {} is below threshold_floor {}",
                self.initial_threshold, self.threshold_floor
            )));
        }
        if self.capture_buffer == 0 {
            return Err(ConfigError::Invalid("capture_buffer must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_tuned_setup() {
        let config = PipelineConfig::default();
        assert_eq!(config.detector.marker, MarkerProfile::YELLOW);
        assert_eq!(config.detector.min_area, 2000.0);
        assert_eq!(config.detector.aspect_ratio, AspectRange { min: 0.2, max: 5.0 });
        assert_eq!(config.initial_threshold, 120.0);
        assert_eq!(config.threshold_floor, 50.0);
        assert_eq!(config.threshold_step, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = PipelineConfig::from_json_str(
            r#"{ "initial_threshold": 140, "detector": { "min_area": 500 } }"#,
        )
        .expect("valid config");
        assert_eq!(config.initial_threshold, 140.0);
        assert_eq!(config.detector.min_area, 500.0);
        assert_eq!(config.detector.marker, MarkerProfile::YELLOW);
        assert_eq!(config.threshold_floor, 50.0);
    }

    #[test]
    fn inverted_hue_range_is_rejected() {
        let result = PipelineConfig::from_json_str(
            r#"{ "detector": { "marker": { "hue": { "low": 40, "high": 20 } } } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn even_kernel_and_low_initial_threshold_are_rejected() {
        let mut config = PipelineConfig::default();
        config.detector.kernel_size = 4;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.initial_threshold = 30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = PipelineConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn aspect_window_is_exclusive() {
        let window = AspectRange::default();
        assert!(!window.admits(0.2));
        assert!(!window.admits(5.0));
        assert!(window.admits(1.0));
    }
}
