// THEORY:
// The detection and classification core never fails: an empty frame is an empty
// report, and a region that selects no pixels reads as zero brightness. Errors only
// exist at the edges, where configuration is loaded from disk and where frames are
// assembled from outside buffers.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or validate a `PipelineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure to assemble a `Frame`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(
        "color plane is {color_width}x{color_height} but gray plane is {gray_width}x{gray_height}"
    )]
    DimensionMismatch {
        color_width: u32,
        color_height: u32,
        gray_width: u32,
        gray_height: u32,
    },
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Failure inside the concurrent pipeline's task plumbing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
