// THEORY:
// This file is the main entry point for the `slot_vision` library crate.
// It defines the public API that external consumers (like the `visual_tester`
// binary) build on.
//
// The primary goal is to export the `OccupancyPipeline` and its concurrent twin
// `ParallelPipeline`, together with their data structures (`PipelineConfig`,
// `FrameReport`, `SlotReport`, etc.), as the high-level interface for the engine.
// The detection and classification stages live in `core_modules` and stay usable
// on their own for tooling and tests, but a typical caller only needs a config,
// a `FrameSource` and a `Renderer`.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_source;
pub mod parallel_pipeline;
pub mod pipeline;

// Re-export key data structures for the public API.
pub use config::{DetectorConfig, MarkerProfile, PipelineConfig};
pub use core_modules::frame::Frame;
pub use core_modules::region::{Point, Region};
pub use core_modules::threshold::{ControlSignal, DecisionThreshold};
pub use error::{ConfigError, FrameError, PipelineError};
pub use frame_source::{FrameSource, ImageSequence};
pub use parallel_pipeline::{ParallelPipeline, ThresholdHandle};
pub use pipeline::{
    FrameReport, OccupancyPipeline, OccupancySummary, Renderer, SessionSummary, SlotReport,
};
