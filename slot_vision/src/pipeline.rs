// THEORY:
// The `pipeline` module is the top-level API for the occupancy engine. It wires the
// two stateless stages (boundary detection, brightness classification) into a
// per-frame report, and it owns the one piece of state that survives between frames:
// the decision threshold.
//
// Per frame:
// 1.  Detect regions once from the color plane.
// 2.  Snapshot the threshold once. Every region of this frame is judged against
//     the same value.
// 3.  Classify each region independently from the gray plane.
// 4.  Fold the decisions into vacant / occupied counts.
//
// Nothing else is remembered. Regions carry no identity, and there is no history
// or smoothing across frames.

use crate::config::PipelineConfig;
use crate::core_modules::boundary_detector::BoundaryDetector;
use crate::core_modules::frame::Frame;
use crate::core_modules::occupancy_classifier::classify;
use crate::core_modules::region::Region;
use crate::core_modules::threshold::DecisionThreshold;
use crate::frame_source::FrameSource;
use image::GrayImage;
use log::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::threshold::ControlSignal;

/// Counts of vacant and occupied regions in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccupancySummary {
    pub vacant: usize,
    pub occupied: usize,
}

impl OccupancySummary {
    pub fn total(&self) -> usize {
        self.vacant + self.occupied
    }
}

/// One classified region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotReport {
    pub region: Region,
    pub is_vacant: bool,
    pub mean_brightness: f64,
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Classified regions, top-of-frame first.
    pub slots: Vec<SlotReport>,
    pub summary: OccupancySummary,
    /// The threshold every slot in this frame was judged against.
    pub threshold: f64,
}

/// Draws or prints a processed frame and optionally returns an operator input.
///
/// The pipeline emits data only. Overlays, labels and console text are the
/// renderer's business.
pub trait Renderer {
    fn render(&mut self, frame: &Frame, report: &FrameReport) -> Option<ControlSignal>;
}

/// What a finished session leaves behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub frames: u64,
    /// The tuned threshold, worth saving as the next `initial_threshold`.
    pub final_threshold: f64,
}

pub(crate) fn fold_summary<'a>(
    slots: impl IntoIterator<Item = &'a SlotReport>,
) -> OccupancySummary {
    slots
        .into_iter()
        .fold(OccupancySummary::default(), |mut summary, slot| {
            if slot.is_vacant {
                summary.vacant += 1;
            } else {
                summary.occupied += 1;
            }
            summary
        })
}

/// Classifies every region against one threshold value and folds the counts.
pub fn classify_regions(
    gray: &GrayImage,
    regions: &[Region],
    threshold: f64,
) -> (Vec<SlotReport>, OccupancySummary) {
    let slots: Vec<SlotReport> = regions
        .iter()
        .map(|region| {
            let result = classify(gray, region, threshold);
            SlotReport {
                region: *region,
                is_vacant: result.is_vacant,
                mean_brightness: result.mean_brightness,
            }
        })
        .collect();
    let summary = fold_summary(&slots);
    (slots, summary)
}

/// The main, top-level struct for the occupancy engine.
pub struct OccupancyPipeline {
    detector: BoundaryDetector,
    threshold: DecisionThreshold,
    config: PipelineConfig,
}

impl OccupancyPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            detector: BoundaryDetector::new(config.detector.clone()),
            threshold: DecisionThreshold::new(config.initial_threshold, config.threshold_floor),
            config,
        }
    }

    pub fn detector(&self) -> &BoundaryDetector {
        &self.detector
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.value()
    }

    pub fn process_frame(&self, frame: &Frame) -> FrameReport {
        let regions = self.detector.detect(frame.color());
        let threshold = self.threshold.value();
        let (slots, summary) = classify_regions(frame.gray(), &regions, threshold);
        debug!(
            "frame: {} vacant, {} occupied at threshold {:.1}",
            summary.vacant, summary.occupied, threshold
        );
        FrameReport {
            slots,
            summary,
            threshold,
        }
    }

    pub fn increase_threshold(&mut self, step: f64) -> f64 {
        let value = self.threshold.increase(step);
        info!("threshold raised to {value:.0}");
        value
    }

    pub fn decrease_threshold(&mut self, step: f64, floor: f64) -> f64 {
        let value = self.threshold.decrease(step, floor);
        info!("threshold lowered to {value:.0}");
        value
    }

    /// Applies an operator input using the configured step and floor.
    pub fn apply_control(&mut self, signal: ControlSignal) -> f64 {
        match signal {
            ControlSignal::Increase => self.increase_threshold(self.config.threshold_step),
            ControlSignal::Decrease => {
                self.decrease_threshold(self.config.threshold_step, self.config.threshold_floor)
            }
            ControlSignal::Stop => self.threshold.value(),
        }
    }

    /// The synchronous frame loop: capture, process, render, apply input. Ends on
    /// end-of-stream or `ControlSignal::Stop`.
    pub fn run<S, R>(&mut self, source: &mut S, renderer: &mut R) -> SessionSummary
    where
        S: FrameSource + ?Sized,
        R: Renderer + ?Sized,
    {
        let mut frames = 0u64;
        while let Some(frame) = source.next_frame() {
            let report = self.process_frame(&frame);
            frames += 1;
            match renderer.render(&frame, &report) {
                Some(ControlSignal::Stop) => break,
                Some(signal) => {
                    self.apply_control(signal);
                }
                None => {}
            }
        }
        info!("session ended after {frames} frames");
        SessionSummary {
            frames,
            final_threshold: self.threshold.value(),
        }
    }
}
