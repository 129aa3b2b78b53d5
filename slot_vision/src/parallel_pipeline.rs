// THEORY:
// `ParallelPipeline` is the concurrent form of `OccupancyPipeline`. It produces the
// same reports, with two differences in plumbing:
//
// 1.  **Capture decoupling**: in `run`, the frame source lives on the blocking pool
//     and hands frames over a bounded channel, so waiting on the camera overlaps
//     with processing the previous frame. Frames are still processed one at a time,
//     in order, each to completion.
// 2.  **Region fan-out**: classification of a frame's regions is split into
//     batches across blocking workers.
//
// Threshold changes arrive over a channel from any number of `ThresholdHandle`s.
// They are drained only between frames, and the value is read once per frame and
// copied into every worker. A change that lands mid-frame therefore takes effect
// on the next frame, and all regions of one frame share one threshold.

use crate::config::PipelineConfig;
use crate::core_modules::boundary_detector::BoundaryDetector;
use crate::core_modules::frame::Frame;
use crate::core_modules::region::Region;
use crate::core_modules::threshold::{ControlSignal, DecisionThreshold};
use crate::error::PipelineError;
use crate::frame_source::FrameSource;
use crate::pipeline::{FrameReport, Renderer, SessionSummary, classify_regions, fold_summary};
use futures::future::join_all;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sends operator input to a running `ParallelPipeline`.
#[derive(Debug, Clone)]
pub struct ThresholdHandle {
    control_sender: mpsc::UnboundedSender<ControlSignal>,
}

impl ThresholdHandle {
    /// Queues a signal for the next frame boundary. `false` once the pipeline is gone.
    pub fn send(&self, signal: ControlSignal) -> bool {
        self.control_sender.send(signal).is_ok()
    }
}

pub struct ParallelPipeline {
    config: PipelineConfig,
    detector: Arc<BoundaryDetector>,
    threshold: DecisionThreshold,
    control_sender: mpsc::UnboundedSender<ControlSignal>,
    control_receiver: mpsc::UnboundedReceiver<ControlSignal>,
    worker_count: usize,
}

impl ParallelPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let (control_sender, control_receiver) = mpsc::unbounded_channel();
        Self {
            detector: Arc::new(BoundaryDetector::new(config.detector.clone())),
            threshold: DecisionThreshold::new(config.initial_threshold, config.threshold_floor),
            config,
            control_sender,
            control_receiver,
            worker_count: num_cpus::get().max(1),
        }
    }

    pub fn control_handle(&self) -> ThresholdHandle {
        ThresholdHandle {
            control_sender: self.control_sender.clone(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.value()
    }

    /// Applies a threshold event. Returns `true` for `Stop`, which only a session acts on.
    fn apply_control(&mut self, signal: ControlSignal) -> bool {
        if signal == ControlSignal::Stop {
            return true;
        }
        let value = self.threshold.apply(signal, self.config.threshold_step);
        info!("threshold set to {value:.0}");
        false
    }

    /// Applies every queued signal. Returns `true` if a `Stop` was among them.
    fn drain_controls(&mut self) -> bool {
        let mut stop = false;
        while let Ok(signal) = self.control_receiver.try_recv() {
            stop |= self.apply_control(signal);
        }
        stop
    }

    /// Applies pending threshold changes, then processes one frame against a single
    /// threshold snapshot. A queued `Stop` is consumed without effect: there is no
    /// session here to end.
    pub async fn process_frame(
        &mut self,
        frame: Arc<Frame>,
    ) -> Result<FrameReport, PipelineError> {
        if self.drain_controls() {
            debug!("stop signal ignored outside a session");
        }
        self.process_with_snapshot(frame).await
    }

    async fn process_with_snapshot(
        &self,
        frame: Arc<Frame>,
    ) -> Result<FrameReport, PipelineError> {
        let threshold = self.threshold.value();

        let detector = Arc::clone(&self.detector);
        let detect_frame = Arc::clone(&frame);
        let regions: Vec<Region> =
            tokio::task::spawn_blocking(move || detector.detect(detect_frame.color())).await?;

        let batch_size = regions.len().div_ceil(self.worker_count).max(1);
        let batches = regions.chunks(batch_size).map(|batch| {
            let batch = batch.to_vec();
            let frame = Arc::clone(&frame);
            tokio::task::spawn_blocking(move || {
                classify_regions(frame.gray(), &batch, threshold).0
            })
        });

        let mut slots = Vec::with_capacity(regions.len());
        for batch in join_all(batches).await {
            slots.extend(batch?);
        }
        let summary = fold_summary(&slots);
        debug!(
            "frame: {} vacant, {} occupied at threshold {:.1}",
            summary.vacant, summary.occupied, threshold
        );

        Ok(FrameReport {
            slots,
            summary,
            threshold,
        })
    }

    /// Runs a session with capture on the blocking pool and a bounded hand-off of
    /// `capture_buffer` frames. Ends on end-of-stream or `ControlSignal::Stop`.
    /// Each call is a fresh session; a `Stop` that ended an earlier one does not
    /// carry over.
    pub async fn run<S, R>(
        &mut self,
        source: S,
        renderer: &mut R,
    ) -> Result<SessionSummary, PipelineError>
    where
        S: FrameSource + Send + 'static,
        R: Renderer + ?Sized,
    {
        let (frame_sender, mut frame_receiver) =
            mpsc::channel::<Frame>(self.config.capture_buffer);
        let capture = tokio::task::spawn_blocking(move || {
            let mut source = source;
            while let Some(frame) = source.next_frame() {
                if frame_sender.blocking_send(frame).is_err() {
                    break;
                }
            }
        });

        let mut frames = 0u64;
        while let Some(frame) = frame_receiver.recv().await {
            if self.drain_controls() {
                break;
            }
            let frame = Arc::new(frame);
            let report = self.process_with_snapshot(Arc::clone(&frame)).await?;
            frames += 1;
            if let Some(signal) = renderer.render(&frame, &report) {
                if self.apply_control(signal) {
                    break;
                }
            }
        }

        // Closing the receiver unblocks the capture task.
        drop(frame_receiver);
        capture.await?;

        info!("session ended after {frames} frames");
        Ok(SessionSummary {
            frames,
            final_threshold: self.threshold.value(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::OccupancyPipeline;
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    const YELLOW: Rgb<u8> = Rgb([240, 210, 30]);

    /// Four slots in a 2x2 layout with interiors of increasing brightness.
    fn parking_lot() -> Frame {
        let mut color = RgbImage::from_pixel(320, 320, Rgb([45, 45, 45]));
        let fills = [40u8, 110, 160, 230];
        for (i, fill) in fills.iter().enumerate() {
            let x0 = 20 + (i as u32 % 2) * 150;
            let y0 = 20 + (i as u32 / 2) * 150;
            for y in y0..y0 + 120 {
                for x in x0..x0 + 100 {
                    let edge = x < x0 + 4 || x >= x0 + 96 || y < y0 + 4 || y >= y0 + 116;
                    let pixel = if edge { YELLOW } else { Rgb([*fill, *fill, *fill]) };
                    color.put_pixel(x, y, pixel);
                }
            }
        }
        Frame::from_color(color)
    }

    struct StopAfter {
        remaining: usize,
        thresholds: Vec<f64>,
    }

    impl Renderer for StopAfter {
        fn render(&mut self, _frame: &Frame, report: &FrameReport) -> Option<ControlSignal> {
            self.thresholds.push(report.threshold);
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                Some(ControlSignal::Stop)
            } else {
                Some(ControlSignal::Decrease)
            }
        }
    }

    /// Renders without ever sending input.
    #[derive(Default)]
    struct Watcher {
        rendered: usize,
    }

    impl Renderer for Watcher {
        fn render(&mut self, _frame: &Frame, _report: &FrameReport) -> Option<ControlSignal> {
            self.rendered += 1;
            None
        }
    }

    fn lot_stream(frames: usize) -> VecDeque<Frame> {
        (0..frames).map(|_| parking_lot()).collect()
    }

    #[tokio::test]
    async fn matches_the_synchronous_pipeline() {
        let frame = parking_lot();
        let sync_report = OccupancyPipeline::new(PipelineConfig::default()).process_frame(&frame);

        let mut pipeline = ParallelPipeline::new(PipelineConfig::default());
        let report = pipeline.process_frame(Arc::new(frame)).await.expect("workers run");

        assert_eq!(report, sync_report);
        assert_eq!(report.slots.len(), 4);
    }

    #[tokio::test]
    async fn queued_signals_apply_at_the_next_frame_boundary() {
        let mut pipeline = ParallelPipeline::new(PipelineConfig::default());
        let handle = pipeline.control_handle();
        assert!(handle.send(ControlSignal::Increase));
        assert!(handle.send(ControlSignal::Increase));
        assert_eq!(pipeline.threshold(), 120.0);

        let report = pipeline
            .process_frame(Arc::new(parking_lot()))
            .await
            .expect("workers run");
        assert_eq!(report.threshold, 130.0);
        assert!(report.slots.iter().all(|slot| {
            slot.is_vacant == (slot.mean_brightness > report.threshold)
        }));
    }

    #[tokio::test]
    async fn run_stops_on_request_and_keeps_the_tuned_threshold() {
        let mut pipeline = ParallelPipeline::new(PipelineConfig::default());
        let source = lot_stream(6);
        let mut renderer = StopAfter {
            remaining: 3,
            thresholds: Vec::new(),
        };

        let session = pipeline.run(source, &mut renderer).await.expect("session runs");

        assert_eq!(session.frames, 3);
        assert_eq!(renderer.thresholds, vec![120.0, 115.0, 110.0]);
        assert_eq!(session.final_threshold, 110.0);
    }

    #[tokio::test]
    async fn run_ends_when_the_source_is_exhausted() {
        let mut pipeline = ParallelPipeline::new(PipelineConfig::default());
        let source = lot_stream(2);
        let mut renderer = StopAfter {
            remaining: 10,
            thresholds: Vec::new(),
        };
        let session = pipeline.run(source, &mut renderer).await.expect("session runs");
        assert_eq!(session.frames, 2);
    }

    #[tokio::test]
    async fn a_stopped_session_does_not_stop_the_next_one() {
        let mut pipeline = ParallelPipeline::new(PipelineConfig::default());
        let mut stopper = StopAfter {
            remaining: 1,
            thresholds: Vec::new(),
        };
        let first = pipeline.run(lot_stream(3), &mut stopper).await.expect("session runs");
        assert_eq!(first.frames, 1);

        let mut watcher = Watcher::default();
        let second = pipeline.run(lot_stream(3), &mut watcher).await.expect("session runs");
        assert_eq!(second.frames, 3);
        assert_eq!(watcher.rendered, 3);
    }

    #[tokio::test]
    async fn queued_stop_ends_only_the_session_it_lands_in() {
        let mut pipeline = ParallelPipeline::new(PipelineConfig::default());
        let handle = pipeline.control_handle();

        // Outside a session the stop is consumed and the frame is still processed.
        assert!(handle.send(ControlSignal::Stop));
        let report = pipeline
            .process_frame(Arc::new(parking_lot()))
            .await
            .expect("workers run");
        assert_eq!(report.slots.len(), 4);

        assert!(handle.send(ControlSignal::Stop));
        let mut watcher = Watcher::default();
        let stopped = pipeline.run(lot_stream(2), &mut watcher).await.expect("session runs");
        assert_eq!(stopped.frames, 0);

        let resumed = pipeline.run(lot_stream(2), &mut watcher).await.expect("session runs");
        assert_eq!(resumed.frames, 2);
        assert_eq!(watcher.rendered, 2);
    }
}
