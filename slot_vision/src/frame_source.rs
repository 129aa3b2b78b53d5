// THEORY:
// The core never opens a camera. It pulls frames from a `FrameSource`, one per tick,
// and stops as soon as the source reports end-of-stream. A camera that fails to open
// or drops out is, from the core's point of view, simply a stream that has ended.

use crate::core_modules::frame::Frame;
use crate::core_modules::utils::image_helper::image_helper::load_frame;
use log::warn;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Supplies paired color/gray frames, one per tick.
pub trait FrameSource {
    /// The next frame, or `None` at end-of-stream.
    fn next_frame(&mut self) -> Option<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<Frame> {
        (**self).next_frame()
    }
}

/// Frames already in memory, replayed in order.
impl FrameSource for VecDeque<Frame> {
    fn next_frame(&mut self) -> Option<Frame> {
        self.pop_front()
    }
}

/// Still images on disk, decoded lazily in order. Unreadable files are skipped.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: VecDeque<PathBuf>,
}

impl ImageSequence {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Option<Frame> {
        while let Some(path) = self.paths.pop_front() {
            match load_frame(&path) {
                Ok(frame) => return Some(frame),
                Err(error) => warn!("skipping {}: {}", path.display(), error),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn in_memory_frames_replay_in_order_then_end() {
        let mut source: VecDeque<Frame> = (1..=3)
            .map(|w| Frame::from_color(RgbImage::new(w, 1)))
            .collect();
        assert_eq!(source.next_frame().map(|f| f.width()), Some(1));
        assert_eq!(source.next_frame().map(|f| f.width()), Some(2));
        assert_eq!(source.next_frame().map(|f| f.width()), Some(3));
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn unreadable_images_are_skipped() {
        let path = std::env::temp_dir().join("slot_vision_sequence_frame.png");
        RgbImage::new(12, 7).save(&path).expect("Error Saving File.");

        let mut sequence = ImageSequence::new([
            PathBuf::from("/nonexistent/slot_vision/a.png"),
            path.clone(),
        ]);
        let frame = sequence.next_frame().expect("second image loads");
        assert_eq!((frame.width(), frame.height()), (12, 7));
        assert!(sequence.next_frame().is_none());
        assert_eq!(sequence.remaining(), 0);
        let _ = std::fs::remove_file(path);
    }
}
