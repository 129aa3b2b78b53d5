use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info, warn};
use opencv::{
    core::{self, Mat, Rect, Scalar, Size, Vector},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use slot_vision::core_modules::boundary_detector::BoundaryDetector;
use slot_vision::core_modules::utils::image_helper::image_helper::save_mask;
use slot_vision::{
    ControlSignal, Frame, FrameReport, FrameSource, OccupancyPipeline, PipelineConfig, Renderer,
};
use std::io::Write;
use std::path::PathBuf;

const MAIN_WINDOW: &str = "Parking Slot Detection";
const DEBUG_WINDOW: &str = "Debug - Gray Frame";

/// Live parking-slot occupancy viewer.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Camera index to capture from.
    #[arg(long, default_value_t = 1)]
    camera: i32,
    /// Read frames from a video file instead of a camera.
    #[arg(long)]
    input: Option<PathBuf>,
    /// JSON pipeline config. Missing fields use the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write the annotated stream to this video file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // --- 1. Argument Parsing & Setup ---
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    // --- 2. Video I/O Initialization ---
    let mut source = match &args.input {
        Some(path) => OpenCvSource::from_file(path)?,
        None => OpenCvSource::from_camera(args.camera)?,
    };
    let writer = match &args.output {
        Some(path) => Some(open_writer(path, &source)?),
        None => None,
    };

    print_controls();

    // --- 3. Pipeline Initialization ---
    let mut pipeline = OccupancyPipeline::new(config);
    let detector = pipeline.detector().clone();
    info!(
        "markers need area >= {} and kernel {}",
        detector.config().min_area,
        detector.config().kernel_size
    );
    let mut renderer = HighGuiRenderer::new(detector, writer);

    // --- 4. Main Processing Loop ---
    let session = pipeline.run(&mut source, &mut renderer);

    highgui::destroy_all_windows()?;
    println!();
    println!("Stopped after {} frames.", session.frames);
    println!(
        "Best threshold: {:.0} (save it as initial_threshold in the config)",
        session.final_threshold
    );
    Ok(())
}

fn print_controls() {
    println!("Green = VACANT (bright ground), red = OCCUPIED (dark car or shadow)");
    println!("Controls:");
    println!("  q      quit");
    println!("  d      toggle the gray debug window");
    println!("  + / =  raise threshold (vacant slots read as occupied)");
    println!("  - / _  lower threshold (occupied slots read as vacant)");
    println!("  m      save the current marker mask as PNG");
}

fn open_writer(path: &PathBuf, source: &OpenCvSource) -> Result<VideoWriter> {
    let fps = match source.capture.get(videoio::CAP_PROP_FPS)? {
        fps if fps > 0.0 => fps,
        _ => 30.0,
    };
    let width = source.capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
    let height = source.capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let writer = VideoWriter::new(
        &path.to_string_lossy(),
        fourcc,
        fps,
        Size::new(width, height),
        true,
    )?;
    if !writer.is_opened()? {
        bail!("could not open {} for writing", path.display());
    }
    Ok(writer)
}

/// Camera or video file, converted into paired RGB / gray frames.
struct OpenCvSource {
    capture: VideoCapture,
    bgr: Mat,
}

impl OpenCvSource {
    fn from_camera(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        Self::opened(capture, &format!("camera {index}"))
    }

    fn from_file(path: &PathBuf) -> Result<Self> {
        let capture = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
        Self::opened(capture, &path.display().to_string())
    }

    fn opened(capture: VideoCapture, name: &str) -> Result<Self> {
        if !capture.is_opened()? {
            bail!("could not open {name}");
        }
        info!("capturing from {name}");
        Ok(Self {
            capture,
            bgr: Mat::default(),
        })
    }

    fn convert(&self) -> Result<Frame> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
        let mut gray = Mat::default();
        imgproc::cvt_color(&self.bgr, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        let color = image::RgbImage::from_raw(width, height, rgb.data_bytes()?.to_vec())
            .with_context(|| format!("color buffer does not hold {width}x{height} RGB pixels"))?;
        let (gray_width, gray_height) = (gray.cols() as u32, gray.rows() as u32);
        let gray = image::GrayImage::from_raw(gray_width, gray_height, gray.data_bytes()?.to_vec())
            .with_context(|| {
                format!("gray buffer does not hold {gray_width}x{gray_height} pixels")
            })?;
        Ok(Frame::new(color, gray)?)
    }
}

impl FrameSource for OpenCvSource {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.capture.read(&mut self.bgr) {
            Ok(true) if !self.bgr.empty() => {}
            Ok(_) => {
                info!("capture reached end of stream");
                return None;
            }
            Err(e) => {
                warn!("error reading frame: {e}");
                return None;
            }
        }
        match self.convert() {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("error converting frame: {e:#}");
                None
            }
        }
    }
}

/// Draws the occupancy overlay in a HighGUI window and reads the keyboard.
struct HighGuiRenderer {
    detector: BoundaryDetector,
    writer: Option<VideoWriter>,
    debug_window: bool,
    frame_index: u64,
}

impl HighGuiRenderer {
    fn new(detector: BoundaryDetector, writer: Option<VideoWriter>) -> Self {
        Self {
            detector,
            writer,
            debug_window: false,
            frame_index: 0,
        }
    }

    fn draw(
        &mut self,
        frame: &Frame,
        report: &FrameReport,
    ) -> opencv::Result<Option<ControlSignal>> {
        self.frame_index += 1;
        let mut canvas = to_bgr_mat(frame)?;

        for slot in &report.slots {
            let (color, label) = if slot.is_vacant {
                (Scalar::new(0.0, 255.0, 0.0, 0.0), "VACANT")
            } else {
                (Scalar::new(0.0, 0.0, 255.0, 0.0), "OCCUPIED")
            };
            let outline: Vector<core::Point> = slot
                .region
                .corners()
                .iter()
                .map(|p| core::Point::new(p.x, p.y))
                .collect();
            let outlines: Vector<Vector<core::Point>> = std::iter::once(outline).collect();
            imgproc::polylines(&mut canvas, &outlines, true, color, 4, imgproc::LINE_8, 0)?;

            let center = slot.region.center();
            imgproc::put_text(
                &mut canvas,
                label,
                core::Point::new(center.x - 35, center.y + 25),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.7,
                color,
                2,
                imgproc::LINE_8,
                false,
            )?;
        }

        if !report.slots.is_empty() {
            draw_stats_panel(&mut canvas, report)?;
            print!(
                "\rVacant: {} | Occupied: {}   ",
                report.summary.vacant, report.summary.occupied
            );
            let _ = std::io::stdout().flush();
        }

        highgui::imshow(MAIN_WINDOW, &canvas)?;
        if self.debug_window {
            highgui::imshow(DEBUG_WINDOW, &gray_mat(frame)?)?;
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write(&canvas)?;
        }

        // --- Keyboard ---
        let key = highgui::wait_key(1)?;
        if key < 0 {
            return Ok(None);
        }
        let signal = match (key & 0xFF) as u8 {
            b'q' => Some(ControlSignal::Stop),
            b'+' | b'=' => Some(ControlSignal::Increase),
            b'-' | b'_' => Some(ControlSignal::Decrease),
            b'd' => {
                self.debug_window = !self.debug_window;
                if !self.debug_window {
                    highgui::destroy_window(DEBUG_WINDOW)?;
                }
                None
            }
            b'm' => {
                self.save_marker_mask(frame);
                None
            }
            _ => None,
        };
        Ok(signal)
    }

    fn save_marker_mask(&self, frame: &Frame) {
        let path = PathBuf::from(format!("marker_mask_{:05}.png", self.frame_index));
        let mask = self.detector.marker_mask(frame.color());
        match save_mask(&path, &mask) {
            Ok(()) => info!("saved marker mask to {}", path.display()),
            Err(e) => error!("failed to save marker mask: {e}"),
        }
    }
}

impl Renderer for HighGuiRenderer {
    fn render(&mut self, frame: &Frame, report: &FrameReport) -> Option<ControlSignal> {
        match self.draw(frame, report) {
            Ok(signal) => signal,
            Err(e) => {
                error!("rendering failed, stopping: {e}");
                Some(ControlSignal::Stop)
            }
        }
    }
}

fn draw_stats_panel(canvas: &mut Mat, report: &FrameReport) -> opencv::Result<()> {
    let panel = Rect::new(15, 15, 305, 175);
    let white = Scalar::new(255.0, 255.0, 255.0, 0.0);
    imgproc::rectangle(canvas, panel, Scalar::all(0.0), -1, imgproc::LINE_8, 0)?;
    imgproc::rectangle(canvas, panel, white, 2, imgproc::LINE_8, 0)?;

    let lines = [
        ("PARKING STATUS".to_string(), 50, 0.9, white),
        (
            format!("Vacant:   {}", report.summary.vacant),
            100,
            0.8,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
        ),
        (
            format!("Occupied: {}", report.summary.occupied),
            135,
            0.8,
            Scalar::new(0.0, 0.0, 255.0, 0.0),
        ),
        (format!("Threshold: {:.0}", report.threshold), 170, 0.7, white),
    ];
    for (text, y, scale, color) in lines {
        imgproc::put_text(
            canvas,
            &text,
            core::Point::new(25, y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            scale,
            color,
            2,
            imgproc::LINE_8,
            false,
        )?;
    }
    Ok(())
}

/// Copies the RGB plane of `frame` into a BGR `Mat` for drawing.
fn to_bgr_mat(frame: &Frame) -> opencv::Result<Mat> {
    let mut rgb = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    rgb.data_bytes_mut()?.copy_from_slice(frame.color().as_raw());
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}

fn gray_mat(frame: &Frame) -> opencv::Result<Mat> {
    let mut gray = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        core::CV_8UC1,
        Scalar::all(0.0),
    )?;
    gray.data_bytes_mut()?.copy_from_slice(frame.gray().as_raw());
    Ok(gray)
}
