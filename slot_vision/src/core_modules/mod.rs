pub mod boundary_detector;
pub mod color_mask;
pub mod contour;
pub mod frame;
pub mod hsv;
pub mod morphology;
pub mod occupancy_classifier;
pub mod region;
pub mod threshold;
pub mod utils;
