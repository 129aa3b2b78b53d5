// THEORY:
// Raw color masks are noisy: paint wears thin, so marker outlines arrive broken into
// fragments, and stray reflections leave isolated specks. Two classic binary
// morphology passes fix this, and their order matters:
//
// 1.  **Closing** (dilate, then erode) bridges small gaps, reconnecting a broken
//     outline into one component while leaving its thickness unchanged.
// 2.  **Opening** (erode, then dilate) then deletes anything thinner than the
//     structuring element, which removes the specks.
//
// Opening first would erase thin, broken outline fragments before closing had a
// chance to join them.
//
// The structuring element is a `size` x `size` square, which is a chessboard (L∞)
// ball of radius `size / 2`. Pixels outside the frame never participate: erosion
// does not eat inwards from the frame edge and dilation does not grow outwards
// from it.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Chessboard radius of a `size` x `size` square kernel.
fn radius(size: u32) -> u8 {
    u8::try_from(size / 2).unwrap_or(u8::MAX)
}

/// Dilate then erode: joins gaps narrower than the kernel.
pub fn close(mask: &GrayImage, size: u32) -> GrayImage {
    morphology::close(mask, Norm::LInf, radius(size))
}

/// Erode then dilate: removes blobs thinner than the kernel.
pub fn open(mask: &GrayImage, size: u32) -> GrayImage {
    morphology::open(mask, Norm::LInf, radius(size))
}

/// The marker cleanup used by the detector: closing followed by opening.
pub fn clean(mask: &GrayImage, size: u32) -> GrayImage {
    open(&close(mask, size), size)
}
