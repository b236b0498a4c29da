//! Pure calculation functions for rendition dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! The resize is always driven by the *stored* pixel width of the source: the
//! buffer is scaled to the target width first, then rotated. A sideways
//! photo therefore ends up with the target width as its height.

#[cfg(test)]
use crate::types::Rotation;

/// Height after scaling a `src_w × src_h` image to `target_w`, preserving
/// the aspect ratio.
///
/// Computed as `round(target_w · src_h / src_w)`, never less than one pixel.
///
/// # Examples
/// ```
/// # use photo_renditions::imaging::scaled_height;
/// assert_eq!(scaled_height(800, 600, 600), 450);
/// assert_eq!(scaled_height(3, 2, 100), 67);
/// ```
pub fn scaled_height(src_w: u32, src_h: u32, target_w: u32) -> u32 {
    if src_w == 0 {
        return 1;
    }
    let h = (target_w as f64 * src_h as f64 / src_w as f64).round() as u32;
    h.max(1)
}

/// Swap width and height for quarter turns.
#[cfg(test)]
pub(crate) fn oriented_dimensions(dims: (u32, u32), rotation: Rotation) -> (u32, u32) {
    let (w, h) = dims;
    if rotation.swaps_dimensions() {
        (h, w)
    } else {
        (w, h)
    }
}

/// Final `(width, height)` of a rendition: scale to `target_w`, then rotate.
#[cfg(test)]
pub(crate) fn rendition_dimensions(source: (u32, u32), target_w: u32, rotation: Rotation) -> (u32, u32) {
    let (src_w, src_h) = source;
    oriented_dimensions((target_w, scaled_height(src_w, src_h, target_w)), rotation)
}
