//! Pixel interpolation methods for image transformations.
//!
//! Every sampler in this module follows the same edge-clamp boundary policy:
//! coordinates are clamped into `[0, width - 1] x [0, height - 1]` before the
//! neighbouring pixels are looked up, so a sample never reads outside the
//! buffer and never wraps around.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels

mod bilinear;
pub(crate) mod interpolate;
mod nearest;

pub use bilinear::bilinear_interpolation;
pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use nearest::nearest_neighbor_interpolation;
