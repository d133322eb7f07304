//! Landmark based image registration with thin-plate splines.
//!
//! Re-exports the workspace crates under short module names.

#[doc(inline)]
pub use thermoreg_image as image;

#[doc(inline)]
pub use thermoreg_imgproc as imgproc;

#[doc(inline)]
pub use thermoreg_tps as tps;
