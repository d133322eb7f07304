#![deny(missing_docs)]
//! Thin-plate-spline registration of images from landmark correspondences.
//!
//! A warp is computed in two phases. Fitting builds the `(n + 3) x (n + 3)`
//! TPS system from the destination landmarks and solves it for the x and y
//! coefficient vectors. Evaluation then maps every output pixel back into the
//! source image through the fitted spline and resamples it bilinearly.
//!
//! # Example
//!
//! ```
//! use thermoreg_image::Image;
//! use thermoreg_tps::{Point2d, TpsWarper, WarpConfig};
//!
//! let source = Image::<u8, 4>::from_size_pixel([10, 10].into(), [255, 0, 0, 255]);
//! let src = [(0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (10.0, 10.0)].map(Point2d::from);
//! let dst = [(0.0, 0.0), (0.0, 20.0), (20.0, 0.0), (20.0, 20.0)].map(Point2d::from);
//!
//! let warper = TpsWarper::new(WarpConfig::default());
//! let output = warper.warp(&source, &src, &dst, [20, 20].into()).unwrap();
//!
//! assert_eq!(output.image.size().width, 20);
//! assert_eq!(output.image.pixel(19, 19).unwrap(), &[255, 0, 0, 255]);
//! assert!(output.quality.is_well_conditioned());
//! ```

/// Warp configuration.
pub mod config;

/// Error types for the tps module.
pub mod error;

/// The thin-plate radial basis function.
pub mod kernel;

/// Landmark points and correspondence sets.
pub mod landmarks;

/// Advisory fit quality report.
pub mod quality;

/// Linear solvers for the TPS system.
pub mod solver;

/// Fitted thin-plate splines.
pub mod spline;

/// Assembly of the TPS linear system.
pub mod system;

/// Image warping through a fitted spline.
pub mod warp;

pub use crate::config::WarpConfig;
pub use crate::error::{InvalidInput, TpsError};
pub use crate::landmarks::{Correspondences, Point2d};
pub use crate::quality::{FitQuality, FitWarning};
pub use crate::solver::{GaussianSolver, LinearSolver, SvdSolver};
pub use crate::spline::{ThinPlateSpline, TpsCoefficients};
pub use crate::system::TpsSystem;
pub use crate::warp::{warp_image, TpsWarper, WarpOutput, WarpRequest};
