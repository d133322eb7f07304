#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image blending module.
pub mod blend;

/// utilities for interpolation.
pub mod interpolation;

/// Row-parallel execution helpers.
pub mod parallel;

/// utility functions for resizing images.
pub mod resize;
