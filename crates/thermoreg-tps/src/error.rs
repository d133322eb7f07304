use thermoreg_image::{ImageError, ImageSize};
use thermoreg_imgproc::parallel::ParallelError;

/// Reasons a warp request is rejected before any computation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// The two landmark sets have different lengths.
    #[error("source has {0} landmarks but target has {1}")]
    LandmarkCountMismatch(usize, usize),

    /// No landmarks were given.
    #[error("landmark sets are empty")]
    EmptyLandmarks,

    /// A landmark coordinate is NaN or infinite.
    #[error("landmark {0} has a non-finite coordinate")]
    NonFiniteLandmark(usize),

    /// The requested output has a zero dimension.
    #[error("output size must be positive, got {0}")]
    InvalidOutputSize(ImageSize),

    /// The source image has no pixels to sample from.
    #[error("source image is empty")]
    EmptySourceImage,
}

/// An error type for the tps module.
#[derive(thiserror::Error, Debug)]
pub enum TpsError {
    /// The request was rejected by validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The warp was cancelled between rows.
    #[error("warp cancelled")]
    Cancelled,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from the image container.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error from the row scheduler.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// The configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
