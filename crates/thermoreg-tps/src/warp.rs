use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use thermoreg_image::{Image, ImageDtype, ImageSize};
use thermoreg_imgproc::interpolation::bilinear_interpolation;
use thermoreg_imgproc::parallel::par_iter_rows_indexed;

use crate::config::WarpConfig;
use crate::error::{InvalidInput, TpsError};
use crate::landmarks::{Correspondences, Point2d};
use crate::quality::FitQuality;
use crate::solver::{LinearSolver, SvdSolver};
use crate::spline::ThinPlateSpline;

/// A validated warp request.
///
/// Borrows the moving image and owns the landmark pairs. All preconditions
/// of a warp are checked here, before any computation takes place.
#[derive(Debug, Clone)]
pub struct WarpRequest<'a, T, const C: usize> {
    source: &'a Image<T, C>,
    correspondences: Correspondences,
    output_size: ImageSize,
}

impl<'a, T, const C: usize> WarpRequest<'a, T, C> {
    /// Create a new warp request.
    ///
    /// # Arguments
    ///
    /// * `source` - The moving image to sample from.
    /// * `source_landmarks` - Landmarks in the moving image.
    /// * `target_landmarks` - Matching landmarks in the reference image.
    /// * `output_size` - The size of the warped image.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::InvalidInput`] if the landmark sets are invalid,
    /// the output size has a zero dimension or the source image is empty.
    pub fn new(
        source: &'a Image<T, C>,
        source_landmarks: &[Point2d],
        target_landmarks: &[Point2d],
        output_size: ImageSize,
    ) -> Result<Self, TpsError> {
        let correspondences = Correspondences::from_slices(source_landmarks, target_landmarks)?;

        if output_size.is_empty() {
            return Err(InvalidInput::InvalidOutputSize(output_size).into());
        }

        if source.size().is_empty() {
            return Err(InvalidInput::EmptySourceImage.into());
        }

        Ok(Self {
            source,
            correspondences,
            output_size,
        })
    }

    /// The moving image.
    pub fn source(&self) -> &Image<T, C> {
        self.source
    }

    /// The landmark pairs.
    pub fn correspondences(&self) -> &Correspondences {
        &self.correspondences
    }

    /// The size of the warped image.
    pub fn output_size(&self) -> ImageSize {
        self.output_size
    }
}

/// The result of a warp.
#[derive(Debug, Clone)]
pub struct WarpOutput<T, const C: usize> {
    /// The warped image, aligned to the reference.
    pub image: Image<T, C>,
    /// Advisory report on the fit.
    pub quality: FitQuality,
    /// The fitted spline, mapping reference pixels into the moving image.
    pub spline: ThinPlateSpline,
}

/// Warps images onto a reference frame with thin-plate splines.
///
/// The solver is chosen once at construction and reused for every warp.
#[derive(Debug, Clone)]
pub struct TpsWarper<S = SvdSolver> {
    config: WarpConfig,
    solver: S,
}

impl TpsWarper<SvdSolver> {
    /// Create a warper using the SVD solver with the configured cutoff.
    pub fn new(config: WarpConfig) -> Self {
        let solver = SvdSolver::new(config.singular_value_cutoff);
        Self { config, solver }
    }
}

impl Default for TpsWarper<SvdSolver> {
    fn default() -> Self {
        Self::new(WarpConfig::default())
    }
}

impl<S: LinearSolver> TpsWarper<S> {
    /// Create a warper with an explicit solver.
    ///
    /// `config.singular_value_cutoff` only applies to the default solver and
    /// is ignored here.
    pub fn with_solver(config: WarpConfig, solver: S) -> Self {
        Self { config, solver }
    }

    /// The warp configuration.
    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    /// The linear solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Fit a spline without warping any image.
    pub fn fit(&self, correspondences: &Correspondences) -> (ThinPlateSpline, FitQuality) {
        ThinPlateSpline::fit(correspondences, &self.solver, self.config.residual_tolerance)
    }

    /// Warp `source` so that `source_landmarks` land on `target_landmarks`.
    ///
    /// # Arguments
    ///
    /// * `source` - The moving image.
    /// * `source_landmarks` - Landmarks in the moving image, in pixels.
    /// * `target_landmarks` - Matching landmarks in the reference frame, in pixels.
    /// * `output_size` - The size of the reference frame.
    ///
    /// # Returns
    ///
    /// The warped image of exactly `output_size` along with the fit report.
    ///
    /// # Errors
    ///
    /// Only invalid inputs or configuration are errors. Degenerate landmarks
    /// still produce an image, flagged in [`WarpOutput::quality`].
    pub fn warp<T: ImageDtype, const C: usize>(
        &self,
        source: &Image<T, C>,
        source_landmarks: &[Point2d],
        target_landmarks: &[Point2d],
        output_size: ImageSize,
    ) -> Result<WarpOutput<T, C>, TpsError> {
        let request = WarpRequest::new(source, source_landmarks, target_landmarks, output_size)?;
        self.execute(&request, None)
    }

    /// Warp a request, checking `cancel` between output rows.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::Cancelled`] if the flag was set before the last row
    /// was computed. The partial image is dropped. A flag raised after every
    /// row was written does not discard the result.
    pub fn warp_cancellable<T: ImageDtype, const C: usize>(
        &self,
        request: &WarpRequest<'_, T, C>,
        cancel: &AtomicBool,
    ) -> Result<WarpOutput<T, C>, TpsError> {
        self.execute(request, Some(cancel))
    }

    /// Warp a validated request.
    pub fn execute<T: ImageDtype, const C: usize>(
        &self,
        request: &WarpRequest<'_, T, C>,
        cancel: Option<&AtomicBool>,
    ) -> Result<WarpOutput<T, C>, TpsError> {
        self.config.validate()?;

        let is_cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));
        if is_cancelled() {
            return Err(TpsError::Cancelled);
        }

        let start = Instant::now();
        let (spline, quality) = self.fit(request.correspondences());
        log::debug!("tps fit took {:?}", start.elapsed());

        let source = request.source();
        let mut image = Image::from_size_val(request.output_size(), T::default())?;

        let skipped = AtomicBool::new(false);
        let start = Instant::now();
        par_iter_rows_indexed(&mut image, self.config.strategy, |y, row| {
            if is_cancelled() {
                skipped.store(true, Ordering::Relaxed);
                return;
            }
            for (x, pixel) in row.chunks_exact_mut(C).enumerate() {
                let p = spline.transform_point(Point2d::new(x as f64, y as f64));
                let values = bilinear_interpolation(source, p.x, p.y);
                for (dst, val) in pixel.iter_mut().zip(values) {
                    *dst = T::from_f64(val);
                }
            }
        })?;

        if skipped.load(Ordering::Relaxed) {
            log::debug!("tps warp cancelled after {:?}", start.elapsed());
            return Err(TpsError::Cancelled);
        }

        log::debug!(
            "tps warp of {} evaluated in {:?}",
            request.output_size(),
            start.elapsed()
        );

        Ok(WarpOutput {
            image,
            quality,
            spline,
        })
    }
}

/// Warp an image with the default configuration and the SVD solver.
///
/// Shorthand for [`TpsWarper::default`] followed by [`TpsWarper::warp`].
pub fn warp_image<T: ImageDtype, const C: usize>(
    source: &Image<T, C>,
    source_landmarks: &[Point2d],
    target_landmarks: &[Point2d],
    output_size: ImageSize,
) -> Result<WarpOutput<T, C>, TpsError> {
    TpsWarper::default().warp(source, source_landmarks, target_landmarks, output_size)
}
