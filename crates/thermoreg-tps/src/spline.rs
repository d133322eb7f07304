use faer::Mat;

use crate::kernel::radial_basis;
use crate::landmarks::{Correspondences, Point2d};
use crate::quality::{inspect_landmarks, FitQuality, FitWarning};
use crate::solver::LinearSolver;
use crate::system::TpsSystem;

/// Solved coefficients of a thin-plate spline.
///
/// Each axis holds `n + 3` values: the `n` kernel weights followed by the
/// affine part `[constant, x-scale, y-scale]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TpsCoefficients {
    wx: Vec<f64>,
    wy: Vec<f64>,
}

impl TpsCoefficients {
    fn from_solution(solution: &Mat<f64>) -> Self {
        let dim = solution.nrows();
        Self {
            wx: (0..dim).map(|i| solution.read(i, 0)).collect(),
            wy: (0..dim).map(|i| solution.read(i, 1)).collect(),
        }
    }

    /// Coefficients of the x mapping.
    pub fn wx(&self) -> &[f64] {
        &self.wx
    }

    /// Coefficients of the y mapping.
    pub fn wy(&self) -> &[f64] {
        &self.wy
    }

    /// Returns true if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.wx.iter().chain(&self.wy).all(|w| w.is_finite())
    }

    /// Number of kernel weights per axis.
    pub fn num_kernel_weights(&self) -> usize {
        self.wx.len() - 3
    }

    /// The kernel weights of both axes as `(x, y)` slices.
    pub fn kernel_weights(&self) -> (&[f64], &[f64]) {
        let n = self.num_kernel_weights();
        (&self.wx[..n], &self.wy[..n])
    }

    /// The affine part as `[[a0, ax, ay]; 2]`, x row first.
    pub fn affine(&self) -> [[f64; 3]; 2] {
        let n = self.num_kernel_weights();
        [
            [self.wx[n], self.wx[n + 1], self.wx[n + 2]],
            [self.wy[n], self.wy[n + 1], self.wy[n + 2]],
        ]
    }
}

/// A fitted thin-plate spline mapping reference coordinates into the moving image.
///
/// The spline is anchored on the target landmarks: evaluating it at a target
/// landmark returns (up to the solve accuracy) the matching source landmark.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinPlateSpline {
    control_points: Vec<Point2d>,
    coefficients: TpsCoefficients,
}

impl ThinPlateSpline {
    /// Fit a spline to a correspondence set.
    ///
    /// Fitting never fails. Degenerate landmark configurations and inaccurate
    /// solves are reported in the returned [`FitQuality`] and logged as warnings.
    ///
    /// # Arguments
    ///
    /// * `correspondences` - The validated landmark pairs.
    /// * `solver` - The solver used for the `(n + 3) x (n + 3)` system.
    /// * `residual_tolerance` - Relative residual above which the fit is flagged.
    ///
    /// # Example
    ///
    /// ```
    /// use thermoreg_tps::{Correspondences, Point2d, SvdSolver, ThinPlateSpline};
    ///
    /// let src = vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0), Point2d::new(0.0, 10.0)];
    /// let dst = vec![Point2d::new(1.0, 2.0), Point2d::new(11.0, 2.0), Point2d::new(1.0, 12.0)];
    /// let correspondences = Correspondences::new(src, dst).unwrap();
    ///
    /// let (spline, quality) = ThinPlateSpline::fit(&correspondences, &SvdSolver::default(), 1e-6);
    /// let p = spline.transform_point(Point2d::new(6.0, 7.0));
    ///
    /// assert!(quality.is_well_conditioned());
    /// assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    /// ```
    pub fn fit<S: LinearSolver + ?Sized>(
        correspondences: &Correspondences,
        solver: &S,
        residual_tolerance: f64,
    ) -> (Self, FitQuality) {
        let system = TpsSystem::build(correspondences);
        log::debug!(
            "fitting tps on {} landmarks with the {} solver",
            system.num_landmarks(),
            solver.name()
        );

        let solution = solver.solve(system.lhs(), system.rhs());
        let residual = system.residual(solution.as_ref());
        let coefficients = TpsCoefficients::from_solution(&solution);

        let mut warnings = inspect_landmarks(correspondences.target());
        if !coefficients.is_finite() {
            warnings.push(FitWarning::NonFiniteCoefficients);
        }
        if residual.is_nan() || residual > residual_tolerance {
            warnings.push(FitWarning::ResidualAboveTolerance {
                residual,
                tolerance: residual_tolerance,
            });
        }

        for warning in &warnings {
            log::warn!("ill-conditioned tps fit: {}", warning);
        }
        log::debug!("tps fit relative residual: {:e}", residual);

        let spline = Self {
            control_points: correspondences.target().to_vec(),
            coefficients,
        };

        (spline, FitQuality { residual, warnings })
    }

    /// The landmarks the kernel terms are centered on.
    pub fn control_points(&self) -> &[Point2d] {
        &self.control_points
    }

    /// The solved coefficients.
    pub fn coefficients(&self) -> &TpsCoefficients {
        &self.coefficients
    }

    /// Map a point of the reference image into the moving image.
    pub fn transform_point(&self, p: Point2d) -> Point2d {
        let [ax, ay] = self.coefficients.affine();
        let (kx, ky) = self.coefficients.kernel_weights();

        let mut x = ax[0] + ax[1] * p.x + ax[2] * p.y;
        let mut y = ay[0] + ay[1] * p.x + ay[2] * p.y;

        for ((c, wx), wy) in self.control_points.iter().zip(kx).zip(ky) {
            let u = radial_basis(p, *c);
            x += wx * u;
            y += wy * u;
        }

        Point2d::new(x, y)
    }

    /// Map a batch of points, see [`ThinPlateSpline::transform_point`].
    pub fn transform_points(&self, points: &[Point2d]) -> Vec<Point2d> {
        points.iter().map(|&p| self.transform_point(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TpsError;
    use crate::solver::{GaussianSolver, SvdSolver};
    use approx::assert_relative_eq;

    fn grid() -> Vec<Point2d> {
        vec![
            Point2d::new(10.0, 10.0),
            Point2d::new(90.0, 10.0),
            Point2d::new(10.0, 90.0),
            Point2d::new(90.0, 90.0),
        ]
    }

    #[test]
    fn interpolates_landmarks() -> Result<(), TpsError> {
        let target = vec![
            Point2d::new(12.0, 8.0),
            Point2d::new(85.0, 14.0),
            Point2d::new(7.0, 93.0),
            Point2d::new(88.0, 91.0),
            Point2d::new(50.0, 45.0),
        ];
        let mut source = target.clone();
        source[4] = Point2d::new(56.0, 40.0);
        let c = Correspondences::new(source.clone(), target.clone())?;

        let (spline, quality) = ThinPlateSpline::fit(&c, &SvdSolver::default(), 1e-6);
        assert!(quality.is_well_conditioned(), "{:?}", quality);
        assert_eq!(spline.control_points(), target.as_slice());

        for (s, t) in source.iter().zip(target.iter()) {
            let p = spline.transform_point(*t);
            assert_relative_eq!(p.x, s.x, epsilon = 1e-6);
            assert_relative_eq!(p.y, s.y, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn affine_map_has_no_bending() -> Result<(), TpsError> {
        // source = 2 * target + (3, -1)
        let target = grid();
        let source: Vec<Point2d> = target
            .iter()
            .map(|p| Point2d::new(2.0 * p.x + 3.0, 2.0 * p.y - 1.0))
            .collect();
        let c = Correspondences::new(source, target)?;

        let (spline, _) = ThinPlateSpline::fit(&c, &GaussianSolver::default(), 1e-6);
        let coeffs = spline.coefficients();
        let (kx, ky) = coeffs.kernel_weights();
        assert_eq!(coeffs.num_kernel_weights(), 4);
        for w in kx.iter().chain(ky) {
            assert!(w.abs() < 1e-9);
        }

        let [ax, ay] = coeffs.affine();
        assert_relative_eq!(ax[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(ax[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(ax[2], 0.0, epsilon = 1e-9);
        assert_relative_eq!(ay[0], -1.0, epsilon = 1e-6);
        assert_relative_eq!(ay[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(ay[2], 2.0, epsilon = 1e-9);

        let mapped = spline.transform_points(&[Point2d::new(0.0, 0.0), Point2d::new(40.0, 70.0)]);
        assert_relative_eq!(mapped[1].x, 83.0, epsilon = 1e-6);
        assert_relative_eq!(mapped[1].y, 139.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn overflowing_landmarks_are_flagged() -> Result<(), TpsError> {
        // r^2 overflows f64 between the far landmarks
        let points = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(1e160, 0.0),
            Point2d::new(0.0, 1e160),
            Point2d::new(5.0, 5.0),
        ];
        let c = Correspondences::new(points.clone(), points)?;
        let (spline, quality) = ThinPlateSpline::fit(&c, &SvdSolver::default(), 1e-6);

        assert!(quality.residual.is_nan());
        assert!(!spline.coefficients().is_finite());
        assert!(quality.warnings.contains(&FitWarning::NonFiniteCoefficients));
        assert!(quality
            .warnings
            .iter()
            .any(|w| matches!(w, FitWarning::ResidualAboveTolerance { residual, .. } if residual.is_nan())));
        Ok(())
    }

    #[test]
    fn single_landmark_is_finite() -> Result<(), TpsError> {
        let c = Correspondences::new(vec![Point2d::new(4.0, 4.0)], vec![Point2d::new(2.0, 2.0)])?;
        let (spline, quality) = ThinPlateSpline::fit(&c, &SvdSolver::default(), 1e-6);

        assert!(quality.warnings.contains(&FitWarning::TooFewLandmarks(1)));
        let p = spline.transform_point(Point2d::new(7.0, 3.0));
        assert!(p.is_finite());
        Ok(())
    }
}
