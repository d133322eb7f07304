use crate::landmarks::Point2d;

/// Minimum number of non-collinear landmarks for a well-posed affine term.
pub const MIN_WELL_POSED_LANDMARKS: usize = 3;

/// Landmarks closer than this many pixels are considered coincident.
const COINCIDENT_TOLERANCE: f64 = 1e-9;

/// Relative perpendicular spread below which a landmark set is considered collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Reasons a fit may be ill-conditioned.
///
/// None of these stop a warp: the minimum-norm solve is always defined, but
/// the registration quality is unspecified and callers may want to warn.
#[derive(Debug, Clone, PartialEq)]
pub enum FitWarning {
    /// Fewer than three landmarks were given.
    TooFewLandmarks(usize),

    /// All target landmarks lie on a single line.
    CollinearLandmarks,

    /// Two target landmarks coincide.
    DuplicateLandmarks(usize, usize),

    /// The solver produced NaN or infinite coefficients.
    NonFiniteCoefficients,

    /// The solution does not satisfy the system within the tolerance.
    ResidualAboveTolerance {
        /// The relative residual of the solve.
        residual: f64,
        /// The configured tolerance.
        tolerance: f64,
    },
}

impl std::fmt::Display for FitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FitWarning::TooFewLandmarks(n) => write!(
                f,
                "only {} landmarks, at least {} are needed for a well-posed affine term",
                n, MIN_WELL_POSED_LANDMARKS
            ),
            FitWarning::CollinearLandmarks => write!(f, "landmarks are collinear"),
            FitWarning::DuplicateLandmarks(i, j) => {
                write!(f, "landmarks {} and {} coincide", i, j)
            }
            FitWarning::NonFiniteCoefficients => {
                write!(f, "solution has non-finite coefficients")
            }
            FitWarning::ResidualAboveTolerance {
                residual,
                tolerance,
            } => write!(
                f,
                "relative residual {:e} exceeds tolerance {:e}",
                residual, tolerance
            ),
        }
    }
}

/// Advisory report attached to every fit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitQuality {
    /// Relative residual of the solve, see [`crate::TpsSystem::residual`].
    pub residual: f64,
    /// Every condition detected on the landmarks or the solution.
    pub warnings: Vec<FitWarning>,
}

impl FitQuality {
    /// Returns true when no warning was raised.
    pub fn is_well_conditioned(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Inspect the geometry of the landmarks the system is built on.
pub(crate) fn inspect_landmarks(points: &[Point2d]) -> Vec<FitWarning> {
    let mut warnings = Vec::new();
    let n = points.len();

    if n < MIN_WELL_POSED_LANDMARKS {
        warnings.push(FitWarning::TooFewLandmarks(n));
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if points[i].distance(points[j]) <= COINCIDENT_TOLERANCE {
                warnings.push(FitWarning::DuplicateLandmarks(i, j));
            }
        }
    }

    if n >= MIN_WELL_POSED_LANDMARKS && is_collinear(points) {
        warnings.push(FitWarning::CollinearLandmarks);
    }

    warnings
}

/// Returns true if all points lie on one line (or coincide).
fn is_collinear(points: &[Point2d]) -> bool {
    let Some(&origin) = points.first() else {
        return true;
    };

    let (far, extent) = points
        .iter()
        .map(|&p| (p, origin.distance(p)))
        .fold((origin, 0.0f64), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

    if extent <= COINCIDENT_TOLERANCE {
        return true;
    }

    let (dx, dy) = (far.x - origin.x, far.y - origin.y);
    let max_offset = points
        .iter()
        .map(|p| ((p.x - origin.x) * dy - (p.y - origin.y) * dx).abs() / extent)
        .fold(0.0f64, f64::max);

    max_offset <= COLLINEAR_TOLERANCE * extent.max(1.0)
}
