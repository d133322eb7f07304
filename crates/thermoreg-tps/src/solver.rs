use faer::{ColRef, Mat, MatRef};

/// Solves a square system against several right-hand sides.
///
/// Implementations must never fail on a singular or near-singular matrix:
/// duplicated or collinear landmarks make the TPS system rank deficient, and
/// a finite best-effort solution is still expected.
pub trait LinearSolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Solve `lhs * x = rhs` column by column.
    ///
    /// # Arguments
    ///
    /// * `lhs` - A square `m x m` matrix.
    /// * `rhs` - An `m x k` matrix of right-hand sides.
    ///
    /// # Returns
    ///
    /// The `m x k` solution matrix.
    fn solve(&self, lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>) -> Mat<f64>;
}

impl<S: LinearSolver + ?Sized> LinearSolver for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>) -> Mat<f64> {
        (**self).solve(lhs, rhs)
    }
}

/// Minimum-norm least-squares solver based on the singular value decomposition.
///
/// Singular values below `cutoff * sigma_max` are treated as zero, which yields
/// the pseudo-inverse solution for rank deficient systems. The solution is then
/// polished with [`SvdSolver::REFINEMENT_STEPS`] rounds of iterative refinement
/// through the same pseudo-inverse, which keeps it minimum-norm.
///
/// A system with a non-finite entry yields an all-NaN solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdSolver {
    cutoff: f64,
}

impl SvdSolver {
    /// Default relative cutoff for singular values.
    pub const DEFAULT_CUTOFF: f64 = 1e-12;

    /// Rounds of iterative refinement applied after the pseudo-inverse solve.
    pub const REFINEMENT_STEPS: usize = 2;

    /// Create a solver with the given relative singular value cutoff.
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    /// The relative singular value cutoff.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl Default for SvdSolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CUTOFF)
    }
}

impl LinearSolver for SvdSolver {
    fn name(&self) -> &'static str {
        "svd"
    }

    fn solve(&self, lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>) -> Mat<f64> {
        let (m, n, k) = (lhs.nrows(), lhs.ncols(), rhs.ncols());
        if m == 0 {
            return Mat::<f64>::zeros(n, k);
        }

        // the decomposition is undefined on non-finite input
        if !all_finite(lhs) || !all_finite(rhs) {
            log::debug!("svd solver got a non-finite system");
            return Mat::from_fn(n, k, |_, _| f64::NAN);
        }

        let svd = lhs.svd();
        let pinv = PseudoInverse {
            u: svd.u(),
            s: svd.s_diagonal(),
            v: svd.v(),
            cutoff: self.cutoff,
        };

        let mut x = pinv.apply(rhs);

        // the kernel weights of an exactly affine map must come out at zero,
        // r^2 ln r amplifies any rounding noise left in them far from the landmarks
        for _ in 0..Self::REFINEMENT_STEPS {
            let r = residual(lhs, rhs, x.as_ref());
            let dx = pinv.apply(r.as_ref());
            for c in 0..k {
                for i in 0..n {
                    x.write(i, c, x.read(i, c) + dx.read(i, c));
                }
            }
        }

        x
    }
}

/// Truncated pseudo-inverse `V * diag(1 / s) * U^T` of a decomposed matrix.
struct PseudoInverse<'a> {
    u: MatRef<'a, f64>,
    s: ColRef<'a, f64>,
    v: MatRef<'a, f64>,
    cutoff: f64,
}

impl PseudoInverse<'_> {
    fn apply(&self, rhs: MatRef<'_, f64>) -> Mat<f64> {
        let (m, k) = (self.u.nrows(), rhs.ncols());
        let mut x = Mat::<f64>::zeros(self.v.nrows(), k);

        let rank = self.s.nrows();
        let s_max = (0..rank).map(|i| self.s.read(i)).fold(0.0f64, f64::max);
        let threshold = self.cutoff * s_max;

        // singular values at or below the threshold are dropped
        for i in 0..rank {
            let sigma = self.s.read(i);
            if sigma <= threshold || sigma == 0.0 {
                continue;
            }
            for c in 0..k {
                let mut proj = 0.0;
                for r in 0..m {
                    proj += self.u.read(r, i) * rhs.read(r, c);
                }
                let scale = proj / sigma;
                for r in 0..self.v.nrows() {
                    x.write(r, c, x.read(r, c) + scale * self.v.read(r, i));
                }
            }
        }

        x
    }
}

/// `rhs - lhs * x`, column by column.
fn residual(lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>, x: MatRef<'_, f64>) -> Mat<f64> {
    Mat::from_fn(rhs.nrows(), rhs.ncols(), |i, c| {
        let mut acc = rhs.read(i, c);
        for j in 0..lhs.ncols() {
            acc -= lhs.read(i, j) * x.read(j, c);
        }
        acc
    })
}

fn all_finite(mat: MatRef<'_, f64>) -> bool {
    (0..mat.nrows()).all(|i| (0..mat.ncols()).all(|j| mat.read(i, j).is_finite()))
}

/// Gaussian elimination with partial pivoting.
///
/// Columns whose best pivot is below `tolerance * max|lhs|` are treated as
/// free and set to zero, so rank deficient systems still produce a finite
/// basic solution. Unlike [`SvdSolver`] the result is not the minimum-norm one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSolver {
    tolerance: f64,
}

impl GaussianSolver {
    /// Default relative pivot tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 1e-12;

    /// Create a solver with the given relative pivot tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Default for GaussianSolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOLERANCE)
    }
}

impl LinearSolver for GaussianSolver {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn solve(&self, lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>) -> Mat<f64> {
        let n = lhs.nrows();
        let k = rhs.ncols();
        let width = n + k;

        // augmented row-major copy [lhs | rhs]
        let mut a = vec![0.0f64; n * width];
        let mut max_abs = 0.0f64;
        for r in 0..n {
            for c in 0..n {
                let v = lhs.read(r, c);
                max_abs = max_abs.max(v.abs());
                a[r * width + c] = v;
            }
            for c in 0..k {
                a[r * width + n + c] = rhs.read(r, c);
            }
        }
        let threshold = self.tolerance * max_abs;

        // forward elimination into row echelon form
        let mut pivots: Vec<(usize, usize)> = Vec::with_capacity(n);
        let mut row = 0;
        for col in 0..n {
            if row == n {
                break;
            }

            let (best, best_abs) = (row..n)
                .map(|r| (r, a[r * width + col].abs()))
                .fold((row, -1.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

            if best_abs <= threshold || best_abs == 0.0 {
                continue;
            }

            if best != row {
                for c in 0..width {
                    a.swap(row * width + c, best * width + c);
                }
            }

            let pivot = a[row * width + col];
            for r in (row + 1)..n {
                let factor = a[r * width + col] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for c in col..width {
                    a[r * width + c] -= factor * a[row * width + c];
                }
            }

            pivots.push((row, col));
            row += 1;
        }

        // back substitution, free variables stay zero
        let mut x = Mat::<f64>::zeros(n, k);
        for &(r, col) in pivots.iter().rev() {
            let pivot = a[r * width + col];
            for c in 0..k {
                let mut acc = a[r * width + n + c];
                for j in (col + 1)..n {
                    acc -= a[r * width + j] * x.read(j, c);
                }
                x.write(col, c, acc / pivot);
            }
        }

        x
    }
}
