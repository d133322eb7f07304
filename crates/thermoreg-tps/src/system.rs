use faer::{ColRef, Mat, MatRef};

use crate::kernel::radial_basis;
use crate::landmarks::Correspondences;

/// The linear system `L * w = v` of a thin-plate spline fit.
///
/// The radial part of `L` is built on the **target** landmarks so that the
/// solution maps reference (output) coordinates back to the moving image:
///
/// ```text
///     | K   P |        K[i][j] = U(|t_i - t_j|)
/// L = |       |        P[i]    = [1, t_i.x, t_i.y]
///     | P^T 0 |
/// ```
///
/// The right-hand side holds one column per output axis,
/// `[s_1.x, ..., s_n.x, 0, 0, 0]` and `[s_1.y, ..., s_n.y, 0, 0, 0]`.
#[derive(Debug, Clone)]
pub struct TpsSystem {
    lhs: Mat<f64>,
    rhs: Mat<f64>,
}

impl TpsSystem {
    /// Assemble the system from a correspondence set.
    pub fn build(correspondences: &Correspondences) -> Self {
        let target = correspondences.target();
        let source = correspondences.source();
        let n = target.len();
        let dim = n + 3;

        let mut lhs = Mat::<f64>::zeros(dim, dim);
        let mut rhs = Mat::<f64>::zeros(dim, 2);

        for i in 0..n {
            // K is symmetric with a zero diagonal
            for j in (i + 1)..n {
                let k = radial_basis(target[i], target[j]);
                lhs.write(i, j, k);
                lhs.write(j, i, k);
            }

            lhs.write(i, n, 1.0);
            lhs.write(i, n + 1, target[i].x);
            lhs.write(i, n + 2, target[i].y);
            lhs.write(n, i, 1.0);
            lhs.write(n + 1, i, target[i].x);
            lhs.write(n + 2, i, target[i].y);

            rhs.write(i, 0, source[i].x);
            rhs.write(i, 1, source[i].y);
        }

        Self { lhs, rhs }
    }

    /// Number of landmarks the system was built from.
    pub fn num_landmarks(&self) -> usize {
        self.lhs.nrows() - 3
    }

    /// The `(n + 3) x (n + 3)` system matrix.
    pub fn lhs(&self) -> MatRef<'_, f64> {
        self.lhs.as_ref()
    }

    /// The `(n + 3) x 2` right-hand side, x column first.
    pub fn rhs(&self) -> MatRef<'_, f64> {
        self.rhs.as_ref()
    }

    /// Right-hand side of the x channel.
    pub fn vx(&self) -> ColRef<'_, f64> {
        self.rhs.col(0)
    }

    /// Right-hand side of the y channel.
    pub fn vy(&self) -> ColRef<'_, f64> {
        self.rhs.col(1)
    }

    /// Relative residual of a candidate solution.
    ///
    /// Computes `max_c |L * w_c - v_c| / max(|v_c|, 1)` over both columns.
    /// A non-finite solution yields NaN.
    pub fn residual(&self, solution: MatRef<'_, f64>) -> f64 {
        let dim = self.lhs.nrows();
        let mut worst = 0.0f64;

        for c in 0..self.rhs.ncols() {
            let mut err_sq = 0.0;
            let mut norm_sq = 0.0;
            for i in 0..dim {
                let mut acc = 0.0;
                for j in 0..dim {
                    acc += self.lhs.read(i, j) * solution.read(j, c);
                }
                let v = self.rhs.read(i, c);
                err_sq += (acc - v) * (acc - v);
                norm_sq += v * v;
            }
            let ratio = err_sq.sqrt() / norm_sq.sqrt().max(1.0);
            if ratio.is_nan() {
                return f64::NAN;
            }
            worst = worst.max(ratio);
        }

        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TpsError;
    use crate::kernel::tps_kernel;
    use crate::landmarks::Point2d;
    use approx::assert_relative_eq;

    #[test]
    fn build_layout() -> Result<(), TpsError> {
        let source = vec![
            Point2d::new(1.0, 2.0),
            Point2d::new(3.0, 4.0),
            Point2d::new(5.0, 7.0),
        ];
        let target = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(3.0, 4.0),
            Point2d::new(0.0, 2.0),
        ];
        let system = TpsSystem::build(&Correspondences::new(source, target)?);
        let l = system.lhs();

        assert_eq!(system.num_landmarks(), 3);
        assert_eq!((l.nrows(), l.ncols()), (6, 6));

        // kernel block
        for i in 0..3 {
            assert_eq!(l.read(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(l.read(i, j), l.read(j, i));
            }
        }
        assert_relative_eq!(l.read(0, 1), tps_kernel(5.0), epsilon = 1e-12);
        assert_relative_eq!(l.read(0, 2), tps_kernel(2.0), epsilon = 1e-12);

        // affine rows and columns
        assert_eq!(l.read(1, 3), 1.0);
        assert_eq!(l.read(1, 4), 3.0);
        assert_eq!(l.read(1, 5), 4.0);
        assert_eq!(l.read(3, 2), 1.0);
        assert_eq!(l.read(4, 2), 0.0);
        assert_eq!(l.read(5, 2), 2.0);

        // zero corner
        for i in 3..6 {
            for j in 3..6 {
                assert_eq!(l.read(i, j), 0.0);
            }
        }

        // right-hand sides carry the source coordinates
        let vx: Vec<f64> = (0..6).map(|i| system.vx().read(i)).collect();
        let vy: Vec<f64> = (0..6).map(|i| system.vy().read(i)).collect();
        assert_eq!(vx, vec![1.0, 3.0, 5.0, 0.0, 0.0, 0.0]);
        assert_eq!(vy, vec![2.0, 4.0, 7.0, 0.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn residual_of_exact_solution() -> Result<(), TpsError> {
        // identity mapping: kernel weights zero, affine = [0, 1, 0] and [0, 0, 1]
        let points = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(0.0, 10.0),
        ];
        let system = TpsSystem::build(&Correspondences::new(points.clone(), points)?);
        let mut w = Mat::<f64>::zeros(6, 2);
        w.write(4, 0, 1.0);
        w.write(5, 1, 1.0);
        assert_eq!(system.residual(w.as_ref()), 0.0);

        let zero = Mat::<f64>::zeros(6, 2);
        assert!(system.residual(zero.as_ref()) > 0.9);
        Ok(())
    }

    #[test]
    fn residual_of_non_finite_solution() -> Result<(), TpsError> {
        let points = vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(0.0, 10.0),
        ];
        let system = TpsSystem::build(&Correspondences::new(points.clone(), points)?);

        let nan = Mat::from_fn(6, 2, |_, _| f64::NAN);
        assert!(system.residual(nan.as_ref()).is_nan());

        // a single bad column is enough
        let mut w = Mat::<f64>::zeros(6, 2);
        w.write(4, 0, 1.0);
        w.write(2, 1, f64::NAN);
        assert!(system.residual(w.as_ref()).is_nan());
        Ok(())
    }
}
