use crate::landmarks::Point2d;

/// The thin-plate radial basis function `U(r) = r^2 * ln(r)`.
///
/// `U(0)` is defined as `0`, its limit, so a control point contributes nothing
/// at its own location. `r` is a Euclidean distance and therefore never negative.
///
/// # Example
///
/// ```
/// use thermoreg_tps::kernel::tps_kernel;
///
/// assert_eq!(tps_kernel(0.0), 0.0);
/// assert_eq!(tps_kernel(1.0), 0.0);
/// assert!((tps_kernel(std::f64::consts::E) - std::f64::consts::E.powi(2)).abs() < 1e-12);
/// ```
pub fn tps_kernel(r: f64) -> f64 {
    if r == 0.0 {
        0.0
    } else {
        r * r * r.ln()
    }
}

/// Evaluate the kernel on the distance between two points.
pub fn radial_basis(a: Point2d, b: Point2d) -> f64 {
    tps_kernel(a.distance(b))
}
