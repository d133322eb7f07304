use serde::{Deserialize, Serialize};
use thermoreg_image::ImageSize;

use crate::error::{InvalidInput, TpsError};

/// A point in the pixel space of an image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2d {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2d {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point2d) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns true if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2d {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<(f64, f64)> for Point2d {
    fn from(p: (f64, f64)) -> Self {
        Self::new(p.0, p.1)
    }
}

/// Ordered pairs of corresponding landmarks.
///
/// The i-th source point and the i-th target point mark the same location in
/// the moving and the reference image. Both sequences always have the same,
/// non-zero length and only contain finite coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondences {
    source: Vec<Point2d>,
    target: Vec<Point2d>,
}

impl Correspondences {
    /// Create a validated correspondence set.
    ///
    /// # Arguments
    ///
    /// * `source` - Landmarks in the moving image.
    /// * `target` - Landmarks in the reference image, in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] if the lengths differ, the sets are empty or a
    /// coordinate is not finite.
    pub fn new(source: Vec<Point2d>, target: Vec<Point2d>) -> Result<Self, TpsError> {
        if source.len() != target.len() {
            return Err(InvalidInput::LandmarkCountMismatch(source.len(), target.len()).into());
        }

        if source.is_empty() {
            return Err(InvalidInput::EmptyLandmarks.into());
        }

        if let Some(i) = source
            .iter()
            .zip(target.iter())
            .position(|(s, t)| !s.is_finite() || !t.is_finite())
        {
            return Err(InvalidInput::NonFiniteLandmark(i).into());
        }

        Ok(Self { source, target })
    }

    /// Create a validated correspondence set by copying two slices.
    pub fn from_slices(source: &[Point2d], target: &[Point2d]) -> Result<Self, TpsError> {
        Self::new(source.to_vec(), target.to_vec())
    }

    /// Number of landmark pairs.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Always false, a correspondence set holds at least one pair.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Landmarks in the moving image.
    pub fn source(&self) -> &[Point2d] {
        &self.source
    }

    /// Landmarks in the reference image.
    pub fn target(&self) -> &[Point2d] {
        &self.target
    }

    /// Iterate over `(source, target)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (Point2d, Point2d)> + '_ {
        self.source.iter().copied().zip(self.target.iter().copied())
    }
}

/// Convert points given as image fractions in `[0, 1]` into pixel coordinates.
///
/// `x_pixel = x * width`, `y_pixel = y * height`.
///
/// # Example
///
/// ```
/// use thermoreg_tps::Point2d;
/// use thermoreg_tps::landmarks::denormalize;
///
/// let points = denormalize(&[Point2d::new(0.5, 0.25)], [640, 480].into());
/// assert_eq!(points, vec![Point2d::new(320.0, 120.0)]);
/// ```
pub fn denormalize(points: &[Point2d], size: ImageSize) -> Vec<Point2d> {
    let (w, h) = (size.width as f64, size.height as f64);
    points
        .iter()
        .map(|p| Point2d::new(p.x * w, p.y * h))
        .collect()
}

/// Convert pixel coordinates into image fractions, the inverse of [`denormalize`].
///
/// Coordinates along an empty dimension map to `0`.
pub fn normalize(points: &[Point2d], size: ImageSize) -> Vec<Point2d> {
    let scale = |v: f64, extent: usize| {
        if extent == 0 {
            0.0
        } else {
            v / extent as f64
        }
    };
    points
        .iter()
        .map(|p| Point2d::new(scale(p.x, size.width), scale(p.y, size.height)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2d> {
        vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(0.0, 10.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(10.0, 10.0),
        ]
    }

    #[test]
    fn correspondences_valid() -> Result<(), TpsError> {
        let c = Correspondences::new(square(), square())?;
        assert_eq!(c.len(), 4);
        assert!(!c.is_empty());
        assert_eq!(c.pairs().count(), 4);
        assert_eq!(c.source()[3], Point2d::new(10.0, 10.0));
        Ok(())
    }

    #[test]
    fn correspondences_count_mismatch() {
        let res = Correspondences::new(square(), square()[..3].to_vec());
        assert!(matches!(
            res,
            Err(TpsError::InvalidInput(InvalidInput::LandmarkCountMismatch(4, 3)))
        ));
    }

    #[test]
    fn correspondences_empty() {
        let res = Correspondences::new(vec![], vec![]);
        assert!(matches!(
            res,
            Err(TpsError::InvalidInput(InvalidInput::EmptyLandmarks))
        ));
    }

    #[test]
    fn correspondences_non_finite() {
        let mut target = square();
        target[2].y = f64::NAN;
        let res = Correspondences::new(square(), target);
        assert!(matches!(
            res,
            Err(TpsError::InvalidInput(InvalidInput::NonFiniteLandmark(2)))
        ));
    }

    #[test]
    fn normalize_roundtrip_fixture() {
        let size = ImageSize {
            width: 200,
            height: 100,
        };
        let normalized = vec![Point2d::new(0.1, 0.9), Point2d::new(1.0, 0.0)];
        let pixels = denormalize(&normalized, size);
        assert_eq!(pixels, vec![Point2d::new(20.0, 90.0), Point2d::new(200.0, 0.0)]);
        assert_eq!(normalize(&pixels, size), normalized);
        assert_eq!(
            normalize(&pixels, [0, 0].into()),
            vec![Point2d::default(); 2]
        );
    }

    #[test]
    fn point_from_json() -> Result<(), serde_json::Error> {
        let p: Point2d = serde_json::from_str(r#"{"x": 0.25, "y": 0.5}"#)?;
        assert_eq!(p, Point2d::new(0.25, 0.5));
        Ok(())
    }
}
