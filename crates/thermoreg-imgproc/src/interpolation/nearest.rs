use thermoreg_image::{Image, ImageDtype};

/// Kernel for nearest neighbor interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The pixel values of the closest pixel after edge clamping.
///
/// # Panics
///
/// Panics if the image is empty.
pub fn nearest_neighbor_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());
    assert!(rows > 0 && cols > 0, "cannot sample an empty image");

    let iu = u.round().clamp(0.0, (cols - 1) as f64) as usize;
    let iv = v.round().clamp(0.0, (rows - 1) as f64) as usize;

    let base = (iv * cols + iu) * C;
    let src = &image.as_slice()[base..base + C];

    let mut pixel = [0.0; C];
    for (dst, &s) in pixel.iter_mut().zip(src) {
        *dst = s.to_f64();
    }

    pixel
}
