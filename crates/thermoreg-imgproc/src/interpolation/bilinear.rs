use thermoreg_image::{Image, ImageDtype};

/// Kernel for bilinear interpolation with edge clamping.
///
/// The coordinate is first clamped to `[0, cols - 1] x [0, rows - 1]`. The four
/// neighbours are `(x0, y0)`, `(x1, y0)`, `(x0, y1)`, `(x1, y1)` with
/// `x1 = min(x0 + 1, cols - 1)` and `y1 = min(y0 + 1, rows - 1)`, so sampling on
/// the last row or column degenerates to the edge pixel.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values, one per channel.
///
/// # Panics
///
/// Panics if the image is empty.
///
/// # Example
///
/// ```
/// use thermoreg_image::Image;
/// use thermoreg_imgproc::interpolation::bilinear_interpolation;
///
/// let image = Image::<u8, 1>::new([2, 1].into(), vec![0, 100]).unwrap();
///
/// assert_eq!(bilinear_interpolation(&image, 0.5, 0.0), [50.0]);
/// assert_eq!(bilinear_interpolation(&image, -7.0, 3.0), [0.0]);
/// ```
pub fn bilinear_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());
    assert!(rows > 0 && cols > 0, "cannot sample an empty image");

    let u = u.clamp(0.0, (cols - 1) as f64);
    let v = v.clamp(0.0, (rows - 1) as f64);

    let iu0 = u.floor() as usize;
    let iv0 = v.floor() as usize;

    let iu1 = (iu0 + 1).min(cols - 1);
    let iv1 = (iv0 + 1).min(rows - 1);

    let frac_u = u - iu0 as f64;
    let frac_v = v - iv0 as f64;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let base00 = (iv0 * cols + iu0) * C;
    let base01 = (iv0 * cols + iu1) * C;
    let base10 = (iv1 * cols + iu0) * C;
    let base11 = (iv1 * cols + iu1) * C;

    let data = image.as_slice();

    let p00 = &data[base00..base00 + C];
    let p01 = &data[base01..base01 + C];
    let p10 = &data[base10..base10 + C];
    let p11 = &data[base11..base11 + C];

    let mut pixel = [0.0; C];
    for k in 0..C {
        pixel[k] = p00[k].to_f64() * w00
            + p01[k].to_f64() * w01
            + p10[k].to_f64() * w10
            + p11[k].to_f64() * w11;
    }

    pixel
}
