use crate::interpolation::{interpolate_pixel, InterpolationMode};
use crate::parallel;
use thermoreg_image::{Image, ImageDtype, ImageError, ImageSize};

/// Largest canvas used to display and register an image pair.
pub const DEFAULT_CANVAS_SIZE: ImageSize = ImageSize {
    width: 800,
    height: 600,
};

/// Scale an image size uniformly so that it fits inside `max_size`.
///
/// Images are never upscaled: the scale factor is
/// `min(max_w / w, max_h / h, 1)` and the resulting dimensions are floored.
///
/// # Arguments
///
/// * `size` - The size of the image to fit.
/// * `max_size` - The bounding canvas size.
///
/// # Returns
///
/// The fitted size and the scale factor that was applied. An empty input size
/// yields an empty size and a scale of `1.0`.
///
/// # Example
///
/// ```
/// use thermoreg_image::ImageSize;
/// use thermoreg_imgproc::resize::{fit_within, DEFAULT_CANVAS_SIZE};
///
/// let (size, scale) = fit_within([1600, 900].into(), DEFAULT_CANVAS_SIZE);
///
/// assert_eq!(size, ImageSize { width: 800, height: 450 });
/// assert_eq!(scale, 0.5);
/// ```
pub fn fit_within(size: ImageSize, max_size: ImageSize) -> (ImageSize, f64) {
    if size.is_empty() {
        return (
            ImageSize {
                width: 0,
                height: 0,
            },
            1.0,
        );
    }

    let scale_x = max_size.width as f64 / size.width as f64;
    let scale_y = max_size.height as f64 / size.height as f64;
    let scale = scale_x.min(scale_y).min(1.0);

    let fitted = ImageSize {
        width: (size.width as f64 * scale).floor() as usize,
        height: (size.height as f64 * scale).floor() as usize,
    };

    (fitted, scale)
}

/// Resize an image into the size of `dst`.
///
/// Pixel centres are aligned: destination pixel `x` samples the source at
/// `(x + 0.5) * src_w / dst_w - 0.5`, which matches how a canvas scales a
/// drawn image. Samples falling outside the source are edge clamped.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, already allocated with the target size.
/// * `interpolation` - The interpolation mode to use.
///
/// # Errors
///
/// Returns an error if the source is empty while the destination is not.
///
/// # Example
///
/// ```
/// use thermoreg_image::Image;
/// use thermoreg_imgproc::interpolation::InterpolationMode;
/// use thermoreg_imgproc::resize::resize;
///
/// let src = Image::<u8, 4>::from_size_pixel([4, 4].into(), [10, 20, 30, 255]);
/// let mut dst = Image::<u8, 4>::from_size_val([2, 3].into(), 0).unwrap();
///
/// resize(&src, &mut dst, InterpolationMode::Bilinear).unwrap();
///
/// assert_eq!(dst.pixel(1, 2).unwrap(), &[10, 20, 30, 255]);
/// ```
pub fn resize<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if dst.size().is_empty() {
        return Ok(());
    }

    if src.size().is_empty() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let scale_x = src.width() as f64 / dst.width() as f64;
    let scale_y = src.height() as f64 / dst.height() as f64;

    parallel::par_iter_rows_mut(dst, |r, row| {
        let v = (r as f64 + 0.5) * scale_y - 0.5;
        row.chunks_exact_mut(C).enumerate().for_each(|(c, dst_pixel)| {
            let u = (c as f64 + 0.5) * scale_x - 0.5;
            let pixel = interpolate_pixel(src, u, v, interpolation);
            dst_pixel
                .iter_mut()
                .zip(pixel)
                .for_each(|(d, p)| *d = T::from_f64(p));
        });
    });

    Ok(())
}
