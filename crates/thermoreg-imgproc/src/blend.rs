use crate::parallel;
use thermoreg_image::{Image, ImageDtype, ImageError};

/// Blend an image on top of another with a constant opacity.
///
/// Every channel is blended independently as `base * (1 - opacity) + top * opacity`,
/// which is how a registered image is overlaid on its reference for review.
///
/// # Arguments
///
/// * `base` - The bottom image.
/// * `top` - The image drawn on top.
/// * `opacity` - The opacity of `top` in `[0, 1]`.
/// * `dst` - The output image.
///
/// # Errors
///
/// Returns an error if the images differ in size or the opacity is outside `[0, 1]`.
///
/// # Example
///
/// ```
/// use thermoreg_image::Image;
/// use thermoreg_imgproc::blend::overlay;
///
/// let base = Image::<u8, 4>::from_size_pixel([2, 2].into(), [0, 0, 200, 255]);
/// let top = Image::<u8, 4>::from_size_pixel([2, 2].into(), [200, 0, 0, 255]);
/// let mut dst = Image::<u8, 4>::from_size_val([2, 2].into(), 0).unwrap();
///
/// overlay(&base, &top, 0.5, &mut dst).unwrap();
///
/// assert_eq!(dst.pixel(0, 0).unwrap(), &[100, 0, 100, 255]);
/// ```
pub fn overlay<T: ImageDtype, const C: usize>(
    base: &Image<T, C>,
    top: &Image<T, C>,
    opacity: f64,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(ImageError::InvalidOpacity(opacity));
    }

    if base.size() != top.size() {
        return Err(ImageError::InvalidImageSize(
            base.width(),
            base.height(),
            top.width(),
            top.height(),
        ));
    }

    if base.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            base.width(),
            base.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let alpha = 1.0 - opacity;

    parallel::par_iter_rows_val_two(base, top, dst, |base_pixel, top_pixel, dst_pixel| {
        base_pixel
            .iter()
            .zip(top_pixel)
            .zip(dst_pixel.iter_mut())
            .for_each(|((&b, &t), d)| {
                *d = T::from_f64(b.to_f64() * alpha + t.to_f64() * opacity);
            });
    });

    Ok(())
}
