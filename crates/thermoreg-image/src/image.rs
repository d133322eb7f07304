use crate::error::ImageError;

/// Width and height of an image, in pixels.
///
/// # Examples
///
/// ```
/// use thermoreg_image::ImageSize;
///
/// // a typical radiometric thermal frame
/// let thermal = ImageSize::from([160, 120]);
///
/// assert_eq!(thermal.num_pixels(), 19_200);
/// assert!(!thermal.is_empty());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered by the size.
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// Trait for image data types.
///
/// Samples are widened to `f64` for resampling and narrowed back with
/// [`ImageDtype::from_f64`]. Send and Sync are required by the row workers.
pub trait ImageDtype: Copy + Default + Into<f64> + Send + Sync {
    /// Convert a f64 value to the image data type.
    fn from_f64(x: f64) -> Self;

    /// Widen the sample to f64.
    fn to_f64(self) -> f64 {
        self.into()
    }
}

impl ImageDtype for f64 {
    fn from_f64(x: f64) -> Self {
        x
    }
}

impl ImageDtype for f32 {
    fn from_f64(x: f64) -> Self {
        x as f32
    }
}

impl ImageDtype for u8 {
    fn from_f64(x: f64) -> Self {
        x.round().clamp(0.0, 255.0) as u8
    }
}

impl ImageDtype for u16 {
    fn from_f64(x: f64) -> Self {
        x.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

/// Represents an image with pixel data.
///
/// The pixel data is stored row-major with interleaved channels, i.e. with
/// shape (H, W, C) where H is the height, W the width and C the number of
/// channels of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Wrap interleaved pixel data of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidChannelShape`] unless `data` holds exactly
    /// `width * height * CHANNELS` samples.
    ///
    /// # Examples
    ///
    /// ```
    /// use thermoreg_image::Image;
    ///
    /// let rgba = Image::<u8, 4>::new([3, 2].into(), vec![0u8; 3 * 2 * 4]).unwrap();
    ///
    /// assert_eq!(rgba.width(), 3);
    /// assert_eq!(rgba.height(), 2);
    /// assert!(Image::<u8, 4>::new([3, 2].into(), vec![0u8; 5]).is_err());
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.num_pixels() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// Allocate an image with every sample set to `val`.
    ///
    /// Used to allocate output buffers before they are filled row by row.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.num_pixels() * CHANNELS])
    }

    /// Create a new image filling every pixel with the same channel values.
    ///
    /// # Examples
    ///
    /// ```
    /// use thermoreg_image::{Image, ImageSize};
    ///
    /// let red = Image::<u8, 4>::from_size_pixel([2, 2].into(), [255, 0, 0, 255]);
    ///
    /// assert_eq!(red.pixel(1, 1).unwrap(), &[255, 0, 0, 255]);
    /// ```
    pub fn from_size_pixel(size: ImageSize, pixel: [T; CHANNELS]) -> Self
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(size.num_pixels() * CHANNELS);
        for _ in 0..size.num_pixels() {
            data.extend_from_slice(&pixel);
        }
        Self { size, data }
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.width()
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.height()
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Number of samples in a single row (width * channels).
    pub fn row_stride(&self) -> usize {
        self.size.width * CHANNELS
    }

    /// Get the pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a flat mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get a single sample by `[row, col, channel]` index.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [y, x, ch] = index;
        if x >= self.width() || y >= self.height() || ch >= CHANNELS {
            return None;
        }
        self.data.get((y * self.width() + x) * CHANNELS + ch)
    }

    /// Get all channels of the pixel at column `x` and row `y`.
    ///
    /// # Errors
    ///
    /// If the coordinates fall outside the image, an error is returned.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }

        let base = (y * self.width() + x) * CHANNELS;
        Ok(&self.data[base..base + CHANNELS])
    }

    /// Overwrite all channels of the pixel at column `x` and row `y`.
    ///
    /// # Errors
    ///
    /// If the coordinates fall outside the image, an error is returned.
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: [T; CHANNELS]) -> Result<(), ImageError>
    where
        T: Copy,
    {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }

        let base = (y * self.width() + x) * CHANNELS;
        self.data[base..base + CHANNELS].copy_from_slice(&pixel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageDtype, ImageError, ImageSize};

    #[test]
    fn image_size() {
        let size = ImageSize::from([640, 480]);
        assert_eq!(size.num_pixels(), 307_200);
        assert_eq!(<[u32; 2]>::from(size), [640, 480]);
        assert_eq!(size.to_string(), "ImageSize { width: 640, height: 480 }");
        assert!(!size.is_empty());
        assert!(ImageSize::from([0, 3]).is_empty());
    }

    #[test]
    fn image_allocation() -> Result<(), ImageError> {
        let image = Image::<u8, 4>::from_size_val([160, 120].into(), 7)?;
        assert_eq!((image.cols(), image.rows()), (160, 120));
        assert_eq!(image.num_channels(), 4);
        assert_eq!(image.row_stride(), 640);
        assert!(image.as_slice().iter().all(|&v| v == 7));
        assert_eq!(image.into_vec().len(), 160 * 120 * 4);

        Ok(())
    }

    #[test]
    fn image_wrong_length() {
        let res = Image::<u8, 4>::new([2, 2].into(), vec![0u8; 15]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(15, 16)));
    }

    #[test]
    fn image_pixel_access() -> Result<(), ImageError> {
        let mut image = Image::<u8, 2>::new([2, 2].into(), vec![0, 1, 2, 3, 4, 5, 6, 7])?;
        assert_eq!(image.pixel(1, 0)?, &[2, 3]);
        assert_eq!(image.pixel(0, 1)?, &[4, 5]);
        assert_eq!(image.get([1, 1, 1]), Some(&7));
        assert_eq!(image.get([2, 0, 0]), None);

        image.set_pixel(1, 1, [9, 9])?;
        assert_eq!(image.pixel(1, 1)?, &[9, 9]);

        assert_eq!(
            image.pixel(2, 0),
            Err(ImageError::PixelIndexOutOfBounds(2, 0, 2, 2))
        );

        Ok(())
    }

    #[test]
    fn dtype_u8_saturates() {
        assert_eq!(u8::from_f64(254.6), 255);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(u8::from_f64(127.4), 127);
        assert_eq!(u16::from_f64(70000.0), u16::MAX);
    }
}
