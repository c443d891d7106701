use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use varflow_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the image.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    // number of samples for an image with `channels` interleaved channels
    fn num_samples(&self, channels: usize) -> Result<usize, ImageError> {
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(ImageError::AllocationFailed(usize::MAX))
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

// reserve the buffer up front so that an out-of-memory condition surfaces as an error
fn try_alloc<T>(len: usize) -> Result<Vec<T>, ImageError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| ImageError::AllocationFailed(len))?;
    Ok(data)
}

/// Represents an image with owned pixel data.
///
/// The pixels are stored row-major with interleaved channels, i.e. the sample for
/// pixel `(x, y)` and channel `c` lives at `(y * width + x) * C + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const C: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const C: usize> Image<T, C> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use varflow_image::{Image, ImageSize};
    ///
    /// let image = Image::<f64, 3>::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0.0; 10 * 20 * 3],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.num_samples(C)?;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// Create a new image with the given size and every sample set to `val`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::AllocationFailed`] if the buffer cannot be reserved.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let len = size.num_samples(C)?;
        let mut data = try_alloc(len)?;
        data.resize(len, val);
        Ok(Self { size, data })
    }

    /// Create a new image by evaluating `f(x, y, c)` for every sample.
    ///
    /// # Examples
    ///
    /// ```
    /// use varflow_image::{Image, ImageSize};
    ///
    /// let ramp = Image::<f64, 1>::from_size_fn([4, 2].into(), |x, y, _| (x + 10 * y) as f64)
    ///     .unwrap();
    ///
    /// assert_eq!(ramp.get([1, 3, 0]), Some(&13.0));
    /// ```
    pub fn from_size_fn<F>(size: ImageSize, mut f: F) -> Result<Self, ImageError>
    where
        F: FnMut(usize, usize, usize) -> T,
    {
        let len = size.num_samples(C)?;
        let mut data = try_alloc(len)?;
        for y in 0..size.height {
            for x in 0..size.width {
                for c in 0..C {
                    data.push(f(x, y, c));
                }
            }
        }
        Ok(Self { size, data })
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        C
    }

    /// The interleaved samples as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved samples as a mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its sample buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Borrow the image as a read-only view.
    pub fn view(&self) -> ImageView<'_, T, C> {
        ImageView {
            size: self.size,
            data: &self.data,
        }
    }

    /// Get the sample at `[row, col, channel]`, or `None` when out of bounds.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let offset = self.offset(index)?;
        self.data.get(offset)
    }

    /// Get a mutable reference to the sample at `[row, col, channel]`.
    pub fn get_mut(&mut self, index: [usize; 3]) -> Option<&mut T> {
        let offset = self.offset(index)?;
        self.data.get_mut(offset)
    }

    /// Set every sample of the image to `val`.
    pub fn fill(&mut self, val: T)
    where
        T: Clone,
    {
        self.data.fill(val);
    }

    fn offset(&self, [row, col, ch]: [usize; 3]) -> Option<usize> {
        if row >= self.size.height || col >= self.size.width || ch >= C {
            return None;
        }
        Some((row * self.size.width + col) * C + ch)
    }
}

impl<T, const C: usize> Image<T, C>
where
    T: Copy,
{
    /// Extract a single channel as a new image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ChannelIndexOutOfBounds`] if `channel >= C`.
    pub fn channel(&self, channel: usize) -> Result<Image<T, 1>, ImageError> {
        if channel >= C {
            return Err(ImageError::ChannelIndexOutOfBounds(channel, C));
        }
        let mut data = try_alloc(self.size.area())?;
        data.extend(self.data.iter().skip(channel).step_by(C).copied());
        Image::new(self.size, data)
    }

    /// Read the pixel at `(x, y)` as a fixed-size array of channel values.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PixelIndexOutOfBounds`] when the pixel lies outside the image.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<[T; C], ImageError> {
        self.view().get_pixel(x, y)
    }
}

/// A borrowed, read-only image.
///
/// The view never owns its samples: the caller keeps the buffer alive for the
/// lifetime `'a` and the view is never responsible for freeing it.
#[derive(Debug)]
pub struct ImageView<'a, T, const C: usize> {
    size: ImageSize,
    data: &'a [T],
}

impl<T, const C: usize> Clone for ImageView<'_, T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const C: usize> Copy for ImageView<'_, T, C> {}

impl<'a, T, const C: usize> ImageView<'a, T, C> {
    /// Wrap an existing interleaved buffer without copying it.
    ///
    /// # Errors
    ///
    /// If the length of `data` does not match `size` and `C`, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use varflow_image::{ImageSize, ImageView};
    ///
    /// let pixels = vec![0.5f64; 6 * 4];
    /// let view = ImageView::<f64, 1>::from_slice([6, 4].into(), &pixels).unwrap();
    ///
    /// assert_eq!(view.width(), 6);
    /// assert_eq!(view.height(), 4);
    /// ```
    pub fn from_slice(size: ImageSize, data: &'a [T]) -> Result<Self, ImageError> {
        let expected = size.num_samples(C)?;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
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
        C
    }

    /// The borrowed interleaved samples.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Read the pixel at `(x, y)` as a fixed-size array of channel values.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PixelIndexOutOfBounds`] when the pixel lies outside the image.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<[T; C], ImageError>
    where
        T: Copy,
    {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.size.width,
                self.size.height,
            ));
        }
        let offset = (y * self.size.width + x) * C;
        Ok(std::array::from_fn(|c| self.data[offset + c]))
    }

    /// Copy the borrowed samples into a new owned image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::AllocationFailed`] if the buffer cannot be reserved.
    pub fn to_image(&self) -> Result<Image<T, C>, ImageError>
    where
        T: Clone,
    {
        let mut data = try_alloc(self.data.len())?;
        data.extend_from_slice(self.data);
        Ok(Image {
            size: self.size,
            data,
        })
    }
}

impl<'a, T, const C: usize> From<&'a Image<T, C>> for ImageView<'a, T, C> {
    fn from(image: &'a Image<T, C>) -> Self {
        image.view()
    }
}
