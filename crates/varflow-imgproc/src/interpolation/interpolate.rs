use super::bicubic::bicubic_interpolation;
use super::bilinear::bilinear_interpolation;
use varflow_image::Image;

/// Interpolation mode for the resampling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation
    Bilinear,
    /// Bicubic interpolation
    #[default]
    Bicubic,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated channel values, all zero for an empty image.
///
/// # Examples
///
/// ```
/// use varflow_image::Image;
/// use varflow_imgproc::interpolation::{interpolate_pixel, InterpolationMode};
///
/// let image = Image::<f64, 1>::from_size_fn([4, 4].into(), |x, _, _| x as f64).unwrap();
///
/// // far outside the canvas the border pixel is returned
/// let [p] = interpolate_pixel(&image, 100.0, 1.0, InterpolationMode::Bicubic);
/// assert_eq!(p, 3.0);
/// ```
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f64, C>,
    u: f64,
    v: f64,
    interpolation: InterpolationMode,
) -> [f64; C] {
    if image.size().is_empty() {
        return [0.0; C];
    }
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Bicubic => bicubic_interpolation(image, u, v),
    }
}
