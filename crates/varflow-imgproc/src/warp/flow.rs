use varflow_image::{ops, Image, ImageError, ImageSize};

use crate::filter::{kernels, smooth};
use crate::gradient::spatial_gradient;
use crate::interpolation::{interpolate_pixel, InterpolationMode};
use crate::parallel::{self, ExecutionStrategy};

/// What a warped pixel takes when its displaced position leaves the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum WarpBorder {
    /// Sample the nearest border pixel of the warped image.
    #[default]
    Replicate,
    /// Copy the reference image pixel, so the temporal difference there is zero.
    Reference,
}

fn check_size(got: ImageSize, expected: ImageSize) -> Result<(), ImageError> {
    if got != expected {
        return Err(ImageError::InvalidImageSize(
            got.width,
            got.height,
            expected.width,
            expected.height,
        ));
    }
    Ok(())
}

/// Warp an image along a dense flow field with bicubic interpolation.
///
/// Every destination pixel `(x, y)` samples `src` at `(x + u(x, y), y + v(x, y))`.
///
/// # Arguments
///
/// * `src` - The image to resample, the second frame of the pair.
/// * `reference` - The first frame, used by [`WarpBorder::Reference`].
/// * `u` - The horizontal displacement.
/// * `v` - The vertical displacement.
/// * `dst` - The warped image.
/// * `border` - The handling of samples landing outside `src`.
/// * `strategy` - The execution strategy.
///
/// PRECONDITION: all images have the same size.
pub fn warp_flow<const C: usize>(
    src: &Image<f64, C>,
    reference: &Image<f64, C>,
    u: &Image<f64, 1>,
    v: &Image<f64, 1>,
    dst: &mut Image<f64, C>,
    border: WarpBorder,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    let size = src.size();
    check_size(reference.size(), size)?;
    check_size(u.size(), size)?;
    check_size(v.size(), size)?;
    check_size(dst.size(), size)?;

    let (cols, rows) = (size.width, size.height);
    let (max_x, max_y) = (cols as f64 - 1.0, rows as f64 - 1.0);
    let (u_data, v_data) = (u.as_slice(), v.as_slice());
    let ref_data = reference.as_slice();

    parallel::for_each_pixel(dst, strategy, |x, y, pixel| {
        let o = y * cols + x;
        let fx = x as f64 + u_data[o];
        let fy = y as f64 + v_data[o];

        let outside = !(0.0..=max_x).contains(&fx) || !(0.0..=max_y).contains(&fy);
        if border == WarpBorder::Reference && outside {
            pixel.copy_from_slice(&ref_data[o * C..(o + 1) * C]);
        } else {
            pixel.copy_from_slice(&interpolate_pixel(src, fx, fy, InterpolationMode::Bicubic));
        }
    });

    Ok(())
}

/// The second frame warped onto the first, with the derivatives of the pair.
///
/// Both frames are pre-filtered with `[0.02, 0.11, 0.74, 0.11, 0.02]` before
/// differentiation. `dx` and `dy` are the five point centered derivatives of the
/// filtered warped frame and `dt` is the filtered warped frame minus the filtered
/// first frame.
#[derive(Debug, Clone)]
pub struct WarpedImage<const C: usize> {
    /// The second frame resampled on the grid of the first.
    pub warped: Image<f64, C>,
    /// Horizontal derivative of the warped frame.
    pub dx: Image<f64, C>,
    /// Vertical derivative of the warped frame.
    pub dy: Image<f64, C>,
    /// Temporal difference between the warped frame and the first frame.
    pub dt: Image<f64, C>,
}

impl<const C: usize> WarpedImage<C> {
    /// Warp `image2` along `(u, v)` and differentiate the pair.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidImageSize`] if the inputs disagree in size.
    pub fn compute(
        image1: &Image<f64, C>,
        image2: &Image<f64, C>,
        u: &Image<f64, 1>,
        v: &Image<f64, 1>,
        border: WarpBorder,
        strategy: ExecutionStrategy,
    ) -> Result<Self, ImageError> {
        check_size(image2.size(), image1.size())?;

        let size = image1.size();
        let mut warped = Image::from_size_val(size, 0.0)?;
        warp_flow(image2, image1, u, v, &mut warped, border, strategy)?;

        let prefilter = kernels::derivative_prefilter_kernel_1d();
        let mut image1_s = Image::from_size_val(size, 0.0)?;
        let mut warped_s = Image::from_size_val(size, 0.0)?;
        smooth(image1, &mut image1_s, &prefilter, strategy)?;
        smooth(&warped, &mut warped_s, &prefilter, strategy)?;

        let mut dx = Image::from_size_val(size, 0.0)?;
        let mut dy = Image::from_size_val(size, 0.0)?;
        spatial_gradient(&warped_s, &mut dx, &mut dy, strategy)?;

        let mut dt = Image::from_size_val(size, 0.0)?;
        ops::sub(&warped_s, &image1_s, &mut dt)?;

        Ok(Self { warped, dx, dy, dt })
    }

    /// Size of the warped frame.
    pub fn size(&self) -> ImageSize {
        self.warped.size()
    }
}
