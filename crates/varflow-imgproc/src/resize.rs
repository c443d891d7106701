use varflow_image::{Image, ImageError, ImageSize};

use crate::interpolation::{interpolate_pixel, InterpolationMode};
use crate::parallel::{self, ExecutionStrategy};

/// Size of an image scaled by `factor`, truncated and clamped to at least one pixel per axis.
///
/// # Examples
///
/// ```
/// use varflow_image::ImageSize;
/// use varflow_imgproc::resize::scaled_size;
///
/// let size = scaled_size(ImageSize { width: 480, height: 360 }, 0.75);
/// assert_eq!(size, ImageSize { width: 360, height: 270 });
///
/// let tiny = scaled_size(ImageSize { width: 3, height: 2 }, 0.1);
/// assert_eq!(tiny, ImageSize { width: 1, height: 1 });
/// ```
pub fn scaled_size(size: ImageSize, factor: f64) -> ImageSize {
    ImageSize {
        width: ((size.width as f64 * factor) as usize).max(1),
        height: ((size.height as f64 * factor) as usize).max(1),
    }
}

// Sample `src` for every pixel of `dst`. The destination pixel `(x, y)` maps back to
// `((x + 1) / scale_x - 1, (y + 1) / scale_y - 1)` in the source.
fn resample<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
    scale_x: f64,
    scale_y: f64,
    interpolation: InterpolationMode,
    strategy: ExecutionStrategy,
) {
    parallel::for_each_pixel(dst, strategy, |x, y, pixel| {
        let u = (x + 1) as f64 / scale_x - 1.0;
        let v = (y + 1) as f64 / scale_y - 1.0;
        pixel.copy_from_slice(&interpolate_pixel(src, u, v, interpolation));
    });
}

/// Resize an image to the size of the destination image.
///
/// The scale on each axis is the ratio between the destination and source sizes.
/// No anti-aliasing is applied; smooth the source first when shrinking.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, already allocated at the target size.
/// * `interpolation` - The interpolation method to use.
/// * `strategy` - The execution strategy.
///
/// # Errors
///
/// Returns [`ImageError::InvalidImageSize`] when resizing an empty image to a non-empty one.
pub fn resize<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
    interpolation: InterpolationMode,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if dst.size().is_empty() {
        return Ok(());
    }
    if src.size().is_empty() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let scale_x = dst.cols() as f64 / src.cols() as f64;
    let scale_y = dst.rows() as f64 / src.rows() as f64;
    resample(src, dst, scale_x, scale_y, interpolation, strategy);

    Ok(())
}

/// Resize an image by a real-valued factor on both axes.
///
/// The output size is given by [`scaled_size`]; the sampling positions use `factor`
/// itself rather than the truncated size ratio.
///
/// # Errors
///
/// Returns [`ImageError::InvalidScaleFactor`] if `factor` is not positive and finite,
/// and [`ImageError::InvalidImageSize`] if `src` is empty.
pub fn resize_by_factor<const C: usize>(
    src: &Image<f64, C>,
    factor: f64,
    interpolation: InterpolationMode,
    strategy: ExecutionStrategy,
) -> Result<Image<f64, C>, ImageError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ImageError::InvalidScaleFactor(factor));
    }
    let size = scaled_size(src.size(), factor);
    if src.size().is_empty() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            size.width,
            size.height,
        ));
    }

    let mut dst = Image::from_size_val(size, 0.0)?;
    resample(src, &mut dst, factor, factor, interpolation, strategy);

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn resize_constant() -> Result<(), ImageError> {
        let src = Image::<f64, 3>::from_size_val([9, 7].into(), 0.25)?;
        let mut dst = Image::<f64, 3>::from_size_val([20, 3].into(), 0.0)?;
        resize(
            &src,
            &mut dst,
            InterpolationMode::Bicubic,
            ExecutionStrategy::Serial,
        )?;
        for &p in dst.as_slice() {
            assert_relative_eq!(p, 0.25, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn resize_identity() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_fn([6, 5].into(), |x, y, _| (x * y) as f64)?;
        let mut dst = Image::<f64, 1>::from_size_val(src.size(), 0.0)?;
        resize(
            &src,
            &mut dst,
            InterpolationMode::Bicubic,
            ExecutionStrategy::Parallel,
        )?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn resize_by_half_picks_odd_samples() -> Result<(), ImageError> {
        // (x + 1) / 0.5 - 1 = 2x + 1 lands on integer source positions
        let src = Image::<f64, 1>::from_size_fn([8, 4].into(), |x, y, _| (x + 10 * y) as f64)?;
        let dst = resize_by_factor(
            &src,
            0.5,
            InterpolationMode::Bicubic,
            ExecutionStrategy::Serial,
        )?;
        assert_eq!(dst.size(), ImageSize { width: 4, height: 2 });
        assert_eq!(dst.as_slice(), &[11.0, 13.0, 15.0, 17.0, 31.0, 33.0, 35.0, 37.0]);
        Ok(())
    }

    #[test]
    fn resize_by_factor_errors() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_val([4, 4].into(), 0.0)?;
        for factor in [0.0, -0.5, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                resize_by_factor(&src, factor, InterpolationMode::Bilinear, ExecutionStrategy::Serial),
                Err(ImageError::InvalidScaleFactor(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn resize_by_factor_clamps_to_one_pixel() -> Result<(), ImageError> {
        let src = Image::<f64, 2>::from_size_val([3, 3].into(), 1.0)?;
        let dst = resize_by_factor(
            &src,
            0.01,
            InterpolationMode::Bicubic,
            ExecutionStrategy::Serial,
        )?;
        assert_eq!(dst.size(), ImageSize { width: 1, height: 1 });
        Ok(())
    }
}
