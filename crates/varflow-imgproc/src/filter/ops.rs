use varflow_image::{Image, ImageError};

use super::{kernels, separable_filter_with_strategy};
use crate::parallel::ExecutionStrategy;

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma` - The standard deviation of the gaussian, applied on both axes.
/// * `half_width` - The kernel spans `2 * half_width + 1` taps.
/// * `strategy` - The execution strategy.
///
/// # Errors
///
/// Returns [`ImageError::InvalidSigma`] if `sigma` is not strictly positive.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
    sigma: f64,
    half_width: usize,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ImageError::InvalidSigma(sigma));
    }
    let kernel = kernels::gaussian_kernel_1d(2 * half_width + 1, sigma);
    separable_filter_with_strategy(src, dst, &kernel, &kernel, strategy)
}

/// Smooth an image with the same 1D kernel on both axes.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn smooth<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
    kernel: &[f64],
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    separable_filter_with_strategy(src, dst, kernel, kernel, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_blur_preserves_mean() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_fn([9, 9].into(), |x, y, _| {
            if x == 4 && y == 4 {
                1.0
            } else {
                0.0
            }
        })?;
        let mut dst = Image::<f64, 1>::from_size_val(src.size(), 0.0)?;

        gaussian_blur(&src, &mut dst, 1.0, 3, ExecutionStrategy::Serial)?;

        let total: f64 = dst.as_slice().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        let center = dst.get([4, 4, 0]).copied().unwrap_or_default();
        let neighbor = dst.get([4, 5, 0]).copied().unwrap_or_default();
        assert!(center > neighbor);
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_invalid_sigma() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_val([4, 4].into(), 0.0)?;
        let mut dst = src.clone();
        for sigma in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                gaussian_blur(&src, &mut dst, sigma, 1, ExecutionStrategy::Serial),
                Err(ImageError::InvalidSigma(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_smooth_tent() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_fn([3, 1].into(), |x, _, _| (x * 5) as f64)?;
        let mut dst = src.clone();
        smooth(&src, &mut dst, &kernels::tent_kernel_1d(3.0), ExecutionStrategy::Serial)?;
        // 0.2 * 0 + 0.6 * 5 + 0.2 * 10
        assert_relative_eq!(dst.as_slice()[1], 5.0, epsilon = 1e-12);
        // replicated left border: 0.2 * 0 + 0.6 * 0 + 0.2 * 5
        assert_relative_eq!(dst.as_slice()[0], 1.0, epsilon = 1e-12);
        Ok(())
    }
}
