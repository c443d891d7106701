use varflow_image::{Image, ImageError};

use crate::filter::{kernels, separable_filter_with_strategy};
use crate::parallel::ExecutionStrategy;

/// Spatial derivatives with the five point centered stencil `[1, -8, 0, 8, -1] / 12`.
///
/// Borders are replicated, so the derivative decays towards the image edges.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dx` - The horizontal derivative with shape (H, W, C).
/// * `dy` - The vertical derivative with shape (H, W, C).
/// * `strategy` - The execution strategy.
pub fn spatial_gradient<const C: usize>(
    src: &Image<f64, C>,
    dx: &mut Image<f64, C>,
    dy: &mut Image<f64, C>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    let derivative = kernels::derivative_kernel_1d();
    separable_filter_with_strategy(src, dx, &derivative, &[1.0], strategy)?;
    separable_filter_with_strategy(src, dy, &[1.0], &derivative, strategy)?;
    Ok(())
}

/// Forward differences `src(x + 1) - src(x)` on both axes.
///
/// The last column of `dx` and the last row of `dy` are zero.
pub fn forward_gradient<const C: usize>(
    src: &Image<f64, C>,
    dx: &mut Image<f64, C>,
    dy: &mut Image<f64, C>,
) -> Result<(), ImageError> {
    for dst in [&*dx, &*dy] {
        if dst.size() != src.size() {
            return Err(ImageError::InvalidImageSize(
                dst.cols(),
                dst.rows(),
                src.cols(),
                src.rows(),
            ));
        }
    }

    let (rows, cols) = (src.rows(), src.cols());
    let stride = cols * C;
    let data = src.as_slice();
    let dx_data = dx.as_slice_mut();
    let dy_data = dy.as_slice_mut();

    for r in 0..rows {
        for c in 0..cols {
            let o = r * stride + c * C;
            for k in 0..C {
                dx_data[o + k] = if c + 1 < cols {
                    data[o + C + k] - data[o + k]
                } else {
                    0.0
                };
                dy_data[o + k] = if r + 1 < rows {
                    data[o + stride + k] - data[o + k]
                } else {
                    0.0
                };
            }
        }
    }

    Ok(())
}
