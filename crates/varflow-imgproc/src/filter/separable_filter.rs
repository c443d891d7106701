use varflow_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy};

/// A separable 2D filter that applies horizontal and vertical 1D correlations sequentially.
///
/// Samples outside the image replicate the nearest border pixel.
struct SeparableFilter<'a> {
    kernel_x: &'a [f64],
    kernel_y: &'a [f64],
    half_x: isize,
    half_y: isize,
}

impl<'a> SeparableFilter<'a> {
    fn new(kernel_x: &'a [f64], kernel_y: &'a [f64]) -> Self {
        Self {
            kernel_x,
            kernel_y,
            half_x: (kernel_x.len() / 2) as isize,
            half_y: (kernel_y.len() / 2) as isize,
        }
    }

    /// Performs horizontal filtering followed by vertical filtering using a temporary buffer.
    fn apply<const C: usize>(
        &self,
        src: &Image<f64, C>,
        dst: &mut Image<f64, C>,
        strategy: ExecutionStrategy,
    ) -> Result<(), ImageError> {
        let rows = src.rows();
        let cols = src.cols();
        let stride = cols * C;
        let src_data = src.as_slice();

        let mut temp = Image::<f64, C>::from_size_val(src.size(), 0.0)?;

        // Horizontal
        parallel::for_each_row(temp.as_slice_mut(), stride, strategy, |r, row_temp| {
            let src_row = &src_data[r * stride..(r + 1) * stride];
            for c in 0..cols {
                let mut acc = [0.0f64; C];
                for (i, &k) in self.kernel_x.iter().enumerate() {
                    let x = clamp_index(c as isize + i as isize - self.half_x, cols);
                    let px = &src_row[x * C..(x + 1) * C];
                    acc.iter_mut().zip(px).for_each(|(a, &p)| *a += k * p);
                }
                row_temp[c * C..(c + 1) * C].copy_from_slice(&acc);
            }
        });

        // Vertical
        let temp_data = temp.as_slice();
        parallel::for_each_row(dst.as_slice_mut(), stride, strategy, |r, row_dst| {
            row_dst.fill(0.0);
            for (i, &k) in self.kernel_y.iter().enumerate() {
                let y = clamp_index(r as isize + i as isize - self.half_y, rows);
                let row_src = &temp_data[y * stride..(y + 1) * stride];
                row_dst
                    .iter_mut()
                    .zip(row_src)
                    .for_each(|(d, &s)| *d += k * s);
            }
        });

        Ok(())
    }
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Apply a separable filter with execution strategy control.
///
/// Both kernels are correlated with the image (not flipped) and centered on their
/// middle tap; samples outside the image replicate the border.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel, odd length.
/// * `kernel_y` - The vertical kernel, odd length.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, or `Auto`.
pub fn separable_filter_with_strategy<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
    kernel_x: &[f64],
    kernel_y: &[f64],
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if kernel_x.len() % 2 == 0 || kernel_y.len() % 2 == 0 {
        return Err(ImageError::InvalidKernelLength(
            kernel_x.len(),
            kernel_y.len(),
        ));
    }

    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.size().is_empty() {
        return Ok(());
    }

    let filter = SeparableFilter::new(kernel_x, kernel_y);
    filter.apply(src, dst, strategy)
}

/// Apply a separable filter to an image.
///
/// Uses `ExecutionStrategy::Auto`. For explicit control, use [`separable_filter_with_strategy`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
pub fn separable_filter<const C: usize>(
    src: &Image<f64, C>,
    dst: &mut Image<f64, C>,
    kernel_x: &[f64],
    kernel_y: &[f64],
) -> Result<(), ImageError> {
    separable_filter_with_strategy(src, dst, kernel_x, kernel_y, ExecutionStrategy::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_separable_filter_impulse() -> Result<(), ImageError> {
        let mut src = Image::<f64, 1>::from_size_val([5, 5].into(), 0.0)?;
        if let Some(p) = src.get_mut([2, 2, 0]) {
            *p = 9.0;
        }
        let mut dst = Image::<f64, 1>::from_size_val(src.size(), 0.0)?;

        let kernel = [1.0 / 3.0; 3];
        separable_filter(&src, &mut dst, &kernel, &kernel)?;

        #[rustfmt::skip]
        let expected = [
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        for (a, b) in dst.as_slice().iter().zip(expected) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_separable_filter_replicates_border() -> Result<(), ImageError> {
        // a horizontal ramp: the replicated border flattens the derivative at the edges
        let src = Image::<f64, 1>::from_size_fn([4, 1].into(), |x, _, _| x as f64)?;
        let mut dst = Image::<f64, 1>::from_size_val(src.size(), 0.0)?;

        separable_filter(&src, &mut dst, &[-0.5, 0.0, 0.5], &[1.0])?;

        assert_eq!(dst.as_slice(), &[0.5, 1.0, 1.0, 0.5]);
        Ok(())
    }

    #[test]
    fn test_separable_filter_constant_multichannel() -> Result<(), ImageError> {
        let src = Image::<f64, 3>::from_size_fn([7, 6].into(), |_, _, c| c as f64 + 0.5)?;
        let mut dst = Image::<f64, 3>::from_size_val(src.size(), 0.0)?;
        let kernel = crate::filter::kernels::gaussian_kernel_1d(5, 1.0);

        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
            separable_filter_with_strategy(&src, &mut dst, &kernel, &kernel, strategy)?;
            for (a, b) in dst.as_slice().iter().zip(src.as_slice()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_separable_filter_errors() -> Result<(), ImageError> {
        let src = Image::<f64, 1>::from_size_val([4, 4].into(), 0.0)?;
        let mut dst = Image::<f64, 1>::from_size_val([4, 4].into(), 0.0)?;
        assert_eq!(
            separable_filter(&src, &mut dst, &[0.5, 0.5], &[1.0]),
            Err(ImageError::InvalidKernelLength(2, 1))
        );
        assert_eq!(
            separable_filter(&src, &mut dst, &[], &[1.0]),
            Err(ImageError::InvalidKernelLength(0, 1))
        );

        let mut small = Image::<f64, 1>::from_size_val([3, 4].into(), 0.0)?;
        assert_eq!(
            separable_filter(&src, &mut small, &[1.0], &[1.0]),
            Err(ImageError::InvalidImageSize(4, 4, 3, 4))
        );
        Ok(())
    }
}
