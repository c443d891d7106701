use varflow_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy};

/// Define the RGB weights for the grayscale conversion.
const RW: f64 = 0.299;
const GW: f64 = 0.587;
const BW: f64 = 0.114;

/// Convert an RGB image to grayscale using the formula:
///
/// Y = 0.299 * R + 0.587 * G + 0.114 * B
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output grayscale image.
/// * `strategy` - The execution strategy.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use varflow_image::Image;
/// use varflow_imgproc::color::gray_from_rgb;
/// use varflow_imgproc::parallel::ExecutionStrategy;
///
/// let image = Image::<f64, 3>::from_size_val([4, 5].into(), 1.0).unwrap();
/// let mut gray = Image::<f64, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// gray_from_rgb(&image, &mut gray, ExecutionStrategy::Serial).unwrap();
/// assert!((gray.as_slice()[0] - 1.0).abs() < 1e-12);
/// ```
pub fn gray_from_rgb(
    src: &Image<f64, 3>,
    dst: &mut Image<f64, 1>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let cols = src.cols();
    let src_data = src.as_slice();
    parallel::for_each_row(dst.as_slice_mut(), cols, strategy, |r, row| {
        let src_row = &src_data[r * cols * 3..(r + 1) * cols * 3];
        row.iter_mut()
            .zip(src_row.chunks_exact(3))
            .for_each(|(g, rgb)| *g = RW * rgb[0] + GW * rgb[1] + BW * rgb[2]);
    });

    Ok(())
}
