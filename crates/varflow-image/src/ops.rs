use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

use crate::{Image, ImageError, ImageSize};

fn check_same_size(got: ImageSize, expected: ImageSize) -> Result<(), ImageError> {
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

/// Compute `dst = src1 + src2` element-wise.
///
/// # Errors
///
/// The three images must have the same size.
pub fn add<T, const C: usize>(
    src1: &Image<T, C>,
    src2: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Copy + Add<Output = T>,
{
    check_same_size(src2.size(), src1.size())?;
    check_same_size(dst.size(), src1.size())?;

    dst.as_slice_mut()
        .iter_mut()
        .zip(src1.as_slice().iter().zip(src2.as_slice()))
        .for_each(|(d, (&a, &b))| *d = a + b);

    Ok(())
}

/// Compute `dst = src1 - src2` element-wise.
///
/// # Errors
///
/// The three images must have the same size.
pub fn sub<T, const C: usize>(
    src1: &Image<T, C>,
    src2: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Copy + Sub<Output = T>,
{
    check_same_size(src2.size(), src1.size())?;
    check_same_size(dst.size(), src1.size())?;

    dst.as_slice_mut()
        .iter_mut()
        .zip(src1.as_slice().iter().zip(src2.as_slice()))
        .for_each(|(d, (&a, &b))| *d = a - b);

    Ok(())
}

/// Multiply every sample of `image` by `factor` in place.
pub fn scale<T, const C: usize>(image: &mut Image<T, C>, factor: T)
where
    T: Copy + MulAssign,
{
    image.as_slice_mut().iter_mut().for_each(|x| *x *= factor);
}

/// Accumulate `dst += alpha * src` element-wise.
///
/// # Errors
///
/// Both images must have the same size.
///
/// # Examples
///
/// ```
/// use varflow_image::{ops, Image};
///
/// let mut u = Image::<f64, 1>::from_size_val([2, 2].into(), 1.0).unwrap();
/// let du = Image::<f64, 1>::from_size_val([2, 2].into(), 0.5).unwrap();
///
/// ops::add_scaled(&mut u, &du, 2.0).unwrap();
/// assert_eq!(u.as_slice(), &[2.0; 4]);
/// ```
pub fn add_scaled<T, const C: usize>(
    dst: &mut Image<T, C>,
    src: &Image<T, C>,
    alpha: T,
) -> Result<(), ImageError>
where
    T: Copy + Mul<Output = T> + AddAssign,
{
    check_same_size(src.size(), dst.size())?;

    dst.as_slice_mut()
        .iter_mut()
        .zip(src.as_slice())
        .for_each(|(d, &s)| *d += alpha * s);

    Ok(())
}

/// Cast the samples of `src` to another type and multiply them by `scale`.
///
/// # Errors
///
/// Returns [`ImageError::CastError`] if a sample is not representable in `U`.
///
/// # Examples
///
/// ```
/// use varflow_image::{ops, Image};
///
/// let image_u8 = Image::<u8, 3>::from_size_val([2, 1].into(), 255).unwrap();
/// let image_f64 = ops::cast_and_scale::<u8, f64, 3>(&image_u8, 1.0 / 255.0).unwrap();
///
/// assert_eq!(image_f64.get([0, 1, 2]), Some(&1.0));
/// ```
pub fn cast_and_scale<T, U, const C: usize>(
    src: &Image<T, C>,
    scale: U,
) -> Result<Image<U, C>, ImageError>
where
    T: Copy + num_traits::NumCast,
    U: num_traits::NumCast + Mul<Output = U> + Copy,
{
    let casted = src
        .as_slice()
        .iter()
        .map(|&x| {
            let xu = U::from(x).ok_or(ImageError::CastError)?;
            Ok(xu * scale)
        })
        .collect::<Result<Vec<U>, ImageError>>()?;

    Image::new(src.size(), casted)
}
