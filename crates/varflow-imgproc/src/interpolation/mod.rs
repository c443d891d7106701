//! Pixel interpolation methods for image resampling.
//!
//! Both kernels replicate the border: a coordinate outside the image is first
//! clamped to the nearest valid pixel position, so sampling never wraps and never
//! reads zero padding.
//!
//! # Interpolation Modes
//!
//! - **Bilinear**: linear interpolation between the four adjacent pixels
//! - **Bicubic**: cubic convolution over the 4x4 neighbourhood
//!
//! # Common Use Cases
//!
//! - Pyramid downsampling and flow upsampling with `crate::resize`
//! - Flow-driven warping with `crate::warp`

mod bicubic;
mod bilinear;
pub(crate) mod interpolate;

pub use interpolate::interpolate_pixel;
pub use interpolate::InterpolationMode;

// clamp a sample coordinate into the valid range [0, len - 1]
#[inline]
pub(crate) fn clamp_coordinate(x: f64, len: usize) -> f64 {
    x.clamp(0.0, (len - 1) as f64)
}

#[inline]
pub(crate) fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}
