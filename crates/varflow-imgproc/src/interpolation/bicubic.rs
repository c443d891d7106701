use varflow_image::Image;

use super::{clamp_coordinate, clamp_index};

// Keys cubic convolution parameter
const A: f64 = -0.5;

// weights of the taps at offsets -1, 0, 1, 2 for a fractional position `t` in [0, 1)
#[inline]
fn cubic_weights(t: f64) -> [f64; 4] {
    let near = |d: f64| ((A + 2.0) * d - (A + 3.0)) * d * d + 1.0;
    let far = |d: f64| ((A * d - 5.0 * A) * d + 8.0 * A) * d - 4.0 * A;
    [far(1.0 + t), near(t), near(1.0 - t), far(2.0 - t)]
}

/// Kernel for bicubic interpolation
///
/// Integer coordinates reproduce the stored sample exactly, which makes a zero
/// displacement warp an exact copy.
///
/// # Arguments
///
/// * `image` - The input image container, not empty.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn bicubic_interpolation<const C: usize>(
    image: &Image<f64, C>,
    u: f64,
    v: f64,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let u = clamp_coordinate(u, cols);
    let v = clamp_coordinate(v, rows);

    let u0 = u.floor();
    let v0 = v.floor();
    let wx = cubic_weights(u - u0);
    let wy = cubic_weights(v - v0);
    let (iu, iv) = (u0 as isize, v0 as isize);

    let data = image.as_slice();
    let mut pixel = [0.0; C];

    for (j, &wyj) in wy.iter().enumerate() {
        let y = clamp_index(iv + j as isize - 1, rows);
        for (i, &wxi) in wx.iter().enumerate() {
            let x = clamp_index(iu + i as isize - 1, cols);
            let w = wxi * wyj;
            let base = (y * cols + x) * C;
            pixel
                .iter_mut()
                .zip(&data[base..base + C])
                .for_each(|(p, &s)| *p += w * s);
        }
    }

    pixel
}
