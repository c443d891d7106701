//! Iteratively reweighted linearization of the flow energy.
//!
//! The estimator minimizes
//!
//! ```text
//! E(u, v) = sum psi(|I2(x + u, y + v) - I1(x, y)|^2) + alpha * sum psi(|grad u|^2 + |grad v|^2)
//! ```
//!
//! with the robust penalty `psi(s^2) = sqrt(s^2 + eps^2)`. Around the current warp the
//! data term is linearized in the increment `(du, dv)` and both penalties are replaced by
//! quadratic ones whose weights are the penalty derivatives at the current estimate.
//! The Euler-Lagrange equations of that quadratic energy form a sparse symmetric positive
//! definite system with one `(du, dv)` pair per pixel:
//!
//! ```text
//! (A11 + alpha L) du + A12 dv = b1
//! A12 du + (A22 + alpha L) dv = b2
//! ```
//!
//! where `L` is the four neighbour Laplacian weighted by the smoothness penalty.

use varflow_image::{ops, Image, ImageError, ImageSize};
use varflow_imgproc::filter::{kernels, smooth};
use varflow_imgproc::gradient::forward_gradient;
use varflow_imgproc::parallel::{self, ExecutionStrategy};
use varflow_imgproc::warp::WarpedImage;

use crate::error::{zeroed_buffer, FlowError};
use crate::field::FlowField;
use crate::params::FlowParams;

/// Square of the robust penalty constant `eps = 0.001`.
pub const EPSILON_SQ: f64 = 1e-6;

// interleaved data term coefficients per pixel: a11, a12, a22, b1, b2
const DATA_TERMS: usize = 5;

/// The linear system of one inner iteration.
///
/// Edge weights of the Laplacian are stored per pixel: `phi[o]` weights both the edge
/// from pixel `o` to its right neighbour and the edge to the pixel below it.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    size: ImageSize,
    alpha: f64,
    pub(crate) phi: Vec<f64>,
    pub(crate) a11: Vec<f64>,
    pub(crate) a12: Vec<f64>,
    pub(crate) a22: Vec<f64>,
    pub(crate) b1: Vec<f64>,
    pub(crate) b2: Vec<f64>,
    execution: ExecutionStrategy,
}

fn check_size(got: ImageSize, expected: ImageSize) -> Result<(), FlowError> {
    if got != expected {
        return Err(ImageError::InvalidImageSize(
            got.width,
            got.height,
            expected.width,
            expected.height,
        )
        .into());
    }
    Ok(())
}

/// Robust smoothness weights `0.5 / sqrt(|grad u|^2 + |grad v|^2 + eps^2)` from forward differences.
fn smoothness_weights(u: &Image<f64, 1>, v: &Image<f64, 1>) -> Result<Vec<f64>, FlowError> {
    let size = u.size();
    let mut ux = Image::from_size_val(size, 0.0)?;
    let mut uy = Image::from_size_val(size, 0.0)?;
    let mut vx = Image::from_size_val(size, 0.0)?;
    let mut vy = Image::from_size_val(size, 0.0)?;
    forward_gradient(u, &mut ux, &mut uy)?;
    forward_gradient(v, &mut vx, &mut vy)?;

    let mut phi = zeroed_buffer(size.area())?;
    for (i, w) in phi.iter_mut().enumerate() {
        let (a, b) = (ux.as_slice()[i], uy.as_slice()[i]);
        let (c, d) = (vx.as_slice()[i], vy.as_slice()[i]);
        *w = 0.5 / (a * a + b * b + c * c + d * d + EPSILON_SQ).sqrt();
    }
    Ok(phi)
}

/// `out[o] = sum over neighbours n of w(o, n) * (x[o] - x[n])` for one image row.
#[inline]
fn laplacian_row(phi: &[f64], x: &[f64], width: usize, height: usize, r: usize, out: &mut [f64]) {
    for (c, value) in out.iter_mut().enumerate() {
        let o = r * width + c;
        let xo = x[o];
        let mut acc = 0.0;
        if c > 0 {
            acc += phi[o - 1] * (xo - x[o - 1]);
        }
        if c + 1 < width {
            acc += phi[o] * (xo - x[o + 1]);
        }
        if r > 0 {
            acc += phi[o - width] * (xo - x[o - width]);
        }
        if r + 1 < height {
            acc += phi[o] * (xo - x[o + width]);
        }
        *value = acc;
    }
}

impl LinearSystem {
    /// Assemble the system for the current estimate.
    ///
    /// # Arguments
    ///
    /// * `derivatives` - The warped second frame and the derivatives of the pair.
    /// * `flow` - The flow the warp was computed with.
    /// * `du` - The current horizontal increment, used for the robust weights.
    /// * `dv` - The current vertical increment, used for the robust weights.
    /// * `params` - Provides `alpha`, the data term smoothing and regularizer, and the execution strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs disagree in size or a buffer cannot be allocated.
    pub fn build<const C: usize>(
        derivatives: &WarpedImage<C>,
        flow: &FlowField,
        du: &Image<f64, 1>,
        dv: &Image<f64, 1>,
        params: &FlowParams,
    ) -> Result<Self, FlowError> {
        let size = derivatives.size();
        check_size(flow.size(), size)?;
        check_size(du.size(), size)?;
        check_size(dv.size(), size)?;

        let alpha = params.alpha;
        let strategy = params.execution;
        let (width, height) = (size.width, size.height);

        // robust smoothness weights at u + du, v + dv
        let mut uu = Image::from_size_val(size, 0.0)?;
        let mut vv = Image::from_size_val(size, 0.0)?;
        ops::add(flow.u(), du, &mut uu)?;
        ops::add(flow.v(), dv, &mut vv)?;
        let phi = smoothness_weights(&uu, &vv)?;

        // data term, one robust weight per channel summed over channels
        let (ix, iy, it) = (
            derivatives.dx.as_slice(),
            derivatives.dy.as_slice(),
            derivatives.dt.as_slice(),
        );
        let (du_data, dv_data) = (du.as_slice(), dv.as_slice());
        let mut data_term = Image::<f64, DATA_TERMS>::from_size_val(size, 0.0)?;
        parallel::for_each_pixel(&mut data_term, strategy, |x, y, coeffs| {
            let o = y * width + x;
            coeffs.fill(0.0);
            for k in 0..C {
                let (gx, gy, gt) = (ix[o * C + k], iy[o * C + k], it[o * C + k]);
                let residual = gt + gx * du_data[o] + gy * dv_data[o];
                let psi = 0.5 / (residual * residual + EPSILON_SQ).sqrt();
                coeffs[0] += psi * gx * gx;
                coeffs[1] += psi * gx * gy;
                coeffs[2] += psi * gy * gy;
                coeffs[3] += psi * gx * gt;
                coeffs[4] += psi * gy * gt;
            }
        });

        if params.smooth_data_term {
            let mut smoothed = Image::<f64, DATA_TERMS>::from_size_val(size, 0.0)?;
            smooth(&data_term, &mut smoothed, &kernels::tent_kernel_1d(3.0), strategy)?;
            data_term = smoothed;
        }

        // smoothness contribution of the current flow to the right hand side
        let mut lap_u = zeroed_buffer(size.area())?;
        let mut lap_v = zeroed_buffer(size.area())?;
        let (u_data, v_data) = (flow.u().as_slice(), flow.v().as_slice());
        parallel::for_each_row_pair(
            &mut lap_u,
            width,
            &mut lap_v,
            width,
            strategy,
            |r, row_u, row_v| {
                laplacian_row(&phi, u_data, width, height, r, row_u);
                laplacian_row(&phi, v_data, width, height, r, row_v);
            },
        );

        let n = size.area();
        let mut a11 = zeroed_buffer(n)?;
        let mut a12 = zeroed_buffer(n)?;
        let mut a22 = zeroed_buffer(n)?;
        let mut b1 = zeroed_buffer(n)?;
        let mut b2 = zeroed_buffer(n)?;
        let diagonal = params.data_regularizer * alpha;
        for (o, coeffs) in data_term.as_slice().chunks_exact(DATA_TERMS).enumerate() {
            a11[o] = coeffs[0] + diagonal;
            a12[o] = coeffs[1];
            a22[o] = coeffs[2] + diagonal;
            b1[o] = -coeffs[3] - alpha * lap_u[o];
            b2[o] = -coeffs[4] - alpha * lap_v[o];
        }

        Ok(Self {
            size,
            alpha,
            phi,
            a11,
            a12,
            a22,
            b1,
            b2,
            execution: strategy,
        })
    }

    /// Size of the flow field the system is defined on.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Number of pixels, i.e. of `(du, dv)` unknown pairs.
    pub fn len(&self) -> usize {
        self.a11.len()
    }

    /// Whether the system has no unknowns.
    pub fn is_empty(&self) -> bool {
        self.a11.is_empty()
    }

    /// The smoothness weight the system was built with.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The right hand side `(b1, b2)`.
    pub fn rhs(&self) -> (&[f64], &[f64]) {
        (&self.b1, &self.b2)
    }

    /// Matrix-vector product `(y1, y2) = A (x1, x2)`.
    ///
    /// PRECONDITION: all slices have [`LinearSystem::len`] elements.
    pub fn apply(&self, x1: &[f64], x2: &[f64], y1: &mut [f64], y2: &mut [f64]) {
        let (width, height) = (self.size.width, self.size.height);
        let alpha = self.alpha;
        parallel::for_each_row_pair(y1, width, y2, width, self.execution, |r, row1, row2| {
            laplacian_row(&self.phi, x1, width, height, r, row1);
            laplacian_row(&self.phi, x2, width, height, r, row2);
            for c in 0..width {
                let o = r * width + c;
                row1[c] = self.a11[o] * x1[o] + self.a12[o] * x2[o] + alpha * row1[c];
                row2[c] = self.a12[o] * x1[o] + self.a22[o] * x2[o] + alpha * row2[c];
            }
        });
    }

    /// Residual `(r1, r2) = b - A (x1, x2)`.
    ///
    /// PRECONDITION: all slices have [`LinearSystem::len`] elements.
    pub fn residual(&self, x1: &[f64], x2: &[f64], r1: &mut [f64], r2: &mut [f64]) {
        self.apply(x1, x2, r1, r2);
        r1.iter_mut().zip(&self.b1).for_each(|(r, &b)| *r = b - *r);
        r2.iter_mut().zip(&self.b2).for_each(|(r, &b)| *r = b - *r);
    }

    /// Squared norm of the residual at `(x1, x2)`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::AllocationFailure`] if the work buffers cannot be allocated.
    pub fn residual_norm_sq(&self, x1: &[f64], x2: &[f64]) -> Result<f64, FlowError> {
        let mut r1 = zeroed_buffer(self.len())?;
        let mut r2 = zeroed_buffer(self.len())?;
        self.residual(x1, x2, &mut r1, &mut r2);
        Ok(dot(&r1, &r1) + dot(&r2, &r2))
    }
}

/// Dot product accumulated sequentially, so results do not depend on the thread count.
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
