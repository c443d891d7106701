use varflow_image::{ops, Image, ImageError, ImageSize};
use varflow_imgproc::interpolation::InterpolationMode;
use varflow_imgproc::parallel::ExecutionStrategy;
use varflow_imgproc::resize::resize;

use crate::error::FlowError;

/// A dense displacement field.
///
/// `u` is the horizontal and `v` the vertical displacement, in pixels, from a pixel
/// of the first frame to its match in the second frame. Both components always
/// have the same size.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    u: Image<f64, 1>,
    v: Image<f64, 1>,
}

impl FlowField {
    /// Assemble a field from its two components.
    ///
    /// # Errors
    ///
    /// The components must have the same size.
    pub fn new(u: Image<f64, 1>, v: Image<f64, 1>) -> Result<Self, FlowError> {
        if u.size() != v.size() {
            return Err(ImageError::InvalidImageSize(u.cols(), u.rows(), v.cols(), v.rows()).into());
        }
        Ok(Self { u, v })
    }

    /// A field with the same displacement everywhere.
    pub fn constant(size: ImageSize, u: f64, v: f64) -> Result<Self, FlowError> {
        Ok(Self {
            u: Image::from_size_val(size, u)?,
            v: Image::from_size_val(size, v)?,
        })
    }

    /// A zero field.
    pub fn zeros(size: ImageSize) -> Result<Self, FlowError> {
        Self::constant(size, 0.0, 0.0)
    }

    /// Size of the field in pixels.
    pub fn size(&self) -> ImageSize {
        self.u.size()
    }

    /// The horizontal component.
    pub fn u(&self) -> &Image<f64, 1> {
        &self.u
    }

    /// The vertical component.
    pub fn v(&self) -> &Image<f64, 1> {
        &self.v
    }

    /// Split the field into `(u, v)`.
    pub fn into_parts(self) -> (Image<f64, 1>, Image<f64, 1>) {
        (self.u, self.v)
    }

    /// Add an increment to both components.
    ///
    /// # Errors
    ///
    /// The increments must have the size of the field.
    pub fn add_increment(
        &mut self,
        du: &Image<f64, 1>,
        dv: &Image<f64, 1>,
    ) -> Result<(), FlowError> {
        ops::add_scaled(&mut self.u, du, 1.0)?;
        ops::add_scaled(&mut self.v, dv, 1.0)?;
        Ok(())
    }

    /// Resample the field to another resolution.
    ///
    /// Both components are resized with bicubic interpolation and the displacements
    /// are scaled by the actual size change of their axis, `width / old_width` for
    /// `u` and `height / old_height` for `v`.
    ///
    /// # Examples
    ///
    /// ```
    /// use varflow_image::ImageSize;
    /// use varflow_imgproc::parallel::ExecutionStrategy;
    /// use varflow_optflow::FlowField;
    ///
    /// let coarse = FlowField::constant(ImageSize { width: 20, height: 15 }, 1.0, -0.5).unwrap();
    /// let fine = coarse
    ///     .rescale(ImageSize { width: 40, height: 30 }, ExecutionStrategy::Serial)
    ///     .unwrap();
    ///
    /// assert!((fine.u().as_slice()[0] - 2.0).abs() < 1e-12);
    /// assert!((fine.v().as_slice()[0] + 1.0).abs() < 1e-12);
    /// ```
    pub fn rescale(
        &self,
        size: ImageSize,
        strategy: ExecutionStrategy,
    ) -> Result<FlowField, FlowError> {
        let old = self.size();
        if old.is_empty() || size.is_empty() {
            return Err(FlowError::InvalidParameter {
                name: "size",
                reason: format!("cannot rescale a flow field from {old} to {size}"),
            });
        }
        let scale_x = size.width as f64 / old.width as f64;
        let scale_y = size.height as f64 / old.height as f64;

        let mut u = Image::from_size_val(size, 0.0)?;
        let mut v = Image::from_size_val(size, 0.0)?;
        resize(&self.u, &mut u, InterpolationMode::Bicubic, strategy)?;
        resize(&self.v, &mut v, InterpolationMode::Bicubic, strategy)?;
        ops::scale(&mut u, scale_x);
        ops::scale(&mut v, scale_y);

        Ok(FlowField { u, v })
    }
}
