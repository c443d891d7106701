use std::time::Instant;

use varflow_image::{Image, ImageView};
use varflow_imgproc::pyramid::GaussianPyramid;
use varflow_imgproc::warp::{warp_flow, WarpedImage};

use crate::error::FlowError;
use crate::field::FlowField;
use crate::linearize::LinearSystem;
use crate::params::{FlowParams, SolverKind};
use crate::solver::{ConjugateGradient, FlowSolver, SuccessiveOverRelaxation};

/// Result of a flow computation.
#[derive(Debug, Clone)]
pub struct FlowOutput<const C: usize> {
    /// The flow from the first to the second frame at full resolution.
    pub flow: FlowField,
    /// The second frame warped onto the first with the final flow.
    pub warped: Image<f64, C>,
}

/// Coarse-to-fine variational optical flow estimator.
///
/// Both frames are decomposed into Gaussian pyramids with the same number of levels.
/// Starting from a zero flow at the coarsest level, every level runs
/// `outer_iterations` re-warping steps, each followed by `inner_iterations` robust
/// re-weighting steps that solve the linearized system with the solver `S`. The
/// flow of a level is upsampled to initialize the next finer one.
///
/// # Examples
///
/// ```
/// use varflow_image::Image;
/// use varflow_optflow::{Coarse2FineFlow, ConjugateGradient, FlowParams};
///
/// let image = Image::<f64, 1>::from_size_fn([32, 24].into(), |x, y, _| {
///     0.5 + 0.25 * (x as f64 / 3.0).sin() * (y as f64 / 4.0).cos()
/// })
/// .unwrap();
///
/// let params = FlowParams::conjugate_gradient().with_min_width(16);
/// let estimator = Coarse2FineFlow::new(params, ConjugateGradient::default()).unwrap();
/// let output = estimator.compute(image.view(), image.view()).unwrap();
///
/// assert!(output.flow.u().as_slice().iter().all(|&u| u == 0.0));
/// assert_eq!(output.warped.size(), image.size());
/// ```
#[derive(Debug, Clone)]
pub struct Coarse2FineFlow<S: FlowSolver> {
    params: FlowParams,
    solver: S,
}

impl<S: FlowSolver> Coarse2FineFlow<S> {
    /// Create an estimator.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidParameter`] if `params` does not validate.
    pub fn new(params: FlowParams, solver: S) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self { params, solver })
    }

    /// The configuration of the estimator.
    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    /// The linear solver of the estimator.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Estimate the flow from `image1` to `image2`.
    ///
    /// # Arguments
    ///
    /// * `image1` - The first frame.
    /// * `image2` - The second frame, with the size and channel count of `image1`.
    ///
    /// # Returns
    ///
    /// The flow at the resolution of the inputs and `image2` warped with it.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::ShapeMismatch`] if the frames differ in size, and
    /// [`FlowError::InvalidParameter`] if they are empty. Nothing is computed in either case.
    pub fn compute<const C: usize>(
        &self,
        image1: ImageView<'_, f64, C>,
        image2: ImageView<'_, f64, C>,
    ) -> Result<FlowOutput<C>, FlowError> {
        let (size1, size2) = (image1.size(), image2.size());
        if size1 != size2 {
            return Err(FlowError::ShapeMismatch {
                width1: size1.width,
                height1: size1.height,
                channels1: C,
                width2: size2.width,
                height2: size2.height,
                channels2: C,
            });
        }
        if size1.is_empty() {
            return Err(FlowError::InvalidParameter {
                name: "image",
                reason: format!("cannot estimate flow on an empty {size1} image"),
            });
        }

        let params = &self.params;
        let start = Instant::now();

        let pyramid1 = GaussianPyramid::new(image1, params.ratio, params.min_width, params.execution)?;
        let pyramid2 =
            GaussianPyramid::with_levels(image2, params.ratio, pyramid1.len(), params.execution)?;
        let (levels1, levels2) = (pyramid1.levels(), pyramid2.levels());

        log::debug!(
            "{} flow on {size1}x{C}: {} levels, ratio {}, alpha {}",
            self.solver.name(),
            levels1.len(),
            pyramid1.ratio(),
            params.alpha,
        );

        let coarsest = levels1.len() - 1;
        let mut flow = FlowField::zeros(levels1[coarsest].size())?;

        for level in (0..levels1.len()).rev() {
            let (frame1, frame2) = (&levels1[level], &levels2[level]);
            if level != coarsest {
                flow = flow.rescale(frame1.size(), params.execution)?;
            }
            self.refine_level(level, frame1, frame2, &mut flow)?;
        }

        let mut warped = Image::from_size_val(size1, 0.0)?;
        warp_flow(
            &levels2[0],
            &levels1[0],
            flow.u(),
            flow.v(),
            &mut warped,
            params.border,
            params.execution,
        )?;

        log::debug!(
            "{} flow on {size1} finished in {:?}",
            self.solver.name(),
            start.elapsed()
        );

        Ok(FlowOutput { flow, warped })
    }

    fn refine_level<const C: usize>(
        &self,
        level: usize,
        image1: &Image<f64, C>,
        image2: &Image<f64, C>,
        flow: &mut FlowField,
    ) -> Result<(), FlowError> {
        let params = &self.params;
        let size = image1.size();
        let mut du = Image::from_size_val(size, 0.0)?;
        let mut dv = Image::from_size_val(size, 0.0)?;
        let mut last_residual = 0.0;

        for outer in 0..params.outer_iterations {
            let derivatives = WarpedImage::compute(
                image1,
                image2,
                flow.u(),
                flow.v(),
                params.border,
                params.execution,
            )?;
            du.fill(0.0);
            dv.fill(0.0);

            for inner in 0..params.inner_iterations {
                // weights come from the previous increment, the solve restarts from zero
                let system = LinearSystem::build(&derivatives, flow, &du, &dv, params)?;
                du.fill(0.0);
                dv.fill(0.0);
                let report = self.solver.solve(
                    &system,
                    params.solver_iterations,
                    du.as_slice_mut(),
                    dv.as_slice_mut(),
                )?;
                log::trace!(
                    "level {level} outer {outer} inner {inner}: {} iterations, residual {:e}",
                    report.iterations,
                    report.residual_norm_sq
                );
                last_residual = report.residual_norm_sq;
            }

            flow.add_increment(&du, &dv)?;
        }

        log::debug!("level {level} ({size}): final residual {last_residual:e}");

        Ok(())
    }
}

/// Estimate the flow between two frames with the solver named by `params.solver`.
///
/// # Errors
///
/// See [`Coarse2FineFlow::new`] and [`Coarse2FineFlow::compute`].
pub fn coarse2fine_flow<const C: usize>(
    image1: ImageView<'_, f64, C>,
    image2: ImageView<'_, f64, C>,
    params: &FlowParams,
) -> Result<FlowOutput<C>, FlowError> {
    match params.solver {
        SolverKind::ConjugateGradient => {
            Coarse2FineFlow::new(*params, ConjugateGradient::default())?.compute(image1, image2)
        }
        SolverKind::SuccessiveOverRelaxation => {
            Coarse2FineFlow::new(*params, SuccessiveOverRelaxation::default())?
                .compute(image1, image2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Mutex;
    use varflow_image::ImageSize;

    // collects warnings of the whole test binary
    struct WarningLog(Mutex<Vec<String>>);

    impl log::Log for WarningLog {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                if let Ok(mut messages) = self.0.lock() {
                    messages.push(record.args().to_string());
                }
            }
        }

        fn flush(&self) {}
    }

    static WARNINGS: WarningLog = WarningLog(Mutex::new(Vec::new()));

    fn pattern(size: ImageSize) -> Result<Image<f64, 3>, FlowError> {
        Ok(Image::from_size_fn(size, |x, y, c| {
            let (x, y) = (x as f64, y as f64);
            0.5 + 0.2 * ((x + 3.0 * c as f64) / 5.0).sin() * (y / 7.0).cos()
        })?)
    }

    #[test]
    fn identical_frames_give_zero_flow() -> Result<(), FlowError> {
        let image = pattern([40, 30].into())?;
        for params in [
            FlowParams::conjugate_gradient().with_outer_iterations(3),
            FlowParams::successive_over_relaxation().with_min_width(20),
        ] {
            let output = coarse2fine_flow(image.view(), image.view(), &params)?;
            assert!(output.flow.u().as_slice().iter().all(|&u| u == 0.0));
            assert!(output.flow.v().as_slice().iter().all(|&v| v == 0.0));
            for (&w, &p) in output.warped.as_slice().iter().zip(image.as_slice()) {
                assert_relative_eq!(w, p, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn shape_mismatch_is_rejected() -> Result<(), FlowError> {
        let image1 = pattern([32, 24].into())?;
        let image2 = pattern([32, 25].into())?;
        let result = coarse2fine_flow(image1.view(), image2.view(), &FlowParams::default());
        assert!(matches!(
            result,
            Err(FlowError::ShapeMismatch {
                height1: 24,
                height2: 25,
                channels1: 3,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn invalid_parameters_are_rejected() -> Result<(), FlowError> {
        let image = pattern([16, 16].into())?;
        let params = FlowParams::default().with_alpha(0.0);
        assert!(matches!(
            coarse2fine_flow(image.view(), image.view(), &params),
            Err(FlowError::InvalidParameter { name: "alpha", .. })
        ));
        assert!(Coarse2FineFlow::new(
            FlowParams::default().with_min_width(0),
            SuccessiveOverRelaxation::default()
        )
        .is_err());
        Ok(())
    }

    #[test]
    fn empty_frames_are_rejected() -> Result<(), FlowError> {
        let empty = Image::<f64, 1>::new([0, 0].into(), vec![])?;
        let result = coarse2fine_flow(empty.view(), empty.view(), &FlowParams::default());
        assert!(matches!(
            result,
            Err(FlowError::InvalidParameter { name: "image", .. })
        ));
        Ok(())
    }

    #[test]
    fn output_matches_input_shape() -> Result<(), FlowError> {
        let image1 = pattern([37, 29].into())?;
        let image2 = Image::from_size_fn(image1.size(), |x, y, c| {
            image1.get([y, x.saturating_sub(1), c]).copied().unwrap_or(0.0)
        })?;
        let params = FlowParams::conjugate_gradient()
            .with_min_width(12)
            .with_outer_iterations(2)
            .with_solver_iterations(10);
        let output = coarse2fine_flow(image1.view(), image2.view(), &params)?;

        assert_eq!(output.flow.size(), image1.size());
        assert_eq!(output.warped.size(), image1.size());
        assert!(output
            .flow
            .u()
            .as_slice()
            .iter()
            .chain(output.flow.v().as_slice())
            .all(|x| x.is_finite()));
        Ok(())
    }

    #[test]
    fn ratio_defaulting_warns_once() -> Result<(), FlowError> {
        let _ = log::set_logger(&WARNINGS);
        log::set_max_level(log::LevelFilter::Warn);

        let image = pattern([40, 30].into())?;
        let params = FlowParams::conjugate_gradient()
            .with_ratio(0.1234)
            .with_min_width(16)
            .with_outer_iterations(1);
        coarse2fine_flow(image.view(), image.view(), &params)?;

        let count = WARNINGS
            .0
            .lock()
            .map(|messages| messages.iter().filter(|m| m.contains("0.1234")).count())
            .unwrap_or_default();
        assert_eq!(count, 1);
        Ok(())
    }
}
