use rand::{rngs::StdRng, Rng, SeedableRng};
use varflow_image::{Image, ImageSize};
use varflow_imgproc::parallel::ExecutionStrategy;
use varflow_imgproc::pyramid::GaussianPyramid;
use varflow_optflow::metrics::{average_endpoint_error, flow_statistics};
use varflow_optflow::{coarse2fine_flow, FlowError, FlowField, FlowParams, SolverKind};

fn texture(x: f64, y: f64) -> f64 {
    use std::f64::consts::TAU;
    0.5 + 0.2 * (TAU * x / 17.0).sin() * (TAU * y / 23.0).cos()
        + 0.15 * (TAU * (x + 2.0 * y) / 29.0).sin()
        + 0.1 * (TAU * (2.0 * x - y) / 19.0).cos()
}

/// A frame and the same frame translated by `(dx, dy)`.
fn translated_pair(
    size: ImageSize,
    dx: f64,
    dy: f64,
) -> Result<(Image<f64, 1>, Image<f64, 1>), FlowError> {
    let image1 = Image::from_size_fn(size, |x, y, _| texture(x as f64, y as f64))?;
    let image2 = Image::from_size_fn(size, |x, y, _| texture(x as f64 - dx, y as f64 - dy))?;
    Ok((image1, image2))
}

fn translation_error(params: &FlowParams) -> Result<f64, FlowError> {
    let size = ImageSize {
        width: 64,
        height: 64,
    };
    let (dx, dy) = (1.25, -0.75);
    let (image1, image2) = translated_pair(size, dx, dy)?;
    let output = coarse2fine_flow(image1.view(), image2.view(), params)?;
    let truth = FlowField::constant(size, dx, dy)?;
    average_endpoint_error(&output.flow, &truth, 10)
}

fn translation_params(solver: SolverKind) -> FlowParams {
    FlowParams::for_solver(solver)
        .with_alpha(0.05)
        .with_ratio(0.75)
        .with_min_width(20)
        .with_outer_iterations(12)
        .with_inner_iterations(1)
        .with_solver_iterations(40)
}

#[test]
fn conjugate_gradient_recovers_translation() -> Result<(), FlowError> {
    let error = translation_error(&translation_params(SolverKind::ConjugateGradient))?;
    assert!(error < 0.25, "endpoint error {error}");
    Ok(())
}

#[test]
fn successive_over_relaxation_recovers_translation() -> Result<(), FlowError> {
    let error = translation_error(&translation_params(SolverKind::SuccessiveOverRelaxation))?;
    assert!(error < 0.25, "endpoint error {error}");
    Ok(())
}

#[test]
fn more_solver_iterations_are_more_accurate() -> Result<(), FlowError> {
    // a single outer iteration, so the solve rather than the re-warping limits accuracy
    for solver in [
        SolverKind::ConjugateGradient,
        SolverKind::SuccessiveOverRelaxation,
    ] {
        let params = translation_params(solver).with_outer_iterations(1);
        let few = translation_error(&params.with_solver_iterations(5))?;
        let many = translation_error(&params.with_solver_iterations(40))?;
        assert!(many < few, "{solver}: {many} >= {few}");
        assert!(many < 0.1, "{solver}: endpoint error {many}");
    }
    Ok(())
}

#[test]
fn multichannel_frames() -> Result<(), FlowError> {
    let size = ImageSize {
        width: 48,
        height: 48,
    };
    let (dx, dy) = (0.75, 0.5);
    let image1 = Image::<f64, 3>::from_size_fn(size, |x, y, c| {
        texture(x as f64 + 5.0 * c as f64, y as f64)
    })?;
    let image2 = Image::<f64, 3>::from_size_fn(size, |x, y, c| {
        texture(x as f64 - dx + 5.0 * c as f64, y as f64 - dy)
    })?;
    let params = translation_params(SolverKind::ConjugateGradient).with_min_width(16);
    let output = coarse2fine_flow(image1.view(), image2.view(), &params)?;

    assert_eq!(output.warped.num_channels(), 3);
    let truth = FlowField::constant(size, dx, dy)?;
    let error = average_endpoint_error(&output.flow, &truth, 8)?;
    assert!(error < 0.25, "endpoint error {error}");
    Ok(())
}

#[test]
fn larger_alpha_gives_smoother_flow() -> Result<(), FlowError> {
    let size = ImageSize {
        width: 48,
        height: 40,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let mut noisy = |dx: f64| {
        Image::<f64, 1>::from_size_fn(size, |x, y, _| {
            texture(x as f64 - dx, y as f64) + rng.random_range(-0.08..0.08)
        })
    };
    let image1 = noisy(0.0)?;
    let image2 = noisy(0.5)?;

    let variance = |alpha: f64| -> Result<f64, FlowError> {
        let params = FlowParams::conjugate_gradient()
            .with_alpha(alpha)
            .with_min_width(16)
            .with_outer_iterations(5)
            .with_solver_iterations(30);
        let output = coarse2fine_flow(image1.view(), image2.view(), &params)?;
        let stats = flow_statistics(&output.flow);
        Ok(stats.variance_u + stats.variance_v)
    };

    let rough = variance(0.005)?;
    let smooth = variance(2.0)?;
    assert!(smooth < rough, "{smooth} >= {rough}");
    Ok(())
}

#[test]
fn identity_pair_gives_zero_flow() -> Result<(), FlowError> {
    let (image, _) = translated_pair([50, 36].into(), 0.0, 0.0)?;
    for solver in [
        SolverKind::ConjugateGradient,
        SolverKind::SuccessiveOverRelaxation,
    ] {
        let params = FlowParams::for_solver(solver)
            .with_min_width(12)
            .with_execution(ExecutionStrategy::Parallel);
        let output = coarse2fine_flow(image.view(), image.view(), &params)?;
        let stats = flow_statistics(&output.flow);
        assert_eq!(stats.max_magnitude, 0.0);
        for (&w, &p) in output.warped.as_slice().iter().zip(image.as_slice()) {
            approx::assert_relative_eq!(w, p, epsilon = 1e-12);
        }
    }
    Ok(())
}

#[test]
fn mismatched_frames_are_rejected() -> Result<(), FlowError> {
    let image1 = Image::<f64, 1>::from_size_val([32, 24].into(), 0.5)?;
    let image2 = Image::<f64, 1>::from_size_val([32, 25].into(), 0.5)?;
    let result = coarse2fine_flow(image1.view(), image2.view(), &FlowParams::default());
    assert!(matches!(result, Err(FlowError::ShapeMismatch { .. })));
    Ok(())
}

#[test]
fn level_count_follows_the_closed_form() -> Result<(), FlowError> {
    let image = Image::<f64, 1>::from_size_val([480, 64].into(), 0.25)?;
    for params in [
        FlowParams::conjugate_gradient(),
        FlowParams::successive_over_relaxation()
            .with_ratio(0.75)
            .with_min_width(30),
    ] {
        let expected = ((30.0f64 / 480.0).ln() / 0.75f64.ln()) as usize;
        assert_eq!(params.num_levels(480), expected);

        let pyramid = GaussianPyramid::new(
            image.view(),
            params.ratio,
            params.min_width,
            ExecutionStrategy::Auto,
        )?;
        assert_eq!(pyramid.len(), expected);
    }
    Ok(())
}
