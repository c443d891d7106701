use std::fmt;
use std::str::FromStr;

use varflow_imgproc::parallel::ExecutionStrategy;
use varflow_imgproc::pyramid;
use varflow_imgproc::warp::WarpBorder;

use crate::error::FlowError;

/// The linear solver used for the flow increment at every inner iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SolverKind {
    /// Conjugate gradient on the symmetric positive definite system.
    #[default]
    ConjugateGradient,
    /// Successive over-relaxation (weighted Gauss-Seidel sweeps).
    SuccessiveOverRelaxation,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::ConjugateGradient => write!(f, "cg"),
            SolverKind::SuccessiveOverRelaxation => write!(f, "sor"),
        }
    }
}

impl FromStr for SolverKind {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cg" | "conjugate_gradient" => Ok(SolverKind::ConjugateGradient),
            "sor" | "successive_over_relaxation" => Ok(SolverKind::SuccessiveOverRelaxation),
            other => Err(FlowError::InvalidParameter {
                name: "solver",
                reason: format!("unknown solver `{other}`, expected `cg` or `sor`"),
            }),
        }
    }
}

/// Configuration of the coarse-to-fine estimator.
///
/// The two presets reproduce the usual settings of each solver; individual values
/// can be adjusted with the `with_*` builders.
///
/// # Examples
///
/// ```
/// use varflow_optflow::{FlowParams, SolverKind};
///
/// let params = FlowParams::successive_over_relaxation()
///     .with_alpha(0.5)
///     .with_outer_iterations(8);
///
/// assert_eq!(params.solver, SolverKind::SuccessiveOverRelaxation);
/// assert_eq!(params.min_width, 40);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FlowParams {
    /// Weight of the smoothness term, strictly positive.
    pub alpha: f64,
    /// Downsampling ratio between pyramid levels; values outside `[0.4, 0.98]` become 0.75.
    pub ratio: f64,
    /// Target width of the coarsest pyramid level, at least 1.
    pub min_width: usize,
    /// Re-warping iterations per pyramid level.
    pub outer_iterations: usize,
    /// Robust re-weighting iterations per outer iteration.
    pub inner_iterations: usize,
    /// Iterations of the linear solver per inner iteration.
    pub solver_iterations: usize,
    /// The linear solver.
    pub solver: SolverKind,
    /// Smooth the data term coefficients with `[0.2, 0.6, 0.2]` before solving.
    pub smooth_data_term: bool,
    /// Diagonal stabiliser added to the data term, as a multiple of `alpha`.
    pub data_regularizer: f64,
    /// Handling of warped samples that leave the image.
    pub border: WarpBorder,
    /// Execution strategy of the image kernels.
    pub execution: ExecutionStrategy,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self::conjugate_gradient()
    }
}

impl FlowParams {
    /// Settings for the conjugate gradient solver.
    pub fn conjugate_gradient() -> Self {
        Self {
            alpha: 0.02,
            ratio: 0.75,
            min_width: 30,
            outer_iterations: 20,
            inner_iterations: 1,
            solver_iterations: 50,
            solver: SolverKind::ConjugateGradient,
            smooth_data_term: true,
            data_regularizer: 0.1,
            border: WarpBorder::Replicate,
            execution: ExecutionStrategy::Auto,
        }
    }

    /// Settings for the successive over-relaxation solver.
    pub fn successive_over_relaxation() -> Self {
        Self {
            alpha: 1.0,
            ratio: 0.5,
            min_width: 40,
            outer_iterations: 4,
            inner_iterations: 1,
            solver_iterations: 20,
            solver: SolverKind::SuccessiveOverRelaxation,
            smooth_data_term: false,
            data_regularizer: 0.05,
            border: WarpBorder::Replicate,
            execution: ExecutionStrategy::Auto,
        }
    }

    /// The preset of the given solver.
    pub fn for_solver(solver: SolverKind) -> Self {
        match solver {
            SolverKind::ConjugateGradient => Self::conjugate_gradient(),
            SolverKind::SuccessiveOverRelaxation => Self::successive_over_relaxation(),
        }
    }

    /// Set the smoothness weight.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the pyramid downsampling ratio.
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set the target width of the coarsest level.
    pub fn with_min_width(mut self, min_width: usize) -> Self {
        self.min_width = min_width;
        self
    }

    /// Set the number of outer iterations.
    pub fn with_outer_iterations(mut self, iterations: usize) -> Self {
        self.outer_iterations = iterations;
        self
    }

    /// Set the number of inner iterations.
    pub fn with_inner_iterations(mut self, iterations: usize) -> Self {
        self.inner_iterations = iterations;
        self
    }

    /// Set the number of solver iterations.
    pub fn with_solver_iterations(mut self, iterations: usize) -> Self {
        self.solver_iterations = iterations;
        self
    }

    /// Set the linear solver, keeping every other value.
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Enable or disable the data term smoothing.
    pub fn with_smooth_data_term(mut self, smooth: bool) -> Self {
        self.smooth_data_term = smooth;
        self
    }

    /// Set the data term stabiliser.
    pub fn with_data_regularizer(mut self, regularizer: f64) -> Self {
        self.data_regularizer = regularizer;
        self
    }

    /// Set the warp border handling.
    pub fn with_border(mut self, border: WarpBorder) -> Self {
        self.border = border;
        self
    }

    /// Set the execution strategy.
    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = execution;
        self
    }

    /// Check every value except the ratio, which is defaulted instead.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidParameter`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), FlowError> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(FlowError::InvalidParameter {
                name: "alpha",
                reason: format!("must be positive and finite, got {}", self.alpha),
            });
        }
        if self.min_width < 1 {
            return Err(FlowError::InvalidParameter {
                name: "min_width",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.data_regularizer.is_finite() || self.data_regularizer < 0.0 {
            return Err(FlowError::InvalidParameter {
                name: "data_regularizer",
                reason: format!(
                    "must be non-negative and finite, got {}",
                    self.data_regularizer
                ),
            });
        }
        Ok(())
    }

    /// The pyramid ratio after defaulting.
    pub fn effective_ratio(&self) -> f64 {
        pyramid::effective_ratio(self.ratio)
    }

    /// Number of pyramid levels used for an image of `width` pixels.
    pub fn num_levels(&self, width: usize) -> usize {
        pyramid::num_levels(width, self.ratio, self.min_width)
    }
}
