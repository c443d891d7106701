#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// coarse-to-fine flow estimation.
pub mod coarse2fine;

/// Error types for the optical flow module.
pub mod error;

/// dense displacement fields.
pub mod field;

/// Middlebury `.flo` file reading and writing.
pub mod flo;

/// linearization of the flow energy around the current estimate.
pub mod linearize;

/// flow quality measures.
pub mod metrics;

/// estimator configuration.
pub mod params;

/// linear solvers for the flow increment.
pub mod solver;

pub use crate::coarse2fine::{coarse2fine_flow, Coarse2FineFlow, FlowOutput};
pub use crate::error::FlowError;
pub use crate::field::FlowField;
pub use crate::params::{FlowParams, SolverKind};
pub use crate::solver::{ConjugateGradient, FlowSolver, SolveReport, SuccessiveOverRelaxation};
