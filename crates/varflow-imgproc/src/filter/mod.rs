//! Filter operations
//!
//! Separable filtering with replicated borders, the building block for the
//! pyramid smoothing and the finite difference derivatives.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
