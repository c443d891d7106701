#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// image filtering module.
pub mod filter;

/// finite difference gradients.
pub mod gradient;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallelization utilities.
pub mod parallel;

/// Gaussian pyramid construction.
pub mod pyramid;

/// utility functions for resizing images.
pub mod resize;

/// flow-driven image warping.
pub mod warp;
