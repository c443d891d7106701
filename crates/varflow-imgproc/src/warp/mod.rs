//! Flow-driven image warping.
//!
//! This module resamples the second frame of a pair along a dense displacement
//! field so that it lines up with the first frame, and computes the spatial and
//! temporal derivatives the flow energy is linearized around.
//!
//! # Examples
//!
//! Warping with a zero flow returns the second frame unchanged:
//!
//! ```
//! use varflow_image::Image;
//! use varflow_imgproc::parallel::ExecutionStrategy;
//! use varflow_imgproc::warp::{warp_flow, WarpBorder};
//!
//! let image1 = Image::<f64, 1>::from_size_fn([8, 6].into(), |x, _, _| x as f64).unwrap();
//! let image2 = Image::<f64, 1>::from_size_fn([8, 6].into(), |_, y, _| y as f64).unwrap();
//! let zero = Image::<f64, 1>::from_size_val(image1.size(), 0.0).unwrap();
//! let mut warped = Image::<f64, 1>::from_size_val(image1.size(), 0.0).unwrap();
//!
//! warp_flow(
//!     &image2,
//!     &image1,
//!     &zero,
//!     &zero,
//!     &mut warped,
//!     WarpBorder::Replicate,
//!     ExecutionStrategy::Serial,
//! )
//! .unwrap();
//! assert_eq!(warped, image2);
//! ```

mod flow;

pub use flow::{warp_flow, WarpBorder, WarpedImage};
