#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the image module.
pub mod error;

/// image representation for dense flow estimation.
pub mod image;

/// Element-wise arithmetic between images.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize, ImageView};
