use varflow_image::ImageError;

/// An error type for the optical flow module.
#[derive(thiserror::Error, Debug)]
pub enum FlowError {
    /// The two input images differ in size or channel count.
    #[error(
        "Image shape mismatch: image1 is {width1}x{height1}x{channels1}, image2 is {width2}x{height2}x{channels2}"
    )]
    ShapeMismatch {
        /// Width of the first image.
        width1: usize,
        /// Height of the first image.
        height1: usize,
        /// Channel count of the first image.
        channels1: usize,
        /// Width of the second image.
        width2: usize,
        /// Height of the second image.
        height2: usize,
        /// Channel count of the second image.
        channels2: usize,
    },

    /// A configuration value is out of its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A working buffer could not be allocated.
    #[error("Failed to allocate a buffer of {0} elements")]
    AllocationFailure(usize),

    /// An image operation failed.
    #[error(transparent)]
    Image(ImageError),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A `.flo` file is malformed.
    #[error("Invalid .flo file: {0}")]
    InvalidFloFile(String),
}

impl From<ImageError> for FlowError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::AllocationFailed(len) => FlowError::AllocationFailure(len),
            other => FlowError::Image(other),
        }
    }
}

// reserve a zeroed working vector, reporting allocation failure as an error
pub(crate) fn zeroed_buffer(len: usize) -> Result<Vec<f64>, FlowError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FlowError::AllocationFailure(len))?;
    data.resize(len, 0.0);
    Ok(data)
}
