/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image sizes do not match.
    #[error("Image size mismatch: got {0}x{1}, expected {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinate ({0}, {1}) is out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index ({0}) is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a filter kernel is empty or has an even length.
    #[error("Invalid kernel length: {0} and {1}")]
    InvalidKernelLength(usize, usize),

    /// Error when the Gaussian standard deviation is not strictly positive.
    #[error("Gaussian sigma must be positive, got {0}")]
    InvalidSigma(f64),

    /// Error when a resize factor is not positive and finite.
    #[error("Scale factor must be positive and finite, got {0}")]
    InvalidScaleFactor(f64),

    /// Error when the image buffer cannot be allocated.
    #[error("Failed to allocate a buffer of {0} elements")]
    AllocationFailed(usize),

    /// Error when casting a pixel value fails.
    #[error("Failed to cast image data")]
    CastError,
}
