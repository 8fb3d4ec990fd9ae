/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the underlying tensor could not be created.
    #[error("Failed to create the image tensor. {0}")]
    TensorError(#[from] fisheye_tensor::TensorError),

    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images (or an image and a map) do not share a size.
    #[error("Invalid image size ({0}x{1}) does not match ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the pixel coordinate is out of bounds.
    #[error("Pixel coordinate ({0}, {1}) is out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index ({0}) is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the image size has a zero dimension.
    #[error("Image size must be non-zero, got {0}x{1}")]
    EmptyImageSize(usize, usize),

    /// Error when casting the pixel data fails.
    #[error("Failed to cast the image data")]
    CastError,
}
