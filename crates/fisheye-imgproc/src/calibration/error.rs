use fisheye_image::ImageError;
use fisheye_tensor::TensorError;
use thiserror::Error;

/// Errors raised by the fisheye camera model and the rectification pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    /// Focal lengths must be finite and strictly positive.
    #[error("invalid focal length: fx={0}, fy={1}")]
    InvalidFocalLength(f64, f64),

    /// The principal point must be finite.
    #[error("invalid principal point: cx={0}, cy={1}")]
    InvalidPrincipalPoint(f64, f64),

    /// The matrix is not a zero-skew pinhole matrix with bottom row `[0, 0, 1]`.
    #[error("camera matrix is not of the form [[fx, 0, cx], [0, fy, cy], [0, 0, 1]]")]
    InvalidIntrinsicMatrix,

    /// Distortion coefficients must be finite.
    #[error("invalid distortion coefficients: {0:?}")]
    InvalidDistortion([f64; 4]),

    /// The rectification matrix is not a proper rotation.
    #[error("rectification matrix is not a rotation")]
    InvalidRotation,

    /// A matrix that must be inverted is singular.
    #[error("matrix is singular")]
    SingularMatrix,

    /// Image sizes must be non-zero.
    #[error("invalid image size: {0}x{1}")]
    InvalidImageSize(usize, usize),

    /// Balance must lie in `[0, 1]`.
    #[error("balance must be in [0, 1], got {0}")]
    InvalidBalance(f64),

    /// The field of view scale must be finite and strictly positive.
    #[error("fov scale must be > 0, got {0}")]
    InvalidFovScale(f64),

    /// The Newton termination criteria are unusable.
    #[error("invalid termination criteria: max_iter={0}, eps={1}")]
    InvalidTermCriteria(usize, f64),

    /// A view control tick lies outside its slider range.
    #[error("{name} tick {tick} out of range 0..={max}")]
    TickOutOfRange {
        /// Name of the control.
        name: &'static str,
        /// The rejected tick.
        tick: u32,
        /// Largest valid tick.
        max: u32,
    },

    /// The point maps to infinity after rectification.
    #[error("point ({0}, {1}) maps to infinity")]
    PointAtInfinity(f64, f64),

    /// The estimated camera matrix is degenerate.
    #[error("could not estimate a finite focal length")]
    DegenerateEstimate,

    /// Tensor error while building maps.
    #[error(transparent)]
    TensorError(#[from] TensorError),

    /// Image error while resampling.
    #[error(transparent)]
    ImageError(#[from] ImageError),
}
