use fisheye_3d::pose::HomographyError;
use fisheye_imgproc::calibration::CalibrationError;
use fisheye_io::IoError;
use thiserror::Error;

/// Errors raised while loading, saving or validating a calibration profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The profile file could not be read or written.
    #[error("failed to access profile file. {0}")]
    Io(#[from] std::io::Error),

    /// The profile is not valid JSON for the expected schema.
    #[error("failed to parse profile. {0}")]
    Json(#[from] serde_json::Error),

    /// The profile parameters are invalid.
    #[error("invalid profile. {0}")]
    Invalid(#[from] CalibrationError),

    /// The profile image size is empty.
    #[error("profile image size must be non-zero, got {0}x{1}")]
    EmptyImageSize(usize, usize),
}

/// Errors raised by a calibration session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The chessboard description is unusable.
    #[error("invalid chessboard pattern {cols}x{rows} with square size {square_size}")]
    InvalidPattern {
        /// Inner corners per row.
        cols: usize,
        /// Inner corners per column.
        rows: usize,
        /// Side length of a square.
        square_size: f64,
    },

    /// The detector returned a corner count that does not match the pattern.
    #[error("detected {found} corners, the pattern has {expected}")]
    CornerCountMismatch {
        /// Number of detected corners.
        found: usize,
        /// Number of pattern corners.
        expected: usize,
    },

    /// A frame does not match the size of the accepted views.
    #[error("frame size {found} differs from session size {expected}")]
    ImageSizeMismatch {
        /// Size of the rejected frame.
        found: fisheye_image::ImageSize,
        /// Size of the session frames.
        expected: fisheye_image::ImageSize,
    },

    /// Too few views were collected for calibration.
    #[error("need at least {required} views to calibrate, got {found}")]
    NotEnoughViews {
        /// Number of collected views.
        found: usize,
        /// Minimum number of views.
        required: usize,
    },

    /// The calibrator did not return one pose per view.
    #[error("calibrator returned {found} poses for {expected} views")]
    PoseCountMismatch {
        /// Number of returned poses.
        found: usize,
        /// Number of views.
        expected: usize,
    },

    /// The external calibrator failed.
    #[error("calibrator failed. {0}")]
    Calibrator(Box<dyn std::error::Error + Send + Sync>),

    /// The camera model rejected a parameter.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Image conversion failed.
    #[error(transparent)]
    Image(#[from] fisheye_image::ImageError),

    /// Reading frames failed.
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised by the ground plane mapper.
#[derive(Debug, Error)]
pub enum GroundPlaneError {
    /// The fisheye and world point lists differ in length.
    #[error("got {0} fisheye points and {1} world points")]
    LengthMismatch(usize, usize),

    /// The homography could not be estimated.
    #[error(transparent)]
    Homography(#[from] HomographyError),

    /// The camera model rejected a parameter or a point.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// The point maps to the line at infinity of the plane.
    #[error("point ({0}, {1}) has no finite image on the plane")]
    PointAtInfinity(f64, f64),

    /// The grid description is unusable.
    #[error("invalid grid: step {step} over x {x_range:?} and y {y_range:?}")]
    InvalidGrid {
        /// Range along x.
        x_range: (f64, f64),
        /// Range along y.
        y_range: (f64, f64),
        /// Grid spacing.
        step: f64,
    },

    /// The correspondence file could not be read.
    #[error("failed to access correspondence file. {0}")]
    Io(#[from] std::io::Error),

    /// The correspondence file is not valid JSON.
    #[error("failed to parse correspondence file. {0}")]
    Json(#[from] serde_json::Error),
}
