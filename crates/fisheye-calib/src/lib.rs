#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for profiles, sessions and ground plane mapping.
pub mod error;

/// Ground plane mapping between fisheye pixels and floor coordinates.
pub mod ground;

/// Serializable camera calibration profiles.
pub mod profile;

/// Chessboard calibration session bookkeeping.
pub mod session;

pub use error::{GroundPlaneError, ProfileError, SessionError};
pub use ground::{GroundCorrespondences, GroundPlaneMapper};
pub use profile::CalibrationProfile;
pub use session::{
    CalibrationFlags, CalibrationReport, CalibrationResult, CalibrationSession, ChessboardPattern,
    CornerDetector, FisheyeCalibrator, View,
};
