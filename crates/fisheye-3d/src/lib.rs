#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Linear algebra utilities for 3x3 matrices and 3-vectors.
pub mod linalg;

/// Pose estimation algorithms.
pub mod pose;

/// 3D transforms algorithms.
pub mod transforms;
