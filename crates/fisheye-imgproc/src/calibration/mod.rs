mod error;
pub use error::CalibrationError;

/// slider quantization for the interactive viewer.
pub mod controls;

/// fisheye (equidistant polynomial) distortion model.
pub mod fisheye;

/// rectification maps and new camera matrix estimation.
pub mod rectify;

use fisheye_3d::linalg;
use serde::{Deserialize, Serialize};

/// Represents the instrinsic parameters of a pinhole camera
///
/// The camera matrix is assumed to have zero skew:
///
/// ```text
/// | fx  0 cx |
/// |  0 fy cy |
/// |  0  0  1 |
/// ```
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraIntrinsic {
    /// Create a validated intrinsic.
    ///
    /// # Errors
    ///
    /// If a focal length is not finite and positive or the principal point is not finite.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, CalibrationError> {
        let intrinsic = Self { fx, fy, cx, cy };
        intrinsic.validate()?;
        Ok(intrinsic)
    }

    /// Check that the focal lengths are finite and positive and the principal point finite.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !(self.fx.is_finite() && self.fy.is_finite() && self.fx > 0.0 && self.fy > 0.0) {
            return Err(CalibrationError::InvalidFocalLength(self.fx, self.fy));
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(CalibrationError::InvalidPrincipalPoint(self.cx, self.cy));
        }
        Ok(())
    }

    /// Build the intrinsic from a row-major 3x3 camera matrix.
    ///
    /// # Example
    ///
    /// ```
    /// use fisheye_imgproc::calibration::CameraIntrinsic;
    ///
    /// let k = [[355.0, 0.0, 640.0], [0.0, 354.0, 480.0], [0.0, 0.0, 1.0]];
    /// let intrinsic = CameraIntrinsic::from_matrix(&k).unwrap();
    /// assert_eq!(intrinsic.to_matrix(), k);
    /// ```
    pub fn from_matrix(m: &[[f64; 3]; 3]) -> Result<Self, CalibrationError> {
        let is_pinhole = m[0][1] == 0.0
            && m[1][0] == 0.0
            && m[2][0] == 0.0
            && m[2][1] == 0.0
            && m[2][2] == 1.0;
        if !is_pinhole {
            return Err(CalibrationError::InvalidIntrinsicMatrix);
        }
        Self::new(m[0][0], m[1][1], m[0][2], m[1][2])
    }

    /// Build the intrinsic from 9 row-major values.
    pub fn from_slice(values: &[f64; 9]) -> Result<Self, CalibrationError> {
        Self::from_matrix(&[
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
            [values[6], values[7], values[8]],
        ])
    }

    /// The row-major 3x3 camera matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// The inverse camera matrix.
    pub fn inverse_matrix(&self) -> [[f64; 3]; 3] {
        [
            [1.0 / self.fx, 0.0, -self.cx / self.fx],
            [0.0, 1.0 / self.fy, -self.cy / self.fy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Scale focal lengths and principal point by `(sx, sy)`.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            fx: self.fx * sx,
            fy: self.fy * sy,
            cx: self.cx * sx,
            cy: self.cy * sy,
        }
    }

    /// Map a normalized image coordinate to pixels.
    #[inline]
    pub fn project(&self, normalized: &[f64; 2]) -> [f64; 2] {
        [
            self.fx * normalized[0] + self.cx,
            self.fy * normalized[1] + self.cy,
        ]
    }

    /// Map a pixel to its normalized image coordinate.
    #[inline]
    pub fn normalize(&self, pixel: &[f64; 2]) -> [f64; 2] {
        [
            (pixel[0] - self.cx) / self.fx,
            (pixel[1] - self.cy) / self.fy,
        ]
    }
}

/// Represents the extrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `rotation` - The rotation matrix of the camera 3x3
/// * `translation` - The translation vector of the camera 3x1
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraExtrinsic {
    /// The rotation matrix of the camera 3x3
    pub rotation: [[f64; 3]; 3],
    /// The translation vector of the camera 3x1
    pub translation: [f64; 3],
}

impl Default for CameraExtrinsic {
    fn default() -> Self {
        Self {
            rotation: linalg::IDENTITY_MAT33,
            translation: [0.0; 3],
        }
    }
}

impl CameraExtrinsic {
    /// Transform a world point into the camera frame.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = linalg::mat33_mul_vec3(&self.rotation, point);
        [
            p[0] + self.translation[0],
            p[1] + self.translation[1],
            p[2] + self.translation[2],
        ]
    }
}

// Tolerance used when checking rectification matrices for orthonormality.
pub(crate) const ROTATION_TOL: f64 = 1e-6;

pub(crate) fn validate_rotation(rotation: &[[f64; 3]; 3]) -> Result<(), CalibrationError> {
    if rotation.iter().flatten().any(|v| !v.is_finite())
        || !linalg::is_rotation_mat33(rotation, ROTATION_TOL)
    {
        return Err(CalibrationError::InvalidRotation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_validation() {
        assert!(CameraIntrinsic::new(355.0, 354.0, 640.0, 480.0).is_ok());
        assert_eq!(
            CameraIntrinsic::new(0.0, 354.0, 640.0, 480.0),
            Err(CalibrationError::InvalidFocalLength(0.0, 354.0))
        );
        assert!(CameraIntrinsic::new(355.0, f64::NAN, 640.0, 480.0).is_err());
        assert!(CameraIntrinsic::new(355.0, 354.0, f64::INFINITY, 480.0).is_err());
    }

    #[test]
    fn intrinsic_from_matrix() -> Result<(), CalibrationError> {
        let skewed = [[355.0, 1.0, 640.0], [0.0, 354.0, 480.0], [0.0, 0.0, 1.0]];
        assert_eq!(
            CameraIntrinsic::from_matrix(&skewed),
            Err(CalibrationError::InvalidIntrinsicMatrix)
        );
        let unnormalized = [[355.0, 0.0, 640.0], [0.0, 354.0, 480.0], [0.0, 0.0, 2.0]];
        assert!(CameraIntrinsic::from_matrix(&unnormalized).is_err());

        let k = CameraIntrinsic::from_slice(&[2.0, 0.0, 1.0, 0.0, 4.0, 3.0, 0.0, 0.0, 1.0])?;
        assert_eq!(k, CameraIntrinsic { fx: 2.0, fy: 4.0, cx: 1.0, cy: 3.0 });
        let inv = linalg::mat33_mul(&k.to_matrix(), &k.inverse_matrix());
        assert_eq!(inv, linalg::IDENTITY_MAT33);
        Ok(())
    }

    #[test]
    fn intrinsic_project_normalize() {
        let k = CameraIntrinsic { fx: 100.0, fy: 50.0, cx: 10.0, cy: 20.0 };
        let n = k.normalize(&[110.0, 70.0]);
        assert_eq!(n, [1.0, 1.0]);
        assert_eq!(k.project(&n), [110.0, 70.0]);
        assert_eq!(
            k.scaled(2.0, 0.5),
            CameraIntrinsic { fx: 200.0, fy: 25.0, cx: 20.0, cy: 10.0 }
        );
    }

    #[test]
    fn extrinsic_transform() {
        let ext = CameraExtrinsic {
            rotation: [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 5.0],
        };
        assert_eq!(ext.transform_point(&[1.0, 0.0, 0.0]), [0.0, 1.0, 5.0]);
        assert!(validate_rotation(&ext.rotation).is_ok());
        assert_eq!(
            validate_rotation(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 2.0]]),
            Err(CalibrationError::InvalidRotation)
        );
    }
}
