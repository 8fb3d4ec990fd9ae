use std::f64::consts::FRAC_PI_2;

use fisheye_3d::linalg;
use serde::{Deserialize, Serialize};

use super::{validate_rotation, CalibrationError, CameraExtrinsic, CameraIntrinsic};

/// Distortion coefficients of the fisheye (equidistant) camera model.
///
/// The distorted angle is a polynomial in the angle of incidence `theta`:
///
/// ```text
/// theta_d = theta * (1 + k1 * theta^2 + k2 * theta^4 + k3 * theta^6 + k4 * theta^8)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FisheyeDistortion {
    /// The first distortion coefficient
    pub k1: f64,
    /// The second distortion coefficient
    pub k2: f64,
    /// The third distortion coefficient
    pub k3: f64,
    /// The fourth distortion coefficient
    pub k4: f64,
}

impl FisheyeDistortion {
    /// Create validated coefficients from `[k1, k2, k3, k4]`.
    pub fn from_array(k: [f64; 4]) -> Result<Self, CalibrationError> {
        let distortion = Self {
            k1: k[0],
            k2: k[1],
            k3: k[2],
            k4: k[3],
        };
        distortion.validate()?;
        Ok(distortion)
    }

    /// The coefficients as `[k1, k2, k3, k4]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.k1, self.k2, self.k3, self.k4]
    }

    /// Check that every coefficient is finite.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let k = self.to_array();
        if k.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::InvalidDistortion(k));
        }
        Ok(())
    }

    /// Evaluate the distortion polynomial at `theta`.
    #[inline]
    pub fn distort_angle(&self, theta: f64) -> f64 {
        let theta2 = theta * theta;
        let theta4 = theta2 * theta2;
        let theta6 = theta4 * theta2;
        let theta8 = theta4 * theta4;
        theta * (1.0 + self.k1 * theta2 + self.k2 * theta4 + self.k3 * theta6 + self.k4 * theta8)
    }

    /// Derivative of [`FisheyeDistortion::distort_angle`] with respect to `theta`.
    #[inline]
    pub fn distort_angle_derivative(&self, theta: f64) -> f64 {
        let theta2 = theta * theta;
        let theta4 = theta2 * theta2;
        let theta6 = theta4 * theta2;
        let theta8 = theta4 * theta4;
        1.0 + 3.0 * self.k1 * theta2
            + 5.0 * self.k2 * theta4
            + 7.0 * self.k3 * theta6
            + 9.0 * self.k4 * theta8
    }
}

/// Termination criteria for the iterative angle inversion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermCriteria {
    /// Maximum number of Newton steps.
    pub max_iter: usize,
    /// Stop once the step magnitude drops below this value.
    pub eps: f64,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iter: 10,
            eps: 1e-8,
        }
    }
}

impl TermCriteria {
    fn validate(&self) -> Result<(), CalibrationError> {
        if self.max_iter == 0 || !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(CalibrationError::InvalidTermCriteria(self.max_iter, self.eps));
        }
        Ok(())
    }
}

/// The result of undistorting a single point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UndistortedPoint {
    /// The undistorted coordinate, in pixels of the output camera or normalized.
    pub point: [f64; 2],
    /// Whether the angle inversion met the termination criteria.
    pub converged: bool,
    /// Number of Newton steps taken.
    pub iterations: usize,
}

/// Distort a normalized pinhole coordinate and project it into the fisheye image.
///
/// # Arguments
///
/// * `normalized` - The undistorted normalized coordinate `(X/Z, Y/Z)`.
/// * `intrinsic` - The intrinsic parameters of the fisheye camera.
/// * `distortion` - The distortion parameters of the fisheye camera.
///
/// # Returns
///
/// The distorted pixel coordinate.
pub fn distort_point(
    normalized: &[f64; 2],
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
) -> [f64; 2] {
    let (x, y) = (normalized[0], normalized[1]);
    let r = (x * x + y * y).sqrt();

    let theta = r.atan();
    let theta_d = distortion.distort_angle(theta);

    let scale = if r > 1e-8 { theta_d / r } else { 1.0 };

    intrinsic.project(&[x * scale, y * scale])
}

/// Project a 3d world point through a camera pose into the fisheye image.
///
/// # Errors
///
/// If the point lies on the camera plane (`z == 0` in the camera frame).
pub fn project_point(
    point: &[f64; 3],
    extrinsic: &CameraExtrinsic,
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
) -> Result<[f64; 2], CalibrationError> {
    let p = extrinsic.transform_point(point);
    if p[2].abs() < 1e-12 {
        return Err(CalibrationError::PointAtInfinity(p[0], p[1]));
    }
    Ok(distort_point(&[p[0] / p[2], p[1] / p[2]], intrinsic, distortion))
}

// Invert the angle polynomial for one normalized distorted point. Inputs are
// assumed validated by the caller.
fn undistort_normalized_impl(
    distorted: &[f64; 2],
    distortion: &FisheyeDistortion,
    criteria: &TermCriteria,
) -> (f64, f64, bool, usize) {
    let theta_d = (distorted[0] * distorted[0] + distorted[1] * distorted[1])
        .sqrt()
        .clamp(-FRAC_PI_2, FRAC_PI_2);

    if theta_d <= criteria.eps {
        return (1.0, 0.0, true, 0);
    }

    let mut theta = theta_d;
    let mut converged = false;
    let mut iterations = 0;

    for _ in 0..criteria.max_iter {
        let derivative = distortion.distort_angle_derivative(theta);
        if derivative.abs() < f64::EPSILON {
            break;
        }
        let theta_fix = (distortion.distort_angle(theta) - theta_d) / derivative;
        theta -= theta_fix;
        iterations += 1;
        if theta_fix.abs() < criteria.eps {
            converged = true;
            break;
        }
    }

    // a solution on the other side of the optical axis is not a solution
    if theta < 0.0 {
        converged = false;
    }

    (theta.tan() / theta_d, theta, converged, iterations)
}

/// Undistort a fisheye pixel to a (rotated) normalized image coordinate.
///
/// Solves `theta_d = theta * (1 + k1 theta^2 + ... + k4 theta^8)` for `theta` with
/// Newton's method starting at `theta_d`, then rescales the normalized point by
/// `tan(theta) / theta_d` and applies the rotation when given.
///
/// A solve that hits the iteration cap still returns its best estimate with
/// `converged == false`.
///
/// # Errors
///
/// If the parameters are invalid or the rotated point lies at infinity.
pub fn undistort_point_normalized(
    point: &[f64; 2],
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
    rotation: Option<&[[f64; 3]; 3]>,
    criteria: TermCriteria,
) -> Result<UndistortedPoint, CalibrationError> {
    intrinsic.validate()?;
    distortion.validate()?;
    criteria.validate()?;
    if let Some(rotation) = rotation {
        validate_rotation(rotation)?;
    }
    undistort_point_unchecked(point, intrinsic, distortion, rotation, &criteria)
}

fn undistort_point_unchecked(
    point: &[f64; 2],
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
    rotation: Option<&[[f64; 3]; 3]>,
    criteria: &TermCriteria,
) -> Result<UndistortedPoint, CalibrationError> {
    let pw = intrinsic.normalize(point);
    let (scale, theta, converged, iterations) = undistort_normalized_impl(&pw, distortion, criteria);

    if !converged {
        log::warn!(
            "undistortion of ({:.3}, {:.3}) did not converge after {} iterations (theta={:.6})",
            point[0],
            point[1],
            iterations,
            theta
        );
    }

    let pu = [pw[0] * scale, pw[1] * scale, 1.0];
    let pr = match rotation {
        Some(rotation) => linalg::mat33_mul_vec3(rotation, &pu),
        None => pu,
    };

    if pr[2].abs() < 1e-12 {
        return Err(CalibrationError::PointAtInfinity(point[0], point[1]));
    }

    Ok(UndistortedPoint {
        point: [pr[0] / pr[2], pr[1] / pr[2]],
        converged,
        iterations,
    })
}

/// Undistort a single fisheye pixel.
///
/// # Arguments
///
/// * `point` - The distorted pixel coordinate.
/// * `intrinsic` - The intrinsic parameters of the fisheye camera.
/// * `distortion` - The distortion parameters of the fisheye camera.
/// * `rotation` - Optional rectification rotation, identity when `None`.
/// * `new_intrinsic` - Camera used to project the result, `intrinsic` when `None`.
/// * `criteria` - Termination criteria of the Newton solve.
///
/// # Returns
///
/// The undistorted pixel in the `new_intrinsic` camera.
///
/// # Example
///
/// ```
/// use fisheye_imgproc::calibration::{
///     fisheye::{undistort_point, FisheyeDistortion, TermCriteria},
///     CameraIntrinsic,
/// };
///
/// let k = CameraIntrinsic { fx: 355.0, fy: 355.0, cx: 640.0, cy: 480.0 };
/// let d = FisheyeDistortion::default();
/// let res = undistort_point(&[640.0, 480.0], &k, &d, None, None, TermCriteria::default()).unwrap();
/// assert_eq!(res.point, [640.0, 480.0]);
/// assert!(res.converged);
/// ```
pub fn undistort_point(
    point: &[f64; 2],
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
    rotation: Option<&[[f64; 3]; 3]>,
    new_intrinsic: Option<&CameraIntrinsic>,
    criteria: TermCriteria,
) -> Result<UndistortedPoint, CalibrationError> {
    let new_intrinsic = new_intrinsic.unwrap_or(intrinsic);
    new_intrinsic.validate()?;

    let mut res = undistort_point_normalized(point, intrinsic, distortion, rotation, criteria)?;
    res.point = new_intrinsic.project(&res.point);
    Ok(res)
}

/// Undistort a batch of fisheye pixels.
///
/// Parameters are validated once for the whole batch. See [`undistort_point`].
pub fn undistort_points(
    points: &[[f64; 2]],
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
    rotation: Option<&[[f64; 3]; 3]>,
    new_intrinsic: Option<&CameraIntrinsic>,
    criteria: TermCriteria,
) -> Result<Vec<UndistortedPoint>, CalibrationError> {
    let new_intrinsic = new_intrinsic.unwrap_or(intrinsic);
    intrinsic.validate()?;
    new_intrinsic.validate()?;
    distortion.validate()?;
    criteria.validate()?;
    if let Some(rotation) = rotation {
        validate_rotation(rotation)?;
    }

    points
        .iter()
        .map(|p| {
            let mut res = undistort_point_unchecked(p, intrinsic, distortion, rotation, &criteria)?;
            res.point = new_intrinsic.project(&res.point);
            Ok(res)
        })
        .collect()
}
