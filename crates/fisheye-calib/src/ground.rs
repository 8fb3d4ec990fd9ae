use std::path::Path;

use fisheye_3d::{
    linalg::inverse_mat33,
    pose::{apply_homography, find_homography, HomographyError},
};
use fisheye_imgproc::calibration::fisheye::{
    distort_point, undistort_point, undistort_points, TermCriteria,
};
use serde::{Deserialize, Serialize};

use crate::{error::GroundPlaneError, profile::CalibrationProfile};

/// Fisheye pixels paired with their positions on the ground plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundCorrespondences {
    /// The camera that took the fisheye frame, if different from the default lens.
    #[serde(default)]
    pub profile: Option<CalibrationProfile>,
    /// Pixels in the distorted fisheye frame.
    pub fisheye_points: Vec<[f64; 2]>,
    /// Matching ground plane coordinates, e.g. in millimetres.
    pub world_points: Vec<[f64; 2]>,
}

impl GroundCorrespondences {
    /// Load correspondences from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GroundPlaneError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Fit a mapper, using `fallback` when the file carries no profile.
    pub fn fit(&self, fallback: &CalibrationProfile) -> Result<GroundPlaneMapper, GroundPlaneError> {
        let profile = self.profile.as_ref().unwrap_or(fallback);
        GroundPlaneMapper::fit(profile, &self.fisheye_points, &self.world_points)
    }
}

/// Maps fisheye pixels to ground plane coordinates and back.
///
/// Pixels are first undistorted into the pinhole image of the same camera
/// matrix, where the ground plane is related to the image by a homography.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundPlaneMapper {
    profile: CalibrationProfile,
    homography: [[f64; 3]; 3],
    inverse: [[f64; 3]; 3],
    criteria: TermCriteria,
    rms: f64,
}

impl GroundPlaneMapper {
    /// Estimate the pixel to ground homography from at least four correspondences.
    ///
    /// # Arguments
    ///
    /// * `profile` - The fisheye camera.
    /// * `fisheye_points` - Pixels in the distorted frame.
    /// * `world_points` - Matching ground plane coordinates.
    pub fn fit(
        profile: &CalibrationProfile,
        fisheye_points: &[[f64; 2]],
        world_points: &[[f64; 2]],
    ) -> Result<Self, GroundPlaneError> {
        if fisheye_points.len() != world_points.len() {
            return Err(GroundPlaneError::LengthMismatch(
                fisheye_points.len(),
                world_points.len(),
            ));
        }

        let criteria = TermCriteria::default();
        let undistorted = undistort_points(
            fisheye_points,
            &profile.intrinsic,
            &profile.distortion,
            None,
            None,
            criteria,
        )?
        .into_iter()
        .map(|p| p.point)
        .collect::<Vec<_>>();

        let homography = find_homography(&undistorted, world_points)?;
        let inverse = inverse_mat33(&homography).ok_or(HomographyError::Degenerate)?;

        let mut sum_sq = 0.0;
        for (src, dst) in undistorted.iter().zip(world_points) {
            let p = apply_homography(&homography, src)
                .ok_or(GroundPlaneError::PointAtInfinity(src[0], src[1]))?;
            sum_sq += (p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2);
        }
        let rms = (sum_sq / world_points.len() as f64).sqrt();
        log::info!(
            "fitted ground plane on {} points, rms {rms:.3}",
            world_points.len()
        );

        Ok(Self {
            profile: *profile,
            homography,
            inverse,
            criteria,
            rms,
        })
    }

    /// The homography from undistorted pixels to the ground plane.
    pub fn homography(&self) -> &[[f64; 3]; 3] {
        &self.homography
    }

    /// The camera the mapper was fitted for.
    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Root mean square fit residual on the ground plane.
    pub fn rms(&self) -> f64 {
        self.rms
    }

    /// Ground plane position seen at a fisheye pixel.
    pub fn pixel_to_world(&self, pixel: &[f64; 2]) -> Result<[f64; 2], GroundPlaneError> {
        let undistorted = undistort_point(
            pixel,
            &self.profile.intrinsic,
            &self.profile.distortion,
            None,
            None,
            self.criteria,
        )?;
        apply_homography(&self.homography, &undistorted.point)
            .ok_or(GroundPlaneError::PointAtInfinity(pixel[0], pixel[1]))
    }

    /// Fisheye pixel where a ground plane position appears.
    pub fn world_to_pixel(&self, world: &[f64; 2]) -> Result<[f64; 2], GroundPlaneError> {
        let undistorted = apply_homography(&self.inverse, world)
            .ok_or(GroundPlaneError::PointAtInfinity(world[0], world[1]))?;
        let normalized = self.profile.intrinsic.normalize(&undistorted);
        Ok(distort_point(
            &normalized,
            &self.profile.intrinsic,
            &self.profile.distortion,
        ))
    }
}

/// Regular ground plane grid, row by row with `x` varying fastest.
///
/// Both ranges are inclusive of their start and include the end when it falls
/// on a step.
///
/// ```
/// use fisheye_calib::ground::world_grid;
///
/// let grid = world_grid((0.0, 100.0), (0.0, 50.0), 50.0).unwrap();
/// assert_eq!(grid.len(), 6);
/// assert_eq!(grid[1], [50.0, 0.0]);
/// assert_eq!(grid[3], [0.0, 50.0]);
/// ```
pub fn world_grid(
    x_range: (f64, f64),
    y_range: (f64, f64),
    step: f64,
) -> Result<Vec<[f64; 2]>, GroundPlaneError> {
    let valid_range = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo <= hi;
    if !(step.is_finite() && step > 0.0 && valid_range(x_range) && valid_range(y_range)) {
        return Err(GroundPlaneError::InvalidGrid {
            x_range,
            y_range,
            step,
        });
    }

    let count = |(lo, hi): (f64, f64)| ((hi - lo) / step + 1e-9).floor() as usize + 1;
    let (nx, ny) = (count(x_range), count(y_range));

    Ok((0..ny)
        .flat_map(|j| {
            (0..nx).map(move |i| [x_range.0 + i as f64 * step, y_range.0 + j as f64 * step])
        })
        .collect())
}
