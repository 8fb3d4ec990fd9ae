use fisheye_3d::linalg;
use fisheye_image::ImageSize;
use fisheye_tensor::Tensor2;

use super::fisheye::{undistort_points, FisheyeDistortion, TermCriteria};
use super::{validate_rotation, CalibrationError, CameraIntrinsic};
use crate::interpolation::grid::meshgrid_from_fn;

// Radial distance below which a ray is treated as the optical axis.
const AXIS_EPS: f64 = 1e-12;

/// Generate the undistort and rectify map for the fisheye camera model.
///
/// For each output pixel the ray `R^T * new_K^-1 * (x, y, 1)` is distorted with the
/// fisheye model and projected with `K`. The map stores where in the fisheye image
/// each output pixel must be sampled. Coordinates are not clipped, so rays outside
/// the lens coverage land outside the source image.
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the fisheye camera
/// * `distortion` - The distortion parameters of the fisheye camera
/// * `rotation` - The rectification rotation
/// * `new_intrinsic` - The intrinsic parameters of the output pinhole camera
/// * `size` - The size of the output image
///
/// # Returns
///
/// * `map_x` - The x map for undistorting and rectifying the image
/// * `map_y` - The y map for undistorting and rectifying the image
///
/// # Errors
///
/// If any parameter is invalid, the output size is empty, or `new_K * R` is singular.
pub fn init_undistort_rectify_map(
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
    rotation: &[[f64; 3]; 3],
    new_intrinsic: &CameraIntrinsic,
    size: ImageSize,
) -> Result<(Tensor2<f32>, Tensor2<f32>), CalibrationError> {
    intrinsic.validate()?;
    new_intrinsic.validate()?;
    distortion.validate()?;
    validate_rotation(rotation)?;
    if size.is_empty() {
        return Err(CalibrationError::InvalidImageSize(size.width, size.height));
    }

    // inverse of new_K * R maps output pixels to camera rays
    let ir = linalg::inverse_mat33(&linalg::mat33_mul(&new_intrinsic.to_matrix(), rotation))
        .ok_or(CalibrationError::SingularMatrix)?;

    log::debug!(
        "building {}x{} rectification map, new intrinsic {:?}",
        size.width,
        size.height,
        new_intrinsic
    );

    let (map_x, map_y) = meshgrid_from_fn(size.width, size.height, |x, y| {
        let ray = linalg::mat33_mul_vec3(&ir, &[x as f64, y as f64, 1.0]);
        let (u, v) = fisheye_ray_to_pixel(&ray, intrinsic, distortion);
        (u as f32, v as f32)
    })?;

    Ok((map_x, map_y))
}

#[inline]
fn fisheye_ray_to_pixel(
    ray: &[f64; 3],
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
) -> (f64, f64) {
    let r = (ray[0] * ray[0] + ray[1] * ray[1]).sqrt();
    if r <= AXIS_EPS {
        return (intrinsic.cx, intrinsic.cy);
    }
    let theta = r.atan2(ray[2]);
    let scale = distortion.distort_angle(theta) / r;
    let [u, v] = intrinsic.project(&[ray[0] * scale, ray[1] * scale]);
    (u, v)
}

/// Estimate the camera matrix of the undistorted output image.
///
/// The four edge midpoints of the fisheye image are undistorted to find the extent
/// of the visible scene. `balance = 0` picks the largest focal length that keeps the
/// output free of invalid pixels along these samples, `balance = 1` the smallest one
/// that keeps them all in view. The result is divided by `fov_scale` and finally
/// rescaled from `image_size` to `new_size`.
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the fisheye camera
/// * `distortion` - The distortion parameters of the fisheye camera
/// * `image_size` - The size of the fisheye image
/// * `rotation` - The rectification rotation
/// * `balance` - Trade-off between cropping and coverage, in `[0, 1]`
/// * `new_size` - The size of the output image
/// * `fov_scale` - Divisor applied to the focal length, `> 0`
///
/// # Errors
///
/// If any parameter is invalid or the edge samples collapse.
pub fn estimate_new_camera_matrix_for_undistort_rectify(
    intrinsic: &CameraIntrinsic,
    distortion: &FisheyeDistortion,
    image_size: ImageSize,
    rotation: &[[f64; 3]; 3],
    balance: f64,
    new_size: ImageSize,
    fov_scale: f64,
) -> Result<CameraIntrinsic, CalibrationError> {
    if !(0.0..=1.0).contains(&balance) {
        return Err(CalibrationError::InvalidBalance(balance));
    }
    if !(fov_scale.is_finite() && fov_scale > 0.0) {
        return Err(CalibrationError::InvalidFovScale(fov_scale));
    }
    if image_size.is_empty() {
        return Err(CalibrationError::InvalidImageSize(
            image_size.width,
            image_size.height,
        ));
    }
    if new_size.is_empty() {
        return Err(CalibrationError::InvalidImageSize(
            new_size.width,
            new_size.height,
        ));
    }

    let (w, h) = (image_size.width as f64, image_size.height as f64);

    let samples = [[w / 2.0, 0.0], [w, h / 2.0], [w / 2.0, h], [0.0, h / 2.0]];
    let undistorted = undistort_points(
        &samples,
        intrinsic,
        distortion,
        Some(rotation),
        Some(&CameraIntrinsic {
            fx: 1.0,
            fy: 1.0,
            cx: 0.0,
            cy: 0.0,
        }),
        TermCriteria::default(),
    )?;

    let aspect_ratio = intrinsic.fx / intrinsic.fy;

    // work in a frame with unit aspect ratio
    let points = undistorted
        .iter()
        .map(|p| [p.point[0], p.point[1] * aspect_ratio])
        .collect::<Vec<_>>();

    let n = points.len() as f64;
    let cn = [
        points.iter().map(|p| p[0]).sum::<f64>() / n,
        points.iter().map(|p| p[1]).sum::<f64>() / n,
    ];

    let (mut minx, mut miny) = (f64::MAX, f64::MAX);
    let (mut maxx, mut maxy) = (f64::MIN, f64::MIN);
    for p in points.iter() {
        minx = minx.min(p[0]);
        maxx = maxx.max(p[0]);
        miny = miny.min(p[1]);
        maxy = maxy.max(p[1]);
    }

    let f1 = w * 0.5 / (cn[0] - minx);
    let f2 = w * 0.5 / (maxx - cn[0]);
    let f3 = h * 0.5 * aspect_ratio / (cn[1] - miny);
    let f4 = h * 0.5 * aspect_ratio / (maxy - cn[1]);

    let fs = [f1, f2, f3, f4];
    let fmin = fs.iter().copied().fold(f64::INFINITY, f64::min);
    let fmax = fs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let f = (balance * fmin + (1.0 - balance) * fmax) / fov_scale;

    if !(f.is_finite() && f > 0.0) {
        return Err(CalibrationError::DegenerateEstimate);
    }

    let new_f = [f, f / aspect_ratio];
    let new_c = [
        -cn[0] * f + w * 0.5,
        (-cn[1] * f + h * aspect_ratio * 0.5) / aspect_ratio,
    ];

    let rx = new_size.width as f64 / w;
    let ry = new_size.height as f64 / h;

    let new_intrinsic = CameraIntrinsic {
        fx: new_f[0] * rx,
        fy: new_f[1] * ry,
        cx: new_c[0] * rx,
        cy: new_c[1] * ry,
    };

    log::debug!(
        "estimated new intrinsic {:?} (balance={}, fov_scale={})",
        new_intrinsic,
        balance,
        fov_scale
    );

    Ok(new_intrinsic)
}

/// The full parameter tuple a rectification map depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectifyParams {
    /// The fisheye camera.
    pub intrinsic: CameraIntrinsic,
    /// The fisheye distortion.
    pub distortion: FisheyeDistortion,
    /// The rectification rotation.
    pub rotation: [[f64; 3]; 3],
    /// The output pinhole camera.
    pub new_intrinsic: CameraIntrinsic,
    /// The output image size.
    pub size: ImageSize,
}

/// A one-entry cache of rectification maps.
///
/// The maps are rebuilt only when the requested parameters differ from the cached ones.
#[derive(Debug, Default)]
pub struct RectifyMapCache {
    entry: Option<(RectifyParams, Tensor2<f32>, Tensor2<f32>)>,
}

impl RectifyMapCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the maps for `params`, building them if they are not cached.
    pub fn get_or_build(
        &mut self,
        params: &RectifyParams,
    ) -> Result<(&Tensor2<f32>, &Tensor2<f32>), CalibrationError> {
        let entry = match self.entry.take() {
            Some(entry) if entry.0 == *params => {
                log::debug!("rectification map cache hit");
                entry
            }
            _ => {
                let (map_x, map_y) = init_undistort_rectify_map(
                    &params.intrinsic,
                    &params.distortion,
                    &params.rotation,
                    &params.new_intrinsic,
                    params.size,
                )?;
                (*params, map_x, map_y)
            }
        };

        let (_, map_x, map_y) = self.entry.insert(entry);
        Ok((&*map_x, &*map_y))
    }

    /// Whether the cache holds maps for `params`.
    pub fn contains(&self, params: &RectifyParams) -> bool {
        matches!(&self.entry, Some((cached, _, _)) if cached == params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fisheye_3d::{linalg::IDENTITY_MAT33, transforms::yaw_rotation};

    fn default_lens() -> (CameraIntrinsic, FisheyeDistortion) {
        (
            CameraIntrinsic {
                fx: 355.67876243,
                fy: 354.84207135,
                cx: 638.84520097,
                cy: 480.89256853,
            },
            FisheyeDistortion {
                k1: 0.0517522,
                k2: -0.0267777,
                k3: 0.01933738,
                k4: -0.0052901,
            },
        )
    }

    #[test]
    fn test_map_shape_and_center() -> Result<(), CalibrationError> {
        let (k, d) = default_lens();
        let new_k = CameraIntrinsic {
            fx: 200.0,
            fy: 200.0,
            cx: 4.0,
            cy: 2.0,
        };
        let size = ImageSize {
            width: 8,
            height: 4,
        };
        let (map_x, map_y) = init_undistort_rectify_map(&k, &d, &IDENTITY_MAT33, &new_k, size)?;

        assert_eq!(map_x.shape, [4, 8]);
        assert_eq!(map_y.shape, [4, 8]);

        // the output principal point samples the fisheye principal point
        assert_relative_eq!(*map_x.get_unchecked([2, 4]), k.cx as f32, epsilon = 1e-3);
        assert_relative_eq!(*map_y.get_unchecked([2, 4]), k.cy as f32, epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn test_map_identity_without_distortion() -> Result<(), CalibrationError> {
        let k = CameraIntrinsic {
            fx: 100.0,
            fy: 100.0,
            cx: 16.0,
            cy: 8.0,
        };
        let d = FisheyeDistortion::default();
        let size = ImageSize {
            width: 32,
            height: 16,
        };
        let (map_x, map_y) = init_undistort_rectify_map(&k, &d, &IDENTITY_MAT33, &k, size)?;

        // with zero coefficients the model maps tan(theta) to theta
        for y in 0..size.height {
            for x in 0..size.width {
                let (xn, yn) = ((x as f64 - k.cx) / k.fx, (y as f64 - k.cy) / k.fy);
                let r = (xn * xn + yn * yn).sqrt();
                let s = if r > 0.0 { r.atan() / r } else { 1.0 };
                assert_relative_eq!(
                    *map_x.get_unchecked([y, x]),
                    (k.fx * xn * s + k.cx) as f32,
                    epsilon = 1e-3
                );
                assert_relative_eq!(
                    *map_y.get_unchecked([y, x]),
                    (k.fy * yn * s + k.cy) as f32,
                    epsilon = 1e-3
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_map_invalid_inputs() {
        let (k, d) = default_lens();
        let empty = ImageSize {
            width: 0,
            height: 4,
        };
        assert_eq!(
            init_undistort_rectify_map(&k, &d, &IDENTITY_MAT33, &k, empty),
            Err(CalibrationError::InvalidImageSize(0, 4))
        );
        let bad = CameraIntrinsic { fy: 0.0, ..k };
        assert!(init_undistort_rectify_map(&k, &d, &IDENTITY_MAT33, &bad, [4, 4].into()).is_err());
    }

    #[test]
    fn test_estimate_balance_and_fov() -> Result<(), CalibrationError> {
        let (k, d) = default_lens();
        let size = ImageSize {
            width: 1280,
            height: 960,
        };

        let mut last_fx = f64::INFINITY;
        for tick in 0..=10 {
            let balance = tick as f64 / 10.0;
            let new_k = estimate_new_camera_matrix_for_undistort_rectify(
                &k,
                &d,
                size,
                &IDENTITY_MAT33,
                balance,
                size,
                1.0,
            )?;
            assert!(new_k.fx <= last_fx + 1e-9);
            last_fx = new_k.fx;
        }

        let base = estimate_new_camera_matrix_for_undistort_rectify(
            &k, &d, size, &IDENTITY_MAT33, 0.5, size, 1.0,
        )?;
        let zoomed = estimate_new_camera_matrix_for_undistort_rectify(
            &k, &d, size, &IDENTITY_MAT33, 0.5, size, 2.0,
        )?;
        assert_relative_eq!(zoomed.fx, base.fx / 2.0, epsilon = 1e-9);
        assert_relative_eq!(zoomed.fy, base.fy / 2.0, epsilon = 1e-9);
        assert_relative_eq!(base.fx / base.fy, k.fx / k.fy, epsilon = 1e-9);

        let canvas = size.scaled(2.0);
        let big = estimate_new_camera_matrix_for_undistort_rectify(
            &k, &d, size, &IDENTITY_MAT33, 0.5, canvas, 1.0,
        )?;
        assert_relative_eq!(big.fx, base.fx * 2.0, epsilon = 1e-9);
        assert_relative_eq!(big.cx, base.cx * 2.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_estimate_rejects_invalid() {
        let (k, d) = default_lens();
        let size = ImageSize {
            width: 1280,
            height: 960,
        };
        assert_eq!(
            estimate_new_camera_matrix_for_undistort_rectify(
                &k,
                &d,
                size,
                &IDENTITY_MAT33,
                1.5,
                size,
                1.0
            ),
            Err(CalibrationError::InvalidBalance(1.5))
        );
        assert_eq!(
            estimate_new_camera_matrix_for_undistort_rectify(
                &k,
                &d,
                size,
                &IDENTITY_MAT33,
                0.5,
                size,
                0.0
            ),
            Err(CalibrationError::InvalidFovScale(0.0))
        );
    }

    #[test]
    fn test_map_cache() -> Result<(), CalibrationError> {
        let (k, d) = default_lens();
        let mut params = RectifyParams {
            intrinsic: k,
            distortion: d,
            rotation: yaw_rotation(0.0),
            new_intrinsic: k,
            size: [16, 12].into(),
        };
        let mut cache = RectifyMapCache::new();
        assert!(!cache.contains(&params));

        let first = cache.get_or_build(&params)?.0.clone();
        assert!(cache.contains(&params));
        let again = cache.get_or_build(&params)?.0.clone();
        assert_eq!(first, again);

        params.rotation = yaw_rotation(10.0);
        assert!(!cache.contains(&params));
        let rotated = cache.get_or_build(&params)?.0.clone();
        assert_ne!(first, rotated);
        Ok(())
    }
}
