use std::path::Path;

use fisheye_image::ImageSize;
use fisheye_imgproc::calibration::{fisheye::FisheyeDistortion, CameraIntrinsic};
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// A calibrated fisheye camera: intrinsics, distortion and the image size they
/// were estimated at.
///
/// Profiles are stored as JSON:
///
/// ```json
/// {
///   "intrinsic": { "fx": 355.7, "fy": 354.8, "cx": 638.8, "cy": 480.9 },
///   "distortion": { "k1": 0.05, "k2": -0.03, "k3": 0.02, "k4": -0.005 },
///   "image_size": { "width": 1280, "height": 960 }
/// }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// The camera matrix parameters.
    pub intrinsic: CameraIntrinsic,
    /// The fisheye distortion coefficients.
    pub distortion: FisheyeDistortion,
    /// The image size of the calibration frames.
    pub image_size: ImageSize,
}

impl Default for CalibrationProfile {
    /// The lens shipped with the tools, calibrated at 1280x960.
    fn default() -> Self {
        Self {
            intrinsic: CameraIntrinsic {
                fx: 355.67876243,
                fy: 354.84207135,
                cx: 638.84520097,
                cy: 480.89256853,
            },
            distortion: FisheyeDistortion {
                k1: 0.0517522,
                k2: -0.0267777,
                k3: 0.01933738,
                k4: -0.0052901,
            },
            image_size: ImageSize {
                width: 1280,
                height: 960,
            },
        }
    }
}

impl CalibrationProfile {
    /// Create a validated profile.
    pub fn new(
        intrinsic: CameraIntrinsic,
        distortion: FisheyeDistortion,
        image_size: ImageSize,
    ) -> Result<Self, ProfileError> {
        let profile = Self {
            intrinsic,
            distortion,
            image_size,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check the intrinsics, the coefficients and the image size.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.intrinsic.validate()?;
        self.distortion.validate()?;
        if self.image_size.is_empty() {
            return Err(ProfileError::EmptyImageSize(
                self.image_size.width,
                self.image_size.height,
            ));
        }
        Ok(())
    }

    /// Parse and validate a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Serialize the profile as pretty printed JSON.
    pub fn to_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a profile from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let profile = Self::from_json(&json)?;
        log::debug!("loaded profile from {}", path.display());
        Ok(profile)
    }

    /// Write the profile to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Whether a pixel lies inside the calibrated image, `0 <= u < width` and
    /// `0 <= v < height`.
    pub fn contains_pixel(&self, pixel: &[f64; 2]) -> bool {
        (0.0..self.image_size.width as f64).contains(&pixel[0])
            && (0.0..self.image_size.height as f64).contains(&pixel[1])
    }

    /// The intrinsics rescaled to another frame size of the same sensor.
    pub fn intrinsic_for(&self, size: ImageSize) -> CameraIntrinsic {
        self.intrinsic.scaled(
            size.width as f64 / self.image_size.width as f64,
            size.height as f64 / self.image_size.height as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisheye_imgproc::calibration::CalibrationError;

    #[test]
    fn default_profile_is_valid() -> Result<(), ProfileError> {
        let profile = CalibrationProfile::default();
        profile.validate()?;
        assert_eq!(profile.distortion.to_array()[0], 0.0517522);
        Ok(())
    }

    #[test]
    fn save_load() -> Result<(), ProfileError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("profile.json");

        let profile = CalibrationProfile::default();
        profile.save(&path)?;
        assert_eq!(CalibrationProfile::load(&path)?, profile);
        Ok(())
    }

    #[test]
    fn reject_invalid_json() {
        let json = r#"{
            "intrinsic": { "fx": -1.0, "fy": 300.0, "cx": 320.0, "cy": 240.0 },
            "distortion": { "k1": 0.0, "k2": 0.0, "k3": 0.0, "k4": 0.0 },
            "image_size": { "width": 640, "height": 480 }
        }"#;
        assert!(matches!(
            CalibrationProfile::from_json(json),
            Err(ProfileError::Invalid(CalibrationError::InvalidFocalLength(..)))
        ));

        let json = json.replace("-1.0", "300.0").replace("480", "0");
        assert!(matches!(
            CalibrationProfile::from_json(&json),
            Err(ProfileError::EmptyImageSize(640, 0))
        ));

        assert!(matches!(
            CalibrationProfile::from_json("{ \"intrinsic\": 1 }"),
            Err(ProfileError::Json(_))
        ));
    }

    #[test]
    fn pixel_range() {
        let profile = CalibrationProfile::default();
        assert!(profile.contains_pixel(&[0.0, 0.0]));
        assert!(profile.contains_pixel(&[1279.0, 959.0]));
        assert!(!profile.contains_pixel(&[1280.0, 100.0]));
        assert!(!profile.contains_pixel(&[-0.5, 10.0]));
        assert!(!profile.contains_pixel(&[10.0, 960.5]));
    }

    #[test]
    fn intrinsic_for_half_size() {
        let profile = CalibrationProfile::default();
        let k = profile.intrinsic_for(profile.image_size.scaled(0.5));
        assert_eq!(k.fx, profile.intrinsic.fx * 0.5);
        assert_eq!(k.cy, profile.intrinsic.cy * 0.5);
    }
}
