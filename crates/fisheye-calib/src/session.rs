use std::path::Path;

use fisheye_image::{Image, ImageSize};
use fisheye_imgproc::calibration::{
    fisheye::{project_point, FisheyeDistortion, TermCriteria},
    CameraExtrinsic, CameraIntrinsic,
};
use fisheye_imgproc::color::gray_from_rgb_u8;
use serde::{Deserialize, Serialize};

use crate::{error::SessionError, profile::CalibrationProfile};

/// Minimum number of accepted views before calibrating.
pub const DEFAULT_MIN_VIEWS: usize = 10;

/// A planar chessboard target described by its inner corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChessboardPattern {
    /// Inner corners per row.
    pub cols: usize,
    /// Inner corners per column.
    pub rows: usize,
    /// Side length of a square, in the unit of the object points.
    pub square_size: f64,
}

impl Default for ChessboardPattern {
    /// An 8x6 inner corner board with 38 mm squares.
    fn default() -> Self {
        Self {
            cols: 8,
            rows: 6,
            square_size: 38.0,
        }
    }
}

impl ChessboardPattern {
    /// Check that the board has corners and a positive square size.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.cols == 0
            || self.rows == 0
            || !(self.square_size.is_finite() && self.square_size > 0.0)
        {
            return Err(SessionError::InvalidPattern {
                cols: self.cols,
                rows: self.rows,
                square_size: self.square_size,
            });
        }
        Ok(())
    }

    /// Number of inner corners.
    pub fn num_corners(&self) -> usize {
        self.cols * self.rows
    }

    /// The board corners on the `z = 0` plane, row by row with `x` varying fastest.
    ///
    /// ```
    /// use fisheye_calib::ChessboardPattern;
    ///
    /// let pattern = ChessboardPattern { cols: 3, rows: 2, square_size: 10.0 };
    /// let points = pattern.object_points();
    /// assert_eq!(points[1], [10.0, 0.0, 0.0]);
    /// assert_eq!(points[3], [0.0, 10.0, 0.0]);
    /// ```
    pub fn object_points(&self) -> Vec<[f64; 3]> {
        (0..self.rows)
            .flat_map(|j| {
                (0..self.cols).map(move |i| {
                    [
                        i as f64 * self.square_size,
                        j as f64 * self.square_size,
                        0.0,
                    ]
                })
            })
            .collect()
    }
}

/// Finds the inner corners of a chessboard in a grayscale frame.
pub trait CornerDetector {
    /// Return the sub-pixel corners in the order of
    /// [`ChessboardPattern::object_points`], or `None` if the board is not visible.
    fn detect(&self, image: &Image<u8, 1>, pattern: &ChessboardPattern) -> Option<Vec<[f64; 2]>>;
}

/// Options forwarded to the fisheye calibrator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFlags {
    /// Re-estimate the board poses after every intrinsic update.
    pub recompute_extrinsic: bool,
    /// Keep the camera matrix skew at zero.
    pub fix_skew: bool,
    /// Reject views whose Jacobian is ill conditioned.
    pub check_cond: bool,
    /// Termination criteria of the optimizer.
    pub criteria: TermCriteria,
}

impl Default for CalibrationFlags {
    fn default() -> Self {
        Self {
            recompute_extrinsic: true,
            fix_skew: true,
            check_cond: false,
            criteria: TermCriteria {
                max_iter: 30,
                eps: 1e-6,
            },
        }
    }
}

/// The corners of one accepted frame paired with the board points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Name of the frame, used in logs and reports.
    pub name: String,
    /// Board points in the board frame.
    pub object_points: Vec<[f64; 3]>,
    /// Detected corners in pixels.
    pub image_points: Vec<[f64; 2]>,
}

/// Parameters estimated by a [`FisheyeCalibrator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// The camera matrix parameters.
    pub intrinsic: CameraIntrinsic,
    /// The fisheye distortion coefficients.
    pub distortion: FisheyeDistortion,
    /// One board pose per view.
    pub extrinsics: Vec<CameraExtrinsic>,
    /// Root mean square reprojection error reported by the calibrator.
    pub rms: f64,
}

/// Estimates the fisheye camera model from chessboard views.
pub trait FisheyeCalibrator {
    /// The error type of the calibrator.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Estimate intrinsics, distortion and one pose per view.
    fn calibrate(
        &self,
        views: &[View],
        image_size: ImageSize,
        flags: &CalibrationFlags,
    ) -> Result<CalibrationResult, Self::Error>;
}

/// Calibration output together with the reprojection errors measured by the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// The calibrator output.
    pub result: CalibrationResult,
    /// The frame size of the views.
    pub image_size: ImageSize,
    /// Root mean square reprojection error over all corners, in pixels.
    pub rms: f64,
    /// Root mean square reprojection error of each view, in pixels.
    pub per_view_rms: Vec<f64>,
}

impl CalibrationReport {
    /// The estimated camera as a profile.
    pub fn profile(&self) -> CalibrationProfile {
        CalibrationProfile {
            intrinsic: self.result.intrinsic,
            distortion: self.result.distortion,
            image_size: self.image_size,
        }
    }
}

/// Collects chessboard views from frames and runs a calibrator on them.
///
/// Frames where the board is not found are skipped and logged. All frames must
/// share the size of the first accepted one.
pub struct CalibrationSession<D: CornerDetector> {
    pattern: ChessboardPattern,
    detector: D,
    flags: CalibrationFlags,
    min_views: usize,
    image_size: Option<ImageSize>,
    views: Vec<View>,
    skipped: Vec<String>,
}

impl<D: CornerDetector> CalibrationSession<D> {
    /// Create an empty session.
    pub fn new(pattern: ChessboardPattern, detector: D) -> Result<Self, SessionError> {
        pattern.validate()?;
        Ok(Self {
            pattern,
            detector,
            flags: CalibrationFlags::default(),
            min_views: DEFAULT_MIN_VIEWS,
            image_size: None,
            views: Vec::new(),
            skipped: Vec::new(),
        })
    }

    /// Set the options forwarded to the calibrator.
    pub fn with_flags(mut self, flags: CalibrationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the minimum number of views required to calibrate.
    pub fn with_min_views(mut self, min_views: usize) -> Self {
        self.min_views = min_views.max(1);
        self
    }

    /// The board used by the session.
    pub fn pattern(&self) -> &ChessboardPattern {
        &self.pattern
    }

    /// The accepted views.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Names of the frames where no board was found.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// The frame size of the session, fixed by the first accepted view.
    pub fn image_size(&self) -> Option<ImageSize> {
        self.image_size
    }

    /// Detect the board in a grayscale frame and keep the view if found.
    ///
    /// # Returns
    ///
    /// `true` if the view was accepted, `false` if the board was not found.
    ///
    /// # Errors
    ///
    /// If the frame size differs from the accepted views or the detector
    /// returns the wrong number of corners.
    pub fn add_image(&mut self, name: &str, image: &Image<u8, 1>) -> Result<bool, SessionError> {
        let size = image.size();
        if let Some(expected) = self.image_size {
            if expected != size {
                return Err(SessionError::ImageSizeMismatch {
                    found: size,
                    expected,
                });
            }
        }

        let Some(corners) = self.detector.detect(image, &self.pattern) else {
            log::info!("no chessboard found in {name}, skipping");
            self.skipped.push(name.to_string());
            return Ok(false);
        };

        if corners.len() != self.pattern.num_corners() {
            log::warn!(
                "{name}: detected {} corners, expected {}",
                corners.len(),
                self.pattern.num_corners()
            );
            return Err(SessionError::CornerCountMismatch {
                found: corners.len(),
                expected: self.pattern.num_corners(),
            });
        }

        self.views.push(View {
            name: name.to_string(),
            object_points: self.pattern.object_points(),
            image_points: corners,
        });
        self.image_size.get_or_insert(size);
        log::debug!("accepted view {} from {name}", self.views.len());

        Ok(true)
    }

    /// Convert a color frame to grayscale and add it.
    pub fn add_rgb_image(&mut self, name: &str, image: &Image<u8, 3>) -> Result<bool, SessionError> {
        let mut gray = Image::<u8, 1>::from_size_val(image.size(), 0)?;
        gray_from_rgb_u8(image, &mut gray)?;
        self.add_image(name, &gray)
    }

    /// Add every image of a directory, in path order.
    ///
    /// Files that fail to decode, differ in size from the accepted views or
    /// carry the wrong corner count are logged and skipped. Returns the number
    /// of accepted views.
    pub fn add_images_from_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, SessionError> {
        let mut accepted = 0;
        for path in fisheye_io::functional::list_images(dir)? {
            let name = path.display().to_string();
            let image = match fisheye_io::functional::read_image_any_gray8(&path) {
                Ok(image) => image,
                Err(err) => {
                    log::warn!("failed to read {name}: {err}");
                    self.skipped.push(name);
                    continue;
                }
            };
            match self.add_image(&name, &image) {
                Ok(true) => accepted += 1,
                Ok(false) => {}
                Err(SessionError::CornerCountMismatch { .. }) => self.skipped.push(name),
                Err(err @ SessionError::ImageSizeMismatch { .. }) => {
                    log::warn!("{name}: {err}");
                    self.skipped.push(name);
                }
                Err(err) => return Err(err),
            }
        }
        log::info!(
            "accepted {accepted} views, skipped {} frames",
            self.skipped.len()
        );
        Ok(accepted)
    }

    /// Run the calibrator on the accepted views and measure the reprojection error.
    pub fn calibrate<C: FisheyeCalibrator>(
        &self,
        calibrator: &C,
    ) -> Result<CalibrationReport, SessionError> {
        let image_size = match self.image_size {
            Some(size) if self.views.len() >= self.min_views => size,
            _ => {
                return Err(SessionError::NotEnoughViews {
                    found: self.views.len(),
                    required: self.min_views,
                })
            }
        };

        let result = calibrator
            .calibrate(&self.views, image_size, &self.flags)
            .map_err(|e| SessionError::Calibrator(Box::new(e)))?;

        result.intrinsic.validate()?;
        result.distortion.validate()?;
        if result.extrinsics.len() != self.views.len() {
            return Err(SessionError::PoseCountMismatch {
                found: result.extrinsics.len(),
                expected: self.views.len(),
            });
        }

        let mut total_sq = 0.0;
        let mut total_count = 0;
        let mut per_view_rms = Vec::with_capacity(self.views.len());
        for (view, extrinsic) in self.views.iter().zip(&result.extrinsics) {
            let mut view_sq = 0.0;
            for (object, image) in view.object_points.iter().zip(&view.image_points) {
                let projected =
                    project_point(object, extrinsic, &result.intrinsic, &result.distortion)?;
                let (du, dv) = (projected[0] - image[0], projected[1] - image[1]);
                view_sq += du * du + dv * dv;
            }
            let count = view.image_points.len();
            per_view_rms.push((view_sq / count.max(1) as f64).sqrt());
            total_sq += view_sq;
            total_count += count;
        }
        let rms = (total_sq / total_count.max(1) as f64).sqrt();

        log::info!(
            "calibrated on {} views, rms {rms:.4} px (calibrator reported {:.4})",
            self.views.len(),
            result.rms
        );

        Ok(CalibrationReport {
            result,
            image_size,
            rms,
            per_view_rms,
        })
    }
}
