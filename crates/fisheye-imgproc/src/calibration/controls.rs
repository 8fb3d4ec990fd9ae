use fisheye_3d::transforms::yaw_rotation;

use super::CalibrationError;

/// Largest yaw slider tick; ticks map to `(tick - 18) * 10` degrees.
pub const YAW_TICK_MAX: u32 = 36;
/// Largest balance slider tick; ticks map to `tick / 10`.
pub const BALANCE_TICK_MAX: u32 = 10;
/// Largest field of view slider tick; ticks map to `max(0.1, tick / 10)`.
pub const FOV_TICK_MAX: u32 = 10;

const YAW_TICK_CENTER: u32 = 18;
const YAW_STEP_DEG: f64 = 10.0;
const MIN_FOV_SCALE: f64 = 0.1;

/// Quantized viewer controls.
///
/// Holds the integer slider positions and converts them to the physical values
/// used by the rectification pipeline.
///
/// # Example
///
/// ```
/// use fisheye_imgproc::calibration::controls::ViewControls;
///
/// let controls = ViewControls::new(20, 3, 0).unwrap();
/// assert_eq!(controls.yaw_degrees(), 20.0);
/// assert_eq!(controls.balance(), 0.3);
/// assert_eq!(controls.fov_scale(), 0.1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewControls {
    yaw_tick: u32,
    balance_tick: u32,
    fov_tick: u32,
}

impl Default for ViewControls {
    fn default() -> Self {
        Self {
            yaw_tick: YAW_TICK_CENTER,
            balance_tick: 5,
            fov_tick: 9,
        }
    }
}

fn check_tick(name: &'static str, tick: u32, max: u32) -> Result<u32, CalibrationError> {
    if tick > max {
        return Err(CalibrationError::TickOutOfRange { name, tick, max });
    }
    Ok(tick)
}

impl ViewControls {
    /// Create controls from slider ticks, rejecting out of range ticks.
    pub fn new(yaw_tick: u32, balance_tick: u32, fov_tick: u32) -> Result<Self, CalibrationError> {
        Ok(Self {
            yaw_tick: check_tick("yaw", yaw_tick, YAW_TICK_MAX)?,
            balance_tick: check_tick("balance", balance_tick, BALANCE_TICK_MAX)?,
            fov_tick: check_tick("fov", fov_tick, FOV_TICK_MAX)?,
        })
    }

    /// Move the yaw slider.
    pub fn set_yaw_tick(&mut self, tick: u32) -> Result<(), CalibrationError> {
        self.yaw_tick = check_tick("yaw", tick, YAW_TICK_MAX)?;
        Ok(())
    }

    /// Move the balance slider.
    pub fn set_balance_tick(&mut self, tick: u32) -> Result<(), CalibrationError> {
        self.balance_tick = check_tick("balance", tick, BALANCE_TICK_MAX)?;
        Ok(())
    }

    /// Move the field of view slider.
    pub fn set_fov_tick(&mut self, tick: u32) -> Result<(), CalibrationError> {
        self.fov_tick = check_tick("fov", tick, FOV_TICK_MAX)?;
        Ok(())
    }

    /// The raw slider positions `(yaw, balance, fov)`.
    pub fn ticks(&self) -> (u32, u32, u32) {
        (self.yaw_tick, self.balance_tick, self.fov_tick)
    }

    /// Yaw in degrees, in `[-180, 180]`.
    pub fn yaw_degrees(&self) -> f64 {
        (self.yaw_tick as f64 - YAW_TICK_CENTER as f64) * YAW_STEP_DEG
    }

    /// Balance in `[0, 1]`.
    pub fn balance(&self) -> f64 {
        self.balance_tick as f64 / 10.0
    }

    /// Field of view scale in `[0.1, 1]`.
    pub fn fov_scale(&self) -> f64 {
        (self.fov_tick as f64 / 10.0).max(MIN_FOV_SCALE)
    }

    /// Rotation about the camera y axis for the current yaw.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        yaw_rotation(self.yaw_degrees())
    }
}

/// Horizontal field of view in degrees of a pinhole camera with focal length `fx`
/// over an image `width` pixels wide.
///
/// ```
/// use fisheye_imgproc::calibration::controls::hfov_degrees;
///
/// assert!((hfov_degrees(320.0, 640) - 90.0).abs() < 1e-9);
/// ```
pub fn hfov_degrees(fx: f64, width: usize) -> f64 {
    2.0 * ((width as f64 / 2.0) / fx).atan().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_ticks() {
        let controls = ViewControls::default();
        assert_eq!(controls.ticks(), (18, 5, 9));
        assert_eq!(controls.yaw_degrees(), 0.0);
        assert_eq!(controls.balance(), 0.5);
        assert_relative_eq!(controls.fov_scale(), 0.9);
    }

    #[test]
    fn tick_mapping() -> Result<(), CalibrationError> {
        let mut controls = ViewControls::default();
        for (tick, deg) in [(0, -180.0), (17, -10.0), (19, 10.0), (36, 180.0)] {
            controls.set_yaw_tick(tick)?;
            assert_eq!(controls.yaw_degrees(), deg);
        }
        for tick in 0..=10 {
            controls.set_balance_tick(tick)?;
            assert_relative_eq!(controls.balance(), tick as f64 / 10.0);
        }
        controls.set_fov_tick(0)?;
        assert_eq!(controls.fov_scale(), 0.1);
        controls.set_fov_tick(1)?;
        assert_eq!(controls.fov_scale(), 0.1);
        controls.set_fov_tick(10)?;
        assert_eq!(controls.fov_scale(), 1.0);
        Ok(())
    }

    #[test]
    fn out_of_range_ticks() {
        assert_eq!(
            ViewControls::new(37, 5, 9),
            Err(CalibrationError::TickOutOfRange {
                name: "yaw",
                tick: 37,
                max: 36
            })
        );
        assert!(ViewControls::new(18, 11, 9).is_err());
        let mut controls = ViewControls::default();
        assert!(controls.set_fov_tick(11).is_err());
        assert_eq!(controls, ViewControls::default());
    }

    #[test]
    fn rotation_matches_yaw() {
        let controls = ViewControls::new(27, 5, 9).unwrap_or_default();
        let r = controls.rotation();
        assert_relative_eq!(r[0][2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[2][0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(r[1][1], 1.0);
    }

    #[test]
    fn hfov() {
        assert_relative_eq!(hfov_degrees(355.67876243, 1280), 121.874, epsilon = 1e-3);
    }
}
