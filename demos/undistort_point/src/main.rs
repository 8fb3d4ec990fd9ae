use argh::FromArgs;
use fisheye::{
    calib::CalibrationProfile,
    imgproc::calibration::fisheye::{undistort_point, TermCriteria},
};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Convert a fisheye pixel to its undistorted pinhole pixel
struct Args {
    /// the column of the fisheye pixel
    #[argh(option, short = 'u')]
    u: f64,

    /// the row of the fisheye pixel
    #[argh(option, short = 'v')]
    v: f64,

    /// path to a calibration profile, defaults to the bundled lens
    #[argh(option, short = 'p')]
    profile: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let profile = match &args.profile {
        Some(path) => CalibrationProfile::load(path)?,
        None => CalibrationProfile::default(),
    };

    let pixel = [args.u, args.v];
    if !profile.contains_pixel(&pixel) {
        let size = profile.image_size;
        return Err(format!(
            "pixel ({}, {}) outside the image, u must be in 0..{} and v in 0..{}",
            args.u, args.v, size.width, size.height
        )
        .into());
    }

    // R = I and P = K keep the result in the pixel frame of the fisheye camera
    let undistorted = undistort_point(
        &pixel,
        &profile.intrinsic,
        &profile.distortion,
        None,
        None,
        TermCriteria::default(),
    )?;

    if !undistorted.converged {
        log::warn!("the angle inversion did not converge, the result is approximate");
    }

    println!("u' = {:.3}", undistorted.point[0]);
    println!("v' = {:.3}", undistorted.point[1]);

    Ok(())
}
