use argh::FromArgs;
use fisheye::{
    calib::CalibrationProfile,
    image::Image,
    imgproc::{
        calibration::rectify::{
            estimate_new_camera_matrix_for_undistort_rectify, RectifyMapCache, RectifyParams,
        },
        interpolation::{remap, BorderMode, InterpolationMode},
    },
    io::functional as F,
    k3d::linalg::IDENTITY_MAT33,
};
use std::path::{Path, PathBuf};

#[derive(FromArgs)]
/// Undistort a fisheye image, or every image of a directory, onto a larger canvas
struct Args {
    /// path to the input image or directory
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// path to the output image or directory
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// canvas size relative to the input frame
    #[argh(option, short = 's', default = "2.0")]
    scale: f64,

    /// balance in [0, 1], larger keeps more of the field of view
    #[argh(option, short = 'b', default = "1.0")]
    balance: f64,

    /// extra zoom applied after the balance, smaller crops more
    #[argh(option, short = 'f', default = "1.0")]
    fov_scale: f64,

    /// path to a calibration profile, defaults to the bundled lens
    #[argh(option, short = 'p')]
    profile: Option<PathBuf>,
}

fn undistort_file(
    input: &Path,
    output: &Path,
    args: &Args,
    profile: &CalibrationProfile,
    cache: &mut RectifyMapCache,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = F::read_image_any_rgb8(input)?;
    let size = image.size();
    let canvas = size.scaled(args.scale);
    if canvas.is_empty() {
        return Err(format!("scale {} gives an empty canvas for {size}", args.scale).into());
    }

    let intrinsic = profile.intrinsic_for(size);
    let new_intrinsic = estimate_new_camera_matrix_for_undistort_rectify(
        &intrinsic,
        &profile.distortion,
        size,
        &IDENTITY_MAT33,
        args.balance,
        canvas,
        args.fov_scale,
    )?;

    let params = RectifyParams {
        intrinsic,
        distortion: profile.distortion,
        rotation: IDENTITY_MAT33,
        new_intrinsic,
        size: canvas,
    };
    let (map_x, map_y) = cache.get_or_build(&params)?;

    let src = image.cast::<f32>()?;
    let mut dst = Image::<f32, 3>::from_size_val(canvas, 0.0)?;
    remap(
        &src,
        &mut dst,
        map_x,
        map_y,
        InterpolationMode::Bilinear,
        BorderMode::Constant(0.0),
    )?;

    F::write_image_rgb8(output, &dst.cast::<u8>()?)?;
    log::info!("{} -> {} ({size} -> {canvas})", input.display(), output.display());

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let profile = match &args.profile {
        Some(path) => CalibrationProfile::load(path)?,
        None => CalibrationProfile::default(),
    };

    let mut cache = RectifyMapCache::new();

    if !args.input.is_dir() {
        undistort_file(&args.input, &args.output, &args, &profile, &mut cache)?;
        println!("saved {}", args.output.display());
        return Ok(());
    }

    std::fs::create_dir_all(&args.output)?;
    let paths = F::list_images(&args.input)?;
    if paths.is_empty() {
        return Err(format!("no images found in {}", args.input.display()).into());
    }

    let mut written = 0;
    for path in &paths {
        let Some(name) = path.file_name() else {
            continue;
        };
        let output = args.output.join(name);
        match undistort_file(path, &output, &args, &profile, &mut cache) {
            Ok(()) => written += 1,
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }

    println!(
        "undistorted {written} of {} images into {}",
        paths.len(),
        args.output.display()
    );

    Ok(())
}
