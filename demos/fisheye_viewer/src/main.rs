use argh::FromArgs;
use fisheye::{
    calib::CalibrationProfile,
    image::Image,
    imgproc::{
        calibration::{
            controls::{hfov_degrees, ViewControls, YAW_TICK_MAX},
            rectify::{
                estimate_new_camera_matrix_for_undistort_rectify, RectifyMapCache, RectifyParams,
            },
        },
        interpolation::{remap, BorderMode, InterpolationMode},
    },
    io::functional as F,
};
use std::path::{Path, PathBuf};

#[derive(FromArgs)]
/// Render rotated and rescaled pinhole views of a fisheye frame
struct Args {
    /// path to the input image, or a directory whose first image is used
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// directory where the rendered views are written
    #[argh(option, short = 'o')]
    out_dir: PathBuf,

    /// yaw slider position in 0..=36, 18 looks straight ahead
    #[argh(option, default = "18")]
    yaw_tick: u32,

    /// balance slider position in 0..=10
    #[argh(option, default = "5")]
    balance_tick: u32,

    /// field of view slider position in 0..=10
    #[argh(option, default = "9")]
    fov_tick: u32,

    /// render every yaw position instead of a single view
    #[argh(switch)]
    sweep: bool,

    /// path to a calibration profile, defaults to the bundled lens
    #[argh(option, short = 'p')]
    profile: Option<PathBuf>,
}

struct Viewer {
    profile: CalibrationProfile,
    frame: Image<f32, 3>,
    cache: RectifyMapCache,
}

impl Viewer {
    fn render(
        &mut self,
        controls: &ViewControls,
    ) -> Result<(Image<u8, 3>, f64), Box<dyn std::error::Error>> {
        let size = self.frame.size();
        let intrinsic = self.profile.intrinsic_for(size);
        let rotation = controls.rotation();

        let new_intrinsic = estimate_new_camera_matrix_for_undistort_rectify(
            &intrinsic,
            &self.profile.distortion,
            size,
            &rotation,
            controls.balance(),
            size,
            controls.fov_scale(),
        )?;

        let params = RectifyParams {
            intrinsic,
            distortion: self.profile.distortion,
            rotation,
            new_intrinsic,
            size,
        };
        let (map_x, map_y) = self.cache.get_or_build(&params)?;

        let mut view = Image::<f32, 3>::from_size_val(size, 0.0)?;
        remap(
            &self.frame,
            &mut view,
            map_x,
            map_y,
            InterpolationMode::Bilinear,
            BorderMode::Constant(0.0),
        )?;

        Ok((view.cast::<u8>()?, hfov_degrees(new_intrinsic.fx, size.width)))
    }
}

fn first_frame(input: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if !input.is_dir() {
        return Ok(input.to_path_buf());
    }
    F::list_images(input)?
        .into_iter()
        .next()
        .ok_or_else(|| format!("no images found in {}", input.display()).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let profile = match &args.profile {
        Some(path) => CalibrationProfile::load(path)?,
        None => CalibrationProfile::default(),
    };

    let frame_path = first_frame(&args.input)?;
    let frame = F::read_image_any_rgb8(&frame_path)?.cast::<f32>()?;
    log::info!("viewing {} ({})", frame_path.display(), frame.size());

    let mut controls = ViewControls::new(args.yaw_tick, args.balance_tick, args.fov_tick)?;
    let yaw_ticks = if args.sweep {
        (0..=YAW_TICK_MAX).collect::<Vec<_>>()
    } else {
        vec![args.yaw_tick]
    };

    std::fs::create_dir_all(&args.out_dir)?;

    let mut viewer = Viewer {
        profile,
        frame,
        cache: RectifyMapCache::new(),
    };

    for yaw_tick in yaw_ticks {
        controls.set_yaw_tick(yaw_tick)?;
        let (view, hfov) = match viewer.render(&controls) {
            Ok(rendered) => rendered,
            Err(err) if args.sweep => {
                log::warn!("yaw {} deg: {err}", controls.yaw_degrees());
                continue;
            }
            Err(err) => return Err(err),
        };

        let (_, balance_tick, fov_tick) = controls.ticks();
        let output = args.out_dir.join(format!(
            "view_yaw{:+04}_b{balance_tick:02}_f{fov_tick:02}.png",
            controls.yaw_degrees() as i32
        ));
        F::write_image_rgb8(&output, &view)?;

        log::info!(
            "yaw {:+.0} deg, balance {:.1}, fov scale {:.1}: HFOV {hfov:.1} deg",
            controls.yaw_degrees(),
            controls.balance(),
            controls.fov_scale()
        );
        println!("HFOV: {hfov:.1} deg -> {}", output.display());
    }

    Ok(())
}
