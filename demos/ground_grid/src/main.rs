use argh::FromArgs;
use fisheye::{
    calib::{ground::world_grid, CalibrationProfile, GroundCorrespondences},
    imgproc::draw::{draw_filled_circle, draw_line},
    io::functional as F,
};
use std::path::PathBuf;

const GRID_COLOR: [u8; 3] = [255, 255, 0];
const MARKER_COLOR: [u8; 3] = [255, 0, 0];
const OUTLINE_COLOR: [u8; 3] = [0, 255, 0];
const POINT_RADIUS: i64 = 3;

#[derive(FromArgs)]
/// Draw a ground plane grid over a fisheye frame
struct Args {
    /// path to the fisheye frame
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// path to the annotated output image
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// path to the fisheye to ground correspondences (json)
    #[argh(option, short = 'c')]
    correspondences: PathBuf,

    /// grid start along x
    #[argh(option, default = "-300.0")]
    x_min: f64,

    /// grid end along x
    #[argh(option, default = "300.0")]
    x_max: f64,

    /// grid start along y
    #[argh(option, default = "0.0")]
    y_min: f64,

    /// grid end along y
    #[argh(option, default = "1000.0")]
    y_max: f64,

    /// grid spacing
    #[argh(option, default = "50.0")]
    step: f64,

    /// x of an extra marked ground point
    #[argh(option)]
    marker_x: Option<f64>,

    /// y of an extra marked ground point
    #[argh(option)]
    marker_y: Option<f64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let correspondences = GroundCorrespondences::load(&args.correspondences)?;
    let mapper = correspondences.fit(&CalibrationProfile::default())?;
    log::info!("homography {:?}", mapper.homography());

    let mut image = F::read_image_any_rgb8(&args.input)?;
    let (width, height) = (image.width() as f64, image.height() as f64);

    // outline of the measured reference marks
    let marks = &correspondences.fisheye_points;
    for (i, p0) in marks.iter().enumerate() {
        let p1 = &marks[(i + 1) % marks.len()];
        draw_line(
            &mut image,
            (p0[0].round() as i64, p0[1].round() as i64),
            (p1[0].round() as i64, p1[1].round() as i64),
            OUTLINE_COLOR,
            1,
        );
    }

    let grid = world_grid((args.x_min, args.x_max), (args.y_min, args.y_max), args.step)?;
    let mut drawn = 0;
    for world in &grid {
        let pixel = match mapper.world_to_pixel(world) {
            Ok(pixel) => pixel,
            Err(err) => {
                log::debug!("{world:?} not drawn: {err}");
                continue;
            }
        };
        if !(0.0..width).contains(&pixel[0]) || !(0.0..height).contains(&pixel[1]) {
            continue;
        }
        draw_filled_circle(
            &mut image,
            (pixel[0].round() as i64, pixel[1].round() as i64),
            POINT_RADIUS,
            GRID_COLOR,
        );
        drawn += 1;
    }

    if let (Some(x), Some(y)) = (args.marker_x, args.marker_y) {
        let pixel = mapper.world_to_pixel(&[x, y])?;
        draw_filled_circle(
            &mut image,
            (pixel[0].round() as i64, pixel[1].round() as i64),
            POINT_RADIUS,
            MARKER_COLOR,
        );
    }

    F::write_image_rgb8(&args.output, &image)?;
    println!(
        "drew {drawn} of {} grid points into {}",
        grid.len(),
        args.output.display()
    );

    Ok(())
}
