use approx::assert_relative_eq;
use fisheye_calib::{
    ground::world_grid, CalibrationProfile, GroundCorrespondences, GroundPlaneError,
};

const DATA_DIR: &str = "../../tests/data/ground";

fn load(name: &str) -> Result<GroundCorrespondences, GroundPlaneError> {
    GroundCorrespondences::load(format!("{DATA_DIR}/{name}.json"))
}

#[test]
fn fit_all_cameras() -> Result<(), GroundPlaneError> {
    for name in ["front", "back", "left", "right"] {
        let correspondences = load(name)?;
        assert!(correspondences.profile.is_some());
        let mapper = correspondences.fit(&CalibrationProfile::default())?;
        assert!(mapper.rms().is_finite(), "{name}");
    }
    Ok(())
}

#[test]
fn front_pixels_round_trip() -> Result<(), GroundPlaneError> {
    let correspondences = load("front")?;
    let mapper = correspondences.fit(&CalibrationProfile::default())?;

    // the outermost marks lie past 90 degrees and are skipped
    for pixel in &correspondences.fisheye_points[1..5] {
        let world = mapper.pixel_to_world(pixel)?;
        let back = mapper.world_to_pixel(&world)?;
        assert_relative_eq!(back[0], pixel[0], epsilon = 1e-6);
        assert_relative_eq!(back[1], pixel[1], epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn front_grid_lands_in_frame() -> Result<(), GroundPlaneError> {
    let mapper = load("front")?.fit(&CalibrationProfile::default())?;
    let size = mapper.profile().image_size;

    let grid = world_grid((-300.0, 300.0), (500.0, 1000.0), 50.0)?;
    assert_eq!(grid.len(), 13 * 11);
    for world in &grid {
        let pixel = mapper.world_to_pixel(world)?;
        assert!(pixel[0].is_finite() && pixel[1].is_finite());
        assert!((0.0..size.width as f64).contains(&pixel[0]), "{world:?} -> {pixel:?}");
        assert!((0.0..size.height as f64).contains(&pixel[1]), "{world:?} -> {pixel:?}");
    }
    Ok(())
}
