use super::BorderMode;
use fisheye_image::Image;

/// Kernel for nearest neighbor interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `border` - How to read samples outside the image.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn nearest_neighbor_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    border: BorderMode,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu = border.fold(u, cols).round() as i64;
    let iv = border.fold(v, rows).round() as i64;

    match (border.resolve(iu, cols), border.resolve(iv, rows)) {
        (Some(x), Some(y)) => {
            let base = (y * cols + x) * C;
            let mut pixel = [0.0; C];
            pixel.copy_from_slice(&image.as_slice()[base..base + C]);
            pixel
        }
        _ => [border.fill_value(); C],
    }
}
