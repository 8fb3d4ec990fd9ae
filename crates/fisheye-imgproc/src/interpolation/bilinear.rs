use super::BorderMode;
use fisheye_image::Image;

/// Kernel for bilinear interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `border` - How to read taps outside the image.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    border: BorderMode,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let u = border.fold(u, cols);
    let v = border.fold(v, rows);

    let u0 = u.floor();
    let v0 = v.floor();

    let frac_u = u - u0;
    let frac_v = v - v0;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    // casts saturate for coordinates far outside the image
    let (iu0, iv0) = (u0 as i64, v0 as i64);
    let (iu1, iv1) = (iu0.saturating_add(1), iv0.saturating_add(1));

    let taps = [
        (iu0, iv0, frac_uu * frac_vv),
        (iu1, iv0, frac_u * frac_vv),
        (iu0, iv1, frac_uu * frac_v),
        (iu1, iv1, frac_u * frac_v),
    ];

    let data = image.as_slice();
    let fill = border.fill_value();

    let mut pixel = [0.0; C];
    for (iu, iv, w) in taps {
        if w == 0.0 {
            continue;
        }
        match (border.resolve(iu, cols), border.resolve(iv, rows)) {
            (Some(x), Some(y)) => {
                let base = (y * cols + x) * C;
                let p = &data[base..base + C];
                for k in 0..C {
                    pixel[k] += p[k] * w;
                }
            }
            _ => {
                for value in pixel.iter_mut() {
                    *value += fill * w;
                }
            }
        }
    }

    pixel
}
