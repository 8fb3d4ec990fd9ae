use crate::parallel;

use super::interpolate::interpolate_pixel;
use super::{BorderMode, InterpolationMode};
use fisheye_image::{Image, ImageError};
use fisheye_tensor::Tensor2;

/// Apply generic geometric transformation to an image.
///
/// Every destination pixel `(x, y)` samples the source at `(map_x[y, x], map_y[y, x])`.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map_x` - The x coordinates of the pixels to interpolate.
/// * `map_y` - The y coordinates of the pixels to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border` - How to fill samples that fall outside `src`.
///
/// # Errors
///
/// * The mapx and mapy must have the same size.
/// * The output image must have the same size as the mapx and mapy.
/// * The source image must not be empty.
pub fn remap<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    map_x: &Tensor2<f32>,
    map_y: &Tensor2<f32>,
    interpolation: InterpolationMode,
    border: BorderMode,
) -> Result<(), ImageError> {
    if map_x.shape != map_y.shape {
        return Err(ImageError::InvalidImageSize(
            map_x.shape[1],
            map_x.shape[0],
            map_y.shape[1],
            map_y.shape[0],
        ));
    }

    if dst.shape[0..2] != map_x.shape {
        return Err(ImageError::InvalidImageSize(
            map_x.shape[1],
            map_x.shape[0],
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.size().is_empty() {
        return Err(ImageError::EmptyImageSize(src.cols(), src.rows()));
    }

    if dst.size().is_empty() {
        return Ok(());
    }

    // parallelize the remap operation by rows
    parallel::par_iter_rows_resample(dst, map_x, map_y, |&x, &y, dst_pixel| {
        let pixel = interpolate_pixel(src, x, y, interpolation, border);
        dst_pixel.copy_from_slice(&pixel);
    });

    Ok(())
}
