use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use super::BorderMode;
use fisheye_image::Image;

/// Interpolation mode for the remap operation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border` - How to read samples outside the image.
///
/// # Returns
///
/// The interpolated pixel values. Non-finite coordinates and empty images
/// yield the border fill value.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
    border: BorderMode,
) -> [f32; C] {
    if !(u.is_finite() && v.is_finite()) || image.size().is_empty() {
        return [border.fill_value(); C];
    }
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v, border),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v, border),
    }
}
