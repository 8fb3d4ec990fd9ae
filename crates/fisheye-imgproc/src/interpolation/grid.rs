use fisheye_tensor::{Tensor2, TensorError};
use rayon::prelude::*;

/// Create a meshgrid of x and y coordinates
///
/// # Arguments
///
/// * `rows` - The number of rows indicating the height of the grid
/// * `cols` - The number of columns indicating the width of the grid
///
/// # Returns
///
/// A tuple of 2D arrays of shape (rows, cols) containing the x and y coordinates
pub fn meshgrid(rows: usize, cols: usize) -> Result<(Tensor2<f32>, Tensor2<f32>), TensorError> {
    meshgrid_from_fn(cols, rows, |x, y| (x as f32, y as f32))
}

/// Create a pair of coordinate maps by evaluating `f(x, y)` at every grid position.
///
/// Rows are filled in parallel. The maps have shape (rows, cols).
///
/// # Example
///
/// ```
/// use fisheye_imgproc::interpolation::grid::meshgrid_from_fn;
///
/// let (map_x, map_y) = meshgrid_from_fn(3, 2, |x, y| (2.0 * x as f32, y as f32 + 0.5)).unwrap();
/// assert_eq!(map_x.as_slice(), &[0.0, 2.0, 4.0, 0.0, 2.0, 4.0]);
/// assert_eq!(map_y.as_slice(), &[0.5, 0.5, 0.5, 1.5, 1.5, 1.5]);
/// ```
pub fn meshgrid_from_fn<F>(
    cols: usize,
    rows: usize,
    f: F,
) -> Result<(Tensor2<f32>, Tensor2<f32>), TensorError>
where
    F: Fn(usize, usize) -> (f32, f32) + Send + Sync,
{
    let mut map_x = vec![0.0f32; rows * cols];
    let mut map_y = vec![0.0f32; rows * cols];

    if cols > 0 {
        map_x
            .par_chunks_exact_mut(cols)
            .zip(map_y.par_chunks_exact_mut(cols))
            .enumerate()
            .for_each(|(y, (xarr, yarr))| {
                xarr.iter_mut()
                    .zip(yarr.iter_mut())
                    .enumerate()
                    .for_each(|(x, (mx, my))| {
                        let (u, v) = f(x, y);
                        *mx = u;
                        *my = v;
                    });
            });
    }

    let map_x = Tensor2::from_shape_vec([rows, cols], map_x)?;
    let map_y = Tensor2::from_shape_vec([rows, cols], map_y)?;

    Ok((map_x, map_y))
}
