use thiserror::Error;

use crate::linalg;

/// Errors raised while estimating a planar homography.
#[derive(Debug, Error, PartialEq)]
pub enum HomographyError {
    /// Fewer than four correspondences were supplied.
    #[error("at least 4 point correspondences are required, got {0}")]
    NotEnoughPoints(usize),

    /// The source and destination point sets differ in length.
    #[error("source has {0} points but destination has {1}")]
    LengthMismatch(usize, usize),

    /// The correspondences do not constrain a unique, invertible homography.
    #[error("degenerate point configuration")]
    Degenerate,
}

// Similarity moving the centroid to the origin with mean distance sqrt(2).
fn normalization_transform(points: &[[f64; 2]]) -> Result<[[f64; 3]; 3], HomographyError> {
    let n = points.len() as f64;
    let (cx, cy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (cx / n, cy / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist < 1e-12 {
        return Err(HomographyError::Degenerate);
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok([[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]])
}

/// Estimate the homography mapping `src` points onto `dst` points.
///
/// Uses the normalized direct linear transform: both point sets are conditioned
/// with a similarity transform, the stacked 2N x 9 system is solved by SVD and the
/// result is denormalized so that `H[2][2] == 1`. With more than four points the
/// solution is the algebraic least-squares fit.
///
/// # Arguments
///
/// * `src` - The source 2d points.
/// * `dst` - The destination 2d points, same length as `src`.
///
/// # Errors
///
/// Fails with fewer than four points, mismatched lengths, or when the points are
/// degenerate (coincident or collinear) and the result would not be invertible.
///
/// Example:
///
/// ```
/// use fisheye_3d::pose::find_homography;
///
/// let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
/// let dst = [[2.0, 3.0], [4.0, 3.0], [2.0, 5.0], [4.0, 5.0]];
/// let h = find_homography(&src, &dst).unwrap();
/// assert!((h[0][0] - 2.0).abs() < 1e-9);
/// assert!((h[1][2] - 3.0).abs() < 1e-9);
/// ```
pub fn find_homography(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<[[f64; 3]; 3], HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch(src.len(), dst.len()));
    }
    if src.len() < 4 {
        return Err(HomographyError::NotEnoughPoints(src.len()));
    }

    let t_src = normalization_transform(src)?;
    let t_dst = normalization_transform(dst)?;

    // construct matrix A from the conditioned points
    let num_points = src.len();
    let mut mat_a = faer::Mat::<f64>::zeros(2 * num_points, 9);
    for (i, (p1, p2)) in src.iter().zip(dst.iter()).enumerate() {
        let x1 = linalg::mat33_mul_vec3(&t_src, &[p1[0], p1[1], 1.0]);
        let x2 = linalg::mat33_mul_vec3(&t_dst, &[p2[0], p2[1], 1.0]);

        mat_a.write(2 * i, 0, x1[0]);
        mat_a.write(2 * i, 1, x1[1]);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -x2[0] * x1[0]);
        mat_a.write(2 * i, 7, -x2[0] * x1[1]);
        mat_a.write(2 * i, 8, -x2[0]);

        mat_a.write(2 * i + 1, 3, x1[0]);
        mat_a.write(2 * i + 1, 4, x1[1]);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -x2[1] * x1[0]);
        mat_a.write(2 * i + 1, 7, -x2[1] * x1[1]);
        mat_a.write(2 * i + 1, 8, -x2[1]);
    }

    // the right singular vector of the smallest singular value is the solution
    let svd = mat_a.svd();

    // a second vanishing singular value means the solution is not unique
    let s = svd.s_diagonal();
    if s[0] <= 0.0 || s[7] / s[0] < 1e-10 {
        return Err(HomographyError::Degenerate);
    }

    let h = svd.v().col(8);
    let h_norm = [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], h[8]]];

    // H = T_dst^-1 * Hn * T_src
    let t_dst_inv = linalg::inverse_mat33(&t_dst).ok_or(HomographyError::Degenerate)?;
    let mut homo = linalg::mat33_mul(&linalg::mat33_mul(&t_dst_inv, &h_norm), &t_src);

    if homo[2][2].abs() < 1e-12 {
        return Err(HomographyError::Degenerate);
    }
    linalg::normalize_mat33_inplace(&mut homo);

    if linalg::det_mat33(&homo).abs() < 1e-12 {
        return Err(HomographyError::Degenerate);
    }

    Ok(homo)
}

/// Apply a homography to a 2d point.
///
/// Returns `None` when the point maps to infinity.
pub fn apply_homography(homo: &[[f64; 3]; 3], point: &[f64; 2]) -> Option<[f64; 2]> {
    let p = linalg::mat33_mul_vec3(homo, &[point[0], point[1], 1.0]);
    if p[2].abs() < 1e-12 {
        return None;
    }
    Some([p[0] / p[2], p[1] / p[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_find_homography_four_points_identity() -> Result<(), HomographyError> {
        let x1 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let x2 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let expected = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let homo = find_homography(&x1, &x2)?;

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(homo[i][j], expected[i][j], epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_find_homography_four_points_translation() -> Result<(), HomographyError> {
        let x1 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let (tx, ty) = (1.0, 1.0);
        let expected = [[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]];
        let mut x2 = [[0.0; 2]; 4];
        for i in 0..4 {
            x2[i] = apply_homography(&expected, &x1[i]).ok_or(HomographyError::Degenerate)?;
        }
        let homo = find_homography(&x1, &x2)?;

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(homo[i][j], expected[i][j], epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_find_homography_projective_many_points() -> Result<(), HomographyError> {
        let expected = [
            [0.8, 0.1, 120.0],
            [-0.05, 1.2, 40.0],
            [1e-4, 2e-4, 1.0],
        ];
        let src = (0..6)
            .flat_map(|j| (0..8).map(move |i| [i as f64 * 38.0, j as f64 * 38.0]))
            .collect::<Vec<_>>();
        let dst = src
            .iter()
            .map(|p| apply_homography(&expected, p).ok_or(HomographyError::Degenerate))
            .collect::<Result<Vec<_>, _>>()?;

        let homo = find_homography(&src, &dst)?;
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(homo[i][j], expected[i][j], epsilon = 1e-8, max_relative = 1e-6);
            }
        }

        let back = apply_homography(&homo, &src[17]).ok_or(HomographyError::Degenerate)?;
        assert_relative_eq!(back[0], dst[17][0], epsilon = 1e-6);
        assert_relative_eq!(back[1], dst[17][1], epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_find_homography_errors() {
        let three = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            find_homography(&three, &three),
            Err(HomographyError::NotEnoughPoints(3))
        );

        let four = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert_eq!(
            find_homography(&four, &three),
            Err(HomographyError::LengthMismatch(4, 3))
        );

        let collinear = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        assert_eq!(
            find_homography(&collinear, &collinear),
            Err(HomographyError::Degenerate)
        );

        let coincident = [[5.0, 5.0]; 4];
        assert_eq!(
            find_homography(&coincident, &four),
            Err(HomographyError::Degenerate)
        );
    }
}
