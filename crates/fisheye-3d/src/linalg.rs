/// The 3x3 identity matrix.
pub const IDENTITY_MAT33: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Multiply two 3x3 matrices.
///
/// Example:
///
/// ```
/// use fisheye_3d::linalg::{mat33_mul, IDENTITY_MAT33};
///
/// let a = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
/// assert_eq!(mat33_mul(&a, &IDENTITY_MAT33), a);
/// ```
pub fn mat33_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Multiply a 3x3 matrix with a 3-vector.
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Transpose a 3x3 matrix.
pub fn transpose_mat33(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Determinant of a 3x3 matrix.
pub fn det_mat33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Inverse of a 3x3 matrix via the adjugate.
///
/// Returns `None` when the determinant magnitude is below `1e-12`.
pub fn inverse_mat33(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = det_mat33(m);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}

/// Scale a 3x3 matrix in place so that its bottom-right entry is one.
///
/// Matrices with a vanishing bottom-right entry are left untouched.
pub fn normalize_mat33_inplace(m: &mut [[f64; 3]; 3]) {
    let scale = m[2][2];
    if scale.abs() < f64::EPSILON {
        return;
    }
    m.iter_mut()
        .flat_map(|row| row.iter_mut())
        .for_each(|v| *v /= scale);
}

/// Whether `m` is a proper rotation: orthonormal with determinant +1, within `tol`.
pub fn is_rotation_mat33(m: &[[f64; 3]; 3], tol: f64) -> bool {
    let mtm = mat33_mul(&transpose_mat33(m), m);
    let orthonormal = (0..3).all(|i| {
        (0..3).all(|j| (mtm[i][j] - IDENTITY_MAT33[i][j]).abs() < tol)
    });
    orthonormal && (det_mat33(m) - 1.0).abs() < tol
}
