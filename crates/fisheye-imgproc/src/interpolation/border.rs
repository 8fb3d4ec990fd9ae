/// Policy for samples that fall outside the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderMode {
    /// Out-of-bounds taps read a constant value.
    Constant(f32),
    /// Out-of-bounds taps read the closest edge pixel.
    Replicate,
    /// Out-of-bounds taps wrap around to the opposite edge.
    Wrap,
}

impl Default for BorderMode {
    fn default() -> Self {
        BorderMode::Constant(0.0)
    }
}

impl BorderMode {
    /// Resolve a possibly out-of-range index along an axis of length `len`.
    ///
    /// Returns `None` when the tap must read the constant border value.
    #[inline]
    pub(crate) fn resolve(&self, idx: i64, len: usize) -> Option<usize> {
        let len_i = len as i64;
        if (0..len_i).contains(&idx) {
            return Some(idx as usize);
        }
        match self {
            BorderMode::Constant(_) => None,
            BorderMode::Replicate => Some(idx.clamp(0, len_i - 1) as usize),
            BorderMode::Wrap => Some(idx.rem_euclid(len_i) as usize),
        }
    }

    /// Fold a sample coordinate along an axis of length `len` before its taps
    /// are cast to integer indices.
    ///
    /// Wrapping borders reduce the coordinate into `[0, len]`. The other modes
    /// keep it, since the float to integer cast saturates.
    #[inline]
    pub(crate) fn fold(&self, x: f32, len: usize) -> f32 {
        match self {
            BorderMode::Wrap => x.rem_euclid(len as f32),
            _ => x,
        }
    }

    /// Value used for taps that resolve to no pixel.
    #[inline]
    pub(crate) fn fill_value(&self) -> f32 {
        match self {
            BorderMode::Constant(v) => *v,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BorderMode;

    #[test]
    fn resolve_indices() {
        let constant = BorderMode::Constant(7.0);
        assert_eq!(constant.resolve(2, 4), Some(2));
        assert_eq!(constant.resolve(-1, 4), None);
        assert_eq!(constant.resolve(4, 4), None);
        assert_eq!(constant.fill_value(), 7.0);

        assert_eq!(BorderMode::Replicate.resolve(-3, 4), Some(0));
        assert_eq!(BorderMode::Replicate.resolve(9, 4), Some(3));

        assert_eq!(BorderMode::Wrap.resolve(-1, 4), Some(3));
        assert_eq!(BorderMode::Wrap.resolve(5, 4), Some(1));
        assert_eq!(BorderMode::default(), BorderMode::Constant(0.0));
    }

    #[test]
    fn fold_coordinates() {
        assert_eq!(BorderMode::Wrap.fold(5.5, 4), 1.5);
        assert_eq!(BorderMode::Wrap.fold(-0.5, 4), 3.5);
        assert_eq!(BorderMode::Wrap.fold(1e30, 4), 0.0);
        assert_eq!(BorderMode::Replicate.fold(1e30, 4), 1e30);
        assert_eq!(BorderMode::Constant(0.0).fold(-7.0, 4), -7.0);
    }
}
