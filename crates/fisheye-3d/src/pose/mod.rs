mod homography;

pub use homography::{apply_homography, find_homography, HomographyError};
