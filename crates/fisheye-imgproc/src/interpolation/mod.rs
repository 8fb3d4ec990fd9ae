//! Pixel interpolation methods for image resampling.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels
//!
//! Samples that fall outside the source image are resolved by a [`BorderMode`].

mod bilinear;
mod border;

/// Grid generation and coordinate mapping utilities.
pub mod grid;

mod interpolate;
mod nearest;
mod remap;

pub use border::BorderMode;
pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use remap::remap;
