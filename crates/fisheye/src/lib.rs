#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use fisheye_tensor as tensor;

#[doc(inline)]
pub use fisheye_image as image;

#[doc(inline)]
pub use fisheye_imgproc as imgproc;

#[doc(inline)]
pub use fisheye_io as io;

#[doc(inline)]
pub use fisheye_3d as k3d;

#[doc(inline)]
pub use fisheye_calib as calib;
