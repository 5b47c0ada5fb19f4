pub mod frame;
pub mod luminance;
#[cfg(feature = "camera")]
pub mod v4l2;

pub use frame::{Frame, FrameMetadata, Orientation, PixelFormat};
pub use luminance::{luminance, LumaPlane};
#[cfg(feature = "camera")]
pub use v4l2::V4l2Capture;
