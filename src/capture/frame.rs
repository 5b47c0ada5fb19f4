use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Frame data with zero-copy semantics
#[derive(Clone)]
pub struct Frame {
    /// Immutable frame data - can be shared across threads without copying
    pub data: Bytes,

    /// Frame metadata
    pub meta: Arc<FrameMetadata>,

    /// Capture timestamp for latency tracking
    pub timestamp: Instant,
}

/// Frame metadata
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    /// Bytes per row of the first plane
    pub stride: u32,
    pub format: PixelFormat,
    pub orientation: Orientation,
    pub device_timestamp: Option<Duration>, // Hardware timestamp if available
}

/// Pixel formats we can read luminance from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Gray8,
    Rgb24,
    Bgr24,
    Rgba32,
    Bgra32,
    Yuyv4,
    Nv12,
    Mjpeg,
}

impl PixelFormat {
    /// Bytes per pixel in the first plane, `None` for compressed formats.
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            PixelFormat::Gray8 | PixelFormat::Nv12 => Some(1),
            PixelFormat::Yuyv4 => Some(2),
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => Some(3),
            PixelFormat::Rgba32 | PixelFormat::Bgra32 => Some(4),
            PixelFormat::Mjpeg => None,
        }
    }
}

/// How the sensor image is rotated relative to upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>, meta: FrameMetadata) -> Self {
        Self {
            data: data.into(),
            meta: Arc::new(meta),
            timestamp: Instant::now(),
        }
    }

    /// Tightly packed frame of an uncompressed format.
    pub fn packed(data: impl Into<Bytes>, width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel().unwrap_or(0);
        Self::new(
            data,
            FrameMetadata {
                sequence: 0,
                width,
                height,
                stride,
                format,
                orientation: Orientation::Up,
                device_timestamp: None,
            },
        )
    }

    pub fn gray(data: impl Into<Bytes>, width: u32, height: u32) -> Self {
        Self::packed(data, width, height, PixelFormat::Gray8)
    }
}
