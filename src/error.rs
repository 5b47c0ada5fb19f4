use thiserror::Error;

use crate::capture::frame::PixelFormat;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors surfaced by a single detection call.
///
/// "No barcode found" is never one of these; it is an empty result.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The frame could not be turned into a luminance plane.
    #[error("cannot convert {format:?} frame: {reason}")]
    Conversion {
        format: PixelFormat,
        reason: String,
    },

    /// A known option key carried a value of the wrong shape.
    #[error("invalid detection options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("region {left},{top} {width}x{height} lies outside the {frame_width}x{frame_height} frame")]
    Region {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    /// Raised by the decoding library; passed through untouched.
    #[error("decode failed: {0}")]
    Decode(rxing::Exceptions),

    #[error("failed to serialize detection result: {0}")]
    Serialize(serde_json::Error),

    #[error("failed to encode debug snapshot: {0}")]
    Snapshot(#[from] image::ImageError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl ScanError {
    pub(crate) fn conversion(format: PixelFormat, reason: impl Into<String>) -> Self {
        Self::Conversion {
            format,
            reason: reason.into(),
        }
    }
}
