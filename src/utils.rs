use crate::capture::frame::PixelFormat;
use serde::{Deserialize, Serialize};

// Detected capture device info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundDevice {
    pub path: String,
    pub format: PixelFormat,
}

impl FoundDevice {
    pub fn new(path: String, format: PixelFormat) -> Self {
        Self { path, format }
    }
}

/// Auto-detect a capture device, preferring YUYV since its luminance can be
/// read without decoding.
#[cfg(feature = "camera")]
pub fn auto_detect_device() -> color_eyre::Result<FoundDevice> {
    use color_eyre::eyre::eyre;
    use std::path::Path;
    use tracing::info;
    use v4l::{capability::Flags, video::Capture, Device, FourCC};

    info!("Auto-detecting capture devices...");

    let mut mjpeg = None;
    for i in 0..10 {
        let path = format!("/dev/video{}", i);
        if !Path::new(&path).exists() {
            continue;
        }

        let Ok(dev) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            continue;
        }

        if let Ok(formats) = dev.enum_formats() {
            for fmt in formats {
                if fmt.fourcc == FourCC::new(b"YUYV") {
                    info!("Found YUYV device: {} - {}", path, caps.card);
                    return Ok(FoundDevice::new(path, PixelFormat::Yuyv4));
                } else if fmt.fourcc == FourCC::new(b"MJPG") && mjpeg.is_none() {
                    info!("Found MJPEG device: {} - {}", path, caps.card);
                    mjpeg = Some(FoundDevice::new(path.clone(), PixelFormat::Mjpeg));
                }
            }
        }
    }

    mjpeg.ok_or_else(|| eyre!("No suitable capture device found"))
}
