//! V4L2 capture feeding the live scanner

use std::time::{Duration, Instant};

use bytes::Bytes;
use color_eyre::{eyre::eyre, Result};
use tracing::{info, instrument};
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::{
    capture::frame::{Frame, FrameMetadata, Orientation, PixelFormat},
    CaptureConfig,
};

/// Memory-mapped V4L2 capture
pub struct V4l2Capture {
    device: Device,
    stream: Option<MmapStream<'static>>,
    config: CaptureConfig,
    stride: u32,
    sequence: u64,
}

impl V4l2Capture {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        info!("Initializing V4L2 capture: {:?}", config.device);

        let device = Device::with_path(&config.device.path)?;

        let caps = device.query_caps()?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(eyre!("Device doesn't support video capture"));
        }

        let mut fmt = device.format()?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = match config.device.format {
            PixelFormat::Mjpeg => FourCC::new(b"MJPG"),
            PixelFormat::Yuyv4 => FourCC::new(b"YUYV"),
            other => return Err(eyre!("Unsupported capture format: {:?}", other)),
        };

        // The driver may round the size; trust what it settled on
        let fmt = device.set_format(&fmt)?;
        let mut config = config;
        config.width = fmt.width;
        config.height = fmt.height;

        Ok(Self {
            device,
            stream: None,
            stride: fmt.stride,
            config,
            sequence: 0,
        })
    }

    pub fn start_stream(&mut self) -> Result<()> {
        let stream =
            MmapStream::with_buffers(&self.device, Type::VideoCapture, self.config.buffer_count)?;

        self.stream = Some(stream);
        info!(
            "Capture stream started with {} buffers, {}x{} {:?}",
            self.config.buffer_count, self.config.width, self.config.height, self.config.device.format
        );
        Ok(())
    }

    /// Blocks until the driver hands over the next buffer.
    #[instrument(skip(self))]
    pub fn capture_frame(&mut self) -> Result<Frame> {
        let timestamp = Instant::now();

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| eyre!("Stream not started"))?;

        let (buf, meta) = stream.next()?;
        let used = (meta.bytesused as usize).min(buf.len());
        let data = Bytes::copy_from_slice(&buf[..used]);

        self.sequence += 1;

        let frame_meta = FrameMetadata {
            sequence: self.sequence,
            width: self.config.width,
            height: self.config.height,
            stride: self.stride,
            format: self.config.device.format,
            orientation: Orientation::Up,
            device_timestamp: Some(
                Duration::from_secs(meta.timestamp.sec as u64)
                    + Duration::from_micros(meta.timestamp.usec as u64),
            ),
        };

        let mut frame = Frame::new(data, frame_meta);
        frame.timestamp = timestamp;
        Ok(frame)
    }
}
