//! Frame to luminance conversion
//!
//! The decoder binarizes an 8-bit luminance plane; every supported pixel
//! layout is reduced to that here.

use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use jpeg_decoder::Decoder;

use super::frame::{Frame, FrameMetadata, PixelFormat};
use crate::error::{Result, ScanError};
use crate::scanner::options::Region;

/// Tightly packed 8-bit luminance, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaPlane {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl LumaPlane {
    /// Copy out a sub-rectangle.
    pub fn crop(&self, region: &Region) -> Result<LumaPlane> {
        let fits = region.width > 0
            && region.height > 0
            && region.left.checked_add(region.width).is_some_and(|r| r <= self.width)
            && region.top.checked_add(region.height).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(ScanError::Region {
                left: region.left,
                top: region.top,
                width: region.width,
                height: region.height,
                frame_width: self.width,
                frame_height: self.height,
            });
        }

        let mut data = Vec::with_capacity((region.width * region.height) as usize);
        for y in region.top..region.top + region.height {
            let start = (y * self.width + region.left) as usize;
            data.extend_from_slice(&self.data[start..start + region.width as usize]);
        }

        Ok(LumaPlane {
            data,
            width: region.width,
            height: region.height,
        })
    }

    /// Encode as JPEG, used for debug snapshots.
    pub fn to_jpeg(&self) -> Result<Vec<u8>> {
        let img = GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(
            || ScanError::conversion(PixelFormat::Gray8, "luminance plane has the wrong size"),
        )?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg)?;
        Ok(out.into_inner())
    }
}

/// Extract the luminance plane of a frame. The frame is only read.
pub fn luminance(frame: &Frame) -> Result<LumaPlane> {
    let meta = &frame.meta;
    let data = &frame.data[..];

    if meta.format == PixelFormat::Mjpeg {
        return decode_mjpeg(data);
    }

    if meta.width == 0 || meta.height == 0 {
        return Err(ScanError::conversion(meta.format, "frame has no pixels"));
    }

    let width = meta.width as usize;
    let mut luma = Vec::with_capacity(width * meta.height as usize);

    match meta.format {
        // Y plane comes first in NV12
        PixelFormat::Gray8 | PixelFormat::Nv12 => {
            for row in rows(data, meta)? {
                luma.extend_from_slice(row);
            }
        }
        PixelFormat::Yuyv4 => {
            for row in rows(data, meta)? {
                luma.extend(row.chunks_exact(2).map(|px| px[0]));
            }
        }
        PixelFormat::Rgb24 | PixelFormat::Rgba32 => {
            for row in rows(data, meta)? {
                let step = if meta.format == PixelFormat::Rgb24 { 3 } else { 4 };
                luma.extend(row.chunks_exact(step).map(|px| rgb_luma(px[0], px[1], px[2])));
            }
        }
        PixelFormat::Bgr24 | PixelFormat::Bgra32 => {
            for row in rows(data, meta)? {
                let step = if meta.format == PixelFormat::Bgr24 { 3 } else { 4 };
                luma.extend(row.chunks_exact(step).map(|px| rgb_luma(px[2], px[1], px[0])));
            }
        }
        PixelFormat::Mjpeg => unreachable!("handled above"),
    }

    Ok(LumaPlane {
        data: luma,
        width: meta.width,
        height: meta.height,
    })
}

/// Rows of the first plane, each trimmed to the visible width.
fn rows<'a>(data: &'a [u8], meta: &FrameMetadata) -> Result<impl Iterator<Item = &'a [u8]>> {
    let bpp = meta.format.bytes_per_pixel().unwrap_or(1) as usize;
    let row_bytes = meta.width as usize * bpp;
    let stride = if meta.stride == 0 {
        row_bytes
    } else {
        meta.stride as usize
    };

    if stride < row_bytes {
        return Err(ScanError::conversion(
            meta.format,
            format!("stride {stride} is shorter than a {row_bytes} byte row"),
        ));
    }

    let height = meta.height as usize;
    let needed = stride * (height - 1) + row_bytes;
    if data.len() < needed {
        return Err(ScanError::conversion(
            meta.format,
            format!("buffer holds {} bytes, {needed} needed", data.len()),
        ));
    }

    Ok((0..height).map(move |y| &data[y * stride..y * stride + row_bytes]))
}

fn decode_mjpeg(data: &[u8]) -> Result<LumaPlane> {
    let mut decoder = Decoder::new(data);
    let pixels = decoder
        .decode()
        .map_err(|e| ScanError::conversion(PixelFormat::Mjpeg, e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| ScanError::conversion(PixelFormat::Mjpeg, "missing JPEG header"))?;

    let data = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => pixels,
        // Big-endian samples, keep the high byte
        jpeg_decoder::PixelFormat::L16 => pixels.chunks_exact(2).map(|px| px[0]).collect(),
        jpeg_decoder::PixelFormat::RGB24 => pixels
            .chunks_exact(3)
            .map(|px| rgb_luma(px[0], px[1], px[2]))
            .collect(),
        jpeg_decoder::PixelFormat::CMYK32 => {
            return Err(ScanError::conversion(
                PixelFormat::Mjpeg,
                "CMYK JPEG is not supported",
            ))
        }
    };

    Ok(LumaPlane {
        data,
        width: info.width as u32,
        height: info.height as u32,
    })
}

#[inline]
fn rgb_luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 + 2 * g as u32 + b as u32) / 4) as u8
}
