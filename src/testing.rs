//! Shared test utilities.
//!
//! Available behind the `test-util` feature or in `#[cfg(test)]`.
//! Renders barcodes with the library's own writers so unit and integration
//! tests need no image fixtures.

use rxing::common::{BitMatrix, HybridBinarizer};
use rxing::{BarcodeFormat, BinaryBitmap, Luma8LuminanceSource, MultiFormatWriter, Writer};

use crate::capture::frame::{Frame, PixelFormat};
use crate::capture::luminance::LumaPlane;

/// Initialise a tracing subscriber for tests. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// White canvas.
pub fn blank_plane(width: u32, height: u32) -> LumaPlane {
    LumaPlane {
        data: vec![255; (width * height) as usize],
        width,
        height,
    }
}

/// Encode `contents` and return the module matrix.
pub fn encode(contents: &str, format: BarcodeFormat, width: u32, height: u32) -> BitMatrix {
    MultiFormatWriter::default()
        .encode(contents, &format, width as i32, height as i32)
        .expect("test barcode encodes")
}

/// Paint `matrix` onto `plane` with its top-left corner at `(left, top)`.
pub fn paint(plane: &mut LumaPlane, matrix: &BitMatrix, left: u32, top: u32) {
    for y in 0..matrix.height() {
        for x in 0..matrix.width() {
            let (px, py) = (left + x, top + y);
            if px < plane.width && py < plane.height {
                plane.data[(py * plane.width + px) as usize] =
                    if matrix.get(x, y) { 0 } else { 255 };
            }
        }
    }
}

/// A QR code centred on a white canvas.
pub fn qr_plane(contents: &str, width: u32, height: u32) -> LumaPlane {
    let side = width.min(height) * 3 / 4;
    let matrix = encode(contents, BarcodeFormat::QR_CODE, side, side);
    let mut plane = blank_plane(width, height);
    paint(
        &mut plane,
        &matrix,
        (width - matrix.width()) / 2,
        (height - matrix.height()) / 2,
    );
    plane
}

/// Two QR codes, one in each half of the canvas.
pub fn two_qr_plane(left: &str, right: &str, width: u32, height: u32) -> LumaPlane {
    let side = (width / 2).min(height) * 3 / 4;
    let mut plane = blank_plane(width, height);
    for (i, contents) in [left, right].into_iter().enumerate() {
        let matrix = encode(contents, BarcodeFormat::QR_CODE, side, side);
        let half = width / 2;
        paint(
            &mut plane,
            &matrix,
            half * i as u32 + (half - matrix.width()) / 2,
            (height - matrix.height()) / 2,
        );
    }
    plane
}

/// A linear barcode across the middle of the canvas.
pub fn linear_plane(contents: &str, format: BarcodeFormat, width: u32, height: u32) -> LumaPlane {
    let matrix = encode(contents, format, width * 3 / 4, height / 3);
    let mut plane = blank_plane(width, height);
    paint(
        &mut plane,
        &matrix,
        (width - matrix.width()) / 2,
        (height - matrix.height()) / 2,
    );
    plane
}

pub fn bitmap(plane: &LumaPlane) -> BinaryBitmap<HybridBinarizer<Luma8LuminanceSource>> {
    let source = Luma8LuminanceSource::new(plane.data.clone(), plane.width, plane.height);
    BinaryBitmap::new(HybridBinarizer::new(source))
}

pub fn gray_frame(plane: &LumaPlane) -> Frame {
    Frame::gray(plane.data.clone(), plane.width, plane.height)
}

/// Repack a luminance plane as BGRA, the layout iOS cameras deliver.
pub fn bgra_frame(plane: &LumaPlane) -> Frame {
    let data: Vec<u8> = plane.data.iter().flat_map(|&v| [v, v, v, 255]).collect();
    Frame::packed(data, plane.width, plane.height, PixelFormat::Bgra32)
}
