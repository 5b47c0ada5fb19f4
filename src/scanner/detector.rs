//! Frame detector
//!
//! Converts a frame, runs the reader chain the options ask for and turns
//! what the library found into a [`DetectionResult`]. One
//! [`MultiFormatReader`] is kept between calls and only rebuilt when the
//! requested formats or accuracy change.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rxing::common::HybridBinarizer;
use rxing::multi::{ByQuadrantReader, GenericMultipleBarcodeReader, MultipleBarcodeReader};
use rxing::{
    Binarizer, BinaryBitmap, DecodeHints, Exceptions, Luma8LuminanceSource, MultiFormatReader,
    RXingResult, Reader,
};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use super::format::{parse_formats, BarcodeFormat};
use super::options::DetectionOptions;
use super::readers::{MultiFormatReaderAdapter, SingleResultMultipleReader};
use super::result::{Barcode, DetectionResult};
use crate::capture::frame::Frame;
use crate::capture::luminance::luminance;
use crate::error::{Result, ScanError};

/// Planes narrower or shorter than this never reach the decoder.
const MIN_SCAN_SIDE: u32 = 8;

/// What the cached reader was configured for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReaderKey {
    formats: BTreeSet<BarcodeFormat>,
    accurate: bool,
}

struct CachedReader {
    key: ReaderKey,
    reader: MultiFormatReader,
    hints: DecodeHints,
}

impl CachedReader {
    fn new(key: ReaderKey) -> Self {
        let mut hints = DecodeHints::default();
        hints.PossibleFormats = Some(key.formats.iter().map(|f| f.to_rxing()).collect());
        if key.accurate {
            hints.TryHarder = Some(true);
        }

        let mut reader = MultiFormatReader::default();
        reader.set_hints(&hints);

        Self { key, reader, hints }
    }
}

/// Barcode detector for one camera stream.
///
/// Not reentrant; wrap it in [`SharedDetector`] if frames may arrive from
/// more than one thread.
#[derive(Default)]
pub struct BarcodeDetector {
    cached: Option<CachedReader>,
    builds: u64,
}

impl BarcodeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one frame.
    ///
    /// `formats` may be empty or contain unknown names; see
    /// [`parse_formats`]. Finding nothing is an empty result, not an error.
    #[instrument(skip_all, fields(sequence = frame.meta.sequence))]
    pub fn detect<S: AsRef<str>>(
        &mut self,
        frame: &Frame,
        formats: &[S],
        options: &DetectionOptions,
    ) -> Result<DetectionResult> {
        let started = Instant::now();

        let full = luminance(frame)?;
        let (width, height) = (full.width, full.height);
        let (plane, offset) = match &options.region {
            Some(region) => (full.crop(region)?, (region.left, region.top)),
            None => (full, (0, 0)),
        };

        let base64_jpeg = if options.include_snapshot {
            Some(STANDARD.encode(plane.to_jpeg()?))
        } else {
            None
        };

        // Quadrant mode splits the plane in half both ways
        let min_side = if options.read_by_quadrant {
            MIN_SCAN_SIDE * 2
        } else {
            MIN_SCAN_SIDE
        };
        if plane.width < min_side || plane.height < min_side {
            debug!(
                width = plane.width,
                height = plane.height,
                "plane too small to scan"
            );
            return Ok(DetectionResult {
                base64_jpeg,
                ..DetectionResult::empty(width, height, frame.meta.orientation)
            });
        }

        let key = ReaderKey {
            formats: parse_formats(formats),
            accurate: options.accurate,
        };
        let cached = self.reader_for(key);

        let source = Luma8LuminanceSource::new(plane.data, plane.width, plane.height);
        let mut image = BinaryBitmap::new(HybridBinarizer::new(source));

        let adapter = MultiFormatReaderAdapter::new(&mut cached.reader);
        let outcome = if options.read_by_quadrant {
            decode_all(
                ByQuadrantReader::new(adapter),
                options.read_multiple,
                &mut image,
                &cached.hints,
            )
        } else {
            decode_all(adapter, options.read_multiple, &mut image, &cached.hints)
        };

        let found = match outcome {
            Ok(found) => found,
            Err(Exceptions::NotFoundException(_)) => Vec::new(),
            Err(e) => return Err(ScanError::Decode(e)),
        };

        let barcodes: Vec<Barcode> = found
            .iter()
            .filter_map(|r| Barcode::from_rxing(r, offset))
            .collect();

        let elapsed = started.elapsed();
        metrics::histogram!("barcode_decode_time_us").record(elapsed.as_micros() as f64);
        metrics::counter!("barcode_frames_scanned").increment(1);
        trace!(
            found = barcodes.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "frame scanned"
        );

        Ok(DetectionResult {
            barcodes,
            width,
            height,
            orientation: frame.meta.orientation,
            base64_jpeg,
        })
    }

    /// Host-facing form: options come in and the result goes out as JSON
    /// values.
    pub fn detect_value<S: AsRef<str>>(
        &mut self,
        frame: &Frame,
        formats: &[S],
        options: &Value,
    ) -> Result<Value> {
        let options = DetectionOptions::from_value(options)?;
        let result = self.detect(frame, formats, &options)?;
        serde_json::to_value(result).map_err(ScanError::Serialize)
    }

    /// Drop the cached reader. The next call builds a fresh one.
    pub fn reset(&mut self) {
        if self.cached.take().is_some() {
            debug!("barcode reader released");
        }
    }

    /// How many readers this detector has built so far.
    pub fn reader_builds(&self) -> u64 {
        self.builds
    }

    /// Formats the cached reader is configured for, if one exists.
    pub fn cached_formats(&self) -> Option<&BTreeSet<BarcodeFormat>> {
        self.cached.as_ref().map(|c| &c.key.formats)
    }

    fn reader_for(&mut self, key: ReaderKey) -> &mut CachedReader {
        if self.cached.as_ref().is_some_and(|c| c.key != key) {
            self.cached = None;
        }
        let builds = &mut self.builds;
        self.cached.get_or_insert_with(|| {
            *builds += 1;
            debug!(
                formats = ?key.formats,
                accurate = key.accurate,
                "building barcode reader"
            );
            CachedReader::new(key)
        })
    }
}

fn decode_all<R: Reader, B: Binarizer>(
    reader: R,
    multiple: bool,
    image: &mut BinaryBitmap<B>,
    hints: &DecodeHints,
) -> std::result::Result<Vec<RXingResult>, Exceptions> {
    if multiple {
        GenericMultipleBarcodeReader::new(reader).decode_multiple_with_hints(image, hints)
    } else {
        SingleResultMultipleReader::new(reader).decode_multiple_with_hints(image, hints)
    }
}

/// A detector that can be handed to several threads. Calls are serialized.
#[derive(Clone, Default)]
pub struct SharedDetector {
    inner: Arc<Mutex<BarcodeDetector>>,
}

impl SharedDetector {
    pub fn new(detector: BarcodeDetector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    pub fn detect<S: AsRef<str>>(
        &self,
        frame: &Frame,
        formats: &[S],
        options: &DetectionOptions,
    ) -> Result<DetectionResult> {
        let mut detector = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        detector.detect(frame, formats, options)
    }

    pub fn reset(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::options::Region;
    use crate::testing::{blank_plane, encode, gray_frame, paint, qr_plane};
    use serde_json::json;

    #[test]
    fn reader_is_reused_for_the_same_request() {
        let mut detector = BarcodeDetector::new();
        let frame = gray_frame(&qr_plane("A", 320, 240));
        let opts = DetectionOptions::default();

        detector.detect(&frame, &["QR_CODE"], &opts).unwrap();
        detector.detect(&frame, &["QRCode"], &opts).unwrap();
        detector.detect(&frame, &["qr-code", "UNKNOWN"], &opts).unwrap();

        assert_eq!(detector.reader_builds(), 1);
        assert_eq!(
            detector.cached_formats().unwrap().iter().collect::<Vec<_>>(),
            vec![&BarcodeFormat::QrCode]
        );
    }

    #[test]
    fn changing_formats_rebuilds_the_reader() {
        let mut detector = BarcodeDetector::new();
        let frame = gray_frame(&blank_plane(64, 64));
        let opts = DetectionOptions::default();

        detector.detect(&frame, &["QR_CODE"], &opts).unwrap();
        detector.detect(&frame, &["EAN_13", "EAN_8"], &opts).unwrap();
        assert_eq!(detector.reader_builds(), 2);

        let accurate = DetectionOptions {
            accurate: true,
            ..Default::default()
        };
        detector.detect(&frame, &["EAN_13", "EAN_8"], &accurate).unwrap();
        assert_eq!(detector.reader_builds(), 3);

        let formats = detector.cached_formats().unwrap();
        assert!(formats.contains(&BarcodeFormat::Ean13));
        assert!(!formats.contains(&BarcodeFormat::QrCode));
    }

    #[test]
    fn reset_drops_the_reader() {
        let mut detector = BarcodeDetector::new();
        let frame = gray_frame(&blank_plane(64, 64));
        detector
            .detect(&frame, &["QR_CODE"], &DetectionOptions::default())
            .unwrap();
        assert!(detector.cached_formats().is_some());

        detector.reset();
        assert!(detector.cached_formats().is_none());
    }

    #[test]
    fn region_points_are_in_frame_coordinates() {
        let mut plane = blank_plane(640, 480);
        let matrix = encode("RIGHT", rxing::BarcodeFormat::QR_CODE, 200, 200);
        paint(&mut plane, &matrix, 380, 140);

        let opts = DetectionOptions {
            region: Some(Region {
                left: 320,
                top: 0,
                width: 320,
                height: 480,
            }),
            ..Default::default()
        };
        let result = BarcodeDetector::new()
            .detect(&gray_frame(&plane), &["QR_CODE"], &opts)
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!((result.width, result.height), (640, 480));
        assert!(result.barcodes[0].corner_points.iter().all(|p| p.x >= 320.0));
    }

    #[test]
    fn region_outside_the_frame_is_an_error() {
        let opts = DetectionOptions {
            region: Some(Region {
                left: 600,
                top: 0,
                width: 100,
                height: 10,
            }),
            ..Default::default()
        };
        let err = BarcodeDetector::new()
            .detect(&gray_frame(&blank_plane(640, 480)), &["QR_CODE"], &opts)
            .unwrap_err();
        assert!(matches!(err, ScanError::Region { .. }));
    }

    #[test]
    fn degenerate_planes_are_empty_not_fatal() {
        let mut detector = BarcodeDetector::new();
        for quadrant in [false, true] {
            let opts = DetectionOptions {
                read_by_quadrant: quadrant,
                ..Default::default()
            };
            for (w, h) in [(1, 1), (1, 100), (100, 1), (2, 2), (3, 3), (15, 15)] {
                let result = detector
                    .detect(&gray_frame(&blank_plane(w, h)), &["QR_CODE"], &opts)
                    .unwrap();
                assert!(result.is_empty(), "{w}x{h} quadrant={quadrant}");
                assert_eq!((result.width, result.height), (w, h));
            }
        }
    }

    #[test]
    fn thin_regions_are_empty_not_fatal() {
        let frame = gray_frame(&qr_plane("THIN", 320, 240));
        let mut detector = BarcodeDetector::new();
        for quadrant in [false, true] {
            for (width, height) in [(1, 240), (320, 1), (1, 1), (6, 200)] {
                let opts = DetectionOptions {
                    read_by_quadrant: quadrant,
                    region: Some(Region {
                        left: 0,
                        top: 0,
                        width,
                        height,
                    }),
                    ..Default::default()
                };
                let result = detector.detect(&frame, &["QR_CODE"], &opts).unwrap();
                assert!(result.is_empty(), "{width}x{height} quadrant={quadrant}");
                assert_eq!((result.width, result.height), (320, 240));
            }
        }
    }

    #[test]
    fn small_region_still_gets_a_snapshot() {
        let opts = DetectionOptions {
            include_snapshot: true,
            region: Some(Region {
                left: 0,
                top: 0,
                width: 1,
                height: 1,
            }),
            ..Default::default()
        };
        let result = BarcodeDetector::new()
            .detect(&gray_frame(&blank_plane(32, 32)), &["QR_CODE"], &opts)
            .unwrap();
        assert!(result.is_empty());
        assert!(result.base64_jpeg.is_some());
    }

    #[test]
    fn snapshot_is_attached_on_request() {
        let opts = DetectionOptions {
            include_snapshot: true,
            ..Default::default()
        };
        let result = BarcodeDetector::new()
            .detect(&gray_frame(&blank_plane(32, 32)), &["QR_CODE"], &opts)
            .unwrap();
        let jpeg = STANDARD.decode(result.base64_jpeg.unwrap()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn detect_value_speaks_json() {
        let frame = gray_frame(&qr_plane("JSON", 320, 240));
        let value = BarcodeDetector::new()
            .detect_value(&frame, &["QRCode"], &json!({ "accurate": true }))
            .unwrap();

        assert_eq!(value["barcodes"][0]["text"], "JSON");
        assert_eq!(value["barcodes"][0]["format"], "QR_CODE");
        assert_eq!(value["width"], 320);
        assert!(value.get("base64JPEG").is_none());
    }

    #[test]
    fn shared_detector_serializes_calls() {
        let shared = SharedDetector::default();
        let frame = gray_frame(&qr_plane("SHARED", 320, 240));
        let first = shared.clone();

        let a = first
            .detect(&frame, &["QR_CODE"], &DetectionOptions::default())
            .unwrap();
        let b = shared
            .detect(&frame, &["QR_CODE"], &DetectionOptions::default())
            .unwrap();
        assert_eq!(a.barcodes, b.barcodes);

        shared.reset();
    }
}
