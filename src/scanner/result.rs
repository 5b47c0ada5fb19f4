//! Detection results as handed back to the host.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rxing::{RXingResult, RXingResultMetadataValue};
use serde::{Deserialize, Serialize};

use super::format::BarcodeFormat;
use crate::capture::frame::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarcodePoint {
    pub x: f32,
    pub y: f32,
}

/// Optional facts the decoder reported about a barcode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,

    /// Degrees clockwise from upright, in [0, 360).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<i32>,

    /// Raw byte-mode segments, base64 encoded, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_segments: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_correction_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_price: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_country: Option<String>,

    #[serde(rename = "UPCEANExtension", skip_serializing_if = "Option::is_none")]
    pub upc_ean_extension: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_append_sequence: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_append_parity: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_append_index: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_append_total: Option<i32>,
}

impl BarcodeMetadata {
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a RXingResultMetadataValue>,
    {
        let mut meta = Self::default();

        for value in values {
            match value {
                RXingResultMetadataValue::OTHER(v) => meta.other = Some(v.clone()),
                RXingResultMetadataValue::Orientation(v) => meta.orientation = Some(*v),
                RXingResultMetadataValue::ByteSegments(segments) => {
                    meta.byte_segments =
                        Some(segments.iter().map(|s| STANDARD.encode(s)).collect());
                }
                RXingResultMetadataValue::ErrorCorrectionLevel(v) => {
                    meta.error_correction_level = Some(v.clone())
                }
                RXingResultMetadataValue::IssueNumber(v) => meta.issue_number = Some(*v),
                RXingResultMetadataValue::SuggestedPrice(v) => meta.suggested_price = Some(v.clone()),
                RXingResultMetadataValue::PossibleCountry(v) => {
                    meta.possible_country = Some(v.clone())
                }
                RXingResultMetadataValue::UpcEanExtension(v) => {
                    meta.upc_ean_extension = Some(v.clone())
                }
                RXingResultMetadataValue::StructuredAppendSequence(seq) => {
                    // high nibble: position, low nibble: count - 1
                    meta.structured_append_sequence = Some(*seq);
                    meta.structured_append_index = Some(*seq >> 4);
                    meta.structured_append_total = Some((*seq & 0x0F) + 1);
                }
                RXingResultMetadataValue::StructuredAppendParity(v) => {
                    meta.structured_append_parity = Some(*v)
                }
                _ => {}
            }
        }

        meta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub text: String,
    pub format: BarcodeFormat,
    /// Finder patterns or corners, in frame coordinates. Meaning depends
    /// on the symbology.
    pub corner_points: Vec<BarcodePoint>,
    pub metadata: BarcodeMetadata,
}

impl Barcode {
    /// Translate a library result. `offset` moves points from the scanned
    /// region back into frame coordinates.
    ///
    /// Returns `None` for symbologies outside [`BarcodeFormat::ALL`].
    pub fn from_rxing(result: &RXingResult, offset: (u32, u32)) -> Option<Self> {
        let format = BarcodeFormat::from_rxing(result.getBarcodeFormat())?;
        let (dx, dy) = (offset.0 as f32, offset.1 as f32);

        Some(Self {
            text: result.getText().to_owned(),
            format,
            corner_points: result
                .getPoints()
                .iter()
                .map(|p| BarcodePoint {
                    x: p.x + dx,
                    y: p.y + dy,
                })
                .collect(),
            metadata: BarcodeMetadata::from_values(result.getRXingResultMetadata().values()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub barcodes: Vec<Barcode>,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    /// Debug only.
    #[serde(rename = "base64JPEG", skip_serializing_if = "Option::is_none", default)]
    pub base64_jpeg: Option<String>,
}

impl DetectionResult {
    pub fn empty(width: u32, height: u32, orientation: Orientation) -> Self {
        Self {
            barcodes: Vec::new(),
            width,
            height,
            orientation,
            base64_jpeg: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }
}
