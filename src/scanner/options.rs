use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Typed view over the options map handed in by the host.
///
/// Keys this crate does not know are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionOptions {
    /// Spend more time to find a barcode; optimize for accuracy, not speed.
    pub accurate: bool,

    /// Scan the four quadrants and the centre instead of the whole image.
    /// Helps when several codes are visible and a whole-image pass would
    /// find pieces of more than one.
    pub read_by_quadrant: bool,

    /// Try to read several barcodes from one frame.
    pub read_multiple: bool,

    /// Only scan this part of the frame.
    pub region: Option<Region>,

    /// Attach a base64 JPEG of the scanned luminance to the result.
    pub include_snapshot: bool,
}

/// Rectangle in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl DetectionOptions {
    /// Parse the host's options value. `null` means defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(value)?)
    }
}
