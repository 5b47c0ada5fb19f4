pub mod detector;
pub mod format;
pub mod options;
pub mod readers;
pub mod result;

pub use detector::{BarcodeDetector, SharedDetector};
pub use format::BarcodeFormat;
pub use options::{DetectionOptions, Region};
pub use readers::{MultiFormatReaderAdapter, SingleResultMultipleReader};
pub use result::{Barcode, BarcodeMetadata, BarcodePoint, DetectionResult};
