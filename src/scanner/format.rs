//! Barcode symbologies the detector can be asked for.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported symbologies.
///
/// Serialized with the ZXing spelling (`QR_CODE`); parsing also accepts the
/// host spelling (`QRCode`, `Ean13`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeFormat {
    Aztec,
    Codabar,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    #[serde(rename = "CODE_128")]
    Code128,
    DataMatrix,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "EAN_13")]
    Ean13,
    Itf,
    #[serde(rename = "MAXICODE")]
    MaxiCode,
    #[serde(rename = "PDF_417")]
    Pdf417,
    QrCode,
    #[serde(rename = "RSS_14")]
    Rss14,
    RssExpanded,
    UpcA,
    UpcE,
    UpcEanExtension,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 17] = [
        BarcodeFormat::Aztec,
        BarcodeFormat::Codabar,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::Itf,
        BarcodeFormat::MaxiCode,
        BarcodeFormat::Pdf417,
        BarcodeFormat::QrCode,
        BarcodeFormat::Rss14,
        BarcodeFormat::RssExpanded,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::UpcEanExtension,
    ];

    /// Canonical label, as reported in results.
    pub fn label(self) -> &'static str {
        match self {
            BarcodeFormat::Aztec => "AZTEC",
            BarcodeFormat::Codabar => "CODABAR",
            BarcodeFormat::Code39 => "CODE_39",
            BarcodeFormat::Code93 => "CODE_93",
            BarcodeFormat::Code128 => "CODE_128",
            BarcodeFormat::DataMatrix => "DATA_MATRIX",
            BarcodeFormat::Ean8 => "EAN_8",
            BarcodeFormat::Ean13 => "EAN_13",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::MaxiCode => "MAXICODE",
            BarcodeFormat::Pdf417 => "PDF_417",
            BarcodeFormat::QrCode => "QR_CODE",
            BarcodeFormat::Rss14 => "RSS_14",
            BarcodeFormat::RssExpanded => "RSS_EXPANDED",
            BarcodeFormat::UpcA => "UPC_A",
            BarcodeFormat::UpcE => "UPC_E",
            BarcodeFormat::UpcEanExtension => "UPC_EAN_EXTENSION",
        }
    }

    pub fn to_rxing(self) -> rxing::BarcodeFormat {
        match self {
            BarcodeFormat::Aztec => rxing::BarcodeFormat::AZTEC,
            BarcodeFormat::Codabar => rxing::BarcodeFormat::CODABAR,
            BarcodeFormat::Code39 => rxing::BarcodeFormat::CODE_39,
            BarcodeFormat::Code93 => rxing::BarcodeFormat::CODE_93,
            BarcodeFormat::Code128 => rxing::BarcodeFormat::CODE_128,
            BarcodeFormat::DataMatrix => rxing::BarcodeFormat::DATA_MATRIX,
            BarcodeFormat::Ean8 => rxing::BarcodeFormat::EAN_8,
            BarcodeFormat::Ean13 => rxing::BarcodeFormat::EAN_13,
            BarcodeFormat::Itf => rxing::BarcodeFormat::ITF,
            BarcodeFormat::MaxiCode => rxing::BarcodeFormat::MAXICODE,
            BarcodeFormat::Pdf417 => rxing::BarcodeFormat::PDF_417,
            BarcodeFormat::QrCode => rxing::BarcodeFormat::QR_CODE,
            BarcodeFormat::Rss14 => rxing::BarcodeFormat::RSS_14,
            BarcodeFormat::RssExpanded => rxing::BarcodeFormat::RSS_EXPANDED,
            BarcodeFormat::UpcA => rxing::BarcodeFormat::UPC_A,
            BarcodeFormat::UpcE => rxing::BarcodeFormat::UPC_E,
            BarcodeFormat::UpcEanExtension => rxing::BarcodeFormat::UPC_EAN_EXTENSION,
        }
    }

    /// `None` for library formats outside the supported set (micro QR, ...).
    pub fn from_rxing(format: &rxing::BarcodeFormat) -> Option<Self> {
        let format = match format {
            rxing::BarcodeFormat::AZTEC => BarcodeFormat::Aztec,
            rxing::BarcodeFormat::CODABAR => BarcodeFormat::Codabar,
            rxing::BarcodeFormat::CODE_39 => BarcodeFormat::Code39,
            rxing::BarcodeFormat::CODE_93 => BarcodeFormat::Code93,
            rxing::BarcodeFormat::CODE_128 => BarcodeFormat::Code128,
            rxing::BarcodeFormat::DATA_MATRIX => BarcodeFormat::DataMatrix,
            rxing::BarcodeFormat::EAN_8 => BarcodeFormat::Ean8,
            rxing::BarcodeFormat::EAN_13 => BarcodeFormat::Ean13,
            rxing::BarcodeFormat::ITF => BarcodeFormat::Itf,
            rxing::BarcodeFormat::MAXICODE => BarcodeFormat::MaxiCode,
            rxing::BarcodeFormat::PDF_417 => BarcodeFormat::Pdf417,
            rxing::BarcodeFormat::QR_CODE => BarcodeFormat::QrCode,
            rxing::BarcodeFormat::RSS_14 => BarcodeFormat::Rss14,
            rxing::BarcodeFormat::RSS_EXPANDED => BarcodeFormat::RssExpanded,
            rxing::BarcodeFormat::UPC_A => BarcodeFormat::UpcA,
            rxing::BarcodeFormat::UPC_E => BarcodeFormat::UpcE,
            rxing::BarcodeFormat::UPC_EAN_EXTENSION => BarcodeFormat::UpcEanExtension,
            _ => return None,
        };
        Some(format)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown barcode format `{0}`")]
pub struct UnknownFormat(pub String);

impl FromStr for BarcodeFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let format = match key.as_str() {
            "aztec" => BarcodeFormat::Aztec,
            "codabar" => BarcodeFormat::Codabar,
            "code39" => BarcodeFormat::Code39,
            "code93" => BarcodeFormat::Code93,
            "code128" => BarcodeFormat::Code128,
            "datamatrix" => BarcodeFormat::DataMatrix,
            "ean8" => BarcodeFormat::Ean8,
            "ean13" => BarcodeFormat::Ean13,
            "itf" => BarcodeFormat::Itf,
            "maxicode" => BarcodeFormat::MaxiCode,
            "pdf417" => BarcodeFormat::Pdf417,
            "qrcode" => BarcodeFormat::QrCode,
            "rss14" => BarcodeFormat::Rss14,
            "rssexpanded" => BarcodeFormat::RssExpanded,
            "upca" => BarcodeFormat::UpcA,
            "upce" => BarcodeFormat::UpcE,
            "upceanextension" => BarcodeFormat::UpcEanExtension,
            _ => return Err(UnknownFormat(s.to_owned())),
        };
        Ok(format)
    }
}

/// Resolve the requested names into a format set.
///
/// Unrecognized names are skipped. If nothing usable remains every
/// supported format is returned, so partial or empty requests still scan.
pub fn parse_formats<S: AsRef<str>>(names: &[S]) -> BTreeSet<BarcodeFormat> {
    let set: BTreeSet<_> = names
        .iter()
        .filter_map(|name| name.as_ref().parse().ok())
        .collect();

    if set.is_empty() {
        BarcodeFormat::ALL.into_iter().collect()
    } else {
        set
    }
}
