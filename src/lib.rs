pub mod capture;
pub mod error;
pub mod scanner;
pub mod utils;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::path::Path;

use capture::frame::PixelFormat;
use serde::{Deserialize, Serialize};

pub use capture::{Frame, FrameMetadata, Orientation};
pub use error::{Result, ScanError};
pub use scanner::{BarcodeDetector, BarcodeFormat, DetectionOptions, DetectionResult, SharedDetector};

use crate::utils::FoundDevice;

/// Environment variables override the file, e.g. `VZSCAN__SCANNER__ACCURATE=true`.
pub const ENV_PREFIX: &str = "VZSCAN";

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub device: FoundDevice,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub buffer_count: u32,
}

/// Default request for every frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Empty means all supported formats.
    pub formats: Vec<String>,
    pub accurate: bool,
    pub read_by_quadrant: bool,
    pub read_multiple: bool,
    pub include_snapshot: bool,
}

impl ScannerConfig {
    pub fn options(&self) -> DetectionOptions {
        DetectionOptions {
            accurate: self.accurate,
            read_by_quadrant: self.read_by_quadrant,
            read_multiple: self.read_multiple,
            region: None,
            include_snapshot: self.include_snapshot,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                device: FoundDevice::new("/dev/video0".into(), PixelFormat::Yuyv4),
                width: 640,
                height: 480,
                fps: 30,
                buffer_count: 4,
            },
            scanner: ScannerConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file if given, then `VZSCAN__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_survive_a_load_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.capture.width, 640);
        assert!(config.scanner.formats.is_empty());
        assert_eq!(config.scanner.options(), DetectionOptions::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("vzscan-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[scanner]\nformats = [\"QR_CODE\", \"Ean13\"]\naccurate = true\n\n[capture]\nfps = 15"
        )
        .unwrap();
        drop(file);

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.scanner.formats, vec!["QR_CODE", "Ean13"]);
        assert!(config.scanner.options().accurate);
        assert_eq!(config.capture.fps, 15);
        assert_eq!(config.capture.width, 640);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/vzscan.toml"))).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
