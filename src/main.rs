//! vzscan - barcode scanning over still images or a live camera

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::{error, info, warn};

use vision_zxing::capture::frame::{Frame, PixelFormat};
use vision_zxing::{BarcodeDetector, Config, DetectionOptions};

#[derive(Parser, Debug)]
#[command(name = "vzscan", version, about = "Scan barcodes in images or camera frames")]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comma separated formats, e.g. QR_CODE,EAN_13 (default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    formats: Vec<String>,

    /// Try harder, trading speed for accuracy
    #[arg(long, global = true)]
    accurate: bool,

    /// Scan the four quadrants and the centre separately
    #[arg(long, global = true)]
    quadrant: bool,

    /// Look for more than one barcode per frame
    #[arg(long, global = true)]
    multiple: bool,

    /// Attach a base64 JPEG of the scanned frame
    #[arg(long, global = true)]
    snapshot: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan still images
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Scan a live V4L2 camera until interrupted
    #[cfg(feature = "camera")]
    Camera,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vzscan=info,vision_zxing=info".into()),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    // Flags win over the file
    if !args.formats.is_empty() {
        config.scanner.formats = args.formats.clone();
    }
    let mut options = config.scanner.options();
    options.accurate |= args.accurate;
    options.read_by_quadrant |= args.quadrant;
    options.read_multiple |= args.multiple;
    options.include_snapshot |= args.snapshot;

    let mut detector = BarcodeDetector::new();

    match args.command {
        Command::Scan { images } => scan_images(&mut detector, &images, &config, &options),
        #[cfg(feature = "camera")]
        Command::Camera => scan_camera(&mut detector, config, &options).await,
    }
}

fn scan_images(
    detector: &mut BarcodeDetector,
    images: &[PathBuf],
    config: &Config,
    options: &DetectionOptions,
) -> Result<()> {
    let mut failures = 0;

    for path in images {
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        match detector.detect(&frame, &config.scanner.formats, options) {
            Ok(result) => {
                info!("{}: {} barcode(s)", path.display(), result.len());
                println!("{}", serde_json::to_string(&result)?);
            }
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{} of {} image(s) failed", failures, images.len()));
    }
    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame> {
    let gray = image::open(path)?.to_luma8();
    let (width, height) = gray.dimensions();
    Ok(Frame::packed(gray.into_raw(), width, height, PixelFormat::Gray8))
}

#[cfg(feature = "camera")]
async fn scan_camera(
    detector: &mut BarcodeDetector,
    mut config: Config,
    options: &DetectionOptions,
) -> Result<()> {
    use vision_zxing::capture::V4l2Capture;
    use vision_zxing::utils;

    if config.capture.device.path.is_empty() {
        config.capture.device = utils::auto_detect_device()?;
    }
    info!("Using capture device: {:?}", config.capture.device);

    // One slot: frames that arrive while a decode runs are dropped
    let (tx, rx) = flume::bounded::<Frame>(1);

    let capture_config = config.capture.clone();
    let capture = std::thread::Builder::new()
        .name("capture".into())
        .spawn(move || -> Result<()> {
            let mut capture = V4l2Capture::new(capture_config)?;
            capture.start_stream()?;
            let mut dropped = 0u64;
            loop {
                match capture.capture_frame() {
                    Ok(frame) => match tx.try_send(frame) {
                        Ok(()) => {}
                        Err(flume::TrySendError::Full(_)) => {
                            dropped += 1;
                            metrics::counter!("barcode_frames_dropped").increment(1);
                        }
                        Err(flume::TrySendError::Disconnected(_)) => {
                            info!("Capture stopped after dropping {} frame(s)", dropped);
                            return Ok(());
                        }
                    },
                    Err(e) => {
                        error!("Capture error: {}", e);
                        std::thread::sleep(std::time::Duration::from_millis(10));
                    }
                }
            }
        })?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            frame = rx.recv_async() => {
                let Ok(frame) = frame else {
                    // The sender is gone, so the thread is done
                    return match capture.join() {
                        Ok(Err(e)) => Err(e.wrap_err("capture failed")),
                        Ok(Ok(())) => Err(eyre!("capture thread exited")),
                        Err(_) => Err(eyre!("capture thread panicked")),
                    };
                };
                match detector.detect(&frame, &config.scanner.formats, options) {
                    Ok(result) if !result.is_empty() => {
                        println!("{}", serde_json::to_string(&result)?);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("frame {}: {}", frame.meta.sequence, e),
                }
            }
        }
    }

    Ok(())
}
