use anyhow::{Context, Result, bail};
use blade_detector::config::{DetectorConfig, ExecutionBackend};
use blade_detector::error::DetectorError;
use blade_detector::export::DetectionReport;
use blade_detector::image_utils::image_io::{has_image_extension, read_image_as_rgb8, write_rgb8_image};
use blade_detector::logging::init_logging;
use blade_detector::object_detection::detector::Detector;
use blade_detector::rendering::blade_renderer::BladeRenderer;
use blade_detector::rendering::display_mode::{DisplayMode, FrameProcessor};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Json,
    Txt,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Txt => "txt",
        }
    }
}

/// Detects blades in images and writes annotated copies plus a report per image.
#[derive(Debug, Parser)]
#[command(name = "blade-detector", version)]
struct Args {
    /// ONNX model file.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Image file or directory of images.
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "output")]
    output: PathBuf,
    /// JSON detector config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    confidence: Option<f32>,
    #[arg(long)]
    iou: Option<f32>,
    #[arg(long, value_enum)]
    backend: Option<ExecutionBackend>,
    #[arg(long, value_enum, default_value_t = DisplayMode::Detection)]
    mode: DisplayMode,
    /// TrueType font used for text labels. Without it only shapes are drawn.
    #[arg(long)]
    font: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    report: ReportFormat,
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    if let Some(confidence) = args.confidence {
        config.set_confidence_threshold(confidence);
    }
    if let Some(iou) = args.iou {
        config.set_iou_threshold(iou);
    }
    if let Some(backend) = args.backend {
        config.preferred_backend = backend;
    }

    let detector = match &args.model {
        Some(model) => Some(load_detector(model, config)?),
        None if args.mode == DisplayMode::Detection => {
            bail!("--model is required in detection mode")
        }
        None => None,
    };
    let renderer = match &args.font {
        Some(font) => BladeRenderer::from_font_file(font)
            .with_context(|| format!("failed to load font {}", font.display()))?,
        None => BladeRenderer::new(),
    };
    let mut processor = FrameProcessor::new(detector, renderer, args.mode);

    let images = collect_images(&args.input)?;
    info!(count = images.len(), mode = %args.mode, "processing images");
    let mut failures = 0;
    for path in &images {
        match process_image(&mut processor, path, &args.output, args.report) {
            Ok(count) => info!(image = %path.display(), count, "done"),
            Err(err) => {
                failures += 1;
                error!(image = %path.display(), error = %err, "failed to process image");
            }
        }
    }
    info!(processed = images.len() - failures, failures, "batch finished");
    Ok(())
}

#[cfg(feature = "onnxruntime")]
fn load_detector(model: &Path, config: DetectorConfig) -> Result<Detector> {
    Detector::from_model_path(model, config)
        .with_context(|| format!("failed to load model {}", model.display()))
}

#[cfg(not(feature = "onnxruntime"))]
fn load_detector(model: &Path, _config: DetectorConfig) -> Result<Detector> {
    bail!(
        "cannot load {}: built without the onnxruntime feature",
        model.display()
    )
}

fn collect_images(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input {} does not exist", input.display());
    }
    let images: Vec<PathBuf> = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_image_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    if images.is_empty() {
        warn!(input = %input.display(), "no images found");
    }
    Ok(images)
}

fn process_image(
    processor: &mut FrameProcessor,
    path: &Path,
    output_dir: &Path,
    report: ReportFormat,
) -> Result<usize, DetectorError> {
    let frame = read_image_as_rgb8(path)?;
    let processed = processor.process(&frame);
    if let Some(status) = &processed.status {
        info!(image = %path.display(), status = %status);
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    write_rgb8_image(&processed.image, &output_dir.join(format!("{stem}_det.png")))?;
    let report_path = output_dir.join(format!("{stem}_det.{}", report.extension()));
    DetectionReport::new(path, frame.dimensions(), &processed.detections).write_to(&report_path)?;
    Ok(processed.detections.len())
}
