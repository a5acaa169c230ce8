use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yolopost::{AnchorSet, DetectConfig, Detection, Detector, OwnedActivation};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "yolopost CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for per-stage counters.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    class_prob_threshold: f32,
    iou_threshold: f32,
    filter_boxes_threshold: f32,
    image_dim: usize,
    anchors: Vec<(f32, f32)>,
    class_names: Option<Vec<String>>,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            class_prob_threshold: cfg.class_prob_threshold,
            iou_threshold: cfg.iou_threshold,
            filter_boxes_threshold: cfg.filter_boxes_threshold,
            image_dim: cfg.image_dim,
            anchors: cfg.anchors.as_slice().to_vec(),
            class_names: None,
            parallel: cfg.parallel,
        }
    }
}

impl DetectConfigJson {
    fn into_config(self) -> Result<DetectConfig, Box<dyn std::error::Error>> {
        let defaults = DetectConfig::default();
        Ok(DetectConfig {
            class_prob_threshold: self.class_prob_threshold,
            iou_threshold: self.iou_threshold,
            filter_boxes_threshold: self.filter_boxes_threshold,
            class_names: self.class_names.unwrap_or(defaults.class_names),
            anchors: AnchorSet::new(self.anchors)?,
            image_dim: self.image_dim,
            parallel: self.parallel,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Config {
    activation_path: String,
    output_path: Option<String>,
    detect: DetectConfigJson,
}

/// Activation dump produced by an external inference runtime.
#[derive(Debug, Deserialize)]
struct ActivationFile {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    class_name: String,
    class_prob: f32,
    top: f32,
    left: f32,
    bottom: f32,
    right: f32,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            class_name: value.class_name,
            class_prob: value.class_prob,
            top: value.top,
            left: value.left,
            bottom: value.bottom,
            right: value.right,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolopost=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.activation_path.is_empty() {
        return Err("activation_path must be set in the config".into());
    }

    let detect_cfg = config.detect.into_config()?;
    let num_anchors = detect_cfg.anchors.len();
    let channels = detect_cfg.expected_channels();
    let detector = Detector::new(detect_cfg)?;

    let activation_text = fs::read_to_string(&config.activation_path)?;
    let dump: ActivationFile = serde_json::from_str(&activation_text)?;
    let activation = OwnedActivation::from_shape(dump.data, &dump.shape, num_anchors, channels)?;
    tracing::info!(
        grid_h = activation.view().grid_h(),
        grid_w = activation.view().grid_w(),
        "loaded activation"
    );

    let detections: Vec<DetectionRecord> = detector
        .detect(activation.view())?
        .into_iter()
        .map(DetectionRecord::from)
        .collect();
    let output = Output {
        count: detections.len(),
        detections,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
