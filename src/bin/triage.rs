//! triage - batch person-segmentation triage driver
//!
//! This binary:
//! 1. Loads configuration (JSON file via TRIAGE_CONFIG, env, CLI flags)
//! 2. Registers segmenter backends and selects the configured default
//! 3. Runs the sequential pipeline over the source batch
//! 4. Prints run counters and CSV artifact paths

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use frame_triage::{BackendRegistry, StubBackend, TriageConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Source image file or directory.
    #[arg(long)]
    source: Option<PathBuf>,
    /// Output root for outcome directories and CSV summaries.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Backend to run ("stub", or "tract" with the backend-tract feature).
    #[arg(long)]
    backend: Option<String>,
    /// ONNX model path for the tract backend.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Confidence threshold for detections.
    #[arg(long)]
    conf_thres: Option<f32>,
    /// Config file path (JSON).
    #[arg(long, env = "TRIAGE_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Some(config) = &args.config {
        std::env::set_var("TRIAGE_CONFIG", config);
    }
    let mut cfg = TriageConfig::load()?;

    // CLI flags take precedence over file and env settings.
    if let Some(source) = args.source {
        cfg.source = source;
    }
    if let Some(out) = args.out {
        cfg.out_dir = out;
    }
    if let Some(backend) = args.backend {
        cfg.backend.name = backend;
    }
    if let Some(model) = args.model {
        cfg.backend.model_path = Some(model);
    }
    if let Some(conf_thres) = args.conf_thres {
        if !(0.0..=1.0).contains(&conf_thres) {
            return Err(anyhow!("--conf-thres must be within 0..=1"));
        }
        cfg.backend.conf_threshold = conf_thres;
    }

    let registry = build_registry(&cfg)?;
    let report = frame_triage::pipeline::run(&cfg, &registry)?;

    println!("triage summary:");
    println!("  frames processed: {}", report.frames_processed);
    println!("  accepted: {}", report.accepted);
    println!("  rejected: {}", report.rejected);
    println!("  summary csv: {}", report.summary_csv.display());
    println!("  failed csv: {}", report.failed_csv.display());

    Ok(())
}

fn build_registry(cfg: &TriageConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());

    #[cfg(feature = "backend-tract")]
    if let Some(model_path) = &cfg.backend.model_path {
        let backend = frame_triage::TractBackend::new(
            model_path,
            cfg.backend.model_width,
            cfg.backend.model_height,
        )?
        .with_threshold(cfg.backend.conf_threshold);
        registry.register(backend);
    }

    registry.set_default(&cfg.backend.name).map_err(|e| {
        anyhow!(
            "{} (is the backend feature enabled and the model path set?)",
            e
        )
    })?;
    Ok(registry)
}
