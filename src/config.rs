use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::decision::{DecisionRules, DEFAULT_AREA_THRESHOLD, DEFAULT_SCALE_FACTOR};

const DEFAULT_SOURCE: &str = "images";
const DEFAULT_OUT_DIR: &str = "runs";
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_CONF_THRESHOLD: f32 = 0.25;
const DEFAULT_MODEL_WIDTH: u32 = 640;
const DEFAULT_MODEL_HEIGHT: u32 = 640;

/// Animal categories whose co-detection with a person voids acceptance.
pub fn default_excluded_classes() -> Vec<String> {
    [
        "bird", "cat", "dog", "horse", "cow", "elephant", "bear", "zebra", "giraffe",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Default)]
struct TriageConfigFile {
    source: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    backend: Option<BackendConfigFile>,
    rules: Option<RulesConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct BackendConfigFile {
    name: Option<String>,
    model_path: Option<PathBuf>,
    model_width: Option<u32>,
    model_height: Option<u32>,
    conf_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct RulesConfigFile {
    area_threshold: Option<u64>,
    scale_factor: Option<u32>,
    excluded_classes: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub source: PathBuf,
    pub out_dir: PathBuf,
    pub backend: BackendSettings,
    pub rules: RuleSettings,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub name: String,
    pub model_path: Option<PathBuf>,
    pub model_width: u32,
    pub model_height: u32,
    pub conf_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct RuleSettings {
    pub area_threshold: u64,
    pub scale_factor: u32,
    pub excluded_classes: Vec<String>,
}

impl RuleSettings {
    pub fn decision_rules(&self) -> DecisionRules {
        DecisionRules {
            area_threshold: self.area_threshold,
            scale_factor: self.scale_factor,
        }
    }
}

impl TriageConfig {
    /// Load from the file named by `TRIAGE_CONFIG` (if set), then apply
    /// env overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRIAGE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TriageConfigFile) -> Self {
        let source = file
            .source
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE));
        let out_dir = file
            .out_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        let backend = BackendSettings {
            name: file
                .backend
                .as_ref()
                .and_then(|backend| backend.name.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: file
                .backend
                .as_ref()
                .and_then(|backend| backend.model_path.clone()),
            model_width: file
                .backend
                .as_ref()
                .and_then(|backend| backend.model_width)
                .unwrap_or(DEFAULT_MODEL_WIDTH),
            model_height: file
                .backend
                .as_ref()
                .and_then(|backend| backend.model_height)
                .unwrap_or(DEFAULT_MODEL_HEIGHT),
            conf_threshold: file
                .backend
                .and_then(|backend| backend.conf_threshold)
                .unwrap_or(DEFAULT_CONF_THRESHOLD),
        };
        let rules = RuleSettings {
            area_threshold: file
                .rules
                .as_ref()
                .and_then(|rules| rules.area_threshold)
                .unwrap_or(DEFAULT_AREA_THRESHOLD),
            scale_factor: file
                .rules
                .as_ref()
                .and_then(|rules| rules.scale_factor)
                .unwrap_or(DEFAULT_SCALE_FACTOR),
            excluded_classes: file
                .rules
                .and_then(|rules| rules.excluded_classes)
                .unwrap_or_else(default_excluded_classes),
        };
        Self {
            source,
            out_dir,
            backend,
            rules,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("TRIAGE_SOURCE") {
            if !source.trim().is_empty() {
                self.source = PathBuf::from(source);
            }
        }
        if let Ok(out_dir) = std::env::var("TRIAGE_OUT_DIR") {
            if !out_dir.trim().is_empty() {
                self.out_dir = PathBuf::from(out_dir);
            }
        }
        if let Ok(backend) = std::env::var("TRIAGE_BACKEND") {
            if !backend.trim().is_empty() {
                self.backend.name = backend;
            }
        }
        if let Ok(model) = std::env::var("TRIAGE_MODEL") {
            if !model.trim().is_empty() {
                self.backend.model_path = Some(PathBuf::from(model));
            }
        }
        if let Ok(threshold) = std::env::var("TRIAGE_CONF_THRES") {
            let parsed: f32 = threshold
                .parse()
                .map_err(|_| anyhow!("TRIAGE_CONF_THRES must be a number"))?;
            self.backend.conf_threshold = parsed;
        }
        if let Ok(area) = std::env::var("TRIAGE_AREA_THRESHOLD") {
            let parsed: u64 = area
                .parse()
                .map_err(|_| anyhow!("TRIAGE_AREA_THRESHOLD must be an integer pixel count"))?;
            self.rules.area_threshold = parsed;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.backend.conf_threshold) {
            return Err(anyhow!("conf_threshold must be within 0..=1"));
        }
        if self.rules.area_threshold == 0 {
            return Err(anyhow!("area_threshold must be greater than zero"));
        }
        if self.rules.scale_factor < 2 {
            return Err(anyhow!("scale_factor must be at least 2"));
        }
        if self.backend.model_width == 0 || self.backend.model_height == 0 {
            return Err(anyhow!("model input dimensions must be non-zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<TriageConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
