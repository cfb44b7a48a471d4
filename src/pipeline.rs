//! Sequential triage pipeline.
//!
//! One frame at a time: decode, segment, aggregate, decide, file the image
//! into exactly one outcome directory, append exactly one summary row.
//! There is no overlap between inference and decision and no shared
//! mutable state beyond the accumulating summary table.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::TriageConfig;
use crate::decision::{FrameFacts, Outcome, Verdict};
use crate::detect::{BackendRegistry, DetectionCapability, FrameSummary};
use crate::imaging;
use crate::report::{FrameRecord, SummaryTable, FAILED_FILE_NAME, SUMMARY_FILE_NAME};
use crate::source::{self, SourceImage};

/// Counters and artifact paths for one completed run.
#[derive(Debug)]
pub struct RunReport {
    pub frames_processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub summary_csv: PathBuf,
    pub failed_csv: PathBuf,
}

/// Run the batch over every processable frame under the configured source.
///
/// Business-rule rejections are recorded in the summary; infrastructure
/// errors (unreadable source, decode failures, write failures) propagate
/// and abort the run.
pub fn run(cfg: &TriageConfig, registry: &BackendRegistry) -> Result<RunReport> {
    let frames = source::enumerate(&cfg.source)?;
    log::info!(
        "triage run: {} frame(s) from {}, backend priority '{}'",
        frames.len(),
        cfg.source.display(),
        cfg.backend.name
    );

    for outcome in [Outcome::FullSuccess, Outcome::HalfSuccess, Outcome::Failed] {
        std::fs::create_dir_all(cfg.out_dir.join(outcome.dir_name())).with_context(|| {
            format!(
                "failed to create outcome directory {}",
                cfg.out_dir.join(outcome.dir_name()).display()
            )
        })?;
    }

    let rules = cfg.rules.decision_rules();
    let mut table = SummaryTable::new();

    for frame in &frames {
        let verdict = process_frame(cfg, registry, frame, &rules)?;
        table.push(FrameRecord::from_verdict(&frame.stem, &verdict));
    }

    let summary_csv = cfg.out_dir.join(SUMMARY_FILE_NAME);
    let failed_csv = cfg.out_dir.join(FAILED_FILE_NAME);
    table.write_csv(&summary_csv)?;
    table.write_failed_csv(&failed_csv)?;

    Ok(RunReport {
        frames_processed: table.rows().len(),
        accepted: table.accepted_count(),
        rejected: table.rejected_count(),
        summary_csv,
        failed_csv,
    })
}

fn process_frame(
    cfg: &TriageConfig,
    registry: &BackendRegistry,
    frame: &SourceImage,
    rules: &crate::decision::DecisionRules,
) -> Result<Verdict> {
    let img = imaging::load_rgb(&frame.path)?;
    let (width, height) = img.dimensions();

    let detections = registry.segment_with_capability(
        DetectionCapability::InstanceSegmentation,
        img.as_raw(),
        width,
        height,
    )?;
    let summary = FrameSummary::collect(&detections, &cfg.rules.excluded_classes);
    let facts = FrameFacts::from_summary(&summary, width, height, frame.tag);
    let verdict = rules.decide(&facts);

    log::info!(
        "{}: {}x{} persons={} excluded={} -> {} ({})",
        frame.stem,
        width,
        height,
        summary.person_count,
        summary.excluded_count,
        verdict.outcome.dir_name(),
        verdict.note
    );

    // Scaled accepts file the upscaled frame; every other outcome files
    // the native frame under the verdict's name marker.
    let output = if verdict.accepted && verdict.scaled {
        imaging::upscale(&img, cfg.rules.scale_factor)
    } else {
        img
    };
    let file_name = format!("{}{}.png", frame.stem, verdict.name_suffix);
    let dest = cfg
        .out_dir
        .join(verdict.outcome.dir_name())
        .join(file_name);
    imaging::write_png(&dest, &output)?;

    Ok(verdict)
}
