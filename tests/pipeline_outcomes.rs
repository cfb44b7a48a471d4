use std::path::Path;

use image::RgbImage;
use tempfile::TempDir;

use frame_triage::{
    default_excluded_classes, pipeline, BackendRegistry, BackendSettings, RuleSettings,
    StubBackend, TriageConfig,
};

fn write_frame(dir: &Path, name: &str, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, image::Rgb([120, 130, 140]));
    img.save(dir.join(name)).expect("write fixture frame");
}

fn test_config(source: &Path, out: &Path, area_threshold: u64) -> TriageConfig {
    TriageConfig {
        source: source.to_path_buf(),
        out_dir: out.to_path_buf(),
        backend: BackendSettings {
            name: "stub".to_string(),
            model_path: None,
            model_width: 640,
            model_height: 640,
            conf_threshold: 0.25,
        },
        rules: RuleSettings {
            area_threshold,
            scale_factor: 2,
            excluded_classes: default_excluded_classes(),
        },
    }
}

fn registry_with(script: Vec<Vec<frame_triage::Detection>>) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::with_script(script));
    registry
}

fn outcome_files(out: &Path, outcome: &str) -> Vec<String> {
    let dir = out.join(outcome);
    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .expect("outcome dir exists")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn each_frame_lands_in_exactly_one_outcome_directory() {
    let source = TempDir::new().expect("source dir");
    let out = TempDir::new().expect("out dir");

    // Sorted enumeration order: a, b, c, d, e, f.
    write_frame(source.path(), "a_Full.png", 100, 80); // native accept
    write_frame(source.path(), "b_Half.png", 100, 80); // native accept
    write_frame(source.path(), "c_Half.png", 40, 40); // scaled accept
    write_frame(source.path(), "d_Half.png", 20, 20); // size failed
    write_frame(source.path(), "e_Full.png", 100, 80); // class failed
    write_frame(source.path(), "f_Full.png", 40, 40); // height failed after upscale

    let dog_class = frame_triage::detect::labels::coco_labels()
        .iter()
        .position(|name| *name == "dog")
        .unwrap();
    let registry = registry_with(vec![
        vec![StubBackend::person(0.2, 0.8)],
        vec![StubBackend::person(0.2, 0.8)],
        vec![StubBackend::person(0.2, 0.8)],
        vec![StubBackend::person(0.2, 0.8)],
        vec![StubBackend::instance(dog_class, 0.1, 0.4), StubBackend::person(0.2, 0.8)],
        // Extent 0.6 * 40 = 24 px < upscaled_height / 2 = 40 px.
        vec![StubBackend::person(0.2, 0.8)],
    ]);

    // Threshold 5000: 100x80 clears natively, 40x40 only after 2x upscale,
    // 20x20 never.
    let cfg = test_config(source.path(), out.path(), 5000);
    let report = pipeline::run(&cfg, &registry).expect("pipeline run");

    assert_eq!(report.frames_processed, 6);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected, 3);

    assert_eq!(
        outcome_files(out.path(), "full_success"),
        vec!["a_Full.png"]
    );
    assert_eq!(
        outcome_files(out.path(), "half_success"),
        vec!["b_Half.png", "c_Half_scaled.png"]
    );
    assert_eq!(
        outcome_files(out.path(), "failed"),
        vec![
            "d_Half_scaled_failed.png",
            "e_Full.png",
            "f_Full_scaled.png"
        ]
    );

    // Scaled accept files the upscaled frame.
    let scaled = image::open(out.path().join("half_success/c_Half_scaled.png"))
        .expect("decode scaled output");
    assert_eq!(scaled.width(), 80);
    assert_eq!(scaled.height(), 80);

    // Rejects file the native frame.
    let rejected = image::open(out.path().join("failed/f_Full_scaled.png"))
        .expect("decode rejected output");
    assert_eq!(rejected.width(), 40);
}

#[test]
fn csv_summaries_match_frame_verdicts() {
    let source = TempDir::new().expect("source dir");
    let out = TempDir::new().expect("out dir");

    write_frame(source.path(), "keep_Half.png", 100, 80);
    write_frame(source.path(), "tiny_Half.png", 20, 20);

    let registry = registry_with(vec![
        vec![StubBackend::person(0.2, 0.8)],
        vec![StubBackend::person(0.2, 0.8)],
    ]);
    let cfg = test_config(source.path(), out.path(), 5000);
    let report = pipeline::run(&cfg, &registry).expect("pipeline run");

    let summary = std::fs::read_to_string(&report.summary_csv).expect("summary csv");
    assert!(summary.starts_with('\u{feff}'));
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines[0].trim_start_matches('\u{feff}'),
        "File_name,Scaled,Success,Note,Current_pixel");
    assert_eq!(lines[1], "keep_Half,X,O,-,8000");
    assert_eq!(lines[2], "tiny_Half,X,X,Size failed,400");

    let failed = std::fs::read_to_string(&report.failed_csv).expect("failed csv");
    assert!(failed.contains("tiny_Half"));
    assert!(!failed.contains("keep_Half"));
}

#[test]
fn untagged_files_are_skipped_not_processed() {
    let source = TempDir::new().expect("source dir");
    let out = TempDir::new().expect("out dir");

    write_frame(source.path(), "untagged.png", 100, 80);
    write_frame(source.path(), "zz_Half.png", 100, 80);

    let registry = registry_with(vec![vec![StubBackend::person(0.2, 0.8)]]);
    let cfg = test_config(source.path(), out.path(), 5000);
    let report = pipeline::run(&cfg, &registry).expect("pipeline run");

    assert_eq!(report.frames_processed, 1);
    assert_eq!(outcome_files(out.path(), "half_success"), vec!["zz_Half.png"]);
    assert!(outcome_files(out.path(), "failed").is_empty());
}
