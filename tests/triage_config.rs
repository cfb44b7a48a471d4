use std::sync::Mutex;

use tempfile::NamedTempFile;

use frame_triage::TriageConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "TRIAGE_CONFIG",
        "TRIAGE_SOURCE",
        "TRIAGE_OUT_DIR",
        "TRIAGE_BACKEND",
        "TRIAGE_MODEL",
        "TRIAGE_CONF_THRES",
        "TRIAGE_AREA_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": "/data/batch_07",
        "out_dir": "/data/runs/batch_07",
        "backend": {
            "name": "tract",
            "model_path": "/models/yolov5s-seg.onnx",
            "model_width": 640,
            "model_height": 640,
            "conf_threshold": 0.4
        },
        "rules": {
            "area_threshold": 9000000,
            "scale_factor": 2,
            "excluded_classes": ["dog", "cat"]
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("TRIAGE_CONFIG", file.path());
    std::env::set_var("TRIAGE_BACKEND", "stub");
    std::env::set_var("TRIAGE_AREA_THRESHOLD", "8200000");

    let cfg = TriageConfig::load().expect("load config");

    assert_eq!(cfg.source.to_str().unwrap(), "/data/batch_07");
    assert_eq!(cfg.out_dir.to_str().unwrap(), "/data/runs/batch_07");
    assert_eq!(cfg.backend.name, "stub");
    assert_eq!(
        cfg.backend.model_path.as_ref().unwrap().to_str().unwrap(),
        "/models/yolov5s-seg.onnx"
    );
    assert_eq!(cfg.backend.conf_threshold, 0.4);
    assert_eq!(cfg.rules.area_threshold, 8_200_000);
    assert_eq!(cfg.rules.scale_factor, 2);
    assert_eq!(cfg.rules.excluded_classes, vec!["dog", "cat"]);

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = TriageConfig::load().expect("load defaults");

    assert_eq!(cfg.backend.name, "stub");
    assert_eq!(cfg.rules.area_threshold, 8_200_000);
    assert_eq!(cfg.rules.scale_factor, 2);
    assert!(cfg
        .rules
        .excluded_classes
        .iter()
        .any(|name| name == "giraffe"));

    clear_env();
}

#[test]
fn rejects_invalid_conf_threshold() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TRIAGE_CONF_THRES", "1.5");
    let err = TriageConfig::load().expect_err("out-of-range threshold");
    assert!(err.to_string().contains("conf_threshold"));

    clear_env();
}
