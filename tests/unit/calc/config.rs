use super::*;

#[test]
fn defaults_match_documented_heuristics() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.preview_scale, 0.1);
    assert_eq!(cfg.preview_min_size, 8);
    assert!(cfg.threads.is_none() && cfg.slices_per_picture.is_none());
    cfg.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let cfg =
        EngineConfig::from_json_str(r#"{"threads": 2, "memory_budget_bytes": 1024}"#).unwrap();
    assert_eq!(cfg.threads, Some(2));
    assert_eq!(cfg.memory_budget_bytes, Some(1024));
    assert_eq!(cfg.preview_min_size, 8);
}

#[test]
fn invalid_configs_are_rejected() {
    for bad in [
        r#"{"threads": 0}"#,
        r#"{"slices_per_picture": 0}"#,
        r#"{"preview_scale": 0.0}"#,
        r#"{"preview_scale": 2.0}"#,
        r#"{"unknown": true}"#,
        "not json",
    ] {
        let err = EngineConfig::from_json_str(bad).unwrap_err();
        assert!(matches!(err, PixelflowError::Config(_)), "{bad}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = EngineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("not/here.json"));
}
