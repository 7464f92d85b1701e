use std::io::Write;

use crate::shared::config::Settings;

#[test]
fn defaults_enable_prefetch_without_batch_size() {
    let settings = Settings::default();

    assert!(settings.merger.prefetch);
    assert_eq!(settings.merger.batch_size, None);
    assert_eq!(settings.logging.stdout_level, "info");
    assert_eq!(settings.logging.file_level, "debug");
}

#[test]
fn loads_partial_toml_file_over_defaults() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        r#"
[merger]
batch_size = 64
prefetch = false

[logging]
stdout_level = "warn"
"#
    )
    .expect("write config");

    let settings = Settings::load(file.path()).expect("settings should load");

    assert_eq!(settings.merger.batch_size, Some(64));
    assert!(!settings.merger.prefetch);
    assert_eq!(settings.logging.stdout_level, "warn");
    assert_eq!(settings.logging.log_dir, "logs");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = Settings::load(dir.path().join("absent.toml"));
    assert!(result.is_err());
}
