use crate::logging;
use crate::shared::config::LoggingConfig;

#[test]
fn rejects_unknown_stdout_level() {
    let cfg = LoggingConfig {
        stdout_level: "chatty".to_string(),
        ..LoggingConfig::default()
    };
    assert!(logging::init(&cfg).is_err());
}

#[test]
fn rejects_unknown_file_level() {
    let cfg = LoggingConfig {
        file_level: "everything".to_string(),
        ..LoggingConfig::default()
    };
    assert!(logging::init(&cfg).is_err());
}
