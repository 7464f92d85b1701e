use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub merger: MergerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergerConfig {
    /// Batch size hint sent with every getMore when the merge spec carries none.
    pub batch_size: Option<u32>,
    /// Fetch the next batch of a remote as soon as its buffer empties, rather
    /// than only when no buffered result is left anywhere.
    pub prefetch: bool,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            prefetch: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            stdout_level: "info".to_string(),
            file_level: "debug".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from a config file; the format is picked from the
    /// extension. Missing sections and fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, config::ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}
