use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub plugin: PluginOptions,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Options handed to the output plugin at stream startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PluginOptions {
    /// Quote every identifier in table names, mirroring PostgreSQL's
    /// `quote_all_identifiers` setting.
    #[serde(default)]
    pub quote_all_identifiers: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub checkpoint_file: Option<PathBuf>,
    #[serde(default = "default_checkpoint_interval_commits")]
    pub checkpoint_interval_commits: u64,
    #[serde(default = "default_output_buffer_size")]
    pub output_buffer_size: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            checkpoint_file: None,
            checkpoint_interval_commits: default_checkpoint_interval_commits(),
            output_buffer_size: default_output_buffer_size(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }

    /// Builds a configuration from defaults and `PG_DECODING_JSON_*` variables only.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder().add_source(env_source()).build()?;

        settings.try_deserialize()
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("PG_DECODING_JSON")
        .prefix_separator("_")
        .separator("__")
}

fn default_checkpoint_interval_commits() -> u64 {
    100
}

fn default_output_buffer_size() -> usize {
    64 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.plugin.quote_all_identifiers);
        assert_eq!(config.replay.checkpoint_interval_commits, 100);
        assert!(config.replay.checkpoint_file.is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[plugin]\nquote_all_identifiers = true\n\n[replay]\ncheckpoint_file = \"replay.json\"\ncheckpoint_interval_commits = 5"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.plugin.quote_all_identifiers);
        assert_eq!(config.replay.checkpoint_file, Some(PathBuf::from("replay.json")));
        assert_eq!(config.replay.checkpoint_interval_commits, 5);
        assert_eq!(config.replay.output_buffer_size, 64 * 1024);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::from_file("/nonexistent/pg-decoding-json.toml").is_err());
    }
}
