/// CLI configuration
use crate::error::{CliError, Result};
use reverie_metadata::ScanConfig;
use reverie_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "reverie.toml";

/// Prefix of environment overrides, e.g. `REVERIE_LOGGING__FILTER`
pub const ENV_PREFIX: &str = "REVERIE";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReverieConfig {
    #[serde(default = "default_library")]
    pub library: LibrarySettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_logging")]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Directories scanned when none are given on the command line
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Progress report interval; 0 disables progress output
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl ReverieConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `reverie.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, Self::environment())
    }

    /// Load with a caller-supplied environment source
    pub fn load_with(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Environment overrides the file (REVERIE_SECTION__KEY)
        settings = settings.add_source(environment);

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Environment source for `REVERIE_*` variables
    ///
    /// Lists are comma separated:
    /// `REVERIE_LIBRARY__DIRECTORIES=/music,/more/music`.
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("library.directories")
            .with_list_parse_key("library.extensions")
            .try_parsing(true)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.library.extensions.is_empty() {
            return Err(CliError::Config(
                "At least one library extension is required".to_string(),
            ));
        }

        if let Some(ext) = self.library.extensions.iter().find(|e| e.starts_with('.')) {
            return Err(CliError::Config(format!(
                "Extensions are given without the dot, got {:?}",
                ext
            )));
        }

        Ok(())
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            extensions: self
                .library
                .extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            follow_links: self.library.follow_links,
        }
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            progress_interval: Duration::from_millis(self.playback.progress_interval_ms),
        }
    }
}

impl Default for ReverieConfig {
    fn default() -> Self {
        Self {
            library: default_library(),
            playback: default_playback(),
            logging: default_logging(),
        }
    }
}

// Default values
fn default_library() -> LibrarySettings {
    LibrarySettings {
        directories: Vec::new(),
        extensions: default_extensions(),
        follow_links: false,
    }
}

fn default_extensions() -> Vec<String> {
    vec!["mp3".to_string(), "wav".to_string()]
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        progress_interval_ms: default_progress_interval_ms(),
    }
}

fn default_progress_interval_ms() -> u64 {
    500
}

fn default_logging() -> LoggingSettings {
    LoggingSettings {
        filter: default_log_filter(),
    }
}

fn default_log_filter() -> String {
    "reverie=info".to_string()
}
