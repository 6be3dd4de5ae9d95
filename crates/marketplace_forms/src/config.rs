use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_DELAY_MS: u64 = 1500;
pub const DEFAULT_REFERENCE_PREFIX: &str = "HC";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Simulated network latency of the demo backend.
    pub delay_ms: u64,
    /// Prefix of generated receipt references, e.g. `HC-1A2B3C4D`.
    pub reference_prefix: String,
}

impl SubmissionConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub config_dir: PathBuf,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Defaults, then `config.json5` / `config.toml` from the config folder,
    /// then `MARKETPLACE_FORMS__SECTION__KEY` environment overrides.
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load_from(&get_config_dir())
    }

    pub fn load_from(config_dir: &Path) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .set_default("submission.delay_ms", DEFAULT_DELAY_MS as i64)?
            .set_default("submission.reference_prefix", DEFAULT_REFERENCE_PREFIX)?
            .set_default("log.level", DEFAULT_LOG_LEVEL)?;

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.toml", config::FileFormat::Toml),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
            if config_dir.join(file).exists() {
                found_config = true
            }
        }
        if !found_config {
            debug!(dir = %config_dir.display(), "no configuration file found, using defaults");
        }

        builder = builder.add_source(
            config::Environment::with_prefix(PROJECT_NAME.as_str())
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "halal-marketplace", env!("CARGO_PKG_NAME"))
}
