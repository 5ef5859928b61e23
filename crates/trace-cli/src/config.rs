use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use trace_client::BackendConfig;
use trace_core::AppSettings;

const APP_NAME: &str = "trace";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendSection,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    pub base_url: String,
    /// Seconds; 0 leaves requests unbounded
    #[serde(default)]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// 0 lets the backend choose the window
    pub days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    pub burn_delay_ms: u64,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. Built-in defaults
    /// 2. config/default.toml
    /// 3. config/{TRACE_ENV}.toml
    /// 4. TRACE__SECTION__KEY environment variables
    /// 5. TRACE_BACKEND_URL
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("TRACE_ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TRACE")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        if let Ok(url) = std::env::var("TRACE_BACKEND_URL") {
            if !url.trim().is_empty() {
                cfg.backend.base_url = url;
            }
        }

        Ok(cfg)
    }

    /// Load config from a specific path on top of the defaults (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?;
        config.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        ConfigLoader::builder()
            .set_default("backend.base_url", trace_client::config::DEFAULT_BASE_URL)?
            .set_default("backend.timeout_secs", 0)?
            .set_default(
                "storage.dir",
                default_storage_dir().to_string_lossy().into_owned(),
            )?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("analysis.days", trace_core::DEFAULT_ANALYSIS_DAYS)?
            .set_default(
                "journal.burn_delay_ms",
                trace_core::DEFAULT_BURN_DELAY.as_millis() as u64,
            )
    }

    pub fn backend_config(&self) -> BackendConfig {
        let config = BackendConfig::new(self.backend.base_url.clone());
        match self.backend.timeout_secs {
            0 => config,
            secs => config.with_timeout(Duration::from_secs(secs)),
        }
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            analysis_days: match self.analysis.days {
                0 => None,
                days => Some(days),
            },
            burn_delay: Duration::from_millis(self.journal.burn_delay_ms),
        }
    }
}

/// Platform data directory for the stored session (~/.local/share/trace/)
pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}
