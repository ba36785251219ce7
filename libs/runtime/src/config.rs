use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::home_dir::resolve_home_dir;

/// Environment prefix; `MERAKI__API__BASE_URL` maps to `api.base_url`.
pub const ENV_PREFIX: &str = "MERAKI__";

/// Allowed typeahead quiet period, in milliseconds.
pub const DEBOUNCE_RANGE_MS: RangeInclusive<u64> = 400..=600;

const DEFAULT_SUBDIR: &str = ".meraki";

/// Console configuration: backend access, screen defaults and logging.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Working directory for logs; normalized to an absolute path on load.
    #[serde(default)]
    pub home_dir: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub lists: ListsConfig,
    #[serde(default)]
    pub typeahead: TypeaheadConfig,
    /// Logging configuration (optional, uses defaults if None).
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_sec: u64,
    /// Bearer token to start the session with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ListsConfig {
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct TypeaheadConfig {
    pub debounce_ms: u64,
    pub page_size: u32,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/console.log"; empty disables the file
    #[serde(default)]
    pub file_level: String,
    /// Rotated files older than this are removed (ignored when `max_backups` is set).
    #[serde(default)]
    pub max_age_days: Option<u32>,
    /// How many rotated files to keep.
    #[serde(default)]
    pub max_backups: Option<usize>,
    /// Max size of the file in MB before rotating.
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:44360".to_string(),
            timeout_sec: 30,
            token: None,
        }
    }
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            page_size: 10,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/meraki-console.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(20),
        },
    );
    logging
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            api: ApiConfig::default(),
            lists: ListsConfig::default(),
            typeahead: TypeaheadConfig::default(),
            logging: Some(default_logging_config()),
        }
    }
}

/// Command line arguments that override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}

impl ConsoleConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        Self::load_from(Some(config_path.as_ref()), ENV_PREFIX)
    }

    /// Load from file when given, otherwise defaults plus environment.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        Self::load_from(config_path.as_ref().map(|p| p.as_ref()), ENV_PREFIX)
    }

    fn load_from(config_path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Logging stays None unless YAML/ENV provide it.
        let base = ConsoleConfig {
            logging: None,
            ..ConsoleConfig::default()
        };

        let mut figment = Figment::new().merge(Serialized::defaults(base));
        if let Some(path) = config_path {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        let figment = figment.merge(Env::prefixed(env_prefix).split("__"));

        let mut config: ConsoleConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        config
            .normalize_home_dir()
            .context("Failed to resolve home_dir")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.api.timeout_sec == 0 {
            bail!("api.timeout_sec must be positive");
        }
        if self.lists.page_size == 0 {
            bail!("lists.page_size must be positive");
        }
        if self.typeahead.page_size == 0 {
            bail!("typeahead.page_size must be positive");
        }
        if !DEBOUNCE_RANGE_MS.contains(&self.typeahead.debounce_ms) {
            bail!(
                "typeahead.debounce_ms must be within {}..={}, got {}",
                DEBOUNCE_RANGE_MS.start(),
                DEBOUNCE_RANGE_MS.end(),
                self.typeahead.debounce_ms
            );
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<url::Url> {
        let url = url::Url::parse(self.api.base_url.trim())
            .with_context(|| format!("api.base_url is not a valid URL: {:?}", self.api.base_url))?;
        if url.cannot_be_a_base() {
            bail!("api.base_url cannot be used as a base: {url}");
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_sec)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.typeahead.debounce_ms)
    }

    pub fn home_path(&self) -> PathBuf {
        PathBuf::from(&self.home_dir)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(base_url) = &args.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(token) = &args.token {
            self.api.token = Some(token.clone());
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    fn normalize_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.home_dir.clone());
        let resolved = resolve_home_dir(configured, DEFAULT_SUBDIR, /*create*/ true)
            .context("home_dir normalization failed")?;
        self.home_dir = resolved.to_string_lossy().to_string();
        Ok(())
    }
}
