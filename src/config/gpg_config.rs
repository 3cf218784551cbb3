use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::core::errors::{GpgPipeError, Result};

/// Executable name looked up in PATH when nothing else is configured.
pub const DEFAULT_GPG: &str = "gpg";

static GPG_CONFIG: OnceLock<GpgConfig> = OnceLock::new();

/// Install the process-wide configuration. Later calls are ignored.
pub fn init(config: GpgConfig) {
    if GPG_CONFIG.set(config).is_err() {
        tracing::debug!("gpg configuration already initialized; keeping the first one");
    }
}

/// The configuration installed by `init`, or the defaults.
pub fn current() -> &'static GpgConfig {
    GPG_CONFIG.get_or_init(GpgConfig::default)
}

/// Settings the orchestrator needs to run the external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpgConfig {
    /// Path (or PATH-relative name) of the gpg executable.
    pub gpg_path: PathBuf,
    /// Upper bound on how long to wait for gpg. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Remove the output file when gpg reports a failure.
    pub cleanup_on_failure: bool,
}

impl Default for GpgConfig {
    fn default() -> Self {
        Self {
            gpg_path: PathBuf::from(DEFAULT_GPG),
            wait_timeout: None,
            cleanup_on_failure: false,
        }
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub gpg_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub cleanup_on_failure: bool,
}

/// On-disk format of `config.toml`.
///
/// ```toml
/// [gpg]
/// path = "/usr/local/bin/gpg"
/// timeout_secs = 30
/// cleanup_on_failure = true
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    gpg: GpgSection,
}

/// The `[gpg]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GpgSection {
    path: Option<PathBuf>,
    timeout_secs: Option<u64>,
    cleanup_on_failure: Option<bool>,
}

impl GpgConfig {
    /// Resolve the configuration: overrides, then the config file, then defaults.
    ///
    /// An explicit `config_path` must exist. Without one, the default
    /// location is read only if present.
    pub fn resolve(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(GpgPipeError::InvalidConfig {
                        detail: format!("config file {} not found", path.display()),
                    });
                }
                Self::read_file(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => ConfigFile::default(),
            },
        };

        let defaults = Self::default();
        let timeout_secs = overrides.timeout_secs.or(file.gpg.timeout_secs);

        Ok(Self {
            gpg_path: overrides
                .gpg_path
                .clone()
                .or(file.gpg.path)
                .unwrap_or(defaults.gpg_path),
            // Zero disables the limit.
            wait_timeout: timeout_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            cleanup_on_failure: overrides.cleanup_on_failure
                || file.gpg.cleanup_on_failure.unwrap_or(defaults.cleanup_on_failure),
        })
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let parsed = toml::from_str(&content).map_err(|e| GpgPipeError::InvalidConfig {
            detail: format!("Failed to parse {}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(parsed)
    }
}

/// `<config dir>/gpgpipe/config.toml`, e.g. `~/.config/gpgpipe/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gpgpipe").join("config.toml"))
}
