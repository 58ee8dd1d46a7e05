use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quickdial_core::cache::CacheSettings;
use quickdial_core::phone::is_known_country;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "quickdial";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_HOME_COUNTRY: &str = "US";
pub const DEFAULT_RECENTS_LIMIT: usize = 20;
pub const MAX_RECENTS_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub home_country: String,
    pub international_detection: bool,
    pub cache: CacheSettings,
    pub recents_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home_country: DEFAULT_HOME_COUNTRY.to_string(),
            international_detection: true,
            cache: CacheSettings::default(),
            recents_limit: DEFAULT_RECENTS_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("unknown home_country: {0}")]
    InvalidHomeCountry(String),
    #[error("invalid cache.{field} value: {value}")]
    InvalidCacheField { field: &'static str, value: u64 },
    #[error("invalid recents.limit value: {0}")]
    InvalidRecentsLimit(usize),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    home_country: Option<String>,
    international_detection: Option<bool>,
    cache: Option<CacheFile>,
    recents: Option<RecentsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CacheFile {
    ttl_secs: Option<u64>,
    max_entries: Option<u64>,
    eviction_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecentsFile {
    limit: Option<usize>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(country) = parsed.home_country {
        let country = country.trim().to_ascii_uppercase();
        if !is_known_country(&country) {
            return Err(ConfigError::InvalidHomeCountry(country));
        }
        config.home_country = country;
    }

    if let Some(enabled) = parsed.international_detection {
        config.international_detection = enabled;
    }

    if let Some(cache) = parsed.cache {
        if let Some(ttl) = cache.ttl_secs {
            config.cache.ttl = positive_secs("ttl_secs", ttl)?;
        }
        if let Some(max_entries) = cache.max_entries {
            if max_entries == 0 {
                return Err(ConfigError::InvalidCacheField {
                    field: "max_entries",
                    value: max_entries,
                });
            }
            config.cache.max_entries =
                usize::try_from(max_entries).map_err(|_| ConfigError::InvalidCacheField {
                    field: "max_entries",
                    value: max_entries,
                })?;
        }
        if let Some(interval) = cache.eviction_interval_secs {
            config.cache.eviction_interval = positive_secs("eviction_interval_secs", interval)?;
        }
    }

    if let Some(recents) = parsed.recents {
        if let Some(limit) = recents.limit {
            if limit == 0 || limit > MAX_RECENTS_LIMIT {
                return Err(ConfigError::InvalidRecentsLimit(limit));
            }
            config.recents_limit = limit;
        }
    }

    Ok(config)
}

fn positive_secs(field: &'static str, value: u64) -> Result<Duration> {
    if value == 0 {
        return Err(ConfigError::InvalidCacheField { field, value });
    }
    Ok(Duration::from_secs(value))
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
