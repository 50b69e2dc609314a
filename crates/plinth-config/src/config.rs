use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use plinth_utils::path::{resolve_path, xdg_config_home};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const DEFAULT_METADATA_DIR: &str = "./providers";
pub const DEFAULT_DESTINATION: &str = "./generated";
pub const DEFAULT_PARALLEL_LIMIT: usize = 4;

/// What to do when two targets of one version share an OS/arch pair and
/// therefore derive the same download path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// The later target in record order replaces the earlier one.
    #[default]
    Overwrite,
    /// The collision aborts generation for that provider.
    Reject,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
            CollisionPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Generator configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Directory holding provider metadata records, laid out as
    /// `<first letter of namespace>/<namespace>/<name>.json`.
    /// Default: ./providers
    pub metadata_dir: Option<String>,

    /// Root directory the static registry tree is written into.
    /// Default: ./generated
    pub destination: Option<String>,

    /// If true, artifacts and providers are generated in parallel.
    /// Default: true
    pub parallel: Option<bool>,

    /// Maximum number of worker threads used when parallel.
    /// Default: 4
    pub parallel_limit: Option<usize>,

    /// Handling of targets that derive the same download path.
    /// Default: overwrite
    pub collision_policy: Option<CollisionPolicy>,
}

/// Returns the path the configuration is read from.
///
/// An explicit path wins, then `PLINTH_CONFIG`, then
/// `$XDG_CONFIG_HOME/plinth/config.toml`.
pub fn config_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(resolve_path(path)?);
    }
    match std::env::var("PLINTH_CONFIG") {
        Ok(path) => Ok(resolve_path(&path)?),
        Err(_) => Ok(xdg_config_home().join("plinth").join("config.toml")),
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            metadata_dir: Some(DEFAULT_METADATA_DIR.to_string()),
            destination: Some(DEFAULT_DESTINATION.to_string()),
            parallel: Some(true),
            parallel_limit: Some(DEFAULT_PARALLEL_LIMIT),
            collision_policy: Some(CollisionPolicy::default()),
        }
    }

    /// Loads the configuration from `path`.
    /// If the file does not exist, the default configuration is used.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "loading configuration");
                toml::from_str(&content)?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "configuration not found, using defaults");
                Self::default_config()
            }
            Err(err) => {
                return Err(ConfigError::IoError {
                    action: format!("reading config {}", path.display()),
                    source: err,
                })
            }
        };

        config.resolve()?;

        Ok(config)
    }

    /// Fills unset fields with their defaults and validates the result.
    pub fn resolve(&mut self) -> Result<()> {
        self.metadata_dir
            .get_or_insert_with(|| DEFAULT_METADATA_DIR.to_string());
        self.destination
            .get_or_insert_with(|| DEFAULT_DESTINATION.to_string());
        self.parallel.get_or_insert(true);
        self.collision_policy.get_or_insert_with(CollisionPolicy::default);

        let limit = *self.parallel_limit.get_or_insert(DEFAULT_PARALLEL_LIMIT);
        if limit == 0 {
            return Err(ConfigError::InvalidParallelLimit(limit));
        }

        Ok(())
    }

    pub fn get_metadata_dir(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("PLINTH_METADATA_DIR") {
            return Ok(resolve_path(&env_path)?);
        }
        let path = self.metadata_dir.as_deref().unwrap_or(DEFAULT_METADATA_DIR);
        Ok(resolve_path(path)?)
    }

    pub fn get_destination(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("PLINTH_DESTINATION") {
            return Ok(resolve_path(&env_path)?);
        }
        let path = self.destination.as_deref().unwrap_or(DEFAULT_DESTINATION);
        Ok(resolve_path(path)?)
    }

    pub fn parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn parallel_limit(&self) -> usize {
        self.parallel_limit.unwrap_or(DEFAULT_PARALLEL_LIMIT)
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy.unwrap_or_default()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
