//! Layered configuration.
//!
//! Values are resolved, lowest priority first, from:
//! 1. built-in defaults (paths under the platform data directory),
//! 2. a TOML file (given explicitly, or `config.toml` in the platform config
//!    directory when it exists), and
//! 3. `PGRDF_*` environment variables, with nested keys separated by a
//!    double underscore (`PGRDF_LOG__LEVEL=debug`).
//!
//! ```toml
//! database = "/var/lib/pgrdf/catalog.sqlite"
//! documents = "/srv/gutenberg/cache/epub"
//!
//! [log]
//! level = "info"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "PGRDF_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// Unpacked RDF catalog: one `<id>/pg<id>.rdf` per catalog number
    pub documents: PathBuf,
    pub log: LogConfig,
}
impl Default for Config {
    fn default() -> Self {
        let data = data_dir();
        Self {
            database: data.join("catalog.sqlite"),
            documents: data.join("epub"),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
}

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[display("trace")]
    Trace,
    #[display("debug")]
    Debug,
    #[default]
    #[display("info")]
    Info,
    #[display("warn")]
    Warn,
    #[display("error")]
    Error,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "gutenberg", "pgrdf")
}

fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."))
}

/// `config.toml` in the platform configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

impl Config {
    /// The layered provider chain, without extracting it.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// Loads configuration from `file`, or from the default location when no
/// file is given and one exists there.
///
/// # Errors
///
/// [`ErrorKind::NotFound`] when an explicitly given file doesn't exist, and
/// [`ErrorKind::Invalid`] when any layer holds a value of the wrong type.
pub fn load(file: Option<&Path>) -> Result<Config> {
    match file {
        Some(file) => load_from(Some(file)),
        None => {
            let default = default_config_path().filter(|path| path.is_file());
            load_from(default.as_deref())
        },
    }
}

/// Loads configuration from exactly the given layers: no default file lookup.
pub fn load_from(file: Option<&Path>) -> Result<Config> {
    if let Some(file) = file
        && !file.is_file()
    {
        exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
    }
    let config: Config = Config::figment(file).extract().or_raise(|| ErrorKind::Invalid)?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
