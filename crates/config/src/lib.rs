//! Layered configuration for comix.
//!
//! Values come from, in increasing priority: built-in defaults, a TOML
//! file, and `COMIX_`-prefixed environment variables where `__` separates
//! sections from keys (`COMIX_TOOLS__UNRAR=/opt/rar/unrar`,
//! `COMIX_BOOK__BACKUP=true`).
//!
//! ```toml
//! [tools]
//! rar = "/opt/rar/rar"
//! pdf_extract = "pdfimages"
//!
//! [book]
//! backup = true
//! temp_dir = "/var/tmp/comix"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use comix_archive::{Backends, ToolConfig};
use comix_book::{Book, BookOptions};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "COMIX_";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External programs used by the archive backends.
    pub tools: ToolConfig,
    pub book: BookOptions,
}

impl Config {
    /// Load `path`, then apply environment overrides. The file must exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        extract(with_env(Figment::new().merge(Toml::file(path))))
    }

    /// Load the per-user configuration file if there is one, then apply
    /// environment overrides.
    #[instrument]
    pub fn load_default() -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = default_path().filter(|path| path.is_file()) {
            tracing::debug!(path = %path.display(), "Using configuration file");
            figment = figment.merge(Toml::file(path));
        }
        extract(with_env(figment))
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        extract(Figment::new().merge(Toml::string(toml)))
    }

    /// Backend registry for the configured tools.
    pub fn backends(&self) -> Backends {
        Backends::from_config(&self.tools)
    }

    /// A closed book at `path` using this configuration.
    pub fn book(&self, path: impl Into<PathBuf>) -> Book {
        Book::with_backends(path, self.backends()).with_options(self.book.clone())
    }
}

/// Where [`Config::load_default`] looks: `comix/config.toml` in the
/// platform's configuration directory.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "comix").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

fn with_env(figment: Figment) -> Figment {
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

fn extract(figment: Figment) -> Result<Config> {
    match figment.extract() {
        Ok(config) => Ok(config),
        Err(err) => {
            let reason = err.to_string();
            Err(err).or_raise(|| ErrorKind::Parse(reason))
        },
    }
}
