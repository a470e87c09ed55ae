//! Layered configuration for radsync.
//!
//! Layers, lowest priority first:
//! 1. built-in defaults ([`Config::default`]),
//! 2. an optional configuration file (TOML, YAML or JSON, by extension),
//! 3. environment variables prefixed with `RADSYNC_` (e.g.
//!    `RADSYNC_FILE_CONCURRENCY=4`),
//! 4. command-line overrides ([`Overrides`]).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://opendata.dwd.de/weather/radar/sites/pz/";
pub const DEFAULT_INDEX_FILE: &str = "current_files.json";
const MIRROR_DIRECTORY: &str = "3D_RAD_DATA";
const ENV_PREFIX: &str = "RADSYNC_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the remote directory tree to mirror.
    pub source_url: String,
    /// Local directory that replicates the remote tree.
    pub mirror_root: PathBuf,
    /// Index location, relative to the mirror root.
    pub index_file: PathBuf,
    /// Simultaneous file downloads across the whole tree.
    pub file_concurrency: usize,
    /// Simultaneous directory listings across the whole tree.
    pub directory_concurrency: usize,
    /// Deepest directory level followed below the source URL.
    pub max_depth: usize,
    /// Total download attempts per file, first one included.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Longest wait for any single read from the server.
    pub read_timeout_secs: u64,
    /// Cap on one whole request, body included. Unset means no cap, so
    /// large volumes on slow links can finish.
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: u64,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            mirror_root: default_mirror_root(),
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
            file_concurrency: 12,
            directory_concurrency: 17,
            max_depth: 32,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            read_timeout_secs: 30,
            request_timeout_secs: None,
            connect_timeout_secs: 10,
        }
    }
}

fn default_mirror_root() -> PathBuf {
    match ProjectDirs::from("", "", "radsync") {
        Some(dirs) => dirs.data_dir().join(MIRROR_DIRECTORY),
        None => PathBuf::from(MIRROR_DIRECTORY),
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_concurrency: Option<usize>,
}

impl Config {
    /// Loads and validates the configuration from every layer.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let config: Self = Self::figment(file)?
            .merge(Serialized::defaults(overrides))
            .extract()
            .or_raise(|| ErrorKind::Parse)?;
        config.validate()
    }

    /// Defaults, the optional file and the environment, without overrides.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
            }
            let extension = file.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
            figment = match extension.as_str() {
                "toml" => figment.merge(Toml::file(file)),
                "yaml" | "yml" => figment.merge(Yaml::file(file)),
                "json" => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(extension)),
            };
            tracing::debug!(path = %file.display(), "Loaded configuration file");
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Checks every value and normalizes the ones with a canonical form:
    /// the source URL always ends in `/`, the mirror root is made absolute.
    pub fn validate(mut self) -> Result<Self> {
        let mut url = Url::parse(&self.source_url).or_raise(|| ErrorKind::Invalid {
            field: "source_url",
            reason: format!("not a URL: {}", self.source_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::Invalid {
                field: "source_url",
                reason: format!("unsupported scheme: {}", url.scheme()),
            });
        }
        // Without the trailing slash relative links would resolve against
        // the parent directory.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.source_url = url.to_string();

        if !self.mirror_root.is_absolute() {
            self.mirror_root = std::path::absolute(&self.mirror_root).or_raise(|| ErrorKind::Invalid {
                field: "mirror_root",
                reason: format!("cannot resolve {}", self.mirror_root.display()),
            })?;
        }
        if self.index_file.is_absolute() || self.index_file.file_name().is_none() {
            exn::bail!(ErrorKind::Invalid {
                field: "index_file",
                reason: "must be a file path relative to the mirror root".to_string(),
            });
        }

        for (field, value) in [
            ("file_concurrency", self.file_concurrency as u64),
            ("directory_concurrency", self.directory_concurrency as u64),
            ("retry_attempts", u64::from(self.retry_attempts)),
            ("read_timeout_secs", self.read_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ] {
            if value == 0 {
                exn::bail!(ErrorKind::Invalid { field, reason: "must be at least 1".to_string() });
            }
        }
        if self.request_timeout_secs == Some(0) {
            exn::bail!(ErrorKind::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        Ok(self)
    }

    /// The validated source URL.
    pub fn source_url(&self) -> Result<Url> {
        Url::parse(&self.source_url).or_raise(|| ErrorKind::Invalid {
            field: "source_url",
            reason: format!("not a URL: {}", self.source_url),
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
