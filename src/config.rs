//! TOML configuration.
//!
//! ```toml
//! [general]
//! log_filename = "/var/log/disadis.log"
//!
//! [repository]
//! root = "/srv/datastreams"
//!
//! [auth]
//! tokens = ["s3cret"]
//!
//! [handler.download]
//! port = 8080
//! datastream = "content"
//! prefix = "vecnet:"
//! versioned = true
//! auth = true
//! datastream_id = ["content", "default"]
//!
//! [handler.thumbnail]
//! port = 8080
//! datastream = "thumbnail"
//! prefix = "vecnet:"
//! datastream_id = ["thumbnail"]
//! ```

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::router::is_valid_segment;

/// Segment identifier that marks a handler as its port's default.
pub const DEFAULT_SEGMENT: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("handler `{handler}`: {reason}")]
    Handler { handler: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default, rename = "handler")]
    pub handlers: BTreeMap<String, HandlerConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    /// Log file; stdout when unset.
    pub log_filename: Option<PathBuf>,
    #[serde(default = "default_listen_host")]
    pub listen_host: IpAddr,
}

impl Default for General {
    fn default() -> Self {
        Self { log_filename: None, listen_host: default_listen_host() }
    }
}

fn default_listen_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub root: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Bearer tokens accepted by handlers with `auth = true`.
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    pub port: u16,
    pub datastream: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub versioned: bool,
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub datastream_id: Vec<String>,
}

impl HandlerConfig {
    /// No segment ids, or the literal `default` among them.
    pub fn is_default(&self) -> bool {
        self.datastream_id.is_empty() || self.datastream_id.iter().any(|s| s == DEFAULT_SEGMENT)
    }

    /// Segment ids that are real routes, i.e. everything but `default`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.datastream_id
            .iter()
            .map(String::as_str)
            .filter(|s| *s != DEFAULT_SEGMENT)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether an authorizer can be built from `[auth]`.
    pub fn has_authorizer(&self) -> bool {
        !self.auth.tokens.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, h) in &self.handlers {
            let fail = |reason: String| ConfigError::Handler { handler: name.clone(), reason };
            if h.port == 0 {
                return Err(fail("port must be non-zero".into()));
            }
            if h.datastream.is_empty() {
                return Err(fail("datastream must be set".into()));
            }
            if let Some(bad) = h.segments().find(|s| !is_valid_segment(s)) {
                return Err(fail(format!("invalid datastream_id `{bad}`")));
            }
            if h.auth && !self.has_authorizer() {
                return Err(fail("auth is enabled but no [auth] tokens are configured".into()));
            }
        }
        Ok(())
    }
}
