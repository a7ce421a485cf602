//! # Configuration
//!
//! An immutable snapshot read once per process and shared as `Arc<Config>`.
//! It is produced either with `Config::builder()` or from `TWIN_*`
//! environment variables.

use crate::error::Error;
use crate::error::Result;

use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(30_000);

/// How a call is laid onto a transport message. One per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// The body carries a full call envelope and a full result envelope.
    #[default]
    Envelope,
    /// Target, method and credential travel as headers; bodies carry only
    /// the argument list and the return value.
    Headers,
}

impl std::str::FromStr for Framing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "envelope" => Ok(Framing::Envelope),
            "headers" => Ok(Framing::Headers),
            other => Err(Error::Configuration(format!("unknown framing `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub enabled: bool,
    /// The shared secret; required on both sides.
    pub secret: Option<String>,
    /// The peer's invoke URL, used by the HTTP transport.
    pub endpoint: String,
    pub framing: Framing,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Bean names whose targets are interceptable.
    pub bean_names: HashSet<String>,
    /// Type names (full path or last segment) whose targets are interceptable.
    pub class_names: HashSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            secret: None,
            endpoint: String::new(),
            framing: Framing::Envelope,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            bean_names: HashSet::new(),
            class_names: HashSet::new(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder { config: Config::default() }
    }

    /// Reads the snapshot from `TWIN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the snapshot from any key lookup, with the same keys as `from_env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(v) = lookup("TWIN_ENABLED") {
            config.enabled = parse_bool("TWIN_ENABLED", &v)?;
        }
        config.secret = lookup("TWIN_SECRET").filter(|s| !s.trim().is_empty());
        if let Some(v) = lookup("TWIN_URL") {
            config.endpoint = v.trim().to_string();
        }
        if let Some(v) = lookup("TWIN_FRAMING") {
            config.framing = v.parse()?;
        }
        if let Some(v) = lookup("TWIN_CONNECT_TIMEOUT_MS") {
            config.connect_timeout = parse_millis("TWIN_CONNECT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("TWIN_READ_TIMEOUT_MS") {
            config.read_timeout = parse_millis("TWIN_READ_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("TWIN_BEAN_NAMES") {
            config.bean_names = split_list(&v);
        }
        if let Some(v) = lookup("TWIN_CLASS_NAMES") {
            config.class_names = split_list(&v);
        }
        Ok(config)
    }

    /// The credential to send, if one is configured and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Upper bound on one round trip: connect plus read.
    pub fn round_trip_budget(&self) -> Duration {
        self.connect_timeout + self.read_timeout
    }

    /// True if a target registered as `bean`, of Rust type `type_name`, is interceptable.
    pub fn is_eligible(&self, bean: &str, type_name: &str) -> bool {
        if self.bean_names.contains(bean) {
            return true;
        }
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        self.class_names.contains(type_name) || self.class_names.contains(short)
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.config.secret = Some(secret.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn framing(mut self, framing: Framing) -> Self {
        self.config.framing = framing;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn bean(mut self, name: impl Into<String>) -> Self {
        self.config.bean_names.insert(name.into());
        self
    }

    pub fn class(mut self, name: impl Into<String>) -> Self {
        self.config.class_names.insert(name.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

fn parse_bool(key: &str, v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Configuration(format!("{}: expected a boolean, got `{}`", key, other))),
    }
}

fn parse_millis(key: &str, v: &str) -> Result<Duration> {
    v.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| Error::Configuration(format!("{}: expected milliseconds, got `{}`", key, v)))
}

fn split_list(v: &str) -> HashSet<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
