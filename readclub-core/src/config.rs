use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

use crate::error::{CoreResult, ReadClubError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialMode {
    /// Keep and forward cookies across requests.
    #[default]
    IncludeCookies,
    Omit,
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientCfg {
    /// Absolute base URL every request path is joined onto.
    pub base_endpoint: String,
    /// Per-attempt timeout in milliseconds (default 10000ms)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub credential_mode: CredentialMode,
    #[serde(default = "default_headers")]
    pub default_headers: BTreeMap<String, String>,
}

impl ClientCfg {
    pub fn new(base_endpoint: impl Into<String>) -> Self {
        Self {
            base_endpoint: base_endpoint.into(),
            timeout_ms: default_timeout_ms(),
            credential_mode: CredentialMode::default(),
            default_headers: default_headers(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}
fn default_base_delay_ms() -> u64 {
    1_000
}
fn default_retryable_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RetryCfg {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            retryable_statuses: default_retryable_statuses(),
        }
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionCfg {
    /// Location the session expiry router navigates to on 401.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub client: ClientCfg,
    #[serde(default)]
    pub retry: RetryCfg,
    #[serde(default)]
    pub session: SessionCfg,
    /// Enables request/failure diagnostics.
    #[serde(default)]
    pub dev_mode: bool,
}

impl Config {
    pub fn new(base_endpoint: impl Into<String>) -> Self {
        Self {
            client: ClientCfg::new(base_endpoint),
            retry: RetryCfg::default(),
            session: SessionCfg::default(),
            dev_mode: false,
        }
    }

    /// Load a Config from a file path (JSON or TOML by extension). If the
    /// extension is missing or unrecognized, try JSON first, then TOML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(ReadClubError::from)?;
        let s = std::str::from_utf8(&bytes).map_err(|e| ReadClubError::Other(e.into()))?;
        let cfg: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str::<Self>(s).map_err(|e| ReadClubError::Other(e.into()))?
            }
            Some("toml") => {
                toml::from_str::<Self>(s).map_err(|e| ReadClubError::Other(e.into()))?
            }
            _ => serde_json::from_str::<Self>(s)
                .map_err(|e| ReadClubError::Other(e.into()))
                .or_else(|_| {
                    toml::from_str::<Self>(s).map_err(|e| ReadClubError::Other(e.into()))
                })?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let base = self.client.base_endpoint.trim();
        if base.is_empty() {
            return Err(ReadClubError::Validation("base_endpoint is empty".into()));
        }
        let url = reqwest::Url::parse(base).map_err(|e| {
            ReadClubError::Validation(format!("invalid base_endpoint '{base}': {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ReadClubError::Validation(format!(
                "base_endpoint '{base}' must use http or https"
            )));
        }
        if self.client.timeout_ms == 0 {
            return Err(ReadClubError::Validation("timeout_ms must be positive".into()));
        }
        if let Some(bad) = self
            .retry
            .retryable_statuses
            .iter()
            .find(|s| !(100..=599).contains(*s))
        {
            return Err(ReadClubError::Validation(format!(
                "retryable status {bad} is not an HTTP status"
            )));
        }
        if !self.session.login_path.starts_with('/') {
            return Err(ReadClubError::Validation(format!(
                "login_path '{}' must start with '/'",
                self.session.login_path
            )));
        }
        Ok(())
    }
}
