//! Client configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;
use crate::error::ValidationError;

/// Environment variable holding the service root URL.
pub const ENV_SERVICE_ROOT: &str = "ODATA_SERVICE_ROOT";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "ODATA_TIMEOUT_SECS";
/// Environment variable holding the connect timeout in seconds.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "ODATA_CONNECT_TIMEOUT_SECS";
/// Environment variable holding a static bearer token.
pub const ENV_ACCESS_TOKEN: &str = "ODATA_ACCESS_TOKEN";

/// Settings for building an [`ODataClient`](crate::ODataClient) with the
/// default HTTP transport.
///
/// Deserializable, so it can be embedded in an application's own config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Service root, e.g. `https://services.odata.org/V4/TripPinService`.
    pub service_root: String,
    /// Per-request timeout.
    pub timeout_secs: Option<u64>,
    /// TCP connect timeout.
    pub connect_timeout_secs: Option<u64>,
    /// Static bearer token.
    pub access_token: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Creates a config for `service_root` with everything else unset.
    pub fn new(service_root: impl Into<String>) -> Self {
        Self {
            service_root: service_root.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from `ODATA_*` environment variables.
    ///
    /// `ODATA_SERVICE_ROOT` is required. Timeouts that do not parse as whole
    /// seconds are rejected.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let service_root = lookup(ENV_SERVICE_ROOT)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ValidationError::missing(ENV_SERVICE_ROOT))?;

        Ok(Self {
            service_root,
            timeout_secs: parse_secs(&lookup, ENV_TIMEOUT_SECS)?,
            connect_timeout_secs: parse_secs(&lookup, ENV_CONNECT_TIMEOUT_SECS)?,
            access_token: lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()),
            headers: BTreeMap::new(),
        })
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<u64>, Error> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| {
                Error::from(ValidationError::new(
                    name,
                    format!("'{}' is not a number of seconds", raw),
                ))
            }),
    }
}
