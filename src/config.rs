//! Client configuration.

use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default ATWS 1.5 endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://webservices7.autotask.net/ATServices/1.5/atws.asmx";

/// `SOAPAction` header value for the `query` operation.
pub const DEFAULT_SOAP_ACTION: &str = "http://autotask.net/ATWS/v1_5/query";

/// Variable holding the user name.
pub const ENV_USERNAME: &str = "ATWS_USERNAME";
/// Variable holding the password.
pub const ENV_PASSWORD: &str = "ATWS_PASSWORD";
/// Optional endpoint override.
pub const ENV_ENDPOINT: &str = "ATWS_ENDPOINT";
/// Optional `SOAPAction` override.
pub const ENV_SOAP_ACTION: &str = "ATWS_SOAP_ACTION";

/// Endpoint and credentials for the query service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Service URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// `SOAPAction` header value.
    #[serde(default = "default_soap_action")]
    pub soap_action: String,

    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_soap_action() -> String {
    DEFAULT_SOAP_ACTION.to_string()
}

impl Config {
    /// Creates a configuration for the default endpoint.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            endpoint: default_endpoint(),
            soap_action: default_soap_action(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Overrides the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the `SOAPAction` header.
    #[must_use]
    pub fn with_soap_action(mut self, soap_action: impl Into<String>) -> Self {
        self.soap_action = soap_action.into();
        self
    }

    /// Reads the configuration from `ATWS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` if the username or password is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` if the username or password is
    /// missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingVar {
                    name: name.to_string(),
                })
        };

        let mut config = Self::new(required(ENV_USERNAME)?, required(ENV_PASSWORD)?);
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            config.endpoint = endpoint;
        }
        if let Some(action) = lookup(ENV_SOAP_ACTION).filter(|v| !v.is_empty()) {
            config.soap_action = action;
        }
        Ok(config)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("soap_action", &self.soap_action)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
