//! Configuration types for the background-removal client

use crate::error::{ClientError, Result};
use reqwest::Url;
use std::time::Duration;

/// Default base address of the removal service
pub const DEFAULT_SERVICE_BASE_URL: &str = "http://localhost:8000";

/// Default timeout applied to remote submissions
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Process-wide client configuration
///
/// The service base address is injected configuration, not global mutable
/// state: every component that needs to resolve a service-relative path
/// receives it through this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the removal service; relative `image_url` paths in
    /// responses are resolved against it
    pub service_base_url: Url,
    /// Timeout for each remote call
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            // The literal is a valid URL, parse cannot fail
            service_base_url: Url::parse(DEFAULT_SERVICE_BASE_URL)
                .expect("default base URL is valid"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a configuration builder
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// - Base URL scheme is not `http`/`https` or cannot serve as a base
    /// - Timeout is zero
    pub fn validate(&self) -> Result<()> {
        match self.service_base_url.scheme() {
            "http" | "https" => {},
            other => {
                return Err(ClientError::invalid_config(format!(
                    "Service base URL must be http or https, got '{other}'"
                )));
            },
        }
        if self.service_base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_config(format!(
                "Service base URL '{}' cannot serve as a base address",
                self.service_base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::invalid_config(
                "Timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Resolve a service-relative path (e.g. `/images/abc.png`) against the
    /// configured base address
    ///
    /// # Errors
    /// - The path does not join into a valid URL
    pub fn resolve(&self, relative: &str) -> Result<Url> {
        self.service_base_url.join(relative).map_err(|e| {
            ClientError::processing(format!(
                "Service returned unresolvable image path '{relative}': {e}"
            ))
        })
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    service_base_url: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the service base URL
    #[must_use]
    pub fn service_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.service_base_url = Some(url.into());
        self
    }

    /// Set the remote-call timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Base URL fails to parse
    /// - Validation fails (see [`ClientConfig::validate`])
    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::default();
        if let Some(raw) = self.service_base_url {
            config.service_base_url = Url::parse(raw.trim()).map_err(|e| {
                ClientError::invalid_config(format!("Invalid service base URL '{raw}': {e}"))
            })?;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}
