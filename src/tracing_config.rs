//! Tracing subscriber configuration for the CLI
//!
//! The library only emits trace events; the CLI configures the subscriber
//! here. Verbosity maps `-v` counts to levels, and `RUST_LOG` (or an
//! explicit filter string) overrides the mapping entirely.

use tracing_subscriber::EnvFilter;

/// Tracing configuration for the CLI process
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Verbosity level (0: warn, 1: info, 2: debug, 3+: trace)
    pub verbosity: u8,
    /// Environment filter string (overrides verbosity if set)
    pub env_filter: Option<String>,
}

impl TracingConfig {
    /// Build a config from a `-v` occurrence count
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self {
            verbosity,
            env_filter: None,
        }
    }

    /// Level directive for the configured verbosity
    #[must_use]
    pub fn level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn filter(&self) -> EnvFilter {
        if let Some(explicit) = &self.env_filter {
            return EnvFilter::new(explicit.clone());
        }
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("bgremove_client={}", self.level())))
    }

    /// Install the global subscriber
    ///
    /// Errors from double initialization are ignored so tests can call this
    /// repeatedly.
    pub fn init(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr)
            .try_init();
    }
}
