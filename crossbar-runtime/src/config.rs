//! Runtime configuration.
//!
//! The configuration surface the core consumes: the address-space counts
//! and the default request timeout. All three are fixed for the lifetime of
//! the forwarder; how the values are produced (files, flags, environment)
//! is an external concern.

use std::fmt;
use std::time::Duration;

/// Default time to wait for a correlated reply before giving up.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a router forwarder.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Number of logical shards. Shard ids range over `[0, N)` for
    /// non-negative keys.
    pub shard_count: u32,
    /// Number of logical entities, independent of shard.
    pub entity_count: u32,
    /// Default time to wait for a correlated reply.
    pub request_timeout: Duration,
}

impl RouterConfig {
    /// Creates a configuration with the default request timeout.
    #[must_use]
    pub const fn new(shard_count: u32, entity_count: u32) -> Self {
        Self {
            shard_count,
            entity_count,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the default request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Creates a configuration suitable for tests (small address space,
    /// short timeout).
    #[must_use]
    pub const fn fast_for_testing() -> Self {
        Self {
            shard_count: 10,
            entity_count: 20,
            request_timeout: Duration::from_millis(250),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if either count is zero or the timeout is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::InvalidCount {
                parameter: "shard_count",
            });
        }
        if self.entity_count == 0 {
            return Err(ConfigError::InvalidCount {
                parameter: "entity_count",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Configuration errors. Fatal at startup: a forwarder refuses to
/// initialize over an invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A shard or entity count is zero.
    InvalidCount {
        /// The parameter that was zero.
        parameter: &'static str,
    },
    /// The request timeout is zero.
    ZeroTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCount { parameter } => {
                write!(f, "invalid configuration: {parameter} must be at least 1")
            }
            Self::ZeroTimeout => {
                write!(f, "invalid configuration: request_timeout must be positive")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<crossbar_routing::AssignError> for ConfigError {
    fn from(err: crossbar_routing::AssignError) -> Self {
        match err {
            crossbar_routing::AssignError::InvalidConfiguration { parameter } => {
                Self::InvalidCount { parameter }
            }
        }
    }
}
