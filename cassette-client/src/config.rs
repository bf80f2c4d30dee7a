//! Client configuration and its builder.

use cassette_core::protocol::{Consistency, ProtocolVersion};

use std::time::Duration;

const DEFAULT_ADDRESS: &str = "127.0.0.1:9042";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Connection configuration for a single Cassandra node.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    address: String,
    protocol_version: ProtocolVersion,
    default_consistency: Consistency,
    connect_timeout: Duration,
}

impl ClientConfig {
    /// Returns a builder initialized with defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the node address (`host:port`).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the protocol version to speak.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// Returns the consistency level used when the caller passes none.
    pub fn default_consistency(&self) -> Consistency {
        self.default_consistency
    }

    /// Returns the TCP connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            protocol_version: ProtocolVersion::default(),
            default_consistency: Consistency::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    address: Option<String>,
    protocol_version: Option<ProtocolVersion>,
    default_consistency: Option<Consistency>,
    connect_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a builder with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node address (`host:port`).
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the protocol version (default v1).
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// Sets the default consistency level.
    pub fn default_consistency(mut self, consistency: Consistency) -> Self {
        self.default_consistency = Some(consistency);
        self
    }

    /// Sets the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Validates the settings and builds the config.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let defaults = ClientConfig::default();
        let address = self.address.unwrap_or(defaults.address);
        if address.is_empty() {
            return Err(ConfigError::new("address must not be empty"));
        }
        if !address.contains(':') {
            return Err(ConfigError::new(format!(
                "address {:?} is missing a port",
                address
            )));
        }
        let connect_timeout = self.connect_timeout.unwrap_or(defaults.connect_timeout);
        if connect_timeout.is_zero() {
            return Err(ConfigError::new("connect timeout must be non-zero"));
        }
        Ok(ClientConfig {
            address,
            protocol_version: self.protocol_version.unwrap_or(defaults.protocol_version),
            default_consistency: self
                .default_consistency
                .unwrap_or(defaults.default_consistency),
            connect_timeout,
        })
    }
}
