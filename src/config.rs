//! Configuration for tyrantkv
//!
//! Centralized configuration with sensible defaults.

/// Default Tokyo Tyrant port
pub const DEFAULT_PORT: u16 = 1978;

/// Main configuration for a tyrantkv connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server host name or address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,

    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Socket read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Which `getlist` response layout the server speaks
    pub getlist_shape: GetListShape,
}

/// Response layout of the `getlist` bulk call
///
/// Servers up to 1.1.10 answer with one value per requested key. From 1.1.11
/// on they answer with interleaved key/value pairs and skip missing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GetListShape {
    /// Detect the layout from the number of returned fields
    #[default]
    Auto,

    /// One value per requested key, in request order
    Legacy,

    /// Interleaved key, value, key, value, ...
    Interleaved,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            nodelay: true,
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            getlist_shape: GetListShape::Auto,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` form of the server address
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Pin the `getlist` response layout instead of sniffing it
    pub fn getlist_shape(mut self, shape: GetListShape) -> Self {
        self.config.getlist_shape = shape;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
