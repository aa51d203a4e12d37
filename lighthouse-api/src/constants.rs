//! Constants for the Lighthouse API
//!
//! Defaults and fixed names used across the server, collector and handlers.

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Config file used when neither `--config` nor the env var is given
pub const DEFAULT_CONFIG_PATH: &str = "lighthouse.json";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "LIGHTHOUSE_CONFIG";

/// Environment variable overriding the bind host
pub const BIND_ENV: &str = "LIGHTHOUSE_BIND";

/// Environment variables overriding the port, in priority order
pub const PORT_ENVS: &[&str] = &["LIGHTHOUSE_PORT", "PORT"];

/// Environment variable selecting the log formatter (`json` or `pretty`)
pub const LOG_FORMAT_ENV: &str = "LIGHTHOUSE_LOG_FORMAT";

// ============================================================================
// CACHE & COLLECTOR
// ============================================================================

/// Default freshness window for every topic (seconds)
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 10;

/// Default collector sleep after a round with no deliveries (milliseconds)
pub const DEFAULT_IDLE_SLEEP_MS: u64 = 10;

// ============================================================================
// IPC
// ============================================================================

/// Default directory holding queue sockets
pub const DEFAULT_IPC_DIR: &str = "/tmp/lighthouse";

/// File extension of queue sockets
pub const SOCKET_EXTENSION: &str = "sock";

/// Largest datagram a queue source accepts
pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

// ============================================================================
// ROUTES
// ============================================================================

/// Prefixes owned by the server itself
pub const RESERVED_ROUTE_PREFIXES: &[&str] = &["/health", "/metrics"];

// ============================================================================
// BUILT-IN HANDLERS
// ============================================================================

/// Node name prefix for the default `nodes` handler
pub const DEFAULT_NODE_PREFIX: &str = "johnny0";

/// Number of nodes the default `nodes` handler reports
pub const DEFAULT_NODE_COUNT: usize = 6;

/// Result string for a handler that did its job
pub const RESULT_SUCCESS: &str = "success";

/// Result string for a handler that did not
pub const RESULT_FAILED: &str = "failed";
