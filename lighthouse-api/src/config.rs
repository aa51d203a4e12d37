//! Configuration loading for the Lighthouse server.
//!
//! The document is JSON unless the file ends in `.toml`. Unknown fields are
//! rejected everywhere; anything that fails [`LighthouseConfig::validate`]
//! stops the process before a socket or port is opened.

use lighthouse_core::{handler_name_for_path, Action, ArgumentSpec};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    BIND_ENV, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DEFAULT_FRESHNESS_WINDOW_SECS, DEFAULT_HOST,
    DEFAULT_IDLE_SLEEP_MS, DEFAULT_IPC_DIR, DEFAULT_NODE_COUNT, DEFAULT_NODE_PREFIX, DEFAULT_PORT,
    PORT_ENVS, RESERVED_ROUTE_PREFIXES,
};
use crate::handlers::command::template_arity;
use crate::sources::ipc::validate_queue_name;

// ============================================================================
// DOCUMENT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LighthouseConfig {
    pub log_level: LogLevel,
    #[serde(default)]
    pub ipc_rest_adapters: Vec<AdapterConfig>,
    #[serde(default)]
    pub rest_actions: Vec<ActionConfig>,
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
    #[serde(default = "default_ipc_dir")]
    pub ipc_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collector: CollectorSettings,
    /// Handler catalog; the built-in defaults apply when absent.
    #[serde(default)]
    pub handlers: Option<BTreeMap<String, HandlerConfig>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// One queue → topic binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    pub adapter_name: String,
    pub ipc_queue: String,
    pub rest_route: String,
    #[serde(default)]
    pub group_by_attrib: Option<String>,
    /// Overrides the global freshness window for this topic.
    #[serde(default)]
    pub freshness_secs: Option<u64>,
}

impl AdapterConfig {
    /// Topic name: the route without its leading slash.
    pub fn topic(&self) -> &str {
        self.rest_route.strip_prefix('/').unwrap_or(&self.rest_route)
    }

    pub fn freshness_window(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.freshness_secs.unwrap_or(default_secs))
    }
}

/// One declared action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    pub action_name: String,
    pub rest_route: String,
    pub script_path: String,
    #[serde(default)]
    pub argument_list: Vec<ArgumentSpec>,
}

impl ActionConfig {
    pub fn to_action(&self) -> Action {
        Action::new(
            self.action_name.clone(),
            self.rest_route.clone(),
            handler_name_for_path(&self.script_path),
            self.argument_list.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::invalid("server", format!("invalid bind address {}: {}", addr, e))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorSettings {
    #[serde(default = "default_idle_sleep_ms")]
    pub idle_sleep_ms: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            idle_sleep_ms: default_idle_sleep_ms(),
        }
    }
}

impl CollectorSettings {
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum HandlerConfig {
    /// Run a local program. `{0}`, `{1}`, … in `args` are replaced with the
    /// positional arguments.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        output: CommandOutput,
        /// Value of the `action` field in the response; the catalog name
        /// when absent.
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        arity: Option<usize>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// Report a fixed list of node names.
    NodeList {
        #[serde(default = "default_node_prefix")]
        prefix: String,
        #[serde(default = "default_node_count")]
        count: usize,
    },
}

/// How a command's outcome becomes a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutput {
    /// `{action, target, result, error?}` from the exit status.
    #[default]
    Status,
    /// stdout lines under `field`.
    Lines { field: String },
}

fn default_freshness_window_secs() -> u64 {
    DEFAULT_FRESHNESS_WINDOW_SECS
}

fn default_ipc_dir() -> PathBuf {
    PathBuf::from(DEFAULT_IPC_DIR)
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_idle_sleep_ms() -> u64 {
    DEFAULT_IDLE_SLEEP_MS
}

fn default_node_prefix() -> String {
    DEFAULT_NODE_PREFIX.to_string()
}

fn default_node_count() -> usize {
    DEFAULT_NODE_COUNT
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

impl LighthouseConfig {
    /// Locate, parse, override from the environment, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args()
            .or_else(config_path_from_env)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::from_path(&path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, ConfigFormat::from_path(path))
    }

    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config = match format {
            ConfigFormat::Json => serde_json::from_str(contents)?,
            ConfigFormat::Toml => toml::from_str(contents)?,
        };
        Ok(config)
    }

    /// Apply `LIGHTHOUSE_BIND` and `LIGHTHOUSE_PORT`/`PORT`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var(BIND_ENV) {
            self.server.host = host;
        }
        if let Some((name, value)) = PORT_ENVS
            .iter()
            .find_map(|name| std::env::var(name).ok().map(|value| (*name, value)))
        {
            self.server.port = value
                .parse::<u16>()
                .map_err(|_| ConfigError::invalid(name, format!("invalid port value: {}", value)))?;
        }
        Ok(())
    }

    /// Global freshness window.
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Effective handler catalog configuration.
    pub fn handler_configs(&self) -> BTreeMap<String, HandlerConfig> {
        self.handlers
            .clone()
            .unwrap_or_else(crate::handlers::default_handler_configs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.freshness_window_secs == 0 {
            return Err(ConfigError::invalid("freshness_window_secs", "must be > 0"));
        }
        if self.ipc_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("ipc_dir", "must not be empty"));
        }

        let idle_sleep = self.collector.idle_sleep();
        if idle_sleep >= self.freshness_window() {
            return Err(ConfigError::invalid(
                "collector.idle_sleep_ms",
                "must be smaller than freshness_window_secs",
            ));
        }

        // Every concrete route pattern the router will mount.
        let mut routes: Vec<(String, String)> = Vec::new();

        let mut adapter_names = HashSet::new();
        let mut queues = HashSet::new();
        for (idx, adapter) in self.ipc_rest_adapters.iter().enumerate() {
            let field = |name: &str| format!("ipc_rest_adapters[{}].{}", idx, name);

            if adapter.adapter_name.trim().is_empty() {
                return Err(ConfigError::invalid(field("adapter_name"), "must not be empty"));
            }
            if !adapter_names.insert(adapter.adapter_name.as_str()) {
                return Err(ConfigError::invalid(
                    field("adapter_name"),
                    format!("duplicate adapter name '{}'", adapter.adapter_name),
                ));
            }
            validate_queue_name(&adapter.ipc_queue)
                .map_err(|e| ConfigError::invalid(field("ipc_queue"), e.to_string()))?;
            if !queues.insert(adapter.ipc_queue.trim_start_matches('/')) {
                return Err(ConfigError::invalid(
                    field("ipc_queue"),
                    format!("queue '{}' is bound by another adapter", adapter.ipc_queue),
                ));
            }
            validate_route(&adapter.rest_route)
                .map_err(|r| ConfigError::invalid(field("rest_route"), r))?;
            if let Some(group_key) = &adapter.group_by_attrib {
                if group_key.is_empty() {
                    return Err(ConfigError::invalid(field("group_by_attrib"), "must not be empty"));
                }
            }
            match adapter.freshness_secs {
                Some(0) => {
                    return Err(ConfigError::invalid(field("freshness_secs"), "must be > 0"));
                }
                Some(secs) if idle_sleep >= Duration::from_secs(secs) => {
                    return Err(ConfigError::invalid(
                        field("freshness_secs"),
                        "must be larger than collector.idle_sleep_ms",
                    ));
                }
                _ => {}
            }
            routes.push((field("rest_route"), adapter.rest_route.clone()));
        }

        let mut action_names = HashSet::new();
        for (idx, action) in self.rest_actions.iter().enumerate() {
            let field = |name: &str| format!("rest_actions[{}].{}", idx, name);

            if action.action_name.trim().is_empty() {
                return Err(ConfigError::invalid(field("action_name"), "must not be empty"));
            }
            if !action_names.insert(action.action_name.as_str()) {
                return Err(ConfigError::invalid(
                    field("action_name"),
                    format!("duplicate action name '{}'", action.action_name),
                ));
            }
            if action.script_path.trim().is_empty() {
                return Err(ConfigError::invalid(field("script_path"), "must not be empty"));
            }
            validate_route(&action.rest_route)
                .map_err(|r| ConfigError::invalid(field("rest_route"), r))?;

            let mut arg_names = HashSet::new();
            for arg in &action.argument_list {
                if !is_identifier(&arg.name) {
                    return Err(ConfigError::invalid(
                        field("argument_list"),
                        format!("invalid argument name '{}'", arg.name),
                    ));
                }
                if !arg_names.insert(arg.name.as_str()) {
                    return Err(ConfigError::invalid(
                        field("argument_list"),
                        format!("duplicate argument '{}'", arg.name),
                    ));
                }
            }
            routes.push((field("rest_route"), action.to_action().route_template()));
        }

        for (i, (field, route)) in routes.iter().enumerate() {
            if let Some((other_field, _)) = routes[..i]
                .iter()
                .find(|(_, other)| routes_overlap(route, other))
            {
                return Err(ConfigError::invalid(
                    field.clone(),
                    format!("route {} overlaps the route of {}", route, other_field),
                ));
            }
        }

        for (name, handler) in self.handler_configs() {
            validate_handler(&name, &handler)?;
        }

        Ok(())
    }
}

/// Check a configured base route.
///
/// Returns the reason on failure.
pub fn validate_route(route: &str) -> Result<(), String> {
    if !route.starts_with('/') {
        return Err(format!("route '{}' must start with '/'", route));
    }
    if route.len() < 2 {
        return Err("route must name at least one segment".to_string());
    }
    if route.ends_with('/') {
        return Err(format!("route '{}' must not end with '/'", route));
    }
    if route.contains("//") {
        return Err(format!("route '{}' has an empty segment", route));
    }
    if route.contains([':', '*', '{', '}', '?', '#']) {
        return Err(format!("route '{}' contains a reserved character", route));
    }
    for prefix in RESERVED_ROUTE_PREFIXES {
        if route == *prefix || route.starts_with(&format!("{}/", prefix)) {
            return Err(format!("route '{}' is reserved by the server", route));
        }
    }
    Ok(())
}

/// Whether two route patterns could match the same path.
///
/// Segments starting with `:` match anything.
pub fn routes_overlap(a: &str, b: &str) -> bool {
    let a: Vec<&str> = a.split('/').collect();
    let b: Vec<&str> = b.split('/').collect();
    a.len() == b.len()
        && a.iter()
            .zip(&b)
            .all(|(x, y)| x == y || x.starts_with(':') || y.starts_with(':'))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_handler(name: &str, handler: &HandlerConfig) -> Result<(), ConfigError> {
    let field = format!("handlers.{}", name);
    match handler {
        HandlerConfig::Command {
            program,
            args,
            output,
            arity,
            timeout_secs,
            ..
        } => {
            if program.trim().is_empty() {
                return Err(ConfigError::invalid(format!("{}.program", field), "must not be empty"));
            }
            let needed = template_arity(args);
            if let Some(arity) = arity {
                if *arity < needed {
                    return Err(ConfigError::invalid(
                        format!("{}.arity", field),
                        format!("arguments reference placeholder {{{}}}", needed - 1),
                    ));
                }
            }
            if let CommandOutput::Lines { field: out } = output {
                if out.is_empty() {
                    return Err(ConfigError::invalid(
                        format!("{}.output", field),
                        "field must not be empty",
                    ));
                }
            }
            if *timeout_secs == Some(0) {
                return Err(ConfigError::invalid(format!("{}.timeout_secs", field), "must be > 0"));
            }
        }
        HandlerConfig::NodeList { count, .. } => {
            if *count == 0 {
                return Err(ConfigError::invalid(format!("{}.count", field), "must be > 0"));
            }
        }
    }
    Ok(())
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lighthouse_core::ArgType;
    use proptest::prelude::*;
    use serde_json::json;

    fn parse_json(value: serde_json::Value) -> Result<LighthouseConfig, ConfigError> {
        LighthouseConfig::parse(&value.to_string(), ConfigFormat::Json)
    }

    fn sample() -> serde_json::Value {
        json!({
            "log_level": "INFO",
            "ipc_rest_adapters": [
                {
                    "adapter_name": "cpu",
                    "ipc_queue": "/cpu_usage",
                    "rest_route": "/cpu_usage"
                },
                {
                    "adapter_name": "nodes",
                    "ipc_queue": "/node_status",
                    "rest_route": "/node_status",
                    "group_by_attrib": "node"
                }
            ],
            "rest_actions": [
                {
                    "action_name": "power_on",
                    "rest_route": "/power_on",
                    "script_path": "adapter_scripts/power_on.py",
                    "argument_list": [{"name": "node_number", "type": "int"}]
                },
                {
                    "action_name": "nodes",
                    "rest_route": "/nodes",
                    "script_path": "adapter_scripts/nodes.py"
                }
            ]
        })
    }

    #[test]
    fn test_sample_config_parses_with_defaults() -> Result<(), ConfigError> {
        let config = parse_json(sample())?;
        config.validate()?;

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.freshness_window(), Duration::from_secs(10));
        assert_eq!(config.ipc_dir, PathBuf::from("/tmp/lighthouse"));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.collector.idle_sleep(), Duration::from_millis(10));
        assert_eq!(config.ipc_rest_adapters[0].topic(), "cpu_usage");

        let action = config.rest_actions[0].to_action();
        assert_eq!(action.handler, "power_on");
        assert_eq!(action.arguments[0].arg_type, ArgType::Int);
        assert!(config.handler_configs().contains_key("power_on"));
        Ok(())
    }

    #[test]
    fn test_log_levels() {
        let levels = [
            ("DEBUG", "debug"),
            ("INFO", "info"),
            ("WARNING", "warn"),
            ("ERROR", "error"),
        ];
        for (raw, filter) in levels {
            let mut doc = sample();
            doc["log_level"] = json!(raw);
            let config = parse_json(doc).expect("valid level");
            assert_eq!(config.log_level.as_filter(), filter);
        }

        let mut doc = sample();
        doc["log_level"] = json!("TRACE");
        assert!(matches!(parse_json(doc), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_log_level_is_rejected() {
        let mut doc = sample();
        doc.as_object_mut().expect("object").remove("log_level");
        assert!(parse_json(doc).is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let mut doc = sample();
        doc["surprise"] = json!(true);
        assert!(parse_json(doc).is_err());

        let mut doc = sample();
        doc["ipc_rest_adapters"][0]["colour"] = json!("blue");
        assert!(parse_json(doc).is_err());
    }

    #[test]
    fn test_unknown_argument_type_is_rejected() {
        let mut doc = sample();
        doc["rest_actions"][0]["argument_list"][0]["type"] = json!("list");
        assert!(parse_json(doc).is_err());
    }

    #[test]
    fn test_invalid_routes_are_rejected() {
        for bad in ["cpu", "/cpu/", "/a//b", "/:cpu", "/health", "/health/extra", "/metrics", "/"] {
            let mut doc = sample();
            doc["ipc_rest_adapters"][0]["rest_route"] = json!(bad);
            let config = parse_json(doc).expect("parses");
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidValue { .. })),
                "route {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_conflicting_routes_are_rejected() {
        // Topic route equal to a zero-argument action route.
        let mut doc = sample();
        doc["ipc_rest_adapters"][0]["rest_route"] = json!("/nodes");
        assert!(parse_json(doc).expect("parses").validate().is_err());

        // Topic route matched by an action's argument segment.
        let mut doc = sample();
        doc["ipc_rest_adapters"][0]["rest_route"] = json!("/power_on/7");
        assert!(parse_json(doc).expect("parses").validate().is_err());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut doc = sample();
        doc["ipc_rest_adapters"][1]["adapter_name"] = json!("cpu");
        assert!(parse_json(doc).expect("parses").validate().is_err());

        let mut doc = sample();
        doc["rest_actions"][1]["action_name"] = json!("power_on");
        assert!(parse_json(doc).expect("parses").validate().is_err());
    }

    #[test]
    fn test_idle_sleep_must_be_below_every_window() {
        let mut doc = sample();
        doc["collector"] = json!({"idle_sleep_ms": 10_000});
        assert!(parse_json(doc).expect("parses").validate().is_err());

        let mut doc = sample();
        doc["collector"] = json!({"idle_sleep_ms": 1_500});
        doc["ipc_rest_adapters"][0]["freshness_secs"] = json!(1);
        assert!(parse_json(doc).expect("parses").validate().is_err());
    }

    #[test]
    fn test_toml_config() -> Result<(), ConfigError> {
        let doc = r#"
            log_level = "DEBUG"
            freshness_window_secs = 5

            [[ipc_rest_adapters]]
            adapter_name = "cpu"
            ipc_queue = "/cpu_usage"
            rest_route = "/cpu_usage"

            [[rest_actions]]
            action_name = "shutdown"
            rest_route = "/shutdown"
            script_path = "shutdown"
            argument_list = [{ name = "node_number", type = "int" }]

            [handlers.shutdown]
            kind = "command"
            program = "echo"
            args = ["off", "{0}"]
        "#;
        let config = LighthouseConfig::parse(doc, ConfigFormat::Toml)?;
        config.validate()?;
        assert_eq!(config.freshness_window(), Duration::from_secs(5));
        assert!(matches!(
            config.handler_configs().get("shutdown"),
            Some(HandlerConfig::Command { output: CommandOutput::Status, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_handler_arity_must_cover_placeholders() {
        let mut doc = sample();
        doc["handlers"] = json!({
            "power_on": {"kind": "command", "program": "echo", "args": ["{0}", "{1}"], "arity": 1}
        });
        assert!(parse_json(doc).expect("parses").validate().is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Json);
    }

    #[test]
    fn test_from_path_reads_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lighthouse.json");
        std::fs::write(&path, sample().to_string())?;
        let config = LighthouseConfig::from_path(&path)?;
        assert_eq!(config.ipc_rest_adapters.len(), 2);

        let missing = LighthouseConfig::from_path(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
        Ok(())
    }

    #[test]
    fn test_routes_overlap() {
        assert!(routes_overlap("/power_on/:n", "/power_on/:id"));
        assert!(routes_overlap("/power_on/:n", "/power_on/7"));
        assert!(!routes_overlap("/power_on/:n", "/power_on"));
        assert!(!routes_overlap("/cpu", "/mem"));
    }

    fn arb_route() -> impl Strategy<Value = String> {
        prop::collection::vec(":?[a-c]{1,2}", 1..4)
            .prop_map(|segments| format!("/{}", segments.join("/")))
    }

    proptest! {
        #[test]
        fn prop_routes_overlap_is_symmetric_and_reflexive(a in arb_route(), b in arb_route()) {
            prop_assert!(routes_overlap(&a, &a));
            prop_assert_eq!(routes_overlap(&a, &b), routes_overlap(&b, &a));
        }
    }
}
