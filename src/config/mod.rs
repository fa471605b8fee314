// Configuration module entry point
// Loads worker configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Port assigned by the Functions host to a custom handler
pub const CUSTOM_HANDLER_PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

#[cfg(test)]
const MISSING_CONFIG: &str = "does-not-exist/hello-function-config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// `FUNCTIONS_CUSTOMHANDLER_PORT` wins over every other port source.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let env = config::Environment::with_prefix("WORKER")
            .prefix_separator("_")
            .separator("__");
        Self::load_layered(
            config_path,
            Some(env),
            std::env::var(CUSTOM_HANDLER_PORT_ENV).ok(),
        )
    }

    /// Built-in defaults only, unaffected by files or the process environment
    #[cfg(test)]
    pub(crate) fn defaults() -> Self {
        Self::load_layered(MISSING_CONFIG, None, None).expect("default config")
    }

    fn load_layered(
        config_path: &str,
        env: Option<config::Environment>,
        port_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 7071)?
            .set_default("function.route_prefix", "api")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .add_source(config::File::with_name(config_path).required(false));
        if let Some(env) = env {
            builder = builder.add_source(env);
        }
        let settings = builder
            .set_override_option("server.port", port_override)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::defaults();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 7071);
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.function.route_prefix, "api");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.performance.keep_alive_timeout, 75);
        assert_eq!(cfg.performance.read_timeout, 30);
        assert_eq!(cfg.performance.shutdown_timeout, 10);
        assert_eq!(cfg.performance.max_connections, None);
    }

    #[test]
    fn test_custom_handler_port_overrides() {
        let cfg = Config::load_layered(MISSING_CONFIG, None, Some("40123".to_string())).unwrap();
        assert_eq!(cfg.server.port, 40123);
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:40123".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_port_override_is_rejected() {
        assert!(Config::load_layered(MISSING_CONFIG, None, Some("not-a-port".to_string())).is_err());
    }

    #[test]
    fn test_unknown_function_name_key_is_ignored() {
        let mut env = std::collections::HashMap::new();
        env.insert("WORKER_FUNCTION__NAME".to_string(), "Goodbye".to_string());
        env.insert("WORKER_FUNCTION__ROUTE_PREFIX".to_string(), "v1".to_string());
        let source = config::Environment::with_prefix("WORKER")
            .prefix_separator("_")
            .separator("__")
            .source(Some(env));
        let cfg = Config::load_layered(MISSING_CONFIG, Some(source), None).unwrap();
        assert_eq!(cfg.function.route_prefix, "v1");
        assert_eq!(AppState::new(&cfg).routes.path(), "/v1/HelloWorld");
    }

    #[test]
    fn test_invalid_host() {
        let mut cfg = Config::defaults();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
