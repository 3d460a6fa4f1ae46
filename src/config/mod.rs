// Configuration module entry point
// Loads startup configuration and holds the shared runtime state

mod state;
mod types;

use std::net::{IpAddr, SocketAddr};

use crate::error::StartupError;
use crate::logger;

// Re-export public types
pub use state::AppState;
pub use types::{AssetsConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Port used when `PORT` is unset or unusable
pub const DEFAULT_PORT: u16 = 5000;

/// Optional config file looked up in the working directory (any format the
/// `config` crate understands, e.g. `config.toml`)
const CONFIG_FILE: &str = "config";

/// Prefix for environment overrides, e.g. `VIBE_ASSETS__ROOT=/srv/dist`
const ENV_PREFIX: &str = "VIBE";

impl Config {
    /// Load configuration from defaults, `config.toml`, `VIBE_*` variables and `PORT`
    pub fn load() -> Result<Self, StartupError> {
        let port_var = std::env::var("PORT").ok();
        Self::load_from(CONFIG_FILE, port_var.as_deref())
    }

    /// Load configuration from the given file path with an explicit `PORT` value
    ///
    /// A missing file is not an error. `port_var` wins over every other port
    /// source when it parses; an unusable value is reported and ignored.
    pub fn load_from(config_path: &str, port_var: Option<&str>) -> Result<Self, StartupError> {
        let port_override = port_var.and_then(|raw| {
            let port = parse_port(raw);
            if port.is_none() {
                logger::log_warning(&format!(
                    "Ignoring invalid PORT value '{raw}', falling back to configured port"
                ));
            }
            port
        });

        let settings = ::config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.backlog", 1024)?
            .set_default("server.shutdown_timeout", 10)?
            .set_default("assets.root", "dist")?
            .set_default("assets.index_file", "index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "vibecrossing-server")?
            .set_default("http.cache_control", "no-cache")?
            .add_source(::config::File::with_name(config_path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", port_override.map(i64::from))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let ip = self
            .server
            .host
            .parse::<IpAddr>()
            .map_err(|source| StartupError::InvalidAddress {
                host: self.server.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

/// Parse a `PORT` value; `None` unless it is a decimal port in `1..=65535`
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|port| *port != 0)
}
