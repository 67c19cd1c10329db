use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::warn;

use crate::suggestions::SuggestionConfig;
use crate::trace::{PalletLines, TraceOptions};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub calculator: CalculatorConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            calculator: CalculatorConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "LABEL_PACKER_API_HOST";
    const PORT_VAR: &'static str = "LABEL_PACKER_API_PORT";

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let host_value = host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (default_ip, Self::DEFAULT_HOST.to_string())
            }
        };

        let port = match port {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "⚠️ {} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_values(None, None)
    }
}

/// Presentation defaults and suggestion limits for the calculator service.
#[derive(Clone, Debug, Default)]
pub struct CalculatorConfig {
    trace: TraceOptions,
    suggestions: SuggestionConfig,
}

impl CalculatorConfig {
    const PALLET_LINES_VAR: &'static str = "LABEL_PACKER_PALLET_LINES";
    const SUGGESTION_LIMIT_VAR: &'static str = "LABEL_PACKER_SUGGESTION_LIMIT";
    const SUGGESTION_CAPACITY_VAR: &'static str = "LABEL_PACKER_SUGGESTION_CAPACITY";

    fn from_env() -> Self {
        Self::from_values(
            env_string(Self::PALLET_LINES_VAR),
            env_string(Self::SUGGESTION_LIMIT_VAR),
            env_string(Self::SUGGESTION_CAPACITY_VAR),
        )
    }

    fn from_values(
        pallet_lines: Option<String>,
        suggestion_limit: Option<String>,
        suggestion_capacity: Option<String>,
    ) -> Self {
        let pallet_lines = match pallet_lines {
            Some(raw) => raw.parse::<PalletLines>().unwrap_or_else(|err| {
                warn!(
                    "⚠️ {} invalid: {}. Using {}.",
                    Self::PALLET_LINES_VAR,
                    err,
                    PalletLines::default()
                );
                PalletLines::default()
            }),
            None => PalletLines::default(),
        };

        let max_results = load_usize_with_warning(
            Self::SUGGESTION_LIMIT_VAR,
            suggestion_limit,
            SuggestionConfig::DEFAULT_MAX_RESULTS,
            |value| (1..=100).contains(&value),
            "must be between 1 and 100",
        );

        let capacity = load_usize_with_warning(
            Self::SUGGESTION_CAPACITY_VAR,
            suggestion_capacity,
            SuggestionConfig::DEFAULT_CAPACITY,
            |value| value > 0,
            "must be greater than 0",
        );

        Self {
            trace: TraceOptions::with_pallet_lines(pallet_lines),
            suggestions: SuggestionConfig {
                capacity,
                max_results,
            },
        }
    }

    /// Trace options applied when a request does not choose its own.
    pub fn trace_options(&self) -> TraceOptions {
        self.trace
    }

    pub fn suggestion_config(&self) -> SuggestionConfig {
        self.suggestions
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("⚠️ Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn load_usize_with_warning(
    var_name: &str,
    raw: Option<String>,
    default: usize,
    validator: impl Fn(usize) -> bool,
    invalid_hint: &str,
) -> usize {
    match raw {
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) if validator(value) => value,
            Ok(_) => {
                warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name, raw, invalid_hint, default
                );
                default
            }
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
