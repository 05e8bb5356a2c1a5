use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use log::warn;

use crate::model::Container;
use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
    pub container: ContainerDefaults,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
            container: ContainerDefaults::from_env(),
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
    const DEFAULT_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "LOAD_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "LOAD_PLANNER_API_PORT";

    fn from_env() -> Self {
        let (bind_ip, display_host) = match env_string(Self::HOST_VAR) {
            Some(raw) => parse_host(&raw),
            None => (Self::DEFAULT_IP, Self::DEFAULT_HOST.to_string()),
        };
        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => parse_port(&raw),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
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

    /// Configured port.
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

fn parse_host(raw: &str) -> (IpAddr, String) {
    match raw.parse::<IpAddr>() {
        Ok(ip) => (ip, raw.to_string()),
        Err(err) => {
            warn!(
                "Could not parse {} ('{}'): {}. Using {}.",
                ApiConfig::HOST_VAR,
                raw,
                err,
                ApiConfig::DEFAULT_HOST
            );
            (ApiConfig::DEFAULT_IP, ApiConfig::DEFAULT_HOST.to_string())
        }
    }
}

fn parse_port(raw: &str) -> u16 {
    match raw.parse::<u16>() {
        Ok(value) if value != 0 => value,
        Ok(_) => {
            warn!(
                "{} must not be 0. Using {}.",
                ApiConfig::PORT_VAR,
                ApiConfig::DEFAULT_PORT
            );
            ApiConfig::DEFAULT_PORT
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}'): {}. Using {}.",
                ApiConfig::PORT_VAR,
                raw,
                err,
                ApiConfig::DEFAULT_PORT
            );
            ApiConfig::DEFAULT_PORT
        }
    }
}

/// Configuration for the placement engine.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const ALLOW_ROTATION_VAR: &'static str = "LOAD_PLANNER_ALLOW_ROTATIONS";
    const SUPPORT_RATIO_VAR: &'static str = "LOAD_PLANNER_SUPPORT_RATIO";
    const GENERAL_EPSILON_VAR: &'static str = "LOAD_PLANNER_GENERAL_EPSILON";
    const ORIENTATION_TOLERANCE_VAR: &'static str = "LOAD_PLANNER_ORIENTATION_TOLERANCE";
    const TIME_LIMIT_VAR: &'static str = "LOAD_PLANNER_TIME_LIMIT_MS";

    fn from_env() -> Self {
        let allow_rotation = env_string(Self::ALLOW_ROTATION_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ALLOW_ROTATION_VAR))
            .unwrap_or(PackingConfig::DEFAULT_ALLOW_ROTATION);

        let support_ratio = load_f64_with_warning(
            Self::SUPPORT_RATIO_VAR,
            PackingConfig::DEFAULT_SUPPORT_RATIO,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted minimum support may lead to unstable stacks",
        );

        let general_epsilon = load_f64_with_warning(
            Self::GENERAL_EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted tolerances may cause numerical instabilities",
        );

        let orientation_tolerance = load_f64_with_warning(
            Self::ORIENTATION_TOLERANCE_VAR,
            PackingConfig::DEFAULT_ORIENTATION_TOLERANCE,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted orientation tolerance changes the rotated/unrotated labels",
        );

        let time_limit = env_string(Self::TIME_LIMIT_VAR).and_then(|raw| parse_time_limit(&raw));

        let packing = PackingConfig::builder()
            .allow_rotation(allow_rotation)
            .support_ratio(support_ratio)
            .general_epsilon(general_epsilon)
            .orientation_tolerance(orientation_tolerance)
            .time_limit(time_limit)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

fn parse_time_limit(raw: &str) -> Option<Duration> {
    match raw.parse::<u64>() {
        Ok(0) => {
            warn!(
                "{} must be greater than 0. Running without time limit.",
                OptimizerConfig::TIME_LIMIT_VAR
            );
            None
        }
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(err) => {
            warn!(
                "Could not parse {} ('{}'): {}. Running without time limit.",
                OptimizerConfig::TIME_LIMIT_VAR,
                raw,
                err
            );
            None
        }
    }
}

/// Container used when a request does not bring its own.
///
/// The defaults describe a standard 13.6 m trailer in cm and kg.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerDefaults {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub clearance: f64,
    pub max_weight: f64,
}

impl Default for ContainerDefaults {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            depth: Self::DEFAULT_DEPTH,
            height: Self::DEFAULT_HEIGHT,
            clearance: Self::DEFAULT_CLEARANCE,
            max_weight: Self::DEFAULT_MAX_WEIGHT,
        }
    }
}

impl ContainerDefaults {
    pub const DEFAULT_WIDTH: f64 = 245.0;
    pub const DEFAULT_DEPTH: f64 = 1360.0;
    pub const DEFAULT_HEIGHT: f64 = 270.0;
    pub const DEFAULT_CLEARANCE: f64 = 30.0;
    pub const DEFAULT_MAX_WEIGHT: f64 = 26_000.0;

    fn from_env() -> Self {
        let positive = |value: f64| value > 0.0;
        let defaults = Self {
            width: load_f64_with_warning(
                "LOAD_PLANNER_CONTAINER_WIDTH",
                Self::DEFAULT_WIDTH,
                positive,
                "must be greater than 0",
                "Using a custom container width",
            ),
            depth: load_f64_with_warning(
                "LOAD_PLANNER_CONTAINER_DEPTH",
                Self::DEFAULT_DEPTH,
                positive,
                "must be greater than 0",
                "Using a custom container depth",
            ),
            height: load_f64_with_warning(
                "LOAD_PLANNER_CONTAINER_HEIGHT",
                Self::DEFAULT_HEIGHT,
                positive,
                "must be greater than 0",
                "Using a custom container height",
            ),
            clearance: load_f64_with_warning(
                "LOAD_PLANNER_CONTAINER_CLEARANCE",
                Self::DEFAULT_CLEARANCE,
                |value| value >= 0.0,
                "must not be negative",
                "Using a custom door clearance",
            ),
            max_weight: load_f64_with_warning(
                "LOAD_PLANNER_CONTAINER_MAX_WEIGHT",
                Self::DEFAULT_MAX_WEIGHT,
                positive,
                "must be greater than 0",
                "Using a custom payload limit",
            ),
        };

        if let Err(err) = defaults.container() {
            warn!("Default container is invalid ({}). Using the standard trailer.", err);
            return Self::default();
        }
        defaults
    }

    /// Builds the validated container.
    pub fn container(&self) -> Result<Container, crate::model::ConfigurationError> {
        Container::new(
            (self.width, self.depth, self.height),
            self.clearance,
            self.max_weight,
        )
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
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_f64_value(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-9;
            if (value - default).abs() > tolerance {
                warn!("{} ({} = {}).", notice, var_name, value);
            }
            value
        }
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_value(var_name, &raw, default, validator, invalid_hint, notice),
        None => default,
    }
}
