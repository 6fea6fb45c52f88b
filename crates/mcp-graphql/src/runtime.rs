//! Runtime utilities
//!
//! This module is only used by the main binary and provides helper code
//! related to runtime configuration.

mod config;
pub mod logging;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};

/// Environment variables read by the server, matched case-insensitively
const CONFIG_ENV_VARS: &[&str] = &[
    "endpoint",
    "allow_mutations",
    "log_level",
    "log_path",
    "log_format",
    "log_rotation",
    "transport",
    "http_address",
    "http_port",
];

/// Environment variables kept as raw text instead of being parsed as figment values
const TEXT_ENV_VARS: &[&str] = &["name", "schema", "headers"];

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    env_figment().extract()
}

/// Read in a config from a YAML file. Environment variables take precedence over the file.
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    env_figment().join(Yaml::file(yaml_path)).extract()
}

fn env_figment() -> Figment {
    Env::raw()
        .only(TEXT_ENV_VARS)
        .iter()
        .fold(Figment::new().join(config_env()), |figment, (key, value)| {
            figment.join(Serialized::default(&key.as_str().to_lowercase(), value))
        })
}

/// Figment provider that maps the flat environment variables into the nested structure needed
/// by the config
fn config_env() -> Env {
    Env::raw()
        .only(CONFIG_ENV_VARS)
        .map(|key| match key.to_string().to_lowercase().as_str() {
            "log_level" => "logging:level".into(),
            "log_path" => "logging:path".into(),
            "log_format" => "logging:format".into(),
            "log_rotation" => "logging:rotation".into(),
            "transport" => "transport:type".into(),
            "http_address" => "transport:address".into(),
            "http_port" => "transport:port".into(),

            other => other.to_string().into(),
        })
        .split(":")
}
