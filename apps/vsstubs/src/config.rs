// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::Level;

/// Prefix of the environment variables that override the configuration,
/// e.g. `VSSTUBS_LOG__LEVEL=debug`.
pub const ENV_PREFIX: &str = "VSSTUBS_";

fn default_registry_paths() -> Vec<String> {
    vec!["./registry".to_string()]
}

fn default_stubs_path() -> String {
    "vapoursynth-stubs/__init__.pyi".to_string()
}

/// Where the plugin registry dumps are read from.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct RegistryConfig {
    /// Registry dump files or directories, read in order.
    /// Plugins from later entries override earlier ones with the same namespace.
    #[serde(default = "default_registry_paths")]
    pub paths: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { paths: default_registry_paths() }
    }
}

impl RegistryConfig {
    pub fn sources(&self) -> Vec<PathBuf> {
        self.paths.iter().map(PathBuf::from).collect()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct OutputConfig {
    /// Stub file written when no `--output` is given, and read by `--check`
    /// when no `--input` is given.
    #[serde(default = "default_stubs_path")]
    pub default_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { default_path: default_stubs_path() }
    }
}

/// Log level for filtering messages.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct LogConfig {
    /// Level used when neither `--quiet`, `--debug` nor `RUST_LOG` is set.
    #[serde(default)]
    pub level: LogLevel,
}

/// Root configuration for vsstubs.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,

    /// Callback signatures keyed by `namespace.function.parameter`,
    /// e.g. `"std.FrameEval.eval" = "Callable[..., VideoNode]"`.
    /// Entries override the built-in table.
    #[serde(default)]
    pub callbacks: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub file_missing: Option<String>,
}

/// Loads the configuration from defaults, a TOML file, and environment variables.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file exists but contains invalid TOML syntax
/// - Environment variables are set but contain invalid values
pub fn load(config_path: &str) -> Result<ConfigLoadResult, Box<figment::Error>> {
    let mut figment =
        Figment::new().merge(figment::providers::Serialized::defaults(Config::default()));

    let mut file_missing = None;

    // A missing config file just means defaults
    if std::path::Path::new(config_path).exists() {
        figment = figment.merge(Toml::file(config_path));
    } else {
        file_missing = Some(config_path.to_string());
    }

    let config: Config =
        figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().map_err(Box::new)?;

    Ok(ConfigLoadResult { config, file_missing })
}

/// Generates the default configuration as a pretty-printed TOML string.
///
/// # Errors
///
/// Returns an error if the default configuration cannot be serialized to TOML.
pub fn generate_default() -> Result<String, toml::ser::Error> {
    let default_config = Config::default();
    toml::to_string_pretty(&default_config)
}
