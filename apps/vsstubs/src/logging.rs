// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LogConfig;

type DynLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn env_filter_or_level(default_level: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

fn make_console_layer(console_level: tracing::Level) -> DynLayer {
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(env_filter_or_level(console_level))
        .boxed()
}

/// Picks the console level: `--quiet` wins over `--debug`, which wins over the config.
pub fn resolve_level(log_config: &LogConfig, quiet: bool, debug: bool) -> tracing::Level {
    if quiet {
        tracing::Level::ERROR
    } else if debug {
        tracing::Level::DEBUG
    } else {
        log_config.level.into()
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `level` when set.
///
/// Standard output stays free for `--output -`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: tracing::Level) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry().with(make_console_layer(level)).try_init()?;
    Ok(())
}
