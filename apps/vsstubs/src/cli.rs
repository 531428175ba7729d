// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use schemars::schema_for;
use tracing::{debug, error, info};
use vsstubs_core::{
    output_stubs, KnownCallbacks, Registry, StubOutcome, StubRequest, TypeTranslator,
};

use crate::config;
use crate::io::{resolve_input, resolve_output};
use crate::logging;

/// Generate or modify VapourSynth stubs
#[derive(Parser, Debug)]
#[command(name = "vsstubs", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "vsstubs.toml", global = true)]
    pub config: String,

    /// Path to the input .pyi file. Use '-' for piping.
    #[arg(short = 'i', visible_short_alias = 'I', long, global = true)]
    pub input: Option<String>,

    /// Path to write the output .pyi file. '@' to overwrite the input file. '-' for piping.
    #[arg(short = 'o', visible_short_alias = 'O', long, global = true)]
    pub output: Option<String>,

    /// Load plugins from a registry dump file or a folder of dumps
    #[arg(short = 'l', visible_short_alias = 'L', long, global = true)]
    pub load: Vec<PathBuf>,

    /// Export blank template; excludes existing plugins unless --load or add is used
    #[arg(short = 't', visible_short_alias = 'T', long, global = true)]
    pub template: bool,

    /// Check for new plugins or new plugin signatures
    #[arg(short = 'c', visible_short_alias = 'C', long, global = true)]
    pub check: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[arg(long, hide = true, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add or update the specified plugins in the stubs
    Add {
        #[arg(required = true)]
        plugins: Vec<String>,
    },
    /// Remove the specified plugins from the stubs
    Remove {
        #[arg(required = true)]
        plugins: Vec<String>,
    },
    /// Regenerate the plugins already present in the input stubs
    Update,
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate a default config file and print it to stdout
    Default,
    /// Generate a JSON schema for the config and print it to stdout
    Schema,
}

/// What a generation run changes on top of the root options.
#[derive(Debug, Default)]
struct Changes {
    add: BTreeSet<String>,
    remove: BTreeSet<String>,
    update: bool,
}

/// Runs one generation with a loaded config, after logging is set up.
fn run_generation(cli: &Cli, config: &config::Config, changes: Changes) -> anyhow::Result<()> {
    let check = cli.check && cli.command.is_none();

    let input = resolve_input(cli.input.as_deref(), check, &config.output.default_path);
    let output =
        resolve_output(cli.output.as_deref(), input.as_ref(), &config.output.default_path)?;
    debug!(?input, ?output, "Resolved I/O");

    let input_text = input.as_ref().map(crate::io::InputSource::read).transpose()?;

    let mut registry = Registry::new(config.registry.sources());
    let mut translator = TypeTranslator::new();
    let callbacks = KnownCallbacks::builtin().with_overrides(config.callbacks.clone());

    let request = StubRequest {
        input: input_text,
        template: cli.template,
        check,
        update: changes.update,
        load: cli.load.clone(),
        add: changes.add,
        remove: changes.remove,
    };

    let outcome = output_stubs(&request, &mut registry, &mut translator, &callbacks);

    // Process-scoped caches end with the run.
    registry.invalidate();
    translator.clear();

    match outcome.context("Stub generation failed")? {
        StubOutcome::Written(text) => {
            output.write(&text)?;
            info!("Done!");
        },
        StubOutcome::Checked(report) => {
            if report.is_clean() {
                info!("Stubs are up to date.");
            }
        },
    }

    Ok(())
}

/// Handle a generation command (root, add, remove or update)
// Allow eprintln before logging is initialized (CLI output)
#[allow(clippy::disallowed_macros)]
fn handle_generate_command(cli: &Cli, changes: Changes) -> ExitCode {
    let config_result = match config::load(&cli.config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let level = logging::resolve_level(&config_result.config.log, cli.quiet, cli.debug);
    if let Err(e) = logging::init_logging(level) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    if let Some(missing_file) = &config_result.file_missing {
        debug!(config_path = %missing_file, "Config file not found, using defaults");
    }

    let join = |names: &BTreeSet<String>| names.iter().cloned().collect::<Vec<_>>().join(", ");
    if !changes.add.is_empty() {
        info!("Adding plugins: {}", join(&changes.add));
    } else if !changes.remove.is_empty() {
        info!("Removing plugins: {}", join(&changes.remove));
    } else if !cli.check {
        info!("Running stub generation...");
    }

    match run_generation(cli, &config_result.config, changes) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Handle the "config default" command - print default config to stdout
// Allow println for CLI output to stdout (intentional)
#[allow(clippy::disallowed_macros)]
fn handle_config_default_command() -> ExitCode {
    match config::generate_default() {
        Ok(toml_string) => {
            println!("# Default vsstubs configuration file");
            println!("{toml_string}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Failed to generate default config: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Handle the "config schema" command - print JSON schema to stdout
// Allow println for CLI output to stdout (intentional)
#[allow(clippy::disallowed_macros)]
fn handle_config_schema_command() -> ExitCode {
    let schema = schema_for!(config::Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Failed to generate config schema: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Handle CLI commands
pub fn handle_command(cli: &Cli) -> ExitCode {
    match &cli.command {
        None => handle_generate_command(cli, Changes::default()),
        Some(Commands::Add { plugins }) => handle_generate_command(
            cli,
            Changes { add: plugins.iter().cloned().collect(), ..Changes::default() },
        ),
        Some(Commands::Remove { plugins }) => handle_generate_command(
            cli,
            Changes { remove: plugins.iter().cloned().collect(), ..Changes::default() },
        ),
        Some(Commands::Update) => {
            handle_generate_command(cli, Changes { update: true, ..Changes::default() })
        },
        Some(Commands::Config(ConfigCommands::Default)) => handle_config_default_command(),
        Some(Commands::Config(ConfigCommands::Schema)) => handle_config_schema_command(),
    }
}
