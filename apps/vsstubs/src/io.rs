// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Resolution of the `--input` / `--output` arguments into streams or files.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Argument value selecting a standard stream.
pub const STREAM_ARG: &str = "-";
/// Output value meaning "overwrite the input file".
pub const IN_PLACE_ARG: &str = "@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    pub fn from_arg(arg: &str) -> Self {
        if arg == STREAM_ARG {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Reads the whole input.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or standard input cannot be read.
    pub fn read(&self) -> Result<String> {
        match self {
            Self::Stdin => {
                let mut text = String::new();
                std::io::stdin().lock().read_to_string(&mut text).context("Failed to read stdin")?;
                Ok(text)
            },
            Self::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file {}", path.display())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Writes `text`, creating the parent directories of a file target.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories or the file cannot be written.
    pub fn write(&self, text: &str) -> Result<()> {
        match self {
            Self::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(text.as_bytes()).context("Failed to write stdout")?;
                stdout.flush().context("Failed to flush stdout")
            },
            Self::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory {}", parent.display())
                    })?;
                }
                std::fs::write(path, text)
                    .with_context(|| format!("Failed to write output file {}", path.display()))
            },
        }
    }
}

/// Resolves `--input`. Check mode falls back to the default stubs file.
pub fn resolve_input(input: Option<&str>, check: bool, default_path: &str) -> Option<InputSource> {
    match input {
        Some(arg) => Some(InputSource::from_arg(arg)),
        None if check => Some(InputSource::File(PathBuf::from(default_path))),
        None => None,
    }
}

/// Resolves `--output`.
///
/// `@` reuses the input file, `-` is standard output, and any other path gets
/// the `.pyi` extension. Without `--output` the default stubs file is used.
///
/// # Errors
///
/// Returns a usage error for `@` without an input file.
pub fn resolve_output(
    output: Option<&str>,
    input: Option<&InputSource>,
    default_path: &str,
) -> Result<OutputTarget> {
    match output {
        Some(IN_PLACE_ARG) => match input {
            Some(InputSource::File(path)) => Ok(OutputTarget::File(path.clone())),
            Some(InputSource::Stdin) => {
                bail!("Cannot overwrite the input in place when reading from stdin.")
            },
            None => bail!("You must provide an input file when output is '@'."),
        },
        Some(STREAM_ARG) => Ok(OutputTarget::Stdout),
        Some(path) => Ok(OutputTarget::File(Path::new(path).with_extension("pyi"))),
        None => Ok(OutputTarget::File(PathBuf::from(default_path))),
    }
}
