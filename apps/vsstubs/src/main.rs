// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::process::ExitCode;

use clap::Parser;
use vsstubs_cli::cli::{handle_command, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    handle_command(&cli)
}
