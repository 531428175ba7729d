// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

pub mod cli;
pub mod config;
pub mod io;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::Config;
