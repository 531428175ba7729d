// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The blank stub skeleton generation starts from when no input is given.

use crate::document::StubDocument;
use crate::error::DocumentError;

/// Blank stub with empty plugin sections for every host context.
pub const TEMPLATE: &str = include_str!("../templates/blank.pyi");

/// Parses [`TEMPLATE`].
///
/// # Errors
///
/// Only fails if the embedded template itself is malformed.
pub fn blank_document() -> Result<StubDocument, DocumentError> {
    StubDocument::parse(TEMPLATE)
}
