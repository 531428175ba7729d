// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for the stub engine.
//!
//! Lookup problems (unknown namespaces, mismatched stubs) are not errors: they
//! are reported through `tracing` and the run continues. Only I/O, malformed
//! registry data and malformed stub documents surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Problems found while reading a VapourSynth argument specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// An entry did not have the `name:type[:flag...]` shape.
    #[error("malformed argument entry '{entry}'")]
    MalformedEntry { entry: String },

    /// An entry had an empty name or type.
    #[error("argument entry '{entry}' has an empty {part}")]
    EmptyPart { entry: String, part: &'static str },

    /// The same argument name appeared twice.
    #[error("duplicate argument '{name}'")]
    DuplicateArgument { name: String },
}

/// Problems found while indexing a stub document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// A start marker without its end marker (or the reverse).
    #[error("line {line}: unbalanced marker '{marker}'")]
    UnbalancedMarker { line: usize, marker: String },

    /// A region nested where it is not allowed.
    #[error("line {line}: marker '{marker}' is not allowed here")]
    MisplacedMarker { line: usize, marker: String },

    /// The same namespace appeared twice in one section.
    #[error("line {line}: duplicate region for namespace '{namespace}'")]
    DuplicateRegion { line: usize, namespace: String },

    /// A required section is missing from the document.
    #[error("missing section '{section}'")]
    MissingSection { section: String },
}

/// Main error type for stub generation.
#[derive(Debug, Error)]
pub enum StubError {
    /// Registry dump could not be parsed.
    #[error("Registry error in {}: {message}", path.display())]
    Registry { path: PathBuf, message: String },

    /// A function signature could not be classified.
    #[error("Signature error in {plugin}.{function}: {source}")]
    Signature {
        plugin: String,
        function: String,
        #[source]
        source: SignatureError,
    },

    /// The input stub document is malformed.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// I/O error (reading dumps, stubs or writing output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using `StubError`.
pub type Result<T> = std::result::Result<T, StubError>;
