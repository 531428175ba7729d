// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! vsstubs Core - Type translation and stub merging for VapourSynth typing stubs.
//!
//! This crate turns the plugin registry of a VapourSynth host into `.pyi`
//! declarations and keeps an existing stub file in sync with it:
//!
//! ## Core Modules
//!
//! - [`types`]: Runtime type values and translated type descriptors
//! - [`translate`]: Memoizing type translation engine
//! - [`signature`]: VapourSynth argument-spec classifier
//! - [`plugin`]: Plugin and function signature records
//! - [`registry`]: Registry dump loading and the load-once plugin cache
//! - [`render`]: Declaration rendering and [`render::Implementation`]
//! - [`document`]: Line-span index over a stub document
//! - [`merge`]: Region-level merge engine (replace-all, add, remove, update)
//! - [`check`]: Consistency checking between a stub and a fresh rendering
//! - [`template`]: The blank stub skeleton
//! - [`stubs`]: One generation run, tying everything together
//! - [`error`]: Error types and handling
//!
//! ## Quick Start
//!
//! ```ignore
//! use vsstubs_core::{
//!     output_stubs, KnownCallbacks, Registry, StubOutcome, StubRequest, TypeTranslator,
//! };
//!
//! let mut registry = Registry::new(vec!["registry/".into()]);
//! let mut translator = TypeTranslator::new();
//! let callbacks = KnownCallbacks::builtin();
//!
//! let request =
//!     StubRequest { template: true, add: ["std".to_string()].into(), ..Default::default() };
//! let outcome = output_stubs(&request, &mut registry, &mut translator, &callbacks)?;
//! if let StubOutcome::Written(text) = outcome {
//!     std::fs::write("vapoursynth.pyi", text)?;
//! }
//! ```
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! caller installs a subscriber.

// Module declarations
pub mod check;
pub mod document;
pub mod error;
pub mod merge;
pub mod plugin;
pub mod registry;
pub mod render;
pub mod signature;
pub mod stubs;
pub mod template;
pub mod translate;
pub mod types;

// Convenience re-exports for commonly used types

// Error handling
pub use error::{DocumentError, SignatureError, StubError};

// Records and registry
pub use plugin::{FunctionSignature, HostContext, PluginSignature};
pub use registry::Registry;

// Translation and rendering
pub use render::{Implementation, KnownCallbacks, Renderer};
pub use translate::{CacheInfo, TypeTranslator};
pub use types::{RuntimeType, TypeDescriptor};

// Documents and runs
pub use check::CheckReport;
pub use document::StubDocument;
pub use merge::StubMerge;
pub use stubs::{output_stubs, StubOutcome, StubRequest};
