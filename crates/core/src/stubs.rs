// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! One stub generation run.
//!
//! [`output_stubs`] combines the registry, the renderer and the merge engine:
//! it picks the starting document (input or blank template), decides which
//! regions to regenerate and returns the resulting text, or a
//! [`CheckReport`] in check mode. Reading and writing files is left to the
//! caller.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::check::{compare, CheckReport};
use crate::document::StubDocument;
use crate::error::Result;
use crate::merge::StubMerge;
use crate::registry::Registry;
use crate::render::{Implementation, KnownCallbacks, Renderer};
use crate::template::blank_document;
use crate::translate::TypeTranslator;

/// What a run should do.
#[derive(Debug, Clone, Default)]
pub struct StubRequest {
    /// Text of an existing stub document. `None` starts from the blank template.
    pub input: Option<String>,
    /// Without an input, start with no plugin at all instead of every discovered one.
    pub template: bool,
    /// Compare the input with a fresh rendering instead of producing output.
    pub check: bool,
    /// Regenerate only the namespaces already present in the input.
    pub update: bool,
    /// Extra registry dumps; their namespaces are added to [`StubRequest::add`].
    pub load: Vec<PathBuf>,
    pub add: BTreeSet<String>,
    pub remove: BTreeSet<String>,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubOutcome {
    /// The regenerated document text.
    Written(String),
    /// Check mode findings. Nothing should be written.
    Checked(CheckReport),
}

fn render_all(registry: &mut Registry, renderer: &mut Renderer<'_>) -> Result<Vec<Implementation>> {
    Ok(registry
        .plugins()?
        .into_iter()
        .map(|plugin| renderer.construct_implementation(plugin))
        .collect())
}

/// Runs one generation.
///
/// Unknown namespaces in `add`/`remove` are reported as warnings and skipped.
///
/// # Errors
///
/// Returns an error if the registry or a `load` path cannot be read, or if the
/// input document has malformed markers.
pub fn output_stubs(
    request: &StubRequest,
    registry: &mut Registry,
    translator: &mut TypeTranslator,
    callbacks: &KnownCallbacks,
) -> Result<StubOutcome> {
    let mut add = request.add.clone();
    if !request.load.is_empty() {
        info!(paths = ?request.load, "Loading plugins");
        add.extend(registry.load_extra(&request.load)?);
    }

    let mut renderer = Renderer::new(translator, callbacks);

    let doc = match &request.input {
        Some(text) => StubDocument::parse(text)?,
        None => blank_document()?,
    };

    if request.check {
        info!("Checking stubs...");
        let fresh = render_all(registry, &mut renderer)?;
        let report = compare(&doc.implementations(), &fresh);
        report.log();
        debug!(cache = ?translator.cache_info(), "Type translation cache");
        return Ok(StubOutcome::Checked(report));
    }

    let mut merge = if request.input.is_some() {
        let mut merge = StubMerge::from_document(&doc);
        if request.update {
            let namespaces = merge.namespaces();
            info!("Updating stubs... Found {} plugins to update: {namespaces:?}", namespaces.len());
            for ns in &namespaces {
                match registry.get(ns)? {
                    Some(plugin) => merge.upsert(renderer.construct_implementation(plugin)),
                    None => warn!("\"{ns}\" was not discovered, keeping the existing region."),
                }
            }
        }
        merge
    } else if request.template {
        StubMerge::new()
    } else {
        StubMerge::replace_all(render_all(registry, &mut renderer)?)
    };

    debug!(?add, remove = ?request.remove, "Applying namespace changes");

    for ns in &add {
        match registry.get(ns)? {
            Some(plugin) => merge.upsert(renderer.construct_implementation(plugin)),
            None => warn!("\"{ns}\" isn't a valid plugin namespace."),
        }
    }
    for ns in &request.remove {
        if merge.remove(ns).is_none() {
            warn!("\"{ns}\" isn't a valid plugin namespace.");
        }
    }

    debug!(cache = ?translator.cache_info(), "Type translation cache");

    Ok(StubOutcome::Written(merge.write(&doc)))
}
