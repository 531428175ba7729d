// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Plugin registry loading and discovery.
//!
//! The host runtime's plugin registry reaches the engine as registry dumps:
//! JSON or YAML files listing each plugin with the argument and return specs
//! the runtime reports for its functions. This module provides:
//! - [`RegistryDump`] / [`PluginDump`]: the serializable dump format
//! - [`load_dump`] and [`collect_dump_files`]: file and directory discovery
//! - [`Registry`]: the process-scoped, load-once cache of [`PluginSignature`]s

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StubError};
use crate::plugin::{is_valid_namespace, HostContext, PluginSignature};
use crate::signature::classify_function;

/// A function as the runtime reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDump {
    pub name: String,
    /// Argument spec, e.g. `clip:vnode;planes:int[]:opt;`.
    #[serde(default)]
    pub arguments: String,
    /// Return spec, e.g. `clip:vnode;`. Empty means unspecified.
    #[serde(default)]
    pub returns: String,
}

/// A plugin as the runtime reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDump {
    pub namespace: String,
    #[serde(default)]
    pub identifier: String,
    /// Human-readable plugin name, used as the stub docstring.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FunctionDump>,
}

/// Accepted top-level shapes of a dump file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RegistryDump {
    /// `{ plugins: [...] }`
    Wrapped { plugins: Vec<PluginDump> },
    /// `[...]`
    List(Vec<PluginDump>),
}

impl RegistryDump {
    pub fn into_plugins(self) -> Vec<PluginDump> {
        match self {
            Self::Wrapped { plugins } | Self::List(plugins) => plugins,
        }
    }
}

fn is_dump_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|ext| ext.to_str()), Some("json" | "yaml" | "yml"))
}

/// Parses dump text. JSON for `.json`, YAML otherwise.
///
/// # Errors
///
/// Returns [`StubError::Registry`] if the text does not match the dump format.
pub fn parse_dump(path: &Path, text: &str) -> Result<Vec<PluginDump>> {
    let registry_err = |message: String| StubError::Registry { path: path.to_path_buf(), message };

    let dump: RegistryDump = if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        serde_json::from_str(text).map_err(|e| registry_err(e.to_string()))?
    } else {
        serde_saphyr::from_str(text).map_err(|e| registry_err(e.to_string()))?
    };

    Ok(dump.into_plugins())
}

/// Reads and parses one dump file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or a registry error if it
/// cannot be parsed.
pub fn load_dump(path: &Path) -> Result<Vec<PluginDump>> {
    let text = std::fs::read_to_string(path)?;
    let plugins = parse_dump(path, &text)?;
    debug!(file = %path.display(), count = plugins.len(), "Loaded registry dump");
    Ok(plugins)
}

/// Expands a path into dump files: the file itself, or the dump files
/// directly inside a directory, sorted by name.
///
/// # Errors
///
/// Returns an I/O error if the path does not exist or the directory cannot be read.
pub fn collect_dump_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        if !path.exists() {
            return Err(StubError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() && is_dump_file(&entry_path) {
            files.push(entry_path);
        } else {
            debug!(file = %entry_path.display(), "Skipping non-dump entry");
        }
    }
    files.sort();
    Ok(files)
}

/// Classifies a dumped plugin. Functions with malformed specs are skipped with a warning.
pub fn build_signature(dump: &PluginDump) -> PluginSignature {
    let mut functions: IndexMap<HostContext, Vec<_>> = IndexMap::new();

    for func in &dump.functions {
        match classify_function(&func.name, &func.arguments, &func.returns) {
            Ok(sigs) => {
                for (ctx, sig) in sigs {
                    functions.entry(ctx).or_default().push(sig);
                }
            },
            Err(source) => {
                let err = StubError::Signature {
                    plugin: dump.namespace.clone(),
                    function: func.name.clone(),
                    source,
                };
                warn!(error = %err, "Skipping function with malformed signature");
            },
        }
    }

    functions.sort_by(|a, _, b, _| a.cmp(b));

    PluginSignature {
        namespace: dump.namespace.clone(),
        identifier: dump.identifier.clone(),
        description: dump.name.clone(),
        functions,
    }
}

/// Load-once cache over a set of registry dump sources.
///
/// The first call to [`Registry::plugins`] reads every source; later calls
/// reuse the result until [`Registry::invalidate`] is called.
#[derive(Debug, Default)]
pub struct Registry {
    sources: Vec<PathBuf>,
    cache: Option<IndexMap<String, PluginSignature>>,
}

impl Registry {
    pub fn new(sources: Vec<PathBuf>) -> Self {
        Self { sources, cache: None }
    }

    /// A registry holding exactly the given plugins, with no sources to read.
    pub fn from_plugins(plugins: impl IntoIterator<Item = PluginSignature>) -> Self {
        let cache = plugins.into_iter().map(|p| (p.namespace.clone(), p)).collect();
        Self { sources: Vec::new(), cache: Some(cache) }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    fn loaded(&mut self) -> Result<&mut IndexMap<String, PluginSignature>> {
        if self.cache.is_none() {
            let mut plugins = IndexMap::new();
            for source in &self.sources {
                read_source(source, &mut plugins)?;
            }
            info!(count = plugins.len(), "Discovered plugins");
            self.cache = Some(plugins);
        }
        // Populated just above.
        Ok(self.cache.get_or_insert_with(IndexMap::new))
    }

    /// All discovered plugins, in discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed on first access.
    pub fn plugins(&mut self) -> Result<Vec<&PluginSignature>> {
        Ok(self.loaded()?.values().collect())
    }

    /// Looks up a plugin by namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed on first access.
    pub fn get(&mut self, namespace: &str) -> Result<Option<&PluginSignature>> {
        Ok(self.loaded()?.get(namespace))
    }

    /// Loads additional plugin definitions from files or directories.
    ///
    /// Loaded plugins override discovered ones with the same namespace.
    /// Returns the namespaces contributed by `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if any path cannot be read or parsed.
    pub fn load_extra(&mut self, paths: &[PathBuf]) -> Result<BTreeSet<String>> {
        let plugins = self.loaded()?;
        let mut namespaces = BTreeSet::new();
        for path in paths {
            namespaces.extend(read_source(path, plugins)?);
        }
        Ok(namespaces)
    }

    /// Drops the cached registry; the next access reads the sources again.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

fn read_source(
    source: &Path,
    plugins: &mut IndexMap<String, PluginSignature>,
) -> Result<BTreeSet<String>> {
    let mut namespaces = BTreeSet::new();
    for file in collect_dump_files(source)? {
        for dump in load_dump(&file)? {
            if !is_valid_namespace(&dump.namespace) {
                warn!(
                    file = %file.display(),
                    namespace = %dump.namespace,
                    "Skipping plugin whose namespace is not a valid identifier"
                );
                continue;
            }
            let sig = build_signature(&dump);
            namespaces.insert(sig.namespace.clone());
            plugins.insert(sig.namespace.clone(), sig);
        }
    }
    Ok(namespaces)
}
