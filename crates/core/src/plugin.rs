// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Plugin signature records.
//!
//! These are the immutable inputs of the stub engine: one [`PluginSignature`]
//! per plugin namespace, holding the functions it exposes in each
//! [`HostContext`].

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use crate::types::RuntimeType;

/// Object a plugin is reachable from (`core.ns`, `clip.ns`, `audio.ns`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostContext {
    Core,
    VideoNode,
    AudioNode,
}

impl HostContext {
    pub const ALL: [Self; 3] = [Self::Core, Self::VideoNode, Self::AudioNode];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "Core",
            Self::VideoNode => "VideoNode",
            Self::AudioNode => "AudioNode",
        }
    }
}

impl fmt::Display for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ctx| ctx.as_str() == s)
            .ok_or_else(|| format!("unknown host context '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    #[default]
    Regular,
    /// Arbitrary keyword arguments (`**kwargs`).
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub annotation: RuntimeType,
    pub has_default: bool,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, annotation: RuntimeType, has_default: bool) -> Self {
        Self { name: name.into(), annotation, has_default, kind: ParameterKind::Regular }
    }
}

/// What a function returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// A single value.
    Single(RuntimeType),
    /// Several named values, rendered as a `TypedDict`.
    Fields(IndexMap<String, RuntimeType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub returns: ReturnType,
}

/// Everything the engine knows about one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSignature {
    pub namespace: String,
    pub identifier: String,
    pub description: String,
    /// Functions per context, in registry order. Contexts without functions are absent.
    pub functions: IndexMap<HostContext, Vec<FunctionSignature>>,
}

impl PluginSignature {
    pub fn functions_in(&self, ctx: HostContext) -> &[FunctionSignature] {
        self.functions.get(&ctx).map_or(&[], Vec::as_slice)
    }
}

/// Whether `ns` can name a plugin in a stub: a Python identifier in ASCII.
pub fn is_valid_namespace(ns: &str) -> bool {
    let mut chars = ns.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Anything addressable by a plugin namespace.
pub trait HasNamespace {
    fn namespace(&self) -> &str;
}

impl HasNamespace for PluginSignature {
    fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Indexes values by namespace. Later values win on duplicates.
pub fn index_by_namespace<'a, T: HasNamespace>(
    items: impl IntoIterator<Item = &'a T>,
) -> IndexMap<&'a str, &'a T>
where
    T: 'a,
{
    items.into_iter().map(|item| (item.namespace(), item)).collect()
}
