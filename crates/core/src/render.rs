// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Signature rendering.
//!
//! Turns [`PluginSignature`]s into [`Implementation`]s: the exact declaration
//! lines written into a stub region, plus the extra type declarations those
//! lines refer to. Rendering is deterministic so that check mode can compare
//! a fresh rendering with what an existing stub contains.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::plugin::{
    FunctionSignature, HasNamespace, HostContext, ParameterKind, PluginSignature, ReturnType,
};
use crate::translate::TypeTranslator;
use crate::types::{RuntimeType, GENERIC_CALLBACK};

const INDENT: &str = "    ";

/// Decorator placed on every bound function.
pub const FUNCTION_DECORATOR: &str = "@_Wrapper.Function";

/// Region markers for plugin implementations.
pub fn implementation_start(namespace: &str) -> String {
    format!("# <implementation/{namespace}>")
}

pub fn implementation_end(namespace: &str) -> String {
    format!("# </implementation/{namespace}>")
}

/// Region markers for the attribute a context exposes a plugin through.
pub fn attribute_start(ctx: HostContext, namespace: &str) -> String {
    format!("{INDENT}# <attribute/{ctx}_bound/{namespace}>")
}

pub fn attribute_end(ctx: HostContext, namespace: &str) -> String {
    format!("{INDENT}# </attribute/{ctx}_bound/{namespace}>")
}

/// Alias name for a callback parameter at one call site.
pub fn callback_alias(namespace: &str, function: &str, param: &str) -> String {
    format!("{GENERIC_CALLBACK}_{namespace}_{function}_{param}")
}

/// Name of the `TypedDict` describing a multi-value return.
pub fn return_dict_name(namespace: &str, function: &str) -> String {
    format!("_ReturnDict_{namespace}_{function}")
}

/// Known callback signatures, keyed by `namespace.function.parameter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownCallbacks {
    signatures: BTreeMap<String, String>,
}

impl KnownCallbacks {
    /// Callback signatures of the core plugins.
    pub fn builtin() -> Self {
        let signatures = [
            ("std.FrameEval.eval", "Callable[..., VideoNode]"),
            ("std.ModifyFrame.selector", "Callable[..., VideoFrame]"),
            ("std.Lut.function", "Callable[[int], int | float]"),
            ("std.Lut2.function", "Callable[[int, int], int | float]"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { signatures }
    }

    /// Adds or overrides entries.
    #[must_use]
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = (String, String)>) -> Self {
        self.signatures.extend(overrides);
        self
    }

    pub fn get(&self, namespace: &str, function: &str, param: &str) -> Option<&str> {
        self.signatures.get(&format!("{namespace}.{function}.{param}")).map(String::as_str)
    }
}

/// Rendered declarations for one plugin namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Implementation {
    pub namespace: String,
    /// Declaration lines per context, without indentation or decorator.
    pub functions: IndexMap<HostContext, Vec<String>>,
    pub description: String,
    /// Type declarations the function lines refer to.
    pub extra_types: Vec<String>,
}

impl Implementation {
    /// The implementation region, markers included, ending with a newline.
    pub fn as_stub(&self) -> String {
        let mut stub = vec![implementation_start(&self.namespace)];

        if !self.extra_types.is_empty() {
            stub.push(self.extra_types.join("\n") + "\n");
        }

        stub.push(format!("class _{}:", self.namespace));

        if self.functions.is_empty() {
            stub.push(format!("{INDENT}...\n"));
        }

        for (ctx, funcs) in &self.functions {
            stub.push(format!("{INDENT}class _{ctx}_bound:"));
            stub.push(format!("{INDENT}{INDENT}class Plugin(_VSPlugin):"));
            for func in funcs {
                stub.push(format!("{INDENT}{INDENT}{INDENT}{FUNCTION_DECORATOR}"));
                stub.push(format!("{INDENT}{INDENT}{INDENT}{func}"));
            }
            if let Some(last) = stub.last_mut() {
                last.push('\n');
            }
        }

        stub.push(implementation_end(&self.namespace));

        stub.join("\n") + "\n"
    }

    /// The attribute region exposing this plugin on `ctx`, ending with a newline.
    pub fn attribute_stub(&self, ctx: HostContext) -> String {
        let ns = &self.namespace;
        let mut out = String::new();
        let _ = writeln!(out, "{}", attribute_start(ctx, ns));
        let _ = writeln!(out, "{INDENT}{ns}: Final[_{ns}._{ctx}_bound.Plugin]");
        let _ = writeln!(out, "{INDENT}\"\"\"{}\"\"\"", escape_docstring(&self.description));
        let _ = writeln!(out, "{}", attribute_end(ctx, ns));
        out
    }

    /// Contexts this plugin is reachable from.
    pub fn contexts(&self) -> impl Iterator<Item = HostContext> + '_ {
        self.functions.iter().filter(|(_, f)| !f.is_empty()).map(|(ctx, _)| *ctx)
    }

    /// Parses the body of an implementation region (markers excluded).
    ///
    /// The description is not part of the region; callers fill it from the
    /// `Core` attribute region via [`parse_attribute_description`].
    pub fn parse(namespace: &str, body: &[&str]) -> Self {
        let class_header = format!("class _{namespace}:");
        let mut implementation = Self { namespace: namespace.to_string(), ..Self::default() };

        let mut in_class = false;
        let mut current: Option<HostContext> = None;

        for raw in body {
            let line = raw.trim_end_matches(['\n', '\r']);
            if !in_class {
                if line == class_header {
                    in_class = true;
                } else if !line.trim().is_empty() {
                    implementation.extra_types.push(line.to_string());
                }
                continue;
            }

            let trimmed = line.trim();
            if let Some(ctx) = trimmed
                .strip_prefix("class _")
                .and_then(|rest| rest.strip_suffix("_bound:"))
                .and_then(|name| name.parse::<HostContext>().ok())
            {
                implementation.functions.entry(ctx).or_default();
                current = Some(ctx);
            } else if trimmed.starts_with("def ") {
                if let Some(ctx) = current {
                    implementation.functions.entry(ctx).or_default().push(trimmed.to_string());
                }
            }
        }

        implementation
    }
}

impl HasNamespace for Implementation {
    fn namespace(&self) -> &str {
        &self.namespace
    }
}

fn escape_docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape_docstring(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Extracts the docstring from the body of an attribute region.
pub fn parse_attribute_description(body: &[&str]) -> Option<String> {
    body.iter().find_map(|line| {
        let inner = line.trim().strip_prefix("\"\"\"")?.strip_suffix("\"\"\"")?;
        Some(unescape_docstring(inner))
    })
}

/// Builds [`Implementation`]s from plugin signatures.
pub struct Renderer<'a> {
    translator: &'a mut TypeTranslator,
    callbacks: &'a KnownCallbacks,
}

impl<'a> Renderer<'a> {
    pub fn new(translator: &'a mut TypeTranslator, callbacks: &'a KnownCallbacks) -> Self {
        Self { translator, callbacks }
    }

    /// Renders every function of `plugin` in every context it is bound to.
    pub fn construct_implementation(&mut self, plugin: &PluginSignature) -> Implementation {
        let mut extra_types = Vec::new();
        let mut functions = IndexMap::new();

        for (ctx, funcs) in &plugin.functions {
            let lines: Vec<_> = funcs
                .iter()
                .map(|func| self.render_function(&plugin.namespace, func, &mut extra_types))
                .collect();
            functions.insert(*ctx, lines);
        }

        Implementation {
            namespace: plugin.namespace.clone(),
            functions,
            description: plugin.description.clone(),
            extra_types,
        }
    }

    /// Renders one declaration line, appending any type it needs to `extra_types`.
    pub fn render_function(
        &mut self,
        namespace: &str,
        func: &FunctionSignature,
        extra_types: &mut Vec<String>,
    ) -> String {
        let mut params = vec!["self".to_string()];

        for param in &func.parameters {
            if param.kind == ParameterKind::VarKeyword {
                params.push(format!("**{}: {}", param.name, param.annotation));
                continue;
            }

            let mut annotation = self.translator.translate(&param.annotation, false);
            if annotation.contains_generic_callback() {
                let alias = callback_alias(namespace, &func.name, &param.name);
                let signature = self
                    .callbacks
                    .get(namespace, &func.name, &param.name)
                    .unwrap_or(GENERIC_CALLBACK);
                push_unique(extra_types, format!("{alias}: TypeAlias = {signature}"));
                annotation = annotation.with_callback_name(&alias);
            }

            let default = if param.has_default { " = None" } else { "" };
            params.push(format!("{}: {annotation}{default}", param.name));
        }

        let returns = match &func.returns {
            ReturnType::Single(ty) => self.translator.translate(ty, true).to_string(),
            ReturnType::Fields(fields) => {
                let name = return_dict_name(namespace, &func.name);
                push_unique(extra_types, self.typed_dict(&name, fields));
                name
            },
        };

        format!("def {}({}) -> {returns}: ...", func.name, params.join(", "))
    }

    fn typed_dict(&mut self, name: &str, fields: &IndexMap<String, RuntimeType>) -> String {
        let body = fields
            .iter()
            .map(|(key, ty)| {
                let rendered = if ty.is_decomposable() {
                    self.translator.translate(ty, true).to_string()
                } else {
                    ty.to_string()
                };
                format!("\"{key}\": {rendered}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{name} = TypedDict(\"{name}\", {{{body}}})")
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
