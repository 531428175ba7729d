// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! VapourSynth argument specification classifier.
//!
//! The host registry describes functions with strings such as
//! `clip:vnode;planes:int[]:opt;` and return specs such as `clip:vnode;`.
//! This module is the only place those strings are interpreted: it turns them
//! into [`RuntimeType`] annotations shaped the way the host's Python-facing
//! signatures annotate them, so the translator never sees registry syntax.

use indexmap::IndexMap;

use crate::error::SignatureError;
use crate::plugin::{FunctionSignature, HostContext, Parameter, ParameterKind, ReturnType};
use crate::types::RuntimeType;

/// Entry accepting arbitrary keyword arguments.
const ANY_ENTRY: &str = "any";

/// Parameter names that cannot be used verbatim in a stub.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// One `name:type[:flag...]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub type_name: String,
    pub is_array: bool,
    pub optional: bool,
    pub allow_empty: bool,
}

/// Parsed argument list of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgList {
    pub args: Vec<ArgSpec>,
    /// The list ends with `any`, accepting extra keyword arguments.
    pub var_keyword: bool,
}

/// Parses an argument specification string.
///
/// # Errors
///
/// Returns a [`SignatureError`] for entries without a type, empty names or
/// types, and duplicated argument names.
pub fn parse_arguments(spec: &str) -> Result<ArgList, SignatureError> {
    let mut list = ArgList::default();

    for entry in spec.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        if entry == ANY_ENTRY {
            list.var_keyword = true;
            continue;
        }

        let arg = parse_entry(entry)?;
        if list.args.iter().any(|a| a.name == arg.name) {
            return Err(SignatureError::DuplicateArgument { name: arg.name });
        }
        list.args.push(arg);
    }

    Ok(list)
}

fn parse_entry(entry: &str) -> Result<ArgSpec, SignatureError> {
    let mut parts = entry.split(':');
    let name = parts.next().unwrap_or_default();
    let Some(type_part) = parts.next() else {
        return Err(SignatureError::MalformedEntry { entry: entry.to_string() });
    };

    if name.is_empty() {
        return Err(SignatureError::EmptyPart { entry: entry.to_string(), part: "name" });
    }

    let (type_name, is_array) = match type_part.strip_suffix("[]") {
        Some(inner) => (inner, true),
        None => (type_part, false),
    };
    if type_name.is_empty() {
        return Err(SignatureError::EmptyPart { entry: entry.to_string(), part: "type" });
    }

    let mut arg = ArgSpec {
        name: name.to_string(),
        type_name: type_name.to_string(),
        is_array,
        optional: false,
        allow_empty: false,
    };
    for flag in parts {
        match flag {
            "opt" => arg.optional = true,
            "empty" => arg.allow_empty = true,
            other => tracing::debug!(entry, flag = other, "Ignoring unknown argument flag"),
        }
    }

    Ok(arg)
}

/// Annotation of a single value of a registry type, in parameter position.
fn scalar_annotation(type_name: &str) -> RuntimeType {
    match type_name {
        "int" => RuntimeType::Int,
        "float" => RuntimeType::Float,
        "data" => {
            RuntimeType::union([RuntimeType::Str, RuntimeType::Bytes, RuntimeType::ByteArray])
        },
        "vnode" => RuntimeType::VideoNode,
        "anode" => RuntimeType::AudioNode,
        "vframe" => RuntimeType::named("VideoFrame"),
        "aframe" => RuntimeType::named("AudioFrame"),
        "func" => RuntimeType::union([RuntimeType::Func, RuntimeType::any_callable()]),
        other => RuntimeType::named(other),
    }
}

/// Annotation of a parameter: `T`, `T | Sequence[T]` for arrays, plus `None` when optional.
pub fn parameter_annotation(arg: &ArgSpec) -> RuntimeType {
    let scalar = scalar_annotation(&arg.type_name);
    let base = if arg.is_array {
        RuntimeType::union([scalar.clone(), RuntimeType::sequence_of(scalar)])
    } else {
        scalar
    };

    if arg.optional {
        RuntimeType::union([base, RuntimeType::NoneType])
    } else {
        base
    }
}

/// Annotation of a returned value of a registry type.
fn return_value_annotation(arg: &ArgSpec) -> RuntimeType {
    let scalar = match arg.type_name.as_str() {
        "data" => RuntimeType::Bytes,
        "func" => RuntimeType::Func,
        other => scalar_annotation(other),
    };
    if arg.is_array {
        RuntimeType::sequence_of(scalar)
    } else {
        scalar
    }
}

/// Parses a return specification.
///
/// An empty spec or `any` returns `Any`; a single key returns that value;
/// several keys return a mapping rendered as a `TypedDict`.
///
/// # Errors
///
/// Returns a [`SignatureError`] when the spec is malformed.
pub fn parse_return(spec: &str) -> Result<ReturnType, SignatureError> {
    let list = parse_arguments(spec)?;

    if list.var_keyword || list.args.is_empty() {
        return Ok(ReturnType::Single(RuntimeType::named("Any")));
    }

    if let [single] = list.args.as_slice() {
        return Ok(ReturnType::Single(return_value_annotation(single)));
    }

    let fields: IndexMap<_, _> =
        list.args.iter().map(|arg| (arg.name.clone(), return_value_annotation(arg))).collect();
    Ok(ReturnType::Fields(fields))
}

/// Python-safe parameter name.
pub fn sanitize_name(name: &str) -> String {
    if PYTHON_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Classifies one registry function into its per-context signatures.
///
/// Every function is reachable from `Core`. A function whose first argument is
/// a video (audio) node is also bound to `VideoNode` (`AudioNode`), with that
/// argument supplied implicitly.
///
/// # Errors
///
/// Returns a [`SignatureError`] when either spec is malformed.
pub fn classify_function(
    name: &str,
    arguments: &str,
    returns: &str,
) -> Result<Vec<(HostContext, FunctionSignature)>, SignatureError> {
    let list = parse_arguments(arguments)?;
    let returns = parse_return(returns)?;

    let mut parameters: Vec<Parameter> = list
        .args
        .iter()
        .map(|arg| {
            Parameter::new(sanitize_name(&arg.name), parameter_annotation(arg), arg.optional)
        })
        .collect();
    if list.var_keyword {
        parameters.push(Parameter {
            name: "kwargs".into(),
            annotation: RuntimeType::named("Any"),
            has_default: false,
            kind: ParameterKind::VarKeyword,
        });
    }

    let full = FunctionSignature { name: name.to_string(), parameters, returns };

    let bound_ctx = list.args.first().and_then(|first| match first.type_name.as_str() {
        "vnode" => Some(HostContext::VideoNode),
        "anode" => Some(HostContext::AudioNode),
        _ => None,
    });

    let mut out = Vec::with_capacity(2);
    if let Some(ctx) = bound_ctx {
        let bound = FunctionSignature {
            name: full.name.clone(),
            parameters: full.parameters[1..].to_vec(),
            returns: full.returns.clone(),
        };
        out.push((HostContext::Core, full));
        out.push((ctx, bound));
    } else {
        out.push((HostContext::Core, full));
    }

    Ok(out)
}
