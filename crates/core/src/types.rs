// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Type values that flow through the stub generator.
//!
//! This module defines the two type domains the engine works with:
//! - [`RuntimeType`]: the annotation a host function carries at runtime, as
//!   produced by the signature classifier
//! - [`TypeDescriptor`]: the translated, renderable form written into stubs
//!
//! Both render to stub-language text through [`std::fmt::Display`].

use std::fmt;

/// Origin of a parametrized generic annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericOrigin {
    /// `collections.abc.Sequence`
    Sequence,
    /// `collections.abc.Callable`
    Callable,
    /// Any other generic (`dict`, `tuple`, ...), kept by name.
    Other(String),
}

impl GenericOrigin {
    pub fn name(&self) -> &str {
        match self {
            Self::Sequence => "Sequence",
            Self::Callable => "Callable",
            Self::Other(name) => name,
        }
    }
}

/// A type annotation as the host runtime exposes it on a function signature.
///
/// This is a closed model of the open-ended runtime type domain. Anything the
/// classifier does not recognize ends up as [`RuntimeType::Named`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    Int,
    Float,
    Str,
    Bytes,
    ByteArray,
    NoneType,
    VideoNode,
    AudioNode,
    /// The host's concrete function wrapper class.
    Func,
    /// A plain class or alias without structure (`VideoFrame`, `Any`, ...).
    Named(String),
    Union(Vec<RuntimeType>),
    Generic { origin: GenericOrigin, args: Vec<RuntimeType> },
}

impl RuntimeType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn sequence_of(item: Self) -> Self {
        Self::Generic { origin: GenericOrigin::Sequence, args: vec![item] }
    }

    /// `Callable[..., Any]`
    pub fn any_callable() -> Self {
        Self::Generic {
            origin: GenericOrigin::Callable,
            args: vec![Self::named("..."), Self::named("Any")],
        }
    }

    /// Builds a union, flattening nested unions the way the host's `|` operator does.
    pub fn union(members: impl IntoIterator<Item = Self>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::Union(inner) => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                },
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                },
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Union(flat)
        }
    }

    /// Whether the value has structural arguments the translator recurses into.
    pub const fn is_decomposable(&self) -> bool {
        matches!(self, Self::Union(_) | Self::Generic { .. })
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Bytes => f.write_str("bytes"),
            Self::ByteArray => f.write_str("bytearray"),
            Self::NoneType => f.write_str("None"),
            Self::VideoNode => f.write_str("VideoNode"),
            Self::AudioNode => f.write_str("AudioNode"),
            Self::Func => f.write_str("Func"),
            Self::Named(name) => f.write_str(name),
            Self::Union(members) => write_joined(f, members, " | "),
            Self::Generic { origin, args } => {
                write!(f, "{}[", origin.name())?;
                write_joined(f, args, ", ")?;
                f.write_str("]")
            },
        }
    }
}

/// Runtime-only aliases written into the stub prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Anything accepted by the integer coercion protocol.
    IntLike,
    /// Anything accepted by the float coercion protocol.
    FloatLike,
    /// Any string-like value (`str`, `bytes`, `bytearray`).
    AnyStr,
}

impl Primitive {
    pub const fn stub_name(self) -> &'static str {
        match self {
            Self::IntLike => "_IntLike",
            Self::FloatLike => "_FloatLike",
            Self::AnyStr => "_AnyStr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Video,
    Audio,
}

impl NodeKind {
    pub const fn stub_name(self) -> &'static str {
        match self {
            Self::Video => "VideoNode",
            Self::Audio => "AudioNode",
        }
    }
}

/// Reference to a callback type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallbackRef {
    /// The generic marker, replaced per call site by the renderer.
    Generic,
    /// A call-site specific alias name.
    Named(String),
}

/// Generic callback marker name.
pub const GENERIC_CALLBACK: &str = "_VSCallback";

/// Abstract sequence alias used for parameters.
pub const SEQUENCE_LIKE: &str = "_SequenceLike";

/// A translated type, ready to be written into a stub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Node(NodeKind),
    Union(Vec<TypeDescriptor>),
    /// `concrete` renders `list[...]` (return position), otherwise `_SequenceLike[...]`.
    Sequence { items: Vec<TypeDescriptor>, concrete: bool },
    Callback(CallbackRef),
    Generic { origin: GenericOrigin, args: Vec<TypeDescriptor> },
    /// Unrecognized input, rendered verbatim.
    Opaque(RuntimeType),
}

impl TypeDescriptor {
    /// Builds a union; a single member stands for itself.
    pub fn union(mut members: Vec<Self>) -> Self {
        if members.len() == 1 {
            members.remove(0)
        } else {
            Self::Union(members)
        }
    }

    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }

    pub fn is_opaque(&self, ty: &RuntimeType) -> bool {
        matches!(self, Self::Opaque(inner) if inner == ty)
    }

    /// Whether any generic callback marker remains anywhere in the tree.
    pub fn contains_generic_callback(&self) -> bool {
        match self {
            Self::Callback(CallbackRef::Generic) => true,
            Self::Union(members) | Self::Sequence { items: members, .. } => {
                members.iter().any(Self::contains_generic_callback)
            },
            Self::Generic { args, .. } => args.iter().any(Self::contains_generic_callback),
            _ => false,
        }
    }

    /// Replaces every generic callback marker with a named alias.
    #[must_use]
    pub fn with_callback_name(&self, name: &str) -> Self {
        match self {
            Self::Callback(CallbackRef::Generic) => Self::Callback(CallbackRef::Named(name.into())),
            Self::Union(members) => {
                Self::Union(members.iter().map(|m| m.with_callback_name(name)).collect())
            },
            Self::Sequence { items, concrete } => Self::Sequence {
                items: items.iter().map(|m| m.with_callback_name(name)).collect(),
                concrete: *concrete,
            },
            Self::Generic { origin, args } => Self::Generic {
                origin: origin.clone(),
                args: args.iter().map(|m| m.with_callback_name(name)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.stub_name()),
            Self::Node(kind) => f.write_str(kind.stub_name()),
            Self::Union(members) => write_joined(f, members, " | "),
            Self::Sequence { items, concrete } => {
                f.write_str(if *concrete { "list" } else { SEQUENCE_LIKE })?;
                f.write_str("[")?;
                write_joined(f, items, ", ")?;
                f.write_str("]")
            },
            Self::Callback(CallbackRef::Generic) => f.write_str(GENERIC_CALLBACK),
            Self::Callback(CallbackRef::Named(name)) => f.write_str(name),
            Self::Generic { origin, args } => {
                write!(f, "{}[", origin.name())?;
                write_joined(f, args, ", ")?;
                f.write_str("]")
            },
            Self::Opaque(ty) => write!(f, "{ty}"),
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_flattens_and_dedups() {
        let inner = RuntimeType::union([RuntimeType::Str, RuntimeType::Bytes]);
        let outer = RuntimeType::union([inner, RuntimeType::Bytes, RuntimeType::NoneType]);
        assert_eq!(
            outer,
            RuntimeType::Union(vec![RuntimeType::Str, RuntimeType::Bytes, RuntimeType::NoneType])
        );
    }

    #[test]
    fn test_single_member_union_collapses() {
        assert_eq!(RuntimeType::union([RuntimeType::Int]), RuntimeType::Int);
        let d = TypeDescriptor::union(vec![TypeDescriptor::Node(NodeKind::Video)]);
        assert_eq!(d, TypeDescriptor::Node(NodeKind::Video));
    }

    #[test]
    fn test_runtime_type_display() {
        let ty = RuntimeType::union([
            RuntimeType::VideoNode,
            RuntimeType::sequence_of(RuntimeType::VideoNode),
            RuntimeType::NoneType,
        ]);
        assert_eq!(ty.to_string(), "VideoNode | Sequence[VideoNode] | None");
        assert_eq!(RuntimeType::any_callable().to_string(), "Callable[..., Any]");
    }

    #[test]
    fn test_descriptor_display() {
        let d = TypeDescriptor::Union(vec![
            TypeDescriptor::Primitive(Primitive::IntLike),
            TypeDescriptor::Sequence {
                items: vec![TypeDescriptor::Primitive(Primitive::IntLike)],
                concrete: false,
            },
            TypeDescriptor::Opaque(RuntimeType::NoneType),
        ]);
        assert_eq!(d.to_string(), "_IntLike | _SequenceLike[_IntLike] | None");

        let list = TypeDescriptor::Sequence {
            items: vec![TypeDescriptor::Node(NodeKind::Audio)],
            concrete: true,
        };
        assert_eq!(list.to_string(), "list[AudioNode]");
    }

    #[test]
    fn test_callback_name_substitution_recurses() {
        let d = TypeDescriptor::Union(vec![
            TypeDescriptor::Callback(CallbackRef::Generic),
            TypeDescriptor::Sequence {
                items: vec![TypeDescriptor::Callback(CallbackRef::Generic)],
                concrete: false,
            },
        ]);
        assert!(d.contains_generic_callback());
        let named = d.with_callback_name("_VSCallback_std_Lut_function");
        assert!(!named.contains_generic_callback());
        assert_eq!(
            named.to_string(),
            "_VSCallback_std_Lut_function | _SequenceLike[_VSCallback_std_Lut_function]"
        );
    }
}
