// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Type translation engine.
//!
//! [`TypeTranslator`] maps a [`RuntimeType`] to the [`TypeDescriptor`] written
//! into the stubs. Translation is a pure function of `(type, is_return)`, so
//! results are memoized for the lifetime of the translator. The cache is
//! process-scoped in practice: the CLI owns a single translator per run and
//! clears it before exiting.

use std::collections::HashMap;

use crate::types::{CallbackRef, GenericOrigin, NodeKind, Primitive, RuntimeType, TypeDescriptor};

/// Hit/miss statistics of the translation cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

/// Memoizing translator from runtime annotations to stub descriptors.
#[derive(Debug, Default)]
pub struct TypeTranslator {
    cache: HashMap<(RuntimeType, bool), TypeDescriptor>,
    hits: u64,
    misses: u64,
}

impl TypeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates `ty`. `is_return` selects the concrete rendering of sequences.
    ///
    /// Total: unrecognized values come back as [`TypeDescriptor::Opaque`].
    pub fn translate(&mut self, ty: &RuntimeType, is_return: bool) -> TypeDescriptor {
        let key = (ty.clone(), is_return);
        if let Some(hit) = self.cache.get(&key) {
            self.hits += 1;
            return hit.clone();
        }

        self.misses += 1;
        let translated = self.translate_uncached(ty, is_return);
        self.cache.insert(key, translated.clone());
        translated
    }

    fn translate_uncached(&mut self, ty: &RuntimeType, is_return: bool) -> TypeDescriptor {
        match ty {
            RuntimeType::Int => return TypeDescriptor::Primitive(Primitive::IntLike),
            RuntimeType::Float => return TypeDescriptor::Primitive(Primitive::FloatLike),
            RuntimeType::VideoNode => return TypeDescriptor::Node(NodeKind::Video),
            RuntimeType::AudioNode => return TypeDescriptor::Node(NodeKind::Audio),
            _ => {},
        }

        match ty {
            RuntimeType::Union(members) => {
                let parsed: Vec<_> = members.iter().map(|m| self.translate(m, is_return)).collect();
                reconstruct_union(parsed)
            },
            RuntimeType::Generic { origin, args } => {
                let parsed: Vec<_> = args.iter().map(|a| self.translate(a, is_return)).collect();
                match origin {
                    GenericOrigin::Sequence => {
                        TypeDescriptor::Sequence { items: parsed, concrete: is_return }
                    },
                    GenericOrigin::Callable => TypeDescriptor::Callback(CallbackRef::Generic),
                    GenericOrigin::Other(_) => {
                        TypeDescriptor::Generic { origin: origin.clone(), args: parsed }
                    },
                }
            },
            other => TypeDescriptor::Opaque(other.clone()),
        }
    }

    pub fn cache_info(&self) -> CacheInfo {
        CacheInfo { hits: self.hits, misses: self.misses, size: self.cache.len() }
    }

    /// Drops every memoized entry and resets the statistics.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

fn reconstruct_union(mut parsed: Vec<TypeDescriptor>) -> TypeDescriptor {
    // A concrete function wrapper next to a callback marker is redundant.
    if parsed.len() >= 2 && parsed[0].is_opaque(&RuntimeType::Func) && parsed[1].is_callback() {
        parsed.remove(0);
        return TypeDescriptor::union(parsed);
    }

    if let Some((first, last)) = any_str_span(&parsed) {
        let mut collapsed = parsed[..first].to_vec();
        collapsed.push(TypeDescriptor::Primitive(Primitive::AnyStr));
        collapsed.extend_from_slice(&parsed[last + 1..]);
        return TypeDescriptor::union(collapsed);
    }

    TypeDescriptor::union(parsed)
}

/// Span covering the first to the last of `str`, `bytes` and `bytearray`,
/// present only when all three are members.
fn any_str_span(parsed: &[TypeDescriptor]) -> Option<(usize, usize)> {
    let find = |ty: RuntimeType| parsed.iter().position(|d| d.is_opaque(&ty));

    let positions =
        [find(RuntimeType::Str)?, find(RuntimeType::Bytes)?, find(RuntimeType::ByteArray)?];
    let first = positions.iter().copied().min()?;
    let last = positions.iter().copied().max()?;
    Some((first, last))
}
