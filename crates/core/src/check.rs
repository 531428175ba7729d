// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Consistency checking between an existing stub and a fresh rendering.
//!
//! Findings are advisory: [`CheckReport::log`] emits them as warnings and the
//! caller carries on.

use std::collections::BTreeSet;

use tracing::warn;

use crate::plugin::{index_by_namespace, HostContext};
use crate::render::Implementation;

/// A field of an [`Implementation`] that can differ between two renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckField {
    Functions,
    Description,
    ExtraTypes,
}

impl CheckField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Functions => "functions",
            Self::Description => "description",
            Self::ExtraTypes => "extra types",
        }
    }
}

impl std::fmt::Display for CheckField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Namespaces present only in the input document, sorted.
    pub only_in_input: Vec<String>,
    /// Namespaces present only in the fresh rendering, sorted.
    pub only_new: Vec<String>,
    /// `(namespace, field)` pairs that differ, sorted by namespace.
    pub differing: Vec<(String, CheckField)>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.only_in_input.is_empty() && self.only_new.is_empty() && self.differing.is_empty()
    }

    /// Emits every finding as a warning.
    pub fn log(&self) {
        if !self.only_in_input.is_empty() || !self.only_new.is_empty() {
            warn!(
                "Mismatched plugin(s): only in input={}, only new={}",
                join_or_none(&self.only_in_input),
                join_or_none(&self.only_new)
            );
        }
        for (ns, field) in &self.differing {
            warn!("For the plugin {ns}, the \"{field}\" differ.");
        }
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Compares the implementations of an input document with fresh ones.
///
/// Equality is structural: function lines per context (context order is
/// ignored), the description, and the extra type declarations. Descriptions
/// are only compared when both sides have `Core` functions.
pub fn compare(old: &[Implementation], new: &[Implementation]) -> CheckReport {
    let old_map = index_by_namespace(old);
    let new_map = index_by_namespace(new);

    let old_keys: BTreeSet<&str> = old_map.keys().copied().collect();
    let new_keys: BTreeSet<&str> = new_map.keys().copied().collect();

    let mut report = CheckReport {
        only_in_input: old_keys.difference(&new_keys).map(|s| (*s).to_string()).collect(),
        only_new: new_keys.difference(&old_keys).map(|s| (*s).to_string()).collect(),
        differing: Vec::new(),
    };

    for ns in old_keys.intersection(&new_keys) {
        let (Some(old), Some(new)) = (old_map.get(*ns), new_map.get(*ns)) else {
            continue;
        };
        // A stub stores the description in the Core attribute, which only
        // exists for plugins with Core functions.
        let has_core = |i: &Implementation| i.contexts().any(|c| c == HostContext::Core);
        let same_description =
            !(has_core(old) && has_core(new)) || old.description == new.description;
        let checks = [
            (CheckField::Functions, old.functions == new.functions),
            (CheckField::Description, same_description),
            (CheckField::ExtraTypes, old.extra_types == new.extra_types),
        ];
        for (field, same) in checks {
            if !same {
                report.differing.push(((*ns).to_string(), field));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn implementation(ns: &str, description: &str) -> Implementation {
        let mut functions = IndexMap::new();
        functions.insert(HostContext::Core, vec!["def F(self) -> Any: ...".to_string()]);
        Implementation {
            namespace: ns.into(),
            functions,
            description: description.into(),
            extra_types: Vec::new(),
        }
    }

    #[test]
    fn test_identical_sets_are_clean() {
        let old = vec![implementation("a", "A"), implementation("b", "B")];
        let new = vec![implementation("b", "B"), implementation("a", "A")];
        assert!(compare(&old, &new).is_clean());
    }

    #[test]
    fn test_reports_namespace_mismatch_sorted() {
        let old =
            vec![implementation("z", "Z"), implementation("shared", "S"), implementation("m", "M")];
        let new = vec![implementation("shared", "S"), implementation("new", "N")];
        let report = compare(&old, &new);
        assert_eq!(report.only_in_input, vec!["m", "z"]);
        assert_eq!(report.only_new, vec!["new"]);
        assert!(report.differing.is_empty());
    }

    #[test]
    fn test_reports_differing_fields() {
        let old = vec![implementation("a", "old description")];
        let mut changed = implementation("a", "new description");
        changed.extra_types.push("_X: TypeAlias = int".into());
        let report = compare(&old, &[changed]);
        assert_eq!(
            report.differing,
            vec![
                ("a".to_string(), CheckField::Description),
                ("a".to_string(), CheckField::ExtraTypes),
            ]
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_description_ignored_without_core_functions() {
        let old = Implementation { functions: IndexMap::new(), ..implementation("a", "") };
        let new = Implementation { functions: IndexMap::new(), ..implementation("a", "A plugin") };
        assert!(compare(&[old], &[new]).is_clean());

        let mut video_only = implementation("b", "");
        video_only.functions = IndexMap::new();
        video_only.functions.insert(HostContext::VideoNode, vec!["def G(self) -> Any: ...".into()]);
        let described = Implementation { description: "B plugin".into(), ..video_only.clone() };
        assert!(compare(&[video_only], &[described]).is_clean());
    }

    #[test]
    fn test_context_order_is_ignored() {
        let mut old = implementation("a", "A");
        old.functions.insert(HostContext::VideoNode, vec!["def G(self) -> Any: ...".into()]);
        let mut new = Implementation { functions: IndexMap::new(), ..old.clone() };
        new.functions.insert(HostContext::VideoNode, vec!["def G(self) -> Any: ...".into()]);
        new.functions.insert(HostContext::Core, vec!["def F(self) -> Any: ...".into()]);
        assert!(compare(&[old], &[new]).is_clean());
    }
}
