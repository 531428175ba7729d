// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Stub merge engine.
//!
//! [`StubMerge`] holds the ordered set of implementations a document should
//! contain and writes them back into a [`StubDocument`]. Regions are replaced
//! wholesale per namespace. Implementations taken from the input document are
//! copied byte-for-byte; only rendered ones produce new text.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::document::{Section, SectionKind, StubDocument};
use crate::render::Implementation;

/// Where the text of a region comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Copied verbatim from the input document.
    Existing,
    /// Rendered from a fresh [`Implementation`].
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEntry {
    pub implementation: Implementation,
    pub source: RegionSource,
}

fn namespace_order(a: &str, b: &str) -> Ordering {
    a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()).then_with(|| a.cmp(b))
}

/// Ordered namespace → implementation plan for one output document.
#[derive(Debug, Clone, Default)]
pub struct StubMerge {
    entries: IndexMap<String, MergeEntry>,
}

impl StubMerge {
    /// An empty plan: writing it clears every region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps every implementation of `doc`, in document order.
    pub fn from_document(doc: &StubDocument) -> Self {
        let entries = doc
            .implementations()
            .into_iter()
            .map(|implementation| {
                let entry = MergeEntry { implementation, source: RegionSource::Existing };
                (entry.implementation.namespace.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Replaces everything with `implementations`, sorted by namespace.
    pub fn replace_all(implementations: impl IntoIterator<Item = Implementation>) -> Self {
        let mut merge = Self::new();
        for implementation in implementations {
            merge.upsert(implementation);
        }
        merge.entries.sort_by(|a, _, b, _| namespace_order(a, b));
        merge
    }

    /// Inserts or replaces the region for `implementation.namespace`.
    ///
    /// A replaced region keeps its position. A new region is inserted before
    /// the first namespace that sorts after it, so existing order is kept.
    pub fn upsert(&mut self, implementation: Implementation) {
        let namespace = implementation.namespace.clone();
        let entry = MergeEntry { implementation, source: RegionSource::Rendered };

        if let Some(existing) = self.entries.get_mut(&namespace) {
            *existing = entry;
            return;
        }

        let index = self
            .entries
            .keys()
            .position(|k| namespace_order(k, &namespace) == Ordering::Greater)
            .unwrap_or(self.entries.len());
        self.entries.shift_insert(index, namespace, entry);
    }

    /// Removes the region for `namespace`, returning it if present.
    pub fn remove(&mut self, namespace: &str) -> Option<Implementation> {
        self.entries.shift_remove(namespace).map(|entry| entry.implementation)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.entries.contains_key(namespace)
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &MergeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the plan into `doc`, returning the new document text.
    ///
    /// Text outside the plugin sections is copied unchanged. Inside them, free
    /// text around kept regions stays where it was. A newly inserted
    /// implementation region is preceded by one blank line; new attribute
    /// regions are written back to back.
    pub fn write(&self, doc: &StubDocument) -> String {
        let lines = doc.lines();
        let mut out = String::new();
        let mut cursor = 0;

        for section in doc.sections() {
            out.extend(lines[cursor..=section.start].iter().map(String::as_str));
            if let Some(first) = section.regions.values().next() {
                out.push_str(&doc.gap_text(first));
            }

            let separator = match section.kind {
                SectionKind::Implementations => "\n",
                SectionKind::Bound(_) => "",
            };
            let mut written = 0;
            for entry in self.entries.values() {
                let Some(text) = region_text(doc, section, entry) else {
                    continue;
                };
                if written > 0 {
                    match section.regions.get_full(&entry.implementation.namespace) {
                        Some((index, _, region)) if index > 0 => {
                            out.push_str(&doc.gap_text(region));
                        },
                        _ => out.push_str(separator),
                    }
                }
                out.push_str(&text);
                written += 1;
            }

            out.push_str(&doc.trailing_text(section));
            cursor = section.end;
        }

        out.extend(lines[cursor..].iter().map(String::as_str));
        out
    }
}

/// Text of the region `entry` contributes to `section`, if any.
///
/// Existing entries are copied from `doc` when their region is present there.
fn region_text(doc: &StubDocument, section: &Section, entry: &MergeEntry) -> Option<String> {
    let implementation = &entry.implementation;
    if entry.source == RegionSource::Existing {
        if let Some(region) = section.regions.get(&implementation.namespace) {
            return Some(doc.region_text(region));
        }
    }
    match section.kind {
        SectionKind::Implementations => Some(implementation.as_stub()),
        SectionKind::Bound(ctx) => {
            implementation.contexts().any(|c| c == ctx).then(|| implementation.attribute_stub(ctx))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::HostContext;
    use crate::template::TEMPLATE;

    fn implementation(ns: &str, funcs: &[&str]) -> Implementation {
        let mut functions = IndexMap::new();
        functions.insert(
            HostContext::Core,
            funcs.iter().map(|f| format!("def {f}(self) -> Any: ...")).collect(),
        );
        Implementation {
            namespace: ns.into(),
            functions,
            description: format!("{ns} description"),
            extra_types: Vec::new(),
        }
    }

    fn template() -> StubDocument {
        StubDocument::parse(TEMPLATE).unwrap()
    }

    #[test]
    fn test_empty_plan_on_template_has_no_regions() {
        let doc = template();
        let text = StubMerge::new().write(&doc);
        assert_eq!(text, TEMPLATE);

        let reparsed = StubDocument::parse(&text).unwrap();
        assert!(reparsed.namespaces().is_empty());
    }

    #[test]
    fn test_replace_all_sorts_namespaces() {
        let doc = template();
        let merge = StubMerge::replace_all([
            implementation("std", &["A"]),
            implementation("Akarin", &["B"]),
            implementation("resize", &["C"]),
        ]);
        let text = merge.write(&doc);
        let reparsed = StubDocument::parse(&text).unwrap();
        assert_eq!(reparsed.namespaces(), vec!["Akarin", "resize", "std"]);

        let core = reparsed.section(SectionKind::Bound(HostContext::Core)).unwrap();
        assert_eq!(core.regions.keys().collect::<Vec<_>>(), vec!["Akarin", "resize", "std"]);
        let video = reparsed.section(SectionKind::Bound(HostContext::VideoNode)).unwrap();
        assert!(video.regions.is_empty());
    }

    #[test]
    fn test_upsert_inserts_in_sorted_position_keeping_existing_order() {
        let doc = template();
        let base =
            StubMerge::replace_all([implementation("b", &["X"]), implementation("d", &["Y"])]);
        let base_text = base.write(&doc);
        let base_doc = StubDocument::parse(&base_text).unwrap();

        let mut merge = StubMerge::from_document(&base_doc);
        merge.upsert(implementation("c", &["Z"]));
        assert_eq!(merge.namespaces(), vec!["b", "c", "d"]);

        let text = merge.write(&base_doc);
        let reparsed = StubDocument::parse(&text).unwrap();
        assert_eq!(reparsed.namespaces(), vec!["b", "c", "d"]);

        // Removing the new region again restores the original document.
        let mut merge = StubMerge::from_document(&reparsed);
        assert!(merge.remove("c").is_some());
        assert_eq!(merge.write(&reparsed), base_text);
    }

    #[test]
    fn test_existing_regions_are_copied_verbatim() {
        let hand_edited = TEMPLATE.replace(
            "# <plugins/implementations>\n",
            "# <plugins/implementations>\n\
             # <implementation/x>\n# hand written, kept as is\nclass _x:\n    pass\n\
             # </implementation/x>\n",
        );
        let doc = StubDocument::parse(&hand_edited).unwrap();

        let mut merge = StubMerge::from_document(&doc);
        merge.upsert(implementation("y", &["New"]));
        let text = merge.write(&doc);

        let kept = "# <implementation/x>\n# hand written, kept as is\nclass _x:\n    pass\n\
                    # </implementation/x>\n";
        assert!(text.contains(kept));
        assert!(text.contains("def New(self) -> Any: ..."));
    }

    fn annotated() -> String {
        TEMPLATE.replace(
            "# <plugins/implementations>\n",
            "# <plugins/implementations>\n\
             # header note\n\
             # <implementation/a>\nclass _a:\n    ...\n# </implementation/a>\n\
             \n\
             # keep this note\n\
             # <implementation/c>\nclass _c:\n    ...\n# </implementation/c>\n\
             # tail note\n",
        )
    }

    #[test]
    fn test_free_text_inside_sections_survives_unchanged_plan() {
        let text = annotated();
        let doc = StubDocument::parse(&text).unwrap();
        assert_eq!(StubMerge::from_document(&doc).write(&doc), text);
    }

    #[test]
    fn test_free_text_inside_sections_survives_add_and_remove() {
        let text = annotated();
        let doc = StubDocument::parse(&text).unwrap();

        let mut merge = StubMerge::from_document(&doc);
        merge.upsert(implementation("b", &["New"]));
        let added = merge.write(&doc);

        assert!(
            added.contains("# <plugins/implementations>\n# header note\n# <implementation/a>\n")
        );
        assert!(added.contains("# </implementation/a>\n\n# <implementation/b>\n"));
        assert!(
            added.contains("# </implementation/b>\n\n# keep this note\n# <implementation/c>\n")
        );
        assert!(
            added.contains("# </implementation/c>\n# tail note\n# </plugins/implementations>\n")
        );

        let added_doc = StubDocument::parse(&added).unwrap();
        assert_eq!(added_doc.namespaces(), vec!["a", "b", "c"]);
        let mut merge = StubMerge::from_document(&added_doc);
        assert!(merge.remove("b").is_some());
        assert_eq!(merge.write(&added_doc), text);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut merge = StubMerge::replace_all([
            implementation("a", &["One"]),
            implementation("b", &["Two"]),
            implementation("c", &["Three"]),
        ]);
        merge.upsert(implementation("b", &["Changed"]));
        assert_eq!(merge.namespaces(), vec!["a", "b", "c"]);
        let b = merge.entries().find(|e| e.implementation.namespace == "b").unwrap();
        assert_eq!(
            b.implementation.functions[&HostContext::Core],
            vec!["def Changed(self) -> Any: ..."]
        );
    }

    #[test]
    fn test_remove_missing_namespace() {
        let mut merge = StubMerge::new();
        assert!(merge.remove("nope").is_none());
        assert!(merge.is_empty());
    }
}
