// SPDX-FileCopyrightText: © 2025 StreamKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Stub document model.
//!
//! A stub document is plain text with sentinel comment lines:
//!
//! ```text
//! # <plugins/implementations>
//! # <implementation/std>
//! ...
//! # </implementation/std>
//! # </plugins/implementations>
//!
//! class Core:
//!     # <plugins/bound/Core>
//!     # <attribute/Core_bound/std>
//!     ...
//!     # </attribute/Core_bound/std>
//!     # </plugins/bound/Core>
//! ```
//!
//! [`StubDocument`] indexes those markers by line span. Only whole lines count
//! as markers, so a namespace mentioned inside a declaration never splits a
//! region.

use indexmap::IndexMap;

use crate::error::DocumentError;
use crate::plugin::{is_valid_namespace, HostContext};
use crate::render::{parse_attribute_description, Implementation};

pub const IMPLEMENTATIONS_SECTION: &str = "plugins/implementations";

fn bound_section(ctx: HostContext) -> String {
    format!("plugins/bound/{ctx}")
}

/// Which section a region lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Implementations,
    Bound(HostContext),
}

impl SectionKind {
    pub fn name(self) -> String {
        match self {
            Self::Implementations => IMPLEMENTATIONS_SECTION.to_string(),
            Self::Bound(ctx) => bound_section(ctx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    SectionStart(SectionKind),
    SectionEnd(SectionKind),
    RegionStart(SectionKind, String),
    RegionEnd(SectionKind, String),
}

fn parse_marker(line: &str) -> Option<Marker> {
    let inner = line.trim().strip_prefix("# <")?.strip_suffix('>')?;
    let (closing, path) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    let section = |kind| {
        if closing {
            Marker::SectionEnd(kind)
        } else {
            Marker::SectionStart(kind)
        }
    };
    let region = |kind, ns: &str| {
        if closing {
            Marker::RegionEnd(kind, ns.to_string())
        } else {
            Marker::RegionStart(kind, ns.to_string())
        }
    };

    if path == IMPLEMENTATIONS_SECTION {
        return Some(section(SectionKind::Implementations));
    }
    if let Some(ctx) = path.strip_prefix("plugins/bound/") {
        return ctx.parse::<HostContext>().ok().map(|ctx| section(SectionKind::Bound(ctx)));
    }
    if let Some(ns) = path.strip_prefix("implementation/") {
        return is_valid_namespace(ns).then(|| region(SectionKind::Implementations, ns));
    }
    if let Some(rest) = path.strip_prefix("attribute/") {
        let (ctx, ns) = rest.split_once("_bound/")?;
        let ctx = ctx.parse::<HostContext>().ok()?;
        return is_valid_namespace(ns).then(|| region(SectionKind::Bound(ctx), ns));
    }
    None
}

/// A delimited region. `start` and `end` are the marker line indices.
///
/// `gap_start` is the first line after the previous region (or after the
/// section marker), so `gap_start..start` holds the free text leading up to
/// this region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub namespace: String,
    pub gap_start: usize,
    pub start: usize,
    pub end: usize,
}

/// A delimited section holding regions.
///
/// `trailing_start..end` holds the free text after the last region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
    pub trailing_start: usize,
    pub regions: IndexMap<String, Region>,
}

/// A stub document indexed by line spans.
#[derive(Debug, Clone)]
pub struct StubDocument {
    lines: Vec<String>,
    sections: Vec<Section>,
}

impl StubDocument {
    /// Indexes `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] for unbalanced, misplaced or duplicated
    /// markers, or when the implementations section is missing.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        let mut sections: Vec<Section> = Vec::new();
        let mut open_section: Option<Section> = None;
        let mut open_region: Option<(SectionKind, String, usize, usize)> = None;
        // First line not yet claimed by a marker or a region.
        let mut boundary = 0;

        for (index, line) in lines.iter().enumerate() {
            let Some(marker) = parse_marker(line) else {
                continue;
            };
            let line_no = index + 1;
            let misplaced = || DocumentError::MisplacedMarker {
                line: line_no,
                marker: line.trim().to_string(),
            };
            let unbalanced = || DocumentError::UnbalancedMarker {
                line: line_no,
                marker: line.trim().to_string(),
            };

            match marker {
                Marker::SectionStart(kind) => {
                    if open_section.is_some() || sections.iter().any(|s| s.kind == kind) {
                        return Err(misplaced());
                    }
                    open_section = Some(Section {
                        kind,
                        start: index,
                        end: index,
                        trailing_start: index + 1,
                        regions: IndexMap::new(),
                    });
                    boundary = index + 1;
                },
                Marker::SectionEnd(kind) => {
                    if open_region.is_some() {
                        return Err(unbalanced());
                    }
                    match open_section.take() {
                        Some(mut section) if section.kind == kind => {
                            section.end = index;
                            section.trailing_start = boundary;
                            sections.push(section);
                        },
                        _ => return Err(unbalanced()),
                    }
                },
                Marker::RegionStart(kind, namespace) => {
                    let Some(section) = open_section.as_ref() else {
                        return Err(misplaced());
                    };
                    if section.kind != kind || open_region.is_some() {
                        return Err(misplaced());
                    }
                    if section.regions.contains_key(&namespace) {
                        return Err(DocumentError::DuplicateRegion { line: line_no, namespace });
                    }
                    open_region = Some((kind, namespace, index, boundary));
                },
                Marker::RegionEnd(kind, namespace) => match open_region.take() {
                    Some((open_kind, open_ns, start, gap_start))
                        if open_kind == kind && open_ns == namespace =>
                    {
                        if let Some(section) = open_section.as_mut() {
                            let region = Region {
                                namespace: namespace.clone(),
                                gap_start,
                                start,
                                end: index,
                            };
                            section.regions.insert(namespace, region);
                        }
                        boundary = index + 1;
                    },
                    _ => return Err(unbalanced()),
                },
            }
        }

        if let Some((kind, namespace, start, _)) = open_region {
            let marker = match kind {
                SectionKind::Implementations => crate::render::implementation_start(&namespace),
                SectionKind::Bound(ctx) => crate::render::attribute_start(ctx, &namespace),
            };
            return Err(DocumentError::UnbalancedMarker {
                line: start + 1,
                marker: marker.trim().to_string(),
            });
        }
        if let Some(section) = open_section {
            return Err(DocumentError::UnbalancedMarker {
                line: section.start + 1,
                marker: format!("# <{}>", section.kind.name()),
            });
        }
        if !sections.iter().any(|s| s.kind == SectionKind::Implementations) {
            return Err(DocumentError::MissingSection { section: IMPLEMENTATIONS_SECTION.into() });
        }

        sections.sort_by_key(|s| s.start);
        Ok(Self { lines, sections })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Region lines between the markers.
    pub fn region_body(&self, region: &Region) -> Vec<&str> {
        self.lines[region.start + 1..region.end].iter().map(String::as_str).collect()
    }

    /// Region text including both markers, always newline terminated.
    pub fn region_text(&self, region: &Region) -> String {
        let mut text: String = self.lines[region.start..=region.end].concat();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }

    /// Free text between the previous region (or the section marker) and `region`.
    pub fn gap_text(&self, region: &Region) -> String {
        self.lines[region.gap_start..region.start].concat()
    }

    /// Free text between the last region and the closing marker of `section`.
    pub fn trailing_text(&self, section: &Section) -> String {
        self.lines[section.trailing_start..section.end].concat()
    }

    /// Namespaces of the implementation regions, in document order.
    pub fn namespaces(&self) -> Vec<&str> {
        self.section(SectionKind::Implementations)
            .map(|s| s.regions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Parses every implementation region back into an [`Implementation`].
    ///
    /// Descriptions come from the `Core` attribute regions.
    pub fn implementations(&self) -> Vec<Implementation> {
        let Some(section) = self.section(SectionKind::Implementations) else {
            return Vec::new();
        };
        let core = self.section(SectionKind::Bound(HostContext::Core));

        section
            .regions
            .values()
            .map(|region| {
                let mut implementation =
                    Implementation::parse(&region.namespace, &self.region_body(region));
                if let Some(description) = core
                    .and_then(|core| core.regions.get(&region.namespace))
                    .and_then(|attr| parse_attribute_description(&self.region_body(attr)))
                {
                    implementation.description = description;
                }
                implementation
            })
            .collect()
    }
}
