//! Schema-less detection of image references in a values tree
//!
//! [`Detector`] walks a [`Node`] tree depth-first. Records with a
//! `repository` key are image declarations and are never descended into;
//! string leaves are tried when the [`PathClassifier`] marks their location as
//! image-bearing or the value itself looks like an image literal. Every match
//! carries an owned [`Path`] so it can later be written back with
//! [`crate::tree::set`].

pub mod classifier;
pub mod detector;

pub use classifier::{PathClass, PathClassifier, PathPatterns};
pub use detector::Detector;

use crate::image::grammar::is_valid_tag;
use crate::image::{ImageReference, canonical_registry};
use crate::tree::{Node, Path};
use log::warn;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Filters and policy for one detection pass.
#[derive(Debug, Clone, Default)]
pub struct DetectionConfig {
    source_registries: BTreeSet<String>,
    exclude_registries: BTreeSet<String>,
    strict: bool,
    fallback_tag: Option<String>,
    global_registry_override: Option<String>,
}

impl DetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only references from these registries are accepted. Empty means any.
    pub fn with_source_registries<I, S>(mut self, registries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.source_registries = registries
            .into_iter()
            .map(|r| canonical_registry(r.as_ref()))
            .collect();
        self
    }

    pub fn with_exclude_registries<I, S>(mut self, registries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_registries = registries
            .into_iter()
            .map(|r| canonical_registry(r.as_ref()))
            .collect();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Version used instead of `latest` when a reference has no tag or digest.
    /// Blank values and values outside the tag grammar are ignored.
    pub fn with_fallback_tag(mut self, tag: Option<String>) -> Self {
        self.fallback_tag = tag
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .filter(|t| {
                let valid = is_valid_tag(t);
                if !valid {
                    warn!("Ignoring invalid fallback tag '{}'", t);
                }
                valid
            });
        self
    }

    pub fn source_registries(&self) -> &BTreeSet<String> {
        &self.source_registries
    }

    pub fn exclude_registries(&self) -> &BTreeSet<String> {
        &self.exclude_registries
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn fallback_tag(&self) -> Option<&str> {
        self.fallback_tag.as_deref()
    }

    /// Registry discovered from the tree during the current pass.
    pub fn global_registry_override(&self) -> Option<&str> {
        self.global_registry_override.as_deref()
    }

    pub(crate) fn set_global_registry_override(&mut self, registry: Option<String>) {
        self.global_registry_override = registry;
    }

    /// Exclusion first, then the source allow-list.
    pub(crate) fn filter(&self, registry: &str) -> Option<RejectReason> {
        let registry = canonical_registry(registry);
        if self.exclude_registries.contains(&registry) {
            Some(RejectReason::ExcludedRegistry)
        } else if !self.source_registries.is_empty() && !self.source_registries.contains(&registry) {
            Some(RejectReason::NonSourceRegistry)
        } else {
            None
        }
    }
}

/// How the image was declared in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Record with `registry`/`repository`/`tag`/`digest` fields
    Map,
    /// Single string
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedImage {
    pub reference: ImageReference,
    pub path: Path,
    pub shape: Shape,
    /// Leaf value exactly as found
    pub source: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    TypeMismatch,
    AmbiguousFormat,
    InvalidField,
    NonSourceRegistry,
    ExcludedRegistry,
    TemplatePlaceholder,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::TypeMismatch => "type mismatch",
            RejectReason::AmbiguousFormat => "ambiguous format",
            RejectReason::InvalidField => "invalid field",
            RejectReason::NonSourceRegistry => "non-source registry",
            RejectReason::ExcludedRegistry => "excluded registry",
            RejectReason::TemplatePlaceholder => "template placeholder",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCandidate {
    pub path: Path,
    pub reason: RejectReason,
    pub detail: String,
}

/// Result of one pass, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionOutcome {
    pub detected: Vec<DetectedImage>,
    pub rejected: Vec<RejectedCandidate>,
    /// Registry that replaced the hub default during this pass, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_registry: Option<String>,
}

impl DetectionOutcome {
    pub fn has_type_mismatches(&self) -> bool {
        self.rejected
            .iter()
            .any(|r| r.reason == RejectReason::TypeMismatch)
    }

    /// Comma-separated rejected paths, for summaries.
    pub fn rejected_paths(&self) -> String {
        self.rejected
            .iter()
            .map(|r| r.path.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
