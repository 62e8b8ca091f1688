//! Building the override document from detection results

use super::strategy::PathStrategy;
use crate::detect::{DetectedImage, DetectionOutcome, RejectedCandidate, Shape};
use crate::error::{RelocatorError, Result};
use crate::image::parser::{DIGEST_FIELD, REGISTRY_FIELD, REPOSITORY_FIELD, TAG_FIELD};
use crate::registry::{MappingTarget, RegistryMappings};
use crate::tree::{self, Node, Path, Segment};
use log::{debug, warn};
use serde::Serialize;

/// One image successfully rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relocation {
    pub path: Path,
    pub from: String,
    pub to: String,
}

/// One image that could not be rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideFailure {
    pub path: Path,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideFile {
    /// Document to layer over the original values
    pub values: Node,
    pub relocations: Vec<Relocation>,
    pub rejected: Vec<RejectedCandidate>,
    pub failures: Vec<OverrideFailure>,
    pub eligible: usize,
    pub processed: usize,
}

impl OverrideFile {
    /// Percentage of eligible images that were rewritten; 100 when there were none.
    pub fn success_rate(&self) -> u8 {
        success_rate(self.processed, self.eligible)
    }
}

fn success_rate(processed: usize, eligible: usize) -> u8 {
    if eligible == 0 {
        100
    } else {
        (processed * 100 / eligible).min(100) as u8
    }
}

pub struct OverrideGenerator {
    target_registry: String,
    mappings: RegistryMappings,
    strategy: Box<dyn PathStrategy>,
    strict: bool,
    threshold: u8,
}

impl OverrideGenerator {
    pub fn new(target_registry: impl Into<String>, strategy: Box<dyn PathStrategy>) -> Self {
        Self {
            target_registry: target_registry.into().trim().trim_end_matches('/').to_string(),
            mappings: RegistryMappings::default(),
            strategy,
            strict: false,
            threshold: 0,
        }
    }

    pub fn with_mappings(mut self, mappings: RegistryMappings) -> Self {
        self.mappings = mappings;
        self
    }

    /// Abort on any rejected candidate.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Minimum percentage of eligible images that must be rewritten.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold.min(100);
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Build overrides for every detected image of `source`.
    ///
    /// Writes go to a fresh tree. Failures are collected per path and do not
    /// stop the remaining writes.
    pub fn generate(&self, source: &Node, outcome: &DetectionOutcome) -> Result<OverrideFile> {
        if self.strict && !outcome.rejected.is_empty() {
            return Err(RelocatorError::StrictViolation {
                count: outcome.rejected.len(),
                paths: outcome.rejected_paths(),
            });
        }
        for rejected in &outcome.rejected {
            warn!("Skipping {} ({}): {}", rejected.path, rejected.reason, rejected.detail);
        }

        let mut values = Node::empty_record();
        let mut relocations = Vec::new();
        let mut failures = Vec::new();

        for image in &outcome.detected {
            match self.relocate(source, &mut values, image) {
                Ok(relocation) => {
                    debug!("{}: {} -> {}", relocation.path, relocation.from, relocation.to);
                    relocations.push(relocation);
                }
                Err(err) => {
                    warn!("Could not override {}: {}", image.path, err);
                    failures.push(OverrideFailure {
                        path: image.path.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let eligible = outcome.detected.len();
        let processed = relocations.len();
        let rate = success_rate(processed, eligible);
        if rate < self.threshold {
            return Err(RelocatorError::Threshold {
                threshold: self.threshold,
                rate,
                eligible,
                processed,
            });
        }

        Ok(OverrideFile {
            values,
            relocations,
            rejected: outcome.rejected.clone(),
            failures,
            eligible,
            processed,
        })
    }

    fn relocate(&self, source: &Node, values: &mut Node, image: &DetectedImage) -> Result<Relocation> {
        let reference = &image.reference;
        let target = self.target_for(&reference.registry)?;

        let generated = self.strategy.generate_path(reference)?;
        let repository = match target.prefix {
            Some(prefix) => format!("{}/{}", prefix, generated),
            None => generated,
        };

        seed_outermost_list(source, values, &image.path)?;

        match image.shape {
            Shape::Map => {
                let mut fields = vec![
                    (REGISTRY_FIELD, target.registry.to_string()),
                    (REPOSITORY_FIELD, repository.clone()),
                ];
                match (&reference.digest, &reference.tag) {
                    (Some(digest), _) => fields.push((DIGEST_FIELD, digest.clone())),
                    (None, Some(tag)) => fields.push((TAG_FIELD, tag.clone())),
                    (None, None) => {}
                }
                for (field, value) in fields {
                    tree::set(values, &image.path.field(field), Node::from(value))?;
                }
            }
            Shape::String => {
                let relocated = reference.relocated(target.registry, &repository);
                tree::set(values, &image.path, Node::from(relocated))?;
            }
        }

        Ok(Relocation {
            path: image.path.clone(),
            from: reference.to_string(),
            to: reference.relocated(target.registry, &repository),
        })
    }

    fn target_for(&self, registry: &str) -> Result<MappingTarget<'_>> {
        if let Some(target) = self.mappings.target_for(registry) {
            return Ok(target);
        }
        if self.target_registry.is_empty() {
            return Err(RelocatorError::Config(format!(
                "no target registry configured for '{}'",
                registry
            )));
        }
        Ok(MappingTarget::parse(&self.target_registry))
    }
}

/// Lists are replaced wholesale when overrides are layered, and the accessor
/// never invents them, so the outermost list on `path` is copied from the
/// source before anything inside it is written.
fn seed_outermost_list(source: &Node, values: &mut Node, path: &Path) -> Result<()> {
    let Some(first_index) = path.segments().iter().position(Segment::is_index) else {
        return Ok(());
    };
    let list_path = path.prefix(first_index);

    if list_path.is_empty() {
        if !values.is_composite() || values.as_record().is_some_and(|r| r.is_empty()) {
            *values = source.clone();
        }
        return Ok(());
    }
    if tree::get(values, &list_path).is_ok() {
        return Ok(());
    }
    let list = tree::get(source, &list_path)?.clone();
    tree::set(values, &list_path, list)?;
    Ok(())
}
