//! Repository naming under the target registry

use crate::error::{RelocatorError, Result};
use crate::image::grammar::is_valid_repository;
use crate::image::{ImageReference, sanitize_registry_for_path};

pub const PREFIX_SOURCE_REGISTRY: &str = "prefix-source-registry";
pub const FLAT: &str = "flat";
pub const STRATEGY_NAMES: &[&str] = &[PREFIX_SOURCE_REGISTRY, FLAT];

/// Decides the repository an image gets under its new registry.
pub trait PathStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Repository path only; the registry and tag are attached by the caller.
    fn generate_path(&self, reference: &ImageReference) -> Result<String>;
}

/// `quay.io/prometheus/node-exporter` becomes `quayio/prometheus/node-exporter`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixSourceRegistry;

impl PathStrategy for PrefixSourceRegistry {
    fn name(&self) -> &'static str {
        PREFIX_SOURCE_REGISTRY
    }

    fn generate_path(&self, reference: &ImageReference) -> Result<String> {
        let prefix = sanitize_registry_for_path(&reference.registry);
        let repository = reference
            .repository
            .strip_prefix(&format!("{}/", reference.registry))
            .unwrap_or(&reference.repository);
        checked(self, reference, format!("{}/{}", prefix, repository))
    }
}

/// `quay.io/prometheus/node-exporter` becomes `quayio-prometheus-node-exporter`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl PathStrategy for Flat {
    fn name(&self) -> &'static str {
        FLAT
    }

    fn generate_path(&self, reference: &ImageReference) -> Result<String> {
        let prefix = sanitize_registry_for_path(&reference.registry);
        checked(
            self,
            reference,
            format!("{}-{}", prefix, reference.repository.replace('/', "-")),
        )
    }
}

fn checked(strategy: &dyn PathStrategy, reference: &ImageReference, path: String) -> Result<String> {
    if is_valid_repository(&path) {
        Ok(path)
    } else {
        Err(RelocatorError::Strategy(format!(
            "{} produced invalid repository '{}' for {}",
            strategy.name(),
            path,
            reference
        )))
    }
}

pub fn strategy_from_name(name: &str) -> Result<Box<dyn PathStrategy>> {
    match name.trim() {
        PREFIX_SOURCE_REGISTRY => Ok(Box::new(PrefixSourceRegistry)),
        FLAT => Ok(Box::new(Flat)),
        other => Err(RelocatorError::Strategy(format!(
            "unknown path strategy '{}' (expected one of: {})",
            other,
            STRATEGY_NAMES.join(", ")
        ))),
    }
}
