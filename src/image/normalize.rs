//! Registry canonicalization and reference defaulting

use super::reference::{ImageReference, ParsedReference};

/// Canonical hub registry.
pub const DEFAULT_REGISTRY: &str = "docker.io";
/// Namespace implied for single-segment repositories on the hub.
pub const LIBRARY_NAMESPACE: &str = "library";
pub const DEFAULT_TAG: &str = "latest";

/// Alternate spellings of the hub registry.
pub const HUB_ALIASES: &[&str] = &[
    "docker.io",
    "index.docker.io",
    "registry-1.docker.io",
    "registry.hub.docker.com",
];

/// Inputs that are not part of the reference text itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions<'a> {
    /// Registry used when the reference names none, instead of the hub.
    pub global_registry: Option<&'a str>,
    /// Version used when neither tag nor digest is given, instead of `latest`.
    pub fallback_tag: Option<&'a str>,
}

/// Trim, lowercase and collapse hub aliases.
pub fn canonical_registry(registry: &str) -> String {
    let lowered = registry.trim().to_ascii_lowercase();
    if HUB_ALIASES.contains(&lowered.as_str()) {
        DEFAULT_REGISTRY.to_string()
    } else {
        lowered
    }
}

pub fn is_hub_registry(registry: &str) -> bool {
    canonical_registry(registry) == DEFAULT_REGISTRY
}

/// Registry flattened into something usable as a repository path component:
/// hub aliases become `dockerio`, a numeric port is dropped, dots are removed.
pub fn sanitize_registry_for_path(registry: &str) -> String {
    let canonical = canonical_registry(registry);
    if canonical == DEFAULT_REGISTRY {
        return "dockerio".to_string();
    }
    let host = match canonical.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => canonical.as_str(),
    };
    host.replace('.', "")
}

impl ParsedReference {
    /// Fill in registry and tag defaults. Consumes the parsed form, so every
    /// [`ImageReference`] is normalized exactly once.
    pub fn normalize(self, options: &NormalizeOptions<'_>) -> ImageReference {
        let explicit = self
            .registry
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or_else(|| options.global_registry.map(str::trim).filter(|r| !r.is_empty()));

        let (registry, repository) = match explicit {
            Some(registry) => (canonical_registry(registry), self.repository),
            None if !self.repository.contains('/') => (
                DEFAULT_REGISTRY.to_string(),
                format!("{}/{}", LIBRARY_NAMESPACE, self.repository),
            ),
            None => (DEFAULT_REGISTRY.to_string(), self.repository),
        };

        let tag = match (&self.tag, &self.digest) {
            (None, None) => Some(
                options
                    .fallback_tag
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_TAG)
                    .to_string(),
            ),
            _ => self.tag,
        };

        ImageReference {
            registry,
            repository,
            tag,
            digest: self.digest,
            original: self.original,
        }
    }
}
