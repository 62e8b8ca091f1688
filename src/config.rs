//! Configuration file handling
//!
//! A relocation config is a YAML document; every field is optional and command
//! line flags are layered on top of it by the CLI.

use crate::detect::{DetectionConfig, PathClassifier, PathPatterns};
use crate::error::{RelocatorError, Result};
use crate::image::canonical_registry;
use crate::image::grammar::is_valid_tag;
use crate::overrides::strategy::{PREFIX_SOURCE_REGISTRY, STRATEGY_NAMES};
use crate::registry::RegistryMappings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelocationConfig {
    pub source_registries: Vec<String>,
    pub exclude_registries: Vec<String>,
    pub strict: bool,
    /// Used instead of `latest` for references without tag or digest
    pub fallback_tag: Option<String>,
    pub target_registry: Option<String>,
    pub strategy: String,
    /// Minimum success percentage, 0-100
    pub threshold: u8,
    pub mappings: RegistryMappings,
    /// Extra classifier patterns, appended after the built-in tables
    pub image_patterns: Vec<String>,
    pub non_image_patterns: Vec<String>,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            source_registries: Vec::new(),
            exclude_registries: Vec::new(),
            strict: false,
            fallback_tag: None,
            target_registry: None,
            strategy: PREFIX_SOURCE_REGISTRY.to_string(),
            threshold: 0,
            mappings: RegistryMappings::default(),
            image_patterns: Vec::new(),
            non_image_patterns: Vec::new(),
        }
    }
}

impl RelocationConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RelocationConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(RelocatorError::Config(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }

        if !STRATEGY_NAMES.contains(&self.strategy.as_str()) {
            return Err(RelocatorError::Strategy(format!(
                "unknown path strategy '{}' (expected one of: {})",
                self.strategy,
                STRATEGY_NAMES.join(", ")
            )));
        }

        let sources: BTreeSet<String> = self
            .source_registries
            .iter()
            .map(|r| canonical_registry(r))
            .collect();
        if let Some(both) = self
            .exclude_registries
            .iter()
            .map(|r| canonical_registry(r))
            .find(|r| sources.contains(r))
        {
            return Err(RelocatorError::Config(format!(
                "registry '{}' is both a source and an excluded registry",
                both
            )));
        }

        if let Some(tag) = self.fallback_tag.as_deref().map(str::trim) {
            if !tag.is_empty() && !is_valid_tag(tag) {
                return Err(RelocatorError::Config(format!(
                    "fallback tag '{}' is not a valid image tag",
                    tag
                )));
            }
        }

        if let Some(target) = &self.target_registry {
            if target.trim().is_empty() {
                return Err(RelocatorError::Config(
                    "target registry cannot be empty".to_string(),
                ));
            }
        }

        self.mappings.validate()?;
        PathClassifier::new(&self.path_patterns())?;
        Ok(())
    }

    /// Built-in classifier tables plus the configured extras.
    pub fn path_patterns(&self) -> PathPatterns {
        PathPatterns::default().extended(&self.image_patterns, &self.non_image_patterns)
    }

    pub fn detection_config(&self) -> DetectionConfig {
        DetectionConfig::new()
            .with_source_registries(&self.source_registries)
            .with_exclude_registries(&self.exclude_registries)
            .with_strict(self.strict)
            .with_fallback_tag(self.fallback_tag.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = RelocationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, "prefix-source-registry");
    }

    #[test]
    fn test_load_full_config() {
        let config = RelocationConfig::from_yaml_str(
            r#"
sourceRegistries: [docker.io, quay.io]
excludeRegistries: [internal.example.com]
strict: true
fallbackTag: "2.1.0"
targetRegistry: harbor.example.com
strategy: flat
threshold: 90
mappings:
  - source: quay.io
    target: harbor.example.com/quay
imagePatterns: ['^custom\.ref$']
"#,
        )
        .unwrap();

        assert_eq!(config.source_registries, vec!["docker.io", "quay.io"]);
        assert!(config.strict);
        assert_eq!(config.threshold, 90);
        assert_eq!(config.strategy, "flat");
        assert_eq!(
            config.mappings.target_for("quay.io").and_then(|t| t.prefix),
            Some("quay")
        );

        let detection = config.detection_config();
        assert!(detection.is_strict());
        assert_eq!(detection.fallback_tag(), Some("2.1.0"));
        assert!(detection.source_registries().contains("quay.io"));

        let classifier = PathClassifier::new(&config.path_patterns()).unwrap();
        assert!(classifier.is_image_path(&"custom.ref".parse().unwrap()));
    }

    #[test]
    fn test_legacy_mapping_map() {
        let config = RelocationConfig::from_yaml_str("mappings:\n  docker.io: mirror.local/hub\n").unwrap();
        assert_eq!(config.mappings.len(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            "threshold: 101\n",
            "strategy: nested\n",
            "sourceRegistries: [docker.io]\nexcludeRegistries: [index.docker.io]\n",
            "nonImagePatterns: ['(unclosed']\n",
            "targetRegistry: ' '\n",
            "mappings:\n  - source: docker.io\n    target: ''\n",
            "fallbackTag: 'v1+build meta'\n",
        ];
        for case in cases {
            assert!(RelocationConfig::from_yaml_str(case).is_err(), "accepted: {case}");
        }
    }

    #[test]
    fn test_invalid_fallback_tag_is_a_config_error() {
        let config = RelocationConfig {
            fallback_tag: Some("v1+build meta".into()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RelocatorError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(RelocationConfig::from_yaml_str("\n").unwrap(), RelocationConfig::default());
    }
}
