//! Source-to-target registry mappings

use crate::error::{RelocatorError, Result};
use crate::image::canonical_registry;
use crate::image::grammar::is_valid_registry;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `source -> target` rule. The target may carry a path
/// (`harbor.example.com/dockerhub`) that is prepended to relocated repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMapping {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RegistryMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            description: None,
        }
    }
}

/// Where a mapped image should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingTarget<'a> {
    pub registry: &'a str,
    /// Path below the registry, without surrounding slashes
    pub prefix: Option<&'a str>,
}

impl<'a> MappingTarget<'a> {
    pub fn parse(target: &'a str) -> Self {
        let target = target.trim().trim_end_matches('/');
        match target.split_once('/') {
            Some((registry, prefix)) if !prefix.trim_matches('/').is_empty() => Self {
                registry,
                prefix: Some(prefix.trim_matches('/')),
            },
            Some((registry, _)) => Self { registry, prefix: None },
            None => Self {
                registry: target,
                prefix: None,
            },
        }
    }
}

/// Accepted mapping file layouts, tried in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Structured {
        registries: RegistriesSection,
    },
    Wrapped {
        mappings: Vec<RegistryMapping>,
        #[serde(default, rename = "defaultTarget")]
        default_target: Option<String>,
    },
    Entries(Vec<RegistryMapping>),
    /// `source: target` pairs
    Legacy(IndexMap<String, String>),
}

#[derive(Deserialize)]
struct RegistriesSection {
    #[serde(default)]
    mappings: Vec<RegistryMapping>,
    #[serde(default, rename = "defaultTarget")]
    default_target: Option<String>,
}

impl From<MappingFile> for RegistryMappings {
    fn from(file: MappingFile) -> Self {
        let (entries, default_target) = match file {
            MappingFile::Structured { registries } => (registries.mappings, registries.default_target),
            MappingFile::Wrapped {
                mappings,
                default_target,
            } => (mappings, default_target),
            MappingFile::Entries(entries) => (entries, None),
            MappingFile::Legacy(pairs) => (
                pairs
                    .into_iter()
                    .map(|(source, target)| RegistryMapping::new(source, target))
                    .collect(),
                None,
            ),
        };

        let entries = entries
            .into_iter()
            .map(|m| RegistryMapping {
                source: m.source.trim().to_string(),
                target: m.target.trim().to_string(),
                description: m.description,
            })
            .collect();
        let default_target = default_target
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        RegistryMappings {
            entries,
            default_target,
        }
    }
}

/// Ordered mapping rules; the first rule whose source matches wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MappingFile")]
pub struct RegistryMappings {
    #[serde(rename = "mappings")]
    entries: Vec<RegistryMapping>,
    #[serde(rename = "defaultTarget", skip_serializing_if = "Option::is_none")]
    default_target: Option<String>,
}

impl RegistryMappings {
    pub fn new(entries: Vec<RegistryMapping>) -> Self {
        Self {
            entries,
            default_target: None,
        }
    }

    pub fn with_default_target(mut self, target: impl Into<String>) -> Self {
        self.default_target = Some(target.into());
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(RelocatorError::Config("mappings file is empty".to_string()));
        }
        let mappings: RegistryMappings = serde_yaml::from_str(text)?;
        mappings.validate()?;
        Ok(mappings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading registry mappings from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let mappings = Self::from_yaml_str(&text)?;
        debug!("Loaded {} registry mapping(s)", mappings.len());
        Ok(mappings)
    }

    pub fn entries(&self) -> &[RegistryMapping] {
        &self.entries
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default_target.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.default_target.is_none()
    }

    /// Appends `other`'s rules after this one's; `other`'s default target wins.
    pub fn merge(&mut self, other: RegistryMappings) {
        self.entries.extend(other.entries);
        if other.default_target.is_some() {
            self.default_target = other.default_target;
        }
    }

    /// Target for `registry`, comparing canonical forms so hub aliases match.
    /// Falls back to the default target when no rule matches.
    pub fn target_for(&self, registry: &str) -> Option<MappingTarget<'_>> {
        let wanted = canonical_registry(registry);
        self.entries
            .iter()
            .find(|m| canonical_registry(&m.source) == wanted)
            .map(|m| m.target.as_str())
            .or(self.default_target.as_deref())
            .map(MappingTarget::parse)
    }

    pub fn validate(&self) -> Result<()> {
        for mapping in &self.entries {
            if mapping.source.is_empty() {
                return Err(RelocatorError::Config(format!(
                    "mapping to '{}' has an empty source registry",
                    mapping.target
                )));
            }
            if mapping.target.is_empty() {
                return Err(RelocatorError::Config(format!(
                    "mapping for '{}' has an empty target registry",
                    mapping.source
                )));
            }
            validate_target(&mapping.target)?;
        }
        if let Some(target) = &self.default_target {
            validate_target(target)?;
        }
        Ok(())
    }
}

fn validate_target(target: &str) -> Result<()> {
    let parsed = MappingTarget::parse(target);
    if !is_valid_registry(parsed.registry) {
        return Err(RelocatorError::Config(format!(
            "invalid target registry '{}' in mapping",
            target
        )));
    }
    Ok(())
}
