//! Heuristic classification of tree paths
//!
//! Patterns are matched against the display form of a [`Path`]
//! (`spec.containers[0].image`). Non-image patterns win over image patterns;
//! a path matching neither is unclassified.

use crate::error::Result;
use crate::tree::Path;
use regex::Regex;

/// Locations that conventionally hold an image reference.
pub const DEFAULT_IMAGE_PATTERNS: &[&str] = &[
    r"^image$",
    r"\bimage$",
    r"[a-z0-9]Image$",
    r"(^|\.)images\[\d+\]$",
    r"(^|\.)containers\[\d+\]\.image$",
    r"(^|\.)initContainers\[\d+\]\.image$",
];

/// Locations that conventionally never hold one.
pub const DEFAULT_NON_IMAGE_PATTERNS: &[&str] = &[
    r"(^|\.)enabled$",
    r"(?i)annotations\.",
    r"(?i)labels\.",
    r"(^|\.)port$",
    r"(^|\.)ports[.\[]",
    r"(^|\.)timeout$",
    r"(^|\.)serviceAccountName$",
    r"(^|\.)replicas$",
    r"(^|\.)resources\.",
    r"(^|\.)env[.\[]",
    r"(^|\.)command\[\d+\]$",
    r"(^|\.)args\[\d+\]$",
    r"\[\d+\]\.name$",
    r"(^|\.)tag$",
    r"(^|\.)registry$",
    r"(^|\.)repository$",
    r"(^|\.)digest$",
    r"(?i)pullPolicy$",
];

/// Pattern tables as plain data, extendable from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPatterns {
    pub image: Vec<String>,
    pub non_image: Vec<String>,
}

impl Default for PathPatterns {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            non_image: DEFAULT_NON_IMAGE_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PathPatterns {
    /// Empty tables: nothing is classified.
    pub fn empty() -> Self {
        Self {
            image: Vec::new(),
            non_image: Vec::new(),
        }
    }

    /// Append extra patterns after the existing ones.
    pub fn extended(mut self, image: &[String], non_image: &[String]) -> Self {
        self.image.extend(image.iter().cloned());
        self.non_image.extend(non_image.iter().cloned());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Image,
    NonImage,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct PathClassifier {
    image: Vec<Regex>,
    non_image: Vec<Regex>,
}

impl PathClassifier {
    pub fn new(patterns: &PathPatterns) -> Result<Self> {
        Ok(Self {
            image: compile(&patterns.image)?,
            non_image: compile(&patterns.non_image)?,
        })
    }

    /// Classifier over the built-in tables.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&PathPatterns::default())
    }

    pub fn classify(&self, path: &Path) -> PathClass {
        let text = path.to_string();
        if self.non_image.iter().any(|re| re.is_match(&text)) {
            PathClass::NonImage
        } else if self.image.iter().any(|re| re.is_match(&text)) {
            PathClass::Image
        } else {
            PathClass::Unknown
        }
    }

    pub fn is_image_path(&self, path: &Path) -> bool {
        self.classify(path) == PathClass::Image
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    Ok(patterns
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, regex::Error>>()?)
}
