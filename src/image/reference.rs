//! Image reference types before and after normalization

use super::normalize::NormalizeOptions;
use super::parser::{ParseMode, parse_reference};
use crate::error::ReferenceError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Result of the grammar step: validated parts, nothing defaulted yet.
///
/// Consumed by [`ParsedReference::normalize`], so a reference can only be
/// normalized once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub registry: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
    pub original: String,
}

/// Canonical image coordinates.
///
/// `registry` is always set, `repository` always passes the repository
/// grammar, and exactly one of `tag` and `digest` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Verbatim source text (string value, or compact rendering of a record)
    pub original: String,
}

impl ImageReference {
    /// Parse and normalize with default options (hub registry, `latest` tag).
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        Ok(parse_reference(input, ParseMode::Strict)?.normalize(&NormalizeOptions::default()))
    }

    /// `registry/repository` without tag or digest.
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    /// `:tag` or `@digest`
    pub fn version_suffix(&self) -> String {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => format!("@{}", digest),
            (None, Some(tag)) => format!(":{}", tag),
            (None, None) => String::new(),
        }
    }

    /// Same reference rehomed under another registry and repository.
    pub fn relocated(&self, registry: &str, repository: &str) -> String {
        if registry.is_empty() {
            format!("{}{}", repository, self.version_suffix())
        } else {
            format!("{}/{}{}", registry, repository, self.version_suffix())
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.registry, self.repository, self.version_suffix())
    }
}

impl FromStr for ImageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageReference::parse(s)
    }
}
