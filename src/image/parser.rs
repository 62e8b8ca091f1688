//! String and record grammars for image references

use super::grammar::{
    contains_template, is_valid_digest, is_valid_registry, is_valid_repository, is_valid_tag,
    looks_like_registry,
};
use super::reference::ParsedReference;
use crate::error::ReferenceError;
use crate::tree::{Node, Record};

pub const REGISTRY_FIELD: &str = "registry";
pub const REPOSITORY_FIELD: &str = "repository";
pub const TAG_FIELD: &str = "tag";
pub const DIGEST_FIELD: &str = "digest";

const RECORD_FIELDS: [&str; 4] = [REGISTRY_FIELD, REPOSITORY_FIELD, TAG_FIELD, DIGEST_FIELD];

/// How an invalid tag-looking suffix is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Reject with [`ReferenceError::InvalidTagFormat`].
    #[default]
    Strict,
    /// Treat the whole name part as the repository and validate it as such.
    Permissive,
}

/// Parse `[registry/]repository[:tag][@digest]`.
pub fn parse_reference(input: &str, mode: ParseMode) -> Result<ParsedReference, ReferenceError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(ReferenceError::EmptyInput);
    }

    let (name_and_tag, digest) = match text.rsplit_once('@') {
        Some((rest, digest)) => {
            if !is_valid_digest(digest) {
                return Err(ReferenceError::InvalidDigestFormat(digest.to_string()));
            }
            (rest, Some(digest))
        }
        None => (text, None),
    };

    let (name, tag) = split_tag(name_and_tag, mode)?;
    if let (Some(tag), Some(digest)) = (tag, digest) {
        return Err(ReferenceError::TagAndDigestPresent {
            tag: tag.to_string(),
            digest: digest.to_string(),
        });
    }

    let (registry, repository) = split_registry(name);
    validate_name(registry, repository)?;

    Ok(ParsedReference {
        registry: registry.map(str::to_string),
        repository: repository.to_string(),
        tag: tag.map(str::to_string),
        digest: digest.map(str::to_string),
        original: input.to_string(),
    })
}

/// Only a `:` after the last `/` separates a tag; earlier ones belong to a registry port.
fn split_tag(name: &str, mode: ParseMode) -> Result<(&str, Option<&str>), ReferenceError> {
    let last_slash = name.rfind('/');
    let Some(colon) = name.rfind(':').filter(|&c| last_slash.is_none_or(|s| c > s)) else {
        return Ok((name, None));
    };

    let candidate = &name[colon + 1..];
    if is_valid_tag(candidate) {
        return Ok((&name[..colon], Some(candidate)));
    }
    match mode {
        ParseMode::Strict => Err(ReferenceError::InvalidTagFormat(candidate.to_string())),
        ParseMode::Permissive => Ok((name, None)),
    }
}

fn split_registry(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((first, rest)) if looks_like_registry(first) => (Some(first), rest),
        _ => (None, name),
    }
}

fn validate_name(registry: Option<&str>, repository: &str) -> Result<(), ReferenceError> {
    if let Some(registry) = registry {
        if !is_valid_registry(registry) {
            return Err(ReferenceError::InvalidRegistryName(registry.to_string()));
        }
    }
    if !is_valid_repository(repository) {
        return Err(ReferenceError::InvalidRepositoryName(repository.to_string()));
    }
    Ok(())
}

/// Whether a record is an image declaration or just a container of other values.
#[derive(Debug, Clone, Copy)]
pub enum RecordShape<'a> {
    /// A non-null `repository` key is present; the record is never recursed into.
    ImageAttempt(ImageRecord<'a>),
    Container,
}

pub fn classify_record(record: &Record) -> RecordShape<'_> {
    match record.get(REPOSITORY_FIELD) {
        None | Some(Node::Empty) => RecordShape::Container,
        Some(_) => RecordShape::ImageAttempt(ImageRecord { record }),
    }
}

/// Record carrying some of `registry`, `repository`, `tag` and `digest`.
#[derive(Debug, Clone, Copy)]
pub struct ImageRecord<'a> {
    record: &'a Record,
}

impl<'a> ImageRecord<'a> {
    pub fn record(&self) -> &'a Record {
        self.record
    }

    /// Any of the reference fields holds unresolved templating.
    pub fn has_template(&self) -> bool {
        RECORD_FIELDS
            .iter()
            .filter_map(|field| self.record.get(*field).and_then(Node::as_str))
            .any(contains_template)
    }

    /// Fails with `InvalidFieldType` when any reference field is present but not a string.
    pub fn check_field_types(&self) -> Result<(), ReferenceError> {
        self.fields().map(|_| ())
    }

    fn fields(&self) -> Result<[Option<&'a str>; 4], ReferenceError> {
        let mut values = [None; 4];
        for (slot, field) in values.iter_mut().zip(RECORD_FIELDS) {
            *slot = string_field(self.record, field)?;
        }
        Ok(values)
    }

    /// Apply the record grammar. Field types are checked before any value.
    pub fn parse(&self) -> Result<ParsedReference, ReferenceError> {
        let [registry, repository, tag, digest] = self.fields()?;

        let repository = repository.ok_or_else(|| ReferenceError::InvalidRepositoryName(String::new()))?;
        let (registry, repository) = match registry {
            Some(registry) => (Some(registry), repository),
            None => split_registry(repository),
        };
        validate_name(registry, repository)?;

        if let Some(tag) = tag {
            if !is_valid_tag(tag) {
                return Err(ReferenceError::InvalidTagFormat(tag.to_string()));
            }
        }
        if let Some(digest) = digest {
            if !is_valid_digest(digest) {
                return Err(ReferenceError::InvalidDigestFormat(digest.to_string()));
            }
        }
        if let (Some(tag), Some(digest)) = (tag, digest) {
            return Err(ReferenceError::TagAndDigestPresent {
                tag: tag.to_string(),
                digest: digest.to_string(),
            });
        }

        Ok(ParsedReference {
            registry: registry.map(str::to_string),
            repository: repository.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
            original: serde_json::to_string(self.record).unwrap_or_default(),
        })
    }
}

/// Null and blank strings count as absent; any non-string value is a type error.
fn string_field<'a>(record: &'a Record, field: &str) -> Result<Option<&'a str>, ReferenceError> {
    match record.get(field) {
        None | Some(Node::Empty) => Ok(None),
        Some(Node::Str(value)) => {
            let value = value.trim();
            Ok((!value.is_empty()).then_some(value))
        }
        Some(other) => Err(ReferenceError::InvalidFieldType {
            field: field.to_string(),
            found: other.kind_name(),
        }),
    }
}
