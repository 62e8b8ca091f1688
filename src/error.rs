//! Error types for reference parsing, tree access and override generation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelocatorError>;

/// Errors produced while turning a string or record into an image reference.
///
/// These are always returned to whoever attempted the parse; the detector
/// decides whether they become rejected candidates or silent skips.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("image reference is empty")]
    EmptyInput,
    #[error("invalid digest format: '{0}' (expected sha256:<64 hex characters>)")]
    InvalidDigestFormat(String),
    #[error("invalid tag format: '{0}'")]
    InvalidTagFormat(String),
    #[error("invalid registry name: '{0}'")]
    InvalidRegistryName(String),
    #[error("invalid repository name: '{0}'")]
    InvalidRepositoryName(String),
    #[error("reference specifies both tag '{tag}' and digest '{digest}'")]
    TagAndDigestPresent { tag: String, digest: String },
    #[error("image record field '{field}' must be a string, found {found}")]
    InvalidFieldType { field: String, found: &'static str },
}

impl ReferenceError {
    /// Field-type errors mean the record is structurally broken, not merely invalid.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, ReferenceError::InvalidFieldType { .. })
    }
}

/// Errors produced by path-addressed reads and writes on a value tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("path cannot be empty")]
    EmptyPath,
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("cannot traverse through non-record value at {0}")]
    NotTraversable(String),
    #[error("value at {0} is not a list")]
    NotAList(String),
    #[error("index {index} out of bounds at {path} (length {len})")]
    IndexOutOfBounds { path: String, index: usize, len: usize },
    #[error("refusing to overwrite record or list at {0} with a scalar")]
    CannotOverwriteStructure(String),
}

#[derive(Error, Debug)]
pub enum RelocatorError {
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),
    #[error("Access error: {0}")]
    Access(#[from] AccessError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Path strategy error: {0}")]
    Strategy(String),
    #[error("strict mode: {count} unsupported image structure(s) found: {paths}")]
    StrictViolation { count: usize, paths: String },
    #[error(
        "processed {processed} of {eligible} eligible images ({rate}%), below threshold of {threshold}%"
    )]
    Threshold {
        threshold: u8,
        rate: u8,
        eligible: usize,
        processed: usize,
    },
}

impl RelocatorError {
    /// Process exit code for this error, grouped by category.
    pub fn exit_code(&self) -> i32 {
        match self {
            RelocatorError::Config(_) | RelocatorError::Pattern(_) => 2,
            RelocatorError::Strategy(_) => 3,
            RelocatorError::Yaml(_) | RelocatorError::Json(_) => 10,
            RelocatorError::Reference(_) | RelocatorError::Access(_) => 11,
            RelocatorError::StrictViolation { .. } => 12,
            RelocatorError::Threshold { .. } => 13,
            RelocatorError::Io(_) => 21,
        }
    }
}
