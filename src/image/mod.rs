//! Image reference handling
//!
//! Turning a string such as `quay.io/prometheus/node-exporter:v1.3.1`, or a
//! record with `registry`/`repository`/`tag`/`digest` fields, into a canonical
//! [`ImageReference`] happens in two explicit steps:
//!
//! 1. [`parser`] applies the grammar from [`grammar`] and yields a
//!    [`ParsedReference`] with nothing defaulted.
//! 2. [`ParsedReference::normalize`] collapses registry aliases and fills in
//!    the hub registry, the `library/` namespace and the default tag.
//!
//! ```
//! use image_relocator::image::ImageReference;
//!
//! let reference: ImageReference = "nginx:1.23".parse().unwrap();
//! assert_eq!(reference.registry, "docker.io");
//! assert_eq!(reference.repository, "library/nginx");
//! assert_eq!(reference.to_string(), "docker.io/library/nginx:1.23");
//! ```

pub mod grammar;
pub mod normalize;
pub mod parser;
pub mod reference;

pub use normalize::{NormalizeOptions, canonical_registry, is_hub_registry, sanitize_registry_for_path};
pub use parser::{ImageRecord, ParseMode, RecordShape, classify_record, parse_reference};
pub use reference::{ImageReference, ParsedReference};
