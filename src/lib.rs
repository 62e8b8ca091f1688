//! Image Relocator Library
//!
//! Finds container image references inside Kubernetes and Helm values trees
//! and generates override documents that point them at another registry.
//!
//! The pieces, leaves first:
//!
//! - [`tree`]: the loosely-typed values tree, paths into it and path-addressed get/set
//! - [`image`]: the reference grammar, parser and normalizer
//! - [`detect`]: path classification and the recursive detector
//! - [`registry`] and [`overrides`]: target selection, repository naming and output
//!
//! ```
//! use image_relocator::detect::{DetectionConfig, Detector, PathClassifier};
//! use image_relocator::tree::Node;
//!
//! let values = Node::from_yaml_str("web:\n  image: nginx:1.23\n").unwrap();
//! let detector = Detector::new(DetectionConfig::new(), PathClassifier::with_defaults().unwrap());
//! let outcome = detector.detect(&values);
//!
//! assert_eq!(outcome.detected[0].path.to_string(), "web.image");
//! assert_eq!(outcome.detected[0].reference.to_string(), "docker.io/library/nginx:1.23");
//! ```

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod image;
pub mod logging;
pub mod overrides;
pub mod registry;
pub mod tree;

pub use config::RelocationConfig;
pub use detect::{DetectedImage, DetectionConfig, DetectionOutcome, Detector};
pub use error::{RelocatorError, Result};
pub use image::ImageReference;
pub use logging::Logger;
pub use tree::{Node, Path};
