//! Registry mapping rules used to choose where relocated images go.

pub mod mappings;

pub use mappings::{MappingTarget, RegistryMapping, RegistryMappings};
