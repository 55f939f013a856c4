//! propsight-common: Shared types, errors, and configuration used across all propsight crates.

pub mod error;
pub mod entities;
pub mod resolver_config;
pub mod sandbox;

// Re-export commonly used types
pub use entities::{
    DepictionHandle, DisplayName, InputKind, LookupOutcome, PropertyRecord, PropertyValue,
    Provenance,
};
pub use error::{PropsightError, ResolutionError};
pub use resolver_config::{EngineKind, PredictionConfig, PubChemConfig, ResolutionConfig, ResolverConfig};
