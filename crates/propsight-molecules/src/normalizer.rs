//! Structure validation and canonicalisation.
//!
//! [`StructureNormalizer`] is the only producer of [`StructureKey`]; holding a
//! key means the structure parsed and is in canonical form.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use propsight_common::{DepictionHandle, ResolutionError};

use crate::canonical::{hill_formula, write_canonical};
use crate::smiles::{parse_smiles, SmilesError};

/// Version tag of the locally derived text identifier.
const TEXT_ID_PREFIX: &str = "PSID=1";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ToolkitError(String);

impl From<SmilesError> for ToolkitError {
    fn from(e: SmilesError) -> Self {
        ToolkitError(e.to_string())
    }
}

/// Chemistry toolkit port: parsing, canonical output, derived identifiers.
pub trait ChemToolkit: Send + Sync {
    /// Parse `smiles` and return its canonical form.
    fn canonicalize(&self, smiles: &str) -> Result<String, ToolkitError>;

    /// Layered text identifier for a structure already in canonical form.
    fn canonical_text_id(&self, smiles: &str) -> Result<String, ToolkitError>;
}

/// Built-in pure-Rust SMILES toolkit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesToolkit;

impl ChemToolkit for SmilesToolkit {
    fn canonicalize(&self, smiles: &str) -> Result<String, ToolkitError> {
        let mol = parse_smiles(smiles)?;
        Ok(write_canonical(&mol))
    }

    fn canonical_text_id(&self, smiles: &str) -> Result<String, ToolkitError> {
        let mol = parse_smiles(smiles)?;
        Ok(format!("{}/{}/{}", TEXT_ID_PREFIX, hill_formula(&mol), write_canonical(&mol)))
    }
}

/// Canonical, validated structure notation. Only [`StructureNormalizer`]
/// constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StructureKey(String);

impl StructureKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StructureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StructureKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct StructureNormalizer {
    toolkit: Arc<dyn ChemToolkit>,
    depiction_width: u32,
    depiction_height: u32,
}

impl StructureNormalizer {
    pub fn new(toolkit: Arc<dyn ChemToolkit>) -> Self {
        Self { toolkit, depiction_width: 200, depiction_height: 200 }
    }

    pub fn with_depiction_size(mut self, width: u32, height: u32) -> Self {
        self.depiction_width = width;
        self.depiction_height = height;
        self
    }

    /// Validate and canonicalise raw structure notation.
    pub fn normalize(&self, raw: &str) -> Result<StructureKey, ResolutionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }
        match self.toolkit.canonicalize(trimmed) {
            Ok(canonical) => {
                debug!(input = %trimmed, canonical = %canonical, "Structure normalized");
                Ok(StructureKey(canonical))
            }
            Err(e) => Err(ResolutionError::InvalidStructure(format!("{}: {}", trimmed, e))),
        }
    }

    /// Secondary identifier used as a display label. Falls back to the key
    /// itself if the toolkit cannot derive one.
    pub fn canonical_text_id(&self, key: &StructureKey) -> String {
        self.toolkit
            .canonical_text_id(key.as_str())
            .unwrap_or_else(|_| key.as_str().to_string())
    }

    pub fn depiction_request(&self, key: &StructureKey) -> DepictionHandle {
        DepictionHandle {
            structure: key.as_str().to_string(),
            width: self.depiction_width,
            height: self.depiction_height,
        }
    }
}

impl Default for StructureNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(SmilesToolkit))
    }
}

impl fmt::Debug for StructureNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureNormalizer")
            .field("depiction_width", &self.depiction_width)
            .field("depiction_height", &self.depiction_height)
            .finish_non_exhaustive()
    }
}
