//! propsight-molecules: structure resolution and property retrieval.
//!
//! A request flows through:
//! 1. Identifier resolution (name → structure via PubChem when needed)
//! 2. Structure normalization (built-in SMILES toolkit)
//! 3. Authoritative property lookup (PubChem PUG REST)
//! 4. Fallback ADMET prediction (local descriptors or a remote model service)
//! 5. Curation of predicted records

pub mod element;
pub mod smiles;
pub mod canonical;
pub mod descriptors;
pub mod normalizer;
pub mod lookup;
pub mod resolver;
pub mod pubchem;
pub mod admet;
pub mod admet_service;
pub mod curation;
pub mod pipeline;

pub use admet::{DescriptorPredictor, PredictionEngine, PredictionError};
pub use admet_service::AdmetServiceClient;
pub use curation::{curate, ResultCurator};
pub use lookup::{LookupError, PropertyLookupClient};
pub use normalizer::{ChemToolkit, SmilesToolkit, StructureKey, StructureNormalizer, ToolkitError};
pub use pipeline::{
    Collaborators, LookupDisposition, ResolutionOrchestrator, ResolutionOutcome, ResolutionState,
    ResolvedCompound,
};
pub use pubchem::PubChemClient;
pub use resolver::{IdentifierResolver, NameResolver};
