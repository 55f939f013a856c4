//! Resolver configuration.
//!
//! Read from the `[pubchem]`, `[prediction]` and `[resolution]` tables of
//! `propsight.toml`. Every field has a default, so an empty file (or no file)
//! yields a working configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration of the resolution pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Authoritative database endpoint
    #[serde(default)]
    pub pubchem: PubChemConfig,

    /// Fallback prediction engine
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Orchestration policy
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

// ── PubChem ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubChemConfig {
    /// PUG REST base URL, without trailing slash
    #[serde(default = "default_pubchem_url")]
    pub base_url: String,

    /// Properties requested on every lookup
    #[serde(default = "default_properties")]
    pub properties: Vec<String>,

    /// Per-request HTTP timeout, seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Budget for the best-effort synonym query after a hit, seconds
    #[serde(default = "default_synonym_timeout")]
    pub synonym_timeout_secs: u64,
}

fn default_pubchem_url() -> String { "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string() }
fn default_properties() -> Vec<String> {
    vec!["MolecularWeight".to_string(), "XLogP".to_string()]
}
fn default_request_timeout() -> u64 { 15 }
fn default_synonym_timeout() -> u64 { 5 }

impl Default for PubChemConfig {
    fn default() -> Self {
        Self {
            base_url: default_pubchem_url(),
            properties: default_properties(),
            timeout_secs: default_request_timeout(),
            synonym_timeout_secs: default_synonym_timeout(),
        }
    }
}

impl PubChemConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn synonym_timeout(&self) -> Duration {
        Duration::from_secs(self.synonym_timeout_secs)
    }
}

// ── Prediction ────────────────────────────────────────────────────────────────

/// Which prediction engine backs the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-process descriptor calculation
    Local,
    /// Remote ADMET model service
    Service,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_engine")]
    pub engine: EngineKind,

    /// Base URL of the ADMET service (engine = "service")
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Upper bound on one prediction call, seconds
    #[serde(default = "default_prediction_timeout")]
    pub timeout_secs: u64,
}

fn default_engine() -> EngineKind { EngineKind::Local }
fn default_service_url() -> String { "http://127.0.0.1:8765".to_string() }
fn default_prediction_timeout() -> u64 { 120 }

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            service_url: default_service_url(),
            timeout_secs: default_prediction_timeout(),
        }
    }
}

impl PredictionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Resolution policy ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Property names removed from predicted records before display
    #[serde(default = "default_excluded_properties")]
    pub excluded_properties: Vec<String>,

    /// Upper bound on the name → structure call, seconds
    #[serde(default = "default_request_timeout")]
    pub name_timeout_secs: u64,

    /// Upper bound on the property + synonym lookup, seconds
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Depiction size in pixels
    #[serde(default = "default_depiction_size")]
    pub depiction_width: u32,
    #[serde(default = "default_depiction_size")]
    pub depiction_height: u32,
}

/// Percentile annotations the prediction model attaches to its headline
/// descriptors; they clutter the result without adding information.
pub const DEFAULT_EXCLUDED_PROPERTIES: [&str; 8] = [
    "molecular_weight_drugbank_approved_percentile",
    "logP_drugbank_approved_percentile",
    "hydrogen_bond_acceptors_drugbank_approved_percentile",
    "hydrogen_bond_donors_drugbank_approved_percentile",
    "Lipinski_drugbank_approved_percentile",
    "QED_drugbank_approved_percentile",
    "Solubility_AqSolDB_drugbank_approved_percentile",
    "VDss_Lombardo_drugbank_approved_percentile",
];

fn default_excluded_properties() -> Vec<String> {
    DEFAULT_EXCLUDED_PROPERTIES.iter().map(|s| s.to_string()).collect()
}
fn default_lookup_timeout() -> u64 { 30 }
fn default_depiction_size() -> u32 { 200 }

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            excluded_properties: default_excluded_properties(),
            name_timeout_secs: default_request_timeout(),
            lookup_timeout_secs: default_lookup_timeout(),
            depiction_width: default_depiction_size(),
            depiction_height: default_depiction_size(),
        }
    }
}

impl ResolutionConfig {
    pub fn name_timeout(&self) -> Duration {
        Duration::from_secs(self.name_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

impl ResolverConfig {
    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.pubchem.properties.is_empty() {
            return Err("pubchem.properties must name at least one property".to_string());
        }
        if self.pubchem.timeout_secs == 0
            || self.prediction.timeout_secs == 0
            || self.resolution.name_timeout_secs == 0
            || self.resolution.lookup_timeout_secs == 0
            || self.pubchem.synonym_timeout_secs == 0
        {
            return Err("timeouts must be at least one second".to_string());
        }
        // a hit makes two sequential PubChem calls inside one lookup budget
        let worst_case = self.pubchem.timeout_secs + self.pubchem.synonym_timeout_secs;
        if self.resolution.lookup_timeout_secs <= worst_case {
            return Err(format!(
                "resolution.lookup_timeout_secs ({}) must exceed pubchem.timeout_secs + \
                 pubchem.synonym_timeout_secs ({})",
                self.resolution.lookup_timeout_secs, worst_case
            ));
        }
        if self.resolution.depiction_width == 0 || self.resolution.depiction_height == 0 {
            return Err("depiction size must be non-zero".to_string());
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
