//! ADMET prediction port and the in-process descriptor predictor.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use propsight_common::{PropertyRecord, Provenance};

use crate::descriptors;
use crate::normalizer::StructureKey;
use crate::smiles::parse_smiles;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PredictionError {
    #[error("descriptor computation failed: {0}")]
    Computation(String),

    #[error("prediction service error: {0}")]
    Service(String),

    #[error("prediction timed out after {0}s")]
    Timeout(u64),
}

/// Computes predicted properties for a canonical structure.
///
/// There is no "not found" case: an engine either returns a record or fails.
#[async_trait]
pub trait PredictionEngine: Send + Sync {
    async fn predict(&self, key: &StructureKey) -> Result<PropertyRecord, PredictionError>;
}

/// Rule-of-five profile of a molecule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ro5Profile {
    pub violations: u32,
    pub qed_estimate: f64,
}

impl Ro5Profile {
    pub fn evaluate(mw: f64, logp: f64, hbd: usize, hba: usize) -> Self {
        let mut violations = 0;
        if mw > 500.0 { violations += 1; }
        if logp > 5.0 { violations += 1; }
        if hbd > 5 { violations += 1; }
        if hba > 10 { violations += 1; }

        let qed_estimate = 1.0 - (violations as f64 * 0.2).min(0.8);
        Self { violations, qed_estimate }
    }

    /// Number of the four criteria met.
    pub fn satisfied(&self) -> u32 {
        4 - self.violations
    }
}

/// Local predictor built on graph descriptors; needs no network or model files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorPredictor;

impl DescriptorPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous descriptor calculation.
    pub fn compute(smiles: &str) -> Result<PropertyRecord, PredictionError> {
        let mol = parse_smiles(smiles).map_err(|e| PredictionError::Computation(e.to_string()))?;
        if mol.atoms.iter().any(|a| a.element.is_none()) {
            return Err(PredictionError::Computation("wildcard atoms have no descriptors".to_string()));
        }

        let mw = descriptors::molecular_weight(&mol);
        let logp = descriptors::crippen_logp(&mol);
        let hba = descriptors::hydrogen_bond_acceptors(&mol);
        let hbd = descriptors::hydrogen_bond_donors(&mol);
        let ro5 = Ro5Profile::evaluate(mw, logp, hbd, hba);

        Ok(PropertyRecord::new(Provenance::Predicted)
            .with("molecular_weight", round4(mw))
            .with("logP", round4(logp))
            .with("hydrogen_bond_acceptors", hba as f64)
            .with("hydrogen_bond_donors", hbd as f64)
            .with("Lipinski", f64::from(ro5.satisfied()))
            .with("QED", round4(ro5.qed_estimate))
            .with("tpsa", round4(descriptors::tpsa(&mol)))
            .with("num_heavy_atoms", mol.heavy_atom_count() as f64)
            .with("num_rings", mol.ring_count() as f64)
            .with("ro5_violations", f64::from(ro5.violations)))
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[async_trait]
impl PredictionEngine for DescriptorPredictor {
    #[instrument(skip_all, fields(key = %key))]
    async fn predict(&self, key: &StructureKey) -> Result<PropertyRecord, PredictionError> {
        let smiles = key.as_str().to_string();
        let record = tokio::task::spawn_blocking(move || Self::compute(&smiles))
            .await
            .map_err(|e| PredictionError::Computation(format!("worker failed: {}", e)))??;
        debug!(properties = record.len(), "Descriptors computed");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::StructureNormalizer;
    use propsight_common::PropertyValue;

    #[test]
    fn test_ro5_profile() {
        let clean = Ro5Profile::evaluate(180.16, 1.3, 1, 4);
        assert_eq!(clean.violations, 0);
        assert_eq!(clean.satisfied(), 4);
        assert_eq!(clean.qed_estimate, 1.0);

        let heavy = Ro5Profile::evaluate(720.0, 6.5, 7, 12);
        assert_eq!(heavy.violations, 4);
        assert!((heavy.qed_estimate - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_compute_record_order() {
        let record = DescriptorPredictor::compute("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(
            keys,
            vec![
                "molecular_weight",
                "logP",
                "hydrogen_bond_acceptors",
                "hydrogen_bond_donors",
                "Lipinski",
                "QED",
                "tpsa",
                "num_heavy_atoms",
                "num_rings",
                "ro5_violations",
            ]
        );
        assert_eq!(record.provenance(), Provenance::Predicted);
        assert_eq!(record.get("num_heavy_atoms"), Some(&PropertyValue::Number(13.0)));
        assert_eq!(record.get("num_rings"), Some(&PropertyValue::Number(1.0)));
        assert_eq!(record.get("Lipinski"), Some(&PropertyValue::Number(4.0)));
    }

    #[test]
    fn test_compute_rejects_wildcards() {
        assert!(matches!(
            DescriptorPredictor::compute("*CC"),
            Err(PredictionError::Computation(_))
        ));
    }

    #[tokio::test]
    async fn test_predict_through_port() {
        let key = StructureNormalizer::default().normalize("CCO").unwrap();
        let record = DescriptorPredictor::new().predict(&key).await.unwrap();
        let mw = record.get("molecular_weight").and_then(|v| v.as_f64()).unwrap();
        assert!((mw - 46.069).abs() < 0.01);
    }
}
