//! Client for a remote ADMET model service.
//!
//! Contract: `POST {base}/predict` with `{"smiles": "..."}`; the reply is a
//! flat JSON object of property name → value. Key order is preserved.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use propsight_common::sandbox::SandboxClient;
use propsight_common::{PropertyRecord, PropertyValue, Provenance};

use crate::admet::{PredictionEngine, PredictionError};
use crate::normalizer::StructureKey;

pub struct AdmetServiceClient {
    client: SandboxClient,
    base_url: String,
}

impl AdmetServiceClient {
    pub fn new(client: SandboxClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn request(&self, smiles: &str) -> Result<Value, PredictionError> {
        let url = format!("{}/predict", self.base_url);
        let service = |e: String| PredictionError::Service(e);

        let resp = self
            .client
            .post(&url)
            .map_err(|e| service(e.to_string()))?
            .json(&serde_json::json!({ "smiles": smiles }))
            .send()
            .await
            .map_err(|e| service(format!("ADMET service unreachable at {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(service(format!("status {}: {}", status.as_u16(), text.trim())));
        }
        resp.json().await.map_err(|e| service(format!("malformed response: {}", e)))
    }
}

/// Convert the service reply into a predicted record.
pub fn parse_prediction(body: &Value) -> Result<PropertyRecord, PredictionError> {
    let fields = body
        .as_object()
        .ok_or_else(|| PredictionError::Service("response is not a JSON object".to_string()))?;

    Ok(PropertyRecord::from_entries(
        Provenance::Predicted,
        fields
            .iter()
            .filter_map(|(k, v)| PropertyValue::from_json(v).map(|v| (k.clone(), v))),
    ))
}

#[async_trait]
impl PredictionEngine for AdmetServiceClient {
    #[instrument(skip_all, fields(key = %key))]
    async fn predict(&self, key: &StructureKey) -> Result<PropertyRecord, PredictionError> {
        let body = self.request(key.as_str()).await.map_err(|e| {
            warn!(error = %e, "ADMET service call failed");
            e
        })?;
        let record = parse_prediction(&body)?;
        debug!(properties = record.len(), "ADMET service prediction received");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_prediction_preserves_order() {
        let body = json!({
            "molecular_weight": 46.07,
            "logP": -0.0014,
            "QED_drugbank_approved_percentile": 12.5,
            "AMES": 0.03,
            "comment": null
        });
        let record = parse_prediction(&body).unwrap();
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["molecular_weight", "logP", "QED_drugbank_approved_percentile", "AMES"]);
        assert_eq!(record.provenance(), Provenance::Predicted);
    }

    #[test]
    fn test_parse_prediction_rejects_non_object() {
        assert!(matches!(parse_prediction(&json!([1, 2])), Err(PredictionError::Service(_))));
    }
}
