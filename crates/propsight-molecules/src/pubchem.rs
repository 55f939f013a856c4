//! PubChem PUG REST client.
//!
//! Serves both remote ports of the pipeline:
//!   - name → structure (`/compound/name/property/CanonicalSMILES/JSON`)
//!   - properties + synonym by structure (`/compound/smiles/...`)
//!
//! Inputs are sent as form fields rather than path segments so that SMILES
//! characters such as `/`, `#` and `%` survive untouched.
//!
//! API docs: https://pubchem.ncbi.nlm.nih.gov/docs/pug-rest

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use propsight_common::sandbox::SandboxClient;
use propsight_common::{LookupOutcome, PropertyRecord, PropertyValue, Provenance, PubChemConfig};

use crate::lookup::{LookupError, PropertyLookupClient};
use crate::normalizer::StructureKey;
use crate::resolver::NameResolver;

/// Fault code PubChem uses for "no compound matched the query".
const NOT_FOUND_FAULT: &str = "PUGREST.NotFound";

/// Field names PubChem has used for the canonical SMILES column.
const SMILES_FIELDS: [&str; 3] = ["CanonicalSMILES", "ConnectivitySMILES", "SMILES"];

/// A parsed property table response.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyTable {
    Rows { record: PropertyRecord, compound_id: Option<u64> },
    Empty,
}

pub struct PubChemClient {
    client: SandboxClient,
    base_url: String,
    properties: Vec<String>,
    synonym_timeout: Duration,
}

impl PubChemClient {
    pub fn new(client: SandboxClient, config: &PubChemConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            properties: config.properties.clone(),
            synonym_timeout: config.synonym_timeout(),
        }
    }

    /// POST a form and return the status plus the decoded JSON body.
    /// Bodies that are not JSON decode to `Value::Null`.
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<(StatusCode, Value), LookupError> {
        let resp = self.client.post(url)?.form(form).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok((status, body))
    }

    async fn query_properties(&self, smiles: &str) -> Result<PropertyTable, LookupError> {
        let url = format!(
            "{}/compound/smiles/property/{}/JSON",
            self.base_url,
            self.properties.join(",")
        );
        let (status, body) = self.post_form(&url, &[("smiles", smiles)]).await?;

        if status == StatusCode::NOT_FOUND || is_not_found_fault(&body) {
            return Ok(PropertyTable::Empty);
        }
        if !status.is_success() {
            return Err(LookupError::Status { status: status.as_u16(), message: fault_message(&body) });
        }
        parse_property_table(&body)
    }

    async fn query_synonym(&self, smiles: &str) -> Result<Option<String>, LookupError> {
        let url = format!("{}/compound/smiles/synonyms/JSON", self.base_url);
        let (status, body) = self.post_form(&url, &[("smiles", smiles)]).await?;
        if !status.is_success() {
            return Err(LookupError::Status { status: status.as_u16(), message: fault_message(&body) });
        }
        Ok(pick_synonym(&body))
    }
}

#[async_trait]
impl PropertyLookupClient for PubChemClient {
    #[instrument(skip_all, fields(key = %key))]
    async fn lookup(&self, key: &StructureKey) -> LookupOutcome {
        let (record, compound_id) = match self.query_properties(key.as_str()).await {
            Ok(PropertyTable::Rows { record, compound_id }) => (record, compound_id),
            Ok(PropertyTable::Empty) => {
                info!("Compound absent from PubChem");
                return LookupOutcome::NotFound;
            }
            Err(e) => {
                warn!(error = %e, "PubChem property query failed");
                return LookupOutcome::ServiceError(e.to_string());
            }
        };

        // best-effort: a failed or slow synonym query never demotes the hit
        let query = self.query_synonym(key.as_str());
        let synonym = match tokio::time::timeout(self.synonym_timeout, query).await {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                debug!(error = %e, "PubChem synonym query failed");
                None
            }
            Err(_) => {
                let timeout_secs = self.synonym_timeout.as_secs();
                debug!(timeout_secs, "PubChem synonym query timed out");
                None
            }
        };

        debug!(properties = record.len(), ?compound_id, ?synonym, "PubChem hit");
        LookupOutcome::Found { record, synonym, compound_id }
    }
}

#[async_trait]
impl NameResolver for PubChemClient {
    #[instrument(skip(self))]
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, LookupError> {
        let url = format!("{}/compound/name/property/CanonicalSMILES/JSON", self.base_url);
        let (status, body) = self.post_form(&url, &[("name", name)]).await?;

        if status == StatusCode::NOT_FOUND || is_not_found_fault(&body) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LookupError::Status { status: status.as_u16(), message: fault_message(&body) });
        }
        Ok(parse_smiles_table(&body))
    }
}

// ── Response parsing ─────────────────────────────────────────────────────────

/// True when the body is a PUG REST fault meaning "no such compound".
pub fn is_not_found_fault(body: &Value) -> bool {
    body["Fault"]["Code"].as_str() == Some(NOT_FOUND_FAULT)
}

fn fault_message(body: &Value) -> String {
    let fault = &body["Fault"];
    match (fault["Code"].as_str(), fault["Message"].as_str()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => "no fault details".to_string(),
    }
}

/// First row of a `PropertyTable` response. `CID` is split out; a CID of 0
/// is PubChem's placeholder for "no compound" and counts as empty, as does
/// a row holding no property besides the CID.
pub fn parse_property_table(body: &Value) -> Result<PropertyTable, LookupError> {
    let rows = body["PropertyTable"]["Properties"]
        .as_array()
        .ok_or_else(|| LookupError::Parse("missing PropertyTable.Properties".to_string()))?;

    let Some(row) = rows.first() else {
        return Ok(PropertyTable::Empty);
    };
    let fields = row
        .as_object()
        .ok_or_else(|| LookupError::Parse("property row is not an object".to_string()))?;

    let compound_id = fields.get("CID").and_then(Value::as_u64);
    if compound_id == Some(0) {
        return Ok(PropertyTable::Empty);
    }

    let record = PropertyRecord::from_entries(
        Provenance::Database,
        fields
            .iter()
            .filter(|(k, _)| k.as_str() != "CID")
            .filter_map(|(k, v)| PropertyValue::from_json(v).map(|v| (k.clone(), v))),
    );
    if record.is_empty() {
        return Ok(PropertyTable::Empty);
    }
    Ok(PropertyTable::Rows { record, compound_id })
}

/// Canonical SMILES from a name → property response.
pub fn parse_smiles_table(body: &Value) -> Option<String> {
    let row = &body["PropertyTable"]["Properties"][0];
    SMILES_FIELDS
        .iter()
        .filter_map(|f| row[*f].as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First synonym that is a single word.
pub fn pick_synonym(body: &Value) -> Option<String> {
    body["InformationList"]["Information"][0]["Synonym"]
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty() && s.split_whitespace().count() == 1)
        .map(str::to_string)
}
