//! Resolution orchestrator.
//!
//! Drives one request through
//! `Idle → Resolving → LookingUp → {DatabaseHit | Predicting} → Done`,
//! with `Errored` reachable from every step. Each request owns all of its
//! state; the orchestrator itself is immutable and can serve concurrent
//! requests.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use propsight_common::{
    DepictionHandle, DisplayName, InputKind, LookupOutcome, PropertyRecord, Provenance,
    ResolutionError, ResolverConfig,
};

use crate::admet::{PredictionEngine, PredictionError};
use crate::curation::ResultCurator;
use crate::lookup::PropertyLookupClient;
use crate::normalizer::{ChemToolkit, StructureKey, StructureNormalizer};
use crate::resolver::{IdentifierResolver, NameResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Idle,
    Resolving,
    LookingUp,
    DatabaseHit,
    Predicting,
    Done,
    Errored,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionState::Idle => "idle",
            ResolutionState::Resolving => "resolving",
            ResolutionState::LookingUp => "looking_up",
            ResolutionState::DatabaseHit => "database_hit",
            ResolutionState::Predicting => "predicting",
            ResolutionState::Done => "done",
            ResolutionState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// How the authoritative lookup ended, kept for telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", content = "reason", rename_all = "snake_case")]
pub enum LookupDisposition {
    Hit,
    Absent,
    Unavailable(String),
}

/// Successful result of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCompound {
    pub request_id: Uuid,
    pub structure: StructureKey,
    pub provenance: Provenance,
    pub display_name: DisplayName,
    pub record: PropertyRecord,
    pub depiction: DepictionHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound_id: Option<u64>,
    pub lookup: LookupDisposition,
}

/// Terminal value handed to the presentation layer: exactly one per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Done(ResolvedCompound),
    Errored { error: ResolutionError },
}

impl ResolutionOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ResolutionOutcome::Done(_))
    }
}

/// External capabilities the orchestrator depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub toolkit: Arc<dyn ChemToolkit>,
    pub names: Arc<dyn NameResolver>,
    pub lookup: Arc<dyn PropertyLookupClient>,
    pub predictor: Arc<dyn PredictionEngine>,
}

pub struct ResolutionOrchestrator {
    resolver: IdentifierResolver,
    lookup: Arc<dyn PropertyLookupClient>,
    predictor: Arc<dyn PredictionEngine>,
    curator: ResultCurator,
    lookup_timeout: Duration,
    prediction_timeout: Duration,
}

/// Per-request state tracker; logs every transition.
struct Transitions {
    request_id: Uuid,
    state: ResolutionState,
}

impl Transitions {
    fn new(request_id: Uuid) -> Self {
        Self { request_id, state: ResolutionState::Idle }
    }

    fn advance(&mut self, to: ResolutionState) {
        debug!(request_id = %self.request_id, from = %self.state, to = %to, "State transition");
        self.state = to;
    }

    fn fail(&mut self, error: ResolutionError) -> ResolutionError {
        warn!(request_id = %self.request_id, from = %self.state, kind = error.kind(), error = %error, "Resolution failed");
        self.advance(ResolutionState::Errored);
        error
    }
}

impl ResolutionOrchestrator {
    pub fn new(collaborators: Collaborators, config: &ResolverConfig) -> Self {
        let normalizer = StructureNormalizer::new(collaborators.toolkit).with_depiction_size(
            config.resolution.depiction_width,
            config.resolution.depiction_height,
        );
        Self {
            resolver: IdentifierResolver::new(
                collaborators.names,
                normalizer,
                config.resolution.name_timeout(),
            ),
            lookup: collaborators.lookup,
            predictor: collaborators.predictor,
            curator: ResultCurator::new(config.resolution.excluded_properties.iter().cloned()),
            lookup_timeout: config.resolution.lookup_timeout(),
            prediction_timeout: config.prediction.timeout(),
        }
    }

    /// Run one request and fold the result into a presentation value.
    pub async fn run(&self, raw: &str, kind: InputKind) -> ResolutionOutcome {
        match self.resolve(raw, kind).await {
            Ok(compound) => ResolutionOutcome::Done(compound),
            Err(error) => ResolutionOutcome::Errored { error },
        }
    }

    #[instrument(skip(self), fields(request_id))]
    pub async fn resolve(&self, raw: &str, kind: InputKind) -> Result<ResolvedCompound, ResolutionError> {
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        let mut states = Transitions::new(request_id);

        if raw.trim().is_empty() {
            return Err(states.fail(ResolutionError::EmptyInput));
        }

        states.advance(ResolutionState::Resolving);
        let key = self.resolver.resolve(raw, kind).await.map_err(|e| states.fail(e))?;

        states.advance(ResolutionState::LookingUp);
        let outcome = self.lookup_with_timeout(&key).await;

        let normalizer = self.resolver.normalizer();
        let depiction = normalizer.depiction_request(&key);

        let lookup = match outcome {
            LookupOutcome::Found { record, synonym, compound_id } => {
                states.advance(ResolutionState::DatabaseHit);
                let display_name = match synonym.map(|s| s.trim().to_string()) {
                    Some(s) if !s.is_empty() => DisplayName::Synonym(s),
                    _ => DisplayName::CanonicalId(normalizer.canonical_text_id(&key)),
                };
                info!(request_id = %request_id, structure = %key, properties = record.len(), "Resolved from database");
                states.advance(ResolutionState::Done);
                return Ok(ResolvedCompound {
                    request_id,
                    structure: key,
                    provenance: Provenance::Database,
                    display_name,
                    record,
                    depiction,
                    compound_id,
                    lookup: LookupDisposition::Hit,
                });
            }
            LookupOutcome::NotFound => {
                info!(request_id = %request_id, structure = %key, "Compound not in database, falling back to prediction");
                LookupDisposition::Absent
            }
            LookupOutcome::ServiceError(reason) => {
                warn!(request_id = %request_id, structure = %key, reason = %reason, "Database unavailable, falling back to prediction");
                LookupDisposition::Unavailable(reason)
            }
        };

        states.advance(ResolutionState::Predicting);
        let predicted = self.predict_with_timeout(&key).await.map_err(|e| {
            states.fail(ResolutionError::Prediction(e.to_string()))
        })?;

        let record = self.curator.curate(&predicted);
        if record.is_empty() {
            return Err(states.fail(ResolutionError::Prediction(
                "no properties left after curation".to_string(),
            )));
        }

        info!(request_id = %request_id, structure = %key, properties = record.len(), "Resolved by prediction");
        states.advance(ResolutionState::Done);
        Ok(ResolvedCompound {
            request_id,
            display_name: DisplayName::CanonicalId(normalizer.canonical_text_id(&key)),
            structure: key,
            provenance: Provenance::Predicted,
            record,
            depiction,
            compound_id: None,
            lookup,
        })
    }

    async fn lookup_with_timeout(&self, key: &StructureKey) -> LookupOutcome {
        match tokio::time::timeout(self.lookup_timeout, self.lookup.lookup(key)).await {
            Ok(LookupOutcome::Found { record, .. }) if record.is_empty() => {
                warn!(structure = %key, "Lookup reported a hit with no properties; treating as absent");
                LookupOutcome::NotFound
            }
            Ok(outcome) => outcome,
            Err(_) => LookupOutcome::ServiceError(format!(
                "timed out after {}s",
                self.lookup_timeout.as_secs()
            )),
        }
    }

    async fn predict_with_timeout(&self, key: &StructureKey) -> Result<PropertyRecord, PredictionError> {
        match tokio::time::timeout(self.prediction_timeout, self.predictor.predict(key)).await {
            Ok(result) => result,
            Err(_) => Err(PredictionError::Timeout(self.prediction_timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = ResolutionOutcome::Errored { error: ResolutionError::EmptyInput };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "errored");
        assert_eq!(json["error"]["kind"], "empty_input");
        assert!(!outcome.is_done());
    }

    #[test]
    fn test_lookup_disposition_serialization() {
        let json = serde_json::to_value(LookupDisposition::Unavailable("status 503".into())).unwrap();
        assert_eq!(json["disposition"], "unavailable");
        assert_eq!(json["reason"], "status 503");
        let json = serde_json::to_value(LookupDisposition::Absent).unwrap();
        assert_eq!(json["disposition"], "absent");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ResolutionState::LookingUp.to_string(), "looking_up");
        assert_eq!(ResolutionState::DatabaseHit.to_string(), "database_hit");
    }
}
