//! Test doubles and fixtures for the propsight workspace.
//!
//! Every double counts its calls so tests can assert which collaborators a
//! request touched.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use propsight_common::{LookupOutcome, PropertyRecord, Provenance, ResolverConfig};
use propsight_molecules::{
    Collaborators, LookupError, NameResolver, PredictionEngine, PredictionError,
    PropertyLookupClient, ResolutionOrchestrator, SmilesToolkit, StructureKey,
};

// ── Name resolution ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNameResolver {
    names: HashMap<String, String>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, smiles: &str) -> Self {
        self.names.insert(name.to_string(), smiles.to_string());
        self
    }

    /// Every call fails at the transport level.
    pub fn failing(reason: &str) -> Self {
        Self { failure: Some(reason.to_string()), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for MockNameResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(LookupError::Status { status: 503, message: reason.clone() });
        }
        Ok(self.names.get(name).cloned())
    }
}

// ── Property lookup ─────────────────────────────────────────────────────────

pub struct MockLookupClient {
    outcome: LookupOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl MockLookupClient {
    fn returning(outcome: LookupOutcome) -> Self {
        Self { outcome, delay: None, calls: AtomicUsize::new(0), keys: Mutex::new(Vec::new()) }
    }

    pub fn found(record: PropertyRecord, synonym: Option<&str>) -> Self {
        Self::returning(LookupOutcome::found(record, synonym.map(str::to_string)))
    }

    pub fn found_with_cid(record: PropertyRecord, synonym: Option<&str>, cid: u64) -> Self {
        Self::returning(LookupOutcome::Found {
            record,
            synonym: synonym.map(str::to_string),
            compound_id: Some(cid),
        })
    }

    pub fn not_found() -> Self {
        Self::returning(LookupOutcome::NotFound)
    }

    pub fn service_error(reason: &str) -> Self {
        Self::returning(LookupOutcome::ServiceError(reason.to_string()))
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Structure keys received, in call order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().map(|k| k.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PropertyLookupClient for MockLookupClient {
    async fn lookup(&self, key: &StructureKey) -> LookupOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut keys) = self.keys.lock() {
            keys.push(key.as_str().to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

// ── Prediction ──────────────────────────────────────────────────────────────

pub struct MockPredictionEngine {
    result: Result<PropertyRecord, PredictionError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockPredictionEngine {
    pub fn returning(record: PropertyRecord) -> Self {
        Self { result: Ok(record), delay: None, calls: AtomicUsize::new(0) }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(PredictionError::Computation(reason.to_string())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionEngine for MockPredictionEngine {
    async fn predict(&self, _key: &StructureKey) -> Result<PropertyRecord, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────────

/// What the database reports for ethanol.
pub fn ethanol_database_record() -> PropertyRecord {
    PropertyRecord::new(Provenance::Database)
        .with("MolecularWeight", 46.07)
        .with("LogP", -0.31)
}

/// A model prediction for ethanol carrying one percentile annotation.
pub fn ethanol_prediction() -> PropertyRecord {
    PropertyRecord::new(Provenance::Predicted)
        .with("MolecularWeight", 46.07)
        .with("LogP", -0.31)
        .with("Lipinski_drugbank_approved_percentile", 0.9)
}

/// Handles to the doubles wired into an orchestrator.
pub struct Harness {
    pub names: Arc<MockNameResolver>,
    pub lookup: Arc<MockLookupClient>,
    pub predictor: Arc<MockPredictionEngine>,
    pub orchestrator: ResolutionOrchestrator,
}

impl Harness {
    pub fn new(names: MockNameResolver, lookup: MockLookupClient, predictor: MockPredictionEngine) -> Self {
        Self::with_config(names, lookup, predictor, &ResolverConfig::default())
    }

    pub fn with_config(
        names: MockNameResolver,
        lookup: MockLookupClient,
        predictor: MockPredictionEngine,
        config: &ResolverConfig,
    ) -> Self {
        let names = Arc::new(names);
        let lookup = Arc::new(lookup);
        let predictor = Arc::new(predictor);
        let orchestrator = ResolutionOrchestrator::new(
            Collaborators {
                toolkit: Arc::new(SmilesToolkit),
                names: names.clone(),
                lookup: lookup.clone(),
                predictor: predictor.clone(),
            },
            config,
        );
        Self { names, lookup, predictor, orchestrator }
    }

    /// Total outbound calls across all doubles.
    pub fn external_calls(&self) -> usize {
        self.names.calls() + self.lookup.calls() + self.predictor.calls()
    }
}
