//! PubChem adapter against a local stub of the PUG REST endpoints.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_test::{assert_err, assert_ok};

use propsight_common::sandbox::SandboxClient;
use propsight_common::{
    InputKind, LookupOutcome, PropertyValue, Provenance, PubChemConfig, ResolverConfig,
};
use propsight_molecules::{
    Collaborators, DescriptorPredictor, NameResolver, PropertyLookupClient, PubChemClient,
    ResolutionOrchestrator, SmilesToolkit, StructureKey, StructureNormalizer,
};

// ── Stub server ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct StubDb {
    rows: HashMap<String, Value>,
    synonyms: HashMap<String, Vec<String>>,
    names: HashMap<String, String>,
    busy: HashSet<String>,
    garbled: HashSet<String>,
    synonyms_down: bool,
    synonyms_delay: Option<Duration>,
}

fn not_found() -> (StatusCode, String) {
    let body = json!({"Fault": {"Code": "PUGREST.NotFound", "Message": "No CID found"}});
    (StatusCode::NOT_FOUND, body.to_string())
}

async fn properties(
    State(db): State<Arc<StubDb>>,
    Path(props): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    let smiles = form.get("smiles").cloned().unwrap_or_default();
    if db.busy.contains(&smiles) {
        let body = json!({"Fault": {"Code": "PUGREST.ServerBusy", "Message": "Too many requests"}});
        return (StatusCode::SERVICE_UNAVAILABLE, body.to_string());
    }
    if db.garbled.contains(&smiles) {
        return (StatusCode::OK, "<html>maintenance</html>".to_string());
    }
    let Some(row) = db.rows.get(&smiles) else {
        return not_found();
    };

    let mut out = serde_json::Map::new();
    out.insert("CID".to_string(), row["CID"].clone());
    for prop in props.split(',') {
        if let Some(v) = row.get(prop) {
            out.insert(prop.to_string(), v.clone());
        }
    }
    let body = json!({"PropertyTable": {"Properties": [Value::Object(out)]}});
    (StatusCode::OK, body.to_string())
}

async fn synonyms(
    State(db): State<Arc<StubDb>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    if db.synonyms_down {
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    if let Some(delay) = db.synonyms_delay {
        tokio::time::sleep(delay).await;
    }
    let smiles = form.get("smiles").cloned().unwrap_or_default();
    match db.synonyms.get(&smiles) {
        Some(list) => {
            let body = json!({"InformationList": {"Information": [{"CID": 1, "Synonym": list}]}});
            (StatusCode::OK, body.to_string())
        }
        None => not_found(),
    }
}

async fn name_lookup(
    State(db): State<Arc<StubDb>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    let name = form.get("name").cloned().unwrap_or_default();
    match db.names.get(&name) {
        Some(smiles) => {
            let body = json!({"PropertyTable": {"Properties": [{"CID": 1, "CanonicalSMILES": smiles}]}});
            (StatusCode::OK, body.to_string())
        }
        None => not_found(),
    }
}

async fn spawn_stub(db: StubDb) -> String {
    let app = Router::new()
        .route("/rest/pug/compound/smiles/property/{props}/JSON", post(properties))
        .route("/rest/pug/compound/smiles/synonyms/JSON", post(synonyms))
        .route("/rest/pug/compound/name/property/CanonicalSMILES/JSON", post(name_lookup))
        .with_state(Arc::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/rest/pug", addr)
}

fn key(smiles: &str) -> StructureKey {
    StructureNormalizer::default().normalize(smiles).unwrap()
}

fn ethanol_db() -> StubDb {
    let ethanol = key("CCO").to_string();
    let mut db = StubDb::default();
    db.rows.insert(
        ethanol.clone(),
        json!({"CID": 702, "MolecularWeight": "46.07", "XLogP": -0.1, "TPSA": 20.2}),
    );
    db.synonyms.insert(
        ethanol.clone(),
        vec!["ethyl alcohol".to_string(), "ethanol".to_string(), "Alcohol".to_string()],
    );
    db.names.insert("ethanol".to_string(), "CCO".to_string());
    db.busy.insert(key("CCCl").to_string());
    db.garbled.insert(key("CCBr").to_string());
    db
}

fn client(base_url: &str) -> PubChemClient {
    let config = PubChemConfig { base_url: base_url.to_string(), ..PubChemConfig::default() };
    PubChemClient::new(SandboxClient::new().unwrap(), &config)
}

// ── Lookup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lookup_found_with_synonym() {
    let base = spawn_stub(ethanol_db()).await;
    let outcome = client(&base).lookup(&key("OCC")).await;

    let LookupOutcome::Found { record, synonym, compound_id } = outcome else {
        panic!("expected a hit, got {:?}", outcome);
    };
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["MolecularWeight", "XLogP"]);
    assert_eq!(record.get("MolecularWeight"), Some(&PropertyValue::Text("46.07".to_string())));
    assert_eq!(record.provenance(), Provenance::Database);
    assert_eq!(synonym.as_deref(), Some("ethanol"));
    assert_eq!(compound_id, Some(702));
}

#[tokio::test]
async fn test_lookup_absent_compound_is_not_found() {
    let base = spawn_stub(ethanol_db()).await;
    let outcome = client(&base).lookup(&key("CCCCCCCCCCCCCCCC")).await;
    assert_eq!(outcome, LookupOutcome::NotFound);
}

#[tokio::test]
async fn test_lookup_busy_service_is_service_error() {
    let base = spawn_stub(ethanol_db()).await;
    match client(&base).lookup(&key("CCCl")).await {
        LookupOutcome::ServiceError(reason) => {
            assert!(reason.contains("503"), "{}", reason);
            assert!(reason.contains("PUGREST.ServerBusy"), "{}", reason);
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_garbled_body_is_service_error() {
    let base = spawn_stub(ethanol_db()).await;
    let outcome = client(&base).lookup(&key("CCBr")).await;
    assert!(matches!(outcome, LookupOutcome::ServiceError(_)), "{:?}", outcome);
}

#[tokio::test]
async fn test_synonym_failure_does_not_demote_hit() {
    let mut db = ethanol_db();
    db.synonyms_down = true;
    let base = spawn_stub(db).await;

    let outcome = client(&base).lookup(&key("CCO")).await;
    let LookupOutcome::Found { synonym, .. } = outcome else {
        panic!("expected a hit, got {:?}", outcome);
    };
    assert_eq!(synonym, None);
}

#[tokio::test]
async fn test_slow_synonym_query_is_cut_short() {
    let mut db = ethanol_db();
    db.synonyms_delay = Some(Duration::from_secs(10));
    let base = spawn_stub(db).await;

    let config = PubChemConfig {
        base_url: base,
        synonym_timeout_secs: 1,
        ..PubChemConfig::default()
    };
    let client = PubChemClient::new(SandboxClient::new().unwrap(), &config);

    let started = Instant::now();
    let outcome = client.lookup(&key("CCO")).await;
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());

    let LookupOutcome::Found { record, synonym, .. } = outcome else {
        panic!("expected a hit, got {:?}", outcome);
    };
    assert_eq!(synonym, None);
    assert_eq!(record.get("XLogP"), Some(&PropertyValue::Number(-0.1)));
}

#[tokio::test]
async fn test_unreachable_service_is_service_error() {
    // bound then dropped, so nothing listens on this port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = client(&format!("http://{}/rest/pug", addr)).lookup(&key("CCO")).await;
    assert!(matches!(outcome, LookupOutcome::ServiceError(_)), "{:?}", outcome);
}

#[tokio::test]
async fn test_host_outside_allowlist_is_refused() {
    let outcome = client("https://pubchem.example.org/rest/pug").lookup(&key("CCO")).await;
    match outcome {
        LookupOutcome::ServiceError(reason) => assert!(reason.contains("allowlist"), "{}", reason),
        other => panic!("expected service error, got {:?}", other),
    }
}

// ── Name resolution ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolve_known_and_unknown_names() {
    let base = spawn_stub(ethanol_db()).await;
    let pubchem = client(&base);

    let known = assert_ok!(pubchem.resolve_name("ethanol").await);
    assert_eq!(known.as_deref(), Some("CCO"));

    let unknown = assert_ok!(pubchem.resolve_name("unobtainium").await);
    assert_eq!(unknown, None);
}

#[tokio::test]
async fn test_resolve_name_transport_failure_is_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert_err!(client(&format!("http://{}/rest/pug", addr)).resolve_name("ethanol").await);
}

// ── Full pipeline ───────────────────────────────────────────────────────────

fn orchestrator(base: &str) -> ResolutionOrchestrator {
    let mut config = ResolverConfig::default();
    config.pubchem.base_url = base.to_string();
    let pubchem = Arc::new(client(base));
    ResolutionOrchestrator::new(
        Collaborators {
            toolkit: Arc::new(SmilesToolkit),
            names: pubchem.clone(),
            lookup: pubchem,
            predictor: Arc::new(DescriptorPredictor::new()),
        },
        &config,
    )
}

#[tokio::test]
async fn test_pipeline_name_to_database_hit() {
    let base = spawn_stub(ethanol_db()).await;
    let compound = orchestrator(&base).resolve("ethanol", InputKind::FreeTextName).await.unwrap();

    assert_eq!(compound.provenance, Provenance::Database);
    assert_eq!(compound.display_name.text(), "ethanol");
    assert_eq!(compound.compound_id, Some(702));
}

#[tokio::test]
async fn test_pipeline_unknown_compound_is_predicted_locally() {
    let base = spawn_stub(ethanol_db()).await;
    let compound = orchestrator(&base)
        .resolve("CC(=O)Oc1ccccc1C(=O)O", InputKind::StructureNotation)
        .await
        .unwrap();

    assert_eq!(compound.provenance, Provenance::Predicted);
    assert!(compound.record.contains("molecular_weight"));
    assert!(compound.record.contains("QED"));
    assert!(compound.display_name.text().starts_with("PSID=1/C9H8O4/"));
}
