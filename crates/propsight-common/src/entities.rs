/// Core value types of a resolution request.
/// Everything here is request-scoped: built fresh per resolution and dropped
/// once the caller has consumed the result.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Input kind
// ---------------------------------------------------------------------------

/// How the caller wants the raw input interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Already a SMILES string; only needs validation.
    StructureNotation,
    /// A common or systematic name; needs a name → structure lookup.
    FreeTextName,
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smiles" | "structure" | "structure_notation" => Ok(InputKind::StructureNotation),
            "name" | "iupac" | "free_text_name" => Ok(InputKind::FreeTextName),
            other => Err(format!("unknown input kind '{}' (expected smiles or name)", other)),
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::StructureNotation => write!(f, "smiles"),
            InputKind::FreeTextName => write!(f, "name"),
        }
    }
}

// ---------------------------------------------------------------------------
// Property values and records
// ---------------------------------------------------------------------------

/// A single property value, as reported by the database or the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Convert a JSON scalar. Arrays, objects and nulls have no property form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(PropertyValue::Number),
            serde_json::Value::String(s) => Some(PropertyValue::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(PropertyValue::Text(b.to_string())),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

/// Where a property record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Database,
    Predicted,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Database => write!(f, "database"),
            Provenance::Predicted => write!(f, "predicted"),
        }
    }
}

/// Ordered property name → value mapping plus its provenance.
///
/// Insertion order is preserved; re-inserting an existing key keeps its
/// original position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    provenance: Provenance,
    properties: IndexMap<String, PropertyValue>,
}

impl PropertyRecord {
    pub fn new(provenance: Provenance) -> Self {
        Self { provenance, properties: IndexMap::new() }
    }

    pub fn from_entries<K, V, I>(provenance: Provenance, entries: I) -> Self
    where
        K: Into<String>,
        V: Into<PropertyValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            provenance,
            properties: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Display name
// ---------------------------------------------------------------------------

/// Human-readable label for a resolved compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "text", rename_all = "snake_case")]
pub enum DisplayName {
    /// Short common name reported by the database.
    Synonym(String),
    /// Identifier derived locally from the structure.
    CanonicalId(String),
}

impl DisplayName {
    pub fn text(&self) -> &str {
        match self {
            DisplayName::Synonym(s) | DisplayName::CanonicalId(s) => s,
        }
    }

    pub fn is_synonym(&self) -> bool {
        matches!(self, DisplayName::Synonym(_))
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// ---------------------------------------------------------------------------
// Lookup outcome
// ---------------------------------------------------------------------------

/// Result of one authoritative property lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The database knows the compound. `record` is never empty.
    Found {
        record: PropertyRecord,
        synonym: Option<String>,
        compound_id: Option<u64>,
    },
    /// The query succeeded but the compound is absent.
    NotFound,
    /// Transport, status or parse failure; the compound may or may not exist.
    ServiceError(String),
}

impl LookupOutcome {
    pub fn found(record: PropertyRecord, synonym: Option<String>) -> Self {
        LookupOutcome::Found { record, synonym, compound_id: None }
    }
}

// ---------------------------------------------------------------------------
// Depiction
// ---------------------------------------------------------------------------

/// Opaque request handed to an external structure renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepictionHandle {
    pub structure: String,
    pub width: u32,
    pub height: u32,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
