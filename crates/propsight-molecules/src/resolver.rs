//! Raw input → canonical structure key.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use propsight_common::{InputKind, ResolutionError};

use crate::lookup::LookupError;
use crate::normalizer::{StructureKey, StructureNormalizer};

/// External name → structure lookup.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Structure notation for `name`, or `None` when the service has no match.
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, LookupError>;
}

/// Turns caller input into a [`StructureKey`], calling the name service at
/// most once per request and never retrying.
pub struct IdentifierResolver {
    names: Arc<dyn NameResolver>,
    normalizer: StructureNormalizer,
    timeout: Duration,
}

impl IdentifierResolver {
    pub fn new(names: Arc<dyn NameResolver>, normalizer: StructureNormalizer, timeout: Duration) -> Self {
        Self { names, normalizer, timeout }
    }

    pub fn normalizer(&self) -> &StructureNormalizer {
        &self.normalizer
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, raw: &str, kind: InputKind) -> Result<StructureKey, ResolutionError> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }

        match kind {
            InputKind::StructureNotation => self.normalizer.normalize(input),
            InputKind::FreeTextName => {
                let structure = self.lookup_name(input).await?;
                debug!(name = %input, structure = %structure, "Name resolved");
                self.normalizer.normalize(&structure)
            }
        }
    }

    async fn lookup_name(&self, name: &str) -> Result<String, ResolutionError> {
        let not_resolved = |reason: String| ResolutionError::NameNotResolved(format!("{}: {}", name, reason));

        match tokio::time::timeout(self.timeout, self.names.resolve_name(name)).await {
            Err(_) => {
                warn!(name = %name, timeout_secs = self.timeout.as_secs(), "Name resolution timed out");
                Err(not_resolved(format!("timed out after {}s", self.timeout.as_secs())))
            }
            Ok(Err(e)) => {
                warn!(name = %name, error = %e, "Name resolution service failed");
                Err(not_resolved(e.to_string()))
            }
            Ok(Ok(None)) => {
                info!(name = %name, "Name not known to resolution service");
                Err(not_resolved("no matching compound".to_string()))
            }
            Ok(Ok(Some(s))) if s.trim().is_empty() => {
                warn!(name = %name, "Name resolution returned an empty structure");
                Err(not_resolved("empty structure returned".to_string()))
            }
            Ok(Ok(Some(s))) => Ok(s.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedNames {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NameResolver for FixedNames {
        async fn resolve_name(&self, _name: &str) -> Result<Option<String>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn resolver(answer: Option<&str>) -> (IdentifierResolver, Arc<FixedNames>) {
        let names = Arc::new(FixedNames {
            answer: answer.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let resolver = IdentifierResolver::new(names.clone(), StructureNormalizer::default(), Duration::from_secs(5));
        (resolver, names)
    }

    #[tokio::test]
    async fn test_structure_input_skips_name_service() {
        let (resolver, names) = resolver(None);
        let key = resolver.resolve("OCC", InputKind::StructureNotation).await.unwrap();
        assert_eq!(key, resolver.normalizer().normalize("CCO").unwrap());
        assert_eq!(names.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_name_input_calls_service_once() {
        let (resolver, names) = resolver(Some("CCO"));
        let key = resolver.resolve("ethanol", InputKind::FreeTextName).await.unwrap();
        assert_eq!(key, resolver.normalizer().normalize("CCO").unwrap());
        assert_eq!(names.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_name_is_not_resolved() {
        let (resolver, names) = resolver(None);
        let err = resolver.resolve("notacompound", InputKind::FreeTextName).await.unwrap_err();
        assert_eq!(err.kind(), "name_not_resolved");
        assert_eq!(names.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let (resolver, names) = resolver(Some("CCO"));
        let err = resolver.resolve("  ", InputKind::FreeTextName).await.unwrap_err();
        assert_eq!(err, ResolutionError::EmptyInput);
        assert_eq!(names.calls.load(Ordering::SeqCst), 0);
    }
}
