//! Authoritative property lookup port.

use async_trait::async_trait;
use thiserror::Error;

use propsight_common::{LookupOutcome, PropsightError};

use crate::normalizer::StructureKey;

/// Failures of a remote database call. The adapters fold these into
/// [`LookupOutcome::ServiceError`] or a `NameNotResolved` resolution error.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error(transparent)]
    Sandbox(#[from] PropsightError),
}

/// Queries a remote compound database for known properties and a synonym.
///
/// Implementations never fail: transport, status and parse problems are
/// reported as [`LookupOutcome::ServiceError`], a well-formed "no such
/// compound" answer as [`LookupOutcome::NotFound`].
#[async_trait]
pub trait PropertyLookupClient: Send + Sync {
    async fn lookup(&self, key: &StructureKey) -> LookupOutcome;
}
