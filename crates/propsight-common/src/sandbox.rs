use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use crate::error::PropsightError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that only allows requests to approved hosts.
/// Every outbound call made during a resolution goes through one of these.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist and a 30 s request timeout.
    pub fn new() -> Result<Self, PropsightError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with the default allowlist and the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, PropsightError> {
        let mut allowlist = HashSet::new();
        let domains = [
            "pubchem.ncbi.nlm.nih.gov", // PubChem PUG REST
            "localhost",                // local ADMET service
            "127.0.0.1",                // Localhost alt
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("propsight/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        if self.allowlist.insert(domain.to_string()) {
            debug!(domain = %domain, "Domain added to sandbox allowlist");
        }
    }

    /// Allows the host of a configured endpoint URL.
    pub fn allow_endpoint(&mut self, endpoint: &str) -> Result<(), PropsightError> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| PropsightError::Config(format!("Invalid endpoint URL {}: {}", endpoint, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| PropsightError::Config(format!("Endpoint URL has no host: {}", endpoint)))?;
        self.allow_domain(host);
        Ok(())
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed host
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// POST builder, refused when the host is not allowlisted.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, PropsightError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    fn check(&self, url: &str) -> Result<(), PropsightError> {
        if !self.is_allowed(url) {
            warn!(url = %url, "Outbound request refused by sandbox");
            return Err(PropsightError::Sandbox(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }
        Ok(())
    }
}
