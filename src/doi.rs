//! Batched DOI verification against the bulk lookup service.
//!
//! All distinct identifiers referenced by a target set are resolved up
//! front, in fixed-size batches, before any per-record validation begins.
//! The resulting [`VerificationCache`] is the only thing per-record checks
//! ever consult: by the time records are validated, no network traffic
//! remains. A batch that exhausts its retries marks every identifier it
//! carries as unverified - inability to confirm a citation is treated as
//! the citation being invalid.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::{Result, ValidationError};

/// Batch ceiling documented by the lookup service.
pub const LOOKUP_BATCH_CAPACITY: usize = 500;

/// Bulk endpoint used when none is configured.
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://api.crossref.org/works/batch";

/// Retry rule for a lookup attempt: capped attempt count, exponentially
/// growing delay, and a predicate selecting which failures are worth
/// retrying at all.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Factor applied to the delay after each further failed attempt.
    pub multiplier: u32,
    /// Which failures justify another attempt.
    pub retryable: fn(&ValidationError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            retryable: is_transient,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `failed_attempts` failures.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(failed_attempts.saturating_sub(1))
    }
}

/// Rate limiting and no-response failures are transient; anything else
/// (malformed request, validation errors from the service) is terminal on
/// the first occurrence.
fn is_transient(error: &ValidationError) -> bool {
    match error {
        ValidationError::HttpStatus { status, .. } => *status == 429,
        ValidationError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        ValidationError::Timeout { .. } => true,
        _ => false,
    }
}

/// Run an operation under a retry policy, sleeping between attempts.
pub async fn attempt_with_policy<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failed = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                failed += 1;
                if failed >= policy.max_attempts || !(policy.retryable)(&error) {
                    return Err(error);
                }
                let delay = policy.delay_for(failed);
                debug!(attempt = failed, ?delay, "lookup attempt failed, retrying: {error}");
                sleep(delay).await;
            }
        }
    }
}

/// Transport for the bulk identifier lookup. The HTTP implementation talks
/// to the real service; tests inject scripted responses.
pub trait DoiLookup {
    /// Resolve one batch, returning a found/not-found flag per identifier
    /// in request order. Transport failures surface as errors.
    async fn lookup_batch(&self, dois: &[String]) -> Result<Vec<bool>>;
}

impl<L: DoiLookup + Sync> DoiLookup for Arc<L> {
    async fn lookup_batch(&self, dois: &[String]) -> Result<Vec<bool>> {
        (**self).lookup_batch(dois).await
    }
}

/// Configuration for the HTTP lookup transport.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Bulk endpoint URL.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// User agent string.
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            timeout_seconds: 30,
            user_agent: format!("validate-claims/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Serialize)]
struct BulkLookupRequest<'a> {
    dois: &'a [String],
}

#[derive(Deserialize)]
struct BulkLookupResponse {
    /// One slot per requested identifier: a found-record object or null.
    results: Vec<Option<serde_json::Value>>,
}

/// HTTP transport for the bulk lookup service.
pub struct HttpDoiLookup {
    client: Client,
    config: LookupConfig,
}

impl HttpDoiLookup {
    pub fn new(config: LookupConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(ValidationError::from)?;
        Ok(Self { client, config })
    }
}

impl DoiLookup for HttpDoiLookup {
    async fn lookup_batch(&self, dois: &[String]) -> Result<Vec<bool>> {
        let request = self
            .client
            .post(&self.config.endpoint)
            .json(&BulkLookupRequest { dois })
            .send();

        let response = timeout(Duration::from_secs(self.config.timeout_seconds), request)
            .await
            .map_err(|_| ValidationError::Timeout {
                url: self.config.endpoint.clone(),
                timeout_seconds: self.config.timeout_seconds,
            })?
            .map_err(ValidationError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidationError::HttpStatus {
                url: self.config.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: BulkLookupResponse = response.json().await.map_err(ValidationError::from)?;
        if body.results.len() != dois.len() {
            return Err(ValidationError::LookupResponse {
                details: format!(
                    "expected {} result slots, got {}",
                    dois.len(),
                    body.results.len()
                ),
            });
        }
        Ok(body.results.iter().map(Option::is_some).collect())
    }
}

/// Verification outcomes for every identifier referenced by a run.
///
/// Written only by [`BatchVerifier::resolve`]; read-only once validation
/// begins. A missing entry means the identifier never went through the
/// resolution phase and must be treated as unverified.
#[derive(Debug, Clone, Default)]
pub struct VerificationCache {
    entries: HashMap<String, bool>,
}

impl VerificationCache {
    pub fn get(&self, doi: &str) -> Option<bool> {
        self.entries.get(doi).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, doi: String, verified: bool) {
        self.entries.insert(doi, verified);
    }
}

/// Resolves the distinct identifier set for a run in fixed-size batches.
pub struct BatchVerifier<L: DoiLookup> {
    lookup: L,
    policy: RetryPolicy,
    batch_capacity: usize,
}

impl<L: DoiLookup> BatchVerifier<L> {
    pub fn new(lookup: L, policy: RetryPolicy) -> Self {
        Self {
            lookup,
            policy,
            batch_capacity: LOOKUP_BATCH_CAPACITY,
        }
    }

    /// Override the batch ceiling. Tests exercise batching with small
    /// capacities; production keeps the service ceiling.
    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity.clamp(1, LOOKUP_BATCH_CAPACITY);
        self
    }

    /// Resolve every identifier: one bulk request per batch, transient
    /// failures retried under the policy. Never fails the run - a batch
    /// that exhausts its retries is marked unverified wholesale, and later
    /// batches still run.
    pub async fn resolve(&self, dois: &BTreeSet<String>) -> VerificationCache {
        let mut cache = VerificationCache::default();
        if dois.is_empty() {
            return cache;
        }

        let identifiers: Vec<String> = dois.iter().cloned().collect();
        debug!(
            identifiers = identifiers.len(),
            batches = identifiers.len().div_ceil(self.batch_capacity),
            "resolving identifiers"
        );

        for batch in identifiers.chunks(self.batch_capacity) {
            match attempt_with_policy(&self.policy, || self.lookup.lookup_batch(batch)).await {
                Ok(found) => {
                    for (doi, verified) in batch.iter().zip(found) {
                        cache.insert(doi.clone(), verified);
                    }
                }
                Err(error) => {
                    warn!(
                        "batch lookup failed, marking {} identifiers unverified: {error}",
                        batch.len()
                    );
                    for doi in batch {
                        cache.insert(doi.clone(), false);
                    }
                }
            }
        }
        cache
    }
}
