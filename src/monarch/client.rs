use crate::association::RawAssociation;
use crate::cache::ResponseCache;
use crate::config::MonarchConfig;
use crate::error::{BiokgError, Result};
use crate::traversal::{AssociationSource, SourceResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Which side of the queried node the associations are on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Node is the subject
    From,
    /// Node is the object
    To,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::From => "from",
            Direction::To => "to",
        }
    }
}

/// One page of the association endpoint; other keys are ignored
#[derive(Deserialize)]
struct AssociationPage {
    #[serde(default)]
    associations: Vec<RawAssociation>,
}

/// Monarch Initiative BioLink association API client
///
/// Each lookup is attempted a fixed number of times with a fixed delay in
/// between. When all attempts fail the error is logged and the lookup
/// answers with no associations.
pub struct MonarchClient {
    client: Client,
    base_url: Url,
    attempts: usize,
    retry_delay: Duration,
    cache: Option<Arc<ResponseCache>>,
}

impl MonarchClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `BiokgError::Config` when `base_url` is not a valid URL
    ///
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(config: &MonarchConfig) -> Result<Self> {
        Self::new_with_cache(config, None)
    }

    /// Create a new client that consults `cache` before the network
    pub fn new_with_cache(config: &MonarchConfig, cache: Option<Arc<ResponseCache>>) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| BiokgError::Config(format!("invalid monarch.base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BiokgError::Config(format!(
                "monarch.base_url cannot be a base: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to build HTTP client");

        Ok(Self {
            client,
            base_url,
            attempts: config.attempts.max(1),
            retry_delay: config.retry_delay(),
            cache,
        })
    }

    /// `{base}/association/{direction}/{node}?rows=..[&relation=..]`
    pub fn association_url(
        &self,
        direction: Direction,
        node_id: &str,
        relation: Option<&str>,
        rows: usize,
    ) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("association")
                .push(direction.as_str())
                .push(node_id);
        }
        {
            let mut query = url.query_pairs_mut();
            if let Some(relation) = relation {
                query.append_pair("relation", relation);
            }
            query.append_pair("rows", &rows.to_string());
        }
        url
    }

    /// Single request, no retry
    async fn request_once(&self, url: &Url) -> Result<Vec<RawAssociation>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BiokgError::Transport(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(BiokgError::Transport(format!(
                "Monarch API error {}: {}",
                status, body
            )));
        }

        let page: AssociationPage = response
            .json()
            .await
            .map_err(|e| BiokgError::Transport(format!("Failed to parse response: {}", e)))?;
        Ok(page.associations)
    }

    /// Associations on one side of a node, retried, empty on exhaustion
    pub async fn get_associations(
        &self,
        direction: Direction,
        node_id: &str,
        relation: Option<&str>,
        rows: usize,
    ) -> Vec<RawAssociation> {
        let url = self.association_url(direction, node_id, relation, rows);

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(url.as_str()) {
                log::debug!("Cache hit for {}", url);
                return cached;
            }
        }

        let start = std::time::Instant::now();
        let mut attempt = 0;
        loop {
            match self.request_once(&url).await {
                Ok(associations) => {
                    log::debug!(
                        "{} associations {} {} in {:?} (attempt {})",
                        associations.len(),
                        direction.as_str(),
                        node_id,
                        start.elapsed(),
                        attempt + 1
                    );
                    if let Some(cache) = &self.cache {
                        cache.put(url.to_string(), associations.clone());
                    }
                    return associations;
                }
                Err(e) if attempt + 1 < self.attempts => {
                    log::warn!(
                        "Retry {}/{} for {} associations of {} after error: {}",
                        attempt + 1,
                        self.attempts - 1,
                        direction.as_str(),
                        node_id,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "Response values could not be acquired at node {} for {} associations (relation: {:?}, rows: {}): {}",
                        node_id,
                        direction.as_str(),
                        relation,
                        rows,
                        e
                    );
                    return Vec::new();
                }
            }
        }
    }
}

#[async_trait]
impl AssociationSource for MonarchClient {
    async fn associations_for(
        &self,
        node_id: &str,
        relation: Option<&str>,
        rows: usize,
    ) -> SourceResponse {
        let outgoing = self.get_associations(Direction::From, node_id, relation, rows).await;
        let incoming = self.get_associations(Direction::To, node_id, relation, rows).await;
        SourceResponse { outgoing, incoming }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> MonarchConfig {
        MonarchConfig {
            base_url: base_url.to_string(),
            retry_delay_ms: 0,
            timeout_secs: 2,
            ..MonarchConfig::default()
        }
    }

    #[test]
    fn test_association_url() {
        let client = MonarchClient::new(&config("https://api.monarchinitiative.org/api/")).unwrap();
        let url = client.association_url(Direction::From, "HGNC:2928", None, 2000);
        assert_eq!(
            url.as_str(),
            "https://api.monarchinitiative.org/api/association/from/HGNC:2928?rows=2000"
        );

        let url = client.association_url(Direction::To, "MONDO:0010679", Some("RO:HOM0000017"), 10);
        assert_eq!(
            url.as_str(),
            "https://api.monarchinitiative.org/api/association/to/MONDO:0010679?relation=RO%3AHOM0000017&rows=10"
        );
    }

    #[test]
    fn test_association_url_escapes_path() {
        let client = MonarchClient::new(&config("http://localhost:8080/api")).unwrap();
        let url = client.association_url(Direction::From, "weird id/1", None, 5);
        assert_eq!(url.path(), "/api/association/from/weird%20id%2F1");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            MonarchClient::new(&config("not a url")),
            Err(BiokgError::Config(_))
        ));
    }

    #[test]
    fn test_page_without_associations_key() {
        let page: AssociationPage = serde_json::from_str(r#"{"numFound": 0}"#).unwrap();
        assert!(page.associations.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_source_answers_empty() {
        let client = MonarchClient::new(&config("http://127.0.0.1:9/api")).unwrap();
        let response = client.associations_for("HGNC:2928", None, 10).await;
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let cache = Arc::new(ResponseCache::new(16));
        let client =
            MonarchClient::new_with_cache(&config("http://127.0.0.1:9/api"), Some(cache.clone())).unwrap();

        let url = client.association_url(Direction::From, "HGNC:2928", None, 10);
        cache.put(
            url.to_string(),
            vec![RawAssociation {
                id: Some("cached".to_string()),
                ..Default::default()
            }],
        );

        let response = client.associations_for("HGNC:2928", None, 10).await;
        assert_eq!(response.outgoing.len(), 1);
        assert!(response.incoming.is_empty());
        // The failed incoming lookup is not cached
        assert_eq!(cache.len(), 1);
    }
}
