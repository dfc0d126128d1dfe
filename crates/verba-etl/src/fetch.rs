//! Retrieval of the daily bundle archive, cached on disk by date.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{archive_name, day_code, EtlConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("writing archive to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads one day's bundle into the archive cache.
///
/// The upstream is append-only per date, so an already-cached file is
/// served without a network call and without a staleness check. The
/// fetcher does not retry; retries belong to the orchestrator.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    base_url: String,
    cache_dir: PathBuf,
}

impl Fetcher {
    pub fn new(config: &EtlConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            base_url: config.portal_base_url.clone(),
            cache_dir: config.cache_dir.clone(),
        })
    }

    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(archive_name(date))
    }

    /// Returns the local archive path for `date`, downloading it when the
    /// cache has no copy yet.
    pub async fn fetch(&self, date: NaiveDate) -> Result<PathBuf, FetchError> {
        let path = self.archive_path(date);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(date = %date, path = %path.display(), "archive already cached");
            return Ok(path);
        }

        let url = format!("{}{}", self.base_url, day_code(date));
        debug!(date = %date, url, "downloading daily bundle");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|source| FetchError::Io {
                path: path.display().to_string(),
                source,
            })?;

        info!(date = %date, path = %path.display(), bytes = body.len(), "download completed");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server_url: &str, cache_dir: &std::path::Path) -> EtlConfig {
        EtlConfig {
            portal_base_url: format!("{server_url}/download-de-dados/despesas/"),
            cache_dir: cache_dir.to_path_buf(),
            ..EtlConfig::default()
        }
    }

    #[tokio::test]
    async fn downloads_with_browser_user_agent_and_caches() {
        // wiremock's `header` matcher splits header values on `,` before
        // comparing, which breaks an exact match against a User-Agent that
        // legitimately contains a comma (e.g. "KHTML, like Gecko"). Match
        // via the same split `crate::config::BROWSER_USER_AGENT` would
        // produce so the comparison lines up.
        let expected_ua: Vec<&str> = crate::config::BROWSER_USER_AGENT
            .split(',')
            .map(str::trim)
            .collect();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download-de-dados/despesas/20250116"))
            .and(headers("user-agent", expected_ua))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04fake".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(&config_for(&server.uri(), cache.path())).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();

        let path = fetcher.fetch(date).await.unwrap();
        assert!(path.ends_with("despesas_20250116.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04fake");

        // Second call must be served from cache; the mock expects one hit.
        let again = fetcher.fetch(date).await.unwrap();
        assert_eq!(path, again);
    }

    #[tokio::test]
    async fn non_success_status_maps_to_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(&config_for(&server.uri(), cache.path())).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();

        match fetcher.fetch(date).await {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(!fetcher.archive_path(date).exists());
    }
}
