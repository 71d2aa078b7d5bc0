//! Stateless TestRail API client, one method per remote action.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tracing::debug;

use crate::config::TestRailConfig;
use crate::error::{ReporterError, ReporterResult};
use crate::types::{
    AddResultsRequest, AddRunRequest, CaseListing, RunSummary, TestResult, UpdateRunRequest,
};

mod helpers;
mod http;

use helpers::get_cases_endpoint;
use http::HttpBackend;

/// User-Agent sent with every request.
pub const REPORTER_USER_AGENT: &str = concat!("testrail-reporter/", env!("CARGO_PKG_VERSION"));

/// TestRail v2 API client.
#[derive(Debug, Clone)]
pub struct TestRailClient {
    http: HttpBackend,
}

impl TestRailClient {
    /// Build a client for the host, credentials and timeout in `config`.
    pub fn new(config: &TestRailConfig) -> ReporterResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(REPORTER_USER_AGENT));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        // Zero would fail every request; treat it as unset.
        if let Some(secs) = config.timeout_secs.filter(|secs| *secs > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| ReporterError::Network {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.api_base(),
                credentials: config.credentials(),
            },
        })
    }

    /// List case ids of a suite, optionally narrowed to a section and filter.
    pub async fn get_cases(
        &self,
        project_id: u64,
        suite_id: u64,
        section_id: Option<u64>,
        filter: Option<&str>,
    ) -> ReporterResult<Vec<u64>> {
        let endpoint = get_cases_endpoint(project_id, suite_id, section_id, filter);
        debug!(endpoint = %endpoint, "fetching cases");

        let listing: CaseListing = self.http.get_json(&endpoint).await?;
        Ok(listing.into_ids())
    }

    /// Create a run; returns its id.
    pub async fn add_run(&self, project_id: u64, request: &AddRunRequest) -> ReporterResult<u64> {
        let endpoint = format!("add_run/{}", project_id);
        debug!(
            endpoint = %endpoint,
            include_all = request.include_all,
            cases = request.case_ids.len(),
            "creating run"
        );

        let run: RunSummary = self.http.post_json(&endpoint, request).await?;
        Ok(run.id)
    }

    pub async fn update_run(&self, run_id: u64, request: &UpdateRunRequest) -> ReporterResult<()> {
        let endpoint = format!("update_run/{}", run_id);
        debug!(endpoint = %endpoint, cases = request.case_ids.len(), "updating run");

        self.http.post(&endpoint, Some(request)).await
    }

    /// Attach results to their cases in one batched request.
    pub async fn add_results_for_cases(
        &self,
        run_id: u64,
        results: &[TestResult],
    ) -> ReporterResult<()> {
        let endpoint = format!("add_results_for_cases/{}", run_id);
        debug!(endpoint = %endpoint, results = results.len(), "adding results");

        self.http
            .post(&endpoint, Some(&AddResultsRequest { results }))
            .await
    }

    pub async fn close_run(&self, run_id: u64) -> ReporterResult<()> {
        let endpoint = format!("close_run/{}", run_id);
        debug!(endpoint = %endpoint, "closing run");

        self.http.post::<()>(&endpoint, None).await
    }

    pub async fn delete_run(&self, run_id: u64) -> ReporterResult<()> {
        let endpoint = format!("delete_run/{}", run_id);
        debug!(endpoint = %endpoint, "deleting run");

        self.http.post::<()>(&endpoint, None).await
    }

    /// `<host>/index.php?/api/v2`
    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn username(&self) -> &str {
        self.http.credentials.username()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_config() {
        let config = TestRailConfig::new("https://acme.testrail.io/", 1, 2, "ci", "key");
        let client = TestRailClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://acme.testrail.io/index.php?/api/v2");
        assert_eq!(client.username(), "ci");
    }

    #[test]
    fn test_user_agent_shape() {
        assert!(REPORTER_USER_AGENT.starts_with("testrail-reporter/"));
    }
}
