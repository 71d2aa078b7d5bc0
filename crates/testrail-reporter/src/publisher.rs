//! Stateful run publisher: create a run, publish results into it, close it.
//!
//! Every operation returns its failure to the caller and also logs it, so a
//! harness can ignore reporting errors without losing them. A failed call
//! never leaves a half-set run id behind.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use tracing::{error, info, warn};

use crate::client::TestRailClient;
use crate::config::TestRailConfig;
use crate::error::{ReporterError, ReporterResult};
use crate::types::{AddRunRequest, PublishReceipt, TestResult, UpdateRunRequest};

#[derive(Debug, Clone)]
struct RunState {
    run_id: Option<u64>,
    description: Option<String>,
    include_all: bool,
    case_ids: Vec<u64>,
    cases_fetched: bool,
}

/// Publishes one test session's results into a single TestRail run.
///
/// The run id is set at most once, by [`create_run`](Self::create_run), and
/// every later call targets it. Operations that need a run fail with
/// [`ReporterError::NoActiveRun`] before touching the network if none is set.
pub struct RunPublisher {
    config: TestRailConfig,
    client: TestRailClient,
    state: RunState,
    console: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for RunPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunPublisher")
            .field("config", &self.config)
            .field("client", &self.client)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RunPublisher {
    pub fn new(config: TestRailConfig) -> ReporterResult<Self> {
        config.validate()?;
        let client = TestRailClient::new(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// Use a pre-built client (e.g. one shared between publishers).
    pub fn with_client(config: TestRailConfig, client: TestRailClient) -> Self {
        let state = RunState {
            run_id: None,
            description: None,
            include_all: config.include_all_in_test_run,
            case_ids: Vec::new(),
            cases_fetched: false,
        };
        Self {
            config,
            client,
            state,
            console: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Redirect confirmation lines (stdout by default).
    pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
        self.console = Mutex::new(Box::new(console));
        self
    }

    /// Case ids matching the configured suite, section and filter.
    ///
    /// An empty `Ok` means nothing matched; a failed lookup is an `Err`.
    pub async fn fetch_applicable_cases(&self) -> ReporterResult<Vec<u64>> {
        let result = self
            .client
            .get_cases(
                self.config.project_id,
                self.config.suite_id,
                self.config.group_id,
                self.config.filter.as_deref(),
            )
            .await;
        logged("fetch_applicable_cases", result)
    }

    /// Create the run, or adopt the configured `runId` without any request.
    ///
    /// With `includeAllInTestRun: false` the matching case ids are fetched
    /// first (once per publisher) and sent as the run's case set. If that
    /// lookup fails no run is created.
    pub async fn create_run(&mut self, name: &str, description: &str) -> ReporterResult<u64> {
        if let Some(run_id) = self.state.run_id {
            return logged(
                "create_run",
                Err(ReporterError::RunAlreadyActive { run_id }),
            );
        }

        if let Some(run_id) = self.config.run_id {
            info!(run_id, "publishing into existing run");
            self.state.run_id = Some(run_id);
            self.state.description = Some(description.to_string());
            return Ok(run_id);
        }

        if !self.state.include_all && !self.state.cases_fetched {
            self.state.case_ids = self.fetch_applicable_cases().await?;
            self.state.cases_fetched = true;
        }

        let request = AddRunRequest {
            suite_id: self.config.suite_id,
            name: name.to_string(),
            description: description.to_string(),
            include_all: self.state.include_all,
            case_ids: self.state.case_ids.clone(),
        };

        let run_id = logged(
            "create_run",
            self.client.add_run(self.config.project_id, &request).await,
        )?;

        info!(
            run_id,
            run_name = name,
            include_all = request.include_all,
            cases = request.case_ids.len(),
            "created test run"
        );
        self.state.run_id = Some(run_id);
        self.state.description = Some(request.description);
        Ok(run_id)
    }

    /// Replace the run's case set, then publish `results` into it.
    ///
    /// Results are only published once the update has succeeded.
    pub async fn update_run(
        &mut self,
        case_ids: &[u64],
        results: &[TestResult],
    ) -> ReporterResult<Option<PublishReceipt>> {
        let run_id = logged("update_run", self.active_run())?;

        let request = UpdateRunRequest {
            suite_id: self.config.suite_id,
            description: self.state.description.clone().unwrap_or_default(),
            include_all: false,
            case_ids: case_ids.to_vec(),
        };
        logged(
            "update_run",
            self.client.update_run(run_id, &request).await,
        )?;

        info!(run_id, cases = case_ids.len(), "updated test run");
        self.state.include_all = false;
        self.state.case_ids = request.case_ids;

        self.publish_results(results).await
    }

    /// Attach `results` to the run in a single request.
    ///
    /// Empty input is a no-op and returns `Ok(None)` even without a run.
    pub async fn publish_results(
        &self,
        results: &[TestResult],
    ) -> ReporterResult<Option<PublishReceipt>> {
        if results.is_empty() {
            return Ok(None);
        }
        let run_id = logged("publish_results", self.active_run())?;

        logged(
            "publish_results",
            self.client.add_results_for_cases(run_id, results).await,
        )?;

        let receipt = PublishReceipt {
            run_id,
            published: results.len(),
            run_url: self.config.run_url(run_id),
        };
        info!(run_id, results = receipt.published, url = %receipt.run_url, "published results");
        self.announce(format_args!("\n (TestRail Reporter)\n\n  - {}\n", receipt));
        Ok(Some(receipt))
    }

    pub async fn close_run(&self) -> ReporterResult<()> {
        let run_id = logged("close_run", self.active_run())?;
        logged("close_run", self.client.close_run(run_id).await)?;

        info!(run_id, "closed test run");
        self.announce(format_args!("- Test run closed successfully"));
        Ok(())
    }

    pub async fn delete_run(&self) -> ReporterResult<()> {
        let run_id = logged("delete_run", self.active_run())?;
        logged("delete_run", self.client.delete_run(run_id).await)?;

        info!(run_id, "deleted test run");
        Ok(())
    }

    /// Active run id, once created or adopted.
    pub fn run_id(&self) -> Option<u64> {
        self.state.run_id
    }

    pub fn description(&self) -> Option<&str> {
        self.state.description.as_deref()
    }

    pub fn includes_all(&self) -> bool {
        self.state.include_all
    }

    /// Case set sent with the last create/update (empty while including all).
    pub fn case_ids(&self) -> &[u64] {
        &self.state.case_ids
    }

    /// Web UI link to the active run.
    pub fn run_url(&self) -> Option<String> {
        self.state.run_id.map(|id| self.config.run_url(id))
    }

    pub fn config(&self) -> &TestRailConfig {
        &self.config
    }

    fn active_run(&self) -> ReporterResult<u64> {
        self.state.run_id.ok_or(ReporterError::NoActiveRun)
    }

    fn announce(&self, message: fmt::Arguments<'_>) {
        let mut console = self.console.lock().unwrap_or_else(|poisoned| {
            warn!("reporter output lock was poisoned; recovering");
            poisoned.into_inner()
        });
        if let Err(e) = writeln!(console, "{}", message).and_then(|_| console.flush()) {
            warn!(error = %e, "failed to write reporter output");
        }
    }
}

fn logged<T>(operation: &'static str, result: ReporterResult<T>) -> ReporterResult<T> {
    if let Err(e) = &result {
        error!(operation, error = %e, "TestRail operation failed");
    }
    result
}
