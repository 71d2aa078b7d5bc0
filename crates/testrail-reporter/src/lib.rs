//! TestRail reporter: publishes test run results to a TestRail instance.
//!
//! This crate translates a local test session into TestRail v2 API calls:
//!
//! - Create a run (all suite cases, or only cases matching a section/filter)
//! - Or publish into an existing run supplied by configuration
//! - Attach results for cases in one batched request
//! - Narrow the run's case set after execution
//! - Close or delete the run
//!
//! # Quick Start
//!
//! ```no_run
//! use testrail_reporter::{RunPublisher, TestRailConfig, TestResult};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut publisher = RunPublisher::new(TestRailConfig::from_env()?)?;
//!
//! publisher.create_run("Nightly", "Automated nightly regression").await?;
//! let results = vec![TestResult::passed(101), TestResult::failed(102).with_comment("timeout")];
//!
//! // Reporting must never fail the test run; the harness decides.
//! if let Err(e) = publisher.publish_results(&results).await {
//!     eprintln!("TestRail publishing failed: {e}");
//! }
//! publisher.close_run().await.ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `TESTRAIL_HOST` | Instance URL, e.g. `https://acme.testrail.io` |
//! | `TESTRAIL_PROJECT_ID` / `TESTRAIL_SUITE_ID` | Target project and suite |
//! | `TESTRAIL_USERNAME` / `TESTRAIL_PASSWORD` | Basic auth (password or API key) |
//! | `TESTRAIL_GROUP_ID` / `TESTRAIL_FILTER` | Narrow the case set |
//! | `TESTRAIL_RUN_ID` | Publish into an existing run |
//! | `TESTRAIL_INCLUDE_ALL` | `false` to attach only matching cases |
//! | `TESTRAIL_TIMEOUT` | Request timeout in seconds (default: none) |
//!
//! A YAML or JSON file with the same camelCase keys a harness would pass
//! (`host`, `projectId`, `includeAllInTestRun`, ...) can be loaded with
//! [`TestRailConfig::from_path`].

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod publisher;
pub mod types;

// Re-export main types
pub use auth::Credentials;
pub use client::{TestRailClient, REPORTER_USER_AGENT};
pub use config::TestRailConfig;
pub use error::{ReporterError, ReporterResult};
pub use publisher::RunPublisher;
pub use types::{
    format_elapsed, AddRunRequest, CaseSummary, PublishReceipt, RunSummary, Status, TestResult,
    UpdateRunRequest,
};
