//! Wire types for the TestRail v2 API.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TestRail built-in result statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Passed,
    Blocked,
    Untested,
    Retest,
    Failed,
    /// Instance-defined status (ids 6+).
    Custom(u32),
}

impl Status {
    pub fn id(self) -> u32 {
        match self {
            Self::Passed => 1,
            Self::Blocked => 2,
            Self::Untested => 3,
            Self::Retest => 4,
            Self::Failed => 5,
            Self::Custom(id) => id,
        }
    }
}

impl From<u32> for Status {
    fn from(id: u32) -> Self {
        match id {
            1 => Self::Passed,
            2 => Self::Blocked,
            3 => Self::Untested,
            4 => Self::Retest,
            5 => Self::Failed,
            other => Self::Custom(other),
        }
    }
}

/// Outcome of one case, forwarded verbatim to `add_results_for_cases`.
///
/// Absent optional fields are omitted from the payload. Fields this type
/// does not model (e.g. `custom_*` result fields) round-trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub case_id: u64,

    pub status_id: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// TestRail timespan, e.g. `"1m 5s"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,

    /// Comma-separated defect ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defects: Option<String>,

    /// Build or version tested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TestResult {
    pub fn new(case_id: u64, status: Status) -> Self {
        Self {
            case_id,
            status_id: status.id(),
            comment: None,
            elapsed: None,
            defects: None,
            version: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn passed(case_id: u64) -> Self {
        Self::new(case_id, Status::Passed)
    }

    pub fn failed(case_id: u64) -> Self {
        Self::new(case_id, Status::Failed)
    }

    pub fn status(&self) -> Status {
        Status::from(self.status_id)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set `elapsed` from a duration. Zero durations leave it unset.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = format_elapsed(elapsed);
        self
    }

    pub fn with_defects(mut self, defects: impl Into<String>) -> Self {
        self.defects = Some(defects.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Attach an arbitrary field such as `custom_step_results`.
    ///
    /// Keys this type already models are written to their typed field so the
    /// payload never carries a duplicate key. A modeled key with a value of
    /// the wrong JSON type is dropped; `null` clears an optional field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let key = key.into();
        match key.as_str() {
            "case_id" => match value.as_u64() {
                Some(id) => self.case_id = id,
                None => ignored_field(&key),
            },
            "status_id" => match value.as_u64().and_then(|id| u32::try_from(id).ok()) {
                Some(id) => self.status_id = id,
                None => ignored_field(&key),
            },
            "comment" => set_text(&mut self.comment, &key, value),
            "elapsed" => set_text(&mut self.elapsed, &key, value),
            "defects" => set_text(&mut self.defects, &key, value),
            "version" => set_text(&mut self.version, &key, value),
            _ => {
                self.extra.insert(key, value);
            }
        }
        self
    }
}

fn set_text(slot: &mut Option<String>, key: &str, value: serde_json::Value) {
    match value {
        serde_json::Value::String(text) => *slot = Some(text),
        serde_json::Value::Null => *slot = None,
        _ => ignored_field(key),
    }
}

fn ignored_field(key: &str) {
    tracing::warn!(field = key, "ignoring result field with unexpected JSON type");
}

/// Format a duration as a TestRail timespan (`"2h 3m"`, `"1m 5s"`).
///
/// TestRail rejects `0s`, so zero yields `None` and any sub-second non-zero
/// duration rounds up to `"1s"`.
pub fn format_elapsed(elapsed: Duration) -> Option<String> {
    if elapsed.is_zero() {
        return None;
    }
    let secs = elapsed.as_secs().max(1);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    let parts: Vec<String> = [(hours, 'h'), (minutes, 'm'), (seconds, 's')]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    Some(parts.join(" "))
}

/// Body of `add_run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRunRequest {
    pub suite_id: u64,
    pub name: String,
    pub description: String,
    pub include_all: bool,
    pub case_ids: Vec<u64>,
}

/// Body of `update_run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRunRequest {
    pub suite_id: u64,
    pub description: String,
    pub include_all: bool,
    pub case_ids: Vec<u64>,
}

/// Body of `add_results_for_cases`.
#[derive(Debug, Serialize)]
pub(crate) struct AddResultsRequest<'a> {
    pub results: &'a [TestResult],
}

/// One entry of a `get_cases` listing; other case fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CaseSummary {
    pub id: u64,
}

/// Response of `add_run`; other run fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RunSummary {
    pub id: u64,
}

/// `get_cases` body: a bare array on older instances, an envelope with
/// pagination links on newer ones. Only the returned page is read.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CaseListing {
    Bare(Vec<CaseSummary>),
    Paged { cases: Vec<CaseSummary> },
}

impl CaseListing {
    pub(crate) fn into_ids(self) -> Vec<u64> {
        let cases = match self {
            Self::Bare(cases) | Self::Paged { cases } => cases,
        };
        cases.into_iter().map(|c| c.id).collect()
    }
}

/// Confirmation of a successful `publish_results`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub run_id: u64,

    /// Number of result records sent.
    pub published: usize,

    /// Web UI link to the run.
    pub run_url: String,
}

impl fmt::Display for PublishReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Results are published to {}", self.run_url)
    }
}
