//! Reporter configuration.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::error::{ReporterError, ReporterResult};

/// Connection and run settings supplied by the test harness.
///
/// Keys are camelCase so a harness options object deserializes directly.
/// The configuration is never mutated by the publisher; the active run id
/// lives on [`crate::RunPublisher::run_id`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRailConfig {
    /// TestRail instance URL (e.g. `https://acme.testrail.io`).
    pub host: String,

    /// Project the run belongs to.
    pub project_id: u64,

    /// Suite the run is created from.
    pub suite_id: u64,

    /// Restrict case lookup to one section.
    #[serde(default)]
    pub group_id: Option<u64>,

    /// Free-text case filter forwarded to `get_cases`.
    #[serde(default)]
    pub filter: Option<String>,

    pub username: String,

    /// Password or API key.
    pub password: String,

    /// Publish into an existing run instead of creating one.
    #[serde(default)]
    pub run_id: Option<u64>,

    /// Attach every suite case to the run (`true`) or only the cases
    /// matching `group_id`/`filter` (`false`).
    #[serde(default = "default_include_all")]
    pub include_all_in_test_run: bool,

    /// Request timeout in seconds. Unset means requests wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_include_all() -> bool {
    true
}

impl fmt::Debug for TestRailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRailConfig")
            .field("host", &self.host)
            .field("project_id", &self.project_id)
            .field("suite_id", &self.suite_id)
            .field("group_id", &self.group_id)
            .field("filter", &self.filter)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("run_id", &self.run_id)
            .field("include_all_in_test_run", &self.include_all_in_test_run)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl TestRailConfig {
    pub fn new(
        host: impl Into<String>,
        project_id: u64,
        suite_id: u64,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            project_id,
            suite_id,
            group_id: None,
            filter: None,
            username: username.into(),
            password: password.into(),
            run_id: None,
            include_all_in_test_run: default_include_all(),
            timeout_secs: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TESTRAIL_HOST` | Instance URL (required) |
    /// | `TESTRAIL_PROJECT_ID` | Project id (required) |
    /// | `TESTRAIL_SUITE_ID` | Suite id (required) |
    /// | `TESTRAIL_USERNAME` | Username (required) |
    /// | `TESTRAIL_PASSWORD` | Password or API key (required) |
    /// | `TESTRAIL_GROUP_ID` | Section id for case lookup |
    /// | `TESTRAIL_FILTER` | Case filter |
    /// | `TESTRAIL_RUN_ID` | Existing run to publish into |
    /// | `TESTRAIL_INCLUDE_ALL` | `0`/`false` to attach only matching cases |
    /// | `TESTRAIL_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> ReporterResult<Self> {
        let mut config = Self::new(
            env_required("TESTRAIL_HOST")?,
            env_parse("TESTRAIL_PROJECT_ID")?.ok_or_else(|| missing("TESTRAIL_PROJECT_ID"))?,
            env_parse("TESTRAIL_SUITE_ID")?.ok_or_else(|| missing("TESTRAIL_SUITE_ID"))?,
            env_required("TESTRAIL_USERNAME")?,
            env_required("TESTRAIL_PASSWORD")?,
        );
        config.group_id = env_parse("TESTRAIL_GROUP_ID")?;
        config.filter = env_optional("TESTRAIL_FILTER");
        config.run_id = env_parse("TESTRAIL_RUN_ID")?;
        config.timeout_secs = env_parse("TESTRAIL_TIMEOUT")?;
        if let Some(flag) = env_optional("TESTRAIL_INCLUDE_ALL") {
            config.include_all_in_test_run = parse_flag("TESTRAIL_INCLUDE_ALL", &flag)?;
        }
        Ok(config)
    }

    /// Load config from a YAML or JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ReporterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ReporterError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse config from YAML (JSON is accepted as a YAML subset).
    pub fn from_yaml_str(content: &str) -> ReporterResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ReporterError::Config {
            message: format!("failed to parse config: {}", e),
        })
    }

    pub fn with_group_id(mut self, group_id: u64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_run_id(mut self, run_id: u64) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_include_all(mut self, include_all: bool) -> Self {
        self.include_all_in_test_run = include_all;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Check required fields before any request is made.
    pub fn validate(&self) -> ReporterResult<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(config_error("host must not be empty"));
        }
        let parsed = url::Url::parse(host)
            .map_err(|e| config_error(format!("host {:?} is not a valid URL: {}", host, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(config_error(format!(
                "host must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.username.trim().is_empty() {
            return Err(config_error("username must not be empty"));
        }
        if self.project_id == 0 {
            return Err(config_error("projectId must be positive"));
        }
        if self.suite_id == 0 {
            return Err(config_error("suiteId must be positive"));
        }
        if self.group_id == Some(0) {
            return Err(config_error("groupId must be positive"));
        }
        if self.run_id == Some(0) {
            return Err(config_error("runId must be positive"));
        }
        if self.timeout_secs == Some(0) {
            return Err(config_error(
                "timeoutSecs must be positive; leave it unset for no timeout",
            ));
        }
        Ok(())
    }

    /// `<host>/index.php?/api/v2`
    pub fn api_base(&self) -> String {
        format!("{}/index.php?/api/v2", self.host_root())
    }

    /// Web UI link for a run.
    pub fn run_url(&self, run_id: u64) -> String {
        format!("{}/index.php?/runs/view/{}", self.host_root(), run_id)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    fn host_root(&self) -> &str {
        self.host.trim().trim_end_matches('/')
    }
}

fn config_error(message: impl Into<String>) -> ReporterError {
    ReporterError::Config {
        message: message.into(),
    }
}

fn missing(var: &str) -> ReporterError {
    config_error(format!("{} is not set", var))
}

fn env_optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_required(var: &str) -> ReporterResult<String> {
    env_optional(var).ok_or_else(|| missing(var))
}

fn env_parse<T: std::str::FromStr>(var: &str) -> ReporterResult<Option<T>> {
    env_optional(var)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| config_error(format!("{} is not a valid number: {:?}", var, v)))
        })
        .transpose()
}

fn parse_flag(var: &str, value: &str) -> ReporterResult<bool> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(config_error(format!(
            "{} must be true/false/1/0, got {:?}",
            var, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "TESTRAIL_HOST",
        "TESTRAIL_PROJECT_ID",
        "TESTRAIL_SUITE_ID",
        "TESTRAIL_GROUP_ID",
        "TESTRAIL_FILTER",
        "TESTRAIL_USERNAME",
        "TESTRAIL_PASSWORD",
        "TESTRAIL_RUN_ID",
        "TESTRAIL_INCLUDE_ALL",
        "TESTRAIL_TIMEOUT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn set_required_env() {
        std::env::set_var("TESTRAIL_HOST", "https://acme.testrail.io");
        std::env::set_var("TESTRAIL_PROJECT_ID", "3");
        std::env::set_var("TESTRAIL_SUITE_ID", "7");
        std::env::set_var("TESTRAIL_USERNAME", "ci@acme.io");
        std::env::set_var("TESTRAIL_PASSWORD", "api-key");
    }

    #[test]
    fn test_defaults() {
        let config = TestRailConfig::new("https://acme.testrail.io", 1, 2, "u", "p");
        assert!(config.include_all_in_test_run);
        assert!(config.run_id.is_none());
        assert!(config.timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_base_and_run_url_strip_trailing_slash() {
        let config = TestRailConfig::new("https://acme.testrail.io/", 1, 2, "u", "p");
        assert_eq!(
            config.api_base(),
            "https://acme.testrail.io/index.php?/api/v2"
        );
        assert_eq!(
            config.run_url(42),
            "https://acme.testrail.io/index.php?/runs/view/42"
        );
    }

    #[test]
    fn test_builder() {
        let config = TestRailConfig::new("https://acme.testrail.io", 1, 2, "u", "p")
            .with_group_id(9)
            .with_filter("smoke")
            .with_run_id(42)
            .with_include_all(false)
            .with_timeout_secs(15);

        assert_eq!(config.group_id, Some(9));
        assert_eq!(config.filter.as_deref(), Some("smoke"));
        assert_eq!(config.run_id, Some(42));
        assert!(!config.include_all_in_test_run);
        assert_eq!(config.timeout_secs, Some(15));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = TestRailConfig::new("https://acme.testrail.io", 1, 2, "u", "p");

        let mut config = base.clone();
        config.host = "".into();
        assert!(matches!(config.validate(), Err(ReporterError::Config { .. })));

        let mut config = base.clone();
        config.host = "ftp://acme.testrail.io".into();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.host = "acme.testrail.io".into();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.username = " ".into();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.suite_id = 0;
        assert!(config.validate().is_err());

        assert!(base.clone().with_run_id(0).validate().is_err());
        assert!(base.with_group_id(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config =
            TestRailConfig::new("https://acme.testrail.io", 1, 2, "u", "p").with_timeout_secs(0);
        match config.validate() {
            Err(ReporterError::Config { message }) => assert!(message.contains("timeoutSecs")),
            other => panic!("expected Config error, got {:?}", other),
        }

        let config = config.with_timeout_secs(30);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_zero_timeout_fails_validation() {
        clear_env();
        set_required_env();
        std::env::set_var("TESTRAIL_TIMEOUT", "0");

        let config = TestRailConfig::from_env();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.timeout_secs, Some(0));
        assert!(matches!(config.validate(), Err(ReporterError::Config { .. })));
    }

    #[test]
    fn test_from_yaml_str_camel_case_keys() {
        let yaml = r#"
host: https://acme.testrail.io
projectId: 1
suiteId: 2
groupId: 5
filter: smoke
username: ci
password: key
includeAllInTestRun: false
"#;
        let config = TestRailConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.project_id, 1);
        assert_eq!(config.suite_id, 2);
        assert_eq!(config.group_id, Some(5));
        assert_eq!(config.filter.as_deref(), Some("smoke"));
        assert!(!config.include_all_in_test_run);
        assert!(config.run_id.is_none());
    }

    #[test]
    fn test_from_path_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testrail.json");
        std::fs::write(
            &path,
            r#"{"host": "https://acme.testrail.io", "projectId": 1, "suiteId": 2,
                "username": "ci", "password": "key", "runId": 42}"#,
        )
        .unwrap();

        let config = TestRailConfig::from_path(&path).unwrap();
        assert_eq!(config.run_id, Some(42));
        assert!(config.include_all_in_test_run);
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = TestRailConfig::from_path("/nonexistent/testrail.yaml");
        assert!(matches!(result, Err(ReporterError::Config { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = TestRailConfig::new("https://acme.testrail.io", 1, 2, "u", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        set_required_env();
        std::env::set_var("TESTRAIL_FILTER", "regression");
        std::env::set_var("TESTRAIL_INCLUDE_ALL", "false");
        std::env::set_var("TESTRAIL_RUN_ID", "42");

        let config = TestRailConfig::from_env();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.host, "https://acme.testrail.io");
        assert_eq!(config.project_id, 3);
        assert_eq!(config.suite_id, 7);
        assert_eq!(config.filter.as_deref(), Some("regression"));
        assert_eq!(config.run_id, Some(42));
        assert!(!config.include_all_in_test_run);
    }

    #[test]
    #[serial]
    fn test_from_env_missing_required() {
        clear_env();
        set_required_env();
        std::env::remove_var("TESTRAIL_SUITE_ID");

        let result = TestRailConfig::from_env();
        clear_env();

        match result {
            Err(ReporterError::Config { message }) => {
                assert!(message.contains("TESTRAIL_SUITE_ID"))
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_number() {
        clear_env();
        set_required_env();
        std::env::set_var("TESTRAIL_RUN_ID", "latest");

        let result = TestRailConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ReporterError::Config { .. })));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "1").unwrap());
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(!parse_flag("X", "False").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
