//! Pure helpers: endpoint paths and error bodies (no HTTP, no status logic).

use url::form_urlencoded::byte_serialize;

/// Build the `get_cases` endpoint with its query arguments.
///
/// TestRail routes on the query string, so arguments are appended with `&`
/// rather than starting a new `?` component.
pub(crate) fn get_cases_endpoint(
    project_id: u64,
    suite_id: u64,
    section_id: Option<u64>,
    filter: Option<&str>,
) -> String {
    let mut endpoint = format!("get_cases/{}&suite_id={}", project_id, suite_id);
    if let Some(section_id) = section_id {
        endpoint.push_str(&format!("&section_id={}", section_id));
    }
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        endpoint.push_str("&filter=");
        endpoint.extend(byte_serialize(filter.as_bytes()));
    }
    endpoint
}

/// Extract a readable message from a TestRail error body.
///
/// Expected format: `{"error": "Field :suite_id is not a valid test suite."}`
pub(crate) fn parse_error_body(body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.chars().take(200).collect()
    }
}
