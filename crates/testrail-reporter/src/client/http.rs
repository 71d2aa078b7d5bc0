//! HTTP layer: request dispatch and status mapping.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::Credentials;
use crate::error::{ReporterError, ReporterResult};

use super::helpers::parse_error_body;

/// HTTP backend for making requests (holds reqwest client, base URL, credentials).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    /// `<host>/index.php?/api/v2`
    pub(crate) base_url: String,
    pub(crate) credentials: Credentials,
}

impl HttpBackend {
    /// GET an endpoint and decode its JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> ReporterResult<T> {
        let response = self.send::<()>(Method::GET, endpoint, None).await?;
        decode(endpoint, response).await
    }

    /// POST a JSON body and decode the JSON response.
    pub(crate) async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> ReporterResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, endpoint, Some(body)).await?;
        decode(endpoint, response).await
    }

    /// POST where the response body is irrelevant. `body: None` sends an empty request.
    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> ReporterResult<()> {
        self.send(Method::POST, endpoint, body).await.map(|_| ())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> ReporterResult<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(method = %method, endpoint = %endpoint, "sending TestRail request");

        let mut request = self.credentials.apply(self.client.request(method, &url));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 | 403 => {
                let body = response.text().await.unwrap_or_default();
                Err(ReporterError::Unauthorized {
                    message: parse_error_body(&body, "invalid credentials or API key"),
                })
            }

            404 => Err(ReporterError::NotFound {
                endpoint: endpoint.to_string(),
            }),

            code => {
                let body = response.text().await.unwrap_or_default();
                Err(ReporterError::Api {
                    status: code,
                    message: parse_error_body(&body, &status.to_string()),
                })
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> ReporterResult<T> {
    let text = response.text().await.map_err(|e| ReporterError::Network {
        message: format!("failed to read response body: {}", e),
    })?;
    serde_json::from_str(&text).map_err(|e| ReporterError::InvalidResponse {
        message: format!("failed to parse {} response: {}", endpoint, e),
    })
}
