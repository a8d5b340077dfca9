//! HydroCron timeseries pass-through.
//!
//! The front end cannot call HydroCron directly from the browser, so timeseries requests are
//! forwarded unchanged and the upstream response relayed back. Nothing is cached or retried.

use crate::error::SwotVisError;
use crate::metrics::HYDROCRON_REQUESTS;
use crate::resource_manager::ResourceManager;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default HydroCron output format
pub const DEFAULT_OUTPUT: &str = "geojson";

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Query parameters of a HydroCron timeseries request
///
/// Optional parameters are only forwarded when set to a non-empty value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimeseriesParams {
    /// Feature type, e.g. `Reach` or `Node`
    pub feature: String,
    /// Feature identifier
    pub feature_id: String,
    /// Start of the time range
    pub start_time: String,
    /// End of the time range
    pub end_time: String,
    /// Output format
    #[serde(default = "default_output")]
    pub output: String,
    /// Comma separated list of fields to return
    #[serde(default, skip_serializing_if = "is_blank")]
    pub fields: Option<String>,
    /// Whether to return a compact response
    #[serde(default, skip_serializing_if = "is_blank")]
    pub compact: Option<String>,
    /// Name of the collection to query
    #[serde(default, skip_serializing_if = "is_blank")]
    pub collection_name: Option<String>,
}

impl TimeseriesParams {
    /// Returns whether CSV output was requested.
    pub fn is_csv(&self) -> bool {
        self.output == "csv"
    }
}

/// Response relayed from HydroCron
#[derive(Clone, Debug, PartialEq)]
pub enum ProxyResponse {
    /// Upstream returned 200; the body is relayed verbatim.
    Ok { body: String, content_type: mime::Mime },
    /// Upstream returned an error status; the detail is relayed as JSON.
    Upstream { status: u16, detail: Value },
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        match self {
            ProxyResponse::Ok { body, content_type } => (
                StatusCode::OK,
                [(&header::CONTENT_TYPE, content_type.to_string())],
                body,
            )
                .into_response(),
            ProxyResponse::Upstream { status, detail } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(detail),
            )
                .into_response(),
        }
    }
}

/// Returns whether a response declares a JSON body.
fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map_or(false, |mime| mime.essence_str() == mime::APPLICATION_JSON.essence_str())
}

/// Build the detail of an upstream error response.
///
/// JSON bodies are relayed as is. Any other body becomes a JSON string, with the upstream
/// `statusText` header appended if present.
async fn error_detail(response: reqwest::Response) -> Result<Value, SwotVisError> {
    let json = is_json(&response);
    let status_text = response
        .headers()
        .get("statusText")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let text = response.text().await?;
    let detail = if json {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    } else {
        Value::String(text)
    };
    Ok(match (detail, status_text) {
        (Value::String(text), Some(status_text)) => Value::String(format!("{text}: {status_text}")),
        (detail, _) => detail,
    })
}

/// Metric label of a proxy outcome.
fn outcome(result: &Result<ProxyResponse, SwotVisError>) -> &'static str {
    match result {
        Ok(ProxyResponse::Ok { .. }) => "ok",
        Ok(ProxyResponse::Upstream { .. }) => "upstream_error",
        Err(SwotVisError::ProxyTimeout) => "timeout",
        Err(SwotVisError::ProxyConnection { .. }) => "connection_error",
        Err(_) => "internal_error",
    }
}

/// HydroCron client.
#[derive(Debug)]
pub struct HydroCronClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HydroCronClient {
    /// Create a new HydroCron client.
    ///
    /// # Arguments
    ///
    /// * `url`: URL of the HydroCron timeseries endpoint
    /// * `timeout`: Maximum time to wait for a complete response
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            timeout,
        }
    }

    /// Forward a timeseries request to HydroCron.
    ///
    /// # Arguments
    ///
    /// * `params`: Query parameters to forward
    /// * `resource_manager`: ResourceManager object
    #[tracing::instrument(level = "DEBUG", skip(self, resource_manager))]
    pub async fn timeseries(
        &self,
        params: &TimeseriesParams,
        resource_manager: &ResourceManager,
    ) -> Result<ProxyResponse, SwotVisError> {
        // Acquire connection permit to be freed via drop when this function returns
        let _conn_permits = resource_manager.hydrocron_connection().await?;
        let result = self.forward(params).await;
        HYDROCRON_REQUESTS
            .with_label_values(&[outcome(&result)])
            .inc();
        result
    }

    async fn forward(&self, params: &TimeseriesParams) -> Result<ProxyResponse, SwotVisError> {
        let request = self
            .client
            .get(self.url.as_str())
            .query(params)
            .timeout(self.timeout);
        let response = request.send().await?;
        tracing::debug!(url = %response.url(), status = %response.status(), "HydroCron response");
        match response.status() {
            reqwest::StatusCode::OK => {
                let content_type = if params.is_csv() {
                    mime::TEXT_PLAIN_UTF_8
                } else {
                    mime::APPLICATION_JSON
                };
                Ok(ProxyResponse::Ok {
                    body: response.text().await?,
                    content_type,
                })
            }
            status => Ok(ProxyResponse::Upstream {
                status: status.as_u16(),
                detail: error_detail(response).await?,
            }),
        }
    }
}
