//! Error handling.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ndarray_stats::errors::QuantileError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;
use tracing::{event, Level};

use crate::models::SampleError;

/// SWOT visualisation server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum SwotVisError {
    /// Allowed origins pattern is not a valid regular expression
    #[error("allowed origins pattern is not valid")]
    AllowOrigins(#[from] regex::Error),

    /// Invalid combination of pairings
    #[error("pairing output {name} conflicts with another output or axis column")]
    PairingConflict { name: String },

    /// Pairing text could not be parsed
    #[error("invalid pairing {pairing}: {reason}")]
    InvalidPairing { pairing: String, reason: String },

    /// Error validating a missing data descriptor
    #[error("missing data descriptor is not valid")]
    MissingInvalid(#[from] validator::ValidationError),

    /// Timed out waiting for HydroCron
    #[error("request to HydroCron timed out")]
    ProxyTimeout,

    /// Error connecting to HydroCron
    #[error("error connecting to HydroCron: {error}")]
    ProxyConnection { error: String },

    /// Any other error while forwarding a request to HydroCron
    #[error("internal server error: {error}")]
    ProxyInternal { error: String },

    /// Error computing a quantile
    #[error("failed to compute quantile")]
    Quantile(#[from] QuantileError),

    /// Error deserialising request data
    #[error("request data is not valid")]
    RequestDataJsonRejection(#[from] JsonRejection),

    /// Error deserialising query parameters
    #[error("query parameters are not valid")]
    QueryRejection(#[from] QueryRejection),

    /// Pairing references a variable that does not exist
    #[error("unknown node variable {variable}")]
    Schema { variable: String },

    /// Error acquiring a semaphore
    #[error("error acquiring resources")]
    SemaphoreAcquireError(#[from] AcquireError),

    /// Error joining a blocking computation task
    #[error("computation task failed")]
    TaskJoin(#[from] JoinError),

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// A node sample failed validation
    #[error("node {node} of pass {pass} is not valid")]
    Validation {
        pass: usize,
        node: usize,
        #[source]
        source: SampleError,
    },
}

impl From<reqwest::Error> for SwotVisError {
    /// Classify a [reqwest::Error] raised while talking to HydroCron.
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SwotVisError::ProxyTimeout
        } else if error.is_connect() || error.is_request() {
            SwotVisError::ProxyConnection {
                error: error.to_string(),
            }
        } else {
            SwotVisError::ProxyInternal {
                error: error.to_string(),
            }
        }
    }
}

impl IntoResponse for SwotVisError {
    /// Convert from a `SwotVisError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Return a 502 bad gateway ErrorResponse
    fn bad_gateway<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_GATEWAY, error)
    }

    /// Return a 504 gateway timeout ErrorResponse
    fn gateway_timeout<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::GATEWAY_TIMEOUT, error)
    }
}

impl From<SwotVisError> for ErrorResponse {
    /// Convert from a `SwotVisError` into an `ErrorResponse`.
    fn from(error: SwotVisError) -> Self {
        let response = match &error {
            // Bad request
            SwotVisError::PairingConflict { name: _ }
            | SwotVisError::InvalidPairing {
                pairing: _,
                reason: _,
            }
            | SwotVisError::MissingInvalid(_)
            | SwotVisError::RequestDataJsonRejection(_)
            | SwotVisError::QueryRejection(_)
            | SwotVisError::Schema { variable: _ }
            | SwotVisError::Validation {
                pass: _,
                node: _,
                source: _,
            } => Self::bad_request(&error),

            // Bad gateway
            SwotVisError::ProxyConnection { error: _ } => Self::bad_gateway(&error),

            // Gateway timeout
            SwotVisError::ProxyTimeout => Self::gateway_timeout(&error),

            // Internal server error
            SwotVisError::AllowOrigins(_)
            | SwotVisError::ProxyInternal { error: _ }
            | SwotVisError::Quantile(_)
            | SwotVisError::SemaphoreAcquireError(_)
            | SwotVisError::TaskJoin(_)
            | SwotVisError::TryFromInt(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
