//! Web application: routes, request handlers and middleware.

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::error::SwotVisError;
use crate::formatter::NodeSeriesStatistics;
use crate::hydrocron::{ProxyResponse, TimeseriesParams};
use crate::metrics::{self, NODE_SAMPLES};
use crate::models::{parse_pairings, SeriesCollection};
use crate::validated_json::ValidatedJson;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{request::Parts, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Layer;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// `axum::Router` wrapped in `NormalizePath` so that trailing slashes are accepted.
pub type Service = NormalizePath<Router>;

/// Query parameters of a compute request
#[derive(Debug, Default, Deserialize)]
struct ComputeParams {
    /// Comma separated pairings overriding the configured pairings
    pairings: Option<String>,
}

/// Initialise the application
///
/// Builds the global Rayon thread pool when a thread limit is given.
pub fn init(args: &CommandLineArgs) {
    if let Some(thread_limit) = args.thread_limit {
        if let Err(error) = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_limit)
            .build_global()
        {
            tracing::warn!("failed to initialise Rayon thread pool: {}", error);
        }
    }
}

/// Returns a CORS layer allowing origins which match the configured pattern.
///
/// The whole origin must match. Credentials are allowed, and requested methods and headers are
/// mirrored back.
fn cors(args: &CommandLineArgs) -> Result<CorsLayer, SwotVisError> {
    let origins = Regex::new(&format!("^(?:{})$", args.allow_origins))?;
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        origin
            .to_str()
            .map_or(false, |origin| origins.is_match(origin))
    });
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Returns a [axum::Router] for the application.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn router(args: &CommandLineArgs) -> Result<Router, SwotVisError> {
    let state: SharedAppState = Arc::new(AppState::new(args)?);

    fn data() -> Router<SharedAppState> {
        Router::new()
            .route("/compute_node_series", post(compute_node_series))
            .route("/hydrocron/timeseries", get(hydrocron_timeseries))
    }

    Ok(Router::new()
        .route("/test", get(test))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/data", data())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .on_request(metrics::request_counter)
                        .on_response(metrics::record_response_metrics),
                )
                .layer(cors(args)?),
        )
        .with_state(state))
}

/// Returns a [crate::app::Service] for the application.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn service(args: &CommandLineArgs) -> Result<Service, SwotVisError> {
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router(args)?))
}

/// Liveness endpoint
async fn test() -> Json<Value> {
    Json(json!({"message": "Hello, world!"}))
}

/// Compute binned node series statistics
///
/// The computation runs on the Rayon pool or on Tokio's blocking pool, so that it does not hold
/// up the async runtime.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `params`: Query parameters, optionally overriding the configured pairings
/// * `collection`: Validated pass-grouped node observations
#[tracing::instrument(skip(state, collection), fields(samples = collection.len()))]
async fn compute_node_series(
    State(state): State<SharedAppState>,
    params: Result<Query<ComputeParams>, QueryRejection>,
    ValidatedJson(collection): ValidatedJson<SeriesCollection>,
) -> Result<Json<NodeSeriesStatistics>, SwotVisError> {
    let Query(params) = params?;
    let aggregator = match params.pairings.as_deref() {
        Some(pairings) => state.aggregator.with_pairings(parse_pairings(pairings)?)?,
        None => state.aggregator.clone(),
    };
    NODE_SAMPLES.inc_by(u64::try_from(collection.len())?);

    let statistics = if state.args.use_rayon {
        tokio_rayon::spawn(move || aggregator.compute(&collection)).await?
    } else {
        // Acquire a task permit to be freed via drop when the computation completes
        let _task_permit = state.resource_manager.task().await?;
        tokio::task::spawn_blocking(move || aggregator.compute(&collection)).await??
    };
    Ok(Json(statistics))
}

/// Forward a timeseries request to HydroCron
#[tracing::instrument(skip(state))]
async fn hydrocron_timeseries(
    State(state): State<SharedAppState>,
    params: Result<Query<TimeseriesParams>, QueryRejection>,
) -> Result<ProxyResponse, SwotVisError> {
    let Query(params) = params?;
    state
        .hydrocron
        .timeseries(&params, &state.resource_manager)
        .await
}
