//! This file defines the swotvis binary entry point.

use swotvis::app;
use swotvis::cli;
use swotvis::metrics;
use swotvis::server;
use swotvis::tracing;

use std::process::exit;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    ::tracing::info!("{:?}", args);
    metrics::register_metrics();
    app::init(&args);
    let service = match app::service(&args) {
        Ok(service) => service,
        Err(error) => {
            ::tracing::error!("invalid configuration: {}", error);
            exit(1)
        }
    };
    server::serve(&args, service).await;
    tracing::shutdown_tracing();
}
