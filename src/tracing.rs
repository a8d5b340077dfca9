//! Tracing (logging)

use crate::cli::CommandLineArgs;

use opentelemetry::global;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initlialise tracing (logging)
///
/// Applies a filter based on the `RUST_LOG` environment variable, falling back to enable debug
/// logging for this crate and tower_http if not set. When Jaeger is enabled, spans are also
/// exported to a Jaeger agent.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn init_tracing(args: &CommandLineArgs) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "swotvis=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());
    if args.enable_jaeger {
        global::set_text_map_propagator(opentelemetry_jaeger::Propagator::new());
        match opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name("swotvis")
            .install_simple()
        {
            Ok(tracer) => registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init(),
            Err(error) => {
                registry.init();
                tracing::error!("failed to install Jaeger pipeline: {}", error);
            }
        }
    } else {
        registry.init();
    }
}

/// Shutdown tracing
///
/// Flushes any spans not yet exported.
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}
