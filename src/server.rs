//! Web server

use crate::cli;

use std::{net::SocketAddr, path::PathBuf, process::exit, str::FromStr, time::Duration};

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use tokio::signal;

/// Resolve a TLS file path, exiting if it cannot be found.
fn tls_file(path: &str, description: &str) -> PathBuf {
    let expanded = match expanduser(path) {
        Ok(expanded) => expanded,
        Err(error) => {
            tracing::error!(
                "Failed to expand ~ in {} path '{}': {}. Please provide an absolute path instead.",
                description,
                path,
                error
            );
            exit(1)
        }
    };
    match expanded.canonicalize() {
        Ok(abs_path) => abs_path,
        Err(_) => {
            tracing::error!(
                "{} expected at '{}' but not found.",
                description,
                expanded.display()
            );
            exit(1)
        }
    }
}

/// Serve the SWOT visualisation service
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &cli::CommandLineArgs, service: crate::app::Service) {
    let addr = match SocketAddr::from_str(&format!("{}:{}", args.host, args.port)) {
        Ok(addr) => addr,
        Err(error) => {
            tracing::error!("invalid host name, IP address or port number: {}", error);
            exit(1)
        }
    };

    // Catch ctrl+c and try to shutdown gracefully
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    tracing::info!("listening on {}", addr);
    let result = if args.https {
        let abs_cert_file = tls_file(&args.cert_file, "TLS certificate file");
        let abs_key_file = tls_file(&args.key_file, "TLS key file");
        // Set up TLS config
        let tls_config = match RustlsConfig::from_pem_file(abs_cert_file, abs_key_file).await {
            Ok(tls_config) => tls_config,
            Err(error) => {
                tracing::error!("Failed to load TLS certificate files: {}", error);
                exit(1)
            }
        };
        // run HTTPS server with hyper
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
    } else {
        // run HTTP server with hyper
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
    };
    if let Err(error) = result {
        tracing::error!("server error: {}", error);
        exit(1)
    }
}

/// Graceful shutdown handler
///
/// Installs signal handlers to catch Ctrl-C or SIGTERM and trigger a graceful shutdown.
async fn shutdown_signal(handle: Handle, timeout: u64) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {}", error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
    // Force shutdown if graceful shutdown takes longer than the timeout
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}
