//! Command Line Interface (CLI) arguments.

use crate::error::SwotVisError;
use crate::models::{parse_pairings, Pairing};
use crate::types::Missing;

use clap::Parser;
use std::time::Duration;
use url::Url;

/// Default HydroCron timeseries endpoint
pub const DEFAULT_HYDROCRON_URL: &str =
    "https://soto.podaac.earthdatacloud.nasa.gov/hydrocron/v1/timeseries";

/// SWOT visualisation server command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "SWOTVIS_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "SWOTVIS_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "SWOTVIS_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/swotvis/certs/cert.pem",
        env = "SWOTVIS_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/swotvis/certs/key.pem",
        env = "SWOTVIS_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for operations to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "SWOTVIS_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "SWOTVIS_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Whether to use Rayon for execution of CPU-bound tasks.
    #[arg(long, default_value_t = false, env = "SWOTVIS_USE_RAYON")]
    pub use_rayon: bool,
    /// Optional limit on the number of concurrent computations. Defaults to one less than the
    /// number of CPUs.
    #[arg(long, env = "SWOTVIS_THREAD_LIMIT")]
    pub thread_limit: Option<usize>,
    /// Regular expression matching the origins allowed to make cross-origin requests
    #[arg(long, default_value = ".*", env = "SWOTVIS_ALLOW_ORIGINS")]
    pub allow_origins: String,
    /// URL of the HydroCron timeseries endpoint
    #[arg(long, default_value = DEFAULT_HYDROCRON_URL, env = "SWOTVIS_HYDROCRON_URL")]
    pub hydrocron_url: Url,
    /// Maximum time in seconds to wait for a HydroCron response
    #[arg(long, default_value_t = 30, env = "SWOTVIS_HYDROCRON_TIMEOUT")]
    pub hydrocron_timeout: u64,
    /// Optional limit on the number of concurrent HydroCron requests
    #[arg(long, env = "SWOTVIS_CONNECTION_LIMIT_HYDROCRON")]
    pub connection_limit_hydrocron: Option<usize>,
    /// Comma separated variable pairings, each `[<output>=]<target>@<axis>[:<precision>]`
    #[arg(
        long,
        default_value = "wse@p_dist_out,width@p_dist_out,area_total@p_dist_out",
        env = "SWOTVIS_PAIRINGS"
    )]
    pub pairings: String,
    /// Values treated as missing data. Sentinels are treated literally if unset.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        env = "SWOTVIS_MISSING_VALUES"
    )]
    pub missing_values: Vec<f64>,
    /// Values below this are treated as missing data
    #[arg(long, allow_negative_numbers = true, env = "SWOTVIS_VALID_MIN")]
    pub valid_min: Option<f64>,
    /// Values above this are treated as missing data
    #[arg(long, allow_negative_numbers = true, env = "SWOTVIS_VALID_MAX")]
    pub valid_max: Option<f64>,
}

impl CommandLineArgs {
    /// Returns the configured pairings.
    pub fn pairings(&self) -> Result<Vec<Pairing>, SwotVisError> {
        parse_pairings(&self.pairings)
    }

    /// Returns the configured missing data descriptor, if any.
    pub fn missing(&self) -> Option<Missing> {
        Missing::from_parts(&self.missing_values, self.valid_min, self.valid_max)
    }

    /// Returns the HydroCron request timeout.
    pub fn hydrocron_timeout(&self) -> Duration {
        Duration::from_secs(self.hydrocron_timeout)
    }
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
