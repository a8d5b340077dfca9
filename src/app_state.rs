use crate::aggregator::Aggregator;
use crate::cli::CommandLineArgs;
use crate::error::SwotVisError;
use crate::hydrocron::HydroCronClient;
use crate::resource_manager::ResourceManager;

use std::sync::Arc;

/// Shared application state passed to each request handler.
#[derive(Debug)]
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Resource manager.
    pub resource_manager: ResourceManager,

    /// Aggregator configured with the default pairings and missing data policy.
    pub aggregator: Aggregator,

    /// HydroCron client.
    pub hydrocron: HydroCronClient,
}

impl AppState {
    /// Create and return an [AppState].
    ///
    /// Fails if the configured pairings or missing data descriptor are not valid.
    pub fn new(args: &CommandLineArgs) -> Result<Self, SwotVisError> {
        let task_limit = args
            .thread_limit
            .or_else(|| Some(num_cpus::get().saturating_sub(1).max(1)));
        let resource_manager = ResourceManager::new(args.connection_limit_hydrocron, task_limit);
        let aggregator = Aggregator::new(args.pairings()?, args.missing())?;
        let hydrocron = HydroCronClient::new(args.hydrocron_url.clone(), args.hydrocron_timeout());

        Ok(Self {
            args: args.clone(),
            resource_manager,
            aggregator,
            hydrocron,
        })
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
