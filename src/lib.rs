pub mod accumulate;
pub mod deadline;
pub mod error;
pub mod evaluate;
pub mod executor;
pub mod harvest;
pub mod identity;
pub mod notification;
pub mod scheduler;
pub mod server;
pub mod slack;
pub mod state;
pub mod throttle;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use error::ExecutionError;
use executor::Executor;
use scheduler::Scheduler;
use state::AppState;
use tokio::sync::mpsc;

/// Channel buffer size for scheduler messages
const SCHEDULER_CHANNEL_SIZE: usize = 32;

/// Load config, start the scheduler and executor, and serve HTTP triggers.
///
/// Returns only if startup fails or the HTTP server stops.
pub async fn run() -> Result<(), ExecutionError> {
    let path = state::config_path()?;
    log::info!("Loading config from {}", path.display());
    let config = state::load_config(&path)?;
    let state = Arc::new(AppState::new(config)?);

    let (sender, receiver) = mpsc::channel(SCHEDULER_CHANNEL_SIZE);

    let scheduler = Scheduler::new(state.clone(), sender);
    tokio::spawn(async move { scheduler.run().await });

    let executor = Executor::new(state.clone());
    tokio::spawn(async move { executor.run(receiver).await });

    server::serve(state).await
}
