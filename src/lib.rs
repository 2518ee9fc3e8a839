pub mod cli;
mod commands;
pub mod components;
pub mod config;
pub mod error;
pub mod grading;
pub mod logging;
pub mod page;
mod validation;

use std::sync::Arc;

use cli::{Cli, Command};
use config::Config;
use error::AppError;
use grading::{GradingApi, GradingClient};

/// Shared state handed to every command.
pub struct AppState {
    pub config: Config,
    /// Backend client; swapped for an in-memory one in tests.
    pub api: Arc<dyn GradingApi>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let api = Arc::new(GradingClient::new(&config.settings)?);
        Ok(Self { config, api })
    }
}

/// Resolve configuration and execute one CLI command.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    tracing::info!("Starting lti-grader v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(
        host = %config.settings.host,
        secure = config.settings.secure,
        task_id = %config.page.task_id,
        "Configuration resolved"
    );
    let state = AppState::new(config)?;

    match cli.command {
        Command::Watch { tests } => commands::watch::watch(&state, tests).await,
        Command::Run { tests } => commands::run::run_tests(&state, tests).await.map(|_| ()),
        Command::Submit { description, tests } => {
            commands::submit::submit(&state, &description, &tests).await
        }
        Command::Scoreboard => commands::scoreboard::scoreboard(&state).await.map(|_| ()),
    }
}
