use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use chatwire_core::{
    ApiState, DbManager, PollConfig, ServerConfig,
    api::{DEFAULT_FRONTEND_DIR, DEFAULT_PORT},
};
use console::style;
use tracing::info;

#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct RunCommand {
    /// Port to run the server on
    #[arg(long, env = "CHATWIRE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file, or `:memory:` for a throwaway store
    #[arg(long = "database-url", env = "DATABASE_URL", default_value = "chatwire.db")]
    pub database_url: String,

    /// Directory the web client is served from
    #[arg(long = "frontend-dir", env = "CHATWIRE_FRONTEND_DIR", default_value = DEFAULT_FRONTEND_DIR)]
    pub frontend_dir: PathBuf,

    /// Milliseconds between store queries for each open event stream
    #[arg(
        long = "poll-interval-ms",
        env = "CHATWIRE_POLL_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,
}

impl RunCommand {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            poll: PollConfig {
                interval: Duration::from_millis(self.poll_interval_ms),
            },
            frontend_dir: self.frontend_dir.clone(),
        }
    }

    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = self.server_config();

        println!();
        println!("{}{}", style("chat").white(), style("wire").green());
        println!("{} {}", style("Database").dim(), self.database_url);
        println!("{} {}", style("Frontend").dim(), config.frontend_dir.display());
        println!("{} {}ms", style("Poll").dim(), self.poll_interval_ms);
        println!();
        println!("{}", style("Endpoints").dim());
        println!("  GET  http://localhost:{}/api/messages", config.port);
        println!("  GET  http://localhost:{}/api/events", config.port);
        println!("  POST http://localhost:{}/api/new/message", config.port);
        println!("  POST http://localhost:{}/api/create/user", config.port);
        println!("  POST http://localhost:{}/api/login", config.port);
        println!("  GET  http://localhost:{}/health", config.port);
        println!();
        println!("{}", style("Press Ctrl+C to stop").dim());
        println!();

        let db_manager = DbManager::local(&self.database_url)
            .with_context(|| format!("Failed to open database at {}", self.database_url))?;
        let state = ApiState::new(Arc::new(db_manager), &config);

        // Open event streams never finish on their own, so the server is raced
        // against Ctrl+C instead of shut down gracefully. Dropping the state
        // closes the pool.
        tokio::select! {
            result = chatwire_core::start_server(state, config.port) => {
                result.with_context(|| format!("Server on port {} failed", config.port))
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                info!("Shutting down");
                Ok(())
            }
        }
    }
}
