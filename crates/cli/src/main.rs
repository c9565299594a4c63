use std::{
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod run;

use run::RunCommand;

#[derive(Parser, Debug)]
#[clap(author, version, about = "chatwire - chat server with a live message stream", long_about = None)]
struct Opts {
    #[clap(flatten)]
    run: RunCommand,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "chatwire_core=trace")
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    // Before parsing, so `.env` entries can feed the `env` fallbacks.
    let env_file = load_env_file(Path::new("."));

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    init_tracing(&opts.log_level);

    match env_file {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring malformed .env file: {}", e),
    }

    if let Err(e) = opts.run.execute().await {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load `.env` from `dir`. A missing file is `Ok(None)`.
fn load_env_file(dir: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    let env_file_path = dir.join(".env");

    match dotenvy::from_path(&env_file_path) {
        Ok(()) => Ok(Some(env_file_path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Opts::try_parse_from(["chatwire"]).unwrap();
        assert_eq!(opts.log_level, "info");
        assert_eq!(opts.run.port, 8080);
        assert_eq!(opts.run.server_config().poll.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_flags_build_server_config() {
        let opts = Opts::try_parse_from([
            "chatwire",
            "--port",
            "9001",
            "--database-url",
            ":memory:",
            "--frontend-dir",
            "/srv/chat",
            "--poll-interval-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(opts.run.database_url, ":memory:");
        let config = opts.run.server_config();
        assert_eq!(config.port, 9001);
        assert_eq!(config.frontend_dir, PathBuf::from("/srv/chat"));
        assert_eq!(config.poll.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = Opts::try_parse_from(["chatwire", "--poll-interval-ms", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_env_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "CHATWIRE_TEST_ENV_LOADED=yes\n").unwrap();

        let loaded = load_env_file(dir.path()).unwrap();
        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(std::env::var("CHATWIRE_TEST_ENV_LOADED").unwrap(), "yes");
    }

    #[test]
    fn test_malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "CHATWIRE_TEST_BROKEN=\"unterminated\n").unwrap();

        assert!(load_env_file(dir.path()).is_err());
    }
}
