//! Command-line entry point: one session with the greedy policy.

use std::process::ExitCode;

use clap::Parser;
use skydrop::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skydrop")]
#[command(about = "Reference client for the drone scheduling competition", long_about = None)]
struct Cli {
    /// A wss:// or ws:// URL
    #[arg(long = "server_url_base", default_value = "")]
    server_url_base: String,

    /// Name of this scheduler entry.
    #[arg(long = "entry_name", default_value = "")]
    entry_name: String,

    /// Auth token for the human submitting this scheduler.
    #[arg(long = "auth_token", default_value = "")]
    auth_token: String,

    /// If set, connect to the server in competition mode.
    #[arg(long = "comp_mode")]
    comp_mode: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SessionConfig {
        entry_name: cli.entry_name,
        auth_token: cli.auth_token,
        competition_mode: cli.comp_mode,
    };

    match connect_and_run(&cli.server_url_base, config, GreedyPolicy).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(outcome) => {
            tracing::warn!(?outcome, "session did not end cleanly");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_underscore_flags() {
        let cli = Cli::try_parse_from([
            "skydrop",
            "--server_url_base",
            "ws://localhost:8080",
            "--entry_name",
            "greedy",
            "--auth_token",
            "tok",
            "--comp_mode",
        ])
        .unwrap();
        assert_eq!(cli.server_url_base, "ws://localhost:8080");
        assert_eq!(cli.entry_name, "greedy");
        assert_eq!(cli.auth_token, "tok");
        assert!(cli.comp_mode);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["skydrop"]).unwrap();
        assert!(cli.server_url_base.is_empty());
        assert!(!cli.comp_mode);
    }
}
