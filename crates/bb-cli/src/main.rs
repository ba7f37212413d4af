use crate::cmd::{run_command_with_args, Cli};
use anyhow::anyhow;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::trace;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cmd;
mod compile;
mod tokens;
mod utils;

/// Env var holding the log filter, e.g. `BB_CLI_LOG=bb_parser=trace`.
const LOG_ENV: &str = "BB_CLI_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("bbcode: {e:#}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    trace!("running {cli:?}");

    match run_command_with_args(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bbcode: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, silent unless [LOG_ENV] says otherwise.
///
/// Output goes to stderr so it never mixes with the html on stdout.
fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::OFF.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e).context("failed to install log subscriber"))
}
