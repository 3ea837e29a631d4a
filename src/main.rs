//! Keylock: run commands under a lock shared through a key-value store.
//!
//! This is the main entry point for the `keylock` CLI. It parses arguments,
//! installs logging, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use keylock::exit_codes;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    // Ctrl-C abandons a pending acquire; a running child gets the signal itself.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match commands::dispatch(cli, cancel).await {
        Ok(code) => ExitCode::from(clamp_exit_code(code)),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(clamp_exit_code(err.exit_code()))
        }
    }
}

/// Log to stderr so stdout stays parseable (`keylock acquire` prints a token).
fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "keylock=info",
        1 => "keylock=debug",
        _ => "keylock=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn clamp_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit_codes::USER_ERROR as u8)
}
