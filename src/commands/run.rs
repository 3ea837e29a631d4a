//! Implementation of the `keylock run` command.
//!
//! # Steps
//!
//! 1. Derive the lock key (`--key`, else the command's program name)
//! 2. Wait for the lock (Ctrl-C or `--timeout-ms` abandons the wait)
//! 3. Spawn the command with `KEYLOCK_KEY` / `KEYLOCK_TOKEN` exported
//! 4. Release the lock once the command exits, whatever its status
//! 5. Exit with the command's own exit code

use super::CommandContext;
use crate::cli::RunArgs;
use keylock::error::{LockError, Result};
use std::path::Path;
use std::process::ExitStatus;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Environment variable carrying the lock key into the child.
pub const KEY_ENV: &str = "KEYLOCK_KEY";

/// Environment variable carrying the lock token into the child.
pub const TOKEN_ENV: &str = "KEYLOCK_TOKEN";

/// Execute the `keylock run` command.
pub async fn cmd_run(
    ctx: &CommandContext,
    args: RunArgs,
    cancel: &CancellationToken,
) -> Result<i32> {
    let (program, program_args) = args
        .command
        .split_first()
        .ok_or_else(|| LockError::InvalidArgument("no command given".to_string()))?;

    let key = match &args.key {
        Some(key) => ctx.lock_key(key)?,
        None => ctx.lock_key(&default_key(program))?,
    };
    let policy = args.policy.resolve(&ctx.config);

    let status = ctx
        .coordinator
        .with_lock(&key, &policy, cancel, |token| {
            let mut child = Command::new(program);
            child
                .args(program_args)
                .env(KEY_ENV, &key)
                .env(TOKEN_ENV, token.as_str());
            tracing::debug!(key = %key, program = %program, "Running command under lock");
            async move { child.status().await }
        })
        .await?;

    let status = status.map_err(|e| {
        LockError::CommandError(format!("failed to run '{}': {}", program, e))
    })?;

    Ok(exit_code(status))
}

/// Lock key used when `--key` is omitted: the program's file name.
pub(super) fn default_key(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string())
}

/// Exit code to propagate for a finished child.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
