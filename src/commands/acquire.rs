//! Implementation of the `keylock acquire` command.

use super::CommandContext;
use crate::cli::AcquireArgs;
use keylock::error::Result;
use keylock::exit_codes;
use tokio_util::sync::CancellationToken;

/// Execute the `keylock acquire` command.
///
/// Waits for the lock, detaches the guard so the record outlives this
/// process, and prints the token on stdout for a later `keylock release`.
pub async fn cmd_acquire(
    ctx: &CommandContext,
    args: AcquireArgs,
    cancel: &CancellationToken,
) -> Result<i32> {
    let key = ctx.lock_key(&args.key)?;
    let policy = args.policy.resolve(&ctx.config);

    let guard = ctx.coordinator.acquire(&key, &policy, cancel).await?;
    let token = guard.detach();

    println!("{}", token);
    Ok(exit_codes::SUCCESS)
}
