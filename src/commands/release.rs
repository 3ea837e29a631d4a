//! Implementation of the `keylock release` command.

use super::CommandContext;
use crate::cli::ReleaseArgs;
use keylock::error::Result;
use keylock::exit_codes;
use keylock::locks::{LockToken, ReleaseOutcome};

/// Execute the `keylock release` command.
///
/// # Exit Codes
///
/// * `0` - The record was deleted
/// * `4` - Nothing was deleted (not held, held by another token, or expired)
pub async fn cmd_release(ctx: &CommandContext, args: ReleaseArgs) -> Result<i32> {
    let key = ctx.lock_key(&args.key)?;
    let token = LockToken::parse(&args.token)?;

    let outcome = ctx.coordinator.release(&key, &token).await?;
    println!("{}: {}", key, outcome);

    Ok(release_exit_code(outcome))
}

pub(super) fn release_exit_code(outcome: ReleaseOutcome) -> i32 {
    if outcome.is_released() {
        exit_codes::SUCCESS
    } else {
        exit_codes::RELEASE_NOOP
    }
}
