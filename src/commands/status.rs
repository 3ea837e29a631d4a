//! Implementation of the `keylock status` command.

use super::CommandContext;
use crate::cli::StatusArgs;
use keylock::error::Result;
use keylock::exit_codes;
use keylock::locks::LockStatus;
use serde_json::{Value, json};

/// Execute the `keylock status` command.
///
/// Prints the current holder token and remaining TTL of a key.
pub async fn cmd_status(ctx: &CommandContext, args: StatusArgs) -> Result<i32> {
    let key = ctx.lock_key(&args.key)?;
    let status = ctx.coordinator.status(&key).await?;

    if args.json {
        println!("{}", status_json(&key, &status));
    } else {
        println!("{}: {}", key, status);
    }

    Ok(exit_codes::SUCCESS)
}

/// Render a status snapshot as a JSON object.
pub(super) fn status_json(key: &str, status: &LockStatus) -> Value {
    match status {
        LockStatus::Unlocked => json!({
            "key": key,
            "locked": false,
        }),
        LockStatus::Locked {
            token,
            remaining_ttl,
        } => json!({
            "key": key,
            "locked": true,
            "token": token,
            "remaining_ttl_ms": remaining_ttl
                .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
            "expires_at": status.expires_at().map(|at| at.to_rfc3339()),
        }),
    }
}
