//! Command implementations for keylock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the context (config + coordinator) they share.

mod acquire;
mod release;
mod run;
mod status;


use crate::cli::{Cli, Command};
use keylock::config::Config;
use keylock::error::{LockError, Result};
use keylock::locks::LockCoordinator;
use keylock::store::{LockStore, RedisStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use acquire::cmd_acquire;
pub use release::cmd_release;
pub use run::cmd_run;
pub use status::cmd_status;

/// Everything a command needs to talk to the store.
pub struct CommandContext {
    pub config: Config,
    pub coordinator: LockCoordinator,
}

impl CommandContext {
    /// Build a context over an already-connected store.
    pub fn new(config: Config, store: Arc<dyn LockStore>) -> Self {
        Self {
            config,
            coordinator: LockCoordinator::new(store),
        }
    }

    /// Validate a user-supplied key and apply the configured prefix.
    pub fn lock_key(&self, key: &str) -> Result<String> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LockError::InvalidArgument(
                "lock key must not be empty".to_string(),
            ));
        }
        Ok(self.config.qualify(key))
    }
}

/// Dispatch a command to its implementation.
///
/// Resolves config, connects to the store, and routes the command.
/// Returns the process exit code on success.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<i32> {
    let cwd = std::env::current_dir().map_err(|e| {
        LockError::ConfigError(format!("failed to read working directory: {}", e))
    })?;

    let mut config = Config::resolve(cli.config.as_deref(), &cwd)?;
    if let Some(url) = cli.redis_url {
        config.redis_url = url;
        config.validate()?;
    }

    let store = RedisStore::connect(&config.redis_url).await?;
    let ctx = CommandContext::new(config, Arc::new(store));

    execute(&ctx, cli.command, &cancel).await
}

/// Route a parsed command against an existing context.
pub async fn execute(
    ctx: &CommandContext,
    command: Command,
    cancel: &CancellationToken,
) -> Result<i32> {
    match command {
        Command::Run(args) => cmd_run(ctx, args, cancel).await,
        Command::Acquire(args) => cmd_acquire(ctx, args, cancel).await,
        Command::Release(args) => cmd_release(ctx, args).await,
        Command::Status(args) => cmd_status(ctx, args).await,
    }
}
