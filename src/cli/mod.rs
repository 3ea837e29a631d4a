//! CLI argument parsing for keylock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use keylock::config::Config;
use keylock::locks::LockPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Keylock: mutual exclusion across processes through a shared Redis key.
///
/// A lock is a single key holding a random token with a TTL:
/// - Acquire polls `SET key token NX PX ttl` until it wins
/// - Release deletes the key only while it still holds your token
/// - A crashed holder's lock clears when its TTL expires
#[derive(Parser, Debug)]
#[command(name = "keylock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file (default: ./keylock.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store URL, overriding the config file and KEYLOCK_REDIS_URL.
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for keylock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a lock.
    ///
    /// Waits for the lock, runs the command, then releases the lock.
    /// The command's exit code is returned unchanged. The lock key and token
    /// are exported to the child as KEYLOCK_KEY and KEYLOCK_TOKEN.
    Run(RunArgs),

    /// Acquire a lock and print its token.
    ///
    /// The lock stays held until its TTL expires or `keylock release` is
    /// called with the printed token.
    Acquire(AcquireArgs),

    /// Release a lock previously acquired with `keylock acquire`.
    ///
    /// Deletes the key only if it still holds the given token.
    Release(ReleaseArgs),

    /// Show who holds a lock and when it expires.
    Status(StatusArgs),
}

/// Timing overrides shared by commands that acquire.
#[derive(Args, Debug, Default, Clone)]
pub struct PolicyArgs {
    /// Lock TTL in milliseconds.
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// Delay between acquisition attempts in milliseconds.
    #[arg(long)]
    pub retry_interval_ms: Option<u64>,

    /// Give up waiting after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl PolicyArgs {
    /// Merge these overrides over the config's policy.
    pub fn resolve(&self, config: &Config) -> LockPolicy {
        let mut policy = config.policy();
        if let Some(ttl_ms) = self.ttl_ms {
            policy.ttl = Duration::from_millis(ttl_ms);
        }
        if let Some(retry_ms) = self.retry_interval_ms {
            policy.retry_interval = Duration::from_millis(retry_ms);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            policy.acquire_timeout = Some(Duration::from_millis(timeout_ms));
        }
        policy
    }
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Lock key. Defaults to the program name of the command.
    #[arg(short, long)]
    pub key: Option<String>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Command and arguments to run (after `--`).
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

/// Arguments for the `acquire` command.
#[derive(Parser, Debug)]
pub struct AcquireArgs {
    /// Lock key.
    pub key: String,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Arguments for the `release` command.
#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    /// Lock key.
    pub key: String,

    /// Token printed by `keylock acquire`.
    pub token: String,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Lock key.
    pub key: String,

    /// Print a JSON object instead of text.
    #[arg(long)]
    pub json: bool,
}
