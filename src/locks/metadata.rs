//! Holder identity attached to lock events.
//!
//! The identity only travels in observability events. The store record holds
//! the bare token so that compare-and-delete can match it exactly.

/// Get the holder string for this process (`user@HOST:pid`).
pub fn holder_identity() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}:{}", user, host, std::process::id())
}
