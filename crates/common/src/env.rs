//! Environment helpers
//!
//! Reading optional settings with a visible warning when a development default is used.

use tracing::warn;

/// Read `key` from the environment, falling back to `default` and logging a warning.
pub fn var_or_default(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => {
            warn!(%key, "environment variable not set; using development default");
            default.to_string()
        }
    }
}

/// Read a boolean flag (`1`, `true`, `yes`, case-insensitive).
pub fn flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
