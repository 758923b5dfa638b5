//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails, and the renderer printing command results as JSON.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::error::{ConfigError, EmbedError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable error code for `err`, looked up through its cause chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(embed) = cause.downcast_ref::<EmbedError>() {
            return embed.code();
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "invalid_config";
        }
    }
    "internal"
}

/// Prints command results as pretty JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print `value` as one pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{out}");
        Ok(())
    }
}
