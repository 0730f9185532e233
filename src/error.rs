//! Unified error types for outpost.
//!
//! Defines [`OutpostError`] for startup-time failures (config loading,
//! validation, CLI), [`ValidationError`] for per-field config problems,
//! and [`DeliveryError`] — the delivery-time taxonomy. Delivery errors
//! are never raised across the dispatch boundary; they travel inside
//! [`DeliveryResult`](crate::dispatch::target::DeliveryResult) values.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub scope: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {} — {}", self.scope, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OutpostError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Why one delivery to one destination did not succeed.
///
/// Every variant resolves locally into a per-target result; a failure
/// on one target never aborts or poisons the dispatch of its siblings.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum DeliveryError {
    /// Connection or timeout failure on the final attempt.
    #[error("transport failure after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// Every attempt came back with a retryable (forcelist) status.
    #[error("retries exhausted after {attempts} attempt(s), last status {status}")]
    ExhaustedRetries { attempts: u32, status: u16 },

    /// An error status outside the forcelist. Not retried: retrying a
    /// genuine client error would only mask it.
    #[error("terminal status {status}")]
    TerminalStatus { status: u16 },

    #[error("invalid destination URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("could not build request for {url}: {message}")]
    RequestBuild { url: String, message: String },

    #[error("publish to topic '{topic}' failed: {message}")]
    Publish { topic: String, message: String },

    /// The spawned delivery task itself failed (panicked or was cancelled).
    #[error("delivery task failed: {message}")]
    Task { message: String },
}
