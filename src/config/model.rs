//! Serde data structures for the outpost configuration file.
//!
//! Contains [`Config`] (the root), the per-source [`SourceConfig`],
//! [`TargetDescriptor`], and the policy blocks [`AuthConfig`],
//! [`RetryConfig`], and [`RateLimitConfig`]. All types derive
//! `Serialize` and `Deserialize` with `deny_unknown_fields` for strict
//! parsing.
//!
//! `TargetDescriptor` deliberately keeps `type` as a plain string
//! rather than a tagged enum: a descriptor with an unrecognized type
//! must parse cleanly so the dispatch table builder can skip it with a
//! diagnostic instead of the whole config failing to load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    5000
}

fn default_method() -> String {
    "POST".to_string()
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_factor() -> f64 {
    1.0
}

fn default_forcelist() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

fn default_auth_strategy() -> String {
    "none".to_string()
}

fn default_ratelimit_strategy() -> String {
    "header".to_string()
}

const fn default_wait() -> f64 {
    0.5
}

const fn default_max_wait() -> f64 {
    60.0
}

fn default_retry_after_headers() -> Vec<String> {
    vec!["retry-after".to_string()]
}

fn default_reset_headers() -> Vec<String> {
    vec!["x-ratelimit-reset".to_string(), "ratelimit-reset".to_string()]
}

fn default_retry_after_fields() -> Vec<String> {
    vec!["retry_after".to_string()]
}

fn default_reset_fields() -> Vec<String> {
    vec!["rate_limit_reset".to_string()]
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_method(v: &str) -> bool {
    v == default_method()
}

fn is_default_defaults(v: &Defaults) -> bool {
    v.timeout == default_timeout()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,

    /// Source identifier → delivery targets for events from that source.
    pub sources: HashMap<String, SourceConfig>,
}

impl Config {
    #[must_use]
    pub fn total_targets(&self) -> usize {
        self.sources.values().map(|s| s.targets.len()).sum()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub targets: Vec<TargetDescriptor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    // -- http targets --
    #[serde(default = "default_method", skip_serializing_if = "is_default_method")]
    pub method: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Per-target request timeout in milliseconds. Falls back to
    /// `defaults.timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratelimit: Option<RateLimitConfig>,

    // -- rabbitmq targets --
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// One of `bearer`, `api_key`, `basic`, `none`. Anything else is
    /// treated as `none` at build time.
    #[serde(default = "default_auth_strategy")]
    pub strategy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Header name for `api_key` (defaults to `x-api-key`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_forcelist")]
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_factor: default_backoff_factor(),
            status_forcelist: default_forcelist(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// `header` reads throttle hints from response headers, `response`
    /// from nested fields of the JSON body.
    #[serde(default = "default_ratelimit_strategy")]
    pub strategy: String,

    #[serde(default)]
    pub headers: RateLimitHeaders,

    #[serde(default)]
    pub json_fields: RateLimitFields,

    /// Seconds to wait when the response carries no usable signal.
    #[serde(default = "default_wait")]
    pub default_wait: f64,

    /// Upper bound in seconds for any computed wait.
    #[serde(default = "default_max_wait")]
    pub max_wait: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strategy: default_ratelimit_strategy(),
            headers: RateLimitHeaders::default(),
            json_fields: RateLimitFields::default(),
            default_wait: default_wait(),
            max_wait: default_max_wait(),
        }
    }
}

/// Candidate header names, checked in order, for the header-based limiter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitHeaders {
    #[serde(default = "default_retry_after_headers")]
    pub retry_after: Vec<String>,

    #[serde(default = "default_reset_headers")]
    pub reset: Vec<String>,

    /// Requests-per-second headers; a value `r > 0` implies a `1/r` wait.
    #[serde(default)]
    pub limit: Vec<String>,
}

impl Default for RateLimitHeaders {
    fn default() -> Self {
        Self {
            retry_after: default_retry_after_headers(),
            reset: default_reset_headers(),
            limit: Vec::new(),
        }
    }
}

/// Candidate nested paths (e.g. `data.rate_limit.reset`) for the
/// response-body limiter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitFields {
    #[serde(default = "default_retry_after_fields")]
    pub retry_after: Vec<String>,

    #[serde(default = "default_reset_fields")]
    pub reset: Vec<String>,
}

impl Default for RateLimitFields {
    fn default() -> Self {
        Self {
            retry_after: default_retry_after_fields(),
            reset: default_reset_fields(),
        }
    }
}
