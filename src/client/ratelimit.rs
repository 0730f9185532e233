//! Adaptive rate-limit waiting.
//!
//! When a target signals throttling (HTTP 429), the right wait time is
//! whatever the *server* says it is. [`RateLimiter`] reads that signal
//! either from response headers or from nested fields of the JSON
//! body, with a fixed precedence:
//!
//! 1. an explicit retry-after value (seconds) among the configured
//!    candidate keys;
//! 2. a reset timestamp minus the current time, clamped to ≥ 0;
//! 3. (header variant only) a rate `r > 0` among the configured limit
//!    keys, read as a `1/r` second wait;
//! 4. the configured `default_wait`.
//!
//! Unparsable or missing values fall through to the next level, and
//! the final wait is clamped to `[0, max_wait]`. `wait_for` never
//! fails — worst case it sleeps for `default_wait`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::HeaderMap;
use serde_json::Value;

use super::path;
use crate::config::model::RateLimitConfig;

#[derive(Debug, Clone)]
pub enum RateLimiter {
    Header(HeaderLimiter),
    Body(BodyLimiter),
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::Header(HeaderLimiter::from_config(&RateLimitConfig::default()))
    }
}

impl RateLimiter {
    /// Unknown strategy strings degrade to the header-based limiter.
    #[must_use]
    pub fn from_config(config: Option<&RateLimitConfig>) -> Self {
        let Some(cfg) = config else {
            return Self::default();
        };
        match cfg.strategy.to_lowercase().as_str() {
            "header" => Self::Header(HeaderLimiter::from_config(cfg)),
            "response" => Self::Body(BodyLimiter::from_config(cfg)),
            other => {
                tracing::warn!(
                    strategy = %other,
                    "unknown rate-limit strategy, using header-based"
                );
                Self::Header(HeaderLimiter::from_config(cfg))
            }
        }
    }

    /// Compute the wait without sleeping. `now` is seconds since the
    /// Unix epoch, passed in so the precedence math is testable.
    #[must_use]
    pub fn wait_duration(&self, headers: &HeaderMap, body: &[u8], now: f64) -> Duration {
        let secs = match self {
            Self::Header(limiter) => limiter.wait_secs(headers, now),
            Self::Body(limiter) => limiter.wait_secs(body, now),
        };
        Duration::from_secs_f64(secs)
    }

    /// Suspend the calling task for the computed wait.
    pub async fn wait_for(&self, headers: &HeaderMap, body: &[u8]) {
        let wait = self.wait_duration(headers, body, unix_now());
        tracing::debug!(
            wait_secs = wait.as_secs_f64(),
            "throttled, waiting before next attempt"
        );
        tokio::time::sleep(wait).await;
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn clamp_wait(secs: f64, max_wait: f64) -> f64 {
    if secs.is_finite() {
        secs.clamp(0.0, max_wait.max(0.0))
    } else {
        max_wait.max(0.0)
    }
}

/// Reads throttle hints from response headers.
#[derive(Debug, Clone)]
pub struct HeaderLimiter {
    retry_after: Vec<String>,
    reset: Vec<String>,
    limit: Vec<String>,
    default_wait: f64,
    max_wait: f64,
}

impl HeaderLimiter {
    #[must_use]
    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self {
            retry_after: cfg.headers.retry_after.clone(),
            reset: cfg.headers.reset.clone(),
            limit: cfg.headers.limit.clone(),
            default_wait: cfg.default_wait,
            max_wait: cfg.max_wait,
        }
    }

    fn wait_secs(&self, headers: &HeaderMap, now: f64) -> f64 {
        let wait = self
            .retry_after
            .iter()
            .find_map(|key| header_f64(headers, key))
            .or_else(|| {
                self.reset
                    .iter()
                    .find_map(|key| header_f64(headers, key))
                    .map(|reset| (reset - now).max(0.0))
            })
            .or_else(|| {
                self.limit
                    .iter()
                    .find_map(|key| header_f64(headers, key))
                    .filter(|rate| *rate > 0.0)
                    .map(|rate| 1.0 / rate)
            })
            .unwrap_or(self.default_wait);
        clamp_wait(wait, self.max_wait)
    }
}

/// Reads throttle hints from nested paths of the JSON response body.
#[derive(Debug, Clone)]
pub struct BodyLimiter {
    retry_after: Vec<String>,
    reset: Vec<String>,
    default_wait: f64,
    max_wait: f64,
}

impl BodyLimiter {
    #[must_use]
    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self {
            retry_after: cfg.json_fields.retry_after.clone(),
            reset: cfg.json_fields.reset.clone(),
            default_wait: cfg.default_wait,
            max_wait: cfg.max_wait,
        }
    }

    fn wait_secs(&self, body: &[u8], now: f64) -> f64 {
        // An unparsable body is the same as a body with no signal
        let data: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

        let wait = self
            .retry_after
            .iter()
            .find_map(|p| path::resolve(&data, p).and_then(value_f64))
            .or_else(|| {
                self.reset
                    .iter()
                    .find_map(|p| path::resolve(&data, p).and_then(value_f64))
                    .map(|reset| (reset - now).max(0.0))
            })
            .unwrap_or(self.default_wait);
        clamp_wait(wait, self.max_wait)
    }
}

fn header_f64(headers: &HeaderMap, key: &str) -> Option<f64> {
    headers
        .get(key)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{RateLimitFields, RateLimitHeaders};
    use http::HeaderValue;

    fn header_limiter(cfg: RateLimitConfig) -> RateLimiter {
        RateLimiter::Header(HeaderLimiter::from_config(&cfg))
    }

    fn body_limiter(cfg: RateLimitConfig) -> RateLimiter {
        RateLimiter::Body(BodyLimiter::from_config(&cfg))
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn retry_after_header_wins() {
        let limiter = header_limiter(RateLimitConfig::default());
        let hdrs = headers(&[("retry-after", "2"), ("x-ratelimit-reset", "9999999999")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::from_secs(2));
    }

    #[test]
    fn reset_header_minus_now() {
        let limiter = header_limiter(RateLimitConfig::default());
        let hdrs = headers(&[("x-ratelimit-reset", "105")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::from_secs(5));
    }

    #[test]
    fn stale_reset_clamps_to_zero() {
        let limiter = header_limiter(RateLimitConfig::default());
        let hdrs = headers(&[("ratelimit-reset", "90")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::ZERO);
    }

    #[test]
    fn limit_header_inverts_rate() {
        let cfg = RateLimitConfig {
            headers: RateLimitHeaders {
                limit: vec!["x-ratelimit-limit".into()],
                ..RateLimitHeaders::default()
            },
            ..RateLimitConfig::default()
        };
        let limiter = header_limiter(cfg);
        let hdrs = headers(&[("x-ratelimit-limit", "4")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::from_secs_f64(0.25));
    }

    #[test]
    fn zero_rate_falls_through_to_default() {
        let cfg = RateLimitConfig {
            headers: RateLimitHeaders {
                limit: vec!["x-ratelimit-limit".into()],
                ..RateLimitHeaders::default()
            },
            default_wait: 0.5,
            ..RateLimitConfig::default()
        };
        let limiter = header_limiter(cfg);
        let hdrs = headers(&[("x-ratelimit-limit", "0")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::from_secs_f64(0.5));
    }

    #[test]
    fn unparsable_value_falls_through() {
        let limiter = header_limiter(RateLimitConfig::default());
        // retry-after is garbage, reset is usable
        let hdrs = headers(&[("retry-after", "soon"), ("x-ratelimit-reset", "103")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::from_secs(3));
    }

    #[test]
    fn no_signal_uses_default_wait() {
        let limiter = header_limiter(RateLimitConfig {
            default_wait: 1.5,
            ..RateLimitConfig::default()
        });
        let wait = limiter.wait_duration(&HeaderMap::new(), b"", 100.0);
        assert_eq!(wait, Duration::from_secs_f64(1.5));
    }

    #[test]
    fn wait_is_clamped_to_max_wait() {
        let limiter = header_limiter(RateLimitConfig {
            max_wait: 10.0,
            ..RateLimitConfig::default()
        });
        let hdrs = headers(&[("retry-after", "3600")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::from_secs(10));
    }

    #[test]
    fn body_retry_after_field() {
        let limiter = body_limiter(RateLimitConfig::default());
        let body = br#"{"retry_after": 2.5}"#;
        let wait = limiter.wait_duration(&HeaderMap::new(), body, 100.0);
        assert_eq!(wait, Duration::from_secs_f64(2.5));
    }

    #[test]
    fn body_reset_timestamp() {
        let limiter = body_limiter(RateLimitConfig::default());
        let body = br#"{"rate_limit_reset": 105}"#;
        let wait = limiter.wait_duration(&HeaderMap::new(), body, 100.0);
        assert_eq!(wait, Duration::from_secs(5));
    }

    #[test]
    fn body_nested_path_field() {
        let cfg = RateLimitConfig {
            strategy: "response".into(),
            json_fields: RateLimitFields {
                retry_after: vec!["data.rate_limit.retry_after".into()],
                reset: vec![],
            },
            ..RateLimitConfig::default()
        };
        let limiter = body_limiter(cfg);
        let body = br#"{"data": {"rate_limit": {"retry_after": "4"}}}"#;
        let wait = limiter.wait_duration(&HeaderMap::new(), body, 100.0);
        assert_eq!(wait, Duration::from_secs(4));
    }

    #[test]
    fn unparsable_body_uses_default_wait() {
        let limiter = body_limiter(RateLimitConfig {
            default_wait: 0.3,
            ..RateLimitConfig::default()
        });
        let wait = limiter.wait_duration(&HeaderMap::new(), b"not json", 100.0);
        assert_eq!(wait, Duration::from_secs_f64(0.3));
    }

    #[test]
    fn wait_never_negative() {
        let limiter = header_limiter(RateLimitConfig::default());
        let hdrs = headers(&[("retry-after", "-5")]);
        let wait = limiter.wait_duration(&hdrs, b"", 100.0);
        assert_eq!(wait, Duration::ZERO);
    }

    #[test]
    fn unknown_strategy_degrades_to_header() {
        let cfg = RateLimitConfig {
            strategy: "fixed".into(),
            ..RateLimitConfig::default()
        };
        assert!(matches!(
            RateLimiter::from_config(Some(&cfg)),
            RateLimiter::Header(_)
        ));
    }
}
