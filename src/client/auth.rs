//! Request authentication strategies.
//!
//! [`AuthStrategy`] is the closed set of ways a target can
//! authenticate outbound requests. Applying a strategy only ever sets
//! headers; it has no other side effects. Strategy selection is
//! permissive by design: an unrecognized `strategy` string in the
//! config degrades to [`AuthStrategy::None`] with a warning rather
//! than refusing to start.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};

use crate::config::model::AuthConfig;

pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub enum AuthStrategy {
    Bearer { token: String },
    ApiKey { header: String, value: String },
    Basic { username: String, password: String },
    None,
}

impl AuthStrategy {
    #[must_use]
    pub fn from_config(config: Option<&AuthConfig>) -> Self {
        let Some(cfg) = config else {
            return Self::None;
        };
        match cfg.strategy.to_lowercase().as_str() {
            "bearer" => Self::Bearer {
                token: cfg.token.clone().unwrap_or_default(),
            },
            "api_key" => Self::ApiKey {
                header: cfg
                    .key
                    .clone()
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                value: cfg.value.clone().unwrap_or_default(),
            },
            "basic" => Self::Basic {
                username: cfg.username.clone().unwrap_or_default(),
                password: cfg.password.clone().unwrap_or_default(),
            },
            "none" | "no_auth" => Self::None,
            other => {
                tracing::warn!(
                    strategy = %other,
                    "unknown auth strategy, sending unauthenticated"
                );
                Self::None
            }
        }
    }

    /// Inject this strategy's credentials into `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        match self {
            Self::Bearer { token } => {
                set_header(headers, AUTHORIZATION, &format!("Bearer {token}"));
            }
            Self::ApiKey { header, value } => match HeaderName::from_bytes(header.as_bytes()) {
                Ok(name) => set_header(headers, name, value),
                Err(_) => {
                    tracing::warn!(header = %header, "invalid api key header name, skipping");
                }
            },
            Self::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                set_header(headers, AUTHORIZATION, &format!("Basic {encoded}"));
            }
            Self::None => {}
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => {
            tracing::warn!(header = %name, "credential is not a valid header value, skipping");
        }
    }
}
