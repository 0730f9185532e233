//! Delivery targets.
//!
//! A [`Target`] receives an event payload and reports a
//! [`DeliveryResult`]. [`HttpTarget`] posts the payload to one or more
//! URLs through a policy-wrapped client; [`QueueTarget`] hands it to a
//! [`QueuePublisher`]. Targets never panic the router: every failure
//! mode is folded into the result.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use serde_json::Value;
use url::Url;

use crate::client::auth::AuthStrategy;
use crate::client::ratelimit::RateLimiter;
use crate::client::{HttpClient, HttpDeliveryClient, RetryPolicy};
use crate::config::model::{Defaults, TargetDescriptor};
use crate::error::DeliveryError;
use crate::queue::QueuePublisher;

/// Outcome of one target's delivery of one event.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub target_name: String,
    pub success: bool,
    pub error: Option<DeliveryError>,
}

impl DeliveryResult {
    #[must_use]
    pub fn ok(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(target_name: impl Into<String>, error: DeliveryError) -> Self {
        Self {
            target_name: target_name.into(),
            success: false,
            error: Some(error),
        }
    }
}

#[async_trait]
pub trait Target: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one event payload. Must not panic; failures are
    /// reported through the result.
    async fn deliver(&self, payload: &Value) -> DeliveryResult;
}

/// Webhook target. One event is posted to every configured URL
/// concurrently; the target succeeds only if every URL accepts it.
pub struct HttpTarget {
    name: String,
    method: Method,
    urls: Vec<Url>,
    client: HttpDeliveryClient,
}

impl HttpTarget {
    /// Build from a config descriptor. Unparsable URLs and header
    /// entries are logged and dropped rather than failing the whole
    /// target.
    #[must_use]
    pub fn from_descriptor(
        desc: &TargetDescriptor,
        http: HttpClient,
        defaults: &Defaults,
    ) -> Self {
        let urls = desc
            .urls
            .iter()
            .filter_map(|raw| match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(error) => {
                    tracing::warn!(target = %desc.name, url = %raw, error = %error, "dropping invalid url");
                    None
                }
            })
            .collect();

        let method = Method::from_bytes(desc.method.to_uppercase().as_bytes())
            .unwrap_or(Method::POST);

        let mut headers = HeaderMap::new();
        for (key, value) in &desc.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => {
                    tracing::warn!(target = %desc.name, header = %key, "dropping invalid header");
                }
            }
        }
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let retry = desc
            .retry
            .as_ref()
            .map(RetryPolicy::from_config)
            .unwrap_or_else(|| RetryPolicy::from_config(&Default::default()));

        let client = HttpDeliveryClient::new(http)
            .with_headers(headers)
            .with_auth(AuthStrategy::from_config(desc.auth.as_ref()))
            .with_retry(retry)
            .with_rate_limiter(RateLimiter::from_config(desc.ratelimit.as_ref()))
            .with_timeout(Duration::from_millis(desc.timeout.unwrap_or(defaults.timeout)));

        Self {
            name: desc.name.clone(),
            method,
            urls,
            client,
        }
    }
}

#[async_trait]
impl Target for HttpTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, payload: &Value) -> DeliveryResult {
        if self.urls.is_empty() {
            return DeliveryResult::failed(
                &self.name,
                DeliveryError::InvalidUrl {
                    url: String::new(),
                    message: "target has no valid urls".to_string(),
                },
            );
        }

        let mut handles = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            let client = self.client.clone();
            let method = self.method.clone();
            let url = url.clone();
            let payload = payload.clone();
            handles.push(tokio::spawn(async move {
                client.send_json(method, &url, &payload).await
            }));
        }

        let mut first_error = None;
        for handle in handles {
            let outcome = match handle.await {
                Ok(result) => result.map(|_| ()),
                Err(join_error) => Err(DeliveryError::Task {
                    message: join_error.to_string(),
                }),
            };
            if let Err(error) = outcome {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            None => DeliveryResult::ok(&self.name),
            Some(error) => DeliveryResult::failed(&self.name, error),
        }
    }
}

/// Queue-backed target. Delegates to the configured publisher.
pub struct QueueTarget {
    name: String,
    topic: String,
    publisher: Arc<dyn QueuePublisher>,
}

impl QueueTarget {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        publisher: Arc<dyn QueuePublisher>,
    ) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            publisher,
        }
    }
}

#[async_trait]
impl Target for QueueTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, payload: &Value) -> DeliveryResult {
        match self.publisher.publish(&self.topic, payload).await {
            Ok(()) => DeliveryResult::ok(&self.name),
            Err(error) => DeliveryResult::failed(
                &self.name,
                DeliveryError::Publish {
                    topic: error.topic,
                    message: error.message,
                },
            ),
        }
    }
}

/// Instantiate a target from its descriptor. Unknown `type` values
/// are skipped with a warning so one typo does not block the rest of
/// the config.
pub fn build_target(
    desc: &TargetDescriptor,
    http: &HttpClient,
    publisher: &Arc<dyn QueuePublisher>,
    defaults: &Defaults,
) -> Option<Arc<dyn Target>> {
    match desc.kind.to_lowercase().as_str() {
        "http" => Some(Arc::new(HttpTarget::from_descriptor(
            desc,
            http.clone(),
            defaults,
        ))),
        "rabbitmq" => {
            let topic = desc.topic.clone()?;
            Some(Arc::new(QueueTarget::new(
                &desc.name,
                topic,
                Arc::clone(publisher),
            )))
        }
        other => {
            tracing::warn!(target = %desc.name, kind = %other, "unknown target type, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_http_client;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingPublisher {
        published: Mutex<Vec<(String, Value)>>,
        fail: bool,
    }

    #[async_trait]
    impl QueuePublisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: &Value) -> Result<(), crate::queue::PublishError> {
            if self.fail {
                return Err(crate::queue::PublishError {
                    topic: topic.to_string(),
                    message: "broker unavailable".to_string(),
                });
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.clone()));
            Ok(())
        }
    }

    fn http_descriptor() -> TargetDescriptor {
        TargetDescriptor {
            name: "hook".into(),
            kind: "http".into(),
            method: "post".into(),
            urls: vec!["https://example.com/hook".into()],
            headers: Default::default(),
            timeout: None,
            auth: None,
            retry: None,
            ratelimit: None,
            topic: None,
        }
    }

    #[tokio::test]
    async fn queue_target_publishes_payload() {
        let publisher = Arc::new(RecordingPublisher {
            published: Mutex::new(Vec::new()),
            fail: false,
        });
        let target = QueueTarget::new("audit", "events.audit", publisher.clone());

        let result = target.deliver(&json!({"id": 9})).await;
        assert!(result.success);

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "events.audit");
        assert_eq!(published[0].1, json!({"id": 9}));
    }

    #[tokio::test]
    async fn queue_target_reports_publish_failure() {
        let publisher = Arc::new(RecordingPublisher {
            published: Mutex::new(Vec::new()),
            fail: true,
        });
        let target = QueueTarget::new("audit", "events.audit", publisher);

        let result = target.deliver(&json!({})).await;
        assert!(!result.success);
        assert!(matches!(
            result.error,
            Some(DeliveryError::Publish { ref topic, .. }) if topic == "events.audit"
        ));
    }

    #[test]
    fn http_descriptor_drops_bad_urls_and_headers() {
        let mut desc = http_descriptor();
        desc.urls.push("not a url".into());
        desc.headers.insert("x-ok".into(), "yes".into());
        desc.headers.insert("bad header name".into(), "v".into());

        let target = HttpTarget::from_descriptor(&desc, build_http_client(), &Defaults::default());
        assert_eq!(target.urls.len(), 1);
        assert_eq!(target.method, Method::POST);
    }

    #[test]
    fn unknown_method_falls_back_to_post() {
        let mut desc = http_descriptor();
        desc.method = "not a method\n".into();
        let target = HttpTarget::from_descriptor(&desc, build_http_client(), &Defaults::default());
        assert_eq!(target.method, Method::POST);
    }

    #[test]
    fn build_target_skips_unknown_kind() {
        let mut desc = http_descriptor();
        desc.kind = "carrier_pigeon".into();
        let publisher: Arc<dyn QueuePublisher> = Arc::new(crate::queue::LoggingPublisher);
        assert!(build_target(&desc, &build_http_client(), &publisher, &Defaults::default()).is_none());
    }

    #[test]
    fn rabbitmq_without_topic_is_skipped() {
        let mut desc = http_descriptor();
        desc.kind = "rabbitmq".into();
        desc.topic = None;
        let publisher: Arc<dyn QueuePublisher> = Arc::new(crate::queue::LoggingPublisher);
        assert!(build_target(&desc, &build_http_client(), &publisher, &Defaults::default()).is_none());
    }
}
