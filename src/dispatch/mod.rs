//! Event dispatch.
//!
//! The [`DispatchRouter`] holds the source → targets table and fans
//! one [`SourceEvent`] out to every target registered for its source.
//! Each target runs in its own task, so a slow or panicking target
//! never blocks or poisons its siblings; results come back in
//! registration order.

pub mod target;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::HttpClient;
use crate::config::model::Config;
use crate::error::DeliveryError;
use crate::queue::QueuePublisher;
use target::{build_target, DeliveryResult, Target};

/// One inbound event: where it came from and what it carries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceEvent {
    pub source: String,

    #[serde(rename = "data")]
    pub payload: Value,
}

#[derive(Default)]
pub struct DispatchRouter {
    table: HashMap<String, Vec<Arc<dyn Target>>>,
}

impl DispatchRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the routing table from a validated config. Descriptors
    /// with an unknown type are skipped inside [`build_target`].
    #[must_use]
    pub fn from_config(
        config: &Config,
        http: &HttpClient,
        publisher: &Arc<dyn QueuePublisher>,
    ) -> Self {
        let mut router = Self::new();
        for (source, source_config) in &config.sources {
            let targets: Vec<Arc<dyn Target>> = source_config
                .targets
                .iter()
                .filter_map(|desc| build_target(desc, http, publisher, &config.defaults))
                .collect();
            tracing::info!(
                source = %source,
                targets = targets.len(),
                "registered source"
            );
            router.register(source.clone(), targets);
        }
        router
    }

    /// Register targets for a source. Registering the same source
    /// again replaces its previous targets.
    pub fn register(&mut self, source: impl Into<String>, targets: Vec<Arc<dyn Target>>) {
        self.table.insert(source.into(), targets);
    }

    #[must_use]
    pub fn sources(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn total_targets(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    /// Fan one event out to all targets for its source. An unknown
    /// source is a no-op; one result per target otherwise, in
    /// registration order.
    pub async fn dispatch(&self, event: &SourceEvent) -> Vec<DeliveryResult> {
        let Some(targets) = self.table.get(&event.source).filter(|t| !t.is_empty()) else {
            tracing::debug!(source = %event.source, "no targets for source, dropping event");
            return Vec::new();
        };

        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let target = Arc::clone(target);
            let payload = event.payload.clone();
            handles.push(tokio::spawn(
                async move { target.deliver(&payload).await },
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, target) in handles.into_iter().zip(targets) {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => DeliveryResult::failed(
                    target.name(),
                    DeliveryError::Task {
                        message: join_error.to_string(),
                    },
                ),
            };
            results.push(result);
        }
        results
    }
}
