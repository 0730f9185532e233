//! `outpost run` — start the delivery engine.
//!
//! Loads and validates the config, builds the dispatch table, then
//! consumes JSON-line events from stdin until the feed ends or the
//! process receives a shutdown signal. Each event is dispatched to
//! every target registered for its source, and per-target outcomes
//! are logged with a correlation id.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::io::BufReader;

use crate::cli::RunArgs;
use crate::client::build_http_client;
use crate::config::{sources, ConfigSource};
use crate::dispatch::DispatchRouter;
use crate::error::OutpostError;
use crate::logging;
use crate::queue::{EventFeed, JsonLineFeed, LoggingPublisher, QueuePublisher};
use crate::runtime::{shutdown_signal, Stats};

pub async fn execute(args: RunArgs) -> Result<(), OutpostError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let source = resolve_config_source(args.config.clone()).await?;
    let mut config = source.load().await?;
    apply_timeout_override(&mut config, args.timeout);

    let http = build_http_client();
    let publisher: Arc<dyn QueuePublisher> = Arc::new(LoggingPublisher);
    let router = Arc::new(DispatchRouter::from_config(&config, &http, &publisher));
    let stats = Arc::new(Stats::new());

    tracing::info!(
        config = source.name(),
        sources = router.sources(),
        targets = router.total_targets(),
        "outpost started, reading events from stdin"
    );

    // Dropping shutdown_tx closes the channel and stops the consume loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let consumer_router = Arc::clone(&router);
    let consumer_stats = Arc::clone(&stats);
    let mut consumer = tokio::spawn(async move {
        let feed = JsonLineFeed::new(BufReader::new(tokio::io::stdin()));
        consume_loop(feed, consumer_router, consumer_stats, shutdown_rx).await;
    });

    tokio::select! {
        () = shutdown_signal() => {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
            // In-flight deliveries finish; pending stdin events are abandoned
            if let Err(e) = (&mut consumer).await {
                tracing::error!(error = %e, "consume loop task failed");
            }
        }
        result = &mut consumer => {
            if let Err(e) = result {
                tracing::error!(error = %e, "consume loop task failed");
            }
        }
    }

    tracing::info!(
        events = stats.events.load(Ordering::Relaxed),
        delivered = stats.delivered.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        "outpost stopped"
    );
    Ok(())
}

/// An explicit `--timeout` (or env) wins over the config file; an
/// absent flag leaves the config's value untouched.
fn apply_timeout_override(config: &mut crate::config::model::Config, timeout: Option<u64>) {
    if let Some(timeout) = timeout {
        config.defaults.timeout = timeout;
    }
}

async fn consume_loop<F: EventFeed>(
    mut feed: F,
    router: Arc<DispatchRouter>,
    stats: Arc<Stats>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            event = feed.next_event() => event,
            _ = shutdown.changed() => {
                tracing::debug!("consume loop shutting down");
                return;
            }
        };

        let Some(event) = event else {
            tracing::info!("event feed closed");
            return;
        };

        let correlation_id = uuid::Uuid::new_v4();
        tracing::debug!(
            correlation_id = %correlation_id,
            source = %event.source,
            "event received"
        );

        let results = router.dispatch(&event).await;
        stats.record(&results);

        for result in &results {
            if result.success {
                tracing::info!(
                    correlation_id = %correlation_id,
                    source = %event.source,
                    target = %result.target_name,
                    "delivered"
                );
            } else {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    source = %event.source,
                    target = %result.target_name,
                    error = %result.error.as_ref().map_or_else(String::new, ToString::to_string),
                    "delivery failed"
                );
            }
        }
    }
}

async fn resolve_config_source(
    explicit: Option<PathBuf>,
) -> Result<Box<dyn ConfigSource>, OutpostError> {
    if let Some(path) = explicit {
        return create_file_source(&path);
    }

    // Auto-detect in current directory
    let candidates = ["outpost.yaml", "outpost.yml", "outpost.json", "outpost.toml"];

    for name in &candidates {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path);
        }
    }

    Err(OutpostError::NoConfigSource {
        hint: "Provide --config <file> or place an outpost.yaml in the current directory.\n  \
               Run 'outpost init' to create a config file."
            .into(),
    })
}

fn create_file_source(path: &std::path::Path) -> Result<Box<dyn ConfigSource>, OutpostError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(sources::yaml::new(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(sources::json::new(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(sources::toml_source::new(path.to_path_buf()))),

        other => Err(OutpostError::UnsupportedFormat(other.to_string())),
    }
}
