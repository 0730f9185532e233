//! Outpost is an event fan-out and webhook delivery engine.
//!
//! It consumes source events, looks each event's source up in a
//! configured routing table, and delivers the payload to every target
//! registered for that source concurrently. HTTP targets get retries,
//! backoff, adaptive rate-limit waits, and pluggable authentication;
//! queue targets hand the payload to a publisher. A failure on one
//! target never affects its siblings.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate).
//! - [`config`] -- Configuration loading and validation via the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`client`] -- Policy-wrapped HTTP delivery client: retry, backoff,
//!   rate-limit waits, auth strategies, and cursor pagination.
//! - [`dispatch`] -- The routing table and concurrent fan-out of one
//!   event to its targets.
//! - [`queue`] -- Message-queue publish boundary and the JSON-line
//!   event feed.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`runtime`] -- Delivery counters and shutdown signal handling.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod client;
pub mod cmd;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod queue;
pub mod runtime;
